#![allow(clippy::unwrap_used)]
// Integration tests for `TokenClient` and `GraphClient` using wiremock.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redirectctl_api::{ClientCredentials, Credential, Error, GraphClient, TokenClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, TokenClient, GraphClient) {
    let server = MockServer::start().await;
    let host = Url::parse(&server.uri()).unwrap();
    let tokens = TokenClient::with_client(reqwest::Client::new(), host.clone());
    let graph = GraphClient::with_client(reqwest::Client::new(), host);
    (server, tokens, graph)
}

fn credentials() -> ClientCredentials {
    ClientCredentials::new(
        "tenant-1",
        "client-1",
        SecretString::from("s3cret".to_owned()),
    )
}

fn bearer() -> Credential {
    Credential::new("tok-123", "Bearer", Duration::from_secs(3600))
}

fn application(uris: &[&str]) -> serde_json::Value {
    json!({
        "id": "obj-1",
        "appId": "app-1",
        "displayName": "Portal",
        "web": {
            "homePageUrl": null,
            "implicitGrantSettings": {
                "enableAccessTokenIssuance": true,
                "enableIdTokenIssuance": false
            },
            "redirectUris": uris
        }
    })
}

// ── Token endpoint ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_success() {
    let (server, tokens, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "expires_in": 3599,
            "ext_expires_in": 3599,
            "access_token": "tok-123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credential = tokens.authenticate(&credentials()).await.unwrap();

    assert_eq!(credential.expires_in(), Duration::from_secs(3599));
    assert_eq!(
        credential.authorization_header().unwrap().to_str().unwrap(),
        "Bearer tok-123"
    );
}

#[tokio::test]
async fn test_authenticate_rejected() {
    let (server, tokens, _) = setup().await;

    Mock::given(method("POST"))
        .and(path("/tenant-1/oauth2/v2.0/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_client" })),
        )
        .mount(&server)
        .await;

    let result = tokens.authenticate(&credentials()).await;

    match result {
        Err(Error::TokenRejected { status, ref body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid_client"), "body was: {body}");
        }
        other => panic!("expected TokenRejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_authenticate_empty_token() {
    let (server, tokens, _) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "Bearer",
            "access_token": ""
        })))
        .mount(&server)
        .await;

    let result = tokens.authenticate(&credentials()).await;
    assert!(
        matches!(result, Err(Error::EmptyToken)),
        "expected EmptyToken, got: {result:?}"
    );
}

#[tokio::test]
async fn test_authenticate_undecodable_body() {
    let (server, tokens, _) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = tokens.authenticate(&credentials()).await;
    assert!(
        matches!(result, Err(Error::TokenDecode { .. })),
        "expected TokenDecode, got: {result:?}"
    );
}

#[tokio::test]
async fn test_authenticate_rejects_missing_input_without_request() {
    let (server, tokens, _) = setup().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut creds = credentials();
    creds.client_id = String::new();

    let result = tokens.authenticate(&creds).await;
    assert!(matches!(
        result,
        Err(Error::MissingInput { field: "client_id" })
    ));
}

// ── Lookup ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_application_by_app_id() {
    let (server, _, graph) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/applications"))
        .and(query_param("$filter", "appId eq 'app-1'"))
        .and(query_param("$select", "id,appId,displayName,web"))
        .and(query_param("$count", "true"))
        .and(header("Authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#applications",
            "@odata.count": 1,
            "value": [application(&["https://a/cb"])]
        })))
        .mount(&server)
        .await;

    let app = graph.fetch_application(&bearer(), "app-1").await.unwrap();

    assert_eq!(app.id, "obj-1");
    assert_eq!(app.display_name, "Portal");
    assert_eq!(app.redirect_uris(), ["https://a/cb".to_owned()]);
    assert!(app.web.implicit_grant_settings.enable_access_token_issuance);
}

#[tokio::test]
async fn test_fetch_application_not_found() {
    let (server, _, graph) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .mount(&server)
        .await;

    let result = graph.fetch_application(&bearer(), "missing").await;

    match result {
        Err(Error::NotFound { ref app_id }) => assert_eq!(app_id, "missing"),
        other => panic!("expected NotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_application_unauthorized() {
    let (server, _, graph) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("InvalidAuthenticationToken"))
        .mount(&server)
        .await;

    let result = graph.fetch_application(&bearer(), "app-1").await;
    assert!(result.as_ref().is_err_and(Error::is_auth_expired), "got: {result:?}");
}

// ── Replace ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_replace_application_no_content() {
    let (server, _, graph) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/v1.0/applications/obj-1"))
        .and(header("Content-Type", "application/json"))
        .and(body_string_contains("https://b/cb"))
        .and(body_string_contains("implicitGrantSettings"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let app: redirectctl_api::Application =
        serde_json::from_value(application(&["https://a/cb"])).unwrap();
    let next = app.with_redirect_uris(vec!["https://a/cb".into(), "https://b/cb".into()]);

    graph
        .replace_application(&bearer(), &next, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_replace_application_sends_if_match() {
    let (server, _, graph) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/v1.0/applications/obj-1"))
        .and(header("If-Match", "W/\"v1\""))
        .respond_with(ResponseTemplate::new(412))
        .mount(&server)
        .await;

    let app: redirectctl_api::Application =
        serde_json::from_value(application(&["https://a/cb"])).unwrap();

    let result = graph
        .replace_application(&bearer(), &app, Some("W/\"v1\""))
        .await;

    assert!(
        matches!(result, Err(Error::PreconditionFailed { ref id }) if id == "obj-1"),
        "expected PreconditionFailed, got: {result:?}"
    );
}

#[tokio::test]
async fn test_replace_application_ok_is_not_success() {
    let (server, _, graph) = setup().await;

    Mock::given(method("PATCH"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let app: redirectctl_api::Application =
        serde_json::from_value(application(&[])).unwrap();

    let result = graph.replace_application(&bearer(), &app, None).await;

    match result {
        Err(Error::Rejected { status, method, .. }) => {
            assert_eq!(status, 200);
            assert_eq!(method, "PATCH");
        }
        other => panic!("expected Rejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_replace_application_bad_request_carries_body() {
    let (server, _, graph) = setup().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": "Request_BadRequest", "message": "Invalid value specified for property 'redirectUris'" }
        })))
        .mount(&server)
        .await;

    let app: redirectctl_api::Application =
        serde_json::from_value(application(&["not a uri"])).unwrap();

    let err = graph
        .replace_application(&bearer(), &app, None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(!err.is_transient());
    assert!(err.to_string().contains("Request_BadRequest"));
}
