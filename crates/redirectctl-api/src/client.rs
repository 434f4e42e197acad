// Graph `applications` accessor
//
// Graph has no endpoint for adding or removing a single redirect URI. Every
// mutation is a full-object PATCH, so callers always fetch, modify, and
// write back the whole `Application` this module hands them.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue, IF_MATCH};
use serde::de::DeserializeOwned;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::Credential;
use crate::error::Error;
use crate::models::{Application, ApplicationList};
use crate::transport::{TransportConfig, join_url};

/// Fields the reconciliation path needs from an application.
const SELECT_FIELDS: &str = "id,appId,displayName,web";

/// Async client for the Graph v1.0 `applications` collection.
pub struct GraphClient {
    http: reqwest::Client,
    graph_host: Url,
    timeout: Duration,
}

impl GraphClient {
    /// Build from a Graph host root (e.g. `https://graph.microsoft.com`).
    pub fn new(graph_host: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            graph_host,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, graph_host: Url) -> Self {
        Self {
            http,
            graph_host,
            timeout: TransportConfig::default().timeout,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Lookup URL filtering on `appId`.
    ///
    /// Single quotes are doubled per OData string-literal rules. Every
    /// parameter is form-encoded, so `&`, `#` and `+` in `app_id` stay
    /// inside the filter literal.
    pub fn lookup_url(&self, app_id: &str) -> Result<Url, Error> {
        let literal = app_id.replace('\'', "''");
        let mut url = join_url(&self.graph_host, "v1.0/applications")?;
        url.query_pairs_mut()
            .append_pair("$count", "true")
            .append_pair("$select", SELECT_FIELDS)
            .append_pair("$filter", &format!("appId eq '{literal}'"));
        Ok(url)
    }

    /// `PATCH` target for an application's object ID.
    pub fn application_url(&self, id: &str) -> Result<Url, Error> {
        join_url(&self.graph_host, &format!("v1.0/applications/{id}"))
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch the application whose `appId` is `app_id`.
    ///
    /// `appId` is unique per tenant, so more than one match means the
    /// filter was bypassed somewhere; the first result wins and a warning
    /// is logged.
    pub async fn fetch_application(
        &self,
        credential: &Credential,
        app_id: &str,
    ) -> Result<Application, Error> {
        let url = self.lookup_url(app_id)?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url.clone())
            .header(AUTHORIZATION, credential.authorization_header()?)
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        let list: ApplicationList = self.read_json(resp, "GET", &url).await?;

        if list.value.len() > 1 {
            warn!(
                app_id,
                matches = list.value.len(),
                "appId filter matched more than one application, using the first"
            );
        }
        trace!(count = ?list.count, "application lookup complete");

        list.value.into_iter().next().ok_or_else(|| Error::NotFound {
            app_id: app_id.to_owned(),
        })
    }

    /// Replace the application with `application`, keyed by its object ID.
    ///
    /// With `if_match` set, Graph refuses the write with 412 when the entity
    /// changed since that version was read. Success is strictly
    /// `204 No Content`.
    pub async fn replace_application(
        &self,
        credential: &Credential,
        application: &Application,
        if_match: Option<&str>,
    ) -> Result<(), Error> {
        let url = self.application_url(&application.id)?;
        debug!("PATCH {url}");
        trace!(
            redirect_uris = ?application.web.redirect_uris,
            "replacement body"
        );

        let mut builder = self
            .http
            .patch(url.clone())
            .header(AUTHORIZATION, credential.authorization_header()?)
            .json(application);

        if let Some(etag) = if_match {
            let value = HeaderValue::from_str(etag).map_err(|e| Error::Deserialization {
                message: format!("etag is not a valid header value: {e}"),
                body: etag.to_owned(),
            })?;
            builder = builder.header(IF_MATCH, value);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        match resp.status() {
            StatusCode::NO_CONTENT => Ok(()),
            StatusCode::PRECONDITION_FAILED => Err(Error::PreconditionFailed {
                id: application.id.clone(),
            }),
            StatusCode::UNAUTHORIZED => Err(Error::Unauthorized {
                message: resp.text().await.unwrap_or_default(),
            }),
            status => Err(Error::Rejected {
                method: "PATCH",
                url: url.to_string(),
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            }),
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn read_json<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
        method: &'static str,
        url: &Url,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized {
                message: resp.text().await.unwrap_or_default(),
            });
        }

        if !status.is_success() {
            return Err(Error::Rejected {
                method,
                url: url.to_string(),
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> GraphClient {
        GraphClient::with_client(
            reqwest::Client::new(),
            Url::parse("https://graph.example.com").unwrap(),
        )
    }

    fn filter(url: &Url) -> String {
        url.query_pairs()
            .find(|(k, _)| k == "$filter")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn lookup_url_carries_select_and_count() {
        let url = client().lookup_url("app-1").unwrap();
        assert_eq!(url.path(), "/v1.0/applications");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("$count".to_owned(), "true".to_owned()),
                ("$select".to_owned(), SELECT_FIELDS.to_owned()),
                ("$filter".to_owned(), "appId eq 'app-1'".to_owned()),
            ]
        );
    }

    #[test]
    fn lookup_url_keeps_reserved_characters_in_filter() {
        let url = client().lookup_url("abc&$top=0").unwrap();
        assert_eq!(filter(&url), "appId eq 'abc&$top=0'");
        assert_eq!(url.query_pairs().count(), 3);

        let url = client().lookup_url("abc#frag").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(filter(&url), "appId eq 'abc#frag'");

        let url = client().lookup_url("a+b").unwrap();
        assert_eq!(filter(&url), "appId eq 'a+b'");
    }

    #[test]
    fn lookup_url_doubles_single_quotes() {
        let url = client().lookup_url("o'brien").unwrap();
        assert_eq!(filter(&url), "appId eq 'o''brien'");
    }
}
