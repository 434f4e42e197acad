// Client-credentials token exchange
//
// One POST to `{auth_host}/{tenant}/oauth2/v2.0/token` per call. Every
// failure is explicit: a transport error, a non-2xx answer, an undecodable
// body, or an empty token never turns into a usable `Credential`.

use std::time::Duration;

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{TransportConfig, join_url};

/// Scope requested when the caller does not supply one.
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Grant type for service-to-service tokens.
pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";

/// Inputs to the client-credentials exchange.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    /// `None` falls back to [`DEFAULT_SCOPE`].
    pub scope: Option<String>,
    pub grant_type: String,
}

impl ClientCredentials {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretString,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret,
            scope: None,
            grant_type: DEFAULT_GRANT_TYPE.into(),
        }
    }

    /// The effective scope.
    pub fn scope(&self) -> &str {
        self.scope
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SCOPE)
    }

    /// Reject empty required inputs before touching the network.
    pub fn validate(&self) -> Result<(), Error> {
        if self.tenant_id.trim().is_empty() {
            return Err(Error::MissingInput { field: "tenant_id" });
        }
        if self.client_id.trim().is_empty() {
            return Err(Error::MissingInput { field: "client_id" });
        }
        if self.client_secret.expose_secret().is_empty() {
            return Err(Error::MissingInput {
                field: "client_secret",
            });
        }
        if self.grant_type.trim().is_empty() {
            return Err(Error::MissingInput {
                field: "grant_type",
            });
        }
        Ok(())
    }
}

/// Token endpoint response body.
#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    #[allow(dead_code)]
    ext_expires_in: u64,
}

/// A bearer credential for Graph.
///
/// The token itself stays behind [`SecretString`] so it never shows up
/// in `Debug` output or logs.
#[derive(Debug, Clone)]
pub struct Credential {
    access_token: SecretString,
    token_type: String,
    expires_in: Duration,
}

impl Credential {
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: Duration,
    ) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            token_type: token_type.into(),
            expires_in,
        }
    }

    /// Lifetime reported by the token endpoint at issue time.
    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    /// `Authorization` header value: `{token_type} {access_token}`.
    pub fn authorization_header(&self) -> Result<HeaderValue, Error> {
        let raw = format!("{} {}", self.token_type, self.access_token.expose_secret());
        let mut value = HeaderValue::from_str(&raw).map_err(|e| Error::TokenDecode {
            message: format!("token is not a valid header value: {e}"),
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Client for the identity platform's v2.0 token endpoint.
pub struct TokenClient {
    http: reqwest::Client,
    auth_host: Url,
    timeout: Duration,
}

impl TokenClient {
    /// Build from an auth host root (e.g. `https://login.microsoftonline.com`).
    pub fn new(auth_host: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            auth_host,
            timeout: transport.timeout,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, auth_host: Url) -> Self {
        Self {
            http,
            auth_host,
            timeout: TransportConfig::default().timeout,
        }
    }

    /// `{auth_host}/{tenant_id}/oauth2/v2.0/token`
    pub fn token_url(&self, tenant_id: &str) -> Result<Url, Error> {
        join_url(&self.auth_host, &format!("{tenant_id}/oauth2/v2.0/token"))
    }

    /// Exchange client credentials for a bearer token.
    pub async fn authenticate(&self, credentials: &ClientCredentials) -> Result<Credential, Error> {
        credentials.validate()?;

        let url = self.token_url(&credentials.tenant_id)?;
        debug!("requesting token at {url}");

        let form = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
            ("scope", credentials.scope()),
            ("grant_type", credentials.grant_type.as_str()),
        ];

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::from_send(e, self.timeout))?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::TokenRejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::TokenDecode {
                message: e.to_string(),
            })?;

        if token.access_token.is_empty() {
            return Err(Error::EmptyToken);
        }

        let token_type = if token.token_type.is_empty() {
            "Bearer".to_owned()
        } else {
            token.token_type
        };

        debug!(
            token_type = %token_type,
            expires_in = token.expires_in,
            "token acquired"
        );

        Ok(Credential::new(
            token.access_token,
            token_type,
            Duration::from_secs(token.expires_in),
        ))
    }
}
