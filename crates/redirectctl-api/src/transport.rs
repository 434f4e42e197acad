// Shared transport configuration for building reqwest::Client instances.
//
// The token client and the Graph client share TLS, timeout, and user-agent
// settings through this module, avoiding duplicated builder logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

const DEFAULT_USER_AGENT: &str = concat!("redirectctl/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the built-in webpki root store.
    #[default]
    System,
    /// Additionally trust a custom CA certificate from the given PEM file
    /// (corporate TLS-intercepting proxies).
    CustomCa(PathBuf),
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Upper bound on every request, connect through body.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl TransportConfig {
    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str());

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Join `path` onto a host root, tolerating a trailing slash on the host.
pub(crate) fn join_url(host: &url::Url, path: &str) -> Result<url::Url, Error> {
    let base = host.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(url::Url::parse(&format!("{base}/{path}"))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_trailing_slash() {
        let host = url::Url::parse("https://login.example.com/").unwrap();
        let url = join_url(&host, "/tenant/oauth2/v2.0/token").unwrap();
        assert_eq!(url.as_str(), "https://login.example.com/tenant/oauth2/v2.0/token");
    }

    #[test]
    fn join_url_keeps_host_path_prefix() {
        let host = url::Url::parse("http://127.0.0.1:9000/graph").unwrap();
        let url = join_url(&host, "v1.0/applications").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/graph/v1.0/applications");
    }

    #[test]
    fn default_user_agent_carries_version() {
        let config = TransportConfig::default();
        assert!(config.user_agent.starts_with("redirectctl/"));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
