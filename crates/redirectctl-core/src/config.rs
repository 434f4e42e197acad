// ── Runtime reconciliation configuration ──
//
// These types describe *how* to reach the identity platform and how hard to
// try when the remote collection moves underneath a write. They carry
// credential data but never touch disk: the CLI builds a `GraphConfig` and
// hands it in.

use std::time::Duration;

use redirectctl_api::{ClientCredentials, TlsMode};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_AUTH_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_HOST: &str = "https://graph.microsoft.com";

/// How an Update from `old` to `new` is written.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum UpdateStrategy {
    /// One fetch, one write: drop `old` and append `new` in the same
    /// replacement. No reader ever sees a list missing both.
    #[default]
    SingleReplace,
    /// Remove `old` and write, then re-fetch, append `new` and write again.
    ///
    /// Not atomic. Between the two writes the collection holds neither
    /// value, and a failure of the second write leaves it that way: the
    /// caller must re-declare the new value to converge.
    TwoPhase,
}

/// Compare-and-swap retry policy for mutating calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total fetch-modify-write attempts before giving up with `Conflict`.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// Everything needed to build a [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// Token endpoint host root.
    pub auth_host: Url,
    /// Graph API host root.
    pub graph_host: Url,
    pub credentials: ClientCredentials,
    /// Per-request upper bound. Expiry surfaces as a transient failure.
    pub timeout: Duration,
    pub tls: TlsMode,
    pub retry: RetryPolicy,
    pub update_strategy: UpdateStrategy,
}

impl GraphConfig {
    /// Public-cloud hosts with default timeout and retry policy.
    pub fn new(credentials: ClientCredentials) -> Result<Self, url::ParseError> {
        Ok(Self {
            auth_host: Url::parse(DEFAULT_AUTH_HOST)?,
            graph_host: Url::parse(DEFAULT_GRAPH_HOST)?,
            credentials,
            timeout: Duration::from_secs(30),
            tls: TlsMode::System,
            retry: RetryPolicy::default(),
            update_strategy: UpdateStrategy::default(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn update_strategy_round_trips_kebab_case() {
        assert_eq!(UpdateStrategy::TwoPhase.to_string(), "two-phase");
        assert_eq!(
            UpdateStrategy::from_str("single-replace").unwrap(),
            UpdateStrategy::SingleReplace
        );
        let parsed: UpdateStrategy = serde_json::from_str("\"two-phase\"").unwrap();
        assert_eq!(parsed, UpdateStrategy::TwoPhase);
    }
}
