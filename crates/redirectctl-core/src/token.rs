// ── Token cache ──
//
// Holds the last bearer credential with the instant it stops being usable.
// One reconciler authenticates once and reuses the token across operations
// until shortly before expiry, or until Graph answers 401.

use std::time::Duration;

use redirectctl_api::{ClientCredentials, Credential, TokenClient};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Tokens are refreshed this long before the endpoint-reported expiry.
pub const EXPIRY_SKEW: Duration = Duration::from_secs(60);

struct Cached {
    credential: Credential,
    refresh_at: Instant,
}

pub struct TokenCache {
    client: TokenClient,
    credentials: ClientCredentials,
    current: Mutex<Option<Cached>>,
}

impl TokenCache {
    pub fn new(client: TokenClient, credentials: ClientCredentials) -> Self {
        Self {
            client,
            credentials,
            current: Mutex::new(None),
        }
    }

    /// A usable credential, authenticating only when none is cached or the
    /// cached one is inside the expiry skew.
    pub async fn get(&self) -> Result<Credential, redirectctl_api::Error> {
        let mut guard = self.current.lock().await;

        if let Some(cached) = guard.as_ref() {
            if Instant::now() < cached.refresh_at {
                return Ok(cached.credential.clone());
            }
            debug!("cached token near expiry, re-authenticating");
        }

        let credential = self.client.authenticate(&self.credentials).await?;
        let refresh_at = Instant::now() + credential.expires_in().saturating_sub(EXPIRY_SKEW);
        *guard = Some(Cached {
            credential: credential.clone(),
            refresh_at,
        });
        Ok(credential)
    }

    /// Drop the cached credential. The next [`get`](Self::get) authenticates.
    pub async fn invalidate(&self) {
        *self.current.lock().await = None;
    }
}
