//! Bearer tokens for the Sheets API.
//!
//! [`TokenCache`] wraps a service-account token provider and refreshes a
//! minute before expiry. On refresh failure it keeps using the old token
//! while that is still technically valid.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};

// =============================================================================
// Constants
// =============================================================================

/// Refresh margin: refresh token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Token TTL used when the provider reports an unusable expiry.
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for reading and writing spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Source of bearer tokens for ledger requests.
#[async_trait]
pub trait BearerAuth: Send + Sync {
    async fn bearer_token(&self) -> LedgerResult<String>;
}

/// A fixed token. Used against local emulators and in tests.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl BearerAuth for StaticToken {
    async fn bearer_token(&self) -> LedgerResult<String> {
        Ok(self.0.clone())
    }
}

// =============================================================================
// Token Cache
// =============================================================================

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Service-account token cache.
pub struct TokenCache {
    auth: Arc<dyn TokenProvider>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            cache: RwLock::new(None),
        }
    }

    /// Build from the JSON text of a service-account key.
    pub fn from_service_account_json(json: &str) -> LedgerResult<Self> {
        let account = CustomServiceAccount::from_json(json).map_err(|e| {
            LedgerError::auth_error(format!("Failed to load service account: {}", e))
        })?;
        Ok(Self::new(Arc::new(account)))
    }

    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> LedgerResult<String> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.is_valid() {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;

        // another task may have refreshed while we waited
        if let Some(cached) = cache.as_ref() {
            if cached.is_valid() {
                return Ok(cached.access_token.clone());
            }
        }

        self.refresh_token(&mut cache).await
    }

    async fn refresh_token(&self, cache: &mut Option<CachedToken>) -> LedgerResult<String> {
        match self.auth.token(&[SHEETS_SCOPE]).await {
            Ok(token) => {
                let access_token = token.as_str().to_string();

                let now = Utc::now();
                let exp = token.expires_at();
                let expires_at = if exp > now {
                    match (exp - now).to_std() {
                        Ok(ttl) => Instant::now() + ttl,
                        Err(_) => Instant::now() + TOKEN_DEFAULT_TTL,
                    }
                } else {
                    Instant::now()
                };

                *cache = Some(CachedToken {
                    access_token: access_token.clone(),
                    expires_at,
                });

                debug!("Refreshed Sheets auth token");
                Ok(access_token)
            }
            Err(e) => {
                if let Some(cached) = cache.as_ref() {
                    if cached.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(cached.access_token.clone());
                    }
                }

                Err(LedgerError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl BearerAuth for TokenCache {
    async fn bearer_token(&self) -> LedgerResult<String> {
        self.get_token().await
    }
}
