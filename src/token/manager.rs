use std::time::Duration;

use reqwest::Url;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, KeyValueStore, Store};
use crate::config::settings::BrokerConfig;
use crate::error::{BrokerError, BrokerResult};
use crate::observability::metrics::get_metrics;
use crate::provider::{AccessToken, ProviderClient};
use crate::token::session::SessionInfo;
use crate::utils::constants::MAX_TOKEN_TTL_SECS;

static AUTHORIZATION_ORIGIN: &str = "authorization";
static EXTENSION_ORIGIN: &str = "extension";

/// What the caller of [`TokenManager::ensure_authorized`] should do next.
#[derive(Debug, Clone)]
pub enum AuthorizationOutcome {
    /// A validated token is already cached.
    Cached(AccessToken),
    /// The end user has to go through the provider's consent screen.
    Redirect(Url),
}

/// Decides, per request, what to do with the cached access token.
///
/// The token lives under a single cache entry. Every write goes through
/// [`TokenManager::replace_token`], which deletes the old value right before
/// writing the new one, and only once the new one is in hand. Concurrent
/// replacements are last-write-wins.
#[derive(Clone)]
pub struct TokenManager {
    store: Store,
    provider: ProviderClient,
    app_url: String,
}

impl TokenManager {
    pub fn new(config: &BrokerConfig, store: Store, provider: ProviderClient) -> Self {
        Self {
            store,
            provider,
            app_url: config.app_url.clone(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn provider(&self) -> &ProviderClient {
        &self.provider
    }

    pub async fn cached_token(&self) -> BrokerResult<Option<AccessToken>> {
        Ok(self
            .store
            .get(CacheEntry::AccessToken)
            .await?
            .filter(|v| !v.is_empty())
            .map(AccessToken::new))
    }

    /// Return the cached token when the provider still accepts it, otherwise
    /// the authorization url to send the user to. A missing token is not an
    /// error.
    pub async fn ensure_authorized(&self) -> BrokerResult<AuthorizationOutcome> {
        if let Some(token) = self.cached_token().await? {
            let session = self.validate_token().await?;
            if session.is_valid() {
                debug!("cached token accepted by provider");
                return Ok(AuthorizationOutcome::Cached(token));
            }
            info!("cached token rejected: {}", session.message);
        }
        Ok(AuthorizationOutcome::Redirect(self.provider.authorization_url()))
    }

    /// Exchange an authorization code and store the resulting token.
    /// Returns the landing url the browser goes to next.
    pub async fn complete_authorization(&self, code: &str) -> BrokerResult<String> {
        if code.trim().is_empty() {
            return Err(BrokerError::MissingCode);
        }

        let token = self.provider.exchange_code(code).await?;
        self.replace_token(&token, CacheEntry::AccessToken.default_ttl(), AUTHORIZATION_ORIGIN)
            .await?;
        info!("authorization completed, token stored");
        Ok(self.app_url.clone())
    }

    /// Check the cached token against the provider.
    ///
    /// Transport failures and provider errors both read as "no session"; the
    /// provider's answer is only logged.
    pub async fn validate_token(&self) -> BrokerResult<SessionInfo> {
        let token = match self.cached_token().await? {
            Some(token) => token,
            None => return Ok(SessionInfo::no_session()),
        };

        match self.provider.lookup_identity(&token).await {
            Ok(identity) => Ok(SessionInfo::from_identity(identity)),
            Err(e) => {
                warn!("token validation failed: {}", e.payload());
                Ok(SessionInfo::no_session())
            }
        }
    }

    /// Swap the cached token for a longer-lived one.
    /// Returns the landing url the browser goes to next.
    pub async fn extend_token(&self) -> BrokerResult<String> {
        let current = self.cached_token().await?.ok_or(BrokerError::NoToken)?;

        let (token, expires_in) = self.provider.extend_token(&current).await?;
        let ttl = match expires_in {
            Some(secs) if secs > MAX_TOKEN_TTL_SECS => {
                warn!("provider lifetime of {}s for the extended token is out of range, capping", secs);
                Duration::from_secs(MAX_TOKEN_TTL_SECS)
            }
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!("provider did not state a lifetime for the extended token, using default");
                CacheEntry::AccessToken.default_ttl()
            }
        };
        self.replace_token(&token, ttl, EXTENSION_ORIGIN).await?;
        info!("token extended, valid for {}s", ttl.as_secs());
        Ok(self.app_url.clone())
    }

    /// Session for the frontend: the cached one when it names a user,
    /// otherwise a fresh validation, cached on success.
    ///
    /// The cached session is not dropped when the token is replaced; it ages
    /// out with its own lifetime.
    pub async fn session_status(&self) -> BrokerResult<SessionInfo> {
        let cached: Option<SessionInfo> = match self.store.get_json(CacheEntry::UserSession).await {
            Ok(session) => session,
            Err(e) => {
                warn!("ignoring unreadable cached session: {}", e);
                None
            }
        };
        if let Some(session) = cached.filter(|s| s.user_id.is_some()) {
            return Ok(session);
        }

        let session = self.validate_token().await?;
        if session.is_valid() {
            self.store.set_json(CacheEntry::UserSession, &session).await?;
        }
        Ok(session)
    }

    /// Delete-then-set of the token entry. Only called with a token that is
    /// already known, so a failed provider call never empties the cache.
    async fn replace_token(&self, token: &AccessToken, ttl: Duration, origin: &str) -> BrokerResult<()> {
        self.store.delete(CacheEntry::AccessToken).await?;
        self.store
            .set_with_expiry(CacheEntry::AccessToken, token.as_str(), ttl)
            .await?;
        get_metrics()
            .await
            .token_replacements
            .with_label_values(&[origin])
            .inc();
        Ok(())
    }
}
