use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheError, Store};
use crate::error::{BrokerError, BrokerResult};
use crate::provider::FeedItem;
use crate::token::TokenManager;
use crate::utils::constants::FEED_PAGE_SIZE;

/// Serves the latest media page, from cache when possible.
#[derive(Clone)]
pub struct FeedFetcher {
    tokens: TokenManager,
    store: Store,
    page_size: u32,
}

impl FeedFetcher {
    pub fn new(tokens: TokenManager) -> Self {
        let store = tokens.store().clone();
        Self {
            tokens,
            store,
            page_size: FEED_PAGE_SIZE,
        }
    }

    /// A cache hit returns before the token is even looked at.
    pub async fn get_feed(&self) -> BrokerResult<Vec<FeedItem>> {
        match self.store.get_json::<Vec<FeedItem>>(CacheEntry::FeedItems).await {
            Ok(Some(items)) => {
                debug!("feed served from cache, {} items", items.len());
                return Ok(items);
            }
            Ok(None) => {}
            Err(e @ CacheError::Decode { .. }) => warn!("ignoring unreadable cached feed: {}", e),
            Err(e) => return Err(e.into()),
        }

        let session = self.tokens.validate_token().await?;
        if !session.is_valid() {
            return Err(BrokerError::InvalidToken);
        }
        let token = self.tokens.cached_token().await?.ok_or(BrokerError::MissingToken)?;

        let page = self
            .tokens
            .provider()
            .list_media(&token, self.page_size)
            .await
            .map_err(BrokerError::FeedFetch)?;

        match page {
            Some(items) => {
                self.store.set_json(CacheEntry::FeedItems, &items).await?;
                info!("feed refreshed, {} items cached", items.len());
                Ok(items)
            }
            None => {
                info!("provider returned no media collection, nothing cached");
                Ok(Vec::new())
            }
        }
    }
}
