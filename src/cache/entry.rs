use std::fmt;
use std::time::Duration;

use crate::utils::constants::DEFAULT_ENTRY_TTL_SECS;

/// Every value the broker keeps in the key-value store.
///
/// Each entry owns exactly one key and one default lifetime; nothing outside
/// this enum names a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEntry {
    /// The live provider access token. Replaced by delete-then-set only.
    AccessToken,
    /// Last successful `SessionInfo`, JSON encoded.
    UserSession,
    /// Last media page, JSON encoded.
    FeedItems,
}

impl CacheEntry {
    pub const ALL: [CacheEntry; 3] = [
        CacheEntry::AccessToken,
        CacheEntry::UserSession,
        CacheEntry::FeedItems,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CacheEntry::AccessToken => "access_token",
            CacheEntry::UserSession => "user_session",
            CacheEntry::FeedItems => "feeds_items",
        }
    }

    /// Lifetime used when the provider does not dictate one.
    pub fn default_ttl(&self) -> Duration {
        match self {
            CacheEntry::AccessToken | CacheEntry::UserSession | CacheEntry::FeedItems => {
                Duration::from_secs(DEFAULT_ENTRY_TTL_SECS)
            }
        }
    }

    pub fn as_label(&self) -> &'static str {
        self.key()
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
