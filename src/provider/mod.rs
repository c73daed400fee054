//! Upstream identity provider: OAuth token endpoint and Graph API.

pub mod client;
pub mod types;

pub use client::ProviderClient;
pub use types::{AccessToken, FeedItem, Identity};
