//! # Instagram Token Broker Library
//!
//! Performs the OAuth authorization-code exchange on behalf of a frontend,
//! keeps the resulting access token in a key-value cache, extends it on
//! request and serves a cached media feed with it.
//!
//! Modules:
//! - `config` — service configuration, sourced from the environment
//! - `cache` — key-value store and its named entries
//! - `provider` — OAuth and Graph API client
//! - `token` — access token lifecycle
//! - `feed` — cached media feed
//! - `gate` — per-route request checks
//! - `server` — HTTP routes

pub mod cache;
pub mod config;
pub mod error;
pub mod feed;
pub mod gate;
pub mod observability;
pub mod provider;
pub mod server;
pub mod tests;
pub mod token;
pub mod utils;

pub use crate::config::settings::BrokerConfig;
pub use crate::error::{BrokerError, BrokerResult, UpstreamError};
