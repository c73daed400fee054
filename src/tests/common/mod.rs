// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Client;

use crate::cache::memory::MemoryStore;
use crate::cache::{CacheEntry, KeyValueStore, Store};
use crate::config::settings::{
    BrokerConfig, GateConfig, LoggingConfig, MetricsConfig, ProtectedGate, ProviderConfig, ServerConfig,
};
use crate::provider::ProviderClient;
use crate::token::TokenManager;
use crate::utils::constants::{DEFAULT_ALLOWED_HOSTS, DEFAULT_ALLOWED_ORIGINS, DEFAULT_CORS_ORIGINS};

pub const APP_URL: &str = "https://app.example.com/";
pub const SERVICE_SECRET: &str = "test-service-secret";
pub const SECRET_HEADER: &str = "x-service-secret";
pub const ALLOWED_REFERER: &str = "https://app.motowork.xyz/";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Client that reports redirects instead of following them.
pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("reqwest client")
}

/// Provider endpoints all rooted at `base`, typically a `MockServer`.
pub fn provider_config(base: &str) -> ProviderConfig {
    let base = base.trim_end_matches('/');
    ProviderConfig {
        client_id: "test-client".to_owned(),
        client_secret: "test-secret".to_owned(),
        redirect_uri: "https://broker.example/auth/callback".to_owned(),
        authorize_url: format!("{}/oauth/authorize/", base),
        token_url: format!("{}/oauth/access_token", base),
        graph_url: base.to_owned(),
        timeout: Duration::from_secs(5),
    }
}

pub fn broker_config(base: &str) -> BrokerConfig {
    BrokerConfig {
        provider: provider_config(base),
        app_url: APP_URL.to_owned(),
        cache_url: "memory://".to_owned(),
        gates: GateConfig {
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|s| s.to_string()).collect(),
            service_secret: SERVICE_SECRET.to_owned(),
            service_secret_header: SECRET_HEADER.to_owned(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
            protected_gate: ProtectedGate::SharedSecret,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 0,
        },
        metrics: MetricsConfig {
            path: "/metrics".to_owned(),
            is_enabled: true,
        },
        logging: LoggingConfig::default(),
    }
}

/// Token manager over a fresh in-memory store.
pub fn token_manager(base: &str) -> TokenManager {
    let config = broker_config(base);
    let provider = ProviderClient::new(&config.provider).expect("provider client");
    TokenManager::new(&config, Store::Memory(MemoryStore::new()), provider)
}

pub async fn seed(store: &Store, entry: CacheEntry, value: &str) {
    store
        .set_with_expiry(entry, value, entry.default_ttl())
        .await
        .expect("seed cache");
}

pub async fn cached(store: &Store, entry: CacheEntry) -> Option<String> {
    store.get(entry).await.expect("read cache")
}
