use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

/// ================================
/// Full service configuration
/// ================================
///
/// Built once at startup and handed by reference to every constructor.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub provider: ProviderConfig,
    /// Landing page the browser is sent to after a successful token write.
    pub app_url: String,
    /// Cache connection string, `redis://...` or `memory://`.
    pub cache_url: String,
    pub gates: GateConfig,
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// ================================
/// Provider
/// ================================
#[derive(Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    /// Graph API root, without trailing slash.
    pub graph_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .field("graph_url", &self.graph_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// ================================
/// Request gates
/// ================================
#[derive(Clone)]
pub struct GateConfig {
    /// Exact `Referer` values accepted by the origin gate.
    pub allowed_origins: Vec<String>,
    /// Exact `Host` values accepted by the host gate.
    pub allowed_hosts: Vec<String>,
    pub service_secret: String,
    pub service_secret_header: String,
    pub cors_origins: Vec<String>,
    /// Gate in front of `/get-feeds` and `/session/status`.
    pub protected_gate: ProtectedGate,
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("allowed_origins", &self.allowed_origins)
            .field("allowed_hosts", &self.allowed_hosts)
            .field("service_secret", &"***")
            .field("service_secret_header", &self.service_secret_header)
            .field("cors_origins", &self.cors_origins)
            .field("protected_gate", &self.protected_gate)
            .finish()
    }
}

/// Strategy guarding the service-to-service routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProtectedGate {
    /// A header must carry the shared secret.
    SharedSecret,
    /// The `Host` header must be one of the allowed hosts.
    Host,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub path: String,
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Compact,
}

pub fn default_metrics_path() -> String {
    "/metrics".to_string()
}
