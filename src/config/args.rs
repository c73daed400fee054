use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use reqwest::Url;

use crate::config::settings::{
    BrokerConfig, GateConfig, LogFormat, LoggingConfig, MetricsConfig, ProtectedGate, ProviderConfig,
    ServerConfig,
};
use crate::utils::constants::{
    DEFAULT_ALLOWED_HOSTS, DEFAULT_ALLOWED_ORIGINS, DEFAULT_CORS_ORIGINS, DEFAULT_PROVIDER_TIMEOUT_MS,
    INSTAGRAM_AUTHORIZE_URL, INSTAGRAM_GRAPH_URL, INSTAGRAM_TOKEN_URL,
};
use crate::utils::logging::LogLevel;

/// Every setting comes from a flag or, more commonly, the process environment.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(long, env = "INSTAGRAM_CLIENT_ID")]
    pub client_id: String,
    #[arg(long, env = "INSTAGRAM_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,
    #[arg(long, env = "INSTAGRAM_REDIRECT_URI")]
    pub redirect_uri: String,
    #[arg(long, env = "APP_URL")]
    pub app_url: String,
    #[arg(long, env = "REDIS_URL", default_value = "redis://localhost:6379")]
    pub cache_url: String,

    #[arg(long, env = "SERVICE_SECRET", hide_env_values = true)]
    pub service_secret: String,
    #[arg(long, env = "SERVICE_SECRET_HEADER", default_value = "x-service-secret")]
    pub service_secret_header: String,
    /// Comma separated; the built-in frontend list when empty.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,
    #[arg(long, env = "ALLOWED_HOSTS", value_delimiter = ',')]
    pub allowed_hosts: Vec<String>,
    #[arg(long, env = "CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
    #[arg(long, env = "PROTECTED_ROUTES_GATE", value_enum, default_value_t = ProtectedGate::SharedSecret)]
    pub protected_gate: ProtectedGate,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value_t = 3081)]
    pub port: u16,

    #[arg(long, env = "INSTAGRAM_AUTHORIZE_URL", default_value = INSTAGRAM_AUTHORIZE_URL)]
    pub authorize_url: String,
    #[arg(long, env = "INSTAGRAM_TOKEN_URL", default_value = INSTAGRAM_TOKEN_URL)]
    pub token_url: String,
    #[arg(long, env = "INSTAGRAM_GRAPH_URL", default_value = INSTAGRAM_GRAPH_URL)]
    pub graph_url: String,
    #[arg(long, env = "PROVIDER_TIMEOUT_MS", default_value_t = DEFAULT_PROVIDER_TIMEOUT_MS)]
    pub provider_timeout_ms: u64,

    #[arg(long, env = "METRICS_ENABLED")]
    pub metrics: bool,
    #[arg(long, env = "METRICS_PATH", default_value = "/metrics")]
    pub metrics_path: String,

    #[arg(long, env = "LOG_LEVEL", value_enum)]
    pub log_level: Option<LogLevel>,
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Args {
    /// Validate and turn the raw arguments into the service configuration.
    pub fn into_config(self) -> Result<BrokerConfig> {
        let mut errors: Vec<String> = Vec::new();

        for (name, value) in [
            ("client id", &self.client_id),
            ("client secret", &self.client_secret),
            ("redirect uri", &self.redirect_uri),
            ("app url", &self.app_url),
            ("service secret", &self.service_secret),
            ("service secret header", &self.service_secret_header),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{} must not be empty", name));
            }
        }
        for (name, value) in [
            ("authorize url", &self.authorize_url),
            ("token url", &self.token_url),
            ("graph url", &self.graph_url),
        ] {
            if let Err(e) = Url::parse(value) {
                errors.push(format!("{} '{}' is not a valid url: {}", name, value, e));
            }
        }
        if self.provider_timeout_ms == 0 {
            errors.push("provider timeout must be greater than zero".to_owned());
        }
        if !self.metrics_path.starts_with('/') {
            errors.push(format!("metrics path '{}' must start with '/'", self.metrics_path));
        }
        if !errors.is_empty() {
            bail!("config is not valid: {}", errors.join("; "));
        }

        Ok(BrokerConfig {
            provider: ProviderConfig {
                client_id: self.client_id,
                client_secret: self.client_secret,
                redirect_uri: self.redirect_uri,
                authorize_url: self.authorize_url,
                token_url: self.token_url,
                graph_url: self.graph_url.trim_end_matches('/').to_owned(),
                timeout: Duration::from_millis(self.provider_timeout_ms),
            },
            app_url: self.app_url,
            cache_url: self.cache_url,
            gates: GateConfig {
                allowed_origins: or_defaults(self.allowed_origins, DEFAULT_ALLOWED_ORIGINS),
                allowed_hosts: or_defaults(self.allowed_hosts, DEFAULT_ALLOWED_HOSTS),
                service_secret: self.service_secret,
                service_secret_header: self.service_secret_header.to_lowercase(),
                cors_origins: or_defaults(self.cors_origins, DEFAULT_CORS_ORIGINS),
                protected_gate: self.protected_gate,
            },
            server: ServerConfig {
                host: self.host,
                port: self.port,
            },
            metrics: MetricsConfig {
                path: self.metrics_path,
                is_enabled: self.metrics,
            },
            logging: LoggingConfig::new(
                self.log_level.unwrap_or(LogLevel::INFO).as_str().to_lowercase(),
                self.log_format,
            ),
        })
    }
}

fn or_defaults(values: Vec<String>, defaults: &[&str]) -> Vec<String> {
    let values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        defaults.iter().map(|v| v.to_string()).collect()
    } else {
        values
    }
}
