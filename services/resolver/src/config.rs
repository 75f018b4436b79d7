use crate::logging::LogLevel;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration for the resolver service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// Upstream directory service configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Initial log level (debug, info, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output format (json, pretty)
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    /// Start the Prometheus exporter
    #[serde(default)]
    pub metrics_enabled: bool,
}

/// Upstream (UTIC) directory service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL for metadata lookups
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// Host serving the stream viewer page
    #[serde(default = "default_viewer_host")]
    pub viewer_host: String,
    /// Open data access key
    #[serde(default = "default_api_key")]
    pub api_key: String,
    /// Referer header sent with every lookup
    #[serde(default = "default_referer")]
    pub referer: String,
    /// User-Agent header sent with every lookup
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Skip TLS certificate validation (the upstream serves a broken chain)
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

/// API configuration for the resolver endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// API listen address
    #[serde(default = "default_api_host")]
    pub host: String,
    /// API listen port
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Directory of static assets served as the router fallback
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<String>,
    /// Cache-Control max-age for resolver responses
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
}

// Default value functions
fn default_service_name() -> String {
    "cctv-resolver".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_upstream_base_url() -> String {
    "http://www.utic.go.kr".to_string()
}

fn default_viewer_host() -> String {
    "www.utic.go.kr".to_string()
}

fn default_api_key() -> String {
    "spdYlAuDpMu815Bqun6bM4xMjg7gBtVChlcFWMEUGqDvbRRDx9OSu8n2gXlrj3".to_string()
}

fn default_referer() -> String {
    "https://www.utic.go.kr/guide/cctvOpenData.do".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    3000
}

fn default_static_dir() -> Option<String> {
    Some("public".to_string())
}

fn default_cache_max_age_secs() -> u64 {
    300
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Start with default values
            .set_default("service.name", "cctv-resolver")?
            .set_default("service.log_level", "info")?
            .set_default("service.metrics_port", 9090)?
            // Add config file if present
            .add_source(config::File::with_name("config/resolver").required(false))
            .add_source(config::File::with_name("/etc/cctv/resolver").required(false))
            // Override with environment variables
            // RESOLVER__UPSTREAM__TIMEOUT_SECS -> upstream.timeout_secs
            .add_source(
                config::Environment::with_prefix("RESOLVER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.service.log_level.parse::<LogLevel>().is_err() {
            return Err(ConfigValidationError::InvalidValue {
                field: "service.log_level".to_string(),
                message: "must be one of debug, info, error".to_string(),
            });
        }

        if self.upstream.api_key.is_empty() {
            return Err(ConfigValidationError::MissingField(
                "upstream.api_key".to_string(),
            ));
        }

        if !self.upstream.base_url.starts_with("http://")
            && !self.upstream.base_url.starts_with("https://")
        {
            return Err(ConfigValidationError::InvalidValue {
                field: "upstream.base_url".to_string(),
                message: "URL must start with http:// or https://".to_string(),
            });
        }

        if self.upstream.timeout_secs == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "upstream.timeout_secs".to_string(),
                message: "Timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

impl UpstreamConfig {
    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_port: default_metrics_port(),
            metrics_enabled: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            viewer_host: default_viewer_host(),
            api_key: default_api_key(),
            referer: default_referer(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            accept_invalid_certs: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_enabled: true,
            cors_origins: vec![],
            static_dir: default_static_dir(),
            cache_max_age_secs: default_cache_max_age_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            upstream: UpstreamConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}
