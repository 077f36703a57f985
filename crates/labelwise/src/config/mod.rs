use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub catalogs: CatalogConfig,
    pub enhancer: EnhancerConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let food_base_url = env::var("FOOD_CATALOG_URL")
            .unwrap_or_else(|_| "https://world.openfoodfacts.org".to_string());
        let beauty_base_url = env::var("BEAUTY_CATALOG_URL")
            .unwrap_or_else(|_| "https://world.openbeautyfacts.org".to_string());
        let upc_base_url = env::var("UPC_CATALOG_URL")
            .unwrap_or_else(|_| "https://api.upcitemdb.com".to_string());
        let upc_timeout_secs = env::var("UPC_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        let api_key = env::var("ENHANCER_API_KEY").ok().filter(|key| !key.trim().is_empty());
        let enhancer_base_url = env::var("ENHANCER_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com".to_string());
        let model = env::var("ENHANCER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            catalogs: CatalogConfig {
                food_base_url,
                beauty_base_url,
                upc_base_url,
                upc_timeout_secs,
            },
            enhancer: EnhancerConfig {
                api_key,
                base_url: enhancer_base_url,
                model,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Base URLs and latency bounds for the external product catalogs.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub food_base_url: String,
    pub beauty_base_url: String,
    pub upc_base_url: String,
    pub upc_timeout_secs: u64,
}

impl CatalogConfig {
    pub fn upc_timeout(&self) -> Duration {
        Duration::from_secs(self.upc_timeout_secs)
    }
}

/// Credentials and endpoint for the optional semantic enhancement service.
/// An absent API key means the enhancer runs in its disabled mode.
#[derive(Debug, Clone)]
pub struct EnhancerConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl EnhancerConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidTimeout,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidTimeout => {
                write!(f, "UPC_TIMEOUT_SECS must be a valid number of seconds")
            }
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTimeout => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
