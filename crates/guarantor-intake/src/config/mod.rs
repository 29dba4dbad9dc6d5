use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use url::Url;

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

const DEFAULT_SUBMIT_URL: &str = "http://127.0.0.1:8080/externalform/pg";
const DEFAULT_ZIP_LOOKUP_URL: &str = "http://127.0.0.1:8080/externalform/zip";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Top-level configuration for the intake client and its sandbox.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub gateway: GatewayConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let submit_url = endpoint_var("INTAKE_SUBMIT_URL", DEFAULT_SUBMIT_URL)?;
        let zip_lookup_url = endpoint_var("INTAKE_ZIP_LOOKUP_URL", DEFAULT_ZIP_LOOKUP_URL)?;
        let timeout_secs = match env::var("INTAKE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            gateway: GatewayConfig {
                submit_url,
                zip_lookup_url,
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn endpoint_var(name: &'static str, default: &str) -> Result<String, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    let value = value.trim();
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(value.to_string())
        }
        _ => Err(ConfigError::InvalidEndpoint { name }),
    }
}

/// Settings controlling the sandbox HTTP server binding.
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Remote endpoints the intake client talks to.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub submit_url: String,
    pub zip_lookup_url: String,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidEndpoint { name: &'static str },
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidEndpoint { name } => {
                write!(f, "{name} must be an absolute http:// or https:// URL")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "INTAKE_TIMEOUT_SECS must be a positive number of seconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidEndpoint { .. }
            | ConfigError::InvalidTimeout => None,
        }
    }
}
