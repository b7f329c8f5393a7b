//! Server and registry configuration.
//!
//! All environment access happens here, once, at startup. Components receive
//! validated config structs; nothing else in the crate reads the
//! environment.

use std::time::Duration;

use thiserror::Error;

/// Rejected server configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} environment variable is not set or is empty")]
    MissingVar { var: &'static str },

    #[error("invalid {var} value: {value}")]
    InvalidVar { var: &'static str, value: String },

    #[error("invalid or empty wallet address: {0}")]
    InvalidWallet(String),
}

/// HTTP serving configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// How long one request handler waits on its completion gate before
    /// answering 408. Bounded so a stalled batch can never pin a connection
    /// forever.
    pub wait_timeout: Duration,

    /// Service-registry settings; `None` runs unregistered.
    pub registry: Option<RegistryConfig>,
}

/// Settings for the nacos-style service registry client.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Registry server as `host:port`.
    pub server_addr: String,

    pub username: String,
    pub password: String,

    /// Name this instance registers under.
    pub service_name: String,

    /// Address advertised to the registry; must be reachable by peers, so
    /// it is configured rather than sniffed.
    pub public_ip: String,

    /// Port advertised to the registry.
    pub port: u16,

    /// Operator wallet, sent as instance metadata.
    pub wallet_address: String,

    /// Registration attempts before giving up.
    pub max_retries: u32,

    /// Fixed pause between registration attempts.
    pub retry_backoff: Duration,

    /// Pause between liveness beats.
    pub heartbeat_interval: Duration,
}

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SERVICE_NAME: &str = "robata-inference";
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_MAX_RETRIES: u32 = 5;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            registry: None,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    ///
    /// Recognized variables: `HOST`, `PORT`, `NACOS_SERVER`,
    /// `NACOS_USERNAME`, `NACOS_PASSWORD`, `SERVICE_NAME`, `PUBLIC_IP`,
    /// `WALLET_ADDRESS`. Registration is enabled when `NACOS_SERVER` is
    /// set, and then `PUBLIC_IP` and a well-formed `WALLET_ADDRESS` become
    /// mandatory.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`], reading variables through `lookup` instead of
    /// the process environment.
    ///
    /// [`from_env`]: ServerConfig::from_env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nonempty = |var: &'static str| lookup(var).filter(|v| !v.is_empty());

        let host = nonempty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match nonempty("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::InvalidVar {
                var: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let registry = match nonempty("NACOS_SERVER") {
            None => None,
            Some(server_addr) => {
                let public_ip =
                    nonempty("PUBLIC_IP").ok_or(ConfigError::MissingVar { var: "PUBLIC_IP" })?;
                let wallet_address = nonempty("WALLET_ADDRESS")
                    .ok_or(ConfigError::MissingVar { var: "WALLET_ADDRESS" })?;
                if !is_wallet_address(&wallet_address) {
                    return Err(ConfigError::InvalidWallet(wallet_address));
                }

                Some(RegistryConfig {
                    server_addr,
                    username: nonempty("NACOS_USERNAME").unwrap_or_default(),
                    password: nonempty("NACOS_PASSWORD").unwrap_or_default(),
                    service_name: nonempty("SERVICE_NAME")
                        .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
                    public_ip,
                    port,
                    wallet_address,
                    max_retries: DEFAULT_MAX_RETRIES,
                    retry_backoff: DEFAULT_RETRY_BACKOFF,
                    heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
                })
            }
        };

        Ok(Self {
            host,
            port,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            registry,
        })
    }

    /// Socket address string for binding.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Checksum-agnostic EVM address shape: `0x` followed by 40 hex digits.
fn is_wallet_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}
