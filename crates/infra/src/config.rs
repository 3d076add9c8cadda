//! Environment-driven indexer configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use coffeeclub_core::ObjectId;

pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_ERROR_RETRY_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_QUERY_PAGE_LIMIT: usize = 50;
pub const DEFAULT_MOVE_MODULE: &str = "coffee_club";
pub const DEFAULT_BREW_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            reason: reason.to_string(),
        }
    }
}

/// Chain network the indexer follows.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    pub fn fullnode_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Network::Testnet => "https://fullnode.testnet.sui.io:443",
            Network::Devnet => "https://fullnode.devnet.sui.io:443",
            Network::Localnet => "http://127.0.0.1:9000",
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" => Ok(Network::Localnet),
            other => Err(ConfigError::invalid("NETWORK", format!("unknown network `{other}`"))),
        }
    }
}

/// Where the physical coffee machine is and how to drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Network/MAC address handed to the controller (`COFFEE_MACHINE_MAC`).
    pub address: Option<String>,
    /// Controller executable (`COFFEE_CONTROLLER_PATH`).
    pub controller_path: Option<PathBuf>,
    /// Serialize brews through a single-actuator lock (`SERIALIZE_BREWS`).
    pub serialize_brews: bool,
    /// Upper bound on one controller run (`BREW_TIMEOUT_MS`).
    pub brew_timeout: Duration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: None,
            controller_path: None,
            serialize_brews: false,
            brew_timeout: Duration::from_millis(DEFAULT_BREW_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    pub network: Network,
    pub rpc_url: String,
    pub package_id: ObjectId,
    pub module: String,
    pub polling_interval: Duration,
    pub error_retry_interval: Duration,
    pub rpc_timeout: Duration,
    pub page_limit: usize,
    pub database_url: Option<String>,
    pub device: DeviceConfig,
}

impl IndexerConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let network = match get("NETWORK") {
            Some(v) => v.parse()?,
            None => Network::Testnet,
        };
        let rpc_url = get("RPC_URL").unwrap_or_else(|| network.fullnode_url().to_string());

        let package_id = get("PACKAGE_ID").ok_or(ConfigError::Missing("PACKAGE_ID"))?;
        let package_id =
            ObjectId::parse(&package_id).map_err(|e| ConfigError::invalid("PACKAGE_ID", e))?;

        let page_limit = parse_or("QUERY_PAGE_LIMIT", get("QUERY_PAGE_LIMIT"), DEFAULT_QUERY_PAGE_LIMIT)?;
        if page_limit == 0 {
            return Err(ConfigError::invalid("QUERY_PAGE_LIMIT", "must be positive"));
        }

        let serialize_brews = match get("SERIALIZE_BREWS") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::invalid("SERIALIZE_BREWS", v))?,
        };

        Ok(Self {
            network,
            rpc_url,
            package_id,
            module: get("MOVE_MODULE").unwrap_or_else(|| DEFAULT_MOVE_MODULE.to_string()),
            polling_interval: millis(
                "POLLING_INTERVAL_MS",
                get("POLLING_INTERVAL_MS"),
                DEFAULT_POLLING_INTERVAL_MS,
            )?,
            error_retry_interval: millis(
                "ERROR_RETRY_INTERVAL_MS",
                get("ERROR_RETRY_INTERVAL_MS"),
                DEFAULT_ERROR_RETRY_INTERVAL_MS,
            )?,
            rpc_timeout: millis("RPC_TIMEOUT_MS", get("RPC_TIMEOUT_MS"), DEFAULT_RPC_TIMEOUT_MS)?,
            page_limit,
            database_url: get("DATABASE_URL"),
            device: DeviceConfig {
                address: get("COFFEE_MACHINE_MAC"),
                controller_path: get("COFFEE_CONTROLLER_PATH").map(PathBuf::from),
                serialize_brews,
                brew_timeout: millis("BREW_TIMEOUT_MS", get("BREW_TIMEOUT_MS"), DEFAULT_BREW_TIMEOUT_MS)?,
            },
        })
    }
}

fn parse_or<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T::Err: core::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e| ConfigError::invalid(key, e)),
    }
}

fn millis(key: &'static str, raw: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    parse_or(key, raw, default).map(Duration::from_millis)
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
