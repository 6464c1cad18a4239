// Configuration
// Read from the environment (after `.env` is loaded by `main`).

use crate::execution::{DEFAULT_GAS_LIMIT, DEFAULT_SONIC_RPC};
use crate::price::DEFAULT_COINGECKO_API_URL;
use crate::wallet::{self, ServiceWallet, WalletError};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_TOKEN_ID: &str = "sonic-3";
pub const DEFAULT_CURRENCY: &str = "usd";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// The signing key as configured, before it is decrypted.
#[derive(Clone)]
pub enum ServiceKey {
    Plain(String),
    Encrypted { ciphertext: String, master_key: String },
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKey::Plain(_) => f.write_str("ServiceKey::Plain(..)"),
            ServiceKey::Encrypted { .. } => f.write_str("ServiceKey::Encrypted(..)"),
        }
    }
}

impl ServiceKey {
    pub fn load(&self) -> Result<ServiceWallet, WalletError> {
        match self {
            ServiceKey::Plain(hex) => ServiceWallet::from_hex(hex),
            ServiceKey::Encrypted { ciphertext, master_key } => {
                ServiceWallet::from_encrypted(ciphertext, master_key)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub coingecko_api_url: String,
    pub token_id: String,
    pub currency: String,
    pub price_history_days: u32,
    pub rpc_url: String,
    pub recipient_address: String,
    pub service_key: ServiceKey,
    pub gas_limit: u64,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let recipient = get("RECIPIENT_ADDRESS").ok_or(ConfigError::Missing("RECIPIENT_ADDRESS"))?;
        let recipient_address =
            wallet::normalize_address(&recipient).map_err(|e| ConfigError::Invalid {
                key: "RECIPIENT_ADDRESS",
                value: recipient.clone(),
                reason: e.to_string(),
            })?;

        let private_key = get("SERVICE_PRIVATE_KEY").ok_or(ConfigError::Missing("SERVICE_PRIVATE_KEY"))?;
        let service_key = match get("MASTER_ENCRYPTION_KEY") {
            Some(master_key) => ServiceKey::Encrypted {
                ciphertext: private_key,
                master_key,
            },
            None => ServiceKey::Plain(private_key),
        };

        Ok(Self {
            port: parse_or(&get, "PORT", 3000)?,
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            coingecko_api_url: get("COINGECKO_API_URL")
                .unwrap_or_else(|| DEFAULT_COINGECKO_API_URL.to_string()),
            token_id: get("TOKEN_ID").unwrap_or_else(|| DEFAULT_TOKEN_ID.to_string()),
            currency: get("CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            price_history_days: parse_or(&get, "PRICE_HISTORY_DAYS", 30)?,
            rpc_url: get("SONIC_RPC").unwrap_or_else(|| DEFAULT_SONIC_RPC.to_string()),
            recipient_address,
            service_key,
            gas_limit: parse_or(&get, "GAS_LIMIT", DEFAULT_GAS_LIMIT)?,
            static_dir: get("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public")),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: value.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
