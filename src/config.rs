use std::str::FromStr;

use anyhow::{Context, Result};

use crate::commerce::status::StatusPolicy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreBackend,
    pub database: DatabaseConfig,
    pub gateway: GatewayConfig,
    pub orders: OrderSettings,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("Unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .context("DATABASE_URL must be set when STORE_BACKEND=postgres")
    }
}

#[derive(Debug, Clone)]
pub enum GatewayConfig {
    /// Tokens resolved by an external auth service.
    Remote { url: String },
    /// `token=user_uuid:role` entries.
    Static { tokens: String },
}

#[derive(Debug, Clone, Copy)]
pub struct OrderSettings {
    pub status_policy: StatusPolicy,
    pub low_stock_threshold: i32,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self {
            status_policy: StatusPolicy::Strict,
            low_stock_threshold: 5,
        }
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var_or(name, default)
        .parse()
        .map_err(|err| anyhow::anyhow!("Invalid {}: {}", name, err))
}

/// Reads the configuration from the environment. Call `bootstrap::init_env` first
/// so that a `.env` file is taken into account.
pub fn load() -> Result<AppConfig> {
    let gateway = match var("ACCESS_GATEWAY_URL") {
        Some(url) => GatewayConfig::Remote { url },
        None => GatewayConfig::Static {
            tokens: var_or("ACCESS_TOKENS", ""),
        },
    };

    Ok(AppConfig {
        server: ServerConfig {
            host: var_or("SERVER_HOST", "0.0.0.0"),
            port: parse_var("SERVER_PORT", "3000")?,
        },
        store: parse_var("STORE_BACKEND", "postgres")?,
        database: DatabaseConfig {
            url: var("DATABASE_URL"),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "10")?,
        },
        gateway,
        orders: OrderSettings {
            status_policy: parse_var("ORDER_STATUS_POLICY", "strict")?,
            low_stock_threshold: parse_var("LOW_STOCK_THRESHOLD", "5")?,
        },
    })
}
