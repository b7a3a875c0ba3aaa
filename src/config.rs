// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and validated
//! before anything binds or connects. Any invalid value aborts startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `DASHBOARD_PROJECT_ID` | Project whose gas tank authenticates dashboard users | Required |
//! | `DASHBOARD_ORIGIN` | Allowed dashboard origin (empty = any) | empty |
//! | `DASHBOARD_CHAIN_ID` | Chain of the dashboard gas tank | `5` |
//! | `PROVIDER_URL_<CHAIN>` | JSON-RPC endpoint per chain (`GOERLI`, `OPTIMISM`, `POLYGON`, `CELO`) | unset |
//! | `NONCE_TTL_SECS` | Nonce session lifetime | `3600` |
//! | `CHAIN_READ_TIMEOUT_SECS` | Timeout of `owner()` reads | `10` |
//! | `TX_ENGINE_URL` | Base URL of the transaction engine | Required |
//! | `PROJECTS_FILE` | JSON file backing the project store | in-memory store |
//! | `SESSION_SWEEP_SECS` | Interval of the expired-session sweeper | `300` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::blockchain::{ChainTable, SUPPORTED_CHAINS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const DASHBOARD_PROJECT_ID_ENV: &str = "DASHBOARD_PROJECT_ID";
pub const DASHBOARD_ORIGIN_ENV: &str = "DASHBOARD_ORIGIN";
pub const DASHBOARD_CHAIN_ID_ENV: &str = "DASHBOARD_CHAIN_ID";
/// Prefix of the per-chain endpoint variables; the suffix is the upper-cased chain name.
pub const PROVIDER_URL_PREFIX: &str = "PROVIDER_URL_";
pub const NONCE_TTL_ENV: &str = "NONCE_TTL_SECS";
pub const CHAIN_READ_TIMEOUT_ENV: &str = "CHAIN_READ_TIMEOUT_SECS";
pub const TX_ENGINE_URL_ENV: &str = "TX_ENGINE_URL";
pub const PROJECTS_FILE_ENV: &str = "PROJECTS_FILE";
pub const SESSION_SWEEP_ENV: &str = "SESSION_SWEEP_SECS";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DASHBOARD_CHAIN_ID: u64 = 5;
const DEFAULT_NONCE_TTL_SECS: u64 = 3600;
const DEFAULT_CHAIN_READ_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: String, reason: String },

    #[error("no provider endpoint configured for dashboard chain {0}")]
    DashboardChainUnavailable(u64),
}

fn invalid(var: impl Into<String>, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var: var.into(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "" => Ok(LogFormat::Pretty),
            other => Err(format!("expected 'json' or 'pretty', got '{other}'")),
        }
    }
}

/// Where and how dashboard operators authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub project_id: String,
    pub chain_id: u64,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

/// Validated startup configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub dashboard: DashboardSettings,
    pub chains: ChainTable,
    pub nonce_ttl: Duration,
    pub chain_read_timeout: Duration,
    pub tx_engine_url: Url,
    pub projects_file: Option<PathBuf>,
    pub session_sweep_interval: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or(&get, PORT_ENV, DEFAULT_PORT)?;
        let bind_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .map_err(|e| invalid(HOST_ENV, e))?;

        let log_format: LogFormat = get(LOG_FORMAT_ENV)
            .map(|raw| raw.parse::<LogFormat>().map_err(|e| invalid(LOG_FORMAT_ENV, e)))
            .transpose()?
            .unwrap_or_default();

        let mut chains = ChainTable::new();
        for chain in SUPPORTED_CHAINS {
            let var = format!("{PROVIDER_URL_PREFIX}{}", chain.name.to_ascii_uppercase());
            if let Some(raw) = get(var.as_str()) {
                let url = Url::parse(&raw).map_err(|e| invalid(var.as_str(), e))?;
                chains.insert(chain, url);
            }
        }

        let dashboard_chain_id = parse_or(&get, DASHBOARD_CHAIN_ID_ENV, DEFAULT_DASHBOARD_CHAIN_ID)?;
        if !chains.contains(dashboard_chain_id) {
            return Err(ConfigError::DashboardChainUnavailable(dashboard_chain_id));
        }
        let dashboard = DashboardSettings {
            project_id: get(DASHBOARD_PROJECT_ID_ENV)
                .ok_or(ConfigError::Missing(DASHBOARD_PROJECT_ID_ENV))?,
            chain_id: dashboard_chain_id,
            allowed_origins: get(DASHBOARD_ORIGIN_ENV).into_iter().collect(),
        };

        let tx_engine_url = get(TX_ENGINE_URL_ENV)
            .ok_or(ConfigError::Missing(TX_ENGINE_URL_ENV))
            .and_then(|raw| Url::parse(&raw).map_err(|e| invalid(TX_ENGINE_URL_ENV, e)))?;

        Ok(Self {
            bind_addr,
            log_format,
            dashboard,
            chains,
            nonce_ttl: seconds(&get, NONCE_TTL_ENV, DEFAULT_NONCE_TTL_SECS)?,
            chain_read_timeout: seconds(&get, CHAIN_READ_TIMEOUT_ENV, DEFAULT_CHAIN_READ_TIMEOUT_SECS)?,
            tx_engine_url,
            projects_file: get(PROJECTS_FILE_ENV).map(PathBuf::from),
            session_sweep_interval: seconds(&get, SESSION_SWEEP_ENV, DEFAULT_SESSION_SWEEP_SECS)?,
        })
    }
}

fn parse_or<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw.parse().map_err(|e: T::Err| invalid(var, e)),
        None => Ok(default),
    }
}

/// A positive number of seconds.
fn seconds<G>(get: &G, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match parse_or(get, var, default)? {
        0 => Err(invalid(var, "must be greater than zero")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("DASHBOARD_PROJECT_ID", "dashboard"),
        ("PROVIDER_URL_GOERLI", "https://goerli.example"),
        ("TX_ENGINE_URL", "http://engine:3000"),
    ];

    #[test]
    fn minimal_environment_uses_defaults() {
        let config = GatewayConfig::from_lookup(env(MINIMAL)).unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.dashboard.chain_id, 5);
        assert!(config.dashboard.allowed_origins.is_empty());
        assert_eq!(config.nonce_ttl, Duration::from_secs(3600));
        assert_eq!(config.chain_read_timeout, Duration::from_secs(10));
        assert!(config.projects_file.is_none());
        assert!(config.chains.contains(5));
        assert!(!config.chains.contains(137));
    }

    #[test]
    fn overrides_are_applied() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend([
            ("PORT", "9000"),
            ("LOG_FORMAT", "JSON"),
            ("DASHBOARD_ORIGIN", "https://dashboard.example"),
            ("PROVIDER_URL_POLYGON", "https://polygon.example"),
            ("DASHBOARD_CHAIN_ID", "137"),
            ("NONCE_TTL_SECS", "60"),
            ("PROJECTS_FILE", "/var/lib/gateway/projects.json"),
        ]);
        let config = GatewayConfig::from_lookup(env(&pairs)).unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.dashboard.chain_id, 137);
        assert_eq!(
            config.dashboard.allowed_origins,
            vec!["https://dashboard.example"]
        );
        assert_eq!(config.nonce_ttl, Duration::from_secs(60));
        assert_eq!(
            config.projects_file,
            Some(PathBuf::from("/var/lib/gateway/projects.json"))
        );
    }

    #[test]
    fn required_variables_are_enforced() {
        let err = GatewayConfig::from_lookup(env(&[
            ("PROVIDER_URL_GOERLI", "https://goerli.example"),
            ("TX_ENGINE_URL", "http://engine:3000"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Missing("DASHBOARD_PROJECT_ID"));

        let err = GatewayConfig::from_lookup(env(&MINIMAL[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("TX_ENGINE_URL"));
    }

    #[test]
    fn dashboard_chain_needs_an_endpoint() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("DASHBOARD_CHAIN_ID", "10"));

        assert_eq!(
            GatewayConfig::from_lookup(env(&pairs)).unwrap_err(),
            ConfigError::DashboardChainUnavailable(10)
        );
    }

    #[test]
    fn malformed_values_abort() {
        for (var, value) in [
            ("PORT", "http"),
            ("NONCE_TTL_SECS", "0"),
            ("PROVIDER_URL_CELO", "not a url"),
            ("LOG_FORMAT", "xml"),
        ] {
            let mut pairs = MINIMAL.to_vec();
            pairs.push((var, value));
            let err = GatewayConfig::from_lookup(env(&pairs)).unwrap_err();
            assert!(
                matches!(&err, ConfigError::Invalid { var: v, .. } if v == var),
                "{var}: {err}"
            );
        }
    }
}
