// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults and the typed configuration loaded
//! from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the ledger database | `/data` |
//! | `RPC_URL` | EVM JSON-RPC endpoint | Required |
//! | `CHAIN_ID` | Chain id bound into the signing domain | Required |
//! | `GATEWAY_ADDRESS` | Verifying contract bound into the signing domain | Required |
//! | `OWNER_ADDRESS` | Sole administrator | Required |
//! | `TREASURY_ADDRESS` | Account withdrawals are paid from | Required |
//! | `OPERATOR_KEY_PATH` | PEM key that signs treasury transfers | Required |
//! | `TOKEN_ADDRESS` / `TOKEN_DECIMALS` | Quota-controlled asset | Required / `18` |
//! | `STABLE_ADDRESS` / `STABLE_DECIMALS` | Feed-priced asset | Required / `6` |
//! | `WETH_ADDRESS` | Wrapped ether, the token pool's quote asset | Required |
//! | `POOL_ADDRESS` | Token/WETH averaging pool | Required |
//! | `ETH_USD_FEED` / `STABLE_USD_FEED` | USD price feeds | Required |
//! | `MARKUP_BPS` | Fee markup over gas cost | `1500` |
//! | `GAS_OVERHEAD` | Gas added to every fee estimate | `50000` |
//! | `DAILY_LIMIT` | Per-user daily cap in token base units | Required |
//! | `AVERAGING_WINDOW_SECS` | Pool averaging window | `1800` |
//! | `MAX_ORACLE_DELAY_SECS` | Maximum feed answer age | `3600` |
//! | `FEE_COLLECTOR` | Receiver of fees | Required |
//! | `TRUSTED_SIGNERS` | Comma-separated signer addresses seeded at startup | empty |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | Serve HTTPS with these PEM files | unset (HTTP) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! `MARKUP_BPS` and `GAS_OVERHEAD` are read on every start. `DAILY_LIMIT`,
//! `AVERAGING_WINDOW_SECS`, `MAX_ORACLE_DELAY_SECS` and `FEE_COLLECTOR` only
//! seed a fresh ledger; afterwards the persisted values win and change
//! through the administrative operations.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::{Address, U256};

use crate::gateway::{AssetInfo, AssetTable, GatewayParams};
use crate::ledger::RuntimeSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const GATEWAY_ADDRESS_ENV: &str = "GATEWAY_ADDRESS";
pub const OWNER_ADDRESS_ENV: &str = "OWNER_ADDRESS";
pub const TREASURY_ADDRESS_ENV: &str = "TREASURY_ADDRESS";
pub const OPERATOR_KEY_PATH_ENV: &str = "OPERATOR_KEY_PATH";
pub const TOKEN_ADDRESS_ENV: &str = "TOKEN_ADDRESS";
pub const TOKEN_DECIMALS_ENV: &str = "TOKEN_DECIMALS";
pub const STABLE_ADDRESS_ENV: &str = "STABLE_ADDRESS";
pub const STABLE_DECIMALS_ENV: &str = "STABLE_DECIMALS";
pub const WETH_ADDRESS_ENV: &str = "WETH_ADDRESS";
pub const POOL_ADDRESS_ENV: &str = "POOL_ADDRESS";
pub const ETH_USD_FEED_ENV: &str = "ETH_USD_FEED";
pub const STABLE_USD_FEED_ENV: &str = "STABLE_USD_FEED";
pub const MARKUP_BPS_ENV: &str = "MARKUP_BPS";
pub const GAS_OVERHEAD_ENV: &str = "GAS_OVERHEAD";
pub const DAILY_LIMIT_ENV: &str = "DAILY_LIMIT";
pub const AVERAGING_WINDOW_ENV: &str = "AVERAGING_WINDOW_SECS";
pub const MAX_ORACLE_DELAY_ENV: &str = "MAX_ORACLE_DELAY_SECS";
pub const FEE_COLLECTOR_ENV: &str = "FEE_COLLECTOR";
pub const TRUSTED_SIGNERS_ENV: &str = "TRUSTED_SIGNERS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default `RUST_LOG` filter.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_MARKUP_BPS: u32 = 1_500;
const DEFAULT_GAS_OVERHEAD: u64 = 50_000;
const DEFAULT_AVERAGING_WINDOW_SECS: u32 = 1_800;
const DEFAULT_MAX_ORACLE_DELAY_SECS: u64 = 3_600;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{var}='{value}' is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub rpc_url: String,
    pub chain_id: u64,
    pub gateway_address: Address,
    pub owner: Address,
    pub treasury: Address,
    pub operator_key_path: PathBuf,
    pub token: AssetInfo,
    pub stable: AssetInfo,
    pub weth: Address,
    pub pool: Address,
    pub eth_usd_feed: Address,
    pub stable_usd_feed: Address,
    pub markup_bps: u32,
    pub gas_overhead: u64,
    pub daily_limit: U256,
    pub averaging_window_secs: u32,
    pub max_oracle_delay_secs: u64,
    pub fee_collector: Address,
    pub trusted_signers: Vec<Address>,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

/// Typed access to a variable source.
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn optional(&self, var: &'static str) -> Option<String> {
        (self.lookup)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing(var))
    }

    fn parse<T>(&self, var: &'static str, value: String) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        })
    }

    fn required_parsed<T>(&self, var: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.required(var)?;
        self.parse(var, value)
    }

    fn parsed_or<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(var) {
            Some(value) => self.parse(var, value),
            None => Ok(default),
        }
    }

    fn amount(&self, var: &'static str) -> Result<U256, ConfigError> {
        let value = self.required(var)?;
        U256::from_str_radix(&value, 10).map_err(|e| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        })
    }

    fn address_list(&self, var: &'static str) -> Result<Vec<Address>, ConfigError> {
        let Some(value) = self.optional(var) else {
            return Ok(Vec::new());
        };
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| self.parse(var, s.to_string()))
            .collect()
    }
}

impl GatewayConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let tls = match (
            vars.optional(TLS_CERT_PATH_ENV),
            vars.optional(TLS_KEY_PATH_ENV),
        ) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(cert), None) => {
                return Err(ConfigError::Invalid {
                    var: TLS_CERT_PATH_ENV,
                    value: cert,
                    reason: format!("{TLS_KEY_PATH_ENV} must be set as well"),
                })
            }
            (None, Some(key)) => {
                return Err(ConfigError::Invalid {
                    var: TLS_KEY_PATH_ENV,
                    value: key,
                    reason: format!("{TLS_CERT_PATH_ENV} must be set as well"),
                })
            }
        };

        let log_format = match vars.optional(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: LOG_FORMAT_ENV,
                    value: other.to_string(),
                    reason: "expected 'json' or 'pretty'".to_string(),
                })
            }
        };

        let rpc_url = vars.required(RPC_URL_ENV)?;
        if let Err(e) = url::Url::parse(&rpc_url) {
            return Err(ConfigError::Invalid {
                var: RPC_URL_ENV,
                value: rpc_url,
                reason: e.to_string(),
            });
        }

        Ok(Self {
            host: vars.optional(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: vars.parsed_or(PORT_ENV, DEFAULT_PORT)?,
            data_dir: vars
                .optional(DATA_DIR_ENV)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            rpc_url,
            chain_id: vars.required_parsed(CHAIN_ID_ENV)?,
            gateway_address: vars.required_parsed(GATEWAY_ADDRESS_ENV)?,
            owner: vars.required_parsed(OWNER_ADDRESS_ENV)?,
            treasury: vars.required_parsed(TREASURY_ADDRESS_ENV)?,
            operator_key_path: vars.required(OPERATOR_KEY_PATH_ENV)?.into(),
            token: AssetInfo::token(
                vars.required_parsed(TOKEN_ADDRESS_ENV)?,
                vars.parsed_or(TOKEN_DECIMALS_ENV, 18)?,
            ),
            stable: AssetInfo::stable(
                vars.required_parsed(STABLE_ADDRESS_ENV)?,
                vars.parsed_or(STABLE_DECIMALS_ENV, 6)?,
            ),
            weth: vars.required_parsed(WETH_ADDRESS_ENV)?,
            pool: vars.required_parsed(POOL_ADDRESS_ENV)?,
            eth_usd_feed: vars.required_parsed(ETH_USD_FEED_ENV)?,
            stable_usd_feed: vars.required_parsed(STABLE_USD_FEED_ENV)?,
            markup_bps: vars.parsed_or(MARKUP_BPS_ENV, DEFAULT_MARKUP_BPS)?,
            gas_overhead: vars.parsed_or(GAS_OVERHEAD_ENV, DEFAULT_GAS_OVERHEAD)?,
            daily_limit: vars.amount(DAILY_LIMIT_ENV)?,
            averaging_window_secs: vars
                .parsed_or(AVERAGING_WINDOW_ENV, DEFAULT_AVERAGING_WINDOW_SECS)?,
            max_oracle_delay_secs: vars
                .parsed_or(MAX_ORACLE_DELAY_ENV, DEFAULT_MAX_ORACLE_DELAY_SECS)?,
            fee_collector: vars.required_parsed(FEE_COLLECTOR_ENV)?,
            trusted_signers: vars.address_list(TRUSTED_SIGNERS_ENV)?,
            tls,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let value = format!("{}:{}", self.host, self.port);
        value.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: HOST_ENV,
            reason: e.to_string(),
            value,
        })
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.redb")
    }

    pub fn gateway_params(&self) -> GatewayParams {
        GatewayParams {
            chain_id: self.chain_id,
            verifying_contract: self.gateway_address,
            owner: self.owner,
            treasury: self.treasury,
            assets: AssetTable::new(self.token, self.stable),
            weth: self.weth,
            markup_bps: self.markup_bps,
            gas_overhead: self.gas_overhead,
        }
    }

    /// Settings written to a fresh ledger.
    pub fn initial_settings(&self) -> RuntimeSettings {
        RuntimeSettings {
            fee_collector: self.fee_collector,
            max_oracle_delay_secs: self.max_oracle_delay_secs,
            averaging_window_secs: self.averaging_window_secs,
            daily_limit: self.daily_limit,
        }
    }
}
