//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (the house private key) are referenced by env-var name in the
//! config and resolved at runtime.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::chain::key::DEFAULT_KEY_ENV;
use crate::strategy::offer::{
    NegotiationConfig, PercentBand, HIGH_EV_MAX_PERCENT, HIGH_EV_MIN_PERCENT, HIGH_EV_THRESHOLD,
    NORMAL_EV_MAX_PERCENT, NORMAL_EV_MIN_PERCENT,
};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub house: HouseConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub negotiation: NegotiationSection,
    pub relay: RelayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HouseConfig {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub contract_address: String,
    /// Env var holding the house private key.
    #[serde(default = "default_key_env")]
    pub private_key_env: String,
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    #[serde(default = "default_explorer")]
    pub explorer_url: String,
}

/// Pricing overrides. Anything left out keeps the built-in value.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NegotiationSection {
    pub high_ev_threshold: Option<Decimal>,
    pub high_ev_min_percent: Option<Decimal>,
    pub high_ev_max_percent: Option<Decimal>,
    pub normal_ev_min_percent: Option<Decimal>,
    pub normal_ev_max_percent: Option<Decimal>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    pub enabled: bool,
    pub port: u16,
}

fn default_key_env() -> String {
    DEFAULT_KEY_ENV.to_string()
}

fn default_gas_limit() -> u64 {
    800_000
}

fn default_explorer() -> String {
    "https://explorer.roninchain.com".to_string()
}

impl NegotiationSection {
    /// Merge overrides onto the default pricing bands.
    pub fn to_negotiation_config(&self) -> NegotiationConfig {
        NegotiationConfig {
            high_ev_threshold: self.high_ev_threshold.unwrap_or(HIGH_EV_THRESHOLD),
            high_ev_band: PercentBand::new(
                self.high_ev_min_percent.unwrap_or(HIGH_EV_MIN_PERCENT),
                self.high_ev_max_percent.unwrap_or(HIGH_EV_MAX_PERCENT),
            ),
            normal_ev_band: PercentBand::new(
                self.normal_ev_min_percent.unwrap_or(NORMAL_EV_MIN_PERCENT),
                self.normal_ev_max_percent.unwrap_or(NORMAL_EV_MAX_PERCENT),
            ),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.negotiation.to_negotiation_config().validate()?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
