use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::AppError;

use super::strategy::StrategyKind;

/// Capital accounting policy of a portfolio account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Unlimited buying power; return is measured against cash actually spent.
    #[default]
    Unconstrained,
    /// Fixed starting cash; return is measured against the starting amount.
    Funded,
}

impl std::str::FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unconstrained" | "infinite" => Ok(AccountKind::Unconstrained),
            "funded" => Ok(AccountKind::Funded),
            _ => Err(format!("Unknown account kind: {}", s)),
        }
    }
}

/// Optional guards on account state. Both are off (permissive) by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountLimits {
    /// Let sells take the coin balance below zero.
    pub allow_negative_coins: bool,
    /// Let buys take a funded account's cash below zero.
    pub allow_negative_cash: bool,
}

impl Default for AccountLimits {
    fn default() -> Self {
        Self {
            allow_negative_coins: true,
            allow_negative_cash: true,
        }
    }
}

/// Parameters for path simulation and strategy scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of forward steps per path.
    pub days: usize,
    /// Draw from the zero-sum return distribution.
    pub zero_sum: bool,
    /// Starting price; `None` uses the last historical price.
    pub start_price: Option<f64>,
    /// RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Number of Monte Carlo paths.
    pub paths: usize,
    /// Starting cash for funded accounts.
    pub start_cash: f64,
    pub account: AccountKind,
    pub limits: AccountLimits,
    pub strategy: StrategyKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 365,
            zero_sum: false,
            start_price: None,
            seed: None,
            paths: 1000,
            start_cash: 100_000.0,
            account: AccountKind::Unconstrained,
            limits: AccountLimits::default(),
            strategy: StrategyKind::LumpSum { usd: 1000.0 },
        }
    }
}

impl SimulationConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::FileRead(format!("{}: {}", path.display(), e)))?;
        let config: SimulationConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.paths == 0 {
            return Err(AppError::InvalidConfig("paths must be at least 1".into()));
        }
        if !self.start_cash.is_finite() || self.start_cash <= 0.0 {
            return Err(AppError::InvalidConfig(format!(
                "start_cash must be > 0, got {}",
                self.start_cash
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::InvalidConfig(err.to_string())
    }
}

/// Settings read from the process environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Directory holding `<asset-slug>.csv` price histories.
    pub data_dir: PathBuf,
    pub seed: Option<u64>,
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let data_dir = env_map
            .get("COINSIM_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let seed = match env_map.get("COINSIM_SEED") {
            Some(s) => Some(s.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("COINSIM_SEED".to_string(), "must be a valid u64".to_string())
            })?),
            None => None,
        };

        Ok(EnvConfig { data_dir, seed })
    }
}
