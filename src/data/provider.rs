//! Sources of historical price series, keyed by asset identifier.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::AppError;
use crate::models::series::PriceSeries;

use super::loader::load_price_csv;

/// Supplies the chronological price history of one asset.
///
/// Any failure to produce a valid series is reported as
/// [`AppError::DataUnavailable`]; callers get no retries or fallbacks.
pub trait PriceHistoryProvider: Send + Sync + fmt::Debug {
    fn fetch(&self, asset: &str) -> Result<PriceSeries, AppError>;
}

/// Lower-cased identifier with every non-word character replaced by `-`,
/// e.g. `"Bitcoin Cash"` → `"bitcoin-cash"`.
pub fn asset_slug(asset: &str) -> String {
    asset
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Reads `<data_dir>/<asset-slug>.csv`.
#[derive(Debug, Clone)]
pub struct CsvPriceProvider {
    data_dir: PathBuf,
}

impl CsvPriceProvider {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_for(&self, asset: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", asset_slug(asset)))
    }
}

impl PriceHistoryProvider for CsvPriceProvider {
    fn fetch(&self, asset: &str) -> Result<PriceSeries, AppError> {
        let path = self.path_for(asset);
        debug!("Fetching {} from {}", asset, path.display());
        load_price_csv(&path).map_err(|e| AppError::unavailable(asset, e))
    }
}

/// Fixed in-memory histories, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPriceProvider {
    series: HashMap<String, Vec<f64>>,
}

impl InMemoryPriceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register raw prices for an asset; they are validated on fetch.
    pub fn with_series(mut self, asset: &str, prices: Vec<f64>) -> Self {
        self.series.insert(asset_slug(asset), prices);
        self
    }
}

impl PriceHistoryProvider for InMemoryPriceProvider {
    fn fetch(&self, asset: &str) -> Result<PriceSeries, AppError> {
        let prices = self
            .series
            .get(&asset_slug(asset))
            .ok_or_else(|| AppError::DataUnavailable(format!("no price history for '{}'", asset)))?;
        PriceSeries::new(prices.clone()).map_err(|e| AppError::unavailable(asset, e))
    }
}
