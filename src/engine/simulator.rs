use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::errors::AppError;

use super::returns::ReturnModel;

/// Prices starting at the start price, one per simulated day after it.
pub type SimulatedPath = Vec<f64>;

/// Builds synthetic price paths by compounding resampled returns.
///
/// The simulator owns its random source, so a seeded simulator always
/// reproduces the same sequence of paths.
#[derive(Debug, Clone)]
pub struct PathSimulator<R: Rng = StdRng> {
    rng: R,
}

impl PathSimulator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Seeded when a seed is given, entropy-seeded otherwise.
    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::seeded(s),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng> PathSimulator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Simulate `days` steps forward.
    ///
    /// `start_price` of `None` starts from the model's last historical price;
    /// an explicit price must be positive.
    pub fn simulate(
        &mut self,
        model: &ReturnModel,
        start_price: Option<f64>,
        days: usize,
        zero_sum: bool,
    ) -> Result<SimulatedPath, AppError> {
        let start = resolve_start_price(model, start_price)?;
        let returns = model.sample_returns_from(&mut self.rng, days, zero_sum);
        debug!(
            "Simulated {} days from {} (zero_sum={})",
            days, start, zero_sum
        );
        Ok(compound(start, &returns))
    }
}

pub fn resolve_start_price(model: &ReturnModel, start_price: Option<f64>) -> Result<f64, AppError> {
    match start_price {
        None => Ok(model.last_price()),
        Some(p) if p.is_finite() && p > 0.0 => Ok(p),
        Some(p) => Err(AppError::InvalidInput(format!(
            "start price must be > 0, got {}",
            p
        ))),
    }
}

/// `path[0] = start`, `path[k] = path[k-1] * (1 + returns[k-1])`.
pub fn compound(start: f64, returns: &[f64]) -> SimulatedPath {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut price = start;
    path.push(price);
    for r in returns {
        price *= 1.0 + r;
        path.push(price);
    }
    path
}
