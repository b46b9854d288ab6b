//! Empirical daily-return distribution derived from a price history.
//!
//! Sampling never touches model state: every draw takes the caller's random
//! source, so a seeded or mocked generator replays exactly.

use rand::Rng;
use tracing::debug;

use crate::errors::AppError;
use crate::models::series::{zero_sum_returns, PriceSeries};

/// Minimum number of prices needed to derive one return.
const MIN_PRICES: usize = 2;

/// Bootstrap resampling model over a single asset's historical returns.
#[derive(Debug, Clone)]
pub struct ReturnModel {
    prices: PriceSeries,
    returns: Vec<f64>,
    zero_sum: Vec<f64>,
}

impl ReturnModel {
    pub fn new(prices: PriceSeries) -> Result<Self, AppError> {
        if prices.len() < MIN_PRICES {
            return Err(AppError::InvalidInput(format!(
                "need at least {} prices to derive returns, got {}",
                MIN_PRICES,
                prices.len()
            )));
        }
        let returns = prices.returns();
        // A return of -100% has no cancelling return.
        if let Some(i) = returns.iter().position(|r| !r.is_finite() || *r <= -1.0) {
            return Err(AppError::InvalidInput(format!(
                "return {} from {} to {} is not usable",
                returns[i],
                prices.as_slice()[i],
                prices.as_slice()[i + 1]
            )));
        }
        let zero_sum = zero_sum_returns(&returns);
        if zero_sum.iter().any(|r| !r.is_finite()) {
            return Err(AppError::InvalidInput(
                "zero-sum returns overflow for this price history".into(),
            ));
        }
        debug!(
            "Return model: {} prices, {} returns, {} zero-sum returns",
            prices.len(),
            returns.len(),
            zero_sum.len()
        );
        Ok(Self {
            prices,
            returns,
            zero_sum,
        })
    }

    /// Validate raw prices and build the model in one step.
    pub fn from_prices(prices: Vec<f64>) -> Result<Self, AppError> {
        Self::new(PriceSeries::new(prices)?)
    }

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn returns(&self) -> &[f64] {
        &self.returns
    }

    pub fn zero_sum_returns(&self) -> &[f64] {
        &self.zero_sum
    }

    pub fn last_price(&self) -> f64 {
        self.prices.last()
    }

    pub fn sample_return<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        draw(&self.returns, rng)
    }

    pub fn sample_returns<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        draw_many(&self.returns, rng, n)
    }

    pub fn sample_return_zero_sum<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        draw(&self.zero_sum, rng)
    }

    pub fn sample_returns_zero_sum<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        draw_many(&self.zero_sum, rng, n)
    }

    /// Draw `n` returns from the standard or zero-sum pool.
    pub fn sample_returns_from<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        zero_sum: bool,
    ) -> Vec<f64> {
        if zero_sum {
            self.sample_returns_zero_sum(rng, n)
        } else {
            self.sample_returns(rng, n)
        }
    }
}

/// Uniform draw with replacement. `pool` is never empty once a model exists.
fn draw<R: Rng + ?Sized>(pool: &[f64], rng: &mut R) -> f64 {
    pool[rng.gen_range(0..pool.len())]
}

fn draw_many<R: Rng + ?Sized>(pool: &[f64], rng: &mut R, n: usize) -> Vec<f64> {
    (0..n).map(|_| draw(pool, rng)).collect()
}
