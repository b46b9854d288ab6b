use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Chronological (oldest first) sequence of strictly positive prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct PriceSeries(Vec<f64>);

impl PriceSeries {
    /// Validate and wrap a price vector. Every value must be finite and > 0.
    pub fn new(prices: Vec<f64>) -> Result<Self, AppError> {
        if prices.is_empty() {
            return Err(AppError::InvalidInput("price series is empty".into()));
        }
        if let Some((i, p)) = prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(AppError::InvalidInput(format!(
                "price at index {} must be a positive number, got {}",
                i, p
            )));
        }
        Ok(Self(prices))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Most recent price.
    pub fn last(&self) -> f64 {
        // Construction guarantees at least one element.
        self.0[self.0.len() - 1]
    }

    /// Simple daily returns: `(p[i+1] - p[i]) / p[i]`.
    pub fn returns(&self) -> Vec<f64> {
        self.0.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect()
    }
}

impl TryFrom<Vec<f64>> for PriceSeries {
    type Error = AppError;

    fn try_from(prices: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(prices)
    }
}

impl From<PriceSeries> for Vec<f64> {
    fn from(series: PriceSeries) -> Self {
        series.0
    }
}

/// The return that exactly cancels `r` when compounded after it:
/// `(1 + r) * (1 + cancelling_return(r)) == 1`.
pub fn cancelling_return(r: f64) -> f64 {
    1.0 / (1.0 + r) - 1.0
}

/// Interleave every return with its cancelling counterpart, keeping the
/// original order: `[r0, c(r0), r1, c(r1), ...]`.
pub fn zero_sum_returns(returns: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(returns.len() * 2);
    for &r in returns {
        out.push(r);
        out.push(cancelling_return(r));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            PriceSeries::new(vec![10.0, 0.0, 12.0]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            PriceSeries::new(vec![10.0, -3.0]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            PriceSeries::new(vec![10.0, f64::NAN]),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(PriceSeries::new(vec![]), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_returns_from_prices() {
        let series = PriceSeries::new(vec![100.0, 110.0, 99.0, 108.9]).unwrap();
        let r = series.returns();
        assert_eq!(r.len(), 3);
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] + 0.10).abs() < 1e-12);
        assert!((r[2] - 0.10).abs() < 1e-12);
        assert_eq!(series.last(), 108.9);
    }

    #[test]
    fn test_zero_sum_pairs_cancel() {
        let returns = [0.10, -0.10, 0.5, -0.75];
        let z = zero_sum_returns(&returns);
        assert_eq!(z.len(), 8);
        for (i, pair) in z.chunks(2).enumerate() {
            assert_eq!(pair[0], returns[i]);
            assert!(((1.0 + pair[0]) * (1.0 + pair[1]) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: PriceSeries = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(ok.len(), 2);
        assert!(serde_json::from_str::<PriceSeries>("[1.0, 0.0]").is_err());
    }
}
