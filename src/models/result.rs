use serde::{Deserialize, Serialize};

use super::config::AccountKind;

/// Breakdown of an account's value at a mark price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub account: AccountKind,
    pub mark_price: f64,
    pub coins_owned: f64,
    /// Coins owned valued at the mark price.
    pub coin_value: f64,
    /// Capital the return is measured against: cash spent (unconstrained) or
    /// starting cash (funded).
    pub basis: f64,
    /// Unconstrained: value of coins already sold. Funded: cash on hand.
    pub cash_value: f64,
    pub total_value: f64,
    /// Fractional return, e.g. 0.2 for +20%.
    pub performance: f64,
}

impl PerformanceReport {
    /// Copy with monetary fields and the return rounded to 2 decimals.
    pub fn rounded(&self) -> Self {
        Self {
            account: self.account,
            mark_price: round2(self.mark_price),
            coins_owned: self.coins_owned,
            coin_value: round2(self.coin_value),
            basis: round2(self.basis),
            cash_value: round2(self.cash_value),
            total_value: round2(self.total_value),
            performance: round2(self.performance),
        }
    }
}

/// Summary statistics of a sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_5: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
    pub percentile_95: f64,
}

/// Outcome of scoring one strategy over many simulated paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub strategy: String,
    pub account: AccountKind,
    pub paths: usize,
    pub days: usize,
    pub zero_sum: bool,
    pub start_price: f64,
    pub terminal_prices: DistributionStats,
    pub returns: DistributionStats,
    /// Share of scored paths that finished below zero return.
    pub probability_of_loss: f64,
    /// Mean of each path's maximum drawdown, in percent.
    pub avg_max_drawdown_pct: f64,
    /// Paths where the strategy could not be scored.
    pub failed_paths: usize,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.123456), 0.12);
        assert_eq!(round2(1199.999), 1200.0);
        assert_eq!(round2(-2.5), -2.5);
    }

    #[test]
    fn test_rounded_keeps_coin_precision() {
        let report = PerformanceReport {
            account: AccountKind::Funded,
            mark_price: 60.004,
            coins_owned: 1.0 / 3.0,
            coin_value: 20.001,
            basis: 100.0,
            cash_value: 80.006,
            total_value: 100.007,
            performance: 0.00007,
        };
        let r = report.rounded();
        assert_eq!(r.coin_value, 20.0);
        assert_eq!(r.cash_value, 80.01);
        assert_eq!(r.performance, 0.0);
        assert_eq!(r.coins_owned, 1.0 / 3.0);
    }
}
