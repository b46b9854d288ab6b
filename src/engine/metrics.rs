use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::models::result::DistributionStats;

/// Summary statistics of a sample. An empty sample yields all zeros.
pub fn distribution_stats(values: &[f64]) -> DistributionStats {
    if values.is_empty() {
        return DistributionStats::default();
    }

    let mean = values.iter().copied().mean();
    // Sample std dev is undefined for a single value.
    let std_dev = if values.len() > 1 {
        values.iter().copied().std_dev()
    } else {
        0.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let mut data = Data::new(values.to_vec());
    DistributionStats {
        count: values.len(),
        mean,
        median: data.median(),
        std_dev,
        min,
        max,
        percentile_5: data.percentile(5),
        percentile_25: data.percentile(25),
        percentile_75: data.percentile(75),
        percentile_95: data.percentile(95),
    }
}

/// Largest peak-to-trough decline along a path, in percent.
pub fn max_drawdown_pct(path: &[f64]) -> f64 {
    let mut peak = match path.first() {
        Some(&p) => p,
        None => return 0.0,
    };
    let mut max_dd_pct = 0.0f64;

    for &price in path.iter().skip(1) {
        if price > peak {
            peak = price;
        }
        let dd_pct = if peak > 0.0 {
            (peak - price) / peak * 100.0
        } else {
            0.0
        };
        max_dd_pct = max_dd_pct.max(dd_pct);
    }
    max_dd_pct
}

/// Share of returns strictly below zero.
pub fn probability_of_loss(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r < 0.0).count() as f64 / returns.len() as f64
}
