use serde::{Deserialize, Serialize};

use crate::errors::AppError;

use super::trade::{LedgerEntry, Side};

/// A trade to place on a given day of a price path, at that day's price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTrade {
    pub day: usize,
    pub side: Side,
    #[serde(default)]
    pub usd_amount: f64,
    #[serde(default)]
    pub coin_amount: f64,
}

/// Ordered trading plan that can be laid over any price path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    pub trades: Vec<ScheduledTrade>,
}

/// Which built-in plan to run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StrategyKind {
    /// Spend everything on day 0 and hold.
    LumpSum { usd: f64 },
    /// Buy a fixed cash amount every `every_n_days`, starting on day 0.
    DollarCostAverage { usd_per_buy: f64, every_n_days: usize },
}

impl Strategy {
    pub fn new(name: impl Into<String>, trades: Vec<ScheduledTrade>) -> Self {
        Self {
            name: name.into(),
            trades,
        }
    }

    pub fn lump_sum(usd: f64) -> Self {
        Self::new(
            "lump_sum",
            vec![ScheduledTrade {
                day: 0,
                side: Side::Buy,
                usd_amount: usd,
                coin_amount: 0.0,
            }],
        )
    }

    /// Buys on days `0, n, 2n, ...` up to and including `days`.
    pub fn dollar_cost_average(usd_per_buy: f64, every_n_days: usize, days: usize) -> Self {
        let step = every_n_days.max(1);
        let trades = (0..=days)
            .step_by(step)
            .map(|day| ScheduledTrade {
                day,
                side: Side::Buy,
                usd_amount: usd_per_buy,
                coin_amount: 0.0,
            })
            .collect();
        Self::new("dollar_cost_average", trades)
    }

    pub fn from_kind(kind: StrategyKind, days: usize) -> Self {
        match kind {
            StrategyKind::LumpSum { usd } => Self::lump_sum(usd),
            StrategyKind::DollarCostAverage {
                usd_per_buy,
                every_n_days,
            } => Self::dollar_cost_average(usd_per_buy, every_n_days, days),
        }
    }

    /// Price every scheduled trade at `path[day]`.
    pub fn resolve(&self, path: &[f64]) -> Result<Vec<LedgerEntry>, AppError> {
        self.trades
            .iter()
            .map(|t| -> Result<LedgerEntry, AppError> {
                let price = path.get(t.day).copied().ok_or_else(|| {
                    AppError::InvalidInput(format!(
                        "strategy '{}' trades on day {} but the path has {} prices",
                        self.name,
                        t.day,
                        path.len()
                    ))
                })?;
                Ok(LedgerEntry {
                    side: t.side,
                    price,
                    usd_amount: t.usd_amount,
                    coin_amount: t.coin_amount,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dca_schedule() {
        let s = Strategy::dollar_cost_average(100.0, 7, 30);
        let days: Vec<usize> = s.trades.iter().map(|t| t.day).collect();
        assert_eq!(days, vec![0, 7, 14, 21, 28]);
        assert!(s.trades.iter().all(|t| t.side == Side::Buy && t.usd_amount == 100.0));
    }

    #[test]
    fn test_dca_zero_interval_buys_daily() {
        let s = Strategy::dollar_cost_average(10.0, 0, 3);
        assert_eq!(s.trades.len(), 4);
    }

    #[test]
    fn test_resolve_prices_from_path() {
        let s = Strategy::dollar_cost_average(50.0, 2, 4);
        let entries = s.resolve(&[10.0, 11.0, 12.0, 13.0, 14.0]).unwrap();
        let prices: Vec<f64> = entries.iter().map(|e| e.price).collect();
        assert_eq!(prices, vec![10.0, 12.0, 14.0]);
    }

    #[test]
    fn test_resolve_day_past_end() {
        let s = Strategy::dollar_cost_average(50.0, 1, 5);
        assert!(matches!(s.resolve(&[1.0, 2.0]), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_kind_deserialize() {
        let kind: StrategyKind =
            serde_json::from_str(r#"{"type":"dollar_cost_average","usd_per_buy":25.0,"every_n_days":7}"#)
                .unwrap();
        let s = Strategy::from_kind(kind, 14);
        assert_eq!(s.trades.len(), 3);
    }
}
