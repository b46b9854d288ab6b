use serde::{Deserialize, Serialize};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// One buy or sell action at a given price.
///
/// The traded amount is `usd_amount + coin_amount * price`; both parts may be
/// non-zero and are summed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub side: Side,
    pub price: f64,
    #[serde(default)]
    pub usd_amount: f64,
    #[serde(default)]
    pub coin_amount: f64,
}

impl LedgerEntry {
    pub fn buy(price: f64, usd_amount: f64, coin_amount: f64) -> Self {
        Self {
            side: Side::Buy,
            price,
            usd_amount,
            coin_amount,
        }
    }

    pub fn sell(price: f64, usd_amount: f64, coin_amount: f64) -> Self {
        Self {
            side: Side::Sell,
            price,
            usd_amount,
            coin_amount,
        }
    }

    /// Cash value of the entry at its own price.
    pub fn notional(&self) -> f64 {
        self.usd_amount + self.coin_amount * self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notional_sums_both_amounts() {
        let entry = LedgerEntry::buy(50.0, 100.0, 2.0);
        assert!((entry.notional() - 200.0).abs() < 1e-12);
    }

    #[test]
    fn test_side_serde_lowercase() {
        let entry: LedgerEntry =
            serde_json::from_str(r#"{"side":"sell","price":10.0,"coin_amount":1.5}"#).unwrap();
        assert_eq!(entry.side, Side::Sell);
        assert_eq!(entry.usd_amount, 0.0);
        assert!((entry.notional() - 15.0).abs() < 1e-12);
    }
}
