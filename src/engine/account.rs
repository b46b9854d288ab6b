//! Portfolio accounts that score buy/sell sequences against a price path.
//!
//! Two capital policies share the [`Account`] contract:
//! - [`UnconstrainedAccount`]: unlimited buying power, return measured
//!   against the cash actually spent.
//! - [`FundedAccount`]: a fixed starting balance, return measured against it.
//!
//! All bookkeeping runs at full precision; rounding is a presentation concern
//! (see [`PerformanceReport::rounded`]).

use tracing::debug;

use crate::errors::AppError;
use crate::models::config::{AccountKind, AccountLimits};
use crate::models::result::PerformanceReport;
use crate::models::trade::{LedgerEntry, Side};

/// Slack allowed when checking a balance against zero after a trade.
const BALANCE_EPSILON: f64 = 1e-9;

pub trait Account: Send {
    fn kind(&self) -> AccountKind;

    /// Buy `usd_amount + coin_amount * price` worth of coins.
    fn buy(&mut self, price: f64, usd_amount: f64, coin_amount: f64) -> Result<(), AppError>;

    /// Sell `usd_amount + coin_amount * price` worth of coins.
    fn sell(&mut self, price: f64, usd_amount: f64, coin_amount: f64) -> Result<(), AppError>;

    fn coins_owned(&self) -> f64;

    /// Value the account at the last price of `price_series`.
    fn report(&self, price_series: &[f64]) -> Result<PerformanceReport, AppError>;

    /// Fractional return at the last price of `price_series`.
    fn performance(&self, price_series: &[f64]) -> Result<f64, AppError> {
        Ok(self.report(price_series)?.performance)
    }

    fn apply(&mut self, entry: &LedgerEntry) -> Result<(), AppError> {
        match entry.side {
            Side::Buy => self.buy(entry.price, entry.usd_amount, entry.coin_amount),
            Side::Sell => self.sell(entry.price, entry.usd_amount, entry.coin_amount),
        }
    }
}

/// Open an account of the given kind. `start_cash` is ignored for
/// unconstrained accounts.
pub fn open_account(
    kind: AccountKind,
    start_cash: f64,
    limits: AccountLimits,
) -> Result<Box<dyn Account>, AppError> {
    Ok(match kind {
        AccountKind::Unconstrained => Box::new(UnconstrainedAccount::with_limits(limits)),
        AccountKind::Funded => Box::new(FundedAccount::with_limits(start_cash, limits)?),
    })
}

// ── Unconstrained ──

#[derive(Debug, Clone, Default)]
pub struct UnconstrainedAccount {
    cash_spent: f64,
    /// Net cash put in: buys add, sells subtract.
    cash_in: f64,
    coins_owned: f64,
    limits: AccountLimits,
}

impl UnconstrainedAccount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: AccountLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn cash_spent(&self) -> f64 {
        self.cash_spent
    }

    pub fn cash_in(&self) -> f64 {
        self.cash_in
    }
}

impl Account for UnconstrainedAccount {
    fn kind(&self) -> AccountKind {
        AccountKind::Unconstrained
    }

    fn buy(&mut self, price: f64, usd_amount: f64, coin_amount: f64) -> Result<(), AppError> {
        let spent = trade_amount(price, usd_amount, coin_amount)?;
        self.cash_spent += spent;
        self.cash_in += spent;
        self.coins_owned += spent / price;
        debug!(
            "Spent ${} buying {} coins (total spent ${}, money in ${}, coins {})",
            spent,
            spent / price,
            self.cash_spent,
            self.cash_in,
            self.coins_owned
        );
        Ok(())
    }

    fn sell(&mut self, price: f64, usd_amount: f64, coin_amount: f64) -> Result<(), AppError> {
        let received = trade_amount(price, usd_amount, coin_amount)?;
        let coins_after = self.coins_owned - received / price;
        check_coins(coins_after, &self.limits)?;
        self.cash_in -= received;
        self.coins_owned = coins_after;
        debug!(
            "Received ${} selling {} coins (total spent ${}, money in ${}, coins {})",
            received,
            received / price,
            self.cash_spent,
            self.cash_in,
            self.coins_owned
        );
        Ok(())
    }

    fn coins_owned(&self) -> f64 {
        self.coins_owned
    }

    fn report(&self, price_series: &[f64]) -> Result<PerformanceReport, AppError> {
        let mark = mark_price(price_series)?;
        if self.cash_spent == 0.0 {
            return Err(AppError::DivisionByZero(
                "no cash has been spent on this account".into(),
            ));
        }
        let coin_value = self.coins_owned * mark;
        let sold_value = self.cash_spent - self.cash_in;
        let total_value = coin_value + sold_value;
        Ok(PerformanceReport {
            account: AccountKind::Unconstrained,
            mark_price: mark,
            coins_owned: self.coins_owned,
            coin_value,
            basis: self.cash_spent,
            cash_value: sold_value,
            total_value,
            performance: (total_value - self.cash_spent) / self.cash_spent,
        })
    }
}

// ── Funded ──

#[derive(Debug, Clone)]
pub struct FundedAccount {
    start_cash: f64,
    cash: f64,
    coins_owned: f64,
    limits: AccountLimits,
}

impl FundedAccount {
    pub fn new(start_cash: f64) -> Result<Self, AppError> {
        Self::with_limits(start_cash, AccountLimits::default())
    }

    pub fn with_limits(start_cash: f64, limits: AccountLimits) -> Result<Self, AppError> {
        if !start_cash.is_finite() || start_cash <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "starting cash must be > 0, got {}",
                start_cash
            )));
        }
        Ok(Self {
            start_cash,
            cash: start_cash,
            coins_owned: 0.0,
            limits,
        })
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }
}

impl Account for FundedAccount {
    fn kind(&self) -> AccountKind {
        AccountKind::Funded
    }

    fn buy(&mut self, price: f64, usd_amount: f64, coin_amount: f64) -> Result<(), AppError> {
        let spent = trade_amount(price, usd_amount, coin_amount)?;
        let cash_after = self.cash - spent;
        if !self.limits.allow_negative_cash && cash_after < -BALANCE_EPSILON {
            return Err(AppError::InvalidInput(format!(
                "buying ${} would overdraw cash balance ${}",
                spent, self.cash
            )));
        }
        self.cash = cash_after;
        self.coins_owned += spent / price;
        debug!(
            "Spent ${} buying {} coins (cash ${}, coins {})",
            spent,
            spent / price,
            self.cash,
            self.coins_owned
        );
        Ok(())
    }

    fn sell(&mut self, price: f64, usd_amount: f64, coin_amount: f64) -> Result<(), AppError> {
        let received = trade_amount(price, usd_amount, coin_amount)?;
        let coins_after = self.coins_owned - received / price;
        check_coins(coins_after, &self.limits)?;
        self.cash += received;
        self.coins_owned = coins_after;
        debug!(
            "Received ${} selling {} coins (cash ${}, coins {})",
            received,
            received / price,
            self.cash,
            self.coins_owned
        );
        Ok(())
    }

    fn coins_owned(&self) -> f64 {
        self.coins_owned
    }

    fn report(&self, price_series: &[f64]) -> Result<PerformanceReport, AppError> {
        let mark = mark_price(price_series)?;
        let coin_value = self.coins_owned * mark;
        let total_value = coin_value + self.cash;
        Ok(PerformanceReport {
            account: AccountKind::Funded,
            mark_price: mark,
            coins_owned: self.coins_owned,
            coin_value,
            basis: self.start_cash,
            cash_value: self.cash,
            total_value,
            performance: (total_value - self.start_cash) / self.start_cash,
        })
    }
}

// ── Helpers ──

fn trade_amount(price: f64, usd_amount: f64, coin_amount: f64) -> Result<f64, AppError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "trade price must be > 0, got {}",
            price
        )));
    }
    if !usd_amount.is_finite() || !coin_amount.is_finite() {
        return Err(AppError::InvalidInput(format!(
            "trade amounts must be finite, got usd={} coins={}",
            usd_amount, coin_amount
        )));
    }
    Ok(usd_amount + coin_amount * price)
}

fn check_coins(coins_after: f64, limits: &AccountLimits) -> Result<(), AppError> {
    if !limits.allow_negative_coins && coins_after < -BALANCE_EPSILON {
        return Err(AppError::InvalidInput(format!(
            "sale would leave a negative coin balance ({})",
            coins_after
        )));
    }
    Ok(())
}

fn mark_price(price_series: &[f64]) -> Result<f64, AppError> {
    match price_series.last() {
        Some(&p) if p.is_finite() && p > 0.0 => Ok(p),
        Some(&p) => Err(AppError::InvalidInput(format!(
            "mark price must be > 0, got {}",
            p
        ))),
        None => Err(AppError::InvalidInput(
            "price series for valuation is empty".into(),
        )),
    }
}
