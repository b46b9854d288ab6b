use tracing::info;

use crate::data::PriceHistoryProvider;
use crate::engine::executor;
use crate::engine::{open_account, PathSimulator, ReturnModel, SimulatedPath};
use crate::errors::AppError;
use crate::models::config::SimulationConfig;
use crate::models::result::{PerformanceReport, SimulationSummary};
use crate::models::strategy::Strategy;
use crate::models::trade::LedgerEntry;

/// Price path a ledger is valued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valuation {
    /// The asset's own history.
    Historical,
    /// One freshly simulated path.
    Simulated,
}

/// Fetch an asset's history and build its return model.
pub fn load_model(provider: &dyn PriceHistoryProvider, asset: &str) -> Result<ReturnModel, AppError> {
    let prices = provider.fetch(asset)?;
    let model = ReturnModel::new(prices)?;
    info!(
        "Loaded {}: {} prices, last {:.2}",
        asset,
        model.prices().len(),
        model.last_price()
    );
    Ok(model)
}

// ── Simulation Commands ──

/// Generate a single synthetic price path for an asset.
pub fn simulate(
    provider: &dyn PriceHistoryProvider,
    asset: &str,
    config: &SimulationConfig,
) -> Result<SimulatedPath, AppError> {
    config.validate()?;
    let model = load_model(provider, asset)?;
    let mut simulator = PathSimulator::with_seed(config.seed);
    let path = simulator.simulate(&model, config.start_price, config.days, config.zero_sum)?;
    info!(
        "Simulated {} days for {}: {:.2} -> {:.2}",
        config.days,
        asset,
        path[0],
        path[path.len() - 1]
    );
    Ok(path)
}

/// Score a strategy across many simulated paths.
pub fn monte_carlo(
    provider: &dyn PriceHistoryProvider,
    asset: &str,
    config: &SimulationConfig,
) -> Result<SimulationSummary, AppError> {
    config.validate()?;
    let model = load_model(provider, asset)?;
    let strategy = Strategy::from_kind(config.strategy, config.days);
    executor::run_monte_carlo(&model, &strategy, config)
}

// ── Account Commands ──

/// Replay a literal ledger and value the account at the end of a path.
///
/// Entries carry their own prices; the path only supplies the mark price.
pub fn evaluate_ledger(
    provider: &dyn PriceHistoryProvider,
    asset: &str,
    entries: &[LedgerEntry],
    valuation: Valuation,
    config: &SimulationConfig,
) -> Result<PerformanceReport, AppError> {
    config.validate()?;
    let model = load_model(provider, asset)?;
    let path: Vec<f64> = match valuation {
        Valuation::Historical => model.prices().as_slice().to_vec(),
        Valuation::Simulated => PathSimulator::with_seed(config.seed).simulate(
            &model,
            config.start_price,
            config.days,
            config.zero_sum,
        )?,
    };

    let mut account = open_account(config.account, config.start_cash, config.limits)?;
    executor::replay(account.as_mut(), entries)?;
    let report = account.report(&path)?;
    info!(
        "Replayed {} entries for {} ({:?} valuation): return {:.4}",
        entries.len(),
        asset,
        valuation,
        report.performance
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryPriceProvider;
    use crate::models::config::AccountKind;

    fn provider() -> InMemoryPriceProvider {
        InMemoryPriceProvider::new()
            .with_series("bitcoin", vec![100.0, 110.0, 99.0, 108.9, 120.0])
            .with_series("flat", vec![5.0])
    }

    fn config() -> SimulationConfig {
        SimulationConfig {
            days: 10,
            paths: 8,
            seed: Some(3),
            ..Default::default()
        }
    }

    #[test]
    fn test_simulate_defaults_to_last_price() {
        let path = simulate(&provider(), "bitcoin", &config()).unwrap();
        assert_eq!(path.len(), 11);
        assert_eq!(path[0], 120.0);
    }

    #[test]
    fn test_simulate_unknown_asset() {
        assert!(matches!(
            simulate(&provider(), "doge", &config()),
            Err(AppError::DataUnavailable(_))
        ));
    }

    #[test]
    fn test_simulate_single_price_history() {
        assert!(matches!(
            simulate(&provider(), "flat", &config()),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_simulate_zero_start_price() {
        let cfg = SimulationConfig {
            start_price: Some(0.0),
            ..config()
        };
        assert!(matches!(
            simulate(&provider(), "bitcoin", &cfg),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_evaluate_historical() {
        let entries = vec![LedgerEntry::buy(100.0, 1000.0, 0.0)];
        let report =
            evaluate_ledger(&provider(), "bitcoin", &entries, Valuation::Historical, &config()).unwrap();
        assert!((report.mark_price - 120.0).abs() < 1e-12);
        assert!((report.performance - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_simulated_is_reproducible() {
        let entries = vec![LedgerEntry::buy(120.0, 1000.0, 0.0)];
        let cfg = SimulationConfig {
            account: AccountKind::Funded,
            start_cash: 2000.0,
            ..config()
        };
        let a = evaluate_ledger(&provider(), "bitcoin", &entries, Valuation::Simulated, &cfg).unwrap();
        let b = evaluate_ledger(&provider(), "bitcoin", &entries, Valuation::Simulated, &cfg).unwrap();
        assert_eq!(a, b);
        let path = simulate(&provider(), "bitcoin", &cfg).unwrap();
        assert_eq!(a.mark_price, path[path.len() - 1]);
    }

    #[test]
    fn test_monte_carlo_uses_configured_strategy() {
        let summary = monte_carlo(&provider(), "bitcoin", &config()).unwrap();
        assert_eq!(summary.strategy, "lump_sum");
        assert_eq!(summary.paths, 8);
        assert_eq!(summary.returns.count, 8);
    }
}
