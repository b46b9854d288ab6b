//! Bootstrap price-path simulation for a single asset, plus portfolio
//! accounts that score buy/sell sequences against historical or simulated
//! prices.

pub mod commands;
pub mod data;
pub mod engine;
pub mod errors;
pub mod models;
pub mod utils;

use tracing_subscriber::EnvFilter;

pub use data::{CsvPriceProvider, InMemoryPriceProvider, PriceHistoryProvider};
pub use engine::{Account, FundedAccount, PathSimulator, ReturnModel, UnconstrainedAccount};
pub use errors::AppError;
pub use models::series::PriceSeries;
pub use models::trade::{LedgerEntry, Side};

/// Install the global tracing subscriber. `RUST_LOG` overrides the `info`
/// default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
