pub mod loader;
pub mod provider;

pub use provider::{asset_slug, CsvPriceProvider, InMemoryPriceProvider, PriceHistoryProvider};
