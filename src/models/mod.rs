pub mod config;
pub mod result;
pub mod series;
pub mod strategy;
pub mod trade;
