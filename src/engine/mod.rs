pub mod account;
pub mod executor;
pub mod metrics;
pub mod returns;
pub mod simulator;

pub use account::{open_account, Account, FundedAccount, UnconstrainedAccount};
pub use returns::ReturnModel;
pub use simulator::{PathSimulator, SimulatedPath};
