//! Strategy calculations for Aave V3 positions.
//!
//! This crate turns the exact integer outputs of `aave-rs-sim` into decimal,
//! human-facing quantities and sizes flashloan leverage loops on top of them.
//!
//! - [`leverage`]: closed-form flashloan sizing to a target LTV or multiplier
//! - [`plan`]: a leverage operation with its expected interest and reward yield
//! - [`overview`]: display summaries of reserves and accounts
//! - [`convert`]: fixed-point integer to [`rust_decimal::Decimal`] conversions

pub mod convert;
pub mod error;
pub mod leverage;
pub mod overview;
pub mod plan;

pub use error::{Result, StrategyError};
pub use leverage::{
    Denomination, FlashloanNotional, LeveragePosition, LeverageSolution, LeverageSolver,
    LeverageTarget, SolverConfig,
};
pub use overview::{AccountSummary, ReserveOverview};
pub use plan::{plan_leverage, LeveragePlan, MarketYields, RewardEstimate, RewardYield};
