//! Aave V3 Reserve Simulation SDK
//!
//! This crate reproduces, bit for bit, the integer arithmetic an Aave V3 pool
//! uses to grow its indexes, set its interest rates and value its incentive
//! emissions, so that a reserve read at some block can be evaluated off-chain
//! at any later timestamp.
//!
//! # Overview
//!
//! - [`math`]: ray (1e27) and wad (1e18) fixed-point helpers with half-up rounding
//! - [`accrual`]: linear and compounded interest, scaled to actual balances
//! - [`irm`]: the kinked rate curve with its stable debt premium
//! - [`rewards`]: APRs of per-second incentive emissions
//! - [`account`]: borrowing capacity of an account
//! - [`reserve`]: snapshot validation and the full evaluation pipeline
//!
//! # Example
//!
//! ```rust,ignore
//! use aave_rs_sim::{ReserveCalculator, AccrualConfig};
//!
//! let calculator = ReserveCalculator::new(&snapshot)?
//!     .with_config(AccrualConfig::on_chain());
//! let state = calculator.evaluate(now, &streams)?;
//!
//! let supply_rate = state.rates.current_liquidity_rate;
//! let supply_rewards = state.rewards.supply_apr;
//! ```

pub mod account;
pub mod accrual;
pub mod config;
pub mod error;
pub mod irm;
pub mod math;
pub mod reserve;
pub mod rewards;

// Re-export commonly used types
pub use error::{Result, SimError};

pub use account::{available_borrows, UserAccountData};
pub use accrual::{compounded_interest, linear_interest, AccrualResult};
pub use config::{AccrualConfig, IndexGrowth};

// Math exports
pub use math::{Ray, Wad, PERCENTAGE_FACTOR, RAY, SECONDS_PER_YEAR, WAD};

// IRM exports
pub use irm::{
    calculate_interest_rates, excess_stable_debt_ratio, excess_usage_ratio, overall_borrow_rate,
    RateCurve, RateInputs, RateResult,
};

pub use reserve::{CollateralConfig, ReserveCalculator, ReserveSnapshot, ReserveState};
pub use rewards::{IncentiveSide, IncentiveStream, RewardAprs, StreamApr, APR_PRECISION};
