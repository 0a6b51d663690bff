//! Reserve snapshots and the evaluation pipeline built on them.
//!
//! A [`ReserveSnapshot`] is the state of one reserve as read from the pool at
//! some block: stored indexes and rates, scaled balances, the rate curve and
//! the collateral configuration. Nothing in it is current; the stored
//! values are only refreshed when the reserve is touched.
//!
//! [`ReserveCalculator`] validates a snapshot once and then derives, for any
//! timestamp at or after the last update:
//!
//! 1. the accrued debt and supply totals ([`crate::accrual`])
//! 2. the current rates from the accrued totals ([`crate::irm`])
//! 3. incentive APRs against the accrued pool balances ([`crate::rewards`])
//!
//! # Example
//!
//! ```rust
//! use aave_rs_sim::irm::{ray_from_percent, RateCurve};
//! use aave_rs_sim::math::{Ray, Wad, WAD};
//! use aave_rs_sim::reserve::{CollateralConfig, ReserveCalculator, ReserveSnapshot};
//! use alloy_primitives::U256;
//!
//! let snapshot = ReserveSnapshot {
//!     symbol: "DAI".to_string(),
//!     decimals: 18,
//!     available_liquidity: Wad::new(WAD * U256::from(600)),
//!     total_principal_stable_debt: Wad::ZERO,
//!     total_scaled_variable_debt: Wad::new(WAD * U256::from(400)),
//!     scaled_total_supply: Wad::new(WAD * U256::from(1_000)),
//!     average_stable_rate: Ray::ZERO,
//!     liquidity_rate: Ray::ZERO,
//!     variable_borrow_rate: Ray::ZERO,
//!     liquidity_index: Ray::ONE,
//!     variable_borrow_index: Ray::ONE,
//!     last_update_timestamp: 1_700_000_000,
//!     stable_debt_last_update_timestamp: 1_700_000_000,
//!     rate_curve: RateCurve {
//!         optimal_usage_ratio: ray_from_percent(80),
//!         variable_rate_slope1: ray_from_percent(4),
//!         variable_rate_slope2: ray_from_percent(60),
//!         ..RateCurve::default()
//!     },
//!     reserve_factor: 1_000,
//!     collateral: CollateralConfig::default(),
//!     unbacked: Wad::ZERO,
//!     price: U256::from(100_000_000u64),
//!     price_oracle_decimals: 8,
//! };
//!
//! let calculator = ReserveCalculator::new(&snapshot).unwrap();
//! let rates = calculator.interest_rates(1_700_000_000).unwrap();
//! assert_eq!(rates.borrow_usage_ratio, ray_from_percent(40));
//! ```

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, Span};

use crate::accrual::{self, AccrualResult};
use crate::config::AccrualConfig;
use crate::error::{Result, SimError};
use crate::irm::{self, RateCurve, RateInputs, RateResult};
use crate::math::{Ray, Wad, MAX_DECIMALS, PERCENTAGE_FACTOR};
use crate::rewards::{self, IncentiveStream, RewardAprs};

/// Collateral parameters of a reserve, all in basis points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralConfig {
    /// Maximum loan-to-value when borrowing against this asset
    pub ltv: u16,
    pub liquidation_threshold: u16,
    /// Collateral paid out per unit of debt repaid on liquidation, e.g. 10500 = 105%
    pub liquidation_bonus: u16,
}

/// Point-in-time state of a single reserve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    pub symbol: String,
    /// Token decimals of the underlying asset
    pub decimals: u8,

    /// Underlying balance held by the supply token contract
    pub available_liquidity: Wad,
    pub total_principal_stable_debt: Wad,
    pub total_scaled_variable_debt: Wad,
    /// Scaled total of the supply token
    pub scaled_total_supply: Wad,

    pub average_stable_rate: Ray,
    /// Liquidity rate stored at the last update
    pub liquidity_rate: Ray,
    /// Variable borrow rate stored at the last update
    pub variable_borrow_rate: Ray,
    pub liquidity_index: Ray,
    pub variable_borrow_index: Ray,

    /// Last time the reserve indexes were updated
    pub last_update_timestamp: u64,
    /// Last time the stable debt total was updated
    pub stable_debt_last_update_timestamp: u64,

    pub rate_curve: RateCurve,
    /// Share of interest kept by the protocol, in basis points
    pub reserve_factor: u16,
    pub collateral: CollateralConfig,
    pub unbacked: Wad,

    /// Oracle price of the underlying asset
    pub price: U256,
    /// Decimals of `price`
    pub price_oracle_decimals: u8,
}

impl ReserveSnapshot {
    /// Checks every field range the calculations rely on.
    pub fn validate(&self) -> Result<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(SimError::invalid(
                "decimals",
                format!("{} exceeds {MAX_DECIMALS}", self.decimals),
            ));
        }
        if self.price_oracle_decimals > MAX_DECIMALS {
            return Err(SimError::invalid(
                "price_oracle_decimals",
                format!("{} exceeds {MAX_DECIMALS}", self.price_oracle_decimals),
            ));
        }

        let basis_points = [
            ("reserve_factor", self.reserve_factor),
            ("ltv", self.collateral.ltv),
            ("liquidation_threshold", self.collateral.liquidation_threshold),
        ];
        for (field, value) in basis_points {
            if U256::from(value) > PERCENTAGE_FACTOR {
                return Err(SimError::invalid(
                    field,
                    format!("{value} exceeds 10000 basis points"),
                ));
            }
        }

        if self.liquidity_index < Ray::ONE {
            return Err(SimError::invalid(
                "liquidity_index",
                "must be at least one ray",
            ));
        }
        if self.variable_borrow_index < Ray::ONE {
            return Err(SimError::invalid(
                "variable_borrow_index",
                "must be at least one ray",
            ));
        }

        self.rate_curve.validate()
    }
}

/// Everything derived from a snapshot at one timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveState {
    pub timestamp: u64,
    pub accrual: AccrualResult,
    pub rates: RateResult,
    pub rewards: RewardAprs,
}

/// Validated view of a snapshot that accrues, prices and rates it.
#[derive(Debug, Clone)]
pub struct ReserveCalculator<'a> {
    snapshot: &'a ReserveSnapshot,
    config: AccrualConfig,
    span: Span,
}

impl<'a> ReserveCalculator<'a> {
    /// Validates the snapshot and builds a calculator with the default
    /// [`AccrualConfig`].
    pub fn new(snapshot: &'a ReserveSnapshot) -> Result<Self> {
        snapshot.validate()?;
        Ok(Self {
            snapshot,
            config: AccrualConfig::default(),
            span: tracing::debug_span!("reserve", symbol = %snapshot.symbol),
        })
    }

    pub fn with_config(mut self, config: AccrualConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the span under which all diagnostics are recorded
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn snapshot(&self) -> &ReserveSnapshot {
        self.snapshot
    }

    pub fn config(&self) -> AccrualConfig {
        self.config
    }

    /// Accrued debt and supply totals at `timestamp`
    pub fn accrue(&self, timestamp: u64) -> Result<AccrualResult> {
        let _guard = self.span.enter();
        let result = accrual::accrue(self.snapshot, timestamp, &self.config)?;
        debug!(
            timestamp,
            total_variable_debt = %result.total_variable_debt.raw(),
            total_stable_debt = %result.total_stable_debt.raw(),
            total_supply = %result.total_supply.raw(),
            "accrued reserve totals"
        );
        Ok(result)
    }

    /// Current rates given already accrued totals
    pub fn rates_for(&self, accrued: &AccrualResult) -> Result<RateResult> {
        let _guard = self.span.enter();
        let inputs = RateInputs {
            total_stable_debt: accrued.total_stable_debt,
            total_variable_debt: accrued.total_variable_debt,
            available_liquidity: self.snapshot.available_liquidity,
            unbacked: self.snapshot.unbacked,
            reserve_factor: self.snapshot.reserve_factor,
        };
        let ratios = irm::usage_ratios(&inputs)?;
        trace!(
            borrow_usage = %ratios.borrow.raw(),
            supply_usage = %ratios.supply.raw(),
            stable_to_total_debt = %ratios.stable_to_total_debt.raw(),
            "usage ratios"
        );

        let rates = irm::calculate_interest_rates(&self.snapshot.rate_curve, &inputs)?;
        debug!(
            liquidity_rate = %rates.current_liquidity_rate.raw(),
            stable_borrow_rate = %rates.current_stable_borrow_rate.raw(),
            variable_borrow_rate = %rates.current_variable_borrow_rate.raw(),
            "calculated interest rates"
        );
        Ok(rates)
    }

    /// Current rates at `timestamp`
    pub fn interest_rates(&self, timestamp: u64) -> Result<RateResult> {
        let accrued = self.accrue(timestamp)?;
        self.rates_for(&accrued)
    }

    /// Incentive APRs against the accrued totals at `timestamp`
    pub fn reward_aprs(&self, timestamp: u64, streams: &[IncentiveStream]) -> Result<RewardAprs> {
        let accrued = self.accrue(timestamp)?;
        self.reward_aprs_for(&accrued, streams)
    }

    fn reward_aprs_for(
        &self,
        accrued: &AccrualResult,
        streams: &[IncentiveStream],
    ) -> Result<RewardAprs> {
        let _guard = self.span.enter();
        let aprs = rewards::reward_aprs(
            streams,
            accrued,
            self.snapshot.price,
            self.snapshot.decimals,
        )?;
        debug!(
            streams = aprs.streams.len(),
            supply_apr = %aprs.supply_apr,
            debt_apr = %aprs.debt_apr,
            "calculated reward aprs"
        );
        Ok(aprs)
    }

    /// Runs the full pipeline: accrual, rates, then reward APRs.
    pub fn evaluate(&self, timestamp: u64, streams: &[IncentiveStream]) -> Result<ReserveState> {
        let accrual = self.accrue(timestamp)?;
        let rates = self.rates_for(&accrual)?;
        let rewards = self.reward_aprs_for(&accrual, streams)?;
        Ok(ReserveState {
            timestamp,
            accrual,
            rates,
            rewards,
        })
    }
}
