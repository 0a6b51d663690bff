//! Interest accrual between a stored reserve snapshot and the current time.
//!
//! Indexes stored on-chain are only refreshed when someone touches the
//! reserve. To know the current debt and supply totals, the stored index is
//! grown by the interest accumulated since the last update, using either
//! linear growth or the protocol's Taylor-approximated compounding.
//!
//! # Formulas
//!
//! ```text
//! linear     = RAY + rate * dt / SECONDS_PER_YEAR
//! compounded = RAY + rate * dt / SECONDS_PER_YEAR
//!                  + dt * (dt - 1) * p2 / 2
//!                  + dt * (dt - 1) * max(dt - 2, 0) * p3 / 6
//!
//! where p2 = ray_mul(rate, rate) / SECONDS_PER_YEAR^2
//!       p3 = ray_mul(p2, rate) / SECONDS_PER_YEAR
//! ```
//!
//! The terms are evaluated in exactly this order; integer division makes any
//! reassociation visible in the last digits.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::config::{AccrualConfig, IndexGrowth};
use crate::error::{Result, SimError};
use crate::math::{checked_add, checked_div, checked_mul, ray_mul, Ray, Wad, RAY, SECONDS_PER_YEAR};
use crate::reserve::ReserveSnapshot;

/// Current reserve totals after accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualResult {
    /// Variable debt including interest since the last update
    pub total_variable_debt: Wad,
    /// Stable debt including interest since the stable debt last update
    pub total_stable_debt: Wad,
    /// Supply-token (aToken) total including interest
    pub total_supply: Wad,
}

impl AccrualResult {
    /// Stable plus variable debt
    pub fn total_debt(&self) -> Result<Wad> {
        self.total_stable_debt.checked_add(self.total_variable_debt)
    }
}

fn elapsed(current_timestamp: u64, last_update_timestamp: u64) -> Result<u64> {
    current_timestamp
        .checked_sub(last_update_timestamp)
        .ok_or(SimError::InvalidInterestAccrual {
            timestamp: current_timestamp,
            last_update: last_update_timestamp,
        })
}

/// Simple-interest growth factor over `[last_update_timestamp, current_timestamp]`.
///
/// ```rust
/// use aave_rs_sim::accrual::linear_interest;
/// use aave_rs_sim::math::Ray;
///
/// assert_eq!(linear_interest(Ray::ZERO, 1_000, 0).unwrap(), Ray::ONE);
/// ```
pub fn linear_interest(
    rate: Ray,
    current_timestamp: u64,
    last_update_timestamp: u64,
) -> Result<Ray> {
    let time_delta = U256::from(elapsed(current_timestamp, last_update_timestamp)?);
    let accrued = checked_mul(rate.raw(), time_delta, "linear_interest")? / SECONDS_PER_YEAR;
    checked_add(RAY, accrued, "linear_interest").map(Ray::new)
}

/// Compounded growth factor, approximated by the first three terms of the
/// binomial expansion of `(1 + rate / SECONDS_PER_YEAR)^dt`.
///
/// Returns exactly [`Ray::ONE`] when no time has passed.
pub fn compounded_interest(
    rate: Ray,
    current_timestamp: u64,
    last_update_timestamp: u64,
) -> Result<Ray> {
    let dt = elapsed(current_timestamp, last_update_timestamp)?;
    if dt == 0 {
        return Ok(Ray::ONE);
    }

    let time_delta = U256::from(dt);
    let exp_minus_one = U256::from(dt - 1);
    let exp_minus_two = U256::from(dt.saturating_sub(2));
    let rate = rate.raw();

    let seconds_per_year_squared = SECONDS_PER_YEAR * SECONDS_PER_YEAR;
    let base_power_two = ray_mul(rate, rate)? / seconds_per_year_squared;
    let base_power_three = ray_mul(base_power_two, rate)? / SECONDS_PER_YEAR;

    let op = "compounded_interest";
    let second_term = checked_mul(
        checked_mul(time_delta, exp_minus_one, op)?,
        base_power_two,
        op,
    )? / U256::from(2);
    let third_term = checked_mul(
        checked_mul(checked_mul(time_delta, exp_minus_one, op)?, exp_minus_two, op)?,
        base_power_three,
        op,
    )? / U256::from(6);

    let first_term = checked_div(checked_mul(rate, time_delta, op)?, SECONDS_PER_YEAR, op)?;
    let result = checked_add(
        checked_add(checked_add(RAY, first_term, op)?, second_term, op)?,
        third_term,
        op,
    )?;
    Ok(Ray::new(result))
}

/// Dispatches to [`linear_interest`] or [`compounded_interest`]
pub fn growth_factor(
    growth: IndexGrowth,
    rate: Ray,
    current_timestamp: u64,
    last_update_timestamp: u64,
) -> Result<Ray> {
    match growth {
        IndexGrowth::Linear => linear_interest(rate, current_timestamp, last_update_timestamp),
        IndexGrowth::Compounded => {
            compounded_interest(rate, current_timestamp, last_update_timestamp)
        }
    }
}

/// Current variable-borrow index: the stored index grown at the stored variable rate
pub fn normalized_variable_debt(snapshot: &ReserveSnapshot, timestamp: u64) -> Result<Ray> {
    compounded_interest(
        snapshot.variable_borrow_rate,
        timestamp,
        snapshot.last_update_timestamp,
    )?
    .ray_mul(snapshot.variable_borrow_index)
}

/// Current liquidity index: the stored index grown at the stored liquidity rate
pub fn normalized_income(
    snapshot: &ReserveSnapshot,
    timestamp: u64,
    growth: IndexGrowth,
) -> Result<Ray> {
    growth_factor(
        growth,
        snapshot.liquidity_rate,
        timestamp,
        snapshot.last_update_timestamp,
    )?
    .ray_mul(snapshot.liquidity_index)
}

/// Converts the snapshot's scaled balances into current actual amounts.
pub fn accrue(
    snapshot: &ReserveSnapshot,
    timestamp: u64,
    config: &AccrualConfig,
) -> Result<AccrualResult> {
    let total_variable_debt = Wad::new(ray_mul(
        normalized_variable_debt(snapshot, timestamp)?.raw(),
        snapshot.total_scaled_variable_debt.raw(),
    )?);

    let stable_growth = growth_factor(
        config.stable_debt_growth,
        snapshot.average_stable_rate,
        timestamp,
        snapshot.stable_debt_last_update_timestamp,
    )?;
    let total_stable_debt = snapshot.total_principal_stable_debt.ray_mul(stable_growth)?;

    let total_supply = snapshot
        .scaled_total_supply
        .ray_mul(normalized_income(snapshot, timestamp, config.supply_growth)?)?;

    Ok(AccrualResult {
        total_variable_debt,
        total_stable_debt,
        total_supply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent(p: u64) -> Ray {
        Ray::new(RAY * U256::from(p) / U256::from(100))
    }

    fn relative_error(actual: U256, expected: f64) -> f64 {
        let actual = actual.to_string().parse::<f64>().unwrap() / 1e27;
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn test_linear_interest_zero_rate() {
        for dt in [0u64, 1, 2, 86_400, 31_536_000, 10 * 31_536_000] {
            assert_eq!(linear_interest(Ray::ZERO, 1_000 + dt, 1_000).unwrap(), Ray::ONE);
        }
    }

    #[test]
    fn test_linear_interest_one_year() {
        let result = linear_interest(percent(5), 31_536_000, 0).unwrap();
        assert_eq!(result, Ray::new(RAY * U256::from(105) / U256::from(100)));
    }

    #[test]
    fn test_compounded_interest_no_elapsed_time() {
        for rate in [Ray::ZERO, percent(5), percent(300), Ray::new(U256::from(1))] {
            for t0 in [0u64, 1, 1_700_000_000] {
                assert_eq!(compounded_interest(rate, t0, t0).unwrap(), Ray::ONE);
            }
        }
    }

    #[test]
    fn test_compounded_interest_one_year() {
        let result = compounded_interest(percent(5), 31_536_000, 0).unwrap();
        assert!(relative_error(result.raw(), 1.05127) < 1e-6);
        assert!(relative_error(result.raw(), 0.05f64.exp()) < 1e-6);
    }

    #[test]
    fn test_compounded_interest_one_and_two_seconds() {
        // dt = 1: only the linear term survives
        let rate = percent(10);
        let one = compounded_interest(rate, 1, 0).unwrap();
        let linear = linear_interest(rate, 1, 0).unwrap();
        assert_eq!(one, linear);

        // dt = 2: the cubic term is zero, the quadratic term is not
        let two = compounded_interest(rate, 2, 0).unwrap();
        assert!(two > linear_interest(rate, 2, 0).unwrap());
    }

    #[test]
    fn test_compounded_exceeds_linear() {
        let rate = percent(20);
        let compounded = compounded_interest(rate, 86_400 * 30, 0).unwrap();
        let linear = linear_interest(rate, 86_400 * 30, 0).unwrap();
        assert!(compounded > linear);
    }

    #[test]
    fn test_accrual_rejects_time_travel() {
        let err = linear_interest(percent(5), 10, 20).unwrap_err();
        assert_eq!(
            err,
            SimError::InvalidInterestAccrual {
                timestamp: 10,
                last_update: 20
            }
        );
        assert!(compounded_interest(percent(5), 10, 20).is_err());
    }

    #[test]
    fn test_growth_factor_dispatch() {
        let rate = percent(8);
        assert_eq!(
            growth_factor(IndexGrowth::Linear, rate, 1_000, 0).unwrap(),
            linear_interest(rate, 1_000, 0).unwrap()
        );
        assert_eq!(
            growth_factor(IndexGrowth::Compounded, rate, 1_000, 0).unwrap(),
            compounded_interest(rate, 1_000, 0).unwrap()
        );
    }
}
