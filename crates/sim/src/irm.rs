//! Kinked Interest Rate Model (IRM) implementation.
//!
//! This module reproduces the default reserve interest rate strategy of Aave V3:
//! a two-slope curve on the borrow usage ratio, plus a premium on the stable
//! rate when stable debt makes up too large a share of total debt.
//!
//! # The Curve
//!
//! ```text
//! If usage > optimal:
//!     excess = (usage - optimal) / (1 - optimal)
//!     rate   = base + slope1 + slope2 * excess      // steep part
//! Else:
//!     rate   = base + slope1 * usage / optimal      // gentle part
//! ```
//!
//! Both branches meet at `base + slope1` when `usage == optimal`.
//!
//! # Stable Debt Premium
//!
//! ```text
//! If stable_debt / total_debt > optimal_stable_ratio:
//!     excess = (ratio - optimal_stable_ratio) / max_excess_stable_ratio
//!     stable_rate += stable_rate_excess_offset * excess
//! ```
//!
//! # Supply Rate
//!
//! ```text
//! overall   = (variable_debt * variable_rate + stable_debt * stable_rate) / total_debt
//! liquidity = overall * supply_usage * (1 - reserve_factor)
//! ```
//!
//! All quantities are ray-scaled (`1e27`), the reserve factor is in basis points.
//!
//! # Example
//!
//! ```rust
//! use aave_rs_sim::irm::RateCurve;
//! use aave_rs_sim::math::{Ray, RAY};
//! use alloy_primitives::U256;
//!
//! let pct = |p: u64| Ray::new(RAY * U256::from(p) / U256::from(100));
//! let curve = RateCurve {
//!     optimal_usage_ratio: pct(80),
//!     variable_rate_slope1: pct(4),
//!     variable_rate_slope2: pct(60),
//!     ..RateCurve::default()
//! };
//!
//! // At the kink the variable rate is exactly base + slope1
//! assert_eq!(curve.variable_rate_at(pct(80)).unwrap(), pct(4));
//! ```

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::{Ray, Wad, PERCENTAGE_FACTOR, RAY};

/// Parameters of a reserve's interest rate strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCurve {
    /// Usage ratio at which the slope steepens
    pub optimal_usage_ratio: Ray,
    /// Variable rate at zero usage
    pub base_variable_borrow_rate: Ray,
    /// Variable rate increase from zero to optimal usage
    pub variable_rate_slope1: Ray,
    /// Variable rate increase from optimal to full usage
    pub variable_rate_slope2: Ray,
    /// Stable rate at zero usage
    pub base_stable_borrow_rate: Ray,
    /// Stable rate increase from zero to optimal usage
    pub stable_rate_slope1: Ray,
    /// Stable rate increase from optimal to full usage
    pub stable_rate_slope2: Ray,
    /// Stable-to-total debt ratio above which the stable premium applies
    pub optimal_stable_to_total_debt_ratio: Ray,
    /// Normalizer of the stable debt excess, `1 - optimal_stable_to_total_debt_ratio` on-chain
    pub max_excess_stable_to_total_debt_ratio: Ray,
    /// Premium added to the stable rate at maximum stable debt excess
    pub stable_rate_excess_offset: Ray,
}

/// Reserve totals that drive the rate model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateInputs {
    pub total_stable_debt: Wad,
    pub total_variable_debt: Wad,
    pub available_liquidity: Wad,
    /// Minted but unbacked supply, counted in the supply usage ratio only
    pub unbacked: Wad,
    /// Share of interest kept by the protocol, in basis points
    pub reserve_factor: u16,
}

/// Current rates of a reserve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateResult {
    pub borrow_usage_ratio: Ray,
    pub current_liquidity_rate: Ray,
    pub current_stable_borrow_rate: Ray,
    pub current_variable_borrow_rate: Ray,
}

/// Borrow and supply usage ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageRatios {
    /// `total_debt / (available_liquidity + total_debt)`
    pub borrow: Ray,
    /// `total_debt / (available_liquidity + total_debt + unbacked)`
    pub supply: Ray,
    /// `stable_debt / total_debt`
    pub stable_to_total_debt: Ray,
}

/// Computes the usage ratios. All ratios are zero when there is no debt.
pub fn usage_ratios(inputs: &RateInputs) -> Result<UsageRatios> {
    let total_debt = inputs
        .total_stable_debt
        .checked_add(inputs.total_variable_debt)?;

    if total_debt.is_zero() {
        return Ok(UsageRatios {
            borrow: Ray::ZERO,
            supply: Ray::ZERO,
            stable_to_total_debt: Ray::ZERO,
        });
    }

    let total_liquidity = inputs.available_liquidity.checked_add(total_debt)?;
    let borrow = total_debt.ray_div(total_liquidity)?;
    if borrow > Ray::ONE {
        return Err(SimError::invalid(
            "borrow_usage_ratio",
            format!("{} exceeds one ray", borrow.raw()),
        ));
    }

    Ok(UsageRatios {
        borrow,
        supply: total_debt.ray_div(total_liquidity.checked_add(inputs.unbacked)?)?,
        stable_to_total_debt: inputs.total_stable_debt.ray_div(total_debt)?,
    })
}

/// Distance past the kink, normalized to the steep segment: `(usage - optimal) / (1 - optimal)`.
///
/// Zero at or below the kink.
pub fn excess_usage_ratio(usage: Ray, optimal: Ray) -> Result<Ray> {
    if usage <= optimal {
        return Ok(Ray::ZERO);
    }
    usage
        .checked_sub(optimal)?
        .ray_div(Ray::ONE.checked_sub(optimal)?)
}

/// Stable debt share above its optimum, normalized by the maximum excess.
///
/// Zero at or below the optimum. Unrelated to [`excess_usage_ratio`] beyond
/// the shape of the formula.
pub fn excess_stable_debt_ratio(
    stable_to_total_debt: Ray,
    optimal_stable_ratio: Ray,
    max_excess_stable_ratio: Ray,
) -> Result<Ray> {
    if stable_to_total_debt <= optimal_stable_ratio {
        return Ok(Ray::ZERO);
    }
    if max_excess_stable_ratio.is_zero() {
        return Err(SimError::DivisionByZero {
            operation: "excess_stable_debt_ratio",
        });
    }
    stable_to_total_debt
        .checked_sub(optimal_stable_ratio)?
        .ray_div(max_excess_stable_ratio)
}

/// Debt-weighted average of the variable and stable rates.
pub fn overall_borrow_rate(
    total_stable_debt: Wad,
    total_variable_debt: Wad,
    variable_rate: Ray,
    stable_rate: Ray,
) -> Result<Ray> {
    let total_debt = total_stable_debt.checked_add(total_variable_debt)?;
    if total_debt.is_zero() {
        return Ok(Ray::ZERO);
    }

    let weighted_variable_rate = total_variable_debt.to_ray()?.ray_mul(variable_rate)?;
    let weighted_stable_rate = total_stable_debt.to_ray()?.ray_mul(stable_rate)?;

    weighted_variable_rate
        .checked_add(weighted_stable_rate)?
        .ray_div(total_debt.to_ray()?)
}

fn rate_below_kink(base: Ray, slope1: Ray, usage: Ray, optimal: Ray) -> Result<Ray> {
    if optimal.is_zero() {
        return Ok(base);
    }
    base.checked_add(slope1.ray_mul(usage)?.ray_div(optimal)?)
}

fn rate_above_kink(base: Ray, slope1: Ray, slope2: Ray, excess: Ray) -> Result<Ray> {
    base.checked_add(slope1.checked_add(slope2.ray_mul(excess)?)?)
}

impl RateCurve {
    fn slope_rate(&self, base: Ray, slope1: Ray, slope2: Ray, usage: Ray) -> Result<Ray> {
        if usage > self.optimal_usage_ratio {
            let excess = excess_usage_ratio(usage, self.optimal_usage_ratio)?;
            rate_above_kink(base, slope1, slope2, excess)
        } else {
            rate_below_kink(base, slope1, usage, self.optimal_usage_ratio)
        }
    }

    /// Variable borrow rate at the given borrow usage ratio
    pub fn variable_rate_at(&self, usage: Ray) -> Result<Ray> {
        self.slope_rate(
            self.base_variable_borrow_rate,
            self.variable_rate_slope1,
            self.variable_rate_slope2,
            usage,
        )
    }

    /// Stable borrow rate at the given usage ratio, before the stable debt premium
    pub fn stable_rate_at(&self, usage: Ray) -> Result<Ray> {
        self.slope_rate(
            self.base_stable_borrow_rate,
            self.stable_rate_slope1,
            self.stable_rate_slope2,
            usage,
        )
    }

    /// Largest gap between the two branches evaluated at the kink, over the
    /// stable and variable curves.
    pub fn kink_discontinuity(&self) -> Result<U256> {
        let optimal = self.optimal_usage_ratio;
        let gap = |base: Ray, slope1: Ray, slope2: Ray| -> Result<U256> {
            let below = rate_below_kink(base, slope1, optimal, optimal)?.raw();
            let above = rate_above_kink(base, slope1, slope2, Ray::ZERO)?.raw();
            Ok(if below > above { below - above } else { above - below })
        };

        let variable = gap(
            self.base_variable_borrow_rate,
            self.variable_rate_slope1,
            self.variable_rate_slope2,
        )?;
        let stable = gap(
            self.base_stable_borrow_rate,
            self.stable_rate_slope1,
            self.stable_rate_slope2,
        )?;
        Ok(variable.max(stable))
    }

    /// Rounding the below-kink branch can introduce at the kink.
    ///
    /// `ray_mul` is off by at most half a unit, which `ray_div` by `opt` scales
    /// up by `RAY / opt`, plus half a unit of its own. A zero optimal ratio
    /// has no below-kink range to round, so only one unit is allowed.
    pub fn kink_tolerance(&self) -> U256 {
        let optimal = self.optimal_usage_ratio.raw();
        if optimal.is_zero() {
            return U256::from(1);
        }
        RAY.div_ceil(optimal) + U256::from(1)
    }

    /// Checks the ratio bounds and the continuity of both curves at the kink,
    /// up to [`RateCurve::kink_tolerance`].
    pub fn validate(&self) -> Result<()> {
        if self.optimal_usage_ratio > Ray::ONE {
            return Err(SimError::invalid(
                "optimal_usage_ratio",
                "must not exceed one ray",
            ));
        }
        if self.optimal_stable_to_total_debt_ratio > Ray::ONE {
            return Err(SimError::invalid(
                "optimal_stable_to_total_debt_ratio",
                "must not exceed one ray",
            ));
        }

        let gap = self.kink_discontinuity()?;
        let tolerance = self.kink_tolerance();
        if gap > tolerance {
            return Err(SimError::invalid(
                "rate_curve",
                format!("branches disagree at the kink by {gap}, tolerance {tolerance}"),
            ));
        }
        Ok(())
    }
}

/// Calculates the current liquidity, stable and variable rates of a reserve.
///
/// # Example
///
/// ```rust
/// use aave_rs_sim::irm::{calculate_interest_rates, RateCurve, RateInputs};
/// use aave_rs_sim::math::{Ray, Wad, RAY, WAD};
/// use alloy_primitives::U256;
///
/// let pct = |p: u64| Ray::new(RAY * U256::from(p) / U256::from(100));
/// let curve = RateCurve {
///     optimal_usage_ratio: pct(80),
///     variable_rate_slope1: pct(4),
///     variable_rate_slope2: pct(60),
///     ..RateCurve::default()
/// };
/// let inputs = RateInputs {
///     total_stable_debt: Wad::ZERO,
///     total_variable_debt: Wad::new(WAD * U256::from(40)),
///     available_liquidity: Wad::new(WAD * U256::from(60)),
///     unbacked: Wad::ZERO,
///     reserve_factor: 1_000,
/// };
///
/// let rates = calculate_interest_rates(&curve, &inputs).unwrap();
/// assert_eq!(rates.borrow_usage_ratio, pct(40));
/// assert_eq!(rates.current_variable_borrow_rate, pct(2));
/// ```
pub fn calculate_interest_rates(curve: &RateCurve, inputs: &RateInputs) -> Result<RateResult> {
    let ratios = usage_ratios(inputs)?;

    let mut current_stable_borrow_rate = curve.stable_rate_at(ratios.borrow)?;
    let current_variable_borrow_rate = curve.variable_rate_at(ratios.borrow)?;

    if ratios.stable_to_total_debt > curve.optimal_stable_to_total_debt_ratio {
        let excess = excess_stable_debt_ratio(
            ratios.stable_to_total_debt,
            curve.optimal_stable_to_total_debt_ratio,
            curve.max_excess_stable_to_total_debt_ratio,
        )?;
        current_stable_borrow_rate =
            current_stable_borrow_rate.checked_add(curve.stable_rate_excess_offset.ray_mul(excess)?)?;
    }

    let reserve_factor = U256::from(inputs.reserve_factor);
    if reserve_factor > PERCENTAGE_FACTOR {
        return Err(SimError::invalid(
            "reserve_factor",
            format!("{reserve_factor} exceeds 10000 basis points"),
        ));
    }

    let current_liquidity_rate = overall_borrow_rate(
        inputs.total_stable_debt,
        inputs.total_variable_debt,
        current_variable_borrow_rate,
        current_stable_borrow_rate,
    )?
    .ray_mul(ratios.supply)?
    .percent_mul(PERCENTAGE_FACTOR - reserve_factor)?;

    Ok(RateResult {
        borrow_usage_ratio: ratios.borrow,
        current_liquidity_rate,
        current_stable_borrow_rate,
        current_variable_borrow_rate,
    })
}

/// Ray value of a whole percentage
pub fn ray_from_percent(percent: u64) -> Ray {
    Ray::new(RAY * U256::from(percent) / U256::from(100))
}
