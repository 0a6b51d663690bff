//! Flashloan leverage sizing.
//!
//! Leveraging a supply position in one transaction works by flash-borrowing
//! the borrow asset, swapping it into the supply asset, supplying everything
//! and borrowing against the new collateral to repay the flashloan plus its
//! fee. Deleveraging runs the same loop backwards. The sizes have closed
//! forms:
//!
//! | Quantity | Formula |
//! |----------|---------|
//! | Target LTV for leverage `L` | `((S+s)(L-1)(1+f) + p·B·r) / ((S+s)·L·p·r)` |
//! | Leverage-up, base | `(s·t + S(t-c))·p·r / (1 + f - t·p·r)` |
//! | Leverage-up, quote | `(S(t-c) + s·t)·p / (1 + f - t·p·r)` |
//! | Deleverage, base | `-(S·p·c - s - S·t)·r / ((1+f)·t + r)` |
//!
//! with `S` supplied, `s` new supply, `B` borrowed, `c` current LTV, `t`
//! target LTV, `p` borrow price, `r` supply exchange rate and `f` the
//! flashloan fee premium.
//!
//! Each closed form divides by a quantity that reaches zero (or changes sign)
//! at the edge of feasibility, e.g. a target LTV at which every extra unit
//! borrowed only pays the fee. Such inputs are reported as
//! [`StrategyError::NonConvergent`] rather than as a huge or negative size.
//!
//! # Example
//!
//! ```rust
//! use aave_rs_strategy::leverage::{LeveragePosition, LeverageSolver};
//! use rust_decimal_macros::dec;
//!
//! let position = LeveragePosition {
//!     supplied: dec!(100),
//!     borrowed: dec!(0),
//!     supply: dec!(0),
//!     current_ltv: dec!(0),
//!     price_borrow: dec!(1),
//!     supply_exchange_rate: dec!(1),
//!     flashloan_fee: dec!(0.0009),
//! };
//!
//! let solver = LeverageSolver::default();
//! let amount = solver.flashloan_leverage_base_amount(&position, dec!(0.67)).unwrap();
//! assert!(amount > dec!(202) && amount < dec!(203));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, Span};

use crate::convert::{add, div, mul, sub};
use crate::error::{Result, StrategyError};

/// Default smallest denominator accepted as convergent
pub const DEFAULT_MIN_DENOMINATOR: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Solver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSolverConfig")]
pub struct SolverConfig {
    /// Denominators at or below this value are reported as non-convergent
    pub min_denominator: Decimal,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            min_denominator: DEFAULT_MIN_DENOMINATOR,
        }
    }
}

/// Unchecked wire form of [`SolverConfig`]
#[derive(Deserialize)]
#[serde(default)]
struct RawSolverConfig {
    min_denominator: Decimal,
}

impl Default for RawSolverConfig {
    fn default() -> Self {
        Self {
            min_denominator: DEFAULT_MIN_DENOMINATOR,
        }
    }
}

impl TryFrom<RawSolverConfig> for SolverConfig {
    type Error = StrategyError;

    fn try_from(raw: RawSolverConfig) -> Result<Self> {
        Self::new(raw.min_denominator)
    }
}

impl SolverConfig {
    /// Settings with the given convergence floor, which must not be negative.
    pub fn new(min_denominator: Decimal) -> Result<Self> {
        if min_denominator < Decimal::ZERO {
            return Err(StrategyError::Config(format!(
                "min_denominator {min_denominator} must not be negative"
            )));
        }
        Ok(Self { min_denominator })
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StrategyError::Config(e.to_string()))
    }
}

/// A supply/borrow position and the market it sits in, in human units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveragePosition {
    /// Already supplied collateral
    pub supplied: Decimal,
    /// Already borrowed debt
    pub borrowed: Decimal,
    /// Collateral added by this operation
    pub supply: Decimal,
    /// Debt-to-collateral ratio of the existing position
    pub current_ltv: Decimal,
    /// Price of the borrow asset in units of the supply asset
    pub price_borrow: Decimal,
    /// Supply-asset units received per unit swapped in
    pub supply_exchange_rate: Decimal,
    /// Flashloan premium as a ratio, e.g. `0.0009`
    pub flashloan_fee: Decimal,
}

impl LeveragePosition {
    /// Builds a position from balances, deriving the current LTV as
    /// `borrowed / supplied` (zero when nothing is supplied).
    pub fn from_balances(
        supplied: Decimal,
        borrowed: Decimal,
        supply: Decimal,
        price_borrow: Decimal,
        supply_exchange_rate: Decimal,
        flashloan_fee: Decimal,
    ) -> Result<Self> {
        let current_ltv = if supplied.is_zero() {
            Decimal::ZERO
        } else {
            div(borrowed, supplied, "current_ltv")?
        };
        Ok(Self {
            supplied,
            borrowed,
            supply,
            current_ltv,
            price_borrow,
            supply_exchange_rate,
            flashloan_fee,
        })
    }

    fn validate(&self) -> Result<()> {
        let non_negative = [
            ("supplied", self.supplied),
            ("borrowed", self.borrowed),
            ("supply", self.supply),
            ("flashloan_fee", self.flashloan_fee),
        ];
        for (field, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(StrategyError::invalid(field, format!("{value} is negative")));
            }
        }

        let positive = [
            ("price_borrow", self.price_borrow),
            ("supply_exchange_rate", self.supply_exchange_rate),
        ];
        for (field, value) in positive {
            if value <= Decimal::ZERO {
                return Err(StrategyError::invalid(field, format!("{value} is not positive")));
            }
        }

        validate_ltv("current_ltv", self.current_ltv)
    }

    fn total_supply(&self) -> Result<Decimal> {
        add(self.supplied, self.supply, "total_supply")
    }
}

fn validate_ltv(field: &'static str, ltv: Decimal) -> Result<()> {
    if ltv < Decimal::ZERO || ltv >= Decimal::ONE {
        return Err(StrategyError::invalid(field, format!("{ltv} is outside [0, 1)")));
    }
    Ok(())
}

/// What a leverage operation aims for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageTarget {
    /// Reach this loan-to-value
    Ltv(Decimal),
    /// Reach this ratio of total collateral to own capital
    Multiplier(Decimal),
}

/// Asset a flashloan amount is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Denomination {
    /// The borrow asset
    Base,
    /// The supply asset
    Quote,
}

/// Signed flashloan size: positive borrows to lever up, negative repays to delever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashloanNotional {
    pub amount: Decimal,
    pub denomination: Denomination,
}

/// Result of [`LeverageSolver::solve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverageSolution {
    pub target_ltv: Decimal,
    pub flashloan: FlashloanNotional,
}

/// Stateless closed-form solver for flashloan leverage.
#[derive(Debug, Clone)]
pub struct LeverageSolver {
    config: SolverConfig,
    span: Span,
}

impl Default for LeverageSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl LeverageSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            span: tracing::debug_span!("leverage_solver"),
        }
    }

    /// Replaces the span under which all diagnostics are recorded
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    fn checked_quotient(
        &self,
        operation: &'static str,
        numerator: Decimal,
        denominator: Decimal,
    ) -> Result<Decimal> {
        debug!(operation, %numerator, %denominator, "closed form");
        if denominator <= self.config.min_denominator {
            return Err(StrategyError::NonConvergent {
                operation,
                denominator,
            });
        }
        div(numerator, denominator, operation)
    }

    /// Target LTV at which the position's collateral is `leverage` times its equity.
    pub fn target_ltv_for_leverage(
        &self,
        position: &LeveragePosition,
        leverage: Decimal,
    ) -> Result<Decimal> {
        let _guard = self.span.enter();
        position.validate()?;
        if leverage < Decimal::ONE {
            return Err(StrategyError::invalid(
                "leverage",
                format!("{leverage} is below 1"),
            ));
        }

        let op = "target_ltv_for_leverage";
        let total_supply = position.total_supply()?;
        let price_rate = mul(position.price_borrow, position.supply_exchange_rate, op)?;

        let numerator = add(
            mul(
                mul(total_supply, sub(leverage, Decimal::ONE, op)?, op)?,
                add(Decimal::ONE, position.flashloan_fee, op)?,
                op,
            )?,
            mul(price_rate, position.borrowed, op)?,
            op,
        )?;
        let denominator = mul(mul(total_supply, leverage, op)?, price_rate, op)?;

        let target = self.checked_quotient(op, numerator, denominator)?;
        validate_ltv("target_ltv", target)?;
        Ok(target)
    }

    fn leverage_denominator(
        position: &LeveragePosition,
        target_ltv: Decimal,
        op: &'static str,
    ) -> Result<Decimal> {
        sub(
            add(Decimal::ONE, position.flashloan_fee, op)?,
            mul(
                mul(target_ltv, position.price_borrow, op)?,
                position.supply_exchange_rate,
                op,
            )?,
            op,
        )
    }

    fn leverage_collateral_delta(
        position: &LeveragePosition,
        target_ltv: Decimal,
        op: &'static str,
    ) -> Result<Decimal> {
        add(
            mul(position.supply, target_ltv, op)?,
            mul(
                position.supplied,
                sub(target_ltv, position.current_ltv, op)?,
                op,
            )?,
            op,
        )
    }

    fn validate_leverage_up(position: &LeveragePosition, target_ltv: Decimal) -> Result<()> {
        position.validate()?;
        validate_ltv("target_ltv", target_ltv)?;
        if target_ltv < position.current_ltv {
            return Err(StrategyError::invalid(
                "target_ltv",
                format!(
                    "{target_ltv} is below the current LTV {}; deleverage instead",
                    position.current_ltv
                ),
            ));
        }
        Ok(())
    }

    /// Flashloan size, in the borrow asset, to lever the position up to `target_ltv`.
    pub fn flashloan_leverage_base_amount(
        &self,
        position: &LeveragePosition,
        target_ltv: Decimal,
    ) -> Result<Decimal> {
        let _guard = self.span.enter();
        Self::validate_leverage_up(position, target_ltv)?;

        let op = "flashloan_leverage_base_amount";
        let numerator = mul(
            mul(
                Self::leverage_collateral_delta(position, target_ltv, op)?,
                position.price_borrow,
                op,
            )?,
            position.supply_exchange_rate,
            op,
        )?;
        let denominator = Self::leverage_denominator(position, target_ltv, op)?;
        self.checked_quotient(op, numerator, denominator)
    }

    /// Flashloan size, in the supply asset, to lever the position up to `target_ltv`.
    pub fn flashloan_leverage_quote_amount(
        &self,
        position: &LeveragePosition,
        target_ltv: Decimal,
    ) -> Result<Decimal> {
        let _guard = self.span.enter();
        Self::validate_leverage_up(position, target_ltv)?;

        let op = "flashloan_leverage_quote_amount";
        let numerator = mul(
            Self::leverage_collateral_delta(position, target_ltv, op)?,
            position.price_borrow,
            op,
        )?;
        let denominator = Self::leverage_denominator(position, target_ltv, op)?;
        self.checked_quotient(op, numerator, denominator)
    }

    /// Flashloan size, in the borrow asset, to bring the position down to
    /// `target_ltv`. Returned negative: it is repaid debt.
    pub fn flashloan_deleverage_base_amount(
        &self,
        position: &LeveragePosition,
        target_ltv: Decimal,
    ) -> Result<Decimal> {
        let _guard = self.span.enter();
        position.validate()?;
        validate_ltv("target_ltv", target_ltv)?;
        if target_ltv > position.current_ltv {
            return Err(StrategyError::invalid(
                "target_ltv",
                format!(
                    "{target_ltv} is above the current LTV {}; leverage instead",
                    position.current_ltv
                ),
            ));
        }

        let op = "flashloan_deleverage_base_amount";
        let excess = sub(
            sub(
                mul(
                    mul(position.supplied, position.price_borrow, op)?,
                    position.current_ltv,
                    op,
                )?,
                position.supply,
                op,
            )?,
            mul(position.supplied, target_ltv, op)?,
            op,
        )?;
        if excess < Decimal::ZERO {
            return Err(StrategyError::invalid(
                "target_ltv",
                format!("position has no debt to repay to reach {target_ltv}"),
            ));
        }

        let numerator = mul(excess, position.supply_exchange_rate, op)?;
        let denominator = add(
            mul(
                add(Decimal::ONE, position.flashloan_fee, op)?,
                target_ltv,
                op,
            )?,
            position.supply_exchange_rate,
            op,
        )?;
        let amount = self.checked_quotient(op, numerator, denominator)?;
        Ok(-amount)
    }

    /// Solves for the target LTV and the base-asset flashloan that reaches it.
    ///
    /// Targets at or above the current LTV lever up, targets below it delever.
    pub fn solve(
        &self,
        position: &LeveragePosition,
        target: LeverageTarget,
    ) -> Result<LeverageSolution> {
        let target_ltv = match target {
            LeverageTarget::Ltv(ltv) => ltv,
            LeverageTarget::Multiplier(leverage) => {
                self.target_ltv_for_leverage(position, leverage)?
            }
        };

        let amount = if target_ltv >= position.current_ltv {
            self.flashloan_leverage_base_amount(position, target_ltv)?
        } else {
            self.flashloan_deleverage_base_amount(position, target_ltv)?
        };

        let _guard = self.span.enter();
        debug!(%target_ltv, %amount, "solved leverage");
        Ok(LeverageSolution {
            target_ltv,
            flashloan: FlashloanNotional {
                amount,
                denomination: Denomination::Base,
            },
        })
    }
}
