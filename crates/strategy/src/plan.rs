//! Leverage plans: sizing plus the yield a levered position would earn.

use aave_rs_sim::{IncentiveSide, IncentiveStream, RateResult, ReserveSnapshot, ReserveState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::convert::{add, apr_to_decimal, div, mul, ray_to_decimal, sub, u256_to_decimal};
use crate::error::{Result, StrategyError};
use crate::leverage::{LeveragePosition, LeverageSolver};

/// Incentive yield of one stream, in human units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardYield {
    pub reward_token_symbol: String,
    pub side: IncentiveSide,
    /// Ratio, e.g. `0.031` for 3.1%
    pub apr: Decimal,
    pub reward_token_price: Decimal,
}

/// Rates and prices of the reserve a position is levered in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketYields {
    /// Ratio
    pub supply_apr: Decimal,
    /// Ratio
    pub borrow_apr: Decimal,
    pub asset_price: Decimal,
    pub rewards: Vec<RewardYield>,
}

impl MarketYields {
    /// Collects the yields of an evaluated reserve.
    ///
    /// `streams` must be the streams `state` was evaluated with, in the same
    /// order. Reward prices share the asset price's oracle decimals.
    pub fn from_reserve(
        snapshot: &ReserveSnapshot,
        state: &ReserveState,
        streams: &[IncentiveStream],
    ) -> Result<Self> {
        if streams.len() != state.rewards.streams.len() {
            return Err(StrategyError::invalid(
                "streams",
                format!(
                    "{} streams given for {} evaluated",
                    streams.len(),
                    state.rewards.streams.len()
                ),
            ));
        }

        let rewards = streams
            .iter()
            .zip(&state.rewards.streams)
            .map(|(stream, evaluated)| {
                Ok(RewardYield {
                    reward_token_symbol: evaluated.reward_token_symbol.clone(),
                    side: evaluated.side,
                    apr: apr_to_decimal(evaluated.apr)?,
                    reward_token_price: u256_to_decimal(
                        stream.reward_price_feed,
                        snapshot.price_oracle_decimals,
                    )?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_rates(
            &state.rates,
            u256_to_decimal(snapshot.price, snapshot.price_oracle_decimals)?,
            rewards,
        )
    }

    /// Yields from current rates; the borrow side pays the variable rate
    pub fn from_rates(
        rates: &RateResult,
        asset_price: Decimal,
        rewards: Vec<RewardYield>,
    ) -> Result<Self> {
        Ok(Self {
            supply_apr: ray_to_decimal(rates.current_liquidity_rate)?,
            borrow_apr: ray_to_decimal(rates.current_variable_borrow_rate)?,
            asset_price,
            rewards,
        })
    }
}

/// Yearly reward tokens earned from one stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEstimate {
    pub reward_token_symbol: String,
    pub side: IncentiveSide,
    pub annual_amount: Decimal,
}

/// Sizing and expected yield of a leverage operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeveragePlan {
    pub leverage: Decimal,
    pub target_ltv: Decimal,
    /// Flashloan in the borrow asset
    pub flashloan_amount: Decimal,
    /// Flashloan in the supply asset
    pub flashloan_quote_amount: Decimal,
    /// Collateral after the operation
    pub total_supply: Decimal,
    /// Debt after the operation
    pub total_debt: Decimal,
    /// Interest earned minus interest paid over a year, in the supply asset
    pub annual_revenue: Decimal,
    pub annual_revenue_usd: Decimal,
    pub rewards: Vec<RewardEstimate>,
}

/// Solves the target LTV for `leverage`, sizes the flashloan and estimates a year of yield.
///
/// ```rust
/// use aave_rs_strategy::leverage::{LeveragePosition, LeverageSolver};
/// use aave_rs_strategy::plan::{plan_leverage, MarketYields};
/// use rust_decimal_macros::dec;
///
/// let position = LeveragePosition {
///     supplied: dec!(100),
///     borrowed: dec!(0),
///     supply: dec!(0),
///     current_ltv: dec!(0),
///     price_borrow: dec!(1),
///     supply_exchange_rate: dec!(1),
///     flashloan_fee: dec!(0),
/// };
/// let yields = MarketYields {
///     supply_apr: dec!(0.03),
///     borrow_apr: dec!(0.04),
///     asset_price: dec!(1),
///     rewards: vec![],
/// };
///
/// let plan = plan_leverage(&LeverageSolver::default(), &position, dec!(2), &yields).unwrap();
/// assert_eq!(plan.target_ltv, dec!(0.5));
/// assert_eq!(plan.total_supply, dec!(200));
/// // 200 * 3% - 100 * 4%
/// assert_eq!(plan.annual_revenue, dec!(2));
/// ```
pub fn plan_leverage(
    solver: &LeverageSolver,
    position: &LeveragePosition,
    leverage: Decimal,
    yields: &MarketYields,
) -> Result<LeveragePlan> {
    let target_ltv = solver.target_ltv_for_leverage(position, leverage)?;
    let flashloan_amount = solver.flashloan_leverage_base_amount(position, target_ltv)?;
    let flashloan_quote_amount = solver.flashloan_leverage_quote_amount(position, target_ltv)?;

    let op = "plan_leverage";
    let total_supply = add(
        add(position.supplied, position.supply, op)?,
        flashloan_quote_amount,
        op,
    )?;
    let total_debt = mul(total_supply, target_ltv, op)?;

    let annual_revenue = sub(
        mul(total_supply, yields.supply_apr, op)?,
        mul(total_debt, yields.borrow_apr, op)?,
        op,
    )?;

    let rewards = yields
        .rewards
        .iter()
        .map(|reward| {
            if reward.reward_token_price <= Decimal::ZERO {
                return Err(StrategyError::invalid(
                    "reward_token_price",
                    format!("{} has no positive price", reward.reward_token_symbol),
                ));
            }
            let base = match reward.side {
                IncentiveSide::Supply => total_supply,
                IncentiveSide::Debt => total_debt,
            };
            let value = mul(mul(reward.apr, base, op)?, yields.asset_price, op)?;
            Ok(RewardEstimate {
                reward_token_symbol: reward.reward_token_symbol.clone(),
                side: reward.side,
                annual_amount: div(value, reward.reward_token_price, op)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LeveragePlan {
        leverage,
        target_ltv,
        flashloan_amount,
        flashloan_quote_amount,
        total_supply,
        total_debt,
        annual_revenue,
        annual_revenue_usd: mul(annual_revenue, yields.asset_price, op)?,
        rewards,
    })
}
