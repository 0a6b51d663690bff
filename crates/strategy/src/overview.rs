//! Human-readable summaries of reserves and accounts.
//!
//! Percentages are on a 0-100 scale; prices and USD values have their
//! oracle decimals removed.

use aave_rs_sim::{ReserveSnapshot, ReserveState, UserAccountData, Wad};
use alloy_primitives::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::convert::{
    add, apr_to_decimal, bps_to_percent, div, mul, ray_to_percent, sub, u256_to_decimal,
};
use crate::error::{Result, StrategyError};

/// Display view of one evaluated reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveOverview {
    pub symbol: String,
    pub price: Decimal,
    /// Percent
    pub max_ltv: Decimal,
    /// Percent
    pub liquidation_threshold: Decimal,
    /// Percent of the repaid debt paid on top to liquidators
    pub liquidation_penalty: Decimal,
    /// Percent
    pub supply_apr: Decimal,
    /// Percent
    pub variable_borrow_apr: Decimal,
    /// Percent
    pub stable_borrow_apr: Decimal,
    pub total_supply: Decimal,
    pub total_supply_usd: Decimal,
    pub total_borrow: Decimal,
    pub total_borrow_usd: Decimal,
    pub available_liquidity_usd: Decimal,
    /// Percent
    pub utilization: Decimal,
    /// Ratio
    pub supply_reward_apr: Decimal,
    /// Ratio
    pub borrow_reward_apr: Decimal,
}

fn token_amount(amount: Wad, decimals: u8) -> Result<Decimal> {
    u256_to_decimal(amount.raw(), decimals)
}

impl ReserveOverview {
    pub fn new(snapshot: &ReserveSnapshot, state: &ReserveState) -> Result<Self> {
        let op = "reserve_overview";
        let price = u256_to_decimal(snapshot.price, snapshot.price_oracle_decimals)?;

        let total_supply = token_amount(state.accrual.total_supply, snapshot.decimals)?;
        let total_borrow = token_amount(state.accrual.total_debt()?, snapshot.decimals)?;
        let available_liquidity = token_amount(snapshot.available_liquidity, snapshot.decimals)?;

        Ok(Self {
            symbol: snapshot.symbol.clone(),
            price,
            max_ltv: bps_to_percent(snapshot.collateral.ltv),
            liquidation_threshold: bps_to_percent(snapshot.collateral.liquidation_threshold),
            liquidation_penalty: sub(
                bps_to_percent(snapshot.collateral.liquidation_bonus),
                Decimal::ONE_HUNDRED,
                op,
            )?,
            supply_apr: ray_to_percent(state.rates.current_liquidity_rate)?,
            variable_borrow_apr: ray_to_percent(state.rates.current_variable_borrow_rate)?,
            stable_borrow_apr: ray_to_percent(state.rates.current_stable_borrow_rate)?,
            total_supply,
            total_supply_usd: mul(total_supply, price, op)?,
            total_borrow,
            total_borrow_usd: mul(total_borrow, price, op)?,
            available_liquidity_usd: mul(available_liquidity, price, op)?,
            utilization: ray_to_percent(state.rates.borrow_usage_ratio)?,
            supply_reward_apr: apr_to_decimal(state.rewards.supply_apr)?,
            borrow_reward_apr: apr_to_decimal(state.rewards.debt_apr)?,
        })
    }
}

/// Display view of an account's position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub total_collateral_usd: Decimal,
    pub total_debt_usd: Decimal,
    pub available_borrows_usd: Decimal,
    /// Percent
    pub ltv: Decimal,
    /// Percent
    pub liquidation_threshold: Decimal,
    /// `None` when the account has no debt
    pub health_factor: Option<Decimal>,
    /// Debt over collateral, percent
    pub current_ltv: Decimal,
}

impl AccountSummary {
    pub fn new(account: &UserAccountData) -> Result<Self> {
        let op = "account_summary";
        let decimals = account.base_currency_decimals;

        let total_collateral_usd = u256_to_decimal(account.total_collateral_base, decimals)?;
        let total_debt_usd = u256_to_decimal(account.total_debt_base, decimals)?;

        let health_factor = if account.total_debt_base.is_zero() {
            None
        } else {
            Some(u256_to_decimal(account.health_factor, 18)?)
        };

        let current_ltv = if total_collateral_usd.is_zero() {
            Decimal::ZERO
        } else {
            mul(
                div(total_debt_usd, total_collateral_usd, op)?,
                Decimal::ONE_HUNDRED,
                op,
            )?
        };

        Ok(Self {
            total_collateral_usd,
            total_debt_usd,
            available_borrows_usd: u256_to_decimal(account.available_borrows_base, decimals)?,
            ltv: bps_percent(account.ltv)?,
            liquidation_threshold: bps_percent(account.current_liquidation_threshold)?,
            health_factor,
            current_ltv,
        })
    }

    /// How much of an asset priced at `asset_price` the account can still borrow
    pub fn borrowable_amount(&self, asset_price: Decimal) -> Result<Decimal> {
        if asset_price <= Decimal::ZERO {
            return Err(StrategyError::invalid(
                "asset_price",
                format!("{asset_price} is not positive"),
            ));
        }
        div(self.available_borrows_usd, asset_price, "borrowable_amount")
    }

    /// Collateral value left over after debt
    pub fn net_worth_usd(&self) -> Result<Decimal> {
        sub(self.total_collateral_usd, self.total_debt_usd, "net_worth_usd")
    }

    /// Collateral plus debt, for position-size comparisons
    pub fn gross_exposure_usd(&self) -> Result<Decimal> {
        add(self.total_collateral_usd, self.total_debt_usd, "gross_exposure_usd")
    }
}

fn bps_percent(bps: U256) -> Result<Decimal> {
    u256_to_decimal(bps, 2)
}
