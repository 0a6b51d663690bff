//! Account-level borrowing capacity.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::math::{percent_mul, PERCENTAGE_FACTOR};

/// Aggregated position of one account, in the oracle's base currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccountData {
    pub total_collateral_base: U256,
    pub total_debt_base: U256,
    pub available_borrows_base: U256,
    /// Weighted liquidation threshold, in basis points
    pub current_liquidation_threshold: U256,
    /// Weighted loan-to-value, in basis points
    pub ltv: U256,
    /// Wad-scaled; `U256::MAX` when the account has no debt
    pub health_factor: U256,
    pub base_currency_decimals: u8,
}

impl UserAccountData {
    /// Recomputes the available borrows from the account's own totals
    pub fn recompute_available_borrows(&self) -> Result<U256> {
        available_borrows(self.total_collateral_base, self.total_debt_base, self.ltv)
    }
}

/// `percent_mul(collateral, ltv) - debt`, floored at zero.
///
/// ```rust
/// use aave_rs_sim::account::available_borrows;
/// use alloy_primitives::U256;
///
/// // 80% of 1000 collateral, 300 already borrowed
/// let available = available_borrows(U256::from(1000), U256::from(300), U256::from(8000)).unwrap();
/// assert_eq!(available, U256::from(500));
/// ```
pub fn available_borrows(
    total_collateral_base: U256,
    total_debt_base: U256,
    ltv: U256,
) -> Result<U256> {
    if ltv > PERCENTAGE_FACTOR {
        return Err(SimError::invalid(
            "ltv",
            format!("{ltv} exceeds 10000 basis points"),
        ));
    }

    let borrowing_power = percent_mul(total_collateral_base, ltv)?;
    Ok(borrowing_power.saturating_sub(total_debt_base))
}
