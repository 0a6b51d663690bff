//! Incentive emission APRs.
//!
//! An incentive stream pays `emission_per_second` reward tokens to every
//! holder of one side of a reserve (supply tokens or variable debt tokens),
//! pro rata. Annualized and priced, the stream's value divided by the
//! value of the pool gives its APR:
//!
//! ```text
//! APR = emission * SECONDS_PER_YEAR * reward_price * 10^asset_decimals * 10^6
//!     / (pool_balance * asset_price * 10^reward_token_decimals)
//! ```
//!
//! The two powers of ten bring the reward amount and the pool balance to
//! whole tokens. Both prices must share the oracle's scale, which cancels.
//! The result is a 6-decimal fixed point number where [`APR_PRECISION`]
//! is 100%.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::accrual::AccrualResult;
use crate::error::{Result, SimError};
use crate::math::{checked_mul, pow10, Wad, SECONDS_PER_YEAR};

/// Fixed-point scale of reward APRs, `1_000_000` is 100%
pub const APR_PRECISION: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// Which side of the reserve an incentive stream pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncentiveSide {
    /// Supply-token holders
    Supply,
    /// Variable debt holders
    Debt,
}

/// A reward token emitted to one side of a reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveStream {
    pub reward_token_symbol: String,
    /// Reward token base units emitted per second to the whole pool
    pub emission_per_second: U256,
    /// Price of the reward token, in the oracle's base currency
    pub reward_price_feed: U256,
    pub reward_token_decimals: u8,
    pub side: IncentiveSide,
}

/// APR of a single stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamApr {
    pub reward_token_symbol: String,
    pub side: IncentiveSide,
    /// 6-decimal fixed point
    pub apr: U256,
}

/// Per-stream and per-side APRs of a reserve's incentives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAprs {
    /// One entry per input stream, in input order
    pub streams: Vec<StreamApr>,
    /// Sum over supply-side streams
    pub supply_apr: U256,
    /// Sum over debt-side streams
    pub debt_apr: U256,
}

impl RewardAprs {
    /// Aggregate APR of one side
    pub fn side_apr(&self, side: IncentiveSide) -> U256 {
        match side {
            IncentiveSide::Supply => self.supply_apr,
            IncentiveSide::Debt => self.debt_apr,
        }
    }
}

/// APR of one stream against the balance of the side it pays.
///
/// A zero pool balance yields an APR of zero: nobody is accruing the
/// emission.
///
/// ```rust
/// use aave_rs_sim::math::Wad;
/// use aave_rs_sim::rewards::{stream_apr, IncentiveSide, IncentiveStream};
/// use alloy_primitives::U256;
///
/// let stream = IncentiveStream {
///     reward_token_symbol: "OP".to_string(),
///     emission_per_second: U256::from(1_000_000u64),
///     reward_price_feed: U256::from(200_000_000u64),
///     reward_token_decimals: 6,
///     side: IncentiveSide::Supply,
/// };
///
/// // One OP a second at $2 against 63,072,000 units of an 8-decimal asset at $1: 100%
/// let apr = stream_apr(
///     &stream,
///     Wad::new(U256::from(6_307_200_000_000_000u64)),
///     U256::from(100_000_000u64),
///     8,
/// )
/// .unwrap();
/// assert_eq!(apr, U256::from(1_000_000u64));
/// ```
pub fn stream_apr(
    stream: &IncentiveStream,
    pool_balance: Wad,
    asset_price: U256,
    asset_decimals: u8,
) -> Result<U256> {
    if asset_price.is_zero() {
        return Err(SimError::invalid("price", "asset price must be non-zero"));
    }
    if pool_balance.is_zero() {
        return Ok(U256::ZERO);
    }

    let op = "stream_apr";
    let numerator = [
        SECONDS_PER_YEAR,
        stream.emission_per_second,
        stream.reward_price_feed,
        pow10(asset_decimals)?,
    ]
    .into_iter()
    .try_fold(APR_PRECISION, |acc, factor| checked_mul(acc, factor, op))?;

    let denominator = checked_mul(
        checked_mul(pool_balance.raw(), asset_price, op)?,
        pow10(stream.reward_token_decimals)?,
        op,
    )?;

    Ok(numerator / denominator)
}

/// APRs of every stream of a reserve, with per-side aggregates.
///
/// Supply streams are measured against the accrued supply-token total,
/// debt streams against the accrued total variable debt.
pub fn reward_aprs(
    streams: &[IncentiveStream],
    accrual: &AccrualResult,
    asset_price: U256,
    asset_decimals: u8,
) -> Result<RewardAprs> {
    let mut aprs = RewardAprs::default();

    for stream in streams {
        let pool_balance = match stream.side {
            IncentiveSide::Supply => accrual.total_supply,
            IncentiveSide::Debt => accrual.total_variable_debt,
        };
        let apr = stream_apr(stream, pool_balance, asset_price, asset_decimals)?;

        let total = match stream.side {
            IncentiveSide::Supply => &mut aprs.supply_apr,
            IncentiveSide::Debt => &mut aprs.debt_apr,
        };
        *total = total
            .checked_add(apr)
            .ok_or(SimError::Overflow {
                operation: "reward_aprs",
            })?;

        aprs.streams.push(StreamApr {
            reward_token_symbol: stream.reward_token_symbol.clone(),
            side: stream.side,
            apr,
        });
    }

    Ok(aprs)
}
