//! Fixed-point arithmetic for ray (1e27) and wad (1e18) scaled integers.
//!
//! Every helper mirrors the protocol's `WadRayMath` / `PercentageMath`
//! libraries: the half-up rounding term is added before the final division,
//! and intermediate products are checked at 256 bits instead of wrapping.
//!
//! The [`Ray`] and [`Wad`] wrappers keep rates and token amounts apart so the
//! two scales cannot be mixed by accident.
//!
//! ```rust
//! use aave_rs_sim::math::{ray_div, ray_mul, RAY};
//! use alloy_primitives::U256;
//!
//! let half = RAY / U256::from(2);
//! assert_eq!(ray_mul(half, half).unwrap(), RAY / U256::from(4));
//! assert_eq!(ray_div(half, RAY).unwrap(), half);
//! ```

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// 1e18
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// 1e27
pub const RAY: U256 = U256::from_limbs([0x9FD0_803C_E800_0000, 0x033B_2E3C, 0, 0]);

/// 5e26, the rounding term of ray operations
pub const HALF_RAY: U256 = U256::from_limbs([0x4FE8_401E_7400_0000, 0x019D_971E, 0, 0]);

/// 1e9, the factor between wad and ray
pub const WAD_RAY_RATIO: U256 = U256::from_limbs([1_000_000_000, 0, 0, 0]);

/// 100.00% in basis points
pub const PERCENTAGE_FACTOR: U256 = U256::from_limbs([10_000, 0, 0, 0]);

/// Rounding term of percentage operations
pub const HALF_PERCENTAGE_FACTOR: U256 = U256::from_limbs([5_000, 0, 0, 0]);

/// Seconds in a 365-day year
pub const SECONDS_PER_YEAR: U256 = U256::from_limbs([31_536_000, 0, 0, 0]);

/// Largest exponent `e` such that `10^e` fits in 256 bits
pub const MAX_DECIMALS: u8 = 77;

pub(crate) fn checked_mul(a: U256, b: U256, operation: &'static str) -> Result<U256> {
    a.checked_mul(b).ok_or(SimError::Overflow { operation })
}

pub(crate) fn checked_add(a: U256, b: U256, operation: &'static str) -> Result<U256> {
    a.checked_add(b).ok_or(SimError::Overflow { operation })
}

pub(crate) fn checked_div(a: U256, b: U256, operation: &'static str) -> Result<U256> {
    if b.is_zero() {
        return Err(SimError::DivisionByZero { operation });
    }
    Ok(a / b)
}

/// `(a * b + RAY / 2) / RAY`
pub fn ray_mul(a: U256, b: U256) -> Result<U256> {
    let product = checked_mul(a, b, "ray_mul")?;
    Ok(checked_add(product, HALF_RAY, "ray_mul")? / RAY)
}

/// `(a * RAY + b / 2) / b`
pub fn ray_div(a: U256, b: U256) -> Result<U256> {
    if b.is_zero() {
        return Err(SimError::DivisionByZero {
            operation: "ray_div",
        });
    }
    let scaled = checked_mul(a, RAY, "ray_div")?;
    Ok(checked_add(scaled, b / U256::from(2), "ray_div")? / b)
}

/// `(value * percentage + FACTOR / 2) / FACTOR`, percentage in basis points
pub fn percent_mul(value: U256, percentage: U256) -> Result<U256> {
    let product = checked_mul(value, percentage, "percent_mul")?;
    Ok(checked_add(product, HALF_PERCENTAGE_FACTOR, "percent_mul")? / PERCENTAGE_FACTOR)
}

/// `a * 1e9`
pub fn wad_to_ray(a: U256) -> Result<U256> {
    checked_mul(a, WAD_RAY_RATIO, "wad_to_ray")
}

/// `10^exponent`
pub fn pow10(exponent: u8) -> Result<U256> {
    if exponent > MAX_DECIMALS {
        return Err(SimError::Overflow { operation: "pow10" });
    }
    Ok(U256::from(10).pow(U256::from(exponent)))
}

/// A ray-scaled quantity: rate, ratio or index.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ray(U256);

impl Ray {
    pub const ZERO: Ray = Ray(U256::ZERO);
    pub const ONE: Ray = Ray(RAY);

    pub const fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    pub fn ray_mul(self, other: Ray) -> Result<Ray> {
        ray_mul(self.0, other.0).map(Ray)
    }

    pub fn ray_div(self, other: Ray) -> Result<Ray> {
        ray_div(self.0, other.0).map(Ray)
    }

    /// Applies a basis-point percentage
    pub fn percent_mul(self, percentage: U256) -> Result<Ray> {
        percent_mul(self.0, percentage).map(Ray)
    }

    pub fn checked_add(self, other: Ray) -> Result<Ray> {
        checked_add(self.0, other.0, "ray_add").map(Ray)
    }

    pub fn checked_sub(self, other: Ray) -> Result<Ray> {
        self.0
            .checked_sub(other.0)
            .map(Ray)
            .ok_or(SimError::Overflow {
                operation: "ray_sub",
            })
    }
}

impl From<Ray> for U256 {
    fn from(value: Ray) -> Self {
        value.0
    }
}

/// A wad-scale token amount.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Wad(U256);

impl Wad {
    pub const ZERO: Wad = Wad(U256::ZERO);

    pub const fn new(raw: U256) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> U256 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Lifts the amount to ray precision
    pub fn to_ray(self) -> Result<Ray> {
        wad_to_ray(self.0).map(Ray)
    }

    /// Scales the amount by a ray index or growth factor
    pub fn ray_mul(self, index: Ray) -> Result<Wad> {
        ray_mul(self.0, index.raw()).map(Wad)
    }

    /// Ratio of two amounts, as a ray
    pub fn ray_div(self, other: Wad) -> Result<Ray> {
        ray_div(self.0, other.0).map(Ray)
    }

    pub fn checked_add(self, other: Wad) -> Result<Wad> {
        checked_add(self.0, other.0, "wad_add").map(Wad)
    }
}

impl From<Wad> for U256 {
    fn from(value: Wad) -> Self {
        value.0
    }
}
