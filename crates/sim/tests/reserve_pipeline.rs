//! Integration tests for the reserve evaluation pipeline.

use aave_rs_sim::irm::ray_from_percent;
use aave_rs_sim::{
    AccrualConfig, CollateralConfig, IncentiveSide, IncentiveStream, RateCurve, Ray,
    ReserveCalculator, ReserveSnapshot, ReserveState, SimError, Wad, RAY, WAD,
};
use alloy_primitives::U256;

const T0: u64 = 1_690_000_000;
const DAY: u64 = 86_400;

fn wad(amount: u64) -> Wad {
    Wad::new(WAD * U256::from(amount))
}

fn weth_snapshot() -> ReserveSnapshot {
    ReserveSnapshot {
        symbol: "WETH".to_string(),
        decimals: 18,
        available_liquidity: wad(10),
        total_principal_stable_debt: Wad::ZERO,
        total_scaled_variable_debt: wad(90),
        scaled_total_supply: wad(100),
        average_stable_rate: Ray::ZERO,
        liquidity_rate: ray_from_percent(27),
        variable_borrow_rate: ray_from_percent(34),
        liquidity_index: Ray::ONE,
        variable_borrow_index: Ray::ONE,
        last_update_timestamp: T0,
        stable_debt_last_update_timestamp: T0,
        rate_curve: RateCurve {
            optimal_usage_ratio: ray_from_percent(80),
            base_variable_borrow_rate: Ray::ZERO,
            variable_rate_slope1: ray_from_percent(4),
            variable_rate_slope2: ray_from_percent(60),
            base_stable_borrow_rate: Ray::ZERO,
            stable_rate_slope1: ray_from_percent(4),
            stable_rate_slope2: ray_from_percent(60),
            optimal_stable_to_total_debt_ratio: ray_from_percent(20),
            max_excess_stable_to_total_debt_ratio: ray_from_percent(80),
            stable_rate_excess_offset: ray_from_percent(8),
        },
        reserve_factor: 1_500,
        collateral: CollateralConfig {
            ltv: 8_000,
            liquidation_threshold: 8_250,
            liquidation_bonus: 10_500,
        },
        unbacked: Wad::ZERO,
        price: U256::from(180_000_000_000u64),
        price_oracle_decimals: 8,
    }
}

fn streams() -> Vec<IncentiveStream> {
    vec![
        IncentiveStream {
            reward_token_symbol: "OP".to_string(),
            emission_per_second: U256::from(1_000_000_000_000_000u64),
            reward_price_feed: U256::from(150_000_000u64),
            reward_token_decimals: 18,
            side: IncentiveSide::Supply,
        },
        IncentiveStream {
            reward_token_symbol: "OP".to_string(),
            emission_per_second: U256::from(500_000_000_000_000u64),
            reward_price_feed: U256::from(150_000_000u64),
            reward_token_decimals: 18,
            side: IncentiveSide::Debt,
        },
    ]
}

#[test]
fn test_rates_at_last_update_match_stored_curve_point() {
    let snapshot = weth_snapshot();
    let calculator = ReserveCalculator::new(&snapshot).unwrap();
    let rates = calculator.interest_rates(T0).unwrap();

    assert_eq!(rates.borrow_usage_ratio, ray_from_percent(90));
    assert_eq!(rates.current_variable_borrow_rate, ray_from_percent(34));
    assert_eq!(rates.current_stable_borrow_rate, ray_from_percent(34));
    assert!(rates.current_liquidity_rate < rates.current_variable_borrow_rate);
}

#[test]
fn test_evaluate_is_consistent_with_individual_steps() {
    let snapshot = weth_snapshot();
    let calculator = ReserveCalculator::new(&snapshot).unwrap();
    let now = T0 + 7 * DAY;

    let state = calculator.evaluate(now, &streams()).unwrap();
    let accrued = calculator.accrue(now).unwrap();

    assert_eq!(state.accrual, accrued);
    assert_eq!(state.rates, calculator.rates_for(&accrued).unwrap());
    assert_eq!(
        state.rewards,
        calculator.reward_aprs(now, &streams()).unwrap()
    );
    assert_eq!(state.rewards.streams.len(), 2);
    assert!(!state.rewards.supply_apr.is_zero());
    assert!(!state.rewards.debt_apr.is_zero());
}

#[test]
fn test_accrued_debt_raises_usage_over_time() {
    let snapshot = weth_snapshot();
    let calculator = ReserveCalculator::new(&snapshot).unwrap();

    let before = calculator.interest_rates(T0).unwrap();
    let after = calculator.interest_rates(T0 + 30 * DAY).unwrap();

    assert!(after.borrow_usage_ratio > before.borrow_usage_ratio);
    assert!(after.current_variable_borrow_rate > before.current_variable_borrow_rate);
    assert!(after.borrow_usage_ratio <= Ray::new(RAY));
}

#[test]
fn test_evaluation_is_deterministic() {
    let snapshot = weth_snapshot();
    let now = T0 + 12_345;
    let first = ReserveCalculator::new(&snapshot)
        .unwrap()
        .evaluate(now, &streams())
        .unwrap();
    let second = ReserveCalculator::new(&snapshot)
        .unwrap()
        .evaluate(now, &streams())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_on_chain_config_differs_only_in_growth() {
    let snapshot = weth_snapshot();
    let now = T0 + 365 * DAY;
    let default_state = ReserveCalculator::new(&snapshot)
        .unwrap()
        .evaluate(now, &[])
        .unwrap();
    let on_chain_state = ReserveCalculator::new(&snapshot)
        .unwrap()
        .with_config(AccrualConfig::on_chain())
        .evaluate(now, &[])
        .unwrap();

    assert_eq!(
        default_state.accrual.total_variable_debt,
        on_chain_state.accrual.total_variable_debt
    );
    // 27% simple interest on 100
    assert_eq!(on_chain_state.accrual.total_supply, wad(127));
    assert!(default_state.accrual.total_supply > on_chain_state.accrual.total_supply);
}

#[test]
fn test_invalid_snapshot_rejected_before_evaluation() {
    let mut snapshot = weth_snapshot();
    snapshot.rate_curve.optimal_usage_ratio = Ray::new(RAY + U256::from(1));
    let err = ReserveCalculator::new(&snapshot).unwrap_err();
    assert!(matches!(
        err,
        SimError::InvalidInput {
            field: "optimal_usage_ratio",
            ..
        }
    ));
}

#[test]
fn test_low_optimal_curve_with_rounding_gap_is_accepted() {
    let mut snapshot = weth_snapshot();
    snapshot.rate_curve.optimal_usage_ratio = ray_from_percent(25);
    snapshot.rate_curve.variable_rate_slope1 =
        Ray::new("74172299240749574286528810".parse().unwrap());
    assert!(snapshot.rate_curve.kink_discontinuity().unwrap() > U256::from(1));

    let calculator = ReserveCalculator::new(&snapshot).unwrap();
    let rates = calculator.interest_rates(T0).unwrap();
    // 90% usage sits above the 25% kink
    assert!(rates.current_variable_borrow_rate > snapshot.rate_curve.variable_rate_slope1);
}

#[test]
fn test_zero_price_fails_reward_calculation_only() {
    let mut snapshot = weth_snapshot();
    snapshot.price = U256::ZERO;
    let calculator = ReserveCalculator::new(&snapshot).unwrap();

    assert!(calculator.interest_rates(T0).is_ok());
    assert!(calculator.evaluate(T0, &[]).is_ok());
    assert!(matches!(
        calculator.evaluate(T0, &streams()),
        Err(SimError::InvalidInput { field: "price", .. })
    ));
}

#[test]
fn test_snapshot_json_round_trip() {
    let snapshot = weth_snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded: ReserveSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, snapshot);

    let state = ReserveCalculator::new(&decoded)
        .unwrap()
        .evaluate(T0 + DAY, &streams())
        .unwrap();
    let json = serde_json::to_string(&state).unwrap();
    let decoded_state: ReserveState = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded_state, state);
}
