//! Integration tests from a reserve snapshot to a leverage plan.

use aave_rs_sim::irm::ray_from_percent;
use aave_rs_sim::{
    CollateralConfig, IncentiveSide, IncentiveStream, RateCurve, Ray, ReserveCalculator,
    ReserveSnapshot, Wad, WAD,
};
use aave_rs_strategy::{
    plan_leverage, LeveragePosition, LeverageSolver, LeverageTarget, MarketYields,
    ReserveOverview, SolverConfig, StrategyError,
};
use alloy_primitives::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const T0: u64 = 1_700_000_000;

fn dai_snapshot() -> ReserveSnapshot {
    ReserveSnapshot {
        symbol: "DAI".to_string(),
        decimals: 18,
        available_liquidity: Wad::new(WAD * U256::from(400_000u64)),
        total_principal_stable_debt: Wad::ZERO,
        total_scaled_variable_debt: Wad::new(WAD * U256::from(600_000u64)),
        scaled_total_supply: Wad::new(WAD * U256::from(1_000_000u64)),
        average_stable_rate: Ray::ZERO,
        liquidity_rate: Ray::ZERO,
        variable_borrow_rate: Ray::ZERO,
        liquidity_index: Ray::ONE,
        variable_borrow_index: Ray::ONE,
        last_update_timestamp: T0,
        stable_debt_last_update_timestamp: T0,
        rate_curve: RateCurve {
            optimal_usage_ratio: ray_from_percent(80),
            variable_rate_slope1: ray_from_percent(4),
            variable_rate_slope2: ray_from_percent(75),
            ..RateCurve::default()
        },
        reserve_factor: 1_000,
        collateral: CollateralConfig {
            ltv: 7_500,
            liquidation_threshold: 8_000,
            liquidation_bonus: 10_500,
        },
        unbacked: Wad::ZERO,
        price: U256::from(100_000_000u64),
        price_oracle_decimals: 8,
    }
}

fn streams() -> Vec<IncentiveStream> {
    vec![IncentiveStream {
        reward_token_symbol: "AAVE".to_string(),
        emission_per_second: U256::from(1_000_000_000_000_000u64),
        reward_price_feed: U256::from(10_000_000_000u64),
        reward_token_decimals: 18,
        side: IncentiveSide::Supply,
    }]
}

#[test]
fn test_plan_from_evaluated_reserve() {
    let snapshot = dai_snapshot();
    let state = ReserveCalculator::new(&snapshot)
        .unwrap()
        .evaluate(T0, &streams())
        .unwrap();

    let yields = MarketYields::from_reserve(&snapshot, &state, &streams()).unwrap();
    // usage 60% -> variable 3%, supply 3% * 60% * 90% = 1.62%
    assert_eq!(yields.borrow_apr, dec!(0.03));
    assert_eq!(yields.supply_apr, dec!(0.0162));
    assert_eq!(yields.asset_price, dec!(1));
    assert_eq!(yields.rewards[0].reward_token_price, dec!(100));

    let position = LeveragePosition::from_balances(
        dec!(1000),
        dec!(0),
        dec!(0),
        dec!(1),
        dec!(1),
        dec!(0.0005),
    )
    .unwrap();
    let plan = plan_leverage(&LeverageSolver::default(), &position, dec!(3), &yields).unwrap();

    assert!(plan.target_ltv > dec!(0.66) && plan.target_ltv < dec!(0.67));
    assert!(plan.total_supply > dec!(2999));
    // Borrowing costs more than supplying earns at these rates
    assert!(plan.annual_revenue < Decimal::ZERO);
    assert_eq!(plan.rewards.len(), 1);
    assert!(plan.rewards[0].annual_amount > Decimal::ZERO);
}

#[test]
fn test_overview_from_evaluated_reserve() {
    let snapshot = dai_snapshot();
    let state = ReserveCalculator::new(&snapshot)
        .unwrap()
        .evaluate(T0, &streams())
        .unwrap();
    let overview = ReserveOverview::new(&snapshot, &state).unwrap();

    assert_eq!(overview.utilization, dec!(60));
    assert_eq!(overview.variable_borrow_apr, dec!(3));
    assert_eq!(overview.total_supply_usd, dec!(1000000));
    assert_eq!(overview.max_ltv, dec!(75));
}

#[test]
fn test_streams_must_match_evaluation() {
    let snapshot = dai_snapshot();
    let state = ReserveCalculator::new(&snapshot)
        .unwrap()
        .evaluate(T0, &[])
        .unwrap();
    assert!(matches!(
        MarketYields::from_reserve(&snapshot, &state, &streams()),
        Err(StrategyError::InvalidInput {
            field: "streams",
            ..
        })
    ));
}

#[test]
fn test_solver_from_json_config() {
    let config = SolverConfig::from_json(r#"{"min_denominator": "0.4"}"#).unwrap();
    let solver = LeverageSolver::new(config).with_span(tracing::info_span!("integration"));
    let position = LeveragePosition::from_balances(
        dec!(100),
        dec!(0),
        dec!(0),
        dec!(1),
        dec!(1),
        dec!(0.0009),
    )
    .unwrap();

    // 1.0009 - 0.67 = 0.3309 is below the configured floor
    assert!(matches!(
        solver.solve(&position, LeverageTarget::Ltv(dec!(0.67))),
        Err(StrategyError::NonConvergent { .. })
    ));
    assert!(solver
        .solve(&position, LeverageTarget::Ltv(dec!(0.5)))
        .is_ok());
}
