//! Property-based tests using `proptest` for curve and margin invariants.
//!
//! 1. **Net liquidity conservation**: net liquidity over all ticks sums
//!    to zero after any sequence of mints and burns.
//! 2. **Active liquidity**: after any swap the active liquidity equals the
//!    liquidity of the ranges containing the current tick.
//! 3. **Tick round trip**: `sqrt_price_to_tick(tick_to_sqrt_price(t)) == t`.
//! 4. **Margin monotonicity**: the requirement of a taker or an LP never
//!    decreases as the position grows, and never increases as maturity
//!    approaches while the variable rate accrues.

use proptest::prelude::*;

use crate::calculator::{
    required_margin, MarginMode, MarketSnapshot, PositionSnapshot, RateStatistics,
};
use crate::config::{MarginCalculatorParameters, VammConfig};
use crate::domain::{
    seconds_to_years, Address, Rounding, SqrtPriceX96, SwapParams, TakerSide, TermWindow, Tick,
    TickRange, Timestamp, Wad, MAX_TICK, MIN_TICK, SECONDS_PER_YEAR,
};
use crate::math::{sqrt_price_to_tick, tick_to_sqrt_price, CheckedArithmetic};
use crate::traits::FromConfig;
use crate::vamm::{SwapEnvironment, Vamm};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

const SPACING: i32 = 60;
const LP: Address = Address::repeat(1);
const TRADER: Address = Address::repeat(2);

fn term() -> TermWindow {
    let Ok(term) = TermWindow::new(Timestamp::new(0), Timestamp::new(SECONDS_PER_YEAR)) else {
        panic!("valid term");
    };
    term
}

fn make_vamm(fee_rate: Wad) -> Vamm {
    let Ok(cfg) = VammConfig::new(60, fee_rate, 0, term()) else {
        panic!("valid config");
    };
    let Ok(mut vamm) = Vamm::from_config(&cfg) else {
        panic!("valid vamm");
    };
    let Ok(()) = vamm.initialize(SqrtPriceX96::ONE) else {
        panic!("initialize");
    };
    vamm
}

fn make_range(lower_step: i32, width: i32) -> TickRange {
    let lower = lower_step * SPACING;
    let Ok(range) = TickRange::new(lower, lower + width * SPACING, SPACING) else {
        panic!("valid range");
    };
    range
}

fn net_liquidity_sum(vamm: &Vamm) -> i128 {
    vamm.initialized_ticks()
        .map(|(_, info)| info.liquidity_net)
        .sum()
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// `(lower step, width in spacings, liquidity)` of one LP range.
fn mint_strategy() -> impl Strategy<Value = (i32, i32, u128)> {
    (-20i32..20, 1i32..12, 1_000u128..1_000_000_000_000_000_000_000_000)
}

/// Ticks whose price lies inside the half-open grid.
fn tick_strategy() -> impl Strategy<Value = i32> {
    MIN_TICK..MAX_TICK
}

// ---------------------------------------------------------------------------
// Property 1: Net liquidity conservation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_net_liquidity_sums_to_zero(
        mints in prop::collection::vec(mint_strategy(), 1..8),
        burn_mask in prop::collection::vec(any::<bool>(), 8),
    ) {
        let mut vamm = make_vamm(Wad::ZERO);
        for &(lower, width, liquidity) in &mints {
            let Ok(()) = vamm.mint(LP, make_range(lower, width), liquidity) else {
                panic!("mint within limits");
            };
        }
        prop_assert_eq!(net_liquidity_sum(&vamm), 0);

        for (&(lower, width, liquidity), burn_all) in mints.iter().zip(&burn_mask) {
            let amount = if *burn_all { liquidity } else { liquidity / 2 };
            if amount == 0 {
                continue;
            }
            let Ok(()) = vamm.burn(LP, make_range(lower, width), amount) else {
                panic!("burn of minted liquidity");
            };
            prop_assert_eq!(net_liquidity_sum(&vamm), 0);
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: Active liquidity after swaps
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_active_liquidity_matches_containing_ranges(
        mints in prop::collection::vec(mint_strategy(), 1..6),
        fixed_taker in any::<bool>(),
        notional in 1i64..5_000,
        fee_rate in 0i128..10_000_000_000_000_000,
    ) {
        let mut vamm = make_vamm(Wad::from_raw(fee_rate));
        let mut ranges = Vec::new();
        for &(lower, width, liquidity) in &mints {
            let range = make_range(lower, width);
            let Ok(()) = vamm.mint(LP, range, liquidity) else {
                panic!("mint within limits");
            };
            ranges.push((range, liquidity));
        }

        let side = if fixed_taker { TakerSide::FixedTaker } else { TakerSide::VariableTaker };
        let Ok(params) = SwapParams::new(TRADER, side, Wad::from_integer(notional), None, make_range(0, 1))
        else {
            panic!("valid params");
        };
        let env = SwapEnvironment { now: Timestamp::new(0), accrued_variable_factor: Wad::ZERO };
        let Ok(outcome) = vamm.swap(&params, &env) else {
            return Ok(());
        };

        let tick = vamm.current_tick().get();
        let expected: u128 = ranges
            .iter()
            .filter(|(range, _)| range.contains(tick))
            .map(|(_, liquidity)| *liquidity)
            .sum();
        prop_assert_eq!(vamm.liquidity(), expected);
        prop_assert_eq!(outcome.tick_after().get(), tick);
    }
}

// ---------------------------------------------------------------------------
// Property 3: Tick round trip
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_tick_round_trip(t in tick_strategy()) {
        let Ok(tick) = Tick::new(t) else {
            panic!("tick in domain");
        };
        let Ok(sqrt_price) = tick_to_sqrt_price(tick) else {
            panic!("price of a valid tick");
        };
        let Ok(back) = sqrt_price_to_tick(sqrt_price) else {
            panic!("tick of a grid price");
        };
        prop_assert_eq!(back, tick);
    }
}

// ---------------------------------------------------------------------------
// Property 4: Margin monotonicity
// ---------------------------------------------------------------------------

const APY: Wad = Wad::from_raw(30_000_000_000_000_000);
const DAY: u64 = 86_400;
/// Liquidity per unit of LP size; about 100 notional on the LP range.
const LIQUIDITY_PER_UNIT: u128 = 100 * 1_000_000_000_000_000_000;

#[derive(Debug, Clone, Copy)]
enum Exposure {
    /// Receives `rate` fixed tokens per variable token paid.
    FixedTaker { rate: i64 },
    /// Pays `rate` fixed tokens per variable token received.
    VariableTaker { rate: i64 },
    Provider,
}

fn exposure_strategy() -> impl Strategy<Value = Exposure> {
    prop_oneof![
        (1i64..6).prop_map(|rate| Exposure::FixedTaker { rate }),
        (1i64..6).prop_map(|rate| Exposure::VariableTaker { rate }),
        Just(Exposure::Provider),
    ]
}

/// Position of `size` units of `exposure`.
fn snapshot(exposure: Exposure, size: i64) -> PositionSnapshot {
    let (liquidity, fixed, variable) = match exposure {
        Exposure::FixedTaker { rate } => (0, rate * size, -size),
        Exposure::VariableTaker { rate } => (0, -rate * size, size),
        Exposure::Provider => (u128::from(size.unsigned_abs()) * LIQUIDITY_PER_UNIT, 0, 0),
    };
    PositionSnapshot {
        range: make_range(-10, 20),
        liquidity,
        fixed_token_balance: Wad::from_integer(fixed),
        variable_token_balance: Wad::from_integer(variable),
    }
}

fn market_at(tick: i32, elapsed: u64) -> MarketSnapshot {
    let Ok(tick) = Tick::new(tick) else {
        panic!("tick in domain");
    };
    let Ok(sqrt_price) = tick_to_sqrt_price(tick) else {
        panic!("price of a valid tick");
    };
    MarketSnapshot {
        sqrt_price,
        term: term(),
        now: Timestamp::new(elapsed),
    }
}

fn requirement(
    position: &PositionSnapshot,
    rates: &RateStatistics,
    market: &MarketSnapshot,
    mode: MarginMode,
) -> Wad {
    let params = MarginCalculatorParameters::default();
    let Ok(margin) = required_margin(position, &params, rates, market, mode) else {
        panic!("requirement of a bounded position");
    };
    margin
}

/// Variable index that has grown at `APY` since term start.
fn accrued_at(elapsed: u64) -> Wad {
    let Ok(accrued) = APY.safe_mul(&seconds_to_years(elapsed), Rounding::Down) else {
        panic!("accrual in range");
    };
    accrued
}

fn mode_strategy() -> impl Strategy<Value = MarginMode> {
    prop_oneof![Just(MarginMode::Initial), Just(MarginMode::Liquidation)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_margin_non_decreasing_in_notional(
        exposure in exposure_strategy(),
        size in 1i64..1_000_000,
        extra in 1i64..1_000_000,
        tick_step in -20i32..20,
        elapsed in 0u64..SECONDS_PER_YEAR,
        mode in mode_strategy(),
    ) {
        let rates = RateStatistics {
            historical_apy: APY,
            accrued_variable_factor: Wad::ZERO,
        };
        let market = market_at(tick_step * SPACING, elapsed);

        let small = requirement(&snapshot(exposure, size), &rates, &market, mode);
        let large = requirement(&snapshot(exposure, size + extra), &rates, &market, mode);
        prop_assert!(
            large >= small,
            "requirement of {:?} fell from {} to {} as size grew",
            exposure, small, large
        );
    }

    #[test]
    fn prop_margin_non_decreasing_in_remaining_time(
        exposure in exposure_strategy(),
        size in 1i64..1_000_000,
        earlier in 0u64..SECONDS_PER_YEAR - DAY,
        gap in DAY..SECONDS_PER_YEAR,
        mode in mode_strategy(),
    ) {
        let later = (earlier + gap).min(SECONDS_PER_YEAR);
        let position = snapshot(exposure, size);
        let at = |elapsed: u64| {
            let rates = RateStatistics {
                historical_apy: APY,
                accrued_variable_factor: accrued_at(elapsed),
            };
            requirement(&position, &rates, &market_at(0, elapsed), mode)
        };

        let with_more_time = at(earlier);
        let with_less_time = at(later);
        prop_assert!(
            with_more_time >= with_less_time,
            "requirement of {:?} rose from {} to {} as maturity approached",
            exposure, with_more_time, with_less_time
        );
    }
}
