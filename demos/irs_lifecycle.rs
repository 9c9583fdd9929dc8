//! Interest-rate-swap market lifecycle example.
//!
//! Deploys a one-year market, provides liquidity through the router,
//! trades fixed for variable, and settles both sides at maturity.
//!
//! # Run
//!
//! ```bash
//! RUST_LOG=irs_amm=info cargo run --example irs_lifecycle
//! ```

use irs_amm::config::{InstanceConfig, MarginCalculatorParameters, MarginEngineConfig, VammConfig};
use irs_amm::domain::{
    Address, SqrtPriceX96, SwapParams, TakerSide, TermWindow, TickRange, Timestamp, Wad,
    SECONDS_PER_YEAR,
};
use irs_amm::factory::Registry;
use irs_amm::instance::CallContext;
use irs_amm::math::CheckedArithmetic;
use irs_amm::oracle::RingBufferRateOracle;
use irs_amm::periphery::{MintOrBurnParams, Router};
use irs_amm::token::InMemorySettlementToken;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Interest Rate Swap AMM ===\n");

    let owner = Address::repeat(1);
    let router_address = Address::repeat(7);
    let lp = Address::repeat(10);
    let trader = Address::repeat(11);
    let start = Timestamp::new(86_400);
    let end = Timestamp::new(86_400 + SECONDS_PER_YEAR);

    // ── 1. Deploy a market: 0.1% fee a year, 10% of fees to the protocol ─
    let term = TermWindow::new(start, end)?;
    let config = InstanceConfig::new(
        owner,
        Address::repeat(9),
        Address::repeat(2),
        Address::repeat(3),
        VammConfig::new(60, Wad::from_raw(1_000_000_000_000_000), 10, term)?,
        MarginEngineConfig::new(3_600, 86_400)?,
        MarginCalculatorParameters::default(),
    )?;
    let mut registry = Registry::default();
    let id = registry.deploy(&config)?;
    let instance = registry.instance_mut(id)?;
    let mut router = Router::new(router_address, owner);

    // ── 2. A yield source growing about 5% a year ──────────────────────
    let mut oracle = RingBufferRateOracle::new(Timestamp::new(0), Wad::ONE)?;
    oracle.grow(16);
    oracle.write(
        Timestamp::new(4 * SECONDS_PER_YEAR),
        Wad::from_raw(1_200_000_000_000_000_000),
    )?;

    let mut token = InMemorySettlementToken::default();
    token.mint(lp, Wad::from_integer(1_000_000))?;
    token.mint(trader, Wad::from_integer(10_000))?;

    // ── 3. Open at 1% fixed and install the router ─────────────────────
    let mut ctx = CallContext { caller: owner, now: start, oracle: &oracle, token: &mut token };
    instance.initialize_vamm(&mut ctx, SqrtPriceX96::ONE)?;
    instance.set_periphery(&mut ctx, Some(router_address))?;

    // ── 4. LP: 10 000 notional on [-6000, 6000) with 100 000 margin ────
    let lp_range = TickRange::new(-6_000, 6_000, 60)?;
    let mut ctx = CallContext { caller: lp, now: start, oracle: &oracle, token: &mut token };
    let liquidity = router.mint_or_burn(
        instance,
        &mut ctx,
        &MintOrBurnParams {
            owner: lp,
            range: lp_range,
            notional: Wad::from_integer(10_000),
            is_mint: true,
            margin_delta: Wad::from_integer(100_000),
        },
    )?;
    println!("LP minted liquidity {liquidity}");

    // ── 5. Trader: quote, then pay fixed on 1 000 notional ─────────────
    let trader_range = TickRange::new(-60, 60, 60)?;
    let params = SwapParams::new(
        trader,
        TakerSide::FixedTaker,
        Wad::from_integer(1_000),
        None,
        trader_range,
    )?;
    let quote = router.quote_swap(instance, start, &oracle, &params)?;
    println!(
        "Quote: requirement {}, fixed delta {}, fee {}, tick after {}",
        quote.margin_requirement, quote.fixed_token_delta, quote.fee, quote.tick_after
    );

    // The fee is charged to margin, so it has to be posted on top.
    let top_up = quote.margin_requirement.safe_add(&quote.fee)?;
    let mut ctx = CallContext { caller: trader, now: start, oracle: &oracle, token: &mut token };
    let outcome = router.swap(instance, &mut ctx, &params, Some(top_up))?;
    println!(
        "Swap:  fixed {}, variable {}, fee {}, tick {}",
        outcome.fixed_token_delta(),
        outcome.variable_token_delta(),
        outcome.fee(),
        outcome.tick_after()
    );

    // ── 6. Settle both sides at maturity ───────────────────────────────
    let mut ctx = CallContext { caller: trader, now: end, oracle: &oracle, token: &mut token };
    let trader_cashflow = instance.settle_position(&mut ctx, trader, trader_range)?;
    let lp_cashflow = instance.settle_position(&mut ctx, lp, lp_range)?;
    println!("\nSettlement: trader {trader_cashflow}, LP {lp_cashflow}");

    let mut ctx = CallContext { caller: owner, now: end, oracle: &oracle, token: &mut token };
    let protocol_fees = instance.collect_protocol_fees(&mut ctx, owner)?;
    println!("Protocol fees collected: {protocol_fees}");

    println!("\nEvents:");
    for event in instance.events() {
        println!("  {event}");
    }

    Ok(())
}
