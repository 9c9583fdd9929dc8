//! Periphery router.
//!
//! [`Router`] sits in front of the instances and speaks in notionals:
//!
//! - **Liquidity.** A variable-token notional on `[lower, upper)` becomes
//!   `L = notional * Q96 / (sqrt(upper) - sqrt(lower))`, the liquidity that
//!   holds exactly that many variable tokens across the whole range.
//! - **Caps.** The router owner may cap the cumulative notional minted
//!   through the router on each instance.  An instance without a cap is
//!   uncapped; a mint fails with [`IrsError::NotionalCapExceeded`] only when
//!   the running total would go above the cap.  Burns lower the total,
//!   never below zero.
//! - **Margin bundling.** A margin change travels in the same transaction
//!   as the liquidity change or swap.  Deposits land before it and
//!   withdrawals after it, each going through the instance's usual margin
//!   checks.
//! - **Quotes.** [`Router::quote_swap`] and [`Router::quote_mint_or_burn`]
//!   run the real call on a scratch copy.  A call that only fails its
//!   margin check still yields a quote: the requirement (and, for swaps,
//!   the deltas) carried by `MarginRequirementNotMet`,
//!   `InsufficientMarginForMint` or `MarginLessThanMinimum` is decoded into
//!   the result.

use std::collections::BTreeMap;

use tracing::warn;

use crate::calculator::MarginMode;
use crate::config::InstanceKey;
use crate::domain::{Address, SwapOutcome, SwapParams, Tick, TickRange, Timestamp, Wad};
use crate::error::{IrsError, Result};
use crate::events::{publish, IrsEvent};
use crate::instance::{CallContext, CallEnv, IrsInstance};
use crate::math::{liquidity_for_variable_amount, tick_to_sqrt_price, CheckedArithmetic};
use crate::traits::RateOracle;

/// A liquidity change expressed in notional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintOrBurnParams {
    pub owner: Address,
    pub range: TickRange,
    /// Variable-token notional the liquidity should cover.
    pub notional: Wad,
    pub is_mint: bool,
    /// Margin change bundled with the liquidity change.  Zero for none.
    ///
    /// A positive delta is deposited before the liquidity moves; a negative
    /// one is withdrawn afterwards and must leave the position above its
    /// Initial requirement.
    pub margin_delta: Wad,
}

/// What a swap would do, and what it would require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub margin_requirement: Wad,
    pub tick_after: Tick,
    pub fixed_token_delta: Wad,
    pub variable_token_delta: Wad,
    pub fee: Wad,
    pub fixed_token_delta_unbalanced: Wad,
}

/// Convenience entry point in front of the instances.
///
/// The router turns notionals into liquidity, enforces per-instance LP
/// notional caps and bundles a margin deposit with the trade that needs
/// it.  To act for owners during the alpha phase it must be installed as
/// the instance's periphery.
///
/// Router bookkeeping only changes after the instance call commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    address: Address,
    owner: Address,
    caps: BTreeMap<InstanceKey, Wad>,
    lp_notional: BTreeMap<InstanceKey, Wad>,
    journal: Vec<IrsEvent>,
}

impl Router {
    #[must_use]
    pub const fn new(address: Address, owner: Address) -> Self {
        Self {
            address,
            owner,
            caps: BTreeMap::new(),
            lp_notional: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// LP notional cap of an instance.  `None` means uncapped.
    #[must_use]
    pub fn lp_notional_cap(&self, instance: &InstanceKey) -> Option<Wad> {
        self.caps.get(instance).copied()
    }

    /// Notional currently minted through the router on an instance.
    #[must_use]
    pub fn lp_notional(&self, instance: &InstanceKey) -> Wad {
        self.lp_notional.get(instance).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn events(&self) -> &[IrsEvent] {
        &self.journal
    }

    /// Sets the cumulative LP notional cap of an instance.
    ///
    /// # Errors
    ///
    /// - [`IrsError::Unauthorized`] unless `caller` owns the router.
    /// - [`IrsError::InvalidConfiguration`] for a negative cap.
    pub fn set_lp_notional_cap(
        &mut self,
        caller: Address,
        instance: InstanceKey,
        cap: Wad,
    ) -> Result<()> {
        if caller != self.owner {
            return Err(IrsError::Unauthorized("caller is not the router owner"));
        }
        if cap.is_negative() {
            return Err(IrsError::InvalidConfiguration(
                "notional cap must not be negative",
            ));
        }
        self.caps.insert(instance, cap);
        publish(
            &mut self.journal,
            vec![IrsEvent::NotionalCapUpdated { instance, cap }],
        );
        Ok(())
    }

    fn liquidity_for(range: TickRange, notional: Wad) -> Result<u128> {
        if !notional.is_positive() {
            return Err(IrsError::ZeroNotional);
        }
        liquidity_for_variable_amount(
            tick_to_sqrt_price(range.lower())?,
            tick_to_sqrt_price(range.upper())?,
            notional.unsigned_abs(),
        )
    }

    /// LP notional after applying `params`, checked against the cap.
    fn next_lp_notional(&self, key: &InstanceKey, params: &MintOrBurnParams) -> Result<Wad> {
        let current = self.lp_notional(key);
        if !params.is_mint {
            return Ok(current.safe_sub(&params.notional)?.clamp_non_negative());
        }
        let attempted = current.safe_add(&params.notional)?;
        match self.caps.get(key) {
            Some(&cap) if attempted > cap => {
                warn!(instance = %key, %cap, %attempted, "lp notional cap exceeded");
                Err(IrsError::NotionalCapExceeded { cap, attempted })
            }
            _ => Ok(attempted),
        }
    }

    fn acting_for(caller: Address, owner: Address) -> Result<()> {
        if caller == owner {
            Ok(())
        } else {
            Err(IrsError::Unauthorized("router acts only for the caller"))
        }
    }

    /// Mints or burns the liquidity covering `params.notional` together
    /// with `params.margin_delta`, in one call.  Returns the liquidity
    /// moved.
    ///
    /// # Errors
    ///
    /// - [`IrsError::Unauthorized`] if the caller is not the owner.
    /// - [`IrsError::NotionalCapExceeded`] before touching the instance.
    /// - Any error of the instance's margin update, mint or burn.
    pub fn mint_or_burn(
        &mut self,
        instance: &mut IrsInstance,
        ctx: &mut CallContext<'_>,
        params: &MintOrBurnParams,
    ) -> Result<u128> {
        Self::acting_for(ctx.caller, params.owner)?;
        let key = instance.key();
        let next = self.next_lp_notional(&key, params)?;
        let liquidity = Self::liquidity_for(params.range, params.notional)?;
        let router = self.address;

        instance.transact(ctx, |instance, env, batch| {
            if params.margin_delta.is_positive() {
                instance.update_position_margin_staged(
                    env,
                    batch,
                    params.owner,
                    params.range,
                    params.margin_delta,
                )?;
            }
            let routed = CallEnv {
                caller: router,
                ..*env
            };
            if params.is_mint {
                instance.mint_staged(&routed, params.owner, params.range, liquidity)?;
            } else {
                instance.burn_staged(&routed, params.owner, params.range, liquidity)?;
            }
            if params.margin_delta.is_negative() {
                instance.update_position_margin_staged(
                    env,
                    batch,
                    params.owner,
                    params.range,
                    params.margin_delta,
                )?;
            }
            Ok(())
        })?;

        self.lp_notional.insert(key, next);
        Ok(liquidity)
    }

    /// Swaps together with an optional margin change, in one call.
    ///
    /// A positive `margin_delta` is deposited before the swap; a negative
    /// one is withdrawn after it, so the swap's own margin check sees the
    /// funds and the withdrawal is checked against the new exposure.
    ///
    /// # Errors
    ///
    /// - [`IrsError::Unauthorized`] if the caller is not the recipient.
    /// - Any error of the instance's margin update or swap.
    pub fn swap(
        &mut self,
        instance: &mut IrsInstance,
        ctx: &mut CallContext<'_>,
        params: &SwapParams,
        margin_delta: Option<Wad>,
    ) -> Result<SwapOutcome> {
        Self::acting_for(ctx.caller, params.recipient())?;
        let router = self.address;
        let margin_delta = margin_delta.unwrap_or_default();
        instance.transact(ctx, |instance, env, batch| {
            if margin_delta.is_positive() {
                instance.update_position_margin_staged(
                    env,
                    batch,
                    params.recipient(),
                    params.range(),
                    margin_delta,
                )?;
            }
            let routed = CallEnv {
                caller: router,
                ..*env
            };
            let outcome = instance.swap_staged(&routed, params)?;
            if margin_delta.is_negative() {
                instance.update_position_margin_staged(
                    env,
                    batch,
                    params.recipient(),
                    params.range(),
                    margin_delta,
                )?;
            }
            Ok(outcome)
        })
    }

    /// Runs a swap on a scratch copy of `instance` and reports its
    /// deltas and the recipient's Initial requirement afterwards.
    ///
    /// A swap that fails its margin check still yields a quote.
    ///
    /// # Errors
    ///
    /// Any other error the swap would fail with.
    pub fn quote_swap(
        &self,
        instance: &IrsInstance,
        now: Timestamp,
        oracle: &dyn RateOracle,
        params: &SwapParams,
    ) -> Result<SwapQuote> {
        let env = CallEnv {
            caller: self.address,
            now,
            oracle,
        };
        let mut scratch = instance.clone();
        match scratch.swap_staged(&env, params) {
            Ok(outcome) => Ok(SwapQuote {
                margin_requirement: scratch.position_margin_requirement(
                    params.recipient(),
                    params.range(),
                    MarginMode::Initial,
                    now,
                    oracle,
                )?,
                tick_after: outcome.tick_after(),
                fixed_token_delta: outcome.fixed_token_delta(),
                variable_token_delta: outcome.variable_token_delta(),
                fee: outcome.fee(),
                fixed_token_delta_unbalanced: outcome.fixed_token_delta_unbalanced(),
            }),
            Err(IrsError::MarginRequirementNotMet {
                margin_requirement,
                tick,
                fixed_token_delta,
                variable_token_delta,
                fee,
                fixed_token_delta_unbalanced,
            }) => Ok(SwapQuote {
                margin_requirement,
                tick_after: Tick::new(tick)?,
                fixed_token_delta,
                variable_token_delta,
                fee,
                fixed_token_delta_unbalanced,
            }),
            Err(e) => Err(e),
        }
    }

    /// Initial requirement of the owner's position after the liquidity
    /// change in `params` (the deposit in `params` is ignored).
    ///
    /// # Errors
    ///
    /// [`IrsError::NotionalCapExceeded`] and any error other than a margin
    /// shortfall the change would fail with.
    pub fn quote_mint_or_burn(
        &self,
        instance: &IrsInstance,
        now: Timestamp,
        oracle: &dyn RateOracle,
        params: &MintOrBurnParams,
    ) -> Result<Wad> {
        self.next_lp_notional(&instance.key(), params)?;
        let liquidity = Self::liquidity_for(params.range, params.notional)?;
        let env = CallEnv {
            caller: self.address,
            now,
            oracle,
        };
        let mut scratch = instance.clone();
        let result = if params.is_mint {
            scratch.mint_staged(&env, params.owner, params.range, liquidity)
        } else {
            scratch.burn_staged(&env, params.owner, params.range, liquidity)
        };
        match result {
            Ok(()) if scratch.position(params.owner, params.range).is_none() => Ok(Wad::ZERO),
            Ok(()) => scratch.position_margin_requirement(
                params.owner,
                params.range,
                MarginMode::Initial,
                now,
                oracle,
            ),
            Err(
                IrsError::InsufficientMarginForMint {
                    margin_requirement, ..
                }
                | IrsError::MarginLessThanMinimum { margin_requirement },
            ) => Ok(margin_requirement),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const OWNER: Address = Address::repeat(1);

    fn key() -> InstanceKey {
        InstanceKey {
            underlying: Address::repeat(2),
            oracle: Address::repeat(3),
            term_start: Timestamp::new(0),
            term_end: Timestamp::new(100),
            tick_spacing: 60,
        }
    }

    fn mint(notional: i64) -> MintOrBurnParams {
        let Ok(range) = TickRange::new(-60, 60, 60) else {
            panic!("valid range");
        };
        MintOrBurnParams {
            owner: OWNER,
            range,
            notional: Wad::from_integer(notional),
            is_mint: true,
            margin_delta: Wad::ZERO,
        }
    }

    #[test]
    fn only_owner_sets_caps() {
        let mut router = Router::new(Address::repeat(7), OWNER);
        assert!(matches!(
            router.set_lp_notional_cap(Address::repeat(8), key(), Wad::ONE),
            Err(IrsError::Unauthorized(_))
        ));
        assert_eq!(
            router.set_lp_notional_cap(OWNER, key(), Wad::from_integer(100)),
            Ok(())
        );
        assert_eq!(router.lp_notional_cap(&key()), Some(Wad::from_integer(100)));
        assert_eq!(router.events().len(), 1);
    }

    #[test]
    fn cap_bounds_cumulative_notional() {
        let mut router = Router::new(Address::repeat(7), OWNER);
        assert_eq!(
            router.next_lp_notional(&key(), &mint(1_000)),
            Ok(Wad::from_integer(1_000))
        );
        let Ok(()) = router.set_lp_notional_cap(OWNER, key(), Wad::from_integer(100)) else {
            panic!("expected Ok");
        };
        router.lp_notional.insert(key(), Wad::from_integer(60));
        assert_eq!(
            router.next_lp_notional(&key(), &mint(40)),
            Ok(Wad::from_integer(100))
        );
        assert_eq!(
            router.next_lp_notional(&key(), &mint(41)),
            Err(IrsError::NotionalCapExceeded {
                cap: Wad::from_integer(100),
                attempted: Wad::from_integer(101),
            })
        );
        let burn = MintOrBurnParams {
            is_mint: false,
            ..mint(80)
        };
        assert_eq!(router.next_lp_notional(&key(), &burn), Ok(Wad::ZERO));
    }

    #[test]
    fn notional_converts_to_positive_liquidity() {
        let params = mint(100);
        let Ok(liquidity) = Router::liquidity_for(params.range, params.notional) else {
            panic!("expected Ok");
        };
        // About notional / (sqrt(1.0001^60) - sqrt(1.0001^-60)).
        assert!(liquidity > 16_000 * 1_000_000_000_000_000_000);
        assert!(liquidity < 17_000 * 1_000_000_000_000_000_000);
        assert_eq!(
            Router::liquidity_for(params.range, Wad::ZERO),
            Err(IrsError::ZeroNotional)
        );
    }
}
