//! Per-tick bookkeeping and growth accumulators.
//!
//! Growth is tracked per unit of liquidity as a signed Q64 value: a delta
//! `d` spread over liquidity `L` adds `d * 2^64 / L`.  Each initialized
//! tick remembers the growth that happened on the side of it away from
//! the current price ("outside"); crossing the tick flips that view.
//! The growth inside a range is then `global - below(lower) - above(upper)`.

use std::collections::BTreeMap;

use crate::domain::{Rounding, Wad, MAX_TICK, MIN_TICK};
use crate::error::{IrsError, Result};
use crate::math::mul_div_signed;

/// Fixed-point scale of the growth accumulators.
pub const GROWTH_ONE: u128 = 1 << 64;

/// Fee, fixed-token and variable-token growth per unit of liquidity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Growth {
    pub fee: i128,
    pub fixed_token: i128,
    pub variable_token: i128,
}

impl Growth {
    /// Component-wise `self - other`.
    ///
    /// # Errors
    ///
    /// Returns [`IrsError::Overflow`] if any component overflows.
    pub fn checked_sub(&self, other: &Self) -> Result<Self> {
        let sub = |a: i128, b: i128| a.checked_sub(b).ok_or(IrsError::Overflow("growth subtraction"));
        Ok(Self {
            fee: sub(self.fee, other.fee)?,
            fixed_token: sub(self.fixed_token, other.fixed_token)?,
            variable_token: sub(self.variable_token, other.variable_token)?,
        })
    }

    /// Adds `amount` spread over `liquidity` to one component.
    pub(crate) fn accrue(component: &mut i128, amount: Wad, liquidity: u128) -> Result<()> {
        let per_unit = mul_div_signed(amount.raw(), GROWTH_ONE, liquidity, Rounding::Down)?;
        *component = component
            .checked_add(per_unit)
            .ok_or(IrsError::Overflow("growth accumulator"))?;
        Ok(())
    }
}

/// Amounts a position earned from growth since its last snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthCredit {
    pub fixed_token: Wad,
    pub variable_token: Wad,
    pub fee: Wad,
}

impl GrowthCredit {
    /// Converts a growth delta into token amounts for `liquidity`.
    ///
    /// # Errors
    ///
    /// Arithmetic errors on overflow.
    pub fn for_liquidity(delta: &Growth, liquidity: u128) -> Result<Self> {
        let scale = |g: i128| -> Result<Wad> {
            mul_div_signed(g, liquidity, GROWTH_ONE, Rounding::Down).map(Wad::from_raw)
        };
        Ok(Self {
            fixed_token: scale(delta.fixed_token)?,
            variable_token: scale(delta.variable_token)?,
            fee: scale(delta.fee)?,
        })
    }
}

/// State stored for every initialized tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickInfo {
    /// Total liquidity referencing this tick as either bound.
    pub liquidity_gross: u128,
    /// Liquidity added to the active set when crossing upwards.
    pub liquidity_net: i128,
    /// Growth on the far side of this tick from the current price.
    pub growth_outside: Growth,
}

/// Gross liquidity ceiling for a tick on the `spacing` grid.
#[must_use]
pub fn max_liquidity_per_tick(spacing: i32) -> u128 {
    let spacing = spacing.max(1);
    let min_tick = (MIN_TICK / spacing) * spacing;
    let max_tick = (MAX_TICK / spacing) * spacing;
    let num_ticks = ((max_tick - min_tick) / spacing).unsigned_abs() + 1;
    u128::MAX / u128::from(num_ticks)
}

/// Initialized ticks, ordered by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TickMap {
    ticks: BTreeMap<i32, TickInfo>,
}

impl TickMap {
    pub(crate) fn get(&self, tick: i32) -> Option<&TickInfo> {
        self.ticks.get(&tick)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&i32, &TickInfo)> {
        self.ticks.iter()
    }

    /// Next initialized tick at or below `from` (price falling) or strictly
    /// above `from` (price rising).
    pub(crate) fn next_initialized(&self, from: i32, rising: bool) -> Option<i32> {
        if rising {
            from.checked_add(1)
                .and_then(|start| self.ticks.range(start..).next())
                .map(|(&t, _)| t)
        } else {
            self.ticks.range(..=from).next_back().map(|(&t, _)| t)
        }
    }

    /// Applies a liquidity change to one bound of a range.
    ///
    /// Returns `true` if the tick flipped between initialized and not.
    pub(crate) fn update(
        &mut self,
        tick: i32,
        current_tick: i32,
        delta: i128,
        upper: bool,
        global: &Growth,
        max_liquidity: u128,
    ) -> Result<bool> {
        let mut info = self.ticks.get(&tick).copied().unwrap_or_default();
        let gross_before = info.liquidity_gross;
        let gross_after = apply_liquidity_delta(gross_before, delta)?;
        if gross_after > max_liquidity {
            return Err(IrsError::MaxLiquidityPerTickExceeded);
        }

        if gross_before == 0 && tick <= current_tick {
            info.growth_outside = *global;
        }
        info.liquidity_gross = gross_after;
        info.liquidity_net = if upper {
            info.liquidity_net.checked_sub(delta)
        } else {
            info.liquidity_net.checked_add(delta)
        }
        .ok_or(IrsError::Overflow("tick liquidity net"))?;

        if gross_after == 0 {
            self.ticks.remove(&tick);
        } else {
            self.ticks.insert(tick, info);
        }
        Ok((gross_before == 0) != (gross_after == 0))
    }

    /// Flips the outside growth of `tick` and returns its net liquidity.
    pub(crate) fn cross(&mut self, tick: i32, global: &Growth) -> Result<i128> {
        let info = self
            .ticks
            .get_mut(&tick)
            .ok_or(IrsError::InvariantViolation("crossing an uninitialized tick"))?;
        info.growth_outside = global.checked_sub(&info.growth_outside)?;
        Ok(info.liquidity_net)
    }

    /// Growth accumulated inside `[lower, upper)` given the current tick.
    pub(crate) fn growth_inside(
        &self,
        lower: i32,
        upper: i32,
        current_tick: i32,
        global: &Growth,
    ) -> Result<Growth> {
        let outside = |t: i32| self.ticks.get(&t).map_or(Growth::default(), |i| i.growth_outside);

        let lower_outside = outside(lower);
        let below = if current_tick >= lower {
            lower_outside
        } else {
            global.checked_sub(&lower_outside)?
        };

        let upper_outside = outside(upper);
        let above = if current_tick < upper {
            upper_outside
        } else {
            global.checked_sub(&upper_outside)?
        };

        global.checked_sub(&below)?.checked_sub(&above)
    }
}

/// Applies a signed delta to an unsigned liquidity value.
///
/// # Errors
///
/// - [`IrsError::LiquidityUnderflow`] if a negative delta exceeds `value`.
/// - [`IrsError::Overflow`] on overflow.
pub(crate) fn apply_liquidity_delta(value: u128, delta: i128) -> Result<u128> {
    if delta < 0 {
        let requested = delta.unsigned_abs();
        value.checked_sub(requested).ok_or(IrsError::LiquidityUnderflow {
            requested,
            available: value,
        })
    } else {
        value
            .checked_add(delta.unsigned_abs())
            .ok_or(IrsError::Overflow("liquidity addition"))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn growth(v: i128) -> Growth {
        Growth {
            fee: v,
            fixed_token: -v,
            variable_token: 2 * v,
        }
    }

    #[test]
    fn max_liquidity_shrinks_with_finer_grids() {
        assert!(max_liquidity_per_tick(1) < max_liquidity_per_tick(60));
        assert_eq!(
            max_liquidity_per_tick(MAX_TICK),
            u128::MAX / 3
        );
    }

    #[test]
    fn update_sets_outside_only_below_current() {
        let mut map = TickMap::default();
        let global = growth(100);
        let Ok(flipped) = map.update(-60, 0, 50, false, &global, u128::MAX) else {
            panic!("expected Ok");
        };
        assert!(flipped);
        let Ok(_) = map.update(60, 0, 50, true, &global, u128::MAX) else {
            panic!("expected Ok");
        };
        assert_eq!(map.get(-60).map(|i| i.growth_outside), Some(global));
        assert_eq!(map.get(60).map(|i| i.growth_outside), Some(Growth::default()));
        assert_eq!(map.get(-60).map(|i| i.liquidity_net), Some(50));
        assert_eq!(map.get(60).map(|i| i.liquidity_net), Some(-50));
    }

    #[test]
    fn emptied_tick_is_removed() {
        let mut map = TickMap::default();
        let global = Growth::default();
        let Ok(_) = map.update(0, 0, 10, false, &global, u128::MAX) else {
            panic!("expected Ok");
        };
        let Ok(flipped) = map.update(0, 0, -10, false, &global, u128::MAX) else {
            panic!("expected Ok");
        };
        assert!(flipped);
        assert!(map.get(0).is_none());
        assert_eq!(
            map.update(0, 0, -1, false, &global, u128::MAX),
            Err(IrsError::LiquidityUnderflow {
                requested: 1,
                available: 0
            })
        );
    }

    #[test]
    fn per_tick_ceiling_enforced() {
        let mut map = TickMap::default();
        assert_eq!(
            map.update(0, 0, 11, false, &Growth::default(), 10),
            Err(IrsError::MaxLiquidityPerTickExceeded)
        );
    }

    #[test]
    fn next_initialized_respects_direction() {
        let mut map = TickMap::default();
        for t in [-120, 0, 120] {
            let Ok(_) = map.update(t, 0, 1, false, &Growth::default(), u128::MAX) else {
                panic!("expected Ok");
            };
        }
        assert_eq!(map.next_initialized(0, false), Some(0));
        assert_eq!(map.next_initialized(-1, false), Some(-120));
        assert_eq!(map.next_initialized(0, true), Some(120));
        assert_eq!(map.next_initialized(120, true), None);
        assert_eq!(map.next_initialized(-121, false), None);
    }

    #[test]
    fn growth_inside_tracks_crossings() {
        let mut map = TickMap::default();
        let zero = Growth::default();
        for (t, upper) in [(-60, false), (60, true)] {
            let Ok(_) = map.update(t, 0, 1, upper, &zero, u128::MAX) else {
                panic!("expected Ok");
            };
        }
        // Growth of 10 while the price sits inside the range.
        let global = growth(10);
        assert_eq!(map.growth_inside(-60, 60, 0, &global), Ok(global));

        // Price leaves through the upper tick, then 5 more accrues outside.
        let Ok(_) = map.cross(60, &global) else {
            panic!("expected Ok");
        };
        let global = growth(15);
        assert_eq!(map.growth_inside(-60, 60, 60, &global), Ok(growth(10)));
    }

    #[test]
    fn credit_scales_with_liquidity() {
        let delta = Growth {
            fee: (GROWTH_ONE as i128) * 3,
            fixed_token: -(GROWTH_ONE as i128),
            variable_token: (GROWTH_ONE as i128) / 2,
        };
        let Ok(credit) = GrowthCredit::for_liquidity(&delta, 4) else {
            panic!("expected Ok");
        };
        assert_eq!(credit.fee, Wad::from_raw(12));
        assert_eq!(credit.fixed_token, Wad::from_raw(-4));
        assert_eq!(credit.variable_token, Wad::from_raw(2));
    }
}
