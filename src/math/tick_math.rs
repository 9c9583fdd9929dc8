//! Tick ⇄ sqrt-price conversion on the Q64.96 grid.
//!
//! [`tick_to_sqrt_price`] computes `sqrt(1.0001^tick) * 2^96` exactly with
//! the bit-decomposition used by concentrated-liquidity AMMs: every set bit
//! of `|tick|` multiplies a Q128 accumulator by a precomputed
//! `1/sqrt(1.0001^(2^i))`.  The result is rounded up to Q96, so the price
//! at a tick is never understated.
//!
//! [`sqrt_price_to_tick`] inverts it by binary search over the forward
//! function, returning the largest tick whose price is at or below the
//! input.  The round trip `sqrt_price_to_tick(tick_to_sqrt_price(t)) == t`
//! is therefore exact for every tick in the domain.
//!
//! # Examples
//!
//! ```
//! use irs_amm::domain::{SqrtPriceX96, Tick};
//! use irs_amm::math::{sqrt_price_to_tick, tick_to_sqrt_price};
//!
//! let tick = Tick::new(-600).expect("valid tick");
//! let price = tick_to_sqrt_price(tick).expect("in domain");
//! assert_eq!(sqrt_price_to_tick(price).expect("in domain"), tick);
//! assert_eq!(tick_to_sqrt_price(Tick::ZERO).ok(), Some(SqrtPriceX96::ONE));
//! ```

use primitive_types::U256;

use super::full_math::to_u128;
use crate::domain::{SqrtPriceX96, Tick, MAX_TICK, MIN_TICK};
use crate::error::{IrsError, Result};

/// Sqrt price at [`MIN_TICK`].
pub const MIN_SQRT_RATIO: u128 = 2_503_036_416_286_949_174_936_592_462;

/// Sqrt price at [`MAX_TICK`].
pub const MAX_SQRT_RATIO: u128 = 2_507_794_810_551_837_817_144_115_957_740;

/// Q128 value for bit `0x1`, the starting accumulator when the low bit is set.
const BIT_0_RATIO: u128 = 0xfffc_b933_bd6f_ad37_aa2d_162d_1a59_4001;

/// `2^128 / sqrt(1.0001^bit)` for the remaining bits of `|tick|`.
/// `MAX_TICK < 2^17`, so seventeen bits cover the domain.
const BIT_RATIOS: [(u32, u128); 16] = [
    (0x2, 0xfff9_7272_373d_4132_59a4_6990_580e_213a),
    (0x4, 0xfff2_e50f_5f65_6932_ef12_357c_f3c7_fdcc),
    (0x8, 0xffe5_caca_7e10_e4e6_1c36_24ea_a094_1cd0),
    (0x10, 0xffcb_9843_d60f_6159_c9db_5883_5c92_6644),
    (0x20, 0xff97_3b41_fa98_c081_472e_6896_dfb2_54c0),
    (0x40, 0xff2e_a164_66c9_6a38_43ec_78b3_26b5_2861),
    (0x80, 0xfe5d_ee04_6a99_a2a8_11c4_61f1_969c_3053),
    (0x100, 0xfcbe_86c7_900a_88ae_dcff_c83b_479a_a3a4),
    (0x200, 0xf987_a725_3ac4_1317_6f2b_074c_f781_5e54),
    (0x400, 0xf339_2b08_22b7_0005_940c_7a39_8e4b_70f3),
    (0x800, 0xe715_9475_a2c2_9b74_43b2_9c7f_a6e8_89d9),
    (0x1000, 0xd097_f3bd_fd20_22b8_845a_d8f7_92aa_5825),
    (0x2000, 0xa9f7_4646_2d87_0fdf_8a65_dc1f_90e0_61e5),
    (0x4000, 0x70d8_69a1_56d2_a1b8_90bb_3df6_2baf_32f7),
    (0x8000, 0x31be_135f_97d0_8fd9_8123_1505_542f_cfa6),
    (0x10000, 0x09aa_508b_5b7a_84e1_c677_de54_f3e9_9bc9),
];

/// Returns `sqrt(1.0001^tick) * 2^96`, rounded up.
///
/// # Errors
///
/// Returns [`IrsError::Overflow`] only if an intermediate product escapes
/// 256 bits, which cannot happen for ticks inside the domain.
pub fn tick_to_sqrt_price(tick: Tick) -> Result<SqrtPriceX96> {
    let abs_tick = tick.get().unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(BIT_0_RATIO)
    } else {
        U256::one() << 128
    };
    for (bit, magic) in BIT_RATIOS {
        if abs_tick & bit != 0 {
            ratio = ratio
                .checked_mul(U256::from(magic))
                .ok_or(IrsError::Overflow("tick ratio product"))?
                >> 128;
        }
    }

    if tick.get() > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128 -> Q96, rounding up.
    let low_bits_set = !(ratio & U256::from(u32::MAX)).is_zero();
    let mut sqrt_price = ratio >> 32;
    if low_bits_set {
        sqrt_price = sqrt_price + U256::one();
    }
    SqrtPriceX96::new(to_u128(sqrt_price, "sqrt price exceeds 128 bits")?)
}

/// Returns the largest tick whose sqrt price is `<= sqrt_price`.
///
/// # Errors
///
/// Returns [`IrsError::InvalidSqrtPrice`] if `sqrt_price` is outside
/// `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
pub fn sqrt_price_to_tick(sqrt_price: SqrtPriceX96) -> Result<Tick> {
    let p = sqrt_price.get();
    if !(MIN_SQRT_RATIO..MAX_SQRT_RATIO).contains(&p) {
        return Err(IrsError::InvalidSqrtPrice(
            "sqrt price outside [MIN_SQRT_RATIO, MAX_SQRT_RATIO)",
        ));
    }

    // Invariant: price(lo) <= p < price(hi).
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if tick_to_sqrt_price(Tick::new(mid)?)?.get() <= p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Tick::new(lo)
}

/// Returns `true` if `sqrt_price` lies on the tick grid's open interval.
#[must_use]
pub const fn is_within_grid(sqrt_price: SqrtPriceX96) -> bool {
    sqrt_price.get() > MIN_SQRT_RATIO && sqrt_price.get() < MAX_SQRT_RATIO
}
