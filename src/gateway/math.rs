// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Full-precision fixed-point helpers and tick arithmetic.
//!
//! Intermediate products are widened to 512 bits so `a * b / d` never
//! overflows before the division. Tick conversion follows the concentrated
//! liquidity pool convention: `price = 1.0001^tick`, carried as a Q64.96
//! square-root ratio.

use alloy::primitives::{Address, U256, U512};

use super::error::{GatewayError, GatewayResult};

/// 18-decimal fixed-point scale used for every USD value.
pub const SCALE: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Lowest tick representable by the pool.
pub const MIN_TICK: i32 = -887_272;
/// Highest tick representable by the pool.
pub const MAX_TICK: i32 = 887_272;

/// Per-bit multipliers for `sqrt(1.0001^-(2^i))` in Q128.128, bits 1..=19.
const TICK_FACTORS: [u128; 19] = [
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

fn widen(value: U256) -> U512 {
    let l = value.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

fn narrow(value: U512, context: &'static str) -> GatewayResult<U256> {
    let l = value.as_limbs();
    if l[4..].iter().any(|&limb| limb != 0) {
        return Err(GatewayError::ArithmeticOverflow { context });
    }
    Ok(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

/// `floor(a * b / denominator)` without intermediate overflow.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> GatewayResult<U256> {
    if denominator.is_zero() {
        return Err(GatewayError::ArithmeticOverflow {
            context: "mul_div by zero",
        });
    }
    narrow(widen(a) * widen(b) / widen(denominator), "mul_div")
}

/// `ceil(a * b / denominator)` without intermediate overflow.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> GatewayResult<U256> {
    if denominator.is_zero() {
        return Err(GatewayError::ArithmeticOverflow {
            context: "mul_div_rounding_up by zero",
        });
    }
    let product = widen(a) * widen(b);
    let denominator = widen(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient += U512::from(1u8);
    }
    narrow(quotient, "mul_div_rounding_up")
}

/// `10^exponent` as a 256-bit integer.
pub fn pow10(exponent: u8) -> U256 {
    U256::from(10u8).pow(U256::from(exponent))
}

/// Square-root price ratio `sqrt(1.0001^tick) * 2^96` for `tick`.
pub fn sqrt_ratio_at_tick(tick: i32) -> GatewayResult<U256> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(GatewayError::TickOutOfRange { tick });
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(0xfffcb933bd6fad37aa2d162d1a594001u128)
    } else {
        U256::from(1u8) << 128
    };
    for (bit, factor) in TICK_FACTORS.iter().enumerate() {
        if abs_tick & (0x2 << bit) != 0 {
            ratio = (ratio * U256::from(*factor)) >> 128;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    let low_mask = (U256::from(1u8) << 32) - U256::from(1u8);
    let remainder: U256 = ratio & low_mask;
    let round_up = if remainder.is_zero() { 0u8 } else { 1u8 };
    Ok((ratio >> 32) + U256::from(round_up))
}

/// Amount of `quote_asset` worth `base_amount` of `base_asset` at `tick`.
///
/// The pool orders its pair by address, so the ratio is inverted when the
/// base asset sorts after the quote asset. Ratios above `u128::MAX` are
/// squared through a 64-bit pre-shift to keep the product inside 256 bits.
pub fn tick_to_amount(
    tick: i32,
    base_amount: u128,
    base_asset: Address,
    quote_asset: Address,
) -> GatewayResult<U256> {
    let sqrt_ratio = sqrt_ratio_at_tick(tick)?;
    let base_amount = U256::from(base_amount);
    let base_first = base_asset < quote_asset;

    if sqrt_ratio <= U256::from(u128::MAX) {
        let ratio_x192 = sqrt_ratio * sqrt_ratio;
        let q192 = U256::from(1u8) << 192;
        if base_first {
            mul_div(ratio_x192, base_amount, q192)
        } else {
            mul_div(q192, base_amount, ratio_x192)
        }
    } else {
        let ratio_x128 = mul_div(sqrt_ratio, sqrt_ratio, U256::from(1u8) << 64)?;
        let q128 = U256::from(1u8) << 128;
        if base_first {
            mul_div(ratio_x128, base_amount, q128)
        } else {
            mul_div(q128, base_amount, ratio_x128)
        }
    }
}
