// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fee engine: prices a gas cost in the withdrawal token.
//!
//! `gas -> wei -> USD (+ markup) -> token units`, rounding the final
//! division up so truncation never under-charges.

use alloy::primitives::{Address, U256};

use super::assets::{AssetInfo, AssetKind};
use super::error::{GatewayError, GatewayResult};
use super::math::{self, SCALE};
use super::oracle::{OracleParams, PriceOracleAdapter};

/// Basis-point denominator.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Outcome of a fee computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    /// Gas cost in USD (18 decimals) including markup.
    pub gross_usd: U256,
    /// Token USD price used for conversion; zero when the fee short-circuited.
    pub token_usd_price: U256,
    /// Fee in token base units.
    pub fee: U256,
}

impl FeeQuote {
    pub const ZERO: FeeQuote = FeeQuote {
        gross_usd: U256::ZERO,
        token_usd_price: U256::ZERO,
        fee: U256::ZERO,
    };
}

#[derive(Clone)]
pub struct FeeEngine {
    oracle: PriceOracleAdapter,
    weth: Address,
    markup_bps: u32,
    gas_overhead: u64,
}

impl FeeEngine {
    pub fn new(oracle: PriceOracleAdapter, weth: Address, markup_bps: u32, gas_overhead: u64) -> Self {
        Self {
            oracle,
            weth,
            markup_bps,
            gas_overhead,
        }
    }

    pub fn oracle(&self) -> &PriceOracleAdapter {
        &self.oracle
    }

    /// Fee for a caller-supplied gas estimate.
    ///
    /// The fixed overhead is added on top of `gas_units`.
    pub fn quote_fee(
        &self,
        asset: &AssetInfo,
        gas_units: u64,
        gas_price: U256,
        params: &OracleParams,
    ) -> GatewayResult<FeeQuote> {
        if gas_price.is_zero() {
            return Ok(FeeQuote::ZERO);
        }
        let gas_units = gas_units
            .checked_add(self.gas_overhead)
            .ok_or(GatewayError::ArithmeticOverflow {
                context: "gas units",
            })?;
        self.price_gas(asset, gas_units, gas_price, params)
    }

    /// Fee for gas actually consumed while executing a call.
    ///
    /// Self-metered reconciliation entry point: prices measured gas the same
    /// way [`quote_fee`](Self::quote_fee) prices an estimate, so an operator
    /// can compare what a withdrawal cost against the fee that was signed.
    /// `withdraw` never calls it; the fee it charges is always the signed one.
    pub fn compute_fee(
        &self,
        asset: &AssetInfo,
        gas_consumed: u64,
        effective_gas_price: U256,
        params: &OracleParams,
    ) -> GatewayResult<FeeQuote> {
        let quote = self.quote_fee(asset, gas_consumed, effective_gas_price, params)?;
        tracing::debug!(
            asset = %asset.address,
            gas_consumed,
            fee = %quote.fee,
            "Computed metered fee"
        );
        Ok(quote)
    }

    fn price_gas(
        &self,
        asset: &AssetInfo,
        gas_units: u64,
        gas_price: U256,
        params: &OracleParams,
    ) -> GatewayResult<FeeQuote> {
        let wei_cost = U256::from(gas_units)
            .checked_mul(gas_price)
            .ok_or(GatewayError::ArithmeticOverflow {
                context: "gas cost",
            })?;
        if wei_cost.is_zero() {
            return Ok(FeeQuote::ZERO);
        }

        let eth_usd = self.oracle.eth_usd(params.max_delay)?;
        let usd_cost = math::mul_div(wei_cost, eth_usd.value, SCALE)?;
        if usd_cost.is_zero() {
            return Ok(FeeQuote::ZERO);
        }

        let gross_usd = math::mul_div(
            usd_cost,
            U256::from(BPS_DENOMINATOR + u64::from(self.markup_bps)),
            U256::from(BPS_DENOMINATOR),
        )?;

        let token_usd_price = match asset.kind {
            AssetKind::Token => {
                self.oracle
                    .token_usd(asset.address, asset.decimals, self.weth, params)?
                    .value
            }
            AssetKind::Stable => self.oracle.stable_usd(params.max_delay)?.value,
        };
        if token_usd_price.is_zero() {
            return Err(GatewayError::ZeroTokenPrice {
                asset: asset.address,
            });
        }

        let fee = math::mul_div_rounding_up(gross_usd, math::pow10(asset.decimals), token_usd_price)?;

        Ok(FeeQuote {
            gross_usd,
            token_usd_price,
            fee,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chain::memory::{RecordedPool, StaticPriceFeed};
    use crate::gateway::clock::ManualClock;

    const NOW: u64 = 1_700_000_000;
    const TOKEN: Address = Address::repeat_byte(0x01);
    const STABLE: Address = Address::repeat_byte(0x02);
    const WETH: Address = Address::repeat_byte(0x03);

    const PARAMS: OracleParams = OracleParams {
        averaging_window: 1_800,
        max_delay: 3_600,
    };

    fn engine(stable_price: i128) -> FeeEngine {
        let clock = Arc::new(ManualClock::new(NOW));
        let eth = StaticPriceFeed::new(Address::repeat_byte(0xf1), 2_000_00000000, 8, NOW);
        let stable = StaticPriceFeed::new(Address::repeat_byte(0xf2), stable_price, 8, NOW);
        let pool = RecordedPool::new(Address::repeat_byte(0xaa));
        pool.record(1_800, 0);
        pool.record(0, 0);
        let oracle =
            PriceOracleAdapter::new(Arc::new(eth), Arc::new(stable), Arc::new(pool), clock);
        FeeEngine::new(oracle, WETH, 1_500, 50_000)
    }

    #[test]
    fn zero_gas_price_short_circuits() {
        let quote = engine(100_000_000)
            .quote_fee(&AssetInfo::stable(STABLE, 6), 150_000, U256::ZERO, &PARAMS)
            .unwrap();
        assert_eq!(quote, FeeQuote::ZERO);
    }

    #[test]
    fn tiny_costs_round_up_to_one_unit() {
        // 200,000 gas * 1 wei * $2000 = 4e8 (18-dec USD), * 1.15 = 4.6e8.
        let quote = engine(100_000_000)
            .quote_fee(&AssetInfo::stable(STABLE, 6), 150_000, U256::from(1u8), &PARAMS)
            .unwrap();
        assert_eq!(quote.gross_usd, U256::from(460_000_000u64));
        assert_eq!(quote.token_usd_price, SCALE);
        // Raw division gives 0.00046 of a unit; the fee rounds up to 1.
        assert_eq!(quote.fee, U256::from(1u8));
    }

    #[test]
    fn stable_fee_at_realistic_gas_price() {
        // 200,000 gas * 20 gwei = 0.004 ETH = $8, * 1.15 = $9.20.
        let quote = engine(100_000_000)
            .quote_fee(
                &AssetInfo::stable(STABLE, 6),
                150_000,
                U256::from(20_000_000_000u64),
                &PARAMS,
            )
            .unwrap();
        assert_eq!(quote.gross_usd, U256::from(9_200_000_000_000_000_000u128));
        assert_eq!(quote.fee, U256::from(9_200_000u64));
    }

    #[test]
    fn inexact_division_rounds_up_not_down() {
        // $9.20 at $3 per unit is 3.0666... units.
        let quote = engine(300_000_000)
            .quote_fee(
                &AssetInfo::stable(STABLE, 6),
                150_000,
                U256::from(20_000_000_000u64),
                &PARAMS,
            )
            .unwrap();
        assert_eq!(quote.fee, U256::from(3_066_667u64));
    }

    #[test]
    fn token_fee_uses_pool_price() {
        // Parity tick: 1 token = 1 WETH = $2000, so $9.20 = 0.0046 token.
        let quote = engine(100_000_000)
            .quote_fee(
                &AssetInfo::token(TOKEN, 18),
                150_000,
                U256::from(20_000_000_000u64),
                &PARAMS,
            )
            .unwrap();
        assert_eq!(quote.token_usd_price, U256::from(2_000u64) * SCALE);
        assert_eq!(quote.fee, U256::from(4_600_000_000_000_000u64));
    }

    #[test]
    fn quotes_are_deterministic() {
        let engine = engine(100_000_000);
        let asset = AssetInfo::token(TOKEN, 18);
        let first = engine
            .quote_fee(&asset, 90_000, U256::from(3_000_000_000u64), &PARAMS)
            .unwrap();
        let second = engine
            .quote_fee(&asset, 90_000, U256::from(3_000_000_000u64), &PARAMS)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn metered_fee_prices_consumed_gas_with_overhead() {
        let engine = engine(100_000_000);
        let asset = AssetInfo::stable(STABLE, 6);
        let metered = engine
            .compute_fee(&asset, 150_000, U256::from(20_000_000_000u64), &PARAMS)
            .unwrap();
        assert_eq!(metered.fee, U256::from(9_200_000u64));
    }
}
