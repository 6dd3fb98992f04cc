// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Price oracle adapter.
//!
//! Reads the two external price sources (a push-style USD feed and a
//! time-weighted averaging pool) and normalizes their answers to the
//! 18-decimal USD scale. Reads are side-effect free.

use std::sync::Arc;

use alloy::primitives::{Address, I256, U256};

use super::clock::Clock;
use super::error::{GatewayError, GatewayResult};
use super::math::{self, SCALE};
use crate::chain::ChainError;

/// Raw answer from a push-style price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedAnswer {
    pub value: I256,
    pub updated_at: u64,
    pub decimals: u8,
}

/// A push-style price feed (aggregator).
pub trait PriceFeed: Send + Sync {
    /// Address identifying the feed.
    fn feed_id(&self) -> Address;

    fn latest_answer(&self) -> Result<FeedAnswer, ChainError>;
}

/// A pool exposing cumulative tick observations.
pub trait AveragingPool: Send + Sync {
    fn pool_id(&self) -> Address;

    /// Tick cumulatives for each entry of `seconds_agos`, in order.
    fn observe(&self, seconds_agos: &[u32]) -> Result<Vec<i64>, ChainError>;
}

/// USD price on the 18-decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub value: U256,
    pub source: Address,
    pub observed_at: u64,
}

/// Oracle limits read from the runtime settings at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleParams {
    pub averaging_window: u32,
    pub max_delay: u64,
}

/// Adapter over the ETH/USD feed, the stable/USD feed and the token pool.
#[derive(Clone)]
pub struct PriceOracleAdapter {
    eth_usd: Arc<dyn PriceFeed>,
    stable_usd: Arc<dyn PriceFeed>,
    pool: Arc<dyn AveragingPool>,
    clock: Arc<dyn Clock>,
}

impl PriceOracleAdapter {
    pub fn new(
        eth_usd: Arc<dyn PriceFeed>,
        stable_usd: Arc<dyn PriceFeed>,
        pool: Arc<dyn AveragingPool>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            eth_usd,
            stable_usd,
            pool,
            clock,
        }
    }

    /// Arithmetic mean tick over the last `window` seconds.
    ///
    /// Rounds toward negative infinity.
    pub fn consult_average(&self, window: u32) -> GatewayResult<i32> {
        if window == 0 {
            return Err(GatewayError::WindowTooSmall);
        }

        let cumulatives = self.pool.observe(&[window, 0])?;
        let &[then, current] = cumulatives.as_slice() else {
            return Err(ChainError::Contract(format!(
                "pool {} returned {} observations, expected 2",
                self.pool.pool_id(),
                cumulatives.len()
            ))
            .into());
        };

        let delta = current
            .checked_sub(then)
            .ok_or(GatewayError::ArithmeticOverflow {
                context: "tick cumulative delta",
            })?;
        let window = i64::from(window);
        let mut tick = delta / window;
        if delta < 0 && delta % window != 0 {
            tick -= 1;
        }

        i32::try_from(tick).map_err(|_| GatewayError::ArithmeticOverflow {
            context: "average tick",
        })
    }

    /// Latest feed answer, rejected when non-positive or older than `max_delay`.
    pub fn read_feed(&self, feed: &dyn PriceFeed, max_delay: u64) -> GatewayResult<FeedAnswer> {
        let answer = feed.latest_answer()?;

        if answer.value.is_negative() || answer.value.is_zero() {
            tracing::warn!(feed = %feed.feed_id(), answer = %answer.value, "Rejecting non-positive oracle answer");
            return Err(GatewayError::OracleAnswerNotPositive {
                feed: feed.feed_id(),
                answer: answer.value,
            });
        }

        let now = self.clock.now();
        if now.saturating_sub(answer.updated_at) > max_delay {
            tracing::warn!(
                feed = %feed.feed_id(),
                updated_at = answer.updated_at,
                now,
                max_delay,
                "Rejecting stale oracle answer"
            );
            return Err(GatewayError::OracleDataStale {
                feed: feed.feed_id(),
                updated_at: answer.updated_at,
                now,
                max_delay,
            });
        }

        Ok(answer)
    }

    /// ETH/USD on the 18-decimal scale.
    pub fn eth_usd(&self, max_delay: u64) -> GatewayResult<PriceQuote> {
        self.quote_feed(self.eth_usd.as_ref(), max_delay)
    }

    /// Stable asset USD price on the 18-decimal scale.
    pub fn stable_usd(&self, max_delay: u64) -> GatewayResult<PriceQuote> {
        self.quote_feed(self.stable_usd.as_ref(), max_delay)
    }

    /// Token USD price derived from the pool's average tick against wrapped ether.
    pub fn token_usd(
        &self,
        token: Address,
        token_decimals: u8,
        weth: Address,
        params: &OracleParams,
    ) -> GatewayResult<PriceQuote> {
        let tick = self.consult_average(params.averaging_window)?;
        let one_token = u128::try_from(math::pow10(token_decimals)).map_err(|_| {
            GatewayError::ArithmeticOverflow {
                context: "token unit",
            }
        })?;
        let weth_per_token = math::tick_to_amount(tick, one_token, token, weth)?;
        let eth_usd = self.eth_usd(params.max_delay)?;
        let value = math::mul_div(weth_per_token, eth_usd.value, SCALE)?;

        tracing::debug!(tick, weth_per_token = %weth_per_token, token_usd = %value, "Derived token price");

        Ok(PriceQuote {
            value,
            source: self.pool.pool_id(),
            observed_at: self.clock.now(),
        })
    }

    fn quote_feed(&self, feed: &dyn PriceFeed, max_delay: u64) -> GatewayResult<PriceQuote> {
        let answer = self.read_feed(feed, max_delay)?;
        Ok(PriceQuote {
            value: normalize(answer.value.into_raw(), answer.decimals)?,
            source: feed.feed_id(),
            observed_at: answer.updated_at,
        })
    }
}

/// Rescale a `decimals`-precision value to 18 decimals.
fn normalize(value: U256, decimals: u8) -> GatewayResult<U256> {
    match decimals.cmp(&18) {
        std::cmp::Ordering::Equal => Ok(value),
        std::cmp::Ordering::Less => value
            .checked_mul(math::pow10(18 - decimals))
            .ok_or(GatewayError::ArithmeticOverflow {
                context: "feed normalization",
            }),
        std::cmp::Ordering::Greater => Ok(value / math::pow10(decimals - 18)),
    }
}
