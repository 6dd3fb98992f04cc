// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! On-chain price sources: aggregator feeds and the averaging pool.

use alloy::{
    primitives::{aliases::I56, Address},
    providers::DynProvider,
    sol,
};

use super::client::{ChainClient, ChainError};
use crate::gateway::oracle::{AveragingPool, FeedAnswer, PriceFeed};

sol! {
    #[sol(rpc)]
    interface IAggregatorV3 {
        function decimals() external view returns (uint8);
        function latestRoundData()
            external
            view
            returns (
                uint80 roundId,
                int256 answer,
                uint256 startedAt,
                uint256 updatedAt,
                uint80 answeredInRound
            );
    }

    #[sol(rpc)]
    interface IUniswapV3PoolOracle {
        function observe(uint32[] calldata secondsAgos)
            external
            view
            returns (int56[] memory tickCumulatives, uint160[] memory secondsPerLiquidityCumulativeX128s);
    }
}

/// Push-style USD feed read through `latestRoundData`.
pub struct AggregatorFeed {
    client: ChainClient,
    contract: IAggregatorV3::IAggregatorV3Instance<DynProvider>,
    address: Address,
    decimals: u8,
}

impl AggregatorFeed {
    /// Bind to the feed at `address`, reading its decimals once.
    pub async fn connect(client: ChainClient, address: Address) -> Result<Self, ChainError> {
        let contract = IAggregatorV3::new(address, client.provider().clone());
        let decimals = contract
            .decimals()
            .call()
            .await
            .map_err(|e| ChainError::Contract(format!("{address} decimals(): {e}")))?;

        tracing::info!(feed = %address, decimals, "Bound price feed");
        Ok(Self {
            client,
            contract,
            address,
            decimals,
        })
    }
}

impl PriceFeed for AggregatorFeed {
    fn feed_id(&self) -> Address {
        self.address
    }

    fn latest_answer(&self) -> Result<FeedAnswer, ChainError> {
        let round = self
            .client
            .block_on(self.contract.latestRoundData().call())
            .map_err(|e| ChainError::Contract(format!("{} latestRoundData(): {e}", self.address)))?;
        let updated_at = u64::try_from(round.updatedAt).map_err(|_| {
            ChainError::Contract(format!(
                "{} reported updatedAt {} beyond u64",
                self.address, round.updatedAt
            ))
        })?;

        Ok(FeedAnswer {
            value: round.answer,
            updated_at,
            decimals: self.decimals,
        })
    }
}

/// Concentrated-liquidity pool exposing `observe`.
pub struct UniswapPool {
    client: ChainClient,
    contract: IUniswapV3PoolOracle::IUniswapV3PoolOracleInstance<DynProvider>,
    address: Address,
}

impl UniswapPool {
    pub fn new(client: ChainClient, address: Address) -> Self {
        let contract = IUniswapV3PoolOracle::new(address, client.provider().clone());
        Self {
            client,
            contract,
            address,
        }
    }
}

impl AveragingPool for UniswapPool {
    fn pool_id(&self) -> Address {
        self.address
    }

    fn observe(&self, seconds_agos: &[u32]) -> Result<Vec<i64>, ChainError> {
        let observation = self
            .client
            .block_on(self.contract.observe(seconds_agos.to_vec()).call())
            .map_err(|e| ChainError::Contract(format!("{} observe(): {e}", self.address)))?;
        Ok(widen_cumulatives(observation.tickCumulatives))
    }
}

/// `int56` tick cumulatives always fit an `i64`.
fn widen_cumulatives(cumulatives: Vec<I56>) -> Vec<i64> {
    cumulatives
        .into_iter()
        .map(|cumulative| cumulative.as_i64())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulatives_keep_their_sign() {
        let wire = vec![
            I56::try_from(-310i64).unwrap(),
            I56::ZERO,
            I56::try_from(36_028_797_018_963_967i64).unwrap(),
        ];
        assert_eq!(
            widen_cumulatives(wire),
            vec![-310, 0, 36_028_797_018_963_967]
        );
    }
}
