// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 treasury transfers.

use alloy::{
    primitives::{Address, U256},
    sol,
};

use super::client::{ChainClient, ChainError};
use crate::gateway::orchestrator::TransferAgent;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }
}

/// Moves ERC-20 funds with the operator key.
///
/// When the source is the operator itself a plain `transfer` is sent;
/// otherwise `transferFrom` spends the allowance the source granted the
/// operator. Each call waits for the receipt and fails on a reverted
/// transaction.
pub struct Erc20Treasury {
    client: ChainClient,
    operator: Address,
}

impl Erc20Treasury {
    pub fn new(client: ChainClient, operator: Address) -> Self {
        Self { client, operator }
    }

    /// Balance of `holder` in `token`.
    pub async fn balance_of(&self, token: Address, holder: Address) -> Result<U256, ChainError> {
        let contract = IERC20::new(token, self.client.provider().clone());
        contract
            .balanceOf(holder)
            .call()
            .await
            .map_err(|e| ChainError::Contract(format!("{token} balanceOf(): {e}")))
    }

    /// Balance of `holder`, capped by its allowance to the operator unless
    /// the holder is the operator.
    pub async fn spendable_balance(&self, token: Address, holder: Address) -> Result<U256, ChainError> {
        let balance = self.balance_of(token, holder).await?;
        if holder == self.operator {
            return Ok(balance);
        }
        let contract = IERC20::new(token, self.client.provider().clone());
        let allowance = contract
            .allowance(holder, self.operator)
            .call()
            .await
            .map_err(|e| ChainError::Contract(format!("{token} allowance(): {e}")))?;
        Ok(balance.min(allowance))
    }

    async fn send(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let contract = IERC20::new(asset, self.client.provider().clone());
        let sent = if from == self.operator {
            contract.transfer(to, amount).send().await
        } else {
            contract.transferFrom(from, to, amount).send().await
        };
        let pending =
            sent.map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {e}")))?;

        let tx_hash = *pending.tx_hash();
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::Rpc(format!("Failed to get receipt for {tx_hash}: {e}")))?;
        if !receipt.status() {
            return Err(ChainError::TransactionFailed(format!("{tx_hash} reverted")));
        }

        tracing::info!(
            %asset,
            %from,
            %to,
            %amount,
            %tx_hash,
            block = receipt.block_number.unwrap_or(0),
            "Treasury transfer confirmed"
        );
        Ok(())
    }
}

impl TransferAgent for Erc20Treasury {
    fn spendable(&self, asset: Address, from: Address) -> Result<U256, ChainError> {
        self.client.block_on(self.spendable_balance(asset, from))
    }

    fn move_funds(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        self.client.block_on(self.send(asset, from, to, amount))
    }
}
