// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process collaborators.
//!
//! Deterministic stand-ins for the on-chain feed, pool and token contracts.
//! Their state is set directly by the embedder.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use alloy::primitives::{Address, I256, U256};

use super::client::ChainError;
use crate::gateway::oracle::{AveragingPool, FeedAnswer, PriceFeed};
use crate::gateway::orchestrator::TransferAgent;

fn signed(value: i128) -> I256 {
    let magnitude = I256::from_raw(U256::from(value.unsigned_abs()));
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

// =============================================================================
// StaticPriceFeed
// =============================================================================

/// Feed answering whatever was last set.
pub struct StaticPriceFeed {
    id: Address,
    answer: Mutex<FeedAnswer>,
}

impl StaticPriceFeed {
    pub fn new(id: Address, price: i128, decimals: u8, updated_at: u64) -> Self {
        Self {
            id,
            answer: Mutex::new(FeedAnswer {
                value: signed(price),
                updated_at,
                decimals,
            }),
        }
    }

    pub fn set(&self, price: i128, updated_at: u64) {
        let mut answer = self.answer.lock().unwrap_or_else(PoisonError::into_inner);
        answer.value = signed(price);
        answer.updated_at = updated_at;
    }
}

impl PriceFeed for StaticPriceFeed {
    fn feed_id(&self) -> Address {
        self.id
    }

    fn latest_answer(&self) -> Result<FeedAnswer, ChainError> {
        Ok(*self.answer.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// =============================================================================
// RecordedPool
// =============================================================================

/// Pool replaying recorded tick cumulatives.
///
/// Clones share the same recordings.
#[derive(Clone)]
pub struct RecordedPool {
    id: Address,
    observations: Arc<Mutex<HashMap<u32, i64>>>,
}

impl RecordedPool {
    pub fn new(id: Address) -> Self {
        Self {
            id,
            observations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Tick cumulative to report for `seconds_ago`.
    pub fn record(&self, seconds_ago: u32, cumulative: i64) {
        self.observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(seconds_ago, cumulative);
    }
}

impl AveragingPool for RecordedPool {
    fn pool_id(&self) -> Address {
        self.id
    }

    fn observe(&self, seconds_agos: &[u32]) -> Result<Vec<i64>, ChainError> {
        let observations = self
            .observations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        seconds_agos
            .iter()
            .map(|ago| {
                observations.get(ago).copied().ok_or_else(|| {
                    ChainError::Contract(format!("{} has no observation {ago}s ago", self.id))
                })
            })
            .collect()
    }
}

// =============================================================================
// InMemoryTreasury
// =============================================================================

/// A completed in-memory transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub asset: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

#[derive(Default)]
struct TreasuryState {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    transfers: Vec<Transfer>,
}

/// Token balances and allowances with ERC-20 transfer semantics.
///
/// `operator` plays the caller of the token contract: moving its own
/// funds needs no allowance, moving anyone else's spends the allowance
/// granted to it.
pub struct InMemoryTreasury {
    operator: Address,
    state: Mutex<TreasuryState>,
}

impl InMemoryTreasury {
    pub fn new(operator: Address) -> Self {
        Self {
            operator,
            state: Mutex::new(TreasuryState::default()),
        }
    }

    pub fn mint(&self, asset: Address, holder: Address, amount: U256) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let balance = state.balances.entry((asset, holder)).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn approve(&self, asset: Address, owner: Address, amount: U256) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .allowances
            .insert((asset, owner, self.operator), amount);
    }

    pub fn balance_of(&self, asset: Address, holder: Address) -> U256 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .balances
            .get(&(asset, holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, asset: Address, owner: Address) -> U256 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .allowances
            .get(&(asset, owner, self.operator))
            .copied()
            .unwrap_or_default()
    }

    /// Transfers executed so far, oldest first.
    pub fn transfers(&self) -> Vec<Transfer> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.transfers.clone()
    }
}

impl TransferAgent for InMemoryTreasury {
    fn spendable(&self, asset: Address, from: Address) -> Result<U256, ChainError> {
        let balance = self.balance_of(asset, from);
        if from == self.operator {
            return Ok(balance);
        }
        Ok(balance.min(self.allowance(asset, from)))
    }

    fn move_funds(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let available = state
            .balances
            .get(&(asset, from))
            .copied()
            .unwrap_or_default();
        if available < amount {
            return Err(ChainError::InsufficientFunds(format!(
                "{from} holds {available} of {asset}, needs {amount}"
            )));
        }

        if from != self.operator {
            let key = (asset, from, self.operator);
            let allowed = state.allowances.get(&key).copied().unwrap_or_default();
            if allowed < amount {
                return Err(ChainError::InsufficientFunds(format!(
                    "{from} allows {allowed} of {asset} to {}, needs {amount}",
                    self.operator
                )));
            }
            state.allowances.insert(key, allowed - amount);
        }

        state.balances.insert((asset, from), available - amount);
        let credited = state.balances.entry((asset, to)).or_default();
        *credited = credited.saturating_add(amount);
        state.transfers.push(Transfer {
            asset,
            from,
            to,
            amount,
        });
        Ok(())
    }
}
