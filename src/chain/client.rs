// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! RPC client shared by the EVM collaborators.

use std::future::IntoFuture;

use alloy::{
    network::EthereumWallet,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};
use tokio::runtime::Handle;

/// EVM connection plus the runtime used to drive it from blocking code.
///
/// The gateway's collaborator traits are synchronous. Adapters built on this
/// client must therefore be called from a blocking thread
/// (`tokio::task::spawn_blocking`), never from inside an async task.
#[derive(Clone)]
pub struct ChainClient {
    provider: DynProvider,
    runtime: Handle,
    chain_id: u64,
}

impl ChainClient {
    /// Connect to `rpc_url`, signing outgoing transactions with `operator`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(
        rpc_url: &str,
        chain_id: u64,
        operator: PrivateKeySigner,
    ) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
        let runtime = Handle::try_current().map_err(|e| ChainError::Runtime(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(operator))
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            runtime,
            chain_id,
        })
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Fail unless the node reports the configured chain id.
    pub async fn verify_chain_id(&self) -> Result<(), ChainError> {
        let reported = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        if reported != self.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.chain_id,
                reported,
            });
        }
        Ok(())
    }

    /// Drive `future` to completion from a blocking thread.
    pub(crate) fn block_on<F: IntoFuture>(&self, future: F) -> F::Output {
        self.runtime.block_on(future.into_future())
    }
}

/// Errors raised by external collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Chain id mismatch: expected {expected}, node reports {reported}")]
    ChainMismatch { expected: u64, reported: u64 },

    #[error("Async runtime unavailable: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_rejects_malformed_urls() {
        let signer = PrivateKeySigner::from_slice(&[0x11; 32]).unwrap();
        assert!(matches!(
            ChainClient::connect("not a url", 1, signer),
            Err(ChainError::InvalidRpcUrl(_))
        ));
    }

    /// Awaitable only through `IntoFuture`, like alloy's call builders.
    struct Deferred(u64);

    impl IntoFuture for Deferred {
        type Output = u64;
        type IntoFuture = std::future::Ready<u64>;

        fn into_future(self) -> Self::IntoFuture {
            std::future::ready(self.0)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn block_on_drives_into_future_values() {
        let signer = PrivateKeySigner::from_slice(&[0x11; 32]).unwrap();
        let client = ChainClient::connect("http://127.0.0.1:1", 43_113, signer).unwrap();
        let value = tokio::task::spawn_blocking(move || client.block_on(Deferred(7)))
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn connect_is_lazy() {
        let signer = PrivateKeySigner::from_slice(&[0x11; 32]).unwrap();
        let client = ChainClient::connect("http://127.0.0.1:1", 43_113, signer).unwrap();
        assert_eq!(client.chain_id(), 43_113);
    }
}
