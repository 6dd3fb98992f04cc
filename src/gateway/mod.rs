// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Withdrawal Gateway
//!
//! Authorizes treasury withdrawals of two managed assets.
//!
//! ## Flow
//!
//! ```text
//! withdraw ─► validate ─► authorize (nonce) ─► quota ─► settle (transfers) ─► emit
//!                              │                 │                             │
//!                              └──────── one ledger write transaction ─────────┘
//! ```
//!
//! The write transaction is committed only after both transfers succeed, so
//! a failure anywhere leaves nonces, quota and the event log untouched.
//!
//! ## Fee model
//!
//! The fee charged by `withdraw` is the one signed into the request. The
//! signer obtains it from [`WithdrawalGateway::estimate_fee`]; the gateway
//! does not re-price it at execution time.

pub mod admin;
pub mod assets;
pub mod authorization;
pub mod clock;
pub mod error;
pub mod fees;
pub mod guard;
pub mod math;
pub mod oracle;
pub mod orchestrator;

use std::sync::Arc;

use alloy::primitives::Address;

pub use assets::{AssetInfo, AssetKind, AssetTable};
pub use authorization::{AuthorizationVerifier, WithdrawalRequest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{GatewayError, GatewayResult};
pub use fees::{FeeEngine, FeeQuote};
pub use oracle::{AveragingPool, PriceFeed, PriceOracleAdapter};
pub use orchestrator::{TransferAgent, WithdrawalReceipt};

use crate::ledger::{settings, Ledger, RuntimeSettings};
use guard::ReentrancyGuard;

/// Static deployment parameters.
#[derive(Debug, Clone)]
pub struct GatewayParams {
    pub chain_id: u64,
    /// Address bound into the signing domain.
    pub verifying_contract: Address,
    /// Sole actor allowed to run administrative operations.
    pub owner: Address,
    /// Source of withdrawn funds.
    pub treasury: Address,
    pub assets: AssetTable,
    pub weth: Address,
    pub markup_bps: u32,
    pub gas_overhead: u64,
}

/// External collaborators the gateway talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub eth_usd_feed: Arc<dyn PriceFeed>,
    pub stable_usd_feed: Arc<dyn PriceFeed>,
    pub pool: Arc<dyn AveragingPool>,
    pub transfers: Arc<dyn TransferAgent>,
    pub clock: Arc<dyn Clock>,
}

pub struct WithdrawalGateway {
    ledger: Arc<Ledger>,
    assets: AssetTable,
    verifier: AuthorizationVerifier,
    fees: FeeEngine,
    transfers: Arc<dyn TransferAgent>,
    clock: Arc<dyn Clock>,
    guard: ReentrancyGuard,
    owner: Address,
    treasury: Address,
}

impl WithdrawalGateway {
    /// Assemble a gateway over `ledger`.
    ///
    /// `initial` is persisted only if the ledger holds no settings yet.
    pub fn new(
        params: GatewayParams,
        collaborators: Collaborators,
        ledger: Arc<Ledger>,
        initial: &RuntimeSettings,
    ) -> GatewayResult<Self> {
        for (field, address) in [
            ("owner", params.owner),
            ("treasury", params.treasury),
            ("fee collector", initial.fee_collector),
        ] {
            if address.is_zero() {
                return Err(GatewayError::ZeroAddress { field });
            }
        }
        if initial.averaging_window_secs == 0 {
            return Err(GatewayError::WindowTooSmall);
        }
        if initial.max_oracle_delay_secs == 0 {
            return Err(GatewayError::ZeroSetting {
                setting: "max oracle delay",
            });
        }

        let effective = settings::seed_if_absent(&ledger, initial)?;
        let oracle = PriceOracleAdapter::new(
            collaborators.eth_usd_feed,
            collaborators.stable_usd_feed,
            collaborators.pool,
            collaborators.clock.clone(),
        );

        tracing::info!(
            chain_id = params.chain_id,
            verifying_contract = %params.verifying_contract,
            owner = %params.owner,
            treasury = %params.treasury,
            fee_collector = %effective.fee_collector,
            daily_limit = %effective.daily_limit,
            "Withdrawal gateway ready"
        );

        Ok(Self {
            ledger,
            assets: params.assets,
            verifier: AuthorizationVerifier::new(params.chain_id, params.verifying_contract),
            fees: FeeEngine::new(oracle, params.weth, params.markup_bps, params.gas_overhead),
            transfers: collaborators.transfers,
            clock: collaborators.clock,
            guard: ReentrancyGuard::default(),
            owner: params.owner,
            treasury: params.treasury,
        })
    }

    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    pub fn verifier(&self) -> &AuthorizationVerifier {
        &self.verifier
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn treasury(&self) -> Address {
        self.treasury
    }
}


#[cfg(test)]
mod tests {
    use alloy::primitives::U256;

    use super::testing::*;
    use super::*;
    use crate::chain::memory::InMemoryTreasury;

    #[test]
    fn construction_rejects_zero_addresses() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(Ledger::open(&dir.path().join("ledger.redb")).unwrap());
        let harness = harness();
        let collaborators = |treasury: Arc<InMemoryTreasury>| Collaborators {
            eth_usd_feed: harness.eth_feed.clone(),
            stable_usd_feed: harness.eth_feed.clone(),
            pool: Arc::new(crate::chain::memory::RecordedPool::new(Address::ZERO)),
            transfers: treasury,
            clock: harness.clock.clone(),
        };

        let mut bad = params();
        bad.owner = Address::ZERO;
        assert!(matches!(
            WithdrawalGateway::new(
                bad,
                collaborators(Arc::new(InMemoryTreasury::new(OPERATOR))),
                ledger.clone(),
                &initial_settings()
            ),
            Err(GatewayError::ZeroAddress { field: "owner" })
        ));

        let mut settings = initial_settings();
        settings.fee_collector = Address::ZERO;
        assert!(matches!(
            WithdrawalGateway::new(
                params(),
                collaborators(Arc::new(InMemoryTreasury::new(OPERATOR))),
                ledger,
                &settings
            ),
            Err(GatewayError::ZeroAddress {
                field: "fee collector"
            })
        ));
    }

    #[test]
    fn initial_settings_are_seeded() {
        let harness = harness();
        assert_eq!(harness.gateway.settings().unwrap(), initial_settings());
        assert_eq!(harness.gateway.owner(), OWNER);
        assert_eq!(harness.gateway.treasury(), TREASURY);
    }
}
