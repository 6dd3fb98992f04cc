// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-only configuration changes.
//!
//! Each change is written together with its `AdminChange` event in one
//! ledger transaction.

use alloy::primitives::{Address, U256};
use redb::WriteTransaction;

use super::error::{GatewayError, GatewayResult};
use super::WithdrawalGateway;
use crate::ledger::{events, settings, signers, AdminChange, EventKind, LedgerError, RuntimeSettings};

impl WithdrawalGateway {
    /// Add or remove a trusted signer. Returns whether membership changed.
    pub fn set_trusted_signer(&self, actor: Address, signer: Address, trusted: bool) -> GatewayResult<bool> {
        if signer.is_zero() {
            return Err(GatewayError::ZeroAddress { field: "signer" });
        }
        let change = self.apply(actor, |txn| {
            if !signers::set(txn, signer, trusted)? {
                return Ok(None);
            }
            Ok(Some(if trusted {
                AdminChange::TrustedSignerAdded { signer }
            } else {
                AdminChange::TrustedSignerRemoved { signer }
            }))
        })?;
        Ok(change.is_some())
    }

    pub fn set_fee_collector(&self, actor: Address, collector: Address) -> GatewayResult<()> {
        if collector.is_zero() {
            return Err(GatewayError::ZeroAddress {
                field: "fee collector",
            });
        }
        self.update_settings(actor, |settings| {
            let previous = std::mem::replace(&mut settings.fee_collector, collector);
            AdminChange::FeeCollectorUpdated {
                previous,
                current: collector,
            }
        })
    }

    pub fn set_max_oracle_delay(&self, actor: Address, seconds: u64) -> GatewayResult<()> {
        if seconds == 0 {
            return Err(GatewayError::ZeroSetting {
                setting: "max oracle delay",
            });
        }
        self.update_settings(actor, |settings| {
            let previous = std::mem::replace(&mut settings.max_oracle_delay_secs, seconds);
            AdminChange::MaxOracleDelayUpdated {
                previous,
                current: seconds,
            }
        })
    }

    pub fn set_averaging_window(&self, actor: Address, seconds: u32) -> GatewayResult<()> {
        if seconds == 0 {
            return Err(GatewayError::WindowTooSmall);
        }
        self.update_settings(actor, |settings| {
            let previous = std::mem::replace(&mut settings.averaging_window_secs, seconds);
            AdminChange::AveragingWindowUpdated {
                previous,
                current: seconds,
            }
        })
    }

    pub fn set_daily_limit(&self, actor: Address, limit: U256) -> GatewayResult<()> {
        self.update_settings(actor, |settings| {
            let previous = std::mem::replace(&mut settings.daily_limit, limit);
            AdminChange::DailyLimitUpdated {
                previous,
                current: limit,
            }
        })
    }

    fn update_settings<F>(&self, actor: Address, update: F) -> GatewayResult<()>
    where
        F: FnOnce(&mut RuntimeSettings) -> AdminChange,
    {
        self.apply(actor, |txn| {
            let mut current = settings::load_in(txn)?;
            let change = update(&mut current);
            settings::store(txn, &current)?;
            Ok(Some(change))
        })?;
        Ok(())
    }

    /// Run `mutate` as `actor` and record the change it reports, if any.
    fn apply<F>(&self, actor: Address, mutate: F) -> GatewayResult<Option<AdminChange>>
    where
        F: FnOnce(&WriteTransaction) -> Result<Option<AdminChange>, LedgerError>,
    {
        if actor != self.owner {
            tracing::warn!(%actor, "Rejected administrative change from non-owner");
            return Err(GatewayError::Unauthorized { actor });
        }

        let txn = self.ledger.begin_write()?;
        let Some(change) = mutate(&txn)? else {
            return Ok(None);
        };
        let event = events::append(&txn, EventKind::Admin(change.clone()))?;
        txn.commit().map_err(LedgerError::from)?;

        tracing::info!(%actor, sequence = event.sequence, change = ?change, "Administrative change applied");
        Ok(Some(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::*;

    #[test]
    fn only_the_owner_may_administer() {
        let h = harness();
        let stranger = Address::repeat_byte(0x66);
        assert!(matches!(
            h.gateway.set_daily_limit(stranger, U256::ZERO),
            Err(GatewayError::Unauthorized { actor }) if actor == stranger
        ));
        assert!(matches!(
            h.gateway.set_trusted_signer(stranger, stranger, true),
            Err(GatewayError::Unauthorized { .. })
        ));
        assert_eq!(h.gateway.settings().unwrap(), initial_settings());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let h = harness();
        assert!(matches!(
            h.gateway.set_fee_collector(OWNER, Address::ZERO),
            Err(GatewayError::ZeroAddress { .. })
        ));
        assert!(matches!(
            h.gateway.set_averaging_window(OWNER, 0),
            Err(GatewayError::WindowTooSmall)
        ));
        assert!(matches!(
            h.gateway.set_max_oracle_delay(OWNER, 0),
            Err(GatewayError::ZeroSetting { .. })
        ));
        assert!(matches!(
            h.gateway.set_trusted_signer(OWNER, Address::ZERO, true),
            Err(GatewayError::ZeroAddress { field: "signer" })
        ));
    }

    #[test]
    fn changes_are_persisted_and_recorded() {
        let h = harness();
        let collector = Address::repeat_byte(0xc0);
        h.gateway.set_fee_collector(OWNER, collector).unwrap();
        h.gateway.set_averaging_window(OWNER, 600).unwrap();
        h.gateway.set_max_oracle_delay(OWNER, 120).unwrap();

        let settings = h.gateway.settings().unwrap();
        assert_eq!(settings.fee_collector, collector);
        assert_eq!(settings.averaging_window_secs, 600);
        assert_eq!(settings.max_oracle_delay_secs, 120);

        let events = h.gateway.events(0, 10).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0].kind,
            EventKind::Admin(AdminChange::FeeCollectorUpdated {
                previous: COLLECTOR,
                current: collector,
            })
        );
    }

    #[test]
    fn fee_collector_change_redirects_fees() {
        let h = harness();
        let collector = Address::repeat_byte(0xc0);
        h.gateway.set_fee_collector(OWNER, collector).unwrap();
        h.gateway.withdraw(&h.request(STABLE, 1_000, 7)).unwrap();
        assert_eq!(h.treasury.balance_of(STABLE, collector), U256::from(7u64));
    }

    #[test]
    fn removing_a_signer_invalidates_its_pending_signatures() {
        let h = harness();
        let request = h.request(TOKEN, 1_000, 0);
        assert!(h
            .gateway
            .set_trusted_signer(OWNER, h.signer.address(), false)
            .unwrap());
        assert!(!h
            .gateway
            .set_trusted_signer(OWNER, h.signer.address(), false)
            .unwrap());

        assert!(matches!(
            h.gateway.withdraw(&request),
            Err(GatewayError::InvalidSigner { .. })
        ));
        assert!(h.gateway.trusted_signers().unwrap().is_empty());
        // Only the effective removal was recorded.
        assert_eq!(h.gateway.events(0, 10).unwrap().len(), 1);
    }

    #[test]
    fn lowering_the_limit_applies_to_the_next_withdrawal() {
        let h = harness();
        h.gateway.set_daily_limit(OWNER, U256::from(500u64)).unwrap();
        assert!(matches!(
            h.gateway.withdraw(&h.request(TOKEN, 501, 0)),
            Err(GatewayError::DailyLimitExceeded { .. })
        ));
        assert!(h.gateway.withdraw(&h.request(TOKEN, 500, 0)).is_ok());
    }
}
