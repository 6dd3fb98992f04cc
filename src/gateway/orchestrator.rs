// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The withdrawal operation and the gateway's read surface.

use alloy::primitives::{Address, U256};

use super::clock::day_id;
use super::error::{GatewayError, GatewayResult};
use super::fees::FeeQuote;
use super::oracle::OracleParams;
use super::{WithdrawalGateway, WithdrawalRequest};
use crate::chain::ChainError;
use crate::ledger::{
    events, nonces, settings, signers, DailyUsage, EventKind, GatewayEvent, LedgerError,
    QuotaLedger, RuntimeSettings, UsageEntry, WithdrawalRecord,
};

/// Moves funds between accounts of a managed asset.
///
/// Implementations must be all-or-nothing per call: a failed move leaves
/// both balances untouched.
pub trait TransferAgent: Send + Sync {
    /// Largest amount of `asset` this agent can currently move out of `from`:
    /// the balance, capped by the allowance when one is needed.
    fn spendable(&self, asset: Address, from: Address) -> Result<U256, ChainError>;

    fn move_funds(
        &self,
        asset: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError>;
}

/// Outcome of a successful withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    /// Amount delivered to the recipient.
    pub net: U256,
    /// Amount delivered to the fee collector.
    pub fee: U256,
    /// Nonce consumed by this withdrawal.
    pub nonce: u64,
    /// Sequence of the emitted withdrawal event.
    pub event_sequence: u64,
}

impl WithdrawalGateway {
    /// Execute one signed withdrawal.
    ///
    /// Either every effect lands (nonce consumed, quota charged, both
    /// transfers made, event recorded) or none of the ledger effects do.
    /// The one exception is a fee transfer failing after the recipient was
    /// paid: the nonce and quota are then committed with a
    /// [`EventKind::FeeUnsettled`] record and [`GatewayError::FeeUnsettled`]
    /// is returned, so the signature cannot pay out twice.
    pub fn withdraw(&self, request: &WithdrawalRequest) -> GatewayResult<WithdrawalReceipt> {
        let _entered = self.guard.enter()?;

        match self.execute(request) {
            Ok(receipt) => {
                tracing::info!(
                    caller = %request.caller,
                    recipient = %request.recipient,
                    asset = %request.asset,
                    gross = %request.amount,
                    net = %receipt.net,
                    fee = %receipt.fee,
                    nonce = receipt.nonce,
                    "Withdrawal executed"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(
                    caller = %request.caller,
                    asset = %request.asset,
                    amount = %request.amount,
                    error = %e,
                    code = e.error_code(),
                    "Withdrawal rejected"
                );
                Err(e)
            }
        }
    }

    fn execute(&self, request: &WithdrawalRequest) -> GatewayResult<WithdrawalReceipt> {
        let now = self.clock.now();

        // Validate
        if request.recipient.is_zero() {
            return Err(GatewayError::ZeroRecipient);
        }
        if request.amount.is_zero() {
            return Err(GatewayError::ZeroAmount);
        }
        let asset = *self
            .assets
            .lookup(&request.asset)
            .ok_or(GatewayError::UnsupportedAsset {
                asset: request.asset,
            })?;

        // Every ledger write below is staged here; dropping `txn` on an
        // early return discards all of them.
        let txn = self.ledger.begin_write()?;
        let settings = settings::load_in(&txn)?;

        // Authorize
        let nonce = self.verifier.verify(&txn, request, now)?;

        // Quota
        QuotaLedger::enforce(
            &txn,
            &asset,
            request.caller,
            request.amount,
            now,
            settings.daily_limit,
        )?;

        // Settle
        if request.fee >= request.amount {
            return Err(GatewayError::FeeTooLarge {
                fee: request.fee,
                amount: request.amount,
            });
        }
        let net = request.amount - request.fee;
        let record = WithdrawalRecord {
            caller: request.caller,
            recipient: request.recipient,
            asset: asset.address,
            gross: request.amount,
            net,
            fee: request.fee,
            nonce,
        };

        // Both legs must be covered before the first one is sent.
        let spendable = self.transfers.spendable(asset.address, self.treasury)?;
        if spendable < request.amount {
            return Err(ChainError::InsufficientFunds(format!(
                "treasury can move {spendable} of {}, withdrawal needs {}",
                asset.address, request.amount
            ))
            .into());
        }

        self.transfers
            .move_funds(asset.address, self.treasury, request.recipient, net)?;
        if !request.fee.is_zero() {
            if let Err(reason) = self.transfers.move_funds(
                asset.address,
                self.treasury,
                settings.fee_collector,
                request.fee,
            ) {
                return Err(self.record_unsettled_fee(txn, record, reason));
            }
        }

        // Emit
        let event = events::append(&txn, EventKind::Withdrawal(record))?;

        txn.commit().map_err(|e| {
            tracing::error!(
                caller = %request.caller,
                nonce,
                error = %e,
                "Ledger commit failed after transfers were made"
            );
            LedgerError::from(e)
        })?;

        Ok(WithdrawalReceipt {
            net,
            fee: request.fee,
            nonce,
            event_sequence: event.sequence,
        })
    }

    /// The recipient has been paid, so the nonce and quota charge staged in
    /// `txn` are committed along with a record of the missing fee.
    fn record_unsettled_fee(
        &self,
        txn: redb::WriteTransaction,
        withdrawal: WithdrawalRecord,
        reason: ChainError,
    ) -> GatewayError {
        tracing::error!(
            caller = %withdrawal.caller,
            asset = %withdrawal.asset,
            fee = %withdrawal.fee,
            nonce = withdrawal.nonce,
            error = %reason,
            "Fee transfer failed after the recipient was paid"
        );

        let nonce = withdrawal.nonce;
        let fee = withdrawal.fee;
        let committed = events::append(
            &txn,
            EventKind::FeeUnsettled {
                withdrawal,
                reason: reason.to_string(),
            },
        )
        .and_then(|_| txn.commit().map_err(LedgerError::from));

        match committed {
            Ok(()) => GatewayError::FeeUnsettled { nonce, fee, reason },
            Err(e) => {
                tracing::error!(nonce, error = %e, "Failed to record unsettled fee");
                e.into()
            }
        }
    }

    /// Advisory fee for a withdrawal of `asset` costing `gas_units` at `gas_price`.
    pub fn estimate_fee(
        &self,
        asset: Address,
        gas_units: u64,
        gas_price: U256,
    ) -> GatewayResult<FeeQuote> {
        let info = *self
            .assets
            .lookup(&asset)
            .ok_or(GatewayError::UnsupportedAsset { asset })?;
        let params = self.oracle_params()?;
        self.fees.quote_fee(&info, gas_units, gas_price, &params)
    }

    pub fn current_day_id(&self) -> u64 {
        day_id(self.clock.now())
    }

    pub fn daily_usage_total(&self, user: Address, day: u64) -> GatewayResult<U256> {
        Ok(QuotaLedger::new(&self.ledger).total(user, day)?)
    }

    pub fn daily_usage_count(&self, user: Address, day: u64) -> GatewayResult<u64> {
        Ok(QuotaLedger::new(&self.ledger).count(user, day)?)
    }

    pub fn daily_usage_entry(&self, user: Address, day: u64, index: u64) -> GatewayResult<UsageEntry> {
        QuotaLedger::new(&self.ledger).entry(user, day, index)
    }

    pub fn daily_usage_entries(&self, user: Address, day: u64) -> GatewayResult<Vec<UsageEntry>> {
        Ok(QuotaLedger::new(&self.ledger).entries(user, day)?)
    }

    pub fn daily_usage(&self, user: Address, day: u64) -> GatewayResult<DailyUsage> {
        Ok(QuotaLedger::new(&self.ledger).usage(user, day)?)
    }

    pub fn nonce_of(&self, caller: Address) -> GatewayResult<u64> {
        Ok(nonces::nonce_of(&self.ledger, caller)?)
    }

    pub fn events(&self, from: u64, limit: usize) -> GatewayResult<Vec<GatewayEvent>> {
        Ok(events::list(&self.ledger, from, limit)?)
    }

    pub fn settings(&self) -> GatewayResult<RuntimeSettings> {
        Ok(settings::load(&self.ledger)?)
    }

    pub fn trusted_signers(&self) -> GatewayResult<Vec<Address>> {
        Ok(signers::list(&self.ledger)?)
    }

    pub fn is_trusted_signer(&self, signer: Address) -> GatewayResult<bool> {
        Ok(signers::is_trusted_signer(&self.ledger, signer)?)
    }

    fn oracle_params(&self) -> GatewayResult<OracleParams> {
        let settings = self.settings()?;
        Ok(OracleParams {
            averaging_window: settings.averaging_window_secs,
            max_delay: settings.max_oracle_delay_secs,
        })
    }
}
