// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Set of addresses whose signatures authorize withdrawals.

use alloy::primitives::Address;
use redb::{ReadableTable, TableDefinition, WriteTransaction};

use super::{Ledger, LedgerError, LedgerResult};

/// signer → marker byte (always 1).
pub(crate) const TRUSTED_SIGNERS: TableDefinition<&[u8], u8> =
    TableDefinition::new("trusted_signers");

/// Membership check inside an open write transaction.
pub(crate) fn is_trusted(txn: &WriteTransaction, signer: Address) -> LedgerResult<bool> {
    let table = txn.open_table(TRUSTED_SIGNERS)?;
    let trusted = table.get(signer.as_slice())?.is_some();
    Ok(trusted)
}

pub fn is_trusted_signer(ledger: &Ledger, signer: Address) -> LedgerResult<bool> {
    let read_txn = ledger.begin_read()?;
    let table = read_txn.open_table(TRUSTED_SIGNERS)?;
    let trusted = table.get(signer.as_slice())?.is_some();
    Ok(trusted)
}

/// Add or remove `signer`. Returns whether membership changed.
pub(crate) fn set(txn: &WriteTransaction, signer: Address, trusted: bool) -> LedgerResult<bool> {
    let mut table = txn.open_table(TRUSTED_SIGNERS)?;
    let changed = if trusted {
        table.insert(signer.as_slice(), 1u8)?.is_none()
    } else {
        table.remove(signer.as_slice())?.is_some()
    };
    Ok(changed)
}

/// All trusted signers in address order.
pub fn list(ledger: &Ledger) -> LedgerResult<Vec<Address>> {
    let read_txn = ledger.begin_read()?;
    let table = read_txn.open_table(TRUSTED_SIGNERS)?;

    let mut signers = Vec::new();
    for item in table.iter()? {
        let (key, _) = item?;
        let bytes = key.value();
        if bytes.len() != 20 {
            return Err(LedgerError::Corrupt(format!(
                "trusted signer key has {} bytes",
                bytes.len()
            )));
        }
        signers.push(Address::from_slice(bytes));
    }
    Ok(signers)
}

/// Insert every signer in `signers` that is not already present.
///
/// Used once at startup; returns how many were newly added.
pub fn seed(ledger: &Ledger, signers: &[Address]) -> LedgerResult<usize> {
    let txn = ledger.begin_write()?;
    let mut added = 0;
    for signer in signers {
        if set(&txn, *signer, true)? {
            added += 1;
        }
    }
    txn.commit()?;
    if added > 0 {
        tracing::info!(added, "Seeded trusted signers");
    }
    Ok(added)
}
