// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-caller monotonic nonce counters.

use alloy::primitives::Address;
use redb::{ReadableTable, TableDefinition, WriteTransaction};

use super::{Ledger, LedgerError, LedgerResult};

/// caller (20 bytes) → next unused nonce.
pub(crate) const NONCES: TableDefinition<&[u8], u64> = TableDefinition::new("nonces");

/// Current nonce of `caller` as seen by a committed read.
pub fn nonce_of(ledger: &Ledger, caller: Address) -> LedgerResult<u64> {
    let read_txn = ledger.begin_read()?;
    let table = read_txn.open_table(NONCES)?;
    let nonce = table.get(caller.as_slice())?.map(|v| v.value()).unwrap_or(0);
    Ok(nonce)
}

/// Current nonce of `caller` inside a write transaction.
pub(crate) fn current(txn: &WriteTransaction, caller: Address) -> LedgerResult<u64> {
    let table = txn.open_table(NONCES)?;
    let nonce = table.get(caller.as_slice())?.map(|v| v.value()).unwrap_or(0);
    Ok(nonce)
}

/// Consume `expected` for `caller`, moving the counter to `expected + 1`.
pub(crate) fn advance(txn: &WriteTransaction, caller: Address, expected: u64) -> LedgerResult<u64> {
    let mut table = txn.open_table(NONCES)?;
    let stored = table.get(caller.as_slice())?.map(|v| v.value()).unwrap_or(0);
    if stored != expected {
        return Err(LedgerError::Corrupt(format!(
            "nonce for {caller} moved from {expected} to {stored} inside a write transaction"
        )));
    }
    let next = expected
        .checked_add(1)
        .ok_or_else(|| LedgerError::Corrupt(format!("nonce for {caller} exhausted")))?;
    table.insert(caller.as_slice(), next)?;
    Ok(next)
}
