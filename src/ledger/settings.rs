// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Owner-adjustable runtime settings.

use alloy::primitives::{Address, U256};
use redb::{ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerError, LedgerResult};

/// key → JSON value.
pub(crate) const SETTINGS: TableDefinition<&str, &[u8]> = TableDefinition::new("settings");

const RUNTIME_KEY: &str = "runtime";

/// Settings the owner can change while the gateway is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    /// Receives the fee part of every withdrawal.
    pub fee_collector: Address,
    /// Maximum age of a feed answer before it is treated as stale.
    pub max_oracle_delay_secs: u64,
    /// TWAP window for the token pool.
    pub averaging_window_secs: u32,
    /// Per-user daily cap for the quota-controlled asset.
    pub daily_limit: U256,
}

/// Current settings inside an open write transaction.
pub(crate) fn load_in(txn: &WriteTransaction) -> LedgerResult<RuntimeSettings> {
    let table = txn.open_table(SETTINGS)?;
    let bytes = table
        .get(RUNTIME_KEY)?
        .map(|v| v.value().to_vec())
        .ok_or_else(|| LedgerError::Corrupt("runtime settings missing".into()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn load(ledger: &Ledger) -> LedgerResult<RuntimeSettings> {
    let read_txn = ledger.begin_read()?;
    let table = read_txn.open_table(SETTINGS)?;
    let bytes = table
        .get(RUNTIME_KEY)?
        .map(|v| v.value().to_vec())
        .ok_or_else(|| LedgerError::Corrupt("runtime settings missing".into()))?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) fn store(txn: &WriteTransaction, settings: &RuntimeSettings) -> LedgerResult<()> {
    let json = serde_json::to_vec(settings)?;
    let mut table = txn.open_table(SETTINGS)?;
    table.insert(RUNTIME_KEY, json.as_slice())?;
    Ok(())
}

/// Write `initial` unless settings were already persisted.
///
/// Returns the settings now in effect. Values changed at runtime survive
/// restarts; configuration only applies to a fresh ledger.
pub fn seed_if_absent(ledger: &Ledger, initial: &RuntimeSettings) -> LedgerResult<RuntimeSettings> {
    let txn = ledger.begin_write()?;
    let present = {
        let table = txn.open_table(SETTINGS)?;
        let present = table.get(RUNTIME_KEY)?.is_some();
        present
    };
    let effective = if present {
        load_in(&txn)?
    } else {
        store(&txn, initial)?;
        tracing::info!("Seeded runtime settings");
        *initial
    };
    txn.commit()?;
    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::temp_ledger;

    fn sample() -> RuntimeSettings {
        RuntimeSettings {
            fee_collector: Address::repeat_byte(0xfe),
            max_oracle_delay_secs: 3_600,
            averaging_window_secs: 1_800,
            daily_limit: U256::from(1_000_000u64),
        }
    }

    #[test]
    fn missing_settings_are_reported() {
        let (ledger, _dir) = temp_ledger();
        assert!(matches!(load(&ledger), Err(LedgerError::Corrupt(_))));
    }

    #[test]
    fn seed_keeps_existing_values() {
        let (ledger, _dir) = temp_ledger();
        assert_eq!(seed_if_absent(&ledger, &sample()).unwrap(), sample());

        let txn = ledger.begin_write().unwrap();
        let mut changed = load_in(&txn).unwrap();
        changed.averaging_window_secs = 600;
        store(&txn, &changed).unwrap();
        txn.commit().unwrap();

        let effective = seed_if_absent(&ledger, &sample()).unwrap();
        assert_eq!(effective.averaging_window_secs, 600);
        assert_eq!(load(&ledger).unwrap(), effective);
    }
}
