// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Append-only event log: withdrawal records and administrative changes.

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use redb::{ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Ledger, LedgerResult};

/// sequence → JSON `GatewayEvent`.
pub(crate) const EVENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("events");

/// Largest page returned by [`list`].
pub const MAX_PAGE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    pub event_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Withdrawal(WithdrawalRecord),
    /// The net leg landed, the fee leg did not.
    FeeUnsettled {
        withdrawal: WithdrawalRecord,
        reason: String,
    },
    Admin(AdminChange),
}

/// A completed withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRecord {
    pub caller: Address,
    pub recipient: Address,
    pub asset: Address,
    pub gross: U256,
    pub net: U256,
    pub fee: U256,
    pub nonce: u64,
}

/// A privileged configuration change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum AdminChange {
    TrustedSignerAdded { signer: Address },
    TrustedSignerRemoved { signer: Address },
    FeeCollectorUpdated { previous: Address, current: Address },
    MaxOracleDelayUpdated { previous: u64, current: u64 },
    AveragingWindowUpdated { previous: u32, current: u32 },
    DailyLimitUpdated { previous: U256, current: U256 },
}

/// Append `kind` to the log inside `txn`. Returns the stored event.
pub(crate) fn append(txn: &WriteTransaction, kind: EventKind) -> LedgerResult<GatewayEvent> {
    let mut table = txn.open_table(EVENTS)?;
    let sequence = {
        let last = table.last()?.map(|(key, _)| key.value());
        last.map_or(0, |seq| seq + 1)
    };

    let event = GatewayEvent {
        sequence,
        event_id: Uuid::new_v4(),
        recorded_at: Utc::now(),
        kind,
    };
    let json = serde_json::to_vec(&event)?;
    table.insert(sequence, json.as_slice())?;
    Ok(event)
}

/// Up to `limit` events starting at sequence `from`, oldest first.
pub fn list(ledger: &Ledger, from: u64, limit: usize) -> LedgerResult<Vec<GatewayEvent>> {
    let read_txn = ledger.begin_read()?;
    let table = read_txn.open_table(EVENTS)?;

    let mut events = Vec::new();
    for item in table.range(from..)?.take(limit.min(MAX_PAGE)) {
        let (_, value) = item?;
        events.push(serde_json::from_slice(value.value())?);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::temp_ledger;

    fn admin(signer: u8) -> EventKind {
        EventKind::Admin(AdminChange::TrustedSignerAdded {
            signer: Address::repeat_byte(signer),
        })
    }

    #[test]
    fn sequences_are_contiguous_and_pages_are_ordered() {
        let (ledger, _dir) = temp_ledger();
        let txn = ledger.begin_write().unwrap();
        for i in 0..5u8 {
            assert_eq!(append(&txn, admin(i)).unwrap().sequence, u64::from(i));
        }
        txn.commit().unwrap();

        let page = list(&ledger, 2, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sequence, 2);
        assert_eq!(page[1].kind, admin(3));
        assert!(list(&ledger, 5, 10).unwrap().is_empty());
    }

    #[test]
    fn events_survive_json_encoding() {
        let (ledger, _dir) = temp_ledger();
        let record = WithdrawalRecord {
            caller: Address::repeat_byte(0xca),
            recipient: Address::repeat_byte(0xde),
            asset: Address::repeat_byte(0x01),
            gross: U256::from(1_000u64),
            net: U256::from(990u64),
            fee: U256::from(10u64),
            nonce: 7,
        };
        let txn = ledger.begin_write().unwrap();
        let stored = append(&txn, EventKind::Withdrawal(record.clone())).unwrap();
        txn.commit().unwrap();

        let loaded = list(&ledger, 0, 1).unwrap();
        assert_eq!(loaded, vec![stored]);
        assert_eq!(loaded[0].kind, EventKind::Withdrawal(record));
    }
}
