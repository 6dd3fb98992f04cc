// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-user, per-day usage accounting for the quota-controlled asset.
//!
//! One keyed store indexed by `(user, day)` holds the running total and
//! entry count; entries live in a second table under `(user, day, index)`
//! and are never rewritten once appended.

use alloy::primitives::{Address, U256};
use redb::{ReadableTable, TableDefinition, WriteTransaction};
use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerError, LedgerResult};
use crate::gateway::assets::AssetInfo;
use crate::gateway::clock::day_id;
use crate::gateway::error::{GatewayError, GatewayResult};

/// user|day → total (32 bytes BE) + entry count (8 bytes BE).
pub(crate) const DAILY_USAGE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("daily_usage");

/// user|day|index → JSON `UsageEntry`.
pub(crate) const DAILY_ENTRIES: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("daily_entries");

/// One recorded withdrawal against the daily quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEntry {
    pub timestamp: u64,
    pub amount: U256,
}

/// Snapshot of one user's usage for one day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DailyUsage {
    pub total: U256,
    pub entries: Vec<UsageEntry>,
}

#[derive(Debug, Clone, Copy, Default)]
struct UsageHeader {
    total: U256,
    count: u64,
}

impl UsageHeader {
    fn encode(&self) -> [u8; 40] {
        let mut bytes = [0u8; 40];
        bytes[..32].copy_from_slice(&self.total.to_be_bytes::<32>());
        bytes[32..].copy_from_slice(&self.count.to_be_bytes());
        bytes
    }

    fn decode(bytes: &[u8]) -> LedgerResult<Self> {
        if bytes.len() != 40 {
            return Err(LedgerError::Corrupt(format!(
                "usage header has {} bytes, expected 40",
                bytes.len()
            )));
        }
        let total = U256::from_be_slice(&bytes[..32]);
        let mut count = [0u8; 8];
        count.copy_from_slice(&bytes[32..]);
        Ok(Self {
            total,
            count: u64::from_be_bytes(count),
        })
    }
}

// =============================================================================
// Key Helpers
// =============================================================================

fn usage_key(user: Address, day: u64) -> [u8; 28] {
    let mut key = [0u8; 28];
    key[..20].copy_from_slice(user.as_slice());
    key[20..].copy_from_slice(&day.to_be_bytes());
    key
}

fn entry_key(user: Address, day: u64, index: u64) -> [u8; 36] {
    let mut key = [0u8; 36];
    key[..28].copy_from_slice(&usage_key(user, day));
    key[28..].copy_from_slice(&index.to_be_bytes());
    key
}

// =============================================================================
// QuotaLedger
// =============================================================================

/// Read access to daily usage plus the in-transaction `enforce` step.
pub struct QuotaLedger<'a> {
    ledger: &'a Ledger,
}

impl<'a> QuotaLedger<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    /// Charge `amount` against `user`'s quota for the day containing `now`.
    ///
    /// No-op for assets without a quota. Returns the new daily total when a
    /// charge was recorded.
    pub fn enforce(
        txn: &WriteTransaction,
        asset: &AssetInfo,
        user: Address,
        amount: U256,
        now: u64,
        limit: U256,
    ) -> GatewayResult<Option<U256>> {
        if !asset.quota_controlled {
            return Ok(None);
        }

        let day = day_id(now);
        let header = read_header_in(txn, user, day)?;
        let attempted = header
            .total
            .checked_add(amount)
            .ok_or(GatewayError::ArithmeticOverflow {
                context: "daily usage total",
            })?;
        if attempted > limit {
            return Err(GatewayError::DailyLimitExceeded {
                user,
                attempted,
                limit,
            });
        }

        append_in(
            txn,
            user,
            day,
            header,
            UsageEntry {
                timestamp: now,
                amount,
            },
        )?;
        Ok(Some(attempted))
    }

    pub fn total(&self, user: Address, day: u64) -> LedgerResult<U256> {
        Ok(self.header(user, day)?.total)
    }

    pub fn count(&self, user: Address, day: u64) -> LedgerResult<u64> {
        Ok(self.header(user, day)?.count)
    }

    /// Entry `index` of `user`'s usage on `day`.
    pub fn entry(&self, user: Address, day: u64, index: u64) -> GatewayResult<UsageEntry> {
        let count = self.count(user, day)?;
        if index >= count {
            return Err(GatewayError::DailyUsageEntryOutOfBounds {
                user,
                day,
                index,
                count,
            });
        }

        let read_txn = self.ledger.begin_read().map_err(GatewayError::from)?;
        let table = read_txn
            .open_table(DAILY_ENTRIES)
            .map_err(LedgerError::from)?;
        let key = entry_key(user, day, index);
        let bytes = table
            .get(key.as_slice())
            .map_err(LedgerError::from)?
            .map(|v| v.value().to_vec())
            .ok_or_else(|| {
                LedgerError::Corrupt(format!("missing usage entry {index} for {user} day {day}"))
            })?;
        let entry = serde_json::from_slice(&bytes).map_err(LedgerError::from)?;
        Ok(entry)
    }

    /// All entries of `user` on `day`, in append order.
    pub fn entries(&self, user: Address, day: u64) -> LedgerResult<Vec<UsageEntry>> {
        let read_txn = self.ledger.begin_read()?;
        let table = read_txn.open_table(DAILY_ENTRIES)?;
        let start = entry_key(user, day, 0);
        let end = entry_key(user, day, u64::MAX);

        let mut entries = Vec::new();
        for item in table.range(start.as_slice()..=end.as_slice())? {
            let (_, value) = item?;
            entries.push(serde_json::from_slice(value.value())?);
        }
        Ok(entries)
    }

    /// Total and entries together.
    pub fn usage(&self, user: Address, day: u64) -> LedgerResult<DailyUsage> {
        Ok(DailyUsage {
            total: self.total(user, day)?,
            entries: self.entries(user, day)?,
        })
    }

    fn header(&self, user: Address, day: u64) -> LedgerResult<UsageHeader> {
        let read_txn = self.ledger.begin_read()?;
        let table = read_txn.open_table(DAILY_USAGE)?;
        let key = usage_key(user, day);
        let header = match table.get(key.as_slice())? {
            Some(value) => UsageHeader::decode(value.value())?,
            None => UsageHeader::default(),
        };
        Ok(header)
    }
}

fn read_header_in(txn: &WriteTransaction, user: Address, day: u64) -> LedgerResult<UsageHeader> {
    let table = txn.open_table(DAILY_USAGE)?;
    let key = usage_key(user, day);
    let header = match table.get(key.as_slice())? {
        Some(value) => UsageHeader::decode(value.value())?,
        None => UsageHeader::default(),
    };
    Ok(header)
}

fn append_in(
    txn: &WriteTransaction,
    user: Address,
    day: u64,
    header: UsageHeader,
    entry: UsageEntry,
) -> LedgerResult<()> {
    let json = serde_json::to_vec(&entry)?;
    {
        let mut entries = txn.open_table(DAILY_ENTRIES)?;
        let key = entry_key(user, day, header.count);
        entries.insert(key.as_slice(), json.as_slice())?;
    }

    let updated = UsageHeader {
        total: header.total + entry.amount,
        count: header.count + 1,
    };
    let mut usage = txn.open_table(DAILY_USAGE)?;
    let key = usage_key(user, day);
    usage.insert(key.as_slice(), updated.encode().as_slice())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::clock::DAY_LENGTH_SECS;
    use crate::ledger::temp_ledger;

    const TOKEN: Address = Address::repeat_byte(0x01);
    const USER: Address = Address::repeat_byte(0xa1);
    const DAY: u64 = 19_700;

    fn at(offset: u64) -> u64 {
        DAY * DAY_LENGTH_SECS + offset
    }

    fn charge(ledger: &Ledger, asset: &AssetInfo, amount: u64, now: u64, limit: u64) -> GatewayResult<Option<U256>> {
        let txn = ledger.begin_write()?;
        let result = QuotaLedger::enforce(&txn, asset, USER, U256::from(amount), now, U256::from(limit))?;
        txn.commit().map_err(LedgerError::from)?;
        Ok(result)
    }

    #[test]
    fn total_equals_sum_of_entries() {
        let (ledger, _dir) = temp_ledger();
        let asset = AssetInfo::token(TOKEN, 18);
        let amounts = [10u64, 25, 7, 58];

        for (i, amount) in amounts.iter().enumerate() {
            charge(&ledger, &asset, *amount, at(i as u64 * 60), 1_000).unwrap();
        }

        let quota = QuotaLedger::new(&ledger);
        let usage = quota.usage(USER, DAY).unwrap();
        assert_eq!(usage.total, U256::from(100u64));
        assert_eq!(quota.count(USER, DAY).unwrap(), 4);
        let sum = usage
            .entries
            .iter()
            .fold(U256::ZERO, |acc, entry| acc + entry.amount);
        assert_eq!(sum, usage.total);
        assert_eq!(usage.entries[2].amount, U256::from(7u64));
        assert_eq!(usage.entries[2].timestamp, at(120));
    }

    #[test]
    fn exceeding_the_limit_reports_attempted_total() {
        let (ledger, _dir) = temp_ledger();
        let asset = AssetInfo::token(TOKEN, 18);
        charge(&ledger, &asset, 80, at(0), 100).unwrap();

        match charge(&ledger, &asset, 21, at(10), 100) {
            Err(GatewayError::DailyLimitExceeded {
                user,
                attempted,
                limit,
            }) => {
                assert_eq!(user, USER);
                assert_eq!(attempted, U256::from(101u64));
                assert_eq!(limit, U256::from(100u64));
            }
            other => panic!("expected limit error, got {other:?}"),
        }

        // Exactly reaching the limit is allowed.
        assert_eq!(
            charge(&ledger, &asset, 20, at(20), 100).unwrap(),
            Some(U256::from(100u64))
        );
        assert_eq!(QuotaLedger::new(&ledger).count(USER, DAY).unwrap(), 2);
    }

    #[test]
    fn non_quota_assets_pass_through() {
        let (ledger, _dir) = temp_ledger();
        let stable = AssetInfo::stable(Address::repeat_byte(0x02), 6);
        assert_eq!(charge(&ledger, &stable, 1_000_000, at(0), 1).unwrap(), None);
        assert_eq!(QuotaLedger::new(&ledger).count(USER, DAY).unwrap(), 0);
    }

    #[test]
    fn new_day_starts_empty_and_old_day_is_preserved() {
        let (ledger, _dir) = temp_ledger();
        let asset = AssetInfo::token(TOKEN, 18);
        charge(&ledger, &asset, 90, at(DAY_LENGTH_SECS - 1), 100).unwrap();
        charge(&ledger, &asset, 90, at(DAY_LENGTH_SECS), 100).unwrap();

        let quota = QuotaLedger::new(&ledger);
        assert_eq!(quota.total(USER, DAY).unwrap(), U256::from(90u64));
        assert_eq!(quota.total(USER, DAY + 1).unwrap(), U256::from(90u64));
        assert_eq!(
            quota.entry(USER, DAY, 0).unwrap(),
            UsageEntry {
                timestamp: at(DAY_LENGTH_SECS - 1),
                amount: U256::from(90u64),
            }
        );
    }

    #[test]
    fn entry_index_is_bounds_checked() {
        let (ledger, _dir) = temp_ledger();
        let asset = AssetInfo::token(TOKEN, 18);
        charge(&ledger, &asset, 5, at(0), 100).unwrap();

        let quota = QuotaLedger::new(&ledger);
        assert!(quota.entry(USER, DAY, 0).is_ok());
        assert!(matches!(
            quota.entry(USER, DAY, 1),
            Err(GatewayError::DailyUsageEntryOutOfBounds { index: 1, count: 1, .. })
        ));
        assert!(quota.entries(USER, DAY + 5).unwrap().is_empty());
    }

    #[test]
    fn users_do_not_share_quota() {
        let (ledger, _dir) = temp_ledger();
        let asset = AssetInfo::token(TOKEN, 18);
        charge(&ledger, &asset, 100, at(0), 100).unwrap();

        let other = Address::repeat_byte(0xb2);
        let txn = ledger.begin_write().unwrap();
        QuotaLedger::enforce(&txn, &asset, other, U256::from(100u64), at(5), U256::from(100u64)).unwrap();
        txn.commit().unwrap();

        let quota = QuotaLedger::new(&ledger);
        assert_eq!(quota.entries(USER, DAY).unwrap().len(), 1);
        assert_eq!(quota.entries(other, DAY).unwrap().len(), 1);
    }
}
