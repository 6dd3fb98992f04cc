// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Gateway Ledger
//!
//! Embedded ACID store (redb) for the gateway's shared mutable state.
//!
//! ## Table Layout
//!
//! - `nonces`: caller → next nonce (u64)
//! - `daily_usage`: caller|day → running total + entry count
//! - `daily_entries`: caller|day|index → serialized `UsageEntry`
//! - `trusted_signers`: signer → marker
//! - `settings`: key → serialized `RuntimeSettings`
//! - `events`: sequence → serialized `GatewayEvent`
//!
//! Composite keys are raw big-endian bytes so range scans return entries in
//! index order. A withdrawal stages all of its writes in one write
//! transaction; dropping the transaction without committing discards them.

use std::path::Path;

use redb::{Database, ReadTransaction, ReadableDatabase, WriteTransaction};

pub mod events;
pub mod nonces;
pub mod quota;
pub mod settings;
pub mod signers;

pub use events::{AdminChange, EventKind, GatewayEvent, WithdrawalRecord};
pub use quota::{DailyUsage, QuotaLedger, UsageEntry};
pub use settings::RuntimeSettings;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt ledger record: {0}")]
    Corrupt(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Ledger
// =============================================================================

/// Handle to the on-disk ledger database.
pub struct Ledger {
    db: Database,
}

impl Ledger {
    /// Open (or create) the ledger at the given path.
    pub fn open(path: &Path) -> LedgerResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(nonces::NONCES)?;
            let _ = write_txn.open_table(quota::DAILY_USAGE)?;
            let _ = write_txn.open_table(quota::DAILY_ENTRIES)?;
            let _ = write_txn.open_table(signers::TRUSTED_SIGNERS)?;
            let _ = write_txn.open_table(settings::SETTINGS)?;
            let _ = write_txn.open_table(events::EVENTS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Ledger opened");
        Ok(Self { db })
    }

    pub fn begin_write(&self) -> LedgerResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    pub fn begin_read(&self) -> LedgerResult<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }
}

#[cfg(test)]
pub(crate) fn temp_ledger() -> (Ledger, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let ledger = Ledger::open(&dir.path().join("ledger.redb")).unwrap();
    (ledger, dir)
}
