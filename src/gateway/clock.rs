// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wall-clock source for expiry, staleness and day boundaries.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;

/// Length of one quota day in seconds.
pub const DAY_LENGTH_SECS: u64 = 86_400;

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Manually driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Day identifier for a unix timestamp.
pub fn day_id(timestamp: u64) -> u64 {
    timestamp / DAY_LENGTH_SECS
}
