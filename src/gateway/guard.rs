// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reentrancy exclusion for the withdrawal path.

use std::sync::atomic::{AtomicBool, Ordering};

use super::error::{GatewayError, GatewayResult};

/// Critical-section flag held for the duration of one withdrawal.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

/// Held while the critical section is entered; releases on drop.
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl ReentrancyGuard {
    /// Enter the critical section, failing if it is already held.
    pub fn enter(&self) -> GatewayResult<GuardToken<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GatewayError::ReentrantCall)?;
        Ok(GuardToken { guard: self })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
