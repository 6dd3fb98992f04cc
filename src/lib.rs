// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Treasury Gateway - Signed Withdrawal Service
//!
//! Pays out treasury funds against EIP-712 authorizations issued by trusted
//! signers, charging a fee priced from on-chain oracles and capping each
//! user's daily withdrawals of the quota-controlled token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `chain` - EVM adapters: price feeds, averaging pool, ERC-20 transfers
//! - `gateway` - Authorization, fee pricing, quota and withdrawal flow
//! - `ledger` - Nonces, quota usage, signers, settings and events (redb)

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod state;
