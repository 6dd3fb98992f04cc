// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External collaborators of the gateway.
//!
//! - `client`: RPC connection shared by the EVM adapters
//! - `oracles`: aggregator feeds and the averaging pool
//! - `erc20`: treasury transfers through ERC-20 `transfer`/`transferFrom`
//! - `signing`: operator key loading
//! - `memory`: in-process implementations for tests and embedders

pub mod client;
pub mod erc20;
pub mod memory;
pub mod oracles;
pub mod signing;

pub use client::{ChainClient, ChainError};
