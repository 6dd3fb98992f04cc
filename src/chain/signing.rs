// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator key loading.
//!
//! The operator key signs treasury transfers. It is stored as a PEM file,
//! either SEC1 (`EC PRIVATE KEY`) or PKCS#8 (`PRIVATE KEY`).

use std::path::Path;

use alloy::signers::local::PrivateKeySigner;
use k256::{pkcs8::DecodePrivateKey, SecretKey};

use super::client::ChainError;

/// Build a signer from PEM-encoded secp256k1 key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, ChainError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid UTF-8: {e}")))?;
    let pem = pem::parse(pem_str)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid PEM: {e}")))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| SecretKey::from_pkcs8_der(pem.contents()))
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid key format: {e}")))?;

    PrivateKeySigner::from_slice(&secret_key.to_bytes())
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
}

/// Read the operator key from `path`.
pub fn load_operator_key(path: &Path) -> Result<PrivateKeySigner, ChainError> {
    let bytes = std::fs::read(path).map_err(|e| {
        ChainError::InvalidPrivateKey(format!("Cannot read {}: {e}", path.display()))
    })?;
    let signer = signer_from_pem(&bytes)?;
    tracing::info!(operator = %signer.address(), "Loaded operator key");
    Ok(signer)
}
