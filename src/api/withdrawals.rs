// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed withdrawal submission.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{parse_address, parse_amount};
use crate::{error::ApiError, gateway::WithdrawalRequest, state::AppState};

/// A withdrawal authorized by a trusted signer.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct WithdrawalBody {
    /// Account the signature was issued to (0x hex).
    pub caller: String,
    /// Managed asset to withdraw (0x hex).
    pub asset: String,
    /// Gross amount in base units (decimal string).
    pub amount: String,
    /// Receiver of the net amount (0x hex).
    pub recipient: String,
    /// Signed fee in base units (decimal string).
    pub fee: String,
    /// Unix time after which the signature is void.
    pub deadline: u64,
    /// 65-byte `r || s || v` signature (hex).
    pub signature: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalResponse {
    /// Amount delivered to the recipient (decimal string).
    pub net: String,
    /// Fee delivered to the fee collector (decimal string).
    pub fee: String,
    /// Nonce consumed by this withdrawal.
    pub nonce: u64,
    pub event_sequence: u64,
}

impl WithdrawalBody {
    fn into_request(self) -> Result<WithdrawalRequest, ApiError> {
        let signature = alloy::hex::decode(&self.signature)
            .map_err(|e| ApiError::bad_request(format!("Invalid signature hex: {e}")))?;
        Ok(WithdrawalRequest {
            caller: parse_address("caller", &self.caller)?,
            asset: parse_address("asset", &self.asset)?,
            amount: parse_amount("amount", &self.amount)?,
            recipient: parse_address("recipient", &self.recipient)?,
            fee: parse_amount("fee", &self.fee)?,
            deadline: self.deadline,
            signature,
        })
    }
}

/// Execute a signed withdrawal.
///
/// Requests are processed one at a time. The queue slot belongs to the
/// gateway call, not to the connection, so a client hanging up cannot let
/// the next request in early. The caller's nonce is consumed only once the
/// recipient has been paid.
#[utoipa::path(
    post,
    path = "/v1/withdrawals",
    tag = "Withdrawals",
    request_body = WithdrawalBody,
    responses(
        (status = 200, description = "Withdrawal executed", body = WithdrawalResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Expired or untrusted signature"),
        (status = 422, description = "Fee not below the amount"),
        (status = 429, description = "Daily limit exceeded"),
        (status = 502, description = "Transfer failed")
    )
)]
pub async fn withdraw(
    State(state): State<AppState>,
    Json(body): Json<WithdrawalBody>,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    let request = body.into_request()?;

    let queued = state.withdraw_lock.clone().lock_owned().await;
    let receipt = state
        .run(move |gateway| {
            let _queued = queued;
            gateway.withdraw(&request)
        })
        .await?;

    Ok(Json(WithdrawalResponse {
        net: receipt.net.to_string(),
        fee: receipt.fee.to_string(),
        nonce: receipt.nonce,
        event_sequence: receipt.event_sequence,
    }))
}
