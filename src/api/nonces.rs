// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::parse_address;
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct NonceResponse {
    pub caller: String,
    /// Nonce the next signed withdrawal for this caller must carry.
    pub nonce: u64,
}

/// Current nonce of a caller.
#[utoipa::path(
    get,
    path = "/v1/nonces/{caller}",
    tag = "Ledger",
    params(("caller" = String, Path, description = "Caller address")),
    responses(
        (status = 200, description = "Current nonce", body = NonceResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn nonce_of(
    State(state): State<AppState>,
    Path(caller): Path<String>,
) -> Result<Json<NonceResponse>, ApiError> {
    let address = parse_address("caller", &caller)?;
    let nonce = state.run(move |gateway| gateway.nonce_of(address)).await?;
    Ok(Json(NonceResponse {
        caller: address.to_string(),
        nonce,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::*;

    #[tokio::test]
    async fn nonce_advances_after_withdrawal() {
        let h = harness();
        let state = AppState::new(h.gateway.clone());

        let Json(before) = nonce_of(State(state.clone()), Path(CALLER.to_string()))
            .await
            .unwrap();
        assert_eq!(before.nonce, 0);

        h.gateway.withdraw(&h.request(STABLE, 100, 1)).unwrap();
        let Json(after) = nonce_of(State(state), Path(CALLER.to_string()))
            .await
            .unwrap();
        assert_eq!(after.nonce, 1);
    }
}
