// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{parse_address, parse_amount};
use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize, IntoParams)]
pub struct FeeEstimateQuery {
    /// Managed asset the fee is charged in (0x hex).
    pub asset: String,
    /// Gas the withdrawal is expected to use, before the fixed overhead.
    pub gas_units: u64,
    /// Gas price in wei (decimal string).
    pub gas_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeeEstimateResponse {
    pub asset: String,
    /// Gas cost in USD including markup, 18 decimals (decimal string).
    pub gross_usd: String,
    /// USD price of one whole asset unit, 18 decimals (decimal string).
    pub token_usd_price: String,
    /// Fee in asset base units (decimal string).
    pub fee: String,
}

/// Quote the fee a signer should put into a withdrawal.
#[utoipa::path(
    get,
    path = "/v1/fees/estimate",
    tag = "Fees",
    params(FeeEstimateQuery),
    responses(
        (status = 200, description = "Fee quote", body = FeeEstimateResponse),
        (status = 400, description = "Unsupported asset or malformed input"),
        (status = 503, description = "Price data unavailable or stale")
    )
)]
pub async fn estimate_fee(
    State(state): State<AppState>,
    Query(query): Query<FeeEstimateQuery>,
) -> Result<Json<FeeEstimateResponse>, ApiError> {
    let asset = parse_address("asset", &query.asset)?;
    let gas_price = parse_amount("gas_price", &query.gas_price)?;
    let gas_units = query.gas_units;

    let quote = state
        .run(move |gateway| gateway.estimate_fee(asset, gas_units, gas_price))
        .await?;

    Ok(Json(FeeEstimateResponse {
        asset: asset.to_string(),
        gross_usd: quote.gross_usd.to_string(),
        token_usd_price: quote.token_usd_price.to_string(),
        fee: quote.fee.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::gateway::testing::*;

    fn query(asset: &str, gas_price: &str) -> Query<FeeEstimateQuery> {
        Query(FeeEstimateQuery {
            asset: asset.to_string(),
            gas_units: 150_000,
            gas_price: gas_price.to_string(),
        })
    }

    #[tokio::test]
    async fn quotes_stable_fee() {
        let h = harness();
        let state = AppState::new(h.gateway.clone());
        let Json(quote) = estimate_fee(State(state), query(&STABLE.to_string(), "20000000000"))
            .await
            .unwrap();
        assert_eq!(quote.fee, "9200000");
        assert_eq!(quote.token_usd_price, "1000000000000000000");
    }

    #[tokio::test]
    async fn stale_feed_is_503() {
        let h = harness();
        h.clock.advance(3_601);
        let state = AppState::new(h.gateway.clone());
        let err = estimate_fee(State(state), query(&TOKEN.to_string(), "1"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code, "oracle_data_stale");
    }

    #[tokio::test]
    async fn unknown_asset_is_400() {
        let h = harness();
        let state = AppState::new(h.gateway.clone());
        let err = estimate_fee(State(state), query(&WETH.to_string(), "1"))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
