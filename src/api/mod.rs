// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::{Address, U256};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{error::ApiError, state::AppState};

pub mod events;
pub mod fees;
pub mod health;
pub mod nonces;
pub mod usage;
pub mod withdrawals;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/withdrawals", post(withdrawals::withdraw))
        .route("/fees/estimate", get(fees::estimate_fee))
        .route("/usage/day", get(usage::current_day))
        .route("/usage/{user}/{day}", get(usage::daily_usage))
        .route("/usage/{user}/{day}/entries", get(usage::daily_usage_entries))
        .route(
            "/usage/{user}/{day}/entries/{index}",
            get(usage::daily_usage_entry),
        )
        .route("/nonces/{caller}", get(nonces::nonce_of))
        .route("/events", get(events::list_events));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        withdrawals::withdraw,
        fees::estimate_fee,
        usage::current_day,
        usage::daily_usage,
        usage::daily_usage_entries,
        usage::daily_usage_entry,
        nonces::nonce_of,
        events::list_events
    ),
    components(
        schemas(
            health::HealthResponse,
            health::HealthChecks,
            withdrawals::WithdrawalBody,
            withdrawals::WithdrawalResponse,
            fees::FeeEstimateResponse,
            usage::CurrentDayResponse,
            usage::DailyUsageResponse,
            usage::UsageEntryResponse,
            usage::UsageEntriesResponse,
            nonces::NonceResponse,
            events::EventsResponse
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Withdrawals", description = "Signed treasury withdrawals"),
        (name = "Fees", description = "Oracle-priced fee quotes"),
        (name = "Usage", description = "Daily quota usage"),
        (name = "Ledger", description = "Nonces and the event log")
    )
)]
struct ApiDoc;

/// Parse a 0x-prefixed hex address from a request field.
pub(crate) fn parse_address(field: &str, value: &str) -> Result<Address, ApiError> {
    value
        .parse()
        .map_err(|e| ApiError::bad_request(format!("Invalid {field} address '{value}': {e}")))
}

/// Parse a base-10 token amount from a request field.
pub(crate) fn parse_amount(field: &str, value: &str) -> Result<U256, ApiError> {
    U256::from_str_radix(value, 10)
        .map_err(|e| ApiError::bad_request(format!("Invalid {field} '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::gateway::testing::{harness, CALLER};

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value, bool) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let has_request_id = response.headers().contains_key("x-request-id");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap(), has_request_id)
    }

    #[tokio::test]
    async fn routes_are_served_with_request_ids() {
        let h = harness();
        let app = router(AppState::new(h.gateway.clone()));

        let (status, body, has_request_id) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(has_request_id);

        let (status, body, _) = get_json(app.clone(), &format!("/v1/nonces/{CALLER}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nonce"], 0);

        let (status, body, _) = get_json(app, "/v1/nonces/not-an-address").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "bad_request");
    }

    #[test]
    fn request_fields_are_validated() {
        assert_eq!(
            parse_address("recipient", "0x0101010101010101010101010101010101010101").unwrap(),
            Address::repeat_byte(0x01)
        );
        assert!(parse_address("recipient", "0x1234").is_err());

        assert_eq!(parse_amount("amount", "1000").unwrap(), U256::from(1_000u64));
        assert!(parse_amount("amount", "-1").is_err());
        assert!(parse_amount("amount", "1.5").is_err());
        assert_eq!(
            parse_amount("amount", "x").unwrap_err().status,
            axum::http::StatusCode::BAD_REQUEST
        );
    }
}
