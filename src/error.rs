// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::gateway::GatewayError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error_code: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_code,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

/// HTTP status for each gateway failure class.
fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::ZeroRecipient
        | GatewayError::ZeroAmount
        | GatewayError::ZeroAddress { .. }
        | GatewayError::UnsupportedAsset { .. }
        | GatewayError::ZeroSetting { .. }
        | GatewayError::WindowTooSmall => StatusCode::BAD_REQUEST,
        GatewayError::SignatureExpired { .. }
        | GatewayError::InvalidSignature(_)
        | GatewayError::InvalidSigner { .. } => StatusCode::UNAUTHORIZED,
        GatewayError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        GatewayError::DailyLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        GatewayError::OracleAnswerNotPositive { .. }
        | GatewayError::OracleDataStale { .. }
        | GatewayError::TickOutOfRange { .. }
        | GatewayError::ZeroTokenPrice { .. } => StatusCode::SERVICE_UNAVAILABLE,
        GatewayError::FeeTooLarge { .. } | GatewayError::ArithmeticOverflow { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        GatewayError::DailyUsageEntryOutOfBounds { .. } => StatusCode::NOT_FOUND,
        GatewayError::ReentrantCall => StatusCode::CONFLICT,
        GatewayError::Chain(_) | GatewayError::FeeUnsettled { .. } => StatusCode::BAD_GATEWAY,
        GatewayError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, code = err.error_code(), "Gateway failure");
        }
        Self::new(status, err.error_code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use axum::body::to_bytes;

    use crate::chain::ChainError;

    #[test]
    fn gateway_errors_map_to_statuses() {
        let cases = [
            (GatewayError::ZeroAmount, StatusCode::BAD_REQUEST),
            (
                GatewayError::SignatureExpired {
                    deadline: 1,
                    now: 2,
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                GatewayError::Unauthorized {
                    actor: Address::ZERO,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                GatewayError::DailyLimitExceeded {
                    user: Address::ZERO,
                    attempted: U256::from(2u8),
                    limit: U256::from(1u8),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (GatewayError::ReentrantCall, StatusCode::CONFLICT),
            (
                GatewayError::FeeTooLarge {
                    fee: U256::from(2u8),
                    amount: U256::from(1u8),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ChainError::Rpc("down".into()).into(),
                StatusCode::BAD_GATEWAY,
            ),
            (
                GatewayError::FeeUnsettled {
                    nonce: 0,
                    fee: U256::from(1u8),
                    reason: ChainError::TransactionFailed("reverted".into()),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::from(GatewayError::ZeroRecipient).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "zero_recipient");
        assert_eq!(body["error"], "Recipient must not be the zero address");
    }

    #[test]
    fn constructors_set_status_and_code() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.error_code, "bad_request");

        let internal = ApiError::internal("boom");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message, "boom");
    }
}
