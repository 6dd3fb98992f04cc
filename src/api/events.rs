// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::ApiError,
    ledger::{events::MAX_PAGE, GatewayEvent},
    state::AppState,
};

const DEFAULT_PAGE: usize = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// First sequence to return.
    #[param(default = 0)]
    pub from: Option<u64>,
    /// Maximum number of events (capped at 500).
    #[param(default = 100)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventsResponse {
    #[schema(value_type = Vec<Object>)]
    pub events: Vec<GatewayEvent>,
    /// Sequence to pass as `from` for the next page, if any.
    pub next: Option<u64>,
}

/// Page through withdrawal and administrative events.
#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "Ledger",
    params(EventsQuery),
    responses((status = 200, description = "Event page", body = EventsResponse))
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>, ApiError> {
    let from = query.from.unwrap_or(0);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let events = state.run(move |gateway| gateway.events(from, limit)).await?;

    let next = if events.len() == limit {
        events.last().map(|event| event.sequence + 1)
    } else {
        None
    };
    Ok(Json(EventsResponse { events, next }))
}
