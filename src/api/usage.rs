// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Daily quota usage queries.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::parse_address;
use crate::{
    error::ApiError,
    gateway::clock::DAY_LENGTH_SECS,
    ledger::UsageEntry,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentDayResponse {
    pub day: u64,
    /// UTC start of the day.
    pub starts_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyUsageResponse {
    pub user: String,
    pub day: u64,
    /// Sum of all entries (decimal string).
    pub total: String,
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageEntryResponse {
    pub timestamp: u64,
    /// Amount in base units (decimal string).
    pub amount: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UsageEntriesResponse {
    pub user: String,
    pub day: u64,
    pub total: String,
    pub entries: Vec<UsageEntryResponse>,
}

impl From<UsageEntry> for UsageEntryResponse {
    fn from(entry: UsageEntry) -> Self {
        Self {
            timestamp: entry.timestamp,
            amount: entry.amount.to_string(),
        }
    }
}

/// Current quota day.
#[utoipa::path(
    get,
    path = "/v1/usage/day",
    tag = "Usage",
    responses((status = 200, description = "Current day id", body = CurrentDayResponse))
)]
pub async fn current_day(State(state): State<AppState>) -> Json<CurrentDayResponse> {
    let day = state.gateway.current_day_id();
    let starts_at = day
        .checked_mul(DAY_LENGTH_SECS)
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    Json(CurrentDayResponse { day, starts_at })
}

/// Total and entry count of a user's usage on one day.
#[utoipa::path(
    get,
    path = "/v1/usage/{user}/{day}",
    tag = "Usage",
    params(
        ("user" = String, Path, description = "User address"),
        ("day" = u64, Path, description = "Day id")
    ),
    responses(
        (status = 200, description = "Usage summary", body = DailyUsageResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn daily_usage(
    State(state): State<AppState>,
    Path((user, day)): Path<(String, u64)>,
) -> Result<Json<DailyUsageResponse>, ApiError> {
    let address = parse_address("user", &user)?;
    let (total, count) = state
        .run(move |gateway| {
            Ok((
                gateway.daily_usage_total(address, day)?,
                gateway.daily_usage_count(address, day)?,
            ))
        })
        .await?;

    Ok(Json(DailyUsageResponse {
        user: address.to_string(),
        day,
        total: total.to_string(),
        count,
    }))
}

/// Every entry of a user's usage on one day, oldest first.
#[utoipa::path(
    get,
    path = "/v1/usage/{user}/{day}/entries",
    tag = "Usage",
    params(
        ("user" = String, Path, description = "User address"),
        ("day" = u64, Path, description = "Day id")
    ),
    responses(
        (status = 200, description = "Usage entries", body = UsageEntriesResponse),
        (status = 400, description = "Invalid address")
    )
)]
pub async fn daily_usage_entries(
    State(state): State<AppState>,
    Path((user, day)): Path<(String, u64)>,
) -> Result<Json<UsageEntriesResponse>, ApiError> {
    let address = parse_address("user", &user)?;
    let usage = state
        .run(move |gateway| gateway.daily_usage(address, day))
        .await?;

    Ok(Json(UsageEntriesResponse {
        user: address.to_string(),
        day,
        total: usage.total.to_string(),
        entries: usage.entries.into_iter().map(Into::into).collect(),
    }))
}

/// One entry of a user's usage on one day.
#[utoipa::path(
    get,
    path = "/v1/usage/{user}/{day}/entries/{index}",
    tag = "Usage",
    params(
        ("user" = String, Path, description = "User address"),
        ("day" = u64, Path, description = "Day id"),
        ("index" = u64, Path, description = "Entry index")
    ),
    responses(
        (status = 200, description = "Usage entry", body = UsageEntryResponse),
        (status = 404, description = "Index beyond the day's entry count")
    )
)]
pub async fn daily_usage_entry(
    State(state): State<AppState>,
    Path((user, day, index)): Path<(String, u64, u64)>,
) -> Result<Json<UsageEntryResponse>, ApiError> {
    let address = parse_address("user", &user)?;
    let entry = state
        .run(move |gateway| gateway.daily_usage_entry(address, day, index))
        .await?;
    Ok(Json(entry.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::gateway::testing::*;

    #[tokio::test]
    async fn current_day_matches_the_clock() {
        let h = harness();
        let Json(day) = current_day(State(AppState::new(h.gateway.clone()))).await;
        assert_eq!(day.day, DAY);
        assert_eq!(
            day.starts_at.unwrap().timestamp(),
            i64::try_from(DAY * DAY_LENGTH_SECS).unwrap()
        );
    }

    #[tokio::test]
    async fn usage_reflects_withdrawals() {
        let h = harness();
        h.gateway.withdraw(&h.request(TOKEN, 700, 7)).unwrap();
        h.gateway.withdraw(&h.request(TOKEN, 300, 3)).unwrap();
        let state = AppState::new(h.gateway.clone());
        let user = CALLER.to_string();

        let Json(summary) = daily_usage(State(state.clone()), Path((user.clone(), DAY)))
            .await
            .unwrap();
        assert_eq!(summary.total, "1000");
        assert_eq!(summary.count, 2);

        let Json(all) = daily_usage_entries(State(state.clone()), Path((user.clone(), DAY)))
            .await
            .unwrap();
        assert_eq!(all.entries.len(), 2);
        assert_eq!(all.entries[0].amount, "700");

        let Json(entry) = daily_usage_entry(State(state.clone()), Path((user.clone(), DAY, 1)))
            .await
            .unwrap();
        assert_eq!(entry.amount, "300");

        let err = daily_usage_entry(State(state), Path((user, DAY, 2)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_user_is_rejected() {
        let h = harness();
        let err = daily_usage(State(AppState::new(h.gateway.clone())), Path(("bob".into(), DAY)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
