// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::ApiError;
use crate::gateway::{GatewayResult, WithdrawalGateway};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<WithdrawalGateway>,
    /// Queues HTTP withdrawals so the gateway sees them one at a time.
    pub withdraw_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(gateway: Arc<WithdrawalGateway>) -> Self {
        Self {
            gateway,
            withdraw_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run a gateway call on a blocking thread.
    ///
    /// Gateway collaborators may block on network I/O, so gateway calls
    /// never run on the async executor directly.
    pub async fn run<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&WithdrawalGateway) -> GatewayResult<T> + Send + 'static,
    {
        let gateway = self.gateway.clone();
        tokio::task::spawn_blocking(move || call(&gateway))
            .await
            .map_err(|e| ApiError::internal(format!("Gateway task failed: {e}")))?
            .map_err(ApiError::from)
    }
}
