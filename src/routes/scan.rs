// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scan control routes.

use crate::error::{AppError, Result};
use crate::models::ScanStatus;
use crate::services::ScanScope;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/scan/start", post(start_scan))
        .route("/scan/stop", post(stop_scan))
        .route("/scan/status", get(scan_status))
}

#[derive(Deserialize)]
struct StartScanQuery {
    /// 1 = only search, 2 = only houses, absent = full
    phase: Option<String>,
}

#[derive(Serialize)]
pub struct ScanMessageResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Start a scan as a background task. Returns immediately.
async fn start_scan(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StartScanQuery>,
) -> Result<Json<ScanMessageResponse>> {
    let scope = ScanScope::from_param(query.phase.as_deref())?;

    if !state.scanner.try_begin().await {
        return Err(AppError::Conflict("Scan already running".to_string()));
    }

    let scanner = state.scanner.clone();
    tokio::spawn(async move {
        scanner.run(scope).await;
    });

    Ok(Json(ScanMessageResponse {
        message: "Scan started".to_string(),
        phase: Some(scope.label().to_string()),
    }))
}

/// Request a cooperative stop of the running scan.
async fn stop_scan(State(state): State<Arc<AppState>>) -> Result<Json<ScanMessageResponse>> {
    if state.scanner.request_stop().await {
        return Ok(Json(ScanMessageResponse {
            message: "Stop requested".to_string(),
            phase: None,
        }));
    }
    Err(AppError::BadRequest("No scan running".to_string()))
}

/// Current scan progress snapshot.
async fn scan_status(State(state): State<Arc<AppState>>) -> Json<ScanStatus> {
    Json(state.scanner.status().await)
}
