// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stats and monitoring routes.

use crate::error::Result;
use crate::models::{MonitoringResponse, StatsResponse};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(stats))
        .route("/monitoring", get(monitoring))
}

/// Aggregate counts over the collected data.
async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>> {
    let stats = state.db.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Health summary with staleness alerts.
async fn monitoring(State(state): State<Arc<AppState>>) -> Result<Json<MonitoringResponse>> {
    let stats = state.db.stats().await?;
    Ok(Json(MonitoringResponse::evaluate(&stats, chrono::Utc::now())))
}
