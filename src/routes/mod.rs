// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod houses;
pub mod listings;
pub mod scan;
pub mod stats;

use crate::error::{AppError, Result};
use crate::AppState;
use axum::http::Method;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Paging bounds shared by the list endpoints.
const MAX_LIMIT: i64 = 500;

/// Validate a limit/offset pair from query parameters.
pub(crate) fn check_paging(limit: i64, offset: i64) -> Result<()> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    if offset < 0 {
        return Err(AppError::BadRequest("offset must be non-negative".to_string()));
    }
    Ok(())
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub endpoints: Vec<String>,
}

/// Service descriptor at the root path.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "avito-tracker".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: vec![
            "GET /houses".to_string(),
            "GET /houses/search?q=".to_string(),
            "GET /houses/{address_id}".to_string(),
            "GET /listings".to_string(),
            "GET /stats".to_string(),
            "GET /monitoring".to_string(),
            "POST /scan/start".to_string(),
            "POST /scan/stop".to_string(),
            "GET /scan/status".to_string(),
        ],
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public read API; no credentials anywhere, so CORS can stay open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(health_check))
        .merge(houses::routes())
        .merge(listings::routes())
        .merge(scan::routes())
        .merge(stats::routes())
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
