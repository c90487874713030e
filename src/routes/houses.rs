// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! House catalog routes.

use crate::error::{AppError, Result};
use crate::models::House;
use crate::routes::check_paging;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/houses", get(list_houses))
        // The static segment takes precedence over the id capture
        .route("/houses/search", get(search_houses))
        .route("/houses/{address_id}", get(house_detail))
}

#[derive(Deserialize)]
struct HousesQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    house_type: Option<String>,
}

fn default_limit() -> i64 {
    50
}

/// List houses, optionally filtered by house type.
async fn list_houses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HousesQuery>,
) -> Result<Json<Vec<House>>> {
    check_paging(query.limit, query.offset)?;

    let houses = state
        .db
        .list_houses(query.limit, query.offset, query.house_type.as_deref())
        .await?;
    Ok(Json(houses))
}

#[derive(Deserialize)]
struct SearchQuery {
    q: String,
    #[serde(default = "default_limit")]
    limit: i64,
}

/// Search houses by address substring.
async fn search_houses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<House>>> {
    if query.q.chars().count() < 2 {
        return Err(AppError::BadRequest(
            "q must be at least 2 characters".to_string(),
        ));
    }
    check_paging(query.limit, 0)?;

    let houses = state.db.search_houses(&query.q, query.limit).await?;
    if houses.is_empty() {
        return Err(AppError::NotFound(format!(
            "No houses matching '{}'",
            query.q
        )));
    }
    Ok(Json(houses))
}

/// Get a single house by address ID.
async fn house_detail(
    State(state): State<Arc<AppState>>,
    Path(address_id): Path<i32>,
) -> Result<Json<House>> {
    let house = state
        .db
        .get_house(address_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("House with address_id={} not found", address_id)))?;
    Ok(Json(house))
}
