// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Listing routes.

use crate::error::Result;
use crate::models::Listing;
use crate::routes::check_paging;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/listings", get(list_listings))
}

#[derive(Deserialize)]
struct ListingsQuery {
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    offset: i64,
    listing_type: Option<String>,
    address_id: Option<i32>,
}

fn default_limit() -> i64 {
    50
}

/// List listings ordered by recency, with optional filters.
async fn list_listings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<Vec<Listing>>> {
    check_paging(query.limit, query.offset)?;

    let listings = state
        .db
        .list_listings(
            query.limit,
            query.offset,
            query.listing_type.as_deref(),
            query.address_id,
        )
        .await?;
    Ok(Json(listings))
}
