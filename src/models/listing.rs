// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Listing record from Avito search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing type values stored in `listings.listing_type`.
pub mod listing_type {
    pub const SALE: &str = "sale";
    pub const RENT_LONG: &str = "rent_long";
    pub const RENT_SHORT: &str = "rent_short";
}

/// Stored listing record, keyed by the Avito item ID.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    /// Avito item ID
    pub item_id: i64,
    /// Address ID linking to a house (resolved in phase 1)
    pub address_id: Option<i32>,
    /// Listing title, e.g. "1-к. квартира, 37,5 м², 8/10 эт."
    pub title: Option<String>,
    /// Price in rubles (per month / per day for rentals)
    pub price: Option<i32>,
    /// One of `sale`, `rent_long`, `rent_short`
    pub listing_type: Option<String>,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub rooms: Option<i32>,
    /// Area in square meters
    pub area: Option<f32>,
    pub floor: Option<i32>,
    pub total_floors: Option<i32>,
    /// Absolute listing URL
    pub url: Option<String>,
    /// Raw parsed payload
    pub raw_data: Option<serde_json::Value>,
    pub first_seen_at: Option<DateTime<Utc>>,
    pub last_seen_at: Option<DateTime<Utc>>,
}
