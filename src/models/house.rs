// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! House (building) record from the Avito house catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored house record, keyed by the Avito address ID.
///
/// Characteristic fields hold the free-text values shown on the catalog
/// page ("Кирпичный", "Центральное", ...), not normalized enums.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct House {
    /// Avito address ID (also the house catalog page key)
    pub address_id: i32,
    /// URL slug of the house catalog page
    pub slug: Option<String>,
    /// Street address
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    // Basics
    pub build_year: Option<String>,
    pub floors: Option<String>,

    // Utilities
    pub heating: Option<String>,
    pub hot_water: Option<String>,
    pub cold_water: Option<String>,
    pub electricity: Option<String>,
    pub gas: Option<String>,
    pub sewerage: Option<String>,
    pub ventilation: Option<String>,

    // Lifts
    pub passenger_lift: Option<String>,
    pub freight_lift: Option<String>,

    // Construction
    pub house_type: Option<String>,
    pub floor_type: Option<String>,
    pub foundation: Option<String>,
    pub energy_class: Option<String>,

    // Grounds
    pub playground: Option<String>,
    pub sports_ground: Option<String>,
    pub parking: Option<String>,

    // Rating
    pub rating: Option<f32>,
    pub review_count: Option<i32>,

    // Prices across active listings
    pub price_min: Option<i32>,
    pub price_max: Option<i32>,
    pub active_listings: Option<i32>,

    /// Raw parsed payload, kept for reprocessing
    pub raw_data: Option<serde_json::Value>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
