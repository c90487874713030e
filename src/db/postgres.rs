// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Postgres client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Houses (building catalog records)
//! - Listings (search result records)
//! - Scan progress (append-only audit rows)
//!
//! The wrapper degrades gracefully when no database is reachable: reads
//! return empty results and writes are dropped, so the API and scanner
//! stay up while Postgres is down. Tests use `disconnected()` to run the
//! whole stack offline.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{House, Listing};

/// Postgres database client.
#[derive(Clone)]
pub struct Db {
    pool: Option<PgPool>,
}

/// Aggregate counts computed by [`Db::stats`].
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub total_houses: i64,
    pub total_listings: i64,
    pub listings_sale: i64,
    pub listings_rent_long: i64,
    pub listings_rent_short: i64,
    pub houses_with_details: i64,
    pub last_scan: Option<DateTime<Utc>>,
}

impl Db {
    /// Connect to Postgres and run the idempotent auto-migration.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .connect(&config.database_url())
            .await?;

        migrate(&pool).await?;

        tracing::info!(
            host = %config.db_host,
            port = config.db_port,
            database = %config.db_name,
            "Database pool created"
        );

        Ok(Self { pool: Some(pool) })
    }

    /// Create a disconnected client (offline mode).
    ///
    /// Reads return empty results and writes are dropped.
    pub fn disconnected() -> Self {
        Self { pool: None }
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    // ─── Houses ──────────────────────────────────────────────────

    /// Insert or fully replace a house record.
    pub async fn upsert_house(&self, house: &House) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        sqlx::query(
            r#"
            INSERT INTO avito.houses (
                address_id, slug, address, lat, lng,
                build_year, floors,
                heating, hot_water, cold_water, electricity, gas, sewerage, ventilation,
                passenger_lift, freight_lift,
                house_type, floor_type, foundation, energy_class,
                playground, sports_ground, parking,
                rating, review_count,
                price_min, price_max, active_listings,
                raw_data, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
                $27, $28, $29, NOW(), NOW()
            )
            ON CONFLICT (address_id) DO UPDATE SET
                slug = EXCLUDED.slug,
                address = EXCLUDED.address,
                lat = EXCLUDED.lat,
                lng = EXCLUDED.lng,
                build_year = EXCLUDED.build_year,
                floors = EXCLUDED.floors,
                heating = EXCLUDED.heating,
                hot_water = EXCLUDED.hot_water,
                cold_water = EXCLUDED.cold_water,
                electricity = EXCLUDED.electricity,
                gas = EXCLUDED.gas,
                sewerage = EXCLUDED.sewerage,
                ventilation = EXCLUDED.ventilation,
                passenger_lift = EXCLUDED.passenger_lift,
                freight_lift = EXCLUDED.freight_lift,
                house_type = EXCLUDED.house_type,
                floor_type = EXCLUDED.floor_type,
                foundation = EXCLUDED.foundation,
                energy_class = EXCLUDED.energy_class,
                playground = EXCLUDED.playground,
                sports_ground = EXCLUDED.sports_ground,
                parking = EXCLUDED.parking,
                rating = EXCLUDED.rating,
                review_count = EXCLUDED.review_count,
                price_min = EXCLUDED.price_min,
                price_max = EXCLUDED.price_max,
                active_listings = EXCLUDED.active_listings,
                raw_data = EXCLUDED.raw_data,
                updated_at = NOW()
            "#,
        )
        .bind(house.address_id)
        .bind(&house.slug)
        .bind(&house.address)
        .bind(house.lat)
        .bind(house.lng)
        .bind(&house.build_year)
        .bind(&house.floors)
        .bind(&house.heating)
        .bind(&house.hot_water)
        .bind(&house.cold_water)
        .bind(&house.electricity)
        .bind(&house.gas)
        .bind(&house.sewerage)
        .bind(&house.ventilation)
        .bind(&house.passenger_lift)
        .bind(&house.freight_lift)
        .bind(&house.house_type)
        .bind(&house.floor_type)
        .bind(&house.foundation)
        .bind(&house.energy_class)
        .bind(&house.playground)
        .bind(&house.sports_ground)
        .bind(&house.parking)
        .bind(house.rating)
        .bind(house.review_count)
        .bind(house.price_min)
        .bind(house.price_max)
        .bind(house.active_listings)
        .bind(&house.raw_data)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Create a house row with address info only, without touching
    /// characteristics already collected in a previous phase 2 pass.
    pub async fn ensure_house(
        &self,
        address_id: i32,
        slug: Option<&str>,
        address: Option<&str>,
        lat: Option<f64>,
        lng: Option<f64>,
    ) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        sqlx::query(
            r#"
            INSERT INTO avito.houses AS h (address_id, slug, address, lat, lng, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            ON CONFLICT (address_id) DO UPDATE SET
                slug = COALESCE(EXCLUDED.slug, h.slug),
                address = COALESCE(EXCLUDED.address, h.address),
                lat = COALESCE(EXCLUDED.lat, h.lat),
                lng = COALESCE(EXCLUDED.lng, h.lng)
            "#,
        )
        .bind(address_id)
        .bind(slug)
        .bind(address)
        .bind(lat)
        .bind(lng)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get a house by its address ID.
    pub async fn get_house(&self, address_id: i32) -> Result<Option<House>, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(None);
        };

        let house = sqlx::query_as::<_, House>("SELECT * FROM avito.houses WHERE address_id = $1")
            .bind(address_id)
            .fetch_optional(pool)
            .await?;

        Ok(house)
    }

    /// List houses ordered by address, optionally filtered by house type.
    pub async fn list_houses(
        &self,
        limit: i64,
        offset: i64,
        house_type: Option<&str>,
    ) -> Result<Vec<House>, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        let houses = if let Some(house_type) = house_type {
            sqlx::query_as::<_, House>(
                "SELECT * FROM avito.houses WHERE house_type = $1 \
                 ORDER BY address LIMIT $2 OFFSET $3",
            )
            .bind(house_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        } else {
            sqlx::query_as::<_, House>(
                "SELECT * FROM avito.houses ORDER BY address LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        };

        Ok(houses)
    }

    /// Case-insensitive substring search on the address.
    pub async fn search_houses(&self, q: &str, limit: i64) -> Result<Vec<House>, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        let houses = sqlx::query_as::<_, House>(
            "SELECT * FROM avito.houses WHERE address ILIKE $1 ORDER BY address LIMIT $2",
        )
        .bind(format!("%{}%", q))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(houses)
    }

    /// Houses lacking phase 2 details: (address_id, slug).
    pub async fn houses_without_details(&self) -> Result<Vec<(i32, String)>, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, (i32, String)>(
            "SELECT address_id, slug FROM avito.houses \
             WHERE build_year IS NULL AND house_type IS NULL AND slug IS NOT NULL \
             ORDER BY address_id",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    // ─── Listings ────────────────────────────────────────────────

    /// Insert a listing, or refresh `price` and `last_seen_at` when it
    /// was already seen. First-seen data is never overwritten.
    pub async fn upsert_listing(&self, listing: &Listing) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        sqlx::query(
            r#"
            INSERT INTO avito.listings (
                item_id, address_id, title, price, listing_type,
                address, lat, lng, rooms, area, floor, total_floors,
                url, raw_data, first_seen_at, last_seen_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,NOW(),NOW())
            ON CONFLICT (item_id) DO UPDATE SET
                price = EXCLUDED.price,
                last_seen_at = NOW()
            "#,
        )
        .bind(listing.item_id)
        .bind(listing.address_id)
        .bind(&listing.title)
        .bind(listing.price)
        .bind(&listing.listing_type)
        .bind(&listing.address)
        .bind(listing.lat)
        .bind(listing.lng)
        .bind(listing.rooms)
        .bind(listing.area)
        .bind(listing.floor)
        .bind(listing.total_floors)
        .bind(&listing.url)
        .bind(&listing.raw_data)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// List listings ordered by recency, with optional filters.
    pub async fn list_listings(
        &self,
        limit: i64,
        offset: i64,
        listing_type: Option<&str>,
        address_id: Option<i32>,
    ) -> Result<Vec<Listing>, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        // Build the WHERE clause dynamically, then bind in the same order.
        let mut conditions = Vec::new();
        let mut idx = 1;

        if listing_type.is_some() {
            conditions.push(format!("listing_type = ${}", idx));
            idx += 1;
        }
        if address_id.is_some() {
            conditions.push(format!("address_id = ${}", idx));
            idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {} ", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT * FROM avito.listings {}ORDER BY last_seen_at DESC LIMIT ${} OFFSET ${}",
            where_clause,
            idx,
            idx + 1
        );

        let mut query = sqlx::query_as::<_, Listing>(&sql);
        if let Some(listing_type) = listing_type {
            query = query.bind(listing_type.to_string());
        }
        if let Some(address_id) = address_id {
            query = query.bind(address_id);
        }
        let listings = query.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok(listings)
    }

    /// Listings not yet linked to a house: (item_id, url).
    pub async fn listings_without_address(&self) -> Result<Vec<(i64, String)>, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT item_id, url FROM avito.listings \
             WHERE address_id IS NULL AND url IS NOT NULL \
             ORDER BY item_id",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    /// Link a listing to a house.
    pub async fn set_listing_address(&self, item_id: i64, address_id: i32) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        sqlx::query("UPDATE avito.listings SET address_id = $1 WHERE item_id = $2")
            .bind(address_id)
            .bind(item_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    // ─── Stats ───────────────────────────────────────────────────

    /// Aggregate counts for `/stats` and `/monitoring`.
    pub async fn stats(&self) -> Result<Stats, AppError> {
        let Some(pool) = &self.pool else {
            return Ok(Stats::default());
        };

        let (total_houses,) =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM avito.houses")
                .fetch_one(pool)
                .await?;
        let (total_listings,) =
            sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM avito.listings")
                .fetch_one(pool)
                .await?;
        let (listings_sale,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM avito.listings WHERE listing_type = 'sale'",
        )
        .fetch_one(pool)
        .await?;
        let (listings_rent_long,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM avito.listings WHERE listing_type = 'rent_long'",
        )
        .fetch_one(pool)
        .await?;
        let (listings_rent_short,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM avito.listings WHERE listing_type = 'rent_short'",
        )
        .fetch_one(pool)
        .await?;
        let (houses_with_details,) = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM avito.houses \
             WHERE build_year IS NOT NULL OR house_type IS NOT NULL",
        )
        .fetch_one(pool)
        .await?;
        let (last_scan,) = sqlx::query_as::<_, (Option<DateTime<Utc>>,)>(
            "SELECT MAX(updated_at) FROM avito.houses",
        )
        .fetch_one(pool)
        .await?;

        Ok(Stats {
            total_houses,
            total_listings,
            listings_sale,
            listings_rent_long,
            listings_rent_short,
            houses_with_details,
            last_scan,
        })
    }

    // ─── Scan progress ───────────────────────────────────────────

    /// Append a scan progress audit row.
    #[allow(clippy::too_many_arguments)]
    pub async fn save_scan_progress(
        &self,
        scan_id: &str,
        phase: &str,
        category: &str,
        page: i32,
        status: &str,
        items_found: i32,
        error_message: Option<&str>,
    ) -> Result<(), AppError> {
        let Some(pool) = &self.pool else {
            return Ok(());
        };

        let now = Utc::now();
        let finished = matches!(status, "done" | "error").then_some(now);

        sqlx::query(
            r#"
            INSERT INTO avito.scan_progress
                (scan_id, phase, category, page, status, items_found, error_message,
                 started_at, finished_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(scan_id)
        .bind(phase)
        .bind(category)
        .bind(page)
        .bind(status)
        .bind(items_found)
        .bind(error_message)
        .bind(now)
        .bind(finished)
        .execute(pool)
        .await?;

        Ok(())
    }
}

/// Idempotent schema migration, run on every startup.
async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query("CREATE SCHEMA IF NOT EXISTS avito")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS avito.houses (
            address_id INTEGER PRIMARY KEY,
            slug TEXT,
            address TEXT,
            lat DOUBLE PRECISION,
            lng DOUBLE PRECISION,
            build_year TEXT,
            floors TEXT,
            heating TEXT,
            hot_water TEXT,
            cold_water TEXT,
            electricity TEXT,
            gas TEXT,
            sewerage TEXT,
            ventilation TEXT,
            passenger_lift TEXT,
            freight_lift TEXT,
            house_type TEXT,
            floor_type TEXT,
            foundation TEXT,
            energy_class TEXT,
            playground TEXT,
            sports_ground TEXT,
            parking TEXT,
            rating REAL,
            review_count INTEGER,
            price_min INTEGER,
            price_max INTEGER,
            active_listings INTEGER,
            raw_data JSONB,
            created_at TIMESTAMPTZ DEFAULT NOW(),
            updated_at TIMESTAMPTZ DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS avito.listings (
            item_id BIGINT PRIMARY KEY,
            address_id INTEGER,
            title TEXT,
            price INTEGER,
            listing_type TEXT,
            address TEXT,
            lat DOUBLE PRECISION,
            lng DOUBLE PRECISION,
            rooms INTEGER,
            area REAL,
            floor INTEGER,
            total_floors INTEGER,
            url TEXT,
            raw_data JSONB,
            first_seen_at TIMESTAMPTZ DEFAULT NOW(),
            last_seen_at TIMESTAMPTZ DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_listings_address_id ON avito.listings(address_id)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_type ON avito.listings(listing_type)")
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS avito.scan_progress (
            id SERIAL PRIMARY KEY,
            scan_id TEXT NOT NULL,
            phase TEXT NOT NULL,
            category TEXT,
            page INTEGER,
            status TEXT DEFAULT 'pending',
            items_found INTEGER DEFAULT 0,
            error_message TEXT,
            started_at TIMESTAMPTZ,
            finished_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_scan_progress_scan_id ON avito.scan_progress(scan_id)",
    )
    .execute(pool)
    .await?;

    tracing::info!(schema = crate::db::SCHEMA, "Auto-migration complete");
    Ok(())
}
