// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan orchestration: phase 1 (search listings) + phase 2 (house details).
//!
//! One scan runs at a time. The state machine is `idle → running →
//! completed | stopped | error`; progress counters and a human-readable
//! message are updated throughout and served by `GET /scan/status`.
//! Stop is cooperative: a flag checked between fetches, so the in-flight
//! request always completes.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::{Config, SEARCH_CATEGORIES};
use crate::db::Db;
use crate::error::AppError;
use crate::models::{ScanRunState, ScanStatus};
use crate::services::{extract, AvitoClient};

/// Which phases a scan run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanScope {
    Full,
    SearchOnly,
    HousesOnly,
}

impl ScanScope {
    /// Parse the `phase` query parameter: `1` = search only,
    /// `2` = houses only, absent = full scan.
    pub fn from_param(phase: Option<&str>) -> Result<Self, AppError> {
        match phase {
            None => Ok(ScanScope::Full),
            Some("1") => Ok(ScanScope::SearchOnly),
            Some("2") => Ok(ScanScope::HousesOnly),
            Some(other) => Err(AppError::BadRequest(format!(
                "Unknown phase '{}': expected 1 or 2",
                other
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScanScope::Full => "full",
            ScanScope::SearchOnly => "1",
            ScanScope::HousesOnly => "2",
        }
    }

    fn includes_search(&self) -> bool {
        matches!(self, ScanScope::Full | ScanScope::SearchOnly)
    }

    fn includes_houses(&self) -> bool {
        matches!(self, ScanScope::Full | ScanScope::HousesOnly)
    }
}

struct ScanState {
    status: ScanStatus,
    stop_requested: bool,
}

/// Scan orchestrator. One instance lives in the app state; scans run on
/// a spawned task and publish progress through the shared state.
pub struct Scanner {
    client: AvitoClient,
    db: Db,
    config: Config,
    state: RwLock<ScanState>,
}

impl Scanner {
    pub fn new(client: AvitoClient, db: Db, config: Config) -> Self {
        Self {
            client,
            db,
            config,
            state: RwLock::new(ScanState {
                status: ScanStatus::default(),
                stop_requested: false,
            }),
        }
    }

    /// Current progress snapshot.
    pub async fn status(&self) -> ScanStatus {
        self.state.read().await.status.clone()
    }

    /// Request a cooperative stop. Returns false if no scan is running.
    pub async fn request_stop(&self) -> bool {
        let mut state = self.state.write().await;
        if state.status.status == ScanRunState::Running {
            state.stop_requested = true;
            state.status.message =
                Some("Stop requested, finishing current operation...".to_string());
            return true;
        }
        false
    }

    /// Claim the scanner for a new run: flips idle/terminal state to
    /// running and resets all counters. Returns false when a scan is
    /// already running (the caller turns this into a 409).
    pub async fn try_begin(&self) -> bool {
        let mut state = self.state.write().await;
        if state.status.status == ScanRunState::Running {
            return false;
        }

        state.status = ScanStatus {
            status: ScanRunState::Running,
            started_at: Some(Utc::now()),
            message: Some("Starting scan...".to_string()),
            ..ScanStatus::default()
        };
        state.stop_requested = false;
        true
    }

    /// Run a scan claimed via [`Scanner::try_begin`] to completion.
    pub async fn run(&self, scope: ScanScope) {
        let scan_id = short_scan_id();
        tracing::info!(scan_id = %scan_id, scope = scope.label(), "Scan starting");

        match self.run_phases(&scan_id, scope).await {
            Ok(()) => {
                let final_state = if self.is_stop_requested().await {
                    ScanRunState::Stopped
                } else {
                    ScanRunState::Completed
                };
                let verb = match final_state {
                    ScanRunState::Stopped => "stopped",
                    _ => "completed",
                };

                let mut state = self.state.write().await;
                let message = format!(
                    "Scan {}. Houses: {} new, Listings: {}",
                    verb, state.status.new_houses, state.status.listings_found
                );
                state.status.status = final_state;
                state.status.message = Some(message);
                tracing::info!(
                    scan_id = %scan_id,
                    listings = state.status.listings_found,
                    new_houses = state.status.new_houses,
                    "Scan {}",
                    verb
                );
            }
            Err(e) => {
                tracing::error!(scan_id = %scan_id, error = %e, "Scan failed");
                let mut state = self.state.write().await;
                state.status.status = ScanRunState::Error;
                state.status.message = Some(format!("Scan error: {}", e));
            }
        }
    }

    async fn run_phases(&self, scan_id: &str, scope: ScanScope) -> Result<(), AppError> {
        if scope.includes_search() {
            self.run_phase1(scan_id).await?;
        }

        if self.is_stop_requested().await {
            return Ok(());
        }

        if scope.includes_houses() {
            self.run_phase2(scan_id).await?;
        }

        Ok(())
    }

    // ─── Phase 1: search pages ───────────────────────────────────

    /// Scan search pages for all categories, then resolve address IDs
    /// for listings that lack one.
    async fn run_phase1(&self, scan_id: &str) -> Result<(), AppError> {
        self.update(|s| {
            s.phase = Some("phase1_search".to_string());
            s.message = Some("Phase 1: Scanning search pages...".to_string());
        })
        .await;

        for &(category, category_slug) in SEARCH_CATEGORIES {
            if self.is_stop_requested().await {
                return Ok(());
            }

            self.update(|s| {
                s.category = Some(category.to_string());
                s.message = Some(format!("Phase 1: Scanning {}...", category));
            })
            .await;

            self.scan_category(scan_id, category, category_slug).await?;
        }

        self.update(|s| {
            s.message = Some("Phase 1: Resolving addressIds from listing pages...".to_string());
        })
        .await;
        self.resolve_address_ids().await?;

        Ok(())
    }

    /// Walk one category's search pagination until an empty page or too
    /// many consecutive fetch failures.
    async fn scan_category(
        &self,
        scan_id: &str,
        category: &str,
        category_slug: &str,
    ) -> Result<(), AppError> {
        let mut consecutive_errors = 0u32;
        let mut page = 1u32;

        loop {
            if self.is_stop_requested().await {
                return Ok(());
            }

            self.update(|s| {
                s.message = Some(format!("Phase 1: {} page {}...", category, page));
            })
            .await;

            let html = match self.client.fetch_search_page(category_slug, page).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::debug!(category, page, error = %e, "Search page fetch failed");
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        tracing::warn!(category, "Too many errors, stopping category");
                        return Ok(());
                    }
                    self.sleep_search().await;
                    page += 1;
                    continue;
                }
            };

            let items = extract::parse_search_page(&html, &self.config.base_url);
            if items.is_empty() {
                // End of pagination
                tracing::info!(category, page, "No items on page, category done");
                return Ok(());
            }
            consecutive_errors = 0;

            let found = items.len();
            for item in items {
                let listing = item.into_listing(category);
                if let Err(e) = self.db.upsert_listing(&listing).await {
                    tracing::debug!(item_id = listing.item_id, error = %e, "Failed to upsert listing");
                }
            }

            self.update(|s| {
                s.listings_found += found as u32;
                s.done_pages += 1;
            })
            .await;

            self.db
                .save_scan_progress(scan_id, "phase1", category, page as i32, "done", found as i32, None)
                .await?;

            tracing::info!(category, page, items = found, "Phase 1 page done");

            self.sleep_search().await;
            page += 1;
        }
    }

    /// Visit listing pages to extract each listing's address ID, link it
    /// and pre-create the house row.
    async fn resolve_address_ids(&self) -> Result<(), AppError> {
        let rows = self.db.listings_without_address().await?;
        if rows.is_empty() {
            tracing::info!("No listings without address_id to process");
            return Ok(());
        }

        let total = rows.len();
        self.update(|s| {
            s.message = Some(format!("Phase 1: Resolving addressIds for {} listings...", total));
        })
        .await;

        let mut consecutive_errors = 0u32;
        let mut resolved = 0usize;

        for (idx, (item_id, url)) in rows.into_iter().enumerate() {
            if self.is_stop_requested().await {
                return Ok(());
            }

            if idx % 50 == 0 {
                self.update(|s| {
                    s.message = Some(format!("Phase 1: addressId {}/{}...", idx, total));
                })
                .await;
            }

            let html = match self.client.fetch_listing_page(&url).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::debug!(item_id, error = %e, "Listing page fetch failed");
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        tracing::warn!("Too many errors resolving addressIds, stopping");
                        return Ok(());
                    }
                    self.sleep_search().await;
                    continue;
                }
            };
            consecutive_errors = 0;

            if let Some(detail) = extract::parse_listing_page(&html) {
                if let Some(address_id) = detail.address_id {
                    self.db.set_listing_address(item_id, address_id).await?;
                    resolved += 1;

                    if let Err(e) = self
                        .db
                        .ensure_house(
                            address_id,
                            detail.slug.as_deref(),
                            detail.address.as_deref(),
                            detail.lat,
                            detail.lng,
                        )
                        .await
                    {
                        tracing::debug!(address_id, error = %e, "Failed to pre-create house");
                    }
                }
            }

            self.sleep_search().await;
        }

        tracing::info!(resolved, "Phase 1 complete: address IDs collected");
        Ok(())
    }

    // ─── Phase 2: house details ──────────────────────────────────

    /// Fetch full details for houses that lack them.
    async fn run_phase2(&self, scan_id: &str) -> Result<(), AppError> {
        self.update(|s| {
            s.phase = Some("phase2_houses".to_string());
            s.message = Some("Phase 2: Fetching house details...".to_string());
        })
        .await;

        let rows = self.db.houses_without_details().await?;
        if rows.is_empty() {
            tracing::info!("Phase 2: All houses already have details");
            self.update(|s| {
                s.message = Some("Phase 2: No new houses to process".to_string());
            })
            .await;
            return Ok(());
        }

        let total = rows.len();
        self.update(|s| {
            s.total_houses = total as u32;
            s.message = Some(format!("Phase 2: {} houses to process...", total));
        })
        .await;

        let mut consecutive_errors = 0u32;

        for (idx, (address_id, slug)) in rows.into_iter().enumerate() {
            if self.is_stop_requested().await {
                return Ok(());
            }

            self.update(|s| {
                s.done_houses = idx as u32;
                s.message = Some(format!(
                    "Phase 2: House {}/{} (id={})...",
                    idx + 1,
                    total,
                    address_id
                ));
            })
            .await;

            let html = match self.client.fetch_house_page(&slug, address_id).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::debug!(address_id, error = %e, "House page fetch failed");
                    self.update(|s| s.errors += 1).await;
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        tracing::warn!("Too many consecutive errors in Phase 2, stopping");
                        break;
                    }
                    self.sleep_house().await;
                    continue;
                }
            };
            consecutive_errors = 0;

            match extract::parse_house_page(&html) {
                Some(details) => {
                    let house = details.into_house(address_id, Some(slug.clone()));
                    match self.db.upsert_house(&house).await {
                        Ok(()) => self.update(|s| s.new_houses += 1).await,
                        Err(e) => {
                            tracing::error!(address_id, error = %e, "Failed to save house");
                            self.update(|s| s.errors += 1).await;
                        }
                    }

                    self.db
                        .save_scan_progress(
                            scan_id,
                            "phase2",
                            &format!("house_{}", address_id),
                            0,
                            "done",
                            1,
                            None,
                        )
                        .await?;
                }
                None => {
                    tracing::warn!(address_id, "No data extracted for house");
                    self.db
                        .save_scan_progress(
                            scan_id,
                            "phase2",
                            &format!("house_{}", address_id),
                            0,
                            "error",
                            0,
                            Some("No data extracted"),
                        )
                        .await?;
                    self.update(|s| s.errors += 1).await;
                }
            }

            self.sleep_house().await;
        }

        self.update(|s| s.done_houses = total as u32).await;
        let status = self.status().await;
        tracing::info!(
            processed = status.new_houses,
            total,
            "Phase 2 complete"
        );
        Ok(())
    }

    // ─── State helpers ───────────────────────────────────────────

    async fn is_stop_requested(&self) -> bool {
        self.state.read().await.stop_requested
    }

    async fn update<F: FnOnce(&mut ScanStatus)>(&self, f: F) {
        let mut state = self.state.write().await;
        f(&mut state.status);
    }

    async fn sleep_search(&self) {
        tokio::time::sleep(Duration::from_secs_f64(self.config.scan_delay_search)).await;
    }

    async fn sleep_house(&self) {
        tokio::time::sleep(Duration::from_secs_f64(self.config.scan_delay_house)).await;
    }
}

/// Short run tag for `scan_progress` rows, derived from the start time.
fn short_scan_id() -> String {
    let hex = format!("{:x}", Utc::now().timestamp_micros());
    hex[hex.len().saturating_sub(8)..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_param() {
        assert_eq!(ScanScope::from_param(None).unwrap(), ScanScope::Full);
        assert_eq!(ScanScope::from_param(Some("1")).unwrap(), ScanScope::SearchOnly);
        assert_eq!(ScanScope::from_param(Some("2")).unwrap(), ScanScope::HousesOnly);
        assert!(ScanScope::from_param(Some("3")).is_err());
    }

    #[test]
    fn test_scope_coverage() {
        assert!(ScanScope::Full.includes_search());
        assert!(ScanScope::Full.includes_houses());
        assert!(ScanScope::SearchOnly.includes_search());
        assert!(!ScanScope::SearchOnly.includes_houses());
        assert!(!ScanScope::HousesOnly.includes_search());
        assert!(ScanScope::HousesOnly.includes_houses());
    }

    #[test]
    fn test_short_scan_id_shape() {
        let id = short_scan_id();
        assert!(!id.is_empty());
        assert!(id.len() <= 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_begin_and_stop_transitions() {
        let config = Config::default();
        let client = AvitoClient::new(&config).expect("client");
        let scanner = Scanner::new(client, Db::disconnected(), config);

        // Nothing running yet
        assert!(!scanner.request_stop().await);
        assert_eq!(scanner.status().await.status, ScanRunState::Idle);

        // Claim, then a second claim must fail
        assert!(scanner.try_begin().await);
        assert!(!scanner.try_begin().await);
        assert_eq!(scanner.status().await.status, ScanRunState::Running);

        // Stop is accepted while running
        assert!(scanner.request_stop().await);
    }
}
