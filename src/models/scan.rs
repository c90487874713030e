// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Scan progress snapshot and stats/monitoring response types.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Stats;
use crate::time_utils::format_age;

/// Data older than this triggers a staleness alert on `/monitoring`.
const STALE_AFTER_HOURS: i64 = 48;

/// Lifecycle of a scan run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanRunState {
    Idle,
    Running,
    Completed,
    Error,
    Stopped,
}

/// Point-in-time snapshot of the scan state machine, served by
/// `GET /scan/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatus {
    pub status: ScanRunState,
    /// Current phase label (`phase1_search` / `phase2_houses`)
    pub phase: Option<String>,
    /// Search category currently being scanned
    pub category: Option<String>,
    pub total_pages: u32,
    pub done_pages: u32,
    pub total_houses: u32,
    pub done_houses: u32,
    pub new_houses: u32,
    pub listings_found: u32,
    pub errors: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self {
            status: ScanRunState::Idle,
            phase: None,
            category: None,
            total_pages: 0,
            done_pages: 0,
            total_houses: 0,
            done_houses: 0,
            new_houses: 0,
            listings_found: 0,
            errors: 0,
            started_at: None,
            message: None,
        }
    }
}

/// Aggregate counts served by `GET /stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_houses: i64,
    pub total_listings: i64,
    pub listings_sale: i64,
    pub listings_rent_long: i64,
    pub listings_rent_short: i64,
    pub houses_with_details: i64,
    pub last_scan: Option<DateTime<Utc>>,
}

impl From<Stats> for StatsResponse {
    fn from(stats: Stats) -> Self {
        Self {
            total_houses: stats.total_houses,
            total_listings: stats.total_listings,
            listings_sale: stats.listings_sale,
            listings_rent_long: stats.listings_rent_long,
            listings_rent_short: stats.listings_rent_short,
            houses_with_details: stats.houses_with_details,
            last_scan: stats.last_scan,
        }
    }
}

/// Health summary served by `GET /monitoring`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringResponse {
    /// `ok` when no alerts fired, `warning` otherwise
    pub status: String,
    pub service: String,
    pub total_houses: i64,
    pub total_listings: i64,
    pub last_scan: Option<DateTime<Utc>>,
    pub alerts: Vec<String>,
}

impl MonitoringResponse {
    /// Evaluate alert rules against the current stats.
    pub fn evaluate(stats: &Stats, now: DateTime<Utc>) -> Self {
        let mut alerts = Vec::new();

        if let Some(last_scan) = stats.last_scan {
            let age = now - last_scan;
            if age > Duration::hours(STALE_AFTER_HOURS) {
                alerts.push(format!("Data stale: last scan {} ago", format_age(age)));
            }
        }

        if stats.total_houses == 0 {
            alerts.push("No houses in database".to_string());
        }

        let status = if alerts.is_empty() { "ok" } else { "warning" };

        Self {
            status: status.to_string(),
            service: "avito-tracker".to_string(),
            total_houses: stats.total_houses,
            total_listings: stats.total_listings,
            last_scan: stats.last_scan,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with(total_houses: i64, last_scan: Option<DateTime<Utc>>) -> Stats {
        Stats {
            total_houses,
            total_listings: 10,
            last_scan,
            ..Stats::default()
        }
    }

    #[test]
    fn test_fresh_data_is_ok() {
        let now = Utc::now();
        let stats = stats_with(5, Some(now - Duration::hours(2)));

        let resp = MonitoringResponse::evaluate(&stats, now);

        assert_eq!(resp.status, "ok");
        assert!(resp.alerts.is_empty());
    }

    #[test]
    fn test_stale_data_fires_alert() {
        let now = Utc::now();
        let stats = stats_with(5, Some(now - Duration::hours(50)));

        let resp = MonitoringResponse::evaluate(&stats, now);

        assert_eq!(resp.status, "warning");
        assert_eq!(resp.alerts.len(), 1);
        assert!(resp.alerts[0].contains("2d 2h"));
    }

    #[test]
    fn test_empty_database_fires_alert() {
        let now = Utc::now();
        let stats = stats_with(0, None);

        let resp = MonitoringResponse::evaluate(&stats, now);

        assert_eq!(resp.status, "warning");
        assert_eq!(resp.alerts, vec!["No houses in database".to_string()]);
    }

    #[test]
    fn test_exactly_48h_is_not_stale() {
        let now = Utc::now();
        let stats = stats_with(5, Some(now - Duration::hours(48)));

        let resp = MonitoringResponse::evaluate(&stats, now);

        assert_eq!(resp.status, "ok");
    }
}
