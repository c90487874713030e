// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scanner integration tests against a mock Avito server.
//!
//! The database stays disconnected, so writes are dropped and the
//! phase 1b / phase 2 work queues are empty; these tests exercise the
//! pagination walk, state machine and error handling of the scan loop.

use avito_tracker::config::Config;
use avito_tracker::db::Db;
use avito_tracker::models::ScanRunState;
use avito_tracker::services::{AvitoClient, Scanner};
use httpmock::prelude::*;
use serde_json::json;

const SALE_SLUG: &str = "prodam-ASgBAgICAUSSA8YQ";
const RENT_SLUG: &str = "sdam-ASgBAgICAUSSA8gQ";

fn search_page_html(items: serde_json::Value) -> String {
    let hydration = json!({
        "loaderData": {
            "catalog-or-main-or-item": {
                "searchResult": { "items": items }
            }
        }
    });
    format!(
        "<html><script>window.__staticRouterHydrationData = {};</script></html>",
        hydration
    )
}

fn scanner_for(server: &MockServer) -> Scanner {
    let config = Config {
        base_url: server.base_url(),
        ..Config::default()
    };
    let client = AvitoClient::new(&config).expect("Failed to build Avito client");
    Scanner::new(client, Db::disconnected(), config)
}

#[tokio::test]
async fn test_full_scan_walks_pagination_to_completion() {
    let server = MockServer::start();

    // Sale category: one page of items, then the end of pagination
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/yoshkar-ola/kvartiry/{}", SALE_SLUG))
            .query_param("p", "1");
        then.status(200).body(search_page_html(json!([
            { "id": 1, "title": "1-к. квартира, 37,5 м², 8/10 эт.",
              "priceDetailed": { "value": 2_500_000, "postfix": "" },
              "urlPath": "/yoshkar-ola/kvartiry/item_1" },
            { "id": 2, "title": "2-к. квартира, 54 м², 3/9 эт.",
              "priceDetailed": { "value": 3_900_000, "postfix": "" },
              "urlPath": "/yoshkar-ola/kvartiry/item_2" }
        ])));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/yoshkar-ola/kvartiry/{}", SALE_SLUG))
            .query_param("p", "2");
        then.status(200).body(search_page_html(json!([])));
    });

    // Rent category: empty from the start
    server.mock(|when, then| {
        when.method(GET)
            .path(format!("/yoshkar-ola/kvartiry/{}", RENT_SLUG))
            .query_param("p", "1");
        then.status(200).body(search_page_html(json!([])));
    });

    let scanner = scanner_for(&server);
    assert!(scanner.try_begin().await);
    scanner.run(avito_tracker::services::ScanScope::Full).await;

    let status = scanner.status().await;
    assert_eq!(status.status, ScanRunState::Completed);
    assert_eq!(status.listings_found, 2);
    assert_eq!(status.done_pages, 1);
    assert_eq!(status.errors, 0);
    assert!(status.started_at.is_some());
    assert!(status
        .message
        .as_deref()
        .is_some_and(|m| m.contains("completed")));
}

#[tokio::test]
async fn test_scan_survives_fetch_failures() {
    // No mocks at all: every fetch gets a 404 until the consecutive
    // error cap trips for each category.
    let server = MockServer::start();

    let scanner = scanner_for(&server);
    assert!(scanner.try_begin().await);
    scanner.run(avito_tracker::services::ScanScope::Full).await;

    let status = scanner.status().await;
    assert_eq!(status.status, ScanRunState::Completed);
    assert_eq!(status.listings_found, 0);
    assert_eq!(status.done_pages, 0);
}

#[tokio::test]
async fn test_stop_before_run_ends_stopped() {
    let server = MockServer::start();

    let scanner = scanner_for(&server);
    assert!(scanner.try_begin().await);
    assert!(scanner.request_stop().await);
    scanner.run(avito_tracker::services::ScanScope::Full).await;

    let status = scanner.status().await;
    assert_eq!(status.status, ScanRunState::Stopped);
    assert!(status
        .message
        .as_deref()
        .is_some_and(|m| m.contains("stopped")));
}

#[tokio::test]
async fn test_houses_only_scope_skips_search() {
    let server = MockServer::start();
    let catch_all = server.mock(|when, then| {
        when.method(GET).path_contains("/");
        then.status(404);
    });

    let scanner = scanner_for(&server);
    assert!(scanner.try_begin().await);
    scanner
        .run(avito_tracker::services::ScanScope::HousesOnly)
        .await;

    let status = scanner.status().await;
    assert_eq!(status.status, ScanRunState::Completed);
    // Search never ran, only phase 2 touched the state
    assert_eq!(status.phase.as_deref(), Some("phase2_houses"));
    assert_eq!(status.done_pages, 0);

    // Nothing was fetched: the phase 2 work queue is empty offline
    assert_eq!(catch_all.hits(), 0);
}
