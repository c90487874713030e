// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use avito_tracker::config::Config;
use avito_tracker::db::Db;
use avito_tracker::routes::create_router;
use avito_tracker::services::{AvitoClient, Scanner};
use avito_tracker::AppState;
use std::sync::Arc;

/// Create a test app with an offline (disconnected) database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::default())
}

/// Create a test app whose fetch layer points at `base_url`
/// (typically an httpmock server).
#[allow(dead_code)]
pub fn create_test_app_with_base_url(base_url: &str) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config {
        base_url: base_url.to_string(),
        ..Config::default()
    })
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = Db::disconnected();
    let client = AvitoClient::new(&config).expect("Failed to build Avito client");
    let scanner = Arc::new(Scanner::new(client, db.clone(), config.clone()));

    let state = Arc::new(AppState {
        config,
        db,
        scanner,
    });

    (create_router(state.clone()), state)
}
