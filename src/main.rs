// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Avito-Tracker API Server
//!
//! Collects house and listing data for Yoshkar-Ola from Avito and
//! serves it over a REST API, with scan control and monitoring.

use avito_tracker::{
    config::Config,
    db::Db,
    services::{AvitoClient, Scanner},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Avito-Tracker API");

    // Connect to Postgres. The service stays up without a database
    // (reads serve empty results) so /monitoring can still report.
    let db = match Db::connect(&config).await {
        Ok(db) => {
            tracing::info!("Database initialized");
            db
        }
        Err(e) => {
            tracing::warn!(error = %e, "Database unavailable, running degraded");
            Db::disconnected()
        }
    };

    // Avito fetch client and scan orchestrator
    let client = AvitoClient::new(&config).expect("Failed to build Avito client");
    let scanner = Arc::new(Scanner::new(client, db.clone(), config.clone()));

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        scanner,
    });

    // Build router
    let app = avito_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("avito_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
