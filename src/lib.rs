// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Avito-Tracker: housing data for Yoshkar-Ola, collected from Avito
//!
//! This crate provides the backend API for scanning Avito real-estate
//! pages and serving the collected house and listing records.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::Db;
use services::Scanner;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub scanner: Arc<Scanner>,
}
