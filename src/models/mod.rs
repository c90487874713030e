// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for API and storage.

pub mod house;
pub mod listing;
pub mod scan;

pub use house::House;
pub use listing::Listing;
pub use scan::{MonitoringResponse, ScanRunState, ScanStatus, StatsResponse};
