// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Business logic services.

pub mod avito;
pub mod extract;
pub mod scanner;

pub use avito::AvitoClient;
pub use scanner::{ScanScope, Scanner};
