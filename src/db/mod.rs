//! Database layer (PostgreSQL via sqlx).

pub mod postgres;

pub use postgres::{Db, Stats};

/// Schema holding all tables.
pub const SCHEMA: &str = "avito";
