//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool, or open an atomic transaction and
//! pass `&mut *tx` through to the functions without any other changes.
//!
//! Statements with a `RETURNING` clause are always read with `fetch_all`. A write whose statement is left unfinished
//! keeps its implicit transaction open, and the change stays invisible to the other connections in the pool.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod catalog;
pub mod orders;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/storefront.db";

pub fn db_url() -> String {
    let result = env::var("SF_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ SF_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// The single row produced by an `INSERT ... RETURNING` statement.
pub(crate) fn returned_row<T>(mut rows: Vec<T>) -> Result<T, SqlxError> {
    rows.pop().ok_or(SqlxError::RowNotFound)
}
