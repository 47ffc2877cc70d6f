//! Database operations for the client registry.
//!
//! # Database
//!
//! An embedded `SQLite` database (in-memory by default) holding:
//!
//! ## Tables
//!
//! - `addresses` - Resolved addresses keyed by canonical postal code
//! - `clients` - Client records referencing an address by postal code
//!
//! # Schema
//!
//! The schema lives in `crates/server/schema.sql` and is applied idempotently
//! at startup by [`init_schema`], or on demand with:
//! ```bash
//! cargo run -p client-registry-cli -- schema
//! ```

mod addresses;
mod clients;

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

pub use addresses::AddressRepository;
pub use clients::ClientRepository;

/// Schema applied by [`init_schema`].
pub const SCHEMA: &str = include_str!("../../schema.sql");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Constraint violation (e.g., a client pointing at an unknown address).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool.
///
/// In-memory databases exist per connection, so they get a single connection
/// that is never reaped; file databases get a regular pool and are created if
/// missing.
///
/// # Arguments
///
/// * `database_url` - `SQLite` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be
/// established.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let url = database_url.expose_secret();
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if is_in_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(10).min_connections(1)
    };

    pool_options
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create the registry tables if they do not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if a statement fails.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Fresh in-memory database with the schema applied.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = create_pool(&SecretString::from("sqlite::memory:"))
        .await
        .expect("in-memory database");
    init_schema(&pool).await.expect("schema");
    pool
}
