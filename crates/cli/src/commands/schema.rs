//! Database schema command.
//!
//! # Usage
//!
//! ```bash
//! REGISTRY_DATABASE_URL=sqlite://registry.db registry-cli schema
//! ```
//!
//! # Environment Variables
//!
//! - `REGISTRY_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)
//!
//! Applying the schema to the default in-memory database only checks that
//! the statements are valid; nothing outlives the command.

use client_registry_server::config::{ConfigError, ServerConfig};
use client_registry_server::db;
use thiserror::Error;

/// Errors that can occur while applying the schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection or statement error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the configured database and create any missing tables.
///
/// # Errors
///
/// Returns `SchemaError` if configuration is invalid or a statement fails.
pub async fn apply() -> Result<(), SchemaError> {
    let config = ServerConfig::from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    tracing::info!("Applying schema...");
    db::init_schema(&pool).await?;

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .fetch_all(&pool)
    .await?;

    tracing::info!(tables = ?tables, "Schema applied");
    Ok(())
}
