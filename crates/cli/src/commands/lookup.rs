//! Postal code lookup command.
//!
//! # Usage
//!
//! ```bash
//! registry-cli lookup 01001-000
//! POSTAL_LOOKUP_URL=http://localhost:9000/ws registry-cli lookup 01001000
//! ```
//!
//! # Environment Variables
//!
//! - `POSTAL_LOOKUP_URL` - Base URL of the ViaCEP-compatible service
//! - `POSTAL_LOOKUP_TIMEOUT_SECS` - Request timeout in seconds

use client_registry_core::{PostalCode, PostalCodeError};
use client_registry_server::config::{ConfigError, ServerConfig};
use client_registry_server::postal::{LookupError, PostalLookup, ViaCepClient};
use thiserror::Error;

/// Errors that can occur during a lookup.
#[derive(Debug, Error)]
pub enum LookupCommandError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The argument is not a postal code.
    #[error("Invalid postal code: {0}")]
    InvalidPostalCode(#[from] PostalCodeError),

    /// The lookup service failed or does not know the code.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The address could not be printed.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Resolve a postal code and print the address to stdout as JSON.
///
/// # Errors
///
/// Returns `LookupCommandError` if the code is malformed or cannot be resolved.
pub async fn resolve(raw: &str) -> Result<(), LookupCommandError> {
    let config = ServerConfig::from_env()?;
    let postal_code = PostalCode::parse(raw)?;

    tracing::info!(%postal_code, base_url = %config.postal.base_url, "Resolving postal code");
    let client = ViaCepClient::new(&config.postal)?;
    let address = client.resolve(&postal_code).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&address)?);
    }
    Ok(())
}
