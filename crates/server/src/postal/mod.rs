//! Postal code lookup.
//!
//! # Architecture
//!
//! - [`PostalLookup`] is the seam the client service depends on, so tests and
//!   alternative providers can stand in for the network client
//! - [`ViaCepClient`] talks to a ViaCEP-compatible JSON API over `reqwest`
//! - No caching and no retries here; the address table is the cache
//!
//! # Example
//!
//! ```rust,ignore
//! use client_registry_server::postal::{PostalLookup, ViaCepClient};
//!
//! let client = ViaCepClient::new(&config.postal)?;
//! let address = client.resolve(&"01001-000".parse()?).await?;
//! ```

mod viacep;

pub use viacep::ViaCepClient;

use async_trait::async_trait;
use thiserror::Error;

use client_registry_core::PostalCode;

use crate::models::Address;

/// Errors that can occur when resolving a postal code.
#[derive(Debug, Error)]
pub enum LookupError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service does not know the postal code or rejected its format.
    #[error("Postal code not found: {0}")]
    NotFound(PostalCode),

    /// The service answered with an unexpected status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl LookupError {
    /// Whether the failure means the code itself is unknown, as opposed to the
    /// service being unreachable or misbehaving.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Resolves postal codes into addresses.
#[async_trait]
pub trait PostalLookup: Send + Sync {
    /// Resolve a postal code.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::NotFound` for unknown codes and another variant
    /// when the service could not be queried.
    async fn resolve(&self, postal_code: &PostalCode) -> Result<Address, LookupError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_error_display() {
        let err = LookupError::NotFound(PostalCode::parse("00000-000").unwrap());
        assert_eq!(err.to_string(), "Postal code not found: 00000000");
        assert!(err.is_not_found());

        let err = LookupError::Api {
            status: 503,
            message: "down".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 503 - down");
        assert!(!err.is_not_found());
    }
}
