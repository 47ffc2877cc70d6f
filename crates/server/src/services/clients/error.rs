//! Client service error types.

use std::sync::Arc;

use thiserror::Error;

use client_registry_core::{ClientId, PostalCodeError};

use crate::db::RepositoryError;
use crate::postal::LookupError;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No client with this ID.
    #[error("client {0} not found")]
    NotFound(ClientId),

    /// The postal code in the request is malformed.
    #[error("invalid postal code: {0}")]
    InvalidPostalCode(#[from] PostalCodeError),

    /// The postal lookup failed (unknown code or service unavailable).
    #[error("address lookup failed: {0}")]
    AddressLookupFailed(#[from] LookupError),

    /// Repository/database error.
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] RepositoryError),

    /// Failure of a concurrent resolution of the same postal code that this
    /// request waited on.
    #[error("{0}")]
    Shared(Arc<ClientError>),
}

impl ClientError {
    /// The underlying error, looking through [`ClientError::Shared`].
    #[must_use]
    pub fn unshared(&self) -> &Self {
        match self {
            Self::Shared(inner) => inner.unshared(),
            other => other,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use client_registry_core::PostalCode;

    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ClientError::NotFound(ClientId::new(4)).to_string(),
            "client 4 not found"
        );
        assert_eq!(
            ClientError::from(PostalCodeError::Empty).to_string(),
            "invalid postal code: postal code cannot be empty"
        );
    }

    #[test]
    fn test_unshared_looks_through_nesting() {
        let root = ClientError::AddressLookupFailed(LookupError::NotFound(
            PostalCode::parse("12345").unwrap(),
        ));
        let shared = ClientError::Shared(Arc::new(ClientError::Shared(Arc::new(root))));

        assert!(matches!(
            shared.unshared(),
            ClientError::AddressLookupFailed(LookupError::NotFound(_))
        ));
        assert_eq!(shared.to_string(), "address lookup failed: Postal code not found: 12345");
    }
}
