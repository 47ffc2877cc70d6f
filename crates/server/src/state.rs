//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::postal::{LookupError, PostalLookup, ViaCepClient};
use crate::services::ClientService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the database pool and the client service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: SqlitePool,
    clients: ClientService,
}

impl AppState {
    /// Create a new application state backed by the configured ViaCEP service.
    ///
    /// # Errors
    ///
    /// Returns an error if the postal lookup HTTP client cannot be built.
    pub fn new(config: &ServerConfig, pool: SqlitePool) -> Result<Self, LookupError> {
        let lookup = Arc::new(ViaCepClient::new(&config.postal)?);
        Ok(Self::with_lookup(pool, lookup))
    }

    /// Create a new application state with an explicit postal lookup.
    #[must_use]
    pub fn with_lookup(pool: SqlitePool, lookup: Arc<dyn PostalLookup>) -> Self {
        let clients = ClientService::new(pool.clone(), lookup);

        Self {
            inner: Arc::new(AppStateInner {
                pool,
                clients,
            }),
        }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    /// Get a reference to the client service.
    #[must_use]
    pub fn clients(&self) -> &ClientService {
        &self.inner.clients
    }
}
