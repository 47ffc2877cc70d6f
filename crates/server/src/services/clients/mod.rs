//! Client service.
//!
//! CRUD over client records. Every write first attaches the shared address
//! for the client's postal code, resolving it through the postal lookup and
//! storing it when the address table does not know the code yet. Each postal
//! code is therefore looked up at most once.

mod error;

pub use error::ClientError;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::SqlitePool;
use tracing::{debug, info, instrument, warn};

use client_registry_core::{ClientId, PostalCode};

use crate::db::{AddressRepository, ClientRepository};
use crate::models::{Address, Client, ClientInput, ClientRecord};
use crate::postal::PostalLookup;

/// How long a freshly resolved address stays in the in-flight cache.
///
/// Only requests that raced on the same miss read this cache; everybody else
/// goes to the address table.
const INFLIGHT_TTL: Duration = Duration::from_secs(30);

/// Client CRUD service.
///
/// Cheap to clone; all clones share the pool, the lookup and the in-flight
/// resolutions.
#[derive(Clone)]
pub struct ClientService {
    inner: Arc<ClientServiceInner>,
}

struct ClientServiceInner {
    pool: SqlitePool,
    lookup: Arc<dyn PostalLookup>,
    inflight: Cache<PostalCode, Address>,
}

impl ClientService {
    /// Create a new client service.
    #[must_use]
    pub fn new(pool: SqlitePool, lookup: Arc<dyn PostalLookup>) -> Self {
        let inflight = Cache::builder()
            .max_capacity(1000)
            .time_to_live(INFLIGHT_TTL)
            .build();

        Self {
            inner: Arc::new(ClientServiceInner {
                pool,
                lookup,
                inflight,
            }),
        }
    }

    /// List all clients with their addresses.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::PersistenceFailed` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Client>, ClientError> {
        Ok(self.clients().find_all().await?)
    }

    /// Get a client by ID.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the ID does not exist.
    /// Returns `ClientError::PersistenceFailed` if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: ClientId) -> Result<Client, ClientError> {
        self.clients()
            .find_by_id(id)
            .await?
            .ok_or(ClientError::NotFound(id))
    }

    /// Create a client, attaching the address for its postal code.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidPostalCode` if the postal code is malformed.
    /// Returns `ClientError::AddressLookupFailed` if the address had to be
    /// looked up and the lookup failed.
    /// Returns `ClientError::PersistenceFailed` on storage errors.
    #[instrument(skip(self, input), fields(postal_code = %input.address.postal_code))]
    pub async fn insert(&self, input: ClientInput) -> Result<Client, ClientError> {
        let client = self.save_with_address(None, input).await?;
        info!(client_id = %client.id, "Client created");
        Ok(client)
    }

    /// Whether a client with this ID is stored.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::PersistenceFailed` if the store cannot be read.
    pub async fn exists(&self, id: ClientId) -> Result<bool, ClientError> {
        Ok(self.clients().find_by_id(id).await?.is_some())
    }

    /// Overwrite an existing client, keeping its ID.
    ///
    /// Returns `Ok(None)` without writing anything when `id` does not exist.
    ///
    /// # Errors
    ///
    /// Same as [`ClientService::insert`].
    #[instrument(skip(self, input), fields(postal_code = %input.address.postal_code))]
    pub async fn update(
        &self,
        id: ClientId,
        input: ClientInput,
    ) -> Result<Option<Client>, ClientError> {
        if !self.exists(id).await? {
            warn!(client_id = %id, "Update skipped, client does not exist");
            return Ok(None);
        }

        let client = self.save_with_address(Some(id), input).await?;
        info!(client_id = %client.id, "Client updated");
        Ok(Some(client))
    }

    /// Delete a client. Its address is kept; unknown IDs are ignored.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::PersistenceFailed` on storage errors.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ClientId) -> Result<(), ClientError> {
        if self.clients().delete_by_id(id).await? {
            info!(client_id = %id, "Client deleted");
        } else {
            debug!(client_id = %id, "Delete of unknown client ignored");
        }
        Ok(())
    }

    /// Get the address for a postal code, looking it up and storing it on
    /// first use.
    ///
    /// Concurrent misses on the same code share one lookup.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::AddressLookupFailed` if the lookup fails.
    /// Returns `ClientError::PersistenceFailed` on storage errors.
    #[instrument(skip(self), fields(postal_code = %postal_code))]
    pub async fn resolve_address(&self, postal_code: &PostalCode) -> Result<Address, ClientError> {
        if let Some(address) = self.addresses().get(postal_code).await? {
            debug!("Address already stored");
            return Ok(address);
        }

        self.inner
            .inflight
            .try_get_with(postal_code.clone(), self.lookup_and_store(postal_code))
            .await
            .map_err(|shared| Arc::try_unwrap(shared).unwrap_or_else(ClientError::Shared))
    }

    async fn lookup_and_store(&self, postal_code: &PostalCode) -> Result<Address, ClientError> {
        let resolved = self.inner.lookup.resolve(postal_code).await?;
        let stored = self.addresses().put(&resolved).await?;
        info!(postal_code = %stored.postal_code, "Address resolved and stored");
        Ok(stored)
    }

    async fn save_with_address(
        &self,
        id: Option<ClientId>,
        input: ClientInput,
    ) -> Result<Client, ClientError> {
        let postal_code = PostalCode::parse(&input.address.postal_code)?;
        let address = self.resolve_address(&postal_code).await?;

        let client = self
            .clients()
            .save(ClientRecord {
                id,
                name: input.name,
                address,
                attributes: input.attributes,
            })
            .await?;

        Ok(client)
    }

    fn clients(&self) -> ClientRepository<'_> {
        ClientRepository::new(&self.inner.pool)
    }

    fn addresses(&self) -> AddressRepository<'_> {
        AddressRepository::new(&self.inner.pool)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Map, json};

    use super::*;
    use crate::db::test_pool;
    use crate::models::AddressInput;
    use crate::postal::LookupError;

    /// Lookup that knows a few codes and counts its calls.
    struct FakeLookup {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl FakeLookup {
        fn new() -> Arc<Self> {
            Self::with_delay(Duration::ZERO)
        }

        fn with_delay(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PostalLookup for FakeLookup {
        async fn resolve(&self, postal_code: &PostalCode) -> Result<Address, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let street = match postal_code.as_str() {
                "12345" => "Main St",
                "99999" => "Ocean Ave",
                "50300" => {
                    return Err(LookupError::Api {
                        status: 503,
                        message: "unavailable".to_string(),
                    });
                }
                _ => return Err(LookupError::NotFound(postal_code.clone())),
            };

            Ok(Address {
                postal_code: postal_code.clone(),
                street: street.to_string(),
                complement: String::new(),
                neighborhood: "Downtown".to_string(),
                city: "Springfield".to_string(),
                state: "SP".to_string(),
                ibge: None,
                ddd: None,
            })
        }
    }

    async fn service_with(lookup: &Arc<FakeLookup>) -> (ClientService, SqlitePool) {
        let pool = test_pool().await;
        let lookup: Arc<dyn PostalLookup> = lookup.clone();
        (ClientService::new(pool.clone(), lookup), pool)
    }

    fn input(name: &str, postal_code: &str) -> ClientInput {
        ClientInput {
            id: None,
            name: name.to_string(),
            address: AddressInput {
                postal_code: postal_code.to_string(),
                fields: Map::new(),
            },
            attributes: Map::new(),
        }
    }

    async fn address_count(pool: &SqlitePool) -> i64 {
        AddressRepository::new(pool).count().await.unwrap()
    }

    #[tokio::test]
    async fn test_same_postal_code_is_looked_up_once() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;

        service.insert(input("A", "12345")).await.unwrap();
        service.insert(input("B", "12345")).await.unwrap();

        assert_eq!(lookup.calls(), 1);
        assert_eq!(address_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_clients_share_the_stored_address() {
        let lookup = FakeLookup::new();
        let (service, _pool) = service_with(&lookup).await;

        let a = service.insert(input("A", "12345")).await.unwrap();
        let b = service.insert(input("B", "12345")).await.unwrap();

        assert_eq!(a.address.street, "Main St");
        assert_eq!(a.address, b.address);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_insert_then_get_returns_resolved_address() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;

        let created = service.insert(input("A", "12345")).await.unwrap();
        let fetched = service.get_by_id(created.id).await.unwrap();

        let stored = AddressRepository::new(&pool)
            .get(&PostalCode::parse("12345").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.address, stored);
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_hyphenated_code_shares_the_entry() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;

        service.insert(input("A", "12345")).await.unwrap();
        let b = service.insert(input("B", " 123-45 ")).await.unwrap();

        assert_eq!(b.address.postal_code.as_str(), "12345");
        assert_eq!(lookup.calls(), 1);
        assert_eq!(address_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_stored_address_wins_over_request_fields() {
        let lookup = FakeLookup::new();
        let (service, _pool) = service_with(&lookup).await;
        service.insert(input("A", "12345")).await.unwrap();

        let mut body = input("B", "12345");
        body.address
            .fields
            .insert("street".to_string(), json!("Somewhere Else"));
        let b = service.insert(body).await.unwrap();

        assert_eq!(b.address.street, "Main St");
    }

    #[tokio::test]
    async fn test_update_missing_id_is_a_noop() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;
        let existing = service.insert(input("A", "12345")).await.unwrap();

        let result = service
            .update(ClientId::new(42), input("Ghost", "99999"))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(service.list_all().await.unwrap(), vec![existing]);
        assert_eq!(lookup.calls(), 1);
        assert_eq!(address_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_exists() {
        let lookup = FakeLookup::new();
        let (service, _pool) = service_with(&lookup).await;
        let created = service.insert(input("A", "12345")).await.unwrap();

        assert!(service.exists(created.id).await.unwrap());
        assert!(!service.exists(ClientId::new(created.id.as_i64() + 1)).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_to_new_code_resolves_and_orphans_old_address() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;
        let created = service.insert(input("A", "12345")).await.unwrap();

        let updated = service
            .update(created.id, input("A", "99999"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.address.street, "Ocean Ave");
        assert_eq!(lookup.calls(), 2);
        assert_eq!(address_count(&pool).await, 2);

        let old = AddressRepository::new(&pool)
            .get(&PostalCode::parse("12345").unwrap())
            .await
            .unwrap();
        assert_eq!(old.unwrap().street, "Main St");

        let fetched = service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.address.postal_code.as_str(), "99999");
    }

    #[tokio::test]
    async fn test_update_replaces_fields_and_keeps_id() {
        let lookup = FakeLookup::new();
        let (service, _pool) = service_with(&lookup).await;

        let mut first = input("A", "12345");
        first.attributes.insert("vip".to_string(), json!(true));
        let created = service.insert(first).await.unwrap();

        let mut second = input("Renamed", "12345");
        second.id = Some(ClientId::new(777));
        let updated = service.update(created.id, second).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        let fetched = service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.name, "Renamed");
        assert!(fetched.attributes.is_empty());
        assert_eq!(service.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_id_is_a_noop() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;
        service.insert(input("A", "12345")).await.unwrap();

        service.delete(ClientId::new(42)).await.unwrap();

        assert_eq!(service.list_all().await.unwrap().len(), 1);
        assert_eq!(address_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found_and_keeps_address() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;
        let created = service.insert(input("A", "12345")).await.unwrap();

        service.delete(created.id).await.unwrap();

        let err = service.get_by_id(created.id).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(id) if id == created.id));
        assert_eq!(address_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_unknown_postal_code_fails_without_writes() {
        let lookup = FakeLookup::new();
        let (service, pool) = service_with(&lookup).await;

        let err = service.insert(input("A", "00000")).await.unwrap_err();

        assert!(matches!(
            err.unshared(),
            ClientError::AddressLookupFailed(LookupError::NotFound(_))
        ));
        assert!(service.list_all().await.unwrap().is_empty());
        assert_eq!(address_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_not_remembered() {
        let lookup = FakeLookup::new();
        let (service, _pool) = service_with(&lookup).await;

        let first = service.insert(input("A", "50300")).await.unwrap_err();
        let second = service.insert(input("A", "50300")).await.unwrap_err();

        assert!(matches!(
            first.unshared(),
            ClientError::AddressLookupFailed(LookupError::Api { status: 503, .. })
        ));
        assert!(matches!(second.unshared(), ClientError::AddressLookupFailed(_)));
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn test_malformed_postal_code_skips_lookup() {
        let lookup = FakeLookup::new();
        let (service, _pool) = service_with(&lookup).await;

        let err = service.insert(input("A", "12a45")).await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidPostalCode(_)));
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_lookup() {
        let lookup = FakeLookup::with_delay(Duration::from_millis(50));
        let (service, pool) = service_with(&lookup).await;

        let (a, b) = tokio::join!(
            service.insert(input("A", "12345")),
            service.insert(input("B", "12345")),
        );

        assert_eq!(a.unwrap().address, b.unwrap().address);
        assert_eq!(lookup.calls(), 1);
        assert_eq!(address_count(&pool).await, 1);
    }
}
