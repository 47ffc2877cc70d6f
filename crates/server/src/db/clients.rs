//! Client repository for database operations.
//!
//! Client rows reference an address by postal code; reads join the address
//! back in so callers always get a complete [`Client`].

use serde_json::{Map, Value};
use sqlx::SqlitePool;

use client_registry_core::ClientId;

use super::RepositoryError;
use super::addresses::AddressRow;
use crate::models::{Address, Client, ClientRecord};

const SELECT_CLIENTS: &str = r"
    SELECT c.id, c.name, c.attributes,
           a.postal_code, a.street, a.complement, a.neighborhood, a.city, a.state, a.ibge, a.ddd
    FROM clients c
    JOIN addresses a ON a.postal_code = c.postal_code
";

/// Raw `clients` row joined with its address.
#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: ClientId,
    name: String,
    attributes: String,
    #[sqlx(flatten)]
    address: AddressRow,
}

impl TryFrom<ClientRow> for Client {
    type Error = RepositoryError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let attributes: Map<String, Value> = serde_json::from_str(&row.attributes).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid attributes for client {}: {e}",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            address: Address::try_from(row.address)?,
            attributes,
        })
    }
}

/// Repository for client database operations.
pub struct ClientRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClientRepository<'a> {
    /// Create a new client repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all clients, ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row cannot be decoded.
    pub async fn find_all(&self) -> Result<Vec<Client>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!("{SELECT_CLIENTS} ORDER BY c.id"))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Client::try_from).collect()
    }

    /// Get a client by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row cannot be decoded.
    pub async fn find_by_id(&self, id: ClientId) -> Result<Option<Client>, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!("{SELECT_CLIENTS} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(Client::try_from).transpose()
    }

    /// Insert a client (`record.id` is `None`) or overwrite one (`Some`).
    ///
    /// The referenced address must already be stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the address is not stored.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn save(&self, record: ClientRecord) -> Result<Client, RepositoryError> {
        let attributes = serde_json::to_string(&record.attributes)?;

        let id = match record.id {
            None => {
                sqlx::query_scalar::<_, ClientId>(
                    r"
                    INSERT INTO clients (name, postal_code, attributes)
                    VALUES (?, ?, ?)
                    RETURNING id
                    ",
                )
                .bind(&record.name)
                .bind(record.address.postal_code.as_str())
                .bind(&attributes)
                .fetch_one(self.pool)
                .await
                .map_err(map_write_error)?
            }
            Some(id) => {
                sqlx::query(
                    r"
                    INSERT INTO clients (id, name, postal_code, attributes)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET
                        name = excluded.name,
                        postal_code = excluded.postal_code,
                        attributes = excluded.attributes
                    ",
                )
                .bind(id)
                .bind(&record.name)
                .bind(record.address.postal_code.as_str())
                .bind(&attributes)
                .execute(self.pool)
                .await
                .map_err(map_write_error)?;
                id
            }
        };

        Ok(Client {
            id,
            name: record.name,
            address: record.address,
            attributes: record.attributes,
        })
    }

    /// Delete a client by ID. Unknown IDs are not an error.
    ///
    /// Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_by_id(&self, id: ClientId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::Conflict("client references an unknown address".to_owned());
    }
    RepositoryError::Database(e)
}
