//! Address repository for database operations.
//!
//! Addresses are insert-only: `put` never overwrites an existing postal code.

use sqlx::SqlitePool;

use client_registry_core::PostalCode;

use super::RepositoryError;
use crate::models::Address;

/// Raw `addresses` row.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct AddressRow {
    pub postal_code: String,
    pub street: String,
    pub complement: String,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub ibge: Option<String>,
    pub ddd: Option<String>,
}

impl TryFrom<AddressRow> for Address {
    type Error = RepositoryError;

    fn try_from(row: AddressRow) -> Result<Self, Self::Error> {
        let postal_code = PostalCode::parse(&row.postal_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid postal code in database: {e}"))
        })?;

        Ok(Self {
            postal_code,
            street: row.street,
            complement: row.complement,
            neighborhood: row.neighborhood,
            city: row.city,
            state: row.state,
            ibge: row.ibge,
            ddd: row.ddd,
        })
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the stored address for a postal code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored postal code is invalid.
    pub async fn get(&self, postal_code: &PostalCode) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT postal_code, street, complement, neighborhood, city, state, ibge, ddd
            FROM addresses
            WHERE postal_code = ?
            ",
        )
        .bind(postal_code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Address::try_from).transpose()
    }

    /// Store an address unless one already exists for its postal code.
    ///
    /// Returns the record that is stored after the call. When the postal code
    /// was already present that is the existing record, not `address`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn put(&self, address: &Address) -> Result<Address, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO addresses (postal_code, street, complement, neighborhood, city, state, ibge, ddd)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (postal_code) DO NOTHING
            ",
        )
        .bind(address.postal_code.as_str())
        .bind(&address.street)
        .bind(&address.complement)
        .bind(&address.neighborhood)
        .bind(&address.city)
        .bind(&address.state)
        .bind(address.ibge.as_deref())
        .bind(address.ddd.as_deref())
        .execute(self.pool)
        .await?;

        self.get(&address.postal_code).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "address {} missing right after insert",
                address.postal_code
            ))
        })
    }

    /// Number of stored addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM addresses")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
