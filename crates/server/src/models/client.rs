//! Client domain types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use client_registry_core::ClientId;

use super::Address;

/// A stored client with its resolved address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Store-assigned ID.
    pub id: ClientId,
    /// Display name.
    pub name: String,
    /// The shared address record this client points at.
    pub address: Address,
    /// Any other fields sent by the caller, kept verbatim.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A client as sent by API callers on create and update.
///
/// Only `address.postal_code` is used to pick the address; every other
/// address field in the body is ignored in favour of the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInput {
    /// Ignored on write; the store or the request path decides the ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClientId>,
    /// Display name.
    pub name: String,
    /// Embedded address; needs at least a postal code.
    pub address: AddressInput,
    /// Any other fields, passed through to storage.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// The address part of a [`ClientInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressInput {
    /// Postal code in any accepted spelling (`"01001-000"`, `"01001000"`).
    #[serde(alias = "cep")]
    pub postal_code: String,
    /// Caller-supplied address fields; echoed back but never stored.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// What the client repository persists.
///
/// `id` is `None` for an insert and `Some` to overwrite an existing row.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub id: Option<ClientId>,
    pub name: String,
    pub address: Address,
    pub attributes: Map<String, Value>,
}
