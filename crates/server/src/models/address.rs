//! Address domain type.

use serde::{Deserialize, Serialize};

use client_registry_core::PostalCode;

/// A resolved postal address.
///
/// One record exists per postal code and it is never modified after it is
/// stored; clients refer to it by `postal_code`. Text fields are passed
/// through from the lookup service as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Canonical postal code (primary key).
    pub postal_code: PostalCode,
    /// Street name.
    #[serde(default)]
    pub street: String,
    /// Complement (building side, number range, ...).
    #[serde(default)]
    pub complement: String,
    /// Neighborhood or district.
    #[serde(default)]
    pub neighborhood: String,
    /// City or municipality.
    #[serde(default)]
    pub city: String,
    /// State or province code.
    #[serde(default)]
    pub state: String,
    /// IBGE municipality code, when the lookup provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ibge: Option<String>,
    /// Telephone area code, when the lookup provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddd: Option<String>,
}
