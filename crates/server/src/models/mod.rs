//! Domain models for the client registry.
//!
//! These types are what the repositories return and what the API serialises.
//! Row types used by `sqlx` live next to their queries in [`crate::db`].

pub mod address;
pub mod client;

pub use address::Address;
pub use client::{AddressInput, Client, ClientInput, ClientRecord};
