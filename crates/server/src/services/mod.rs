//! Business logic services.
//!
//! # Services
//!
//! - `clients` - Client CRUD with resolve-or-create address attachment

pub mod clients;

pub use clients::{ClientError, ClientService};
