//! CLI subcommands.

pub mod lookup;
pub mod schema;
