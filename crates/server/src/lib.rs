//! Client registry server library.
//!
//! This crate provides the HTTP API as a library, allowing it to be
//! tested end to end and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod postal;
pub mod routes;
pub mod services;
pub mod state;
