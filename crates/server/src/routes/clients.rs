//! Client CRUD route handlers.
//!
//! Bodies are JSON. A client's own fields sit next to `id`, `name` and
//! `address`; `address` needs at least a `postal_code` (or `cep`), the rest
//! of it is filled in from the address store.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use client_registry_core::ClientId;

use crate::error::{AppError, Result};
use crate::models::{Client, ClientInput};
use crate::state::AppState;

fn bad_request(rejection: &JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

/// List all clients.
///
/// GET /clients
///
/// # Errors
///
/// Returns `AppError` if the clients cannot be loaded.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Client>>> {
    Ok(Json(state.clients().list_all().await?))
}

/// Get a single client.
///
/// GET /clients/{id}
///
/// # Errors
///
/// Returns 404 if the client does not exist.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
) -> Result<Json<Client>> {
    Ok(Json(state.clients().get_by_id(id).await?))
}

/// Create a client, resolving its address by postal code.
///
/// POST /clients
///
/// # Errors
///
/// Returns 400 for a malformed body or postal code, 422 for an unknown
/// postal code and 502 if the lookup service fails.
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<ClientInput>, JsonRejection>,
) -> Result<Json<Client>> {
    let Json(input) = body.map_err(|e| bad_request(&e))?;
    Ok(Json(state.clients().insert(input).await?))
}

/// Replace a client.
///
/// PUT /clients/{id}
///
/// An unknown `id` changes nothing and the request body is returned as is,
/// whatever its shape.
///
/// # Errors
///
/// Same as [`create`].
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ClientId>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = body.map_err(|e| bad_request(&e))?;
    if !state.clients().exists(id).await? {
        return Ok(Json(body).into_response());
    }

    let input: ClientInput = serde_json::from_value(body.clone())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok(match state.clients().update(id, input).await? {
        Some(client) => Json(client).into_response(),
        None => Json(body).into_response(),
    })
}

/// Delete a client. Unknown IDs are ignored.
///
/// DELETE /clients/{id}
///
/// # Errors
///
/// Returns `AppError` on storage errors.
pub async fn delete(State(state): State<AppState>, Path(id): Path<ClientId>) -> Result<StatusCode> {
    state.clients().delete(id).await?;
    Ok(StatusCode::OK)
}
