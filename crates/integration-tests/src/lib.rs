//! Integration tests for the client registry.
//!
//! Every test gets its own server on an ephemeral port, backed by a fresh
//! in-memory database and a fake ViaCEP service, so nothing external is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p client-registry-integration-tests
//! ```
//!
//! # Fake postal codes
//!
//! | Code       | Behaviour                         |
//! |------------|-----------------------------------|
//! | `01001000` | Praça da Sé, São Paulo            |
//! | `20040020` | Rua da Assembleia, Rio de Janeiro |
//! | `50300000` | HTTP 503                          |
//! | other      | `{"erro": true}`                  |

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::json;
use sqlx::SqlitePool;
use tokio::net::TcpListener;

use client_registry_server::config::ServerConfig;
use client_registry_server::db;
use client_registry_server::routes;
use client_registry_server::state::AppState;

/// A running server plus handles to inspect what it did.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: SqlitePool,
    lookups: Arc<AtomicUsize>,
}

impl TestContext {
    /// Start a fake lookup service and a registry server pointing at it.
    pub async fn new() -> Self {
        let lookups = Arc::new(AtomicUsize::new(0));
        let lookup_url = spawn(fake_viacep(lookups.clone())).await;

        let config = ServerConfig::from_vars(|key| match key {
            "REGISTRY_DATABASE_URL" => Some("sqlite::memory:".to_string()),
            "POSTAL_LOOKUP_URL" => Some(format!("{lookup_url}/ws")),
            "POSTAL_LOOKUP_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .unwrap();

        let pool = db::create_pool(&config.database_url).await.unwrap();
        db::init_schema(&pool).await.unwrap();

        let state = AppState::new(&config, pool.clone()).unwrap();
        let base_url = spawn(routes::app(state)).await;

        Self {
            client: Client::new(),
            base_url,
            pool,
            lookups,
        }
    }

    /// Absolute URL for a path on the server under test.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// How many requests reached the fake lookup service.
    #[must_use]
    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Rows in the address table.
    pub async fn address_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM addresses")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn fake_viacep(lookups: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route("/ws/{cep}/json/", get(fake_lookup))
        .with_state(lookups)
}

async fn fake_lookup(State(lookups): State<Arc<AtomicUsize>>, Path(cep): Path<String>) -> Response {
    lookups.fetch_add(1, Ordering::SeqCst);

    match cep.as_str() {
        "01001000" => Json(json!({
            "cep": "01001-000",
            "logradouro": "Praça da Sé",
            "complemento": "lado ímpar",
            "bairro": "Sé",
            "localidade": "São Paulo",
            "uf": "SP",
            "ibge": "3550308",
            "ddd": "11"
        }))
        .into_response(),
        "20040020" => Json(json!({
            "cep": "20040-020",
            "logradouro": "Rua da Assembleia",
            "complemento": "",
            "bairro": "Centro",
            "localidade": "Rio de Janeiro",
            "uf": "RJ",
            "ibge": "3304557",
            "ddd": "21"
        }))
        .into_response(),
        "50300000" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
        _ => Json(json!({ "erro": true })).into_response(),
    }
}
