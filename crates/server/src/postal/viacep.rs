//! ViaCEP API client implementation.
//!
//! `GET {base_url}/{postal_code}/json/` answers with the address fields in
//! Portuguese, or with `{"erro": true}` when the code does not exist. A
//! malformed code gets HTTP 400.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use client_registry_core::PostalCode;

use super::{LookupError, PostalLookup};
use crate::config::PostalLookupConfig;
use crate::models::Address;

/// Client for a ViaCEP-compatible postal code API.
#[derive(Clone)]
pub struct ViaCepClient {
    inner: Arc<ViaCepClientInner>,
}

struct ViaCepClientInner {
    client: reqwest::Client,
    base_url: String,
}

/// Successful ViaCEP payload.
#[derive(Debug, Deserialize)]
struct ViaCepAddress {
    #[serde(default)]
    logradouro: String,
    #[serde(default)]
    complemento: String,
    #[serde(default)]
    bairro: String,
    #[serde(default)]
    localidade: String,
    #[serde(default)]
    uf: String,
    #[serde(default)]
    ibge: Option<String>,
    #[serde(default)]
    ddd: Option<String>,
}

impl ViaCepClient {
    /// Create a new ViaCEP client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PostalLookupConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("client-registry/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ViaCepClientInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    fn endpoint(&self, postal_code: &PostalCode) -> String {
        format!("{}/{postal_code}/json/", self.inner.base_url)
    }
}

#[async_trait]
impl PostalLookup for ViaCepClient {
    #[instrument(skip(self), fields(postal_code = %postal_code))]
    async fn resolve(&self, postal_code: &PostalCode) -> Result<Address, LookupError> {
        let url = self.endpoint(postal_code);
        debug!(%url, "Querying postal lookup service");

        let response = self.inner.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            return Err(LookupError::NotFound(postal_code.clone()));
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Postal lookup service returned an error");
            return Err(LookupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| LookupError::Parse(e.to_string()))?;

        if is_error_payload(&value) {
            return Err(LookupError::NotFound(postal_code.clone()));
        }

        let payload: ViaCepAddress =
            serde_json::from_value(value).map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(Address {
            postal_code: postal_code.clone(),
            street: payload.logradouro,
            complement: payload.complemento,
            neighborhood: payload.bairro,
            city: payload.localidade,
            state: payload.uf,
            ibge: payload.ibge.filter(|s| !s.is_empty()),
            ddd: payload.ddd.filter(|s| !s.is_empty()),
        })
    }
}

/// ViaCEP signals unknown codes with `"erro": true` (older deployments send
/// the string `"true"`).
fn is_error_payload(value: &Value) -> bool {
    match value.get("erro") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(flag)) => flag == "true",
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    async fn fake_viacep(Path(cep): Path<String>) -> Response {
        match cep.as_str() {
            "01001000" => Json(json!({
                "cep": "01001-000",
                "logradouro": "Praça da Sé",
                "complemento": "lado ímpar",
                "bairro": "Sé",
                "localidade": "São Paulo",
                "uf": "SP",
                "ibge": "3550308",
                "gia": "1004",
                "ddd": "11",
                "siafi": "7107"
            }))
            .into_response(),
            "99999999" => Json(json!({ "erro": true })).into_response(),
            "88888888" => Json(json!({ "erro": "true" })).into_response(),
            "77777777" => (StatusCode::SERVICE_UNAVAILABLE, "maintenance").into_response(),
            "66666666" => "definitely not json".into_response(),
            "55555555" => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({})).into_response()
            }
            _ => (StatusCode::BAD_REQUEST, "bad request").into_response(),
        }
    }

    async fn spawn_fake() -> String {
        let app = Router::new().route("/ws/{cep}/json/", get(fake_viacep));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/ws")
    }

    fn client_for(base_url: &str, timeout: Duration) -> ViaCepClient {
        let mut config = PostalLookupConfig::with_base_url(base_url).unwrap();
        config.timeout = timeout;
        ViaCepClient::new(&config).unwrap()
    }

    fn code(s: &str) -> PostalCode {
        PostalCode::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_resolves_known_code() {
        let client = client_for(&spawn_fake().await, Duration::from_secs(5));

        let address = client.resolve(&code("01001-000")).await.unwrap();

        assert_eq!(address.postal_code, code("01001000"));
        assert_eq!(address.street, "Praça da Sé");
        assert_eq!(address.complement, "lado ímpar");
        assert_eq!(address.neighborhood, "Sé");
        assert_eq!(address.city, "São Paulo");
        assert_eq!(address.state, "SP");
        assert_eq!(address.ibge.as_deref(), Some("3550308"));
        assert_eq!(address.ddd.as_deref(), Some("11"));
    }

    #[tokio::test]
    async fn test_error_flag_is_not_found() {
        let client = client_for(&spawn_fake().await, Duration::from_secs(5));

        let err = client.resolve(&code("99999999")).await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound(ref c) if c.as_str() == "99999999"));

        let err = client.resolve(&code("88888888")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_bad_request_is_not_found() {
        let client = client_for(&spawn_fake().await, Duration::from_secs(5));

        let err = client.resolve(&code("123")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let client = client_for(&spawn_fake().await, Duration::from_secs(5));

        let err = client.resolve(&code("77777777")).await.unwrap_err();
        assert!(matches!(
            err,
            LookupError::Api { status: 503, ref message } if message == "maintenance"
        ));
    }

    #[tokio::test]
    async fn test_garbage_body_is_parse_error() {
        let client = client_for(&spawn_fake().await, Duration::from_secs(5));

        let err = client.resolve(&code("66666666")).await.unwrap_err();
        assert!(matches!(err, LookupError::Parse(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_http_error() {
        let client = client_for(&spawn_fake().await, Duration::from_millis(100));

        let err = client.resolve(&code("55555555")).await.unwrap_err();
        assert!(matches!(err, LookupError::Http(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}/ws"), Duration::from_secs(5));
        let err = client.resolve(&code("01001000")).await.unwrap_err();
        assert!(matches!(err, LookupError::Http(_)));
    }

    #[test]
    fn test_endpoint_has_no_double_slash() {
        let client = client_for("http://127.0.0.1:9000/", Duration::from_secs(1));
        assert_eq!(
            client.endpoint(&code("01001-000")),
            "http://127.0.0.1:9000/01001000/json/"
        );
    }
}
