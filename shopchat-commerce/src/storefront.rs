//! HTTP client for the Spurtcommerce storefront API.
//!
//! Every endpoint answers `{ "data": ... }`. Payloads are kept as raw JSON:
//! the tools render a few fields as text and hand the rest to the chat UI
//! untouched.

use serde::Deserialize;
use serde_json::Value;

use crate::config::CommerceConfig;

/// Errors talking to the storefront.
///
/// `Display` yields the backend's own `message` when it sent one, which is
/// what the tools show to the model.
#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    /// The request never produced a response.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{}", describe_status(.status, .message))]
    Status {
        /// HTTP status code.
        status: u16,
        /// The backend's `message` field, if present.
        message: Option<String>,
    },

    /// The body was not the expected `{ data }` envelope.
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Filters for the custom product list endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    /// Free-text keyword.
    pub keyword: String,
    /// Lower price bound.
    pub from_price: f64,
    /// Upper price bound.
    pub to_price: f64,
    /// `1` to restrict to latest arrivals, `0` otherwise.
    pub latest_arrival: i64,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Value,
}

/// Thin client over the storefront REST API.
#[derive(Debug, Clone)]
pub struct StorefrontClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl StorefrontClient {
    /// Create a client from connection settings.
    pub fn new(config: &CommerceConfig) -> Self {
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// `GET /product-store/product/detail/{sku}`.
    pub async fn product_detail(&self, sku: &str) -> Result<Value, StorefrontError> {
        self.get(&format!("/product-store/product/detail/{sku}"), &[])
            .await
    }

    /// `GET /list/category`.
    pub async fn categories(&self) -> Result<Value, StorefrontError> {
        self.get("/list/category", &[]).await
    }

    /// `GET /list/custom-product-list`.
    ///
    /// The lower bound goes out as `piceFrom`, the backend's spelling.
    pub async fn search_products(&self, query: &ProductQuery) -> Result<Value, StorefrontError> {
        let params = [
            ("keyword", query.keyword.clone()),
            ("piceFrom", format_number(query.from_price)),
            ("priceTo", format_number(query.to_price)),
            ("latestArrival", query.latest_arrival.to_string()),
        ];
        self.get("/list/custom-product-list", &params).await
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, StorefrontError> {
        let url = format!("{}{path}", self.base_url);
        tracing::debug!(url = %url, "storefront request");

        let response = self
            .client
            .get(&url)
            .header("content-type", "application/json")
            .header("key", &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string));
            tracing::warn!(status = status.as_u16(), path, "storefront request failed");
            return Err(StorefrontError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| StorefrontError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }
}

fn describe_status(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(message) => message.clone(),
        None => format!("Request failed with status code {status}"),
    }
}

/// Whole numbers print without a fractional part, as JSON clients send them.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
