//! HTTP catalog client for a storefront-style REST API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::clients::{CatalogClient, CatalogItem, OrderReport};
use crate::core::config::CatalogConfig;
use crate::core::errors::{CapabilityError, CapabilityResult};

/// Catalog client backed by a storefront REST API.
///
/// Expects `GET {base}/products?q={term}&limit={n}` returning
/// `{"products": [...]}` and `GET {base}/orders/{id}` returning an
/// [`OrderReport`]. Authentication is a bearer token. Credentials are
/// validated per call, not at construction, so a process without them
/// still starts; each lookup then fails with a missing-credential error
/// that the orchestrator folds into fallback text.
pub struct HttpCatalogClient {
    http: reqwest::Client,
    base_url: Option<String>,
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct ProductsEnvelope {
    products: Vec<CatalogItem>,
}

impl HttpCatalogClient {
    /// Create a client from configuration.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let base_url = if config.base_url.is_empty() {
            None
        } else {
            Some(config.base_url.trim_end_matches('/').to_string())
        };
        Self {
            http: reqwest::Client::new(),
            base_url,
            access_token: config.access_token.clone(),
        }
    }

    fn credentials(&self) -> CapabilityResult<(&str, &str)> {
        let base_url = self.base_url.as_deref().ok_or_else(|| {
            CapabilityError::MissingCredential("catalog base URL is not set".to_string())
        })?;
        let access_token = self.access_token.as_deref().ok_or_else(|| {
            CapabilityError::MissingCredential("catalog access token is not set".to_string())
        })?;
        Ok((base_url, access_token))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn search(&self, term: &str, limit: usize) -> CapabilityResult<Vec<CatalogItem>> {
        let (base_url, access_token) = self.credentials()?;

        let response = self
            .http
            .get(format!("{base_url}/products"))
            .query(&[("q", term), ("limit", &limit.to_string())])
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CapabilityError::Api(format!(
                "product search failed with status {}",
                response.status()
            )));
        }

        let envelope: ProductsEnvelope = response.json().await?;
        Ok(envelope.products)
    }

    async fn order_status(&self, order_id: &str) -> CapabilityResult<OrderReport> {
        let (base_url, access_token) = self.credentials()?;

        let response = self
            .http
            .get(format!("{base_url}/orders/{order_id}"))
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CapabilityError::NotFound(format!("order {order_id}")));
        }
        if !response.status().is_success() {
            return Err(CapabilityError::Api(format!(
                "order lookup failed with status {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_base_url_fails_per_call() {
        let client = HttpCatalogClient::new(&CatalogConfig::default());

        let result = client.search("shirt", 5).await;
        assert!(matches!(result, Err(CapabilityError::MissingCredential(_))));
    }

    #[tokio::test]
    async fn missing_token_fails_per_call() {
        let client = HttpCatalogClient::new(&CatalogConfig {
            base_url: "https://shop.example.com/api".to_string(),
            ..CatalogConfig::default()
        });

        let result = client.order_status("12345").await;
        assert!(matches!(result, Err(CapabilityError::MissingCredential(_))));
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let client = HttpCatalogClient::new(&CatalogConfig {
            base_url: "https://shop.example.com/api/".to_string(),
            access_token: Some("token".to_string()),
            ..CatalogConfig::default()
        });

        assert_eq!(
            client.base_url.as_deref(),
            Some("https://shop.example.com/api")
        );
    }
}
