//! External capability clients: catalog lookups and language-model
//! completions. The orchestrator depends only on the traits here; HTTP
//! implementations live in the submodules.

pub mod catalog;
pub mod language_model;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::CapabilityResult;
use crate::core::message::ChatTurn;

pub use catalog::HttpCatalogClient;
pub use language_model::OpenAiChatClient;

/// One product returned by a catalog search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Product identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Display price, currency included.
    pub price: String,
    /// Product page URL, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// One line of an order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderLine {
    /// Item title.
    pub title: String,
    /// Quantity ordered.
    pub quantity: u32,
    /// Line price.
    pub price: String,
}

/// Status report for one order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderReport {
    /// Order identifier.
    pub id: String,
    /// Customer-facing order number.
    pub order_number: u64,
    /// Fulfillment status.
    pub status: String,
    /// Placement time.
    pub created_at: DateTime<Utc>,
    /// Total price, currency included.
    pub total_price: String,
    /// Ordered items.
    pub line_items: Vec<OrderLine>,
}

/// Completion returned by the language model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// Generated text.
    pub text: String,
    /// Model that produced it.
    pub model_id: String,
    /// Token usage reported by the backend.
    pub tokens_used: u32,
}

/// Product catalog and order lookup capability.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Search products matching `term`, capped at `limit` results.
    async fn search(&self, term: &str, limit: usize) -> CapabilityResult<Vec<CatalogItem>>;

    /// Fetch the status of one order. Fails with a not-found error when
    /// the order does not exist.
    async fn order_status(&self, order_id: &str) -> CapabilityResult<OrderReport>;
}

/// Generative-language capability.
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Complete a role-tagged conversation.
    async fn complete(&self, messages: &[ChatTurn]) -> CapabilityResult<Completion>;
}
