//! Pattern-based entity extraction from chat messages.
//!
//! Pulls structured values (product type, color, size, price, order id)
//! out of free text for the catalog handlers.

use regex::Regex;
use serde_json::Value;

/// Key-value map of extracted entities. Keys are camelCase to match the
/// widget wire format.
pub type EntityMap = serde_json::Map<String, Value>;

/// Fixed color palette recognized in product inquiries.
const COLOR_PALETTE: &[&str] = &[
    "red", "blue", "green", "black", "white", "yellow", "purple", "pink",
];

/// Size codes checked in order; the first hit wins.
///
/// Matching is substring-based over the lower-cased message, so short
/// codes fire inside ordinary words ("large" contains "l"). This mirrors
/// the deployed matcher and is kept for compatibility; see the size tests.
const SIZE_CODES: &[&str] = &["XS", "S", "M", "L", "XL", "XXL"];

/// Regex-backed extractor for product, pricing, and order entities.
pub struct EntityExtractor {
    product_type_pattern: Regex,
    price_pattern: Regex,
    order_id_pattern: Regex,
}

impl EntityExtractor {
    /// Create a new extractor.
    ///
    /// # Errors
    /// Returns an error if any regex pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // Product nouns; alternation order prefers the most specific.
            product_type_pattern: Regex::new(r"(?i)t-?shirt|shirt|product|item")?,
            // Dollar-prefixed or bare amounts, optional cents.
            price_pattern: Regex::new(r"\$?\d+(\.\d{2})?")?,
            // 4+ digit runs, optionally hash-prefixed.
            order_id_pattern: Regex::new(r"#?\d{4,}")?,
        })
    }

    /// Extract product entities: `productType`, `color`, `size`.
    #[must_use]
    pub fn product_entities(&self, message: &str) -> EntityMap {
        let mut entities = EntityMap::new();
        let lower = message.to_lowercase();

        if let Some(found) = self.product_type_pattern.find(message) {
            entities.insert(
                "productType".to_string(),
                Value::from(found.as_str().to_lowercase()),
            );
        }

        if let Some(color) = COLOR_PALETTE.iter().find(|color| lower.contains(*color)) {
            entities.insert("color".to_string(), Value::from(*color));
        }

        if let Some(size) = SIZE_CODES
            .iter()
            .find(|size| lower.contains(&size.to_lowercase()))
        {
            entities.insert("size".to_string(), Value::from(*size));
        }

        entities
    }

    /// Extract pricing entities: `mentionedPrice`, `lookingForDiscount`.
    #[must_use]
    pub fn pricing_entities(&self, message: &str) -> EntityMap {
        let mut entities = EntityMap::new();
        let lower = message.to_lowercase();

        if let Some(found) = self.price_pattern.find(message) {
            entities.insert("mentionedPrice".to_string(), Value::from(found.as_str()));
        }

        if lower.contains("discount") || lower.contains("sale") {
            entities.insert("lookingForDiscount".to_string(), Value::from(true));
        }

        entities
    }

    /// Extract order entities: `orderId` (hash prefix stripped),
    /// `wantsTracking`.
    #[must_use]
    pub fn order_entities(&self, message: &str) -> EntityMap {
        let mut entities = EntityMap::new();
        let lower = message.to_lowercase();

        if let Some(found) = self.order_id_pattern.find(message) {
            let order_id = found.as_str().trim_start_matches('#');
            entities.insert("orderId".to_string(), Value::from(order_id));
        }

        if lower.contains("track") || lower.contains("status") {
            entities.insert("wantsTracking".to_string(), Value::from(true));
        }

        entities
    }
}

impl Default for EntityExtractor {
    /// Creates a default extractor.
    ///
    /// # Panics
    /// Panics if the built-in regex patterns are invalid (should never happen).
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new().expect("built-in entity patterns should be valid")
    }
}
