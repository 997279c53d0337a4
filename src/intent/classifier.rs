//! Keyword-driven intent classification.
//!
//! A deterministic, ordered first-match scan over static keyword tables.
//! The classifier is pure and synchronous: no store access, no I/O. The
//! caller supplies the session's user context when it wants the
//! shopping-history rule applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::message::UserContext;
use crate::intent::entities::{EntityExtractor, EntityMap};

/// Coarse-grained message category driving routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// User asking about products.
    ProductInquiry,
    /// User asking about pricing or discounts.
    PricingQuestion,
    /// User checking order or delivery status.
    OrderStatus,
    /// General question not product-related.
    GeneralQuestion,
    /// Casual conversation or greeting.
    SmallTalk,
    /// Intent could not be determined.
    Unknown,
}

impl Intent {
    /// String representation for logging and wire formats.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProductInquiry => "product_inquiry",
            Self::PricingQuestion => "pricing_question",
            Self::OrderStatus => "order_status",
            Self::GeneralQuestion => "general_question",
            Self::SmallTalk => "small_talk",
            Self::Unknown => "unknown",
        }
    }

    /// Human-readable description used in structured logs.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ProductInquiry => "User asking about products",
            Self::PricingQuestion => "User asking about pricing or discounts",
            Self::OrderStatus => "User checking order or delivery status",
            Self::GeneralQuestion => "General question not product-related",
            Self::SmallTalk => "Casual conversation or greeting",
            Self::Unknown => "Intent could not be determined",
        }
    }
}

/// Which backend answers a given intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handler {
    /// Catalog/order lookup path.
    Catalog,
    /// Generative-language path.
    LanguageModel,
    /// Catalog first, language model as fallback.
    Hybrid,
}

impl Handler {
    /// String representation for logging and wire formats.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::LanguageModel => "language_model",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Classification output. Produced fresh per call, never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    /// Classified intent.
    pub intent: Intent,
    /// Hand-tuned confidence in `[0, 1]` for the matched rule.
    pub confidence: f64,
    /// Entities extracted for the matched category.
    pub entities: EntityMap,
    /// Suggested backend.
    pub suggested_handler: Handler,
}

/// One prioritized keyword rule. Rules are scanned in table order and the
/// first rule with any keyword hit wins; there is no cross-rule scoring.
struct KeywordRule {
    intent: Intent,
    confidence: f64,
    handler: Handler,
    keywords: &'static [&'static str],
}

const ORDER_KEYWORDS: &[&str] = &[
    "order", "status", "delivery", "shipping", "track", "tracking", "when will", "arrive",
    "delivered", "package", "shipment", "received", "cancel", "refund", "return",
];

const PRODUCT_KEYWORDS: &[&str] = &[
    "product", "item", "shirt", "tshirt", "t-shirt", "available", "stock", "in stock",
    "out of stock", "size", "color", "model", "variant", "specifications", "specs",
];

const PRICING_KEYWORDS: &[&str] = &[
    "price", "cost", "how much", "expensive", "cheap", "discount", "sale", "offer", "promotion",
    "promo", "deal", "payment", "purchase",
];

const SMALL_TALK_KEYWORDS: &[&str] = &[
    "hello", "hi", "hey", "thanks", "thank you", "goodbye", "bye", "see you", "how are you",
    "what is your name", "who are you",
];

/// Priority order: most specific category first. Order status outranks
/// product, product outranks pricing, small talk comes last.
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        intent: Intent::OrderStatus,
        confidence: 0.9,
        handler: Handler::Catalog,
        keywords: ORDER_KEYWORDS,
    },
    KeywordRule {
        intent: Intent::ProductInquiry,
        confidence: 0.85,
        handler: Handler::Catalog,
        keywords: PRODUCT_KEYWORDS,
    },
    KeywordRule {
        intent: Intent::PricingQuestion,
        confidence: 0.8,
        handler: Handler::Catalog,
        keywords: PRICING_KEYWORDS,
    },
    KeywordRule {
        intent: Intent::SmallTalk,
        confidence: 0.95,
        handler: Handler::LanguageModel,
        keywords: SMALL_TALK_KEYWORDS,
    },
];

/// Confidence for the shopping-context rule.
const CONTEXT_CONFIDENCE: f64 = 0.6;
/// Confidence for the unmatched default.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Keyword/pattern intent classifier.
pub struct IntentClassifier {
    extractor: EntityExtractor,
}

impl IntentClassifier {
    /// Create a new classifier.
    ///
    /// # Errors
    /// Returns an error if the entity regex patterns are invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            extractor: EntityExtractor::new()?,
        })
    }

    /// Classify one message. Total over any input, including the empty
    /// string. `context` enables the shopping-history rule when the
    /// keyword tables produce no hit.
    #[must_use]
    pub fn recognize(&self, message: &str, context: Option<&UserContext>) -> IntentResult {
        let lower = message.to_lowercase();
        let lower = lower.trim();

        for rule in KEYWORD_RULES {
            if rule.keywords.iter().any(|keyword| lower.contains(keyword)) {
                return IntentResult {
                    intent: rule.intent,
                    confidence: rule.confidence,
                    entities: self.entities_for(rule.intent, message),
                    suggested_handler: rule.handler,
                };
            }
        }

        if context.is_some_and(UserContext::has_shopping_history) {
            let mut entities = EntityMap::new();
            entities.insert(
                "context".to_string(),
                Value::from("previous_shopping_context"),
            );
            return IntentResult {
                intent: Intent::GeneralQuestion,
                confidence: CONTEXT_CONFIDENCE,
                entities,
                suggested_handler: Handler::Hybrid,
            };
        }

        IntentResult {
            intent: Intent::GeneralQuestion,
            confidence: DEFAULT_CONFIDENCE,
            entities: EntityMap::new(),
            suggested_handler: Handler::LanguageModel,
        }
    }

    fn entities_for(&self, intent: Intent, message: &str) -> EntityMap {
        match intent {
            Intent::OrderStatus => self.extractor.order_entities(message),
            Intent::ProductInquiry => self.extractor.product_entities(message),
            Intent::PricingQuestion => self.extractor.pricing_entities(message),
            Intent::GeneralQuestion | Intent::SmallTalk | Intent::Unknown => EntityMap::new(),
        }
    }
}

impl Default for IntentClassifier {
    /// Creates a default classifier.
    ///
    /// # Panics
    /// Panics if the built-in regex patterns are invalid (should never happen).
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new().expect("built-in entity patterns should be valid")
    }
}
