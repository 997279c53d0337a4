//! Request orchestration.
//!
//! One entry point, [`Orchestrator::process`]: append the user message,
//! classify it, route to the catalog or language-model handler (or the
//! hybrid chain), compose a reply, and append it back to the session.
//! Every downstream failure is converted into fallback text here; only
//! invalid input and a disabled profile are caller-visible errors, and
//! both are raised before any session mutation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::clients::{CatalogClient, CatalogItem, LanguageModelClient};
use crate::core::errors::{BotError, BotResult, CapabilityError, CapabilityResult};
use crate::core::message::{ChatRole, ChatTurn, MessageRole};
use crate::intent::{EntityMap, Handler, Intent, IntentClassifier, IntentResult};
use crate::profile::{BehaviorProfile, ProfileRegistry};
use crate::session::SessionStore;

/// Reply when the whole dispatch fails.
const PROCESSING_APOLOGY: &str =
    "I apologize, but I'm having trouble processing your request. Please try again.";
/// Reply when the language model fails.
const REPHRASE_APOLOGY: &str =
    "I'm having trouble generating a response. Could you please rephrase your question?";
/// Product type assumed when the message names none.
const DEFAULT_PRODUCT_TYPE: &str = "shirt";
/// History entries handed to the language model.
const HISTORY_WINDOW: usize = 5;
/// Hybrid attempt order. An attempt fails when it errors or returns an
/// empty reply; the next handler in the chain then runs.
const HYBRID_CHAIN: &[Handler] = &[Handler::Catalog, Handler::LanguageModel];

/// One inbound chat request.
#[derive(Clone, Debug, Deserialize)]
pub struct BotRequest {
    /// Raw user message.
    pub message: String,
    /// User identifier.
    pub user_id: String,
    /// Session identifier.
    pub session_id: String,
    /// Behavior profile override; the registry default applies when unset.
    pub profile: Option<String>,
}

/// The orchestrator's output contract.
#[derive(Clone, Debug, Serialize)]
pub struct BotResponse {
    /// Final reply text.
    pub response: String,
    /// Classified intent, verbatim from the classifier.
    pub intent: Intent,
    /// Classifier confidence, verbatim.
    pub confidence: f64,
    /// Handler category that was suggested, verbatim.
    pub handler: Handler,
}

/// Coordinates the session store, the classifier, and the capability
/// clients to turn one message into one reply.
pub struct Orchestrator {
    store: Arc<SessionStore>,
    classifier: IntentClassifier,
    catalog: Arc<dyn CatalogClient>,
    language_model: Arc<dyn LanguageModelClient>,
    profiles: Arc<ProfileRegistry>,
    search_limit: usize,
}

impl Orchestrator {
    /// Wire an orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        classifier: IntentClassifier,
        catalog: Arc<dyn CatalogClient>,
        language_model: Arc<dyn LanguageModelClient>,
        profiles: Arc<ProfileRegistry>,
        search_limit: usize,
    ) -> Self {
        Self {
            store,
            classifier,
            catalog,
            language_model,
            profiles,
            search_limit,
        }
    }

    /// Process one chat message into one reply.
    ///
    /// # Errors
    /// Returns `InvalidInput` for an empty message and `ProfileDisabled`
    /// when the active profile refuses requests; both are checked before
    /// any session mutation. All other failures become fallback text.
    pub async fn process(&self, request: &BotRequest) -> BotResult<BotResponse> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(BotError::InvalidInput("message is empty".to_string()));
        }

        let profile = self
            .profiles
            .resolve(request.profile.as_deref())
            .ok_or_else(|| BotError::InvalidConfig("profile registry is empty".to_string()))?;
        if !profile.enabled {
            return Err(BotError::ProfileDisabled(profile.name.clone()));
        }

        self.store.add_message(
            &request.user_id,
            &request.session_id,
            MessageRole::User,
            message,
            None,
        );

        let context = self.store.context(&request.user_id, &request.session_id);
        let result = self.classifier.recognize(message, Some(&context));
        info!(
            intent = result.intent.as_str(),
            confidence = result.confidence,
            handler = result.suggested_handler.as_str(),
            "{}",
            result.intent.description()
        );

        let history = self.store.formatted_history(
            &request.user_id,
            &request.session_id,
            Some(HISTORY_WINDOW),
        );

        let response = match self.dispatch(&result, profile, message, &history).await {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "dispatch failed, replying with apology");
                PROCESSING_APOLOGY.to_string()
            }
        };

        self.store.add_message(
            &request.user_id,
            &request.session_id,
            MessageRole::Assistant,
            &response,
            None,
        );

        Ok(BotResponse {
            response,
            intent: result.intent,
            confidence: result.confidence,
            handler: result.suggested_handler,
        })
    }

    async fn dispatch(
        &self,
        result: &IntentResult,
        profile: &BehaviorProfile,
        message: &str,
        history: &[ChatTurn],
    ) -> CapabilityResult<String> {
        match result.suggested_handler {
            Handler::Catalog => self.handle_catalog(result).await,
            Handler::LanguageModel => {
                Ok(self.handle_language_model(result, profile, message, history).await)
            }
            Handler::Hybrid => {
                for handler in HYBRID_CHAIN {
                    let attempt = match handler {
                        Handler::Catalog => self.handle_catalog(result).await,
                        Handler::LanguageModel | Handler::Hybrid => {
                            Ok(self.handle_language_model(result, profile, message, history).await)
                        }
                    };
                    match attempt {
                        Ok(text) if !text.trim().is_empty() => return Ok(text),
                        Ok(_) => continue,
                        Err(err) => {
                            warn!(error = %err, handler = handler.as_str(), "hybrid attempt failed");
                        }
                    }
                }
                Err(CapabilityError::Api(
                    "every hybrid attempt failed".to_string(),
                ))
            }
        }
    }

    /// Catalog path: product search, pricing lookup, or order status.
    /// Client failures are absorbed into clarifying questions.
    async fn handle_catalog(&self, result: &IntentResult) -> CapabilityResult<String> {
        match result.intent {
            Intent::ProductInquiry => {
                let product_type = entity_str(&result.entities, "productType")
                    .unwrap_or(DEFAULT_PRODUCT_TYPE);
                match self.catalog.search(product_type, self.search_limit).await {
                    Ok(items) if !items.is_empty() => Ok(format!(
                        "I found some {product_type}s available! {}",
                        summarize_items(&items)
                    )),
                    Ok(_) => Ok(clarify_product(product_type)),
                    Err(err) => {
                        warn!(error = %err, "product search failed");
                        Ok(clarify_product(product_type))
                    }
                }
            }
            Intent::PricingQuestion => {
                let product_type = entity_str(&result.entities, "productType")
                    .unwrap_or(DEFAULT_PRODUCT_TYPE);
                match self.catalog.search(product_type, self.search_limit).await {
                    Ok(items) if !items.is_empty() => Ok(format!(
                        "Our {product_type}s are competitively priced. {} Would you like more details?",
                        summarize_items(&items)
                    )),
                    Ok(_) | Err(_) => Ok(
                        "I can check pricing for you. What product are you interested in?"
                            .to_string(),
                    ),
                }
            }
            Intent::OrderStatus => match entity_str(&result.entities, "orderId") {
                Some(order_id) => match self.catalog.order_status(order_id).await {
                    Ok(report) => Ok(format!(
                        "Your order #{} is {}. Placed on {}, total {}.",
                        report.order_number,
                        report.status,
                        report.created_at.format("%B %-d, %Y"),
                        report.total_price
                    )),
                    Err(err) => {
                        warn!(error = %err, order_id, "order lookup failed");
                        Ok("I couldn't find your order. Can you confirm your order ID?"
                            .to_string())
                    }
                },
                None => Ok(
                    "I'd be happy to check your order status. Could you provide your order ID?"
                        .to_string(),
                ),
            },
            Intent::GeneralQuestion | Intent::SmallTalk | Intent::Unknown => {
                Ok("How can I help you with our products today?".to_string())
            }
        }
    }

    /// Language-model path: system instruction + recent history + the
    /// user message. Any client failure becomes the rephrase apology.
    async fn handle_language_model(
        &self,
        result: &IntentResult,
        profile: &BehaviorProfile,
        message: &str,
        history: &[ChatTurn],
    ) -> String {
        let mut instruction = profile.system_prompt.clone();
        instruction.push(' ');
        instruction.push_str(match result.intent {
            Intent::SmallTalk => {
                "Be friendly and engaging. After the greeting, try to understand if they \
                 need help with anything."
            }
            Intent::GeneralQuestion => {
                "Answer their question helpfully. If it relates to products or orders, \
                 suggest they ask about specific products."
            }
            _ => "Provide helpful information related to their question.",
        });

        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(ChatTurn::system(instruction));
        turns.extend_from_slice(history);
        // The history window already ends with the just-appended user
        // message; only add it when the window was truncated away.
        let already_present = history
            .last()
            .is_some_and(|turn| turn.role == ChatRole::User && turn.content == message);
        if !already_present {
            turns.push(ChatTurn {
                role: ChatRole::User,
                content: message.to_string(),
            });
        }

        match self.language_model.complete(&turns).await {
            Ok(completion) => completion.text,
            Err(CapabilityError::RateLimited) => {
                warn!("language model rate limited");
                REPHRASE_APOLOGY.to_string()
            }
            Err(CapabilityError::MissingCredential(detail)) => {
                warn!(detail, "language model credential missing");
                REPHRASE_APOLOGY.to_string()
            }
            Err(err) => {
                warn!(error = %err, "language model call failed");
                REPHRASE_APOLOGY.to_string()
            }
        }
    }
}

fn entity_str<'a>(entities: &'a EntityMap, key: &str) -> Option<&'a str> {
    entities.get(key).and_then(Value::as_str)
}

fn summarize_items(items: &[CatalogItem]) -> String {
    items
        .iter()
        .map(|item| format!("{} ({})", item.title, item.price))
        .collect::<Vec<_>>()
        .join(", ")
}

fn clarify_product(product_type: &str) -> String {
    format!("I can help you find {product_type}s. What specific style or color are you looking for?")
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use chrono::Utc;

    use crate::clients::{Completion, OrderReport};
    use crate::core::config::SessionConfig;
    use crate::core::message::ContextPatch;

    struct StubCatalog {
        items: Vec<CatalogItem>,
        order: Option<OrderReport>,
        fail: bool,
    }

    impl StubCatalog {
        fn empty() -> Self {
            Self {
                items: Vec::new(),
                order: None,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::empty()
            }
        }

        fn with_items() -> Self {
            Self {
                items: vec![CatalogItem {
                    id: "p1".to_string(),
                    title: "Classic Tee".to_string(),
                    price: "$19.99".to_string(),
                    url: None,
                }],
                ..Self::empty()
            }
        }
    }

    #[async_trait]
    impl CatalogClient for StubCatalog {
        async fn search(&self, _term: &str, _limit: usize) -> CapabilityResult<Vec<CatalogItem>> {
            if self.fail {
                return Err(CapabilityError::Api("catalog down".to_string()));
            }
            Ok(self.items.clone())
        }

        async fn order_status(&self, order_id: &str) -> CapabilityResult<OrderReport> {
            if self.fail {
                return Err(CapabilityError::Api("catalog down".to_string()));
            }
            self.order
                .clone()
                .ok_or_else(|| CapabilityError::NotFound(format!("order {order_id}")))
        }
    }

    enum StubLanguageModel {
        Reply(&'static str),
        RateLimited,
        Down,
    }

    #[async_trait]
    impl LanguageModelClient for StubLanguageModel {
        async fn complete(&self, _messages: &[ChatTurn]) -> CapabilityResult<Completion> {
            match self {
                Self::Reply(text) => Ok(Completion {
                    text: (*text).to_string(),
                    model_id: "stub".to_string(),
                    tokens_used: 1,
                }),
                Self::RateLimited => Err(CapabilityError::RateLimited),
                Self::Down => Err(CapabilityError::Api("model down".to_string())),
            }
        }
    }

    fn orchestrator(
        catalog: StubCatalog,
        language_model: StubLanguageModel,
    ) -> (Orchestrator, Arc<SessionStore>) {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            IntentClassifier::default(),
            Arc::new(catalog),
            Arc::new(language_model),
            Arc::new(ProfileRegistry::with_builtins("ecommerce")),
            5,
        );
        (orchestrator, store)
    }

    fn request(message: &str) -> BotRequest {
        BotRequest {
            message: message.to_string(),
            user_id: "u1".to_string(),
            session_id: "s1".to_string(),
            profile: None,
        }
    }

    #[tokio::test]
    async fn never_errors_when_all_clients_fail() {
        let (orchestrator, _) =
            orchestrator(StubCatalog::failing(), StubLanguageModel::Down);

        for message in [
            "Do you have any t-shirts?",
            "Where is order #12345?",
            "How much do they cost?",
            "Hello!",
            "Tell me something interesting",
        ] {
            let response = orchestrator.process(&request(message)).await.unwrap();
            assert!(!response.response.is_empty(), "empty reply for {message:?}");
        }
    }

    #[tokio::test]
    async fn three_turn_scenario() {
        let (orchestrator, store) =
            orchestrator(StubCatalog::with_items(), StubLanguageModel::Reply("Hi! How can I help?"));

        let first = orchestrator.process(&request("Hi there!")).await.unwrap();
        assert_eq!(first.intent, Intent::SmallTalk);
        assert_eq!(first.handler, Handler::LanguageModel);
        assert!(!first.response.is_empty());

        let second = orchestrator
            .process(&request("Do you have any t-shirts?"))
            .await
            .unwrap();
        assert_eq!(second.intent, Intent::ProductInquiry);
        assert_eq!(second.handler, Handler::Catalog);

        let third = orchestrator
            .process(&request("How much do they cost?"))
            .await
            .unwrap();
        assert_eq!(third.intent, Intent::PricingQuestion);

        assert!(store.history("u1", "s1", None).len() >= 6);
    }

    #[tokio::test]
    async fn empty_message_is_rejected_before_any_mutation() {
        let (orchestrator, store) =
            orchestrator(StubCatalog::empty(), StubLanguageModel::Reply("hi"));

        let result = orchestrator.process(&request("   ")).await;
        assert!(matches!(result, Err(BotError::InvalidInput(_))));
        assert_eq!(store.stats().total_messages, 0);
    }

    #[tokio::test]
    async fn disabled_profile_is_refused_before_any_mutation() {
        let store = Arc::new(SessionStore::new(SessionConfig::default()));
        let mut profiles = ProfileRegistry::with_builtins("ecommerce");
        let mut disabled = profiles.get("ecommerce").unwrap().clone();
        disabled.enabled = false;
        profiles.insert(disabled);

        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            IntentClassifier::default(),
            Arc::new(StubCatalog::empty()),
            Arc::new(StubLanguageModel::Reply("hi")),
            Arc::new(profiles),
            5,
        );

        let result = orchestrator.process(&request("Hello!")).await;
        assert!(matches!(result, Err(BotError::ProfileDisabled(_))));
        assert_eq!(store.stats().total_messages, 0);
    }

    #[tokio::test]
    async fn product_search_lists_results() {
        let (orchestrator, _) =
            orchestrator(StubCatalog::with_items(), StubLanguageModel::Down);

        let response = orchestrator
            .process(&request("Do you have any t-shirts?"))
            .await
            .unwrap();
        assert!(response.response.contains("Classic Tee"));
        assert!(response.response.contains("$19.99"));
    }

    #[tokio::test]
    async fn order_status_with_known_order() {
        let mut catalog = StubCatalog::empty();
        catalog.order = Some(OrderReport {
            id: "gid-1".to_string(),
            order_number: 12345,
            status: "shipped".to_string(),
            created_at: Utc::now(),
            total_price: "$42.00".to_string(),
            line_items: Vec::new(),
        });
        let (orchestrator, _) = orchestrator(catalog, StubLanguageModel::Down);

        let response = orchestrator
            .process(&request("Where is order #12345?"))
            .await
            .unwrap();
        assert!(response.response.contains("#12345"));
        assert!(response.response.contains("shipped"));
    }

    #[tokio::test]
    async fn order_status_without_id_asks_for_one() {
        let (orchestrator, _) = orchestrator(StubCatalog::empty(), StubLanguageModel::Down);

        let response = orchestrator
            .process(&request("Where is my order?"))
            .await
            .unwrap();
        assert!(response.response.contains("order ID"));
    }

    #[tokio::test]
    async fn rate_limited_model_folds_to_rephrase_apology() {
        let (orchestrator, _) =
            orchestrator(StubCatalog::empty(), StubLanguageModel::RateLimited);

        let response = orchestrator.process(&request("Hello!")).await.unwrap();
        assert_eq!(response.response, REPHRASE_APOLOGY);
    }

    #[tokio::test]
    async fn assistant_reply_is_appended_to_history() {
        let (orchestrator, store) =
            orchestrator(StubCatalog::empty(), StubLanguageModel::Reply("Hi! How can I help?"));

        let response = orchestrator.process(&request("Hello!")).await.unwrap();
        let history = store.history("u1", "s1", None);
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, MessageRole::Assistant);
        assert_eq!(history[1].content, response.response);
    }

    #[tokio::test]
    async fn hybrid_resolves_to_catalog_fallback_text() {
        // With shopping history and no keyword hit, the hybrid chain runs
        // the catalog attempt first. For a general question that attempt
        // yields the generic products fallback, which is non-empty, so
        // the language-model leg only runs on a hard catalog error. This
        // mirrors the deployed routing.
        let (orchestrator, store) =
            orchestrator(StubCatalog::empty(), StubLanguageModel::Reply("llm reply"));
        store.update_context(
            "u1",
            "s1",
            ContextPatch {
                recent_purchases: Some(vec!["prod-1".to_string()]),
                ..ContextPatch::default()
            },
        );

        let response = orchestrator
            .process(&request("What would you suggest for me?"))
            .await
            .unwrap();
        assert_eq!(response.handler, Handler::Hybrid);
        assert_eq!(response.intent, Intent::GeneralQuestion);
        assert!(response.response.contains("products"));
    }
}
