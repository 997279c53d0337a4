//! Intent-routing chat backend for storefront customer support.
//!
//! One inbound message flows through the session store, the keyword
//! intent classifier, and the orchestrator, which routes it to a catalog
//! lookup, a language-model completion, or a hybrid of the two, and
//! always answers with exactly one reply string.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

/// External capability clients (catalog, language model).
pub mod clients;
/// Configuration, errors, and the conversation data model.
pub mod core;
/// The orchestrator tying classification, routing, and sessions together.
pub mod engine;
/// Keyword intent classification and entity extraction.
pub mod intent;
/// Background session expiry sweeping.
pub mod maintenance;
/// Behavior profiles (persona bundles).
pub mod profile;
/// HTTP server and API routes.
pub mod server;
/// In-memory conversation sessions.
pub mod session;

pub use clients::{CatalogClient, CatalogItem, Completion, LanguageModelClient, OrderReport};
pub use crate::core::{
    BotConfig, BotError, BotResult, CapabilityError, CapabilityResult, ChatTurn, ContextPatch,
    ConversationSession, Message, MessageRole, UserContext,
};
pub use engine::{BotRequest, BotResponse, Orchestrator};
pub use intent::{Handler, Intent, IntentClassifier, IntentResult};
pub use maintenance::ExpirySweeper;
pub use profile::{BehaviorProfile, ProfileRegistry, Tone};
pub use session::{SessionStats, SessionStore};

/// Initialize tracing with an env-filter, defaulting to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
