//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::clients::{HttpCatalogClient, OpenAiChatClient};
use crate::core::config::BotConfig;
use crate::core::errors::{BotError, BotResult};
use crate::engine::Orchestrator;
use crate::intent::IntentClassifier;
use crate::profile::ProfileRegistry;
use crate::session::SessionStore;

/// Shared application state.
pub struct AppState {
    /// Request orchestrator.
    pub orchestrator: Orchestrator,
    /// Session store, exposed for stats and clearing endpoints.
    pub store: Arc<SessionStore>,
    /// Behavior profile registry.
    pub profiles: Arc<ProfileRegistry>,
    /// Directory served at the root path.
    pub static_dir: String,
}

impl AppState {
    /// Wire the full application from configuration.
    ///
    /// # Errors
    /// Returns an error if the classifier patterns fail to compile.
    pub fn new(config: &BotConfig) -> BotResult<Arc<Self>> {
        let store = Arc::new(SessionStore::new(config.session.clone()));
        let profiles = Arc::new(ProfileRegistry::with_builtins(&config.profile.active));
        let classifier = IntentClassifier::new()
            .map_err(|err| BotError::InvalidConfig(format!("invalid entity pattern: {err}")))?;

        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            classifier,
            Arc::new(HttpCatalogClient::new(&config.catalog)),
            Arc::new(OpenAiChatClient::new(config.llm.clone())),
            Arc::clone(&profiles),
            config.catalog.search_limit,
        );

        Ok(Arc::new(Self {
            orchestrator,
            store,
            profiles,
            static_dir: config.server.static_dir.clone(),
        }))
    }
}
