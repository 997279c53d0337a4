//! Behavior profiles: swappable persona bundles (greeting, system prompt,
//! tone) selecting the assistant's voice. The orchestrator only reads
//! these; it refuses to process when the active profile is disabled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Conversational tone of a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Reserved, businesslike.
    Professional,
    /// Warm and welcoming.
    Friendly,
    /// Relaxed, informal.
    Casual,
    /// Strictly formal.
    Formal,
}

/// A named persona bundle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BehaviorProfile {
    /// Registry key.
    pub name: String,
    /// Whether this profile accepts requests.
    pub enabled: bool,
    /// Profile revision.
    pub version: String,
    /// Conversational tone.
    pub tone: Tone,
    /// Greeting shown when the chat opens.
    pub greeting: String,
    /// System prompt prefix for language-model calls.
    pub system_prompt: String,
    /// Questions suggested to the user by the widget.
    pub suggested_questions: Vec<String>,
    /// Opening lines the widget can rotate through.
    pub conversation_starters: Vec<String>,
    /// Soft cap on reply length, in words.
    pub max_response_words: usize,
}

impl BehaviorProfile {
    fn ecommerce() -> Self {
        Self {
            name: "ecommerce".to_string(),
            enabled: true,
            version: "1.0.0".to_string(),
            tone: Tone::Friendly,
            greeting: "Hi! I'm your shopping assistant. I can help you find products, \
                       answer questions about sizing and features, or assist with your \
                       order. What can I help you with today?"
                .to_string(),
            system_prompt: "You are a helpful shopping assistant for an online store. \
                            Answer questions about products, sizes, availability, \
                            shipping, returns, and order tracking. Be friendly, patient, \
                            and concise; ask clarifying questions when the customer's \
                            need is unclear, and be honest when you don't know specific \
                            product details."
                .to_string(),
            suggested_questions: vec![
                "Do you have any t-shirts?".to_string(),
                "How much does shipping cost?".to_string(),
                "Where is my order?".to_string(),
            ],
            conversation_starters: vec![
                "Looking for something specific today?".to_string(),
                "Need help tracking an order?".to_string(),
            ],
            max_response_words: 200,
        }
    }

    fn portfolio() -> Self {
        Self {
            name: "portfolio".to_string(),
            enabled: true,
            version: "1.0.0".to_string(),
            tone: Tone::Professional,
            greeting: "Hello! I can tell you about this portfolio, its projects, and \
                       how to get in touch. What would you like to know?"
                .to_string(),
            system_prompt: "You are an assistant for a personal portfolio website. \
                            Answer questions about the owner's projects, skills, and \
                            experience. Keep a professional tone and direct visitors to \
                            the contact links for anything you cannot answer."
                .to_string(),
            suggested_questions: vec![
                "What projects are featured here?".to_string(),
                "How can I get in touch?".to_string(),
            ],
            conversation_starters: vec!["Curious about a particular project?".to_string()],
            max_response_words: 150,
        }
    }
}

/// Registry of named profiles with built-in presets.
pub struct ProfileRegistry {
    profiles: HashMap<String, BehaviorProfile>,
    default_name: String,
}

impl ProfileRegistry {
    /// Create a registry holding the built-in `ecommerce` and `portfolio`
    /// profiles, with `default_name` answering unknown lookups.
    #[must_use]
    pub fn with_builtins(default_name: &str) -> Self {
        let mut profiles = HashMap::new();
        for profile in [BehaviorProfile::ecommerce(), BehaviorProfile::portfolio()] {
            profiles.insert(profile.name.clone(), profile);
        }
        Self {
            profiles,
            default_name: default_name.to_string(),
        }
    }

    /// Register or replace a profile under its own name.
    pub fn insert(&mut self, profile: BehaviorProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    /// Exact lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&BehaviorProfile> {
        self.profiles.get(name)
    }

    /// Lookup with fallback to the default profile, then to any profile.
    /// Returns `None` only for an empty registry.
    #[must_use]
    pub fn resolve(&self, name: Option<&str>) -> Option<&BehaviorProfile> {
        name.and_then(|n| self.profiles.get(n))
            .or_else(|| self.profiles.get(&self.default_name))
            .or_else(|| self.profiles.values().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_present_and_enabled() {
        let registry = ProfileRegistry::with_builtins("ecommerce");
        let ecommerce = registry.get("ecommerce").unwrap();
        assert!(ecommerce.enabled);
        assert_eq!(ecommerce.tone, Tone::Friendly);
        assert!(registry.get("portfolio").is_some());
    }

    #[test]
    fn unknown_name_resolves_to_default() {
        let registry = ProfileRegistry::with_builtins("ecommerce");
        let profile = registry.resolve(Some("no-such-profile")).unwrap();
        assert_eq!(profile.name, "ecommerce");
    }

    #[test]
    fn explicit_name_wins_over_default() {
        let registry = ProfileRegistry::with_builtins("ecommerce");
        let profile = registry.resolve(Some("portfolio")).unwrap();
        assert_eq!(profile.name, "portfolio");
    }

    #[test]
    fn inserted_profile_replaces_builtin() {
        let mut registry = ProfileRegistry::with_builtins("ecommerce");
        let mut custom = registry.get("ecommerce").unwrap().clone();
        custom.enabled = false;
        registry.insert(custom);

        assert!(!registry.resolve(None).unwrap().enabled);
    }
}
