//! Core types: configuration, errors, and the conversation data model.

pub mod config;
pub mod errors;
pub mod message;

pub use config::{
    BotConfig, CatalogConfig, LlmConfig, ProfileConfig, ServerConfig, SessionConfig, SweeperConfig,
};
pub use errors::{BotError, BotResult, CapabilityError, CapabilityResult};
pub use message::{
    ChatRole, ChatTurn, ContextPatch, ConversationSession, Message, MessageRole, UserContext,
};
