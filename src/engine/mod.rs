//! Orchestration of classification, routing, and reply composition.

pub mod orchestrator;

pub use orchestrator::{BotRequest, BotResponse, Orchestrator};
