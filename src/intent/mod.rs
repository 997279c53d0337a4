//! Intent classification and entity extraction.

pub mod classifier;
pub mod entities;

pub use classifier::{Handler, Intent, IntentClassifier, IntentResult};
pub use entities::{EntityExtractor, EntityMap};
