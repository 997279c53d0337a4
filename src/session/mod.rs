//! Per-user conversation state with bounded history and idle expiry.

pub mod store;

pub use store::{SessionKey, SessionStats, SessionStore};
