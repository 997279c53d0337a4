//! In-memory session store.
//!
//! Maps `(user_id, session_id)` to a [`ConversationSession`] with bounded
//! history (FIFO eviction of the oldest messages) and idle expiry. All
//! operations are infallible: a missing or expired session is replaced by
//! a fresh empty one, so callers never distinguish "new" from "existing
//! empty". The store is constructor-injected, never a process singleton,
//! so tests can run against isolated instances.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::config::SessionConfig;
use crate::core::message::{ChatTurn, ContextPatch, ConversationSession, Message, MessageRole, UserContext};

/// Composite key for one conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    /// User identifier.
    pub user_id: String,
    /// Session identifier.
    pub session_id: String,
}

impl SessionKey {
    /// Build a key from its parts.
    #[must_use]
    pub fn new(user_id: &str, session_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        }
    }
}

/// Aggregate store statistics.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SessionStats {
    /// Live session count.
    pub total_sessions: usize,
    /// Messages across all live sessions.
    pub total_messages: usize,
    /// Mean messages per live session (0 when empty).
    pub average_messages_per_session: f64,
}

/// Thread-safe session store. Concurrent operations on different keys do
/// not interfere; operations on the same key serialize on the map shard,
/// so every mutation is a single read-modify-write with no await inside.
pub struct SessionStore {
    sessions: DashMap<SessionKey, ConversationSession>,
    config: SessionConfig,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::seconds(i64::try_from(self.config.timeout_seconds).unwrap_or(i64::MAX))
    }

    /// Resolve the session for a key, creating or recycling it as needed,
    /// refresh `updated_at`, and run `f` under the map guard. `f` must be
    /// synchronous and short.
    fn with_session<T>(
        &self,
        user_id: &str,
        session_id: &str,
        f: impl FnOnce(&mut ConversationSession) -> T,
    ) -> T {
        let now = Utc::now();
        let mut entry = self
            .sessions
            .entry(SessionKey::new(user_id, session_id))
            .or_insert_with(|| ConversationSession::new(user_id, session_id));

        if now - entry.updated_at > self.timeout() {
            // Idle too long: recycle under the same key.
            *entry.value_mut() = ConversationSession::new(user_id, session_id);
        } else {
            entry.updated_at = now;
        }

        f(entry.value_mut())
    }

    /// Get the session for a key, creating a fresh one when absent or
    /// expired. Never fails.
    #[must_use]
    pub fn get_or_create(&self, user_id: &str, session_id: &str) -> ConversationSession {
        self.with_session(user_id, session_id, |session| session.clone())
    }

    /// Append a message, evicting the oldest entries beyond the history
    /// limit. Returns the created message.
    pub fn add_message(
        &self,
        user_id: &str,
        session_id: &str,
        role: MessageRole,
        content: &str,
        metadata: Option<Map<String, Value>>,
    ) -> Message {
        let max_history = self.config.max_history;
        self.with_session(user_id, session_id, |session| {
            let message = Message::new(role, content, metadata);
            session.messages.push(message.clone());
            if session.messages.len() > max_history {
                let excess = session.messages.len() - max_history;
                session.messages.drain(..excess);
            }
            message
        })
    }

    /// Conversation history, oldest first. `limit` of `None` or zero
    /// returns everything; otherwise the most recent `limit` entries.
    #[must_use]
    pub fn history(&self, user_id: &str, session_id: &str, limit: Option<usize>) -> Vec<Message> {
        self.with_session(user_id, session_id, |session| match limit {
            Some(n) if n > 0 => {
                let start = session.messages.len().saturating_sub(n);
                session.messages[start..].to_vec()
            }
            _ => session.messages.clone(),
        })
    }

    /// History projected to role + content pairs, ready for a
    /// language-model call.
    #[must_use]
    pub fn formatted_history(
        &self,
        user_id: &str,
        session_id: &str,
        limit: Option<usize>,
    ) -> Vec<ChatTurn> {
        self.history(user_id, session_id, limit)
            .iter()
            .map(ChatTurn::from)
            .collect()
    }

    /// Shallow-merge a patch onto the session's user context.
    pub fn update_context(&self, user_id: &str, session_id: &str, patch: ContextPatch) {
        self.with_session(user_id, session_id, |session| {
            session.context.merge(patch);
        });
    }

    /// The session's user context.
    #[must_use]
    pub fn context(&self, user_id: &str, session_id: &str) -> UserContext {
        self.with_session(user_id, session_id, |session| session.context.clone())
    }

    /// Full session data.
    #[must_use]
    pub fn session(&self, user_id: &str, session_id: &str) -> ConversationSession {
        self.get_or_create(user_id, session_id)
    }

    /// Empty the message history, keeping the session and its context.
    pub fn clear_history(&self, user_id: &str, session_id: &str) {
        self.with_session(user_id, session_id, |session| {
            session.messages.clear();
        });
    }

    /// Remove the session entirely. The next access recreates it fresh.
    pub fn clear_session(&self, user_id: &str, session_id: &str) {
        self.sessions.remove(&SessionKey::new(user_id, session_id));
    }

    /// Whether the session has any messages.
    #[must_use]
    pub fn has_context(&self, user_id: &str, session_id: &str) -> bool {
        self.with_session(user_id, session_id, |session| !session.messages.is_empty())
    }

    /// Short textual digest of the recent conversation for prompt context.
    #[must_use]
    pub fn summary(&self, user_id: &str, session_id: &str) -> String {
        let messages = self.history(user_id, session_id, Some(10));
        if messages.is_empty() {
            return "No previous conversation history.".to_string();
        }

        let user_count = messages
            .iter()
            .filter(|msg| msg.role == MessageRole::User)
            .count();
        let assistant_count = messages.len() - user_count;
        let tail: String = messages
            .last()
            .map(|msg| msg.content.chars().take(100).collect())
            .unwrap_or_default();

        format!(
            "Conversation Summary:\n- Total messages: {}\n- User messages: {user_count}\n- Assistant responses: {assistant_count}\n- Last message: {tail}...",
            messages.len()
        )
    }

    /// Aggregate statistics over all live sessions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> SessionStats {
        let total_sessions = self.sessions.len();
        let total_messages: usize = self
            .sessions
            .iter()
            .map(|entry| entry.messages.len())
            .sum();

        SessionStats {
            total_sessions,
            total_messages,
            average_messages_per_session: if total_sessions > 0 {
                total_messages as f64 / total_sessions as f64
            } else {
                0.0
            },
        }
    }

    /// Delete every session idle beyond the timeout. Returns the number
    /// deleted. Safe to call concurrently with reads and writes.
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let timeout = self.timeout();
        let mut removed = 0;

        self.sessions.retain(|_, session| {
            let keep = now - session.updated_at <= timeout;
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    /// Rewind a session's `updated_at` to simulate idleness.
    #[cfg(test)]
    pub(crate) fn backdate(&self, user_id: &str, session_id: &str, seconds: i64) {
        if let Some(mut entry) = self.sessions.get_mut(&SessionKey::new(user_id, session_id)) {
            entry.updated_at -= Duration::seconds(seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(SessionConfig::default())
    }

    #[test]
    fn history_is_bounded_and_keeps_newest() {
        let store = store();
        for i in 0..30 {
            store.add_message("u1", "s1", MessageRole::User, &format!("msg {i}"), None);
        }

        let history = store.history("u1", "s1", None);
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].content, "msg 10");
        assert_eq!(history[19].content, "msg 29");
    }

    #[test]
    fn repeated_get_or_create_returns_same_session() {
        let store = store();
        let first = store.get_or_create("u1", "s1");
        let second = store.get_or_create("u1", "s1");

        assert_eq!(first.created_at, second.created_at);
        assert_eq!(store.stats().total_sessions, 1);
    }

    #[test]
    fn sessions_are_isolated_per_key() {
        let store = store();
        store.add_message("u1", "s1", MessageRole::User, "hello", None);
        store.add_message("u1", "s2", MessageRole::User, "other", None);

        assert_eq!(store.history("u1", "s1", None).len(), 1);
        assert_eq!(store.history("u1", "s2", None).len(), 1);
        assert_eq!(store.stats().total_sessions, 2);
    }

    #[test]
    fn expired_session_is_recycled_on_access() {
        let store = store();
        store.add_message("u1", "s1", MessageRole::User, "hello", None);
        let old = store.get_or_create("u1", "s1");
        store.backdate("u1", "s1", 31 * 60);

        let fresh = store.get_or_create("u1", "s1");
        assert!(fresh.messages.is_empty());
        assert!(fresh.created_at > old.created_at);
    }

    #[test]
    fn access_within_timeout_refreshes_updated_at() {
        let store = store();
        store.add_message("u1", "s1", MessageRole::User, "hello", None);
        store.backdate("u1", "s1", 10 * 60);

        // Still inside the 30 minute window: the session survives and
        // the access resets the idle clock.
        let session = store.get_or_create("u1", "s1");
        assert_eq!(session.messages.len(), 1);
        assert_eq!(store.cleanup_expired(), 0);
    }

    #[test]
    fn cleanup_counts_expired_sessions() {
        let store = store();
        store.get_or_create("u1", "s1");
        store.get_or_create("u2", "s2");
        store.get_or_create("u3", "s3");
        store.backdate("u1", "s1", 31 * 60);
        store.backdate("u2", "s2", 45 * 60);

        assert_eq!(store.cleanup_expired(), 2);
        assert_eq!(store.stats().total_sessions, 1);
    }

    #[test]
    fn limit_zero_means_no_limit() {
        let store = store();
        for i in 0..5 {
            store.add_message("u1", "s1", MessageRole::User, &format!("msg {i}"), None);
        }

        assert_eq!(store.history("u1", "s1", Some(0)).len(), 5);
        assert_eq!(store.history("u1", "s1", Some(2)).len(), 2);
        assert_eq!(store.history("u1", "s1", Some(2))[0].content, "msg 3");
    }

    #[test]
    fn formatted_history_drops_timestamps_and_metadata() {
        let store = store();
        let mut meta = Map::new();
        meta.insert("source".to_string(), Value::from("widget"));
        store.add_message("u1", "s1", MessageRole::User, "hi", Some(meta));
        store.add_message("u1", "s1", MessageRole::Assistant, "hello!", None);

        let turns = store.formatted_history("u1", "s1", None);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "hi");
        assert_eq!(turns[1].content, "hello!");
    }

    #[test]
    fn context_merge_keeps_earlier_fields() {
        let store = store();
        store.update_context(
            "u1",
            "s1",
            ContextPatch {
                user_name: Some("John".to_string()),
                ..ContextPatch::default()
            },
        );
        store.update_context(
            "u1",
            "s1",
            ContextPatch {
                user_email: Some("j@x.com".to_string()),
                ..ContextPatch::default()
            },
        );

        let ctx = store.context("u1", "s1");
        assert_eq!(ctx.user_name.as_deref(), Some("John"));
        assert_eq!(ctx.user_email.as_deref(), Some("j@x.com"));
    }

    #[test]
    fn clear_history_keeps_context() {
        let store = store();
        store.add_message("u1", "s1", MessageRole::User, "hello", None);
        store.update_context(
            "u1",
            "s1",
            ContextPatch {
                user_name: Some("John".to_string()),
                ..ContextPatch::default()
            },
        );

        store.clear_history("u1", "s1");
        assert!(!store.has_context("u1", "s1"));
        assert_eq!(store.context("u1", "s1").user_name.as_deref(), Some("John"));
    }

    #[test]
    fn clear_session_removes_the_entry() {
        let store = store();
        store.add_message("u1", "s1", MessageRole::User, "hello", None);
        store.update_context(
            "u1",
            "s1",
            ContextPatch {
                user_name: Some("John".to_string()),
                ..ContextPatch::default()
            },
        );

        store.clear_session("u1", "s1");
        let session = store.get_or_create("u1", "s1");
        assert!(session.messages.is_empty());
        assert!(session.context.user_name.is_none());
    }

    #[test]
    fn stats_average() {
        let store = store();
        store.add_message("u1", "s1", MessageRole::User, "a", None);
        store.add_message("u1", "s1", MessageRole::Assistant, "b", None);
        store.add_message("u2", "s2", MessageRole::User, "c", None);

        let stats = store.stats();
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_messages, 3);
        assert!((stats.average_messages_per_session - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_reports_counts_and_tail() {
        let store = store();
        assert_eq!(
            store.summary("u1", "s1"),
            "No previous conversation history."
        );

        store.add_message("u1", "s1", MessageRole::User, "hello", None);
        store.add_message("u1", "s1", MessageRole::Assistant, "hi, how can I help?", None);
        let summary = store.summary("u1", "s1");
        assert!(summary.contains("Total messages: 2"));
        assert!(summary.contains("hi, how can I help?"));
    }
}
