//! Conversation data model: messages, user context, and sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who authored a stored conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The end user.
    User,
    /// The assistant reply.
    Assistant,
}

impl MessageRole {
    /// String representation for logging and wire formats.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation message. Immutable once created; insertion order
/// is conversational order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Optional free-form metadata attached at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Message {
    /// Create a message stamped with the current time.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>, metadata: Option<Map<String, Value>>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Role tags accepted by the language-model capability. Unlike
/// [`MessageRole`], this includes the system instruction slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System instruction.
    System,
    /// End-user turn.
    User,
    /// Assistant turn.
    Assistant,
}

impl From<MessageRole> for ChatRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Self::User,
            MessageRole::Assistant => Self::Assistant,
        }
    }
}

/// A role-tagged turn handed to the language-model client. This is the
/// projection of [`Message`] that drops timestamps and metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Turn role.
    pub role: ChatRole,
    /// Turn text.
    pub content: String,
}

impl ChatTurn {
    /// Build a system-instruction turn.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

impl From<&Message> for ChatTurn {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role.into(),
            content: msg.content.clone(),
        }
    }
}

/// Per-user context carried by a session and enriched over time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    /// Owning user identifier.
    pub user_id: String,
    /// Owning session identifier.
    pub session_id: String,
    /// Display name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Email, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    /// Identifiers of recent purchases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_purchases: Option<Vec<String>>,
    /// Identifier of the most recent order, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_order_id: Option<String>,
    /// Free-form preference map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<Map<String, Value>>,
    /// Time of the last interaction recorded by a caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_interaction_time: Option<DateTime<Utc>>,
}

impl UserContext {
    /// Seed a fresh context for a new session.
    #[must_use]
    pub fn seed(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// Shallow-merge a patch onto this context. Each populated patch
    /// field replaces the corresponding field wholesale.
    pub fn merge(&mut self, patch: ContextPatch) {
        if let Some(name) = patch.user_name {
            self.user_name = Some(name);
        }
        if let Some(email) = patch.user_email {
            self.user_email = Some(email);
        }
        if let Some(purchases) = patch.recent_purchases {
            self.recent_purchases = Some(purchases);
        }
        if let Some(order_id) = patch.last_order_id {
            self.last_order_id = Some(order_id);
        }
        if let Some(prefs) = patch.preferences {
            self.preferences = Some(prefs);
        }
        if let Some(at) = patch.last_interaction_time {
            self.last_interaction_time = Some(at);
        }
    }

    /// Whether the user has prior shopping signals (recent purchases or a
    /// known last order). Drives the hybrid classification rule.
    #[must_use]
    pub fn has_shopping_history(&self) -> bool {
        let has_purchases = self
            .recent_purchases
            .as_ref()
            .is_some_and(|list| !list.is_empty());
        has_purchases || self.last_order_id.is_some()
    }
}

/// Partial update for [`UserContext`]; `None` fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ContextPatch {
    /// New display name.
    pub user_name: Option<String>,
    /// New email.
    pub user_email: Option<String>,
    /// Replacement purchase list.
    pub recent_purchases: Option<Vec<String>>,
    /// Replacement last-order identifier.
    pub last_order_id: Option<String>,
    /// Replacement preference map.
    pub preferences: Option<Map<String, Value>>,
    /// Replacement last-interaction time.
    pub last_interaction_time: Option<DateTime<Utc>>,
}

/// Bounded conversation state for one `(user_id, session_id)` pair.
/// Owned exclusively by the session store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Session identifier.
    pub session_id: String,
    /// User identifier.
    pub user_id: String,
    /// Ordered message history, bounded by the store's history limit.
    pub messages: Vec<Message>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last resolving access; drives idle expiry.
    pub updated_at: DateTime<Utc>,
    /// Per-user context.
    pub context: UserContext,
}

impl ConversationSession {
    /// Create a fresh empty session keyed to the given pair.
    #[must_use]
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let session_id = session_id.into();
        let now = Utc::now();
        Self {
            context: UserContext::seed(user_id.clone(), session_id.clone()),
            session_id,
            user_id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_shallow_and_additive() {
        let mut ctx = UserContext::seed("u1", "s1");
        ctx.merge(ContextPatch {
            user_name: Some("John".to_string()),
            ..ContextPatch::default()
        });
        ctx.merge(ContextPatch {
            user_email: Some("j@x.com".to_string()),
            ..ContextPatch::default()
        });

        assert_eq!(ctx.user_name.as_deref(), Some("John"));
        assert_eq!(ctx.user_email.as_deref(), Some("j@x.com"));
        assert_eq!(ctx.user_id, "u1");
    }

    #[test]
    fn merge_replaces_fields_wholesale() {
        let mut ctx = UserContext::seed("u1", "s1");
        ctx.merge(ContextPatch {
            recent_purchases: Some(vec!["a".to_string(), "b".to_string()]),
            ..ContextPatch::default()
        });
        ctx.merge(ContextPatch {
            recent_purchases: Some(vec!["c".to_string()]),
            ..ContextPatch::default()
        });

        assert_eq!(ctx.recent_purchases, Some(vec!["c".to_string()]));
    }

    #[test]
    fn shopping_history_signals() {
        let mut ctx = UserContext::seed("u1", "s1");
        assert!(!ctx.has_shopping_history());

        ctx.recent_purchases = Some(Vec::new());
        assert!(!ctx.has_shopping_history());

        ctx.recent_purchases = Some(vec!["order-1".to_string()]);
        assert!(ctx.has_shopping_history());

        ctx.recent_purchases = None;
        ctx.last_order_id = Some("10001".to_string());
        assert!(ctx.has_shopping_history());
    }

    #[test]
    fn chat_turn_projection_drops_metadata() {
        let mut meta = Map::new();
        meta.insert("channel".to_string(), Value::from("widget"));
        let msg = Message::new(MessageRole::User, "hello", Some(meta));

        let turn = ChatTurn::from(&msg);
        assert_eq!(turn.role, ChatRole::User);
        assert_eq!(turn.content, "hello");
    }
}
