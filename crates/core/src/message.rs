//! Message and Transcript domain types.
//!
//! A transcript is the only state the agent loop carries between iterations:
//! User query → Provider response (raw step JSON) → synthetic observation → ...

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::step;

/// Unique identifier for a transcript (one per user query).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (the step protocol)
    System,
    /// The end user, and observations synthesized by the loop
    User,
    /// The model
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a synthetic observation, fed back to the model as a user turn.
    pub fn observation(content: &str) -> Self {
        Self::user(step::encode_observation(content))
    }
}

/// The ordered, append-only message history of one query.
///
/// Always starts with exactly one system message followed by the user's
/// query. Messages are never edited or removed.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    id: ConversationId,
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a transcript for a single query.
    pub fn new(system_prompt: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(),
            messages: vec![Message::system(system_prompt), Message::user(query)],
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    /// Append a message. The system message is owned by the constructor, so
    /// callers append only user and assistant turns.
    pub fn append(&mut self, message: Message) {
        debug_assert!(
            message.role != Role::System,
            "transcript already has its system message"
        );
        self.messages.push(message);
    }

    /// Record the raw text the model returned for a turn.
    pub fn push_assistant(&mut self, raw: impl Into<String>) {
        self.append(Message::assistant(raw));
    }

    /// Record a synthetic observe step.
    pub fn push_observation(&mut self, content: &str) {
        self.append(Message::observation(content));
    }

    /// The ordered messages, as submitted to the model.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
