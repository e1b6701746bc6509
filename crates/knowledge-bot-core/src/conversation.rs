//! UI-agnostic conversation state
//!
//! The conversation is an ordered list of turns that only ever grows, except
//! that the pending assistant placeholder is replaced once its query settles.
//! Every transition writes into a fresh copy of the list when a snapshot is
//! still held elsewhere, so readers of a snapshot always see a consistent
//! version.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::QueryResponse;

/// Content of the turn that replaces a placeholder whose query failed
pub const ERROR_MESSAGE: &str = "An error occurred while fetching the response. Please try again.";

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Citation record returned by the knowledge service, kept as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Source(pub serde_json::Value);

impl Source {
    /// One-line label for display
    pub fn label(&self) -> String {
        match &self.0 {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Object(map) => match map.get("title") {
                Some(serde_json::Value::String(title)) => title.clone(),
                _ => self.0.to_string(),
            },
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Value> for Source {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub error: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            sources: Vec::new(),
            loading: false,
            error: false,
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            sources,
            loading: false,
            error: false,
        }
    }

    /// Assistant turn shown while its query is outstanding
    pub fn placeholder() -> Self {
        Self {
            loading: true,
            ..Self::assistant("", Vec::new())
        }
    }

    /// Assistant turn shown when its query failed
    pub fn failed() -> Self {
        Self {
            error: true,
            ..Self::assistant(ERROR_MESSAGE, Vec::new())
        }
    }
}

/// Handle to the placeholder turn created by [`Conversation::append_user_turn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingTurn(usize);

impl PendingTurn {
    /// Position of the placeholder in the conversation
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Arc<Vec<ChatMessage>>,
    pending: Option<PendingTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the user's turn and an assistant placeholder.
    ///
    /// Returns `None` without touching the conversation when `text` is blank
    /// after trimming or a previous query is still outstanding.
    pub fn append_user_turn(&mut self, text: &str) -> Option<PendingTurn> {
        let text = text.trim();
        if text.is_empty() || self.is_busy() {
            return None;
        }

        let messages = Arc::make_mut(&mut self.messages);
        messages.push(ChatMessage::user(text));
        messages.push(ChatMessage::placeholder());

        let turn = PendingTurn(messages.len() - 1);
        self.pending = Some(turn);
        Some(turn)
    }

    /// Replace the pending placeholder with the service's answer.
    ///
    /// Returns `false` if `turn` is not the outstanding placeholder.
    pub fn resolve_pending(&mut self, turn: PendingTurn, response: QueryResponse) -> bool {
        self.settle(turn, ChatMessage::assistant(response.answer, response.sources))
    }

    /// Replace the pending placeholder with the fixed error turn.
    ///
    /// Returns `false` if `turn` is not the outstanding placeholder.
    pub fn fail_pending(&mut self, turn: PendingTurn) -> bool {
        self.settle(turn, ChatMessage::failed())
    }

    fn settle(&mut self, turn: PendingTurn, message: ChatMessage) -> bool {
        if self.pending != Some(turn) {
            tracing::warn!(turn = turn.index(), "Ignoring result for a turn that is not pending");
            return false;
        }

        let messages = Arc::make_mut(&mut self.messages);
        match messages.get_mut(turn.index()) {
            Some(slot) => *slot = message,
            None => return false,
        }
        self.pending = None;
        true
    }

    /// True while a query is outstanding
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<PendingTurn> {
        self.pending
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Shared view of the current messages that later transitions won't change
    pub fn snapshot(&self) -> Arc<Vec<ChatMessage>> {
        Arc::clone(&self.messages)
    }
}
