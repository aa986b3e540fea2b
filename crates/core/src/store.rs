//! Persistence contracts.
//!
//! The core never talks to a database directly. Progress and conversation
//! history go through these traits; the API service implements them over
//! SQLite.

use crate::conversation::ConversationContext;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(anyhow::anyhow!("unknown chat role '{}'", other)),
        }
    }
}

/// One turn of a practice conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Reference to stored audio for this turn, when one was produced.
    #[serde(default)]
    pub audio_ref: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            audio_ref: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            audio_ref: None,
        }
    }

    pub fn with_audio_ref(mut self, audio_ref: Option<String>) -> Self {
        self.audio_ref = audio_ref;
        self
    }
}

/// A conversation as last saved for a (user, language, topic).
#[derive(Debug, Clone, PartialEq)]
pub struct StoredConversation {
    pub context: ConversationContext,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressRecord {
    pub user_id: String,
    pub resource_type: String,
    pub resource_id: String,
    pub progress: f64,
    pub completed: bool,
    pub last_accessed: chrono::DateTime<chrono::Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Upserts the progress row for (user, resource type, resource id).
    ///
    /// `progress` is clamped into 0.0–1.0. A row never goes backwards: the
    /// stored progress is the highest ever recorded, and once `completed` it
    /// stays completed.
    async fn record_progress(
        &self,
        user_id: &str,
        resource_type: &str,
        resource_id: &str,
        progress: f64,
        completed: bool,
    ) -> Result<()>;

    /// All progress rows of a user, most recently accessed first.
    async fn progress_for(&self, user_id: &str) -> Result<Vec<ProgressRecord>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Upserts the conversation keyed by (user, language, topic) and replaces
    /// its message list.
    async fn save_conversation_state(
        &self,
        user_id: &str,
        language: &str,
        topic: &str,
        context: &ConversationContext,
        messages: &[ChatMessage],
    ) -> Result<()>;

    async fn load_conversation_state(
        &self,
        user_id: &str,
        language: &str,
        topic: &str,
    ) -> Result<Option<StoredConversation>>;
}

/// Clamps a progress fraction into 0.0–1.0. NaN counts as no progress.
pub fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_round_trip() {
        assert_eq!("assistant".parse::<ChatRole>().unwrap(), ChatRole::Assistant);
        assert_eq!(ChatRole::User.to_string(), "user");
        assert!("system".parse::<ChatRole>().is_err());

        let json = serde_json::to_string(&ChatMessage::user("Sawubona")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Sawubona","audio_ref":null}"#);
    }

    #[test]
    fn test_clamp_progress() {
        assert_eq!(clamp_progress(1.7), 1.0);
        assert_eq!(clamp_progress(-0.2), 0.0);
        assert_eq!(clamp_progress(0.4), 0.4);
        assert_eq!(clamp_progress(f64::NAN), 0.0);
    }
}
