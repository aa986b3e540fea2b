//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the immutable content
//! stores, the capability clients, the storage backends and the per-learner
//! conversation sessions.

use lingo_core::{
    catalog::ContentCatalog,
    conversation::ConversationDriver,
    feedback::FeedbackService,
    phrasebook::Phrasebooks,
    speech::SpeechSynthesizer,
    store::{ChatMessage, ConversationStore, ProgressStore},
    translation::Translator,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// How many messages of a conversation are kept and saved; older turns are
/// dropped first.
pub const MAX_TRANSCRIPT_MESSAGES: usize = 100;

/// The conversation a learner is having in one language. `topic` is the key
/// it is stored under, fixed when the conversation is opened.
#[derive(Debug, Clone)]
pub struct ActiveConversation {
    pub topic: String,
    pub transcript: Vec<ChatMessage>,
}

impl ActiveConversation {
    pub fn new(topic: String, transcript: Vec<ChatMessage>) -> Self {
        let mut conversation = Self {
            topic,
            transcript: Vec::new(),
        };
        for message in transcript {
            conversation.push(message);
        }
        conversation
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.transcript.push(message);
        let overflow = self
            .transcript
            .len()
            .saturating_sub(MAX_TRANSCRIPT_MESSAGES);
        self.transcript.drain(..overflow);
    }
}

/// Conversation state of one learner: the driver holding a context per
/// language, plus the open conversation of each of those languages.
pub struct LearnerSession {
    pub driver: ConversationDriver,
    pub conversations: HashMap<String, ActiveConversation>,
}

impl LearnerSession {
    pub fn new(phrasebooks: Arc<Phrasebooks>) -> Self {
        Self {
            driver: ConversationDriver::new(phrasebooks),
            conversations: HashMap::new(),
        }
    }

    /// Closes the language's conversation, dropping its transcript and
    /// dialogue context.
    pub fn close(&mut self, language: &str) -> Option<ActiveConversation> {
        self.driver.forget(language);
        self.conversations.remove(language)
    }

    /// True once every conversation has been closed.
    pub fn is_idle(&self) -> bool {
        self.conversations.is_empty() && self.driver.is_idle()
    }
}

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ContentCatalog>,
    pub phrasebooks: Arc<Phrasebooks>,
    pub progress_store: Arc<dyn ProgressStore>,
    pub conversation_store: Arc<dyn ConversationStore>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub translator: Arc<dyn Translator>,
    pub feedback: Arc<dyn FeedbackService>,
    /// Learner sessions keyed by user id. A session is dropped once its last
    /// conversation ends.
    pub sessions: Arc<Mutex<HashMap<String, LearnerSession>>>,
}

impl AppState {
    pub fn new(
        catalog: Arc<ContentCatalog>,
        phrasebooks: Arc<Phrasebooks>,
        progress_store: Arc<dyn ProgressStore>,
        conversation_store: Arc<dyn ConversationStore>,
        speech: Arc<dyn SpeechSynthesizer>,
        translator: Arc<dyn Translator>,
        feedback: Arc<dyn FeedbackService>,
    ) -> Self {
        Self {
            catalog,
            phrasebooks,
            progress_store,
            conversation_store,
            speech,
            translator,
            feedback,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_keeps_the_latest_messages() {
        let restored: Vec<ChatMessage> = (0..MAX_TRANSCRIPT_MESSAGES + 3)
            .map(|n| ChatMessage::user(format!("turn {}", n)))
            .collect();
        let mut conversation = ActiveConversation::new("general".to_string(), restored);
        assert_eq!(conversation.transcript.len(), MAX_TRANSCRIPT_MESSAGES);
        assert_eq!(conversation.transcript[0].content, "turn 3");

        conversation.push(ChatMessage::assistant("latest"));
        assert_eq!(conversation.transcript.len(), MAX_TRANSCRIPT_MESSAGES);
        assert_eq!(conversation.transcript[0].content, "turn 4");
        assert_eq!(
            conversation.transcript.last().map(|m| m.content.as_str()),
            Some("latest")
        );
    }

    #[test]
    fn test_closing_the_last_conversation_idles_the_session() {
        let mut session = LearnerSession::new(Arc::new(Phrasebooks::builtin().unwrap()));
        session.driver.start_conversation("zulu");
        session.conversations.insert(
            "zulu".to_string(),
            ActiveConversation::new("general".to_string(), Vec::new()),
        );
        session.driver.start_conversation("xhosa");
        session.conversations.insert(
            "xhosa".to_string(),
            ActiveConversation::new("basics".to_string(), Vec::new()),
        );

        assert_eq!(session.close("zulu").map(|c| c.topic), Some("general".to_string()));
        assert!(!session.is_idle());
        assert!(session.close("xhosa").is_some());
        assert!(session.is_idle());
    }
}
