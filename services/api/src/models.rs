//! API Models
//!
//! Request and response bodies of the REST API. Core types that appear in
//! responses are mirrored here so `utoipa` can document them.

use chrono::{DateTime, Utc};
use lingo_core::{
    catalog::{AnswerCheck, GameSummary},
    conversation::{ConversationContext, ConversationState},
    language::LanguageProfile,
    scoring::{Achievement, GameRound},
    store::{ChatMessage, ChatRole, ProgressRecord},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct Language {
    #[schema(example = "zulu")]
    pub key: String,
    pub name: String,
    #[schema(example = "zu-ZA")]
    pub code: String,
    pub native_name: String,
    pub hello: String,
    pub thank_you: String,
    pub how_are_you: String,
    pub sign_language: bool,
}

impl From<&LanguageProfile> for Language {
    fn from(profile: &LanguageProfile) -> Self {
        Self {
            key: profile.key.to_string(),
            name: profile.name.to_string(),
            code: profile.code.to_string(),
            native_name: profile.native_name.to_string(),
            hello: profile.hello.to_string(),
            thank_you: profile.thank_you.to_string(),
            how_are_you: profile.how_are_you.to_string(),
            sign_language: lingo_core::language::is_sign_language(profile.key),
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Game {
    #[schema(example = "proverb_match")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: u32,
    pub languages: Vec<String>,
}

impl From<GameSummary> for Game {
    fn from(summary: GameSummary) -> Self {
        Self {
            id: summary.id.as_str().to_string(),
            title: summary.title,
            description: summary.description,
            difficulty: summary.difficulty,
            languages: summary.languages,
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct GamesQuery {
    /// Only list games that have content in this language.
    pub language: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct EntriesQuery {
    #[param(default = 1, minimum = 1)]
    pub difficulty: Option<u32>,
    #[param(default = 1, minimum = 1)]
    pub stage: Option<u32>,
}

#[derive(Deserialize, IntoParams)]
pub struct StagesQuery {
    #[param(default = 1, minimum = 1)]
    pub difficulty: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct Entry {
    /// Position of the entry in its game/language bucket; the id to answer with.
    pub index: usize,
    pub difficulty: u32,
    pub stage: u32,
    /// Game-specific content (proverb, question, story, word set, ...).
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

#[derive(Serialize, ToSchema)]
pub struct StagesResponse {
    pub stages: Vec<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct MaxDifficultyResponse {
    pub max_difficulty: u32,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq)]
pub struct Round {
    pub total: usize,
    pub answered: usize,
    pub score: usize,
}

impl From<Round> for GameRound {
    fn from(round: Round) -> Self {
        GameRound {
            total: round.total,
            answered: round.answered,
            score: round.score,
        }
    }
}

impl From<GameRound> for Round {
    fn from(round: GameRound) -> Self {
        Self {
            total: round.total,
            answered: round.answered,
            score: round.score,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AnswerPayload {
    pub entry_index: usize,
    #[schema(example = "A person is a person through other people")]
    pub answer: String,
    /// Story slot to answer (defaults to the first slot), or the prompt word
    /// of a word association or memory match pair.
    #[schema(example = "missing1")]
    pub slot: Option<String>,
    /// Round to score this answer against.
    pub round: Option<Round>,
}

#[derive(Serialize, ToSchema)]
pub struct AnswerResponse {
    pub correct: bool,
    pub explanation: String,
    pub context: String,
    pub round: Option<Round>,
    pub round_finished: Option<bool>,
}

impl AnswerResponse {
    pub fn new(check: AnswerCheck, round: Option<GameRound>) -> Self {
        Self {
            correct: check.correct,
            explanation: check.explanation,
            context: check.context,
            round_finished: round.map(|r| r.is_finished()),
            round: round.map(Round::from),
        }
    }
}

#[derive(Deserialize, ToSchema, Default)]
pub struct TopicPayload {
    #[schema(example = "basics")]
    pub topic: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ConversationMessagePayload {
    #[schema(example = "Sawubona")]
    pub message: String,
    #[schema(example = "basics")]
    pub topic: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct ConversationQuery {
    pub topic: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    Greeting,
    Conversation,
    TopicSelection,
    Practice,
}

impl From<ConversationState> for DialogueState {
    fn from(state: ConversationState) -> Self {
        match state {
            ConversationState::Greeting => DialogueState::Greeting,
            ConversationState::Conversation => DialogueState::Conversation,
            ConversationState::TopicSelection => DialogueState::TopicSelection,
            ConversationState::Practice => DialogueState::Practice,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct DialogueContext {
    pub state: DialogueState,
    pub practice_mode_enabled: bool,
    pub current_topic: Option<String>,
    pub previous_responses: Vec<String>,
}

impl From<&ConversationContext> for DialogueContext {
    fn from(context: &ConversationContext) -> Self {
        Self {
            state: context.state.into(),
            practice_mode_enabled: context.practice_mode_enabled,
            current_topic: context.current_topic.clone(),
            previous_responses: context.previous_responses.clone(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ConversationReply {
    pub text: String,
    /// Base64-encoded MP3 of the spoken part, when speech is available.
    pub audio: Option<String>,
    pub context: DialogueContext,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl From<ChatRole> for MessageRole {
    fn from(role: ChatRole) -> Self {
        match role {
            ChatRole::User => MessageRole::User,
            ChatRole::Assistant => MessageRole::Assistant,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub audio_ref: Option<String>,
}

impl From<ChatMessage> for Message {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role.into(),
            content: message.content,
            audio_ref: message.audio_ref,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ConversationHistory {
    pub language: String,
    pub topic: String,
    pub context: DialogueContext,
    pub messages: Vec<Message>,
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct Progress {
    pub resource_type: String,
    pub resource_id: String,
    pub progress: f64,
    pub completed: bool,
    pub last_accessed: DateTime<Utc>,
}

impl From<ProgressRecord> for Progress {
    fn from(record: ProgressRecord) -> Self {
        Self {
            resource_type: record.resource_type,
            resource_id: record.resource_id,
            progress: record.progress,
            completed: record.completed,
            last_accessed: record.last_accessed,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone)]
pub struct AchievementBadge {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl From<Achievement> for AchievementBadge {
    fn from(achievement: Achievement) -> Self {
        Self {
            id: achievement.id.to_string(),
            title: achievement.title.to_string(),
            description: achievement.description.to_string(),
            icon: achievement.icon.to_string(),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ProgressSummary {
    pub games_played: usize,
    pub proverbs_learned: usize,
    pub records: Vec<Progress>,
    pub achievements: Vec<AchievementBadge>,
}

/// Source and target are locale codes (`zu-ZA`), ISO codes (`zu`) or
/// language names (`Zulu`).
#[derive(Deserialize, ToSchema)]
pub struct TranslatePayload {
    #[schema(example = "Hello")]
    pub text: String,
    #[schema(example = "en-ZA")]
    pub source: String,
    #[schema(example = "Zulu")]
    pub target: String,
}

#[derive(Serialize, ToSchema)]
pub struct TranslateResponse {
    pub translation: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TranslationReviewPayload {
    /// The English phrase.
    #[schema(example = "Good morning")]
    pub phrase: String,
    /// The learner's translation of it.
    #[schema(example = "Sawubona")]
    pub translation: String,
    #[schema(example = "zulu")]
    pub language: String,
    /// Usage notes or cultural context.
    #[serde(default)]
    pub context: String,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CulturalQuestionPayload {
    #[schema(example = "xhosa")]
    pub language: String,
    #[schema(example = "Traditions")]
    pub topic: String,
    #[schema(example = "Initiation")]
    #[serde(default)]
    pub subtopic: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CulturalExplanation {
    pub explanation: String,
    /// False when the model was unavailable and a stock explanation was used.
    pub generated: bool,
}
