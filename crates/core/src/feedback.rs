//! Generative Feedback Capability
//!
//! A chat model reviews translations contributed by learners and explains
//! cultural topics. Like the other capabilities, a service that cannot answer
//! returns `FeedbackOutcome::Unavailable`; callers decide how to degrade.
//! `fallback_explanation` provides the stock text used in that case.

use anyhow::{Context, Result, anyhow};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use tracing::debug;

use crate::language;

#[derive(Debug, Clone, PartialEq)]
pub enum FeedbackOutcome {
    Feedback(String),
    Unavailable(String),
}

impl FeedbackOutcome {
    fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => FeedbackOutcome::Feedback(text),
            Err(e) => FeedbackOutcome::Unavailable(format!("{:#}", e)),
        }
    }
}

/// Defines the contract for a service that gives learners written feedback.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedbackService: Send + Sync {
    /// Judges whether `translation` renders the English `phrase` accurately.
    ///
    /// # Arguments
    ///
    /// * `phrase` - The English original.
    /// * `translation` - The learner's rendering of it.
    /// * `language` - Language key (`zulu`) or locale code (`zu-ZA`).
    /// * `context` - Optional usage notes supplied with the translation.
    async fn review_translation(
        &self,
        phrase: &str,
        translation: &str,
        language: &str,
        context: &str,
    ) -> FeedbackOutcome;

    /// Explains a cultural topic, answering `question` unless it is empty.
    async fn explain_culture(
        &self,
        language: &str,
        topic: &str,
        subtopic: &str,
        question: &str,
    ) -> FeedbackOutcome;
}

/// `Zulu (isiZulu)` for a registry key or locale code; unknown input is
/// returned unchanged.
fn describe(language: &str) -> String {
    let names = match language::profile(language) {
        Some(profile) => Some((profile.name, profile.native_name)),
        None => language::name_for_code(language).zip(language::native_name_for_code(language)),
    };
    match names {
        Some((name, native)) if name != native => format!("{} ({})", name, native),
        Some((name, _)) => name.to_string(),
        None => language.to_string(),
    }
}

/// Stock explanation for when no model can answer.
pub fn fallback_explanation(topic: &str, subtopic: &str) -> String {
    // Stable per topic so repeated requests read the same.
    let pick = topic
        .bytes()
        .chain(subtopic.bytes())
        .fold(0usize, |acc, b| acc.wrapping_add(b as usize));
    match pick % 4 {
        0 => format!("Learn about the rich traditions of {} - {}.", topic, subtopic),
        1 => format!("Discover the cultural significance of {} in {}.", topic, subtopic),
        2 => format!("Explore the historical importance of {} through {}.", topic, subtopic),
        _ => format!(
            "Understanding {} helps us appreciate our cultural heritage in {}.",
            topic, subtopic
        ),
    }
}

/// A `FeedbackService` that prompts a chat model on any OpenAI-compatible API.
pub struct LlmFeedback {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmFeedback {
    /// # Arguments
    ///
    /// * `config` - API key and base URL of the OpenAI-compatible service.
    /// * `model` - Chat model identifier (e.g., "gpt-4o-mini").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    async fn ask(&self, system: &str, prompt: String) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?
            .trim();
        if answer.is_empty() {
            return Err(anyhow!("LLM returned empty feedback"));
        }
        debug!(model = %self.model, chars = answer.len(), "Feedback generated");
        Ok(answer.to_string())
    }
}

#[async_trait]
impl FeedbackService for LlmFeedback {
    async fn review_translation(
        &self,
        phrase: &str,
        translation: &str,
        language: &str,
        context: &str,
    ) -> FeedbackOutcome {
        let prompt = format!(
            "Please validate this translation:\nEnglish: {}\n{}: {}\nContext: {}\n\n\
             Is this translation accurate? Please explain your reasoning.",
            phrase,
            describe(language),
            translation,
            context
        );
        FeedbackOutcome::from_result(
            self.ask(
                "You review translations into South African languages for learners.",
                prompt,
            )
            .await,
        )
    }

    async fn explain_culture(
        &self,
        language: &str,
        topic: &str,
        subtopic: &str,
        question: &str,
    ) -> FeedbackOutcome {
        let mut prompt = format!(
            "As a cultural expert in {}, provide detailed information about {} - {}.\n",
            describe(language),
            topic,
            subtopic
        );
        if !question.trim().is_empty() {
            prompt.push_str(&format!("\nQuestion: {}\n", question));
        }
        prompt.push_str(
            "\nPlease provide a clear explanation, its cultural significance, its modern \
             relevance, and examples or stories if applicable. Keep it suitable for learners.",
        );
        FeedbackOutcome::from_result(
            self.ask("You are a guide to South African cultures.", prompt)
                .await,
        )
    }
}

/// Used when no chat model is configured.
pub struct OfflineFeedback;

#[async_trait]
impl FeedbackService for OfflineFeedback {
    async fn review_translation(&self, _: &str, _: &str, _: &str, _: &str) -> FeedbackOutcome {
        FeedbackOutcome::Unavailable("no feedback model is configured".to_string())
    }

    async fn explain_culture(&self, _: &str, _: &str, _: &str, _: &str) -> FeedbackOutcome {
        FeedbackOutcome::Unavailable("no feedback model is configured".to_string())
    }
}
