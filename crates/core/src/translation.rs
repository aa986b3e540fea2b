//! Translation Capability
//!
//! Translators are tried in order of preference: the Google Translate REST API
//! first, then an LLM through an OpenAI-compatible chat endpoint (which also
//! covers Gemini's compatibility endpoint). A translator that cannot serve a
//! request returns `TranslationOutcome::Unavailable` instead of an error.

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
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const GOOGLE_TRANSLATE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    Translated(String),
    Unavailable(String),
}

impl TranslationOutcome {
    fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => TranslationOutcome::Translated(text),
            Err(e) => TranslationOutcome::Unavailable(format!("{:#}", e)),
        }
    }
}

/// Defines the contract for any service that can translate text between
/// languages given as locale codes (`zu-ZA`) or bare ISO codes (`zu`).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome;
}

/// `zu-ZA` → `zu`, `nso-ZA` → `nso`.
fn iso_code(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

// --- Google Translate ---

#[derive(Serialize)]
struct GoogleRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

/// A `Translator` backed by the Google Translate v2 REST API.
pub struct GoogleTranslator {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, GOOGLE_TRANSLATE_URL.to_string())
    }

    fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint,
        }
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let body = GoogleRequest {
            q: text,
            source: iso_code(source),
            target: iso_code(target),
            format: "text",
        };
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .context("Google Translate request failed")?
            .error_for_status()
            .context("Google Translate rejected the request")?;

        let parsed: GoogleResponse = response
            .json()
            .await
            .context("Unexpected Google Translate response")?;
        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| anyhow!("Google Translate returned no translations"))
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        TranslationOutcome::from_result(self.request(text, source, target).await)
    }
}

// --- LLM ---

/// A `Translator` that prompts a chat model on any OpenAI-compatible API.
pub struct LlmTranslator {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmTranslator {
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

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let source_name = crate::language::name_for_code(source).unwrap_or(source);
        let target_name = crate::language::name_for_code(target).unwrap_or(target);
        let prompt = format!(
            "Translate the following text from {} to {}. Reply with the translation only.\n\n{}",
            source_name, target_name, text
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content("You are a translator specialising in South African languages.")
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
            .context("No content in LLM response")?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(anyhow!("LLM returned an empty translation"));
        }
        Ok(answer.to_string())
    }
}

#[async_trait]
impl Translator for LlmTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        TranslationOutcome::from_result(self.request(text, source, target).await)
    }
}

// --- Fallback chain ---

/// Tries each translator in order; the first `Translated` outcome wins.
#[derive(Default)]
pub struct ChainTranslator {
    translators: Vec<Arc<dyn Translator>>,
}

impl ChainTranslator {
    pub fn new(translators: Vec<Arc<dyn Translator>>) -> Self {
        Self { translators }
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

#[async_trait]
impl Translator for ChainTranslator {
    async fn translate(&self, text: &str, source: &str, target: &str) -> TranslationOutcome {
        let mut reasons = Vec::new();
        for (position, translator) in self.translators.iter().enumerate() {
            match translator.translate(text, source, target).await {
                TranslationOutcome::Translated(translated) => {
                    debug!(position, %source, %target, "Translation succeeded");
                    return TranslationOutcome::Translated(translated);
                }
                TranslationOutcome::Unavailable(reason) => {
                    warn!(position, %reason, "Translator unavailable; trying next");
                    reasons.push(reason);
                }
            }
        }
        if reasons.is_empty() {
            TranslationOutcome::Unavailable("no translator is configured".to_string())
        } else {
            TranslationOutcome::Unavailable(reasons.join("; "))
        }
    }
}
