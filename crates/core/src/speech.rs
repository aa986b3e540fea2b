//! Speech Synthesis Capability
//!
//! Scripted replies may carry an `audio_text`; a `SpeechSynthesizer` turns that
//! text into audio bytes. Synthesis is strictly optional: a synthesizer that
//! cannot produce audio reports `SpeechOutcome::Unavailable` and the reply is
//! delivered as text only.

use crate::conversation::ScriptedLine;
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice},
};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutcome {
    Audio(Vec<u8>),
    Unavailable(String),
}

/// Defines the contract for any service that can voice a line of text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes `text` spoken in the locale `language_code` (e.g. `zu-ZA`).
    async fn synthesize(&self, text: &str, language_code: &str) -> SpeechOutcome;
}

/// A `SpeechSynthesizer` backed by an OpenAI-compatible `/audio/speech` endpoint.
pub struct OpenAiSpeech {
    client: Client<OpenAIConfig>,
    model: String,
    voice: Voice,
}

impl OpenAiSpeech {
    /// Creates a synthesizer for `model` (e.g. "tts-1") speaking with `voice`.
    /// Unknown voice names fall back to "alloy".
    pub fn new(config: OpenAIConfig, model: String, voice: &str) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            voice: parse_voice(voice),
        }
    }
}

fn parse_voice(name: &str) -> Voice {
    match name.to_ascii_lowercase().as_str() {
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "shimmer" => Voice::Shimmer,
        _ => Voice::Alloy,
    }
}

fn parse_model(name: &str) -> SpeechModel {
    match name {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str, language_code: &str) -> SpeechOutcome {
        let request = match CreateSpeechRequestArgs::default()
            .input(text)
            .model(parse_model(&self.model))
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Mp3)
            .build()
        {
            Ok(request) => request,
            Err(e) => return SpeechOutcome::Unavailable(e.to_string()),
        };

        match self.client.audio().speech(request).await {
            Ok(response) => {
                debug!(%language_code, bytes = response.bytes.len(), "Synthesized speech");
                SpeechOutcome::Audio(response.bytes.to_vec())
            }
            Err(e) => SpeechOutcome::Unavailable(format!("speech request failed: {}", e)),
        }
    }
}

/// A synthesizer that never produces audio. Used when no speech backend is
/// configured.
pub struct SilentSpeech;

#[async_trait]
impl SpeechSynthesizer for SilentSpeech {
    async fn synthesize(&self, _text: &str, _language_code: &str) -> SpeechOutcome {
        SpeechOutcome::Unavailable("speech synthesis is not configured".to_string())
    }
}

/// A deterministic synthesizer for development: the "audio" is the UTF-8
/// text prefixed with the language code.
pub struct MockSpeech;

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str, language_code: &str) -> SpeechOutcome {
        SpeechOutcome::Audio(format!("{}:{}", language_code, text).into_bytes())
    }
}

/// A scripted line with its synthesized audio, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarratedLine {
    pub text: String,
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
}

/// Voices a line's `audio_text`. Lines without one, and failed syntheses,
/// come back with the text only.
pub async fn narrate(
    line: ScriptedLine,
    synthesizer: &dyn SpeechSynthesizer,
    language_code: &str,
) -> NarratedLine {
    let audio = match line.audio_text.as_deref() {
        Some(audio_text) => match synthesizer.synthesize(audio_text, language_code).await {
            SpeechOutcome::Audio(bytes) => Some(bytes),
            SpeechOutcome::Unavailable(reason) => {
                warn!(%language_code, %reason, "Speech unavailable; sending text only");
                None
            }
        },
        None => None,
    };
    NarratedLine {
        text: line.text,
        audio,
    }
}
