//! Scripted phrase tables for conversation practice.
//!
//! Each phrasebook lists a language's greetings as `(native, english)` pairs,
//! a handful of stock responses, and named vocabulary and grammar categories.
//! Position matters in `greetings` and `responses`; see the accessors below.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const BUILTIN_PHRASEBOOKS: &str = include_str!("../content/phrasebooks.json");

const MIN_GREETINGS: usize = 3;
const MIN_RESPONSES: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum PhrasebookError {
    #[error("invalid phrasebook content: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("phrasebook '{language}' is incomplete: {reason}")]
    Incomplete { language: String, reason: String },
}

/// A native phrase with its English gloss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhrasePair(pub String, pub String);

impl PhrasePair {
    pub fn native(&self) -> &str {
        &self.0
    }

    pub fn gloss(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseCategory {
    pub name: String,
    pub items: Vec<String>,
}

/// Something a learner is asked to repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct PracticeItem {
    pub native: String,
    pub gloss: Option<String>,
}

impl PracticeItem {
    /// `native (gloss)` for pairs, the bare word otherwise.
    pub fn render(&self) -> String {
        match &self.gloss {
            Some(gloss) => format!("{} ({})", self.native, gloss),
            None => self.native.clone(),
        }
    }
}

impl From<&PhrasePair> for PracticeItem {
    fn from(pair: &PhrasePair) -> Self {
        Self {
            native: pair.native().to_string(),
            gloss: Some(pair.gloss().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrasebook {
    pub greetings: Vec<PhrasePair>,
    pub responses: Vec<String>,
    #[serde(default)]
    pub vocabulary: Vec<PhraseCategory>,
    #[serde(default)]
    pub grammar: Vec<PhraseCategory>,
}

impl Phrasebook {
    /// The opening greeting ("Hello").
    pub fn opening(&self) -> &PhrasePair {
        &self.greetings[0]
    }

    /// The canonical "how are you" question.
    pub fn how_are_you(&self) -> &PhrasePair {
        &self.greetings[1]
    }

    /// The canonical "I am fine" reply.
    pub fn fine(&self) -> &PhrasePair {
        &self.greetings[2]
    }

    /// The stock acknowledgement ("alright") used before offering topics.
    pub fn acknowledgement(&self) -> &str {
        &self.responses[3]
    }

    fn category(&self, name: &str) -> Option<&PhraseCategory> {
        self.vocabulary
            .iter()
            .chain(self.grammar.iter())
            .find(|category| category.name == name)
    }

    /// Items for a practice topic: `greetings` or any category name.
    pub fn topic_items(&self, topic: &str) -> Option<Vec<PracticeItem>> {
        if topic == "greetings" {
            return Some(self.greetings.iter().map(PracticeItem::from).collect());
        }
        self.category(topic).map(|category| {
            category
                .items
                .iter()
                .map(|word| PracticeItem {
                    native: word.clone(),
                    gloss: None,
                })
                .collect()
        })
    }

    /// First example of a content group (`basics`, `vocabulary`, `grammar`)
    /// or of a single topic.
    pub fn first_example(&self, topic: &str) -> Option<PracticeItem> {
        let group_topic = match topic {
            "basics" => Some("greetings"),
            "vocabulary" => self.vocabulary.first().map(|c| c.name.as_str()),
            "grammar" => self.grammar.first().map(|c| c.name.as_str()),
            other => Some(other),
        }?;
        self.topic_items(group_topic)?.into_iter().next()
    }

    /// Topic names a learner can pick, in matching priority order.
    pub fn practice_topics(&self) -> Vec<&str> {
        let mut topics = vec!["greetings"];
        for preferred in ["numbers", "family"] {
            if self.category(preferred).is_some() {
                topics.push(preferred);
            }
        }
        for category in &self.vocabulary {
            if !topics.contains(&category.name.as_str()) {
                topics.push(&category.name);
            }
        }
        topics
    }

    fn validate(&self, language: &str) -> Result<(), PhrasebookError> {
        let incomplete = |reason: String| PhrasebookError::Incomplete {
            language: language.to_string(),
            reason,
        };
        if self.greetings.len() < MIN_GREETINGS {
            return Err(incomplete(format!(
                "needs at least {} greetings, found {}",
                MIN_GREETINGS,
                self.greetings.len()
            )));
        }
        if self.responses.len() < MIN_RESPONSES {
            return Err(incomplete(format!(
                "needs at least {} responses, found {}",
                MIN_RESPONSES,
                self.responses.len()
            )));
        }
        if let Some(empty) = self
            .vocabulary
            .iter()
            .chain(self.grammar.iter())
            .find(|category| category.items.is_empty())
        {
            return Err(incomplete(format!("category '{}' is empty", empty.name)));
        }
        Ok(())
    }
}

/// Phrasebooks for every language with scripted conversation practice.
#[derive(Debug, Clone, Default)]
pub struct Phrasebooks {
    books: BTreeMap<String, Phrasebook>,
}

impl Phrasebooks {
    pub fn builtin() -> Result<Self, PhrasebookError> {
        Self::from_json(BUILTIN_PHRASEBOOKS)
    }

    pub fn from_json(document: &str) -> Result<Self, PhrasebookError> {
        let books: BTreeMap<String, Phrasebook> = serde_json::from_str(document)?;
        for (language, book) in &books {
            book.validate(language)?;
        }
        Ok(Self { books })
    }

    pub fn get(&self, language: &str) -> Option<&Phrasebook> {
        self.books.get(language)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.books.keys().map(String::as_str)
    }
}
