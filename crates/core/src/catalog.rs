//! Game Content Catalog
//!
//! This module holds the static, multilingual game content (proverbs, quizzes,
//! story blanks, word and memory pairs, sign-language items) and answers the
//! filtered queries the games are built from. The catalog is parsed once at
//! start-up and is read-only afterwards, so it can be shared freely behind an
//! `Arc`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const BUILTIN_GAMES: &str = include_str!("../content/games.json");

/// Errors raised by catalog lookups.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A structural miss (unknown game type or language) or an empty
    /// difficulty/stage bucket. Surfaced to users as "not available".
    #[error("{0}")]
    NotFound(String),
    /// `check_answer` addressed an entry past the end of its bucket.
    #[error("entry index {index} is out of range for a bucket of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
    /// The game needs a `slot` to know which word is being answered.
    #[error("{0}")]
    MissingSlot(String),
    #[error("invalid game content: {0}")]
    Content(#[from] serde_json::Error),
    #[error("invalid game content: {0}")]
    InvalidContent(String),
}

/// The kinds of games the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    ProverbMatch,
    CulturalQuiz,
    StoryCompletion,
    WordAssociation,
    MemoryMatch,
    SignLanguagePractice,
}

impl GameType {
    /// Every game type, in menu order.
    pub const ALL: [GameType; 6] = [
        GameType::ProverbMatch,
        GameType::CulturalQuiz,
        GameType::StoryCompletion,
        GameType::WordAssociation,
        GameType::MemoryMatch,
        GameType::SignLanguagePractice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameType::ProverbMatch => "proverb_match",
            GameType::CulturalQuiz => "cultural_quiz",
            GameType::StoryCompletion => "story_completion",
            GameType::WordAssociation => "word_association",
            GameType::MemoryMatch => "memory_match",
            GameType::SignLanguagePractice => "sign_language_practice",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameType::ProverbMatch => "Match the Proverbs",
            GameType::CulturalQuiz => "Cultural Knowledge Quiz",
            GameType::StoryCompletion => "Complete the Story",
            GameType::WordAssociation => "Word Association",
            GameType::MemoryMatch => "Memory Match",
            GameType::SignLanguagePractice => "Sign Language Practice",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameType::ProverbMatch => "Learn traditional proverbs and their meanings",
            GameType::CulturalQuiz => "Test your knowledge of cultural traditions",
            GameType::StoryCompletion => "Practice language by completing traditional stories",
            GameType::WordAssociation => "Learn words by category and association",
            GameType::MemoryMatch => "Match pairs of words to improve vocabulary",
            GameType::SignLanguagePractice => {
                "Practice basic signs in South African Sign Language"
            }
        }
    }

    /// The difficulty the game menu advertises for this game.
    pub fn nominal_difficulty(&self) -> u32 {
        match self {
            GameType::CulturalQuiz | GameType::StoryCompletion => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .into_iter()
            .find(|game_type| game_type.as_str() == s)
            .ok_or_else(|| CatalogError::NotFound("game type not found".to_string()))
    }
}

// --- Payloads ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proverb {
    pub proverb: String,
    pub meaning: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options` of the right answer.
    pub correct: usize,
    #[serde(default)]
    pub explanation: String,
}

/// A single blank in a story, addressed by its slot key (e.g. `missing1`,
/// which appears in the story text as `{missing1}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorySlot {
    pub slot: String,
    pub options: Vec<String>,
    pub correct: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub content: String,
    pub missing_parts: Vec<StorySlot>,
}

/// A `(native, english)` word pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPair(pub String, pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSet {
    pub category: String,
    pub words: Vec<WordPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSet {
    pub category: String,
    pub pairs: Vec<WordPair>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sign {
    pub word: String,
    pub video_url: String,
    pub description: String,
    #[serde(default)]
    pub practice_tips: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignSet {
    pub category: String,
    pub signs: Vec<Sign>,
}

/// The game-specific part of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Proverb(Proverb),
    Quiz(QuizQuestion),
    Story(Story),
    WordAssociation(WordSet),
    MemoryMatch(PairSet),
    SignLanguage(SignSet),
}

impl Payload {
    fn parse(game_type: GameType, fields: Map<String, Value>) -> Result<Self, CatalogError> {
        let value = Value::Object(fields);
        let payload = match game_type {
            GameType::ProverbMatch => Payload::Proverb(serde_json::from_value(value)?),
            GameType::CulturalQuiz => {
                let question: QuizQuestion = serde_json::from_value(value)?;
                if question.correct >= question.options.len() {
                    return Err(CatalogError::InvalidContent(format!(
                        "quiz question '{}' marks option {} correct but has {} options",
                        question.question,
                        question.correct,
                        question.options.len()
                    )));
                }
                Payload::Quiz(question)
            }
            GameType::StoryCompletion => Payload::Story(serde_json::from_value(value)?),
            GameType::WordAssociation => Payload::WordAssociation(serde_json::from_value(value)?),
            GameType::MemoryMatch => Payload::MemoryMatch(serde_json::from_value(value)?),
            GameType::SignLanguagePractice => Payload::SignLanguage(serde_json::from_value(value)?),
        };
        Ok(payload)
    }
}

/// One learnable unit: a proverb, quiz question, story, word set or sign set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameEntry {
    pub game_type: GameType,
    pub language: String,
    pub difficulty: u32,
    pub stage: u32,
    pub payload: Payload,
}

/// A game as listed on the games menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSummary {
    pub id: GameType,
    pub title: String,
    pub description: String,
    pub difficulty: u32,
    pub languages: Vec<String>,
}

/// The outcome of checking a user's answer against an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerCheck {
    pub correct: bool,
    pub explanation: String,
    pub context: String,
}

fn default_level() -> u32 {
    1
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default = "default_level")]
    difficulty: u32,
    #[serde(default = "default_level")]
    stage: u32,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

type RawCatalog = BTreeMap<String, BTreeMap<String, Vec<RawEntry>>>;

/// Read-only store of game content, bucketed by game type and language.
#[derive(Debug, Clone)]
pub struct ContentCatalog {
    games: BTreeMap<GameType, BTreeMap<String, Vec<GameEntry>>>,
}

impl ContentCatalog {
    /// Builds the catalog from the content document compiled into the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_GAMES)
    }

    /// Builds a catalog from a JSON document of the shape
    /// `{ game_type: { language: [entry, ...] } }`.
    pub fn from_json(document: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(document)?;
        let mut games = BTreeMap::new();

        for (game_key, languages) in raw {
            let game_type = GameType::from_str(&game_key).map_err(|_| {
                CatalogError::InvalidContent(format!("unknown game type '{}'", game_key))
            })?;
            let mut buckets = BTreeMap::new();
            for (language, raw_entries) in languages {
                let entries = raw_entries
                    .into_iter()
                    .map(|raw| {
                        Ok(GameEntry {
                            game_type,
                            language: language.clone(),
                            difficulty: raw.difficulty,
                            stage: raw.stage,
                            payload: Payload::parse(game_type, raw.fields)?,
                        })
                    })
                    .collect::<Result<Vec<_>, CatalogError>>()?;
                buckets.insert(language, entries);
            }
            games.insert(game_type, buckets);
        }

        debug!(game_types = games.len(), "Content catalog loaded");
        Ok(Self { games })
    }

    /// Resolves a (game type, language) bucket, failing on structural misses.
    fn bucket(&self, game_type: &str, language: &str) -> Result<&[GameEntry], CatalogError> {
        let game_type = GameType::from_str(game_type)?;
        self.games
            .get(&game_type)
            .ok_or_else(|| CatalogError::NotFound("game type not found".to_string()))?
            .get(language)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                CatalogError::NotFound("language not supported for this game".to_string())
            })
    }

    /// Like `bucket`, but treats any miss as "no bucket" for the soft queries.
    fn bucket_or_empty(&self, game_type: &str, language: &str) -> &[GameEntry] {
        self.bucket(game_type, language).unwrap_or(&[])
    }

    /// Returns the entries of a bucket at the given difficulty and stage.
    ///
    /// Never returns an empty sequence: an empty difficulty/stage selection is
    /// reported as `NotFound` just like an unknown game type or language.
    pub fn entries(
        &self,
        game_type: &str,
        language: &str,
        difficulty: u32,
        stage: u32,
    ) -> Result<Vec<&GameEntry>, CatalogError> {
        Ok(self
            .indexed_entries(game_type, language, difficulty, stage)?
            .into_iter()
            .map(|(_, entry)| entry)
            .collect())
    }

    /// Like `entries`, paired with each entry's position in its bucket (the
    /// index `check_answer` takes).
    pub fn indexed_entries(
        &self,
        game_type: &str,
        language: &str,
        difficulty: u32,
        stage: u32,
    ) -> Result<Vec<(usize, &GameEntry)>, CatalogError> {
        let matching: Vec<(usize, &GameEntry)> = self
            .bucket(game_type, language)?
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.difficulty == difficulty && entry.stage == stage)
            .collect();

        if matching.is_empty() {
            return Err(CatalogError::NotFound(format!(
                "no content for difficulty level {}, stage {}",
                difficulty, stage
            )));
        }
        Ok(matching)
    }

    /// Stages available at a difficulty. Empty when the combination is unknown.
    pub fn stages(&self, game_type: &str, language: &str, difficulty: u32) -> BTreeSet<u32> {
        self.bucket_or_empty(game_type, language)
            .iter()
            .filter(|entry| entry.difficulty == difficulty)
            .map(|entry| entry.stage)
            .collect()
    }

    /// Highest difficulty present in a bucket, or 1 when there is none.
    pub fn max_difficulty(&self, game_type: &str, language: &str) -> u32 {
        self.bucket_or_empty(game_type, language)
            .iter()
            .map(|entry| entry.difficulty)
            .max()
            .unwrap_or(1)
    }

    /// Lists the games on offer, optionally only those supporting `language`.
    pub fn available_games(&self, language: Option<&str>) -> Vec<GameSummary> {
        GameType::ALL
            .into_iter()
            .map(|game_type| GameSummary {
                id: game_type,
                title: game_type.title().to_string(),
                description: game_type.description().to_string(),
                difficulty: game_type.nominal_difficulty(),
                languages: self
                    .games
                    .get(&game_type)
                    .map(|buckets| buckets.keys().cloned().collect())
                    .unwrap_or_default(),
            })
            .filter(|game| language.is_none_or(|lang| game.languages.iter().any(|l| l == lang)))
            .collect()
    }

    /// Checks `answer` against the entry at `entry_index` of a bucket.
    ///
    /// # Arguments
    ///
    /// * `answer` - The learner's answer. Quiz and story answers may be the
    ///   option text or its index.
    /// * `slot` - For stories, the blank being filled (defaults to the first
    ///   blank). For word association and memory match, the prompt word shown
    ///   to the learner, on either side of its pair; the answer must be that
    ///   word's partner. Ignored by the other games.
    ///
    /// # Returns
    ///
    /// The verdict with any explanation and context, `IndexOutOfRange` past
    /// the end of the bucket, `NotFound` for an unknown slot or prompt word,
    /// and `MissingSlot` when a pair game gets no prompt word.
    pub fn check_answer(
        &self,
        game_type: &str,
        language: &str,
        entry_index: usize,
        answer: &str,
        slot: Option<&str>,
    ) -> Result<AnswerCheck, CatalogError> {
        let bucket = self.bucket(game_type, language)?;
        let entry = bucket.get(entry_index).ok_or(CatalogError::IndexOutOfRange {
            index: entry_index,
            len: bucket.len(),
        })?;
        let given = normalize(answer);

        let check = match &entry.payload {
            Payload::Proverb(proverb) => AnswerCheck {
                correct: given == normalize(&proverb.meaning),
                explanation: String::new(),
                context: proverb.context.clone(),
            },
            Payload::Quiz(question) => AnswerCheck {
                correct: resolve_option(&question.options, &given) == Some(question.correct),
                explanation: question.explanation.clone(),
                context: String::new(),
            },
            Payload::Story(story) => {
                let part = match slot {
                    Some(key) => story.missing_parts.iter().find(|part| part.slot == key),
                    None => story.missing_parts.first(),
                }
                .ok_or_else(|| {
                    CatalogError::NotFound(format!(
                        "story slot '{}' not found",
                        slot.unwrap_or_default()
                    ))
                })?;
                let chosen = resolve_option(&part.options, &given)
                    .and_then(|index| part.options.get(index))
                    .map(|option| normalize(option));
                AnswerCheck {
                    correct: chosen == Some(normalize(&part.correct)),
                    explanation: String::new(),
                    context: part.context.clone(),
                }
            }
            Payload::WordAssociation(set) => AnswerCheck {
                correct: partner_of(&set.words, slot)? == given,
                explanation: String::new(),
                context: set.category.clone(),
            },
            Payload::MemoryMatch(set) => AnswerCheck {
                correct: partner_of(&set.pairs, slot)? == given,
                explanation: String::new(),
                context: set.category.clone(),
            },
            Payload::SignLanguage(set) => AnswerCheck {
                correct: set.signs.iter().any(|sign| normalize(&sign.word) == given),
                explanation: String::new(),
                context: set.category.clone(),
            },
        };

        debug!(%game_type, %language, entry_index, correct = check.correct, "Answer checked");
        Ok(check)
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Resolves an answer that is either the option text or an option index.
/// Text wins, so an option that reads like a number is still matchable.
fn resolve_option(options: &[String], given: &str) -> Option<usize> {
    options
        .iter()
        .position(|option| normalize(option) == given)
        .or_else(|| {
            given
                .parse::<usize>()
                .ok()
                .filter(|index| *index < options.len())
        })
}

/// The normalized partner of the prompt word, looked up on either side of
/// the pairs.
fn partner_of(pairs: &[WordPair], prompt: Option<&str>) -> Result<String, CatalogError> {
    let prompt = prompt.map(normalize).ok_or_else(|| {
        CatalogError::MissingSlot("slot must name the prompt word being matched".to_string())
    })?;
    pairs
        .iter()
        .find_map(|WordPair(native, english)| {
            if normalize(native) == prompt {
                Some(normalize(english))
            } else if normalize(english) == prompt {
                Some(normalize(native))
            } else {
                None
            }
        })
        .ok_or_else(|| CatalogError::NotFound(format!("prompt word '{}' not found", prompt)))
}
