//! Game rounds and achievements.

use crate::catalog::GameType;
use crate::conversation::ConversationState;
use crate::store::ProgressRecord;
use serde::{Deserialize, Serialize};

/// Resource type under which answered game entries are recorded.
pub const GAME_RESOURCE: &str = "game";
/// Resource type under which conversation practice is recorded.
pub const CONVERSATION_RESOURCE: &str = "conversation";

/// Score counter for one pass over a slice of game entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRound {
    pub total: usize,
    pub answered: usize,
    pub score: usize,
}

impl GameRound {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            answered: 0,
            score: 0,
        }
    }

    /// Counts one answer. Answers after the round is finished are ignored.
    pub fn record(&mut self, correct: bool) {
        if self.is_finished() {
            return;
        }
        self.answered += 1;
        if correct {
            self.score += 1;
        }
    }

    /// Fraction of the round answered, 0.0–1.0. An empty round is complete.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.answered.min(self.total) as f64 / self.total as f64
    }

    pub fn is_finished(&self) -> bool {
        self.answered >= self.total
    }

    pub fn score(&self) -> usize {
        self.score
    }
}

/// Resource id of an answered entry: `<game_type>/<language>/<index>`.
pub fn game_resource_id(game_type: GameType, language: &str, entry_index: usize) -> String {
    format!("{}/{}/{}", game_type.as_str(), language, entry_index)
}

/// How far through the practice script a conversation has come.
pub fn conversation_progress(state: ConversationState) -> f64 {
    match state {
        ConversationState::Greeting => 0.0,
        ConversationState::Conversation => 1.0 / 3.0,
        ConversationState::TopicSelection => 2.0 / 3.0,
        ConversationState::Practice => 1.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserProgress {
    pub games_played: usize,
    pub proverbs_learned: usize,
}

impl UserProgress {
    /// Summarises stored progress: every game row counts as a game played,
    /// completed proverb rows count as proverbs learned.
    pub fn from_records(records: &[ProgressRecord]) -> Self {
        let proverb_prefix = format!("{}/", GameType::ProverbMatch.as_str());
        records
            .iter()
            .filter(|record| record.resource_type == GAME_RESOURCE)
            .fold(Self::default(), |mut summary, record| {
                summary.games_played += 1;
                if record.completed && record.resource_id.starts_with(&proverb_prefix) {
                    summary.proverbs_learned += 1;
                }
                summary
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

const GAME_EXPLORER_THRESHOLD: usize = 10;
const WISDOM_SEEKER_THRESHOLD: usize = 5;

pub fn achievements(progress: &UserProgress) -> Vec<Achievement> {
    let mut earned = Vec::new();
    if progress.games_played >= GAME_EXPLORER_THRESHOLD {
        earned.push(Achievement {
            id: "games_10",
            title: "Game Explorer",
            description: "Played 10 different games",
            icon: "🎮",
        });
    }
    if progress.proverbs_learned >= WISDOM_SEEKER_THRESHOLD {
        earned.push(Achievement {
            id: "proverbs_5",
            title: "Wisdom Seeker",
            description: "Learned 5 traditional proverbs",
            icon: "📚",
        });
    }
    earned
}
