//! Conversation Practice Driver
//!
//! This module implements the scripted practice dialogue. Each language a
//! session practises has its own `ConversationContext`, which walks a fixed
//! script:
//!
//! `greeting` → `conversation` → `topic_selection` → `practice`
//!
//! Free-text input is classified by case-insensitive substring matches against
//! the language's phrasebook. Dispatch is an explicit, ordered rule table per
//! state; the first rule whose predicate holds decides both the transition and
//! the scripted reply. The driver never fails: input it cannot classify, and
//! languages it has no phrasebook for, get re-prompt text instead.

use crate::phrasebook::{Phrasebook, Phrasebooks, PracticeItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Sentinel message that (re)starts a conversation through `respond`.
pub const START_MESSAGE: &str = "start_conversation";

const TOPIC_MENU: &str = "Would you like to practice greetings, numbers, or family words?";
const TOPIC_RETRY: &str =
    "You can practice greetings, numbers, or family words. Which would you like to try?";
const OFFER_TOPICS: &str = "Would you like to practice something specific?";

/// How many learner messages a context keeps in `previous_responses`.
pub const MAX_PREVIOUS_RESPONSES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Greeting,
    Conversation,
    TopicSelection,
    Practice,
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversationState::Greeting => "greeting",
            ConversationState::Conversation => "conversation",
            ConversationState::TopicSelection => "topic_selection",
            ConversationState::Practice => "practice",
        };
        f.write_str(name)
    }
}

/// Per-language dialogue state owned by a single session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationContext {
    pub state: ConversationState,
    pub practice_mode_enabled: bool,
    pub current_topic: Option<String>,
    /// The learner's most recent messages, oldest first, capped at
    /// `MAX_PREVIOUS_RESPONSES`. Kept for display only.
    #[serde(default)]
    pub previous_responses: Vec<String>,
    /// Position of the repetition drill within `current_topic`.
    #[serde(default)]
    pub drill_index: usize,
}

impl ConversationContext {
    fn remember(&mut self, message: &str) {
        self.previous_responses.push(message.to_string());
        let overflow = self
            .previous_responses
            .len()
            .saturating_sub(MAX_PREVIOUS_RESPONSES);
        self.previous_responses.drain(..overflow);
    }
}

/// A pre-authored reply plus the text to voice, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedLine {
    pub text: String,
    pub audio_text: Option<String>,
}

impl ScriptedLine {
    fn spoken(text: String, audio: impl Into<String>) -> Self {
        Self {
            text,
            audio_text: Some(audio.into()),
        }
    }

    fn silent(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio_text: None,
        }
    }

    fn practice(intro: &str, item: &PracticeItem) -> Self {
        Self::spoken(format!("{}{}", intro, item.render()), item.native.clone())
    }
}

// --- Rule table ---

/// Everything a rule may look at for one turn.
struct Turn<'a> {
    book: &'a Phrasebook,
    message: String,
    topic: Option<&'a str>,
    context: &'a ConversationContext,
}

impl Turn<'_> {
    fn mentions(&self, phrase: &str) -> bool {
        let phrase = trim_phrase(phrase);
        !phrase.is_empty() && self.message.contains(&phrase)
    }

    /// First practice topic named in the message, in phrasebook priority order.
    fn selected_topic(&self) -> Option<String> {
        self.book
            .practice_topics()
            .into_iter()
            .find(|topic| self.message.contains(*topic))
            .map(str::to_string)
    }
}

#[derive(Clone, Copy)]
enum Transition {
    Stay,
    MoveTo(ConversationState),
    /// Enter `practice` on the topic named in the message.
    SelectTopic,
    /// Advance the repetition drill by one item.
    Drill,
}

struct Rule {
    name: &'static str,
    applies: fn(&Turn<'_>) -> bool,
    transition: Transition,
    reply: fn(&Turn<'_>) -> ScriptedLine,
}

const GREETING_RULES: &[Rule] = &[
    Rule {
        name: "greeted",
        applies: is_greeting,
        transition: Transition::MoveTo(ConversationState::Conversation),
        reply: ask_how_are_you,
    },
    Rule {
        name: "prompt_greeting",
        applies: always,
        transition: Transition::Stay,
        reply: prompt_greeting,
    },
];

const CONVERSATION_RULES: &[Rule] = &[
    Rule {
        name: "asked_how_are_you",
        applies: asks_how_are_you,
        transition: Transition::Stay,
        reply: answer_fine,
    },
    Rule {
        name: "answered_fine",
        applies: says_fine,
        transition: Transition::MoveTo(ConversationState::TopicSelection),
        reply: offer_topics,
    },
    Rule {
        name: "topic_example",
        applies: has_topic_example,
        transition: Transition::Stay,
        reply: topic_example,
    },
    Rule {
        name: "topic_menu",
        applies: always,
        transition: Transition::Stay,
        reply: topic_menu,
    },
];

const TOPIC_SELECTION_RULES: &[Rule] = &[
    Rule {
        name: "topic_selected",
        applies: names_topic,
        transition: Transition::SelectTopic,
        reply: start_topic,
    },
    Rule {
        name: "topic_retry",
        applies: always,
        transition: Transition::Stay,
        reply: topic_retry,
    },
];

const PRACTICE_RULES: &[Rule] = &[
    Rule {
        name: "topic_reselected",
        applies: names_topic,
        transition: Transition::SelectTopic,
        reply: start_topic,
    },
    Rule {
        name: "drill",
        applies: has_current_topic,
        transition: Transition::Drill,
        reply: next_drill,
    },
    Rule {
        name: "topic_retry",
        applies: always,
        transition: Transition::Stay,
        reply: topic_retry,
    },
];

fn rules_for(state: ConversationState) -> &'static [Rule] {
    match state {
        ConversationState::Greeting => GREETING_RULES,
        ConversationState::Conversation => CONVERSATION_RULES,
        ConversationState::TopicSelection => TOPIC_SELECTION_RULES,
        ConversationState::Practice => PRACTICE_RULES,
    }
}

// Predicates

fn always(_: &Turn<'_>) -> bool {
    true
}

fn is_greeting(turn: &Turn<'_>) -> bool {
    turn.book
        .greetings
        .iter()
        .any(|pair| turn.mentions(pair.native()) || turn.mentions(pair.gloss()))
}

fn asks_how_are_you(turn: &Turn<'_>) -> bool {
    turn.book
        .greetings
        .iter()
        .filter(|pair| pair.gloss().to_lowercase().contains("how are you"))
        .any(|pair| turn.mentions(pair.gloss()))
}

fn says_fine(turn: &Turn<'_>) -> bool {
    turn.book
        .greetings
        .iter()
        .filter(|pair| pair.gloss().to_lowercase().contains("fine"))
        .any(|pair| turn.mentions(pair.native()))
}

fn has_topic_example(turn: &Turn<'_>) -> bool {
    turn.topic
        .and_then(|topic| turn.book.first_example(topic))
        .is_some()
}

fn names_topic(turn: &Turn<'_>) -> bool {
    turn.selected_topic().is_some()
}

fn has_current_topic(turn: &Turn<'_>) -> bool {
    turn.context
        .current_topic
        .as_deref()
        .and_then(|topic| turn.book.topic_items(topic))
        .is_some_and(|items| !items.is_empty())
}

// Reply builders

fn ask_how_are_you(turn: &Turn<'_>) -> ScriptedLine {
    let pair = turn.book.how_are_you();
    ScriptedLine::spoken(format!("{} ({})", pair.native(), pair.gloss()), pair.native())
}

fn prompt_greeting(turn: &Turn<'_>) -> ScriptedLine {
    let pair = turn.book.opening();
    ScriptedLine::spoken(
        format!("Try greeting me with '{}' ({})", pair.native(), pair.gloss()),
        pair.native(),
    )
}

fn answer_fine(turn: &Turn<'_>) -> ScriptedLine {
    let pair = turn.book.fine();
    ScriptedLine::spoken(format!("{} ({})", pair.native(), pair.gloss()), pair.native())
}

fn offer_topics(turn: &Turn<'_>) -> ScriptedLine {
    let ack = turn.book.acknowledgement();
    ScriptedLine::spoken(format!("{}! ({})", ack, OFFER_TOPICS), ack)
}

fn topic_example(turn: &Turn<'_>) -> ScriptedLine {
    match turn.topic.and_then(|topic| turn.book.first_example(topic)) {
        Some(item) if item.gloss.is_some() => ScriptedLine::practice("Let's practice this: ", &item),
        Some(item) => ScriptedLine::practice("Here's a word to practice: ", &item),
        None => topic_menu(turn),
    }
}

fn topic_menu(_: &Turn<'_>) -> ScriptedLine {
    ScriptedLine::silent(TOPIC_MENU)
}

fn topic_retry(_: &Turn<'_>) -> ScriptedLine {
    ScriptedLine::silent(TOPIC_RETRY)
}

fn start_topic(turn: &Turn<'_>) -> ScriptedLine {
    let first = turn.selected_topic().and_then(|topic| {
        let item = turn.book.topic_items(&topic)?.into_iter().next()?;
        Some((topic, item))
    });
    match first {
        Some((topic, item)) => {
            ScriptedLine::practice(&format!("Let's practice {}. Repeat after me: ", topic), &item)
        }
        None => topic_retry(turn),
    }
}

fn next_drill(turn: &Turn<'_>) -> ScriptedLine {
    let items = turn
        .context
        .current_topic
        .as_deref()
        .and_then(|topic| turn.book.topic_items(topic))
        .unwrap_or_default();
    if items.is_empty() {
        return topic_retry(turn);
    }
    let item = &items[(turn.context.drill_index + 1) % items.len()];
    ScriptedLine::practice("Good! Now repeat after me: ", item)
}

/// Lower-cases a phrase and strips surrounding punctuation so that "Unjani?"
/// also matches "unjani".
fn trim_phrase(phrase: &str) -> String {
    phrase
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

// --- Driver ---

/// Drives scripted practice dialogues for one session.
#[derive(Debug, Clone)]
pub struct ConversationDriver {
    phrasebooks: Arc<Phrasebooks>,
    contexts: HashMap<String, ConversationContext>,
}

impl ConversationDriver {
    pub fn new(phrasebooks: Arc<Phrasebooks>) -> Self {
        Self {
            phrasebooks,
            contexts: HashMap::new(),
        }
    }

    /// Resets the language's dialogue to `greeting` with practice mode on and
    /// returns the opening greeting.
    pub fn start_conversation(&mut self, language: &str) -> ScriptedLine {
        self.contexts.insert(
            language.to_string(),
            ConversationContext {
                practice_mode_enabled: true,
                ..ConversationContext::default()
            },
        );
        debug!(%language, "Conversation started");

        match self.phrasebooks.get(language) {
            Some(book) => {
                let pair = book.opening();
                ScriptedLine::spoken(format!("{}! ({})", pair.native(), pair.gloss()), pair.native())
            }
            None => unsupported_language(language),
        }
    }

    /// Applies the transition rules to one learner message.
    ///
    /// Creates the context on first use. `topic` is the topic the caller is
    /// browsing, which steers the example offered mid-conversation.
    pub fn respond(&mut self, language: &str, message: &str, topic: Option<&str>) -> ScriptedLine {
        if message.trim().eq_ignore_ascii_case(START_MESSAGE) {
            return self.start_conversation(language);
        }

        let context = self.contexts.entry(language.to_string()).or_default();
        context.remember(message);

        let Some(book) = self.phrasebooks.get(language) else {
            return unsupported_language(language);
        };

        let turn = Turn {
            book,
            message: message.to_lowercase(),
            topic,
            context,
        };
        let Some(rule) = rules_for(context.state)
            .iter()
            .find(|rule| (rule.applies)(&turn))
        else {
            return ScriptedLine::silent(TOPIC_MENU);
        };
        let line = (rule.reply)(&turn);
        let selected = match rule.transition {
            Transition::SelectTopic => turn.selected_topic(),
            _ => None,
        };

        let from = context.state;
        match rule.transition {
            Transition::Stay => {}
            Transition::MoveTo(state) => context.state = state,
            Transition::SelectTopic => {
                context.state = ConversationState::Practice;
                context.current_topic = selected;
                context.drill_index = 0;
            }
            Transition::Drill => context.drill_index += 1,
        }
        debug!(%language, rule = rule.name, %from, to = %context.state, "Conversation turn");
        line
    }

    /// Leaves practice mode and resets the dialogue. Calling it again is a no-op.
    pub fn end_practice(&mut self, language: &str) {
        self.contexts
            .insert(language.to_string(), ConversationContext::default());
        debug!(%language, "Practice ended");
    }

    pub fn context(&self, language: &str) -> Option<&ConversationContext> {
        self.contexts.get(language)
    }

    /// Replaces the language's context, e.g. with one loaded from storage.
    pub fn restore(&mut self, language: &str, context: ConversationContext) {
        self.contexts.insert(language.to_string(), context);
    }

    /// Drops the language's context; the next turn starts from a fresh one.
    pub fn forget(&mut self, language: &str) -> Option<ConversationContext> {
        self.contexts.remove(language)
    }

    /// True when no language has a context.
    pub fn is_idle(&self) -> bool {
        self.contexts.is_empty()
    }
}

fn unsupported_language(language: &str) -> ScriptedLine {
    ScriptedLine::silent(format!(
        "Conversation practice isn't available for '{}' yet. Try zulu, xhosa or tswana.",
        language
    ))
}
