use std::collections::BTreeSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::HintError;
use crate::services::engine::GameEngine;
use crate::utils::{legal_letters, letter_set};

/// Application state shared across all handlers
pub struct AppState {
    pub engine: GameEngine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Difficulty the game uses for a given level
    pub fn for_level(level: u32) -> Self {
        match level {
            0..=5 => Difficulty::Easy,
            6..=10 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    /// General vocabulary, no science, history or geography
    #[default]
    Current,
    ScienceSafari,
    HistoryQuest,
    GeoGenius,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Current => "current",
            Theme::ScienceSafari => "science-safari",
            Theme::HistoryQuest => "history-quest",
            Theme::GeoGenius => "geo-genius",
        }
    }

    pub fn is_premium(&self) -> bool {
        !matches!(self, Theme::Current)
    }
}

/// A request to mask `word`, revealing `reveal_count` unique letters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintRequest {
    pub word: String,
    pub word_length: usize,
    pub forbidden_letters: BTreeSet<char>,
    pub reveal_count: usize,
}

impl HintRequest {
    pub fn new(word: &str, forbidden: &str, reveal_count: usize) -> Self {
        let word = word.trim().to_string();
        Self {
            word_length: word.chars().count(),
            word,
            forbidden_letters: letter_set(forbidden),
            reveal_count,
        }
    }

    /// Request for the next hint of a round: two more letters than already revealed
    pub fn for_round(word: &str, incorrect_guesses: &str, already_revealed: usize) -> Self {
        Self::new(word, incorrect_guesses, already_revealed + 2)
    }

    /// Letters the hint is allowed to reveal
    pub fn legal_letters(&self) -> BTreeSet<char> {
        legal_letters(&self.word, &self.forbidden_letters)
    }

    /// Reject requests that cannot produce a hint, and clamp the reveal
    /// count to the number of legal letters.
    pub fn checked(mut self) -> Result<Self, HintError> {
        if self.word.is_empty() {
            return Err(HintError::InvalidRequest("word is empty".into()));
        }
        let actual = self.word.chars().count();
        if self.word_length != actual {
            return Err(HintError::InvalidRequest(format!(
                "word length {} does not match word '{}' ({} characters)",
                self.word_length, self.word, actual
            )));
        }
        if self.reveal_count == 0 {
            return Err(HintError::InvalidRequest("reveal count must be at least 1".into()));
        }
        let legal = self.legal_letters().len();
        if legal == 0 {
            return Err(HintError::InvalidRequest(format!(
                "every letter of '{}' is forbidden",
                self.word
            )));
        }
        if self.reveal_count > legal {
            warn!(
                "Reveal count {} exceeds {} legal letters of '{}'; clamping",
                self.reveal_count, legal, self.word
            );
            self.reveal_count = legal;
        }
        Ok(self)
    }
}

/// Untrusted output of the generator for a hint request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintCandidate {
    pub hint: String,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub chosen_letters: Option<Vec<String>>,
}

/// A hint that satisfies the masking contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResult {
    pub hint: String,
    pub revealed_letters: Vec<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// The candidate's chosen letters that survived validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_letters: Option<Vec<char>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRequest {
    pub difficulty: Difficulty,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub exclude_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordResult {
    pub word: String,
    pub definition: String,
}

/// Body of `POST /hint`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintQuery {
    pub word: String,
    pub word_length: Option<usize>,
    #[serde(default, alias = "forbiddenLetters")]
    pub incorrect_guesses: String,
    pub letters_to_reveal: usize,
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_free: bool,
}

impl HintQuery {
    pub fn to_request(&self) -> HintRequest {
        let mut request = HintRequest::new(&self.word, &self.incorrect_guesses, self.letters_to_reveal);
        if let Some(len) = self.word_length {
            request.word_length = len;
        }
        request
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_letters: Option<Vec<char>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chosen_letters: Option<Vec<char>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HintResponse {
    pub fn granted(result: HintResult) -> Self {
        Self {
            success: true,
            hint: Some(result.hint),
            revealed_letters: Some(result.revealed_letters),
            reasoning: result.reasoning,
            chosen_letters: result.chosen_letters,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Body of `POST /word`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordQuery {
    #[serde(flatten)]
    pub request: WordRequest,
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub candidates: Vec<String>,
}
