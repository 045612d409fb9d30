use std::str::FromStr;
use std::time::Duration;

use crate::services::generator::GenerationParams;
use crate::services::invocation::build_candidates;

/// Models tried when nothing else is configured, in order
pub const DEFAULT_CANDIDATES: &[&str] = &[
    "openai/gpt-4o-mini",
    "openai/gpt-4o",
    "googleai/gemini-2.0-flash-exp",
    "googleai/gemini-1.5-flash",
    "googleai/gemini-1.5-pro",
    "googleai/gemini-pro",
];

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// What to do with a hint candidate of the wrong length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Pad or truncate to the word length
    #[default]
    Repair,
    /// Discard the candidate and ask the next model
    Regenerate,
}

impl FromStr for LengthPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "repair" => Ok(LengthPolicy::Repair),
            "regenerate" => Ok(LengthPolicy::Regenerate),
            other => Err(format!("unknown length policy '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub openai: Option<String>,
    pub google: Option<String>,
}

/// Read-only engine settings, built once at start-up
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model_override: Option<String>,
    pub model_candidates: Vec<String>,
    pub api_keys: ProviderKeys,
    pub openai_base_url: String,
    pub google_base_url: String,
    pub hint_timeout: Duration,
    pub word_timeout: Duration,
    pub length_policy: LengthPolicy,
    pub hint_params: GenerationParams,
    pub word_params: GenerationParams,
    pub starting_hints: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_override: None,
            model_candidates: Vec::new(),
            api_keys: ProviderKeys::default(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            google_base_url: DEFAULT_GOOGLE_BASE_URL.to_string(),
            hint_timeout: Duration::from_millis(60_000),
            word_timeout: Duration::from_millis(30_000),
            length_policy: LengthPolicy::Repair,
            hint_params: GenerationParams {
                temperature: 0.2,
                max_output_tokens: 512,
                top_p: None,
            },
            word_params: GenerationParams {
                temperature: 0.9,
                max_output_tokens: 512,
                top_p: None,
            },
            starting_hints: 3,
        }
    }
}

impl EngineConfig {
    /// Ordered model candidates, shared by word and hint generation
    pub fn candidates(&self) -> Vec<String> {
        build_candidates(
            self.model_override.as_deref(),
            &self.model_candidates,
            DEFAULT_CANDIDATES,
        )
    }

    /// Split a comma-separated candidate list, dropping blanks
    pub fn parse_candidate_list(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
