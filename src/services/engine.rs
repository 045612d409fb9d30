use std::sync::Arc;

use log::{error, info, warn};

use crate::config::{EngineConfig, LengthPolicy};
use crate::error::{AttemptError, FailureKind, HintError, HintSpendError, LedgerError, WordError};
use crate::models::{HintCandidate, HintRequest, HintResult, Theme, WordRequest, WordResult};
use crate::services::generator::{GenerationOutput, TextGenerator};
use crate::services::hint_contract::compute_expected_mask;
use crate::services::invocation::{InvocationPolicy, Prompt};
use crate::services::ledger::HintLedger;
use crate::services::prompts::{build_hint_prompt, build_word_prompt, hint_schema, word_schema};
use crate::utils::MASK;

/// Longest a bare-text hint may differ from the word length and still be
/// read as a mask
const RAW_HINT_LENGTH_SLACK: usize = 2;

/// Read a hint candidate out of whatever the generator produced.
/// Text that is not JSON is taken as the hint itself, but only when it
/// looks like a mask of roughly `word_length` characters.
pub fn parse_hint_candidate(output: GenerationOutput, word_length: usize) -> Result<HintCandidate, AttemptError> {
    let candidate = match output.parse::<HintCandidate>() {
        Ok(candidate) => candidate,
        Err(err) => match output {
            GenerationOutput::RawText(text) => {
                let hint = text.trim().trim_matches('"');
                let len = hint.chars().count();
                if !hint.chars().all(|c| c.is_alphabetic() || c == MASK)
                    || len.abs_diff(word_length) > RAW_HINT_LENGTH_SLACK
                {
                    return Err(AttemptError::contract(format!(
                        "text reply is not a {}-letter mask: {:?}",
                        word_length, hint
                    )));
                }
                HintCandidate {
                    hint: hint.to_string(),
                    ..HintCandidate::default()
                }
            }
            GenerationOutput::Structured(_) => {
                return Err(AttemptError::contract(format!("hint output has no usable 'hint': {}", err)));
            }
        },
    };
    if candidate.hint.trim().is_empty() && candidate.chosen_letters.as_ref().map_or(true, Vec::is_empty) {
        return Err(AttemptError::new(FailureKind::Empty, "model returned an empty hint"));
    }
    Ok(candidate)
}

/// Read and normalise a word/definition pair
pub fn parse_word_result(output: GenerationOutput) -> Result<WordResult, AttemptError> {
    let raw: WordResult = output
        .parse()
        .map_err(|e| AttemptError::contract(format!("word output is not a word/definition record: {}", e)))?;
    let word = raw.word.trim().to_lowercase();
    let definition = raw.definition.trim().to_string();

    if word.is_empty() || definition.is_empty() {
        return Err(AttemptError::new(FailureKind::Empty, "model returned an empty word or definition"));
    }
    if !word.chars().all(char::is_alphabetic) {
        return Err(AttemptError::contract(format!(
            "'{}' is not a single word without spaces or hyphens",
            word
        )));
    }
    Ok(WordResult { word, definition })
}

/// Produces puzzle words and hints through the model fallback policy
#[derive(Clone)]
pub struct GameEngine {
    config: Arc<EngineConfig>,
    candidates: Vec<String>,
    policy: InvocationPolicy,
    ledger: Arc<dyn HintLedger>,
}

impl GameEngine {
    pub fn new(
        config: Arc<EngineConfig>,
        generator: Arc<dyn TextGenerator>,
        ledger: Arc<dyn HintLedger>,
    ) -> Self {
        Self {
            candidates: config.candidates(),
            config,
            policy: InvocationPolicy::new(generator),
            ledger,
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Generate a hint that satisfies the masking contract, or fail once
    /// every candidate model has been tried.
    pub async fn generate_hint(&self, request: HintRequest) -> Result<HintResult, HintError> {
        let request = request.checked()?;
        let prompt = Prompt {
            flow: "generateHint",
            text: build_hint_prompt(&request),
            schema: hint_schema(),
            params: self.config.hint_params,
        };
        let length_policy = self.config.length_policy;

        let invocation = self
            .policy
            .invoke(&prompt, &self.candidates, self.config.hint_timeout, |output| {
                let candidate = parse_hint_candidate(output, request.word_length)?;
                let enforced = compute_expected_mask(&request, &candidate);
                if length_policy == LengthPolicy::Regenerate && enforced.diagnostics.relied_on_length_repair() {
                    return Err(AttemptError::contract(format!(
                        "hint '{}' has length {}, expected {}",
                        candidate.hint, enforced.diagnostics.candidate_length, request.word_length
                    )));
                }
                Ok(enforced)
            })
            .await?;

        let enforced = invocation.value;
        info!(
            "Hint for '{}' from {} after {} attempt(s): {} (clean: {})",
            request.word,
            invocation.model,
            invocation.attempts.len(),
            enforced.result.hint,
            enforced.diagnostics.is_clean()
        );
        Ok(enforced.result)
    }

    /// Generate a fresh puzzle word, or fail once every candidate model has been tried
    pub async fn generate_word(&self, request: &WordRequest) -> Result<WordResult, WordError> {
        let prompt = Prompt {
            flow: "generateWord",
            text: build_word_prompt(request),
            schema: word_schema(),
            params: self.config.word_params,
        };

        let invocation = self
            .policy
            .invoke(&prompt, &self.candidates, self.config.word_timeout, parse_word_result)
            .await?;

        let result = invocation.value;
        if request.exclude_words.iter().any(|w| w.trim().eq_ignore_ascii_case(&result.word)) {
            warn!("Model {} repeated an excluded word: {}", invocation.model, result.word);
        }
        info!(
            "Word ({}, {}) from {} after {} attempt(s): {}",
            request.difficulty.as_str(),
            request.theme.as_str(),
            invocation.model,
            invocation.attempts.len(),
            result.word
        );
        Ok(result)
    }

    /// Spend a hint for `user_id` (unless free) and generate it. A store
    /// outage does not block the hint; a failed generation refunds it.
    pub async fn use_hint(
        &self,
        request: HintRequest,
        user_id: Option<&str>,
        is_free: bool,
    ) -> Result<HintResult, HintSpendError> {
        let mut charged: Option<&str> = None;
        if let (false, Some(user)) = (is_free, user_id) {
            match self.ledger.decrement_hint_balance(user).await {
                Ok(remaining) => {
                    info!("Charged one hint to {} ({} left)", user, remaining);
                    charged = Some(user);
                }
                Err(LedgerError::InsufficientBalance) => return Err(HintSpendError::NoHintsLeft),
                Err(err) => {
                    error!("Profile store error while charging hint for {}: {}", user, err);
                    warn!("Continuing with hint generation despite profile store error");
                }
            }
        }

        match self.generate_hint(request).await {
            Ok(result) => Ok(result),
            Err(err) => {
                if let Some(user) = charged {
                    match self.ledger.credit_hint(user).await {
                        Ok(_) => info!("Refunded hint to {} after failed generation", user),
                        Err(refund_err) => error!("Could not refund hint to {}: {}", user, refund_err),
                    }
                }
                Err(err.into())
            }
        }
    }

    /// Pick the next word for a player: premium themes only for premium
    /// players, previously seen words excluded, and the new word recorded.
    pub async fn next_word(&self, mut request: WordRequest, user_id: Option<&str>) -> Result<WordResult, WordError> {
        let Some(user) = user_id else {
            if request.theme.is_premium() {
                info!("Anonymous request for premium theme {}; using current", request.theme.as_str());
                request.theme = Theme::Current;
            }
            return self.generate_word(&request).await;
        };

        let is_premium = match self.ledger.user_preferences(user).await {
            Ok(prefs) => prefs.is_premium,
            Err(LedgerError::UserNotFound(_)) => false,
            Err(err) => {
                warn!("Could not read preferences for {}: {}", user, err);
                false
            }
        };
        if request.theme.is_premium() && !is_premium {
            info!("{} is not premium; theme {} downgraded to current", user, request.theme.as_str());
            request.theme = Theme::Current;
        }

        match self.ledger.seen_words(user).await {
            Ok(seen) => {
                for word in seen {
                    if !request.exclude_words.iter().any(|w| w.eq_ignore_ascii_case(&word)) {
                        request.exclude_words.push(word);
                    }
                }
            }
            Err(LedgerError::UserNotFound(_)) => {}
            Err(err) => warn!("Could not read seen words for {}: {}", user, err),
        }

        let result = self.generate_word(&request).await?;
        if let Err(err) = self.ledger.append_seen_word(user, &result.word).await {
            warn!("Could not record seen word for {}: {}", user, err);
        }
        Ok(result)
    }
}
