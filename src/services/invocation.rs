use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;
use tokio::time::timeout;

use crate::error::{AttemptError, ExhaustedError, FailureKind};
use crate::services::generator::{GenerationOutput, GenerationParams, GenerationRequest, TextGenerator};

/// Build the ordered candidate list: explicit override, then the configured
/// list, then the built-in defaults. Blank and repeated entries are dropped.
pub fn build_candidates(explicit: Option<&str>, listed: &[String], defaults: &[&str]) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    let ordered = explicit
        .into_iter()
        .chain(listed.iter().map(String::as_str))
        .chain(defaults.iter().copied());
    for candidate in ordered {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !candidates.iter().any(|c| c == candidate) {
            candidates.push(candidate.to_string());
        }
    }
    candidates
}

/// Classify a provider error message by substring
pub fn classify_failure(message: &str) -> FailureKind {
    let lower = message.to_lowercase();
    if lower.contains("not found") || lower.contains("not_found") {
        FailureKind::NotFound
    } else if lower.contains("401")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
        || lower.contains("incorrect api key")
        || lower.contains("authentication")
    {
        FailureKind::Auth
    } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("quota") {
        FailureKind::RateLimit
    } else {
        FailureKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed(AttemptError),
}

/// Record of one candidate tried during an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub candidate: String,
    pub outcome: AttemptOutcome,
}

/// The prompt and shape shared by every attempt of one invocation
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Name used in log lines, e.g. "generateHint"
    pub flow: &'static str,
    pub text: String,
    pub schema: Value,
    pub params: GenerationParams,
}

#[derive(Debug)]
pub struct Invocation<T> {
    pub value: T,
    pub model: String,
    pub attempts: Vec<Attempt>,
}

/// Sequential fallback across candidate models with a per-attempt deadline
#[derive(Clone)]
pub struct InvocationPolicy {
    generator: Arc<dyn TextGenerator>,
}

impl InvocationPolicy {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Try each candidate in order until `accept` takes an output.
    ///
    /// An attempt fails on a generator error, on a timeout, on an empty
    /// output, or when `accept` rejects the output. Every failure moves on to
    /// the next candidate. A timed-out attempt has its request future dropped,
    /// which aborts the underlying HTTP call.
    pub async fn invoke<T, F>(
        &self,
        prompt: &Prompt,
        candidates: &[String],
        per_attempt: Duration,
        mut accept: F,
    ) -> Result<Invocation<T>, ExhaustedError>
    where
        F: FnMut(GenerationOutput) -> Result<T, AttemptError>,
    {
        let mut attempts = Vec::with_capacity(candidates.len());
        let mut last_error: Option<AttemptError> = None;

        for candidate in candidates {
            debug!("[{}] trying model candidate: {}", prompt.flow, candidate);
            let request = GenerationRequest {
                model: candidate.clone(),
                prompt: prompt.text.clone(),
                schema: prompt.schema.clone(),
                params: prompt.params,
            };

            let result = match timeout(per_attempt, self.generator.generate(&request)).await {
                Err(_) => Err(AttemptError::new(
                    FailureKind::Timeout,
                    format!("model request timed out after {} ms", per_attempt.as_millis()),
                )),
                Ok(Err(err)) => {
                    let message = err.to_string();
                    Err(AttemptError::new(classify_failure(&message), message))
                }
                Ok(Ok(None)) => Err(AttemptError::new(FailureKind::Empty, "model returned no output")),
                Ok(Ok(Some(output))) if output.is_empty() => {
                    Err(AttemptError::new(FailureKind::Empty, "model returned no output"))
                }
                Ok(Ok(Some(output))) => accept(output),
            };

            match result {
                Ok(value) => {
                    info!("[{}] model worked: {}", prompt.flow, candidate);
                    attempts.push(Attempt {
                        candidate: candidate.clone(),
                        outcome: AttemptOutcome::Succeeded,
                    });
                    return Ok(Invocation {
                        value,
                        model: candidate.clone(),
                        attempts,
                    });
                }
                Err(err) => {
                    warn!(
                        "[{}] model \"{}\" failed ({}): {}; trying next",
                        prompt.flow, candidate, err.kind, err.message
                    );
                    attempts.push(Attempt {
                        candidate: candidate.clone(),
                        outcome: AttemptOutcome::Failed(err.clone()),
                    });
                    last_error = Some(err);
                }
            }
        }

        let last_error = last_error
            .map(|err| err.message)
            .unwrap_or_else(|| "no model candidates configured".to_string());
        Err(ExhaustedError {
            flow: prompt.flow.to_string(),
            candidates: candidates.to_vec(),
            attempts,
            last_error,
        })
    }
}
