use std::fmt;
use thiserror::Error;

/// Failure of a single call to an external text generator
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("HTTP {status} {reason}: {body}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Provider(String),
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("401 unauthorized: no API key configured for provider '{0}'")]
    MissingApiKey(&'static str),
    #[error("model '{0}' not found: unknown provider prefix")]
    UnknownProvider(String),
}

/// Why one candidate attempt was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Auth,
    RateLimit,
    Timeout,
    Empty,
    Contract,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::NotFound => "not-found",
            FailureKind::Auth => "auth",
            FailureKind::RateLimit => "rate-limit",
            FailureKind::Timeout => "timeout",
            FailureKind::Empty => "empty",
            FailureKind::Contract => "contract",
            FailureKind::Other => "other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct AttemptError {
    pub kind: FailureKind,
    pub message: String,
}

impl AttemptError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Contract, message)
    }
}

/// Every candidate model failed
#[derive(Debug, Clone, Error)]
#[error("{flow} failed, tried models: [{}]. Last error: {last_error}", .candidates.join(", "))]
pub struct ExhaustedError {
    pub flow: String,
    pub candidates: Vec<String>,
    pub attempts: Vec<crate::services::invocation::Attempt>,
    pub last_error: String,
}

#[derive(Debug, Error)]
pub enum HintError {
    #[error("invalid hint request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Exhausted(#[from] ExhaustedError),
}

#[derive(Debug, Error)]
pub enum WordError {
    #[error(transparent)]
    Exhausted(#[from] ExhaustedError),
}

/// Errors from the user profile store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient hint balance")]
    InsufficientBalance,
    #[error("user profile '{0}' not found")]
    UserNotFound(String),
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of spending a hint that did not produce one
#[derive(Debug, Error)]
pub enum HintSpendError {
    #[error("You don't have any hints left.")]
    NoHintsLeft,
    #[error(transparent)]
    Hint(#[from] HintError),
}
