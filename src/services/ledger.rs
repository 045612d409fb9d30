use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use log::info;

use crate::error::LedgerError;
use crate::models::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserPreferences {
    pub theme: Theme,
    pub is_premium: bool,
}

/// The user profile store, as seen by the game engine
#[async_trait]
pub trait HintLedger: Send + Sync {
    /// Atomically take one hint; fails with `InsufficientBalance` at zero.
    /// Returns the remaining balance.
    async fn decrement_hint_balance(&self, user_id: &str) -> Result<u32, LedgerError>;

    /// Give one hint back, e.g. after a failed generation
    async fn credit_hint(&self, user_id: &str) -> Result<u32, LedgerError>;

    async fn append_seen_word(&self, user_id: &str, word: &str) -> Result<(), LedgerError>;

    async fn seen_words(&self, user_id: &str) -> Result<Vec<String>, LedgerError>;

    async fn user_preferences(&self, user_id: &str) -> Result<UserPreferences, LedgerError>;
}

#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    pub hints: u32,
    pub preferences: UserPreferences,
    pub seen_words: Vec<String>,
}

/// Process-local profile store. Unknown users get a fresh profile with
/// `starting_hints` on their first write; reads of unknown users fail
/// with `UserNotFound`.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    starting_hints: u32,
    profiles: Mutex<HashMap<String, UserProfile>>,
}

impl MemoryLedger {
    pub fn new(starting_hints: u32) -> Self {
        Self {
            starting_hints,
            profiles: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_profile(self, user_id: &str, profile: UserProfile) -> Self {
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.insert(user_id.to_string(), profile);
        }
        self
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles.lock().ok()?.get(user_id).cloned()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, UserProfile>>, LedgerError> {
        self.profiles
            .lock()
            .map_err(|_| LedgerError::Unavailable("profile lock poisoned".into()))
    }

    fn with_user<T>(&self, user_id: &str, f: impl FnOnce(&mut UserProfile) -> T) -> Result<T, LedgerError> {
        let mut profiles = self.lock()?;
        let profile = profiles.entry(user_id.to_string()).or_insert_with(|| {
            info!("Creating profile for {} with {} hints", user_id, self.starting_hints);
            UserProfile {
                hints: self.starting_hints,
                ..UserProfile::default()
            }
        });
        Ok(f(profile))
    }

    fn read_user<T>(&self, user_id: &str, f: impl FnOnce(&UserProfile) -> T) -> Result<T, LedgerError> {
        let profiles = self.lock()?;
        profiles
            .get(user_id)
            .map(f)
            .ok_or_else(|| LedgerError::UserNotFound(user_id.to_string()))
    }
}

#[async_trait]
impl HintLedger for MemoryLedger {
    async fn decrement_hint_balance(&self, user_id: &str) -> Result<u32, LedgerError> {
        self.with_user(user_id, |profile| {
            if profile.hints == 0 {
                return Err(LedgerError::InsufficientBalance);
            }
            profile.hints -= 1;
            Ok(profile.hints)
        })?
    }

    async fn credit_hint(&self, user_id: &str) -> Result<u32, LedgerError> {
        self.with_user(user_id, |profile| {
            profile.hints += 1;
            profile.hints
        })
    }

    async fn append_seen_word(&self, user_id: &str, word: &str) -> Result<(), LedgerError> {
        let word = word.to_lowercase();
        self.with_user(user_id, |profile| {
            if !profile.seen_words.contains(&word) {
                profile.seen_words.push(word);
            }
        })
    }

    async fn seen_words(&self, user_id: &str) -> Result<Vec<String>, LedgerError> {
        self.read_user(user_id, |profile| profile.seen_words.clone())
    }

    async fn user_preferences(&self, user_id: &str) -> Result<UserPreferences, LedgerError> {
        self.read_user(user_id, |profile| profile.preferences)
    }
}
