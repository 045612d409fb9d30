// End-to-end tests for the hint and word flows, driven by a scripted generator

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use hintd::config::{EngineConfig, LengthPolicy};
use hintd::error::{HintError, HintSpendError, LedgerError, WordError};
use hintd::models::{Difficulty, HintRequest, Theme, WordRequest};
use hintd::services::engine::GameEngine;
use hintd::services::ledger::{HintLedger, MemoryLedger, UserPreferences, UserProfile};
use hintd::services::mock::{Scripted, ScriptedGenerator};

fn config(models: &[&str]) -> EngineConfig {
    EngineConfig {
        model_override: None,
        model_candidates: models.iter().map(|m| m.to_string()).collect(),
        hint_timeout: Duration::from_millis(200),
        word_timeout: Duration::from_millis(200),
        ..EngineConfig::default()
    }
}

fn engine(config: EngineConfig, generator: Arc<ScriptedGenerator>, ledger: Arc<dyn HintLedger>) -> GameEngine {
    GameEngine::new(Arc::new(config), generator, ledger)
}

fn word_request(theme: Theme) -> WordRequest {
    WordRequest {
        difficulty: Difficulty::Medium,
        theme,
        exclude_words: Vec::new(),
    }
}

/// A profile store that is always down
struct BrokenLedger;

#[async_trait]
impl HintLedger for BrokenLedger {
    async fn decrement_hint_balance(&self, _user_id: &str) -> Result<u32, LedgerError> {
        Err(LedgerError::Unavailable("connection refused".into()))
    }
    async fn credit_hint(&self, _user_id: &str) -> Result<u32, LedgerError> {
        Err(LedgerError::Unavailable("connection refused".into()))
    }
    async fn append_seen_word(&self, _user_id: &str, _word: &str) -> Result<(), LedgerError> {
        Err(LedgerError::Unavailable("connection refused".into()))
    }
    async fn seen_words(&self, _user_id: &str) -> Result<Vec<String>, LedgerError> {
        Err(LedgerError::Unavailable("connection refused".into()))
    }
    async fn user_preferences(&self, _user_id: &str) -> Result<UserPreferences, LedgerError> {
        Err(LedgerError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn test_hint_falls_back_and_repairs() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .on("test/a", Scripted::Fail("HTTP 404 Not Found".into()))
            .on(
                "test/b",
                Scripted::Json(json!({
                    "reasoning": "picked e and a",
                    "chosenLetters": ["e", "a"],
                    "hint": "e_a___ee"
                })),
            ),
    );
    let engine = engine(config(&["test/a", "test/b"]), generator.clone(), Arc::new(MemoryLedger::new(0)));

    let result = engine
        .generate_hint(HintRequest::new("example", "xyz", 2))
        .await
        .unwrap();

    assert_eq!(result.hint, "e_a___e");
    assert_eq!(result.revealed_letters, vec!['a', 'e']);
    assert_eq!(result.reasoning.as_deref(), Some("picked e and a"));
    assert_eq!(generator.called_models(), vec!["test/a", "test/b"]);

    let prompt = &generator.calls()[1].prompt;
    assert!(prompt.contains("WORD: \"example\""));
    assert!(prompt.contains("UNIQUE LETTERS TO REVEAL: 2"));
}

#[tokio::test]
async fn test_hint_from_raw_text() {
    let generator = Arc::new(ScriptedGenerator::new().on("test/a", Scripted::Text("exa___e".into())));
    let engine = engine(config(&["test/a"]), generator, Arc::new(MemoryLedger::new(0)));

    let result = engine
        .generate_hint(HintRequest::new("example", "xyz", 2))
        .await
        .unwrap();
    assert_eq!(result.hint, "e_a___e");
}

#[tokio::test]
async fn test_prose_reply_moves_to_next_model() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .on("test/a", Scripted::Text("I'm sorry, I cannot help with that request.".into()))
            .on("test/b", Scripted::Json(json!({"chosenLetters": ["e", "a"], "hint": "e_a___e"}))),
    );
    let ledger = Arc::new(MemoryLedger::new(1));
    let engine = engine(config(&["test/a", "test/b"]), generator.clone(), ledger.clone());

    let result = engine
        .use_hint(HintRequest::new("example", "xyz", 2), Some("gus"), false)
        .await
        .unwrap();
    assert_eq!(result.hint, "e_a___e");
    assert_eq!(result.revealed_letters, vec!['a', 'e']);
    assert_eq!(generator.called_models(), vec!["test/a", "test/b"]);
    assert_eq!(ledger.profile("gus").unwrap().hints, 0);
}

#[tokio::test]
async fn test_next_word_for_unknown_player() {
    let generator = Arc::new(
        ScriptedGenerator::new().on("test/a", Scripted::Json(json!({"word": "anchor", "definition": "A weight."}))),
    );
    let ledger = Arc::new(MemoryLedger::new(3));
    let engine = engine(config(&["test/a"]), generator.clone(), ledger.clone());

    engine
        .next_word(word_request(Theme::HistoryQuest), Some("hal"))
        .await
        .unwrap();
    assert!(generator.calls()[0].prompt.contains("Theme: current"));
    assert_eq!(ledger.profile("hal").unwrap().seen_words, vec!["anchor"]);
}

#[tokio::test]
async fn test_hint_exhaustion_lists_candidates() {
    let generator = Arc::new(ScriptedGenerator::new());
    let mut cfg = config(&[]);
    cfg.model_override = Some("test/only".into());
    let engine = engine(cfg, generator, Arc::new(MemoryLedger::new(0)));

    let err = engine
        .generate_hint(HintRequest::new("example", "xyz", 2))
        .await
        .unwrap_err();

    let HintError::Exhausted(exhausted) = err else {
        panic!("expected exhaustion");
    };
    let message = exhausted.to_string();
    assert!(message.contains("test/only"));
    assert!(message.contains("openai/gpt-4o-mini"));
    assert!(message.contains("googleai/gemini-pro"));
    assert_eq!(exhausted.attempts.len(), engine.candidates().len());
}

#[tokio::test]
async fn test_invalid_hint_request_skips_models() {
    let generator = Arc::new(ScriptedGenerator::new());
    let engine = engine(config(&["test/a"]), generator.clone(), Arc::new(MemoryLedger::new(0)));

    let err = engine.generate_hint(HintRequest::new("zzz", "z", 1)).await.unwrap_err();
    assert!(matches!(err, HintError::InvalidRequest(_)));
    assert!(generator.called_models().is_empty());
}

#[tokio::test]
async fn test_regenerate_policy_moves_past_bad_length() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .on("test/a", Scripted::Json(json!({"hint": "e_a___ee"})))
            .on("test/b", Scripted::Json(json!({"hint": "e_a___e"}))),
    );
    let mut cfg = config(&["test/a", "test/b"]);
    cfg.length_policy = LengthPolicy::Regenerate;
    let engine = engine(cfg, generator.clone(), Arc::new(MemoryLedger::new(0)));

    let result = engine
        .generate_hint(HintRequest::new("example", "xyz", 2))
        .await
        .unwrap();
    assert_eq!(result.hint, "e_a___e");
    assert_eq!(generator.called_models(), vec!["test/a", "test/b"]);
}

#[tokio::test]
async fn test_repair_policy_keeps_first_candidate() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .on("test/a", Scripted::Json(json!({"hint": "e_a___ee"})))
            .on("test/b", Scripted::Json(json!({"hint": "never used"}))),
    );
    let engine = engine(config(&["test/a", "test/b"]), generator.clone(), Arc::new(MemoryLedger::new(0)));

    let result = engine
        .generate_hint(HintRequest::new("example", "xyz", 2))
        .await
        .unwrap();
    assert_eq!(result.hint, "e_a___e");
    assert_eq!(generator.called_models(), vec!["test/a"]);
}

#[tokio::test]
async fn test_hung_model_times_out() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .on("test/slow", Scripted::Hang)
            .on("test/fast", Scripted::Json(json!({"word": "Harbor", "definition": "A sheltered port."}))),
    );
    let engine = engine(config(&["test/slow", "test/fast"]), generator, Arc::new(MemoryLedger::new(0)));

    let word = engine.generate_word(&word_request(Theme::Current)).await.unwrap();
    assert_eq!(word.word, "harbor");
}

#[tokio::test]
async fn test_word_rejects_multi_word_answers() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .on("test/a", Scripted::Json(json!({"word": "ice cream", "definition": "A frozen dessert."})))
            .on("test/b", Scripted::Json(json!({"word": "sorbet", "definition": "A frozen dessert."}))),
    );
    let engine = engine(config(&["test/a", "test/b"]), generator, Arc::new(MemoryLedger::new(0)));

    let word = engine.generate_word(&word_request(Theme::Current)).await.unwrap();
    assert_eq!(word.word, "sorbet");
}

#[tokio::test]
async fn test_word_exhausted() {
    let generator = Arc::new(ScriptedGenerator::new().on("test/a", Scripted::Nothing));
    let mut cfg = config(&["test/a"]);
    cfg.model_override = None;
    let engine = engine(cfg, generator, Arc::new(MemoryLedger::new(0)));

    let WordError::Exhausted(err) = engine.generate_word(&word_request(Theme::Current)).await.unwrap_err();
    assert!(err.to_string().contains("test/a"));
}

#[tokio::test]
async fn test_use_hint_charges_balance() {
    let generator = Arc::new(ScriptedGenerator::new().on("test/a", Scripted::Json(json!({"hint": "e_a___e"}))));
    let ledger = Arc::new(MemoryLedger::new(1));
    let engine = engine(config(&["test/a"]), generator, ledger.clone());

    let request = HintRequest::new("example", "xyz", 2);
    engine.use_hint(request.clone(), Some("ada"), false).await.unwrap();
    assert_eq!(ledger.profile("ada").unwrap().hints, 0);

    let err = engine.use_hint(request.clone(), Some("ada"), false).await.unwrap_err();
    assert!(matches!(err, HintSpendError::NoHintsLeft));

    // free hints do not touch the balance
    engine.use_hint(request, Some("ada"), true).await.unwrap();
    assert_eq!(ledger.profile("ada").unwrap().hints, 0);
}

#[tokio::test]
async fn test_use_hint_refunds_on_failure() {
    let generator = Arc::new(ScriptedGenerator::new());
    let ledger = Arc::new(MemoryLedger::new(2));
    let engine = engine(config(&[]), generator, ledger.clone());

    let err = engine
        .use_hint(HintRequest::new("example", "xyz", 2), Some("bob"), false)
        .await
        .unwrap_err();
    assert!(matches!(err, HintSpendError::Hint(HintError::Exhausted(_))));
    assert_eq!(ledger.profile("bob").unwrap().hints, 2);
}

#[tokio::test]
async fn test_use_hint_survives_store_outage() {
    let generator = Arc::new(ScriptedGenerator::new().on("test/a", Scripted::Json(json!({"hint": "e_a___e"}))));
    let engine = engine(config(&["test/a"]), generator, Arc::new(BrokenLedger));

    let result = engine
        .use_hint(HintRequest::new("example", "xyz", 2), Some("cy"), false)
        .await
        .unwrap();
    assert_eq!(result.hint, "e_a___e");
}

#[tokio::test]
async fn test_next_word_downgrades_theme_and_records_word() {
    let generator = Arc::new(
        ScriptedGenerator::new().on("test/a", Scripted::Json(json!({"word": "Lantern", "definition": "A lamp."}))),
    );
    let ledger = Arc::new(MemoryLedger::new(0).with_profile(
        "dee",
        UserProfile {
            hints: 0,
            preferences: UserPreferences::default(),
            seen_words: vec!["harbor".into()],
        },
    ));
    let engine = engine(config(&["test/a"]), generator.clone(), ledger.clone());

    let word = engine
        .next_word(word_request(Theme::ScienceSafari), Some("dee"))
        .await
        .unwrap();
    assert_eq!(word.word, "lantern");

    let prompt = &generator.calls()[0].prompt;
    assert!(prompt.contains("Theme: current"));
    assert!(prompt.contains("already seen them): harbor"));
    assert_eq!(ledger.profile("dee").unwrap().seen_words, vec!["harbor", "lantern"]);
}

#[tokio::test]
async fn test_next_word_keeps_premium_theme() {
    let generator = Arc::new(
        ScriptedGenerator::new().on("test/a", Scripted::Json(json!({"word": "nebula", "definition": "A gas cloud."}))),
    );
    let ledger = Arc::new(MemoryLedger::new(0).with_profile(
        "eve",
        UserProfile {
            hints: 0,
            preferences: UserPreferences {
                theme: Theme::ScienceSafari,
                is_premium: true,
            },
            seen_words: Vec::new(),
        },
    ));
    let engine = engine(config(&["test/a"]), generator.clone(), ledger);

    engine
        .next_word(word_request(Theme::ScienceSafari), Some("eve"))
        .await
        .unwrap();
    assert!(generator.calls()[0].prompt.contains("Theme: science-safari"));
}

#[tokio::test]
async fn test_next_word_delivers_despite_store_outage() {
    let generator = Arc::new(
        ScriptedGenerator::new().on("test/a", Scripted::Json(json!({"word": "kettle", "definition": "A pot."}))),
    );
    let engine = engine(config(&["test/a"]), generator, Arc::new(BrokenLedger));

    let word = engine.next_word(word_request(Theme::Current), Some("fay")).await.unwrap();
    assert_eq!(word.word, "kettle");
}
