use log::warn;

use crate::models::{HintCandidate, HintRequest, HintResult};
use crate::utils::{fit_length, letter_set_from, mask_word, revealed_letters, same_letter, MASK};

/// Result of one contract check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Passed,
    /// The hint failed the check and was rewritten
    Repaired,
    /// The hint failed the check and was left as is
    Flagged,
    /// The check had nothing to work with
    Skipped,
}

/// Which checks passed and which repairs were applied to a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintDiagnostics {
    pub length: CheckOutcome,
    pub chosen_letters: CheckOutcome,
    pub forbidden_letters: CheckOutcome,
    pub alignment: CheckOutcome,
    pub unique_count: CheckOutcome,
    pub candidate_length: usize,
    pub unique_revealed: usize,
}

impl HintDiagnostics {
    /// True when the candidate went through untouched and within the contract
    pub fn is_clean(&self) -> bool {
        [
            self.length,
            self.chosen_letters,
            self.forbidden_letters,
            self.alignment,
            self.unique_count,
        ]
        .iter()
        .all(|c| matches!(c, CheckOutcome::Passed | CheckOutcome::Skipped))
    }

    /// The length had to be forced and no chosen letters rebuilt the hint
    pub fn relied_on_length_repair(&self) -> bool {
        self.length == CheckOutcome::Repaired && self.chosen_letters == CheckOutcome::Skipped
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcedHint {
    pub result: HintResult,
    pub diagnostics: HintDiagnostics,
}

/// Turn an untrusted candidate into a hint that follows the masking contract.
///
/// Checks run in order: length, chosen letters, forbidden letters, alignment
/// with the secret word, unique letter count. The first four rewrite the hint
/// when they fail; a wrong unique count is only flagged. Never panics.
pub fn compute_expected_mask(request: &HintRequest, candidate: &HintCandidate) -> EnforcedHint {
    let word: Vec<char> = request.word.chars().collect();
    let target = word.len();
    let mut hint: String = candidate
        .hint
        .trim_matches(|c: char| c == '"' || c == '\n' || c == '\r')
        .chars()
        .map(|c| if c.is_whitespace() { MASK } else { c })
        .collect();
    let candidate_length = hint.chars().count();

    let length = if candidate_length != target {
        let fitted = fit_length(&hint, target);
        warn!(
            "[validateHint] Hint length mismatch: {} != {}. \"{}\" -> \"{}\"",
            candidate_length, target, hint, fitted
        );
        hint = fitted;
        CheckOutcome::Repaired
    } else {
        CheckOutcome::Passed
    };

    let chosen = candidate
        .chosen_letters
        .as_deref()
        .map(letter_set_from)
        .unwrap_or_default();
    let chosen_letters = if chosen.is_empty() {
        CheckOutcome::Skipped
    } else {
        let rebuilt = mask_word(&request.word, &chosen);
        if rebuilt != hint {
            warn!(
                "[validateHint] Fixed hint to match chosen letters. Before: \"{}\", After: \"{}\"",
                hint, rebuilt
            );
            hint = rebuilt;
            CheckOutcome::Repaired
        } else {
            CheckOutcome::Passed
        }
    };

    let forbidden = &request.forbidden_letters;
    let forbidden_letters = if revealed_letters(&hint).iter().any(|c| forbidden.contains(c)) {
        let rebuilt: String = hint
            .chars()
            .zip(word.iter())
            .map(|(h, &w)| {
                if h != MASK && !forbidden.iter().any(|&f| same_letter(f, w)) {
                    w
                } else {
                    MASK
                }
            })
            .collect();
        warn!(
            "[validateHint] Hint contains forbidden letters. Before: \"{}\", After: \"{}\"",
            hint, rebuilt
        );
        hint = rebuilt;
        CheckOutcome::Repaired
    } else {
        CheckOutcome::Passed
    };

    let mut misaligned = false;
    let aligned: String = hint
        .chars()
        .zip(word.iter())
        .map(|(h, &w)| {
            if h == MASK {
                MASK
            } else if same_letter(h, w) {
                w
            } else {
                misaligned = true;
                MASK
            }
        })
        .collect();
    let alignment = if misaligned {
        warn!(
            "[validateHint] Hint reveals letters the word does not have there. Before: \"{}\", After: \"{}\"",
            hint, aligned
        );
        CheckOutcome::Repaired
    } else {
        CheckOutcome::Passed
    };
    hint = aligned;

    let revealed = revealed_letters(&hint);
    let unique_count = if revealed.len() != request.reveal_count {
        warn!(
            "[validateHint] Wrong number of unique letters: {} != {}",
            revealed.len(),
            request.reveal_count
        );
        CheckOutcome::Flagged
    } else {
        CheckOutcome::Passed
    };

    EnforcedHint {
        diagnostics: HintDiagnostics {
            length,
            chosen_letters,
            forbidden_letters,
            alignment,
            unique_count,
            candidate_length,
            unique_revealed: revealed.len(),
        },
        result: HintResult {
            hint,
            chosen_letters: (!chosen.is_empty()).then(|| chosen.intersection(&revealed).copied().collect()),
            revealed_letters: revealed.into_iter().collect(),
            reasoning: candidate.reasoning.clone(),
        },
    }
}
