use serde_json::{json, Value};

use crate::models::{Difficulty, HintRequest, Theme, WordRequest};

/// JSON Schema the hint generator must answer with
pub fn hint_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "reasoning": {
                "type": "string",
                "description": "Step-by-step reasoning: which letters you chose and why"
            },
            "chosenLetters": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Array of the unique letters you chose to reveal"
            },
            "hint": {
                "type": "string",
                "description": "The partially revealed word, using underscores for unrevealed letters"
            }
        },
        "required": ["hint"]
    })
}

/// JSON Schema the word generator must answer with
pub fn word_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "word": { "type": "string", "description": "The generated word" },
            "definition": { "type": "string", "description": "The definition of the generated word" }
        },
        "required": ["word", "definition"]
    })
}

/// Instruction text for a hint. Spells out the masking algorithm with a worked
/// example so the answer can be checked against it afterwards.
pub fn build_hint_prompt(request: &HintRequest) -> String {
    let word = &request.word;
    let len = request.word_length;
    let forbidden: String = request.forbidden_letters.iter().collect();
    let reveal = request.reveal_count;

    format!(
        r#"You are a hint generator for a word puzzle game.

WORD: "{word}"
WORD LENGTH: {len} characters
FORBIDDEN LETTERS: "{forbidden}"
UNIQUE LETTERS TO REVEAL: {reveal}

CRITICAL RULES:
1. Choose EXACTLY {reveal} UNIQUE letter(s) from the word (not any of "{forbidden}")
2. When you reveal a letter, show ALL its occurrences
3. Replace all other positions with "_"
4. The hint MUST be EXACTLY {len} characters long

ALGORITHM:
1. List all unique letters in "{word}" that are NOT in "{forbidden}"
2. Select EXACTLY {reveal} letters from that list
3. For each of the {len} positions in "{word}":
   - If word[i] is in your selected letters: hint[i] = word[i]
   - Otherwise: hint[i] = "_"
4. Verify: hint length is {len} and the hint shows exactly {reveal} unique letters

EXAMPLE:
Word: "example", Length: 7, Forbidden: "xyz", Reveal: 2
Available: [e, a, m, p, l]
Select: [e, a]
Position 0: 'e' is selected -> 'e'
Position 1: 'x' is not selected -> '_'
Position 2: 'a' is selected -> 'a'
Position 3: 'm' is not selected -> '_'
Position 4: 'p' is not selected -> '_'
Position 5: 'l' is not selected -> '_'
Position 6: 'e' is selected -> 'e'
Result: "e_a___e" (length 7, unique letters: 2)

NOW SOLVE:
Word: "{word}"
Length: {len}
Forbidden: "{forbidden}"
Reveal: {reveal}

Return JSON:
- reasoning: explain which {reveal} letters you chose
- chosenLetters: array of EXACTLY {reveal} letters
- hint: string of EXACTLY {len} characters"#
    )
}

fn difficulty_guideline(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Use a common word (5-7 letters) that most people know.",
        Difficulty::Medium => "Use a moderately challenging word (7-10 letters).",
        Difficulty::Hard => "Use an advanced vocabulary word (10+ letters).",
    }
}

fn theme_guideline(theme: Theme) -> &'static str {
    match theme {
        Theme::Current => {
            "General vocabulary EXCLUDING science, history, and geography topics. Focus on everyday \
             objects, emotions, actions, abstract concepts, arts, literature, business, technology, \
             food, sports, entertainment, and general knowledge. DO NOT use scientific, historical, \
             or geographical terms."
        }
        Theme::ScienceSafari => {
            "Biological sciences, space exploration, ecosystems, scientific terminology, natural \
             phenomena, and scientific discoveries."
        }
        Theme::HistoryQuest => {
            "Ancient civilizations (Egypt, Rome, Greece, Mesopotamia), historical figures, historical \
             events, artifacts, and historical terminology."
        }
        Theme::GeoGenius => {
            "Countries, capitals, cities, landmarks, geographical features, continents, oceans, and \
             geographical terminology."
        }
    }
}

/// Instruction text for a new puzzle word
pub fn build_word_prompt(request: &WordRequest) -> String {
    let mut prompt = format!(
        "You are an expert lexicographer and puzzle master for a word game.\n\n\
         Generate a single word and its definition for the requested difficulty and theme.\n\n\
         Difficulty: {}\n{}\n\n\
         Theme: {}\n{}\n",
        request.difficulty.as_str(),
        difficulty_guideline(request.difficulty),
        request.theme.as_str(),
        theme_guideline(request.theme),
    );

    let excluded: Vec<&str> = request
        .exclude_words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();
    if !excluded.is_empty() {
        prompt.push_str(&format!(
            "\nIMPORTANT: Do NOT use any of these words (the player has already seen them): {}\n",
            excluded.join(", ")
        ));
    }

    prompt.push_str(
        "\nRequirements:\n\
         - The word MUST relate to the theme above\n\
         - The definition should be clear, concise, and dictionary-style\n\
         - The word must suit the difficulty level\n\
         - Use a single word only (no spaces, no hyphens)\n\n\
         Return a JSON object with:\n\
         - word: the target word (lowercase, single word only)\n\
         - definition: a clear, concise definition",
    );
    prompt
}
