use std::collections::BTreeSet;

/// Character used for every unrevealed position of a hint
pub const MASK: char = '_';

fn lower(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

/// Collect the alphabetic characters of `letters` as a lower-cased set.
/// Accepts both "xyz" and "x, y, z" styles.
pub fn letter_set(letters: &str) -> BTreeSet<char> {
    letters
        .chars()
        .filter(|c| c.is_alphabetic())
        .map(lower)
        .collect()
}

/// Same as `letter_set`, for letters that arrive as a list of strings
pub fn letter_set_from<S: AsRef<str>>(letters: &[S]) -> BTreeSet<char> {
    letters
        .iter()
        .flat_map(|s| letter_set(s.as_ref()))
        .collect()
}

/// Distinct lower-cased letters of `word` that are not forbidden
pub fn legal_letters(word: &str, forbidden: &BTreeSet<char>) -> BTreeSet<char> {
    letter_set(word)
        .into_iter()
        .filter(|c| !forbidden.contains(c))
        .collect()
}

/// Reveal every occurrence of the `reveal` letters in `word`, mask the rest.
/// Revealed characters keep the casing they have in `word`.
pub fn mask_word(word: &str, reveal: &BTreeSet<char>) -> String {
    word.chars()
        .map(|c| if reveal.contains(&lower(c)) { c } else { MASK })
        .collect()
}

/// Distinct lower-cased characters shown by a hint
pub fn revealed_letters(hint: &str) -> BTreeSet<char> {
    hint.chars().filter(|&c| c != MASK).map(lower).collect()
}

/// Truncate or right-pad with `MASK` until `hint` is exactly `len` characters
pub fn fit_length(hint: &str, len: usize) -> String {
    let mut fitted: String = hint.chars().take(len).collect();
    let have = fitted.chars().count();
    fitted.extend(std::iter::repeat(MASK).take(len - have));
    fitted
}

/// Case-insensitive comparison of two single characters
pub fn same_letter(a: char, b: char) -> bool {
    lower(a) == lower(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(letters: &str) -> BTreeSet<char> {
        letter_set(letters)
    }

    #[test]
    fn test_letter_set() {
        assert_eq!(set("xyz"), set("ZYX"));
        assert_eq!(set("x, y ,z").len(), 3);
        assert!(set("").is_empty());
        assert!(set("_-1 ").is_empty());
    }

    #[test]
    fn test_letter_set_from_list() {
        let chosen = vec!["E".to_string(), "a".to_string(), "e".to_string()];
        assert_eq!(letter_set_from(&chosen), set("ae"));
    }

    #[test]
    fn test_legal_letters() {
        // example has e, x, a, m, p, l
        assert_eq!(legal_letters("example", &set("xyz")), set("eampl"));
        assert_eq!(legal_letters("Example", &set("E")), set("xampl"));
        assert!(legal_letters("aaa", &set("a")).is_empty());
    }

    #[test]
    fn test_mask_word() {
        assert_eq!(mask_word("example", &set("ea")), "e_a___e");
        assert_eq!(mask_word("serendipity", &set("e")), "_e_e_______");
        assert_eq!(mask_word("between", &set("e")), "_e__ee_");
        assert_eq!(mask_word("Apple", &set("a")), "A____");
        assert_eq!(mask_word("word", &BTreeSet::new()), "____");
    }

    #[test]
    fn test_revealed_letters() {
        assert_eq!(revealed_letters("e_a___e"), set("ea"));
        assert_eq!(revealed_letters("E_e"), set("e"));
        assert!(revealed_letters("____").is_empty());
    }

    #[test]
    fn test_fit_length() {
        assert_eq!(fit_length("e_a___ee", 7), "e_a___e");
        assert_eq!(fit_length("e_a", 7), "e_a____");
        assert_eq!(fit_length("", 3), "___");
        assert_eq!(fit_length("abc", 3), "abc");
        // multi-byte characters count once
        assert_eq!(fit_length("éé", 3), "éé_");
    }
}
