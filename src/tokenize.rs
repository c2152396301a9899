//! Script-aware tokenization of corpus lines.
//!
//! A line splits into raw words (space-delimited), and each raw word splits
//! into display tokens. For clustered scripts (Gurmukhi, Devanagari) a
//! token is a base character together with its dependent signs, with
//! virama-joined consonants glued into the same token; for Roman and
//! English a raw word is a single token. Everything here is pure and total:
//! no input ever makes these functions fail.

use crate::corpus::ScriptId;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_EDGE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{P}\p{S}]+|[\p{P}\p{S}]+$").unwrap());
static RE_PUNCT_OR_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{P}\p{S}\s]+").unwrap());

/// Smallest displayable unit of a line in one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Position within the line's token sequence for this script.
    pub index: usize,
}

/// Split `line_text` into display tokens for `script`.
pub fn tokenize(line_text: &str, script: ScriptId) -> Vec<Token> {
    let mut tokens = Vec::new();
    for word in raw_words(line_text) {
        for piece in word_pieces(&word, script) {
            let index = tokens.len();
            tokens.push(Token { text: piece, index });
        }
    }
    tokens
}

/// Chunk-offset sentinel sequence: where each raw word begins in the token
/// stream, ending with the total token count. Empty text yields `[0]`.
pub fn raw_word_boundaries(line_text: &str, script: ScriptId) -> Vec<usize> {
    let mut offsets = vec![0usize];
    let mut total = 0usize;
    for word in raw_words(line_text) {
        let count = word_pieces(&word, script).len();
        if count > 0 {
            total += count;
            offsets.push(total);
        }
    }
    offsets
}

/// Detect chapter/section marker lines: after stripping punctuation and
/// whitespace, nothing but digits remains.
pub fn is_section_line(line_text: &str) -> bool {
    if line_text.trim().is_empty() {
        return false;
    }
    let cleaned = RE_PUNCT_OR_SPACE.replace_all(line_text, "");
    cleaned.chars().all(|c| c.is_numeric())
}

/// Maximal runs of non-whitespace with edge punctuation trimmed, dropping
/// runs that were punctuation only.
fn raw_words(line_text: &str) -> Vec<String> {
    let normalized: String = line_text.nfc().collect();
    normalized
        .split_whitespace()
        .map(|word| RE_EDGE_PUNCT.replace_all(word, "").into_owned())
        .filter(|word| !word.is_empty())
        .collect()
}

fn word_pieces(word: &str, script: ScriptId) -> Vec<String> {
    if script.is_clustered() {
        split_clusters(word)
    } else {
        vec![word.to_string()]
    }
}

/// Group a raw word into display clusters: each base character picks up the
/// dependent signs that follow it, and a virama glues the next consonant
/// into the same cluster.
fn split_clusters(word: &str) -> Vec<String> {
    let mut clusters: Vec<String> = Vec::new();
    let mut joined = false;
    for ch in word.chars() {
        let dependent = is_dependent_sign(ch);
        match clusters.last_mut() {
            Some(current) if dependent || joined => {
                current.push(ch);
            }
            _ => clusters.push(ch.to_string()),
        }
        joined = is_virama(ch);
    }
    clusters
}

/// Signs that render attached to a preceding base character.
fn is_dependent_sign(ch: char) -> bool {
    matches!(ch,
        // Gurmukhi: bindi/adak bindi/visarga, nukta, vowel signs and virama,
        // tippi/addak, yakash.
        '\u{0A01}'..='\u{0A03}'
        | '\u{0A3C}'
        | '\u{0A3E}'..='\u{0A4D}'
        | '\u{0A70}'..='\u{0A71}'
        | '\u{0A75}'
        // Devanagari: candrabindu/anusvara/visarga, oe/ooe/aw signs, nukta,
        // vowel signs and virama, stress/tone marks, vocalic signs.
        | '\u{0900}'..='\u{0903}'
        | '\u{093A}'..='\u{093C}'
        | '\u{093E}'..='\u{094F}'
        | '\u{0951}'..='\u{0957}'
        | '\u{0962}'..='\u{0963}'
        // Combining diacritics used by Latin transliteration schemes.
        | '\u{0300}'..='\u{036F}'
    )
}

fn is_virama(ch: char) -> bool {
    matches!(ch, '\u{0A4D}' | '\u{094D}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_is_deterministic() {
        let text = "ਸਤਿ ਨਾਮੁ ਕਰਤਾ ਪੁਰਖੁ";
        let a = tokenize(text, ScriptId::Gurmukhi);
        let b = tokenize(text, ScriptId::Gurmukhi);
        assert_eq!(a, b);
    }

    #[test]
    fn clustered_script_splits_raw_words_into_signed_clusters() {
        // ਸਤਿ = ਸ + (ਤ + ਿ): two clusters.
        let tokens = tokenize("ਸਤਿ", ScriptId::Gurmukhi);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "ਸ");
        assert_eq!(tokens[1].text, "ਤਿ");
        assert_eq!(tokens[1].index, 1);
    }

    #[test]
    fn virama_glues_following_consonant() {
        // Devanagari "ग्र" (ga + virama + ra) stays one cluster.
        let tokens = tokenize("\u{0917}\u{094D}\u{0930}", ScriptId::Devanagari);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "\u{0917}\u{094D}\u{0930}");
    }

    #[test]
    fn roman_script_yields_one_token_per_raw_word() {
        let tokens = tokenize("sat naam kartaa purakh", ScriptId::Roman);
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[2].text, "kartaa");
    }

    #[test]
    fn boundaries_are_strictly_increasing_and_end_at_token_count() {
        let text = "ਸਤਿ ਨਾਮੁ ਕਰਤਾ";
        let offsets = raw_word_boundaries(text, ScriptId::Gurmukhi);
        let tokens = tokenize(text, ScriptId::Gurmukhi);
        assert_eq!(offsets[0], 0);
        assert_eq!(*offsets.last().unwrap(), tokens.len());
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
        // Three raw words: rawWordCount + 1 sentinel entries.
        assert_eq!(offsets.len(), 4);
    }

    #[test]
    fn empty_text_yields_no_tokens_and_zero_sentinel() {
        assert!(tokenize("", ScriptId::Gurmukhi).is_empty());
        assert_eq!(raw_word_boundaries("", ScriptId::Gurmukhi), vec![0]);
        assert_eq!(raw_word_boundaries("   ", ScriptId::Roman), vec![0]);
    }

    #[test]
    fn punctuation_only_words_are_dropped() {
        let tokens = tokenize("॥ ਜਪੁ ॥", ScriptId::Gurmukhi);
        assert_eq!(tokens.len(), 2);
        assert_eq!(raw_word_boundaries("॥ ॥", ScriptId::Gurmukhi), vec![0]);
    }

    #[test]
    fn section_lines_are_detected_by_digit_check() {
        assert!(is_section_line("॥ ੧ ॥"));
        assert!(is_section_line("2."));
        assert!(is_section_line("॥"));
        assert!(!is_section_line("ਸਤਿ ਨਾਮੁ ॥ ੧ ॥"));
        assert!(!is_section_line(""));
        assert!(!is_section_line("  "));
    }
}
