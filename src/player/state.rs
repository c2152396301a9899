//! Read-only state snapshots and the per-line tokenization context.

use crate::corpus::{Line, ScriptId};
use crate::tokenize::{Token, is_section_line, raw_word_boundaries, tokenize};

/// Snapshot of the Flow Controller's cursors and toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowState {
    pub line_index: usize,
    pub word_index: usize,
    pub playing: bool,
    pub muted: bool,
    pub pace_wpm: u32,
    pub hold_requested: bool,
}

/// Snapshot of the Sync Driver's position within the current raw-word group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncState {
    pub primary_group_index: usize,
    pub secondary_word_index: usize,
    /// How far playback has moved through the current group, in `[0, 1]`.
    pub group_progress: f32,
}

/// Tokenization of one corpus line for the active script pair; rebuilt on
/// every line or script change and read-only afterwards.
#[derive(Debug, Clone)]
pub(crate) struct LineContext {
    pub line_id: String,
    pub section_line: bool,
    pub primary_text: String,
    pub primary_tokens: Vec<Token>,
    pub primary_offsets: Vec<usize>,
    pub secondary_tokens: Vec<Token>,
    /// `None` when the line has no text in the secondary script.
    pub secondary_offsets: Option<Vec<usize>>,
}

impl LineContext {
    pub(crate) fn build(line: &Line, primary: ScriptId, secondary: Option<ScriptId>) -> Self {
        let primary_text = line.text(primary).unwrap_or_default().to_string();
        let secondary_text = secondary.and_then(|script| line.text(script));
        let (secondary_tokens, secondary_offsets) = match (secondary, secondary_text) {
            (Some(script), Some(text)) if !text.trim().is_empty() => (
                tokenize(text, script),
                Some(raw_word_boundaries(text, script)),
            ),
            _ => (Vec::new(), None),
        };

        Self {
            line_id: line.id.clone(),
            section_line: is_section_line(&primary_text),
            primary_tokens: tokenize(&primary_text, primary),
            primary_offsets: raw_word_boundaries(&primary_text, primary),
            primary_text,
            secondary_tokens,
            secondary_offsets,
        }
    }

    pub(crate) fn token_count(&self) -> usize {
        self.primary_tokens.len()
    }
}

/// Clamp a word cursor into the valid range for a line; empty lines pin the
/// cursor to 0.
pub(crate) fn clamp_word(word: usize, token_count: usize) -> usize {
    if token_count == 0 {
        0
    } else {
        word.min(token_count - 1)
    }
}

/// Clamp a line cursor into the corpus range.
pub(crate) fn clamp_line(line: usize, total_lines: usize) -> usize {
    if total_lines == 0 {
        0
    } else {
        line.min(total_lines - 1)
    }
}
