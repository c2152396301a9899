//! Flow Controller: the navigation/playback state machine.
//!
//! Owns the line and word cursors and advances them either on voice
//! token-done callbacks or on a pace-derived deadline schedule. A hold
//! freezes advancement without touching the play state; a bounded watchdog
//! force-clears a hold that is never released so playback can never appear
//! frozen indefinitely.

use crate::config::{MAX_PACE_WPM, MIN_PACE_WPM};
use crate::player::state::{FlowState, clamp_line, clamp_word};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Outcome of one advancement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    None,
    /// Moved to the next token within the current line.
    Token,
    /// Consumed the last token of the current line; the session decides how
    /// to enter the next line.
    LineFinished,
    /// Stepped onto (or past) the final token of the final line.
    End,
}

/// Result of a timing tick.
#[derive(Debug, Clone, Copy)]
pub struct FlowTick {
    pub advance: Advance,
    /// True when the watchdog force-released a stuck hold this tick.
    pub watchdog_released: bool,
}

pub struct FlowController {
    total_lines: usize,
    token_count: usize,
    line_index: usize,
    word_index: usize,
    playing: bool,
    muted: bool,
    pace_wpm: u32,
    hold_since: Option<Instant>,
    next_deadline: Option<Instant>,
    watchdog: Duration,
}

impl FlowController {
    pub fn new(total_lines: usize, pace_wpm: u32, watchdog: Duration) -> Self {
        Self {
            total_lines,
            token_count: 0,
            line_index: 0,
            word_index: 0,
            playing: false,
            muted: false,
            pace_wpm: pace_wpm.clamp(MIN_PACE_WPM, MAX_PACE_WPM),
            hold_since: None,
            next_deadline: None,
            watchdog,
        }
    }

    /// Move onto a line, clamping the index and resetting the word cursor.
    /// Any pending hold or scheduled step is discarded.
    pub fn enter_line(&mut self, line_index: usize, token_count: usize) {
        self.line_index = clamp_line(line_index, self.total_lines);
        self.token_count = token_count;
        self.word_index = 0;
        self.hold_since = None;
        self.next_deadline = None;
    }

    /// Direct word navigation within the current line, clamped.
    pub fn seek_word(&mut self, word: usize) {
        self.word_index = clamp_word(word, self.token_count);
        self.hold_since = None;
        self.next_deadline = None;
    }

    pub fn start(&mut self) {
        self.playing = true;
        self.next_deadline = None;
    }

    /// Cancels the pending advancement step without losing position.
    pub fn pause(&mut self) {
        self.playing = false;
        self.next_deadline = None;
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    pub fn set_pace(&mut self, wpm: u32) {
        // Takes effect when the next step is scheduled, not retroactively.
        self.pace_wpm = wpm.clamp(MIN_PACE_WPM, MAX_PACE_WPM);
    }

    /// Freeze primary advancement. An already-pending hold keeps its
    /// original request time so the watchdog bound stays honest.
    pub fn request_hold(&mut self, now: Instant) {
        if self.hold_since.is_none() {
            self.hold_since = Some(now);
        }
    }

    pub fn release_hold(&mut self) {
        self.hold_since = None;
    }

    /// Voice callback path: one token finished speaking.
    pub fn on_voice_token_done(&mut self, now: Instant) -> Advance {
        if !self.playing || self.hold_since.is_some() || self.muted || self.at_end() {
            return Advance::None;
        }
        self.advance(now)
    }

    /// Timing tick. `voice_driven` suppresses the paced schedule while a
    /// word player is supplying token-done callbacks (unless muted, which
    /// falls back to pacing).
    pub fn tick(&mut self, now: Instant, voice_driven: bool) -> FlowTick {
        let mut watchdog_released = false;
        if let Some(since) = self.hold_since {
            if now.saturating_duration_since(since) >= self.watchdog {
                warn!(
                    held_ms = now.saturating_duration_since(since).as_millis() as u64,
                    "Hold watchdog fired; force-releasing"
                );
                self.hold_since = None;
                watchdog_released = true;
            }
        }

        if !self.playing || self.hold_since.is_some() || self.at_end() {
            return FlowTick {
                advance: Advance::None,
                watchdog_released,
            };
        }

        if voice_driven && !self.muted {
            return FlowTick {
                advance: Advance::None,
                watchdog_released,
            };
        }

        let dwell = self.token_dwell();
        let deadline = *self.next_deadline.get_or_insert(now + dwell);
        if now < deadline {
            return FlowTick {
                advance: Advance::None,
                watchdog_released,
            };
        }

        FlowTick {
            advance: self.advance(now),
            watchdog_released,
        }
    }

    /// Re-schedule the next step one dwell out, leaving the cursor alone.
    /// Used to retry a deferred line finish while line audio drains.
    pub fn defer_step(&mut self, now: Instant) {
        self.next_deadline = Some(now + self.token_dwell());
    }

    /// Stop advancement at the end of text: hold cleared, playback stopped.
    pub fn finish(&mut self) {
        self.playing = false;
        self.hold_since = None;
        self.next_deadline = None;
    }

    fn advance(&mut self, now: Instant) -> Advance {
        if self.token_count == 0 {
            return if self.on_last_line() {
                self.finish();
                Advance::End
            } else {
                Advance::LineFinished
            };
        }

        let next = self.word_index + 1;
        if next >= self.token_count {
            return if self.on_last_line() {
                self.finish();
                Advance::End
            } else {
                Advance::LineFinished
            };
        }

        self.word_index = next;
        self.next_deadline = Some(now + self.token_dwell());
        if self.at_end() {
            debug!(line = self.line_index, "Reached end of text");
            self.finish();
            Advance::End
        } else {
            Advance::Token
        }
    }

    fn token_dwell(&self) -> Duration {
        Duration::from_millis(60_000 / u64::from(self.pace_wpm.max(1)))
    }

    fn on_last_line(&self) -> bool {
        self.line_index + 1 >= self.total_lines
    }

    /// True once the cursor sits at or past the last token of the last line.
    pub fn at_end(&self) -> bool {
        self.on_last_line() && (self.token_count == 0 || self.word_index + 1 >= self.token_count)
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn hold_requested(&self) -> bool {
        self.hold_since.is_some()
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn word_index(&self) -> usize {
        self.word_index
    }

    pub fn state(&self) -> FlowState {
        FlowState {
            line_index: self.line_index,
            word_index: self.word_index,
            playing: self.playing,
            muted: self.muted,
            pace_wpm: self.pace_wpm,
            hold_requested: self.hold_since.is_some(),
        }
    }
}
