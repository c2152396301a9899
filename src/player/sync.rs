//! Cross-Script Sync Driver.
//!
//! Walks the secondary script's sub-words through the currently playing
//! raw-word group. The dwell for a group is sized by the larger of the two
//! scripts' group lengths so neither side skips sub-words; progress is
//! sampled from wall-clock deltas passed into `tick`, so drift stays
//! bounded by the sampling interval instead of accumulating. When the
//! secondary group is meaningfully longer than the primary one, the driver
//! asks the Flow Controller to hold the primary cursor until the secondary
//! walk completes.

use crate::align::{GroupAlignment, align_group};
use crate::corpus::ScriptId;
use crate::player::state::SyncState;
use std::time::{Duration, Instant};
use tracing::debug;

/// Progress at which a group counts as fully walked.
const PROGRESS_COMPLETE: f32 = 0.999;

pub struct SyncDriver {
    secondary: Option<ScriptId>,
    base_ms_per_token: u64,
    alignment: GroupAlignment,
    primary_group_index: usize,
    dwell: Duration,
    progress: f32,
    last_sample: Option<Instant>,
    /// False when the current line has no secondary text; holds are
    /// disabled for that line only.
    line_has_secondary: bool,
    holding: bool,
}

impl SyncDriver {
    pub fn new(secondary: Option<ScriptId>, base_ms_per_token: u64) -> Self {
        Self {
            secondary,
            base_ms_per_token: base_ms_per_token.max(1),
            alignment: GroupAlignment::default(),
            primary_group_index: 0,
            dwell: Duration::from_millis(1),
            progress: 0.0,
            last_sample: None,
            line_has_secondary: false,
            holding: false,
        }
    }

    pub fn secondary(&self) -> Option<ScriptId> {
        self.secondary
    }

    /// Select or clear the secondary script. Clearing zeroes the progress
    /// and disables hold-requests until a script is re-selected; returns
    /// true when an active hold must be released by the caller.
    pub fn set_secondary(&mut self, secondary: Option<ScriptId>) -> bool {
        self.secondary = secondary;
        self.progress = 0.0;
        self.last_sample = None;
        std::mem::take(&mut self.holding)
    }

    /// Recompute alignment and dwell for a new `(line, group)` position.
    pub fn enter_group(
        &mut self,
        primary_offsets: &[usize],
        secondary_offsets: Option<&[usize]>,
        primary_group_index: usize,
    ) {
        self.primary_group_index = primary_group_index;
        self.line_has_secondary = secondary_offsets.is_some();
        self.alignment = match secondary_offsets {
            Some(secondary) if self.secondary.is_some() => {
                align_group(primary_offsets, secondary, primary_group_index)
            }
            _ => {
                // Track primary length alone so the dwell still scales with
                // the group when there is nothing to walk on the other side.
                let mut alignment =
                    align_group(primary_offsets, primary_offsets, primary_group_index);
                alignment.secondary_start = 0;
                alignment.secondary_len = 0;
                alignment.secondary_group_index = 0;
                alignment
            }
        };

        let widest = self.alignment.primary_len.max(self.alignment.secondary_len).max(1);
        self.dwell = Duration::from_millis(widest as u64 * self.base_ms_per_token);
        self.progress = 0.0;
        self.last_sample = None;
        self.holding = false;
        debug!(
            group = primary_group_index,
            primary_len = self.alignment.primary_len,
            secondary_len = self.alignment.secondary_len,
            dwell_ms = self.dwell.as_millis() as u64,
            "Entered raw-word group"
        );
    }

    /// Advance the group progress clock and decide hold transitions.
    ///
    /// Returns `Some(true)` to request a hold, `Some(false)` to release
    /// one; the caller forwards these to the Flow Controller.
    pub fn tick(
        &mut self,
        now: Instant,
        playing: bool,
        primary_at_group_end: bool,
        at_end: bool,
    ) -> Option<bool> {
        if self.secondary.is_none() {
            // Inert: progress pinned at 0, no holds ever requested.
            self.progress = 0.0;
            self.last_sample = None;
            return std::mem::take(&mut self.holding).then_some(false);
        }

        if at_end {
            // End of text must never leave the UI holding.
            self.progress = 1.0;
            self.last_sample = None;
            return std::mem::take(&mut self.holding).then_some(false);
        }

        if !playing && !self.holding {
            // No wasted ticks while paused.
            self.last_sample = None;
            return None;
        }

        if let Some(last) = self.last_sample.replace(now) {
            let delta = now.saturating_duration_since(last);
            let step = delta.as_secs_f32() / self.dwell.as_secs_f32();
            self.progress = (self.progress + step).min(1.0);
        }

        if self.holding {
            if self.progress >= PROGRESS_COMPLETE {
                self.holding = false;
                return Some(false);
            }
            return None;
        }

        if self.meaningful_group() && primary_at_group_end && self.progress < PROGRESS_COMPLETE {
            self.holding = true;
            return Some(true);
        }

        None
    }

    /// Pin the walk at completion; used when the end of text is reached so
    /// the UI can never be left mid-group. Inert without a secondary.
    pub fn force_complete(&mut self) {
        if self.secondary.is_none() {
            return;
        }
        self.progress = 1.0;
        self.last_sample = None;
        self.holding = false;
    }

    /// A secondary group worth holding for: strictly more sub-words than
    /// the primary group and more than one overall.
    fn meaningful_group(&self) -> bool {
        self.line_has_secondary
            && self.alignment.secondary_len > self.alignment.primary_len
            && self.alignment.secondary_len > 1
    }

    pub fn state(&self) -> SyncState {
        let secondary_word_index = if self.secondary.is_some() && self.alignment.secondary_len > 0 {
            let walked = (self.progress * self.alignment.secondary_len as f32).floor() as usize;
            self.alignment.secondary_start + walked.min(self.alignment.secondary_len - 1)
        } else {
            0
        };
        SyncState {
            primary_group_index: self.primary_group_index,
            secondary_word_index,
            group_progress: self.progress,
        }
    }
}
