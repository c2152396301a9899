//! Adapter contracts for the two voice backends.
//!
//! The engine is single-threaded and cooperative, so adapters deliver
//! their callbacks through `poll` instead of invoking the engine directly.
//! Every event carries the generation captured when playback started; the
//! session drops events whose generation no longer matches, so a late
//! callback from a superseded line can never mutate current state. The
//! engine must work with both adapters absent: speech requests become
//! no-ops and advancement stays pace-driven.

pub mod media_player;

use crate::corpus::ScriptId;
use crate::tokenize::Token;
use anyhow::Result;

pub use media_player::MediaLinePlayer;

/// One request to speak a full line.
#[derive(Debug, Clone, Copy)]
pub struct LineRequest<'a> {
    /// Stable corpus id, used for media lookup.
    pub line_id: &'a str,
    pub text: &'a str,
    pub script: ScriptId,
    /// Session generation at the time of the request.
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    Started { generation: u64 },
    Ended { generation: u64 },
    Errored { generation: u64, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordEvent {
    /// The voice finished one token; the Flow Controller may advance.
    TokenDone { generation: u64 },
    Errored { generation: u64, message: String },
}

/// Line-level synthesizer: speaks one full line and reports when done.
///
/// `stop` while playing must surface `Ended` (or `Errored`) for the
/// outstanding request exactly once, and never panic. `dispose` is
/// idempotent and safe after the underlying voice resource is gone.
pub trait LinePlayer {
    fn play(&mut self, request: &LineRequest<'_>) -> Result<()>;
    fn stop(&mut self);
    fn poll(&mut self) -> Option<LineEvent>;
    fn dispose(&mut self);
}

/// Word-level synthesizer: produces per-token completion timing so the
/// Flow Controller can advance on voice instead of a fixed schedule.
pub trait WordPlayer {
    fn start(&mut self, tokens: &[Token], from: usize, generation: u64) -> Result<()>;
    fn pause(&mut self);
    fn stop(&mut self);
    fn poll(&mut self) -> Option<WordEvent>;
    fn dispose(&mut self);
}
