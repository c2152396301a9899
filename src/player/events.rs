//! Engine events emitted for downstream consumers.
//!
//! Persistence, achievements, and sharing live outside the engine; they
//! subscribe to these completion events and nothing else.

/// Observable milestones of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    LineStarted { line_index: usize },
    LineCompleted { line_index: usize },
    ReachedEnd,
    /// Voice playback failed and the session fell back to silent pacing.
    AudioUnavailable,
    /// A stuck hold was force-released by the watchdog.
    HoldWatchdogFired,
}
