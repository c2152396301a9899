//! Word-flow playback engine for a multilingual verse corpus.
//!
//! The crate drives line-by-line and word-by-word navigation through a
//! corpus whose lines carry text in several scripts, coordinates that
//! navigation with recorded line audio, and keeps a secondary script's
//! highlight in lock-step with the primary script even though the two
//! scripts tokenize into different numbers of sub-word pieces.
//!
//! Presentation and persistence live outside this crate; consumers drive a
//! [`player::Session`] and render its read-only state.

pub mod align;
pub mod cancellation;
pub mod config;
pub mod corpus;
pub mod media;
pub mod player;
pub mod tokenize;
pub mod tts;

pub use config::AppConfig;
pub use corpus::{Corpus, Line, ScriptId};
pub use player::Session;
