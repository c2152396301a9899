//! Corpus data model and loading.
//!
//! A corpus is an ordered list of lines, each carrying text in one or more
//! scripts plus an optional section marker and a stable identifier used for
//! media lookup. The corpus is loaded once per text and is read-only for
//! the lifetime of a viewing session; the engine never mutates it.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

/// Scripts the engine knows how to tokenize.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptId {
    Gurmukhi,
    Devanagari,
    Roman,
    English,
}

impl ScriptId {
    /// Scripts whose raw words decompose into per-cluster display tokens.
    pub fn is_clustered(self) -> bool {
        matches!(self, ScriptId::Gurmukhi | ScriptId::Devanagari)
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScriptId::Gurmukhi => "gurmukhi",
            ScriptId::Devanagari => "devanagari",
            ScriptId::Roman => "roman",
            ScriptId::English => "english",
        };
        write!(f, "{}", label)
    }
}

/// One corpus entry; immutable once loaded.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Line {
    /// Stable identifier used for media lookup.
    pub id: String,
    /// Optional chapter/section marker this line opens.
    #[serde(default)]
    pub section: Option<String>,
    /// Per-script text fields.
    pub text: BTreeMap<ScriptId, String>,
}

impl Line {
    pub fn text(&self, script: ScriptId) -> Option<&str> {
        self.text.get(&script).map(String::as_str)
    }
}

/// Ordered, read-only collection of lines.
#[derive(Debug, Clone)]
pub struct Corpus {
    lines: Vec<Line>,
}

impl Corpus {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    /// Load a corpus from a JSON array of lines.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Reading corpus from {}", path.display()))?;
        let lines: Vec<Line> = serde_json::from_str(&data)
            .with_context(|| format!("Parsing corpus JSON from {}", path.display()))?;
        if lines.is_empty() {
            bail!("Corpus at {} contains no lines", path.display());
        }
        info!(path = %path.display(), lines = lines.len(), "Loaded corpus");
        Ok(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}
