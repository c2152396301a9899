//! Per-line audio media resolution.
//!
//! Each corpus line carries a stable id; its recorded audio lives either in
//! a local media directory or behind an HTTP base URL. Remote files are
//! downloaded once into the media directory under a hash of their source
//! URL, so repeated sessions reuse the same files. A small prefetcher warms
//! the cache for upcoming lines on a background thread.

use crate::cancellation::CancellationToken;
use anyhow::{Context, Result, bail};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use tracing::{debug, warn};

const LOCAL_EXTENSIONS: [&str; 3] = ["ogg", "wav", "flac"];

/// Resolves stable line ids to playable audio files.
#[derive(Debug, Clone)]
pub struct MediaStore {
    media_dir: PathBuf,
    base_url: Option<String>,
}

impl MediaStore {
    pub fn new(media_dir: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        Self {
            media_dir: media_dir.into(),
            base_url,
        }
    }

    /// Find or fetch the audio file for `line_id`.
    ///
    /// Local files named `<id>.<ext>` win over downloads; a missing local
    /// file with no base URL configured is an error the caller recovers
    /// from (playback falls back to silent pacing).
    pub fn resolve(&self, line_id: &str) -> Result<PathBuf> {
        for ext in LOCAL_EXTENSIONS {
            let candidate = self.media_dir.join(format!("{line_id}.{ext}"));
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        let Some(base) = &self.base_url else {
            bail!("No local audio for line {line_id} and no media base URL configured");
        };
        let url = format!("{}/{line_id}.ogg", base.trim_end_matches('/'));
        let cached = self.download_path(&url);
        if cached.exists() {
            return Ok(cached);
        }
        self.download(&url, &cached)?;
        Ok(cached)
    }

    fn download(&self, url: &str, target: &Path) -> Result<()> {
        debug!(url, target = %target.display(), "Fetching line audio");
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).context("Creating media cache directory")?;
        }
        let response = reqwest::blocking::get(url).with_context(|| format!("Fetching {url}"))?;
        if !response.status().is_success() {
            bail!("Media fetch for {url} returned {}", response.status());
        }
        let bytes = response.bytes().context("Reading media body")?;
        let temp = target.with_extension("part");
        fs::write(&temp, &bytes).context("Writing media cache file")?;
        if fs::rename(&temp, target).is_err() {
            fs::copy(&temp, target).context("Copying media cache file")?;
            let _ = fs::remove_file(&temp);
        }
        Ok(())
    }

    /// Cache location for a downloaded URL, keyed by its hash so odd ids
    /// never produce unusable filenames.
    fn download_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = format!("{:x}", hasher.finalize());
        self.media_dir.join(format!("dl-{hash}.ogg"))
    }
}

/// Background cache warmer for the next few lines' audio.
pub struct Prefetcher {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Prefetcher {
    /// Spawn a thread that resolves each id in order, stopping early once
    /// cancelled. Failures are logged and skipped; the playback path
    /// resolves on demand anyway.
    pub fn spawn(store: MediaStore, line_ids: Vec<String>) -> Self {
        let token = CancellationToken::new();
        let worker_token = token.clone();
        let handle = std::thread::spawn(move || {
            for id in line_ids {
                if worker_token.check_cancelled("prefetch").is_err() {
                    debug!("Prefetch cancelled");
                    return;
                }
                if let Err(err) = store.resolve(&id) {
                    warn!(line_id = %id, "Prefetch skipped: {err}");
                }
            }
        });
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_dir(tag: &str) -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("verseflow-{tag}-{nonce}"))
    }

    #[test]
    fn local_file_wins_over_download() {
        let dir = scratch_dir("media");
        fs::create_dir_all(&dir).unwrap();
        let local = dir.join("v7.ogg");
        fs::write(&local, b"not really audio").unwrap();

        let store = MediaStore::new(&dir, Some("http://localhost:9".to_string()));
        let resolved = store.resolve("v7").expect("local file should resolve");
        assert_eq!(resolved, local);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_audio_without_base_url_is_an_error() {
        let dir = scratch_dir("media-miss");
        let store = MediaStore::new(&dir, None);
        assert!(store.resolve("v404").is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn cancelled_prefetcher_stops_quickly() {
        let dir = scratch_dir("media-prefetch");
        let store = MediaStore::new(&dir, None);
        let ids = (0..64).map(|i| format!("v{i}")).collect();
        let mut prefetcher = Prefetcher::spawn(store, ids);
        prefetcher.stop();
    }
}
