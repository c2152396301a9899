//! Entry point for the terminal playback demo.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load the corpus JSON and user configuration from `conf/config.toml`.
//! - Run a playback session, printing the word cursor as it moves.
//!
//! Presentation proper is out of scope for the engine; this binary exists
//! to exercise a full session end to end.

use anyhow::{Context, Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};
use verseflow::config::load_config;
use verseflow::corpus::Corpus;
use verseflow::media::MediaStore;
use verseflow::player::{EngineEvent, Session};
use verseflow::tts::MediaLinePlayer;

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let corpus_path = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %corpus_path.display(),
        primary = %config.primary_script,
        secondary = ?config.secondary_script,
        pace = config.pace_wpm,
        "Starting playback demo"
    );

    let corpus = Corpus::load(&corpus_path)?;
    let store = MediaStore::new(&config.media_dir, config.media_base_url.clone());
    let mut session = Session::new(corpus, &config)?
        .with_line_player(Box::new(MediaLinePlayer::new(store.clone())))
        .with_media(store);

    let quit = Arc::new(AtomicBool::new(false));
    let quit_flag = Arc::clone(&quit);
    ctrlc::set_handler(move || {
        quit_flag.store(true, Ordering::SeqCst);
    })
    .context("Installing ctrl-c handler")?;

    session.play();
    let mut shown = (usize::MAX, usize::MAX);
    while !quit.load(Ordering::SeqCst) {
        session.tick(Instant::now());

        let flow = session.flow();
        if (flow.line_index, flow.word_index) != shown {
            shown = (flow.line_index, flow.word_index);
            render_cursor(&session);
        }
        for event in session.drain_events() {
            match event {
                EngineEvent::ReachedEnd => {
                    info!("Playback finished");
                    return Ok(());
                }
                EngineEvent::AudioUnavailable => {
                    warn!("No audio for this line; continuing silently");
                }
                _ => {}
            }
        }
        std::thread::sleep(Duration::from_millis(33));
    }
    info!("Interrupted; shutting down");
    Ok(())
}

fn render_cursor(session: &Session) {
    let flow = session.flow();
    let line: Vec<String> = session
        .primary_tokens()
        .iter()
        .enumerate()
        .map(|(i, token)| {
            if i == flow.word_index {
                format!("[{}]", token.text)
            } else {
                token.text.clone()
            }
        })
        .collect();
    println!("{:>4}  {}", flow.line_index + 1, line.join(" "));
}

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .ok_or_else(|| anyhow!("Usage: verseflow <path-to-corpus.json>"))?;

    let path = PathBuf::from(path);
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.as_path().display()));
    }
    Ok(path)
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
