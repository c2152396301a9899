//! Viewer session: the consumer-facing surface of the engine.
//!
//! One session owns the flow and sync state for one viewing of a corpus,
//! plus the (optional) voice adapters. All mutation goes through the
//! operations here; the presentation layer reads the snapshots and drains
//! engine events. Every seek bumps the session generation and stops both
//! adapters, so a late callback from a superseded position is recognized
//! as stale and dropped instead of mutating the new position.

use crate::align::{group_count, group_of_token};
use crate::config::AppConfig;
use crate::corpus::{Corpus, ScriptId};
use crate::media::{MediaStore, Prefetcher};
use crate::player::events::EngineEvent;
use crate::player::flow::{Advance, FlowController};
use crate::player::state::{FlowState, LineContext, SyncState};
use crate::player::sync::SyncDriver;
use crate::tokenize::Token;
use crate::tts::{LineEvent, LinePlayer, LineRequest, WordEvent, WordPlayer};
use anyhow::{Result, bail};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Which adapter currently supplies audio/timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoiceMode {
    /// No audio; pace-driven advancement only.
    Silent,
    Line,
    Word,
}

pub struct Session {
    corpus: Corpus,
    primary: ScriptId,
    flow: FlowController,
    sync: SyncDriver,
    ctx: LineContext,
    line_player: Option<Box<dyn LinePlayer>>,
    word_player: Option<Box<dyn WordPlayer>>,
    voice: VoiceMode,
    line_audio_active: bool,
    generation: u64,
    events: Vec<EngineEvent>,
    end_emitted: bool,
    media: Option<MediaStore>,
    prefetch_depth: usize,
    prefetcher: Option<Prefetcher>,
}

impl Session {
    pub fn new(corpus: Corpus, config: &AppConfig) -> Result<Self> {
        let primary = config.primary_script;
        let Some(first) = corpus.line(0) else {
            bail!("Cannot open a session over an empty corpus");
        };
        let ctx = LineContext::build(first, primary, config.secondary_script);
        let mut flow = FlowController::new(
            corpus.len(),
            config.pace_wpm,
            Duration::from_millis(config.hold_watchdog_ms),
        );
        flow.enter_line(0, ctx.token_count());
        let mut sync = SyncDriver::new(config.secondary_script, config.base_ms_per_token);
        sync.enter_group(&ctx.primary_offsets, ctx.secondary_offsets.as_deref(), 0);

        info!(
            lines = corpus.len(),
            primary = %primary,
            secondary = ?config.secondary_script,
            "Opened viewing session"
        );
        Ok(Self {
            corpus,
            primary,
            flow,
            sync,
            ctx,
            line_player: None,
            word_player: None,
            voice: VoiceMode::Silent,
            line_audio_active: false,
            generation: 0,
            events: vec![EngineEvent::LineStarted { line_index: 0 }],
            end_emitted: false,
            media: None,
            prefetch_depth: config.prefetch_depth,
            prefetcher: None,
        })
    }

    pub fn with_line_player(mut self, player: Box<dyn LinePlayer>) -> Self {
        self.line_player = Some(player);
        self
    }

    pub fn with_word_player(mut self, player: Box<dyn WordPlayer>) -> Self {
        self.word_player = Some(player);
        self
    }

    pub fn with_media(mut self, store: MediaStore) -> Self {
        self.media = Some(store);
        self.start_prefetch();
        self
    }

    // ---- navigation ----------------------------------------------------

    /// Jump to a line. Out-of-range input is clamped, never rejected; any
    /// in-flight hold and audio for the previous position is cancelled.
    pub fn open_line(&mut self, index: usize) {
        self.stop_players();
        let index = index.min(self.corpus.len() - 1);
        let line = match self.corpus.line(index) {
            Some(line) => line,
            None => return,
        };
        self.ctx = LineContext::build(line, self.primary, self.sync.secondary());
        self.flow.enter_line(index, self.ctx.token_count());
        self.sync.enter_group(
            &self.ctx.primary_offsets,
            self.ctx.secondary_offsets.as_deref(),
            0,
        );
        self.end_emitted = false;
        debug!(line = index, tokens = self.ctx.token_count(), "Opened line");
        self.events.push(EngineEvent::LineStarted { line_index: index });
        self.start_prefetch();
        if self.flow.playing() {
            self.resume_voice();
        }
    }

    pub fn next_line(&mut self) {
        self.open_line(self.flow.line_index() + 1);
    }

    pub fn prev_line(&mut self) {
        self.open_line(self.flow.line_index().saturating_sub(1));
    }

    /// Direct word navigation (e.g., a search-result jump), clamped.
    pub fn seek_word(&mut self, word: usize) {
        self.stop_players();
        self.flow.seek_word(word);
        self.sync_group_if_changed();
        if self.flow.playing() {
            self.resume_voice();
        }
    }

    // ---- playback ------------------------------------------------------

    pub fn play(&mut self) {
        if self.flow.at_end() {
            debug!("Play ignored at end of text");
            return;
        }
        self.flow.start();
        self.resume_voice();
    }

    pub fn pause(&mut self) {
        self.stop_players();
        self.flow.pause();
    }

    pub fn toggle_mute(&mut self) {
        let muted = self.flow.toggle_mute();
        info!(muted, "Toggled mute");
        if muted {
            // Flow keeps running on pace; only the audio goes quiet.
            self.stop_players();
        } else if self.flow.playing() {
            self.resume_voice();
        }
    }

    pub fn set_pace(&mut self, wpm: u32) {
        self.flow.set_pace(wpm);
    }

    /// Select or clear the secondary script for cross-script highlighting.
    pub fn set_secondary_script(&mut self, secondary: Option<ScriptId>) {
        if self.sync.set_secondary(secondary) {
            self.flow.release_hold();
        }
        let line = match self.corpus.line(self.flow.line_index()) {
            Some(line) => line,
            None => return,
        };
        self.ctx = LineContext::build(line, self.primary, secondary);
        let group = self.current_group();
        self.sync.enter_group(
            &self.ctx.primary_offsets,
            self.ctx.secondary_offsets.as_deref(),
            group,
        );
        info!(secondary = ?secondary, "Secondary script changed");
    }

    /// Speak the current line through the line-level voice. A no-op when no
    /// line player is attached or the media for this line cannot be played.
    pub fn speak_current_line(&mut self) {
        if self.line_player.is_none() {
            debug!("No line voice attached; speak is a no-op");
            return;
        }
        self.stop_players();
        self.flow.start();
        self.start_line_audio();
    }

    // ---- timing --------------------------------------------------------

    /// Drive the engine. The host calls this from its frame clock, passing
    /// the current instant; tests pass fabricated instants.
    pub fn tick(&mut self, now: Instant) {
        self.poll_line_events();
        self.poll_word_events(now);

        let at_end = self.flow.at_end();
        let at_group_end = self.primary_at_group_end();
        if let Some(request) = self
            .sync
            .tick(now, self.flow.playing(), at_group_end, at_end)
        {
            if request {
                self.flow.request_hold(now);
            } else {
                self.flow.release_hold();
            }
        }

        let voice_driven = self.voice == VoiceMode::Word && !self.flow.muted();
        let tick = self.flow.tick(now, voice_driven);
        if tick.watchdog_released {
            self.events.push(EngineEvent::HoldWatchdogFired);
        }
        self.apply_advance(tick.advance, now);
    }

    // ---- observers -----------------------------------------------------

    pub fn flow(&self) -> FlowState {
        self.flow.state()
    }

    pub fn sync(&self) -> SyncState {
        self.sync.state()
    }

    pub fn at_end(&self) -> bool {
        self.flow.at_end()
    }

    pub fn primary_tokens(&self) -> &[Token] {
        &self.ctx.primary_tokens
    }

    pub fn secondary_tokens(&self) -> &[Token] {
        &self.ctx.secondary_tokens
    }

    pub fn section_line(&self) -> bool {
        self.ctx.section_line
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- internals -----------------------------------------------------

    /// Invalidate outstanding audio and stop both adapters. Events already
    /// queued by the adapters carry the old generation and get dropped.
    fn stop_players(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.line_audio_active = false;
        if let Some(player) = self.line_player.as_mut() {
            player.stop();
        }
        if let Some(player) = self.word_player.as_mut() {
            player.stop();
        }
    }

    /// Start whichever voice fits the current mode preference: word-level
    /// timing when available, else line-level audio, else silent pacing.
    /// At most one adapter is active afterwards.
    fn resume_voice(&mut self) {
        self.stop_players();
        if self.flow.muted() {
            self.voice = VoiceMode::Silent;
            return;
        }
        if let Some(player) = self.word_player.as_mut() {
            match player.start(
                &self.ctx.primary_tokens,
                self.flow.word_index(),
                self.generation,
            ) {
                Ok(()) => {
                    self.voice = VoiceMode::Word;
                    return;
                }
                Err(err) => {
                    warn!("Word voice unavailable: {err}");
                    self.events.push(EngineEvent::AudioUnavailable);
                }
            }
        }
        self.start_line_audio();
    }

    fn start_line_audio(&mut self) {
        let Some(player) = self.line_player.as_mut() else {
            self.voice = VoiceMode::Silent;
            return;
        };
        let request = LineRequest {
            line_id: &self.ctx.line_id,
            text: &self.ctx.primary_text,
            script: self.primary,
            generation: self.generation,
        };
        match player.play(&request) {
            Ok(()) => {
                self.voice = VoiceMode::Line;
                self.line_audio_active = true;
            }
            Err(err) => {
                warn!(line_id = %self.ctx.line_id, "Line voice failed: {err}");
                self.voice = VoiceMode::Silent;
                self.events.push(EngineEvent::AudioUnavailable);
            }
        }
    }

    fn poll_line_events(&mut self) {
        let mut incoming = Vec::new();
        if let Some(player) = self.line_player.as_mut() {
            while let Some(event) = player.poll() {
                incoming.push(event);
            }
        }
        for event in incoming {
            match event {
                LineEvent::Started { generation } if generation == self.generation => {
                    debug!(generation, "Line audio started");
                }
                LineEvent::Ended { generation } if generation == self.generation => {
                    self.line_audio_active = false;
                    if self.voice == VoiceMode::Line && self.flow.playing() {
                        self.complete_line_from_audio();
                    }
                }
                LineEvent::Errored { generation, message }
                    if generation == self.generation =>
                {
                    warn!(%message, "Line audio failed; falling back to silent pacing");
                    self.line_audio_active = false;
                    self.voice = VoiceMode::Silent;
                    self.events.push(EngineEvent::AudioUnavailable);
                }
                stale => debug!(?stale, "Ignoring stale line audio event"),
            }
        }
    }

    fn poll_word_events(&mut self, now: Instant) {
        let mut incoming = Vec::new();
        if let Some(player) = self.word_player.as_mut() {
            while let Some(event) = player.poll() {
                incoming.push(event);
            }
        }
        for event in incoming {
            match event {
                WordEvent::TokenDone { generation } if generation == self.generation => {
                    let advance = self.flow.on_voice_token_done(now);
                    self.apply_advance(advance, now);
                }
                WordEvent::Errored { generation, message }
                    if generation == self.generation =>
                {
                    warn!(%message, "Word voice failed; falling back to silent pacing");
                    self.voice = VoiceMode::Silent;
                    self.events.push(EngineEvent::AudioUnavailable);
                }
                stale => debug!(?stale, "Ignoring stale word voice event"),
            }
        }
    }

    /// Line audio drained while playing: the line is complete regardless of
    /// where the paced word cursor sits.
    fn complete_line_from_audio(&mut self) {
        let current = self.flow.line_index();
        if current + 1 >= self.corpus.len() {
            self.finish_playback();
        } else {
            self.events.push(EngineEvent::LineCompleted {
                line_index: current,
            });
            self.open_line(current + 1);
        }
    }

    fn apply_advance(&mut self, advance: Advance, now: Instant) {
        match advance {
            Advance::None => {}
            Advance::Token => self.sync_group_if_changed(),
            Advance::LineFinished => {
                if self.voice == VoiceMode::Line && self.line_audio_active {
                    // The recorded audio outlasts the paced cursor; let it
                    // finish and retry on the next dwell.
                    self.flow.defer_step(now);
                    return;
                }
                let finished = self.flow.line_index();
                self.events.push(EngineEvent::LineCompleted {
                    line_index: finished,
                });
                self.open_line(finished + 1);
            }
            Advance::End => self.finish_playback(),
        }
    }

    fn finish_playback(&mut self) {
        self.flow.finish();
        self.stop_players();
        self.voice = VoiceMode::Silent;
        self.sync.force_complete();
        if !self.end_emitted {
            self.end_emitted = true;
            let last = self.flow.line_index();
            info!(line = last, "Reached end of text");
            self.events.push(EngineEvent::LineCompleted { line_index: last });
            self.events.push(EngineEvent::ReachedEnd);
        }
    }

    fn current_group(&self) -> usize {
        group_of_token(&self.ctx.primary_offsets, self.flow.word_index())
    }

    fn sync_group_if_changed(&mut self) {
        let group = self.current_group();
        if group != self.sync.state().primary_group_index {
            self.sync.enter_group(
                &self.ctx.primary_offsets,
                self.ctx.secondary_offsets.as_deref(),
                group,
            );
        }
    }

    /// True when the word cursor sits on the last token of its raw-word
    /// group.
    fn primary_at_group_end(&self) -> bool {
        let offsets = &self.ctx.primary_offsets;
        if group_count(offsets) == 0 {
            return false;
        }
        let group = group_of_token(offsets, self.flow.word_index());
        self.flow.word_index() + 1 == offsets[group + 1]
    }

    fn start_prefetch(&mut self) {
        let Some(store) = self.media.clone() else {
            return;
        };
        if self.prefetch_depth == 0 {
            return;
        }
        let from = self.flow.line_index() + 1;
        let ids: Vec<String> = (from..from + self.prefetch_depth)
            .filter_map(|i| self.corpus.line(i))
            .map(|line| line.id.clone())
            .collect();
        if ids.is_empty() {
            self.prefetcher = None;
            return;
        }
        self.prefetcher = Some(Prefetcher::spawn(store, ids));
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(player) = self.line_player.as_mut() {
            player.dispose();
        }
        if let Some(player) = self.word_player.as_mut() {
            player.dispose();
        }
        if let Some(prefetcher) = self.prefetcher.as_mut() {
            prefetcher.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Line;
    use anyhow::bail;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, VecDeque};
    use std::rc::Rc;

    fn line(id: &str, english: &str, gurmukhi: &str) -> Line {
        let mut text = BTreeMap::new();
        text.insert(ScriptId::English, english.to_string());
        text.insert(ScriptId::Gurmukhi, gurmukhi.to_string());
        Line {
            id: id.to_string(),
            section: None,
            text,
        }
    }

    fn corpus() -> Corpus {
        Corpus::new(vec![
            line("v1", "true name", "ਸਤਿ ਨਾਮੁ"),
            line("v2", "creative being", "ਕਰਤਾ ਪੁਰਖੁ"),
            line("v3", "without fear", "ਨਿਰਭਉ"),
        ])
    }

    fn config() -> AppConfig {
        AppConfig {
            primary_script: ScriptId::English,
            pace_wpm: 60,
            base_ms_per_token: 100,
            ..AppConfig::default()
        }
    }

    fn t(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[derive(Default)]
    struct FakeLineState {
        playing: Option<u64>,
        play_calls: usize,
        queued: VecDeque<LineEvent>,
        fail_next: bool,
    }

    #[derive(Clone, Default)]
    struct FakeLineHandle(Rc<RefCell<FakeLineState>>);

    impl FakeLineHandle {
        fn finish_audio(&self) {
            let mut state = self.0.borrow_mut();
            if let Some(generation) = state.playing.take() {
                state.queued.push_back(LineEvent::Ended { generation });
            }
        }

        fn is_playing(&self) -> bool {
            self.0.borrow().playing.is_some()
        }

        fn play_calls(&self) -> usize {
            self.0.borrow().play_calls
        }
    }

    struct FakeLinePlayer(FakeLineHandle);

    impl LinePlayer for FakeLinePlayer {
        fn play(&mut self, request: &LineRequest<'_>) -> anyhow::Result<()> {
            let mut state = self.0.0.borrow_mut();
            if state.fail_next {
                bail!("voice denied");
            }
            state.play_calls += 1;
            state.playing = Some(request.generation);
            state.queued.push_back(LineEvent::Started {
                generation: request.generation,
            });
            Ok(())
        }

        fn stop(&mut self) {
            let mut state = self.0.0.borrow_mut();
            if let Some(generation) = state.playing.take() {
                state.queued.push_back(LineEvent::Ended { generation });
            }
        }

        fn poll(&mut self) -> Option<LineEvent> {
            self.0.0.borrow_mut().queued.pop_front()
        }

        fn dispose(&mut self) {
            self.stop();
        }
    }

    #[derive(Default)]
    struct FakeWordState {
        playing: Option<u64>,
        start_calls: usize,
        queued: VecDeque<WordEvent>,
    }

    #[derive(Clone, Default)]
    struct FakeWordHandle(Rc<RefCell<FakeWordState>>);

    impl FakeWordHandle {
        fn emit_token_done(&self) {
            let mut state = self.0.borrow_mut();
            if let Some(generation) = state.playing {
                state.queued.push_back(WordEvent::TokenDone { generation });
            }
        }

        fn is_playing(&self) -> bool {
            self.0.borrow().playing.is_some()
        }
    }

    struct FakeWordPlayer(FakeWordHandle);

    impl WordPlayer for FakeWordPlayer {
        fn start(&mut self, _tokens: &[Token], _from: usize, generation: u64) -> anyhow::Result<()> {
            let mut state = self.0.0.borrow_mut();
            state.start_calls += 1;
            state.playing = Some(generation);
            Ok(())
        }

        fn pause(&mut self) {
            self.0.0.borrow_mut().playing = None;
        }

        fn stop(&mut self) {
            self.0.0.borrow_mut().playing = None;
        }

        fn poll(&mut self) -> Option<WordEvent> {
            self.0.0.borrow_mut().queued.pop_front()
        }

        fn dispose(&mut self) {
            self.stop();
        }
    }

    #[test]
    fn navigation_is_clamped() {
        let mut session = Session::new(corpus(), &config()).unwrap();
        session.open_line(999);
        assert_eq!(session.flow().line_index, 2);
        session.open_line(0);
        session.seek_word(999);
        assert_eq!(session.flow().word_index, 1);
        session.prev_line();
        assert_eq!(session.flow().line_index, 0);
    }

    #[test]
    fn starting_word_voice_stops_line_voice() {
        let line_handle = FakeLineHandle::default();
        let word_handle = FakeWordHandle::default();
        let mut session = Session::new(corpus(), &config())
            .unwrap()
            .with_line_player(Box::new(FakeLinePlayer(line_handle.clone())))
            .with_word_player(Box::new(FakeWordPlayer(word_handle.clone())));

        session.speak_current_line();
        assert!(line_handle.is_playing());
        assert!(!word_handle.is_playing());

        session.play();
        assert!(word_handle.is_playing());
        assert!(!line_handle.is_playing(), "both voices active at once");
    }

    #[test]
    fn stale_audio_events_cannot_mutate_the_new_position() {
        let base = Instant::now();
        let line_handle = FakeLineHandle::default();
        let mut session = Session::new(corpus(), &config())
            .unwrap()
            .with_line_player(Box::new(FakeLinePlayer(line_handle.clone())));

        session.speak_current_line();
        session.open_line(1);
        session.pause();
        session.drain_events();

        // The Ended queued by the seek's stop carries a superseded
        // generation; ticking must not complete or advance anything.
        session.tick(t(base, 10));
        assert_eq!(session.flow().line_index, 1);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn line_audio_end_advances_to_the_next_line() {
        let base = Instant::now();
        let line_handle = FakeLineHandle::default();
        let mut session = Session::new(corpus(), &config())
            .unwrap()
            .with_line_player(Box::new(FakeLinePlayer(line_handle.clone())));

        session.play();
        assert_eq!(line_handle.play_calls(), 1);
        line_handle.finish_audio();
        session.tick(t(base, 10));

        assert_eq!(session.flow().line_index, 1);
        assert_eq!(line_handle.play_calls(), 2, "next line audio should start");
        let events = session.drain_events();
        assert!(events.contains(&EngineEvent::LineCompleted { line_index: 0 }));
        assert!(events.contains(&EngineEvent::LineStarted { line_index: 1 }));
    }

    #[test]
    fn line_voice_failure_falls_back_to_silent_pacing() {
        let base = Instant::now();
        let line_handle = FakeLineHandle::default();
        line_handle.0.borrow_mut().fail_next = true;
        let mut session = Session::new(corpus(), &config())
            .unwrap()
            .with_line_player(Box::new(FakeLinePlayer(line_handle.clone())));

        session.play();
        let events = session.drain_events();
        assert!(events.contains(&EngineEvent::AudioUnavailable));
        assert!(session.flow().playing);

        // Pace still advances: 60 wpm = one token per second.
        session.tick(t(base, 0));
        session.tick(t(base, 1_000));
        assert_eq!(session.flow().word_index, 1);
    }

    #[test]
    fn word_voice_token_done_advances_the_cursor() {
        let base = Instant::now();
        let word_handle = FakeWordHandle::default();
        let mut session = Session::new(corpus(), &config())
            .unwrap()
            .with_word_player(Box::new(FakeWordPlayer(word_handle.clone())));

        session.play();
        session.tick(t(base, 10_000));
        assert_eq!(session.flow().word_index, 0, "paced schedule must be off");

        word_handle.emit_token_done();
        session.tick(t(base, 10_010));
        assert_eq!(session.flow().word_index, 1);
    }

    #[test]
    fn meaningful_secondary_group_holds_then_releases() {
        let base = Instant::now();
        let mut cfg = config();
        cfg.secondary_script = Some(ScriptId::Gurmukhi);
        // Line 2: english "without fear" (2 tokens), gurmukhi ਨਿਰਭਉ
        // (1 word, several clusters): group 0 of english has 1 token while
        // the aligned gurmukhi group is longer, so a hold must appear.
        let mut session = Session::new(corpus(), &cfg).unwrap();
        session.open_line(2);
        session.play();

        session.tick(t(base, 0));
        session.tick(t(base, 50));
        assert!(session.flow().hold_requested, "hold should be requested");

        // Gurmukhi group walks out within its dwell; hold releases well
        // before the watchdog bound.
        let mut released_at = None;
        for ms in (100..1_000).step_by(50) {
            session.tick(t(base, ms));
            if !session.flow().hold_requested {
                released_at = Some(ms);
                break;
            }
        }
        let released_at = released_at.expect("hold never released");
        assert!(released_at < 450, "watchdog beat the sync driver");
        let events = session.drain_events();
        assert!(!events.contains(&EngineEvent::HoldWatchdogFired));
    }

    #[test]
    fn clearing_secondary_script_disables_holds_mid_line() {
        let base = Instant::now();
        let mut cfg = config();
        cfg.secondary_script = Some(ScriptId::Gurmukhi);
        let mut session = Session::new(corpus(), &cfg).unwrap();
        session.open_line(2);
        session.play();
        session.tick(t(base, 0));
        session.tick(t(base, 50));
        assert!(session.flow().hold_requested);

        session.set_secondary_script(None);
        assert!(!session.flow().hold_requested);
        assert_eq!(session.sync().group_progress, 0.0);
        session.tick(t(base, 100));
        session.tick(t(base, 200));
        assert!(!session.flow().hold_requested);
        assert_eq!(session.sync().group_progress, 0.0);
    }

    #[test]
    fn reaching_the_end_emits_once_and_pins_sync() {
        let base = Instant::now();
        let mut cfg = config();
        cfg.secondary_script = Some(ScriptId::Gurmukhi);
        let mut session = Session::new(corpus(), &cfg).unwrap();
        session.open_line(2);
        session.play();
        session.drain_events();

        // "without fear" has two tokens at one per second; the first group
        // holds for the gurmukhi walk, then the paced cursor runs out.
        for ms in (0..=2_000).step_by(50) {
            session.tick(t(base, ms));
        }
        assert!(session.at_end());
        assert!(!session.flow().playing);
        assert!(!session.flow().hold_requested);

        let events = session.drain_events();
        assert!(events.contains(&EngineEvent::LineCompleted { line_index: 2 }));
        assert!(events.contains(&EngineEvent::ReachedEnd));

        session.tick(t(base, 3_000));
        session.tick(t(base, 4_000));
        assert!(session.drain_events().is_empty(), "end events repeated");
        assert!((session.sync().group_progress - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pause_during_hold_stays_paused_after_release() {
        let base = Instant::now();
        let mut cfg = config();
        cfg.secondary_script = Some(ScriptId::Gurmukhi);
        let mut session = Session::new(corpus(), &cfg).unwrap();
        session.open_line(2);
        session.play();
        session.tick(t(base, 0));
        session.tick(t(base, 50));
        assert!(session.flow().hold_requested);

        session.pause();
        assert!(!session.flow().playing);

        // The secondary walk completes and releases the hold; playback must
        // not resume on its own.
        for ms in (100..1_200).step_by(50) {
            session.tick(t(base, ms));
        }
        assert!(!session.flow().hold_requested);
        assert!(!session.flow().playing);
        assert_eq!(session.flow().word_index, 0);
    }
}
