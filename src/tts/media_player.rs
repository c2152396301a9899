//! Line player over recorded per-line audio, played through rodio.

use super::{LineEvent, LinePlayer, LineRequest};
use crate::media::MediaStore;
use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, info, warn};

/// Plays the recorded audio for a line, resolved by stable id through the
/// media store. `Ended` is detected by sink drain during `poll`.
pub struct MediaLinePlayer {
    store: MediaStore,
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
    active_generation: Option<u64>,
    queued: VecDeque<LineEvent>,
    disposed: bool,
}

impl MediaLinePlayer {
    pub fn new(store: MediaStore) -> Self {
        Self {
            store,
            output: None,
            sink: None,
            active_generation: None,
            queued: VecDeque::new(),
            disposed: false,
        }
    }

    /// The audio device is opened on first use so sessions without any
    /// speech request never touch it.
    fn output_handle(&mut self) -> Result<&OutputStreamHandle> {
        if self.output.is_none() {
            let (stream, handle) =
                OutputStream::try_default().context("Opening audio output")?;
            self.output = Some((stream, handle));
        }
        match self.output.as_ref() {
            Some((_, handle)) => Ok(handle),
            None => anyhow::bail!("Audio output unavailable"),
        }
    }
}

impl LinePlayer for MediaLinePlayer {
    fn play(&mut self, request: &LineRequest<'_>) -> Result<()> {
        if self.disposed {
            anyhow::bail!("line player already disposed");
        }
        self.stop();

        let path = self.store.resolve(request.line_id)?;
        let reader = BufReader::new(
            File::open(&path).with_context(|| format!("Opening {}", path.display()))?,
        );
        let source = Decoder::new(reader).context("Decoding line audio")?;

        let handle = self.output_handle()?;
        let sink = Sink::try_new(handle).context("Creating sink")?;
        sink.append(source);
        sink.play();

        info!(
            line_id = %request.line_id,
            script = %request.script,
            generation = request.generation,
            "Playing line audio"
        );
        self.sink = Some(sink);
        self.active_generation = Some(request.generation);
        self.queued.push_back(LineEvent::Started {
            generation: request.generation,
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        if let Some(generation) = self.active_generation.take() {
            debug!(generation, "Stopped line audio");
            self.queued.push_back(LineEvent::Ended { generation });
        }
    }

    fn poll(&mut self) -> Option<LineEvent> {
        if let Some(event) = self.queued.pop_front() {
            return Some(event);
        }
        let drained = self.sink.as_ref().map(Sink::empty).unwrap_or(false);
        if drained {
            self.sink = None;
            let generation = self.active_generation.take()?;
            debug!(generation, "Line audio drained");
            return Some(LineEvent::Ended { generation });
        }
        None
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if self.sink.is_some() || self.active_generation.is_some() {
            warn!("Disposing line player with audio still active");
        }
        self.stop();
        self.queued.clear();
        self.output = None;
        self.disposed = true;
    }
}

impl Drop for MediaLinePlayer {
    fn drop(&mut self) {
        self.dispose();
    }
}
