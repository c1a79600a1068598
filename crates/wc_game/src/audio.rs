//! Sound effects and the looping theme, played through rodio.
//!
//! Clips are read from disk once and decoded from memory on every play. Missing
//! files or a missing output device only cost a warning; the game runs silent.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::config::SoundPaths;
use crate::events::{FrameEvent, SoundCue};

#[derive(Debug, Clone)]
pub struct SoundClip {
    name: String,
    bytes: Arc<[u8]>,
}

impl SoundClip {
    pub fn load(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path)
            .map_err(|err| format!("failed to read sound '{}': {err}", path.display()))?;
        Ok(Self {
            name: path.display().to_string(),
            bytes: bytes.into(),
        })
    }

    fn decoder(&self) -> Option<Decoder<Cursor<Arc<[u8]>>>> {
        match Decoder::new(Cursor::new(self.bytes.clone())) {
            Ok(decoder) => Some(decoder),
            Err(err) => {
                log::warn!("Could not decode sound '{}': {err}", self.name);
                None
            }
        }
    }
}

/// Index of a clip loaded into an `AudioManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(usize);

pub struct AudioManager {
    stream: OutputStream,
    clips: Vec<SoundClip>,
    /// Sinks of looping sounds, kept so they can be stopped.
    looping: HashMap<SoundHandle, Sink>,
    cues: HashMap<SoundCue, SoundHandle>,
    theme: Option<SoundHandle>,
}

impl AudioManager {
    /// Opens the default output device and loads the game's sounds. `None` when
    /// there is no device.
    pub fn new(paths: &SoundPaths) -> Option<Self> {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(stream) => stream,
            Err(err) => {
                log::warn!("No audio output available: {err}");
                return None;
            }
        };
        let mut audio = Self {
            stream,
            clips: Vec::new(),
            looping: HashMap::new(),
            cues: HashMap::new(),
            theme: None,
        };

        for (cue, path) in [
            (SoundCue::Jump, &paths.jump),
            (SoundCue::Coin, &paths.coin),
            (SoundCue::Victory, &paths.victory),
        ] {
            if let Some(handle) = audio.load_sound(path) {
                audio.cues.insert(cue, handle);
            }
        }
        audio.theme = audio.load_sound(&paths.theme);
        log::info!(
            "Audio ready: {} cues, theme {}",
            audio.cues.len(),
            audio.theme.is_some()
        );
        Some(audio)
    }

    /// Reads a clip into memory. A missing file is logged and yields `None`.
    pub fn load_sound(&mut self, path: &Path) -> Option<SoundHandle> {
        match SoundClip::load(path) {
            Ok(clip) => {
                self.clips.push(clip);
                Some(SoundHandle(self.clips.len() - 1))
            }
            Err(err) => {
                log::warn!("{err}");
                None
            }
        }
    }

    /// One-shots are fire-and-forget. A looping sound replaces any earlier loop
    /// of the same handle.
    pub fn play(&mut self, handle: SoundHandle, looping: bool) {
        let Some(source) = self.clips.get(handle.0).and_then(SoundClip::decoder) else {
            return;
        };
        let sink = Sink::connect_new(self.stream.mixer());
        if looping {
            sink.append(source.repeat_infinite());
            if let Some(previous) = self.looping.insert(handle, sink) {
                previous.stop();
            }
        } else {
            sink.append(source);
            sink.detach();
        }
    }

    /// Stops a looping sound; one-shots run to completion.
    pub fn stop(&mut self, handle: SoundHandle) {
        if let Some(sink) = self.looping.remove(&handle) {
            sink.stop();
        }
    }

    /// Plays whatever audio a frame asked for; other events are ignored.
    pub fn handle(&mut self, event: &FrameEvent) {
        match event {
            FrameEvent::Sound(cue) => {
                if let Some(handle) = self.cues.get(cue).copied() {
                    self.play(handle, false);
                }
            }
            FrameEvent::StartMusic => {
                if let Some(theme) = self.theme {
                    self.play(theme, true);
                }
            }
            FrameEvent::StopMusic => {
                if let Some(theme) = self.theme {
                    self.stop(theme);
                }
            }
            _ => {}
        }
    }
}
