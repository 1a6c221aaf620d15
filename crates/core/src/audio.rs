//! Audio sink capability
//!
//! The simulation fires named cues into an injected [`AudioSink`]. Delivery is best effort
//! and nothing flows back.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::AudioCue;

pub trait AudioSink: Send {
    fn play(&mut self, cue: AudioCue);

    /// Volumes arrive already clamped to [0, 1]
    fn set_volumes(&mut self, _music: f32, _sfx: f32) {}

    fn place(&mut self) {
        self.play(AudioCue::Place);
    }

    /// `chained` selects the chain variant of the clear sound
    fn clear(&mut self, chained: bool) {
        self.play(if chained {
            AudioCue::ClearChain
        } else {
            AudioCue::Clear
        });
    }

    fn rise(&mut self) {
        self.play(AudioCue::Rise);
    }

    fn chain(&mut self) {
        self.play(AudioCue::Chain);
    }

    fn pause(&mut self) {
        self.play(AudioCue::Pause);
    }
}

/// Discards every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: AudioCue) {}
}

/// Logs cues at trace level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play(&mut self, cue: AudioCue) {
        tracing::trace!(cue = cue.as_str(), "audio cue");
    }

    fn set_volumes(&mut self, music: f32, sfx: f32) {
        tracing::trace!(music, sfx, "audio volumes");
    }
}

/// Records cues into a shared log; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    cues: Arc<Mutex<Vec<AudioCue>>>,
    volumes: Arc<Mutex<Option<(f32, f32)>>>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.cues.lock().clone()
    }

    /// Drain the recorded cues
    pub fn take(&self) -> Vec<AudioCue> {
        std::mem::take(&mut *self.cues.lock())
    }

    pub fn last_volumes(&self) -> Option<(f32, f32)> {
        *self.volumes.lock()
    }
}

impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        self.cues.lock().push(cue);
    }

    fn set_volumes(&mut self, music: f32, sfx: f32) {
        *self.volumes.lock() = Some((music, sfx));
    }
}
