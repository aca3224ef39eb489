//! Audio side of the metronome.
//!
//! The scheduler only sees [`AudioBackend`]: a precise clock plus the
//! capability to play a note at an exact time on that clock. The cpal engine
//! and the offline WAV renderer are the two implementations.

pub mod bus;
pub mod engine;
pub mod render;

pub use engine::{AudioEngine, EngineStatus};
pub use render::{export_wav, ExportResult};

use thiserror::Error;

use crate::synth::SoundVariant;

/// A click the scheduler wants played at `time` on the audio clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub variant: SoundVariant,
    pub beat_index: usize,
    pub accent: bool,
    /// Audio-clock time in seconds
    pub time: f64,
}

/// Audio error types
#[derive(Debug, Clone, Error)]
pub enum AudioError {
    #[error("No audio output device available")]
    NoDevice,
    #[error("Audio initialization failed: {0}")]
    InitFailed(String),
    #[error("Audio stream failed: {0}")]
    StreamFailed(String),
    #[error("Audio output is not running")]
    NotRunning,
    #[error("Note buffer full, dropping note")]
    BusFull,
    #[error("Audio thread disconnected")]
    Disconnected,
}

/// Clock and note-emission capability the scheduler drives
pub trait AudioBackend {
    /// Acquire the output (first call) or resume it (later calls)
    fn resume(&mut self) -> Result<(), AudioError>;

    /// Current audio-clock time in seconds
    fn now(&self) -> f64;

    /// Queue a note to start exactly at `note.time`
    fn schedule_note(&mut self, note: ScheduledNote) -> Result<(), AudioError>;
}

/// Master gain applied before soft clipping
pub(crate) const MASTER_GAIN: f32 = 0.8;

/// Soft clipping function to prevent harsh digital clipping
pub(crate) fn soft_clip(x: f32) -> f32 {
    if x > 1.0 {
        1.0 - (-x + 1.0).exp() * 0.5
    } else if x < -1.0 {
        -1.0 + (x + 1.0).exp() * 0.5
    } else {
        x
    }
}
