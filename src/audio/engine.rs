use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::bus::{NoteBus, NoteEvent, NoteReceiver, NoteSender};
use super::{soft_clip, AudioBackend, AudioError, ScheduledNote, MASTER_GAIN};
use crate::synth::voice_bank;

/// Frame counter standing still this long counts as a stalled device
const STALL_TIMEOUT: Duration = Duration::from_secs(1);

/// Status published by the audio thread for the UI
#[derive(Clone, Debug, Default)]
pub struct EngineStatus {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub last_error: Option<String>,
}

/// Audio clock driven by the output callback's frame counter.
///
/// Once the stream reports an error or the counter stops moving for
/// [`STALL_TIMEOUT`], the clock switches to wall time, continuing from the
/// last audio time it returned, and stays there until [`StreamClock::restart`].
struct StreamClock {
    frames: Arc<AtomicU64>,
    failed: Arc<AtomicBool>,
    sample_rate: u32,
    state: Mutex<ClockState>,
}

struct ClockState {
    seen_frames: u64,
    seen_at: Instant,
    /// Audio time and wall time at the switch to the fallback
    fallback: Option<(f64, Instant)>,
}

impl StreamClock {
    fn new(frames: Arc<AtomicU64>, failed: Arc<AtomicBool>, sample_rate: u32) -> Self {
        let seen_frames = frames.load(Ordering::Acquire);
        Self {
            frames,
            failed,
            sample_rate: sample_rate.max(1),
            state: Mutex::new(ClockState {
                seen_frames,
                seen_at: Instant::now(),
                fallback: None,
            }),
        }
    }

    fn now(&self) -> f64 {
        self.now_at(Instant::now())
    }

    fn now_at(&self, wall: Instant) -> f64 {
        let frames = self.frames.load(Ordering::Acquire);
        let mut state = self.state.lock();

        if state.fallback.is_none() {
            if frames != state.seen_frames {
                state.seen_frames = frames;
                state.seen_at = wall;
            }
            let stalled = wall.saturating_duration_since(state.seen_at) >= STALL_TIMEOUT;
            if stalled || self.failed.load(Ordering::Acquire) {
                let time = state.seen_frames as f64 / self.sample_rate as f64;
                warn!(time, stalled, "audio clock lost, falling back to wall time");
                state.fallback = Some((time, wall));
            }
        }

        match state.fallback {
            Some((time, at)) => time + wall.saturating_duration_since(at).as_secs_f64(),
            None => frames as f64 / self.sample_rate as f64,
        }
    }

    /// Whether the frame counter still drives the clock
    fn is_live(&self) -> bool {
        self.state.lock().fallback.is_none() && !self.failed.load(Ordering::Acquire)
    }

    /// Go back to the frame counter after the stream was restarted
    fn restart(&self) {
        self.failed.store(false, Ordering::Release);
        let mut state = self.state.lock();
        state.seen_frames = self.frames.load(Ordering::Acquire);
        state.seen_at = Instant::now();
        state.fallback = None;
    }
}

/// Live output stream plus the clock it drives
struct OpenStream {
    stream: Stream,
    clock: StreamClock,
}

/// Audio engine managing the output stream.
///
/// The device is opened lazily by the first [`AudioBackend::resume`] and kept
/// for the life of the engine. Its audio clock is the number of frames the
/// output callback has rendered. Until a stream exists, or while it is failed
/// or stalled, the clock falls back to a monotonic wall clock so scheduling
/// keeps working without sound.
pub struct AudioEngine {
    output: Option<OpenStream>,
    bus: NoteBus,
    notes: NoteSender,
    frames: Arc<AtomicU64>,
    /// Set by the stream error callback
    failed: Arc<AtomicBool>,
    pub status: Arc<RwLock<EngineStatus>>,
    epoch: Instant,
}

impl AudioEngine {
    pub fn new() -> Self {
        let bus = NoteBus::new();
        let notes = bus.sender();
        Self {
            output: None,
            bus,
            notes,
            frames: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicBool::new(false)),
            status: Arc::new(RwLock::new(EngineStatus::default())),
            epoch: Instant::now(),
        }
    }

    /// Open the default output device and start its stream
    fn open(&mut self) -> Result<OpenStream, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let device_name = device.name().ok();

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::InitFailed(format!("Failed to get default config: {}", e)))?;
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        self.frames.store(0, Ordering::Release);
        self.failed.store(false, Ordering::Release);
        let note_rx = self.bus.receiver();

        let stream = match config.sample_format() {
            SampleFormat::F32 => self.build_stream::<f32>(&device, &config.into(), note_rx)?,
            SampleFormat::I16 => self.build_stream::<i16>(&device, &config.into(), note_rx)?,
            SampleFormat::U16 => self.build_stream::<u16>(&device, &config.into(), note_rx)?,
            format => {
                return Err(AudioError::InitFailed(format!(
                    "Unsupported sample format: {:?}",
                    format
                )))
            }
        };

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        info!(
            device = device_name.as_deref().unwrap_or("unknown"),
            sample_rate, channels, "audio output opened"
        );

        {
            let mut status = self.status.write();
            status.device = device_name;
            status.sample_rate = sample_rate;
            status.last_error = None;
        }

        Ok(OpenStream {
            stream,
            clock: StreamClock::new(Arc::clone(&self.frames), Arc::clone(&self.failed), sample_rate),
        })
    }

    /// Build the audio stream for a specific sample format
    fn build_stream<T>(
        &self,
        device: &Device,
        config: &StreamConfig,
        note_rx: NoteReceiver,
    ) -> Result<Stream, AudioError>
    where
        T: cpal::SizedSample + cpal::FromSample<f32>,
    {
        let sample_rate = config.sample_rate.0 as f32;
        let channels = config.channels as usize;

        // One voice per variant so switching sound never cuts a ringing hit
        let mut voices = voice_bank(sample_rate);
        let mut pending: VecDeque<NoteEvent> = VecDeque::with_capacity(256);
        let mut frame: u64 = 0;

        let frames = Arc::clone(&self.frames);
        let failed = Arc::clone(&self.failed);
        let error_state = Arc::clone(&self.status);

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // Notes usually arrive in time order, keep the queue sorted anyway
                    while let Some(note) = note_rx.try_recv() {
                        let pos = pending.partition_point(|n| n.frame <= note.frame);
                        pending.insert(pos, note);
                    }

                    for out in data.chunks_mut(channels) {
                        while pending.front().is_some_and(|n| n.frame <= frame) {
                            if let Some(note) = pending.pop_front() {
                                voices[note.variant.index()].trigger(note.beat_index, note.accent);
                            }
                        }

                        let mix: f32 = voices.iter_mut().map(|v| v.next_sample()).sum();
                        let sample = soft_clip(mix * MASTER_GAIN);
                        for channel_sample in out.iter_mut() {
                            *channel_sample = T::from_sample(sample);
                        }
                        frame += 1;
                    }

                    frames.store(frame, Ordering::Release);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    failed.store(true, Ordering::Release);
                    if let Some(mut status) = error_state.try_write() {
                        status.last_error = Some(err.to_string());
                    }
                },
                None,
            )
            .map_err(|e| AudioError::StreamFailed(format!("Failed to build stream: {}", e)))
    }
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for AudioEngine {
    fn resume(&mut self) -> Result<(), AudioError> {
        let result = match &self.output {
            Some(output) => output
                .stream
                .play()
                .map(|()| output.clock.restart())
                .map_err(|e| {
                    self.failed.store(true, Ordering::Release);
                    AudioError::StreamFailed(format!("Failed to resume stream: {}", e))
                }),
            None => self.open().map(|output| self.output = Some(output)),
        };

        if let Err(e) = &result {
            warn!("audio output unavailable: {}", e);
            self.status.write().last_error = Some(e.to_string());
        }
        result
    }

    fn now(&self) -> f64 {
        match &self.output {
            Some(output) => output.clock.now(),
            None => self.epoch.elapsed().as_secs_f64(),
        }
    }

    fn schedule_note(&mut self, note: ScheduledNote) -> Result<(), AudioError> {
        // A failed or stalled stream plays nothing until the next resume
        let Some(output) = self.output.as_ref().filter(|o| o.clock.is_live()) else {
            return Err(AudioError::NotRunning);
        };
        let frame = (note.time.max(0.0) * output.clock.sample_rate as f64).round() as u64;
        debug!(frame, beat = note.beat_index, "note queued");
        self.notes.send(NoteEvent {
            frame,
            variant: note.variant,
            beat_index: note.beat_index,
            accent: note.accent,
        })
    }
}
