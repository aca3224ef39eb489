use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::info;

use super::{soft_clip, AudioBackend, AudioError, ScheduledNote, MASTER_GAIN};
use crate::sequencer::{Metronome, Settings, LOOKAHEAD_INTERVAL};
use crate::synth::{voice_bank, SoundVariant};

const SAMPLE_RATE: f32 = 44100.0;
const TAIL_SECONDS: f32 = 1.0;

/// Result of an export operation
pub struct ExportResult {
    pub duration_secs: f32,
    pub samples: usize,
    /// Beats written to the file
    pub beats: usize,
    /// Tempo reached after the last rendered bar
    pub final_tempo: f64,
}

/// Backend with a virtual clock that records every note it is handed
#[derive(Default)]
struct OfflineBackend {
    now: f64,
    notes: Vec<ScheduledNote>,
}

impl AudioBackend for OfflineBackend {
    fn resume(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn schedule_note(&mut self, note: ScheduledNote) -> Result<(), AudioError> {
        self.notes.push(note);
        Ok(())
    }
}

/// Run the metronome on a virtual clock until `bars` bars are scheduled.
///
/// The scheduler is polled at its regular interval exactly as in live
/// playback, so ramps land on the same beats.
fn schedule_bars(
    settings: &Settings,
    variant: SoundVariant,
    bars: u64,
) -> (Vec<ScheduledNote>, f64) {
    let mut metronome = Metronome::new(OfflineBackend::default(), settings.clone());
    metronome.set_sound_variant(variant);

    let base = Instant::now();
    let mut elapsed = Duration::ZERO;
    metronome.start(base);
    while metronome.position().map_or(0, |c| c.bar_count) < bars {
        metronome.backend_mut().now = elapsed.as_secs_f64();
        metronome.run_due(base + elapsed);
        elapsed += LOOKAHEAD_INTERVAL;
    }
    metronome.stop();

    // The last poll may reach into the bar after the final one
    let beats_per_bar = settings.beats_per_bar.max(1) as usize;
    let tempo = metronome.tempo();
    let mut notes = std::mem::take(&mut metronome.backend_mut().notes);
    notes.truncate(bars as usize * beats_per_bar);
    (notes, tempo)
}

/// Synthesize scheduled notes into stereo frames, plus a decay tail
fn render_notes(notes: &[ScheduledNote]) -> Vec<(f32, f32)> {
    let mut voices = voice_bank(SAMPLE_RATE);

    let mut events: Vec<(u64, &ScheduledNote)> = notes
        .iter()
        .map(|n| ((n.time.max(0.0) * SAMPLE_RATE as f64).round() as u64, n))
        .collect();
    events.sort_by_key(|(frame, _)| *frame);

    let content_samples = events.last().map_or(0, |(frame, _)| *frame as usize);
    let total_samples = content_samples + (SAMPLE_RATE * TAIL_SECONDS) as usize;

    let mut output = Vec::with_capacity(total_samples);
    let mut next = 0;
    for frame in 0..total_samples as u64 {
        while let Some((_, note)) = events.get(next).filter(|(f, _)| *f <= frame) {
            voices[note.variant.index()].trigger(note.beat_index, note.accent);
            next += 1;
        }

        let mix: f32 = voices.iter_mut().map(|v| v.next_sample()).sum();
        let sample = soft_clip(mix * MASTER_GAIN);
        output.push((sample, sample));
    }

    output
}

/// Render `bars` bars of the metronome and export them as a WAV file
pub fn export_wav(
    settings: &Settings,
    variant: SoundVariant,
    bars: u64,
    path: &Path,
) -> Result<ExportResult> {
    if bars == 0 {
        bail!("Nothing to render: bar count must be at least 1");
    }

    let (notes, final_tempo) = schedule_bars(settings, variant, bars);
    let samples = render_notes(&notes);

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for (left, right) in &samples {
        let l = (*left * 32767.0).clamp(-32768.0, 32767.0) as i16;
        let r = (*right * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer.write_sample(l)?;
        writer.write_sample(r)?;
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {}", path.display()))?;

    let duration_secs = samples.len() as f32 / SAMPLE_RATE;
    info!(
        path = %path.display(),
        bars,
        beats = notes.len(),
        duration_secs,
        "rendered metronome to WAV"
    );

    Ok(ExportResult {
        duration_secs,
        samples: samples.len(),
        beats: notes.len(),
        final_tempo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::LEAD_IN;

    fn settings(tempo: f64, beats_per_bar: u32, ramp_amount: u32, interval: u32) -> Settings {
        Settings {
            tempo,
            beats_per_bar,
            ramp_amount,
            ramp_interval_bars: interval,
            tempo_ceiling: 200.0,
        }
    }

    #[test]
    fn test_schedule_bars_emits_whole_bars() {
        let (notes, tempo) = schedule_bars(&settings(120.0, 3, 0, 1), SoundVariant::Beep, 4);
        assert_eq!(notes.len(), 12);
        assert_eq!(tempo, 120.0);
        assert!((notes[0].time - LEAD_IN).abs() < 1e-9);
        let accents: Vec<bool> = notes.iter().map(|n| n.accent).collect();
        assert_eq!(accents.iter().filter(|&&a| a).count(), 4);
        assert!(notes.iter().all(|n| n.variant == SoundVariant::Beep));
    }

    #[test]
    fn test_schedule_bars_follows_ramp() {
        let (notes, tempo) = schedule_bars(&settings(60.0, 2, 60, 1), SoundVariant::Click, 2);
        assert_eq!(notes.len(), 4);
        assert_eq!(tempo, 180.0);
        // Second bar runs at 120 BPM
        assert!((notes[3].time - notes[2].time - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_render_places_first_hit_after_lead_in() {
        let (notes, _) = schedule_bars(&settings(120.0, 4, 0, 1), SoundVariant::Woodblock, 1);
        let frames = render_notes(&notes);

        let first_hit = (LEAD_IN * SAMPLE_RATE as f64) as usize;
        assert!(frames[..first_hit - 10].iter().all(|&(l, _)| l == 0.0));
        assert!(frames[first_hit..first_hit + 500]
            .iter()
            .any(|&(l, _)| l.abs() > 0.01));
        assert!(frames.iter().all(|&(l, r)| l == r && l.abs() <= 1.0));
    }

    #[test]
    fn test_export_wav_writes_stereo_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("click.wav");

        let result = export_wav(&settings(120.0, 4, 0, 1), SoundVariant::Click, 2, &path).unwrap();
        assert_eq!(result.beats, 8);
        // Last beat at 0.1 + 7 * 0.5, then the tail
        assert!((result.duration_secs - (3.6 + TAIL_SECONDS)).abs() < 0.01);

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 44100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.duration() as usize, result.samples);
    }

    #[test]
    fn test_export_wav_rejects_zero_bars() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        assert!(export_wav(&Settings::default(), SoundVariant::Click, 0, &path).is_err());
        assert!(!path.exists());
    }
}
