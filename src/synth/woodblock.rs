use super::params::{hit_gain, midi_to_freq};
use super::source::{SoundVariant, Voice};

/// Ratio of the inharmonic overtone to the fundamental
const OVERTONE_RATIO: f32 = 2.76;

/// Two-partial resonant knock
pub struct WoodblockVoice {
    phase: Option<usize>,
    sample_rate: f32,
    duration_samples: usize,
    fundamental_phase: f32,
    overtone_phase: f32,
    frequency: f32,
    gain: f32,
}

impl WoodblockVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: None,
            sample_rate,
            duration_samples: (sample_rate * 0.08) as usize,
            fundamental_phase: 0.0,
            overtone_phase: 0.0,
            frequency: midi_to_freq(79),
            gain: 0.0,
        }
    }
}

impl Voice for WoodblockVoice {
    fn variant(&self) -> SoundVariant {
        SoundVariant::Woodblock
    }

    fn trigger(&mut self, _beat_index: usize, accent: bool) {
        self.phase = Some(0);
        self.fundamental_phase = 0.0;
        self.overtone_phase = 0.0;
        // C6 on the downbeat, G5 otherwise
        self.frequency = midi_to_freq(if accent { 84 } else { 79 });
        self.gain = hit_gain(accent);
    }

    fn is_active(&self) -> bool {
        self.phase.is_some()
    }

    fn next_sample(&mut self) -> f32 {
        let Some(phase) = self.phase else {
            return 0.0;
        };

        if phase >= self.duration_samples {
            self.phase = None;
            return 0.0;
        }

        let t = phase as f32 / self.sample_rate;

        self.fundamental_phase += self.frequency / self.sample_rate;
        if self.fundamental_phase >= 1.0 {
            self.fundamental_phase -= 1.0;
        }
        self.overtone_phase += self.frequency * OVERTONE_RATIO / self.sample_rate;
        if self.overtone_phase >= 1.0 {
            self.overtone_phase -= 1.0;
        }

        let fundamental = (self.fundamental_phase * std::f32::consts::TAU).sin() * (-t * 60.0).exp();
        // Overtone dies away much faster than the body
        let overtone = (self.overtone_phase * std::f32::consts::TAU).sin() * (-t * 180.0).exp();

        self.phase = Some(phase + 1);

        (fundamental * 0.7 + overtone * 0.3) * 0.8 * self.gain
    }
}
