use super::params::{hit_gain, midi_to_freq};
use super::source::{SoundVariant, Voice};

/// Accented downbeat pitch: A5
const ACCENT_NOTE: u8 = 81;
/// Other beats: A4
const BEAT_NOTE: u8 = 69;

/// Plain sine beep, an octave higher on the downbeat
pub struct BeepVoice {
    phase: Option<usize>,
    sample_rate: f32,
    duration_samples: usize,
    osc_phase: f32,
    frequency: f32,
    gain: f32,
}

impl BeepVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: None,
            sample_rate,
            duration_samples: (sample_rate * 0.08) as usize,
            osc_phase: 0.0,
            frequency: midi_to_freq(BEAT_NOTE),
            gain: 0.0,
        }
    }
}

impl Voice for BeepVoice {
    fn variant(&self) -> SoundVariant {
        SoundVariant::Beep
    }

    fn trigger(&mut self, _beat_index: usize, accent: bool) {
        self.phase = Some(0);
        self.osc_phase = 0.0;
        self.frequency = midi_to_freq(if accent { ACCENT_NOTE } else { BEAT_NOTE });
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

        self.osc_phase += self.frequency / self.sample_rate;
        if self.osc_phase >= 1.0 {
            self.osc_phase -= 1.0;
        }
        let osc = (self.osc_phase * std::f32::consts::TAU).sin();

        // 2ms linear attack avoids a pop, then exponential decay
        let attack = (t / 0.002).min(1.0);
        let amp = attack * (-t * 40.0).exp();

        self.phase = Some(phase + 1);

        osc * amp * 0.6 * self.gain
    }
}
