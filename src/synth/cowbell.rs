use super::params::hit_gain;
use super::source::{SoundVariant, Voice};

/// Classic drum-machine cowbell pair of square oscillators (Hz)
const LOW_FREQ: f32 = 540.0;
const HIGH_FREQ: f32 = 800.0;

/// Two detuned squares through a two-stage decay
pub struct CowbellVoice {
    phase: Option<usize>,
    sample_rate: f32,
    duration_samples: usize,
    low_phase: f32,
    high_phase: f32,
    /// Pitch multiplier for the current hit
    pitch: f32,
    gain: f32,
}

impl CowbellVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: None,
            sample_rate,
            duration_samples: (sample_rate * 0.3) as usize,
            low_phase: 0.0,
            high_phase: 0.0,
            pitch: 1.0,
            gain: 0.0,
        }
    }

    fn square(phase: f32) -> f32 {
        if phase < 0.5 {
            1.0
        } else {
            -1.0
        }
    }
}

impl Voice for CowbellVoice {
    fn variant(&self) -> SoundVariant {
        SoundVariant::Cowbell
    }

    fn trigger(&mut self, _beat_index: usize, accent: bool) {
        self.phase = Some(0);
        self.low_phase = 0.0;
        self.high_phase = 0.0;
        // A whole tone up on the downbeat
        self.pitch = if accent { 1.122 } else { 1.0 };
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

        self.low_phase += LOW_FREQ * self.pitch / self.sample_rate;
        if self.low_phase >= 1.0 {
            self.low_phase -= 1.0;
        }
        self.high_phase += HIGH_FREQ * self.pitch / self.sample_rate;
        if self.high_phase >= 1.0 {
            self.high_phase -= 1.0;
        }

        let osc = (Self::square(self.low_phase) + Self::square(self.high_phase)) * 0.5;

        // Sharp strike followed by a longer ring
        let amp = 0.6 * (-t * 60.0).exp() + 0.4 * (-t * 12.0).exp();

        self.phase = Some(phase + 1);

        osc * amp * 0.35 * self.gain
    }
}
