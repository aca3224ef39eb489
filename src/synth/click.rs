use super::params::hit_gain;
use super::source::{SoundVariant, Voice};

/// Very short pitched tick, brighter on the downbeat
pub struct ClickVoice {
    phase: Option<usize>,
    sample_rate: f32,
    duration_samples: usize,
    osc_phase: f32,
    frequency: f32,
    gain: f32,
}

impl ClickVoice {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: None,
            sample_rate,
            duration_samples: (sample_rate * 0.03) as usize,
            osc_phase: 0.0,
            frequency: 1000.0,
            gain: 0.0,
        }
    }
}

impl Voice for ClickVoice {
    fn variant(&self) -> SoundVariant {
        SoundVariant::Click
    }

    fn trigger(&mut self, _beat_index: usize, accent: bool) {
        self.phase = Some(0);
        self.osc_phase = 0.0;
        self.frequency = if accent { 1500.0 } else { 1000.0 };
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
        // Squared-off sine gives the tick its edge
        let osc = ((self.osc_phase * std::f32::consts::TAU).sin() * 3.0).tanh();
        let amp = (-t * 250.0).exp();

        self.phase = Some(phase + 1);

        osc * amp * 0.7 * self.gain
    }
}
