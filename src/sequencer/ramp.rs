/// Metronome settings, replaced as a whole by the front-end
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Tempo in BPM
    pub tempo: f64,
    /// Beats in one bar (accent cycle length)
    pub beats_per_bar: u32,
    /// BPM added per ramp step, 0 disables ramping
    pub ramp_amount: u32,
    /// Completed bars between ramp steps
    pub ramp_interval_bars: u32,
    /// Tempo never ramps above this
    pub tempo_ceiling: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tempo: 80.0,
            beats_per_bar: 4,
            ramp_amount: 5,
            ramp_interval_bars: 4,
            tempo_ceiling: 160.0,
        }
    }
}

/// Speed-trainer rule: decides after each completed bar whether tempo steps up
pub struct TempoRamp;

impl TempoRamp {
    /// Returns the new tempo if a step fires after `bar_count` completed bars.
    ///
    /// The clamp is applied after the increase, so a tempo already above the
    /// ceiling is pulled down to it on the next step.
    pub fn on_bar_completed(current: f64, bar_count: u64, settings: &Settings) -> Option<f64> {
        if settings.ramp_amount == 0 || settings.ramp_interval_bars == 0 {
            return None;
        }
        if bar_count % settings.ramp_interval_bars as u64 != 0 {
            return None;
        }

        let candidate = (current + settings.ramp_amount as f64).min(settings.tempo_ceiling);
        if candidate != current {
            Some(candidate)
        } else {
            None
        }
    }
}
