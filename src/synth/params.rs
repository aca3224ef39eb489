/// Convert MIDI note number to frequency in Hz
/// A4 (69) = 440 Hz
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * 2.0f32.powf((note as f32 - 69.0) / 12.0)
}

/// Output gain of an accented downbeat
pub const ACCENT_GAIN: f32 = 1.0;
/// Output gain of every other beat
pub const BEAT_GAIN: f32 = 0.6;

/// Gain for a hit
pub fn hit_gain(accent: bool) -> f32 {
    if accent {
        ACCENT_GAIN
    } else {
        BEAT_GAIN
    }
}

/// Kick drum parameters
#[derive(Clone, Debug)]
pub struct KickParams {
    pub pitch_start: f32, // 80-250 Hz, default 150
    pub pitch_end: f32,   // 30-80 Hz, default 50
    pub pitch_decay: f32, // 4-20, default 8 (how fast pitch drops)
    pub amp_decay: f32,   // 5-20, default 10 (overall decay time)
    pub click: f32,       // 0-1, default 0.3 (attack click amount)
    pub drive: f32,       // 0-1, default 0 (saturation)
}

impl Default for KickParams {
    fn default() -> Self {
        Self {
            pitch_start: 150.0,
            pitch_end: 50.0,
            pitch_decay: 8.0,
            amp_decay: 10.0,
            click: 0.3,
            drive: 0.0,
        }
    }
}

/// Snare drum parameters
#[derive(Clone, Debug)]
pub struct SnareParams {
    pub tone_freq: f32,   // 120-300 Hz, default 180
    pub tone_decay: f32,  // 10-40, default 20
    pub noise_decay: f32, // 8-30, default 15
    pub tone_mix: f32,    // 0-1, default 0.4 (tone vs noise balance)
    pub snappy: f32,      // 0-1, default 0.6 (high freq emphasis)
}

impl Default for SnareParams {
    fn default() -> Self {
        Self {
            tone_freq: 180.0,
            tone_decay: 20.0,
            noise_decay: 15.0,
            tone_mix: 0.4,
            snappy: 0.6,
        }
    }
}

/// Hi-hat parameters
#[derive(Clone, Debug)]
pub struct HiHatParams {
    pub decay: f32, // 20-100, default 40 (envelope decay)
    pub tone: f32,  // 0-1, default 0.5 (filter brightness)
    pub open: f32,  // 0-1, default 0 (0=closed/short, 1=open/long)
}

impl Default for HiHatParams {
    fn default() -> Self {
        Self {
            decay: 40.0,
            tone: 0.5,
            open: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_freq() {
        assert!((midi_to_freq(69) - 440.0).abs() < 0.01);
        assert!((midi_to_freq(81) - 880.0).abs() < 0.01);
        assert!((midi_to_freq(57) - 220.0).abs() < 0.01);
    }

    #[test]
    fn test_accent_gain_is_louder() {
        assert!(hit_gain(true) > hit_gain(false));
    }
}
