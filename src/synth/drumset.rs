use super::hihat::HiHatSynth;
use super::kick::KickSynth;
use super::params::{hit_gain, HiHatParams, KickParams, SnareParams};
use super::snare::SnareSynth;
use super::source::{SoundVariant, Voice};

/// Kick, snare and hi-hat playing a backbeat across the bar.
///
/// Even beats get the kick, odd beats the snare, every beat a hi-hat. The
/// downbeat kick is accented and its hi-hat opens up.
pub struct DrumsetVoice {
    kick: KickSynth,
    snare: SnareSynth,
    hihat: HiHatSynth,
}

impl DrumsetVoice {
    pub fn new(sample_rate: f32) -> Self {
        let mut kick = KickSynth::new(sample_rate);
        kick.set_params(KickParams {
            amp_decay: 14.0,
            drive: 0.2,
            ..KickParams::default()
        });
        let mut snare = SnareSynth::new(sample_rate);
        snare.set_params(SnareParams {
            snappy: 0.8,
            ..SnareParams::default()
        });
        let mut hihat = HiHatSynth::new(sample_rate);
        hihat.set_params(HiHatParams {
            tone: 0.7,
            ..HiHatParams::default()
        });
        Self { kick, snare, hihat }
    }
}

impl Voice for DrumsetVoice {
    fn variant(&self) -> SoundVariant {
        SoundVariant::Drumset
    }

    fn trigger(&mut self, beat_index: usize, accent: bool) {
        if beat_index % 2 == 0 {
            self.kick.hit(accent);
        } else {
            self.snare.hit(accent);
        }
        let open = if accent { 0.4 } else { 0.0 };
        self.hihat.trigger(hit_gain(accent), open);
    }

    fn is_active(&self) -> bool {
        self.kick.is_active() || self.snare.is_active() || self.hihat.is_active()
    }

    fn next_sample(&mut self) -> f32 {
        self.kick.next_sample() + self.snare.next_sample() + self.hihat.next_sample()
    }
}
