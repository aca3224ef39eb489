use serde::{Deserialize, Serialize};

use super::beep::BeepVoice;
use super::click::ClickVoice;
use super::cowbell::CowbellVoice;
use super::drumset::DrumsetVoice;
use super::kick::KickSynth;
use super::snare::SnareSynth;
use super::woodblock::WoodblockVoice;

/// Selectable click timbre
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundVariant {
    Beep,
    #[default]
    Click,
    Woodblock,
    Cowbell,
    Kick,
    Snare,
    Drumset,
}

impl SoundVariant {
    pub const ALL: [SoundVariant; 7] = [
        SoundVariant::Beep,
        SoundVariant::Click,
        SoundVariant::Woodblock,
        SoundVariant::Cowbell,
        SoundVariant::Kick,
        SoundVariant::Snare,
        SoundVariant::Drumset,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SoundVariant::Beep => "beep",
            SoundVariant::Click => "click",
            SoundVariant::Woodblock => "woodblock",
            SoundVariant::Cowbell => "cowbell",
            SoundVariant::Kick => "kick",
            SoundVariant::Snare => "snare",
            SoundVariant::Drumset => "drumset",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SoundVariant::Beep => "BEEP",
            SoundVariant::Click => "CLICK",
            SoundVariant::Woodblock => "WOODBLOCK",
            SoundVariant::Cowbell => "COWBELL",
            SoundVariant::Kick => "KICK",
            SoundVariant::Snare => "SNARE",
            SoundVariant::Drumset => "DRUMSET",
        }
    }

    pub fn from_name(name: &str) -> Option<SoundVariant> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    /// Position in [`SoundVariant::ALL`], used to index per-variant voice banks
    pub fn index(&self) -> usize {
        match self {
            SoundVariant::Beep => 0,
            SoundVariant::Click => 1,
            SoundVariant::Woodblock => 2,
            SoundVariant::Cowbell => 3,
            SoundVariant::Kick => 4,
            SoundVariant::Snare => 5,
            SoundVariant::Drumset => 6,
        }
    }

    /// Cycle through variants (wraps)
    pub fn cycle(&self, delta: i32) -> SoundVariant {
        let count = Self::ALL.len() as i32;
        let idx = (self.index() as i32 + delta).rem_euclid(count);
        Self::ALL[idx as usize]
    }
}

/// One click timbre.
/// Must be Send for use on the audio thread.
pub trait Voice: Send {
    /// The variant this voice renders
    fn variant(&self) -> SoundVariant;

    /// Start a new hit. `accent` marks the downbeat and must sound distinct.
    fn trigger(&mut self, beat_index: usize, accent: bool);

    /// Generate the next audio sample
    fn next_sample(&mut self) -> f32;

    /// Whether the voice is still sounding
    fn is_active(&self) -> bool;
}

/// Factory function: create the voice for a variant at the given sample rate
pub fn create_voice(variant: SoundVariant, sample_rate: f32) -> Box<dyn Voice> {
    match variant {
        SoundVariant::Beep => Box::new(BeepVoice::new(sample_rate)),
        SoundVariant::Click => Box::new(ClickVoice::new(sample_rate)),
        SoundVariant::Woodblock => Box::new(WoodblockVoice::new(sample_rate)),
        SoundVariant::Cowbell => Box::new(CowbellVoice::new(sample_rate)),
        SoundVariant::Kick => Box::new(KickSynth::new(sample_rate)),
        SoundVariant::Snare => Box::new(SnareSynth::new(sample_rate)),
        SoundVariant::Drumset => Box::new(DrumsetVoice::new(sample_rate)),
    }
}

/// One voice per variant, indexed by [`SoundVariant::index`]
pub fn voice_bank(sample_rate: f32) -> Vec<Box<dyn Voice>> {
    SoundVariant::ALL
        .iter()
        .map(|&variant| create_voice(variant, sample_rate))
        .collect()
}
