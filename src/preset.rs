//! Preset files: a named snapshot of the metronome settings and sound.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::audio::AudioBackend;
use crate::sequencer::{Metronome, Settings, MAX_TEMPO};
use crate::synth::SoundVariant;

const DEFAULT_NAME: &str = "Untitled";

/// Preset error types
#[derive(Debug, Error)]
pub enum PresetError {
    #[error("Failed to access preset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse preset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Preset has no settings object")]
    MissingSettings,
    #[error("Invalid preset settings: {0}")]
    InvalidSettings(String),
}

/// Settings block as stored on disk
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresetSettings {
    start_bpm: f64,
    max_bpm: f64,
    increase_amount: u32,
    increase_interval_bars: u32,
    beats_per_bar: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sound_type: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct PresetFile {
    #[serde(default)]
    name: Option<String>,
    settings: PresetSettings,
}

/// A named set of metronome settings
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: String,
    pub settings: Settings,
    /// `None` keeps the current sound when applied
    pub sound: Option<SoundVariant>,
}

impl Preset {
    /// Snapshot settings and sound under `name`
    pub fn capture(name: impl Into<String>, settings: &Settings, variant: SoundVariant) -> Self {
        Self {
            name: name.into(),
            settings: settings.clone(),
            sound: Some(variant),
        }
    }

    /// Replace the metronome's settings (and sound, if the preset has one)
    pub fn apply<B: AudioBackend>(&self, metronome: &mut Metronome<B>) {
        metronome.set_settings(self.settings.clone());
        if let Some(variant) = self.sound {
            metronome.set_sound_variant(variant);
        }
    }

    /// Parse a preset from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self, PresetError> {
        let raw: Value = serde_json::from_str(json)?;
        if !raw.get("settings").is_some_and(Value::is_object) {
            return Err(PresetError::MissingSettings);
        }

        let file: PresetFile = serde_json::from_value(raw)?;
        Self::from_file(file)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(&self.to_file())?)
    }

    fn from_file(file: PresetFile) -> Result<Self, PresetError> {
        let s = file.settings;
        for (field, value) in [("startBpm", s.start_bpm), ("maxBpm", s.max_bpm)] {
            if !(value > 0.0 && value <= MAX_TEMPO) {
                return Err(PresetError::InvalidSettings(format!(
                    "{} must be in (0, {}], got {}",
                    field, MAX_TEMPO, value
                )));
            }
        }
        if s.beats_per_bar == 0 {
            return Err(PresetError::InvalidSettings(
                "beatsPerBar must be at least 1".to_string(),
            ));
        }

        let sound = match s.sound_type.as_deref() {
            None => None,
            Some(name) => Some(SoundVariant::from_name(name).ok_or_else(|| {
                PresetError::InvalidSettings(format!("unknown soundType '{}'", name))
            })?),
        };

        Ok(Self {
            name: file
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            settings: Settings {
                tempo: s.start_bpm,
                beats_per_bar: s.beats_per_bar,
                ramp_amount: s.increase_amount,
                ramp_interval_bars: s.increase_interval_bars,
                tempo_ceiling: s.max_bpm,
            },
            sound,
        })
    }

    fn to_file(&self) -> PresetFile {
        PresetFile {
            name: Some(self.name.clone()),
            settings: PresetSettings {
                start_bpm: self.settings.tempo,
                max_bpm: self.settings.tempo_ceiling,
                increase_amount: self.settings.ramp_amount,
                increase_interval_bars: self.settings.ramp_interval_bars,
                beats_per_bar: self.settings.beats_per_bar,
                sound_type: self.sound.map(|v| v.name().to_string()),
            },
        }
    }
}

/// Write a preset as pretty JSON
pub fn export_preset(path: &Path, preset: &Preset) -> Result<(), PresetError> {
    let json = preset.to_json_string()?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), name = %preset.name, "preset exported");
    Ok(())
}

/// Read and validate a preset file. Nothing is applied here.
pub fn import_preset(path: &Path) -> Result<Preset, PresetError> {
    let json = std::fs::read_to_string(path)?;
    let preset = Preset::from_json_str(&json)?;
    info!(path = %path.display(), name = %preset.name, "preset imported");
    Ok(preset)
}
