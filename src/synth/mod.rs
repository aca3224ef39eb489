pub mod beep;
pub mod click;
pub mod cowbell;
pub mod drumset;
pub mod hihat;
pub mod kick;
pub mod params;
pub mod snare;
pub mod source;
pub mod woodblock;

pub use source::{create_voice, voice_bank, SoundVariant, Voice};
