pub mod metronome;
pub mod notify;
pub mod ramp;

pub use metronome::{
    Cursor, Metronome, LEAD_IN, LOOKAHEAD_INTERVAL, MAX_TEMPO, MIN_TEMPO, SCHEDULE_AHEAD,
};
pub use notify::{Beat, NotificationQueue};
pub use ramp::{Settings, TempoRamp};
