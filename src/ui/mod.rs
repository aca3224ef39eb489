pub mod help;
pub mod settings;
pub mod theme;
pub mod transport;

pub use help::{help_line_count, render_help, HelpState};
pub use settings::{adjust_field, render_settings, SettingsField, SettingsState};
pub use theme::Theme;
pub use transport::{render_beats, render_ramp, render_transport, TransportInfo};
