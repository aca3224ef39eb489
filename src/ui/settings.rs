use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::sequencer::{Settings, MAX_TEMPO};
use crate::synth::SoundVariant;
use crate::ui::Theme;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = MAX_TEMPO;
const MAX_BEATS_PER_BAR: u32 = 16;
const MAX_RAMP_AMOUNT: u32 = 50;
const MAX_RAMP_INTERVAL: u32 = 64;

/// Which field is selected in the settings panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsField {
    Tempo,
    BeatsPerBar,
    RampAmount,
    RampInterval,
    Ceiling,
    Sound,
}

impl SettingsField {
    pub const ALL: [SettingsField; 6] = [
        SettingsField::Tempo,
        SettingsField::BeatsPerBar,
        SettingsField::RampAmount,
        SettingsField::RampInterval,
        SettingsField::Ceiling,
        SettingsField::Sound,
    ];

    pub fn count() -> usize {
        Self::ALL.len()
    }

    pub fn from_index(i: usize) -> Self {
        Self::ALL[i % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        match self {
            SettingsField::Tempo => 0,
            SettingsField::BeatsPerBar => 1,
            SettingsField::RampAmount => 2,
            SettingsField::RampInterval => 3,
            SettingsField::Ceiling => 4,
            SettingsField::Sound => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Tempo => "Tempo",
            SettingsField::BeatsPerBar => "Beats / bar",
            SettingsField::RampAmount => "Increase by",
            SettingsField::RampInterval => "Every N bars",
            SettingsField::Ceiling => "Max tempo",
            SettingsField::Sound => "Sound",
        }
    }
}

/// State for the settings panel
pub struct SettingsState {
    pub selected_field: SettingsField,
}

impl SettingsState {
    pub fn new() -> Self {
        Self {
            selected_field: SettingsField::Tempo,
        }
    }

    pub fn move_field(&mut self, dy: i32) {
        let count = SettingsField::count() as i32;
        let idx = (self.selected_field.index() as i32 + dy).rem_euclid(count);
        self.selected_field = SettingsField::from_index(idx as usize);
    }
}

impl Default for SettingsState {
    fn default() -> Self {
        Self::new()
    }
}

fn step_u32(value: u32, delta: i32, min: u32, max: u32) -> u32 {
    (value as i64 + delta as i64).clamp(min as i64, max as i64) as u32
}

/// Apply one edit step to `field`. `coarse` multiplies the step.
///
/// Returns the edited settings and sound; the caller hands them to the
/// metronome as a whole.
pub fn adjust_field(
    settings: &Settings,
    variant: SoundVariant,
    field: SettingsField,
    direction: i32,
    coarse: bool,
) -> (Settings, SoundVariant) {
    let mut next = settings.clone();
    let mut sound = variant;
    let scale = if coarse { 10 } else { 1 };

    match field {
        SettingsField::Tempo => {
            next.tempo = (next.tempo + (direction * scale) as f64).clamp(MIN_BPM, MAX_BPM);
        }
        SettingsField::BeatsPerBar => {
            next.beats_per_bar = step_u32(next.beats_per_bar, direction, 1, MAX_BEATS_PER_BAR);
        }
        SettingsField::RampAmount => {
            next.ramp_amount = step_u32(next.ramp_amount, direction * scale, 0, MAX_RAMP_AMOUNT);
        }
        SettingsField::RampInterval => {
            next.ramp_interval_bars =
                step_u32(next.ramp_interval_bars, direction * scale, 1, MAX_RAMP_INTERVAL);
        }
        SettingsField::Ceiling => {
            next.tempo_ceiling =
                (next.tempo_ceiling + (direction * scale) as f64).clamp(MIN_BPM, MAX_BPM);
        }
        SettingsField::Sound => {
            sound = variant.cycle(direction);
        }
    }

    (next, sound)
}

fn field_value(settings: &Settings, variant: SoundVariant, field: SettingsField) -> String {
    match field {
        SettingsField::Tempo => format!("{:.0} BPM", settings.tempo),
        SettingsField::BeatsPerBar => settings.beats_per_bar.to_string(),
        SettingsField::RampAmount if settings.ramp_amount == 0 => "off".to_string(),
        SettingsField::RampAmount => format!("+{} BPM", settings.ramp_amount),
        SettingsField::RampInterval => format!("{} bars", settings.ramp_interval_bars),
        SettingsField::Ceiling => format!("{:.0} BPM", settings.tempo_ceiling),
        SettingsField::Sound => variant.display_name().to_string(),
    }
}

/// Render the settings panel
pub fn render_settings(
    frame: &mut Frame,
    area: Rect,
    settings: &Settings,
    variant: SoundVariant,
    state: &SettingsState,
    theme: &Theme,
) {
    let block = Block::default()
        .title(Span::styled(" Settings ", Style::default().fg(theme.label)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = SettingsField::ALL
        .iter()
        .map(|&field| {
            let selected = field == state.selected_field;
            let marker = if selected { "> " } else { "  " };
            let label_style = if selected {
                Style::default().fg(theme.highlight).bold()
            } else {
                Style::default().fg(theme.label)
            };
            let value_style = if selected {
                Style::default().fg(theme.highlight)
            } else {
                Style::default().fg(theme.fg)
            };
            Line::from(vec![
                Span::styled(format!("{}{:<14}", marker, field.label()), label_style),
                Span::styled(field_value(settings, variant, field), value_style),
            ])
        })
        .collect();

    let para = Paragraph::new(lines).style(Style::default().bg(theme.bg));
    frame.render_widget(para, inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_field_wraps() {
        let mut state = SettingsState::new();
        state.move_field(-1);
        assert_eq!(state.selected_field, SettingsField::Sound);
        state.move_field(1);
        assert_eq!(state.selected_field, SettingsField::Tempo);
        state.move_field(3);
        assert_eq!(state.selected_field, SettingsField::RampInterval);
    }

    #[test]
    fn test_field_index_roundtrip() {
        for (i, field) in SettingsField::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(SettingsField::from_index(i), *field);
        }
    }

    #[test]
    fn test_adjust_tempo_fine_and_coarse() {
        let settings = Settings::default();
        let (fine, _) = adjust_field(&settings, SoundVariant::Click, SettingsField::Tempo, 1, false);
        assert_eq!(fine.tempo, 81.0);
        let (coarse, _) = adjust_field(&settings, SoundVariant::Click, SettingsField::Tempo, -1, true);
        assert_eq!(coarse.tempo, 70.0);
        // Only the edited field changes
        assert_eq!(coarse.beats_per_bar, settings.beats_per_bar);
    }

    #[test]
    fn test_adjust_clamps_to_ranges() {
        let mut settings = Settings::default();
        settings.beats_per_bar = 1;
        settings.ramp_amount = 0;
        settings.tempo = MAX_BPM;

        let (s, _) = adjust_field(&settings, SoundVariant::Click, SettingsField::BeatsPerBar, -1, false);
        assert_eq!(s.beats_per_bar, 1);
        let (s, _) = adjust_field(&settings, SoundVariant::Click, SettingsField::RampAmount, -1, true);
        assert_eq!(s.ramp_amount, 0);
        let (s, _) = adjust_field(&settings, SoundVariant::Click, SettingsField::Tempo, 1, true);
        assert_eq!(s.tempo, MAX_BPM);
        let (s, _) = adjust_field(&settings, SoundVariant::Click, SettingsField::RampInterval, -1, true);
        assert_eq!(s.ramp_interval_bars, 1);
    }

    #[test]
    fn test_adjust_sound_cycles_variant() {
        let settings = Settings::default();
        let (s, sound) = adjust_field(&settings, SoundVariant::Click, SettingsField::Sound, 1, false);
        assert_eq!(s, settings);
        assert_eq!(sound, SoundVariant::Click.cycle(1));
        assert_ne!(sound, SoundVariant::Click);
    }

    #[test]
    fn test_field_value_formatting() {
        let mut settings = Settings::default();
        assert_eq!(field_value(&settings, SoundVariant::Click, SettingsField::Tempo), "80 BPM");
        assert_eq!(field_value(&settings, SoundVariant::Click, SettingsField::RampAmount), "+5 BPM");
        settings.ramp_amount = 0;
        assert_eq!(field_value(&settings, SoundVariant::Click, SettingsField::RampAmount), "off");
    }
}
