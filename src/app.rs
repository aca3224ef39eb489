use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use parking_lot::RwLock;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use tracing::{info, warn};

use crate::audio::{export_wav, AudioEngine, EngineStatus};
use crate::preset::{export_preset, import_preset, Preset};
use crate::sequencer::{Beat, Metronome, Settings};
use crate::synth::SoundVariant;
use crate::ui::{
    adjust_field, help_line_count, render_beats, render_help, render_ramp, render_settings,
    render_transport, HelpState, SettingsField, SettingsState, Theme, TransportInfo,
};

/// UI redraw period, also the longest the loop sleeps
const FRAME: Duration = Duration::from_millis(16);
/// Bars written by the in-app WAV export
const EXPORT_BARS: u64 = 8;
const DEFAULT_PRESET_FILE: &str = "speedtrainer-preset.json";
const EXPORT_FILE: &str = "speedtrainer.wav";

/// Metronome notifications forwarded to the UI loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    Beat(Beat),
    TempoChanged(f64),
}

/// Current UI view
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum View {
    Main,
    Help,
}

/// What the listener has heard since the last start
#[derive(Debug, Default)]
struct BeatTracker {
    last_beat: Option<usize>,
    bars: u64,
    /// Audio time of the first beat of the current run
    since: f64,
}

impl BeatTracker {
    /// Forget the previous run; beats sounding before `since` belong to it
    fn reset(&mut self, since: f64) {
        *self = Self {
            since,
            ..Self::default()
        };
    }

    fn on_beat(&mut self, beat: Beat) {
        // Notifications armed before a stop still fire after a quick restart
        if beat.time < self.since {
            return;
        }
        if beat.is_accent() && self.last_beat.is_some() {
            self.bars += 1;
        }
        self.last_beat = Some(beat.index);
    }
}

/// How long the event loop may block before the metronome needs it
fn poll_timeout(next_wakeup: Option<Instant>, now: Instant) -> Duration {
    match next_wakeup {
        Some(due) => due.saturating_duration_since(now).min(FRAME),
        None => FRAME,
    }
}

/// Application state
pub struct App {
    /// Current theme
    theme: Theme,
    /// Metronome driving the audio engine
    metronome: Metronome<AudioEngine>,
    /// Status published by the audio thread
    engine_status: Arc<RwLock<EngineStatus>>,
    /// Beat and tempo notifications from the metronome callbacks
    events: Receiver<UiEvent>,
    beats: BeatTracker,
    /// Tempo at the last start, left end of the ramp gauge
    start_tempo: f64,
    settings_state: SettingsState,
    help_state: HelpState,
    view: View,
    should_quit: bool,
    /// Preset file for save/load
    preset_path: PathBuf,
    /// Temporary status message (e.g., "Saved: warmup.json")
    status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        theme: Theme,
        settings: Settings,
        sound: SoundVariant,
        preset_path: Option<PathBuf>,
    ) -> Self {
        let engine = AudioEngine::new();
        let engine_status = engine.status.clone();

        let start_tempo = settings.tempo;
        let mut metronome = Metronome::new(engine, settings);
        metronome.set_sound_variant(sound);

        let (tx, events) = unbounded();
        let beat_tx = tx.clone();
        metronome.set_on_beat(move |beat| {
            let _ = beat_tx.send(UiEvent::Beat(beat));
        });
        metronome.set_on_tempo_change(move |tempo| {
            let _ = tx.send(UiEvent::TempoChanged(tempo));
        });

        Self {
            theme,
            metronome,
            engine_status,
            events,
            beats: BeatTracker::default(),
            start_tempo,
            settings_state: SettingsState::new(),
            help_state: HelpState::new(),
            view: View::Main,
            should_quit: false,
            preset_path: preset_path.unwrap_or_else(|| PathBuf::from(DEFAULT_PRESET_FILE)),
            status_message: None,
        }
    }

    /// Run the main application loop
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = Self::setup_terminal()?;

        let result = self.main_loop(&mut terminal);

        self.metronome.stop();

        Self::restore_terminal(&mut terminal)?;

        result
    }

    /// Setup the terminal for TUI
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Main event loop. Doubles as the metronome's host timer.
    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.metronome.run_due(Instant::now());
            self.drain_events();

            terminal.draw(|frame| self.render(frame))?;

            let timeout = poll_timeout(self.metronome.next_wakeup(), Instant::now());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    // Only handle key press events (not release)
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                UiEvent::Beat(beat) => self.beats.on_beat(beat),
                UiEvent::TempoChanged(tempo) => {
                    self.set_status(format!("Tempo up: {:.0} BPM", tempo));
                }
            }
        }
    }

    /// Set a temporary status message shown in the footer
    fn set_status(&mut self, msg: String) {
        self.status_message = Some((msg, Instant::now()));
    }

    /// Handle key press events
    fn handle_key(&mut self, key: KeyEvent) {
        // Global Ctrl keybindings (checked before view-specific)
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    self.save_preset_action();
                    return;
                }
                KeyCode::Char('o') => {
                    self.load_preset_action();
                    return;
                }
                KeyCode::Char('e') => {
                    self.export_action();
                    return;
                }
                KeyCode::Char('c') => {
                    self.should_quit = true;
                    return;
                }
                _ => {}
            }
        }

        match self.view {
            View::Main => self.handle_main_key(key.code),
            View::Help => self.handle_help_key(key.code),
        }
    }

    fn handle_main_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }

            KeyCode::Char('g') | KeyCode::Char('?') => {
                self.view = View::Help;
            }

            KeyCode::Char(' ') | KeyCode::Char('p') => self.toggle_transport(),

            // Tempo
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.edit(SettingsField::Tempo, 1, false);
            }
            KeyCode::Char('-') | KeyCode::Char('_') => {
                self.edit(SettingsField::Tempo, -1, false);
            }

            // Settings panel
            KeyCode::Up | KeyCode::Char('k') => self.settings_state.move_field(-1),
            KeyCode::Down | KeyCode::Char('j') => self.settings_state.move_field(1),
            KeyCode::Left | KeyCode::Char('h') => {
                self.edit(self.settings_state.selected_field, -1, false);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.edit(self.settings_state.selected_field, 1, false);
            }
            KeyCode::Char('[') => {
                self.edit(self.settings_state.selected_field, -1, true);
            }
            KeyCode::Char(']') => {
                self.edit(self.settings_state.selected_field, 1, true);
            }

            KeyCode::Char('v') => self.edit(SettingsField::Sound, 1, false),

            KeyCode::Char('t') => {
                self.theme = self.theme.next();
                self.set_status(format!("Theme: {}", self.theme.name));
            }

            _ => {}
        }
    }

    fn handle_help_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::Char('g') | KeyCode::Char('?') | KeyCode::Tab => {
                self.view = View::Main;
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char(' ') | KeyCode::Char('p') => self.toggle_transport(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.help_state.scroll_up();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let total = help_line_count(&self.theme);
                // Rough estimate of visible lines
                self.help_state.scroll_down(total, 10);
            }
            _ => {}
        }
    }

    fn toggle_transport(&mut self) {
        if self.metronome.is_running() {
            self.metronome.stop();
        } else {
            self.start_tempo = self.metronome.tempo();
            self.metronome.start(Instant::now());
            let since = self.metronome.position().map_or(0.0, |c| c.next_event_time);
            self.beats.reset(since);
        }
    }

    /// Edit one setting and hand the full settings to the metronome
    fn edit(&mut self, field: SettingsField, direction: i32, coarse: bool) {
        let (settings, sound) = adjust_field(
            self.metronome.settings(),
            self.metronome.sound_variant(),
            field,
            direction,
            coarse,
        );
        self.metronome.set_settings(settings);
        self.metronome.set_sound_variant(sound);
    }

    fn preset_file_name(&self) -> String {
        self.preset_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    fn save_preset_action(&mut self) {
        let name = self
            .preset_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Untitled".to_string());
        let preset = Preset::capture(
            name,
            self.metronome.settings(),
            self.metronome.sound_variant(),
        );
        match export_preset(&self.preset_path, &preset) {
            Ok(()) => {
                self.set_status(format!("Saved: {}", self.preset_file_name()));
            }
            Err(e) => {
                warn!("preset save failed: {}", e);
                self.set_status(format!("Save failed: {}", e));
            }
        }
    }

    fn load_preset_action(&mut self) {
        match import_preset(&self.preset_path) {
            Ok(preset) => {
                preset.apply(&mut self.metronome);
                self.set_status(format!(
                    "Loaded: {} ({})",
                    preset.name,
                    self.preset_file_name()
                ));
            }
            Err(e) => {
                warn!("preset load failed: {}", e);
                self.set_status(format!("Load failed: {}", e));
            }
        }
    }

    fn export_action(&mut self) {
        let path = PathBuf::from(EXPORT_FILE);
        match export_wav(
            self.metronome.settings(),
            self.metronome.sound_variant(),
            EXPORT_BARS,
            &path,
        ) {
            Ok(result) => {
                info!(beats = result.beats, "exported {}", EXPORT_FILE);
                self.set_status(format!(
                    "Exported: {} ({:.1}s, ends at {:.0} BPM)",
                    EXPORT_FILE, result.duration_secs, result.final_tempo
                ));
            }
            Err(e) => {
                warn!("export failed: {:#}", e);
                self.set_status(format!("Export failed: {}", e));
            }
        }
    }

    fn transport_info(&self) -> TransportInfo {
        let settings = self.metronome.settings();
        let playing = self.metronome.is_running();
        TransportInfo {
            playing,
            tempo: settings.tempo,
            start_tempo: if playing { self.start_tempo } else { settings.tempo },
            tempo_ceiling: settings.tempo_ceiling,
            beats_per_bar: settings.beats_per_bar,
            current_beat: self.beats.last_beat,
            bars: self.beats.bars,
            sound: self.metronome.sound_variant(),
            device: {
                let status = self.engine_status.read();
                status
                    .device
                    .as_ref()
                    .map(|name| format!("{} @ {} Hz", name, status.sample_rate))
            },
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Clear with background color
        let bg_block = Block::default().style(Style::default().bg(self.theme.bg));
        frame.render_widget(bg_block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Transport
                Constraint::Length(5), // Beat cells
                Constraint::Length(3), // Ramp gauge
                Constraint::Min(8),    // Settings or help
                Constraint::Length(3), // Footer
            ])
            .split(area);

        let info = self.transport_info();

        self.render_header(frame, chunks[0]);
        render_transport(frame, chunks[1], &info, &self.theme);
        render_beats(frame, chunks[2], &info, &self.theme);
        render_ramp(frame, chunks[3], &info, &self.theme);

        match self.view {
            View::Main => render_settings(
                frame,
                chunks[4],
                self.metronome.settings(),
                self.metronome.sound_variant(),
                &self.settings_state,
                &self.theme,
            ),
            View::Help => render_help(frame, chunks[4], &self.help_state, &self.theme),
        }

        self.render_footer(frame, chunks[5]);
    }

    /// Render the header
    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let view_indicator = match self.view {
            View::Main => "",
            View::Help => "[HELP]",
        };
        let title = format!(
            " SPEEDTRAINER v{} {} ",
            env!("CARGO_PKG_VERSION"),
            view_indicator
        );
        let header = Paragraph::new(title)
            .style(
                Style::default()
                    .fg(self.theme.highlight)
                    .bg(self.theme.bg)
                    .bold(),
            )
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .style(Style::default().bg(self.theme.bg)),
            );
        frame.render_widget(header, area);
    }

    /// Render the footer with help, status message or audio error
    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let audio_error = self.engine_status.read().last_error.clone();

        // Show status message if recent (within 3 seconds)
        let (text, color) = match (&self.status_message, audio_error) {
            (Some((msg, instant)), _) if instant.elapsed().as_secs() < 3 => {
                (msg.clone(), self.theme.dimmed)
            }
            (_, Some(err)) => (format!("Audio: {}", err), self.theme.error),
            _ => (self.footer_help(), self.theme.dimmed),
        };

        let footer = Paragraph::new(text)
            .style(Style::default().fg(color).bg(self.theme.bg))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.border))
                    .style(Style::default().bg(self.theme.bg)),
            );
        frame.render_widget(footer, area);
    }

    fn footer_help(&self) -> String {
        match self.view {
            View::Main => format!(
                "SPACE:Start/Stop | +/-:Tempo | Up/Down:Field | Left/Right:Adjust | V:Sound | C-s:Save | C-o:Load | G:Help | Q:Quit | {}",
                self.theme.name
            ),
            View::Help => format!(
                "Up/Down:Scroll | G/Esc:Back | Q:Quit | {}",
                self.theme.name
            ),
        }
    }
}
