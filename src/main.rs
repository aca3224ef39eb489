mod app;
mod audio;
mod preset;
mod sequencer;
mod synth;
mod trace;
mod ui;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::warn;

use app::App;
use audio::export_wav;
use preset::import_preset;
use sequencer::{Settings, MAX_TEMPO};
use synth::SoundVariant;
use trace::LogTarget;
use ui::Theme;

/// Speedtrainer - terminal metronome that ramps up the tempo as you practice
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Starting tempo in BPM
    #[arg(long, default_value_t = 80.0)]
    tempo: f64,

    /// Beats per bar (the first one is accented)
    #[arg(long, default_value_t = 4)]
    beats_per_bar: u32,

    /// BPM added at each ramp step, 0 disables the speed trainer
    #[arg(long, default_value_t = 5)]
    ramp_amount: u32,

    /// Completed bars between ramp steps
    #[arg(long, default_value_t = 4)]
    ramp_interval: u32,

    /// Tempo the ramp stops at
    #[arg(long, default_value_t = 160.0)]
    ceiling: f64,

    /// Click sound (see --list-sounds)
    #[arg(long, default_value = "click")]
    sound: String,

    /// Preset file: loaded at startup if it exists, target of save/load in the TUI
    #[arg(long)]
    preset: Option<PathBuf>,

    /// Theme to use for the interface
    #[arg(long, default_value = "default")]
    theme: String,

    /// List available themes and exit
    #[arg(long)]
    list_themes: bool,

    /// List available sounds and exit
    #[arg(long)]
    list_sounds: bool,

    /// Render to a WAV file instead of starting the interface
    #[arg(long, value_name = "WAV")]
    render: Option<PathBuf>,

    /// Bars to render with --render
    #[arg(long, default_value_t = 8)]
    bars: u64,

    /// Write logs to this file (the interface owns the terminal otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn settings(&self) -> Settings {
        Settings {
            tempo: self.tempo,
            beats_per_bar: self.beats_per_bar,
            ramp_amount: self.ramp_amount,
            ramp_interval_bars: self.ramp_interval,
            tempo_ceiling: self.ceiling,
        }
    }

    fn log_target(&self) -> LogTarget<'_> {
        match &self.log_file {
            Some(path) => LogTarget::File(path),
            None if self.render.is_some() => LogTarget::Stderr,
            None => LogTarget::Off,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --list-themes
    if args.list_themes {
        println!("Available themes:");
        for theme in Theme::available_themes() {
            println!("  {}", theme);
        }
        return Ok(());
    }

    // Handle --list-sounds
    if args.list_sounds {
        println!("Available sounds:");
        for sound in SoundVariant::ALL {
            println!("  {}", sound.name());
        }
        return Ok(());
    }

    trace::setup(args.log_target(), args.verbose)?;

    if args.beats_per_bar == 0 {
        bail!("--beats-per-bar must be at least 1");
    }
    for (flag, value) in [("--tempo", args.tempo), ("--ceiling", args.ceiling)] {
        if !(value > 0.0 && value <= MAX_TEMPO) {
            bail!("{} must be in (0, {}], got {}", flag, MAX_TEMPO, value);
        }
    }

    let mut settings = args.settings();
    let mut sound = SoundVariant::from_name(&args.sound).with_context(|| {
        format!(
            "Unknown sound '{}'. Use --list-sounds to see available sounds.",
            args.sound
        )
    })?;

    if let Some(path) = args.preset.as_deref().filter(|p| p.exists()) {
        let preset = import_preset(path)
            .with_context(|| format!("Failed to load preset {}", path.display()))?;
        settings = preset.settings;
        sound = preset.sound.unwrap_or(sound);
    }

    // Offline render mode
    if let Some(path) = &args.render {
        let result = export_wav(&settings, sound, args.bars, path)?;
        println!(
            "Rendered {} beats ({:.1}s) to {}, final tempo {:.0} BPM",
            result.beats,
            result.duration_secs,
            path.display(),
            result.final_tempo
        );
        return Ok(());
    }

    // Load theme
    let theme = Theme::from_name(&args.theme).unwrap_or_else(|| {
        warn!("unknown theme '{}', using default", args.theme);
        eprintln!(
            "Warning: Unknown theme '{}', using default. Use --list-themes to see available themes.",
            args.theme
        );
        Theme::default()
    });

    // Run the TUI application
    let mut app = App::new(theme, settings, sound, args.preset.clone());
    app.run()
}
