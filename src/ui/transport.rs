use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::synth::SoundVariant;
use crate::ui::Theme;

/// Snapshot of everything the transport bar and beat display show
pub struct TransportInfo {
    pub playing: bool,
    pub tempo: f64,
    pub start_tempo: f64,
    pub tempo_ceiling: f64,
    pub beats_per_bar: u32,
    /// Last beat the listener heard, if any since start
    pub current_beat: Option<usize>,
    /// Bars heard since start
    pub bars: u64,
    pub sound: SoundVariant,
    /// Output device and sample rate, `None` while running silent
    pub device: Option<String>,
}

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, info: &TransportInfo, theme: &Theme) {
    let status = if info.playing { "PLAY" } else { "STOP" };
    let status_style = if info.playing {
        Style::default().fg(theme.meter_high).bold()
    } else {
        Style::default().fg(theme.dimmed)
    };

    let beat = match info.current_beat {
        Some(b) if info.playing => format!("{}/{}", b + 1, info.beats_per_bar),
        _ => format!("-/{}", info.beats_per_bar),
    };
    let (device, device_style) = match &info.device {
        Some(name) => (name.clone(), Style::default().fg(theme.dimmed)),
        None => ("no audio".to_string(), Style::default().fg(theme.error)),
    };

    let sep = || Span::styled(" | ", Style::default().fg(theme.border));
    let transport_text = vec![
        Span::styled(format!(" {} ", status), status_style),
        sep(),
        Span::styled(format!("BPM: {:.0}", info.tempo), Style::default().fg(theme.fg).bold()),
        sep(),
        Span::styled(format!("Beat: {}", beat), Style::default().fg(theme.fg)),
        sep(),
        Span::styled(format!("Bar: {}", info.bars + 1), Style::default().fg(theme.fg)),
        sep(),
        Span::styled(info.sound.display_name(), Style::default().fg(theme.label)),
        sep(),
        Span::styled(device, device_style),
    ];

    let transport = Paragraph::new(Line::from(transport_text))
        .style(Style::default().bg(theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg)),
        );

    frame.render_widget(transport, area);
}

/// Render one cell per beat, lighting the beat just heard
pub fn render_beats(frame: &mut Frame, area: Rect, info: &TransportInfo, theme: &Theme) {
    let block = Block::default()
        .title(Span::styled(" Beat ", Style::default().fg(theme.label)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let beats = info.beats_per_bar.max(1) as u16;
    let cell_width = (inner.width / beats).max(2);
    let lit = info.current_beat.filter(|_| info.playing);

    for beat in 0..beats {
        let x = inner.x + beat * cell_width;
        if x >= inner.x + inner.width {
            break;
        }

        let accent = beat == 0;
        let color = match lit {
            Some(b) if b == beat as usize && accent => theme.beat_accent,
            Some(b) if b == beat as usize => theme.beat_active,
            _ => theme.beat_inactive,
        };
        let glyph = if accent { "█" } else { "▓" };
        let width = cell_width.saturating_sub(1).min(inner.x + inner.width - x);
        let fill: String = glyph.repeat(width as usize);
        let cell = Rect::new(x, inner.y, width, inner.height);
        let lines: Vec<Line> = (0..inner.height)
            .map(|_| Line::from(Span::styled(fill.clone(), Style::default().fg(color))))
            .collect();
        frame.render_widget(Paragraph::new(lines), cell);
    }
}

/// Fraction of the way from the start tempo to the ceiling
pub fn ramp_progress(tempo: f64, start: f64, ceiling: f64) -> f64 {
    if ceiling <= start {
        return 1.0;
    }
    ((tempo - start) / (ceiling - start)).clamp(0.0, 1.0)
}

/// Render the speed-trainer progress gauge
pub fn render_ramp(frame: &mut Frame, area: Rect, info: &TransportInfo, theme: &Theme) {
    let ratio = ramp_progress(info.tempo, info.start_tempo, info.tempo_ceiling);
    let color = if ratio >= 1.0 {
        theme.meter_high
    } else if ratio >= 0.5 {
        theme.meter_mid
    } else {
        theme.meter_low
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Speed trainer ", Style::default().fg(theme.label)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .style(Style::default().bg(theme.bg)),
        )
        .gauge_style(Style::default().fg(color).bg(theme.bg))
        .ratio(ratio)
        .label(format!(
            "{:.0} / {:.0} BPM",
            info.tempo, info.tempo_ceiling
        ));

    frame.render_widget(gauge, area);
}
