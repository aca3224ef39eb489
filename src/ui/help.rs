use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::ui::Theme;

pub struct HelpState {
    pub scroll: usize,
}

impl HelpState {
    pub fn new() -> Self {
        Self { scroll: 0 }
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, max_lines: usize, visible: usize) {
        if max_lines > visible && self.scroll < max_lines - visible {
            self.scroll += 1;
        }
    }
}

impl Default for HelpState {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the Help view showing all keybindings
pub fn render_help(
    frame: &mut Frame,
    area: Rect,
    help_state: &HelpState,
    theme: &Theme,
) {
    let block = Block::default()
        .title(Span::styled(
            " Help ",
            Style::default().fg(theme.label),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().bg(theme.bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = build_help_lines(theme);
    let total_lines = lines.len();
    let visible = inner.height as usize;

    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(help_state.scroll)
        .take(visible)
        .collect();

    let para = Paragraph::new(visible_lines).style(Style::default().bg(theme.bg));
    frame.render_widget(para, inner);

    // Scroll indicator
    if total_lines > visible {
        let pct = if total_lines <= visible {
            100
        } else {
            (help_state.scroll * 100) / (total_lines - visible)
        };
        let indicator = format!(" {}% ", pct);
        let indicator_widget = Paragraph::new(indicator)
            .style(Style::default().fg(theme.dimmed));
        let indicator_area = Rect::new(
            inner.x + inner.width.saturating_sub(6),
            inner.y + inner.height.saturating_sub(1),
            6,
            1,
        );
        frame.render_widget(indicator_widget, indicator_area);
    }
}

/// Total number of help lines (for scroll bounds)
pub fn help_line_count(theme: &Theme) -> usize {
    build_help_lines(theme).len()
}

fn build_help_lines(theme: &Theme) -> Vec<Line<'static>> {
    let header_style = Style::default().fg(theme.highlight).bold();
    let key_style = Style::default().fg(theme.beat_active);
    let desc_style = Style::default().fg(theme.fg);
    let dim_style = Style::default().fg(theme.dimmed);

    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        "  SPEEDTRAINER KEYBINDINGS",
        header_style,
    )));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("  TRANSPORT", header_style)));
    lines.push(Line::from(Span::styled(
        "  ──────────────────────────────────────",
        dim_style,
    )));
    add_key(&mut lines, "  Space / P ", "Start / stop", key_style, desc_style);
    add_key(&mut lines, "  + / -     ", "Tempo up/down by 1 BPM", key_style, desc_style);
    add_key(&mut lines, "  V         ", "Next sound", key_style, desc_style);
    add_key(&mut lines, "  T         ", "Next theme", key_style, desc_style);
    add_key(&mut lines, "  Q         ", "Quit", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("  SETTINGS", header_style)));
    lines.push(Line::from(Span::styled(
        "  ──────────────────────────────────────",
        dim_style,
    )));
    add_key(&mut lines, "  Up/Down   ", "Select field (also K/J)", key_style, desc_style);
    add_key(&mut lines, "  Left/Right", "Adjust value (also H/L)", key_style, desc_style);
    add_key(&mut lines, "  [ / ]     ", "Adjust value (coarse)", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("  PRESETS", header_style)));
    lines.push(Line::from(Span::styled(
        "  ──────────────────────────────────────",
        dim_style,
    )));
    add_key(&mut lines, "  Ctrl+S    ", "Save preset (JSON)", key_style, desc_style);
    add_key(&mut lines, "  Ctrl+O    ", "Load preset (JSON)", key_style, desc_style);
    add_key(&mut lines, "  Ctrl+E    ", "Export 8 bars as WAV", key_style, desc_style);
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("  HELP", header_style)));
    lines.push(Line::from(Span::styled(
        "  ──────────────────────────────────────",
        dim_style,
    )));
    add_key(&mut lines, "  G / ?     ", "Toggle this view", key_style, desc_style);
    add_key(&mut lines, "  Up/Down   ", "Scroll", key_style, desc_style);

    lines
}

fn add_key(lines: &mut Vec<Line<'static>>, key: &str, desc: &str, key_style: Style, desc_style: Style) {
    lines.push(Line::from(vec![
        Span::styled(key.to_string(), key_style),
        Span::styled(format!("  {}", desc), desc_style),
    ]));
}
