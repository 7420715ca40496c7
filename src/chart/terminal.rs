// SPDX-License-Identifier: MIT
use std::io::{self, Stdout};

use anyhow::{Context, Result};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph};

use super::ChartRenderer;
use super::view::ChartView;
use crate::host::HudLine;
use crate::tui::theme::{SELECTED_MARKER, Theme};

const SERIES_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::LightRed,
    Color::LightBlue,
];
const SIDE_PANEL_WIDTH: u16 = 34;

/// Draws the chart on a ratatui terminal owned by the render thread.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    theme: Theme,
}

impl TerminalRenderer<CrosstermBackend<Stdout>> {
    /// Takes over the (already raw, alternate) screen on stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be created or cleared.
    pub fn stdout() -> Result<Self> {
        Self::new(CrosstermBackend::new(io::stdout()))
    }
}

impl<B: Backend> TerminalRenderer<B> {
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be created or cleared.
    pub fn new(backend: B) -> Result<Self> {
        let mut terminal = Terminal::new(backend).context("failed to create chart terminal")?;
        terminal.clear().context("failed to clear chart terminal")?;
        Ok(Self {
            terminal,
            theme: Theme::default(),
        })
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl<B: Backend> ChartRenderer for TerminalRenderer<B> {
    fn draw(&mut self, view: &ChartView, overlay: &[HudLine]) -> Result<()> {
        let theme = &self.theme;
        self.terminal
            .draw(|f| render_chart(f, f.area(), view, overlay, theme))
            .context("failed to draw chart frame")?;
        Ok(())
    }
}

fn series_color(index: usize) -> Color {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

fn format_range(range: Option<(f64, f64)>) -> String {
    range.map_or_else(|| "--".to_string(), |(lo, hi)| format!("{lo:.1}..{hi:.1}"))
}

pub fn render_chart(
    frame: &mut ratatui::Frame,
    area: Rect,
    view: &ChartView,
    overlay: &[HudLine],
    theme: &Theme,
) {
    if area.height < 6 || area.width < 20 {
        return;
    }

    #[allow(clippy::cast_possible_truncation)]
    let overlay_height = overlay.len().min(4) as u16;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(overlay_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let overlay_lines: Vec<Line> = overlay
        .iter()
        .map(|l| Line::from(Span::styled(l.text.clone(), theme.hud(l.color))))
        .collect();
    frame.render_widget(Paragraph::new(overlay_lines), rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(SIDE_PANEL_WIDTH)])
        .split(rows[1]);

    render_plot(frame, columns[0], view, theme);
    render_series_list(frame, columns[1], view, theme);

    let state = if view.is_paused() { "PAUSED" } else { "LIVE" };
    let help = Line::from(vec![
        Span::styled(format!(" {state} "), theme.status_bar),
        Span::styled("  [Space]", theme.title),
        Span::raw(" Pause  "),
        Span::styled("[r]", theme.title),
        Span::raw(" Reset  "),
        Span::styled("[1-9]", theme.title),
        Span::raw(" Series  "),
        Span::styled("[q]", theme.title),
        Span::raw(" Close"),
    ]);
    frame.render_widget(Paragraph::new(help), rows[2]);
}

fn render_plot(frame: &mut ratatui::Frame, area: Rect, view: &ChartView, theme: &Theme) {
    let block = Block::default()
        .title(" ParaViz ")
        .borders(Borders::ALL)
        .border_style(theme.border_selected)
        .title_style(theme.title);

    let Some((t_min, t_max)) = view.time_bounds() else {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new("Waiting for data..."), inner);
        return;
    };

    // Each series is scaled into [0, 1] by its own range.
    let scaled: Vec<(usize, String, Vec<(f64, f64)>)> = view
        .series()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.visible)
        .map(|(i, s)| {
            let label = format!("{} [{}]", s.name, format_range(s.range));
            (i, label, s.normalized())
        })
        .collect();

    let datasets: Vec<Dataset> = scaled
        .iter()
        .map(|(i, label, points)| {
            Dataset::default()
                .name(label.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(series_color(*i)))
                .data(points)
        })
        .collect();

    let t_hi = if t_max > t_min { t_max } else { t_min + 1.0 };
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("t (s)")
                .style(theme.border_normal)
                .bounds([t_min, t_hi])
                .labels([format!("{t_min:.1}"), format!("{t_hi:.1}")]),
        )
        .y_axis(
            Axis::default()
                .style(theme.border_normal)
                .bounds([0.0, 1.0])
                .labels(["min", "max"]),
        );
    frame.render_widget(chart, area);
}

fn render_series_list(frame: &mut ratatui::Frame, area: Rect, view: &ChartView, theme: &Theme) {
    let block = Block::default()
        .title(" Series ")
        .borders(Borders::ALL)
        .border_style(theme.border_normal)
        .title_style(theme.title);

    let lines: Vec<Line> = view
        .series()
        .iter()
        .enumerate()
        .take(9)
        .map(|(i, s)| {
            let mark = SELECTED_MARKER[usize::from(s.visible)];
            let style = if s.visible {
                Style::default().fg(series_color(i))
            } else {
                theme.border_normal
            };
            Line::from(vec![
                Span::styled(format!("[{}] ", i + 1), theme.title),
                Span::styled(format!("{mark} {} ", s.name), style),
                Span::raw(format!("({})", format_range(s.range))),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
