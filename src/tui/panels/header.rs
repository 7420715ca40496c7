// SPDX-License-Identifier: MIT
use std::time::Duration;

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::theme::Theme;

pub struct HeaderInfo<'a> {
    pub aircraft: &'a str,
    pub tail: &'a str,
    pub is_replay: bool,
    pub elapsed: Option<Duration>,
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

pub fn render(frame: &mut ratatui::Frame, area: Rect, info: &HeaderInfo<'_>, theme: &Theme) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let version = env!("CARGO_PKG_VERSION");
    let mode = if info.is_replay { "REPLAY" } else { "LIVE" };
    let clock = info
        .elapsed
        .map_or_else(String::new, |e| format!(" | T+{}", format_elapsed(e)));
    let text = format!(
        "ParaViz v{version} | {mode} | {} | {}{clock}",
        info.tail, info.aircraft
    );

    let line = Line::from(vec![Span::styled(
        format!("{text:<width$}", width = area.width as usize),
        theme.status_bar,
    )]);

    frame.render_widget(Paragraph::new(line), area);
}
