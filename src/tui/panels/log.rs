// SPDX-License-Identifier: MIT
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::host::sim::LogLine;
use crate::tui::theme::Theme;

/// Newest lines at the bottom; older ones scroll off the top.
pub fn render(frame: &mut ratatui::Frame, area: Rect, log: &[LogLine], theme: &Theme) {
    let skip = log.len().saturating_sub(area.height as usize);
    let lines: Vec<Line> = log
        .iter()
        .skip(skip)
        .map(|l| {
            Line::from(vec![
                Span::raw(format!("{:>7.1}s ", l.elapsed.as_secs_f64())),
                Span::styled(format!("[{}] ", l.plugin), theme.log_plugin),
                Span::raw(l.message.clone()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
