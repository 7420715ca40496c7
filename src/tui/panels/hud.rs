// SPDX-License-Identifier: MIT
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;

use crate::host::HudLine;
use crate::tui::theme::Theme;

pub fn render(frame: &mut ratatui::Frame, area: Rect, hud: &[HudLine], theme: &Theme) {
    if hud.is_empty() {
        frame.render_widget(Paragraph::new("(nothing drawn)").style(theme.border_normal), area);
        return;
    }
    let lines: Vec<Line> = hud
        .iter()
        .map(|l| Line::styled(l.text.clone(), theme.hud(l.color)))
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}
