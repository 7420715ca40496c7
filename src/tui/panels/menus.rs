// SPDX-License-Identifier: MIT
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::host::sim::MenuEntry;
use crate::tui::theme::Theme;

/// Menu items numbered `1`..`9` in the order the host binds them, then the
/// registered hotkeys.
pub fn render(
    frame: &mut ratatui::Frame,
    area: Rect,
    menus: &[MenuEntry],
    hotkeys: &[(char, String)],
    theme: &Theme,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let items: Vec<Line> = menus
        .iter()
        .take(9)
        .enumerate()
        .map(|(i, entry)| {
            Line::from(vec![
                Span::styled(format!("[{}] ", i + 1), theme.title),
                Span::raw(format!("{}: ", entry.menu)),
                Span::styled(entry.item.clone(), theme.hud_ok),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(items), columns[0]);

    let keys: Vec<Line> = hotkeys
        .iter()
        .map(|(key, description)| {
            Line::from(vec![
                Span::styled(format!("[{key}] "), theme.title),
                Span::raw(description.clone()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(keys), columns[1]);
}
