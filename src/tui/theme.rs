// SPDX-License-Identifier: MIT
use ratatui::style::{Color, Modifier, Style};

use crate::host::HudColor;

pub struct Theme {
    pub hud_normal: Style,
    pub hud_ok: Style,
    pub hud_warn: Style,
    pub hud_alert: Style,
    pub border_normal: Style,
    pub border_selected: Style,
    pub title: Style,
    pub status_bar: Style,
    pub log_plugin: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            hud_normal: Style::default().fg(Color::White),
            hud_ok: Style::default().fg(Color::Green),
            hud_warn: Style::default().fg(Color::Yellow),
            hud_alert: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            border_normal: Style::default().fg(Color::White),
            border_selected: Style::default().fg(Color::Cyan),
            title: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().fg(Color::Black).bg(Color::White),
            log_plugin: Style::default().fg(Color::Cyan),
        }
    }
}

impl Theme {
    #[must_use]
    pub fn hud(&self, color: HudColor) -> Style {
        match color {
            HudColor::White => self.hud_normal,
            HudColor::Green => self.hud_ok,
            HudColor::Yellow => self.hud_warn,
            HudColor::Red => self.hud_alert,
        }
    }
}

pub const SELECTED_MARKER: [char; 2] = ['\u{2610}', '\u{2611}'];
pub const COLLAPSED_MARKER: [char; 2] = ['\u{25BC}', '\u{25BA}'];
