// SPDX-License-Identifier: MIT
use std::time::Duration;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::input::Action;
use super::layout::{PanelState, build_layout};
use super::panels::header::{self, HeaderInfo};
use super::panels::{hud, log, menus};
use super::replay_controls::{self, ReplayControls};
use super::theme::{COLLAPSED_MARKER, SELECTED_MARKER, Theme};
use crate::host::sim::{LogLine, MenuEntry};
use crate::host::{HudLine, SimHost};

const REPLAY_BAR_HEIGHT: u16 = 4;

/// Everything the cockpit shows, copied out of the host once per frame.
#[derive(Debug, Clone, Default)]
pub struct CockpitFrame {
    pub hud: Vec<HudLine>,
    pub menus: Vec<MenuEntry>,
    pub hotkeys: Vec<(char, String)>,
    pub log: Vec<LogLine>,
    pub elapsed: Duration,
}

impl CockpitFrame {
    /// Runs the draw callbacks and snapshots the host's menus and log.
    pub fn capture(host: &mut SimHost) -> Self {
        Self {
            hud: host.draw(),
            menus: host.menu_entries(),
            hotkeys: host.hotkeys(),
            log: host.log_lines().cloned().collect(),
            elapsed: host.elapsed(),
        }
    }
}

pub struct App {
    pub panels: Vec<PanelState>,
    pub selected_panel: usize,
    pub latest: Option<CockpitFrame>,
    pub aircraft: String,
    pub tail: String,
    pub is_replay: bool,
    pub should_quit: bool,
    pub theme: Theme,
    sample_period: Duration,
    replay_controls: Option<ReplayControls>,
}

impl App {
    #[must_use]
    pub fn new(aircraft: &str, tail: &str, is_replay: bool, sample_period: Duration) -> Self {
        let panels = vec![
            PanelState {
                name: "HUD",
                collapsed: false,
                min_height: 10,
            },
            PanelState {
                name: "Menus & Hotkeys",
                collapsed: false,
                min_height: 6,
            },
            PanelState {
                name: "Host Log",
                collapsed: false,
                min_height: 6,
            },
        ];

        Self {
            panels,
            selected_panel: 0,
            latest: None,
            aircraft: aircraft.to_string(),
            tail: tail.to_string(),
            is_replay,
            should_quit: false,
            theme: Theme::default(),
            sample_period,
            replay_controls: is_replay.then(|| ReplayControls::new(0)),
        }
    }

    pub fn update(&mut self, frame: CockpitFrame) {
        self.latest = Some(frame);
    }

    #[must_use]
    pub fn replay_controls(&self) -> Option<&ReplayControls> {
        self.replay_controls.as_ref()
    }

    pub fn replay_controls_mut(&mut self) -> Option<&mut ReplayControls> {
        self.replay_controls.as_mut()
    }

    /// Applies a cockpit action. `Host` actions are the caller's to route.
    pub fn handle_action(&mut self, action: &Action) {
        match *action {
            Action::Quit => self.should_quit = true,
            Action::PanelUp => {
                self.selected_panel = self.selected_panel.saturating_sub(1);
            }
            Action::PanelDown => {
                if self.selected_panel + 1 < self.panels.len() {
                    self.selected_panel += 1;
                }
            }
            Action::ToggleCollapse => {
                if let Some(panel) = self.panels.get_mut(self.selected_panel) {
                    panel.collapsed = !panel.collapsed;
                }
            }
            Action::TogglePause => self.with_controls(ReplayControls::toggle_pause),
            Action::SeekForward => self.with_controls(ReplayControls::step_forward),
            Action::SeekBackward => self.with_controls(ReplayControls::step_backward),
            Action::SpeedUp => self.with_controls(ReplayControls::speed_up),
            Action::SpeedDown => self.with_controls(ReplayControls::speed_down),
            Action::SeekStart => self.with_controls(ReplayControls::seek_start),
            Action::SeekEnd => self.with_controls(ReplayControls::seek_end),
            Action::Host(_) | Action::None => {}
        }
    }

    fn with_controls(&mut self, f: impl FnOnce(&mut ReplayControls)) {
        if let Some(controls) = self.replay_controls.as_mut() {
            f(controls);
        }
    }

    pub fn render(&self, frame: &mut ratatui::Frame) {
        let outer = frame.area();
        if outer.height < 2 || outer.width < 5 {
            return;
        }

        let mut constraints = vec![Constraint::Length(1), Constraint::Min(1)];
        if self.replay_controls.is_some() {
            constraints.push(Constraint::Length(REPLAY_BAR_HEIGHT));
        }
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(outer);

        header::render(
            frame,
            vertical[0],
            &HeaderInfo {
                aircraft: &self.aircraft,
                tail: &self.tail,
                is_replay: self.is_replay,
                elapsed: self.latest.as_ref().map(|f| f.elapsed),
            },
            &self.theme,
        );

        if let Some(controls) = &self.replay_controls {
            replay_controls::render(frame, vertical[2], controls, self.sample_period, &self.theme);
        }

        let areas = build_layout(&self.panels, vertical[1]);

        for (i, (panel, area)) in self.panels.iter().zip(areas.iter()).enumerate() {
            let is_selected = i == self.selected_panel;
            let sel_mark = SELECTED_MARKER[usize::from(is_selected)];
            let col_mark = COLLAPSED_MARKER[usize::from(panel.collapsed)];

            let block = Block::default()
                .title(format!("{sel_mark} {col_mark} {}", panel.name))
                .borders(Borders::ALL)
                .border_style(if is_selected {
                    self.theme.border_selected
                } else {
                    self.theme.border_normal
                })
                .title_style(self.theme.title);

            if panel.collapsed {
                frame.render_widget(block, *area);
                continue;
            }
            let inner = block.inner(*area);
            frame.render_widget(block, *area);
            if inner.width < 2 || inner.height < 1 {
                continue;
            }

            match (i, &self.latest) {
                (0, Some(data)) => hud::render(frame, inner, &data.hud, &self.theme),
                (1, Some(data)) => {
                    menus::render(frame, inner, &data.menus, &data.hotkeys, &self.theme);
                }
                (2, Some(data)) => log::render(frame, inner, &data.log, &self.theme),
                _ => frame.render_widget(Paragraph::new("Waiting for host..."), inner),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::Config;
    use crate::host::SimulatedAircraft;
    use crate::plugins::{HeadingCommand, ParamDisplay, param_display};

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn cockpit_shows_hud_menus_and_log() {
        let config = Config::default();
        let mut host = SimHost::new(Box::new(SimulatedAircraft::new()), &config.aircraft);
        host.add(Box::new(ParamDisplay::new(&config.display)));
        host.add(Box::new(HeadingCommand::new()));
        host.start_all();
        host.enable_all();
        host.run_command(param_display::TOGGLE_COMMAND);

        let mut app = App::new(&config.aircraft, &config.tail, false, Duration::from_secs(1));
        app.update(CockpitFrame::capture(&mut host));

        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let text = screen_text(&terminal);

        assert!(text.contains("LIVE | N12345"));
        assert!(text.contains("ALTITUDE  1500"));
        assert!(text.contains("[1] Display Parameters: Toggle: OFF"));
        assert!(text.contains("[h] Heading +10"));
        assert!(text.contains("Display --> Started."));
        assert!(!text.contains("Playback"));
    }

    #[test]
    fn collapse_and_replay_bar() {
        let mut app = App::new("A.acf", "N1", true, Duration::from_millis(100));
        app.handle_action(&Action::PanelDown);
        app.handle_action(&Action::ToggleCollapse);
        assert!(app.panels[1].collapsed);
        app.handle_action(&Action::PanelUp);
        app.handle_action(&Action::PanelUp);
        assert_eq!(app.selected_panel, 0);

        app.handle_action(&Action::TogglePause);
        assert!(app.replay_controls().unwrap().paused);

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("REPLAY"));
        assert!(text.contains("Playback"));
        assert!(text.contains("Waiting for host..."));
    }

    #[test]
    fn quit_only_from_quit_action() {
        let mut app = App::new("A.acf", "N1", false, Duration::from_secs(1));
        app.handle_action(&Action::Host(crate::host::Key::Char('h')));
        app.handle_action(&Action::TogglePause);
        assert!(!app.should_quit);
        app.handle_action(&Action::Quit);
        assert!(app.should_quit);
    }
}
