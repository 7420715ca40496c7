// SPDX-License-Identifier: MIT
use crossterm::event::KeyCode;

use crate::host::Key;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    PanelUp,
    PanelDown,
    ToggleCollapse,
    TogglePause,
    SeekForward,
    SeekBackward,
    SpeedUp,
    SpeedDown,
    SeekStart,
    SeekEnd,
    /// Anything the cockpit does not use goes to the host: hotkeys and menu
    /// digits.
    Host(Key),
    None,
}

/// Maps a key pressed in the cockpit (no window open).
#[must_use]
pub fn handle_key(key: KeyCode, is_replay: bool) -> Action {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Up => Action::PanelUp,
        KeyCode::Down => Action::PanelDown,
        KeyCode::Right if is_replay => Action::SeekForward,
        KeyCode::Right => Action::ToggleCollapse,
        KeyCode::Tab => Action::ToggleCollapse,
        KeyCode::Char(' ') if is_replay => Action::TogglePause,
        KeyCode::Left if is_replay => Action::SeekBackward,
        KeyCode::Char(']' | '+') if is_replay => Action::SpeedUp,
        KeyCode::Char('[' | '-') if is_replay => Action::SpeedDown,
        KeyCode::Home if is_replay => Action::SeekStart,
        KeyCode::End if is_replay => Action::SeekEnd,
        other => host_key(other).map_or(Action::None, Action::Host),
    }
}

/// Translates a terminal key for the host; windows receive every key this
/// way.
#[must_use]
pub fn host_key(key: KeyCode) -> Option<Key> {
    Some(match key {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Tab => Key::Tab,
        _ => return None,
    })
}
