// SPDX-License-Identifier: MIT
use ratatui::layout::{Constraint, Direction, Layout, Rect};

pub struct PanelState {
    pub name: &'static str,
    pub collapsed: bool,
    pub min_height: u16,
}

/// Splits `area` vertically; a collapsed panel keeps only its border row.
pub fn build_layout(panels: &[PanelState], area: Rect) -> Vec<Rect> {
    let constraints: Vec<Constraint> = panels
        .iter()
        .map(|p| {
            if p.collapsed {
                Constraint::Length(3)
            } else {
                Constraint::Min(p.min_height)
            }
        })
        .collect();

    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapsed_panel_shrinks() {
        let panels = [
            PanelState { name: "a", collapsed: true, min_height: 10 },
            PanelState { name: "b", collapsed: false, min_height: 5 },
        ];
        let areas = build_layout(&panels, Rect::new(0, 0, 40, 30));
        assert_eq!(areas[0].height, 3);
        assert_eq!(areas[1].height, 27);
    }
}
