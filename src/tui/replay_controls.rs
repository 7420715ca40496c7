// SPDX-License-Identifier: MIT
use std::time::Duration;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use super::theme::Theme;
use crate::host::CaptureReplay;

const SPEED_STEPS: [f64; 7] = [0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0];
const DEFAULT_SPEED_INDEX: usize = 2; // 1.0x

/// Playback state the user edits; pushed into the replay environment with
/// [`ReplayControls::apply`] and read back with [`ReplayControls::follow`].
pub struct ReplayControls {
    pub speed: f64,
    pub paused: bool,
    pub current_sample: usize,
    pub total_samples: usize,
    speed_index: usize,
}

impl ReplayControls {
    #[must_use]
    pub fn new(total_samples: usize) -> Self {
        Self {
            speed: SPEED_STEPS[DEFAULT_SPEED_INDEX],
            paused: false,
            current_sample: 0,
            total_samples,
            speed_index: DEFAULT_SPEED_INDEX,
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn speed_up(&mut self) {
        if self.speed_index + 1 < SPEED_STEPS.len() {
            self.speed_index += 1;
            self.speed = SPEED_STEPS[self.speed_index];
        }
    }

    pub fn speed_down(&mut self) {
        if self.speed_index > 0 {
            self.speed_index -= 1;
            self.speed = SPEED_STEPS[self.speed_index];
        }
    }

    pub fn step_forward(&mut self) {
        if let Some(last) = self.total_samples.checked_sub(1) {
            self.current_sample = (self.current_sample + 1).min(last);
        }
        self.paused = true;
    }

    pub fn step_backward(&mut self) {
        self.current_sample = self.current_sample.saturating_sub(1);
        self.paused = true;
    }

    pub fn seek_start(&mut self) {
        self.current_sample = 0;
    }

    pub fn seek_end(&mut self) {
        if let Some(last) = self.total_samples.checked_sub(1) {
            self.current_sample = last;
        }
    }

    /// Pushes speed, pause and any seek into the replay.
    pub fn apply(&self, replay: &mut CaptureReplay) {
        replay.set_speed(self.speed);
        if self.paused != replay.is_paused() {
            replay.toggle_pause();
        }
        if self.current_sample != replay.current_index() {
            replay.seek_to(self.current_sample);
        }
    }

    /// Picks up where playback has moved on its own.
    pub fn follow(&mut self, replay: &CaptureReplay) {
        self.current_sample = replay.current_index();
        self.total_samples = replay.total();
    }

    #[must_use]
    pub fn progress_fraction(&self) -> f64 {
        if self.total_samples <= 1 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.current_sample as f64 / (self.total_samples - 1) as f64;
        fraction
    }
}

fn format_time(sample_index: usize, sample_period: Duration) -> String {
    let index = u32::try_from(sample_index).unwrap_or(u32::MAX);
    let total_seconds = sample_period.saturating_mul(index).as_secs();
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn render(
    frame: &mut ratatui::Frame,
    area: Rect,
    controls: &ReplayControls,
    sample_period: Duration,
    theme: &Theme,
) {
    if area.height < 4 || area.width < 20 {
        return;
    }

    let block = Block::default()
        .title(" Playback ")
        .borders(Borders::ALL)
        .border_style(theme.border_normal)
        .title_style(theme.title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 || inner.width < 10 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let status_icon = if controls.paused {
        "\u{23F8}"
    } else {
        "\u{25B6}"
    };
    let label = format!(
        " {status_icon} {:.2}x  {} / {}",
        controls.speed,
        format_time(controls.current_sample, sample_period),
        format_time(controls.total_samples.saturating_sub(1), sample_period),
    );

    let gauge = Gauge::default()
        .ratio(controls.progress_fraction().clamp(0.0, 1.0))
        .label(label)
        .gauge_style(theme.border_selected);
    frame.render_widget(gauge, rows[0]);

    let help = Line::from(vec![
        Span::styled("[Space]", theme.title),
        Span::raw(" Pause  "),
        Span::styled("[\u{2190}/\u{2192}]", theme.title),
        Span::raw(" Step  "),
        Span::styled("[ [ / ] ]", theme.title),
        Span::raw(" Speed  "),
        Span::styled("[Home/End]", theme.title),
        Span::raw(" Jump"),
    ]);
    frame.render_widget(Paragraph::new(help), rows[1]);
}
