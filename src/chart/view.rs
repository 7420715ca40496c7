// SPDX-License-Identifier: MIT
use super::session::ChartCommand;
use crate::sampler::history::SeriesSnapshot;

#[derive(Debug, Clone)]
pub struct SeriesView {
    pub name: String,
    pub visible: bool,
    pub points: Vec<(f64, f64)>,
    /// Range of the finite values in `points`; `None` until one arrives.
    pub range: Option<(f64, f64)>,
}

impl SeriesView {
    /// Points scaled into `[0, 1]` by this series' own range. Non-finite
    /// values are dropped; a flat series sits at the middle.
    #[must_use]
    pub fn normalized(&self) -> Vec<(f64, f64)> {
        let Some((min, max)) = self.range else {
            return Vec::new();
        };
        let span = max - min;
        self.points
            .iter()
            .filter(|(_, v)| v.is_finite())
            .map(|&(t, v)| {
                let y = if span > f64::EPSILON { (v - min) / span } else { 0.5 };
                (t, y)
            })
            .collect()
    }
}

/// What the chart currently shows. Owned by the render thread.
#[derive(Debug, Clone)]
pub struct ChartView {
    series: Vec<SeriesView>,
    paused: bool,
    origin: f64,
    latest: f64,
}

impl ChartView {
    /// Only the first series starts visible.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let series = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| SeriesView {
                name: name.into(),
                visible: i == 0,
                points: Vec::new(),
                range: None,
            })
            .collect();
        Self {
            series,
            paused: false,
            origin: f64::NEG_INFINITY,
            latest: f64::NEG_INFINITY,
        }
    }

    #[must_use]
    pub fn series(&self) -> &[SeriesView] {
        &self.series
    }

    pub fn visible(&self) -> impl Iterator<Item = &SeriesView> {
        self.series.iter().filter(|s| s.visible)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Replaces the visible series' points with the snapshot, from the reset
    /// origin on. An empty snapshot changes nothing.
    pub fn update(&mut self, snapshot: &[SeriesSnapshot]) {
        if snapshot.iter().all(|s| s.points.is_empty()) {
            return;
        }
        for snap in snapshot {
            if let Some(&(t, _)) = snap.points.last() {
                self.latest = self.latest.max(t);
            }
            let Some(series) = self.series.iter_mut().find(|s| s.name == snap.name) else {
                continue;
            };
            if !series.visible {
                continue;
            }
            series.points = snap
                .points
                .iter()
                .copied()
                .filter(|&(t, _)| t >= self.origin)
                .collect();
            series.range = value_range(&series.points);
        }
    }

    pub fn apply(&mut self, command: ChartCommand) {
        match command {
            ChartCommand::TogglePause => self.paused = !self.paused,
            ChartCommand::Reset => {
                self.origin = self.latest;
                for series in &mut self.series {
                    series.points.clear();
                    series.range = None;
                }
            }
            ChartCommand::ToggleSeries(index) => {
                if let Some(series) = self.series.get_mut(index) {
                    series.visible = !series.visible;
                    if !series.visible {
                        series.points.clear();
                        series.range = None;
                    }
                }
            }
            ChartCommand::Shutdown => {}
        }
    }

    /// Time span covered by the visible series.
    #[must_use]
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        let mut bounds: Option<(f64, f64)> = None;
        for (t, _) in self.visible().flat_map(|s| s.points.first().into_iter().chain(s.points.last())) {
            bounds = Some(match bounds {
                Some((lo, hi)) => (lo.min(*t), hi.max(*t)),
                None => (*t, *t),
            });
        }
        bounds
    }
}

fn value_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    points
        .iter()
        .map(|&(_, v)| v)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            None => Some((v, v)),
        })
}
