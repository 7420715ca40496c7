// SPDX-License-Identifier: MIT
//! Live chart sink: a render loop on its own thread that reads the history
//! store on its own schedule.

pub mod session;
pub mod terminal;
pub mod view;

use anyhow::Result;

use crate::host::HudLine;

pub use session::{ChartCommand, RenderExit, RenderSession};
pub use terminal::TerminalRenderer;
pub use view::ChartView;

/// Draws one frame of the chart. Lives on the render thread only.
pub trait ChartRenderer {
    /// # Errors
    ///
    /// Any error ends the render session.
    fn draw(&mut self, view: &ChartView, overlay: &[HudLine]) -> Result<()>;
}

impl<R: ChartRenderer + ?Sized> ChartRenderer for Box<R> {
    fn draw(&mut self, view: &ChartView, overlay: &[HudLine]) -> Result<()> {
        (**self).draw(view, overlay)
    }
}
