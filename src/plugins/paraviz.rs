// SPDX-License-Identifier: MIT
//! Live chart of a few signals in a window of its own.
//!
//! The flight loop samples into a shared [`HistoryStore`]; a [`RenderSession`]
//! redraws from that store on its own thread and schedule. Closing the window
//! only raises a flag: the teardown itself runs on the next flight-loop tick,
//! on the sampling side.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::ToggleMenu;
use crate::chart::{ChartCommand, ChartRenderer, RenderExit, RenderSession};
use crate::config::ParavizConfig;
use crate::host::{
    CommandId, CommandPhase, DrawId, FlightLoopId, HostApi, HudColor, HudLine, Key, LoopAction,
    MenuItemId, Plugin, PluginInfo, WindowId,
};
use crate::sampler::history::HistoryStore;
use crate::sampler::mailbox::Mailbox;
use crate::sampler::signals::Sampler;
use crate::sampler::Sample;
use crate::toggle::{ToggleController, ToggleTarget};

pub const TOGGLE_COMMAND: &str = "paraviz/plot/toggle";
pub const WINDOW_TITLE: &str = "ParaViz";

/// Builds a renderer on the render thread, once per session.
pub type RendererFactory =
    Arc<dyn Fn() -> anyhow::Result<Box<dyn ChartRenderer>> + Send + Sync>;

struct LivePlot {
    config: ParavizConfig,
    factory: RendererFactory,
    sampler: Sampler,
    store: Arc<HistoryStore>,
    overlay: Arc<Mailbox<Vec<HudLine>>>,
    session: Option<RenderSession>,
    window: Option<WindowId>,
    flight_loop: Option<FlightLoopId>,
    draw: Option<DrawId>,
    close_requested: bool,
}

impl LivePlot {
    fn new(config: ParavizConfig, factory: RendererFactory) -> Self {
        let sampler = Sampler::new(config.signals.clone());
        let names: Vec<String> = sampler.enabled().map(|s| s.name.clone()).collect();
        Self {
            store: Arc::new(HistoryStore::new(names, config.history_capacity())),
            overlay: Arc::new(Mailbox::new()),
            sampler,
            factory,
            session: None,
            window: None,
            flight_loop: None,
            draw: None,
            close_requested: false,
            config,
        }
    }

    fn period(&self) -> Duration {
        Duration::from_millis(self.config.sample_period_ms)
    }

    /// The window asked to close, or the render loop ended by itself.
    fn should_close(&mut self) -> bool {
        self.close_requested
            || self
                .session
                .as_mut()
                .is_some_and(|s| s.poll_exit().is_some())
    }

    fn tick(&mut self, host: &mut dyn HostApi) {
        let result = self.sampler.sample(&*host, host.elapsed());
        for address in &result.newly_unavailable {
            host.log(&format!("Signal unavailable, plotting NaN: {address}"));
        }
        self.store.append(&result.sample);
        self.overlay.put(overlay_lines(&result.sample));
    }

    fn forward(&self, command: ChartCommand) {
        if let Some(session) = &self.session {
            session.send(command);
        }
    }
}

/// Latest value of every plotted signal, shown above the chart.
fn overlay_lines(sample: &Sample) -> Vec<HudLine> {
    sample
        .readings
        .iter()
        .map(|r| {
            if r.value.is_nan() {
                HudLine::new(format!("{} ---", r.name), HudColor::Red)
            } else {
                HudLine::new(format!("{} {:.1}", r.name, r.value), HudColor::White)
            }
        })
        .collect()
}

impl<'h> ToggleTarget<dyn HostApi + 'h> for LivePlot {
    fn is_active(&self) -> bool {
        self.session.is_some()
    }

    fn activate(&mut self, host: &mut (dyn HostApi + 'h)) -> Result<()> {
        self.store.clear();
        self.overlay.take();
        self.close_requested = false;
        self.sampler.restart(host.elapsed());

        let window = host.create_window(WINDOW_TITLE);
        let factory = Arc::clone(&self.factory);
        let session = match RenderSession::open(
            Arc::clone(&self.store),
            Arc::clone(&self.overlay),
            Duration::from_millis(self.config.redraw_ms),
            move || factory(),
        ) {
            Ok(session) => session,
            Err(e) => {
                host.destroy_window(window);
                return Err(e);
            }
        };

        self.session = Some(session);
        self.window = Some(window);
        self.flight_loop = Some(host.register_flight_loop(self.period()));
        self.draw = Some(host.register_draw());
        host.log("Plotting --> Started.");
        Ok(())
    }

    fn deactivate(&mut self, host: &mut (dyn HostApi + 'h)) {
        if let Some(id) = self.flight_loop.take() {
            host.unregister_flight_loop(id);
        }
        if let Some(id) = self.draw.take() {
            host.unregister_draw(id);
        }
        if let Some(session) = self.session.take() {
            let timeout = Duration::from_millis(self.config.teardown_timeout_ms);
            match session.shutdown(timeout) {
                Ok(RenderExit::Stopped) => host.log("Plotting --> Stopped."),
                Ok(RenderExit::Failed(reason)) => {
                    host.log(&format!("Plotting --> Stopped: {reason}"));
                }
                Err(e) => host.log(&format!("Plotting --> Stopped: {e}")),
            }
        }
        if let Some(window) = self.window.take() {
            host.destroy_window(window);
        }
        self.close_requested = false;
    }
}

/// Live chart plugin.
pub struct Paraviz {
    toggle: ToggleController,
    plot: LivePlot,
    menu: Option<ToggleMenu>,
    command: Option<CommandId>,
}

impl Paraviz {
    #[must_use]
    pub fn new(config: &ParavizConfig, factory: RendererFactory) -> Self {
        Self {
            toggle: ToggleController::new(),
            plot: LivePlot::new(config.clone(), factory),
            menu: None,
            command: None,
        }
    }

    fn set(&mut self, host: &mut dyn HostApi, on: bool) {
        if let Err(e) = self.toggle.set(&mut self.plot, host, on) {
            host.log(&format!("Plotting --> failed to start: {e:#}"));
        }
        if let Some(menu) = self.menu {
            menu.refresh(host, self.toggle.is_on());
        }
    }
}

impl Plugin for Paraviz {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "ParaViz",
            signature: "paraviz.plot",
            description: "Plots timeseries data in a live chart",
        }
    }

    fn start(&mut self, host: &mut dyn HostApi) -> Result<()> {
        self.menu = Some(ToggleMenu::create(host, "ParaViz"));
        self.command = Some(host.create_command(TOGGLE_COMMAND, "Toggle the live chart"));
        Ok(())
    }

    fn enable(&mut self, _host: &mut dyn HostApi) -> Result<()> {
        Ok(())
    }

    fn disable(&mut self, host: &mut dyn HostApi) {
        self.set(host, false);
    }

    fn stop(&mut self, host: &mut dyn HostApi) {
        self.set(host, false);
        if let Some(menu) = self.menu.take() {
            menu.destroy(host);
        }
    }

    fn flight_loop(
        &mut self,
        host: &mut dyn HostApi,
        id: FlightLoopId,
        _since_last: Duration,
    ) -> LoopAction {
        if self.plot.flight_loop != Some(id) {
            return LoopAction::Unschedule;
        }
        if self.plot.should_close() {
            self.set(host, false);
            return LoopAction::Unschedule;
        }
        self.plot.tick(host);
        LoopAction::Reschedule(self.plot.period())
    }

    fn draw(&mut self, _host: &mut dyn HostApi, id: DrawId) -> Vec<HudLine> {
        if self.plot.draw != Some(id) {
            return Vec::new();
        }
        vec![HudLine::new("PLOTTING TIMESERIES DATA ...", HudColor::White)]
    }

    fn menu_selected(&mut self, host: &mut dyn HostApi, item: MenuItemId) {
        if self.menu.is_some_and(|m| m.item == item) {
            let want = !self.toggle.is_on();
            self.set(host, want);
        }
    }

    fn command(&mut self, host: &mut dyn HostApi, id: CommandId, phase: CommandPhase) {
        if phase == CommandPhase::Begin && self.command == Some(id) {
            let want = !self.toggle.is_on();
            self.set(host, want);
        }
    }

    fn window_key(&mut self, _host: &mut dyn HostApi, id: WindowId, key: Key) {
        if self.plot.window != Some(id) {
            return;
        }
        match key {
            Key::Char(' ') => self.plot.forward(ChartCommand::TogglePause),
            Key::Char('r') => self.plot.forward(ChartCommand::Reset),
            Key::Char('q') | Key::Esc => self.plot.close_requested = true,
            Key::Char(c) => {
                if let Some(digit) = c.to_digit(10)
                    && digit > 0
                {
                    self.plot.forward(ChartCommand::ToggleSeries(digit as usize - 1));
                }
            }
            _ => {}
        }
    }
}
