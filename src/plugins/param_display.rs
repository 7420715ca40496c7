// SPDX-License-Identifier: MIT
use anyhow::Result;

use super::ToggleMenu;
use crate::config::DisplayConfig;
use crate::host::{
    CommandId, CommandPhase, DrawId, HostApi, HudColor, HudLine, MenuItemId, Plugin, PluginInfo,
};
use crate::sampler::Signal;
use crate::sampler::signals::Sampler;
use crate::toggle::{ToggleController, ToggleTarget};

pub const TOGGLE_COMMAND: &str = "paraviz/display/toggle";

struct HudReadout {
    sampler: Sampler,
    draw: Option<DrawId>,
}

impl HudReadout {
    fn rows(&mut self, host: &mut dyn HostApi) -> Vec<HudLine> {
        let result = self.sampler.sample(&*host, host.elapsed());
        for address in &result.newly_unavailable {
            host.log(&format!("Signal unavailable: {address}"));
        }
        self.sampler
            .enabled()
            .zip(&result.sample.readings)
            .map(|(signal, reading)| row(signal, reading.value))
            .collect()
    }
}

fn row(signal: &Signal, value: f64) -> HudLine {
    let label = signal.column().to_uppercase();
    if value.is_nan() {
        return HudLine::new(format!("{label}  ---"), HudColor::Red);
    }
    HudLine::new(format!("{label}  {value:.0}"), severity(signal, value))
}

fn severity(signal: &Signal, value: f64) -> HudColor {
    let magnitude = value.abs();
    if signal.alert_above.is_some_and(|limit| magnitude >= limit) {
        HudColor::Red
    } else if signal.warn_above.is_some_and(|limit| magnitude >= limit) {
        HudColor::Yellow
    } else {
        HudColor::Green
    }
}

impl<'h> ToggleTarget<dyn HostApi + 'h> for HudReadout {
    fn is_active(&self) -> bool {
        self.draw.is_some()
    }

    fn activate(&mut self, host: &mut (dyn HostApi + 'h)) -> Result<()> {
        self.sampler.restart(host.elapsed());
        self.draw = Some(host.register_draw());
        host.log("Display --> Started.");
        Ok(())
    }

    fn deactivate(&mut self, host: &mut (dyn HostApi + 'h)) {
        if let Some(id) = self.draw.take() {
            host.unregister_draw(id);
        }
        host.log("Display --> Stopped.");
    }
}

/// Shows the display signals on the HUD, one coloured row each.
pub struct ParamDisplay {
    toggle: ToggleController,
    readout: HudReadout,
    menu: Option<ToggleMenu>,
    command: Option<CommandId>,
}

impl ParamDisplay {
    #[must_use]
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            toggle: ToggleController::new(),
            readout: HudReadout {
                sampler: Sampler::new(config.signals.clone()),
                draw: None,
            },
            menu: None,
            command: None,
        }
    }

    fn set(&mut self, host: &mut dyn HostApi, on: bool) {
        if let Err(e) = self.toggle.set(&mut self.readout, host, on) {
            host.log(&format!("Display --> failed to start: {e:#}"));
        }
        if let Some(menu) = self.menu {
            menu.refresh(host, self.toggle.is_on());
        }
    }

    fn flip(&mut self, host: &mut dyn HostApi) {
        let want = !self.toggle.is_on();
        self.set(host, want);
    }
}

impl Plugin for ParamDisplay {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "Display Parameters",
            signature: "paraviz.display",
            description: "Displays flight parameters on the HUD",
        }
    }

    fn start(&mut self, host: &mut dyn HostApi) -> Result<()> {
        self.menu = Some(ToggleMenu::create(host, "Display Parameters"));
        self.command = Some(host.create_command(TOGGLE_COMMAND, "Toggle the parameter display"));
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

    fn draw(&mut self, host: &mut dyn HostApi, id: DrawId) -> Vec<HudLine> {
        if self.readout.draw != Some(id) {
            return Vec::new();
        }
        self.readout.rows(host)
    }

    fn menu_selected(&mut self, host: &mut dyn HostApi, item: MenuItemId) {
        if self.menu.is_some_and(|m| m.item == item) {
            self.flip(host);
        }
    }

    fn command(&mut self, host: &mut dyn HostApi, id: CommandId, phase: CommandPhase) {
        if phase == CommandPhase::Begin && self.command == Some(id) {
            self.flip(host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::environment::{CAS, PRESSURE_ALTITUDE};
    use crate::host::{SimHost, SimulatedAircraft};

    fn make_host(config: &DisplayConfig) -> SimHost {
        let mut host = SimHost::new(Box::new(SimulatedAircraft::new()), "Aircraft/Test/Test.acf");
        host.add(Box::new(ParamDisplay::new(config)));
        host.start_all();
        host.enable_all();
        host
    }

    #[test]
    fn default_rows_at_takeoff() {
        let mut host = make_host(&DisplayConfig::default());
        assert!(host.draw().is_empty());

        host.run_command(TOGGLE_COMMAND);
        let rows = host.draw();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0], HudLine::new("ALTITUDE  1500", HudColor::Green));
        assert_eq!(rows[4], HudLine::new("CAS  180", HudColor::Green));
        assert!(rows[6].text.starts_with("N1A1  9"));
        assert_eq!(rows[6].color, HudColor::Red);
        assert_eq!(rows[5].color, HudColor::Yellow);

        host.run_command(TOGGLE_COMMAND);
        assert!(host.draw().is_empty());
        let log: Vec<String> = host.log_lines().map(|l| l.message.clone()).collect();
        assert_eq!(log, vec!["Display --> Started.", "Display --> Stopped."]);
    }

    #[test]
    fn unavailable_signal_shows_dashes_and_logs_once() {
        let config = DisplayConfig {
            signals: vec![
                Signal::new("alt", PRESSURE_ALTITUDE),
                Signal::new("oat", "sim/weather/missing"),
            ],
        };
        let mut host = make_host(&config);
        host.handle_key(crate::host::Key::Char('1'));

        for _ in 0..3 {
            let rows = host.draw();
            assert_eq!(rows[1], HudLine::new("OAT  ---", HudColor::Red));
        }
        let unavailable = host
            .log_lines()
            .filter(|l| l.message == "Signal unavailable: sim/weather/missing")
            .count();
        assert_eq!(unavailable, 1);
    }

    #[test]
    fn thresholds_colour_rows() {
        let signal = Signal::new("cas", CAS).warn_above(250.0).alert_above(300.0);
        assert_eq!(severity(&signal, 249.0), HudColor::Green);
        assert_eq!(severity(&signal, 250.0), HudColor::Yellow);
        assert_eq!(severity(&signal, -320.0), HudColor::Red);
        assert_eq!(row(&signal, 251.4).text, "CAS  251");
    }
}
