// SPDX-License-Identifier: MIT
use anyhow::Result;

use crate::host::environment::MAG_HEADING;
use crate::host::{CommandId, CommandPhase, HostApi, HotKeyId, Plugin, PluginInfo};

pub const COMMAND: &str = "paraviz/autopilot/heading_plus_10";
pub const HOTKEY: char = 'h';
const STEP_DEGREES: f64 = 10.0;

/// Turns the aircraft 10 degrees right, from a command or the `h` hotkey.
#[derive(Default)]
pub struct HeadingCommand {
    command: Option<CommandId>,
    hotkey: Option<HotKeyId>,
}

impl HeadingCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(host: &mut dyn HostApi) {
        let heading = match host.read(MAG_HEADING) {
            Ok(heading) => heading,
            Err(e) => {
                host.log(&format!("Heading not changed: {e}"));
                return;
            }
        };
        let new = (heading + STEP_DEGREES).rem_euclid(360.0);
        if host.write(MAG_HEADING, new) {
            host.log(&format!("Heading changed from {heading:.1} to {new:.1}"));
        } else {
            host.log(&format!("Heading not changed: {MAG_HEADING} is read-only"));
        }
    }
}

impl Plugin for HeadingCommand {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "Heading Command",
            signature: "paraviz.autopilot.heading",
            description: "Adds 10 degrees to the magnetic heading",
        }
    }

    fn start(&mut self, host: &mut dyn HostApi) -> Result<()> {
        self.command = Some(host.create_command(COMMAND, "Increase heading by 10 degrees"));
        Ok(())
    }

    fn enable(&mut self, host: &mut dyn HostApi) -> Result<()> {
        self.hotkey = Some(host.register_hotkey(HOTKEY, "Heading +10"));
        Ok(())
    }

    fn disable(&mut self, host: &mut dyn HostApi) {
        if let Some(id) = self.hotkey.take() {
            host.unregister_hotkey(id);
        }
    }

    fn stop(&mut self, _host: &mut dyn HostApi) {
        self.command = None;
    }

    fn command(&mut self, host: &mut dyn HostApi, id: CommandId, phase: CommandPhase) {
        if phase == CommandPhase::Begin && self.command == Some(id) {
            Self::bump(host);
        }
    }

    fn hotkey(&mut self, host: &mut dyn HostApi, id: HotKeyId) {
        if self.hotkey == Some(id) {
            Self::bump(host);
        }
    }
}
