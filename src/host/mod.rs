// SPDX-License-Identifier: MIT
//! The plugin host: lifecycle, registration API and the simulated host that
//! drives plugins from the terminal front-end.

pub mod environment;
pub mod lifecycle;
pub mod replay;
pub mod sim;

use std::time::Duration;

use anyhow::Result;

use crate::sampler::SignalReader;

pub use environment::{EnvReader, Environment, SimulatedAircraft};
pub use lifecycle::{LifecycleEvent, PluginState};
pub use replay::CaptureReplay;
pub use sim::SimHost;

macro_rules! handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(pub(crate) u32);
        )*
    };
}

handle!(
    /// A registered periodic callback.
    FlightLoopId,
    DrawId,
    MenuId,
    MenuItemId,
    CommandId,
    HotKeyId,
    /// While any window exists it owns the screen and receives every key.
    WindowId,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudColor {
    White,
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudLine {
    pub text: String,
    pub color: HudColor,
}

impl HudLine {
    #[must_use]
    pub fn new(text: impl Into<String>, color: HudColor) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    Enter,
    Esc,
    Tab,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    Begin,
    Continue,
    End,
}

/// What a flight loop callback wants next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Run again after this interval; zero means every tick.
    Reschedule(Duration),
    Unschedule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    AircraftLoaded { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: &'static str,
    pub signature: &'static str,
    pub description: &'static str,
}

/// Everything a plugin may ask of the host. Each callback receives one scoped
/// to the calling plugin; registrations are owned by that plugin.
pub trait HostApi: SignalReader {
    fn plugin_name(&self) -> &str;

    /// Time since the host started.
    fn elapsed(&self) -> Duration;

    /// Path of the loaded aircraft.
    fn aircraft(&self) -> &str;

    fn read_array(&self, path: &str, out: &mut [f64]) -> Option<usize>;

    /// Returns `false` if the dataref is unknown or read-only.
    fn write(&mut self, path: &str, value: f64) -> bool;

    fn log(&mut self, message: &str);

    fn register_flight_loop(&mut self, interval: Duration) -> FlightLoopId;
    fn unregister_flight_loop(&mut self, id: FlightLoopId);

    fn register_draw(&mut self) -> DrawId;
    fn unregister_draw(&mut self, id: DrawId);

    fn create_menu(&mut self, title: &str) -> MenuId;
    fn append_menu_item(&mut self, menu: MenuId, name: &str) -> MenuItemId;
    fn set_menu_item_name(&mut self, item: MenuItemId, name: &str);
    fn destroy_menu(&mut self, menu: MenuId);

    fn create_command(&mut self, name: &str, description: &str) -> CommandId;

    fn register_hotkey(&mut self, key: char, description: &str) -> HotKeyId;
    fn unregister_hotkey(&mut self, id: HotKeyId);

    fn create_window(&mut self, title: &str) -> WindowId;
    fn destroy_window(&mut self, id: WindowId);
}

/// A loadable plugin. The host drives `start`/`enable`/`disable`/`stop`
/// through the lifecycle in [`lifecycle`]; callbacks only reach enabled
/// plugins.
pub trait Plugin {
    fn info(&self) -> PluginInfo;

    /// # Errors
    ///
    /// A failed start leaves the plugin unloaded.
    fn start(&mut self, host: &mut dyn HostApi) -> Result<()>;

    /// # Errors
    ///
    /// A failed enable leaves the plugin in its previous state.
    fn enable(&mut self, host: &mut dyn HostApi) -> Result<()>;

    fn disable(&mut self, host: &mut dyn HostApi);

    fn stop(&mut self, host: &mut dyn HostApi);

    fn receive_message(&mut self, _host: &mut dyn HostApi, _message: &HostMessage) {}

    fn flight_loop(
        &mut self,
        _host: &mut dyn HostApi,
        _id: FlightLoopId,
        _since_last: Duration,
    ) -> LoopAction {
        LoopAction::Unschedule
    }

    fn draw(&mut self, _host: &mut dyn HostApi, _id: DrawId) -> Vec<HudLine> {
        Vec::new()
    }

    fn menu_selected(&mut self, _host: &mut dyn HostApi, _item: MenuItemId) {}

    fn command(&mut self, _host: &mut dyn HostApi, _id: CommandId, _phase: CommandPhase) {}

    fn hotkey(&mut self, _host: &mut dyn HostApi, _id: HotKeyId) {}

    fn window_key(&mut self, _host: &mut dyn HostApi, _id: WindowId, _key: Key) {}
}
