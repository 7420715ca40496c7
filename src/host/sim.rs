// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::environment::{Environment, read_signal};
use super::lifecycle::{LifecycleEvent, PluginState};
use super::replay::CaptureReplay;
use super::{
    CommandId, CommandPhase, DrawId, FlightLoopId, HostApi, HostMessage, HotKeyId, HudLine, Key,
    LoopAction, MenuId, MenuItemId, Plugin, WindowId,
};
use crate::error::{Result, TelemetryError};
use crate::sampler::SignalReader;

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone)]
pub struct LogLine {
    pub elapsed: Duration,
    pub plugin: String,
    pub message: String,
}

/// One selectable menu item as the cockpit lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub menu: String,
    pub item: String,
}

struct FlightLoop {
    id: FlightLoopId,
    owner: usize,
    last_run: Duration,
    next_due: Duration,
}

struct Draw {
    id: DrawId,
    owner: usize,
}

struct MenuItem {
    id: MenuItemId,
    name: String,
}

struct Menu {
    id: MenuId,
    owner: usize,
    title: String,
    items: Vec<MenuItem>,
}

struct Command {
    id: CommandId,
    owner: usize,
    name: String,
}

struct HotKey {
    id: HotKeyId,
    owner: usize,
    key: char,
    description: String,
}

struct Window {
    id: WindowId,
    owner: usize,
    title: String,
}

/// Host state shared by every plugin context.
struct HostCore {
    env: Box<dyn Environment>,
    aircraft: String,
    clock: Duration,
    next_id: u32,
    loops: Vec<FlightLoop>,
    draws: Vec<Draw>,
    menus: Vec<Menu>,
    commands: Vec<Command>,
    hotkeys: Vec<HotKey>,
    windows: Vec<Window>,
    log: VecDeque<LogLine>,
}

impl HostCore {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn purge(&mut self, owner: usize) -> usize {
        let before = self.registrations(owner);
        self.loops.retain(|r| r.owner != owner);
        self.draws.retain(|r| r.owner != owner);
        self.menus.retain(|r| r.owner != owner);
        self.commands.retain(|r| r.owner != owner);
        self.hotkeys.retain(|r| r.owner != owner);
        self.windows.retain(|r| r.owner != owner);
        before
    }

    fn registrations(&self, owner: usize) -> usize {
        self.loops.iter().filter(|r| r.owner == owner).count()
            + self.draws.iter().filter(|r| r.owner == owner).count()
            + self.menus.iter().filter(|r| r.owner == owner).count()
            + self.hotkeys.iter().filter(|r| r.owner == owner).count()
            + self.windows.iter().filter(|r| r.owner == owner).count()
    }

    fn push_log(&mut self, plugin: &str, message: &str) {
        info!(plugin, "{message}");
        if self.log.len() >= LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(LogLine {
            elapsed: self.clock,
            plugin: plugin.to_string(),
            message: message.to_string(),
        });
    }
}

/// A plugin's view of the host for the duration of one callback.
struct HostContext<'a> {
    core: &'a mut HostCore,
    owner: usize,
    name: &'a str,
}

impl SignalReader for HostContext<'_> {
    fn read(&self, address: &str) -> Result<f64> {
        read_signal(self.core.env.as_ref(), address)
    }
}

impl HostApi for HostContext<'_> {
    fn plugin_name(&self) -> &str {
        self.name
    }

    fn elapsed(&self) -> Duration {
        self.core.clock
    }

    fn aircraft(&self) -> &str {
        &self.core.aircraft
    }

    fn read_array(&self, path: &str, out: &mut [f64]) -> Option<usize> {
        self.core.env.read_array(path, out)
    }

    fn write(&mut self, path: &str, value: f64) -> bool {
        self.core.env.write(path, value)
    }

    fn log(&mut self, message: &str) {
        self.core.push_log(self.name, message);
    }

    fn register_flight_loop(&mut self, interval: Duration) -> FlightLoopId {
        let id = FlightLoopId(self.core.next_id());
        let now = self.core.clock;
        self.core.loops.push(FlightLoop {
            id,
            owner: self.owner,
            last_run: now,
            next_due: now + interval,
        });
        id
    }

    fn unregister_flight_loop(&mut self, id: FlightLoopId) {
        self.core.loops.retain(|l| l.id != id);
    }

    fn register_draw(&mut self) -> DrawId {
        let id = DrawId(self.core.next_id());
        self.core.draws.push(Draw {
            id,
            owner: self.owner,
        });
        id
    }

    fn unregister_draw(&mut self, id: DrawId) {
        self.core.draws.retain(|d| d.id != id);
    }

    fn create_menu(&mut self, title: &str) -> MenuId {
        let id = MenuId(self.core.next_id());
        self.core.menus.push(Menu {
            id,
            owner: self.owner,
            title: title.to_string(),
            items: Vec::new(),
        });
        id
    }

    fn append_menu_item(&mut self, menu: MenuId, name: &str) -> MenuItemId {
        let id = MenuItemId(self.core.next_id());
        if let Some(menu) = self.core.menus.iter_mut().find(|m| m.id == menu) {
            menu.items.push(MenuItem {
                id,
                name: name.to_string(),
            });
        }
        id
    }

    fn set_menu_item_name(&mut self, item: MenuItemId, name: &str) {
        if let Some(entry) = self
            .core
            .menus
            .iter_mut()
            .flat_map(|m| m.items.iter_mut())
            .find(|i| i.id == item)
        {
            entry.name = name.to_string();
        }
    }

    fn destroy_menu(&mut self, menu: MenuId) {
        self.core.menus.retain(|m| m.id != menu);
    }

    fn create_command(&mut self, name: &str, description: &str) -> CommandId {
        let id = CommandId(self.core.next_id());
        debug!(plugin = self.name, command = name, "{description}");
        self.core.commands.push(Command {
            id,
            owner: self.owner,
            name: name.to_string(),
        });
        id
    }

    fn register_hotkey(&mut self, key: char, description: &str) -> HotKeyId {
        let id = HotKeyId(self.core.next_id());
        self.core.hotkeys.push(HotKey {
            id,
            owner: self.owner,
            key,
            description: description.to_string(),
        });
        id
    }

    fn unregister_hotkey(&mut self, id: HotKeyId) {
        self.core.hotkeys.retain(|h| h.id != id);
    }

    fn create_window(&mut self, title: &str) -> WindowId {
        let id = WindowId(self.core.next_id());
        self.core.windows.push(Window {
            id,
            owner: self.owner,
            title: title.to_string(),
        });
        id
    }

    fn destroy_window(&mut self, id: WindowId) {
        self.core.windows.retain(|w| w.id != id);
    }
}

struct PluginSlot {
    plugin: Box<dyn Plugin>,
    state: PluginState,
    name: String,
}

/// Drives a set of plugins on a simulated clock over an `Environment`.
pub struct SimHost {
    core: HostCore,
    slots: Vec<PluginSlot>,
}

impl SimHost {
    #[must_use]
    pub fn new(env: Box<dyn Environment>, aircraft: &str) -> Self {
        Self {
            core: HostCore {
                env,
                aircraft: aircraft.to_string(),
                clock: Duration::ZERO,
                next_id: 0,
                loops: Vec::new(),
                draws: Vec::new(),
                menus: Vec::new(),
                commands: Vec::new(),
                hotkeys: Vec::new(),
                windows: Vec::new(),
                log: VecDeque::with_capacity(LOG_CAPACITY),
            },
            slots: Vec::new(),
        }
    }

    pub fn add(&mut self, plugin: Box<dyn Plugin>) {
        let name = plugin.info().name.to_string();
        self.slots.push(PluginSlot {
            plugin,
            state: PluginState::Uninitialized,
            name,
        });
    }

    fn with_plugin<R>(
        &mut self,
        index: usize,
        f: impl FnOnce(&mut dyn Plugin, &mut dyn HostApi) -> R,
    ) -> R {
        let slot = &mut self.slots[index];
        let mut ctx = HostContext {
            core: &mut self.core,
            owner: index,
            name: &slot.name,
        };
        f(slot.plugin.as_mut(), &mut ctx)
    }

    fn is_enabled(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.state.is_enabled())
    }

    /// Runs one lifecycle event on one plugin.
    ///
    /// # Errors
    ///
    /// `IllegalTransition` if the event is not legal in the plugin's current
    /// state; nothing is called in that case. A plugin whose `start` or
    /// `enable` fails keeps its state and the failure is logged.
    pub fn apply(&mut self, index: usize, event: LifecycleEvent) -> Result<PluginState> {
        let from = self.slots.get(index).map_or(PluginState::Stopped, |s| s.state);
        let to = from.transition(event)?;

        let outcome = self.with_plugin(index, |plugin, host| match event {
            LifecycleEvent::Start => plugin.start(host),
            LifecycleEvent::Enable => plugin.enable(host),
            LifecycleEvent::Disable => {
                plugin.disable(host);
                Ok(())
            }
            LifecycleEvent::Stop => {
                plugin.stop(host);
                Ok(())
            }
        });

        if let Err(e) = outcome {
            let name = self.slots[index].name.clone();
            self.core
                .push_log(&name, &format!("{event:?} failed: {e:#}"));
            if event == LifecycleEvent::Start {
                self.core.purge(index);
            }
            return Ok(from);
        }

        if event == LifecycleEvent::Stop {
            let leftover = self.core.purge(index);
            if leftover > 0 {
                warn!(
                    plugin = %self.slots[index].name,
                    leftover, "plugin stopped with live registrations"
                );
            }
        }
        self.slots[index].state = to;
        Ok(to)
    }

    /// Starts every plugin that has not been started yet.
    pub fn start_all(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].state == PluginState::Uninitialized {
                self.apply_logged(index, LifecycleEvent::Start);
            }
        }
    }

    /// Enables every started or disabled plugin, then tells the newly enabled
    /// ones which aircraft is loaded.
    pub fn enable_all(&mut self) {
        let message = HostMessage::AircraftLoaded {
            path: self.core.aircraft.clone(),
        };
        for index in 0..self.slots.len() {
            if matches!(
                self.slots[index].state,
                PluginState::Started | PluginState::Disabled
            ) && self.apply_logged(index, LifecycleEvent::Enable) == PluginState::Enabled
            {
                self.with_plugin(index, |plugin, host| plugin.receive_message(host, &message));
            }
        }
    }

    /// Disables then stops every plugin.
    pub fn shutdown(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].state == PluginState::Enabled {
                self.apply_logged(index, LifecycleEvent::Disable);
            }
        }
        for index in 0..self.slots.len() {
            if matches!(
                self.slots[index].state,
                PluginState::Started | PluginState::Disabled
            ) {
                self.apply_logged(index, LifecycleEvent::Stop);
            }
        }
    }

    fn apply_logged(&mut self, index: usize, event: LifecycleEvent) -> PluginState {
        match self.apply(index, event) {
            Ok(state) => state,
            Err(e @ TelemetryError::IllegalTransition { .. }) => {
                warn!(plugin = %self.slots[index].name, "{e}");
                self.slots[index].state
            }
            Err(e) => {
                warn!(plugin = %self.slots[index].name, "lifecycle error: {e}");
                self.slots[index].state
            }
        }
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<PluginState> {
        self.slots.iter().find(|s| s.name == name).map(|s| s.state)
    }

    /// Advances simulated time and runs every flight loop that has come due,
    /// in registration order.
    pub fn tick(&mut self, dt: Duration) {
        self.core.env.advance(dt.as_secs_f64());
        self.core.clock += dt;
        let now = self.core.clock;

        let due: Vec<(FlightLoopId, usize)> = self
            .core
            .loops
            .iter()
            .filter(|l| l.next_due <= now)
            .map(|l| (l.id, l.owner))
            .collect();

        for (id, owner) in due {
            // An earlier callback this tick may have unregistered it.
            let Some(last_run) = self
                .core
                .loops
                .iter()
                .find(|l| l.id == id)
                .map(|l| l.last_run)
            else {
                continue;
            };
            if !self.is_enabled(owner) {
                continue;
            }

            let since_last = now.saturating_sub(last_run);
            let action = self.with_plugin(owner, |plugin, host| {
                plugin.flight_loop(host, id, since_last)
            });

            match action {
                LoopAction::Reschedule(interval) => {
                    if let Some(l) = self.core.loops.iter_mut().find(|l| l.id == id) {
                        l.last_run = now;
                        l.next_due = now + interval;
                    }
                }
                LoopAction::Unschedule => self.core.loops.retain(|l| l.id != id),
            }
        }
    }

    /// Collects HUD lines from every draw callback, in registration order.
    pub fn draw(&mut self) -> Vec<HudLine> {
        let draws: Vec<(DrawId, usize)> = self.core.draws.iter().map(|d| (d.id, d.owner)).collect();
        let mut lines = Vec::new();
        for (id, owner) in draws {
            if self.is_enabled(owner) {
                lines.extend(self.with_plugin(owner, |plugin, host| plugin.draw(host, id)));
            }
        }
        lines
    }

    /// Routes a key: an open window takes everything, then hotkeys, then
    /// `1`..`9` select menu items in listing order. Returns `false` if
    /// nobody took it.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if let Some((id, owner)) = self.active_window() {
            self.with_plugin(owner, |plugin, host| plugin.window_key(host, id, key));
            return true;
        }

        let Key::Char(c) = key else {
            return false;
        };

        if let Some((id, owner)) = self
            .core
            .hotkeys
            .iter()
            .find(|h| h.key == c && self.is_enabled(h.owner))
            .map(|h| (h.id, h.owner))
        {
            self.with_plugin(owner, |plugin, host| plugin.hotkey(host, id));
            return true;
        }

        if let Some(digit) = c.to_digit(10)
            && digit > 0
            && let Some((id, owner)) = self.menu_item_at(digit as usize - 1)
        {
            self.with_plugin(owner, |plugin, host| plugin.menu_selected(host, id));
            return true;
        }
        false
    }

    fn active_window(&self) -> Option<(WindowId, usize)> {
        self.core
            .windows
            .iter()
            .rev()
            .find(|w| self.is_enabled(w.owner))
            .map(|w| (w.id, w.owner))
    }

    fn menu_item_at(&self, position: usize) -> Option<(MenuItemId, usize)> {
        self.core
            .menus
            .iter()
            .filter(|m| self.is_enabled(m.owner))
            .flat_map(|m| m.items.iter().map(move |i| (i.id, m.owner)))
            .nth(position)
    }

    /// Runs a command by name: one `Begin` then one `End`. Returns `false`
    /// if no enabled plugin owns it.
    pub fn run_command(&mut self, name: &str) -> bool {
        let Some((id, owner)) = self
            .core
            .commands
            .iter()
            .find(|c| c.name == name && self.is_enabled(c.owner))
            .map(|c| (c.id, c.owner))
        else {
            return false;
        };
        self.with_plugin(owner, |plugin, host| {
            plugin.command(host, id, CommandPhase::Begin);
            plugin.command(host, id, CommandPhase::End);
        });
        true
    }

    /// Flight loops currently scheduled, across all plugins.
    #[must_use]
    pub fn scheduled_loops(&self) -> usize {
        self.core.loops.len()
    }

    #[must_use]
    pub fn window_open(&self) -> bool {
        self.active_window().is_some()
    }

    #[must_use]
    pub fn window_title(&self) -> Option<&str> {
        let (id, _) = self.active_window()?;
        self.core
            .windows
            .iter()
            .find(|w| w.id == id)
            .map(|w| w.title.as_str())
    }

    #[must_use]
    pub fn menu_entries(&self) -> Vec<MenuEntry> {
        self.core
            .menus
            .iter()
            .filter(|m| self.is_enabled(m.owner))
            .flat_map(|m| {
                m.items.iter().map(move |i| MenuEntry {
                    menu: m.title.clone(),
                    item: i.name.clone(),
                })
            })
            .collect()
    }

    #[must_use]
    pub fn hotkeys(&self) -> Vec<(char, String)> {
        self.core
            .hotkeys
            .iter()
            .filter(|h| self.is_enabled(h.owner))
            .map(|h| (h.key, h.description.clone()))
            .collect()
    }

    #[must_use]
    pub fn command_names(&self) -> Vec<&str> {
        self.core.commands.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn log_lines(&self) -> impl Iterator<Item = &LogLine> {
        self.core.log.iter()
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.core.clock
    }

    #[must_use]
    pub fn aircraft(&self) -> &str {
        &self.core.aircraft
    }

    pub fn environment_mut(&mut self) -> &mut dyn Environment {
        self.core.env.as_mut()
    }

    pub fn replay_mut(&mut self) -> Option<&mut CaptureReplay> {
        self.core.env.replay()
    }
}

impl Drop for SimHost {
    fn drop(&mut self) {
        self.shutdown();
    }
}
