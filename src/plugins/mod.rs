// SPDX-License-Identifier: MIT
//! The plugin set: FDR recorder, live chart, HUD parameter display and the
//! heading command.

pub mod fdr_recorder;
pub mod heading_command;
pub mod param_display;
pub mod paraviz;

use crate::host::{HostApi, MenuId, MenuItemId};

pub use fdr_recorder::FdrRecorder;
pub use heading_command::HeadingCommand;
pub use param_display::ParamDisplay;
pub use paraviz::{Paraviz, RendererFactory};

const TOGGLE_ON: &str = "Toggle: ON";
const TOGGLE_OFF: &str = "Toggle: OFF";

/// A plugin menu with a single on/off item whose label names the action it
/// will perform.
#[derive(Debug, Clone, Copy)]
struct ToggleMenu {
    menu: MenuId,
    item: MenuItemId,
}

impl ToggleMenu {
    fn create(host: &mut dyn HostApi, title: &str) -> Self {
        let menu = host.create_menu(title);
        let item = host.append_menu_item(menu, TOGGLE_ON);
        Self { menu, item }
    }

    fn refresh(self, host: &mut dyn HostApi, on: bool) {
        host.set_menu_item_name(self.item, if on { TOGGLE_OFF } else { TOGGLE_ON });
    }

    fn destroy(self, host: &mut dyn HostApi) {
        host.destroy_menu(self.menu);
    }
}
