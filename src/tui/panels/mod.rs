// SPDX-License-Identifier: MIT
pub mod header;
pub mod hud;
pub mod log;
pub mod menus;
