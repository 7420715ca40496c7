// SPDX-License-Identifier: MIT
//! The terminal cockpit: what the simulated host shows between windows.

pub mod app;
pub mod input;
pub mod layout;
pub mod panels;
pub mod replay_controls;
pub mod theme;
