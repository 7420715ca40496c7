// SPDX-License-Identifier: MIT
//! Flight-simulator telemetry plugins and the host that drives them: signal
//! sampling, FDR logging, binary captures, a live chart and a terminal
//! cockpit.
#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_panics_doc)]

pub mod capture;
pub mod chart;
pub mod config;
pub mod error;
pub mod fdr;
pub mod host;
pub mod plugins;
pub mod sampler;
pub mod toggle;
pub mod tui;
