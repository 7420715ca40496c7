// SPDX-License-Identifier: MIT
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::host::lifecycle::{LifecycleEvent, PluginState};

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("signal unavailable: {address}")]
    SignalUnavailable { address: String },

    #[error("cannot open FDR destination {}: {source}", path.display())]
    DestinationUnopenable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("FDR write failed: {source}")]
    WriteFailure {
        #[source]
        source: std::io::Error,
    },

    #[error("render loop did not stop within {timeout:?}")]
    RenderTeardownTimeout { timeout: Duration },

    #[error("illegal plugin transition: {event:?} while {from:?}")]
    IllegalTransition {
        from: PluginState,
        event: LifecycleEvent,
    },

    #[error("invalid signal address: {0}")]
    InvalidSignal(String),
}

impl TelemetryError {
    #[must_use]
    pub fn unavailable(address: &str) -> Self {
        Self::SignalUnavailable {
            address: address.to_string(),
        }
    }
}
