// SPDX-License-Identifier: MIT
pub mod history;
pub mod mailbox;
pub mod signals;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

fn default_enabled() -> bool {
    true
}

/// One named numeric quantity read from the simulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub positional: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub warn_above: Option<f64>,
    #[serde(default)]
    pub alert_above: Option<f64>,
}

impl Signal {
    #[must_use]
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            column: None,
            positional: false,
            enabled: true,
            warn_above: None,
            alert_above: None,
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    #[must_use]
    pub fn positional(mut self) -> Self {
        self.positional = true;
        self
    }

    #[must_use]
    pub fn warn_above(mut self, limit: f64) -> Self {
        self.warn_above = Some(limit);
        self
    }

    #[must_use]
    pub fn alert_above(mut self, limit: f64) -> Self {
        self.alert_above = Some(limit);
        self
    }

    /// Column label used in FDR headers; falls back to the signal name.
    #[must_use]
    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// Largest element index an address may name. Host arrays are far smaller.
pub const MAX_ARRAY_INDEX: usize = 4095;

/// A parsed dataref address: `path` or `path[index]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalAddress<'a> {
    pub path: &'a str,
    pub index: Option<usize>,
}

/// Splits an optional trailing `[index]` off a dataref address.
///
/// # Errors
///
/// Returns `InvalidSignal` for an empty path, a malformed index suffix, or an
/// index above [`MAX_ARRAY_INDEX`].
pub fn parse_address(address: &str) -> Result<SignalAddress<'_>> {
    let address = address.trim();
    let invalid = || TelemetryError::InvalidSignal(address.to_string());

    let (path, index) = match address.strip_suffix(']') {
        Some(rest) => {
            let open = rest.rfind('[').ok_or_else(invalid)?;
            let index = rest[open + 1..]
                .parse::<usize>()
                .ok()
                .filter(|&i| i <= MAX_ARRAY_INDEX)
                .ok_or_else(invalid)?;
            (&rest[..open], Some(index))
        }
        None => (address, None),
    };

    if path.is_empty() || path.contains(['[', ']']) {
        return Err(invalid());
    }
    Ok(SignalAddress { path, index })
}

/// Read side of the simulator's signal interface.
pub trait SignalReader {
    /// Reads the current value of `address`.
    ///
    /// # Errors
    ///
    /// Returns `SignalUnavailable` when the address cannot be resolved or read.
    fn read(&self, address: &str) -> Result<f64>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub name: String,
    pub value: f64,
}

/// One timestamped observation of every enabled signal.
///
/// `timestamp` is seconds since the sampling session started.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    pub readings: Vec<Reading>,
}

impl Sample {
    #[must_use]
    pub fn new(timestamp: f64) -> Self {
        Self {
            timestamp,
            readings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.readings.push(Reading {
            name: name.to_string(),
            value,
        });
        self
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<f64> {
        self.readings
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.value)
    }
}
