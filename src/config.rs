// SPDX-License-Identifier: MIT
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::fdr::{FdrHeader, Wind};
use crate::host::environment as dref;
use crate::sampler::{Signal, parse_address};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FdrConfig {
    pub sample_period_ms: u64,
    /// Also write a binary capture next to every FDR file.
    pub capture: bool,
    pub signals: Vec<Signal>,
}

impl Default for FdrConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 1000,
            capture: false,
            signals: default_fdr_signals(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParavizConfig {
    pub sample_period_ms: u64,
    pub redraw_ms: u64,
    pub history_seconds: u64,
    pub teardown_timeout_ms: u64,
    pub signals: Vec<Signal>,
}

impl Default for ParavizConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 100,
            redraw_ms: 200,
            history_seconds: 60,
            teardown_timeout_ms: 2000,
            signals: vec![
                Signal::new("alt", dref::PRESSURE_ALTITUDE),
                Signal::new("cas", dref::CAS),
            ],
        }
    }
}

impl ParavizConfig {
    /// Ring buffer capacity that holds `history_seconds` of samples.
    #[must_use]
    pub fn history_capacity(&self) -> usize {
        let per_second = 1000 / self.sample_period_ms.max(1);
        usize::try_from(self.history_seconds.saturating_mul(per_second.max(1))).unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub signals: Vec<Signal>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            signals: vec![
                Signal::new("altitude", dref::PRESSURE_ALTITUDE),
                Signal::new("heading", dref::MAG_HEADING),
                Signal::new("pitch", dref::PITCH),
                Signal::new("roll", dref::ROLL),
                Signal::new("cas", dref::CAS).warn_above(250.0),
                Signal::new("vspd", dref::VSPD).warn_above(1000.0),
                Signal::new("n1a1", &format!("{}[0]", dref::ENGINE_N1))
                    .with_column("N1A1")
                    .alert_above(90.0),
                Signal::new("n1a2", &format!("{}[1]", dref::ENGINE_N1))
                    .with_column("N1A2")
                    .alert_above(90.0),
            ],
        }
    }
}

/// Everything the plugins can be configured with. Every field has a default,
/// so a configuration file may set only what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub aircraft: String,
    pub tail: String,
    pub pressure_inhg: f64,
    pub delta_isa: f64,
    pub wind: Wind,
    pub output_dir: PathBuf,
    pub fdr: FdrConfig,
    pub paraviz: ParavizConfig,
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aircraft: "Aircraft/Laminar Research/Airbus A330-300/A330.acf".to_string(),
            tail: "N12345".to_string(),
            pressure_inhg: 29.92,
            delta_isa: 0.0,
            wind: Wind::default(),
            output_dir: PathBuf::from("fdr_files"),
            fdr: FdrConfig::default(),
            paraviz: ParavizConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Reads `path` if given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                serde_json::from_str::<Self>(&text)
                    .with_context(|| format!("failed to parse config file: {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first malformed address, duplicate signal
    /// name, or zero period found.
    pub fn validate(&self) -> Result<()> {
        for (table, signals) in [
            ("fdr", &self.fdr.signals),
            ("paraviz", &self.paraviz.signals),
            ("display", &self.display.signals),
        ] {
            let mut seen = HashSet::new();
            for signal in signals {
                parse_address(&signal.address)
                    .with_context(|| format!("{table} signal '{}'", signal.name))?;
                if !seen.insert(signal.name.as_str()) {
                    bail!("{table} signal '{}' is declared twice", signal.name);
                }
            }
        }
        if self.fdr.sample_period_ms == 0 || self.paraviz.sample_period_ms == 0 {
            bail!("sample periods must be at least 1 ms");
        }
        Ok(())
    }

    #[must_use]
    pub fn fdr_header(&self, aircraft: &str, started: NaiveDateTime) -> FdrHeader {
        FdrHeader {
            aircraft: aircraft.to_string(),
            tail: self.tail.clone(),
            started,
            pressure_inhg: self.pressure_inhg,
            delta_isa: self.delta_isa,
            wind: self.wind,
        }
    }
}

fn default_fdr_signals() -> Vec<Signal> {
    vec![
        Signal::new("longitude", dref::LONGITUDE)
            .with_column("Long")
            .positional(),
        Signal::new("latitude", dref::LATITUDE)
            .with_column("Lat")
            .positional(),
        Signal::new("press_altitude", dref::PRESSURE_ALTITUDE)
            .with_column("PressureAlt")
            .positional(),
        Signal::new("mag_heading", dref::MAG_HEADING)
            .with_column("MagHeading")
            .positional(),
        Signal::new("pitch", dref::PITCH)
            .with_column("Pitch")
            .positional(),
        Signal::new("roll", dref::ROLL).with_column("Roll").positional(),
        Signal::new("baro_altitude", dref::BARO_ALTITUDE).with_column("BaroAlt"),
        Signal::new("cas", dref::CAS).with_column("CAS"),
        Signal::new("vspd", dref::VSPD).with_column("VSPD"),
        Signal::new("slat", dref::SLAT).with_column("SLAT"),
        Signal::new("flap", dref::FLAP).with_column("FLAP"),
        Signal::new("gear_down", dref::GEAR_DOWN).with_column("LDG"),
    ]
}
