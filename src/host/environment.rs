// SPDX-License-Identifier: MIT
use std::f64::consts::PI;

use super::replay::CaptureReplay;
use crate::error::{Result, TelemetryError};
use crate::sampler::{MAX_ARRAY_INDEX, SignalReader, parse_address};

/// Where dataref values come from. Paths are bare (no `[i]` suffix);
/// element selection goes through `read_array`.
pub trait Environment: Send {
    fn read(&self, path: &str) -> Option<f64>;

    /// Copies an array dataref into `out`, returning how many elements were
    /// written, or `None` if `path` is not an array.
    fn read_array(&self, path: &str, out: &mut [f64]) -> Option<usize>;

    /// Returns `false` if `path` is unknown or read-only.
    fn write(&mut self, path: &str, value: f64) -> bool;

    /// Moves simulated time forward by `dt` seconds.
    fn advance(&mut self, dt: f64);

    fn replay(&mut self) -> Option<&mut CaptureReplay> {
        None
    }
}

/// Resolves `address` (optionally `path[i]`) against `env`.
///
/// # Errors
///
/// `InvalidSignal` for malformed addresses, `SignalUnavailable` when the
/// environment has no such dataref or element.
pub fn read_signal(env: &dyn Environment, address: &str) -> Result<f64> {
    let parsed = parse_address(address)?;
    let value = match parsed.index {
        None => env.read(parsed.path),
        Some(index) => {
            let mut buf = [0.0; MAX_ARRAY_INDEX + 1];
            let buf = &mut buf[..=index.min(MAX_ARRAY_INDEX)];
            env.read_array(parsed.path, buf)
                .filter(|&n| n > index && index < buf.len())
                .map(|_| buf[index])
        }
    };
    value.ok_or_else(|| TelemetryError::unavailable(address))
}

/// Adapts an environment to the sampler's read interface.
pub struct EnvReader<'a>(pub &'a dyn Environment);

impl SignalReader for EnvReader<'_> {
    fn read(&self, address: &str) -> Result<f64> {
        read_signal(self.0, address)
    }
}

pub const LONGITUDE: &str = "sim/flightmodel/position/longitude";
pub const LATITUDE: &str = "sim/flightmodel/position/latitude";
pub const MAG_HEADING: &str = "sim/flightmodel/position/mag_psi";
pub const PITCH: &str = "sim/flightmodel/position/theta";
pub const ROLL: &str = "sim/flightmodel/position/phi";
pub const PRESSURE_ALTITUDE: &str = "sim/flightmodel2/position/pressure_altitude";
pub const BARO_ALTITUDE: &str = "sim/cockpit2/gauges/indicators/altitude_ft_pilot";
pub const CAS: &str = "sim/cockpit2/gauges/indicators/airspeed_kts_pilot";
pub const VSPD: &str = "sim/cockpit2/gauges/indicators/vvi_fpm_pilot";
pub const SLAT: &str = "sim/flightmodel/controls/slatrat";
pub const FLAP: &str = "sim/flightmodel/controls/flaprat";
pub const GEAR_DOWN: &str = "laminar/A333/fws/landing_gear_down";
pub const GEAR_HANDLE: &str = "sim/cockpit/switches/gear_handle_status";
pub const ENGINE_N1: &str = "sim/flightmodel/engine/ENGN_N1_";

const START_ALTITUDE_FT: f64 = 1500.0;
const CRUISE_ALTITUDE_FT: f64 = 10_000.0;
const CLIMB_RATE_FPS: f64 = 25.0;
const TURN_RATE_DPS: f64 = 0.5;
const START_HEADING: f64 = 270.0;
const FLAPS_UP_ABOVE_FT: f64 = 3000.0;
const GEAR_UP_AFTER_S: f64 = 10.0;

/// Deterministic synthetic departure: climb from 1500 ft to 10000 ft, slow
/// right turn, gentle pitch and roll oscillation, speed building to 250 kt.
#[derive(Debug, Clone)]
pub struct SimulatedAircraft {
    elapsed: f64,
    heading_offset: f64,
    latitude: f64,
    longitude: f64,
}

impl Default for SimulatedAircraft {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAircraft {
    #[must_use]
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            heading_offset: 0.0,
            latitude: 51.47,
            longitude: -0.4543,
        }
    }

    fn altitude(&self) -> f64 {
        (START_ALTITUDE_FT + CLIMB_RATE_FPS * self.elapsed).min(CRUISE_ALTITUDE_FT)
    }

    fn climbing(&self) -> bool {
        self.altitude() < CRUISE_ALTITUDE_FT
    }

    fn cas(&self) -> f64 {
        180.0 + self.elapsed.min(140.0) * 0.5
    }

    fn heading(&self) -> f64 {
        (START_HEADING + TURN_RATE_DPS * self.elapsed + self.heading_offset).rem_euclid(360.0)
    }

    fn gear_down(&self) -> f64 {
        if self.elapsed < GEAR_UP_AFTER_S { 1.0 } else { 0.0 }
    }

    fn high_lift(&self) -> f64 {
        if self.altitude() < FLAPS_UP_ABOVE_FT { 0.5 } else { 0.0 }
    }

    fn n1(&self, engine: usize) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let spread = engine as f64 * 0.3;
        let base = if self.climbing() { 91.0 } else { 84.0 };
        base + spread + 0.4 * (self.elapsed * 0.3).sin()
    }
}

impl Environment for SimulatedAircraft {
    fn read(&self, path: &str) -> Option<f64> {
        let t = self.elapsed;
        let value = match path {
            LONGITUDE => self.longitude,
            LATITUDE => self.latitude,
            MAG_HEADING => self.heading(),
            PITCH => {
                let trim = if self.climbing() { 6.0 } else { 2.0 };
                trim + 1.5 * (t * 0.2).sin()
            }
            ROLL => 10.0 * (t * 0.05).sin(),
            PRESSURE_ALTITUDE | BARO_ALTITUDE => self.altitude(),
            CAS => self.cas(),
            VSPD => {
                if self.climbing() {
                    CLIMB_RATE_FPS * 60.0
                } else {
                    0.0
                }
            }
            SLAT | FLAP => self.high_lift(),
            GEAR_DOWN | GEAR_HANDLE => self.gear_down(),
            _ => return None,
        };
        Some(value)
    }

    fn read_array(&self, path: &str, out: &mut [f64]) -> Option<usize> {
        if path != ENGINE_N1 {
            return None;
        }
        let n = out.len().min(2);
        for (engine, slot) in out.iter_mut().take(n).enumerate() {
            *slot = self.n1(engine);
        }
        Some(n)
    }

    fn write(&mut self, path: &str, value: f64) -> bool {
        if path != MAG_HEADING {
            return false;
        }
        self.heading_offset += value - self.heading();
        true
    }

    fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let distance_nm = self.cas() * dt / 3600.0;
        let track = self.heading() * PI / 180.0;
        self.latitude += distance_nm * track.cos() / 60.0;
        self.longitude += distance_nm * track.sin() / (60.0 * (self.latitude * PI / 180.0).cos());
        self.elapsed += dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn climbs_then_levels_off() {
        let mut aircraft = SimulatedAircraft::new();
        assert_eq!(aircraft.read(PRESSURE_ALTITUDE), Some(1500.0));
        assert_eq!(aircraft.read(VSPD), Some(1500.0));

        aircraft.advance(400.0);
        assert_eq!(aircraft.read(PRESSURE_ALTITUDE), Some(10_000.0));
        assert_eq!(aircraft.read(VSPD), Some(0.0));
        assert_eq!(aircraft.read(CAS), Some(250.0));
    }

    #[test]
    fn gear_and_flaps_retract() {
        let mut aircraft = SimulatedAircraft::new();
        assert_eq!(aircraft.read(GEAR_DOWN), Some(1.0));
        assert_eq!(aircraft.read(FLAP), Some(0.5));
        aircraft.advance(60.0);
        assert_eq!(aircraft.read(GEAR_DOWN), Some(0.0));
        assert_eq!(aircraft.read(FLAP), Some(0.0));
    }

    #[test]
    fn unknown_paths_are_unavailable() {
        let aircraft = SimulatedAircraft::new();
        assert_eq!(aircraft.read("sim/does/not/exist"), None);
        assert_eq!(aircraft.read(ENGINE_N1), None);
        assert!(read_signal(&aircraft, "sim/does/not/exist").is_err());
    }

    #[test]
    fn array_elements_by_suffix() {
        let aircraft = SimulatedAircraft::new();
        let n1_left = read_signal(&aircraft, "sim/flightmodel/engine/ENGN_N1_[0]").unwrap();
        let n1_right = read_signal(&aircraft, "sim/flightmodel/engine/ENGN_N1_[1]").unwrap();
        assert!((n1_right - n1_left - 0.3).abs() < 1e-9);

        let err = read_signal(&aircraft, "sim/flightmodel/engine/ENGN_N1_[5]").unwrap_err();
        assert!(matches!(err, TelemetryError::SignalUnavailable { .. }));
    }

    #[test]
    fn huge_array_index_samples_as_nan() {
        let mut config = crate::config::Config::default();
        config.paraviz.signals.push(crate::sampler::Signal::new(
            "n1_huge",
            "sim/flightmodel/engine/ENGN_N1_[2305843009213693952]",
        ));
        assert!(config.validate().is_err());

        let aircraft = SimulatedAircraft::new();
        let err = read_signal(&aircraft, "sim/flightmodel/engine/ENGN_N1_[2305843009213693952]")
            .unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidSignal(_)));

        let mut sampler = crate::sampler::signals::Sampler::new(config.paraviz.signals.clone());
        let result = sampler.sample(&EnvReader(&aircraft), std::time::Duration::ZERO);
        let huge = result.sample.value("n1_huge").unwrap();
        assert!(huge.is_nan());
        assert_eq!(result.sample.readings.len(), 3);
        assert!(result.sample.value("alt").unwrap().is_finite());
    }

    #[test]
    fn heading_is_writable() {
        let mut aircraft = SimulatedAircraft::new();
        assert!(aircraft.write(MAG_HEADING, 100.0));
        let heading = aircraft.read(MAG_HEADING).unwrap();
        assert!((heading - 100.0).abs() < 1e-9);

        aircraft.advance(2.0);
        let heading = aircraft.read(MAG_HEADING).unwrap();
        assert!((heading - 101.0).abs() < 1e-9);

        assert!(!aircraft.write(CAS, 300.0));
    }

    #[test]
    fn position_moves_along_heading() {
        let mut aircraft = SimulatedAircraft::new();
        let lon = aircraft.read(LONGITUDE).unwrap();
        aircraft.advance(1.0);
        // Westbound at the start.
        assert!(aircraft.read(LONGITUDE).unwrap() < lon);
    }

    #[test]
    fn env_reader_reports_unavailable() {
        let aircraft = SimulatedAircraft::new();
        let reader = EnvReader(&aircraft);
        assert_eq!(reader.read(CAS).unwrap(), 180.0);
        assert!(reader.read("sim/nope").is_err());
    }
}
