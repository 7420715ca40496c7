// SPDX-License-Identifier: MIT
use std::collections::BTreeSet;
use std::time::Duration;

use super::{Reading, Sample, Signal, SignalReader};

pub struct SampleResult {
    pub sample: Sample,
    /// Addresses that failed for the first time since the last restart.
    pub newly_unavailable: Vec<String>,
}

/// Produces one `Sample` per tick from the enabled signals.
///
/// A failed read never aborts the tick: the signal gets `NaN` and its address
/// is reported once until the next `restart`.
pub struct Sampler {
    signals: Vec<Signal>,
    origin: Duration,
    unavailable: BTreeSet<String>,
}

impl Sampler {
    #[must_use]
    pub fn new(signals: Vec<Signal>) -> Self {
        Self {
            signals,
            origin: Duration::ZERO,
            unavailable: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.enabled)
    }

    /// Returns `false` if no signal is called `name`.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.signals.iter_mut().find(|s| s.name == name) {
            Some(signal) => {
                signal.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Starts a new session: timestamps become relative to `now`.
    pub fn restart(&mut self, now: Duration) {
        self.origin = now;
        self.unavailable.clear();
    }

    pub fn sample<R: SignalReader + ?Sized>(&mut self, reader: &R, now: Duration) -> SampleResult {
        let timestamp = now.saturating_sub(self.origin).as_secs_f64();
        let mut readings = Vec::with_capacity(self.signals.len());
        let mut newly_unavailable = Vec::new();

        for signal in self.signals.iter().filter(|s| s.enabled) {
            let value = if let Ok(v) = reader.read(&signal.address) {
                self.unavailable.remove(&signal.address);
                v
            } else {
                if self.unavailable.insert(signal.address.clone()) {
                    newly_unavailable.push(signal.address.clone());
                }
                f64::NAN
            };
            readings.push(Reading {
                name: signal.name.clone(),
                value,
            });
        }

        SampleResult {
            sample: Sample {
                timestamp,
                readings,
            },
            newly_unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::{Result, TelemetryError};

    struct FixedReader(HashMap<&'static str, f64>);

    impl SignalReader for FixedReader {
        fn read(&self, address: &str) -> Result<f64> {
            self.0
                .get(address)
                .copied()
                .ok_or_else(|| TelemetryError::unavailable(address))
        }
    }

    fn make_sampler() -> Sampler {
        Sampler::new(vec![
            Signal::new("alt", "sim/alt"),
            Signal::new("cas", "sim/cas"),
            Signal::new("gear", "sim/missing"),
        ])
    }

    fn make_reader() -> FixedReader {
        FixedReader(HashMap::from([("sim/alt", 1000.0), ("sim/cas", 250.0)]))
    }

    #[test]
    fn timestamps_are_relative_to_restart() {
        let mut sampler = make_sampler();
        sampler.restart(Duration::from_secs(10));
        let result = sampler.sample(&make_reader(), Duration::from_millis(12_500));
        assert!((result.sample.timestamp - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn failed_read_becomes_nan_without_aborting() {
        let mut sampler = make_sampler();
        let result = sampler.sample(&make_reader(), Duration::ZERO);

        assert_eq!(result.sample.readings.len(), 3);
        assert_eq!(result.sample.value("alt"), Some(1000.0));
        assert_eq!(result.sample.value("cas"), Some(250.0));
        assert!(result.sample.value("gear").unwrap().is_nan());
        assert_eq!(result.newly_unavailable, vec!["sim/missing".to_string()]);
    }

    #[test]
    fn unavailable_reported_once_until_restart() {
        let mut sampler = make_sampler();
        let reader = make_reader();
        sampler.sample(&reader, Duration::ZERO);
        let second = sampler.sample(&reader, Duration::from_secs(1));
        assert!(second.newly_unavailable.is_empty());

        sampler.restart(Duration::from_secs(2));
        let third = sampler.sample(&reader, Duration::from_secs(3));
        assert_eq!(third.newly_unavailable.len(), 1);
    }

    #[test]
    fn disabled_signals_are_skipped() {
        let mut sampler = make_sampler();
        assert!(sampler.set_enabled("gear", false));
        assert!(!sampler.set_enabled("nope", false));

        let result = sampler.sample(&make_reader(), Duration::ZERO);
        assert_eq!(result.sample.readings.len(), 2);
        assert!(result.newly_unavailable.is_empty());
        assert_eq!(sampler.enabled().count(), 2);
    }
}
