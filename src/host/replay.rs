// SPDX-License-Identifier: MIT
use std::collections::HashMap;

use super::environment::Environment;
use crate::capture::{CaptureMetadata, CaptureReader};
use crate::sampler::Sample;

/// Plays a capture back as the signal environment. Only addresses present in
/// the capture resolve; `NaN` readings replay as unavailable.
pub struct CaptureReplay {
    reader: CaptureReader,
    names_by_address: HashMap<String, String>,
    position: f64,
    current_index: usize,
    playback_speed: f64,
    paused: bool,
}

impl CaptureReplay {
    #[must_use]
    pub fn new(reader: CaptureReader) -> Self {
        let names_by_address = reader
            .metadata()
            .signals
            .iter()
            .map(|s| (s.address.trim().to_string(), s.name.clone()))
            .collect();
        let position = reader.sample_at(0).map_or(0.0, |s| s.timestamp);
        Self {
            reader,
            names_by_address,
            position,
            current_index: 0,
            playback_speed: 1.0,
            paused: false,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> &CaptureMetadata {
        self.reader.metadata()
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.playback_speed = speed;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn seek_to(&mut self, index: usize) {
        let Some(last) = self.reader.sample_count().checked_sub(1) else {
            return;
        };
        self.current_index = index.min(last);
        if let Some(sample) = self.reader.sample_at(self.current_index) {
            self.position = sample.timestamp;
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.reader.sample_count()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.total() == 0 || self.current_index + 1 >= self.total()
    }

    fn current(&self) -> Option<&Sample> {
        self.reader.sample_at(self.current_index)
    }

    fn value_at(&self, address: &str) -> Option<f64> {
        let name = self.names_by_address.get(address)?;
        self.current()?.value(name).filter(|v| !v.is_nan())
    }
}

impl Environment for CaptureReplay {
    fn read(&self, path: &str) -> Option<f64> {
        self.value_at(path)
    }

    fn read_array(&self, path: &str, out: &mut [f64]) -> Option<usize> {
        let mut n = 0;
        for (i, slot) in out.iter_mut().enumerate() {
            let Some(value) = self.value_at(&format!("{path}[{i}]")) else {
                break;
            };
            *slot = value;
            n += 1;
        }
        (n > 0).then_some(n)
    }

    fn write(&mut self, _path: &str, _value: f64) -> bool {
        false
    }

    fn advance(&mut self, dt: f64) {
        if self.paused || dt <= 0.0 {
            return;
        }
        self.position += dt * self.playback_speed;
        while let Some(next) = self.reader.sample_at(self.current_index + 1)
            && next.timestamp <= self.position
        {
            self.current_index += 1;
        }
    }

    fn replay(&mut self) -> Option<&mut CaptureReplay> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::capture::CaptureWriter;
    use crate::host::environment::read_signal;
    use crate::sampler::Signal;

    fn write_capture(name: &str, samples: &[Sample]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("replay.pvcap");
        let metadata = CaptureMetadata {
            aircraft: "Aircraft/Test/Test.acf".to_string(),
            tail: "N12345".to_string(),
            signals: vec![
                Signal::new("alt", "sim/alt"),
                Signal::new("n1_0", "sim/n1[0]"),
                Signal::new("n1_1", "sim/n1[1]"),
            ],
            sample_period_ms: 1000,
            recording_start: SystemTime::UNIX_EPOCH,
        };
        let mut writer = CaptureWriter::create(&path, &metadata).unwrap();
        for sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    fn make_samples() -> Vec<Sample> {
        (0..4)
            .map(|i| {
                let t = f64::from(i);
                Sample::new(t)
                    .with("alt", if i == 2 { f64::NAN } else { 1000.0 + t })
                    .with("n1_0", 80.0 + t)
                    .with("n1_1", 81.0 + t)
            })
            .collect()
    }

    fn open(name: &str) -> CaptureReplay {
        let path = write_capture(name, &make_samples());
        let replay = CaptureReplay::new(CaptureReader::open(&path).unwrap());
        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
        replay
    }

    #[test]
    fn advances_with_playback_clock() {
        let mut replay = open("paraviz_replay_advance");
        assert_eq!(replay.read("sim/alt"), Some(1000.0));

        replay.advance(0.5);
        assert_eq!(replay.current_index(), 0);
        replay.advance(0.5);
        assert_eq!(replay.current_index(), 1);
        assert_eq!(replay.read("sim/alt"), Some(1001.0));

        replay.set_speed(4.0);
        replay.advance(1.0);
        assert_eq!(replay.current_index(), 3);
        assert!(replay.is_finished());
    }

    #[test]
    fn paused_does_not_move() {
        let mut replay = open("paraviz_replay_pause");
        replay.toggle_pause();
        replay.advance(10.0);
        assert_eq!(replay.current_index(), 0);
        assert!(replay.is_paused());
    }

    #[test]
    fn nan_replays_as_unavailable() {
        let mut replay = open("paraviz_replay_nan");
        replay.seek_to(2);
        assert_eq!(replay.read("sim/alt"), None);
        assert!(read_signal(&replay, "sim/alt").is_err());
    }

    #[test]
    fn array_elements_resolve() {
        let mut replay = open("paraviz_replay_array");
        replay.seek_to(99);
        assert_eq!(replay.current_index(), 3);
        assert_eq!(read_signal(&replay, "sim/n1[1]").unwrap(), 84.0);

        let mut buf = [0.0; 4];
        assert_eq!(replay.read_array("sim/n1", &mut buf), Some(2));
        assert_eq!(&buf[..2], &[83.0, 84.0]);
    }

    #[test]
    fn writes_are_rejected() {
        let mut replay = open("paraviz_replay_write");
        assert!(!replay.write("sim/alt", 5.0));
        assert_eq!(replay.read("sim/alt"), Some(1000.0));
        assert!(replay.replay().is_some());
    }
}
