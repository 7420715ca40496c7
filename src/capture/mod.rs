// SPDX-License-Identifier: MIT
pub mod format;
pub mod reader;
pub mod writer;

pub use format::CaptureMetadata;
pub use reader::CaptureReader;
pub use writer::CaptureWriter;

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::SystemTime;

    use super::*;
    use crate::sampler::{Sample, Signal};

    fn make_metadata() -> CaptureMetadata {
        CaptureMetadata {
            aircraft: "Aircraft/Test/Test.acf".to_string(),
            tail: "N12345".to_string(),
            signals: vec![
                Signal::new("alt", "sim/alt").with_column("BaroAlt"),
                Signal::new("n1", "sim/engine/N1_[1]").alert_above(90.0),
            ],
            sample_period_ms: 1000,
            recording_start: SystemTime::UNIX_EPOCH,
        }
    }

    fn make_sample(index: u32) -> Sample {
        let t = f64::from(index);
        Sample::new(t)
            .with("alt", 1000.0 + t * 10.0)
            .with("n1", if index == 2 { f64::NAN } else { 80.0 + t })
    }

    #[test]
    fn round_trip_write_then_read() {
        let dir = std::env::temp_dir().join("paraviz_capture_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("round_trip.pvcap");

        let metadata = make_metadata();
        let samples: Vec<Sample> = (0..5).map(make_sample).collect();
        {
            let mut writer = CaptureWriter::create(&path, &metadata).unwrap();
            for sample in &samples {
                writer.write_sample(sample).unwrap();
            }
            assert_eq!(writer.samples_written(), 5);
            writer.finish().unwrap();
        }

        let reader = CaptureReader::open(&path).unwrap();
        assert_eq!(reader.metadata(), &metadata);
        assert_eq!(reader.sample_count(), 5);

        for (i, expected) in samples.iter().enumerate() {
            let actual = reader.sample_at(i).expect("sample should exist");
            assert_eq!(actual.timestamp, expected.timestamp);
            assert_eq!(actual.value("alt"), expected.value("alt"));
            if i == 2 {
                assert!(actual.value("n1").unwrap().is_nan());
            } else {
                assert_eq!(actual.value("n1"), expected.value("n1"));
            }
        }
        assert!(reader.sample_at(5).is_none());

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn empty_capture_round_trip() {
        let dir = std::env::temp_dir().join("paraviz_capture_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.pvcap");

        CaptureWriter::create(&path, &make_metadata())
            .unwrap()
            .finish()
            .unwrap();

        let reader = CaptureReader::open(&path).unwrap();
        assert_eq!(reader.sample_count(), 0);
        assert!(reader.sample_at(0).is_none());

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn missing_eof_marker_keeps_complete_records() {
        let dir = std::env::temp_dir().join("paraviz_capture_test_truncated");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("truncated.pvcap");

        // Hand-build a stream with two samples, half a third and no marker.
        let mut raw = Vec::new();
        let mut push = |bytes: Vec<u8>| {
            let len = u32::try_from(bytes.len()).unwrap();
            raw.extend_from_slice(&len.to_le_bytes());
            raw.extend_from_slice(&bytes);
        };
        push(
            postcard::to_stdvec(&format::FileHeader {
                magic: format::MAGIC,
                format_version: format::FORMAT_VERSION,
                metadata: make_metadata(),
            })
            .unwrap(),
        );
        push(postcard::to_stdvec(&make_sample(0)).unwrap());
        push(postcard::to_stdvec(&make_sample(1)).unwrap());
        raw.extend_from_slice(&200u32.to_le_bytes());
        raw.extend_from_slice(&[1, 2, 3]);

        let mut encoder = zstd::Encoder::new(std::fs::File::create(&path).unwrap(), 3).unwrap();
        encoder.write_all(&raw).unwrap();
        encoder.finish().unwrap();

        let reader = CaptureReader::open(&path).unwrap();
        assert_eq!(reader.sample_count(), 2);
        assert_eq!(reader.sample_at(1).unwrap().value("alt"), Some(1010.0));

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = std::env::temp_dir().join("paraviz_capture_test_magic");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.pvcap");

        let header = postcard::to_stdvec(&format::FileHeader {
            magic: *b"NOPE",
            format_version: format::FORMAT_VERSION,
            metadata: make_metadata(),
        })
        .unwrap();
        let mut encoder = zstd::Encoder::new(std::fs::File::create(&path).unwrap(), 3).unwrap();
        let len = u32::try_from(header.len()).unwrap();
        encoder.write_all(&len.to_le_bytes()).unwrap();
        encoder.write_all(&header).unwrap();
        encoder.finish().unwrap();

        assert!(CaptureReader::open(&path).is_err());

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }
}
