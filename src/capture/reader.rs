// SPDX-License-Identifier: MIT
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::warn;

use super::format::{CaptureMetadata, EOF_MARKER, FORMAT_VERSION, FileHeader, MAGIC};
use crate::sampler::Sample;

pub struct CaptureReader {
    metadata: CaptureMetadata,
    samples: Vec<Sample>,
}

impl CaptureReader {
    /// Opens a capture file, validates the header, and reads every sample.
    ///
    /// A stream cut short (no EOF marker, or a partial trailing record) yields
    /// the samples up to the last complete record.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the header is invalid.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open capture file: {}", path.display()))?;
        let mut decoder =
            zstd::Decoder::new(BufReader::new(file)).context("failed to create zstd decoder")?;

        let header: FileHeader = match read_record(&mut decoder)? {
            Some(bytes) => {
                postcard::from_bytes(&bytes).context("failed to deserialize file header")?
            }
            None => bail!("capture file has no header: {}", path.display()),
        };

        if header.magic != MAGIC {
            bail!("invalid magic bytes in capture file");
        }
        if header.format_version != FORMAT_VERSION {
            bail!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                header.format_version
            );
        }

        let samples = read_all_samples(&mut decoder);
        Ok(Self {
            metadata: header.metadata,
            samples,
        })
    }

    #[must_use]
    pub fn metadata(&self) -> &CaptureMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn sample_at(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

/// Reads one length-prefixed record. `Ok(None)` at the EOF marker or a clean
/// end of stream.
fn read_record(reader: &mut impl Read) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e).context("failed to read record length"),
    }
    if len_buf == EOF_MARKER {
        return Ok(None);
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    let mut data = vec![0u8; len];
    reader
        .read_exact(&mut data)
        .context("failed to read record data")?;
    Ok(Some(data))
}

fn read_all_samples(reader: &mut impl Read) -> Vec<Sample> {
    let mut samples = Vec::new();
    loop {
        let bytes = match read_record(reader) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(e) => {
                warn!(kept = samples.len(), "capture truncated: {e:#}");
                break;
            }
        };
        match postcard::from_bytes::<Sample>(&bytes) {
            Ok(sample) => samples.push(sample),
            Err(e) => {
                warn!(kept = samples.len(), "corrupt capture record: {e}");
                break;
            }
        }
    }
    samples
}
