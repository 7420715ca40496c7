// SPDX-License-Identifier: MIT
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::format::{CaptureMetadata, EOF_MARKER, FORMAT_VERSION, FileHeader, MAGIC};
use crate::sampler::Sample;

pub struct CaptureWriter {
    encoder: zstd::Encoder<'static, BufWriter<File>>,
    samples: u64,
}

impl CaptureWriter {
    /// Creates a capture file at `path` and writes the file header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header cannot be written.
    pub fn create(path: &Path, metadata: &CaptureMetadata) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("failed to create capture file: {}", path.display()))?;
        let encoder = zstd::Encoder::new(BufWriter::new(file), 3)
            .context("failed to create zstd encoder")?;

        let mut writer = Self {
            encoder,
            samples: 0,
        };
        writer
            .write_record(&FileHeader {
                magic: MAGIC,
                format_version: FORMAT_VERSION,
                metadata: metadata.clone(),
            })
            .context("failed to write capture header")?;
        Ok(writer)
    }

    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_sample(&mut self, sample: &Sample) -> Result<()> {
        self.write_record(sample)?;
        self.samples += 1;
        Ok(())
    }

    #[must_use]
    pub fn samples_written(&self) -> u64 {
        self.samples
    }

    fn write_record(&mut self, record: &impl Serialize) -> Result<()> {
        let serialized = postcard::to_stdvec(record).context("failed to serialize record")?;

        #[allow(clippy::cast_possible_truncation)]
        let len = serialized.len() as u32;
        self.encoder
            .write_all(&len.to_le_bytes())
            .context("failed to write record length")?;
        self.encoder
            .write_all(&serialized)
            .context("failed to write record data")?;
        Ok(())
    }

    /// Writes the EOF marker, finishes compression, and flushes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if writing or flushing fails.
    pub fn finish(mut self) -> Result<()> {
        self.encoder
            .write_all(&EOF_MARKER)
            .context("failed to write EOF marker")?;
        let mut buf_writer = self
            .encoder
            .finish()
            .context("failed to finish zstd encoder")?;
        buf_writer.flush().context("failed to flush capture file")?;
        Ok(())
    }
}
