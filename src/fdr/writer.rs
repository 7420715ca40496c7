// SPDX-License-Identifier: MIT
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::format::{FdrColumn, FdrHeader, data_line, write_header};
use crate::error::{Result, TelemetryError};
use crate::sampler::{Sample, Signal};

#[derive(Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started(PathBuf),
    AlreadyActive,
}

#[derive(Debug, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped { path: PathBuf, samples: u64 },
    NotActive,
}

struct Session {
    out: Box<dyn Write + Send>,
    path: PathBuf,
    samples: u64,
}

type OutputWrapper = fn(File) -> Box<dyn Write + Send>;

fn buffered(file: File) -> Box<dyn Write + Send> {
    Box::new(BufWriter::new(file))
}

/// Flight-data-recorder writer. `Idle` while `session` is `None`, `Logging`
/// otherwise; at most one session is open and a closed one is never resumed.
pub struct FdrSink {
    columns: Vec<FdrColumn>,
    session: Option<Session>,
    wrap: OutputWrapper,
}

impl FdrSink {
    #[must_use]
    pub fn new(columns: Vec<FdrColumn>) -> Self {
        Self {
            columns,
            session: None,
            wrap: buffered,
        }
    }

    /// Replaces how newly created FDR files are wrapped for writing.
    #[cfg(test)]
    pub(crate) fn set_output_wrapper(&mut self, wrap: OutputWrapper) {
        self.wrap = wrap;
    }

    #[must_use]
    pub fn from_signals(signals: &[Signal]) -> Self {
        Self::new(signals.iter().map(FdrColumn::from_signal).collect())
    }

    #[must_use]
    pub fn columns(&self) -> &[FdrColumn] {
        &self.columns
    }

    #[must_use]
    pub fn is_logging(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn samples_written(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.samples)
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.path.as_path())
    }

    /// Creates `path` and writes the header block.
    ///
    /// # Errors
    ///
    /// `DestinationUnopenable` if the file cannot be created, `WriteFailure`
    /// if the header cannot be written. Either way the sink stays idle and no
    /// file is left behind.
    pub fn start(&mut self, path: &Path, header: &FdrHeader) -> Result<StartOutcome> {
        let wrap = self.wrap;
        self.start_file(path, header, wrap)
    }

    fn start_file(
        &mut self,
        path: &Path,
        header: &FdrHeader,
        wrap: impl FnOnce(File) -> Box<dyn Write + Send>,
    ) -> Result<StartOutcome> {
        if self.session.is_some() {
            return Ok(StartOutcome::AlreadyActive);
        }
        let file = File::create(path).map_err(|source| TelemetryError::DestinationUnopenable {
            path: path.to_path_buf(),
            source,
        })?;
        let started = self.start_with_writer(wrap(file), path.to_path_buf(), header);
        if started.is_err()
            && let Err(e) = std::fs::remove_file(path)
        {
            warn!(path = %path.display(), "could not remove partial FDR file: {e}");
        }
        started
    }

    /// Like `start`, but writes to an already opened destination.
    ///
    /// # Errors
    ///
    /// `WriteFailure` if the header cannot be written.
    pub fn start_with_writer(
        &mut self,
        mut out: Box<dyn Write + Send>,
        path: PathBuf,
        header: &FdrHeader,
    ) -> Result<StartOutcome> {
        if self.session.is_some() {
            return Ok(StartOutcome::AlreadyActive);
        }
        write_header(&mut out, header, &self.columns)
            .and_then(|()| out.flush())
            .map_err(|source| TelemetryError::WriteFailure { source })?;

        debug!(path = %path.display(), columns = self.columns.len(), "FDR session opened");
        self.session = Some(Session {
            out,
            path: path.clone(),
            samples: 0,
        });
        Ok(StartOutcome::Started(path))
    }

    /// Appends one flushed `DATA` line. A no-op while idle.
    ///
    /// # Errors
    ///
    /// `WriteFailure`; the session is closed before returning and will not be
    /// retried.
    pub fn on_sample(&mut self, sample: &Sample) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let line = data_line(session.samples, sample, &self.columns);
        let written = session
            .out
            .write_all(line.as_bytes())
            .and_then(|()| session.out.flush());

        match written {
            Ok(()) => {
                session.samples += 1;
                Ok(())
            }
            Err(source) => {
                self.session = None;
                Err(TelemetryError::WriteFailure { source })
            }
        }
    }

    /// Closes the open session, if any.
    pub fn stop(&mut self) -> StopOutcome {
        let Some(mut session) = self.session.take() else {
            return StopOutcome::NotActive;
        };
        if let Err(e) = session.out.flush() {
            warn!(path = %session.path.display(), "final FDR flush failed: {e}");
        }
        StopOutcome::Stopped {
            path: session.path,
            samples: session.samples,
        }
    }
}

impl Drop for FdrSink {
    fn drop(&mut self) {
        self.stop();
    }
}
