// SPDX-License-Identifier: MIT
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Result, bail};
use chrono::Local;
use num_format::{Locale, ToFormattedString};

use super::ToggleMenu;
use crate::capture::{CaptureMetadata, CaptureWriter};
use crate::config::Config;
use crate::error::TelemetryError;
use crate::fdr::format::file_name;
use crate::fdr::{FdrSink, StopOutcome};
use crate::host::{
    CommandId, CommandPhase, DrawId, FlightLoopId, HostApi, HostMessage, HudColor, HudLine,
    LoopAction, MenuItemId, Plugin, PluginInfo, SimHost,
};
use crate::sampler::signals::Sampler;
use crate::toggle::{ToggleController, ToggleTarget};

pub const TOGGLE_COMMAND: &str = "paraviz/fdr/toggle";
const HUD_PREFIX: &str = "[LOGGING TIMESERIES DATA]";

/// One logging session's worth of state: sampler, FDR sink and optional
/// capture, plus the host registrations that drive them.
struct FdrRecording {
    config: Config,
    aircraft: String,
    sampler: Sampler,
    sink: FdrSink,
    capture: Option<CaptureWriter>,
    flight_loop: Option<FlightLoopId>,
    draw: Option<DrawId>,
}

impl FdrRecording {
    fn new(config: Config) -> Self {
        let signals = config.fdr.signals.clone();
        Self {
            aircraft: config.aircraft.clone(),
            sink: FdrSink::from_signals(&signals),
            sampler: Sampler::new(signals),
            capture: None,
            flight_loop: None,
            draw: None,
            config,
        }
    }

    fn period(&self) -> Duration {
        Duration::from_millis(self.config.fdr.sample_period_ms)
    }

    fn open_capture(&self, fdr_path: &Path, host: &mut dyn HostApi) -> Option<CaptureWriter> {
        let path = fdr_path.with_extension("pvcap");
        let metadata = CaptureMetadata {
            aircraft: self.aircraft.clone(),
            tail: self.config.tail.clone(),
            signals: self.sampler.signals().to_vec(),
            sample_period_ms: self.config.fdr.sample_period_ms,
            recording_start: SystemTime::now(),
        };
        match CaptureWriter::create(&path, &metadata) {
            Ok(writer) => Some(writer),
            Err(e) => {
                host.log(&format!("Capture disabled: {e:#}"));
                None
            }
        }
    }

    /// Samples once and appends to every open output.
    fn record(&mut self, host: &mut dyn HostApi) -> Result<(), TelemetryError> {
        let now = host.elapsed();
        let result = self.sampler.sample(&*host, now);
        for address in &result.newly_unavailable {
            host.log(&format!("Signal unavailable, logging NaN: {address}"));
        }

        self.sink.on_sample(&result.sample)?;

        if let Some(capture) = self.capture.as_mut()
            && let Err(e) = capture.write_sample(&result.sample)
        {
            host.log(&format!("Capture write failed, capture closed: {e:#}"));
            self.capture = None;
        }
        Ok(())
    }

    /// Drops the host registrations and finishes the capture.
    fn release(&mut self, host: &mut dyn HostApi) {
        if let Some(id) = self.flight_loop.take() {
            host.unregister_flight_loop(id);
        }
        if let Some(id) = self.draw.take() {
            host.unregister_draw(id);
        }
        if let Some(capture) = self.capture.take()
            && let Err(e) = capture.finish()
        {
            host.log(&format!("Capture could not be finished: {e:#}"));
        }
    }
}

impl<'h> ToggleTarget<dyn HostApi + 'h> for FdrRecording {
    fn is_active(&self) -> bool {
        self.sink.is_logging()
    }

    fn activate(&mut self, host: &mut (dyn HostApi + 'h)) -> Result<()> {
        let dir: PathBuf = self.config.output_dir.clone();
        std::fs::create_dir_all(&dir).map_err(|source| TelemetryError::DestinationUnopenable {
            path: dir.clone(),
            source,
        })?;

        let started = Local::now().naive_local();
        let path = dir.join(file_name(started));
        let header = self.config.fdr_header(&self.aircraft, started);
        self.sink.start(&path, &header)?;

        self.sampler.restart(host.elapsed());
        if self.config.fdr.capture {
            self.capture = self.open_capture(&path, host);
        }
        self.flight_loop = Some(host.register_flight_loop(self.period()));
        self.draw = Some(host.register_draw());
        host.log(&format!("Logging --> Started. ({})", path.display()));
        Ok(())
    }

    fn deactivate(&mut self, host: &mut (dyn HostApi + 'h)) {
        self.release(host);
        if let StopOutcome::Stopped { path, samples } = self.sink.stop() {
            host.log(&format!(
                "Logging --> Stopped. {} samples in {}",
                samples.to_formatted_string(&Locale::en),
                path.display()
            ));
        }
    }
}

/// The recorder's HUD line while a session is open.
pub fn logging_status(host: &mut SimHost) -> Option<String> {
    host.draw()
        .into_iter()
        .find(|line| line.text.starts_with(HUD_PREFIX))
        .map(|line| line.text)
}

/// Switches logging on through the toggle command and confirms that a
/// session actually opened.
///
/// # Errors
///
/// Fails if no recorder is loaded, or if it could not open a session; the
/// error carries the recorder's last log line.
pub fn start_logging(host: &mut SimHost) -> Result<()> {
    if !host.run_command(TOGGLE_COMMAND) {
        bail!("FDR recorder is not loaded");
    }
    if logging_status(host).is_none() {
        let reason = host
            .log_lines()
            .last()
            .map_or_else(|| "no session opened".to_string(), |l| l.message.clone());
        bail!("FDR logging did not start: {reason}");
    }
    Ok(())
}

/// Logs the configured signals to an FDR file while toggled on.
pub struct FdrRecorder {
    toggle: ToggleController,
    recording: FdrRecording,
    menu: Option<ToggleMenu>,
    command: Option<CommandId>,
}

impl FdrRecorder {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            toggle: ToggleController::new(),
            recording: FdrRecording::new(config.clone()),
            menu: None,
            command: None,
        }
    }

    fn set(&mut self, host: &mut dyn HostApi, on: bool) {
        if let Err(e) = self.toggle.set(&mut self.recording, host, on) {
            host.log(&format!("Logging --> failed to start: {e:#}"));
        }
        self.refresh_menu(host);
    }

    fn refresh_menu(&self, host: &mut dyn HostApi) {
        if let Some(menu) = self.menu {
            menu.refresh(host, self.toggle.is_on());
        }
    }
}

impl Plugin for FdrRecorder {
    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: "Generate FDR Files",
            signature: "paraviz.fdr.recorder",
            description: "Logs timeseries data into an FDR file",
        }
    }

    fn start(&mut self, host: &mut dyn HostApi) -> Result<()> {
        self.menu = Some(ToggleMenu::create(host, "genFDR"));
        self.command = Some(host.create_command(TOGGLE_COMMAND, "Toggle FDR logging"));
        Ok(())
    }

    fn enable(&mut self, _host: &mut dyn HostApi) -> Result<()> {
        Ok(())
    }

    fn disable(&mut self, host: &mut dyn HostApi) {
        self.set(host, false);
    }

    fn stop(&mut self, host: &mut dyn HostApi) {
        self.set(host, false);
        if let Some(menu) = self.menu.take() {
            menu.destroy(host);
        }
    }

    fn receive_message(&mut self, _host: &mut dyn HostApi, message: &HostMessage) {
        let HostMessage::AircraftLoaded { path } = message;
        self.recording.aircraft.clone_from(path);
    }

    fn flight_loop(
        &mut self,
        host: &mut dyn HostApi,
        id: FlightLoopId,
        _since_last: Duration,
    ) -> LoopAction {
        if self.recording.flight_loop != Some(id) {
            return LoopAction::Unschedule;
        }
        match self.recording.record(host) {
            Ok(()) => LoopAction::Reschedule(self.recording.period()),
            Err(e) => {
                // The sink has already closed the session.
                host.log(&format!("Logging --> Stopped on error: {e}"));
                self.recording.release(host);
                self.toggle.sync::<dyn HostApi, _>(&self.recording);
                self.refresh_menu(host);
                LoopAction::Unschedule
            }
        }
    }

    fn draw(&mut self, _host: &mut dyn HostApi, id: DrawId) -> Vec<HudLine> {
        if self.recording.draw != Some(id) || !self.recording.sink.is_logging() {
            return Vec::new();
        }
        let samples = self.recording.sink.samples_written();
        vec![HudLine::new(
            format!(
                "{HUD_PREFIX} | Samples: {}",
                samples.to_formatted_string(&Locale::en)
            ),
            HudColor::White,
        )]
    }

    fn menu_selected(&mut self, host: &mut dyn HostApi, item: MenuItemId) {
        if self.menu.is_some_and(|m| m.item == item) {
            let want = !self.toggle.is_on();
            self.set(host, want);
        }
    }

    fn command(&mut self, host: &mut dyn HostApi, id: CommandId, phase: CommandPhase) {
        if phase == CommandPhase::Begin && self.command == Some(id) {
            let want = !self.toggle.is_on();
            self.set(host, want);
        }
    }
}
