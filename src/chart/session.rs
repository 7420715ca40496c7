// SPDX-License-Identifier: MIT
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, warn};

use super::ChartRenderer;
use super::view::ChartView;
use crate::error::{Result, TelemetryError};
use crate::host::HudLine;
use crate::sampler::history::HistoryStore;
use crate::sampler::mailbox::Mailbox;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartCommand {
    TogglePause,
    Reset,
    ToggleSeries(usize),
    Shutdown,
}

/// How the render loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderExit {
    Stopped,
    Failed(String),
}

/// A running render loop. Only the history store and the overlay mailbox are
/// shared with it; everything else travels over channels.
pub struct RenderSession {
    commands: Sender<ChartCommand>,
    exits: Receiver<RenderExit>,
    handle: Option<thread::JoinHandle<()>>,
    exited: Option<RenderExit>,
}

impl RenderSession {
    /// Spawns the render thread. `make_renderer` runs on that thread, so the
    /// renderer never crosses threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn open<F, R>(
        store: Arc<HistoryStore>,
        overlay: Arc<Mailbox<Vec<HudLine>>>,
        redraw: Duration,
        make_renderer: F,
    ) -> anyhow::Result<Self>
    where
        F: FnOnce() -> anyhow::Result<R> + Send + 'static,
        R: ChartRenderer,
    {
        let (command_tx, command_rx) = mpsc::channel();
        let (exit_tx, exit_rx) = mpsc::channel();

        let handle = thread::Builder::new()
            .name("chart-render".into())
            .spawn(move || {
                let exit = panic::catch_unwind(AssertUnwindSafe(|| {
                    render_loop(&store, &overlay, redraw, &command_rx, make_renderer)
                }))
                .unwrap_or_else(|payload| RenderExit::Failed(panic_message(payload.as_ref())));
                debug!(?exit, "render loop finished");
                let _ = exit_tx.send(exit);
            })
            .context("failed to spawn chart-render thread")?;

        Ok(Self {
            commands: command_tx,
            exits: exit_rx,
            handle: Some(handle),
            exited: None,
        })
    }

    /// Forwards a view command. Returns `false` once the loop has gone.
    pub fn send(&self, command: ChartCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Non-blocking check for a loop that ended on its own.
    pub fn poll_exit(&mut self) -> Option<RenderExit> {
        if self.exited.is_none() {
            match self.exits.try_recv() {
                Ok(exit) => self.exited = Some(exit),
                Err(TryRecvError::Disconnected) => {
                    self.exited = Some(RenderExit::Failed("render thread vanished".into()));
                }
                Err(TryRecvError::Empty) => {}
            }
        }
        self.exited.clone()
    }

    /// Asks the loop to stop and waits up to `timeout` for it to acknowledge,
    /// then joins the thread.
    ///
    /// # Errors
    ///
    /// `RenderTeardownTimeout` if no acknowledgement arrives in time; the
    /// thread is then detached and left to finish on its own.
    pub fn shutdown(mut self, timeout: Duration) -> Result<RenderExit> {
        let exit = match self.exited.take() {
            Some(exit) => exit,
            None => {
                let _ = self.commands.send(ChartCommand::Shutdown);
                match self.exits.recv_timeout(timeout) {
                    Ok(exit) => exit,
                    Err(RecvTimeoutError::Disconnected) => {
                        RenderExit::Failed("render thread vanished".into())
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        drop(self.handle.take());
                        return Err(TelemetryError::RenderTeardownTimeout { timeout });
                    }
                }
            }
        };

        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("chart-render thread panicked after reporting exit");
        }
        Ok(exit)
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.commands.send(ChartCommand::Shutdown);
        }
    }
}

fn render_loop<F, R>(
    store: &HistoryStore,
    overlay: &Mailbox<Vec<HudLine>>,
    redraw: Duration,
    commands: &Receiver<ChartCommand>,
    make_renderer: F,
) -> RenderExit
where
    F: FnOnce() -> anyhow::Result<R>,
    R: ChartRenderer,
{
    let mut renderer = match make_renderer() {
        Ok(renderer) => renderer,
        Err(e) => return RenderExit::Failed(format!("{e:#}")),
    };
    let mut view = ChartView::new(store.snapshot().into_iter().map(|s| s.name));
    let mut overlay_lines = Vec::new();

    loop {
        if !view.is_paused() {
            view.update(&store.snapshot());
        }
        if let Some(lines) = overlay.take() {
            overlay_lines = lines;
        }
        if let Err(e) = renderer.draw(&view, &overlay_lines) {
            return RenderExit::Failed(format!("{e:#}"));
        }

        match commands.recv_timeout(redraw) {
            Ok(ChartCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                return RenderExit::Stopped;
            }
            Ok(command) => view.apply(command),
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("render thread panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("render thread panicked: {s}")
    } else {
        "render thread panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant;

    use anyhow::bail;

    use super::*;
    use crate::host::HudColor;
    use crate::sampler::Sample;

    const REDRAW: Duration = Duration::from_millis(5);
    const TIMEOUT: Duration = Duration::from_secs(2);

    #[derive(Debug, Clone, PartialEq)]
    struct Frame {
        visible: Vec<(String, usize)>,
        paused: bool,
        overlay: Vec<String>,
    }

    type Frames = Arc<Mutex<Vec<Frame>>>;

    struct RecordingRenderer {
        frames: Frames,
        delay: Duration,
        fail_after: Option<usize>,
        panic: bool,
    }

    impl RecordingRenderer {
        fn new(frames: &Frames) -> Self {
            Self {
                frames: Arc::clone(frames),
                delay: Duration::ZERO,
                fail_after: None,
                panic: false,
            }
        }
    }

    impl ChartRenderer for RecordingRenderer {
        fn draw(&mut self, view: &ChartView, overlay: &[HudLine]) -> anyhow::Result<()> {
            assert!(!self.panic, "renderer exploded");
            thread::sleep(self.delay);
            let mut frames = self.frames.lock().unwrap();
            if self.fail_after == Some(frames.len()) {
                bail!("backend gone");
            }
            frames.push(Frame {
                visible: view
                    .visible()
                    .map(|s| (s.name.clone(), s.points.len()))
                    .collect(),
                paused: view.is_paused(),
                overlay: overlay.iter().map(|l| l.text.clone()).collect(),
            });
            Ok(())
        }
    }

    fn make_store() -> Arc<HistoryStore> {
        Arc::new(HistoryStore::new(["alt", "cas"], 16))
    }

    fn wait_for(frames: &Frames, pred: impl Fn(&Frame) -> bool) -> Frame {
        let deadline = Instant::now() + TIMEOUT;
        loop {
            if let Some(frame) = frames.lock().unwrap().last().filter(|f| pred(f)) {
                return frame.clone();
            }
            assert!(Instant::now() < deadline, "render loop never produced the frame");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn open(store: &Arc<HistoryStore>, renderer: RecordingRenderer) -> RenderSession {
        RenderSession::open(
            Arc::clone(store),
            Arc::new(Mailbox::new()),
            REDRAW,
            move || Ok(renderer),
        )
        .unwrap()
    }

    #[test]
    fn empty_store_renders_without_error() {
        let frames = Frames::default();
        let store = make_store();
        let session = open(&store, RecordingRenderer::new(&frames));

        let frame = wait_for(&frames, |_| true);
        assert_eq!(frame.visible, vec![("alt".to_string(), 0)]);
        assert_eq!(session.shutdown(TIMEOUT).unwrap(), RenderExit::Stopped);
    }

    #[test]
    fn picks_up_appended_samples_and_commands() {
        let frames = Frames::default();
        let store = make_store();
        let session = open(&store, RecordingRenderer::new(&frames));

        store.append(&Sample::new(0.0).with("alt", 1000.0).with("cas", 250.0));
        store.append(&Sample::new(0.1).with("alt", 1001.0).with("cas", 251.0));
        wait_for(&frames, |f| f.visible == vec![("alt".to_string(), 2)]);

        assert!(session.send(ChartCommand::ToggleSeries(1)));
        wait_for(&frames, |f| f.visible.len() == 2 && f.visible[1].1 == 2);

        assert!(session.send(ChartCommand::TogglePause));
        wait_for(&frames, |f| f.paused);
        store.append(&Sample::new(0.2).with("alt", 1002.0).with("cas", 252.0));
        thread::sleep(REDRAW * 4);
        let frame = wait_for(&frames, |f| f.paused);
        assert_eq!(frame.visible[0].1, 2);

        assert_eq!(session.shutdown(TIMEOUT).unwrap(), RenderExit::Stopped);
    }

    #[test]
    fn overlay_reaches_renderer() {
        let frames = Frames::default();
        let store = make_store();
        let overlay = Arc::new(Mailbox::new());
        let renderer = RecordingRenderer::new(&frames);
        let session = RenderSession::open(
            Arc::clone(&store),
            Arc::clone(&overlay),
            REDRAW,
            move || Ok(renderer),
        )
        .unwrap();

        overlay.put(vec![HudLine::new("CAS 250", HudColor::Green)]);
        wait_for(&frames, |f| f.overlay == vec!["CAS 250".to_string()]);
        session.shutdown(TIMEOUT).unwrap();
    }

    #[test]
    fn factory_error_surfaces_as_failed_exit() {
        let store = make_store();
        let mut session = RenderSession::open(
            store,
            Arc::new(Mailbox::new()),
            REDRAW,
            || -> anyhow::Result<RecordingRenderer> { bail!("no terminal") },
        )
        .unwrap();

        let deadline = Instant::now() + TIMEOUT;
        let exit = loop {
            if let Some(exit) = session.poll_exit() {
                break exit;
            }
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        };
        assert_eq!(exit, RenderExit::Failed("no terminal".to_string()));
        assert_eq!(session.shutdown(TIMEOUT).unwrap(), exit);
    }

    #[test]
    fn draw_error_ends_loop() {
        let frames = Frames::default();
        let mut renderer = RecordingRenderer::new(&frames);
        renderer.fail_after = Some(3);
        let session = open(&make_store(), renderer);

        let exit = session.shutdown(TIMEOUT).unwrap();
        // Either the failure or the stop request got there first.
        assert!(matches!(exit, RenderExit::Failed(_) | RenderExit::Stopped));
        assert!(frames.lock().unwrap().len() <= 3);
    }

    #[test]
    fn panic_is_contained() {
        let frames = Frames::default();
        let mut renderer = RecordingRenderer::new(&frames);
        renderer.panic = true;
        let session = open(&make_store(), renderer);

        let exit = session.shutdown(TIMEOUT).unwrap();
        assert_eq!(
            exit,
            RenderExit::Failed("render thread panicked: renderer exploded".to_string())
        );
    }

    #[test]
    fn slow_loop_times_out() {
        let frames = Frames::default();
        let mut renderer = RecordingRenderer::new(&frames);
        renderer.delay = Duration::from_millis(400);
        let session = open(&make_store(), renderer);

        let err = session.shutdown(Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, TelemetryError::RenderTeardownTimeout { .. }));
    }
}
