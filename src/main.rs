// SPDX-License-Identifier: MIT
#![deny(warnings)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::fs::File;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{Level, info};

use paraviz::capture::CaptureReader;
use paraviz::chart::{ChartRenderer, TerminalRenderer};
use paraviz::config::Config;
use paraviz::fdr::{FdrSink, StopOutcome};
use paraviz::host::{CaptureReplay, Environment, SimHost, SimulatedAircraft};
use paraviz::plugins::{
    FdrRecorder, HeadingCommand, ParamDisplay, Paraviz, RendererFactory, fdr_recorder,
};
use paraviz::sampler::Signal;
use paraviz::tui::app::{App, CockpitFrame};
use paraviz::tui::input::{Action, handle_key, host_key};

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(10);
const RECORD_TICK: Duration = Duration::from_millis(20);
const HEADLESS_STATUS_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_LOG_FILE: &str = "paraviz.log";

#[derive(Parser)]
#[command(
    name = "paraviz",
    about = "paraviz: flight-sim telemetry sampler, FDR recorder and live chart viewer"
)]
struct Cli {
    /// JSON configuration file; every field is optional
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Where log output goes (default: paraviz.log in the cockpit, stderr otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly the simulated aircraft in the terminal cockpit
    Fly,
    /// Play a capture file back through the cockpit
    Replay { capture: PathBuf },
    /// Log an FDR file without the cockpit (headless)
    Record {
        /// Seconds to record; 0 runs until interrupted
        #[arg(long, default_value = "0")]
        duration: u64,
        /// Also write a binary capture next to the FDR file
        #[arg(long)]
        capture: bool,
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Convert a capture file to an FDR file
    Export {
        capture: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the effective signal tables
    Signals,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, Commands::Fly | Commands::Replay { .. });
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| interactive.then(|| PathBuf::from(DEFAULT_LOG_FILE)));
    init_tracing(cli.verbose, log_file.as_deref())?;

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fly => cmd_fly(&config),
        Commands::Replay { capture } => cmd_replay(&config, &capture),
        Commands::Record {
            duration,
            capture,
            output_dir,
        } => {
            config.fdr.capture |= capture;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            cmd_record(&config, duration)
        }
        Commands::Export { capture, output } => cmd_export(&config, &capture, &output),
        Commands::Signals => {
            cmd_signals(&config);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt().with_max_level(level);
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file: {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Signal handling
// ---------------------------------------------------------------------------

fn install_signal_handler() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))
        .context("failed to register SIGINT handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))
        .context("failed to register SIGTERM handler")?;
    Ok(shutdown)
}

// ---------------------------------------------------------------------------
// Terminal setup / teardown
// ---------------------------------------------------------------------------

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("failed to create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Host assembly
// ---------------------------------------------------------------------------

fn terminal_renderer_factory() -> RendererFactory {
    Arc::new(|| -> Result<Box<dyn ChartRenderer>> {
        Ok(Box::new(TerminalRenderer::stdout()?))
    })
}

fn headless_renderer_factory() -> RendererFactory {
    Arc::new(|| -> Result<Box<dyn ChartRenderer>> {
        bail!("the live chart needs the terminal cockpit")
    })
}

/// Loads the plugin set, then starts and enables it.
fn build_host(
    config: &Config,
    env: Box<dyn Environment>,
    aircraft: &str,
    factory: RendererFactory,
) -> SimHost {
    let mut host = SimHost::new(env, aircraft);
    host.add(Box::new(FdrRecorder::new(config)));
    host.add(Box::new(Paraviz::new(&config.paraviz, factory)));
    host.add(Box::new(ParamDisplay::new(&config.display)));
    host.add(Box::new(HeadingCommand::new()));
    host.start_all();
    host.enable_all();
    host
}

// ---------------------------------------------------------------------------
// Fly / replay subcommands
// ---------------------------------------------------------------------------

fn cmd_fly(config: &Config) -> Result<()> {
    let host = build_host(
        config,
        Box::new(SimulatedAircraft::new()),
        &config.aircraft,
        terminal_renderer_factory(),
    );
    let app = App::new(
        &config.aircraft,
        &config.tail,
        false,
        Duration::from_millis(config.fdr.sample_period_ms),
    );
    run_cockpit(host, app)
}

fn cmd_replay(config: &Config, path: &Path) -> Result<()> {
    let reader = CaptureReader::open(path)?;
    let metadata = reader.metadata().clone();
    info!(
        path = %path.display(),
        samples = reader.sample_count(),
        aircraft = %metadata.aircraft,
        "replaying capture"
    );

    let host = build_host(
        config,
        Box::new(CaptureReplay::new(reader)),
        &metadata.aircraft,
        terminal_renderer_factory(),
    );
    let app = App::new(
        &metadata.aircraft,
        &metadata.tail,
        true,
        Duration::from_millis(metadata.sample_period_ms),
    );
    run_cockpit(host, app)
}

fn run_cockpit(mut host: SimHost, mut app: App) -> Result<()> {
    let shutdown = install_signal_handler()?;
    let mut terminal = setup_terminal()?;

    let result = run_cockpit_loop(&shutdown, &mut host, &mut app, &mut terminal);

    // Stops any render thread before the screen is handed back.
    host.shutdown();
    restore_terminal(&mut terminal)?;
    result
}

fn run_cockpit_loop(
    shutdown: &Arc<AtomicBool>,
    host: &mut SimHost,
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<()> {
    let mut last_tick = Instant::now();
    let mut window_was_open = false;

    loop {
        if shutdown.load(Ordering::Relaxed) || app.should_quit {
            break;
        }

        if event::poll(EVENT_POLL_TIMEOUT).context("failed to poll events")?
            && let Event::Key(key) = event::read().context("failed to read event")?
            && key.kind == KeyEventKind::Press
        {
            if host.window_open() {
                if let Some(key) = host_key(key.code) {
                    host.handle_key(key);
                }
            } else {
                let action = handle_key(key.code, app.is_replay);
                if let Action::Host(key) = action {
                    host.handle_key(key);
                }
                app.handle_action(&action);
            }
        }

        if let Some(controls) = app.replay_controls()
            && let Some(replay) = host.replay_mut()
        {
            controls.apply(replay);
        }

        let now = Instant::now();
        host.tick(now.duration_since(last_tick));
        last_tick = now;

        if let Some(replay) = host.replay_mut()
            && let Some(controls) = app.replay_controls_mut()
        {
            controls.follow(replay);
        }

        // A plugin window owns the screen while it exists.
        if host.window_open() {
            window_was_open = true;
            continue;
        }
        if window_was_open {
            terminal.clear().context("failed to reclaim the screen")?;
            window_was_open = false;
        }

        app.update(CockpitFrame::capture(host));
        terminal
            .draw(|f| app.render(f))
            .context("failed to draw frame")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Record (headless) subcommand
// ---------------------------------------------------------------------------

fn cmd_record(config: &Config, duration_secs: u64) -> Result<()> {
    let shutdown = install_signal_handler()?;
    let mut host = build_host(
        config,
        Box::new(SimulatedAircraft::new()),
        &config.aircraft,
        headless_renderer_factory(),
    );

    if let Err(e) = fdr_recorder::start_logging(&mut host) {
        host.shutdown();
        return Err(e);
    }

    let max_duration = (duration_secs > 0).then(|| Duration::from_secs(duration_secs));
    let start = Instant::now();
    let mut last_tick = start;
    let mut last_status = start;

    eprintln!(
        "Recording {} to {} ...",
        config.aircraft,
        config.output_dir.display()
    );

    loop {
        if shutdown.load(Ordering::Relaxed) {
            eprintln!("\nInterrupted.");
            break;
        }
        if let Some(max) = max_duration
            && start.elapsed() >= max
        {
            eprintln!("\nDuration limit reached.");
            break;
        }

        std::thread::sleep(RECORD_TICK);
        let now = Instant::now();
        host.tick(now.duration_since(last_tick));
        last_tick = now;

        if last_status.elapsed() >= HEADLESS_STATUS_INTERVAL {
            print_recording_status(start.elapsed(), &mut host);
            last_status = Instant::now();
        }
    }

    host.shutdown();
    Ok(())
}

fn print_recording_status(elapsed: Duration, host: &mut SimHost) {
    let secs = elapsed.as_secs();
    let status =
        fdr_recorder::logging_status(host).unwrap_or_else(|| "not logging".to_string());
    eprintln!("  [{secs}s] {status}");
}

// ---------------------------------------------------------------------------
// Export subcommand
// ---------------------------------------------------------------------------

fn cmd_export(config: &Config, input: &Path, output: &Path) -> Result<()> {
    let reader = CaptureReader::open(input)?;
    let metadata = reader.metadata();

    let started = DateTime::<Local>::from(metadata.recording_start).naive_local();
    let mut header = config.fdr_header(&metadata.aircraft, started);
    header.tail.clone_from(&metadata.tail);

    let mut sink = FdrSink::from_signals(&metadata.signals);
    sink.start(output, &header)?;
    for sample in reader.samples() {
        sink.on_sample(sample)?;
    }

    match sink.stop() {
        StopOutcome::Stopped { path, samples } => {
            eprintln!(
                "Exported {samples} samples from {} to {}",
                input.display(),
                path.display()
            );
            Ok(())
        }
        StopOutcome::NotActive => bail!("FDR session closed before export finished"),
    }
}

// ---------------------------------------------------------------------------
// Signals subcommand
// ---------------------------------------------------------------------------

fn cmd_signals(config: &Config) {
    print_signal_table(
        &format!("FDR (every {} ms)", config.fdr.sample_period_ms),
        &config.fdr.signals,
    );
    print_signal_table(
        &format!(
            "ParaViz (every {} ms, {} s history)",
            config.paraviz.sample_period_ms, config.paraviz.history_seconds
        ),
        &config.paraviz.signals,
    );
    print_signal_table("Display", &config.display.signals);
}

fn print_signal_table(title: &str, signals: &[Signal]) {
    println!("{title}:");
    for s in signals {
        let mut flags = Vec::new();
        if s.positional {
            flags.push("positional".to_string());
        }
        if !s.enabled {
            flags.push("disabled".to_string());
        }
        if let Some(limit) = s.warn_above {
            flags.push(format!("warn>={limit}"));
        }
        if let Some(limit) = s.alert_above {
            flags.push(format!("alert>={limit}"));
        }
        println!(
            "  {:<16} {:<12} {:<56} {}",
            s.name,
            s.column(),
            s.address,
            flags.join(" ")
        );
    }
    println!();
}
