//! virtual-monitors - Physical display layout mirrored into a 3D scene
//!
//! Entry point for the headless runner binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

use virtual_monitors::config::Config;
use virtual_monitors::driver::{DriverSupervisor, ShellDriver};
use virtual_monitors::headless::HeadlessRunner;
use virtual_monitors::multimon::DisplayRecord;
use virtual_monitors::utils::{format_user_error, log_startup_diagnostics, MetricsCollector};

/// Command-line arguments for virtual-monitors
#[derive(Parser, Debug)]
#[command(name = "virtual-monitors")]
#[command(version, about = "Mirror the physical display layout into a 3D scene", long_about = None)]
pub struct Args {
    /// Configuration file path (default: per-user config directory)
    #[arg(short, long, env = "VIRTUAL_MONITORS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scene units per 1000 pixels
    #[arg(short, long)]
    pub scale: Option<f32>,

    /// Keep exactly this many screens instead of one per display
    #[arg(long)]
    pub fixed_count: Option<usize>,

    /// Static display NAME:X:Y[:WxH] (repeatable, replaces OS enumeration)
    #[arg(long = "static-display", value_name = "NAME:X:Y[:WxH]")]
    pub static_displays: Vec<DisplayRecord>,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact), overrides the config file
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config loading logs before the real subscriber exists
    let bootstrap = bootstrap_subscriber(std::io::stderr, args.verbose);
    let config = match tracing::subscriber::with_default(bootstrap, || load_config(&args)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };

    let _log_guard = init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  virtual-monitors v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    log_startup_diagnostics();
    debug!("Config: {:?}", config);

    if let Err(e) = run(&args, &config).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    info!("virtual-monitors shut down");
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let config = Config::load_or_default(args.config.as_deref())?.with_overrides(
        args.scale,
        args.fixed_count,
        args.static_displays.clone(),
    );
    config
        .validate()
        .context("Invalid configuration after applying command line")?;
    Ok(config)
}

async fn run(args: &Args, config: &Config) -> Result<()> {
    let mut driver = if config.driver.enabled {
        let mut supervisor = DriverSupervisor::new(
            ShellDriver::new(
                config.driver.add_command.clone(),
                config.driver.remove_command.clone(),
            ),
            config.driver.max_cleanup_attempts,
        );
        supervisor.add_displays(config.driver.virtual_displays);
        Some(supervisor)
    } else {
        None
    };

    let result = run_frames(args, config).await;

    if let Some(supervisor) = driver.as_mut() {
        supervisor.cleanup();
    }

    result
}

async fn run_frames(args: &Args, config: &Config) -> Result<()> {
    let metrics = Arc::new(MetricsCollector::new());
    let mut runner = HeadlessRunner::new(
        config.multimon_config()?,
        config.display_enumerator(),
        config.display_order(),
        config.runtime.settle_frames,
    )
    .with_metrics(metrics.clone());

    runner.start()?;
    for record in runner.manager().snapshot().records() {
        info!("  Display: {}", record);
    }
    info!(
        "Running at {} fps with {} screen(s)",
        config.runtime.target_fps,
        runner.manager().slots().len()
    );

    let mut interval = tokio::time::interval(config.frame_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut rescan = RescanSignal::new();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = match runner.tick() {
                    Ok(report) => report,
                    Err(e) => break Err(anyhow::Error::from(e)),
                };
                if args.frames.is_some_and(|max| report.frame >= max) {
                    info!("Reached {} frames", report.frame);
                    break Ok(());
                }
            }
            _ = &mut ctrl_c => {
                info!("Ctrl-C received, shutting down");
                break Ok(());
            }
            _ = rescan.recv() => {
                info!("SIGHUP received, re-scanning displays");
                runner.request_rescan();
            }
        }
    };

    info!("=== Final Placement ===");
    for (index, name, position) in runner.manager().backend().placements() {
        match (name, position) {
            (Some(name), Some(p)) => {
                info!("  Screen {}: {} at ({:.3}, {:.3}, {:.3})", index, name, p.x, p.y, p.z)
            }
            (name, _) => info!(
                "  Screen {}: {} (not placed)",
                index,
                name.as_deref().unwrap_or("unresolved")
            ),
        }
    }

    match metrics.export_json() {
        Ok(json) => info!("Metrics: {}", json),
        Err(e) => warn!("Failed to export metrics: {}", e),
    }

    runner.shutdown();
    result
}

/// SIGHUP on Unix; never fires elsewhere
struct RescanSignal {
    #[cfg(unix)]
    hangup: Option<tokio::signal::unix::Signal>,
}

impl RescanSignal {
    fn new() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let hangup = match signal(SignalKind::hangup()) {
                Ok(hangup) => Some(hangup),
                Err(e) => {
                    warn!("Cannot listen for SIGHUP, re-scan on signal disabled: {}", e);
                    None
                }
            };
            Self { hangup }
        }
        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        {
            if let Some(hangup) = self.hangup.as_mut() {
                if hangup.recv().await.is_some() {
                    return;
                }
                self.hangup = None;
            }
        }
        std::future::pending::<()>().await
    }
}

/// Minimal subscriber used until the configured one is installed
fn bootstrap_subscriber<W>(writer: W, verbose: u8) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let level = if verbose > 0 { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::new(format!(
            "virtual_monitors={level},warn"
        )))
        .finish()
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "virtual_monitors={level},warn",
            level = log_level
        ))
    });

    let format = args
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());

    let mut layers = vec![format_layer(&format, std::io::stdout, true)];
    let mut guard = None;

    // An explicit --log-file wins over the configured rolling directory
    if let Some(path) = &args.log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;
        layers.push(format_layer(&format, std::sync::Mutex::new(file), false));
    } else if let Some(dir) = &config.logging.log_dir {
        let appender = tracing_appender::rolling::daily(dir, "virtual-monitors.log");
        let (writer, worker) = tracing_appender::non_blocking(appender);
        layers.push(format_layer(&format, writer, false));
        guard = Some(worker);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();

    if let Some(path) = &args.log_file {
        info!("Logging to file: {}", path.display());
    } else if let Some(dir) = &config.logging.log_dir {
        info!("Logging to directory: {}", dir.display());
    }

    Ok(guard)
}

fn format_layer<W>(format: &str, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi);

    match format {
        "json" => layer.json().boxed(),
        "compact" => layer.compact().boxed(),
        _ if ansi => layer.pretty().boxed(),
        _ => layer.boxed(),
    }
}
