//! hostmon - single-host system metrics sampler.
//!
//! Samples CPU, memory, disk, network and temperature from /proc and /sys
//! and prints one snapshot (or a continuous stream) as text, JSON or CSV.
//! Rates for cumulative counters survive across invocations via a small
//! state file in the system temp directory.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing::{debug, error, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use hostmon_core::clock::UptimeClock;
use hostmon_core::collector::{MetricSelection, MetricsCollector, RealFs, StatvfsSpace};
use hostmon_core::output::{NetworkUnit, OutputFormat, OutputOptions};
use hostmon_core::session::{CancelToken, SamplingSession, SessionConfig};
use hostmon_core::state::StateStore;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Metric {
    /// CPU usage and frequency.
    Cpu,
    /// Physical memory and swap.
    Ram,
    /// Disk space.
    Disk,
    /// Disk read/write throughput.
    Io,
    /// Network throughput and link state.
    Net,
    /// Temperature sensors.
    Temp,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum NetUnits {
    /// Decimal megabits per second.
    Bits,
    /// Decimal megabytes per second.
    Bytes,
}

/// Single-host system metrics sampler.
#[derive(Parser)]
#[command(name = "hostmon", about = "Single-host system metrics sampler", version)]
struct Args {
    /// Metrics to collect (at least one).
    #[arg(value_enum, ignore_case = true, required = true)]
    metrics: Vec<Metric>,

    /// Output format.
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = Format::Text)]
    format: Format,

    /// Compact single-line text output (for status bars).
    #[arg(short, long)]
    line: bool,

    /// Keep sampling until interrupted instead of exiting after one snapshot.
    #[arg(short, long)]
    continuous: bool,

    /// Seconds between samples in continuous mode (0.1 - 3600).
    #[arg(short, long, default_value = "1", value_parser = parse_interval)]
    interval: f64,

    /// Units for network throughput in text output.
    #[arg(long, value_enum, ignore_case = true, default_value_t = NetUnits::Bits)]
    net_units: NetUnits,

    /// Collect only this network interface.
    #[arg(long, value_name = "NAME")]
    interface: Option<String>,

    /// Path to the proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Path to the sys filesystem (for testing/mocking).
    #[arg(long, default_value = "/sys")]
    sys_path: String,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Validates the continuous-mode interval range.
fn parse_interval(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .parse()
        .map_err(|e| format!("invalid interval '{}': {}", s, e))?;
    if !(0.1..=3600.0).contains(&secs) {
        return Err(format!(
            "interval {} out of range (0.1 - 3600 seconds)",
            secs
        ));
    }
    Ok(secs)
}

fn selection(metrics: &[Metric]) -> MetricSelection {
    let mut selection = MetricSelection::default();
    for metric in metrics {
        match metric {
            Metric::Cpu => selection.cpu = true,
            Metric::Ram => selection.ram = true,
            Metric::Disk => selection.disk = true,
            Metric::Io => selection.io = true,
            Metric::Net => selection.net = true,
            Metric::Temp => selection.temp = true,
        }
    }
    selection
}

/// Logging to stderr so snapshot output on stdout stays clean.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from_level(level).into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let fs = RealFs::new();
    // No working clock means no rates; nothing to degrade to.
    let clock = UptimeClock::new(fs, &args.proc_path)?;

    let collector = MetricsCollector::new(
        fs,
        clock.clone(),
        StatvfsSpace::new(),
        selection(&args.metrics),
        &args.proc_path,
        &args.sys_path,
        args.interface.clone(),
    );

    let config = SessionConfig {
        output: OutputOptions {
            format: match args.format {
                Format::Text => OutputFormat::Text,
                Format::Json => OutputFormat::Json,
                Format::Csv => OutputFormat::Csv,
            },
            single_line: args.line,
            net_unit: match args.net_units {
                NetUnits::Bits => NetworkUnit::Bits,
                NetUnits::Bytes => NetworkUnit::Bytes,
            },
            selection: selection(&args.metrics),
        },
        interval: Duration::from_secs_f64(args.interval),
        continuous: args.continuous,
        baseline_gap: None,
    };

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        debug!("interrupt received, finishing current iteration");
        handler_token.cancel();
    })?;

    let store = StateStore::new("hostmon");
    debug!(
        state = %store.path().display(),
        proc = %args.proc_path,
        continuous = args.continuous,
        "starting"
    );

    let mut session = SamplingSession::new(collector, clock, store, config);
    let mut stdout = std::io::stdout().lock();
    session.run(&mut stdout, &cancel)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version land here too; they are not errors.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    init_logging(args.verbose, args.quiet);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}
