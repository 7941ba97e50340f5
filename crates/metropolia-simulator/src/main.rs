//! Headless simulator for the Metropolia smart-city dashboard streams.
//!
//! Stands in for the dashboard: fires the refresh timer, advances the
//! generator, reads every sensor's snapshot back and prints the frame the
//! dashboard would draw. Set `RUST_LOG=debug` to see per-tick generator
//! logs.
//!
//! ```text
//! metropolia-simulator --fast --ticks 720            # one simulated hour
//! metropolia-simulator --json --seed 7 | jq .banner  # JSON lines
//! metropolia-simulator --config city.toml            # custom sensors
//! ```

mod dashboard;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::{error, info};
use thiserror::Error;

use metropolia_core::{ConfigError, SharedStream, StreamConfig, StreamError, StreamGenerator};

use crate::dashboard::Frame;

#[derive(Parser, Debug)]
#[command(name = "metropolia-simulator")]
#[command(about = "Drive the Metropolia sensor streams on a timer and print dashboard frames")]
struct Args {
    /// TOML stream configuration; built-in city defaults when omitted.
    #[arg(long, env = "METROPOLIA_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for reproducible streams; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks; run until killed when omitted.
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the configured tick interval.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Ticks of history generated before the first frame.
    #[arg(long, default_value = "50")]
    warm_up: usize,

    /// Advance a simulated clock by one interval per tick without sleeping.
    #[arg(long)]
    fast: bool,

    /// Print one JSON frame per line instead of the text dashboard.
    #[arg(long)]
    json: bool,
}

#[derive(Error, Debug)]
enum SimulatorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Source of tick timestamps.
enum Clock {
    Wall,
    /// Starts at the wall time and steps one interval per tick.
    Simulated { now_ms: u64, interval_ms: u64 },
}

impl Clock {
    fn new(fast: bool, interval_ms: u64) -> Self {
        if fast {
            Self::Simulated {
                now_ms: wall_clock_ms(),
                interval_ms,
            }
        } else {
            Self::Wall
        }
    }

    /// Timestamp for the next tick.
    fn tick(&mut self) -> u64 {
        match self {
            Self::Wall => wall_clock_ms(),
            Self::Simulated {
                now_ms,
                interval_ms,
            } => {
                *now_ms = now_ms.saturating_add(*interval_ms);
                *now_ms
            }
        }
    }

    /// Timestamp warm-up history should end at.
    fn now(&self) -> u64 {
        match self {
            Self::Wall => wall_clock_ms(),
            Self::Simulated { now_ms, .. } => *now_ms,
        }
    }

    fn paces(&self) -> bool {
        matches!(self, Self::Wall)
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn load_config(args: &Args) -> Result<StreamConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading stream configuration from {}", path.display());
            StreamConfig::load(path)?
        }
        None => StreamConfig::default(),
    };

    if let Some(interval_ms) = args.interval_ms {
        config.tick_interval_ms = interval_ms;
    }

    Ok(config)
}

/// Write one frame to `out`.
///
/// A frame that fails to serialize is logged and skipped. Write errors are
/// returned so the caller can tell a closed pipe from a transient failure.
fn emit(out: &mut impl Write, frame: &Frame, json: bool) -> io::Result<()> {
    if json {
        match serde_json::to_string(frame) {
            Ok(line) => writeln!(out, "{line}")?,
            Err(e) => {
                error!("Failed to serialize frame {}: {}", frame.tick, e);
                return Ok(());
            }
        }
    } else {
        writeln!(out, "{frame}\n")?;
    }
    out.flush()
}

fn run(args: Args) -> Result<(), SimulatorError> {
    run_with(args, &mut io::stdout().lock())
}

/// Drive the stream and write frames to `out` until the tick limit is hit
/// or the reader goes away.
fn run_with(args: Args, out: &mut impl Write) -> Result<(), SimulatorError> {
    let config = load_config(&args)?;
    let interval = Duration::from_millis(config.tick_interval_ms);

    let generator = match args.seed {
        Some(seed) => StreamGenerator::new(config, seed)?,
        None => StreamGenerator::from_entropy(config)?,
    };
    let stream = SharedStream::new(generator);

    let mut clock = Clock::new(args.fast, interval.as_millis() as u64);
    stream.warm_up(args.warm_up, clock.now());

    info!(
        "Running {} ticks every {:?}{}",
        args.ticks
            .map_or_else(|| "unbounded".to_string(), |t| t.to_string()),
        interval,
        if args.fast { " (simulated clock)" } else { "" }
    );

    let mut ticks_run = 0u64;
    loop {
        if args.ticks.is_some_and(|limit| ticks_run >= limit) {
            break;
        }
        let tick_start = Instant::now();

        stream.advance(clock.tick());
        ticks_run += 1;

        match stream.with(Frame::build)? {
            Some(frame) => match emit(out, &frame, args.json) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    info!("Output closed after tick {}, stopping", ticks_run);
                    break;
                }
                Err(e) => error!("Failed to write frame {}: {}", frame.tick, e),
            },
            None => error!("No readings after tick {}", ticks_run),
        }

        // --- Tick pacing --------------------------------------------------
        if clock.paces() {
            let elapsed = tick_start.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
    }

    info!("Simulator finished after {} ticks", ticks_run);
    Ok(())
}

fn main() {
    env_logger::init();
    info!("Starting Metropolia stream simulator");

    if let Err(e) = run(Args::parse()) {
        error!("{e}");
        eprintln!("metropolia-simulator: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = Args::try_parse_from(["metropolia-simulator"]).unwrap();
        assert_eq!(args.warm_up, 50);
        assert!(!args.fast);
        assert!(!args.json);
        assert_eq!(args.ticks, None);
    }

    #[test]
    fn test_interval_override() {
        let args = Args::try_parse_from([
            "metropolia-simulator",
            "--interval-ms",
            "250",
            "--seed",
            "7",
            "--ticks",
            "3",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.tick_interval_ms, 250);
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn test_zero_interval_fails_fast() {
        let args =
            Args::try_parse_from(["metropolia-simulator", "--interval-ms", "0", "--ticks", "1"])
                .unwrap();
        assert!(matches!(
            run(args),
            Err(SimulatorError::Stream(StreamError::Config(
                ConfigError::InvalidTickInterval(0)
            )))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args::try_parse_from([
            "metropolia-simulator",
            "--config",
            "/definitely/not/here.toml",
        ])
        .unwrap();
        assert!(matches!(
            run(args),
            Err(SimulatorError::Config(ConfigError::Io { .. }))
        ));
    }

    #[test]
    fn test_simulated_clock_steps_by_interval() {
        let mut clock = Clock::Simulated {
            now_ms: 1_000,
            interval_ms: 5_000,
        };
        assert_eq!(clock.now(), 1_000);
        assert_eq!(clock.tick(), 6_000);
        assert_eq!(clock.tick(), 11_000);
        assert!(!clock.paces());
        assert!(Clock::Wall.paces());
    }

    #[test]
    fn test_fast_run_completes() {
        let args = Args::try_parse_from([
            "metropolia-simulator",
            "--fast",
            "--json",
            "--seed",
            "3",
            "--ticks",
            "5",
            "--warm-up",
            "2",
        ])
        .unwrap();
        assert!(run(args).is_ok());
    }

    /// A reader that has gone away, like `head` after its last line.
    struct ClosedPipe {
        writes: usize,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_closed_output_stops_unbounded_run() {
        let args = Args::try_parse_from([
            "metropolia-simulator",
            "--fast",
            "--seed",
            "3",
            "--warm-up",
            "0",
        ])
        .unwrap();
        let mut out = ClosedPipe { writes: 0 };

        assert!(run_with(args, &mut out).is_ok());
        assert_eq!(out.writes, 1);
    }

    #[test]
    fn test_frames_reach_the_writer() {
        let args = Args::try_parse_from([
            "metropolia-simulator",
            "--fast",
            "--json",
            "--seed",
            "3",
            "--ticks",
            "3",
            "--warm-up",
            "0",
        ])
        .unwrap();
        let mut out = Vec::new();

        run_with(args, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 3);
        let first = text.lines().next().unwrap();
        let first: serde_json::Value = serde_json::from_str(first).unwrap();
        assert_eq!(first["tick"], 1);
    }
}
