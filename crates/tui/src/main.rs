mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{Local, TimeDelta};
use clap::Parser;
use timeline_core::source::parse_timestamps;
use timeline_core::svg::render_svg;
use timeline_core::{FixedWidthMetrics, RenderSurface, TimeRange, TimelineConfig};
use tracing_subscriber::EnvFilter;

const SVG_WIDTH: f64 = 1_200.0;
const SVG_HEIGHT: f64 = 240.0;

/// Interactive histogram of a timestamp series.
#[derive(Parser, Debug)]
#[command(name = "timeline", version)]
struct Args {
    /// JSON array or newline-separated timestamps.
    input: PathBuf,
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write one frame as SVG instead of opening the terminal UI.
    #[arg(long)]
    svg: Option<PathBuf>,
    /// Log file; nothing is logged without one.
    #[arg(long)]
    log: Option<PathBuf>,
}

/// Log to `path` only; the terminal belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<TimelineConfig> {
    let Some(path) = path else {
        return Ok(TimelineConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    TimelineConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// The last hour, shown when the input holds no timestamps.
fn default_window() -> TimeRange {
    let now = Local::now();
    let start = now - TimeDelta::hours(1);
    TimeRange::new(start.timestamp_micros() as f64, now.timestamp_micros() as f64)
}

fn export_svg(timestamps: Vec<i64>, config: TimelineConfig, out: &Path) -> Result<()> {
    let metrics = FixedWidthMetrics { char_width: 6.0 };
    let mut surface = RenderSurface::new(Local, config, &metrics, SVG_WIDTH, SVG_HEIGHT, default_window())?;
    surface.load(timestamps)?;
    let commands = surface.paint()?;
    let svg = render_svg(&commands, SVG_WIDTH, SVG_HEIGHT, true);
    std::fs::write(out, svg).with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(path = %out.display(), commands = commands.len(), "wrote svg");
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(log) = &args.log {
        init_logging(log)?;
    }

    let config = load_config(args.config.as_deref())?;
    let data = std::fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let timestamps = parse_timestamps(&data).with_context(|| format!("parsing {}", args.input.display()))?;

    if let Some(out) = &args.svg {
        return export_svg(timestamps, config, out);
    }

    let title = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    renderer::run(timestamps, config, default_window(), &title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("timeline").chain(list.iter().copied()))
    }

    #[test]
    fn parses_input_and_options_in_any_order() {
        let parsed = args(&["--svg", "out.svg", "events.txt", "--log", "t.log"]);
        let parsed = match parsed {
            Ok(a) => a,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(parsed.input, PathBuf::from("events.txt"));
        assert_eq!(parsed.svg, Some(PathBuf::from("out.svg")));
        assert_eq!(parsed.log, Some(PathBuf::from("t.log")));
        assert_eq!(parsed.config, None);
    }

    #[test]
    fn rejects_missing_values_and_extra_inputs() {
        assert!(args(&[]).is_err());
        assert!(args(&["events.txt", "--svg"]).is_err());
        assert!(args(&["a.txt", "b.txt"]).is_err());
        assert!(args(&["a.txt", "--frobnicate", "x"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
