/// Desktop viewer for a timestamp series.
#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser, Debug)]
#[command(name = "timeline-viewer", version)]
struct Args {
    /// JSON array or newline-separated timestamps to open at start.
    input: Option<std::path::PathBuf>,
    /// JSON configuration file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use clap::Parser;
    use timeline_core::TimelineConfig;
    use timeline_ui::TimelineApp;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let Args { input, config } = Args::parse();
    let config = match config {
        Some(path) => {
            let text = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            TimelineConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => TimelineConfig::default(),
    };
    let initial = match &input {
        Some(path) => {
            let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Some((name, data))
        }
        None => None,
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("timeline")
            .with_inner_size([1200.0, 360.0]),
        ..Default::default()
    };
    eframe::run_native(
        "timeline",
        options,
        Box::new(move |cc| {
            let app = TimelineApp::new(cc, config);
            Ok(Box::new(match &initial {
                Some((name, data)) => app.with_file(name, data),
                None => app,
            }))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}

#[cfg(target_arch = "wasm32")]
fn main() {}
