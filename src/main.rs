//! Credential Label Maker
//!
//! Turns username/password pairs into square QR credential labels and
//! exports them as 10x10cm PDFs, one label or a whole batch at a time.
//! Runs as a desktop window, or headless when credentials are given on the
//! command line.

mod app;
mod batch;
mod config;
mod document;
mod error;
mod export;
mod label;
mod render;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use app::LabelApp;
use batch::{BatchEntry, BatchQueue};
use config::LabelConfig;
use document::PdfBackend;
use export::{ExportOutcome, ExportSequencer, ExportSettings};
use label::LabelRenderer;
use render::{FontBook, LabelRasterizer, Rasterizer};

/// Credential Label Maker
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON label configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving generated PDFs
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// TrueType/OpenType font used for label text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Export one label for this username without opening the window
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Password for the headless single label (visible in the process list)
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Export every entry of a JSON batch file without opening the window
    #[arg(short, long, conflicts_with = "username")]
    batch_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG refines the default level
    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Credential Label Maker starting...");

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from: {:?}", path);
            LabelConfig::load_from_file(path)?
        }
        None => LabelConfig::default(),
    };
    if let Some(dir) = args.output_dir.clone() {
        config.export.output_dir = dir;
    }
    if let Some(font) = args.font.clone() {
        config.font_path = Some(font);
    }
    info!("Output directory: {:?}", config.export.output_dir);

    let fonts = match FontBook::load(config.font_path.as_deref()) {
        Ok(fonts) => fonts,
        Err(e) => {
            warn!("Failed to load font {:?}: {}, using embedded face", config.font_path, e);
            FontBook::embedded().context("Failed to load embedded font")?
        }
    };
    let fonts = Arc::new(fonts);

    let renderer = Arc::new(LabelRenderer::new(config.layout.clone(), fonts.clone()));
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(LabelRasterizer::new(fonts));
    let sequencer = ExportSequencer::new(
        renderer.clone(),
        rasterizer.clone(),
        Arc::new(PdfBackend),
        ExportSettings::from_config(&config),
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        let outcome = runtime.block_on(sequencer.export_single(username, password))?;
        return report(outcome);
    }

    if let Some(path) = &args.batch_file {
        let entries = BatchEntry::load_from_file(path)?;
        let mut queue = BatchQueue::new();
        let accepted = queue.import(&entries);
        if accepted < entries.len() {
            warn!(
                "Skipped {} batch entr(ies) with an empty field",
                entries.len() - accepted
            );
        }
        let outcome = runtime.block_on(sequencer.export_batch(queue.list()))?;
        return report(outcome);
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1040.0, 680.0])
            .with_min_inner_size([960.0, 600.0])
            .with_title("Gerador de Etiquetas Pro"),
        ..Default::default()
    };

    let handle = runtime.handle().clone();
    eframe::run_native(
        "Gerador de Etiquetas Pro",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(LabelApp::new(
                cc,
                renderer,
                rasterizer,
                sequencer,
                handle,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {}", e))?;

    Ok(())
}

/// Headless runs fail when nothing was written
fn report(outcome: ExportOutcome) -> Result<()> {
    match outcome {
        ExportOutcome::Saved { path, pages } => {
            info!("Saved {} page(s) to {}", pages, path.display());
            Ok(())
        }
        ExportOutcome::Skipped => anyhow::bail!("Nothing to export: username and password are required"),
    }
}
