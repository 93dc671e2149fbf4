use anyhow::Context;
use clap::Parser;
use fitsview::config::Config;
use fitsview::view::FitsViewerApp;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fitsview", about = "FITS image viewer with match mode and tap subtraction")]
struct Args {
    /// FITS file to show, or directory to watch for new images
    path: Option<PathBuf>,

    /// Configuration file (defaults to ./fitsview.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in match mode, showing the two newest images side by side
    #[arg(long)]
    match_mode: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    fitsview::logging::init(args.verbose);

    let config = Config::load(args.config.as_deref()).context("cannot load configuration")?;
    if let Some(path) = &args.path {
        if !path.exists() {
            anyhow::bail!("{} does not exist", path.display());
        }
    }
    tracing::info!(path = ?args.path, match_mode = args.match_mode, "starting viewer");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_title("FITS Image Viewer"),
        ..Default::default()
    };

    eframe::run_native(
        "fitsview",
        options,
        Box::new(move |cc| {
            Ok(Box::new(FitsViewerApp::new(cc, config, args.path, args.match_mode)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))
}
