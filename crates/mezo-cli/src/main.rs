//! `mezo`: replay an annotation session headlessly.
//!
//! ```text
//! mezo replay --image sample/img_01.png --script steps.json
//! ```
//!
//! Opens the image with its annotations and mask, feeds the script through
//! the editor session and prints the analysis summary as JSON.

mod script;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use mezo_core::{EditorConfig, FileRecordStore, ImageId, ImageMeta, Size};
use mezo_editor::{ColorThresholdOracle, EditorSession, ImageSource};
use mezo_raster::MaskFiles;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mezo", version, about = "Mezophase annotation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a script of events and commands to an image, then print the summary
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Source image
    #[arg(long)]
    image: PathBuf,
    /// JSON array of steps
    #[arg(long)]
    script: PathBuf,
    /// Root for masks, results and the record store
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Sample name (default: the image's parent directory)
    #[arg(long)]
    sample: Option<String>,
    /// Position of the image within its sample
    #[arg(long, default_value_t = 0)]
    index: usize,
    /// Record key of the image
    #[arg(long, default_value_t = 1)]
    image_id: u64,
    /// Host window size, chrome included
    #[arg(long, default_value = "1280x800", value_parser = parse_window)]
    window: Size,
    /// Editor config JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Flood-fill tolerance for magic select
    #[arg(long, default_value_t = 32)]
    tolerance: u8,
}

fn parse_window(text: &str) -> Result<Size, String> {
    let (w, h) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {text:?}"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("width: {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("height: {e}"))?;
    if w > 0.0 && h > 0.0 {
        Ok(Size::new(w, h))
    } else {
        Err(format!("window must be positive, got {text:?}"))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Replay(args) => replay(args),
    }
}

fn replay(args: ReplayArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EditorConfig::load(path)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    let sample = match args.sample.clone() {
        Some(name) => name,
        None => args
            .image
            .parent()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string()),
    };
    if sample.is_empty() {
        bail!("sample name must not be empty");
    }

    let pixels = image::open(&args.image)
        .with_context(|| format!("cannot open image {}", args.image.display()))?
        .to_rgba8();
    let files = MaskFiles::for_sample(&args.data_dir, &sample, args.index, &args.image);

    let db_path = args.data_dir.join(&sample).join("mezo.msgpack");
    let records = FileRecordStore::open(&db_path)
        .map_err(anyhow::Error::msg)
        .context("opening record store")?;

    let steps = script::load(&args.script)?;

    let mut session = EditorSession::new(
        config,
        records,
        ColorThresholdOracle::new(args.tolerance),
        args.window,
    );
    session
        .open_image(ImageSource {
            image_id: ImageId(args.image_id),
            pixels,
            files: Some(files),
            meta: ImageMeta::default(),
        })
        .context("opening image")?;

    script::run(&mut session, &steps)?;

    let summary = session.summary().context("computing summary")?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if let Some(status) = session.status_line() {
        log::info!("{status}");
    }
    session.close_image();
    Ok(())
}
