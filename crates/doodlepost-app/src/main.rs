//! Command line entry point.

use chrono::Utc;
use clap::{Parser, Subcommand};
use doodlepost_app::{AppConfig, Script, ScriptError, SendError, SendPipeline, replay};
use doodlepost_core::color::{ColorError, Rgba};
use doodlepost_core::config::ConfigError;
use doodlepost_core::metadata::{self, DoodleMetadata, FileStore, StoreError};
use doodlepost_render::{Renderer, RendererError, SkiaRenderer};
use kurbo::Size;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "doodlepost", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Shared metadata file (overrides the configuration).
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded session and export it as PNG.
    Replay {
        script: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Export width in points (defaults to the canvas width).
        #[arg(long, requires = "height")]
        width: Option<f64>,
        /// Export height in points (defaults to the canvas height).
        #[arg(long, requires = "width")]
        height: Option<f64>,
    },
    /// Replay a recorded session and send it.
    Send {
        script: PathBuf,
        /// Sender display name.
        #[arg(long)]
        name: Option<String>,
        /// Sender accent color as hex.
        #[arg(long)]
        color: Option<String>,
    },
    /// Print the latest doodle record.
    Show,
    /// Stamp the widget refresh time.
    MarkRefreshed,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Send(#[from] SendError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Doodlepost");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(path) = cli.metadata {
        config.metadata_path = Some(path);
    }

    match cli.command {
        Command::Replay {
            script,
            output,
            width,
            height,
        } => {
            let (script_data, session) = load_session(&script, &config)?;
            let target = match (width, height) {
                (Some(w), Some(h)) => Size::new(w, h),
                _ => config.export_size.unwrap_or(script_data.canvas),
            };
            let exported = SkiaRenderer::new().render_export(session.drawing(), target)?;
            std::fs::write(&output, &exported.png)?;
            println!(
                "Wrote {} ({}x{})",
                output.display(),
                exported.width,
                exported.height
            );
        }
        Command::Send {
            script,
            name,
            color,
        } => {
            if let Some(name) = name {
                config.sender.display_name = name;
            }
            if let Some(color) = color {
                config.sender.accent_color = Rgba::from_hex(&color)?;
            }
            let (script_data, mut session) = load_session(&script, &config)?;
            let target = config.export_size.unwrap_or(script_data.canvas);

            let store = open_store(&config)?;
            let mut pipeline = SendPipeline::new(store, &config.output_dir, config.sender.clone());
            let receipt = pipeline.send(&mut session, target)?;
            println!("Sent {}", receipt.image_path.display());
        }
        Command::Show => {
            let store = open_store(&config)?;
            let record = DoodleMetadata::read_from(&store)?;
            println!("image:     {}", record.latest_image_path);
            println!("sender:    {} ({})", record.sender_name, record.sender_initials);
            println!("color:     {}", record.sender_color.to_hex());
            println!("doodle id: {}", record.doodle_id.as_deref().unwrap_or("-"));
            println!("updated:   {}", record.last_updated.to_rfc3339());
            if let Some(refreshed) = record.last_widget_refresh {
                println!("refreshed: {}", refreshed.to_rfc3339());
            }
        }
        Command::MarkRefreshed => {
            let store = open_store(&config)?;
            metadata::mark_widget_refreshed(&store, Utc::now())?;
        }
    }
    Ok(())
}

fn load_session(
    path: &Path,
    config: &AppConfig,
) -> Result<(Script, doodlepost_core::DoodleSession), CliError> {
    let script = Script::load(path)?;
    let base_dir = path.parent().unwrap_or(Path::new("."));
    let session = replay(&script, config.drawing.clone(), base_dir)?;
    Ok((script, session))
}

fn open_store(config: &AppConfig) -> Result<FileStore, StoreError> {
    match &config.metadata_path {
        Some(path) => FileStore::open(path.clone()),
        None => FileStore::default_location(),
    }
}
