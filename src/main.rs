use alchemy::Config;
use alchemy::draw::Canvas;
use alchemy::drawing::load_drawing;
use alchemy::export::{
    BitmapFormat, DocumentInfo, PageSize, export_bitmap, export_fit_pdf, export_single_pdf,
};
use alchemy::session::{ManualTicker, SessionRecorder, options_from_config};
use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "alchemy")]
#[command(version, about = "Drawing canvas with timed PDF session recording")]
struct Cli {
    /// Config file to use instead of ~/.config/alchemy/config.toml
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a drawing file to a bitmap (png, jpeg or bmp)
    Render {
        /// Drawing JSON file (optionally gzip-compressed)
        input: PathBuf,

        /// Output image; the format follows the extension unless --format is given
        #[arg(long, short = 'o', value_name = "FILE")]
        output: PathBuf,

        #[arg(long, short = 'f', value_name = "FORMAT", value_parser = parse_format)]
        format: Option<BitmapFormat>,

        /// Skip the background fill where the format allows alpha
        #[arg(long, action = ArgAction::SetTrue)]
        transparent: bool,

        #[arg(long, short = 's', value_name = "FACTOR")]
        scale: Option<f64>,
    },

    /// Export a drawing file as a single-page PDF
    Pdf {
        input: PathBuf,

        #[arg(long, short = 'o', value_name = "FILE")]
        output: PathBuf,

        /// Fit onto a paper size (a4, letter or WIDTHxHEIGHT in points)
        #[arg(long, value_name = "SIZE", value_parser = parse_page_size)]
        fit: Option<PageSize>,
    },

    /// Record drawing files as consecutive pages of one session document
    Session {
        /// Drawing files, one page each
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Directory for the session document (defaults to the configured one)
        #[arg(long, short = 'd', value_name = "DIR")]
        directory: Option<PathBuf>,
    },

    /// Print the config file location
    ConfigPath,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Command::Render {
            input,
            output,
            format,
            transparent,
            scale,
        } => {
            let canvas = open_drawing(&input, &config)?;
            let format = match format {
                Some(format) => format,
                None => format_for(&output).unwrap_or(config.export.format),
            };
            let scale = scale.unwrap_or(config.export.scale);
            if !(0.1..=8.0).contains(&scale) {
                return Err(anyhow!("scale {} is outside 0.1-8.0", scale));
            }
            export_bitmap(
                &canvas,
                &output,
                format,
                transparent || config.export.transparent,
                scale,
            )
            .with_context(|| format!("Failed to export {}", output.display()))?;
            println!("{}", output.display());
        }
        Command::Pdf { input, output, fit } => {
            let canvas = open_drawing(&input, &config)?;
            let info = DocumentInfo::session();
            let result = match fit {
                Some(page) => export_fit_pdf(&canvas, &output, &info, page),
                None => export_single_pdf(&canvas, &output, &info),
            };
            result.with_context(|| format!("Failed to export {}", output.display()))?;
            println!("{}", output.display());
        }
        Command::Session { inputs, directory } => {
            let config_dir = match &cli.config {
                Some(path) => path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")),
                None => Config::config_dir()?,
            };
            let mut options = options_from_config(&config.session, &config_dir)?;
            if let Some(directory) = directory {
                options.directory = directory;
            }
            options.show_indicator = false;
            options.auto_clear = false;

            let mut recorder = SessionRecorder::new(options, ManualTicker::new());
            for input in &inputs {
                let mut canvas = open_drawing(input, &config)?;
                if !recorder.save_page(&mut canvas) {
                    return Err(anyhow!("Failed to record page from {}", input.display()));
                }
            }

            let output = recorder
                .output_path()
                .context("Session produced no document")?;
            log::info!(
                "Recorded {} page(s) into {}",
                recorder.pages_written(),
                output.display()
            );
            println!("{}", output.display());
        }
        Command::ConfigPath => {
            println!("{}", Config::get_config_path()?.display());
        }
    }

    Ok(())
}

fn open_drawing(path: &Path, config: &Config) -> Result<Canvas> {
    let drawing = load_drawing(path)?;
    log::debug!(
        "Loaded {} shape(s) from {}",
        drawing.shapes.len(),
        path.display()
    );
    Ok(drawing.to_canvas(config.canvas_settings()))
}

fn parse_format(value: &str) -> Result<BitmapFormat, String> {
    value.parse().map_err(|err: alchemy::export::ExportError| err.to_string())
}

fn parse_page_size(value: &str) -> Result<PageSize, String> {
    value.parse().map_err(|err: alchemy::export::ExportError| err.to_string())
}

fn format_for(path: &Path) -> Option<BitmapFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
}
