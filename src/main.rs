//! photomark command line front end.
//!
//!   photomark render photo.jpg -o marked.png
//!   photomark render photo.jpg --annotations notes.json -o marked.png
//!   photomark inspect photo.jpg.photomark.json
//!   photomark config --write

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use photomark::format::{self, LoadReport};
use photomark::text_layout::layout_text;
use photomark::{AppConfig, Compositor, ExportWorker, LogLevel, SourceImage, Viewport};

/// Annotate photos with shapes and text, and bake annotations into exports.
#[derive(Parser, Debug)]
#[command(name = "photomark", version, about)]
struct Cli {
    /// Log level: error, warn, info, debug, trace. RUST_LOG overrides this.
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Font file for text annotations (TTF/OTF).
    #[arg(long, global = true, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite annotations onto the full-resolution image.
    Render {
        /// Source photo.
        image: PathBuf,

        /// Annotation document. Defaults to the sidecar next to the image.
        #[arg(short, long, value_name = "FILE")]
        annotations: Option<PathBuf>,

        /// Output image; the format follows the extension.
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Print the annotations of a document and any load warnings.
    Inspect {
        /// Annotation document.
        annotations: PathBuf,
    },

    /// Show the effective configuration.
    Config {
        /// Write it to the default config location.
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match AppConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: could not load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::load_from_default_path().unwrap_or_default(),
    };

    if let Some(name) = &cli.log_level {
        match LogLevel::from_name(name) {
            Some(level) => config.preferences.log_level = level,
            None => {
                eprintln!("error: unknown log level '{}'", name);
                return ExitCode::FAILURE;
            }
        }
    }
    if let Some(font) = &cli.font {
        config.font.font_path = Some(font.clone());
    }

    init_logging(config.preferences.log_level);

    let result = match &cli.command {
        Command::Render {
            image,
            annotations,
            output,
        } => run_render(&config, image, annotations.as_deref(), output),
        Command::Inspect { annotations } => run_inspect(annotations),
        Command::Config { write } => run_config(&config, *write),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: LogLevel) {
    let default_filter = level.to_level_filter().to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .init();
}

fn run_render(
    config: &AppConfig,
    image_path: &Path,
    annotations_path: Option<&Path>,
    output: &Path,
) -> Result<(), String> {
    let doc_path = annotations_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| format::sidecar_path(image_path));

    let source = SourceImage::open(image_path)
        .map_err(|e| format!("could not open {}: {}", image_path.display(), e))?;
    let report = format::load(&doc_path).map_err(|e| format!("{}: {}", doc_path.display(), e))?;
    print_warnings(&report);
    let photo = report.into_photo(source);

    let text = match config.font.load_font() {
        Ok(renderer) => Some(renderer),
        Err(e) => {
            log::warn!("No font available ({}), text annotations will be skipped", e);
            None
        }
    };

    let mut worker = ExportWorker::spawn(Compositor::new(text)).map_err(|e| e.to_string())?;
    worker.request_photo(&photo).map_err(|e| e.to_string())?;
    let composited = worker.wait_latest().map_err(|e| e.to_string())?;
    photomark::save_image(&composited, output).map_err(|e| e.to_string())?;

    println!(
        "Rendered {} annotations onto {}x{} -> {}",
        photo.len(),
        composited.width(),
        composited.height(),
        output.display()
    );
    Ok(())
}

fn run_inspect(path: &Path) -> Result<(), String> {
    let report = format::load(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    print_warnings(&report);

    let image = &report.image;
    println!(
        "{} (format {}), image {}x{}{}",
        path.display(),
        report.version,
        image.width,
        image.height,
        image
            .path
            .as_ref()
            .map(|p| format!(" from {}", p.display()))
            .unwrap_or_default()
    );

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for annotation in &report.annotations {
        *counts.entry(annotation.kind().name()).or_default() += 1;
    }
    let summary: Vec<String> = counts
        .iter()
        .map(|(kind, count)| format!("{} {}", count, kind))
        .collect();
    println!("{} annotation(s): {}", report.annotations.len(), summary.join(", "));

    let viewport = Viewport::identity(photomark::Size::new(image.width as f32, image.height as f32));
    for annotation in &report.annotations {
        let position = annotation.position();
        print!(
            "  #{:<4} {:<9} at ({:.4}, {:.4}) size {:.1}",
            annotation.id,
            annotation.kind().name(),
            position.x,
            position.y,
            annotation.size
        );
        match layout_text(annotation, &viewport) {
            Some(layout) => println!(
                " {:?} box {:.0}x{:.0} px, {} line(s)",
                annotation.text().unwrap_or_default(),
                layout.rect.width,
                layout.rect.height,
                layout.lines.len()
            ),
            None => println!(" {} point(s)", annotation.points().len()),
        }
    }
    Ok(())
}

fn run_config(config: &AppConfig, write: bool) -> Result<(), String> {
    let json = config.to_json().map_err(|e| e.to_string())?;
    println!("{}", json);
    if write {
        config.save_to_default_path().map_err(|e| e.to_string())?;
        if let Some(path) = AppConfig::default_path() {
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn print_warnings(report: &LoadReport) {
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
}
