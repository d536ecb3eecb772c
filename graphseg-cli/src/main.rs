#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::doc_markdown,
    clippy::uninlined_format_args,
    clippy::match_same_arms,
    clippy::needless_pass_by_value
)]

mod config;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use image::GenericImageView;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;

use graphseg::{GraphSegError, LabelGrid, PixelGrid, Segmenter};

use crate::config::{ConfigFormat, ParamArgs};

/// graphseg CLI tools
#[derive(Parser)]
#[command(name = "graphseg")]
#[command(about = "graphseg - graph-based image segmentation (Felzenszwalb & Huttenlocher)")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (only errors)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment an image and write a colour-coded segment map
    Segment {
        /// Input image file
        input: PathBuf,
        /// Output image file (format chosen by extension)
        output: PathBuf,
        #[command(flatten)]
        params: ParamArgs,
        /// Also write the raw label map as JSON
        #[arg(long, value_name = "FILE")]
        labels: Option<PathBuf>,
        /// Print a JSON summary of the segmentation to stdout
        #[arg(short, long)]
        summary: bool,
        /// Number of threads for smoothing and graph construction (0 = all cores)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,
    },
    /// Print the effective segmentation parameters
    Config {
        #[command(flatten)]
        params: ParamArgs,
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: ConfigFormat,
        /// Pretty print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Show image information
    Info {
        /// Image file to analyze
        file: PathBuf,
    },
}

/// Raw label map as written by `segment --labels`
#[derive(Serialize)]
struct LabelDump<'a> {
    width: u32,
    height: u32,
    num_segments: usize,
    labels: &'a [i32],
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.quiet {
        log::LevelFilter::Error
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.quiet && args.verbose {
        warn!("Both --quiet and --verbose specified, using --quiet");
    }

    if let Err(e) = run(args) {
        error!("Command failed: {}", e);
        process::exit(exit_code(&e));
    }
}

/// 1 for bad input (arguments, files, images, parameters), 2 otherwise
fn exit_code(e: &anyhow::Error) -> i32 {
    if let Some(err) = e.downcast_ref::<GraphSegError>() {
        return match err {
            GraphSegError::InvalidInput(_)
            | GraphSegError::ImageError(_)
            | GraphSegError::IoError(_) => 1,
            GraphSegError::AllocationFailure(_) => 2,
        };
    }

    if e.downcast_ref::<image::ImageError>().is_some() || e.downcast_ref::<std::io::Error>().is_some()
    {
        return 1;
    }

    2
}

fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;
    match args.command {
        Commands::Segment {
            input,
            output,
            params,
            labels,
            summary,
            threads,
        } => cmd_segment(&input, &output, &params, labels.as_deref(), summary, threads, quiet),
        Commands::Config {
            params,
            format,
            pretty,
        } => cmd_config(&params, format, pretty),
        Commands::Info { file } => cmd_info(&file),
    }
}

fn cmd_segment(
    input: &Path,
    output: &Path,
    params: &ParamArgs,
    labels_path: Option<&Path>,
    summary: bool,
    threads: usize,
    quiet: bool,
) -> Result<()> {
    info!("graphseg v{}", env!("CARGO_PKG_VERSION"));
    info!("Input: {}", input.display());
    info!("Output: {}", output.display());

    validate_paths(input, output)?;
    if let Some(path) = labels_path {
        validate_output_dir(path)?;
    }

    let params = params.resolve()?;
    info!(
        "Parameters: sigma={}, k={}, min_size={}",
        params.sigma, params.k, params.min_size
    );

    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let progress = if quiet {
        None
    } else {
        Some(create_progress_bar()?)
    };

    if let Some(ref pb) = progress {
        pb.set_message("Loading input image...");
    }

    let image = image::open(input)?;
    let (width, height) = image.dimensions();
    info!("Loaded image: {}x{} pixels", width, height);

    let grid = PixelGrid::from_dynamic(&image)?;
    drop(image);

    if let Some(ref pb) = progress {
        pb.set_message("Segmenting...");
        pb.inc(20);
    }

    let start = Instant::now();
    let label_grid = Segmenter::from(params).process_image(&grid)?;
    info!(
        "Found {} segments in {:.1?}",
        label_grid.num_segments(),
        start.elapsed()
    );

    if let Some(ref pb) = progress {
        pb.set_message("Writing output...");
        pb.inc(60);
    }

    label_grid.colorize().save(output)?;
    if let Some(path) = labels_path {
        write_labels(path, &label_grid)?;
        info!("Label map written to {}", path.display());
    }

    if let Some(ref pb) = progress {
        pb.finish_with_message("Segmentation complete!");
    }

    if summary {
        println!("{}", serde_json::to_string_pretty(&label_grid.summary())?);
    }

    info!("Segmentation completed successfully");
    Ok(())
}

fn cmd_config(params: &ParamArgs, format: ConfigFormat, pretty: bool) -> Result<()> {
    let params = params.resolve()?;
    println!("{}", format.render(&params, pretty)?);
    Ok(())
}

fn cmd_info(file: &Path) -> Result<()> {
    let image = image::open(file)?;
    let (width, height) = image.dimensions();
    let grid = PixelGrid::from_dynamic(&image)?;

    let info = json!({
        "file": file.display().to_string(),
        "dimensions": {
            "width": width,
            "height": height
        },
        "color_type": format!("{:?}", image.color()),
        "segmentation_channels": grid.channels(),
        "pixels": grid.pixel_count()
    });

    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

fn write_labels(path: &Path, labels: &LabelGrid) -> Result<()> {
    let dump = LabelDump {
        width: labels.width(),
        height: labels.height(),
        num_segments: labels.num_segments(),
        labels: labels.labels(),
    };
    let file = std::fs::File::create(path)?;
    serde_json::to_writer(std::io::BufWriter::new(file), &dump)?;
    Ok(())
}

fn validate_paths(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        return Err(GraphSegError::InvalidInput(format!(
            "Input file does not exist: {}",
            input.display()
        ))
        .into());
    }

    validate_output_dir(output)
}

fn validate_output_dir(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(GraphSegError::InvalidInput(format!(
                "Output directory does not exist: {}",
                parent.display()
            ))
            .into());
        }
    }
    Ok(())
}

fn create_progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    Ok(pb)
}
