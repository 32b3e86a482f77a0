use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};

use depthmap_canon_rs::depth_pipeline::{
    ChannelPriority, ConversionConfig, DepthToRasterPipeline, ExrHdrcReader, ImageRasterReader,
    OutputFormat, StandardRasterWriter, TiffCompression, default_output_path,
};
use depthmap_canon_rs::logger;

type Pipeline = DepthToRasterPipeline<ExrHdrcReader, ImageRasterReader, StandardRasterWriter>;

/// Detect, inspect and canonicalize depth maps into 16-bit millimeter rasters
#[derive(Parser, Debug)]
#[command(name = "depthmap-canon")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print container, channels, statistics and a unit guess for one file
    Inspect {
        path: PathBuf,

        /// Channel names to try in order, e.g. Z,depth,Y,R
        #[arg(long, value_delimiter = ',')]
        channel_priority: Option<Vec<String>>,
    },

    /// Convert a file, or every .exr file in a directory, to u16 millimeters
    Convert {
        input: PathBuf,

        /// Output file (single-file input only)
        #[arg(short, long, conflicts_with = "out_dir")]
        out: Option<PathBuf>,

        /// Output directory; defaults to the input's directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Multiplier turning source values into millimeters
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        scale: f64,

        /// Output container; inferred from --out when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// TIFF compression
        #[arg(long, value_enum, default_value_t = CompressionArg::None)]
        compression: CompressionArg,

        /// Channel names to try in order, e.g. Z,depth,Y,R
        #[arg(long, value_delimiter = ',')]
        channel_priority: Option<Vec<String>>,

        /// Reject inputs wider or taller than this
        #[arg(long)]
        max_dimension: Option<usize>,
    },

    /// Write a min-max normalized 8-bit preview PNG
    Preview {
        input: PathBuf,

        /// Output file; defaults to <stem>_preview.png next to the input
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Channel names to try in order, e.g. Z,depth,Y,R
        #[arg(long, value_delimiter = ',')]
        channel_priority: Option<Vec<String>>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Tiff,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Tiff => OutputFormat::Tiff,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    DeflateBest,
    DeflateBalanced,
}

impl From<CompressionArg> for TiffCompression {
    fn from(value: CompressionArg) -> Self {
        match value {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
            CompressionArg::DeflateBalanced => TiffCompression::DeflateBalanced,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(if cli.verbose { "debug" } else { "info" });

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Inspect {
            path,
            channel_priority,
        } => {
            require_file(&path)?;
            let config = ConversionConfig::builder()
                .channel_priority(parse_priority(channel_priority)?)
                .build();
            let pipeline = DepthToRasterPipeline::new(config);
            let report = pipeline
                .inspect_file(&path)
                .with_context(|| format!("Failed to inspect {}", path.display()))?;
            println!("{}", report);
            Ok(())
        }
        Command::Convert {
            input,
            out,
            out_dir,
            scale,
            format,
            compression,
            channel_priority,
            max_dimension,
        } => {
            let format = format
                .map(OutputFormat::from)
                .or_else(|| out.as_deref().and_then(OutputFormat::from_path))
                .unwrap_or(OutputFormat::Png);
            let config = ConversionConfig::builder()
                .scale(scale)
                .output_format(format)
                .compression(compression.into())
                .max_dimension(max_dimension)
                .channel_priority(parse_priority(channel_priority)?)
                .build();
            config.validate().context("Invalid --scale")?;

            info!(scale, format = ?format, "Conversion configured");
            let pipeline = DepthToRasterPipeline::new(config);

            if input.is_dir() {
                if out.is_some() {
                    bail!("--out names a single file; use --out-dir with a directory input");
                }
                convert_directory(&pipeline, &input, out_dir.as_deref())
            } else {
                require_file(&input)?;
                let output = out.unwrap_or_else(|| {
                    default_output_path(&input, out_dir.as_deref(), format)
                });
                let result = pipeline
                    .convert_file(&input, &output)
                    .with_context(|| format!("Failed to convert {}", input.display()))?;
                println!("{}", result);
                Ok(())
            }
        }
        Command::Preview {
            input,
            out,
            channel_priority,
        } => {
            require_file(&input)?;
            let config = ConversionConfig::builder()
                .channel_priority(parse_priority(channel_priority)?)
                .build();
            let pipeline = DepthToRasterPipeline::new(config);
            let output = out.unwrap_or_else(|| preview_path(&input));
            let stats = pipeline
                .preview_file(&input, &output)
                .with_context(|| format!("Failed to render preview of {}", input.display()))?;
            println!("{} -> {} (range {:.3}..{:.3})", input.display(), output.display(), stats.min, stats.max);
            Ok(())
        }
    }
}

fn convert_directory(
    pipeline: &Pipeline,
    input: &Path,
    out_dir: Option<&Path>,
) -> Result<()> {
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl+C handler")?;

    let report = pipeline
        .run_batch_with_cancel(input, out_dir, &cancel)
        .with_context(|| format!("Failed to process directory {}", input.display()))?;

    for result in &report.successes {
        println!("ok    {}", result);
    }
    for failure in &report.failures {
        println!("FAIL  {}: {}", failure.path.display(), failure.error);
    }
    for path in &report.skipped {
        println!("skip  {}", path.display());
    }
    println!(
        "{} converted, {} failed, {} skipped",
        report.successes.len(),
        report.failures.len(),
        report.skipped.len()
    );

    if report.cancelled() {
        warn!("Batch interrupted; remaining files were skipped");
    }
    Ok(())
}

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} does not exist", path.display());
    }
    if !path.is_file() {
        bail!("{} is not a regular file", path.display());
    }
    Ok(())
}

fn parse_priority(names: Option<Vec<String>>) -> Result<ChannelPriority> {
    match names {
        None => Ok(ChannelPriority::default()),
        Some(names) => {
            let names = names.into_iter().map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
            ChannelPriority::from_names(names).context("--channel-priority needs at least one channel name")
        }
    }
}

fn preview_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "depth".to_string());
    input.with_file_name(format!("{}_preview.png", stem))
}
