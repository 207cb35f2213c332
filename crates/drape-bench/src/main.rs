//! drape-bench: CLI tool for quantizer parameter experimentation and diagnostics.
//!
//! Runs palette quantization and per-color decomposition on a given image
//! file with configurable parameters, printing per-stage diagnostics.
//! Useful for:
//!
//! - Tuning the merge distance and color limit for a piece of artwork
//! - Checking which colors survive the minimum-density filter
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin drape-bench -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Set `RUST_LOG=debug` for pipeline logging on stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use drape_pipeline::diagnostics::{QuantizeDiagnostics, QuantizeStage, WebClock, duration_ms};
use drape_pipeline::{ArtworkLayers, QuantizeOptions, Rgb};
use tracing_subscriber::EnvFilter;

/// Quantizer parameter experimentation and diagnostics for drape.
///
/// Quantizes an image to a small palette, splits it into one layer per
/// color and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "drape-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Maximum number of palette colors.
    #[arg(long, default_value_t = QuantizeOptions::DEFAULT_LIMIT, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    limit: usize,

    /// Minimum fraction of opaque pixels a color must cover.
    #[arg(long, default_value_t = QuantizeOptions::DEFAULT_MIN_DENSITY)]
    min_density: f64,

    /// Lab distance under which colors merge into one cluster.
    #[arg(long, default_value_t = QuantizeOptions::DEFAULT_MERGE_DISTANCE)]
    merge_distance: f64,

    /// Color to cut out before clustering (`#rrggbb`); repeatable.
    #[arg(long = "remove", value_name = "HEX")]
    remove: Vec<Rgb>,

    /// Write the quantized image to this PNG file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write one PNG per palette color into this directory.
    #[arg(long)]
    parts_dir: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full quantizer options as a JSON string.
    ///
    /// When provided, all other quantizer flags are ignored. Missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build [`QuantizeOptions`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and the
/// individual flags are ignored.
fn options_from_cli(cli: &Cli) -> Result<QuantizeOptions, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(QuantizeOptions {
        limit: cli.limit,
        min_density: cli.min_density,
        merge_distance: cli.merge_distance,
        colors_to_remove: cli.remove.clone(),
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let options = match options_from_cli(&cli) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let image = match drape_pipeline::decode_image(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        image.width(),
        image.height(),
    );
    eprintln!("Options: {options:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let (layers, diagnostics) =
            match drape_pipeline::extract_layers_timed(&image, &options, &WebClock) {
                Ok(result) => result,
                Err(e) => {
                    eprintln!("Pipeline error: {e}");
                    return ExitCode::FAILURE;
                }
            };

        if cli.json {
            match serde_json::to_string_pretty(&diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            println!("{}", diagnostics.report());
            print_palette(&layers);
        }

        // Write images on the first run only.
        if run == 0 && !write_outputs(&cli, &layers) {
            return ExitCode::FAILURE;
        }

        all_diagnostics.push(diagnostics);

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

fn print_palette(layers: &ArtworkLayers) {
    println!();
    println!("{:<10} {:>10} {:>12}", "Color", "Density", "Pixels");
    println!("{}", "-".repeat(34));
    for (entry, part) in layers.quantized.palette.entries().iter().zip(&layers.parts) {
        println!(
            "{:<10} {:>9.1}% {:>12}",
            entry.color.to_hex(),
            entry.density * 100.0,
            part.pixel_count,
        );
    }
}

/// Write `--output` and `--parts-dir` files. Returns `false` on failure.
fn write_outputs(cli: &Cli, layers: &ArtworkLayers) -> bool {
    if let Some(ref path) = cli.output
        && !write_png(path, &layers.quantized.image)
    {
        return false;
    }

    let Some(ref dir) = cli.parts_dir else {
        return true;
    };
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Error creating {}: {e}", dir.display());
        return false;
    }
    layers.parts.iter().all(|part| {
        let name = format!("{}.png", part.color.to_hex().trim_start_matches('#'));
        write_png(&dir.join(name), &part.image)
    })
}

fn write_png(path: &Path, image: &drape_pipeline::RgbaImage) -> bool {
    let bytes = match drape_export::png_bytes(image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error encoding {}: {e}", path.display());
            return false;
        }
    };
    match std::fs::write(path, &bytes) {
        Ok(()) => {
            eprintln!("PNG written to {} ({} bytes)", path.display(), bytes.len());
            true
        }
        Err(e) => {
            eprintln!("Error writing PNG to {}: {e}", path.display());
            false
        }
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[QuantizeDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| duration_ms(d.total_duration))
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stages = [
        QuantizeStage::AlphaCleanup,
        QuantizeStage::Histogram,
        QuantizeStage::Clustering,
        QuantizeStage::Assignment,
        QuantizeStage::DensityFilter,
        QuantizeStage::Recolor,
        QuantizeStage::Decomposition,
    ];

    for stage in stages {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(|d| d.stage_duration(stage))
            .map(duration_ms)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{:<24} {stage_mean:>10.3}ms", stage.label());
    }
}
