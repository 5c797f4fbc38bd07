//! Vantage CLI - viewshed and cumulative viewshed analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use vantage_algorithms::viewshed::{cumulative_viewshed, viewshed, CvaParams, SweepParams};
use vantage_core::io::{read_geotiff, write_geotiff};
use vantage_core::segment::{DEFAULT_CACHE_PAGES, DEFAULT_PAGE_SIZE};
use vantage_core::sites::{map_sites, read_sites, viewpoints_from_pattern, Viewpoint};
use vantage_core::Raster;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "vantage")]
#[command(author, version, about = "Viewshed and cumulative viewshed analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Single-observer viewshed (1 = visible, 0 = hidden)
    Viewshed {
        /// Input DEM file
        input: PathBuf,
        /// Output file
        output: PathBuf,
        /// Observer row
        #[arg(short, long)]
        row: usize,
        /// Observer column
        #[arg(short, long)]
        col: usize,
        /// Observer height above ground (map units)
        #[arg(long, default_value = "1.75")]
        observer_elev: f64,
        /// Target height above ground (map units)
        #[arg(long, default_value = "0.0")]
        target_elev: f64,
        /// Maximum sight distance in map units (0 = unlimited)
        #[arg(long, default_value = "0.0")]
        max_dist: f64,
    },
    /// Cumulative viewshed analysis over many viewpoints
    Cva {
        /// Input DEM file
        input: PathBuf,
        /// Output file (accumulated visibility)
        output: PathBuf,
        /// Optional output file for per-viewpoint visible-cell counts
        #[arg(long)]
        counts: Option<PathBuf>,
        /// Site list file: 'east|north[|value]' per line
        #[arg(long, conflicts_with = "from_pattern")]
        sites: Option<PathBuf>,
        /// Take viewpoints from the pattern raster's positive cells
        #[arg(long, requires = "pattern")]
        from_pattern: bool,
        /// Pattern raster restricting visibility targets
        #[arg(long)]
        pattern: Option<PathBuf>,
        /// Observer height above ground (map units)
        #[arg(long, default_value = "1.75")]
        observer_elev: f64,
        /// Target height above ground (map units)
        #[arg(long, default_value = "0.0")]
        target_elev: f64,
        /// Maximum sight distance in map units (0 = unlimited)
        #[arg(long, default_value = "0.0")]
        max_dist: f64,
        /// Segment page edge length in cells
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: usize,
        /// Resident segment pages per layer
        #[arg(long, default_value_t = DEFAULT_CACHE_PAGES)]
        cache_pages: usize,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_dem(path: &PathBuf) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path).context("Failed to read raster")?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_pattern(path: &PathBuf) -> Result<Raster<i32>> {
    let pb = spinner("Reading pattern raster...");
    let raster: Raster<i32> = read_geotiff(path).context("Failed to read pattern raster")?;
    pb.finish_and_clear();
    Ok(raster)
}

fn write_result_u8(raster: &Raster<u8>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn write_result_i32(raster: &Raster<i32>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn gather_viewpoints(
    dem: &Raster<f64>,
    sites: &Option<PathBuf>,
    from_pattern: bool,
    pattern: Option<&Raster<i32>>,
) -> Result<Vec<Viewpoint>> {
    let (rows, cols) = dem.shape();

    if let Some(path) = sites {
        let sites = read_sites(path).context("Failed to read site list")?;
        let (viewpoints, off_raster) = map_sites(&sites, dem.transform(), rows, cols);
        if off_raster > 0 {
            warn!("{} site(s) fall outside the DEM and were ignored", off_raster);
        }
        if viewpoints.is_empty() {
            anyhow::bail!("No site falls inside the DEM");
        }
        info!("{} viewpoint(s) from site list", viewpoints.len());
        return Ok(viewpoints);
    }

    if from_pattern {
        let patt = pattern.context("--from-pattern requires --pattern")?;
        let viewpoints = viewpoints_from_pattern(patt);
        if viewpoints.is_empty() {
            anyhow::bail!("Pattern raster has no positive cells");
        }
        info!("{} viewpoint(s) from pattern raster", viewpoints.len());
        return Ok(viewpoints);
    }

    anyhow::bail!("Provide viewpoints with --sites <file> or --from-pattern")
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_dem(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        // ── Viewshed ─────────────────────────────────────────────────
        Commands::Viewshed {
            input,
            output,
            row,
            col,
            observer_elev,
            target_elev,
            max_dist,
        } => {
            let dem = read_dem(&input)?;
            let params = SweepParams {
                observer_elev,
                target_elev,
                max_dist,
            };

            let start = Instant::now();
            let result =
                viewshed(&dem, row, col, &params).context("Failed to compute viewshed")?;
            let elapsed = start.elapsed();

            write_result_u8(&result, &output)?;
            done("Viewshed", &output, elapsed);
        }

        // ── Cumulative viewshed analysis ─────────────────────────────
        Commands::Cva {
            input,
            output,
            counts,
            sites,
            from_pattern,
            pattern,
            observer_elev,
            target_elev,
            max_dist,
            page_size,
            cache_pages,
        } => {
            let dem = read_dem(&input)?;

            let pattern_raster = match &pattern {
                Some(path) => Some(read_pattern(path)?),
                None => None,
            };

            let viewpoints =
                gather_viewpoints(&dem, &sites, from_pattern, pattern_raster.as_ref())?;

            let params = CvaParams {
                sweep: SweepParams {
                    observer_elev,
                    target_elev,
                    max_dist,
                },
                page_size,
                cache_pages,
            };

            let pb = spinner(&format!(
                "Sweeping {} viewpoint(s)...",
                viewpoints.len()
            ));
            let start = Instant::now();
            let result = cumulative_viewshed(&dem, &viewpoints, pattern_raster.as_ref(), &params)
                .context("Failed to run cumulative viewshed analysis")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            if result.skipped > 0 {
                warn!(
                    "{} viewpoint(s) skipped (nodata or outside the DEM)",
                    result.skipped
                );
            }

            write_result_i32(&result.cumulative, &output)?;
            done("Cumulative viewshed", &output, elapsed);

            if let Some(counts_path) = counts {
                write_result_i32(&result.counts, &counts_path)?;
                println!("Visible-cell counts saved to: {}", counts_path.display());
            }
        }
    }

    Ok(())
}
