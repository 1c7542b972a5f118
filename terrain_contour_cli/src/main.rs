use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use terrain_contour::{
    denoise::{remove_statistical_outliers, DenoiseParams},
    io::{
        geojson::write_contours_geojson,
        mask::write_contour_map,
        read_point_cloud, write_area_report_csv, write_points_xyz,
    },
    pipeline::{self, PipelineConfig, PipelineOutcome},
};

/// Pixels per grid cell in the rendered contour map.
const CONTOUR_MAP_SCALE: u32 = 6;

/// Contour maps and above-level areas from terrain point clouds.
#[derive(Parser)]
#[command(name = "terrain_contour_cli", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline on a point cloud (.ply, .csv, .txt, .xyz or .las).
    Process {
        input: PathBuf,
        /// Directory receiving the contour map, masks, areas.csv and contours.geojson.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
        /// Lower bound of the height window, in real-world units.
        #[arg(long, allow_hyphen_values = true)]
        low: Option<f64>,
        /// Upper bound of the height window, in real-world units.
        #[arg(long, allow_hyphen_values = true)]
        high: Option<f64>,
        /// Number of contour levels [default: 20]
        #[arg(long)]
        contour_line_number: Option<usize>,
        /// Vertical extent of the terrain in real-world units [default: 15.0]
        #[arg(long)]
        real_world_height: Option<f64>,
        /// Neighbours used by outlier removal [default: 20]
        #[arg(long)]
        nb_neighbors: Option<usize>,
        /// Standard deviation multiplier for outlier removal [default: 2.0]
        #[arg(long)]
        std_ratio: Option<f64>,
        /// JSON pipeline configuration; flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Skip writing per-level mask images.
        #[arg(long)]
        no_masks: bool,
    },
    /// Remove statistical outliers and write the kept points as x,y,z CSV.
    Denoise {
        input: PathBuf,
        output: PathBuf,
        #[arg(long, default_value_t = terrain_contour::denoise::DEFAULT_NEIGHBOR_COUNT)]
        nb_neighbors: usize,
        #[arg(long, default_value_t = terrain_contour::denoise::DEFAULT_STD_RATIO)]
        std_ratio: f64,
    },
    /// Print the default command line configuration as JSON.
    PrintConfig,
}

struct ProcessArgs {
    input: PathBuf,
    output_dir: PathBuf,
    no_masks: bool,
}

fn process(args: ProcessArgs, config: PipelineConfig) -> Result<()> {
    let points = read_point_cloud(&args.input)
        .with_context(|| format!("Error reading {}", args.input.display()))?;
    log::info!("read {} points from {}", points.len(), args.input.display());
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Error creating {}", args.output_dir.display()))?;

    let mut config = config;
    if !args.no_masks && config.mask_dir.is_none() {
        config.mask_dir = Some(args.output_dir.clone());
    }
    let run = pipeline::run(&points, &config)?;

    if let Some(processed) = &run.processed {
        let map = args
            .output_dir
            .join(format!("contour_map_lines_{}.png", config.level_count));
        write_contour_map(&map, &processed.extraction, CONTOUR_MAP_SCALE)
            .with_context(|| format!("Error writing {}", map.display()))?;
        println!("Wrote {}", map.display());

        let geojson = args.output_dir.join("contours.geojson");
        write_contours_geojson(&geojson, &processed.extraction.contours)
            .with_context(|| format!("Error writing {}", geojson.display()))?;
        println!("Wrote {}", geojson.display());
    }
    if let PipelineOutcome::Areas(report) = &run.outcome {
        let csv = args.output_dir.join("areas.csv");
        write_area_report_csv(&csv, report)
            .with_context(|| format!("Error writing {}", csv.display()))?;
        println!("Wrote {}", csv.display());
        for path in &run.mask_paths {
            println!("Wrote {}", path.display());
        }
    }
    println!("{}", run.outcome);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => PipelineConfig::load(p).with_context(|| format!("Error reading {}", p.display())),
        None => Ok(PipelineConfig::cli_preset()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Process {
            input,
            output_dir,
            low,
            high,
            contour_line_number,
            real_world_height,
            nb_neighbors,
            std_ratio,
            config,
            no_masks,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            if low.is_some() {
                cfg.window.low = low;
            }
            if high.is_some() {
                cfg.window.high = high;
            }
            if let Some(n) = contour_line_number {
                cfg.level_count = n;
            }
            if let Some(h) = real_world_height {
                cfg.real_world_height = h;
            }
            if let Some(k) = nb_neighbors {
                cfg.denoise.neighbor_count = k;
            }
            if let Some(s) = std_ratio {
                cfg.denoise.std_ratio = s;
            }
            if no_masks {
                cfg.mask_dir = None;
            }
            process(
                ProcessArgs {
                    input,
                    output_dir,
                    no_masks,
                },
                cfg,
            )?;
        }
        Commands::Denoise {
            input,
            output,
            nb_neighbors,
            std_ratio,
        } => {
            let points = read_point_cloud(&input)
                .with_context(|| format!("Error reading {}", input.display()))?;
            let params = DenoiseParams::new(nb_neighbors, std_ratio);
            let kept = remove_statistical_outliers(&points, &params)?;
            write_points_xyz(&output, &kept)
                .with_context(|| format!("Error writing {}", output.display()))?;
            println!("Kept {} of {} points", kept.len(), points.len());
            println!("Wrote {}", output.display());
        }
        Commands::PrintConfig => {
            println!("{}", serde_json::to_string_pretty(&PipelineConfig::cli_preset())?);
        }
    }
    Ok(())
}
