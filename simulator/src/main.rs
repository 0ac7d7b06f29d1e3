use anyhow::Context;
use clap::Parser;
use generator::landmask::coastal_land_sea_mask;
use generator::tracks::{synthesize_tracks, GeneratorConfig};
use report::model::DensityReport;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::input::{load_land_sea_mask, load_tracks};
use workflow::runner::Runner;

mod generator;
mod report;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Cyclone-track density workflow driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// JSON array of tracks; synthetic tracks are generated when omitted
    #[arg(long)]
    tracks: Option<PathBuf>,
    /// JSON land-sea mask; a synthetic coastline is used when omitted
    #[arg(long)]
    landmask: Option<PathBuf>,
    #[arg(long, default_value_t = 200)]
    n_tracks: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 2000)]
    start_year: i32,
    #[arg(long, default_value_t = 3)]
    n_winters: usize,
    /// Longitude of the synthetic coastline
    #[arg(long, default_value_t = 30.0)]
    coast_lon: f64,
    #[arg(long, default_value = "tools/data/density_report.json")]
    report: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.start_year, args.n_winters)
    };

    let tracks = match args.tracks {
        Some(path) => load_tracks(path)?,
        None => {
            let grid = &config.grid;
            synthesize_tracks(&GeneratorConfig {
                n_tracks: args.n_tracks,
                seed: args.seed,
                start_year: config.start_year,
                n_winters: config.n_winters.max(1),
                lon_range: (grid.lon_min, grid.lon_max),
                lat_range: (grid.lat_min, grid.lat_max),
                ..Default::default()
            })
            .context("synthesizing tracks")?
        }
    };

    let lsm = match args.landmask {
        Some(path) => load_land_sea_mask(path)?,
        None => coastal_land_sea_mask(
            config.grid.lon_axis(),
            config.grid.lat_axis(),
            args.coast_lon,
            2.0,
        )?,
    };

    let runner = Runner::new(config.clone());
    let result = runner.execute(tracks, &lsm)?;

    println!(
        "Density cube {:?} over {} tracks; categories {:?}",
        result.cube.shape(),
        result.n_tracks,
        result.categories
    );
    println!("Monthly counts: {:?}", result.monthly_counts.to_vec());
    println!(
        "Winter counts from {}: {:?}",
        config.start_year + 1,
        result.winter_counts.to_vec()
    );

    let report = DensityReport::from_result(&result, config.start_year);
    report.write(&args.report)?;
    println!("Report written to {}", args.report.display());

    Ok(())
}
