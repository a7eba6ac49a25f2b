use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shade_route::coverage::best_sample;
use shade_route::shadow_geometry::compute_shadow_length;
use shade_route::sun_position::compute_solar_position;
use shade_route::{
    CoverageResult, CoverageSample, EngineConfig, Scenario, ShadowEngine, ShadowLength,
    SolarPosition, StructureRecord, TimeContext,
};

#[derive(Debug, Parser)]
#[command(name = "shade-route", about = "Shadow coverage along a route")]
struct Args {
    /// Scenario JSON file
    #[arg(short, long)]
    scenario: PathBuf,

    /// Engine settings JSON file, replacing the scenario's `engine` block
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum shadow length in metres that shades the path
    #[arg(long)]
    path_width: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sun position for the scenario's moment
    Position {
        /// Also report the shadow of a structure of this height
        #[arg(long)]
        height: Option<f64>,
    },
    /// Shadow coverage at the scenario's moment
    Coverage {
        /// Evaluate segments on the thread pool
        #[arg(long)]
        parallel: bool,
    },
    /// Shadow coverage sampled through the scenario's day
    Timeline {
        #[arg(long, default_value_t = 6.0)]
        start: f64,
        #[arg(long, default_value_t = 18.0)]
        end: f64,
        /// Hours between samples, at least one minute
        #[arg(long)]
        interval: Option<f64>,
        #[arg(long)]
        progress: bool,
    },
}

#[derive(Serialize)]
struct PositionReport {
    time: TimeContext,
    position: SolarPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    shadow: Option<ShadowLength>,
}

#[derive(Serialize)]
struct CoverageReport<'a> {
    time: TimeContext,
    position: SolarPosition,
    structures: &'a [StructureRecord],
    result: CoverageResult,
    coverage_percent_rounded: f64,
}

#[derive(Serialize)]
struct TimelineReport<'a> {
    day_of_year: u32,
    samples: &'a [CoverageSample],
    best: Option<&'a CoverageSample>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;
    if let Some(path) = &args.config {
        scenario.engine = EngineConfig::load(path)
            .with_context(|| format!("failed to load engine config {}", path.display()))?;
    }
    if let Some(width) = args.path_width {
        scenario.engine.path_width_meters = width;
    }

    let time = scenario
        .time_context()
        .context("failed to resolve the scenario's moment")?;
    let latitude = scenario.location.latitude;

    match args.command {
        Command::Position { height } => {
            let position = compute_solar_position(latitude, &time)?;
            let shadow = height
                .map(|h| compute_shadow_length(h, position.elevation_deg))
                .transpose()?;
            print_json(&PositionReport {
                time,
                position,
                shadow,
            })
        }
        Command::Coverage { parallel } => {
            scenario.engine.parallel |= parallel;
            let engine = ShadowEngine::new(scenario.engine.clone())?;
            let structures = scenario.structure_records()?;
            let position = compute_solar_position(latitude, &time)?;
            let result = engine
                .calculate_coverage(&structures, &position)
                .context("coverage calculation failed")?;

            info!(
                "{} structures, {:.2}% of {:.1} m shaded",
                structures.len(),
                result.coverage_percent,
                result.total_distance_meters
            );
            print_json(&CoverageReport {
                time,
                position,
                structures: &structures,
                result,
                coverage_percent_rounded: result.rounded_percent(),
            })
        }
        Command::Timeline {
            start,
            end,
            interval,
            progress,
        } => {
            if let Some(interval) = interval {
                scenario.engine.hour_interval = interval;
            }
            scenario.engine.show_progress |= progress;
            let engine = ShadowEngine::new(scenario.engine.clone())?;
            let structures = scenario.structure_records()?;
            let samples = engine
                .coverage_timeline(&structures, latitude, time.day_of_year, start, end)
                .context("timeline calculation failed")?;

            if let Some(best) = best_sample(&samples) {
                info!(
                    "most shade at solar time {:.2} h: {:.2}%",
                    best.solar_time, best.result.coverage_percent
                );
            }
            print_json(&TimelineReport {
                day_of_year: time.day_of_year,
                samples: &samples,
                best: best_sample(&samples),
            })
        }
    }
}
