//! CLI entry point for the road damage rater.
//!
//! Provides subcommands for hotspot analysis of a point set, kernel density
//! surfaces, full area analysis of selected lanes, single-lane triage, and
//! parallel batch analysis of many areas.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use road_damage_rater::analyzers::aggregate::aggregate_hotspots_by_road;
use road_damage_rater::analyzers::analyzer::{AreaOutcome, analyze_area};
use road_damage_rater::analyzers::density::{DensityOptions, compute_kernel_density};
use road_damage_rater::analyzers::hotspot::{HotspotOptions, compute_getis_ord_gi};
use road_damage_rater::analyzers::interpret::interpret_hotspots;
use road_damage_rater::analyzers::lane::analyze_lane_summary;
use road_damage_rater::analyzers::types::{HotspotRow, LaneInput};
use road_damage_rater::config::AnalysisConfig;
use road_damage_rater::geo::BoundingBox;
use road_damage_rater::infra::report_server::ReportServerClient;
use road_damage_rater::input::{load_source, parse_lanes_json, parse_points};
use road_damage_rater::output::{
    Export, append_records, print_json, print_pretty, write_geojson, write_json,
};
use road_damage_rater::runner::{AreaJob, analyze_many, run_with_budget};
use road_damage_rater::services::condition_api::{ConditionApi, apply_conditions};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "road_damage_rater")]
#[command(about = "Spatial analysis of road damage reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Getis-Ord Gi* hotspot analysis of a point file or URL (JSON or CSV)
    Hotspots {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Optional JSON config file
        #[arg(long)]
        config: Option<String>,

        /// Neighbor distance band in meters (overrides the config)
        #[arg(short, long)]
        bandwidth: Option<f64>,

        /// |z| at or above which a point is significant (overrides the config)
        #[arg(short, long)]
        significance: Option<f64>,

        /// JSON file for the hotspot report (".gz" to compress)
        #[arg(short, long)]
        output: Option<String>,

        /// CSV file to append per-point results to
        #[arg(long)]
        points_csv: Option<String>,

        /// CSV file to append per-road aggregates to
        #[arg(long)]
        roads_csv: Option<String>,
    },
    /// Kernel density surface of a point file or URL, written as GeoJSON
    Density {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Optional JSON config file
        #[arg(long)]
        config: Option<String>,

        /// Kernel bandwidth in meters (overrides the config)
        #[arg(short, long)]
        bandwidth: Option<f64>,

        /// Initial cell size in meters (overrides the config)
        #[arg(short, long)]
        cell_size: Option<f64>,

        /// Grid extent as "west,south,east,north"
        #[arg(long)]
        bbox: Option<String>,

        /// Upper bound on grid cells (overrides the config)
        #[arg(long)]
        max_cells: Option<usize>,

        /// Keep raw density values instead of scaling to [0, 1]
        #[arg(long, default_value_t = false)]
        no_normalize: bool,

        /// GeoJSON output file
        #[arg(short, long, default_value = "density.geojson")]
        output: String,
    },
    /// Full analysis of the selected lanes in a lanes JSON file or URL
    Area {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Optional JSON config file
        #[arg(long)]
        config: Option<String>,

        /// JSON output file
        #[arg(short, long, default_value = "area.json")]
        output: String,

        /// Gzip compress the JSON output
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Report server to fill in missing lane conditions (defaults to $ROAD_REPORT_API)
        #[arg(long)]
        conditions_url: Option<String>,
    },
    /// Triage summary of one lane from a lanes JSON file or URL
    Lane {
        #[arg(value_name = "FILE_OR_URL")]
        source: String,

        /// Id of the lane to summarize
        #[arg(short, long)]
        lane_id: String,

        /// Optional JSON output file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Analyze every lanes JSON file in a directory as an independent area
    Batch {
        #[arg(value_name = "DIR")]
        input_dir: String,

        /// Optional JSON config file
        #[arg(long)]
        config: Option<String>,

        /// Maximum number of areas analyzed at once
        #[arg(short, long, default_value_t = 4)]
        concurrency: usize,

        /// Directory for per-area JSON results
        #[arg(short, long, default_value = "results")]
        output_dir: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/road_damage_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("road_damage_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(cli));
    // Analyses abandoned after a budget overrun must not hold the process open.
    runtime.shutdown_background();
    result
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Hotspots {
            source,
            config,
            bandwidth,
            significance,
            output,
            points_csv,
            roads_csv,
        } => {
            let config = AnalysisConfig::load_or_default(config.as_deref())?;
            let points = parse_points(&source, &load_source(&source).await?)?;
            let defaults = config.hotspot_options();
            let options = HotspotOptions {
                bandwidth_meters: bandwidth.unwrap_or(defaults.bandwidth_meters),
                significance_z: significance.unwrap_or(defaults.significance_z),
            };

            let results = run_with_budget(config.time_budget(), move || {
                compute_getis_ord_gi(&points, &options)
            })
            .await?;
            let report = interpret_hotspots(&results);
            let roads = aggregate_hotspots_by_road(&results);

            info!(
                total = report.total,
                hotspots = report.hotspot_count,
                coldspots = report.coldspot_count,
                health = report.health.level.label(),
                "{}",
                report.summary_text
            );

            if let Some(path) = points_csv {
                append_records(&path, results.iter().map(HotspotRow::from))?;
            }
            if let Some(path) = roads_csv {
                append_records(&path, &roads)?;
            }
            match output {
                Some(path) => write_json(&path, &Export::new("hotspot-report", &report))?,
                None => print_json(&roads)?,
            }
        }
        Commands::Density {
            source,
            config,
            bandwidth,
            cell_size,
            bbox,
            max_cells,
            no_normalize,
            output,
        } => {
            let config = AnalysisConfig::load_or_default(config.as_deref())?;
            let points = parse_points(&source, &load_source(&source).await?)?;
            let bbox = bbox.as_deref().map(BoundingBox::parse).transpose()?;
            let defaults = config.density_options(bbox);
            let options = DensityOptions {
                bandwidth_meters: bandwidth.unwrap_or(defaults.bandwidth_meters),
                cell_size_meters: cell_size.unwrap_or(defaults.cell_size_meters),
                normalize: defaults.normalize && !no_normalize,
                max_cells: max_cells.unwrap_or(defaults.max_cells),
                ..defaults
            };

            let grid = run_with_budget(config.time_budget(), move || {
                compute_kernel_density(&points, &options)
            })
            .await?;
            if grid.is_empty() {
                warn!("No points, density grid is empty");
            }
            info!(
                rows = grid.rows,
                cols = grid.cols,
                cell_size = grid.cell_size_meters,
                max_value = grid.max_value,
                "Density computed"
            );

            write_geojson(&output, &grid)?;
        }
        Commands::Area {
            source,
            config,
            output,
            gzip,
            conditions_url,
        } => {
            let config = AnalysisConfig::load_or_default(config.as_deref())?;
            let mut lanes = parse_lanes_json(&load_source(&source).await?)?;

            let conditions_url = conditions_url.or_else(|| std::env::var("ROAD_REPORT_API").ok());
            if let Some(base_url) = conditions_url {
                fill_conditions(&base_url, &mut lanes).await?;
            }

            let budget = config.time_budget();
            let outcome = run_with_budget(budget, move || analyze_area(&lanes, &config)).await?;
            report_outcome(&outcome);

            let output = if gzip && !output.ends_with(".gz") {
                format!("{output}.gz")
            } else {
                output
            };
            write_json(&output, &Export::new("area-analysis", &outcome))?;
            info!(output, "Area analysis written");
        }
        Commands::Lane {
            source,
            lane_id,
            output,
        } => {
            let lanes = parse_lanes_json(&load_source(&source).await?)?;
            let lane = lanes
                .iter()
                .find(|l| l.id == lane_id)
                .ok_or_else(|| anyhow!("lane {lane_id} not found in {source}"))?;

            let summary = analyze_lane_summary(
                &lane.coordinates,
                lane.condition.as_deref(),
                lane.road_name.as_deref(),
                &lane.damage_points,
            );
            info!(
                lane = %lane.id,
                urgency = ?summary.urgency,
                damage_density = summary.damage_density_per_km,
                "{}",
                summary.summary
            );

            match output {
                Some(path) => write_json(&path, &Export::new("lane-summary", &summary))?,
                None => print_json(&summary)?,
            }
        }
        Commands::Batch {
            input_dir,
            config,
            concurrency,
            output_dir,
        } => {
            let config = AnalysisConfig::load_or_default(config.as_deref())?;
            let jobs = load_area_jobs(&input_dir)?;
            info!(areas = jobs.len(), concurrency, "Starting batch analysis");

            std::fs::create_dir_all(&output_dir)?;
            let results = analyze_many(jobs, &config, concurrency).await;

            let mut failed = 0;
            for (name, outcome) in results {
                match outcome {
                    Ok(outcome) => {
                        let path = format!("{output_dir}/{name}.json");
                        write_json(&path, &Export::new("area-analysis", &outcome))?;
                    }
                    Err(_) => failed += 1,
                }
            }
            info!(output_dir, failed, "Batch analysis finished");
        }
    }

    Ok(())
}

/// Fills missing lane conditions from the report server. Failures only warn.
#[tracing::instrument(skip(lanes), fields(lanes = lanes.len()))]
async fn fill_conditions(base_url: &str, lanes: &mut [LaneInput]) -> Result<()> {
    let missing: Vec<String> = lanes
        .iter()
        .filter(|l| l.condition.is_none())
        .map(|l| l.id.clone())
        .collect();

    let client = ReportServerClient::new(base_url)?;
    match client.road_conditions(&missing).await {
        Ok(records) => {
            let updated = apply_conditions(lanes, &records);
            info!(requested = missing.len(), updated, "Lane conditions filled in");
        }
        Err(e) => warn!(error = %e, "Could not fetch lane conditions, continuing without"),
    }
    Ok(())
}

fn report_outcome(outcome: &AreaOutcome) {
    print_pretty(outcome);
    match outcome {
        AreaOutcome::NoData(no_data) => info!("{}", no_data.summary),
        AreaOutcome::Analyzed(analysis) => {
            info!(
                points = analysis.point_count,
                used = analysis.used_point_count,
                bandwidth = analysis.plan.bandwidth,
                cell_size = analysis.plan.cell_size,
                "{}",
                analysis.report.summary_text
            );
            if let Some(note) = &analysis.note {
                warn!("{}", note);
            }
        }
    }
}

/// One job per `*.json` file in `dir`, named by file stem.
fn load_area_jobs(dir: &str) -> Result<Vec<AreaJob>> {
    let mut jobs = Vec::new();

    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {dir}"))? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let lanes = parse_lanes_json(&std::fs::read(&path)?)
            .with_context(|| format!("parsing {}", path.display()))?;
        jobs.push(AreaJob { name, lanes });
    }

    jobs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(jobs)
}
