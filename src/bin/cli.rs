//! tracezone CLI - Debug tool for run validation and loop extraction
//!
//! Usage:
//!   tracezone-cli analyze <file.gpx> [--json] [--config <file.json>]
//!   tracezone-cli batch <folder> [--config <file.json>]
//!
//! Each GPX track is replayed fix by fix through a run session, exactly as a
//! phone would stream it, and the resulting run report is printed.

use clap::{Parser, Subcommand, ValueEnum};
use gpx::{Gpx, read};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracezone::{
    CandidateSearch, LocationFix, RunReport, RunSession, SessionConfig,
    format::{format_area, format_distance, format_duration, format_elevation, format_pace},
};

#[derive(Parser)]
#[command(name = "tracezone-cli")]
#[command(about = "Debug tool for run validation and territory loop extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session configuration as JSON (missing fields use defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the loop closing radius in meters
    #[arg(long, global = true)]
    closing_radius: Option<f64>,

    /// Override the minimum loop area in square meters
    #[arg(long, global = true)]
    min_area: Option<f64>,

    /// Candidate search strategy
    #[arg(long, global = true, value_enum)]
    search: Option<SearchArg>,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single GPX file
    Analyze {
        /// GPX file to replay
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Map viewport aspect ratio (width / height) for the fitted region
        #[arg(long)]
        aspect: Option<f64>,
    },

    /// Summarize every GPX file in a folder
    Batch {
        /// Folder containing GPX files
        folder: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SearchArg {
    Exhaustive,
    Indexed,
    Auto,
}

impl From<SearchArg> for CandidateSearch {
    fn from(arg: SearchArg) -> Self {
        match arg {
            SearchArg::Exhaustive => CandidateSearch::Exhaustive,
            SearchArg::Indexed => CandidateSearch::Indexed,
            SearchArg::Auto => CandidateSearch::Auto,
        }
    }
}

/// Accuracy assumed for GPX points without HDOP (meters)
const DEFAULT_ACCURACY_M: f64 = 5.0;

/// Rough meters of horizontal error per unit of HDOP
const METERS_PER_HDOP: f64 = 5.0;

/// Fix interval assumed for GPX points without timestamps (ms)
const DEFAULT_INTERVAL_MS: i64 = 2000;

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let config = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(2);
        }
    };

    let result = match &cli.command {
        Commands::Analyze { file, json, aspect } => run_analyze(file, &config, *json, *aspect),
        Commands::Batch { folder } => run_batch(folder, &config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Build the session configuration from the config file and flag overrides
fn load_config(cli: &Cli) -> Result<SessionConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
            SessionConfig::from_json(&content).map_err(|e| e.to_string())?
        }
        None => SessionConfig::default(),
    };

    if let Some(radius) = cli.closing_radius {
        config.loops.closing_radius_m = radius;
    }
    if let Some(area) = cli.min_area {
        config.loops.min_area_sq_m = area;
    }
    if let Some(search) = cli.search {
        config.loops.search = search.into();
    }
    Ok(config)
}

/// Parse a GPX file into location fixes
fn parse_gpx_file(path: &Path) -> Result<Vec<LocationFix>, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let reader = BufReader::new(file);
    let gpx: Gpx = read(reader).map_err(|e| e.to_string())?;

    let mut fixes = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for pt in &segment.points {
                let index = fixes.len() as i64;
                let timestamp = pt
                    .time
                    .map(|t| {
                        let dt: time::OffsetDateTime = t.into();
                        (dt.unix_timestamp_nanos() / 1_000_000) as i64
                    })
                    .unwrap_or(index * DEFAULT_INTERVAL_MS);
                let accuracy = pt
                    .hdop
                    .map(|h| h * METERS_PER_HDOP)
                    .unwrap_or(DEFAULT_ACCURACY_M);

                let mut fix =
                    LocationFix::new(pt.point().y(), pt.point().x(), timestamp, accuracy);
                fix.altitude = pt.elevation;
                fix.speed = pt.speed;
                fixes.push(fix);
            }
        }
    }

    if fixes.is_empty() {
        return Err("No track points found".to_string());
    }
    Ok(fixes)
}

/// Replay fixes through a fresh session and finish it
fn replay(fixes: Vec<LocationFix>, config: &SessionConfig) -> Result<RunReport, String> {
    let mut session = RunSession::new(config.clone());
    session.ingest_all(fixes).map_err(|e| e.to_string())?;
    session.finish().map_err(|e| e.to_string())
}

/// Analyze one GPX file
fn run_analyze(
    file: &Path,
    config: &SessionConfig,
    json: bool,
    aspect: Option<f64>,
) -> Result<(), String> {
    let fixes = parse_gpx_file(file)?;
    let fix_count = fixes.len();
    let mut report = replay(fixes, config)?;

    if aspect.is_some() {
        let region = report
            .fit_route(config.region_padding, aspect)
            .map_err(|e| e.to_string())?;
        report.region = Some(region);
    }

    if json {
        let out = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    println!("\n{}", "=".repeat(60));
    println!("RUN REPORT: {}", file.display());
    println!("{}", "=".repeat(60));
    print_report(&report, fix_count);
    Ok(())
}

/// Print a human readable report
fn print_report(report: &RunReport, fix_count: usize) {
    println!("\n[Fixes]");
    println!("  Received:       {}", fix_count);
    println!("  Accepted:       {}", report.fixes.accepted);
    println!("  Low accuracy:   {}", report.fixes.low_accuracy);
    println!("  Speed exceeded: {}", report.fixes.speed_exceeded);
    println!("  Throttled:      {}", report.fixes.throttled);

    println!("\n[Run]");
    println!("  Distance:  {}", format_distance(report.distance_m));
    println!("  Duration:  {}", format_duration(report.duration_s.round() as u64));
    println!(
        "  Pace:      {} /km",
        format_pace(report.avg_speed_mps().unwrap_or(0.0))
    );
    println!("  Climb:     {}", format_elevation(report.elevation_gain_m));

    if report.validation.is_valid() {
        println!("  Valid:     yes");
    } else {
        println!("  Valid:     no");
        for reason in &report.validation.reasons {
            println!("    - [{}] {}", reason.code(), reason);
        }
    }

    println!("\n[Loops] {} found", report.loops.len());
    for (i, l) in report.loops.iter().enumerate() {
        let center = l
            .centroid()
            .map(|c| format!("({:.5}, {:.5})", c.latitude, c.longitude))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {}. {} fixes {}..{}, {} vertices, center {}",
            i + 1,
            format_area(l.area_sq_m),
            l.start_index,
            l.end_index,
            l.polygon.len(),
            center
        );
    }
    println!(
        "\n  Territory claimable: {}",
        if report.can_claim_territory { "yes" } else { "no" }
    );

    if let Some(region) = &report.region {
        println!(
            "\n[Region] center ({:.5}, {:.5}), span {:.4}° x {:.4}°",
            region.center_lat, region.center_lng, region.lat_delta, region.lng_delta
        );
    }
}

/// Summarize every GPX file in a folder
fn run_batch(folder: &Path, config: &SessionConfig) -> Result<(), String> {
    println!("\n{}", "=".repeat(60));
    println!("Analyzing GPX files in: {}", folder.display());
    println!("{}", "=".repeat(60));

    let entries = fs::read_dir(folder).map_err(|e| e.to_string())?;

    let mut analyzed = 0;
    let mut claimable = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "gpx") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match parse_gpx_file(&path).and_then(|fixes| replay(fixes, config)) {
            Ok(report) => {
                analyzed += 1;
                if report.can_claim_territory {
                    claimable += 1;
                }
                println!(
                    "  [OK] {} - {}, {} loops ({}), valid: {}",
                    name,
                    format_distance(report.distance_m),
                    report.loops.len(),
                    format_area(report.claimed_area_sq_m()),
                    report.validation.is_valid()
                );
            }
            Err(e) => {
                eprintln!("  [ERR] {}: {}", name, e);
            }
        }
    }

    println!(
        "\nAnalyzed {} runs, {} with claimable territory",
        analyzed, claimable
    );
    Ok(())
}
