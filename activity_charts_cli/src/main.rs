use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use activity_charts::{
    calculate_ticks, calculate_trend_line, calculate_trend_line_points, data_bounds,
    heartrate_vs_speed, parse_activities, start_times, Activity, ActivityField, Bounds,
    ChartParams, HourBucket, ScatterChart, Segment, TickSet, TrendLine, UnitSystem,
};
use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Chart geometry for fitness activity history", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Heart rate vs. speed scatter with a least-squares reference line
    Heartrate(HeartrateArgs),
    /// Activity counts by start hour
    StartTimes(StartTimesArgs),
    /// Fit and clip a trend line over any two activity fields
    Trend(TrendArgs),
}

#[derive(Parser, Debug)]
struct IoArgs {
    /// Activity JSON files (arrays of activity summaries)
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    /// Output path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatOpt::Json)]
    format: FormatOpt,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct HeartrateArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Chart parameters JSON; flags below override its values
    #[arg(long, value_hint = ValueHint::FilePath)]
    params: Option<PathBuf>,

    /// Display unit system
    #[arg(long, value_enum)]
    units: Option<UnitsOpt>,

    /// Ticks per axis
    #[arg(long)]
    ticks: Option<usize>,

    /// Padding on both sides of the speed axis
    #[arg(long)]
    x_offset: Option<f64>,

    /// Padding on both sides of the heart rate axis
    #[arg(long)]
    y_offset: Option<f64>,
}

#[derive(Parser, Debug)]
struct StartTimesArgs {
    #[command(flatten)]
    io: IoArgs,
}

#[derive(Parser, Debug)]
struct TrendArgs {
    #[command(flatten)]
    io: IoArgs,

    /// Independent field, e.g. average_speed
    #[arg(long)]
    x: ActivityField,

    /// Dependent field, e.g. average_heartrate
    #[arg(long)]
    y: ActivityField,

    /// Ticks per axis
    #[arg(long, default_value_t = 5)]
    ticks: usize,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatOpt {
    Json,
    Csv,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum UnitsOpt {
    Metric,
    Imperial,
}

impl From<UnitsOpt> for UnitSystem {
    fn from(value: UnitsOpt) -> Self {
        match value {
            UnitsOpt::Metric => UnitSystem::Metric,
            UnitsOpt::Imperial => UnitSystem::Imperial,
        }
    }
}

#[derive(Debug, Serialize)]
struct TrendReport {
    x_field: ActivityField,
    y_field: ActivityField,
    points: usize,
    bounds: Bounds,
    x_ticks: TickSet,
    y_ticks: TickSet,
    trend: TrendLine,
    segment: Segment,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Heartrate(args) => args.io.verbose,
        Command::StartTimes(args) => args.io.verbose,
        Command::Trend(args) => args.io.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Heartrate(args) => handle_heartrate(args),
        Command::StartTimes(args) => handle_start_times(args),
        Command::Trend(args) => handle_trend(args),
    }
}

fn handle_heartrate(args: HeartrateArgs) -> Result<()> {
    let params = build_params(&args)?;
    let activities = load_activities(&args.io.inputs)?;
    let chart = heartrate_vs_speed(&activities, &params);
    if chart.has_data() {
        info!(
            "Heart rate chart: {} points, reference line {}",
            chart.points.len(),
            if chart.trend.can_show_line {
                "shown"
            } else {
                "hidden"
            }
        );
    } else {
        warn!("No activities with heart rate, speed and sport type; chart has no data");
    }

    let mut out = open_output(&args.io.output)?;
    match args.io.format {
        FormatOpt::Json => write_json(&chart, &mut out)?,
        FormatOpt::Csv => write_scatter_csv(&chart, &mut out)?,
    }
    finish_output(out, &args.io.output)
}

fn handle_start_times(args: StartTimesArgs) -> Result<()> {
    let activities = load_activities(&args.io.inputs)?;
    let buckets = start_times(&activities);
    let counted: usize = buckets.iter().map(|b| b.activities).sum();
    info!(
        "Start times: {} of {} activities placed by hour",
        counted,
        activities.len()
    );

    let mut out = open_output(&args.io.output)?;
    match args.io.format {
        FormatOpt::Json => write_json(&buckets, &mut out)?,
        FormatOpt::Csv => write_hours_csv(&buckets, &mut out)?,
    }
    finish_output(out, &args.io.output)
}

fn handle_trend(args: TrendArgs) -> Result<()> {
    if args.x == args.y {
        return Err(anyhow!("--x and --y must name different fields"));
    }
    let activities = load_activities(&args.io.inputs)?;
    let report = build_trend_report(&activities, args.x, args.y, args.ticks);
    if report.trend.can_show_line {
        info!(
            "Trend {} vs {}: slope {:.4}, intercept {:.4} over {} points",
            report.y_field, report.x_field, report.trend.slope, report.trend.intercept, report.points
        );
    } else {
        warn!(
            "Trend {} vs {}: not enough distinct values ({} points)",
            report.y_field, report.x_field, report.points
        );
    }

    let mut out = open_output(&args.io.output)?;
    match args.io.format {
        FormatOpt::Json => write_json(&report, &mut out)?,
        FormatOpt::Csv => write_segment_csv(&report.segment, &mut out)?,
    }
    finish_output(out, &args.io.output)
}

fn build_params(args: &HeartrateArgs) -> Result<ChartParams> {
    let mut params = match args.params.as_ref() {
        Some(path) => load_params(path)?,
        None => ChartParams::default(),
    };
    if let Some(units) = args.units {
        params.units = units.into();
    }
    if let Some(ticks) = args.ticks {
        params.tick_count = ticks;
    }
    if let Some(x_offset) = args.x_offset {
        params.x_offset = x_offset;
    }
    if let Some(y_offset) = args.y_offset {
        params.y_offset = y_offset;
    }
    if params.tick_count == 0 {
        return Err(anyhow!("tick count must be > 0"));
    }
    Ok(params)
}

fn load_params(path: &Path) -> Result<ChartParams> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read params {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid chart params", path.display()))
}

fn build_trend_report(
    activities: &[Activity],
    x: ActivityField,
    y: ActivityField,
    ticks: usize,
) -> TrendReport {
    let points = activities
        .iter()
        .filter(|a| {
            x.value(a).map_or(false, f64::is_finite) && y.value(a).map_or(false, f64::is_finite)
        })
        .count();
    let bounds = data_bounds(activities, x.selector(), y.selector());
    let trend = calculate_trend_line(activities, x.selector(), y.selector());
    let segment = calculate_trend_line_points(&trend, &bounds);
    let (x_ticks, y_ticks) = if bounds.is_no_data() {
        (Vec::new(), Vec::new())
    } else {
        (
            calculate_ticks(bounds.x_min, bounds.x_max, ticks),
            calculate_ticks(bounds.y_min, bounds.y_max, ticks),
        )
    };
    TrendReport {
        x_field: x,
        y_field: y,
        points,
        bounds,
        x_ticks,
        y_ticks,
        trend,
        segment,
    }
}

/// Parse every input in parallel; records keep their input-file order.
fn load_activities(inputs: &[PathBuf]) -> Result<Vec<Activity>> {
    let per_file: Vec<Vec<Activity>> = inputs
        .par_iter()
        .map(|path| -> Result<Vec<Activity>> {
            let data =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let parsed = parse_activities(&data)
                .with_context(|| format!("failed to parse {}", path.display()))?;
            debug!("Parsed {} activities from {}", parsed.len(), path.display());
            Ok(parsed)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(per_file.into_iter().flatten().collect())
}

fn open_output(path: &Path) -> Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

fn finish_output(mut out: Box<dyn Write>, path: &Path) -> Result<()> {
    out.flush()?;
    if path.as_os_str() != "-" {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn write_json<T: Serialize, W: Write>(value: &T, writer: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)?;
    Ok(())
}

fn write_scatter_csv<W: Write>(chart: &ScatterChart, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    let speed_col = format!("speed_{}", chart.speed_unit.replace('/', "_per_"));
    csv.write_record([speed_col.as_str(), "heartrate_bpm", "sport_type", "name", "url"])?;
    for point in &chart.points {
        csv.write_record([
            format!("{:.2}", point.speed),
            format!("{}", point.heartrate),
            point.sport_type.clone(),
            point.name.clone(),
            point.url.clone().unwrap_or_default(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

fn write_hours_csv<W: Write>(buckets: &[HourBucket], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["hour", "activities"])?;
    for bucket in buckets {
        csv.write_record([bucket.hour.to_string(), bucket.activities.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}

fn write_segment_csv<W: Write>(segment: &Segment, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["point", "x", "y"])?;
    for (label, point) in ["start", "end"].iter().zip(segment.iter()) {
        csv.write_record([label.to_string(), point.x.to_string(), point.y.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}
