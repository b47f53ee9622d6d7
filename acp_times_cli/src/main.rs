use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use acp_times::{elapsed_hours, Brevet, Control, ControlTimes, SpeedBound, Unit, SEGMENTS};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "ACP brevet control time calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute open/close times for the controls of a brevet
    Schedule(ScheduleArgs),
    /// Print the ACP speed table with cumulative hours at each boundary
    Table(TableArgs),
}

#[derive(Parser, Debug)]
struct ScheduleArgs {
    /// JSON brevet definition (distance_km, start_time, unit, controls)
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with_all = ["distance", "start", "controls"])]
    brevet_file: Option<PathBuf>,

    /// Nominal brevet distance in kilometers
    #[arg(long)]
    distance: Option<f64>,

    /// Start time (RFC 3339, e.g. 2026-06-01T07:00:00+02:00)
    #[arg(long)]
    start: Option<String>,

    /// Control distances (comma separated)
    #[arg(long)]
    controls: Option<String>,

    /// Unit of the control distances
    #[arg(long, value_enum, default_value_t = UnitOpt::Km)]
    unit: UnitOpt,

    /// Output path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Output format (distances are written at full precision in both)
    #[arg(long, value_enum, default_value_t = FormatOpt::Csv)]
    format: FormatOpt,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct TableArgs {
    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum UnitOpt {
    Km,
    Mi,
}

impl From<UnitOpt> for Unit {
    fn from(value: UnitOpt) -> Self {
        match value {
            UnitOpt::Km => Unit::Kilometers,
            UnitOpt::Mi => Unit::Miles,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatOpt {
    Csv,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Command::Schedule(args) => args.verbose,
        Command::Table(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Schedule(args) => handle_schedule(args),
        Command::Table(_) => handle_table(),
    }
}

fn handle_schedule(args: ScheduleArgs) -> Result<()> {
    let brevet = load_brevet(&args)?;

    if let Err(err) = brevet.official_distance() {
        warn!("{}; computing times anyway", err);
    }

    let rows = brevet.schedule();
    let skipped = rows.iter().filter(|row| row.open.is_none()).count();
    if skipped > 0 {
        warn!(
            "{} control(s) have no times on the {} km brevet",
            skipped, brevet.distance_km
        );
    }
    info!(
        "Schedule computed: {} controls, {} km brevet starting {}",
        rows.len(),
        brevet.distance_km,
        brevet.start_time.to_rfc3339()
    );

    if args.output.as_os_str() == "-" {
        let stdout = io::stdout();
        write_schedule(&rows, args.format, stdout.lock())?;
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        write_schedule(&rows, args.format, file)
            .with_context(|| format!("failed to write {}", args.output.display()))?;
        info!("Wrote schedule: {}", args.output.display());
    }
    Ok(())
}

fn load_brevet(args: &ScheduleArgs) -> Result<Brevet> {
    if let Some(path) = args.brevet_file.as_ref() {
        return load_brevet_file(path);
    }

    let distance = args
        .distance
        .ok_or_else(|| anyhow!("--distance is required without --brevet-file"))?;
    let start = args
        .start
        .as_deref()
        .ok_or_else(|| anyhow!("--start is required without --brevet-file"))?;
    let start_time = parse_start(start)?;

    let mut brevet = Brevet::new(distance, start_time);
    brevet.unit = args.unit.into();
    brevet.controls = match args.controls.as_deref() {
        Some(list) => parse_control_list(list)?,
        None => vec![Control::new(0.0), Control::new(distance)],
    };
    brevet.validate()?;
    Ok(brevet)
}

fn load_brevet_file(path: &Path) -> Result<Brevet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read brevet file {}", path.display()))?;
    let brevet = Brevet::from_json_str(&text)
        .with_context(|| format!("{} is not a valid brevet definition", path.display()))?;
    debug!(
        "Loaded {} with {} controls",
        path.display(),
        brevet.controls.len()
    );
    Ok(brevet)
}

fn parse_start(input: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(input.trim())
        .with_context(|| format!("invalid start time '{}': expected RFC 3339", input))
}

fn parse_control_list(input: &str) -> Result<Vec<Control>> {
    let mut out = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value: f64 = trimmed
            .parse()
            .with_context(|| format!("invalid control distance '{}'", trimmed))?;
        out.push(Control::new(value));
    }
    if out.is_empty() {
        return Err(anyhow!("--controls list was empty"));
    }
    Ok(out)
}

fn format_time(time: Option<&DateTime<FixedOffset>>) -> String {
    time.map(|t| t.to_rfc3339()).unwrap_or_default()
}

fn write_schedule<W: Write>(rows: &[ControlTimes], format: FormatOpt, mut out: W) -> Result<()> {
    match format {
        FormatOpt::Csv => {
            let mut writer = csv::Writer::from_writer(out);
            write_schedule_rows(rows, &mut writer)
        }
        FormatOpt::Json => {
            serde_json::to_writer_pretty(&mut out, rows)?;
            writeln!(out)?;
            out.flush()?;
            Ok(())
        }
    }
}

fn write_schedule_rows<W: Write>(rows: &[ControlTimes], writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record(["name", "distance_km", "open", "close"])?;
    for row in rows {
        writer.write_record([
            row.name.clone().unwrap_or_default(),
            row.distance_km.to_string(),
            format_time(row.open.as_ref()),
            format_time(row.close.as_ref()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_table() -> Result<()> {
    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());
    write_table_rows(&mut writer)
}

fn write_table_rows<W: Write>(writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record([
        "boundary_km",
        "segment_km",
        "min_speed_kmh",
        "max_speed_kmh",
        "open_hours",
        "close_hours",
    ])?;
    for segment in SEGMENTS.iter().skip(1) {
        writer.write_record([
            format!("{:.0}", segment.boundary_km),
            format!("{:.0}", segment.length_km),
            format!("{:.3}", segment.min_speed_kmh),
            format!("{:.3}", segment.max_speed_kmh),
            format!("{:.3}", elapsed_hours(segment.boundary_km, SpeedBound::Maximum)),
            format!("{:.3}", elapsed_hours(segment.boundary_km, SpeedBound::Minimum)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
