pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod frame;
pub mod io_utils;
pub mod loader;
pub mod mapping;
pub mod melt;
pub mod normalize;
pub mod output;
pub mod reconcile;
pub mod stats;
pub mod summary;
pub mod table;

use std::{
    env,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::OnceLock,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};
use regex::Regex;

use crate::{
    cli::{Cli, Commands, InputArgs},
    config::Config,
    loader::{GeoTable, LoadOptions, StatisticalTable},
    mapping::Mappings,
    summary::StageSummary,
};

pub use crate::{
    error::PipelineError,
    filter::{EuView, filter_renewable_eu},
    normalize::{code_to_flag, normalize_country_code},
    output::{EnergyRecord, EuYearAggregate},
    reconcile::{Diagnostics, Reconciliation, reconcile},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("eu_renewables", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Reconcile(args) => handle_reconcile(&args),
        Commands::EuTotal(args) => handle_eu_total(&args),
        Commands::Flag(args) => handle_flag(&args),
        Commands::Summary(args) => handle_summary(&args),
    }
}

/// Sources and tables resolved from the command line and optional config.
struct Inputs {
    statistical: StatisticalTable,
    geographic: GeoTable,
    mappings: Mappings,
}

fn load_inputs(args: &InputArgs) -> Result<Inputs> {
    let config = match &args.config {
        Some(path) => {
            Config::load(path).with_context(|| format!("Loading configuration from {path:?}"))?
        }
        None => Config::default(),
    };
    let mappings = config.mappings().context("Applying mapping overrides")?;
    let options = LoadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
    };
    let geo_path = args.geo.clone().unwrap_or_else(|| config.geo_path());

    let (statistical, geographic) = match &args.data_dir {
        Some(dir) => {
            let pattern = args
                .data_pattern
                .as_deref()
                .unwrap_or(loader::DEFAULT_COMBINE_PATTERN);
            let pattern = Regex::new(pattern)
                .with_context(|| format!("Compiling data pattern '{pattern}'"))?;
            loader::ensure_file(&geo_path)?;
            let statistical = loader::load_combined(dir, &pattern, &options)
                .with_context(|| format!("Combining statistical files in {dir:?}"))?;
            let geographic = loader::load_geo(&geo_path)
                .with_context(|| format!("Loading geographic data from {geo_path:?}"))?;
            (statistical, geographic)
        }
        None => {
            let data_path = args.data.clone().unwrap_or_else(|| config.data_path());
            loader::load_with(&data_path, &geo_path, &options).with_context(|| {
                format!("Loading sources {data_path:?} and {geo_path:?}")
            })?
        }
    };
    Ok(Inputs {
        statistical,
        geographic,
        mappings,
    })
}

fn handle_reconcile(args: &cli::ReconcileArgs) -> Result<()> {
    let inputs = load_inputs(&args.input)?;
    let result = reconcile::reconcile(&inputs.statistical, &inputs.geographic, &inputs.mappings)
        .context("Reconciling statistical and geographic data")?;
    let writer = io_utils::open_output(args.output.as_deref())
        .with_context(|| format!("Opening output {:?}", args.output))?;
    output::write_records(
        writer,
        &result.records,
        args.format.into(),
        !args.no_geometry,
    )
    .context("Writing reconciled records")?;
    if let Some(path) = &args.diagnostics {
        write_diagnostics(path, &result.diagnostics)?;
    }
    info!(
        "Wrote {} record(s) to {}",
        result.records.len(),
        describe_output(args.output.as_deref())
    );
    Ok(())
}

fn handle_eu_total(args: &cli::EuTotalArgs) -> Result<()> {
    let inputs = load_inputs(&args.input)?;
    let result = reconcile::reconcile(&inputs.statistical, &inputs.geographic, &inputs.mappings)
        .context("Reconciling statistical and geographic data")?;
    let view = filter::filter_renewable_eu(&result.records, &inputs.mappings);

    if let Some(path) = &args.records {
        let file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
        output::write_records(BufWriter::new(file), &view.eu_records, args.format.into(), true)
            .with_context(|| format!("Writing EU records to {path:?}"))?;
        debug!("Wrote {} EU record(s) to {:?}", view.eu_records.len(), path);
    }
    let writer = io_utils::open_output(args.output.as_deref())
        .with_context(|| format!("Opening output {:?}", args.output))?;
    output::write_aggregate(writer, &view.yearly_aggregate, args.format.into())
        .context("Writing yearly aggregate")?;
    info!(
        "Wrote {} yearly mean(s) to {}",
        view.yearly_aggregate.len(),
        describe_output(args.output.as_deref())
    );
    Ok(())
}

fn handle_flag(args: &cli::FlagArgs) -> Result<()> {
    for code in &args.codes {
        let canonical = normalize::normalize_country_code(&code.to_ascii_uppercase());
        let flag = normalize::code_to_flag(&canonical);
        if flag.is_empty() {
            warn!("'{code}' is not a two-letter country code");
        }
        println!("{code}\t{canonical}\t{flag}");
    }
    Ok(())
}

fn handle_summary(args: &cli::SummaryArgs) -> Result<()> {
    let inputs = load_inputs(&args.input)?;
    let max_cell = (args.max_cell > 0).then_some(args.max_cell);
    let rows = args.rows;

    let mut stages = vec![
        StageSummary::from_frame("raw statistical", &inputs.statistical, rows),
        StageSummary::from_frame("raw geographic", &inputs.geographic, rows),
    ];
    let (merged, diagnostics) = reconcile::reconcile_frame(
        &inputs.statistical,
        &inputs.geographic,
        &inputs.mappings,
    )
    .context("Reconciling statistical and geographic data")?;
    stages.push(
        StageSummary::from_frame("merged", &merged, rows)
            .with_note(format!(
                "unmatched geographic keys: [{}]",
                diagnostics.join.unmatched_geo.join(", ")
            ))
            .with_note(format!(
                "unmatched statistical keys: [{}]",
                diagnostics.join.unmatched_stat.join(", ")
            ))
            .with_note(format!(
                "rows without a join key: {} geographic, {} statistical",
                diagnostics.join.missing_key_geo, diagnostics.join.missing_key_stat
            ))
            .with_note(format!(
                "values coerced to missing: {}",
                diagnostics.coercion.len()
            )),
    );
    let records = reconcile::project_records(&merged).context("Projecting output records")?;
    stages.push(StageSummary::from_records("records", &records, rows));
    let view = filter::filter_renewable_eu(&records, &inputs.mappings);
    stages.push(StageSummary::from_records("eu records", &view.eu_records, rows));
    stages.push(StageSummary::from_aggregate(
        "eu yearly mean",
        &view.yearly_aggregate,
        rows,
    ));

    for stage in &stages {
        println!("{}", stage.render(max_cell));
    }
    Ok(())
}

fn write_diagnostics(path: &Path, diagnostics: &Diagnostics) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Creating {path:?}"))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, diagnostics)
        .with_context(|| format!("Writing diagnostics to {path:?}"))?;
    writer
        .flush()
        .with_context(|| format!("Flushing diagnostics to {path:?}"))?;
    Ok(())
}

fn describe_output(path: Option<&Path>) -> String {
    match path {
        Some(p) if !io_utils::is_dash(p) => format!("{p:?}"),
        _ => "stdout".to_string(),
    }
}
