use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::ExportFormat;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile Eurostat renewable-energy shares with country boundaries",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Join, clean and normalize the sources into the output record table
    Reconcile(ReconcileArgs),
    /// Emit the EU-wide yearly mean of the renewable energy share
    EuTotal(EuTotalArgs),
    /// Print the flag symbol for one or more two-letter country codes
    Flag(FlagArgs),
    /// Print a summary of every pipeline stage
    Summary(SummaryArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Statistical source (CSV, or Eurostat wide TSV)
    #[arg(short = 'd', long = "data")]
    pub data: Option<PathBuf>,
    /// Directory of statistical files to combine instead of --data
    #[arg(long = "data-dir", conflicts_with = "data")]
    pub data_dir: Option<PathBuf>,
    /// File name pattern (regex) used with --data-dir
    #[arg(long = "data-pattern", requires = "data_dir")]
    pub data_pattern: Option<String>,
    /// Geographic source (GeoJSON FeatureCollection)
    #[arg(short = 'g', long = "geo")]
    pub geo: Option<PathBuf>,
    /// YAML configuration with default paths and mapping overrides
    #[arg(short = 'c', long = "config", visible_alias = "mappings")]
    pub config: Option<PathBuf>,
    /// Delimiter of the statistical source (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the statistical source (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(value: OutputFormat) -> Self {
        match value {
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: OutputFormat,
    /// Leave the geometry column out of the output
    #[arg(long = "no-geometry")]
    pub no_geometry: bool,
    /// Write join and coercion diagnostics as JSON to this file
    #[arg(long = "diagnostics")]
    pub diagnostics: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EuTotalArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output file for the yearly mean (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Also write the EU renewable-total records to this file
    #[arg(long = "records")]
    pub records: Option<PathBuf>,
    /// Output format
    #[arg(long = "format", value_enum, default_value = "csv")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct FlagArgs {
    /// Two-letter country codes; Eurostat spellings such as EL are accepted
    #[arg(required = true)]
    pub codes: Vec<String>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of sample rows shown per stage
    #[arg(long, default_value_t = crate::summary::DEFAULT_SAMPLE_ROWS)]
    pub rows: usize,
    /// Maximum characters per cell before truncation (0 disables)
    #[arg(long = "max-cell", default_value_t = crate::summary::DEFAULT_MAX_CELL)]
    pub max_cell: usize,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
