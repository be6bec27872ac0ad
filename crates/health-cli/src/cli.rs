//! CLI argument definitions for the health export consolidator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "health-export",
    version,
    about = "Consolidate personal health exports into one deduplicated CSV",
    long_about = "Convert a personal health data export into a single CSV file.\n\n\
                  Reads export.xml, export_cda.xml and electrocardiograms/ecg_*.csv,\n\
                  removes observations duplicated across sources and sorts the result\n\
                  by start date."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Prefix pretty and compact log lines with a timestamp.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,

    /// Include the emitting module path in log lines.
    #[arg(long = "log-target", global = true)]
    pub log_target: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert an export folder into one CSV file.
    Convert(ConvertArgs),

    /// List the observation types retained from the XML exports.
    Types,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Folder holding export.xml, export_cda.xml and electrocardiograms/.
    #[arg(value_name = "EXPORT_FOLDER", default_value = ".")]
    pub export_folder: PathBuf,

    /// Output CSV path (default: <EXPORT_FOLDER>/full_health_data.csv).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Read the flat export from this file instead of <EXPORT_FOLDER>/export.xml.
    #[arg(long = "export-xml", value_name = "PATH")]
    pub export_xml: Option<PathBuf>,

    /// Read the clinical document from this file instead of <EXPORT_FOLDER>/export_cda.xml.
    #[arg(long = "cda-xml", value_name = "PATH")]
    pub cda_xml: Option<PathBuf>,

    /// Read ECG sessions from this folder instead of <EXPORT_FOLDER>/electrocardiograms.
    #[arg(long = "ecg-dir", value_name = "DIR")]
    pub ecg_dir: Option<PathBuf>,

    /// Do not read export.xml.
    #[arg(long = "skip-export-xml")]
    pub skip_export_xml: bool,

    /// Do not read export_cda.xml.
    #[arg(long = "skip-cda")]
    pub skip_cda: bool,

    /// Do not read ECG session files.
    #[arg(long = "skip-ecg")]
    pub skip_ecg: bool,

    /// Parse and summarize without writing the output file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
