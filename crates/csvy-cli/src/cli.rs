//! CLI argument definitions for the `csvy` tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use csvy_core::DEFAULT_MARKER;

#[derive(Parser)]
#[command(
    name = "csvy",
    version,
    about = "Inspect, validate and convert CSVY files",
    long_about = "Inspect, validate and convert CSVY files.\n\n\
                  A CSVY file is a CSV body preceded by a YAML header between two\n\
                  marker lines, optionally commented out with a line prefix."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

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

    /// Header marker line.
    #[arg(long = "marker", default_value = DEFAULT_MARKER, global = true)]
    pub marker: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the validated header.
    Header(HeaderArgs),

    /// Read the header and the whole body, reporting any error.
    Validate(FileArgs),

    /// Print the first body rows as a table.
    Preview(PreviewArgs),

    /// Rewrite a file with a new comment prefix or delimiter.
    Convert(ConvertArgs),
}

#[derive(Parser)]
pub struct FileArgs {
    /// Path to the CSVY file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Parser)]
pub struct HeaderArgs {
    /// Path to the CSVY file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "yaml")]
    pub format: HeaderFormatArg,
}

#[derive(Parser)]
pub struct PreviewArgs {
    /// Path to the CSVY file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Number of rows to show.
    #[arg(long = "rows", short = 'n', default_value_t = 10)]
    pub rows: usize,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// Input CSVY file.
    #[arg(value_name = "IN")]
    pub input: PathBuf,

    /// Output path (created or truncated).
    #[arg(value_name = "OUT")]
    pub output: PathBuf,

    /// Comment prefix for the written header (default: the input's).
    #[arg(long = "comment", value_name = "PREFIX")]
    pub comment: Option<String>,

    /// Delimiter for the written body.
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum HeaderFormatArg {
    Yaml,
    Json,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_convert() {
        let cli = Cli::try_parse_from([
            "csvy",
            "convert",
            "in.csvy",
            "out.csvy",
            "--comment",
            "# ",
            "--delimiter",
            ";",
        ])
        .unwrap();
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.comment.as_deref(), Some("# "));
        assert_eq!(args.delimiter, Some(';'));
        assert_eq!(cli.marker, "---");
    }

    #[test]
    fn test_parse_preview_defaults() {
        let cli = Cli::try_parse_from(["csvy", "preview", "data.csvy", "--marker", "+++"]).unwrap();
        let Command::Preview(args) = cli.command else {
            panic!("expected preview");
        };
        assert_eq!(args.rows, 10);
        assert_eq!(cli.marker, "+++");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
