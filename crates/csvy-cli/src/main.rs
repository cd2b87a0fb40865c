//! CSVY command line tool.

use clap::{ColorChoice, Parser};
use csvy_cli::commands::{
    ConvertOptions, HeaderFormat, header_text, preview_table, run_convert, run_validate,
};
use csvy_cli::logging::{LogConfig, LogFormat, init_logging};
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, HeaderFormatArg, LogFormatArg, LogLevelArg};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Command::Header(args) => {
            let format = match args.format {
                HeaderFormatArg::Yaml => HeaderFormat::Yaml,
                HeaderFormatArg::Json => HeaderFormat::Json,
            };
            print!("{}", header_text(&args.file, &cli.marker, format)?);
            Ok(0)
        }
        Command::Validate(args) => {
            let summary = run_validate(&args.file, &cli.marker)?;
            print!("{summary}");
            Ok(if summary.is_clean() { 0 } else { 1 })
        }
        Command::Preview(args) => {
            let table = preview_table(&args.file, &cli.marker, args.rows)?;
            println!("{table}");
            Ok(0)
        }
        Command::Convert(args) => {
            let options = ConvertOptions {
                marker: cli.marker.clone(),
                comment: args.comment.clone(),
                delimiter: args.delimiter,
            };
            let rows = run_convert(&args.input, &args.output, &options)?;
            println!("wrote {rows} rows to {}", args.output.display());
            Ok(0)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
