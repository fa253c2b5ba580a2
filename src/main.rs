//! Command line front end: parses a CDL file into a dataset.
//!
//! ```bash
//! cdlparser basics.cdl
//! cdlparser basics.cdl -o out.nc --format NETCDF3_64BIT --header
//! ```

use std::{fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use cdlparser::{
    backend::{Format, MemoryBackend},
    default_output_path, display_error,
    lexer::lexer::LexPolicy,
    parse_text_with_name, ParseOptions,
};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "cdlparser")]
#[command(version)]
#[command(about = "Compile a CDL text file into a netCDF-3 dataset")]
#[command(long_about = None)]
struct Cli {
    /// CDL file to parse
    cdlfile: PathBuf,

    /// Dataset to create (defaults to the CDL path with a .nc extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Container format: NETCDF3_CLASSIC or NETCDF3_64BIT
    #[arg(long, default_value = "NETCDF3_CLASSIC")]
    format: Format,

    /// Fail on unrecognised characters instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Log every token and attribute value
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Print the CDL header of the resulting dataset
    #[arg(long)]
    header: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let source = match read_to_string(&cli.cdlfile) {
        Ok(source) => source,
        Err(error) => {
            tracing::error!("Failed to read {}: {}", cli.cdlfile.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.cdlfile));
    let lex_policy = if cli.strict {
        LexPolicy::Fail
    } else {
        LexPolicy::Skip
    };
    let options = ParseOptions::new(output)
        .with_format(cli.format)
        .with_lex_policy(lex_policy);

    let file_name = cli
        .cdlfile
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let start = Instant::now();
    match parse_text_with_name(&source, file_name, MemoryBackend, &options) {
        Ok(dataset) => {
            tracing::info!(
                "Parsed {} in {:?}: {} dimensions, {} variables, {} global attributes",
                cli.cdlfile.display(),
                start.elapsed(),
                dataset.dimensions().len(),
                dataset.variables().len(),
                dataset.global_attributes().len()
            );

            if cli.header {
                println!("{}", dataset);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            display_error(&error, &source);
            ExitCode::FAILURE
        }
    }
}
