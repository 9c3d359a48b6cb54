//! ActiveSync WBXML inspector CLI

use activesync_wbxml_inspect::{run_decode, run_encode, DECODE_CMD, ENCODE_CMD};
use clap::{Arg, ArgAction, Command};
use std::{path::PathBuf, process::ExitCode};
use tracing::error;

/// Returns the version of the crate.
pub const fn crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Flag for printing the tag resolutions
const TRACE_FLAG: &str = "trace";

/// Flag for the log level
const LOG_LEVEL_FLAG: &str = "log-level";

/// Entrypoint for the inspector
fn main() -> ExitCode {
    // Define application
    let matches = Command::new("wbxml-inspect")
        .version(crate_version())
        .about("Decode and encode ActiveSync WBXML.")
        .arg(
            Arg::new(TRACE_FLAG)
                .long(TRACE_FLAG)
                .global(true)
                .help("Print every tag resolution after the output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(LOG_LEVEL_FLAG)
                .long(LOG_LEVEL_FLAG)
                .global(true)
                .default_value("info")
                .help("Log level (error, warn, info, debug, trace)")
                .value_parser(clap::value_parser!(tracing::Level)),
        )
        .subcommand(
            Command::new(DECODE_CMD)
                .about("Decode a WBXML file and print it as XML.")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .help("Path to the WBXML file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("hex")
                        .long("hex")
                        .help("Read the file as hex text instead of raw bytes")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new(ENCODE_CMD)
                .about("Encode an XML file as WBXML.")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .help("Path to the XML file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .help("Write the encoding to this file instead of printing hex")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand_required(true)
        .get_matches();

    // Create logger
    let level = *matches
        .get_one::<tracing::Level>(LOG_LEVEL_FLAG)
        .unwrap();
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Parse subcommands
    let trace = matches.get_flag(TRACE_FLAG);
    let mut stdout = std::io::stdout().lock();
    let result = match matches.subcommand() {
        Some((DECODE_CMD, matches)) => {
            let path = matches.get_one::<PathBuf>("file").unwrap();
            let hex = matches.get_flag("hex");
            run_decode(path, hex, trace, &mut stdout)
        }
        Some((ENCODE_CMD, matches)) => {
            let path = matches.get_one::<PathBuf>("file").unwrap();
            let output = matches.get_one::<PathBuf>("output");
            run_encode(path, output, trace, &mut stdout)
        }
        Some((cmd, _)) => {
            error!(cmd, "invalid subcommand");
            return ExitCode::FAILURE;
        }
        None => {
            error!("no subcommand provided");
            return ExitCode::FAILURE;
        }
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "failed to inspect file");
            ExitCode::FAILURE
        }
    }
}
