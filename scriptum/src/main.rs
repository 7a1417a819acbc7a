//! Binary entry point: parses the CLI, resolves run configuration and the
//! progress sink, compiles the input, and writes the result (spec §6, §7
//! "User-visible").

use clap::Parser;
use scriptum::cli::{default_output_path, Cli, Command};
use scriptum::config::RunConfig;
use scriptum::{compile_file, init_logging, report_error};
use std::process::ExitCode;

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Compile { input_path, output_path, no_progress } => {
            let config = match RunConfig::resolve(&input_path, no_progress) {
                Ok(config) => config,
                Err(err) => {
                    eprintln!("error reading project configuration: {err}");
                    return ExitCode::FAILURE;
                }
            };

            let progress = scriptum::progress::resolve(config.no_progress);

            match compile_file(&input_path, &config, progress.as_ref()) {
                Ok(bytes) => {
                    let output_path = output_path.unwrap_or_else(|| default_output_path(&input_path));
                    if let Err(err) = std::fs::write(&output_path, bytes) {
                        eprintln!("error writing \"{}\": {err}", output_path.display());
                        return ExitCode::FAILURE;
                    }
                    tracing::info!(path = %output_path.display(), "wrote PDF");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    // §7 "User-visible": the formatted diagnostic goes to stdout.
                    println!("{}", report_error(&err));
                    ExitCode::FAILURE
                }
            }
        }
    }
}
