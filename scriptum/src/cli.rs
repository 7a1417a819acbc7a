//! Command-line surface (SPEC_FULL §10.1, spec §6 "CLI"): a `clap` derive
//! parser mirroring the shape `largo` (Brahmastra-Labs-logicaffeine) and the
//! `perl-lsp` `xtask` binary use for their own task-runner CLIs — a single
//! subcommand today, structured so a sibling subcommand can be added later
//! without changing the invocation shape of this one.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scriptum", about = "Compile a scriptum document to PDF")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile a source file to PDF (§6 "CLI").
    Compile {
        /// Path to the source document.
        input_path: PathBuf,

        /// Output PDF path. Defaults to `input_path` with its last
        /// extension replaced by `pdf` (or appended if it has none).
        #[arg(short = 'o', long = "output")]
        output_path: Option<PathBuf>,

        /// Disable progress-bar output, regardless of whether stdout is a
        /// terminal (§10.8, `DESIGN.md` Open Question 4).
        #[arg(short = 'p', long = "no-progress")]
        no_progress: bool,
    },
}

/// The output path `compile` writes to when `-o` is not given: the input
/// path with its last extension replaced by `pdf`, or `pdf` appended if it
/// has none (§6 "CLI").
pub fn default_output_path(input_path: &std::path::Path) -> PathBuf {
    input_path.with_extension("pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_replaces_extension() {
        assert_eq!(default_output_path(std::path::Path::new("doc.scrm")), PathBuf::from("doc.pdf"));
    }

    #[test]
    fn default_output_path_appends_when_extensionless() {
        assert_eq!(default_output_path(std::path::Path::new("doc")), PathBuf::from("doc.pdf"));
    }
}
