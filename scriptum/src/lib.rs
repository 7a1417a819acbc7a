//! A document compiler: plain-text markup with macros and embedded
//! scripting, paginated to PDF.
//!
//! The pipeline (spec §1 "Overview") is: scan → parse → interpret (macro
//! expansion, pass-1 scripts, imports) → place (line-breaking and
//! pagination, running pass-2 scripts as they're reached) → draw (emit PDF
//! bytes). [`compile_source`]/[`compile_file`] run the whole thing end to
//! end; everything else is exposed for tests and for `main.rs`'s CLI
//! wiring.

pub mod config;
pub mod context;
pub mod draw;
pub mod errors;
pub mod fonts;
pub mod importgraph;
pub mod interp;
pub mod parser;
pub mod placer;
pub mod position;
pub mod progress;
pub mod scanner;
pub mod script;
pub mod style;
pub mod symtab;
pub mod units;

pub mod cli;

use config::RunConfig;
use context::Context;
use errors::ScriptumError;
use fonts::FontRegistry;
use importgraph::ImportGraph;
use position::{read_source_text, FileTable};
use progress::ProgressSink;
use std::path::Path;
use std::rc::Rc;

/// Installs a `tracing` subscriber reading its filter from `RUST_LOG`
/// (SPEC_FULL §10.5), falling back to `info` when unset. Safe to call more
/// than once; later calls are no-ops.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Compiles `input_path` under `config`, reporting progress through
/// `progress`, and returns the finished PDF's bytes.
pub fn compile_file(input_path: &Path, config: &RunConfig, progress: &dyn ProgressSink) -> Result<Vec<u8>, ScriptumError> {
    let bytes = std::fs::read(input_path).map_err(ScriptumError::Io)?;
    let text = read_source_text(input_path, &bytes)?;
    let main_dir = input_path.parent().map(Path::to_path_buf).unwrap_or_default();
    compile(&text, input_path, main_dir, config, progress)
}

/// Compiles `source` as though it were read from `virtual_path`, resolving
/// `insert`/`import` relative to `main_dir` and the configured standard
/// library directory. Exposed for in-memory end-to-end tests.
pub fn compile_source(source: &str, virtual_path: &Path, config: &RunConfig, progress: &dyn ProgressSink) -> Result<Vec<u8>, ScriptumError> {
    let main_dir = virtual_path.parent().map(Path::to_path_buf).unwrap_or_default();
    compile(source, virtual_path, main_dir, config, progress)
}

fn compile(
    source: &str,
    display_path: &Path,
    main_dir: std::path::PathBuf,
    config: &RunConfig,
    progress: &dyn ProgressSink,
) -> Result<Vec<u8>, ScriptumError> {
    let file = FileTable::intern(display_path.to_path_buf());
    let tokens = scanner::Scanner::scan(file, source)?;
    let ast = parser::parse(&tokens)?;

    let ctx = Context::new_root(display_path.display().to_string(), file);
    let mut graph = ImportGraph::new(main_dir, config.stdlib_dir.clone(), config.macro_recursion_limit);
    interp::interpret_file(&ast, &ctx, &mut graph, config.macro_recursion_limit)?;

    let expanded_tokens = ctx.token_document.borrow().clone();
    let mut fonts = FontRegistry::discover();
    let document = placer::place(&expanded_tokens, &mut fonts, Rc::clone(&ctx.globals), config.placement_retry_budget, progress)?;
    draw::draw(&document, &mut fonts)
}

/// Reports a [`ScriptumError`] to stderr the way the CLI does (SPEC_FULL
/// §7 "User-visible"): re-reads the offending file (if any) to produce the
/// excerpt-with-caret, falling back to a plain message when the source is
/// unavailable.
pub fn report_error(error: &ScriptumError) -> String {
    errors::render_diagnostic(error, |file_id| std::fs::read_to_string(FileTable::path(file_id)).ok())
}
