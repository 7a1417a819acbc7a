//! File-path resolution, insert/import dispatch, cycle detection, and
//! parsed-file/import caching (spec §4.5).
//!
//! Grounded on `original_source/src/compiler.py`'s `Compiler`: `_get_near_path`/
//! `_get_far_path`/`_path_rel_to_file` for the three search strategies,
//! `_compiler_import_file` for the read-once/parse-once file cache,
//! `_insert_file`/`_import_file` for the insert-vs-import split, and
//! `Context.import_`/`SymbolTable.import_` for what crosses into the
//! caller's context on a successful import (macros, globals, the pass-2
//! token subset).

use crate::context::Context;
use crate::errors::ScriptumError;
use crate::interp::{self, Importer, SearchStrategy};
use crate::parser::ast::FileNode;
use crate::position::{FileId, FileTable, Span};
use crate::scanner::token::{Token, TokenKind};
use crate::scanner::Scanner;
use crate::script::value::Env;
use crate::symtab::SymbolTable;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The fixed extension for standard-library files (§6 "Search paths").
const STD_LIB_EXTENSION: &str = "pdfo";

/// A file that has been read, scanned, and parsed once; kept so a later
/// `insert`/`import` of the same path reuses the tree instead of
/// re-reading/re-parsing (§4.5 "Lifecycles": "A source file is read once,
/// tokenized once, parsed once; the parsed tree is cached by absolute path").
struct ParsedFile {
    file: FileId,
    ast: Rc<FileNode>,
}

/// The cached result of running a file under `import` once: its own-level
/// macro table, the globals it produced, and the pass-2 token subset that
/// needs to reach every caller that imports it (§4.5 "Insert vs import").
struct ImportResult {
    symbols: Rc<SymbolTable>,
    globals: Env,
    deferred_tokens: Vec<Token>,
}

/// Implements `interp::Importer`: resolves `insert`/`import` paths along
/// the three search strategies, detects cycles, and caches both parsed
/// files and completed imports (spec §4.5).
pub struct ImportGraph {
    main_file_dir: PathBuf,
    std_lib_dir: PathBuf,
    max_depth: usize,
    parsed_by_path: HashMap<PathBuf, ParsedFile>,
    import_by_path: HashMap<PathBuf, Rc<ImportResult>>,
    in_progress: HashSet<PathBuf>,
}

impl ImportGraph {
    pub fn new(main_file_dir: PathBuf, std_lib_dir: PathBuf, max_depth: usize) -> Self {
        ImportGraph {
            main_file_dir,
            std_lib_dir,
            max_depth,
            parsed_by_path: HashMap::new(),
            import_by_path: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Appends the fixed `.pdfo` extension, replacing one if already present
    /// (`_path_to_std_file`), and resolves it under the standard library
    /// directory.
    fn std_lib_path(&self, file_path: &str) -> PathBuf {
        let mut stem = file_path.to_string();
        if let Some(existing) = Path::new(file_path).extension() {
            if existing == STD_LIB_EXTENSION {
                stem.truncate(stem.len() - existing.len() - 1);
            }
        }
        self.std_lib_dir.join(format!("{stem}.{STD_LIB_EXTENSION}"))
    }

    fn rel_to(dir: &Path, file_path: &str) -> PathBuf {
        dir.join(file_path)
    }

    /// §4.5 "near — tried relative to current file, then main file, then
    /// the standard library directory".
    fn near_path(&self, current_dir: &Path, file_path: &str, span: Span) -> Result<PathBuf, ScriptumError> {
        let cf_rel = Self::rel_to(current_dir, file_path);
        if cf_rel.is_file() {
            return Ok(cf_rel);
        }
        let input_rel = Self::rel_to(&self.main_file_dir, file_path);
        if input_rel.is_file() {
            return Ok(input_rel);
        }
        let std_path = self.std_lib_path(file_path);
        if std_path.is_file() {
            return Ok(std_path);
        }
        Err(ScriptumError::Import {
            span,
            detail: format!(
                "could not find \"{file_path}\" relative to the current file, the main file, or the standard library directory"
            ),
        })
    }

    /// §4.5 "far — standard library first, then main, then current".
    fn far_path(&self, current_dir: &Path, file_path: &str, span: Span) -> Result<PathBuf, ScriptumError> {
        let std_path = self.std_lib_path(file_path);
        if std_path.is_file() {
            return Ok(std_path);
        }
        let input_rel = Self::rel_to(&self.main_file_dir, file_path);
        if input_rel.is_file() {
            return Ok(input_rel);
        }
        let cf_rel = Self::rel_to(current_dir, file_path);
        if cf_rel.is_file() {
            return Ok(cf_rel);
        }
        Err(ScriptumError::Import {
            span,
            detail: format!(
                "could not find \"{file_path}\" in the standard library directory, relative to the main file, or relative to the current file"
            ),
        })
    }

    /// §4.5 "strict — explicit relative": relative to the current file,
    /// with no fallback.
    fn strict_path(current_dir: &Path, file_path: &str) -> PathBuf {
        Self::rel_to(current_dir, file_path)
    }

    fn resolve(&self, caller: &Context, path: &str, strategy: SearchStrategy, span: Span) -> Result<PathBuf, ScriptumError> {
        let current_dir = FileTable::path(caller.file).parent().map(Path::to_path_buf).unwrap_or_default();
        let resolved = match strategy {
            SearchStrategy::Near => self.near_path(&current_dir, path, span)?,
            SearchStrategy::Far => self.far_path(&current_dir, path, span)?,
            SearchStrategy::Strict => Self::strict_path(&current_dir, path),
        };
        Ok(resolved.canonicalize().unwrap_or(resolved))
    }

    /// Reads, scans, and parses `abs_path` if it hasn't been already, and
    /// returns the cached tree either way (§4.5 "read once, tokenized once,
    /// parsed once").
    fn load_parsed(&mut self, abs_path: &Path) -> Result<(FileId, Rc<FileNode>), ScriptumError> {
        if let Some(cached) = self.parsed_by_path.get(abs_path) {
            return Ok((cached.file, Rc::clone(&cached.ast)));
        }

        let bytes = fs::read(abs_path).map_err(ScriptumError::Io)?;
        let file = FileTable::intern(abs_path.to_path_buf());
        let text = crate::position::read_source_text(abs_path, &bytes)?;
        let tokens = Scanner::scan(file, &text)?;
        let ast = Rc::new(crate::parser::parse(&tokens)?);

        self.parsed_by_path.insert(abs_path.to_path_buf(), ParsedFile { file, ast: Rc::clone(&ast) });
        Ok((file, ast))
    }

    fn enter(&mut self, abs_path: &Path, span: Span) -> Result<(), ScriptumError> {
        if !self.in_progress.insert(abs_path.to_path_buf()) {
            return Err(ScriptumError::Import {
                span,
                detail: format!("\"{}\" is already being run — circular import", abs_path.display()),
            });
        }
        Ok(())
    }

    fn leave(&mut self, abs_path: &Path) {
        self.in_progress.remove(abs_path);
    }
}

impl Importer for ImportGraph {
    fn insert(&mut self, caller: &Context, path: &str, strategy: SearchStrategy, span: Span) -> Result<(), ScriptumError> {
        let abs_path = self.resolve(caller, path, strategy, span)?;
        let (file, ast) = self.load_parsed(&abs_path)?;

        self.enter(&abs_path, span)?;
        let child_ctx = caller.enter_file_in_place(abs_path.display().to_string(), file, Some(span));
        let max_depth = self.max_depth;
        let result = interp::interpret_file(&ast, &child_ctx, self, max_depth);
        self.leave(&abs_path);
        result
    }

    fn import(
        &mut self,
        caller: &Context,
        path: &str,
        strategy: SearchStrategy,
        span: Span,
    ) -> Result<Vec<Token>, ScriptumError> {
        let abs_path = self.resolve(caller, path, strategy, span)?;

        let result = match self.import_by_path.get(&abs_path) {
            Some(cached) => {
                tracing::debug!(path = %abs_path.display(), "import cache hit");
                Rc::clone(cached)
            }
            None => {
                let (file, ast) = self.load_parsed(&abs_path)?;

                self.enter(&abs_path, span)?;
                let fresh_ctx = Context::new_root(abs_path.display().to_string(), file);
                let max_depth = self.max_depth;
                let run_result = interp::interpret_file(&ast, &fresh_ctx, self, max_depth);
                self.leave(&abs_path);
                run_result?;

                let deferred_tokens = fresh_ctx
                    .token_document
                    .borrow()
                    .iter()
                    .filter(|t| matches!(t.kind, TokenKind::DeferredScript(_)))
                    .cloned()
                    .collect();
                let computed = Rc::new(ImportResult {
                    symbols: Rc::clone(&fresh_ctx.symbols),
                    globals: fresh_ctx.globals.borrow().clone(),
                    deferred_tokens,
                });
                self.import_by_path.insert(abs_path.clone(), Rc::clone(&computed));
                computed
            }
        };

        caller.symbols.import_from(&result.symbols, None).map_err(|missing| ScriptumError::Resolve {
            span,
            detail: format!("importing \"{path}\" failed: macro `{missing}` vanished from its own symbol table"),
        })?;
        caller.globals.borrow_mut().extend(result.globals.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(result.deferred_tokens.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn root_ctx_for(main_path: &Path) -> Context {
        let file = FileTable::intern(main_path.to_path_buf());
        Context::new_root(main_path.display().to_string(), file)
    }

    #[test]
    fn insert_brings_macros_and_text_into_caller() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(dir.path(), "inserted.txt", "\\greeting = () {hello}\nworld");
        let main_path = dir.path().join("main.txt");

        let ctx = root_ctx_for(&main_path);
        let mut graph = ImportGraph::new(dir.path().to_path_buf(), dir.path().to_path_buf(), interp::DEFAULT_MAX_DEPTH);
        let span = Span::point(crate::position::SourcePosition::start_of_file(ctx.file));

        graph.insert(&ctx, "inserted.txt", SearchStrategy::Near, span).unwrap();

        let words: Vec<_> = ctx
            .token_document
            .borrow()
            .iter()
            .filter_map(|t| if let TokenKind::Word(w) = &t.kind { Some(w.to_string()) } else { None })
            .collect();
        assert_eq!(words, vec!["world"]);
        assert!(ctx.symbols.get("greeting").is_some());
    }

    #[test]
    fn import_is_cached_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        write_temp(dir.path(), "lib.txt", "hello");
        let main_path = dir.path().join("main.txt");
        let ctx = root_ctx_for(&main_path);
        let mut graph = ImportGraph::new(dir.path().to_path_buf(), dir.path().to_path_buf(), interp::DEFAULT_MAX_DEPTH);
        let span = Span::point(crate::position::SourcePosition::start_of_file(ctx.file));

        graph.import(&ctx, "lib.txt", SearchStrategy::Near, span).unwrap();
        assert_eq!(graph.import_by_path.len(), 1);
        graph.import(&ctx, "lib.txt", SearchStrategy::Near, span).unwrap();
        assert_eq!(graph.import_by_path.len(), 1);
    }

    #[test]
    fn missing_file_is_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let main_path = dir.path().join("main.txt");
        let ctx = root_ctx_for(&main_path);
        let mut graph = ImportGraph::new(dir.path().to_path_buf(), dir.path().to_path_buf(), interp::DEFAULT_MAX_DEPTH);
        let span = Span::point(crate::position::SourcePosition::start_of_file(ctx.file));

        let err = graph.insert(&ctx, "nope.txt", SearchStrategy::Near, span).unwrap_err();
        assert!(matches!(err, ScriptumError::Import { .. }));
    }
}
