//! End-to-end scenarios (SPEC_FULL §10.9): compiling a source string all
//! the way to PDF bytes, and a handful of checkpoints at the scan/parse/
//! place stages along the way.

use scriptum::config::RunConfig;
use scriptum::progress::NoProgress;
use scriptum::scanner::token::TokenKind;
use scriptum::scanner::Scanner;
use scriptum::{compile_source, parser, position::FileTable};
use std::path::Path;

fn virtual_path(name: &str) -> std::path::PathBuf {
    std::path::PathBuf::from(name)
}

#[test]
fn scanning_splits_words_and_collapses_whitespace() {
    let file = FileTable::intern(virtual_path("doc.scrm"));
    let tokens = Scanner::scan(file, "hello   world\n\nnext paragraph").unwrap();

    let words: Vec<_> = tokens
        .iter()
        .filter_map(|t| if let TokenKind::Word(w) = &t.kind { Some(w.to_string()) } else { None })
        .collect();
    assert_eq!(words, vec!["hello", "world", "next", "paragraph"]);

    let paragraph_breaks = tokens.iter().filter(|t| matches!(t.kind, TokenKind::ParagraphBreak)).count();
    assert_eq!(paragraph_breaks, 1);
}

#[test]
fn parsing_a_macro_definition_and_call_round_trips_through_the_ast() {
    let file = FileTable::intern(virtual_path("doc.scrm"));
    let source = "\\shout = (\\word) {\\word \\word}\n\\shout{hi}";
    let tokens = Scanner::scan(file, source).unwrap();
    let ast = parser::parse(&tokens).unwrap();
    assert_eq!(ast.document.paragraphs.len(), 2);
}

#[test]
fn compiling_plain_text_produces_a_single_page_pdf() {
    let config = RunConfig::default();
    let bytes = compile_source("hello world, this is a short document.", Path::new("memory.scrm"), &config, &NoProgress).unwrap();
    assert!(bytes.starts_with(b"%PDF-1."));
}

#[test]
fn a_macro_expands_before_placement() {
    let config = RunConfig::default();
    let source = "\\greeting = () {hello, friend}\n\\greeting";
    let bytes = compile_source(source, Path::new("memory.scrm"), &config, &NoProgress).unwrap();
    assert!(bytes.starts_with(b"%PDF-1."));
}

#[test]
fn an_undefined_macro_call_is_reported_as_a_resolve_error() {
    let config = RunConfig::default();
    let err = compile_source("\\nope", Path::new("memory.scrm"), &config, &NoProgress).unwrap_err();
    assert_eq!(err.kind(), "ResolveError");
}

#[test]
fn inserting_a_nonexistent_file_is_reported_as_an_import_error() {
    let config = RunConfig::default();
    let err = compile_source("\\insert{missing.scrm}", Path::new("memory.scrm"), &config, &NoProgress).unwrap_err();
    assert_eq!(err.kind(), "ImportError");
}
