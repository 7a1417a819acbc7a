//! Error taxonomy (spec §7) and the source-excerpt diagnostic renderer.
//!
//! Every variant carries enough to reproduce the "file, line, column, kind,
//! detail, three-line excerpt with caret" report from §7's "User-visible"
//! rule, and `ScriptError` additionally keeps a context-frame traceback
//! (§4.4, §9 "Deferred scripts").

use crate::position::{FileTable, Span};
use thiserror::Error;

/// One frame of a runtime traceback: a macro call or import boundary that
/// was active when a `ScriptError` or `PlacementError` was raised.
#[derive(Debug, Clone)]
pub struct ContextFrame {
    pub display_name: String,
    pub span: Option<Span>,
}

#[derive(Debug, Error)]
pub enum ScriptumError {
    /// Illegal character, unterminated script/comment, unbalanced brace or
    /// paren, or a backslash with no identifier after it (§4.1 "Failure modes").
    #[error("scan error at {span}: {detail}")]
    Scan { span: Span, detail: String },

    /// Token-type mismatch during recursive descent; `detail` is the
    /// message belonging to the highest-affinity failed alternative (§4.2, §9).
    #[error("parse error at {span}: {detail}")]
    Parse { span: Span, detail: String },

    /// Undefined macro name, arity mismatch, duplicate key, or unknown
    /// key-argument name (§4.4 "MacroCall").
    #[error("resolve error at {span}: {detail}")]
    Resolve { span: Span, detail: String },

    /// File not found on any search path, or a cyclic import (§4.5).
    #[error("import error at {span}: {detail}")]
    Import { span: Span, detail: String },

    /// A scripting-host exception, with its traceback appended (§4.4, §9).
    #[error("script error at {span}: {detail}")]
    Script { span: Span, detail: String, traceback: Vec<ContextFrame> },

    /// A word that cannot fit any line, or an over-large deferred-script
    /// return value (§4.6 "Failure semantics").
    #[error("placement error at {span}: {detail}")]
    Placement { span: Span, detail: String },

    /// Unknown font, or an I/O failure writing the output (§4.7).
    #[error("draw error at {span}: {detail}")]
    Draw { span: Span, detail: String },

    /// I/O failure reading the source file itself; this sits outside the
    /// §7 taxonomy proper (it has no meaningful source span yet) but must
    /// still be reported the same way by the CLI.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScriptumError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ScriptumError::Scan { span, .. }
            | ScriptumError::Parse { span, .. }
            | ScriptumError::Resolve { span, .. }
            | ScriptumError::Import { span, .. }
            | ScriptumError::Script { span, .. }
            | ScriptumError::Placement { span, .. }
            | ScriptumError::Draw { span, .. } => Some(*span),
            ScriptumError::Io(_) => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScriptumError::Scan { .. } => "ScanError",
            ScriptumError::Parse { .. } => "ParseError",
            ScriptumError::Resolve { .. } => "ResolveError",
            ScriptumError::Import { .. } => "ImportError",
            ScriptumError::Script { .. } => "ScriptError",
            ScriptumError::Placement { .. } => "PlacementError",
            ScriptumError::Draw { .. } => "DrawError",
            ScriptumError::Io(_) => "IoError",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ScriptumError::Scan { detail, .. }
            | ScriptumError::Parse { detail, .. }
            | ScriptumError::Resolve { detail, .. }
            | ScriptumError::Import { detail, .. }
            | ScriptumError::Script { detail, .. }
            | ScriptumError::Placement { detail, .. }
            | ScriptumError::Draw { detail, .. } => detail.clone(),
            ScriptumError::Io(e) => e.to_string(),
        }
    }

    pub fn traceback(&self) -> &[ContextFrame] {
        match self {
            ScriptumError::Script { traceback, .. } => traceback,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptumError>;

/// Renders the `file, line, column, kind, detail` line plus a three-line
/// source excerpt with a caret underline, and (for runtime errors) the
/// context chain — the exact report shape specified in §7.
pub fn render_diagnostic(error: &ScriptumError, source_by_file: impl Fn(crate::position::FileId) -> Option<String>) -> String {
    let mut out = String::new();
    match error.span() {
        Some(span) => {
            out.push_str(&format!(
                "{file}:{line}:{column}: {kind}: {detail}\n",
                file = FileTable::display_name(span.start.file),
                line = span.start.line,
                column = span.start.column,
                kind = error.kind(),
                detail = error.detail(),
            ));
            if let Some(text) = source_by_file(span.start.file) {
                out.push_str(&excerpt(&text, span.start.line, span.start.column));
            }
        }
        None => {
            out.push_str(&format!("{}: {}\n", error.kind(), error.detail()));
        }
    }
    for frame in error.traceback() {
        match frame.span {
            Some(span) => out.push_str(&format!("  in {} at {}\n", frame.display_name, span)),
            None => out.push_str(&format!("  in {}\n", frame.display_name)),
        }
    }
    out
}

fn excerpt(text: &str, line: u32, column: u32) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let idx = line.saturating_sub(1) as usize;
    let start = idx.saturating_sub(1);
    let end = (idx + 1).min(lines.len().saturating_sub(1));
    let mut out = String::new();
    for i in start..=end {
        if let Some(l) = lines.get(i) {
            out.push_str(l);
            out.push('\n');
            if i == idx {
                let caret_col = column.saturating_sub(1) as usize;
                out.push_str(&" ".repeat(caret_col));
                out.push_str("^\n");
            }
        }
    }
    out
}
