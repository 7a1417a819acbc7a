//! Syntax tree produced by the parser (spec §4.2).

use crate::position::Span;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FileNode {
    pub document: Document,
    pub span: Span,
}

/// A flat sequence of writings. Consecutive writings with no leading break
/// between them are, visually, the same paragraph — `leading_break` on each
/// `Paragraph` is what actually marks a paragraph boundary (§4.4 "Paragraph").
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone)]
pub struct Paragraph {
    pub leading_break: Option<Span>,
    pub writing: Writing,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Writing {
    Script(ScriptNode),
    MacroDefinition(MacroDefinition),
    MacroCall(MacroCall),
    PlainText(PlainText),
    TextGroup(TextGroup),
}

impl Writing {
    pub fn span(&self) -> Span {
        match self {
            Writing::Script(n) => n.span,
            Writing::MacroDefinition(n) => n.span,
            Writing::MacroCall(n) => n.span,
            Writing::PlainText(n) => n.span,
            Writing::TextGroup(n) => n.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Pass1Exec,
    Pass1Eval,
    Pass2Exec,
    Pass2Eval,
}

impl ScriptKind {
    pub fn is_pass2(self) -> bool {
        matches!(self, ScriptKind::Pass2Exec | ScriptKind::Pass2Eval)
    }

    pub fn is_eval(self) -> bool {
        matches!(self, ScriptKind::Pass1Eval | ScriptKind::Pass2Eval)
    }
}

#[derive(Debug, Clone)]
pub struct ScriptNode {
    pub kind: ScriptKind,
    pub source: Arc<str>,
    pub span: Span,
    pub space_before: bool,
}

#[derive(Debug, Clone)]
pub struct MacroDefinition {
    pub name: Arc<str>,
    pub name_span: Span,
    pub positional_params: Vec<Arc<str>>,
    pub key_params: Vec<KeyParam>,
    pub body: TextGroup,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct KeyParam {
    pub name: Arc<str>,
    pub default: TextGroup,
}

#[derive(Debug, Clone)]
pub struct MacroCall {
    pub name: Arc<str>,
    pub name_span: Span,
    pub args: Vec<Arg>,
    pub span: Span,
    pub space_before: bool,
}

#[derive(Debug, Clone)]
pub enum Arg {
    Positional(TextGroup),
    Key(KeyArg),
}

#[derive(Debug, Clone)]
pub struct KeyArg {
    pub name: Arc<str>,
    pub value: TextGroup,
}

#[derive(Debug, Clone)]
pub struct TextGroup {
    pub document: Document,
    pub span: Span,
    pub space_before: bool,
}

#[derive(Debug, Clone)]
pub enum PlainAtom {
    Word(Arc<str>),
    Equals,
    Comma,
    OpenParen,
    CloseParen,
}

#[derive(Debug, Clone)]
pub struct PlainTextAtom {
    pub atom: PlainAtom,
    pub span: Span,
    pub space_before: bool,
}

#[derive(Debug, Clone)]
pub struct PlainText {
    pub atoms: Vec<PlainTextAtom>,
    pub span: Span,
    pub space_before: bool,
}
