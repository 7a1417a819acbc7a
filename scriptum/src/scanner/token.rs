//! Token shape (spec §3 "Token"), grounded on the `Token`/`TokenKind` split
//! used throughout the reference pack's Perl toolchain (`perl-token`).

use crate::position::Span;
use crate::style::{MarkupEnd, MarkupStart};
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Grouping
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    Comma,
    Equals,

    // Structural
    Word(Arc<str>),
    ParagraphBreak,
    FileStart,
    FileEnd,
    NoneLeft,

    // Identifier (macro name)
    Identifier(Arc<str>),

    // Script (source-stage tokens, produced by the scanner)
    Pass1Exec(Arc<str>),
    Pass1Eval(Arc<str>),
    Pass2Exec(Arc<str>),
    Pass2Eval(Arc<str>),

    // Post-interpretation tokens, produced by the interpreter (§4.4) rather
    // than the scanner: a deferred pass-2 script closure and the inline
    // style markers that bracket style-bearing text (§3).
    DeferredScript(DeferredScript),
    MarkupStart(MarkupStart),
    MarkupEnd(Rc<MarkupEnd>),
}

impl TokenKind {
    pub fn is_script(&self) -> bool {
        matches!(
            self,
            TokenKind::Pass1Exec(_) | TokenKind::Pass1Eval(_) | TokenKind::Pass2Exec(_) | TokenKind::Pass2Eval(_)
        )
    }

    pub fn is_pass2(&self) -> bool {
        matches!(self, TokenKind::Pass2Exec(_) | TokenKind::Pass2Eval(_))
    }

    /// One of the kinds that make up `plain_text` in the grammar (§4.2).
    /// `OpenBrace`/`CloseBrace` are excluded: those always delimit a
    /// `text_group`, never literal text — an escaped brace is folded into a
    /// `Word` by the scanner instead of surviving as its own token.
    pub fn is_plain_text_atom(&self) -> bool {
        matches!(
            self,
            TokenKind::Word(_) | TokenKind::Equals | TokenKind::Comma | TokenKind::OpenParen | TokenKind::CloseParen
        )
    }
}

/// A scanned token, with its span and whether it was preceded by collapsed
/// whitespace (§3 "Token").
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub space_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, space_before: bool) -> Self {
        Token { kind, span, space_before }
    }
}

/// A pass-2 script token's captured closure: the source, where it was
/// found, and a snapshot of the locals active when the interpreter reached
/// it (§3 "Deferred-Script Token", §9 "Deferred scripts").
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredScript {
    pub source: Arc<str>,
    pub is_eval: bool,
    pub span: Span,
    pub locals_snapshot: crate::script::value::Env,
}
