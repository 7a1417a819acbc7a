//! Lexing (spec §4.1 "Scanner").
//!
//! A single forward pass over the decoded source text, producing a flat
//! `Vec<Token>` bracketed by `FileStart`/`FileEnd`. Whitespace is never
//! emitted as its own token: it is collapsed into the `space_before` flag
//! of whatever token follows, except that a run containing two or more
//! line breaks collapses instead to one `ParagraphBreak` token.

pub mod delimiters;
pub mod token;

use crate::errors::{Result, ScriptumError};
use crate::position::{Cursor, FileId, SourcePosition, Span};
use delimiters::{is_escapable, is_identifier_char, DelimKind, DELIMS};
use std::sync::Arc;
use token::{Token, TokenKind};

pub struct Scanner<'a> {
    text: &'a str,
    cursor: Cursor,
}

impl<'a> Scanner<'a> {
    pub fn new(file: FileId, text: &'a str) -> Self {
        Scanner { text, cursor: Cursor::new(file) }
    }

    pub fn scan(file: FileId, text: &'a str) -> Result<Vec<Token>> {
        Scanner::new(file, text).run()
    }

    fn remaining(&self) -> &'a str {
        &self.text[self.cursor.position().byte_index..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn pos(&self) -> SourcePosition {
        self.cursor.position()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.cursor.advance(c, c.len_utf8());
        Some(c)
    }

    fn advance_str(&mut self, s: &str) {
        for c in s.chars() {
            self.cursor.advance(c, c.len_utf8());
        }
    }

    pub fn run(mut self) -> Result<Vec<Token>> {
        let start = self.pos();
        let mut tokens = vec![Token::new(TokenKind::FileStart, Span::point(start), false)];

        let mut pending_space = false;
        let mut word_buf = String::new();
        let mut word_start: Option<SourcePosition> = None;
        let mut brace_stack: Vec<SourcePosition> = Vec::new();
        let mut paren_stack: Vec<SourcePosition> = Vec::new();

        loop {
            let Some(c) = self.peek() else { break };

            if c == ' ' || c == '\t' || crate::position::is_line_terminator(c) {
                flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);
                let start_of_run = self.pos();
                if self.consume_whitespace_run() {
                    tokens.push(Token::new(TokenKind::ParagraphBreak, Span::point(start_of_run), false));
                }
                pending_space = true;
                continue;
            }

            match c {
                '{' => {
                    flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);
                    let p = self.pos();
                    self.bump();
                    brace_stack.push(p);
                    tokens.push(Token::new(TokenKind::OpenBrace, Span::new(p, self.pos()), pending_space));
                    pending_space = false;
                }
                '}' => {
                    flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);
                    let p = self.pos();
                    self.bump();
                    if brace_stack.pop().is_none() {
                        return Err(ScriptumError::Scan {
                            span: Span::point(p),
                            detail: "unmatched closing brace".to_string(),
                        });
                    }
                    tokens.push(Token::new(TokenKind::CloseBrace, Span::new(p, self.pos()), pending_space));
                    pending_space = false;
                }
                '(' => {
                    flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);
                    let p = self.pos();
                    self.bump();
                    paren_stack.push(p);
                    tokens.push(Token::new(TokenKind::OpenParen, Span::new(p, self.pos()), pending_space));
                    pending_space = false;
                }
                ')' => {
                    flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);
                    let p = self.pos();
                    self.bump();
                    if paren_stack.pop().is_none() {
                        return Err(ScriptumError::Scan {
                            span: Span::point(p),
                            detail: "unmatched closing parenthesis".to_string(),
                        });
                    }
                    tokens.push(Token::new(TokenKind::CloseParen, Span::new(p, self.pos()), pending_space));
                    pending_space = false;
                }
                ',' => {
                    flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);
                    let p = self.pos();
                    self.bump();
                    tokens.push(Token::new(TokenKind::Comma, Span::new(p, self.pos()), pending_space));
                    pending_space = false;
                }
                '=' => {
                    flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);
                    let p = self.pos();
                    self.bump();
                    tokens.push(Token::new(TokenKind::Equals, Span::new(p, self.pos()), pending_space));
                    pending_space = false;
                }
                '\\' => {
                    self.scan_backslash(&mut tokens, &mut word_buf, &mut word_start, &mut pending_space)?;
                }
                other => {
                    if word_start.is_none() {
                        word_start = Some(self.pos());
                    }
                    word_buf.push(other);
                    self.bump();
                }
            }
        }

        flush_word(&mut tokens, &mut word_buf, &mut word_start, pending_space);

        if let Some(&opener) = brace_stack.first() {
            return Err(ScriptumError::Scan { span: Span::point(opener), detail: "unbalanced brace: never closed".to_string() });
        }
        if let Some(&opener) = paren_stack.first() {
            return Err(ScriptumError::Scan {
                span: Span::point(opener),
                detail: "unbalanced parenthesis: never closed".to_string(),
            });
        }

        tokens.push(Token::new(TokenKind::FileEnd, Span::point(self.pos()), false));
        Ok(tokens)
    }

    /// Consumes one maximal run of horizontal whitespace and line breaks,
    /// returning whether it contained two or more line breaks (and so
    /// should collapse to a `ParagraphBreak` rather than plain space).
    fn consume_whitespace_run(&mut self) -> bool {
        let mut newline_count = 0;
        loop {
            while matches!(self.peek(), Some(' ') | Some('\t')) {
                self.bump();
            }
            match self.peek() {
                Some('\r') => {
                    self.bump();
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    newline_count += 1;
                }
                Some('\n') | Some('\u{000C}') => {
                    self.bump();
                    newline_count += 1;
                }
                _ => break,
            }
        }
        newline_count >= 2
    }

    /// Handles a `\` at the current position: escape-run counting, then
    /// either a literal escaped character, an identifier, a script/comment
    /// delimiter, or an error (§4.1 "Escape discipline", "Script delimiters").
    fn scan_backslash(
        &mut self,
        tokens: &mut Vec<Token>,
        word_buf: &mut String,
        word_start: &mut Option<SourcePosition>,
        pending_space: &mut bool,
    ) -> Result<()> {
        let run_start = self.pos();
        let mut n = 0usize;
        while self.peek() == Some('\\') {
            n += 1;
            self.bump();
        }
        // We've consumed all n backslashes already; walk back half of them
        // conceptually into literal pairs and, if n is odd, re-open the last
        // one for delimiter/escape matching.
        let pairs = n / 2;
        if pairs > 0 {
            if word_start.is_none() {
                *word_start = Some(run_start);
            }
            for _ in 0..pairs {
                word_buf.push('\\');
            }
        }
        if n % 2 == 0 {
            return Ok(());
        }

        // One backslash remains logically unconsumed; it was already bumped
        // past physically, so delimiter matching below must look at text
        // starting one byte before the current cursor.
        let backslash_pos = {
            let mut p = self.pos();
            p.byte_index -= 1;
            p
        };
        let from_backslash = &self.text[backslash_pos.byte_index..];

        if let Some(next_ch) = self.peek() {
            if is_escapable(next_ch) {
                if word_start.is_none() {
                    *word_start = Some(backslash_pos);
                }
                word_buf.push(next_ch);
                self.bump();
                return Ok(());
            }
        }

        flush_word(tokens, word_buf, word_start, *pending_space);

        for delim in DELIMS.iter() {
            if from_backslash.starts_with(delim.start) {
                self.advance_str(&delim.start[1..]); // the leading '\' is already consumed
                let (body, closed_by_terminator) = self.scan_script_body(delim.multiline, delim.terminators);
                let end = self.pos();
                if delim.multiline && !closed_by_terminator {
                    return Err(ScriptumError::Scan {
                        span: Span::new(backslash_pos, end),
                        detail: "unterminated multi-line script or comment".to_string(),
                    });
                }
                if !matches!(delim.kind, DelimKind::Comment) {
                    let kind = match delim.kind {
                        DelimKind::Pass1Exec => TokenKind::Pass1Exec(Arc::from(body)),
                        DelimKind::Pass1Eval => TokenKind::Pass1Eval(Arc::from(body)),
                        DelimKind::Pass2Exec => TokenKind::Pass2Exec(Arc::from(body)),
                        DelimKind::Pass2Eval => TokenKind::Pass2Eval(Arc::from(body)),
                        DelimKind::Comment => unreachable!(),
                    };
                    tokens.push(Token::new(kind, Span::new(backslash_pos, end), *pending_space));
                    *pending_space = false;
                }
                return Ok(());
            }
        }

        if let Some(id_start_ch) = self.peek() {
            if is_identifier_char(id_start_ch) {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if is_identifier_char(c) {
                        name.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::new(
                    TokenKind::Identifier(Arc::from(name.as_str())),
                    Span::new(backslash_pos, self.pos()),
                    *pending_space,
                ));
                *pending_space = false;
                return Ok(());
            }
        }

        Err(ScriptumError::Scan {
            span: Span::point(backslash_pos),
            detail: "backslash is not followed by an escapable character, an identifier, or a known script/comment delimiter".to_string(),
        })
    }

    /// Scans the body of a script or comment after its opening delimiter has
    /// been consumed. For one-line forms, a matching terminator ends the
    /// body without consuming it fully (any explicit terminator text is
    /// consumed) or, absent one, the body ends at end-of-line, leaving the
    /// line end visible to whitespace/paragraph-break scanning. For
    /// multi-line forms, only an explicit terminator ends the body.
    /// Returns `(body_text, ended_by_explicit_terminator)`.
    fn scan_script_body(&mut self, multiline: bool, terminators: &[&str]) -> (String, bool) {
        let mut body = String::new();
        loop {
            if let Some(term) = terminators.iter().find(|t| self.remaining().starts_with(**t)) {
                self.advance_str(term);
                return (body, true);
            }
            match self.peek() {
                None => return (body, false),
                Some(c) if !multiline && crate::position::is_line_terminator(c) => {
                    return (body, false);
                }
                Some(c) => {
                    body.push(c);
                    self.bump();
                }
            }
        }
    }
}

fn flush_word(tokens: &mut Vec<Token>, word_buf: &mut String, word_start: &mut Option<SourcePosition>, pending_space: bool) {
    if word_buf.is_empty() {
        return;
    }
    let start = word_start.take().expect("word_start set whenever word_buf is non-empty");
    // The end position isn't tracked precisely here (callers invoke this
    // right as they leave word-accumulation mode, from several call sites);
    // a point span at the start is enough for diagnostics, which only ever
    // report the start of a token.
    let span = Span::point(start);
    tokens.push(Token::new(TokenKind::Word(Arc::from(word_buf.as_str())), span, pending_space));
    word_buf.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::FileTable;

    fn scan(src: &str) -> Vec<Token> {
        let file = FileTable::intern(std::path::PathBuf::from("<test>"));
        Scanner::scan(file, src).expect("scan should succeed")
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind.clone()).collect()
    }

    #[test]
    fn words_and_single_space_collapse() {
        let tokens = scan("one two");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::FileStart,
                TokenKind::Word(Arc::from("one")),
                TokenKind::Word(Arc::from("two")),
                TokenKind::FileEnd,
            ]
        );
        assert!(tokens[2].space_before);
    }

    #[test]
    fn blank_line_becomes_paragraph_break() {
        let tokens = scan("one\n\ntwo");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::FileStart,
                TokenKind::Word(Arc::from("one")),
                TokenKind::ParagraphBreak,
                TokenKind::Word(Arc::from("two")),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn single_newline_is_plain_space() {
        let tokens = scan("one\ntwo");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::FileStart,
                TokenKind::Word(Arc::from("one")),
                TokenKind::Word(Arc::from("two")),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn escaped_brace_is_literal_text() {
        let tokens = scan(r"a\{b");
        assert_eq!(kinds(&tokens), vec![TokenKind::FileStart, TokenKind::Word(Arc::from("a{b")), TokenKind::FileEnd]);
    }

    #[test]
    fn doubled_backslash_then_brace_still_opens_a_group() {
        // Two backslashes resolve to one literal backslash, leaving the
        // brace unescaped.
        let tokens = scan(r"a\\{b}");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::FileStart,
                TokenKind::Word(Arc::from("a\\")),
                TokenKind::OpenBrace,
                TokenKind::Word(Arc::from("b")),
                TokenKind::CloseBrace,
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn identifier_after_backslash() {
        let tokens = scan(r"\bold{x}");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::FileStart,
                TokenKind::Identifier(Arc::from("bold")),
                TokenKind::OpenBrace,
                TokenKind::Word(Arc::from("x")),
                TokenKind::CloseBrace,
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn one_line_pass1_exec_script() {
        let tokens = scan(r"\>1 + 1<\");
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::FileStart, TokenKind::Pass1Exec(Arc::from("1 + 1")), TokenKind::FileEnd]
        );
    }

    #[test]
    fn one_line_script_without_terminator_ends_at_line_end() {
        let tokens = scan("\\>print x\nnext");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::FileStart,
                TokenKind::Pass1Exec(Arc::from("print x")),
                TokenKind::Word(Arc::from("next")),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn multiline_eval_script_spans_lines() {
        let tokens = scan("\\1?->a\nb<-\\");
        assert_eq!(kinds(&tokens), vec![TokenKind::FileStart, TokenKind::Pass1Eval(Arc::from("a\nb")), TokenKind::FileEnd]);
    }

    #[test]
    fn comment_is_discarded() {
        let tokens = scan("before\\% hidden\nafter");
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::FileStart,
                TokenKind::Word(Arc::from("before")),
                TokenKind::Word(Arc::from("after")),
                TokenKind::FileEnd,
            ]
        );
    }

    #[test]
    fn unterminated_multiline_script_is_scan_error() {
        let file = FileTable::intern(std::path::PathBuf::from("<test>"));
        let err = Scanner::scan(file, "\\->never closed").unwrap_err();
        assert!(matches!(err, ScriptumError::Scan { .. }));
    }

    #[test]
    fn unbalanced_brace_is_scan_error() {
        let file = FileTable::intern(std::path::PathBuf::from("<test>"));
        let err = Scanner::scan(file, "{unclosed").unwrap_err();
        assert!(matches!(err, ScriptumError::Scan { .. }));
    }

    #[test]
    fn backslash_with_no_identifier_or_delimiter_is_scan_error() {
        let file = FileTable::intern(std::path::PathBuf::from("<test>"));
        let err = Scanner::scan(file, "\\9").unwrap_err();
        assert!(matches!(err, ScriptumError::Scan { .. }));
    }
}
