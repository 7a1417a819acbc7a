//! Tree-walking interpreter (spec §4.4): visits the syntax tree, executing
//! macro definitions, expanding macro calls, running pass-1 scripts, and
//! emitting a flat expanded token stream.

use crate::context::Context;
use crate::errors::{ContextFrame, ScriptumError};
use crate::parser::ast::{
    Arg, Document, KeyArg, MacroCall, MacroDefinition, Paragraph, PlainAtom, PlainText, ScriptKind, ScriptNode,
    TextGroup, Writing,
};
use crate::position::Span;
use crate::scanner::token::{DeferredScript, Token, TokenKind};
use crate::script;
use crate::symtab::SymbolEntry;
use std::sync::Arc;

/// Recursion-depth guard for macro expansion (SPEC_FULL §10.3 default `256`).
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Which of the three search strategies (§4.5 "Paths") resolved a file
/// path: tried relative to the current file, then the main file, then the
/// standard library (`Near`); explicit relative to the current file with no
/// fallback (`Strict`); or standard library first, then main, then current
/// (`Far`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    Near,
    Strict,
    Far,
}

/// Dispatch for `insert`/`import` file-level macro calls (§4.5), injected
/// so `interp` doesn't depend on `importgraph` directly — `importgraph` is
/// the one caller that actually implements this trait, keeping the
/// dependency edge one-directional (importgraph → interp, not both ways).
pub trait Importer {
    /// Runs `path` in `caller`'s own context; emits directly into the
    /// caller's token document.
    fn insert(&mut self, caller: &Context, path: &str, strategy: SearchStrategy, span: Span) -> Result<(), ScriptumError>;

    /// Runs `path` once in a fresh context (or reuses the cached result);
    /// returns the tokens that should be spliced in at the call site.
    fn import(
        &mut self,
        caller: &Context,
        path: &str,
        strategy: SearchStrategy,
        span: Span,
    ) -> Result<Vec<Token>, ScriptumError>;
}

struct Interp<'a> {
    importer: &'a mut dyn Importer,
    max_depth: usize,
}

/// Entry point: interprets one parsed file under `ctx`, appending the
/// expanded token stream to `ctx.token_document` (spec §4.4 "File → visit
/// its document").
pub fn interpret_file(
    file: &crate::parser::ast::FileNode,
    ctx: &Context,
    importer: &mut dyn Importer,
    max_depth: usize,
) -> Result<(), ScriptumError> {
    let mut interp = Interp { importer, max_depth };
    let tokens = interp.visit_document(&file.document, ctx, 0)?;
    ctx.emit_all(tokens);
    Ok(())
}

impl<'a> Interp<'a> {
    fn check_depth(&self, depth: usize, span: Span) -> Result<(), ScriptumError> {
        tracing::trace!(depth, max_depth = self.max_depth, "macro expansion depth");
        if depth > self.max_depth {
            return Err(ScriptumError::Resolve {
                span,
                detail: format!("macro-expansion recursion exceeded the configured limit of {}", self.max_depth),
            });
        }
        Ok(())
    }

    fn visit_document(&mut self, doc: &Document, ctx: &Context, depth: usize) -> Result<Vec<Token>, ScriptumError> {
        let mut out = Vec::new();
        for paragraph in &doc.paragraphs {
            out.extend(self.visit_paragraph(paragraph, ctx, depth)?);
        }
        Ok(out)
    }

    /// §4.4 "Paragraph → visit its writing; if the paragraph had a leading
    /// break and the writing produced any tokens, emit the break *before*
    /// them."
    fn visit_paragraph(&mut self, p: &Paragraph, ctx: &Context, depth: usize) -> Result<Vec<Token>, ScriptumError> {
        let produced = self.visit_writing(&p.writing, ctx, depth)?;
        if produced.is_empty() {
            return Ok(produced);
        }
        let mut out = Vec::new();
        if let Some(break_span) = p.leading_break {
            out.push(Token::new(TokenKind::ParagraphBreak, break_span, false));
        }
        out.extend(produced);
        Ok(out)
    }

    fn visit_writing(&mut self, w: &Writing, ctx: &Context, depth: usize) -> Result<Vec<Token>, ScriptumError> {
        match w {
            Writing::Script(s) => self.visit_script(s, ctx),
            Writing::MacroDefinition(def) => {
                self.visit_macro_definition(def, ctx);
                Ok(Vec::new())
            }
            Writing::MacroCall(call) => self.visit_macro_call(call, ctx, depth),
            Writing::TextGroup(g) => self.visit_text_group(g, ctx, depth),
            Writing::PlainText(p) => Ok(self.visit_plain_text(p)),
        }
    }

    fn visit_script(&mut self, s: &ScriptNode, ctx: &Context) -> Result<Vec<Token>, ScriptumError> {
        match s.kind {
            ScriptKind::Pass1Exec => {
                let result = {
                    let mut globals = ctx.globals.borrow_mut();
                    script::exec(&s.source, &mut globals, &ctx.locals)
                };
                let value = result.map_err(|detail| self.wrap_script_error(ctx, s.span, detail))?;
                Ok(self.script_value_to_tokens(value, s.span, s.space_before))
            }
            ScriptKind::Pass1Eval => {
                let result = {
                    let mut globals = ctx.globals.borrow_mut();
                    script::eval_str(&s.source, &mut globals, &ctx.locals)
                };
                let value = result.map_err(|detail| self.wrap_script_error(ctx, s.span, detail))?;
                Ok(self.script_value_to_tokens(value, s.span, s.space_before))
            }
            ScriptKind::Pass2Exec | ScriptKind::Pass2Eval => {
                let deferred = DeferredScript {
                    source: Arc::clone(&s.source),
                    is_eval: s.kind.is_eval(),
                    span: s.span,
                    locals_snapshot: ctx.locals.clone(),
                };
                Ok(vec![Token::new(TokenKind::DeferredScript(deferred), s.span, s.space_before)])
            }
        }
    }

    fn wrap_script_error(&self, ctx: &Context, span: Span, detail: String) -> ScriptumError {
        wrap_script_error(&ctx.display_name, ctx.entry_span, span, detail)
    }

    /// §4.4 "its value, if not nil, becomes tokens — if string, tokenize as
    /// plain text; if style-bearing text, convert to a token stream
    /// preserving markers."
    fn script_value_to_tokens(&self, value: script::value::ScriptValue, span: Span, space_before: bool) -> Vec<Token> {
        script_value_to_tokens(value, span, space_before)
    }

    fn visit_macro_definition(&mut self, def: &MacroDefinition, ctx: &Context) {
        ctx.symbols.set(Arc::clone(&def.name), SymbolEntry::Macro(std::rc::Rc::new(def.clone())));
    }

    fn visit_macro_call(&mut self, call: &MacroCall, ctx: &Context, depth: usize) -> Result<Vec<Token>, ScriptumError> {
        self.check_depth(depth, call.span)?;

        if let Some((is_insert, strategy)) = file_directive(&call.name) {
            let path = self.single_path_arg(call)?;
            return if is_insert {
                self.importer.insert(ctx, &path, strategy, call.span)?;
                Ok(Vec::new())
            } else {
                self.importer.import(ctx, &path, strategy, call.span)
            };
        }

        let entry = ctx.symbols.get(&call.name).ok_or_else(|| ScriptumError::Resolve {
            span: call.span,
            detail: format!("undefined macro `{}`", call.name),
        })?;

        let mut tokens = match entry {
            SymbolEntry::Argument(text_group) => self.visit_text_group(&text_group, ctx, depth + 1)?,
            SymbolEntry::Macro(def) => self.expand_macro_call(&def, call, ctx, depth)?,
        };

        if let Some(first) = tokens.first_mut() {
            first.space_before = call.space_before;
        }
        Ok(tokens)
    }

    fn single_path_arg(&self, call: &MacroCall) -> Result<String, ScriptumError> {
        match call.args.first() {
            Some(Arg::Positional(group)) => Ok(plain_text_of(group)),
            _ => Err(ScriptumError::Resolve {
                span: call.span,
                detail: format!("`{}` requires exactly one positional path argument", call.name),
            }),
        }
    }

    /// §4.4 "MacroCall" arity/binding rules.
    fn expand_macro_call(
        &mut self,
        def: &MacroDefinition,
        call: &MacroCall,
        ctx: &Context,
        depth: usize,
    ) -> Result<Vec<Token>, ScriptumError> {
        let mut positional_args = Vec::new();
        let mut key_args: Vec<KeyArg> = Vec::new();
        for arg in &call.args {
            match arg {
                Arg::Positional(g) => positional_args.push(g.clone()),
                Arg::Key(k) => key_args.push(k.clone()),
            }
        }

        let min = def.positional_params.len();
        let max = def.positional_params.len() + def.key_params.len();
        if positional_args.len() < min || positional_args.len() > max {
            return Err(ScriptumError::Resolve {
                span: call.span,
                detail: format!(
                    "macro `{}` takes between {} and {} positional arguments, got {}",
                    call.name,
                    min,
                    max,
                    positional_args.len()
                ),
            });
        }

        for k in &key_args {
            if !def.key_params.iter().any(|p| p.name == k.name) {
                return Err(ScriptumError::Resolve {
                    span: call.span,
                    detail: format!("macro `{}` has no key parameter named `{}`", call.name, k.name),
                });
            }
        }
        let mut seen = std::collections::HashSet::new();
        for k in &key_args {
            if !seen.insert(k.name.clone()) {
                return Err(ScriptumError::Resolve {
                    span: call.span,
                    detail: format!("key argument `{}` given more than once", k.name),
                });
            }
        }

        let child_symbols = crate::symtab::SymbolTable::child_of(&ctx.symbols);
        let mut locals_to_add = Vec::new();

        for (i, name) in def.positional_params.iter().enumerate() {
            let group = positional_args[i].clone();
            bind_param(&child_symbols, &mut locals_to_add, name, group);
        }

        let extra_positional = &positional_args[def.positional_params.len()..];
        let mut key_values: Vec<(Arc<str>, TextGroup)> = Vec::new();
        for (kp, extra) in def.key_params.iter().zip(extra_positional.iter()) {
            key_values.push((Arc::clone(&kp.name), extra.clone()));
        }
        for k in &key_args {
            key_values.retain(|(n, _)| n != &k.name);
            key_values.push((Arc::clone(&k.name), k.value.clone()));
        }
        for kp in &def.key_params {
            if !key_values.iter().any(|(n, _)| n == &kp.name) {
                key_values.push((Arc::clone(&kp.name), kp.default.clone()));
            }
        }
        for (name, group) in key_values {
            bind_param(&child_symbols, &mut locals_to_add, &name, group);
        }

        let mut child_ctx = ctx.gen_child(call.name.to_string(), Some(call.span), locals_to_add);
        child_ctx.symbols = child_symbols;

        self.visit_document(&def.body.document, &child_ctx, depth + 1)
    }

    fn visit_text_group(&mut self, g: &TextGroup, ctx: &Context, depth: usize) -> Result<Vec<Token>, ScriptumError> {
        let mut tokens = self.visit_document(&g.document, ctx, depth)?;
        if let Some(first) = tokens.first_mut() {
            first.space_before = g.space_before;
        }
        Ok(tokens)
    }

    fn visit_plain_text(&mut self, p: &PlainText) -> Vec<Token> {
        p.atoms
            .iter()
            .map(|atom| {
                let kind = match &atom.atom {
                    PlainAtom::Word(w) => TokenKind::Word(Arc::clone(w)),
                    PlainAtom::Equals => TokenKind::Equals,
                    PlainAtom::Comma => TokenKind::Comma,
                    PlainAtom::OpenParen => TokenKind::OpenParen,
                    PlainAtom::CloseParen => TokenKind::CloseParen,
                };
                Token::new(kind, atom.span, atom.space_before)
            })
            .collect()
    }
}

/// Recognizes the file-directive macro-call names (§4.5): `insert`/`import`
/// default to the near-path strategy, with `strict_`/`far_`-prefixed
/// variants selecting the other two. Returns `(is_insert, strategy)`.
fn file_directive(name: &str) -> Option<(bool, SearchStrategy)> {
    match name {
        "insert" => Some((true, SearchStrategy::Near)),
        "strict_insert" => Some((true, SearchStrategy::Strict)),
        "far_insert" => Some((true, SearchStrategy::Far)),
        "import" => Some((false, SearchStrategy::Near)),
        "strict_import" => Some((false, SearchStrategy::Strict)),
        "far_import" => Some((false, SearchStrategy::Far)),
        _ => None,
    }
}

fn bind_param(
    symbols: &std::rc::Rc<crate::symtab::SymbolTable>,
    locals_to_add: &mut Vec<(Arc<str>, script::value::ScriptValue)>,
    name: &Arc<str>,
    group: TextGroup,
) {
    let stringified = plain_text_of(&group);
    symbols.set(Arc::clone(name), SymbolEntry::Argument(std::rc::Rc::new(group)));
    locals_to_add.push((Arc::clone(name), script::value::ScriptValue::String(Arc::from(stringified.as_str()))));
}

/// A crude "stringify this text group" used for (a) script-local argument
/// bindings (§4.4 "a stringified form becomes a script local") and (b)
/// `insert`/`import` path arguments — good enough for plain-text-only
/// groups, which is what both call sites expect in practice.
fn plain_text_of(group: &TextGroup) -> String {
    let mut out = String::new();
    for paragraph in &group.document.paragraphs {
        collect_writing_text(&paragraph.writing, &mut out);
    }
    out
}

fn collect_writing_text(w: &Writing, out: &mut String) {
    match w {
        Writing::PlainText(p) => {
            for atom in &p.atoms {
                if atom.space_before && !out.is_empty() {
                    out.push(' ');
                }
                match &atom.atom {
                    PlainAtom::Word(word) => out.push_str(word),
                    PlainAtom::Equals => out.push('='),
                    PlainAtom::Comma => out.push(','),
                    PlainAtom::OpenParen => out.push('('),
                    PlainAtom::CloseParen => out.push(')'),
                }
            }
        }
        Writing::TextGroup(g) => {
            for paragraph in &g.document.paragraphs {
                collect_writing_text(&paragraph.writing, out);
            }
        }
        _ => {}
    }
}

/// Splits a script result string on whitespace into `Word` tokens sharing
/// `span` (the originating script's position — a script's result has no
/// finer-grained source mapping of its own).
pub(crate) fn text_to_words(text: &str, span: Span, space_before: bool) -> Vec<Token> {
    text.split_whitespace()
        .enumerate()
        .map(|(i, w)| Token::new(TokenKind::Word(Arc::from(w)), span, if i == 0 { space_before } else { true }))
        .collect()
}

/// Shared by pass-1 script handling here and pass-2 deferred-script
/// execution in `placer::naive` — both need the same `ScriptumError::Script`
/// shape and the same value-to-token conversion (§4.4).
pub(crate) fn wrap_script_error(display_name: &str, entry_span: Option<Span>, span: Span, detail: String) -> ScriptumError {
    ScriptumError::Script { span, detail, traceback: vec![ContextFrame { display_name: display_name.to_string(), span: entry_span }] }
}

/// §4.4 "its value, if not nil, becomes tokens — if string, tokenize as
/// plain text; if style-bearing text, convert to a token stream preserving
/// markers."
pub(crate) fn script_value_to_tokens(value: script::value::ScriptValue, span: Span, space_before: bool) -> Vec<Token> {
    use script::value::ScriptValue;
    match value {
        ScriptValue::Nil => Vec::new(),
        ScriptValue::StyledText(styled) => {
            let end = crate::style::MarkupEnd::unresolved();
            let start = crate::style::MarkupStart { style_delta: styled.style, paired_end: std::rc::Rc::clone(&end) };
            let mut out = vec![Token::new(TokenKind::MarkupStart(start), span, space_before)];
            out.extend(text_to_words(&styled.text, span, true));
            out.push(Token::new(TokenKind::MarkupEnd(end), span, false));
            out
        }
        other => text_to_words(&other.to_display_string(), span, space_before),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::FileTable;

    struct NoopImporter;
    impl Importer for NoopImporter {
        fn insert(&mut self, _caller: &Context, _path: &str, _strategy: SearchStrategy, _span: Span) -> Result<(), ScriptumError> {
            Ok(())
        }
        fn import(
            &mut self,
            _caller: &Context,
            _path: &str,
            _strategy: SearchStrategy,
            _span: Span,
        ) -> Result<Vec<Token>, ScriptumError> {
            Ok(Vec::new())
        }
    }

    fn parse_and_run(src: &str) -> Vec<Token> {
        let file_id = FileTable::intern(std::path::PathBuf::from("<test>"));
        let scanned = crate::scanner::Scanner::scan(file_id, src).unwrap();
        let ast = crate::parser::parse(&scanned).unwrap();
        let ctx = Context::new_root("<root>", file_id);
        let mut importer = NoopImporter;
        interpret_file(&ast, &ctx, &mut importer, DEFAULT_MAX_DEPTH).unwrap();
        ctx.token_document.borrow().clone()
    }

    #[test]
    fn plain_text_round_trips_as_words() {
        let tokens = parse_and_run("hello world");
        let words: Vec<_> = tokens
            .iter()
            .filter_map(|t| if let TokenKind::Word(w) = &t.kind { Some(w.to_string()) } else { None })
            .collect();
        assert_eq!(words, vec!["hello", "world"]);
    }

    #[test]
    fn macro_with_default_key_param() {
        let src = "\\hi = (\\name, \\greet={Hello}) {\\greet \\name}\n\\hi{World}";
        let tokens = parse_and_run(src);
        let words: Vec<_> = tokens
            .iter()
            .filter_map(|t| if let TokenKind::Word(w) = &t.kind { Some(w.to_string()) } else { None })
            .collect();
        assert_eq!(words, vec!["Hello", "World"]);
    }

    #[test]
    fn extra_positional_fills_key_param() {
        let src = "\\hi = (\\name, \\greet={Hello}) {\\greet \\name}\n\\hi{World}{Hi}";
        let tokens = parse_and_run(src);
        let words: Vec<_> = tokens
            .iter()
            .filter_map(|t| if let TokenKind::Word(w) = &t.kind { Some(w.to_string()) } else { None })
            .collect();
        assert_eq!(words, vec!["Hi", "World"]);
    }

    #[test]
    fn undefined_macro_is_resolve_error() {
        let file_id = FileTable::intern(std::path::PathBuf::from("<test>"));
        let scanned = crate::scanner::Scanner::scan(file_id, "\\nope{x}").unwrap();
        let ast = crate::parser::parse(&scanned).unwrap();
        let ctx = Context::new_root("<root>", file_id);
        let mut importer = NoopImporter;
        let err = interpret_file(&ast, &ctx, &mut importer, DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, ScriptumError::Resolve { .. }));
    }

    #[test]
    fn paragraph_break_only_emitted_when_writing_produces_tokens() {
        let tokens = parse_and_run("one\n\ntwo");
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        let break_count = kinds.iter().filter(|k| matches!(k, TokenKind::ParagraphBreak)).count();
        assert_eq!(break_count, 1);
    }
}
