//! The interpretation/import record threaded through macro expansion and
//! nested file execution (spec §4.3 "Context").
//!
//! Grounded on `original_source/src/compiler.py`'s `Context` class:
//! globals and the accumulated token document are the *same* mutable object
//! shared by every descendant context (Python reference semantics), while
//! locals are a per-context copy seeded from the parent's locals plus new
//! bindings. In Rust, "same mutable object shared across owners" is
//! `Rc<RefCell<_>>`; "owned copy, extended" is a plain cloned `Env`.

use crate::position::{FileId, Span};
use crate::script::value::Env;
use crate::scanner::token::Token;
use crate::symtab::SymbolTable;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

pub struct Context {
    pub display_name: String,
    pub file: FileId,
    pub entry_span: Option<Span>,
    pub symbols: Rc<SymbolTable>,
    pub globals: Rc<RefCell<Env>>,
    pub locals: Env,
    pub token_document: Rc<RefCell<Vec<Token>>>,
    /// `true` only for the context created by `new_root`; mirrors the
    /// original's `global_level` flag, which macro-expansion diagnostics use
    /// to decide whether a traceback frame is the program's entry point.
    pub at_top_level: bool,
}

impl Context {
    /// Creates the outermost context for one compilation run — one file
    /// executed at the top level, with fresh globals and an empty token
    /// document.
    pub fn new_root(display_name: impl Into<String>, file: FileId) -> Context {
        Context {
            display_name: display_name.into(),
            file,
            entry_span: None,
            symbols: SymbolTable::root(),
            globals: Rc::new(RefCell::new(Env::new())),
            locals: Env::new(),
            token_document: Rc::new(RefCell::new(Vec::new())),
            at_top_level: true,
        }
    }

    /// Spec §4.3 "Context.gen_child": locals become the union of this
    /// context's locals plus `locals_to_add`; the symbol table chains onto
    /// this context's; globals and the token document are shared, not
    /// copied, with the parent.
    pub fn gen_child(
        &self,
        display_name: impl Into<String>,
        entry_span: Option<Span>,
        locals_to_add: impl IntoIterator<Item = (Arc<str>, crate::script::value::ScriptValue)>,
    ) -> Context {
        let mut locals = self.locals.clone();
        locals.extend(locals_to_add);

        Context {
            display_name: display_name.into(),
            file: self.file,
            entry_span,
            symbols: SymbolTable::child_of(&self.symbols),
            globals: Rc::clone(&self.globals),
            locals,
            token_document: Rc::clone(&self.token_document),
            at_top_level: false,
        }
    }

    /// For entering a different source file in place (an `insert`'s
    /// insertion point, §4.5): macros the inserted file defines must become
    /// visible in the *caller's* own scope once control returns, so this
    /// shares `symbols` directly (the same `Rc`, not a child table) rather
    /// than chaining a new level. The token document is still shared
    /// (expansion output keeps accumulating into the same list), and locals
    /// are copied rather than shared — locals are never mutated in place by
    /// script code (assignment always targets globals), so a copy observes
    /// every mutation that matters.
    pub fn enter_file_in_place(&self, display_name: impl Into<String>, file: FileId, entry_span: Option<Span>) -> Context {
        Context {
            display_name: display_name.into(),
            file,
            entry_span,
            symbols: Rc::clone(&self.symbols),
            globals: Rc::clone(&self.globals),
            locals: self.locals.clone(),
            token_document: Rc::clone(&self.token_document),
            at_top_level: false,
        }
    }

    pub fn emit(&self, token: Token) {
        self.token_document.borrow_mut().push(token);
    }

    pub fn emit_all(&self, tokens: impl IntoIterator<Item = Token>) {
        self.token_document.borrow_mut().extend(tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::FileTable;
    use crate::script::value::ScriptValue;

    fn root_context() -> Context {
        let file = FileTable::intern(std::path::PathBuf::from("<test>"));
        Context::new_root("<root>", file)
    }

    #[test]
    fn child_inherits_parent_locals_plus_additions() {
        let mut root = root_context();
        root.locals.insert(Arc::from("x"), ScriptValue::Number(1.0));

        let child = root.gen_child("macro-call", None, vec![(Arc::from("y"), ScriptValue::Number(2.0))]);

        assert!(matches!(child.locals.get("x"), Some(ScriptValue::Number(n)) if *n == 1.0));
        assert!(matches!(child.locals.get("y"), Some(ScriptValue::Number(n)) if *n == 2.0));
        // Parent is untouched by the child's additions.
        assert!(root.locals.get("y").is_none());
    }

    #[test]
    fn globals_and_token_document_are_shared_with_child() {
        let root = root_context();
        let child = root.gen_child("macro-call", None, vec![]);

        child.globals.borrow_mut().insert(Arc::from("g"), ScriptValue::Bool(true));
        assert!(root.globals.borrow().contains_key("g"));

        root.emit(Token::new(
            crate::scanner::token::TokenKind::Word(Arc::from("hi")),
            crate::position::Span::point(crate::position::SourcePosition::start_of_file(root.file)),
            false,
        ));
        assert_eq!(child.token_document.borrow().len(), 1);
    }
}
