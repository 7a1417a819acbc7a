//! Symbol table: a single-parent chain mapping macro names to either a
//! macro definition or a bound argument (spec §4.3).

use crate::parser::ast::{MacroDefinition, TextGroup};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

/// What a name can resolve to during macro-call resolution (§4.4
/// "MacroCall": "If it resolves to a `TextGroup`... Otherwise it resolves
/// to a `Macro`.").
#[derive(Debug, Clone)]
pub enum SymbolEntry {
    Macro(Rc<MacroDefinition>),
    Argument(Rc<TextGroup>),
}

#[derive(Debug)]
pub struct SymbolTable {
    parent: Option<Rc<SymbolTable>>,
    symbols: RefCell<HashMap<Arc<str>, SymbolEntry>>,
}

impl SymbolTable {
    pub fn root() -> Rc<Self> {
        Rc::new(SymbolTable { parent: None, symbols: RefCell::new(HashMap::new()) })
    }

    pub fn child_of(parent: &Rc<SymbolTable>) -> Rc<Self> {
        Rc::new(SymbolTable { parent: Some(Rc::clone(parent)), symbols: RefCell::new(HashMap::new()) })
    }

    /// Walks the parent chain; the first definition found wins.
    pub fn get(&self, name: &str) -> Option<SymbolEntry> {
        if let Some(v) = self.symbols.borrow().get(name) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    pub fn set(&self, name: Arc<str>, value: SymbolEntry) {
        self.symbols.borrow_mut().insert(name, value);
    }

    pub fn remove(&self, name: &str) {
        self.symbols.borrow_mut().remove(name);
    }

    /// Copies entries from `other`'s own level (not `other`'s ancestors) into
    /// `self`'s own level. `None` imports every entry; `Some(names)` imports
    /// exactly those names, erroring if one is missing.
    pub fn import_from(&self, other: &SymbolTable, names: Option<&[Arc<str>]>) -> Result<(), Arc<str>> {
        match names {
            None => {
                let mut mine = self.symbols.borrow_mut();
                for (k, v) in other.symbols.borrow().iter() {
                    mine.insert(k.clone(), v.clone());
                }
                Ok(())
            }
            Some(names) => {
                let theirs = other.symbols.borrow();
                for name in names {
                    match theirs.get(name) {
                        Some(v) => self.symbols.borrow_mut().insert(name.clone(), v.clone()),
                        None => return Err(name.clone()),
                    };
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_entries_until_shadowed() {
        let root = SymbolTable::root();
        root.set(Arc::from("a"), SymbolEntry::Macro(Rc::new(dummy_macro("a"))));
        let child = SymbolTable::child_of(&root);
        assert!(matches!(child.get("a"), Some(SymbolEntry::Macro(_))));

        child.set(Arc::from("a"), SymbolEntry::Macro(Rc::new(dummy_macro("a-shadow"))));
        match child.get("a") {
            Some(SymbolEntry::Macro(m)) => assert_eq!(m.name.as_ref(), "a-shadow"),
            other => panic!("expected shadowed macro, got {other:?}"),
        }
        // The parent's own entry is untouched.
        match root.get("a") {
            Some(SymbolEntry::Macro(m)) => assert_eq!(m.name.as_ref(), "a"),
            other => panic!("expected original macro, got {other:?}"),
        }
    }

    #[test]
    fn selective_import_errors_on_missing_name() {
        let src = SymbolTable::root();
        src.set(Arc::from("a"), SymbolEntry::Macro(Rc::new(dummy_macro("a"))));
        let dst = SymbolTable::root();
        assert!(dst.import_from(&src, Some(&[Arc::from("missing")])).is_err());
    }

    fn dummy_macro(name: &str) -> MacroDefinition {
        use crate::position::{FileTable, SourcePosition, Span};
        let file = FileTable::intern(std::path::PathBuf::from("<test>"));
        let pos = SourcePosition::start_of_file(file);
        MacroDefinition {
            name: Arc::from(name),
            name_span: Span::point(pos),
            positional_params: vec![],
            key_params: vec![],
            body: TextGroup { document: Default::default(), span: Span::point(pos), space_before: false },
            span: Span::point(pos),
        }
    }
}
