//! Runtime values for the sandboxed scripting host (spec §4.4 "Script
//! globals"/"Script locals").
//!
//! Grounded on `original_source/src/tools.py`'s `exec_python`/`eval_python`:
//! a script result is either plain data that gets stringified, or a
//! "marked-up text" value that is carried through unconverted (here,
//! [`crate::style::StyledText`]).

use crate::style::StyledText;
use std::collections::HashMap;
use std::sync::Arc;

/// A value bound in script globals/locals, or produced by evaluating a
/// `Pass*Eval` script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Nil,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    StyledText(StyledText),
}

impl ScriptValue {
    /// The stringification every non-`StyledText` result goes through
    /// before becoming a `Word` in the expanded token stream (§4.4 "Script":
    /// "take its value as a string or style-bearing text").
    pub fn to_display_string(&self) -> String {
        match self {
            ScriptValue::Nil => String::new(),
            ScriptValue::Bool(b) => b.to_string(),
            ScriptValue::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            ScriptValue::String(s) => s.to_string(),
            ScriptValue::StyledText(t) => t.text.to_string(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Nil => false,
            ScriptValue::Bool(b) => *b,
            ScriptValue::Number(n) => *n != 0.0,
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::StyledText(t) => !t.text.is_empty(),
        }
    }
}

/// A flat name → value map. Globals are shared (wrapped in `Rc<RefCell<_>>`
/// by `Context`); locals are owned per-context and cloned-plus-extended on
/// `Context::gen_child`, mirroring the original's per-context `dict` copy
/// (`original_source/src/compiler.py`'s `Context.gen_child`).
pub type Env = HashMap<Arc<str>, ScriptValue>;

/// The script-host convention variable name: a pass-1 `exec` script's result
/// is whatever this global (or, failing that, local) is set to when the
/// script finishes running (`original_source/src/tools.py`'s `exec_python`).
pub const RETURN_VAR: &str = "ret";
