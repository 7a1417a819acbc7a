//! The sandboxed scripting host (spec §4.4, SPEC_FULL §10.2): a small
//! hand-rolled expression language used for `Pass1Exec`/`Pass1Eval`/
//! `Pass2Exec`/`Pass2Eval` script bodies.
//!
//! Grounded on `original_source/src/tools.py`'s `exec_python`/`eval_python`:
//! `exec` runs a body for its side effects on `globals`/`locals` and returns
//! whatever [`value::RETURN_VAR`] was bound to when it finished (`nil` if it
//! was never set); `eval` runs a single expression and returns its value
//! directly.

pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

use value::{Env, ScriptValue, RETURN_VAR};

/// Runs `source` as a sequence of statements against the given environment,
/// returning the value bound to the convention return variable (or `Nil` if
/// it was never set). Mutations to `globals` persist in the caller's map.
pub fn exec(source: &str, globals: &mut Env, locals: &Env) -> Result<ScriptValue, String> {
    let tokens = lexer::lex(source)?;
    let exprs = parser::parse_program(&tokens)?;
    eval::eval_program(&exprs, globals, locals)?;
    Ok(globals.remove(RETURN_VAR).unwrap_or(ScriptValue::Nil))
}

/// Runs `source` as a single expression (or `;`-separated sequence, whose
/// value is its last expression) and returns its value directly, without
/// consulting the return-variable convention.
pub fn eval_str(source: &str, globals: &mut Env, locals: &Env) -> Result<ScriptValue, String> {
    let tokens = lexer::lex(source)?;
    let exprs = parser::parse_program(&tokens)?;
    eval::eval_program(&exprs, globals, locals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_returns_ret_global_and_clears_it() {
        let mut globals = Env::new();
        let locals = Env::new();
        let result = exec("ret = 1 + 2", &mut globals, &locals).unwrap();
        assert!(matches!(result, ScriptValue::Number(n) if n == 3.0));
        assert!(!globals.contains_key(RETURN_VAR));
    }

    #[test]
    fn exec_without_ret_yields_nil() {
        let mut globals = Env::new();
        let locals = Env::new();
        let result = exec("x = 5", &mut globals, &locals).unwrap();
        assert!(matches!(result, ScriptValue::Nil));
        assert!(globals.contains_key("x"));
    }

    #[test]
    fn eval_str_returns_expression_value_directly() {
        let mut globals = Env::new();
        let locals = Env::new();
        let result = eval_str("2 * 21", &mut globals, &locals).unwrap();
        assert!(matches!(result, ScriptValue::Number(n) if n == 42.0));
    }
}
