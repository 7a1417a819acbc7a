//! Tree-walking evaluator for the sandboxed expression language
//! (SPEC_FULL §10.2).
//!
//! Variable lookup checks locals before globals (spec §4.4 "script locals");
//! assignment always writes into globals, since locals are a snapshot, not
//! a live binding the script can mutate in place (§9 "Script globals form a
//! single mutable map threaded through contexts").

use super::parser::{BinOp, Expr, UnOp};
use super::value::{Env, ScriptValue};

pub fn eval_program(exprs: &[Expr], globals: &mut Env, locals: &Env) -> Result<ScriptValue, String> {
    let mut last = ScriptValue::Nil;
    for expr in exprs {
        last = eval(expr, globals, locals)?;
    }
    Ok(last)
}

pub fn eval(expr: &Expr, globals: &mut Env, locals: &Env) -> Result<ScriptValue, String> {
    match expr {
        Expr::Number(n) => Ok(ScriptValue::Number(*n)),
        Expr::Str(s) => Ok(ScriptValue::String(s.as_str().into())),
        Expr::Bool(b) => Ok(ScriptValue::Bool(*b)),
        Expr::Nil => Ok(ScriptValue::Nil),
        Expr::Var(name) => Ok(locals
            .get(name.as_str())
            .or_else(|| globals.get(name.as_str()))
            .cloned()
            .unwrap_or(ScriptValue::Nil)),
        Expr::Assign(name, value) => {
            let v = eval(value, globals, locals)?;
            globals.insert(name.as_str().into(), v.clone());
            Ok(v)
        }
        Expr::Unary(UnOp::Neg, operand) => match eval(operand, globals, locals)? {
            ScriptValue::Number(n) => Ok(ScriptValue::Number(-n)),
            other => Err(format!("cannot negate {other:?}")),
        },
        Expr::If(cond, then_branch, else_branch) => {
            if eval(cond, globals, locals)?.is_truthy() {
                eval(then_branch, globals, locals)
            } else {
                eval(else_branch, globals, locals)
            }
        }
        Expr::Binary(lhs, op, rhs) => {
            let l = eval(lhs, globals, locals)?;
            let r = eval(rhs, globals, locals)?;
            eval_binary(l, *op, r)
        }
    }
}

fn eval_binary(l: ScriptValue, op: BinOp, r: ScriptValue) -> Result<ScriptValue, String> {
    use BinOp::*;

    // String concatenation: `+` with either side a string stringifies the other.
    if op == Add && (matches!(l, ScriptValue::String(_)) || matches!(r, ScriptValue::String(_))) {
        return Ok(ScriptValue::String(format!("{}{}", l.to_display_string(), r.to_display_string()).into()));
    }

    match (op, l, r) {
        (Add, ScriptValue::Number(a), ScriptValue::Number(b)) => Ok(ScriptValue::Number(a + b)),
        (Sub, ScriptValue::Number(a), ScriptValue::Number(b)) => Ok(ScriptValue::Number(a - b)),
        (Mul, ScriptValue::Number(a), ScriptValue::Number(b)) => Ok(ScriptValue::Number(a * b)),
        (Div, ScriptValue::Number(a), ScriptValue::Number(b)) => {
            if b == 0.0 {
                Err("division by zero".to_string())
            } else {
                Ok(ScriptValue::Number(a / b))
            }
        }
        (Eq, a, b) => Ok(ScriptValue::Bool(a.to_display_string() == b.to_display_string())),
        (NotEq, a, b) => Ok(ScriptValue::Bool(a.to_display_string() != b.to_display_string())),
        (Lt, ScriptValue::Number(a), ScriptValue::Number(b)) => Ok(ScriptValue::Bool(a < b)),
        (LtEq, ScriptValue::Number(a), ScriptValue::Number(b)) => Ok(ScriptValue::Bool(a <= b)),
        (Gt, ScriptValue::Number(a), ScriptValue::Number(b)) => Ok(ScriptValue::Bool(a > b)),
        (GtEq, ScriptValue::Number(a), ScriptValue::Number(b)) => Ok(ScriptValue::Bool(a >= b)),
        (op, a, b) => Err(format!("cannot apply {op:?} to {a:?} and {b:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::lex;
    use super::super::parser::parse_program;
    use super::*;

    fn run(src: &str) -> ScriptValue {
        let tokens = lex(src).unwrap();
        let exprs = parse_program(&tokens).unwrap();
        let mut globals = Env::new();
        let locals = Env::new();
        eval_program(&exprs, &mut globals, &locals).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        match run("1 + 2 * 3") {
            ScriptValue::Number(n) => assert_eq!(n, 7.0),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn string_concatenation() {
        match run("\"a\" + \"b\"") {
            ScriptValue::String(s) => assert_eq!(&*s, "ab"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn if_else_selects_branch() {
        match run("if 2 > 1 { \"yes\" } else { \"no\" }") {
            ScriptValue::String(s) => assert_eq!(&*s, "yes"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn assignment_persists_across_statements() {
        match run("x = 5; x + 1") {
            ScriptValue::Number(n) => assert_eq!(n, 6.0),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn locals_shadow_globals_on_read() {
        let tokens = lex("y").unwrap();
        let exprs = parse_program(&tokens).unwrap();
        let mut globals = Env::new();
        globals.insert("y".into(), ScriptValue::Number(1.0));
        let mut locals = Env::new();
        locals.insert("y".into(), ScriptValue::Number(2.0));
        match eval_program(&exprs, &mut globals, &locals).unwrap() {
            ScriptValue::Number(n) => assert_eq!(n, 2.0),
            other => panic!("expected number, got {other:?}"),
        }
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let tokens = lex("1 / 0").unwrap();
        let exprs = parse_program(&tokens).unwrap();
        let mut globals = Env::new();
        let locals = Env::new();
        assert!(eval_program(&exprs, &mut globals, &locals).is_err());
    }
}
