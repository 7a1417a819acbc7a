//! Lexer for the sandboxed expression language (SPEC_FULL §10.2).
//!
//! Deliberately tiny and hand-rolled, in the same style as the document
//! scanner (`crate::scanner`) rather than reusing it: the grammars don't
//! share a token alphabet (no braces-as-grouping, no script delimiters).

#[derive(Debug, Clone, PartialEq)]
pub enum TokKind {
    Number(f64),
    String(String),
    Ident(String),
    True,
    False,
    Nil,
    If,
    Else,

    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tok {
    pub kind: TokKind,
    pub offset: usize,
}

pub fn lex(src: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0;
    let mut out = Vec::new();

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let mut j = i;
            while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
                j += 1;
            }
            let text: String = chars[i..j].iter().collect();
            let n: f64 = text.parse().map_err(|_| format!("invalid number literal `{text}`"))?;
            out.push(Tok { kind: TokKind::Number(n), offset: start });
            i = j;
            continue;
        }

        if c == '"' || c == '\'' {
            let quote = c;
            let mut j = i + 1;
            let mut s = String::new();
            loop {
                if j >= chars.len() {
                    return Err("unterminated string literal".to_string());
                }
                if chars[j] == quote {
                    j += 1;
                    break;
                }
                if chars[j] == '\\' && j + 1 < chars.len() {
                    s.push(chars[j + 1]);
                    j += 2;
                } else {
                    s.push(chars[j]);
                    j += 1;
                }
            }
            out.push(Tok { kind: TokKind::String(s), offset: start });
            i = j;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut j = i;
            while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                j += 1;
            }
            let word: String = chars[i..j].iter().collect();
            let kind = match word.as_str() {
                "true" => TokKind::True,
                "false" => TokKind::False,
                "nil" => TokKind::Nil,
                "if" => TokKind::If,
                "else" => TokKind::Else,
                _ => TokKind::Ident(word),
            };
            out.push(Tok { kind, offset: start });
            i = j;
            continue;
        }

        let next = chars.get(i + 1).copied();

        let (kind, len) = match (c, next) {
            ('=', Some('=')) => (TokKind::EqEq, 2),
            ('!', Some('=')) => (TokKind::NotEq, 2),
            ('<', Some('=')) => (TokKind::LtEq, 2),
            ('>', Some('=')) => (TokKind::GtEq, 2),
            _ => match c {
                '+' => (TokKind::Plus, 1),
                '-' => (TokKind::Minus, 1),
                '*' => (TokKind::Star, 1),
                '/' => (TokKind::Slash, 1),
                '<' => (TokKind::Lt, 1),
                '>' => (TokKind::Gt, 1),
                '=' => (TokKind::Eq, 1),
                '(' => (TokKind::LParen, 1),
                ')' => (TokKind::RParen, 1),
                '{' => (TokKind::LBrace, 1),
                '}' => (TokKind::RBrace, 1),
                ';' => (TokKind::Semi, 1),
                other => return Err(format!("unexpected character `{other}` in script")),
            },
        };
        out.push(Tok { kind, offset: start });
        i += len;
    }

    out.push(Tok { kind: TokKind::Eof, offset: chars.len() });
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_arithmetic_and_comparison() {
        let toks = lex("1 + 2 * 3 >= x").unwrap();
        let kinds: Vec<_> = toks.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokKind::Number(1.0),
                TokKind::Plus,
                TokKind::Number(2.0),
                TokKind::Star,
                TokKind::Number(3.0),
                TokKind::GtEq,
                TokKind::Ident("x".to_string()),
                TokKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_string_with_escape() {
        let toks = lex(r#""a\"b""#).unwrap();
        assert_eq!(toks[0].kind, TokKind::String("a\"b".to_string()));
    }
}
