//! The script/comment delimiter table (§4.1 "Script delimiters").
//!
//! Longer prefixes are tried before shorter ones — sorted once, here, by
//! descending length, so the scanning loop never has to reason about
//! table order (§9 Open Questions, item 1).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimKind {
    Pass1Exec,
    Pass1Eval,
    Pass2Exec,
    Pass2Eval,
    Comment,
}

#[derive(Debug, Clone, Copy)]
pub struct Delim {
    pub start: &'static str,
    pub multiline: bool,
    pub kind: DelimKind,
    /// For one-line forms, explicit terminators in addition to line end.
    /// For multi-line forms, the only valid terminators.
    pub terminators: &'static [&'static str],
}

const RAW: &[Delim] = &[
    // --- pass-1 exec ---
    Delim { start: "\\1>", multiline: false, kind: DelimKind::Pass1Exec, terminators: &["<\\", "<1\\"] },
    Delim { start: "\\>", multiline: false, kind: DelimKind::Pass1Exec, terminators: &["<\\", "<1\\"] },
    Delim { start: "\\1->", multiline: true, kind: DelimKind::Pass1Exec, terminators: &["<-\\", "<-1\\"] },
    Delim { start: "\\->", multiline: true, kind: DelimKind::Pass1Exec, terminators: &["<-\\", "<-1\\"] },
    // --- pass-1 eval ---
    Delim { start: "\\1?>", multiline: false, kind: DelimKind::Pass1Eval, terminators: &["<\\", "<?\\", "<?1\\"] },
    Delim { start: "\\?>", multiline: false, kind: DelimKind::Pass1Eval, terminators: &["<\\", "<?\\", "<?1\\"] },
    Delim { start: "\\1?->", multiline: true, kind: DelimKind::Pass1Eval, terminators: &["<-\\", "<-?1\\"] },
    // --- pass-2 exec ---
    Delim { start: "\\2>", multiline: false, kind: DelimKind::Pass2Exec, terminators: &["<\\", "<2\\"] },
    Delim { start: "\\2->", multiline: true, kind: DelimKind::Pass2Exec, terminators: &["<-\\", "<-2\\"] },
    // --- pass-2 eval ---
    Delim { start: "\\2?>", multiline: false, kind: DelimKind::Pass2Eval, terminators: &["<\\", "<?\\", "<?2\\"] },
    Delim { start: "\\?->", multiline: true, kind: DelimKind::Pass2Eval, terminators: &["<-\\", "<-?2\\"] },
    // --- comments ---
    Delim { start: "\\%", multiline: false, kind: DelimKind::Comment, terminators: &[] },
    Delim { start: "\\#", multiline: false, kind: DelimKind::Comment, terminators: &[] },
    Delim { start: "\\%->", multiline: true, kind: DelimKind::Comment, terminators: &["<-\\", "<-%\\", "<-#\\"] },
    Delim { start: "\\#->", multiline: true, kind: DelimKind::Comment, terminators: &["<-\\", "<-%\\", "<-#\\"] },
];

pub static DELIMS: once_cell::sync::Lazy<Vec<Delim>> = once_cell::sync::Lazy::new(|| {
    let mut v = RAW.to_vec();
    v.sort_by_key(|d| std::cmp::Reverse(d.start.len()));
    v
});

/// The characters for which an odd run of preceding backslashes means
/// "emit literally" (§4.1 "Escape discipline").
pub const ESCAPABLE: &[char] = &['{', '}', '=', '\\', '(', ')', ','];

pub fn is_escapable(c: char) -> bool {
    ESCAPABLE.contains(&c)
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}
