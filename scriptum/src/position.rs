//! Source positions shared by every stage of the pipeline.
//!
//! A `SourcePosition` is attached to every token and tree node so that
//! diagnostics (§7 of the spec) can always point back at exact source bytes,
//! even after a value has been carried across macro expansion or an import.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Identifies one source file within a compilation run.
///
/// Interned rather than stored as a path on every token: positions are by
/// far the most common small value in the pipeline, and a path string would
/// make `Token` and tree nodes considerably larger for no benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u32);

/// Process-wide table mapping `FileId` back to the path it was opened from.
///
/// Single-threaded per spec §5, but kept behind a `Mutex` rather than a
/// `RefCell` so the table can be a `static` without `thread_local!` noise.
pub struct FileTable {
    paths: Mutex<Vec<PathBuf>>,
}

static FILE_TABLE: once_cell::sync::Lazy<FileTable> = once_cell::sync::Lazy::new(FileTable::new);

impl FileTable {
    fn new() -> Self {
        FileTable { paths: Mutex::new(Vec::new()) }
    }

    /// Interns `path`, returning its `FileId`. Repeated interning of the
    /// same absolute path is *not* deduplicated here — the import graph
    /// (§4.5) is responsible for resolving to one absolute path before
    /// calling this, since two different strings that happen to denote the
    /// same file are a caller-level concern, not a storage concern.
    pub fn intern(path: impl Into<PathBuf>) -> FileId {
        let mut paths = FILE_TABLE.paths.lock().unwrap();
        let id = paths.len() as u32;
        paths.push(path.into());
        FileId(id)
    }

    pub fn path(id: FileId) -> PathBuf {
        FILE_TABLE.paths.lock().unwrap()[id.0 as usize].clone()
    }

    pub fn display_name(id: FileId) -> String {
        Self::path(id).display().to_string()
    }
}

/// `(byte_index, line, column, file_id)` — immutable once created.
///
/// `line` and `column` are both 1-based, matching the "line N, column N"
/// phrasing used in the diagnostics renderer (§7). `column` resets to 1 on
/// any end-of-line character; `byte_index` is monotonic non-decreasing
/// within one file (the scanner's *position monotonicity* invariant, §8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub byte_index: usize,
    pub line: u32,
    pub column: u32,
    pub file: FileId,
}

impl SourcePosition {
    pub fn start_of_file(file: FileId) -> Self {
        SourcePosition { byte_index: 0, line: 1, column: 1, file }
    }

    pub fn file_path(&self) -> PathBuf {
        FileTable::path(self.file)
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", FileTable::display_name(self.file), self.line, self.column)
    }
}

/// A half-open `[start, end)` range of source positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl Span {
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Span { start, end }
    }

    pub fn point(pos: SourcePosition) -> Self {
        Span { start: pos, end: pos }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Tracks line/column/byte advancement over a stream of Unicode scalar
/// values, recognizing `\r\n`, `\n`, `\r`, and `\f` as line terminators
/// (§6 "Source-file format").
#[derive(Debug, Clone)]
pub struct Cursor {
    file: FileId,
    byte_index: usize,
    line: u32,
    column: u32,
    /// Set after consuming `\r`, so a following `\n` is treated as part of
    /// the same terminator instead of starting a second line.
    pending_crlf: bool,
}

impl Cursor {
    pub fn new(file: FileId) -> Self {
        Cursor { file, byte_index: 0, line: 1, column: 1, pending_crlf: false }
    }

    pub fn position(&self) -> SourcePosition {
        SourcePosition { byte_index: self.byte_index, line: self.line, column: self.column, file: self.file }
    }

    /// Advances the cursor past one Unicode scalar value `c`, which is
    /// `byte_len` bytes wide in the source encoding.
    pub fn advance(&mut self, c: char, byte_len: usize) {
        if self.pending_crlf {
            self.pending_crlf = false;
            if c == '\n' {
                self.byte_index += byte_len;
                return;
            }
        }
        match c {
            '\r' => {
                self.pending_crlf = true;
                self.line += 1;
                self.column = 1;
            }
            '\n' | '\u{000C}' => {
                self.line += 1;
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
        self.byte_index += byte_len;
    }
}

pub fn is_line_terminator(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{000C}')
}

pub fn read_source_text(path: &Path, bytes: &[u8]) -> Result<String, crate::errors::ScriptumError> {
    decode_source_bytes(bytes).ok_or_else(|| crate::errors::ScriptumError::Import {
        span: Span::point(SourcePosition::start_of_file(FileTable::intern(path.to_path_buf()))),
        detail: "could not decode source as UTF-8, UTF-16, or UTF-32".to_string(),
    })
}

/// Decodes `bytes` as UTF-8, falling back to UTF-16 or UTF-32 if a byte
/// order mark is present (§6 "Source-file format").
fn decode_source_bytes(bytes: &[u8]) -> Option<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return std::str::from_utf8(rest).ok().map(str::to_owned);
    }
    if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
        return decode_utf32(&bytes[4..], u32::from_le_bytes);
    }
    if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
        return decode_utf32(&bytes[4..], u32::from_be_bytes);
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return decode_utf16(&bytes[2..], u16::from_le_bytes);
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return decode_utf16(&bytes[2..], u16::from_be_bytes);
    }
    std::str::from_utf8(bytes).ok().map(str::to_owned).or_else(|| decode_utf16(bytes, u16::from_le_bytes))
}

fn decode_utf16(bytes: &[u8], from_bytes: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| from_bytes([c[0], c[1]])).collect();
    String::from_utf16(&units).ok()
}

fn decode_utf32(bytes: &[u8], from_bytes: fn([u8; 4]) -> u32) -> Option<String> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    bytes
        .chunks_exact(4)
        .map(|c| char::from_u32(from_bytes([c[0], c[1], c[2], c[3]])))
        .collect::<Option<String>>()
}
