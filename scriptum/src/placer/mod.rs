//! The placement stage (spec §4.6): turns the interpreter's flat token
//! stream into a `PdfDocument` tree of pages, columns, paragraphs, lines and
//! words, with concrete rectangles and offsets.
//!
//! `template` holds the per-level style/geometry factories, `tree` the
//! placed-document types they feed, and `naive` the only placer this repo
//! implements (`DESIGN.md` Open Question decision 2). Glyph measurement is
//! an injected collaborator (`Metrics`) rather than something this module
//! computes itself, so `fonts.rs` can implement it without `placer` knowing
//! anything about `fontdb`/`rusttype` — the same one-directional-edge shape
//! as `interp::Importer`/`importgraph::ImportGraph`.

pub mod naive;
pub mod template;
pub mod tree;

pub use template::Templates;
pub use tree::{PdfColumn, PdfDocument, PdfPage, PdfParagraph, PdfParagraphLine, PdfWord};

use crate::errors::ScriptumError;
use crate::progress::ProgressSink;
use crate::scanner::token::Token;
use crate::script::value::Env;
use crate::style::TextInfo;
use std::cell::RefCell;
use std::rc::Rc;

/// A single word's measurements in the style it would be drawn in (spec
/// §4.6 step 2, §4.7 "Font metrics"). `_without_space` is the word's own
/// glyph extent; `_with_space` additionally includes one leading space in
/// the same style, since a word's width on a line depends on whether it is
/// first (no leading space) or not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordMetrics {
    pub width_without_space: f32,
    pub width_with_space: f32,
    pub height_without_space: f32,
    pub height_with_space: f32,
}

/// The font collaborator's measurement contract. Implemented by
/// `fonts::FontRegistry`; kept as a trait here so `naive` can be unit-tested
/// against a fake without pulling in real font files.
pub trait Metrics {
    fn measure(&mut self, text: &str, style: &TextInfo) -> Result<WordMetrics, String>;
}

/// Runs the naive placer with the default template set (spec §4.6's
/// normative placer, US-Letter/1-inch-margin/Times-Roman-12pt baseline
/// style) and the given retry budget (SPEC_FULL §10.3, default 64).
pub fn place(
    tokens: &[Token],
    metrics: &mut dyn Metrics,
    globals: Rc<RefCell<Env>>,
    retry_budget: usize,
    progress: &dyn ProgressSink,
) -> Result<PdfDocument, ScriptumError> {
    naive::place(tokens, Templates::defaults(), metrics, globals, retry_budget, progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fixed-width/height stand-in for real font metrics: every glyph is
    /// `0.6 * font_size` wide, every space `0.3 * font_size` wide, every line
    /// `font_size * 1.0` tall. Enough to drive the line-breaking/pagination
    /// logic deterministically without `fonts::FontRegistry`.
    pub(crate) struct FixedMetrics;

    impl Metrics for FixedMetrics {
        fn measure(&mut self, text: &str, style: &TextInfo) -> Result<WordMetrics, String> {
            let size = style.font_size.unwrap_or(12.0);
            let glyph_w = 0.6 * size;
            let space_w = 0.3 * size;
            let width_without_space = text.chars().count() as f32 * glyph_w;
            Ok(WordMetrics {
                width_without_space,
                width_with_space: width_without_space + space_w,
                height_without_space: size,
                height_with_space: size,
            })
        }
    }

    #[test]
    fn empty_token_stream_yields_one_empty_document() {
        let mut metrics = FixedMetrics;
        let globals = Rc::new(RefCell::new(Env::new()));
        let doc = place(&[], &mut metrics, globals, 64, &crate::progress::NoProgress).unwrap();
        assert!(doc.pages.is_empty());
    }
}
