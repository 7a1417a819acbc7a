//! The placed-document tree (spec §3 "PdfDocument" family, §9 "Cyclic object
//! references"): `PdfDocument` owning `PdfPage`s owning `PdfColumn`s owning
//! `PdfParagraph`s owning `PdfParagraphLine`s owning `PdfWord`s.
//!
//! `original_source/placer/templates.py`'s `PDFComponent` gives every placed
//! node a `_parent` back-reference, which in a reference-counted language is
//! a harmless cycle the GC collects. Rust has no such GC, and an
//! `Rc`/`Weak` pair per node buys nothing here since nothing ever needs to
//! walk *up* the tree at draw time — `draw.rs` walks top-down, and the one
//! place placement logic needs "where am I" (`naive::Cursor`) already tracks
//! that as plain indices into the `Vec`s below, not as a field on the nodes
//! themselves.

use crate::style::TextInfo;
use std::sync::Arc;

/// The single coordinate space every placed rectangle and offset lives in:
/// PDF points, y-down from the page's top-left inner corner. A marker type
/// rather than a bare `f32` pair so a page rectangle can never be mixed up
/// with, say, a font-design-unit length if one is ever added later.
pub struct Pts;

pub type Point = euclid::Point2D<f32, Pts>;
pub type Size = euclid::Size2D<f32, Pts>;
pub type Rect = euclid::Rect<f32, Pts>;

pub fn point(x: f32, y: f32) -> Point {
    Point::new(x, y)
}

pub fn size(w: f32, h: f32) -> Size {
    Size::new(w, h)
}

/// One placed word (spec §3 "PdfWord").
#[derive(Debug, Clone)]
pub struct PdfWord {
    pub text: Arc<str>,
    pub style: TextInfo,
    pub space_before: bool,
    /// Measurements from the font collaborator (§4.6 step 2), cached on the
    /// word since the line-fit loop in `naive` re-reads them on every retry.
    pub width_without_space: f32,
    pub width_with_space: f32,
    pub height_without_space: f32,
    pub height_with_space: f32,
    /// Final offset, set once the line closes (`naive::place_words_on_line`).
    pub offset: Point,
}

impl PdfWord {
    /// The width this word actually contributes to a line: with its leading
    /// space if it has one and it is not the line's first word.
    pub fn width_on_line(&self, is_first_on_line: bool) -> f32 {
        if !is_first_on_line && self.space_before {
            self.width_with_space
        } else {
            self.width_without_space
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfParagraphLine {
    pub style: TextInfo,
    pub rect: Option<Rect>,
    pub words: Vec<PdfWord>,
}

impl PdfParagraphLine {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The width the words currently on this line occupy, honoring that the
    /// first word never carries a leading space (§4.6 step 2).
    pub fn used_width(&self) -> f32 {
        self.words.iter().enumerate().map(|(i, w)| w.width_on_line(i == 0)).sum()
    }

    pub fn used_height(&self) -> f32 {
        self.words.iter().map(|w| w.height_with_space.max(w.height_without_space)).fold(0.0, f32::max)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfParagraph {
    pub style: TextInfo,
    pub lines: Vec<PdfParagraphLine>,
}

#[derive(Debug, Clone, Default)]
pub struct PdfColumn {
    pub style: TextInfo,
    pub rect: Rect,
    /// How much of `rect`'s height has been consumed by already-placed lines.
    pub height_used: f32,
    pub paragraphs: Vec<PdfParagraph>,
}

impl PdfColumn {
    pub fn remaining_height(&self) -> f32 {
        (self.rect.size.height - self.height_used).max(0.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfPage {
    pub style: TextInfo,
    pub size: Size,
    pub columns: Vec<PdfColumn>,
}

#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    pub style: TextInfo,
    pub pages: Vec<PdfPage>,
}
