//! Template hierarchy (spec §4.6 "Template hierarchy"): one factory per
//! placed-tree level, each able to vend a one-use, indexed-concrete,
//! cycled-repeating, or default instance of the spec it is parameterized
//! over.
//!
//! Grounded on `original_source/placer/templates.py`'s `Template` base class
//! and its six subclasses (`PDFDocumentTemplate` … `PDFWordTemplate`): the
//! one-use/concretes/repeating/default selection order, the
//! advance-then-reset-children protocol, and which levels reset their child
//! on advance (every level except the column level, so paragraphs keep
//! flowing across a page's columns) are all taken straight from there.

use crate::style::TextInfo;
use std::collections::VecDeque;

/// One factory slot: a FIFO of one-use specs, an index-addressed list of
/// concretes, a cycled list of repeating specs, and a default used once all
/// three are exhausted for the current index.
#[derive(Debug, Clone)]
pub struct Template<T> {
    one_use: VecDeque<T>,
    concretes: Vec<T>,
    repeating: Vec<T>,
    default: T,
    state_index: i64,
}

impl<T: Clone> Template<T> {
    pub fn new(default: T) -> Self {
        Template { one_use: VecDeque::new(), concretes: Vec::new(), repeating: Vec::new(), default, state_index: -1 }
    }

    pub fn add_one_use(&mut self, spec: T) {
        self.one_use.push_back(spec);
    }

    pub fn add_concrete(&mut self, spec: T) {
        self.concretes.push(spec);
    }

    pub fn add_repeating(&mut self, spec: T) {
        self.repeating.push(spec);
    }

    pub fn set_default(&mut self, spec: T) {
        self.default = spec;
    }

    /// Returns what `advance` would produce, without consuming a one-use
    /// slot or moving the index (§4.6: style cascades re-derive from the
    /// *current*, not yet advanced, state).
    pub fn peek(&self) -> &T {
        if let Some(front) = self.one_use.front() {
            return front;
        }
        self.at_index(self.state_index)
    }

    /// Advances the index and returns the newly-current instance, popping a
    /// one-use slot if one is queued.
    pub fn advance(&mut self) -> T {
        if let Some(front) = self.one_use.pop_front() {
            self.state_index += 1;
            return front;
        }
        self.state_index += 1;
        self.at_index(self.state_index).clone()
    }

    pub fn reset(&mut self) {
        self.state_index = -1;
    }

    fn at_index(&self, i: i64) -> &T {
        if i >= 0 && (i as usize) < self.concretes.len() {
            return &self.concretes[i as usize];
        }
        if !self.repeating.is_empty() {
            let rep_i = (i.rem_euclid(self.repeating.len() as i64)) as usize;
            return &self.repeating[rep_i];
        }
        &self.default
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentSpec {
    pub text_info: TextInfo,
}

#[derive(Debug, Clone, Default)]
pub struct PageSpec {
    pub text_info: TextInfo,
    pub size: (f32, f32),
    pub left_margin: f32,
    pub right_margin: f32,
    pub top_margin: f32,
    pub bottom_margin: f32,
    pub rows: usize,
    pub cols: usize,
    pub fill_rows_first: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnSpec {
    pub text_info: TextInfo,
}

#[derive(Debug, Clone, Default)]
pub struct ParagraphSpec {
    pub text_info: TextInfo,
}

#[derive(Debug, Clone, Default)]
pub struct ParagraphLineSpec {
    pub text_info: TextInfo,
    pub left_margin: f32,
}

#[derive(Debug, Clone, Default)]
pub struct WordSpec {
    pub text_info: TextInfo,
}

/// The document → page → column → paragraph → paragraph-line → word chain
/// of factories, plus the reset-cascade rules `original_source`'s `next()`
/// applies on each level's advance (§4.6: "on advance, child levels may
/// reset … column advancement does *not* reset paragraph").
pub struct Templates {
    pub document: Template<DocumentSpec>,
    pub page: Template<PageSpec>,
    pub column: Template<ColumnSpec>,
    pub paragraph: Template<ParagraphSpec>,
    pub paragraph_line: Template<ParagraphLineSpec>,
    pub word: Template<WordSpec>,
}

impl Templates {
    /// A single US-Letter page, one column, 12pt Times-Roman-equivalent
    /// default style — mirrors `PDFDocumentTemplate`'s built-in defaults,
    /// the first paragraph-line of every paragraph getting a half-inch
    /// first-line indent (`PDFParagraphLineTemplate`'s `tab_callback`,
    /// applied here as a concrete rather than an on-creation callback since
    /// this repo has no user-facing callback registration surface, §9).
    pub fn defaults() -> Templates {
        let mut document_style = TextInfo::empty();
        document_style.alignment = Some(crate::units::Alignment::Left);
        document_style.font_family = Some(std::sync::Arc::from("Times-Roman"));
        document_style.font_size = Some(12.0);
        document_style.font_color = Some(crate::units::Rgba::opaque(0.0, 0.0, 0.0));
        document_style.font_color_alpha = Some(1.0);
        document_style.underline = Some(crate::units::Underline::None);
        document_style.strikethrough = Some(crate::units::StrikeThrough::None);
        document_style.bold = Some(false);
        document_style.italic = Some(false);
        document_style.splittable = Some(false);
        document_style.line_spacing = Some(1.2);

        let page = Template::new(PageSpec {
            text_info: TextInfo::empty(),
            size: crate::units::LETTER,
            left_margin: crate::units::INCH,
            right_margin: crate::units::INCH,
            top_margin: crate::units::INCH,
            bottom_margin: crate::units::INCH,
            rows: 1,
            cols: 1,
            fill_rows_first: false,
        });

        let mut paragraph_line = Template::new(ParagraphLineSpec::default());
        let mut first_line = ParagraphLineSpec::default();
        first_line.left_margin = 0.5 * crate::units::INCH;
        paragraph_line.add_concrete(first_line);

        Templates {
            document: Template::new(DocumentSpec { text_info: document_style }),
            page,
            column: Template::new(ColumnSpec::default()),
            paragraph: Template::new(ParagraphSpec::default()),
            paragraph_line,
            word: Template::new(WordSpec::default()),
        }
    }

    pub fn cascade_page(&self) -> TextInfo {
        TextInfo::empty().merge(&self.document.peek().text_info).merge(&self.page.peek().text_info)
    }

    pub fn cascade_column(&self) -> TextInfo {
        self.cascade_page().merge(&self.column.peek().text_info)
    }

    pub fn cascade_paragraph(&self) -> TextInfo {
        self.cascade_column().merge(&self.paragraph.peek().text_info)
    }

    pub fn cascade_line(&self) -> TextInfo {
        self.cascade_paragraph().merge(&self.paragraph_line.peek().text_info)
    }

    pub fn cascade_word(&self) -> TextInfo {
        self.cascade_line().merge(&self.word.peek().text_info)
    }

    pub fn advance_document(&mut self) -> DocumentSpec {
        let spec = self.document.advance();
        self.reset_from_page();
        spec
    }

    pub fn advance_page(&mut self) -> PageSpec {
        let spec = self.page.advance();
        self.reset_from_column();
        spec
    }

    /// Column advancement does *not* reset the paragraph level — a
    /// paragraph that runs out of column keeps the same paragraph template
    /// state when it resumes in the next column (§4.6).
    pub fn advance_column(&mut self) -> ColumnSpec {
        self.column.advance()
    }

    pub fn advance_paragraph(&mut self) -> ParagraphSpec {
        let spec = self.paragraph.advance();
        self.paragraph_line.reset();
        self.word.reset();
        spec
    }

    pub fn advance_paragraph_line(&mut self) -> ParagraphLineSpec {
        let spec = self.paragraph_line.advance();
        self.word.reset();
        spec
    }

    pub fn advance_word(&mut self) -> WordSpec {
        self.word.advance()
    }

    fn reset_from_column(&mut self) {
        self.column.reset();
        self.paragraph.reset();
        self.paragraph_line.reset();
        self.word.reset();
    }

    fn reset_from_page(&mut self) {
        self.page.reset();
        self.reset_from_column();
    }
}
