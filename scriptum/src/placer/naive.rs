//! The naive greedy placer (spec §4.6 "Naive line-breaking algorithm",
//! "Column & page advancement", "End-callbacks"): the only placer this repo
//! implements (Open Question decision 2 in `DESIGN.md`).
//!
//! Grounded on `original_source/placer/placer.py`'s `Placer` class —
//! `new_page`/`new_column`/`new_paragraph`/`new_paragraph_line`/`new_word`
//! and the width/height fit loop in `_add_words_to_line` — restructured so
//! that a `PdfParagraph` is owned by exactly one `PdfColumn` (the original
//! lets one Python `PDFParagraph` object be referenced from two columns at
//! once when it spans a column break, which has no sound Rust ownership
//! translation; here, a paragraph that overflows a column is closed and a
//! new `PdfParagraph` is opened in the next column, re-using the same
//! cascaded style since the paragraph *template* has not advanced).

use super::template::Templates;
use super::tree::{point, PdfColumn, PdfDocument, PdfPage, PdfParagraph, PdfParagraphLine, PdfWord, Rect};
use super::Metrics;
use crate::errors::ScriptumError;
use crate::interp::{script_value_to_tokens, wrap_script_error};
use crate::position::Span;
use crate::progress::ProgressSink;
use crate::scanner::token::{Token, TokenKind};
use crate::script;
use crate::script::value::Env;
use crate::style::TextInfo;
use crate::units::Alignment;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

struct PageCursor {
    page_index: usize,
    col_rects: Vec<Rect>,
    next_rect: usize,
}

struct State<'a> {
    templates: Templates,
    metrics: &'a mut dyn Metrics,
    globals: Rc<RefCell<Env>>,
    retry_budget: usize,
    document: PdfDocument,
    active_style: TextInfo,
    page_cursor: Option<PageCursor>,
    current_column: Option<(usize, usize)>,
    current_paragraph: Option<(usize, usize, usize)>,
    current_line: Option<PdfParagraphLine>,
    current_line_available_width: f32,
    last_span: Option<Span>,
}

/// Runs the placer over `tokens` (the interpreter's fully-expanded output,
/// §4.4) and returns the placed document.
pub fn place(
    tokens: &[Token],
    templates: Templates,
    metrics: &mut dyn Metrics,
    globals: Rc<RefCell<Env>>,
    retry_budget: usize,
    progress: &dyn ProgressSink,
) -> Result<PdfDocument, ScriptumError> {
    let mut state = State {
        templates,
        metrics,
        globals,
        retry_budget,
        document: PdfDocument::default(),
        active_style: TextInfo::empty(),
        page_cursor: None,
        current_column: None,
        current_paragraph: None,
        current_line: None,
        current_line_available_width: 0.0,
        last_span: None,
    };

    let doc_spec = state.templates.advance_document();
    state.document.style = doc_spec.text_info;

    progress.set_length(tokens.len() as u64);
    let mut queue: VecDeque<Token> = tokens.iter().cloned().collect();
    while let Some(tok) = queue.pop_front() {
        progress.inc(1);
        match tok.kind {
            TokenKind::ParagraphBreak => {
                state.new_paragraph(tok.span)?;
                state.last_span = Some(tok.span);
            }
            TokenKind::Word(text) => {
                state.place_word(&text, tok.span, tok.space_before)?;
                state.last_span = Some(tok.span);
            }
            TokenKind::MarkupStart(start) => {
                let before = state.active_style.clone();
                *start.paired_end.undo_delta.borrow_mut() = before.diff_inverse(&start.style_delta);
                state.active_style = before.merge(&start.style_delta);
            }
            TokenKind::MarkupEnd(end) => {
                state.active_style = state.active_style.restore(&end.undo_delta.borrow());
            }
            TokenKind::DeferredScript(deferred) => {
                let value = {
                    let mut globals = state.globals.borrow_mut();
                    let outcome = if deferred.is_eval {
                        script::eval_str(&deferred.source, &mut globals, &deferred.locals_snapshot)
                    } else {
                        script::exec(&deferred.source, &mut globals, &deferred.locals_snapshot)
                    };
                    outcome.map_err(|detail| wrap_script_error("<deferred script>", None, deferred.span, detail))?
                };
                let expanded = script_value_to_tokens(value, deferred.span, tok.space_before);
                for (i, t) in expanded.into_iter().enumerate() {
                    queue.insert(i, t);
                }
            }
            // Structural/grouping/identifier tokens never survive interpretation
            // (§4.4 consumes them while resolving macro calls); `FileStart`,
            // `FileEnd`, and `NoneLeft` are scanner bookkeeping with no
            // placement effect.
            _ => {}
        }
    }

    state.flush_trailing_line()?;
    apply_end_callbacks(&mut state.document);
    progress.finish();
    Ok(state.document)
}

impl<'a> State<'a> {
    fn new_page(&mut self) -> Result<(), ScriptumError> {
        let spec = self.templates.advance_page();
        let style = self.templates.cascade_page();
        let inner_width = (spec.size.0 - spec.left_margin - spec.right_margin).max(0.0);
        let inner_height = (spec.size.1 - spec.top_margin - spec.bottom_margin).max(0.0);

        let mut col_rects = Vec::with_capacity(spec.rows.max(1) * spec.cols.max(1));
        if spec.rows > 0 && spec.cols > 0 {
            let col_width = inner_width / spec.cols as f32;
            let col_height = inner_height / spec.rows as f32;
            let mut x = spec.left_margin;
            let mut y = spec.top_margin;
            for i in 0..(spec.rows * spec.cols) {
                col_rects.push(Rect::new(point(x, y), super::tree::size(col_width, col_height)));
                if spec.fill_rows_first {
                    x += col_width;
                    if (i + 1) % spec.cols == 0 {
                        y += col_height;
                        x = spec.left_margin;
                    }
                } else {
                    y += col_height;
                    if (i + 1) % spec.rows == 0 {
                        x += col_width;
                        y = spec.top_margin;
                    }
                }
            }
        }

        self.document.pages.push(PdfPage { style, size: super::tree::size(spec.size.0, spec.size.1), columns: Vec::new() });
        let page_index = self.document.pages.len() - 1;
        tracing::debug!(page_index, "advanced to new page");
        self.page_cursor = Some(PageCursor { page_index, col_rects, next_rect: 0 });
        self.current_column = None;
        Ok(())
    }

    fn new_column(&mut self, span: Span) -> Result<(), ScriptumError> {
        if self.page_cursor.is_none() {
            self.new_page()?;
        }
        for _ in 0..self.retry_budget.max(1) {
            let (page_index, rect) = {
                let cursor = self.page_cursor.as_mut().expect("just ensured above");
                if cursor.next_rect < cursor.col_rects.len() {
                    let rect = cursor.col_rects[cursor.next_rect];
                    cursor.next_rect += 1;
                    (cursor.page_index, Some(rect))
                } else {
                    (cursor.page_index, None)
                }
            };
            let _ = page_index;
            match rect {
                Some(rect) => {
                    let _ = self.templates.advance_column();
                    let style = self.templates.cascade_column();
                    let page_index = self.page_cursor.as_ref().unwrap().page_index;
                    self.document.pages[page_index].columns.push(PdfColumn { style, rect, height_used: 0.0, paragraphs: Vec::new() });
                    let col_index = self.document.pages[page_index].columns.len() - 1;
                    tracing::debug!(page_index, col_index, "advanced to new column");
                    self.current_column = Some((page_index, col_index));
                    return Ok(());
                }
                None => self.new_page()?,
            }
        }
        Err(ScriptumError::Placement { span, detail: "no column available after exhausting the page template's retry budget".to_string() })
    }

    fn current_column_mut(&mut self, span: Span) -> Result<&mut PdfColumn, ScriptumError> {
        if self.current_column.is_none() {
            self.new_column(span)?;
        }
        let (p, c) = self.current_column.unwrap();
        Ok(&mut self.document.pages[p].columns[c])
    }

    fn new_paragraph(&mut self, span: Span) -> Result<(), ScriptumError> {
        self.flush_current_line_if_nonempty(span)?;
        self.current_column_mut(span)?;
        let (p, c) = self.current_column.unwrap();
        let spec = self.templates.advance_paragraph();
        let _ = spec;
        let style = self.templates.cascade_paragraph();
        self.document.pages[p].columns[c].paragraphs.push(PdfParagraph { style, lines: Vec::new() });
        let para_index = self.document.pages[p].columns[c].paragraphs.len() - 1;
        self.current_paragraph = Some((p, c, para_index));
        self.current_line = None;
        Ok(())
    }

    /// Opens a fresh `PdfParagraph` in the column the cursor just moved to,
    /// re-using the *current* paragraph cascade (the template index does
    /// not advance — this is a continuation of the same logical paragraph,
    /// not a new one, §4.6's column-advancement rule).
    fn continue_paragraph_in_new_column(&mut self) {
        let (p, c) = self.current_column.expect("new_column must have run first");
        let style = self.templates.cascade_paragraph();
        self.document.pages[p].columns[c].paragraphs.push(PdfParagraph { style, lines: Vec::new() });
        let para_index = self.document.pages[p].columns[c].paragraphs.len() - 1;
        self.current_paragraph = Some((p, c, para_index));
    }

    fn new_line(&mut self, span: Span) -> Result<(), ScriptumError> {
        if self.current_paragraph.is_none() {
            self.new_paragraph(span)?;
        }
        self.flush_current_line_if_nonempty(span)?;

        let spec = self.templates.advance_paragraph_line();
        let style = self.templates.cascade_line().merge(&self.active_style);
        let (p, c) = self.current_column.unwrap();
        let left_margin = if style.alignment == Some(Alignment::Left) { spec.left_margin } else { 0.0 };
        self.current_line_available_width = (self.document.pages[p].columns[c].rect.size.width - left_margin).max(0.0);
        self.current_line = Some(PdfParagraphLine { style, rect: None, words: Vec::new() });
        Ok(())
    }

    fn flush_current_line_if_nonempty(&mut self, span: Span) -> Result<(), ScriptumError> {
        match self.current_line.take() {
            Some(line) if !line.is_empty() => self.commit_line(line, span),
            _ => Ok(()),
        }
    }

    fn flush_trailing_line(&mut self) -> Result<(), ScriptumError> {
        let span = self
            .last_span
            .unwrap_or_else(|| Span::point(crate::position::SourcePosition::start_of_file(crate::position::FileTable::intern("<placer>"))));
        self.flush_current_line_if_nonempty(span)
    }

    /// Places the words of `line` left-to-right, applies alignment, records
    /// the column height consumed, and appends it to the current paragraph
    /// (§4.6 step 3).
    fn commit_line(&mut self, mut line: PdfParagraphLine, span: Span) -> Result<(), ScriptumError> {
        let (p, c) = self.current_column.ok_or_else(|| ScriptumError::Placement {
            span,
            detail: "attempted to place a paragraph line with no current column".to_string(),
        })?;
        let column_rect = self.document.pages[p].columns[c].rect;
        let origin = point(column_rect.origin.x, column_rect.origin.y + self.document.pages[p].columns[c].height_used);
        let line_rect = Rect::new(origin, super::tree::size(self.current_line_available_width, line.used_height()));
        line.rect = Some(line_rect);
        place_words_on_line(&mut line, line_rect);

        let height = line.used_height().max(1.0);
        let line_spacing = line.style.line_spacing.unwrap_or(1.0);
        self.document.pages[p].columns[c].height_used += height * line_spacing;

        let (pp, pc, pi) = self.current_paragraph.ok_or_else(|| ScriptumError::Placement {
            span,
            detail: "attempted to place a paragraph line with no current paragraph".to_string(),
        })?;
        debug_assert_eq!((pp, pc), (p, c));
        self.document.pages[p].columns[c].paragraphs[pi].lines.push(line);
        Ok(())
    }

    fn place_word(&mut self, text: &str, span: Span, space_before: bool) -> Result<(), ScriptumError> {
        if text.is_empty() {
            return Ok(());
        }
        if self.current_line.is_none() {
            self.new_line(span)?;
        }

        let word_style = self.templates.cascade_word().merge(&self.active_style);
        let metrics = self.metrics.measure(text, &word_style).map_err(|detail| ScriptumError::Draw { span, detail })?;
        let _ = self.templates.advance_word();

        let mut word = PdfWord {
            text: std::sync::Arc::from(text),
            style: word_style,
            space_before,
            width_without_space: metrics.width_without_space,
            width_with_space: metrics.width_with_space,
            height_without_space: metrics.height_without_space,
            height_with_space: metrics.height_with_space,
            offset: point(0.0, 0.0),
        };

        for _ in 0..self.retry_budget.max(1) {
            let line = self.current_line.as_mut().expect("ensured above");
            let is_first = line.is_empty();
            let added_width = word.width_on_line(is_first);
            let would_be_width = line.used_width() + added_width;

            if would_be_width > self.current_line_available_width && !is_first {
                let full_line = self.current_line.take().unwrap();
                self.commit_line(full_line, span)?;
                self.new_line(span)?;
                continue;
            }
            if would_be_width > self.current_line_available_width && is_first {
                return Err(ScriptumError::Placement {
                    span,
                    detail: format!("word \"{text}\" does not fit on any line even alone — the column is narrower than the word"),
                });
            }

            let added_height = word.height_with_space.max(word.height_without_space);
            let (p, c) = self.current_column.expect("new_line ensures a current column");
            let remaining = self.document.pages[p].columns[c].remaining_height();
            if added_height > remaining {
                if is_first {
                    // Even a brand-new, empty line in the current column is
                    // too short for this word; advancing columns retries
                    // against a fresh column's full height, bounded by the
                    // retry budget (§4.6 "Failure semantics").
                    self.new_column(span)?;
                    self.continue_paragraph_in_new_column();
                    self.new_line(span)?;
                } else {
                    let full_line = self.current_line.take().unwrap();
                    self.commit_line(full_line, span)?;
                    self.new_column(span)?;
                    self.continue_paragraph_in_new_column();
                    self.new_line(span)?;
                }
                continue;
            }

            line.words.push(word);
            return Ok(());
        }

        Err(ScriptumError::Placement { span, detail: format!("could not place word \"{text}\" within the placement retry budget") })
    }
}

/// Places words left-to-right from `line_rect`'s origin, then nudges them
/// per alignment (§4.6 step 3). Mirrors
/// `original_source/placer/placer.py`'s `_place_words_on_line`.
fn place_words_on_line(line: &mut PdfParagraphLine, line_rect: Rect) {
    let mut x = line_rect.origin.x;
    let y = line_rect.origin.y;
    for (i, word) in line.words.iter_mut().enumerate() {
        word.offset = point(x, y);
        x += word.width_on_line(i == 0);
    }

    let alignment = line.style.alignment.unwrap_or(Alignment::Left);
    let used_width = line.used_width();
    let slack = (line_rect.size.width - used_width).max(0.0);

    match alignment {
        Alignment::Left => {}
        Alignment::Center => nudge_all(line, slack / 2.0),
        Alignment::Right => nudge_all(line, slack),
        Alignment::Justify => justify_line(line, slack),
    }
}

fn nudge_all(line: &mut PdfParagraphLine, amount: f32) {
    for word in &mut line.words {
        word.offset.x += amount;
    }
}

/// Distributes `slack` equally across inter-word gaps, at 1/1000pt integer
/// precision, with the remainder folded entirely into the last gap so the
/// line's total placed width exactly matches its available width in every
/// case (`DESIGN.md` Open Question decision 3).
fn justify_line(line: &mut PdfParagraphLine, slack: f32) {
    let gap_count = line.words.iter().enumerate().filter(|(i, w)| *i != 0 && w.space_before).count();
    if gap_count == 0 {
        return;
    }

    let slack_milli = (slack * 1000.0).round() as i64;
    let per_gap_milli = slack_milli / gap_count as i64;
    let remainder_milli = slack_milli - per_gap_milli * gap_count as i64;

    let mut gap_index = 0i64;
    for (i, word) in line.words.iter_mut().enumerate() {
        if i != 0 && word.space_before {
            gap_index += 1;
            let mut nudge_milli = per_gap_milli * gap_index;
            if gap_index as usize == gap_count {
                nudge_milli += remainder_milli;
            }
            word.offset.x += nudge_milli as f32 / 1000.0;
        } else if gap_index > 0 {
            let mut nudge_milli = per_gap_milli * gap_index;
            if gap_index as usize == gap_count {
                nudge_milli += remainder_milli;
            }
            word.offset.x += nudge_milli as f32 / 1000.0;
        }
    }
}

/// After all tokens are placed, walks the tree bottom-up in document order
/// applying registered end-callbacks (§4.6 "End-callbacks"). The only
/// end-callback this repo implements is the one the reference templates
/// register unconditionally — a justified paragraph's last line realigns to
/// left (`original_source`'s `PDFParagraphTemplate`'s `spacing_callback`) —
/// since nothing in this repo's scripting surface exposes a way to register
/// further callbacks (§9, Non-goal-adjacent).
fn apply_end_callbacks(document: &mut PdfDocument) {
    for page in &mut document.pages {
        for column in &mut page.columns {
            for paragraph in &mut column.paragraphs {
                if let Some(last_line) = paragraph.lines.last_mut() {
                    if last_line.style.alignment == Some(Alignment::Justify) {
                        realign_left(last_line);
                    }
                }
            }
        }
    }
}

fn realign_left(line: &mut PdfParagraphLine) {
    let Some(rect) = line.rect else { return };
    line.style.alignment = Some(Alignment::Left);
    let mut x = rect.origin.x;
    for (i, word) in line.words.iter_mut().enumerate() {
        word.offset = point(x, rect.origin.y);
        x += word.width_on_line(i == 0);
    }
}
