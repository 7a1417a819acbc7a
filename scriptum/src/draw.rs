//! PDF serialization (spec §4.7 "Drawing"): walks the placed tree and emits
//! PDF bytes through `printpdf`.
//!
//! Mirrors victor's `pdf::convert` `InProgressDoc`/`InProgressPage` staging
//! split — one running document-level cache (here, registered fonts), one
//! page/layer committed at a time — retargeted from victor's hand-rolled PDF
//! object graph onto `printpdf`'s own page/layer/font API, and from CSS
//! boxes/text runs onto this crate's placed `PdfWord`s. Only the four
//! operations §4.7 names are exercised: begin page, set font/color, draw
//! text at an anchor, end page. `TextInfo`'s `underline`/`strikethrough`/
//! `highlight_color` fields are tracked all the way through placement but
//! are not drawn — line-decoration painting is not one of the named
//! collaborator operations.

use crate::errors::ScriptumError;
use crate::fonts::FontRegistry;
use crate::placer::tree::{PdfDocument as PlacedDocument, PdfPage, PdfParagraphLine};
use crate::position::{FileTable, SourcePosition, Span};
use crate::style::TextInfo;
use crate::units::Rgba;
use printpdf::{Color, Greyscale, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, PdfPageIndex, PdfLayerIndex, Rgb};
use std::collections::HashMap;
use std::io::Cursor;

const PT_TO_MM: f32 = 25.4 / 72.0;

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * PT_TO_MM)
}

/// Draw-time errors have no source position to anchor to (§7's taxonomy
/// ties `DrawError` to "unknown font" / "I/O failure", neither word- or
/// line-specific); a synthetic span keeps the §7 report shape uniform
/// rather than special-casing draw errors in the CLI.
fn synthetic_span() -> Span {
    Span::point(SourcePosition::start_of_file(FileTable::intern("<draw>")))
}

/// One `IndirectFontRef` per (family, bold, italic) already registered into
/// the current `printpdf` document (§4.7: "registered on first use").
struct FontCache {
    refs: HashMap<(String, bool, bool), IndirectFontRef>,
}

impl FontCache {
    fn new() -> Self {
        FontCache { refs: HashMap::new() }
    }

    fn get_or_register(
        &mut self,
        doc: &PdfDocumentReference,
        fonts: &mut FontRegistry,
        family: &str,
        bold: bool,
        italic: bool,
    ) -> Result<IndirectFontRef, ScriptumError> {
        let key = (family.to_ascii_lowercase(), bold, italic);
        if let Some(font_ref) = self.refs.get(&key) {
            return Ok(font_ref.clone());
        }
        let bytes = fonts
            .bytes_for(family, bold, italic)
            .map_err(|detail| ScriptumError::Draw { span: synthetic_span(), detail })?;
        let font_ref = doc
            .add_external_font(Cursor::new(&*bytes))
            .map_err(|e| ScriptumError::Draw { span: synthetic_span(), detail: format!("failed to register font \"{family}\": {e}") })?;
        self.refs.insert(key, font_ref.clone());
        Ok(font_ref)
    }
}

fn color_for(style: &TextInfo) -> Color {
    if let Some(gray) = style.font_color_gray {
        return Color::Greyscale(Greyscale::new(gray, None));
    }
    let Rgba(r, g, b, _) = style.font_color.unwrap_or(Rgba::opaque(0.0, 0.0, 0.0));
    Color::Rgb(Rgb::new(r, g, b, None))
}

/// Renders the full placed document to PDF bytes. Per §4.7, text is
/// anchored at its baseline; this repo approximates the baseline as 80% of
/// a word's measured height below its top offset, since `placer::tree`
/// stores only the combined ascent+descent extent rather than ascent alone.
pub fn draw(document: &PlacedDocument, fonts: &mut FontRegistry) -> Result<Vec<u8>, ScriptumError> {
    let mut font_cache = FontCache::new();

    let first_size = document.pages.first().map(|p| p.size).unwrap_or(crate::placer::tree::size(0.0, 0.0));
    let (doc, page_id, layer_id) = PdfDocument::new("scriptum document", pt_to_mm(first_size.width), pt_to_mm(first_size.height), "content");

    if let Some(first_page) = document.pages.first() {
        draw_page(&doc, page_id, layer_id, first_page, fonts, &mut font_cache)?;
        for page in &document.pages[1..] {
            let (page_id, layer_id) = doc.add_page(pt_to_mm(page.size.width), pt_to_mm(page.size.height), "content");
            draw_page(&doc, page_id, layer_id, page, fonts, &mut font_cache)?;
        }
    }

    let mut bytes = Vec::new();
    doc.save(&mut std::io::BufWriter::new(Cursor::new(&mut bytes)))
        .map_err(|e| ScriptumError::Draw { span: synthetic_span(), detail: format!("failed to serialize PDF: {e}") })?;
    Ok(bytes)
}

fn draw_page(
    doc: &PdfDocumentReference,
    page_id: PdfPageIndex,
    layer_id: PdfLayerIndex,
    page: &PdfPage,
    fonts: &mut FontRegistry,
    font_cache: &mut FontCache,
) -> Result<(), ScriptumError> {
    let layer = doc.get_page(page_id).get_layer(layer_id);
    for column in &page.columns {
        for paragraph in &column.paragraphs {
            for line in &paragraph.lines {
                draw_line(doc, &layer, line, page.size.height, fonts, font_cache)?;
            }
        }
    }
    Ok(())
}

fn draw_line(
    doc: &PdfDocumentReference,
    layer: &PdfLayerReference,
    line: &PdfParagraphLine,
    page_height: f32,
    fonts: &mut FontRegistry,
    font_cache: &mut FontCache,
) -> Result<(), ScriptumError> {
    for word in &line.words {
        let family = word.style.font_family.as_deref().unwrap_or("Times-Roman");
        let bold = word.style.bold.unwrap_or(false);
        let italic = word.style.italic.unwrap_or(false);
        let size = word.style.font_size.unwrap_or(12.0);

        let font_ref = font_cache.get_or_register(doc, fonts, family, bold, italic)?;
        layer.set_fill_color(color_for(&word.style));

        let ascent = word.height_without_space.max(word.height_with_space) * 0.8;
        let x = word.offset.x;
        let y = page_height - word.offset.y - ascent;
        layer.use_text(word.text.as_ref(), size as f64, pt_to_mm(x), pt_to_mm(y), &font_ref);
    }
    Ok(())
}
