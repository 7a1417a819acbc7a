//! Font discovery and glyph measurement (spec §4.7, §9 "Unicode/width
//! measurement", SPEC_FULL §10.6): the concrete `placer::Metrics`
//! implementor, backed by `fontdb` for locating font files on the host and
//! `rusttype` for reading their outline tables.
//!
//! The registry is process-local and write-only after a family/weight/style
//! combination is first resolved (§5 "Shared resources"): once a font file
//! is parsed it is kept around for the rest of the run, both to avoid
//! re-parsing on every word and so `draw.rs` can later register the same
//! bytes with `printpdf` without touching the filesystem again.

use crate::placer::{Metrics, WordMetrics};
use crate::style::TextInfo;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_FAMILY: &str = "Times-Roman";

/// A resolved font: its parsed outlines (for measurement) and raw bytes
/// (for `draw.rs` to hand to `printpdf::IndirectFontRef::from_bytes`).
pub(crate) struct LoadedFont {
    pub(crate) font: rusttype::Font<'static>,
    pub(crate) bytes: Arc<[u8]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

/// Discovers host fonts once at construction, then resolves and caches one
/// `LoadedFont` per distinct (family, bold, italic) combination it is asked
/// to measure with.
pub struct FontRegistry {
    db: fontdb::Database,
    loaded: HashMap<FontKey, Arc<LoadedFont>>,
}

impl FontRegistry {
    /// Walks the operating system's font directories (`fontdb::Database::
    /// load_system_fonts`), the way the reference tooling's font-discovery
    /// collaborators do, so `resolve` can match against whatever is
    /// actually installed rather than a bundled font set.
    pub fn discover() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        FontRegistry { db, loaded: HashMap::new() }
    }

    /// Maps one of the base-14 PostScript names a document is likely to ask
    /// for onto the generic family `fontdb` falls back to when no exact
    /// family match is installed, so a document written against "Times-Roman"
    /// still renders something serif-like on a system without that exact font.
    fn generic_family_for(family: &str) -> fontdb::Family<'static> {
        let lower = family.to_ascii_lowercase();
        if lower.contains("courier") || lower.contains("mono") {
            fontdb::Family::Monospace
        } else if lower.contains("times") || lower.contains("serif") || lower.contains("georgia") || lower.contains("garamond") {
            fontdb::Family::Serif
        } else {
            fontdb::Family::SansSerif
        }
    }

    fn resolve(&mut self, family: &str, bold: bool, italic: bool) -> Result<Arc<LoadedFont>, String> {
        let key = FontKey { family: family.to_ascii_lowercase(), bold, italic };
        if let Some(loaded) = self.loaded.get(&key) {
            return Ok(Arc::clone(loaded));
        }

        let weight = if bold { fontdb::Weight::BOLD } else { fontdb::Weight::NORMAL };
        let style = if italic { fontdb::Style::Italic } else { fontdb::Style::Normal };
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family), Self::generic_family_for(family)],
            weight,
            style,
            ..fontdb::Query::default()
        };

        let id = self
            .db
            .query(&query)
            .ok_or_else(|| format!("no installed font matches family \"{family}\" (bold={bold}, italic={italic})"))?;

        if let Some(face) = self.db.face(id) {
            let matched_requested_name = face.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(family));
            if !matched_requested_name {
                tracing::warn!(requested = family, substituted = ?face.families.first().map(|(n, _)| n.as_str()), "font substitution");
            }
        }

        let bytes: Arc<[u8]> = self
            .db
            .with_face_data(id, |data, _face_index| Arc::<[u8]>::from(data))
            .ok_or_else(|| format!("font file for \"{family}\" could not be read"))?;

        let font = rusttype::Font::try_from_vec(bytes.to_vec())
            .ok_or_else(|| format!("font file for \"{family}\" is not a font rusttype can parse"))?;

        let loaded = Arc::new(LoadedFont { font, bytes });
        self.loaded.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// The raw font-file bytes backing `family`/`bold`/`italic`, for
    /// `draw.rs` to register with `printpdf` the first time a page uses
    /// that combination (§4.7: "Fonts not available to the surface are
    /// registered on first use").
    pub fn bytes_for(&mut self, family: &str, bold: bool, italic: bool) -> Result<Arc<[u8]>, String> {
        self.resolve(family, bold, italic).map(|loaded| Arc::clone(&loaded.bytes))
    }
}

/// Sums glyph advance widths plus kerning, the standard `rusttype`
/// string-width recipe (no shaping — Latin/European text only, per the
/// collaborator contract's "deterministic for fixed inputs" scope).
fn text_width(font: &rusttype::Font<'static>, text: &str, scale: rusttype::Scale) -> f32 {
    let mut width = 0.0f32;
    let mut last: Option<rusttype::GlyphId> = None;
    for c in text.chars() {
        let glyph = font.glyph(c).scaled(scale);
        if let Some(last_id) = last {
            width += font.pair_kerning(scale, last_id, glyph.id());
        }
        width += glyph.h_metrics().advance_width;
        last = Some(glyph.id());
    }
    width
}

impl Metrics for FontRegistry {
    fn measure(&mut self, text: &str, style: &TextInfo) -> Result<WordMetrics, String> {
        let family = style.font_family.as_deref().unwrap_or(DEFAULT_FAMILY);
        let bold = style.bold.unwrap_or(false);
        let italic = style.italic.unwrap_or(false);
        let size = style.font_size.unwrap_or(12.0).max(0.0);

        let loaded = self.resolve(family, bold, italic)?;
        let scale = rusttype::Scale::uniform(size);

        let width_without_space = text_width(&loaded.font, text, scale);
        let space_width = text_width(&loaded.font, " ", scale);
        let v_metrics = loaded.font.v_metrics(scale);
        let height = (v_metrics.ascent - v_metrics.descent).max(0.0);

        Ok(WordMetrics {
            width_without_space,
            width_with_space: width_without_space + space_width,
            height_without_space: height,
            height_with_space: height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_family_guesses_match_base14_names() {
        assert!(matches!(FontRegistry::generic_family_for("Times-Roman"), fontdb::Family::Serif));
        assert!(matches!(FontRegistry::generic_family_for("Courier"), fontdb::Family::Monospace));
        assert!(matches!(FontRegistry::generic_family_for("Helvetica"), fontdb::Family::SansSerif));
    }

    #[test]
    fn unresolvable_family_reports_an_error_rather_than_panicking() {
        let mut registry = FontRegistry { db: fontdb::Database::new(), loaded: HashMap::new() };
        let err = registry.bytes_for("Definitely Not An Installed Font", false, false).unwrap_err();
        assert!(err.contains("Definitely Not An Installed Font"));
    }
}
