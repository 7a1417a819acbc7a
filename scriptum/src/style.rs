//! The style record (spec §3 "Style Record") and the inline markers that
//! thread ranged formatting through the post-interpretation token stream
//! (spec §3 "Inline Style Markers", §9 "Style cascade").
//!
//! Grounded on `original_source/src/placer/templates.py`'s `TextInfo`: every
//! field is `Option`-valued, `merge` overwrites only the fields the delta has
//! set, and an "undo dict" captures exactly the base values `merge` is about
//! to clobber so a later step can restore them. The original's undo dict
//! (`TextInfo.gen_undo_dict`/`undo`) calls `setattr` field by field, so it can
//! restore a field to `None` just as easily as to some value; `merge`'s
//! `None`-means-"don't touch" semantics can't express that, so the undo
//! delta is its own type, [`StyleUndo`], with one `Option<Option<T>>` per
//! field — the outer `Option` is "did the matching `MarkupStart` touch this
//! field", the inner one is the value to restore it to (which may itself be
//! `None`). Enum fields (`Alignment`,
//! `Underline`, `StrikeThrough`) reuse the built-in-constant enums of
//! [`crate::units`], which are themselves grounded on
//! `original_source/src/constants.py`'s `ALIGNMENT`/`UNDERLINE`/
//! `STRIKE_THROUGH` — a script and a style record both need to talk about
//! the same alignment/underline/strikethrough values, so there is exactly
//! one definition of each.

use crate::units::{Alignment, Rgba, StrikeThrough, Underline};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptVariant {
    Normal,
    Superscript,
    Subscript,
}

/// An all-`Option` style delta/record. `None` means "unset — inherit from
/// whatever is merged in next" (§3 "Style Record": "Any field = unset means
/// 'inherit'").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInfo {
    pub script_variant: Option<ScriptVariant>,
    pub alignment: Option<Alignment>,
    pub line_spacing: Option<f32>,

    pub font_family: Option<Arc<str>>,
    pub font_size: Option<f32>,
    pub font_color: Option<Rgba>,
    pub font_color_gray: Option<f32>,
    pub font_color_alpha: Option<f32>,
    pub highlight_color: Option<Rgba>,

    pub underline: Option<Underline>,
    pub strikethrough: Option<StrikeThrough>,

    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub splittable: Option<bool>,
}

impl TextInfo {
    pub fn empty() -> Self {
        TextInfo::default()
    }

    /// Applies `delta` over `self`, overwriting only the fields `delta` has
    /// set. Mirrors `TextInfo.merge` field for field.
    pub fn merge(&self, delta: &TextInfo) -> TextInfo {
        TextInfo {
            script_variant: delta.script_variant.or(self.script_variant),
            alignment: delta.alignment.or(self.alignment),
            line_spacing: delta.line_spacing.or(self.line_spacing),
            font_family: delta.font_family.clone().or_else(|| self.font_family.clone()),
            font_size: delta.font_size.or(self.font_size),
            font_color: delta.font_color.or(self.font_color),
            font_color_gray: delta.font_color_gray.or(self.font_color_gray),
            font_color_alpha: delta.font_color_alpha.or(self.font_color_alpha),
            highlight_color: delta.highlight_color.or(self.highlight_color),
            underline: delta.underline.or(self.underline),
            strikethrough: delta.strikethrough.or(self.strikethrough),
            bold: delta.bold.or(self.bold),
            italic: delta.italic.or(self.italic),
            splittable: delta.splittable.or(self.splittable),
        }
    }

    /// Given `self` (the active style BEFORE `delta` is merged in), returns
    /// the undo delta: for each field `delta` is about to overwrite, the
    /// exact value `self` held immediately before the merge — `Some(None)`
    /// if `self` had it unset, so restoring can clear it back out rather
    /// than leaving it as whatever `delta` set. Fields `delta` never touches
    /// are `None` ("don't touch on restore"). `base.restore(&base.diff_inverse(delta))`
    /// applied after `base.merge(delta)` restores `base` exactly. Grounded
    /// on `TextInfo.gen_undo_dict`.
    pub fn diff_inverse(&self, delta: &TextInfo) -> StyleUndo {
        StyleUndo {
            script_variant: delta.script_variant.is_some().then_some(self.script_variant),
            alignment: delta.alignment.is_some().then_some(self.alignment),
            line_spacing: delta.line_spacing.is_some().then_some(self.line_spacing),
            font_family: delta.font_family.is_some().then(|| self.font_family.clone()),
            font_size: delta.font_size.is_some().then_some(self.font_size),
            font_color: delta.font_color.is_some().then_some(self.font_color),
            font_color_gray: delta.font_color_gray.is_some().then_some(self.font_color_gray),
            font_color_alpha: delta.font_color_alpha.is_some().then_some(self.font_color_alpha),
            highlight_color: delta.highlight_color.is_some().then_some(self.highlight_color),
            underline: delta.underline.is_some().then_some(self.underline),
            strikethrough: delta.strikethrough.is_some().then_some(self.strikethrough),
            bold: delta.bold.is_some().then_some(self.bold),
            italic: delta.italic.is_some().then_some(self.italic),
            splittable: delta.splittable.is_some().then_some(self.splittable),
        }
    }

    /// Applies an undo delta produced by [`TextInfo::diff_inverse`]: fields
    /// `undo` touched are overwritten (to `None` or to a value, whichever
    /// `undo` recorded), unlike `merge` which can only ever set a field, never
    /// clear one back out.
    pub fn restore(&self, undo: &StyleUndo) -> TextInfo {
        TextInfo {
            script_variant: undo.script_variant.unwrap_or(self.script_variant),
            alignment: undo.alignment.unwrap_or(self.alignment),
            line_spacing: undo.line_spacing.unwrap_or(self.line_spacing),
            font_family: undo.font_family.clone().unwrap_or_else(|| self.font_family.clone()),
            font_size: undo.font_size.unwrap_or(self.font_size),
            font_color: undo.font_color.unwrap_or(self.font_color),
            font_color_gray: undo.font_color_gray.unwrap_or(self.font_color_gray),
            font_color_alpha: undo.font_color_alpha.unwrap_or(self.font_color_alpha),
            highlight_color: undo.highlight_color.unwrap_or(self.highlight_color),
            underline: undo.underline.unwrap_or(self.underline),
            strikethrough: undo.strikethrough.unwrap_or(self.strikethrough),
            bold: undo.bold.unwrap_or(self.bold),
            italic: undo.italic.unwrap_or(self.italic),
            splittable: undo.splittable.unwrap_or(self.splittable),
        }
    }
}

/// The undo delta for one `MarkupStart`/`MarkupEnd` pair (see `diff_inverse`):
/// one `Option<Option<T>>` per `TextInfo` field. Outer `None` means the
/// paired `MarkupStart` never touched this field, so `restore` leaves it
/// alone; `Some(v)` means it did, and `v` (itself possibly `None`) is the
/// exact value to put back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleUndo {
    pub script_variant: Option<Option<ScriptVariant>>,
    pub alignment: Option<Option<Alignment>>,
    pub line_spacing: Option<Option<f32>>,

    pub font_family: Option<Option<Arc<str>>>,
    pub font_size: Option<Option<f32>>,
    pub font_color: Option<Option<Rgba>>,
    pub font_color_gray: Option<Option<f32>>,
    pub font_color_alpha: Option<Option<f32>>,
    pub highlight_color: Option<Option<Rgba>>,

    pub underline: Option<Option<Underline>>,
    pub strikethrough: Option<Option<StrikeThrough>>,

    pub bold: Option<Option<bool>>,
    pub italic: Option<Option<bool>>,
    pub splittable: Option<Option<bool>>,
}

/// A style-bearing run of text produced by the interpreter (referenced by
/// `script::value::ScriptValue::StyledText`): a word carries the inline
/// delta that was active when it was emitted, rather than a fully resolved
/// style — resolution happens later, during placement, by cascading
/// template styles with the active inline style (§9 "Style cascade").
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText {
    pub text: Arc<str>,
    pub style: TextInfo,
}

/// Ends a ranged style change (§3 "Inline Style Markers": `MarkupEnd(undo_delta)`).
/// `undo_delta` starts empty and is filled in by the placer, the moment it
/// applies the paired `MarkupStart`'s delta to the active document style
/// (§9 "Style cascade": "at `MarkupStart` compute and store an inverse delta
/// in the paired `MarkupEnd`; at `MarkupEnd` apply the inverse") — hence the
/// interior mutability: the same `Rc<MarkupEnd>` is reached twice, once via
/// the `MarkupStart` that writes it and once, later in the stream, as the
/// token that reads it back.
#[derive(Debug, PartialEq)]
pub struct MarkupEnd {
    pub undo_delta: RefCell<StyleUndo>,
}

impl MarkupEnd {
    pub fn unresolved() -> Rc<MarkupEnd> {
        Rc::new(MarkupEnd { undo_delta: RefCell::new(StyleUndo::default()) })
    }
}

/// Begins a ranged style change (§3 "Inline Style Markers":
/// `MarkupStart(style_delta, paired_end)`). `paired_end` always points at
/// the `MarkupEnd` token matching this start; within a token stream they
/// nest LIFO (§3: "Strictly paired and nested").
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupStart {
    pub style_delta: TextInfo,
    pub paired_end: Rc<MarkupEnd>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overwrites_only_set_fields() {
        let base = TextInfo { bold: Some(true), font_size: Some(12.0), ..TextInfo::empty() };
        let delta = TextInfo { italic: Some(true), ..TextInfo::empty() };
        let merged = base.merge(&delta);
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.font_size, Some(12.0));
        assert_eq!(merged.italic, Some(true));
    }

    #[test]
    fn merge_delta_wins_over_base_on_conflict() {
        let base = TextInfo { bold: Some(false), ..TextInfo::empty() };
        let delta = TextInfo { bold: Some(true), ..TextInfo::empty() };
        assert_eq!(base.merge(&delta).bold, Some(true));
    }

    #[test]
    fn diff_inverse_then_restore_restores_base() {
        let base = TextInfo {
            bold: Some(false),
            alignment: Some(Alignment::Left),
            font_size: Some(10.0),
            ..TextInfo::empty()
        };
        let delta =
            TextInfo { bold: Some(true), alignment: Some(Alignment::Justify), ..TextInfo::empty() };

        let undo = base.diff_inverse(&delta);
        let after_start = base.merge(&delta);
        let after_end = after_start.restore(&undo);

        assert_eq!(after_end, base);
    }

    #[test]
    fn diff_inverse_is_none_for_untouched_fields() {
        let base = TextInfo { bold: Some(true), ..TextInfo::empty() };
        let delta = TextInfo { italic: Some(true), ..TextInfo::empty() };
        let undo = base.diff_inverse(&delta);
        assert_eq!(undo.bold, None);
        assert_eq!(undo.italic, None);
    }

    #[test]
    fn restoring_an_unset_field_clears_it_back_out() {
        // The case `merge`-based undo got wrong: `base.bold` is unset, the
        // delta sets it, and restoring must put it back to `None` rather
        // than leaving whatever the delta set (merge can only ever set a
        // field, never clear one).
        let base = TextInfo::empty();
        let delta = TextInfo { bold: Some(true), ..TextInfo::empty() };

        let undo = base.diff_inverse(&delta);
        assert_eq!(undo.bold, Some(None));

        let after_start = base.merge(&delta);
        assert_eq!(after_start.bold, Some(true));

        let after_end = after_start.restore(&undo);
        assert_eq!(after_end.bold, None);
        assert_eq!(after_end, base);
    }

    #[test]
    fn marker_nesting_restores_prior_active_style() {
        // Mirrors what the placer does at runtime: merge in a MarkupStart's
        // delta, stash the inverse in the paired MarkupEnd, and later
        // restore it when the MarkupEnd token is reached. `active` starts
        // with `bold` unset, as the document-level active style does.
        let mut active = TextInfo::empty();
        let end = MarkupEnd::unresolved();
        let start = MarkupStart { style_delta: TextInfo { bold: Some(true), ..TextInfo::empty() }, paired_end: Rc::clone(&end) };

        let before = active.clone();
        *start.paired_end.undo_delta.borrow_mut() = before.diff_inverse(&start.style_delta);
        active = active.merge(&start.style_delta);
        assert_eq!(active.bold, Some(true));

        active = active.restore(&end.undo_delta.borrow());
        assert_eq!(active, before);
        assert_eq!(active.bold, None);
    }

    #[test]
    fn inline_none_defers_to_template_cascade() {
        // Two-layer cascade: template_cascade_style.merge(active_inline_style).
        // A field left unset in the inline layer lets the template's value
        // show through, rather than clearing it.
        let template_cascade = TextInfo { font_size: Some(14.0), bold: Some(true), ..TextInfo::empty() };
        let active_inline = TextInfo { italic: Some(true), ..TextInfo::empty() };
        let resolved = template_cascade.merge(&active_inline);
        assert_eq!(resolved.font_size, Some(14.0));
        assert_eq!(resolved.bold, Some(true));
        assert_eq!(resolved.italic, Some(true));
    }
}
