//! Font handling.

mod mono;
mod otf;

pub use self::mono::MonoFont;
pub use self::otf::OpenTypeFont;

use std::fmt::Debug;
use std::sync::Arc;

use icu_properties::GeneralCategory;
use rustc_hash::FxHashMap;
use unicode_script::{Script, UnicodeScript};

use crate::layout::Abs;

/// A per-glyph position adjustment produced by shaping.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct GlyphAdjustment {
    /// Horizontal placement offset.
    pub x_placement: Abs,
    /// Vertical placement offset.
    pub y_placement: Abs,
    /// Change of the horizontal advance.
    pub x_advance: Abs,
    /// Change of the vertical advance.
    pub y_advance: Abs,
}

impl GlyphAdjustment {
    /// Whether this adjustment changes anything.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// A sized font as seen by the layout engine.
///
/// Widths are absolute: the font size is part of the font value. Complex
/// script support is optional; fonts that neither substitute nor position
/// glyphs are laid out character by character with pairwise kerning.
pub trait Font: Debug + Send + Sync {
    /// A human-readable name, used in diagnostics.
    fn name(&self) -> &str;

    /// Whether the font has a glyph for the character.
    fn has_char(&self, c: char) -> bool;

    /// The advance width of the character.
    fn char_width(&self, c: char) -> Abs;

    /// Whether the font has pairwise kerning information.
    fn has_kerning(&self) -> bool {
        false
    }

    /// The kerning adjustment between two adjacent characters.
    fn kerning(&self, _left: char, _right: char) -> Abs {
        Abs::zero()
    }

    /// Whether the font substitutes glyphs (ligatures, contextual forms).
    fn performs_substitution(&self) -> bool {
        false
    }

    /// Whether the font positions glyphs beyond their advances.
    fn performs_positioning(&self) -> bool {
        false
    }

    /// Whether the font's positioning covers a feature such as `kern` for a
    /// script and language.
    fn has_positioning_feature(&self, _script: &str, _lang: &str, _feature: &str) -> bool {
        false
    }

    /// Substitute the characters of a word, expressed again as characters.
    fn substitute(&self, text: &[char], _script: &str, _lang: &str) -> Vec<char> {
        text.to_vec()
    }

    /// Compute position adjustments for already substituted characters, one
    /// per character.
    fn position(
        &self,
        _text: &[char],
        _script: &str,
        _lang: &str,
    ) -> Option<Vec<GlyphAdjustment>> {
        None
    }

    /// Move combining marks ahead of the base they apply to, permuting the
    /// adjustments in lockstep.
    fn reorder_combining_marks(
        &self,
        text: &[char],
        adjustments: Option<&mut Vec<GlyphAdjustment>>,
        _script: &str,
        _lang: &str,
    ) -> Vec<char> {
        reorder_combining_marks(self, text, adjustments)
    }
}

/// Moves every combining mark with a non-zero advance in front of its base
/// character.
pub fn reorder_combining_marks<F: Font + ?Sized>(
    font: &F,
    text: &[char],
    adjustments: Option<&mut Vec<GlyphAdjustment>>,
) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(text.len());
    let mut order: Vec<usize> = Vec::with_capacity(text.len());
    let mut base = None;

    for (i, &c) in text.iter().enumerate() {
        if is_combining_mark(c) && font.char_width(c) != Abs::zero() {
            if let Some(at) = base {
                out.insert(at, c);
                order.insert(at, i);
                base = Some(at + 1);
                continue;
            }
        } else {
            base = Some(out.len());
        }
        out.push(c);
        order.push(i);
    }

    if let Some(adjustments) = adjustments {
        if adjustments.len() == text.len() {
            let old = std::mem::take(adjustments);
            adjustments.extend(order.iter().map(|&i| old[i]));
        }
    }

    out
}

/// Whether the character is a combining mark.
pub fn is_combining_mark(c: char) -> bool {
    matches!(
        icu_properties::maps::general_category().get(c),
        GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::EnclosingMark
    )
}

/// The ISO 15924 tag (lower case) of the most frequent script in the text,
/// ignoring common and inherited characters. Returns `zyyy` if no specific
/// script occurs.
pub fn dominant_script(text: &[char]) -> String {
    let mut counts: FxHashMap<Script, usize> = FxHashMap::default();
    let mut order = Vec::new();
    for c in text {
        let script = c.script();
        if matches!(script, Script::Common | Script::Inherited | Script::Unknown) {
            continue;
        }
        let count = counts.entry(script).or_insert(0);
        if *count == 0 {
            order.push(script);
        }
        *count += 1;
    }

    // Ties go to the script that appeared first.
    let mut best: Option<(Script, usize)> = None;
    for script in order {
        let count = counts[&script];
        if best.is_none_or(|(_, max)| count > max) {
            best = Some((script, count));
        }
    }

    match best {
        Some((script, _)) => script.short_name().to_ascii_lowercase(),
        None => "zyyy".into(),
    }
}

/// Resolve the script tag passed to substitution and positioning.
///
/// Unset or `auto` scripts are replaced by the dominant script of the text
/// and the common script becomes the wildcard `*`.
pub fn resolve_script(script: Option<&str>, text: &[char]) -> String {
    let script = match script {
        None | Some("auto") => dominant_script(text),
        Some(script) => script.to_ascii_lowercase(),
    };
    if script == "zyyy" || script == "auto" { "*".into() } else { script }
}

/// Resolve the language tag passed to substitution and positioning.
pub fn resolve_lang(lang: Option<&str>) -> String {
    match lang {
        None | Some("none") => "dflt".into(),
        Some(lang) => lang.into(),
    }
}

/// The fonts available to a text node, primary font first.
#[derive(Debug, Clone)]
pub struct FontList {
    fonts: Vec<Arc<dyn Font>>,
}

impl FontList {
    /// Create a list with only a primary font.
    pub fn new(primary: Arc<dyn Font>) -> Self {
        Self { fonts: vec![primary] }
    }

    /// Add a fallback font.
    pub fn with_fallback(mut self, font: Arc<dyn Font>) -> Self {
        self.fonts.push(font);
        self
    }

    /// The primary font.
    pub fn primary(&self) -> &Arc<dyn Font> {
        &self.fonts[0]
    }

    /// All fonts in order of preference.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Font>> {
        self.fonts.iter()
    }

    /// The first font with a glyph for the character, else the primary font.
    pub fn select_for_char(&self, c: char) -> &Arc<dyn Font> {
        self.fonts.iter().find(|font| font.has_char(c)).unwrap_or(self.primary())
    }

    /// The first font covering every character of the span, else the font
    /// covering most of them, else the primary font.
    pub fn select_for_span(&self, text: &[char]) -> &Arc<dyn Font> {
        let mut best = self.primary();
        let mut best_count = 0;
        for font in &self.fonts {
            let count = text.iter().filter(|&&c| font.has_char(c)).count();
            if count == text.len() {
                return font;
            }
            if count > best_count {
                best = font;
                best_count = count;
            }
        }
        best
    }
}

/// Whether two font handles refer to the same font.
pub fn same_font(a: &Arc<dyn Font>, b: &Arc<dyn Font>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn test_dominant_script() {
        assert_eq!(dominant_script(&chars("hello, мир!")), "latn");
        assert_eq!(dominant_script(&chars("при hi вет")), "cyrl");
        assert_eq!(dominant_script(&chars("123 !?")), "zyyy");
        assert_eq!(resolve_script(None, &chars("123")), "*");
        assert_eq!(resolve_script(Some("Arab"), &chars("abc")), "arab");
        assert_eq!(resolve_lang(Some("none")), "dflt");
        assert_eq!(resolve_lang(Some("de")), "de");
    }

    #[test]
    fn test_reorder_combining_marks() {
        let font = MonoFont::new("Mono", Abs::pt(10.0), Abs::pt(6.0));
        let text = chars("a\u{0301}b");
        let mut adjustments = vec![
            GlyphAdjustment { x_advance: Abs::pt(1.0), ..Default::default() },
            GlyphAdjustment { x_advance: Abs::pt(2.0), ..Default::default() },
            GlyphAdjustment::default(),
        ];
        let reordered = reorder_combining_marks(&font, &text, Some(&mut adjustments));
        assert_eq!(reordered, chars("\u{0301}ab"));
        assert_eq!(adjustments[0].x_advance, Abs::pt(2.0));
        assert_eq!(adjustments[1].x_advance, Abs::pt(1.0));
    }

    #[test]
    fn test_font_list_selection() {
        let latin: Arc<dyn Font> =
            Arc::new(MonoFont::new("Latin", Abs::pt(10.0), Abs::pt(6.0)).without('ж'));
        let cyrillic: Arc<dyn Font> =
            Arc::new(MonoFont::new("Cyrillic", Abs::pt(10.0), Abs::pt(5.0)));
        let fonts = FontList::new(latin.clone()).with_fallback(cyrillic.clone());
        assert!(same_font(fonts.select_for_char('a'), &latin));
        assert!(same_font(fonts.select_for_char('ж'), &cyrillic));
        assert!(same_font(fonts.select_for_span(&chars("ab")), &latin));
        assert!(same_font(fonts.select_for_span(&chars("aж")), &cyrillic));
    }
}
