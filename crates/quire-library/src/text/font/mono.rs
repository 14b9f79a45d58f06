use ecow::EcoString;
use rustc_hash::{FxHashMap, FxHashSet};

use super::Font;
use crate::layout::Abs;
use crate::text::chars::{SOFT_HYPHEN, is_explicit_break, is_zero_width_space};

/// A deterministic font in which every character has the same advance.
///
/// Zero-width spaces, soft hyphens and line breaks have no width. Individual
/// widths, kerning pairs and missing characters can be configured, which
/// makes this font suitable for predictable layout.
#[derive(Debug, Clone)]
pub struct MonoFont {
    name: EcoString,
    size: Abs,
    advance: Abs,
    widths: FxHashMap<char, Abs>,
    kerning: FxHashMap<(char, char), Abs>,
    missing: FxHashSet<char>,
}

impl MonoFont {
    /// Create a font of the given size whose characters all share one
    /// advance.
    pub fn new(name: impl Into<EcoString>, size: Abs, advance: Abs) -> Self {
        Self {
            name: name.into(),
            size,
            advance,
            widths: FxHashMap::default(),
            kerning: FxHashMap::default(),
            missing: FxHashSet::default(),
        }
    }

    /// Give one character a different advance.
    pub fn with_width(mut self, c: char, width: Abs) -> Self {
        self.widths.insert(c, width);
        self
    }

    /// Add a kerning pair.
    pub fn with_kerning(mut self, left: char, right: char, amount: Abs) -> Self {
        self.kerning.insert((left, right), amount);
        self
    }

    /// Remove a character from the font's coverage.
    pub fn without(mut self, c: char) -> Self {
        self.missing.insert(c);
        self
    }

    /// The font size.
    pub fn size(&self) -> Abs {
        self.size
    }
}

impl Font for MonoFont {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_char(&self, c: char) -> bool {
        !self.missing.contains(&c)
    }

    fn char_width(&self, c: char) -> Abs {
        if let Some(&width) = self.widths.get(&c) {
            width
        } else if is_zero_width_space(c) || c == SOFT_HYPHEN || is_explicit_break(c) {
            Abs::zero()
        } else {
            self.advance
        }
    }

    fn has_kerning(&self) -> bool {
        !self.kerning.is_empty()
    }

    fn kerning(&self, left: char, right: char) -> Abs {
        self.kerning.get(&(left, right)).copied().unwrap_or_default()
    }
}
