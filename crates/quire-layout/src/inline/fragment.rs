use std::cell::OnceCell;
use std::fmt::{self, Debug, Formatter};
use std::ops::Range;
use std::sync::Arc;

use quire_library::layout::Elastic;
use quire_library::text::{CharacterRun, Font, GlyphAdjustment};

/// What a fragment represents.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FragmentKind {
    /// A word or the last piece of a hyphenated word.
    Word,
    /// A piece of a word that is followed by a hyphenation point.
    Hyphen,
    /// A run of collapsible spaces.
    Space,
    /// A single preserved, non-breaking, fixed-width or zero-width space.
    FixedSpace,
}

/// A contiguous range of a character run grouped for line breaking.
#[derive(Clone)]
pub struct FragmentInfo {
    /// The first character of the fragment.
    pub start: usize,
    /// The end of the rendered characters (exclusive), before any mapping.
    pub break_index: usize,
    /// The end of the covered characters (exclusive). Differs from
    /// `break_index` when trailing soft hyphens are only rendered at a line
    /// break.
    pub end: usize,
    /// The number of word spaces in the fragment.
    pub word_space_count: usize,
    /// The number of letter spaces in the fragment.
    pub letter_space_count: usize,
    /// The advance of the fragment including letter and word spaces.
    pub advance: Elastic,
    /// What the fragment represents.
    pub kind: FragmentKind,
    /// Whether a line may end after the fragment.
    pub break_opportunity: bool,
    /// The font the fragment is rendered with.
    pub font: Arc<dyn Font>,
    /// The bidi level of the fragment, if resolved.
    pub level: Option<u8>,
    /// Per-glyph position adjustments from complex shaping, one per mapped
    /// glyph.
    pub adjustments: Option<Vec<GlyphAdjustment>>,
    /// The memoized length of the (possibly mapped) word.
    word_length: OnceCell<usize>,
}

impl FragmentInfo {
    /// Create a fragment without letter or word spaces.
    pub fn new(range: Range<usize>, kind: FragmentKind, font: Arc<dyn Font>) -> Self {
        Self {
            start: range.start,
            break_index: range.end,
            end: range.end,
            word_space_count: 0,
            letter_space_count: 0,
            advance: Elastic::ZERO,
            kind,
            break_opportunity: false,
            font,
            level: None,
            adjustments: None,
            word_length: OnceCell::new(),
        }
    }

    /// The character range of the fragment.
    pub fn range(&self) -> Range<usize> {
        self.start..self.break_index
    }

    /// The characters the fragment accounts for, including trailing soft
    /// hyphens.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The number of characters in the fragment, before any mapping.
    pub fn len(&self) -> usize {
        self.break_index - self.start
    }

    /// Whether the fragment covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start == self.break_index
    }

    /// Whether the fragment is followed by a hyphenation point.
    pub fn is_hyphenated(&self) -> bool {
        self.kind == FragmentKind::Hyphen
    }

    /// Whether the fragment consists of spaces.
    pub fn is_space(&self) -> bool {
        matches!(self.kind, FragmentKind::Space | FragmentKind::FixedSpace)
    }

    /// The length of the word after mapping.
    ///
    /// The value is computed on first use and never changes afterwards, so
    /// mappings must be recorded before it is queried.
    pub fn word_length(&self, run: &CharacterRun) -> usize {
        *self
            .word_length
            .get_or_init(|| run.mapping(self.range()).map_or(self.len(), <[char]>::len))
    }
}

impl Debug for FragmentInfo {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("FragmentInfo")
            .field("range", &self.range())
            .field("end", &self.end)
            .field("kind", &self.kind)
            .field("word_spaces", &self.word_space_count)
            .field("letter_spaces", &self.letter_space_count)
            .field("advance", &self.advance)
            .field("break_opportunity", &self.break_opportunity)
            .field("font", &self.font.name())
            .field("level", &self.level)
            .finish()
    }
}

/// A fragment that replaces or follows the fragment at an index once
/// changes are applied.
#[derive(Debug, Clone)]
pub(crate) struct PendingChange {
    /// The replacement.
    pub fragment: FragmentInfo,
    /// The index of the replaced fragment.
    pub index: usize,
}

#[cfg(test)]
mod tests {
    use quire_library::layout::Abs;
    use quire_library::text::MonoFont;

    use super::*;

    fn font() -> Arc<dyn Font> {
        Arc::new(MonoFont::new("Mono", Abs::pt(10.0), Abs::pt(6.0)))
    }

    #[test]
    fn test_word_length_uses_mapping() {
        let mut run = CharacterRun::from_text("office");
        run.freeze();
        run.add_mapping(1..4, vec!['\u{FB03}']).unwrap();
        let fragment = FragmentInfo::new(1..4, FragmentKind::Word, font());
        assert_eq!(fragment.word_length(&run), 1);
        assert_eq!(fragment.word_length(&run), 1);
        assert_eq!(fragment.len(), 3);
    }

    #[test]
    fn test_word_length_is_memoized() {
        let mut run = CharacterRun::from_text("office");
        run.freeze();
        let fragment = FragmentInfo::new(0..6, FragmentKind::Word, font());
        assert_eq!(fragment.word_length(&run), 6);
        run.add_mapping(0..6, vec!['o', '\u{FB03}', 'c', 'e']).unwrap();
        assert_eq!(fragment.word_length(&run), 6);
    }

    #[test]
    fn test_fragment_kinds() {
        let space = FragmentInfo::new(2..3, FragmentKind::FixedSpace, font());
        assert!(space.is_space());
        assert!(!space.is_hyphenated());
        let piece = FragmentInfo::new(0..2, FragmentKind::Hyphen, font());
        assert!(piece.is_hyphenated());
        assert!(!piece.is_space());
    }
}
