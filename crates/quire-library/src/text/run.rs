use std::fmt::{self, Debug, Formatter};
use std::ops::Range;

use ecow::EcoString;
use rustc_hash::FxHashMap;

use crate::diag::{StrResult, bail};
use crate::text::{TextProps, WhiteSpaceTreatment};

/// The characters of one text node together with their bidi levels and the
/// glyph-derived substitutions recorded for them during layout.
///
/// Characters are appended while the node is being built and frozen once it
/// is complete. Levels and mappings are annotations on top of the character
/// buffer and can still be recorded after freezing.
#[derive(Clone)]
pub struct CharacterRun {
    /// The raw characters.
    chars: Vec<char>,
    /// Per-character bidi levels. Empty until the first level is assigned.
    levels: Vec<Option<u8>>,
    /// Substituted character sequences keyed by the range they replace.
    mappings: FxHashMap<(usize, usize), Vec<char>>,
    /// The script tag, if any was specified.
    script: Option<EcoString>,
    /// The language tag, if any was specified.
    lang: Option<EcoString>,
    /// How whitespace around line feeds was treated.
    white_space_treatment: WhiteSpaceTreatment,
    /// Whether the character buffer is read-only.
    frozen: bool,
}

impl CharacterRun {
    /// Create an empty run carrying the tags of the given properties.
    pub fn new(props: &TextProps) -> Self {
        Self {
            chars: Vec::new(),
            levels: Vec::new(),
            mappings: FxHashMap::default(),
            script: props.script.clone(),
            lang: props.lang.clone(),
            white_space_treatment: props.white_space_treatment,
            frozen: false,
        }
    }

    /// Create a run with the given text and default properties.
    pub fn from_text(text: &str) -> Self {
        let mut run = Self::new(&TextProps::default());
        run.chars.extend(text.chars());
        run
    }

    /// The number of characters in the run.
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the run holds no characters.
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The character at the given index.
    ///
    /// Panics if the index is out of bounds.
    pub fn char_at(&self, index: usize) -> char {
        self.chars[index]
    }

    /// The character at the given index, if any.
    pub fn get(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// All characters of the run.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// The characters in a range.
    pub fn slice(&self, range: Range<usize>) -> &[char] {
        &self.chars[range]
    }

    /// The text of the run as a string.
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// The script tag of the run.
    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    /// The language tag of the run.
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    /// How whitespace around line feeds is treated.
    pub fn white_space_treatment(&self) -> WhiteSpaceTreatment {
        self.white_space_treatment
    }

    /// Whether the character buffer is read-only.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Make the character buffer read-only.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Append a character.
    pub fn push(&mut self, c: char) -> StrResult<()> {
        self.ensure_mutable()?;
        self.chars.push(c);
        if !self.levels.is_empty() {
            self.levels.push(None);
        }
        Ok(())
    }

    /// Append all characters of a string.
    pub fn push_str(&mut self, text: &str) -> StrResult<()> {
        self.ensure_mutable()?;
        self.chars.extend(text.chars());
        if !self.levels.is_empty() {
            self.levels.resize(self.chars.len(), None);
        }
        Ok(())
    }

    /// Replace the character at an index.
    pub fn set_char(&mut self, index: usize, c: char) -> StrResult<()> {
        self.ensure_mutable()?;
        match self.chars.get_mut(index) {
            Some(slot) => *slot = c,
            None => bail!("character index {} is out of bounds", index),
        }
        Ok(())
    }

    /// Replace the whole character buffer, dropping any levels.
    pub fn replace_chars(&mut self, chars: Vec<char>) -> StrResult<()> {
        self.ensure_mutable()?;
        self.chars = chars;
        self.levels.clear();
        Ok(())
    }

    /// The bidi level of the character at an index, if resolved.
    pub fn level_at(&self, index: usize) -> Option<u8> {
        self.levels.get(index).copied().flatten()
    }

    /// Assign the bidi level of the characters in a range.
    pub fn set_levels(&mut self, range: Range<usize>, level: u8) -> StrResult<()> {
        if range.end > self.chars.len() {
            bail!(
                "level range {}..{} exceeds run of length {}",
                range.start,
                range.end,
                self.chars.len()
            );
        }
        if self.levels.is_empty() {
            self.levels.resize(self.chars.len(), None);
        }
        self.levels[range].fill(Some(level));
        Ok(())
    }

    /// The bidi levels of the characters in a range, or `None` if no level
    /// was ever assigned.
    pub fn levels(&self, range: Range<usize>) -> Option<&[Option<u8>]> {
        if self.levels.is_empty() { None } else { self.levels.get(range) }
    }

    /// Whether a substitution was recorded for exactly this range.
    pub fn has_mapping(&self, range: Range<usize>) -> bool {
        self.mappings.contains_key(&(range.start, range.end))
    }

    /// The substitution recorded for exactly this range.
    pub fn mapping(&self, range: Range<usize>) -> Option<&[char]> {
        self.mappings.get(&(range.start, range.end)).map(Vec::as_slice)
    }

    /// Record the substituted characters for a range.
    ///
    /// A range is mapped at most once.
    pub fn add_mapping(&mut self, range: Range<usize>, mapped: Vec<char>) -> StrResult<()> {
        if range.start > range.end || range.end > self.chars.len() {
            bail!("cannot map invalid range {}..{}", range.start, range.end);
        }
        let key = (range.start, range.end);
        if self.mappings.contains_key(&key) {
            bail!("range {}..{} is already mapped", range.start, range.end);
        }
        self.mappings.insert(key, mapped);
        Ok(())
    }

    /// The characters of a range after substitution.
    pub fn mapped(&self, range: Range<usize>) -> &[char] {
        match self.mapping(range.clone()) {
            Some(mapped) => mapped,
            None => &self.chars[range],
        }
    }

    fn ensure_mutable(&self) -> StrResult<()> {
        if self.frozen {
            bail!("cannot modify a frozen character run");
        }
        Ok(())
    }
}

impl Debug for CharacterRun {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "CharacterRun({:?})", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_frozen_rejects_appends() {
        let mut run = CharacterRun::from_text("ab");
        run.push('c').unwrap();
        run.freeze();
        assert!(run.push('d').is_err());
        assert!(run.set_char(0, 'x').is_err());
        assert_eq!(run.text(), "abc");
    }

    #[test]
    fn test_run_levels_are_sparse() {
        let mut run = CharacterRun::from_text("abc");
        assert_eq!(run.level_at(1), None);
        assert!(run.levels(0..3).is_none());
        run.set_levels(1..3, 1).unwrap();
        assert_eq!(run.level_at(0), None);
        assert_eq!(run.level_at(2), Some(1));
        assert!(run.set_levels(2..4, 0).is_err());
    }

    #[test]
    fn test_run_mapping_written_once() {
        let mut run = CharacterRun::from_text("office");
        run.freeze();
        assert!(!run.has_mapping(1..3));
        assert_eq!(run.mapped(1..3), ['f', 'f']);
        run.add_mapping(1..4, vec!['\u{FB03}']).unwrap();
        assert_eq!(run.mapped(1..4), ['\u{FB03}']);
        assert!(run.add_mapping(1..4, vec!['f']).is_err());
        assert_eq!(run.mapping(1..4).map(<[char]>::len), Some(1));
    }
}
