use std::fmt::Debug;

/// A source of hyphenation points for words.
pub trait Hyphenator: Debug {
    /// The character offsets within `word` at which it may be hyphenated,
    /// in increasing order, or `None` if the language is not supported.
    ///
    /// An offset `i` means the word may break between `word[i - 1]` and
    /// `word[i]`.
    fn hyphenate(&self, word: &[char], lang: &str) -> Option<Vec<usize>>;
}

/// A hyphenator backed by the TeX hyphenation patterns bundled with
/// `hypher`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PatternHyphenator {
    /// The minimum number of characters before a hyphenation point.
    pub remain: usize,
    /// The minimum number of characters after a hyphenation point.
    pub push: usize,
}

impl Default for PatternHyphenator {
    fn default() -> Self {
        Self { remain: 2, push: 2 }
    }
}

impl PatternHyphenator {
    /// Create a hyphenator with the given minimum character counts.
    pub fn new(remain: usize, push: usize) -> Self {
        Self { remain, push }
    }
}

impl Hyphenator for PatternHyphenator {
    fn hyphenate(&self, word: &[char], lang: &str) -> Option<Vec<usize>> {
        let lang = hypher_lang(lang)?;
        let text: String = word.iter().collect();

        let mut offset = 0;
        let mut points = Vec::new();
        for syllable in hypher::hyphenate(&text, lang) {
            offset += syllable.chars().count();
            if offset >= self.remain
                && offset < word.len()
                && word.len() - offset >= self.push
            {
                points.push(offset);
            }
        }

        Some(points)
    }
}

/// Resolve a language tag such as `en` or `de-CH` to a `hypher` language.
fn hypher_lang(tag: &str) -> Option<hypher::Lang> {
    let primary = tag.split(['-', '_']).next()?.to_ascii_lowercase();
    let bytes: [u8; 2] = primary.as_bytes().try_into().ok()?;
    hypher::Lang::from_iso(bytes)
}

/// A cursor over the hyphenation points of a word, consumed piecewise as the
/// word's fragments are split.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct HyphContext {
    points: Vec<usize>,
    next: usize,
    offset: usize,
}

impl HyphContext {
    /// Create a cursor over increasing hyphenation points.
    pub fn new(points: Vec<usize>) -> Self {
        Self { points, next: 0, offset: 0 }
    }

    /// The distance from the current offset to the next hyphenation point.
    pub fn next_hyph_point(&mut self) -> Option<usize> {
        self.skip_consumed();
        self.points.get(self.next).map(|point| point - self.offset)
    }

    /// Whether hyphenation points remain after the current offset.
    pub fn has_more_hyph_points(&mut self) -> bool {
        self.skip_consumed();
        self.next < self.points.len()
    }

    /// Advance the current offset by the length of a consumed slice.
    pub fn update_offset(&mut self, size: usize) {
        self.offset += size;
    }

    fn skip_consumed(&mut self) {
        while self.points.get(self.next).is_some_and(|&point| point <= self.offset) {
            self.next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyph_context_cursor() {
        let mut ctx = HyphContext::new(vec![3, 7]);
        assert_eq!(ctx.next_hyph_point(), Some(3));
        assert!(ctx.has_more_hyph_points());
        ctx.update_offset(3);
        assert_eq!(ctx.next_hyph_point(), Some(4));
        ctx.update_offset(4);
        assert_eq!(ctx.next_hyph_point(), None);
        assert!(!ctx.has_more_hyph_points());
    }

    #[test]
    fn test_pattern_hyphenator_honours_minimums() {
        let word: Vec<char> = "hyphenation".chars().collect();
        let points = PatternHyphenator::default().hyphenate(&word, "en").unwrap();
        assert!(!points.is_empty());
        assert!(points.iter().all(|&p| p >= 2 && word.len() - p >= 2));
        assert!(points.windows(2).all(|w| w[0] < w[1]));

        let strict = PatternHyphenator::new(5, 5).hyphenate(&word, "en").unwrap();
        assert!(strict.iter().all(|&p| p >= 5 && word.len() - p >= 5));
    }

    #[test]
    fn test_pattern_hyphenator_unknown_language() {
        let word: Vec<char> = "word".chars().collect();
        assert_eq!(PatternHyphenator::default().hyphenate(&word, "xx"), None);
        assert_eq!(PatternHyphenator::default().hyphenate(&word, "dflt"), None);
    }
}
