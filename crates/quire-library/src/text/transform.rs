use icu_properties::GeneralCategory;

use crate::diag::StrResult;
use crate::text::CharacterRun;

/// A case transformation applied to the characters of a run.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextTransform {
    /// Leave the characters untouched.
    #[default]
    None,
    /// Map every character to upper case.
    Uppercase,
    /// Map every character to lower case.
    Lowercase,
    /// Map the first character of every word to title case.
    Capitalize,
}

/// A read-only view of the text surrounding a run within its block.
///
/// Word boundaries for capitalization can depend on text in neighbouring
/// nodes, so the caller hands in the flattened characters before and after
/// the run instead of the run looking them up itself.
#[derive(Debug, Default, Copy, Clone)]
pub struct TextContext<'a> {
    before: &'a [char],
    after: &'a [char],
}

impl<'a> TextContext<'a> {
    /// Create a context from the characters preceding and following the run.
    pub fn new(before: &'a [char], after: &'a [char]) -> Self {
        Self { before, after }
    }

    /// The character at `offset` relative to `index` within `text`, looking
    /// into the surrounding text when the offset leaves the run.
    pub fn char_at(&self, text: &[char], index: usize, offset: isize) -> Option<char> {
        let target = index as isize + offset;
        if target < 0 {
            let back = target.unsigned_abs();
            self.before.len().checked_sub(back).map(|i| self.before[i])
        } else if (target as usize) < text.len() {
            Some(text[target as usize])
        } else {
            self.after.get(target as usize - text.len()).copied()
        }
    }
}

impl TextTransform {
    /// Apply the transform to a run that is still being built.
    ///
    /// Case mappings that would change the number of characters are skipped
    /// so that indices into the run stay valid.
    pub fn apply(self, run: &mut CharacterRun, ctx: &TextContext) -> StrResult<()> {
        if self == Self::None {
            return Ok(());
        }

        let chars = run.chars().to_vec();
        for (i, &c) in chars.iter().enumerate() {
            let mapped = match self {
                Self::None => None,
                Self::Uppercase => single(c.to_uppercase()),
                Self::Lowercase => single(c.to_lowercase()),
                Self::Capitalize if is_start_of_word(&chars, i, ctx) => {
                    single(c.to_uppercase())
                }
                Self::Capitalize => None,
            };

            if let Some(mapped) = mapped.filter(|&m| m != c) {
                run.set_char(i, mapped)?;
            }
        }

        Ok(())
    }
}

/// Whether a character belongs to a word.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum WordChar {
    Yes,
    No,
    /// An apostrophe: part of a word in a contraction, but not when closing
    /// a quotation.
    Maybe,
}

impl WordChar {
    fn of(c: Option<char>) -> Self {
        let Some(c) = c else { return Self::No };
        if c == '\'' || c == '\u{2019}' {
            return Self::Maybe;
        }

        match icu_properties::maps::general_category().get(c) {
            GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
            | GeneralCategory::NonspacingMark
            | GeneralCategory::SpacingMark
            | GeneralCategory::DecimalNumber
            | GeneralCategory::LetterNumber
            | GeneralCategory::OtherNumber
            | GeneralCategory::ConnectorPunctuation
            | GeneralCategory::CurrencySymbol
            | GeneralCategory::ModifierSymbol
            | GeneralCategory::OtherSymbol => Self::Yes,
            GeneralCategory::DashPunctuation if c == '-' => Self::Yes,
            _ => Self::No,
        }
    }
}

/// Whether the character at `index` starts a word.
fn is_start_of_word(text: &[char], index: usize, ctx: &TextContext) -> bool {
    match WordChar::of(ctx.char_at(text, index, -1)) {
        WordChar::Yes => false,
        WordChar::No => true,
        WordChar::Maybe => match WordChar::of(ctx.char_at(text, index, -2)) {
            WordChar::Yes => false,
            WordChar::No | WordChar::Maybe => true,
        },
    }
}

/// The only character of a case mapping, if it maps to exactly one.
fn single(mut iter: impl Iterator<Item = char>) -> Option<char> {
    let c = iter.next()?;
    iter.next().is_none().then_some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(text: &str, transform: TextTransform, ctx: &TextContext) -> String {
        let mut run = CharacterRun::from_text(text);
        transform.apply(&mut run, ctx).unwrap();
        run.text()
    }

    #[test]
    fn test_transform_case() {
        let ctx = TextContext::default();
        assert_eq!(transform("Straße", TextTransform::Uppercase, &ctx), "STRAßE");
        assert_eq!(transform("ABC", TextTransform::Lowercase, &ctx), "abc");
    }

    #[test]
    fn test_transform_capitalize_apostrophes() {
        let ctx = TextContext::default();
        assert_eq!(
            transform("it's a 'quoted' word-pair", TextTransform::Capitalize, &ctx),
            "It's A 'Quoted' Word-pair"
        );
    }

    #[test]
    fn test_transform_capitalize_uses_context() {
        let before: Vec<char> = "hel".chars().collect();
        let ctx = TextContext::new(&before, &[]);
        assert_eq!(transform("lo world", TextTransform::Capitalize, &ctx), "lo World");
    }

    #[test]
    fn test_context_char_at() {
        let before = ['x', 'y'];
        let after = ['z'];
        let ctx = TextContext::new(&before, &after);
        let text = ['a', 'b'];
        assert_eq!(ctx.char_at(&text, 0, -1), Some('y'));
        assert_eq!(ctx.char_at(&text, 0, -2), Some('x'));
        assert_eq!(ctx.char_at(&text, 0, -3), None);
        assert_eq!(ctx.char_at(&text, 1, 1), Some('z'));
        assert_eq!(ctx.char_at(&text, 1, 2), None);
    }
}
