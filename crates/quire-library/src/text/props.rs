use ecow::EcoString;

use crate::layout::{Abs, Alignment, Dir, Elastic};
use crate::text::{LinefeedTreatment, TextTransform, WhiteSpaceTreatment};

/// Letter or word spacing.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Spacing {
    /// The font's natural spacing.
    #[default]
    Normal,
    /// An explicit adjustable spacing added on top of the natural spacing.
    Explicit(Elastic),
}

/// The resolved properties of one text node.
///
/// These are immutable for the duration of element generation.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TextProps {
    /// Space added between letters.
    pub letter_spacing: Spacing,
    /// Space added between words.
    pub word_spacing: Spacing,
    /// Border and padding at the start of each line.
    pub line_start_bap: Abs,
    /// Border and padding at the end of each line.
    pub line_end_bap: Abs,
    /// How whitespace around line feeds is treated.
    pub white_space_treatment: WhiteSpaceTreatment,
    /// How line feeds are treated.
    pub linefeed_treatment: LinefeedTreatment,
    /// Whether consecutive spaces collapse into one.
    pub white_space_collapse: bool,
    /// Whether line breaks are forbidden within the node.
    pub keep_together: bool,
    /// The ISO 15924 script tag, `auto` or unset.
    pub script: Option<EcoString>,
    /// The language tag, `none` or unset.
    pub lang: Option<EcoString>,
    /// The case transformation to apply.
    pub text_transform: TextTransform,
    /// Whether words may be hyphenated.
    pub hyphenate: bool,
    /// The character inserted at a hyphenation break.
    pub hyphenation_char: char,
    /// The minimum number of characters after a hyphenation point.
    pub hyphenation_push: usize,
    /// The minimum number of characters before a hyphenation point.
    pub hyphenation_remain: usize,
    /// The alignment of lines.
    pub alignment: Alignment,
    /// The writing direction.
    pub dir: Dir,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            letter_spacing: Spacing::Normal,
            word_spacing: Spacing::Normal,
            line_start_bap: Abs::zero(),
            line_end_bap: Abs::zero(),
            white_space_treatment: WhiteSpaceTreatment::IgnoreIfSurroundingLinefeed,
            linefeed_treatment: LinefeedTreatment::TreatAsSpace,
            white_space_collapse: true,
            keep_together: false,
            script: None,
            lang: None,
            text_transform: TextTransform::None,
            hyphenate: false,
            hyphenation_char: '-',
            hyphenation_push: 2,
            hyphenation_remain: 2,
            alignment: Alignment::Start,
            dir: Dir::LTR,
        }
    }
}

impl TextProps {
    /// Set the letter spacing.
    pub fn with_letter_spacing(mut self, spacing: Elastic) -> Self {
        self.letter_spacing = Spacing::Explicit(spacing);
        self
    }

    /// Set the word spacing.
    pub fn with_word_spacing(mut self, spacing: Elastic) -> Self {
        self.word_spacing = Spacing::Explicit(spacing);
        self
    }

    /// Set the border and padding at the start and end of lines.
    pub fn with_line_bap(mut self, start: Abs, end: Abs) -> Self {
        self.line_start_bap = start;
        self.line_end_bap = end;
        self
    }

    /// Set the whitespace treatment.
    pub fn with_white_space_treatment(mut self, treatment: WhiteSpaceTreatment) -> Self {
        self.white_space_treatment = treatment;
        self
    }

    /// Set the linefeed treatment.
    pub fn with_linefeed_treatment(mut self, treatment: LinefeedTreatment) -> Self {
        self.linefeed_treatment = treatment;
        self
    }

    /// Set whether consecutive spaces collapse.
    pub fn with_white_space_collapse(mut self, collapse: bool) -> Self {
        self.white_space_collapse = collapse;
        self
    }

    /// Forbid line breaks within the node.
    pub fn with_keep_together(mut self, keep: bool) -> Self {
        self.keep_together = keep;
        self
    }

    /// Set the script tag.
    pub fn with_script(mut self, script: impl Into<EcoString>) -> Self {
        self.script = Some(script.into());
        self
    }

    /// Set the language tag.
    pub fn with_lang(mut self, lang: impl Into<EcoString>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    /// Set the text transform.
    pub fn with_text_transform(mut self, transform: TextTransform) -> Self {
        self.text_transform = transform;
        self
    }

    /// Enable hyphenation with the given minimum character counts before and
    /// after each hyphenation point.
    pub fn with_hyphenation(mut self, remain: usize, push: usize) -> Self {
        self.hyphenate = true;
        self.hyphenation_remain = remain;
        self.hyphenation_push = push;
        self
    }

    /// Set the character inserted at hyphenation breaks.
    pub fn with_hyphenation_char(mut self, c: char) -> Self {
        self.hyphenation_char = c;
        self
    }

    /// Set the line alignment.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set the writing direction.
    pub fn with_dir(mut self, dir: Dir) -> Self {
        self.dir = dir;
        self
    }
}
