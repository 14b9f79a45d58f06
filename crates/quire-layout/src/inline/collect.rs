use std::sync::Arc;

use quire_library::diag::{At, LayoutResult, bail, warning};
use quire_library::engine::Sink;
use quire_library::layout::{Abs, Alignment, Elastic};
use quire_library::text::chars::{
    NARROW_NBSPACE, NBSPACE, SOFT_HYPHEN, SPACE, ZERO_WIDTH_SPACE, is_explicit_break,
    is_fixed_width_space, is_space, is_zero_width_space,
};
use quire_library::text::{
    CharacterRun, Font, FontList, GlyphAdjustment, Spacing, TextProps, WhiteSpaceTreatment,
    resolve_lang, resolve_script,
};

use super::{
    BreakAction, BreakClassifier, Element, FragmentInfo, FragmentKind, KnuthSequence,
    PendingChange, Position,
};

/// Turns one text node into fragments and line-breaking elements.
///
/// The layouter owns the node's character run. Element generation scans the
/// run once. Afterwards, fragments can be revised through
/// [`hyphenate`](Self::hyphenate), [`apply_changes`](Self::apply_changes) and
/// [`add_a_letter_space_to`](Self::add_a_letter_space_to), and turned into
/// text areas with [`build_text_areas`](Self::build_text_areas).
pub struct TextLayouter {
    /// The characters of the node, frozen.
    pub(super) run: CharacterRun,
    /// The node's properties.
    pub(super) props: TextProps,
    /// The fonts available to the node.
    pub(super) fonts: FontList,
    /// The fragments, in order.
    pub(super) fragments: Vec<FragmentInfo>,
    /// Kerning and letter-space adjustments before each character, with one
    /// extra slot for the end of the run.
    pub(super) letter_adjust: Vec<Elastic>,
    /// The font used for spaces.
    pub(super) space_font: Arc<dyn Font>,
    /// The width of the space character.
    pub(super) space_char_width: Abs,
    /// The width of the hyphenation character.
    pub(super) hyph_width: Abs,
    /// The space between two letters.
    pub(super) letter_space: Elastic,
    /// The width of one word space.
    pub(super) word_space: Elastic,
    /// Start of the characters not yet assigned to a fragment.
    this_start: usize,
    /// The character being scanned.
    next_start: usize,
    /// Replacements queued by hyphenation.
    pub(super) pending: Vec<PendingChange>,
    /// How far fragment indices moved through applied changes.
    pub(super) change_offset: usize,
    /// Whether queued changes differ from the current fragments.
    pub(super) has_changed: bool,
    /// The fragment range to re-emit after changes were applied.
    pub(super) returned: Option<(usize, usize)>,
    /// Whether all elements were delivered.
    pub(super) finished: bool,
    /// Warnings about the node.
    pub(super) sink: Sink,
}

impl TextLayouter {
    /// Prepare a run for element generation.
    ///
    /// Freezes the run and derives the space, hyphen, letter-space and
    /// word-space widths from the properties and fonts.
    pub fn new(mut run: CharacterRun, props: TextProps, fonts: FontList) -> Self {
        run.freeze();

        let space_font = fonts.select_for_char(SPACE).clone();
        let space_char_width = space_font.char_width(SPACE);
        let hyph_width = space_font.char_width(props.hyphenation_char);

        let letter_space = match props.letter_spacing {
            Spacing::Normal => Elastic::ZERO,
            Spacing::Explicit(spacing) => spacing,
        };

        // Normal word spaces may shrink by a third and stretch by a half of
        // the space character.
        let word_spacing = match props.word_spacing {
            Spacing::Normal => {
                Elastic::new(Abs::zero(), space_char_width / 2.0, space_char_width / 3.0)
                    + letter_space * 2usize
            }
            Spacing::Explicit(spacing) => spacing,
        };
        let word_space = Elastic::stiff(space_char_width) + word_spacing;

        tracing::debug!(
            ?letter_space,
            ?word_space,
            font = space_font.name(),
            "initialized text layouter"
        );

        let letter_adjust = vec![Elastic::ZERO; run.len() + 1];
        Self {
            run,
            props,
            fonts,
            fragments: Vec::new(),
            letter_adjust,
            space_font,
            space_char_width,
            hyph_width,
            letter_space,
            word_space,
            this_start: 0,
            next_start: 0,
            pending: Vec::new(),
            change_offset: 0,
            has_changed: false,
            returned: None,
            finished: false,
            sink: Sink::new(),
        }
    }

    /// The character run.
    pub fn run(&self) -> &CharacterRun {
        &self.run
    }

    /// The node's properties.
    pub fn props(&self) -> &TextProps {
        &self.props
    }

    /// The fragments, in order.
    pub fn fragments(&self) -> &[FragmentInfo] {
        &self.fragments
    }

    /// The space between two letters.
    pub fn letter_space(&self) -> Elastic {
        self.letter_space
    }

    /// The width of one word space.
    pub fn word_space(&self) -> Elastic {
        self.word_space
    }

    /// The width of the hyphenation character.
    pub fn hyph_width(&self) -> Abs {
        self.hyph_width
    }

    /// The kerning and letter-space adjustment before a character.
    pub fn letter_adjust(&self, index: usize) -> Option<Elastic> {
        self.letter_adjust.get(index).copied()
    }

    /// How far fragment indices moved through applied changes.
    pub fn change_offset(&self) -> usize {
        self.change_offset
    }

    /// Whether all elements were delivered.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Take the warnings collected so far.
    pub fn take_warnings(&mut self) -> Sink {
        std::mem::take(&mut self.sink)
    }

    /// Give back the character run, including the recorded mappings.
    pub fn into_run(self) -> CharacterRun {
        self.run
    }

    /// Scan the run and produce one element sequence per segment between
    /// explicit breaks.
    #[tracing::instrument(name = "TextLayouter::elements", skip_all, fields(len = self.run.len()))]
    pub fn elements(&mut self, alignment: Alignment) -> LayoutResult<Vec<KnuthSequence>> {
        self.fragments.clear();
        self.letter_adjust.fill(Elastic::ZERO);
        self.pending.clear();
        self.change_offset = 0;
        self.has_changed = false;
        self.returned = None;
        self.this_start = 0;
        self.next_start = 0;

        let treatment = self.run.white_space_treatment();
        let mut classifier = BreakClassifier::new(self.props.keep_together);
        let mut sequences = Vec::new();
        let mut sequence = KnuthSequence::new();

        let mut in_word = false;
        let mut in_whitespace = false;
        let mut special: Option<FragmentInfo> = None;
        let mut prev_level = None;
        let mut ch = '\0';

        while self.next_start < self.run.len() {
            let i = self.next_start;
            ch = self.run.char_at(i);
            let level = self.run.level_at(i);
            let action = classifier.next_char(ch);
            let break_opportunity = action.is_opportunity();
            let level_changed = prev_level.is_some() && level != prev_level;

            if in_word {
                if break_opportunity
                    || is_space(ch)
                    || is_explicit_break(ch)
                    || level_changed
                {
                    self.process_word(&mut sequence, alignment, ch, break_opportunity, true)?;
                }
            } else if in_whitespace {
                if ch != SPACE || break_opportunity || level_changed {
                    self.process_whitespace(&mut sequence, alignment, break_opportunity);
                }
            } else {
                if let Some(fragment) = special.take() {
                    let break_after = ch == SPACE || break_opportunity;
                    self.process_leftover(&mut sequence, alignment, fragment, break_after);
                }
                if action == BreakAction::Explicit {
                    self.process_linebreak(&mut sequences, &mut sequence);
                }
            }

            if (ch == SPACE && treatment == WhiteSpaceTreatment::Preserve) || ch == NBSPACE {
                let mut fragment =
                    FragmentInfo::new(i..i + 1, FragmentKind::FixedSpace, self.space_font.clone());
                fragment.word_space_count = 1;
                fragment.advance = self.word_space;
                fragment.level = level;
                special = Some(fragment);
                self.this_start = i + 1;
            } else if is_fixed_width_space(ch)
                || is_zero_width_space(ch)
                || ch == NARROW_NBSPACE
            {
                let font = self.fonts.select_for_char(ch).clone();
                let advance = Elastic::stiff(font.char_width(ch));
                let mut fragment = FragmentInfo::new(i..i + 1, FragmentKind::FixedSpace, font);
                fragment.advance = advance;
                fragment.level = level;
                special = Some(fragment);
                self.this_start = i + 1;
            } else if is_explicit_break(ch) {
                self.this_start = i + 1;
            }

            in_word = !is_space(ch) && !is_explicit_break(ch);
            in_whitespace = ch == SPACE && treatment != WhiteSpaceTreatment::Preserve;
            prev_level = level;
            self.next_start += 1;
        }

        if in_word {
            self.process_word(&mut sequence, alignment, ch, false, false)?;
        } else if in_whitespace {
            let break_after = !self.props.keep_together;
            self.process_whitespace(&mut sequence, alignment, break_after);
        } else if let Some(fragment) = special.take() {
            self.process_leftover(&mut sequence, alignment, fragment, ch == ZERO_WIDTH_SPACE);
        } else if is_explicit_break(ch) {
            self.process_linebreak(&mut sequences, &mut sequence);
        }

        // A trailing explicit break leaves an empty sequence behind.
        if !sequence.is_empty() {
            sequences.push(sequence);
        }

        self.finished = true;
        tracing::debug!(
            fragments = self.fragments.len(),
            sequences = sequences.len(),
            "generated elements"
        );

        Ok(sequences)
    }

    /// Close the current sequence at an explicit break and start a new one.
    fn process_linebreak(
        &self,
        sequences: &mut Vec<KnuthSequence>,
        sequence: &mut KnuthSequence,
    ) {
        let end_bap = self.props.line_end_bap;
        let glue = (end_bap != Abs::zero())
            .then(|| Element::glue(Elastic::stiff(end_bap), Position::Auxiliary, true));
        sequence.end_sequence(glue);
        sequences.push(std::mem::take(sequence));
    }

    /// Record a pending special space once the character after it is known.
    fn process_leftover(
        &mut self,
        sequence: &mut KnuthSequence,
        alignment: Alignment,
        mut fragment: FragmentInfo,
        break_after: bool,
    ) {
        fragment.break_opportunity = break_after;
        self.fragments.push(fragment);
        let index = self.fragments.len() - 1;
        sequence.extend(self.space_elements(alignment, index));
    }

    /// Record the run of collapsible spaces that ends before the current
    /// character.
    fn process_whitespace(
        &mut self,
        sequence: &mut KnuthSequence,
        alignment: Alignment,
        break_opportunity: bool,
    ) {
        let count = self.next_start - self.this_start;
        let mut fragment = FragmentInfo::new(
            self.this_start..self.next_start,
            FragmentKind::Space,
            self.space_font.clone(),
        );
        fragment.word_space_count = count;
        fragment.advance = self.word_space * count;
        fragment.break_opportunity = break_opportunity;
        fragment.level = self.run.level_at(self.this_start);

        tracing::trace!(range = ?fragment.range(), "whitespace fragment");
        self.fragments.push(fragment);
        let index = self.fragments.len() - 1;
        sequence.extend(self.space_elements(alignment, index));
        self.this_start = self.next_start;
    }

    /// Record the word that ends before the current character `ch`.
    fn process_word(
        &mut self,
        sequence: &mut KnuthSequence,
        alignment: Alignment,
        ch: char,
        break_opportunity: bool,
        check_ends: bool,
    ) -> LayoutResult<()> {
        // Trailing soft hyphens are not rendered unless the line breaks
        // there, but they make the word hyphenated.
        let mut last = self.next_start;
        while last > self.this_start && self.run.char_at(last - 1) == SOFT_HYPHEN {
            last -= 1;
        }
        let ends_with_hyphen = check_ends && self.run.get(last) == Some(SOFT_HYPHEN);

        let font = self.fonts.select_for_span(self.run.slice(self.this_start..last)).clone();
        for i in self.this_start..last {
            let c = self.run.char_at(i);
            if !font.has_char(c) {
                self.sink.warn(
                    warning!(i, "font {} has no glyph for {c:?}", font.name())
                        .with_hint("add a fallback font that covers this character"),
                );
            }
        }

        let following = break_opportunity.then_some(ch);
        let mut fragment = if font.performs_substitution() || font.performs_positioning() {
            self.process_word_mapping(last, font, following)?
        } else {
            self.process_word_no_mapping(last, font, following, ends_with_hyphen)?
        };
        fragment.kind =
            if ends_with_hyphen { FragmentKind::Hyphen } else { FragmentKind::Word };
        fragment.break_opportunity = break_opportunity;
        fragment.level = self.run.level_at(self.this_start);
        fragment.end = self.next_start;

        tracing::trace!(range = ?fragment.range(), kind = ?fragment.kind, "word fragment");
        self.fragments.push(fragment);
        let index = self.fragments.len() - 1;
        sequence.extend(self.word_elements(alignment, index));
        self.this_start = self.next_start;
        Ok(())
    }

    /// Measure a word character by character, with pairwise kerning.
    fn process_word_no_mapping(
        &mut self,
        last: usize,
        font: Arc<dyn Font>,
        following: Option<char>,
        ends_with_hyphen: bool,
    ) -> LayoutResult<FragmentInfo> {
        let start = self.this_start;
        let kerning = font.has_kerning();
        let mut width = Abs::zero();

        for i in start..last {
            let c = self.run.char_at(i);
            width += font.char_width(c);
            if !kerning {
                continue;
            }

            // Kern against the previous character, which may end the
            // previous fragment. After a soft hyphen, that kerning already
            // sits at the hyphenation point.
            let previous = if i > start {
                Some(self.run.char_at(i - 1))
            } else {
                self.fragments
                    .last()
                    .filter(|prev| prev.kind == FragmentKind::Word && prev.break_index > 0)
                    .map(|prev| self.run.char_at(prev.break_index - 1))
            };

            if let Some(previous) = previous {
                let kern = font.kerning(previous, c);
                if kern != Abs::zero() {
                    self.add_to_letter_adjust(i, kern)?;
                    width += kern;
                }
            }
        }

        // The kerning with a following hyphen-like character only applies if
        // the line does not break here, so it is recorded but not added.
        if kerning
            && ends_with_hyphen
            && last > 0
            && let Some(next) = following.filter(|&c| !is_space(c))
        {
            let kern = font.kerning(self.run.char_at(last - 1), next);
            if kern != Abs::zero() {
                self.add_to_letter_adjust(last, kern)?;
            }
        }

        let letter_spaces = letter_space_count(last - start, following);
        let mut fragment = FragmentInfo::new(start..last, FragmentKind::Word, font);
        fragment.letter_space_count = letter_spaces;
        fragment.advance = Elastic::stiff(width) + self.letter_space * letter_spaces;
        Ok(fragment)
    }

    /// Measure a word through the font's substitution and positioning.
    fn process_word_mapping(
        &mut self,
        last: usize,
        font: Arc<dyn Font>,
        following: Option<char>,
    ) -> LayoutResult<FragmentInfo> {
        let start = self.this_start;
        let chars = self.run.slice(start..last).to_vec();
        let script = resolve_script(self.run.script(), &chars);
        let lang = resolve_lang(self.run.lang());

        let substituted = font.substitute(&chars, &script, &lang);
        let mut adjustments = if font.performs_positioning() {
            font.position(&substituted, &script, &lang)
        } else if font.has_kerning() && !font.has_positioning_feature(&script, &lang, "kern")
        {
            kerning_adjustments(font.as_ref(), &substituted)
        } else {
            None
        };

        let mapped =
            font.reorder_combining_marks(&substituted, adjustments.as_mut(), &script, &lang);
        let adjustments = adjustments
            .filter(|adjustments| adjustments.iter().any(|adjustment| !adjustment.is_zero()));
        if mapped != chars && !self.run.has_mapping(start..last) {
            self.run.add_mapping(start..last, mapped.clone()).at(start)?;
        }

        let mut width = Abs::zero();
        for (i, &c) in mapped.iter().enumerate() {
            width += font.char_width(c).max(Abs::zero());
            if let Some(adjustments) = &adjustments {
                let Some(adjustment) = adjustments.get(i) else {
                    bail!(
                        start + i,
                        "glyph adjustment table of length {} has no entry for glyph {i}",
                        adjustments.len(),
                    );
                };
                width += adjustment.x_advance;
            }
        }

        tracing::trace!(%script, %lang, mapped = mapped.len(), "shaped word");

        let letter_spaces = letter_space_count(mapped.len(), following);
        let mut fragment = FragmentInfo::new(start..last, FragmentKind::Word, font);
        fragment.letter_space_count = letter_spaces;
        fragment.advance = Elastic::stiff(width) + self.letter_space * letter_spaces;
        fragment.adjustments = adjustments;
        Ok(fragment)
    }

    /// Add to the adjustment before a character.
    pub(super) fn add_to_letter_adjust(&mut self, index: usize, amount: Abs) -> LayoutResult<()> {
        let len = self.letter_adjust.len();
        let Some(slot) = self.letter_adjust.get_mut(index) else {
            bail!(index, "letter adjustment table of length {len} has no entry {index}");
        };
        *slot += Elastic::stiff(amount);
        Ok(())
    }
}

/// The letter spaces of a word of `len` glyphs: one between each pair, and
/// one more in case text follows a hyphen-like break on the same line.
fn letter_space_count(len: usize, following: Option<char>) -> usize {
    let mut count = len.saturating_sub(1);
    if len > 0 && following.is_some_and(|c| !is_space(c)) {
        count += 1;
    }
    count
}

/// Derive advance adjustments from pairwise kerning of mapped characters.
///
/// The kerning between two glyphs widens the first one.
fn kerning_adjustments(font: &dyn Font, chars: &[char]) -> Option<Vec<GlyphAdjustment>> {
    let kerns: Vec<Abs> = chars
        .windows(2)
        .map(|pair| font.kerning(pair[0], pair[1]))
        .collect();
    if kerns.iter().all(|&kern| kern == Abs::zero()) {
        return None;
    }

    let mut adjustments = vec![GlyphAdjustment::default(); chars.len()];
    for (adjustment, kern) in adjustments.iter_mut().zip(kerns) {
        adjustment.x_advance = kern;
    }
    Some(adjustments)
}
