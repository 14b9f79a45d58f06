use std::ops::RangeInclusive;
use std::sync::Arc;

use quire_library::diag::{LayoutResult, bail};
use quire_library::layout::{Abs, Elastic};
use quire_library::text::chars::{NBSPACE, SPACE};
use quire_library::text::{Font, GlyphAdjustment};
use quire_utils::SliceExt;

use super::{FragmentInfo, TextLayouter};

/// How the line breaker settled a line.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AreaContext {
    /// The adjustment ratio of the line: positive to stretch, negative to
    /// shrink.
    pub ipd_adjust: f64,
    /// Whether the areas end the line.
    pub is_last_area: bool,
}

/// A run of words and spaces sharing one font and bidi level.
#[derive(Debug, Clone)]
pub struct TextArea {
    /// The final width after justification.
    pub width: Abs,
    /// The font of all items.
    pub font: Arc<dyn Font>,
    /// The bidi level of all items.
    pub level: Option<u8>,
    /// The justified letter space.
    pub letter_space_adjust: Abs,
    /// The justified word space, minus the space glyph and its two
    /// surrounding letter spaces.
    pub word_space_adjust: Abs,
    /// The words and spaces, in logical order.
    pub items: Vec<TextItem>,
}

impl TextArea {
    /// The text of the area, with mappings applied.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for item in &self.items {
            match item {
                TextItem::Word(word) => text.extend(&word.text),
                TextItem::Space(space) => text.push(space.space),
            }
        }
        text
    }
}

/// One item of a text area.
#[derive(Debug, Clone, PartialEq)]
pub enum TextItem {
    /// A word.
    Word(WordArea),
    /// A single space.
    Space(SpaceArea),
}

/// A word as rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct WordArea {
    /// The characters after mapping, including an inserted hyphen.
    pub text: Vec<char>,
    /// The adjustment after each character.
    pub letter_adjust: Vec<Abs>,
    /// The bidi level of each character, if resolved.
    pub levels: Option<Vec<Option<u8>>>,
    /// Per-glyph position adjustments from shaping.
    pub glyph_adjustments: Option<Vec<GlyphAdjustment>>,
}

/// A space as rendered.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SpaceArea {
    /// The space character.
    pub space: char,
    /// Whether justification may widen this space.
    pub adjustable: bool,
    /// The bidi level of the space.
    pub level: Option<u8>,
}

impl TextLayouter {
    /// Build the text areas for a range of fragments.
    ///
    /// Consecutive fragments with the same font and bidi level share an
    /// area. The line's adjustment ratio is distributed over the letter and
    /// word spaces of each area.
    #[tracing::instrument(name = "TextLayouter::build_text_areas", skip_all)]
    pub fn build_text_areas(
        &self,
        range: RangeInclusive<usize>,
        ctx: AreaContext,
    ) -> LayoutResult<Vec<TextArea>> {
        if !self.props.dir.is_horizontal() {
            bail!(0, "text areas can only be built for horizontal text");
        }
        let (first, last) = (*range.start(), *range.end());
        let Some(fragments) = self.fragments.get(range) else {
            bail!(
                0,
                "fragment range {first}..={last} is out of bounds for {} fragments",
                self.fragments.len(),
            );
        };

        let groups: Vec<_> = fragments
            .group_by_key(|fragment| (Arc::as_ptr(&fragment.font).cast::<()>(), fragment.level))
            .map(|(_, group)| group)
            .collect();

        let mut areas = Vec::with_capacity(groups.len());
        let mut offset = first;
        for (i, group) in groups.iter().enumerate() {
            let is_last = ctx.is_last_area && i + 1 == groups.len();
            areas.push(self.build_text_area(offset, group, ctx.ipd_adjust, is_last)?);
            offset += group.len();
        }

        Ok(areas)
    }

    /// Build the area for one group of fragments starting at `offset`.
    fn build_text_area(
        &self,
        offset: usize,
        group: &[FragmentInfo],
        ipd_adjust: f64,
        is_last: bool,
    ) -> LayoutResult<TextArea> {
        let ls = self.letter_space;
        let ws = self.word_space;

        let mut word_spaces = 0;
        let mut letter_spaces = 0;
        let mut width = Elastic::ZERO;
        for fragment in group {
            word_spaces += fragment.word_space_count;
            letter_spaces += fragment.letter_space_count;
            width += fragment.advance;
        }

        let last_fragment = group.last();
        let line_end_hyphen = is_last && last_fragment.is_some_and(FragmentInfo::is_hyphenated);

        // No letter space follows the last letter of a line.
        if is_last
            && let Some(fragment) = last_fragment
            && fragment.letter_space_count == fragment.word_length(&self.run)
            && !fragment.is_hyphenated()
            && letter_spaces > 0
        {
            width -= ls;
            letter_spaces -= 1;
        }

        // Elastic kerning adjusts like letter spaces.
        for fragment in group {
            for i in fragment.start + 1..=fragment.break_index {
                if self.letter_adjust.get(i).is_some_and(|adjust| adjust.is_elastic()) {
                    letter_spaces += 1;
                }
            }
        }

        if line_end_hyphen {
            width = width.plus(self.hyph_width);
        }

        let (difference, ls_dim) = if ipd_adjust > 0.0 {
            (width.stretch * ipd_adjust, ls.opt + ls.stretch * ipd_adjust)
        } else {
            (width.shrink * ipd_adjust, ls.opt + ls.shrink * ipd_adjust)
        };

        let mut total = (ls_dim - ls.opt) * letter_spaces;
        let mut ws_dim = ws.opt;
        if word_spaces > 0 {
            ws_dim += (difference - total) / word_spaces as f64;
            total += (ws_dim - ws.opt) * word_spaces;
        }
        if !total.approx_eq(difference) {
            tracing::trace!(
                ?total,
                ?difference,
                "letter and word spaces do not absorb the adjustment"
            );
            total = difference;
        }

        let mut items = Vec::with_capacity(group.len());
        let mut remaining_letter_spaces = letter_spaces;
        for (k, fragment) in group.iter().enumerate() {
            let line_end = line_end_hyphen && k + 1 == group.len();
            if fragment.is_space() {
                for i in fragment.range() {
                    let space = self.run.char_at(i);
                    items.push(TextItem::Space(SpaceArea {
                        space,
                        adjustable: space == SPACE || space == NBSPACE,
                        level: self.run.level_at(i),
                    }));
                }
            } else {
                let word = self.build_word_area(
                    offset + k,
                    fragment,
                    line_end,
                    ls_dim,
                    &mut remaining_letter_spaces,
                )?;
                items.push(TextItem::Word(word));
            }
        }

        Ok(TextArea {
            width: width.opt + total,
            font: group.first().map_or_else(|| self.space_font.clone(), |f| f.font.clone()),
            level: group.first().and_then(|fragment| fragment.level),
            letter_space_adjust: ls_dim,
            word_space_adjust: ws_dim - self.space_char_width - ls_dim * 2.0,
            items,
        })
    }

    /// Build one word, distributing the justified letter spaces over its
    /// characters.
    fn build_word_area(
        &self,
        index: usize,
        fragment: &FragmentInfo,
        line_end_hyphen: bool,
        ls_dim: Abs,
        remaining_letter_spaces: &mut usize,
    ) -> LayoutResult<WordArea> {
        let mut text = self.run.mapped(fragment.range()).to_vec();
        let mapped = self.run.has_mapping(fragment.range());

        let mut letter_adjust = Vec::with_capacity(text.len() + 1);
        for k in 0..text.len() {
            let mut adjust = Abs::zero();
            let i = fragment.start + k;
            let at_end = k + 1 == text.len();
            if !mapped && !(at_end && line_end_hyphen) {
                adjust += self.letter_adjust.get(i + 1).map_or(Abs::zero(), |a| a.opt);
            }
            if *remaining_letter_spaces > 0 && !(at_end && !fragment.break_opportunity) {
                adjust += ls_dim;
                *remaining_letter_spaces -= 1;
            }
            letter_adjust.push(adjust);
        }

        let mut glyph_adjustments = fragment.adjustments.clone();
        if let Some(adjustments) = &glyph_adjustments
            && adjustments.len() != text.len()
        {
            bail!(
                fragment.start,
                "fragment {index} has {} glyph adjustments for {} glyphs",
                adjustments.len(),
                text.len(),
            );
        }

        if line_end_hyphen {
            text.push(self.props.hyphenation_char);
            letter_adjust.push(Abs::zero());
            if let Some(adjustments) = &mut glyph_adjustments {
                adjustments.push(GlyphAdjustment::default());
            }
        }

        let levels = self
            .run
            .levels(fragment.range())
            .filter(|_| !mapped)
            .map(<[Option<u8>]>::to_vec);

        Ok(WordArea { text, letter_adjust, levels, glyph_adjustments })
    }
}
