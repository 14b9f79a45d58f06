use quire_library::diag::{At, LayoutResult, bail};
use quire_library::layout::{Abs, Alignment, Elastic};
use quire_library::text::{GlyphAdjustment, HyphContext};
use quire_library::text::chars::is_break_char;

use super::{
    Element, FLAGGED_PENALTY, FragmentInfo, FragmentKind, PendingChange, Position, TextLayouter,
};

impl TextLayouter {
    /// Widen the fragment behind a previously emitted element list by one
    /// letter space.
    ///
    /// The list is either a lone box or a box followed by a penalty, a glue
    /// and a box, as emitted for a word. The first element identifies the
    /// fragment.
    pub fn add_a_letter_space_to(&mut self, elements: &mut Vec<Element>) -> LayoutResult<()> {
        let Some(index) = elements.first().and_then(|element| element.position.index()) else {
            return Ok(());
        };
        let Some(fragment) = self.fragments.get_mut(index) else {
            bail!(0, "no fragment at index {index}");
        };

        let ls = self.letter_space;
        fragment.letter_space_count += 1;
        fragment.advance += ls;

        let last = fragment.break_index.checked_sub(1).and_then(|i| self.run.get(i));
        if last.is_some_and(is_break_char) {
            // The fragment can now end a line, so it gets a breakpoint.
            elements.push(Element::penalty(
                Abs::zero(),
                FLAGGED_PENALTY,
                true,
                Position::Auxiliary,
                false,
            ));
            elements.push(Element::glue(ls, Position::Auxiliary, false));
        } else if ls.is_stiff() {
            let position = elements[0].position;
            elements[0] = Element::boxed(fragment.advance.opt, position, false);
        } else {
            let count = fragment.letter_space_count;
            let start = fragment.start;
            let Some(glue) = elements.get_mut(2).filter(|element| element.is_glue()) else {
                bail!(start, "elastic letter spacing of fragment {index} has no glue");
            };
            *glue = Element::glue(ls * count, Position::Auxiliary, true);
        }

        Ok(())
    }

    /// Split the word fragment behind an element at its hyphenation points.
    ///
    /// The pieces are only queued. They replace the fragment once
    /// [`apply_changes`](Self::apply_changes) is called.
    #[tracing::instrument(name = "TextLayouter::hyphenate", skip_all)]
    pub fn hyphenate(&mut self, position: Position, ctx: &mut HyphContext) -> LayoutResult<()> {
        let Some(leaf) = position.index() else { return Ok(()) };
        let index = leaf + self.change_offset;
        let Some(fragment) = self.fragments.get(index) else {
            bail!(0, "no fragment at index {index}");
        };

        // Pieces can only be measured if each glyph stands for one character.
        let mapped = self.run.mapped(fragment.range()).to_vec();
        if mapped.len() != fragment.len() {
            return Ok(());
        }
        let has_mapping = self.run.has_mapping(fragment.range());
        let shaped = has_mapping || fragment.adjustments.is_some();

        let word_length = fragment.word_length(&self.run);
        let mut start = fragment.start;
        let mut changed = false;

        while start < fragment.break_index {
            let next = ctx.next_hyph_point();
            let has_more = ctx.has_more_hyph_points();
            let (stop, hyphen_follows) = match next {
                Some(next) if has_more && start + next <= fragment.break_index => {
                    (start + next, true)
                }
                _ => (fragment.break_index, false),
            };
            ctx.update_offset(stop - start);

            let glyphs = start - fragment.start..stop - fragment.start;
            let mut width = Abs::zero();
            if start == fragment.start {
                width += self.letter_adjust_at(start)?.opt;
            }
            for (i, &c) in (start..stop).zip(&mapped[glyphs.clone()]) {
                let advance = fragment.font.char_width(c);
                width += if shaped { advance.max(Abs::zero()) } else { advance };
                if let Some(adjustment) =
                    fragment.adjustments.as_ref().and_then(|a| a.get(i - fragment.start))
                {
                    width += adjustment.x_advance;
                }
                let at_hyphen = i + 1 == stop && hyphen_follows;
                if i + 1 < fragment.break_index && !at_hyphen {
                    width += self.letter_adjust_at(i + 1)?.opt;
                }
            }

            let is_word_end =
                stop == fragment.break_index && fragment.letter_space_count < word_length;
            let letter_spaces = if is_word_end { stop - start - 1 } else { stop - start };

            if changed || stop != fragment.break_index || hyphen_follows {
                let kind = if hyphen_follows { FragmentKind::Hyphen } else { fragment.kind };
                let mut piece = FragmentInfo::new(start..stop, kind, fragment.font.clone());
                piece.letter_space_count = letter_spaces;
                piece.advance = (self.letter_space * letter_spaces).plus(width);
                piece.break_opportunity = !hyphen_follows && fragment.break_opportunity;
                piece.level = fragment.level;
                piece.adjustments = fragment
                    .adjustments
                    .as_ref()
                    .and_then(|adjustments| adjustments.get(glyphs.clone()))
                    .map(<[GlyphAdjustment]>::to_vec);
                if stop == fragment.break_index {
                    piece.end = fragment.end;
                }

                // Substituted glyphs stay with their piece.
                let slice = &mapped[glyphs];
                if has_mapping
                    && slice != self.run.slice(start..stop)
                    && !self.run.has_mapping(start..stop)
                {
                    self.run.add_mapping(start..stop, slice.to_vec()).at(start)?;
                }

                tracing::trace!(range = ?piece.range(), kind = ?piece.kind, "hyphenated piece");
                self.pending.push(PendingChange { fragment: piece, index });
                changed = true;
            }

            start = stop;
        }

        self.has_changed |= changed;
        Ok(())
    }

    /// Replace hyphenated fragments by their queued pieces.
    ///
    /// `elements` are the elements previously emitted for the affected
    /// fragments. Their first and last leaf positions delimit what
    /// [`changed_elements`](Self::changed_elements) re-emits. Returns whether
    /// any fragment was actually split.
    pub fn apply_changes(&mut self, elements: &[Element]) -> bool {
        self.finished = false;
        if elements.is_empty() {
            return false;
        }

        let mut leaves = elements.iter().filter_map(|element| element.position.index());
        let first = leaves.next();
        let last = leaves.next_back().or(first);
        self.returned = first
            .zip(last)
            .map(|(first, last)| (first + self.change_offset, last + self.change_offset));

        let mut added = 0;
        let mut removed = 0;
        let mut old_index = None;
        for change in std::mem::take(&mut self.pending) {
            added += 1;
            if old_index != Some(change.index) {
                removed += 1;
                old_index = Some(change.index);
                self.fragments.remove(change.index + added - removed);
            }
            self.fragments.insert(change.index + added - removed, change.fragment);
        }

        let delta = added - removed;
        if let Some((_, end)) = &mut self.returned {
            *end += delta;
        }
        self.change_offset += delta;

        std::mem::take(&mut self.has_changed)
    }

    /// The elements of the fragments touched by the last
    /// [`apply_changes`](Self::apply_changes), or `None` once everything was
    /// delivered.
    pub fn changed_elements(&mut self, alignment: Alignment) -> Option<Vec<Element>> {
        if self.finished {
            return None;
        }
        let (first, last) = self.returned.take()?;

        let mut elements = Vec::new();
        let end = (last + 1).min(self.fragments.len());
        for index in first..end {
            elements.extend(self.fragment_elements(alignment, index));
        }

        self.finished = end >= self.fragments.len();
        tracing::debug!(
            fragments = end.saturating_sub(first),
            elements = elements.len(),
            "re-emitted"
        );
        Some(elements)
    }

    /// The characters of the fragment behind an element, as they appear in
    /// the run before any mapping.
    pub fn word_chars(&self, position: Position) -> LayoutResult<&[char]> {
        let Some(leaf) = position.index() else { return Ok(&[]) };
        let index = leaf + self.change_offset;
        let Some(fragment) = self.fragments.get(index) else {
            bail!(0, "no fragment at index {index}");
        };
        Ok(self.run.slice(fragment.range()))
    }

    fn letter_adjust_at(&self, index: usize) -> LayoutResult<Elastic> {
        match self.letter_adjust.get(index) {
            Some(&adjust) => Ok(adjust),
            None => bail!(
                index,
                "letter adjustment table of length {} has no entry {index}",
                self.letter_adjust.len(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_library::text::{CharacterRun, Font, FontList, MonoFont, TextProps};

    use super::*;
    use crate::inline::{ElementKind, KnuthSequence};

    /// Positions every glyph with the same advance change.
    #[derive(Debug)]
    struct TrackingFont(Abs);

    impl Font for TrackingFont {
        fn name(&self) -> &str {
            "Tracking"
        }

        fn has_char(&self, _: char) -> bool {
            true
        }

        fn char_width(&self, _: char) -> Abs {
            Abs::pt(6.0)
        }

        fn performs_positioning(&self) -> bool {
            true
        }

        fn position(&self, text: &[char], _: &str, _: &str) -> Option<Vec<GlyphAdjustment>> {
            let adjustment = GlyphAdjustment { x_advance: self.0, ..Default::default() };
            Some(vec![adjustment; text.len()])
        }
    }

    fn layouter(text: &str, props: TextProps) -> TextLayouter {
        let font: Arc<dyn Font> = Arc::new(
            MonoFont::new("Mono", Abs::pt(10.0), Abs::pt(6.0)).with_width(' ', Abs::pt(3.0)),
        );
        layouter_with(text, props, font)
    }

    fn layouter_with(text: &str, props: TextProps, font: Arc<dyn Font>) -> TextLayouter {
        let mut run = CharacterRun::new(&props);
        run.push_str(text).unwrap();
        TextLayouter::new(run, props, FontList::new(font))
    }

    fn split_at_3_and_7(layouter: &mut TextLayouter) {
        let sequence = sequence(layouter, Alignment::Justify);
        let mut ctx = HyphContext::new(vec![3, 7]);
        layouter.hyphenate(Position::Leaf(0), &mut ctx).unwrap();
        assert!(layouter.apply_changes(sequence.content()));
    }

    fn sequence(layouter: &mut TextLayouter, alignment: Alignment) -> KnuthSequence {
        let mut sequences = layouter.elements(alignment).unwrap();
        assert_eq!(sequences.len(), 1);
        sequences.remove(0)
    }

    fn leaf_elements(sequence: &KnuthSequence, index: usize) -> Vec<Element> {
        let elements = sequence.elements();
        let start = elements
            .iter()
            .position(|element| element.position == Position::Leaf(index))
            .unwrap();
        let end = elements[start + 1..]
            .iter()
            .position(|element| element.position.index().is_some_and(|i| i != index))
            .map_or(elements.len(), |offset| start + 1 + offset);
        elements[start..end].to_vec()
    }

    #[test]
    fn test_letter_space_widens_stiff_box() {
        let props = TextProps::default().with_letter_spacing(Abs::pt(1.0).into());
        let mut layouter = layouter("abc def", props);
        let sequence = sequence(&mut layouter, Alignment::Start);
        let mut elements = leaf_elements(&sequence, 2);
        assert_eq!(elements, [Element::boxed(Abs::pt(20.0), Position::Leaf(2), false)]);

        layouter.add_a_letter_space_to(&mut elements).unwrap();
        assert_eq!(elements[0].kind, ElementKind::Box(Abs::pt(21.0)));
        layouter.add_a_letter_space_to(&mut elements).unwrap();
        assert_eq!(elements[0].kind, ElementKind::Box(Abs::pt(22.0)));
        assert_eq!(elements[0].position, Position::Leaf(2));
        assert_eq!(layouter.fragments()[2].letter_space_count, 4);
    }

    #[test]
    fn test_letter_space_replaces_elastic_glue() {
        let ls = Elastic::new(Abs::pt(1.0), Abs::pt(0.5), Abs::zero());
        let props = TextProps::default().with_letter_spacing(ls);
        let mut layouter = layouter("abc", props);
        let mut elements = sequence(&mut layouter, Alignment::Justify).into_elements();
        assert_eq!(elements.len(), 4);

        layouter.add_a_letter_space_to(&mut elements).unwrap();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[2], Element::glue(ls * 3usize, Position::Auxiliary, true));
        assert_eq!(layouter.fragments()[0].advance, Elastic::stiff(Abs::pt(18.0)) + ls * 3usize);
    }

    #[test]
    fn test_letter_space_after_break_char_appends_breakpoint() {
        let props = TextProps::default().with_letter_spacing(Abs::pt(1.0).into());
        let mut layouter = layouter("ab-cd", props);
        let sequence = sequence(&mut layouter, Alignment::Justify);
        let mut elements = leaf_elements(&sequence, 0);
        let before = elements.len();

        layouter.add_a_letter_space_to(&mut elements).unwrap();
        assert_eq!(elements.len(), before + 2);
        assert_eq!(
            elements[before],
            Element::penalty(Abs::zero(), FLAGGED_PENALTY, true, Position::Auxiliary, false)
        );
        assert!(elements[before + 1].is_glue());
    }

    #[test]
    fn test_letter_space_ignores_auxiliary_elements() {
        let mut layouter = layouter("abc", TextProps::default());
        sequence(&mut layouter, Alignment::Start);
        let mut elements = vec![Element::aux_box()];
        layouter.add_a_letter_space_to(&mut elements).unwrap();
        assert_eq!(elements, [Element::aux_box()]);
        assert_eq!(layouter.fragments()[0].letter_space_count, 2);
    }

    #[test]
    fn test_hyphenate_splits_word() {
        let mut layouter = layouter("abcdefghij", TextProps::default());
        let sequence = sequence(&mut layouter, Alignment::Justify);
        assert_eq!(layouter.word_chars(Position::Leaf(0)).unwrap().len(), 10);

        let mut ctx = HyphContext::new(vec![3, 7]);
        layouter.hyphenate(Position::Leaf(0), &mut ctx).unwrap();
        assert!(layouter.apply_changes(sequence.content()));

        let fragments = layouter.fragments();
        assert_eq!(fragments.len(), 3);
        assert_eq!(layouter.change_offset(), 2);
        assert_eq!(
            fragments.iter().map(FragmentInfo::range).collect::<Vec<_>>(),
            [0..3, 3..7, 7..10]
        );
        assert_eq!(
            fragments.iter().map(|f| f.kind).collect::<Vec<_>>(),
            [FragmentKind::Hyphen, FragmentKind::Hyphen, FragmentKind::Word]
        );
        assert_eq!(fragments[1].advance.opt, Abs::pt(24.0));
        assert_eq!(fragments[2].letter_space_count, 2);

        let elements = layouter.changed_elements(Alignment::Justify).unwrap();
        assert_eq!(elements.len(), 5);
        assert_eq!(elements[0], Element::boxed(Abs::pt(18.0), Position::Leaf(0), false));
        assert_eq!(
            elements[1],
            Element::penalty(Abs::pt(6.0), FLAGGED_PENALTY, true, Position::Auxiliary, false)
        );
        assert_eq!(elements[4].position, Position::Leaf(2));
        assert!(layouter.is_finished());
        assert_eq!(layouter.changed_elements(Alignment::Justify), None);
    }

    #[test]
    fn test_hyphenate_positioned_word() {
        let font = Arc::new(TrackingFont(Abs::pt(-1.0)));
        let mut layouter = layouter_with("abcdefghij", TextProps::default(), font);
        split_at_3_and_7(&mut layouter);

        let fragments = layouter.fragments();
        assert_eq!(fragments.len(), 3);
        let advances: Vec<_> = fragments.iter().map(|f| f.advance.opt).collect();
        assert_eq!(advances, [Abs::pt(15.0), Abs::pt(20.0), Abs::pt(15.0)]);
        let glyphs: Vec<_> =
            fragments.iter().map(|f| f.adjustments.as_ref().map(Vec::len)).collect();
        assert_eq!(glyphs, [Some(3), Some(4), Some(3)]);
    }

    #[test]
    fn test_hyphenate_word_with_neutral_positioning() {
        let font = Arc::new(TrackingFont(Abs::zero()));
        let mut layouter = layouter_with("abcdefghij", TextProps::default(), font);
        split_at_3_and_7(&mut layouter);

        let fragments = layouter.fragments();
        assert_eq!(fragments.len(), 3);
        assert!(fragments.iter().all(|f| f.adjustments.is_none()));
        assert_eq!(fragments[1].advance.opt, Abs::pt(24.0));
    }

    #[test]
    fn test_hyphenate_keeps_trailing_soft_hyphen_covered() {
        let mut layouter = layouter("abcdefghij\u{AD}", TextProps::default());
        assert_eq!(layouter.run().len(), 11);
        split_at_3_and_7(&mut layouter);

        let spans: Vec<_> = layouter.fragments().iter().map(FragmentInfo::span).collect();
        assert_eq!(spans, [0..3, 3..7, 7..11]);
        assert_eq!(layouter.fragments()[2].range(), 7..10);
    }

    #[test]
    fn test_hyphenate_without_points_changes_nothing() {
        let mut layouter = layouter("abcdef", TextProps::default());
        let sequence = sequence(&mut layouter, Alignment::Justify);
        let mut ctx = HyphContext::new(vec![]);
        layouter.hyphenate(Position::Leaf(0), &mut ctx).unwrap();
        assert!(!layouter.apply_changes(sequence.content()));
        assert_eq!(layouter.fragments().len(), 1);
        assert_eq!(layouter.change_offset(), 0);
    }

    #[test]
    fn test_change_offset_shifts_later_positions() {
        let mut layouter = layouter("abcdef ghijkl", TextProps::default());
        let sequence = sequence(&mut layouter, Alignment::Justify);
        let mut ctx = HyphContext::new(vec![3]);
        layouter.hyphenate(Position::Leaf(0), &mut ctx).unwrap();
        assert!(layouter.apply_changes(sequence.content()));

        // The old position of the second word still resolves.
        let chars: String = layouter.word_chars(Position::Leaf(2)).unwrap().iter().collect();
        assert_eq!(chars, "ghijkl");

        let elements = layouter.changed_elements(Alignment::Justify).unwrap();
        assert_eq!(elements.len(), 5);
        assert_eq!(elements[3].position, Position::Leaf(2));
        assert_eq!(elements[4].position, Position::Leaf(3));
    }

    #[test]
    fn test_unknown_fragment_is_an_error() {
        let mut layouter = layouter("abc", TextProps::default());
        sequence(&mut layouter, Alignment::Start);
        assert!(layouter.word_chars(Position::Leaf(5)).is_err());
        let mut ctx = HyphContext::new(vec![1]);
        assert!(layouter.hyphenate(Position::Leaf(5), &mut ctx).is_err());
        assert!(layouter.word_chars(Position::Auxiliary).unwrap().is_empty());
    }
}
