use quire_library::layout::{Abs, Alignment, Elastic};
use quire_library::text::WhiteSpaceTreatment;
use quire_library::text::chars::SPACE;
use smallvec::SmallVec;

use super::{
    DEFAULT_SPACE_WIDTH, Element, FLAGGED_PENALTY, FragmentInfo, FragmentKind, INFINITE,
    Position, SOFT_HYPHEN_PENALTY, TextLayouter,
};

/// The elements emitted for one fragment.
pub(super) type Elements = SmallVec<[Element; 8]>;

impl TextLayouter {
    /// The elements of the fragment at an index, by kind.
    pub(super) fn fragment_elements(&self, alignment: Alignment, index: usize) -> Elements {
        match self.fragments[index].kind {
            FragmentKind::Word | FragmentKind::Hyphen => self.word_elements(alignment, index),
            FragmentKind::Space | FragmentKind::FixedSpace => {
                self.space_elements(alignment, index)
            }
        }
    }

    /// The elements of a word fragment, followed by the elements of the
    /// hyphenation point or hyphen-like break after it, if any.
    pub(super) fn word_elements(&self, alignment: Alignment, index: usize) -> Elements {
        let fragment = &self.fragments[index];
        let main = Position::Leaf(index);
        let ls = self.letter_space;

        // The letter space after a hyphen-like character disappears if the
        // line breaks after it.
        let suppressible = fragment.break_opportunity && !fragment.is_hyphenated();

        let mut elements = Elements::new();
        if ls.is_stiff() {
            let width = if suppressible {
                fragment.advance.opt - ls.opt
            } else {
                fragment.advance.opt
            };
            elements.push(Element::boxed(width, main, false));
        } else {
            let count = fragment.letter_space_count;
            let adjustable = count.saturating_sub(usize::from(suppressible));
            elements.push(Element::boxed(fragment.advance.opt - ls.opt * count, main, false));
            elements.push(Element::zero_penalty(INFINITE));
            elements.push(Element::glue(ls * adjustable, Position::Auxiliary, true));
            elements.push(Element::aux_box());
        }

        if fragment.is_hyphenated() {
            let width_if_no_break =
                self.letter_adjust.get(fragment.break_index).copied().unwrap_or_default();
            // Hyphens from hyphenation are flagged, soft hyphens in the
            // source are not.
            elements.extend(self.hyphen_elements(
                alignment,
                self.hyph_width,
                width_if_no_break,
                fragment.break_opportunity,
            ));
        } else if suppressible {
            elements.extend(self.hyphen_elements(alignment, Abs::zero(), ls, true));
        }

        elements
    }

    /// The elements of a breaking opportunity inside or after a word.
    ///
    /// `width_if_break` is added when the line breaks here (the hyphen),
    /// `width_if_no_break` when it does not (the kerning or letter space that
    /// joins the two halves).
    fn hyphen_elements(
        &self,
        alignment: Alignment,
        width_if_break: Abs,
        width_if_no_break: Elastic,
        unflagged: bool,
    ) -> Elements {
        let u = DEFAULT_SPACE_WIDTH;
        let start_bap = self.props.line_start_bap;
        let end_bap = self.props.line_end_bap;
        let has_bap = start_bap != Abs::zero() || end_bap != Abs::zero();
        let aux = Position::Auxiliary;
        let cost = if unflagged { SOFT_HYPHEN_PENALTY } else { FLAGGED_PENALTY };
        let penalty = Element::penalty(width_if_break, cost, !unflagged, aux, false);

        let mut elements = Elements::new();
        match alignment {
            Alignment::Center => {
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(
                    Elastic::new(end_bap, u * 3.0, Abs::zero()),
                    aux,
                    true,
                ));
                elements.push(penalty);
                elements.push(Element::glue(
                    Elastic::new(-(end_bap + start_bap), u * -6.0, Abs::zero()),
                    aux,
                    false,
                ));
                elements.push(Element::aux_box());
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(
                    Elastic::new(start_bap, u * 3.0, Abs::zero()),
                    aux,
                    true,
                ));
            }
            Alignment::Start | Alignment::End if has_bap => {
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(
                    Elastic::new(end_bap, u * 3.0, Abs::zero()),
                    aux,
                    false,
                ));
                elements.push(penalty);
                elements.push(Element::glue(
                    Elastic::new(
                        width_if_no_break.opt - (start_bap + end_bap),
                        u * -3.0,
                        Abs::zero(),
                    ),
                    aux,
                    false,
                ));
                elements.push(Element::aux_box());
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(Elastic::stiff(start_bap), aux, false));
            }
            Alignment::Start | Alignment::End => {
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(
                    Elastic::new(Abs::zero(), u * 3.0, Abs::zero()),
                    aux,
                    false,
                ));
                elements.push(penalty);
                elements.push(Element::glue(
                    Elastic::new(width_if_no_break.opt, u * -3.0, Abs::zero()),
                    aux,
                    false,
                ));
            }
            Alignment::Justify | Alignment::LastLine if has_bap => {
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(Elastic::stiff(end_bap), aux, false));
                elements.push(penalty);
                let joint = if width_if_no_break.is_nonzero() {
                    width_if_no_break.plus(-(start_bap + end_bap))
                } else {
                    Elastic::stiff(-(start_bap + end_bap))
                };
                elements.push(Element::glue(joint, aux, false));
                elements.push(Element::aux_box());
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(Elastic::stiff(start_bap), aux, false));
            }
            Alignment::Justify | Alignment::LastLine => {
                elements.push(penalty);
                if width_if_no_break.is_nonzero() {
                    elements.push(Element::glue(width_if_no_break, aux, false));
                }
            }
        }

        elements
    }

    /// The elements of a space fragment.
    pub(super) fn space_elements(&self, alignment: Alignment, index: usize) -> Elements {
        let fragment = &self.fragments[index];
        let main = Position::Leaf(index);

        if !fragment.break_opportunity {
            // A non-breaking space is kept at the start of a line.
            let mut elements = Elements::new();
            if alignment == Alignment::Justify {
                elements.push(Element::aux_box());
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(fragment.advance, main, false));
            } else {
                elements.push(Element::boxed(fragment.advance.opt, main, true));
            }
            return elements;
        }

        let preserved = fragment.kind == FragmentKind::FixedSpace
            || self.run.char_at(fragment.start) != SPACE
            || self.run.white_space_treatment() == WhiteSpaceTreatment::Preserve;

        if preserved {
            // The space moves to the start of the next line if the line
            // breaks here.
            self.breaking_space_elements(
                alignment,
                fragment,
                (Position::Auxiliary, Abs::zero()),
                (main, fragment.advance.opt),
                true,
            )
        } else {
            self.breaking_space_elements(
                alignment,
                fragment,
                (main, fragment.advance.opt),
                (Position::Auxiliary, Abs::zero()),
                false,
            )
        }
    }

    /// The elements of a breakable space.
    ///
    /// The glue before the break carries `before`, the glue after the break
    /// carries `after`: both as a position and an offset of its width.
    fn breaking_space_elements(
        &self,
        alignment: Alignment,
        fragment: &FragmentInfo,
        before: (Position, Abs),
        after: (Position, Abs),
        keep_structure: bool,
    ) -> Elements {
        let u = DEFAULT_SPACE_WIDTH;
        let start_bap = self.props.line_start_bap;
        let end_bap = self.props.line_end_bap;
        let full = keep_structure || start_bap != Abs::zero() || end_bap != Abs::zero();
        let aux = Position::Auxiliary;
        let (pos2, p2) = before;
        let (pos3, p3) = after;
        let area = fragment.advance;

        let mut elements = Elements::new();
        match alignment {
            Alignment::Center => {
                elements.push(Element::glue(
                    Elastic::new(end_bap, u * 3.0, Abs::zero()),
                    aux,
                    false,
                ));
                elements.push(Element::zero_penalty(0));
                elements.push(Element::glue(
                    Elastic::new(p2 - (start_bap + end_bap), u * -6.0, Abs::zero()),
                    pos2,
                    false,
                ));
                elements.push(Element::aux_box());
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(
                    Elastic::new(start_bap + p3, u * 3.0, Abs::zero()),
                    pos3,
                    false,
                ));
            }
            Alignment::Start | Alignment::End if full => {
                elements.push(Element::glue(
                    Elastic::new(end_bap, u * 3.0, Abs::zero()),
                    aux,
                    false,
                ));
                elements.push(Element::zero_penalty(0));
                elements.push(Element::glue(
                    Elastic::new(p2 - (start_bap + end_bap), u * -3.0, Abs::zero()),
                    pos2,
                    false,
                ));
                elements.push(Element::aux_box());
                elements.push(Element::zero_penalty(INFINITE));
                elements.push(Element::glue(Elastic::stiff(start_bap + p3), pos3, false));
            }
            Alignment::Start | Alignment::End => {
                elements.push(Element::glue(
                    Elastic::new(Abs::zero(), u * 3.0, Abs::zero()),
                    aux,
                    false,
                ));
                elements.push(Element::zero_penalty(0));
                elements.push(Element::glue(
                    Elastic::new(area.opt, u * -3.0, Abs::zero()),
                    pos2,
                    false,
                ));
            }
            Alignment::Justify | Alignment::LastLine => {
                // The last line of a justified paragraph may only stretch.
                let shrink =
                    if alignment == Alignment::Justify { area.shrink } else { Abs::zero() };
                if full {
                    elements.push(Element::glue(Elastic::stiff(end_bap), aux, false));
                    elements.push(Element::zero_penalty(0));
                    elements.push(Element::glue(
                        Elastic::new(p2 - (start_bap + end_bap), area.stretch, shrink),
                        pos2,
                        false,
                    ));
                    elements.push(Element::aux_box());
                    elements.push(Element::zero_penalty(INFINITE));
                    elements.push(Element::glue(Elastic::stiff(start_bap + p3), pos3, false));
                } else {
                    elements.push(Element::glue(
                        Elastic::new(area.opt, area.stretch, shrink),
                        pos2,
                        false,
                    ));
                }
            }
        }

        elements
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quire_library::text::{
        CharacterRun, Font, FontList, MonoFont, TextProps, WhiteSpaceTreatment,
    };

    use super::*;
    use crate::inline::ElementKind;

    fn layouter(text: &str, props: TextProps) -> TextLayouter {
        let font: Arc<dyn Font> = Arc::new(
            MonoFont::new("Mono", Abs::pt(10.0), Abs::pt(6.0)).with_width(' ', Abs::pt(3.0)),
        );
        let mut run = CharacterRun::new(&props);
        run.push_str(text).unwrap();
        TextLayouter::new(run, props, FontList::new(font))
    }

    fn single(text: &str, props: TextProps, alignment: Alignment) -> Vec<Element> {
        let mut layouter = layouter(text, props);
        let mut sequences = layouter.elements(alignment).unwrap();
        assert_eq!(sequences.len(), 1);
        sequences.remove(0).into_elements()
    }

    #[test]
    fn test_space_elements_justify() {
        let elements = single("AB CD", TextProps::default(), Alignment::Justify);
        // Box, glue, box.
        assert_eq!(elements.len(), 3);
        assert_eq!(
            elements[1].kind,
            ElementKind::Glue(Elastic::new(Abs::pt(3.0), Abs::pt(1.5), Abs::pt(1.0)))
        );
        assert_eq!(elements[1].position, Position::Leaf(1));
    }

    #[test]
    fn test_space_elements_last_line_cannot_shrink() {
        let elements = single("AB CD", TextProps::default(), Alignment::LastLine);
        assert_eq!(
            elements[1].kind,
            ElementKind::Glue(Elastic::new(Abs::pt(3.0), Abs::pt(1.5), Abs::zero()))
        );
    }

    #[test]
    fn test_space_elements_start() {
        let elements = single("AB CD", TextProps::default(), Alignment::Start);
        let u = DEFAULT_SPACE_WIDTH;
        assert_eq!(elements.len(), 5);
        assert_eq!(
            elements[1].kind,
            ElementKind::Glue(Elastic::new(Abs::zero(), u * 3.0, Abs::zero()))
        );
        assert_eq!(elements[2], Element::zero_penalty(0));
        assert_eq!(
            elements[3].kind,
            ElementKind::Glue(Elastic::new(Abs::pt(3.0), u * -3.0, Abs::zero()))
        );
        assert_eq!(elements[3].position, Position::Leaf(1));
    }

    #[test]
    fn test_space_elements_center_with_bap() {
        let props = TextProps::default().with_line_bap(Abs::pt(1.0), Abs::pt(2.0));
        let elements = single("AB CD", props, Alignment::Center);
        let u = DEFAULT_SPACE_WIDTH;
        assert_eq!(elements.len(), 8);
        assert_eq!(
            elements[1].kind,
            ElementKind::Glue(Elastic::new(Abs::pt(2.0), u * 3.0, Abs::zero()))
        );
        assert_eq!(
            elements[3].kind,
            ElementKind::Glue(Elastic::new(Abs::pt(0.0), u * -6.0, Abs::zero()))
        );
        assert_eq!(
            elements[6].kind,
            ElementKind::Glue(Elastic::new(Abs::pt(1.0), u * 3.0, Abs::zero()))
        );
    }

    #[test]
    fn test_non_breaking_space_is_a_box() {
        let elements = single("AB\u{A0}CD", TextProps::default(), Alignment::Start);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[1], Element::boxed(Abs::pt(3.0), Position::Leaf(1), true));

        let elements = single("AB\u{A0}CD", TextProps::default(), Alignment::Justify);
        assert_eq!(elements.len(), 5);
        assert_eq!(elements[1], Element::aux_box());
        assert_eq!(elements[2], Element::zero_penalty(INFINITE));
        assert!(elements[3].is_glue());
    }

    #[test]
    fn test_hyphen_like_break_is_suppressible() {
        let props = TextProps::default().with_letter_spacing(Abs::pt(1.0).into());
        let elements = single("ab-cd", props, Alignment::Justify);
        // "ab-" reserves a letter space that is suppressed by the break.
        assert_eq!(elements[0].kind, ElementKind::Box(Abs::pt(20.0)));
        assert_eq!(
            elements[1],
            Element::penalty(Abs::zero(), SOFT_HYPHEN_PENALTY, false, Position::Auxiliary, false)
        );
        assert_eq!(elements[2].kind, ElementKind::Glue(Elastic::stiff(Abs::pt(1.0))));
        assert_eq!(elements[3].kind, ElementKind::Box(Abs::pt(13.0)));
    }

    #[test]
    fn test_soft_hyphen_is_unflagged() {
        let elements = single("ab\u{AD}cd", TextProps::default(), Alignment::Justify);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].kind, ElementKind::Box(Abs::pt(12.0)));
        assert_eq!(
            elements[1],
            Element::penalty(Abs::pt(6.0), SOFT_HYPHEN_PENALTY, false, Position::Auxiliary, false)
        );
        assert_eq!(elements[2].position, Position::Leaf(1));
    }

    #[test]
    fn test_elastic_letter_spacing_emits_glue() {
        let props = TextProps::default()
            .with_letter_spacing(Elastic::new(Abs::pt(1.0), Abs::pt(0.5), Abs::zero()));
        let elements = single("abc", props, Alignment::Justify);
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].kind, ElementKind::Box(Abs::pt(18.0)));
        assert_eq!(elements[1], Element::zero_penalty(INFINITE));
        assert_eq!(
            elements[2].kind,
            ElementKind::Glue(Elastic::new(Abs::pt(2.0), Abs::pt(1.0), Abs::zero()))
        );
        assert_eq!(elements[3], Element::aux_box());
    }

    /// The elements of "ab\u{AD}cd", wrapped around the soft hyphen's own.
    fn around_soft_hyphen(hyphen: Vec<Element>) -> Vec<Element> {
        let mut elements = vec![Element::boxed(Abs::pt(12.0), Position::Leaf(0), false)];
        elements.extend(hyphen);
        elements.push(Element::boxed(Abs::pt(12.0), Position::Leaf(1), false));
        elements
    }

    fn soft_hyphen_penalty() -> Element {
        Element::penalty(Abs::pt(6.0), SOFT_HYPHEN_PENALTY, false, Position::Auxiliary, false)
    }

    #[test]
    fn test_hyphen_elements_center() {
        let props = TextProps::default().with_line_bap(Abs::pt(1.0), Abs::pt(2.0));
        let elements = single("ab\u{AD}cd", props, Alignment::Center);
        let u = DEFAULT_SPACE_WIDTH;
        let aux = Position::Auxiliary;
        assert_eq!(
            elements,
            around_soft_hyphen(vec![
                Element::zero_penalty(INFINITE),
                Element::glue(Elastic::new(Abs::pt(2.0), u * 3.0, Abs::zero()), aux, true),
                soft_hyphen_penalty(),
                Element::glue(Elastic::new(Abs::pt(-3.0), u * -6.0, Abs::zero()), aux, false),
                Element::aux_box(),
                Element::zero_penalty(INFINITE),
                Element::glue(Elastic::new(Abs::pt(1.0), u * 3.0, Abs::zero()), aux, true),
            ])
        );
    }

    #[test]
    fn test_hyphen_elements_start_with_bap() {
        let props = TextProps::default().with_line_bap(Abs::pt(1.0), Abs::pt(2.0));
        let u = DEFAULT_SPACE_WIDTH;
        let aux = Position::Auxiliary;
        let expected = around_soft_hyphen(vec![
            Element::zero_penalty(INFINITE),
            Element::glue(Elastic::new(Abs::pt(2.0), u * 3.0, Abs::zero()), aux, false),
            soft_hyphen_penalty(),
            Element::glue(Elastic::new(Abs::pt(-3.0), u * -3.0, Abs::zero()), aux, false),
            Element::aux_box(),
            Element::zero_penalty(INFINITE),
            Element::glue(Elastic::stiff(Abs::pt(1.0)), aux, false),
        ]);
        assert_eq!(single("ab\u{AD}cd", props.clone(), Alignment::Start), expected);
        assert_eq!(single("ab\u{AD}cd", props, Alignment::End), expected);
    }

    #[test]
    fn test_hyphen_elements_start_without_bap() {
        let elements = single("ab\u{AD}cd", TextProps::default(), Alignment::Start);
        let u = DEFAULT_SPACE_WIDTH;
        let aux = Position::Auxiliary;
        assert_eq!(
            elements,
            around_soft_hyphen(vec![
                Element::zero_penalty(INFINITE),
                Element::glue(Elastic::new(Abs::zero(), u * 3.0, Abs::zero()), aux, false),
                soft_hyphen_penalty(),
                Element::glue(Elastic::new(Abs::zero(), u * -3.0, Abs::zero()), aux, false),
            ])
        );
    }

    #[test]
    fn test_hyphen_elements_justify_with_bap() {
        let props = TextProps::default().with_line_bap(Abs::pt(1.0), Abs::pt(2.0));
        let elements = single("ab\u{AD}cd", props, Alignment::Justify);
        let aux = Position::Auxiliary;
        assert_eq!(
            elements,
            around_soft_hyphen(vec![
                Element::zero_penalty(INFINITE),
                Element::glue(Elastic::stiff(Abs::pt(2.0)), aux, false),
                soft_hyphen_penalty(),
                Element::glue(Elastic::stiff(Abs::pt(-3.0)), aux, false),
                Element::aux_box(),
                Element::zero_penalty(INFINITE),
                Element::glue(Elastic::stiff(Abs::pt(1.0)), aux, false),
            ])
        );
    }

    #[test]
    fn test_preserved_space_moves_to_next_line() {
        let props =
            TextProps::default().with_white_space_treatment(WhiteSpaceTreatment::Preserve);
        let elements = single("AB CD", props, Alignment::Start);
        let u = DEFAULT_SPACE_WIDTH;
        let aux = Position::Auxiliary;
        assert_eq!(
            elements,
            [
                Element::boxed(Abs::pt(12.0), Position::Leaf(0), false),
                Element::glue(Elastic::new(Abs::zero(), u * 3.0, Abs::zero()), aux, false),
                Element::zero_penalty(0),
                Element::glue(Elastic::new(Abs::zero(), u * -3.0, Abs::zero()), aux, false),
                Element::aux_box(),
                Element::zero_penalty(INFINITE),
                Element::glue(Elastic::stiff(Abs::pt(3.0)), Position::Leaf(1), false),
                Element::boxed(Abs::pt(12.0), Position::Leaf(2), false),
            ]
        );
    }

    #[test]
    fn test_explicit_break_ends_with_line_end_glue() {
        let props = TextProps::default().with_line_bap(Abs::zero(), Abs::pt(2.0));
        let mut layouter = layouter("AB\nCD", props);
        let sequences = layouter.elements(Alignment::Start).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(
            sequences[0].elements(),
            [
                Element::boxed(Abs::pt(12.0), Position::Leaf(0), false),
                Element::glue(Elastic::stiff(Abs::pt(2.0)), Position::Auxiliary, true),
                Element::forced_break(),
            ]
        );
        assert_eq!(sequences[0].content().len(), 1);
    }
}
