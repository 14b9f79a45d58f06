use std::fmt::{self, Debug, Formatter};

use quire_library::layout::{Abs, Elastic};

/// The penalty value that forbids (positive) or forces (negative) a break.
pub const INFINITE: i32 = 1000;

/// The penalty of a flagged break, i.e. one that inserts a hyphen.
pub const FLAGGED_PENALTY: i32 = 50;

/// The penalty of breaking after a hyphen-like character.
pub const SOFT_HYPHEN_PENALTY: i32 = 1;

/// The stretch unit of glues in ragged and centered text.
pub const DEFAULT_SPACE_WIDTH: Abs = Abs::pt(3.336);

/// Where an element came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Position {
    /// The fragment with this index.
    Leaf(usize),
    /// No fragment: pure formatting material.
    Auxiliary,
}

impl Position {
    /// The fragment index, if any.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Leaf(index) => Some(index),
            Self::Auxiliary => None,
        }
    }
}

/// The three Knuth primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ElementKind {
    /// Fixed-width content.
    Box(Abs),
    /// Adjustable space.
    Glue(Elastic),
    /// A candidate breakpoint.
    Penalty {
        /// The width added to the line if the break is taken.
        width: Abs,
        /// The cost of breaking here.
        cost: i32,
        /// Whether the break inserts a hyphen.
        flagged: bool,
    },
}

/// A line-breaking element.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Element {
    /// What the element is.
    pub kind: ElementKind,
    /// The fragment the element belongs to.
    pub position: Position,
    /// Whether the element is an auxiliary anchor or filler.
    pub auxiliary: bool,
}

impl Element {
    /// A box.
    pub fn boxed(width: Abs, position: Position, auxiliary: bool) -> Self {
        Self { kind: ElementKind::Box(width), position, auxiliary }
    }

    /// A glue.
    pub fn glue(glue: Elastic, position: Position, auxiliary: bool) -> Self {
        Self { kind: ElementKind::Glue(glue), position, auxiliary }
    }

    /// A penalty.
    pub fn penalty(
        width: Abs,
        cost: i32,
        flagged: bool,
        position: Position,
        auxiliary: bool,
    ) -> Self {
        Self {
            kind: ElementKind::Penalty { width, cost, flagged },
            position,
            auxiliary,
        }
    }

    /// A zero-width auxiliary penalty.
    pub fn zero_penalty(cost: i32) -> Self {
        Self::penalty(Abs::zero(), cost, false, Position::Auxiliary, true)
    }

    /// A zero-width auxiliary box that stops glue from being discarded at the
    /// start of a line.
    pub fn aux_box() -> Self {
        Self::boxed(Abs::zero(), Position::Auxiliary, true)
    }

    /// A penalty that forces a break.
    pub fn forced_break() -> Self {
        Self::penalty(Abs::zero(), -INFINITE, false, Position::Auxiliary, false)
    }

    /// Whether this is a box.
    pub fn is_box(&self) -> bool {
        matches!(self.kind, ElementKind::Box(_))
    }

    /// Whether this is a glue.
    pub fn is_glue(&self) -> bool {
        matches!(self.kind, ElementKind::Glue(_))
    }

    /// Whether this penalty forces a break.
    pub fn is_forced_break(&self) -> bool {
        matches!(self.kind, ElementKind::Penalty { cost, .. } if cost <= -INFINITE)
    }

    /// The natural width the element contributes to a line it is inside of.
    pub fn width(&self) -> Abs {
        match self.kind {
            ElementKind::Box(width) => width,
            ElementKind::Glue(glue) => glue.opt,
            ElementKind::Penalty { .. } => Abs::zero(),
        }
    }
}

impl Debug for Element {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.kind {
            ElementKind::Box(width) => write!(f, "Box({width:?}")?,
            ElementKind::Glue(glue) => write!(f, "Glue({glue:?}")?,
            ElementKind::Penalty { width, cost, flagged } => {
                write!(f, "Penalty({width:?}, {cost}")?;
                if flagged {
                    f.write_str(", flagged")?;
                }
            }
        }
        if let Position::Leaf(index) = self.position {
            write!(f, ", #{index}")?;
        }
        if self.auxiliary {
            f.write_str(", aux")?;
        }
        f.write_str(")")
    }
}

/// The elements between two explicit breaks.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub struct KnuthSequence {
    elements: Vec<Element>,
    /// Where the elements emitted for fragments end, once the sequence was
    /// closed by an explicit break.
    content_end: Option<usize>,
}

impl KnuthSequence {
    /// Create an empty, open sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// The elements.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Take the elements out of the sequence.
    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the sequence holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether an explicit break closed the sequence.
    pub fn is_closed(&self) -> bool {
        self.content_end.is_some()
    }

    /// The elements that were emitted for fragments, excluding the closing
    /// glue and penalty.
    pub fn content(&self) -> &[Element] {
        &self.elements[..self.content_end()]
    }

    /// Where the elements emitted for fragments end.
    pub fn content_end(&self) -> usize {
        self.content_end.unwrap_or(self.elements.len())
    }

    /// Append an element.
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Append several elements.
    pub fn extend(&mut self, elements: impl IntoIterator<Item = Element>) {
        self.elements.extend(elements);
    }

    /// Replace the content with new elements, keeping the closing glue and
    /// penalty.
    pub fn replace_content(&mut self, content: Vec<Element>) {
        let tail = self.elements.split_off(self.content_end());
        self.elements = content;
        if self.content_end.is_some() {
            self.content_end = Some(self.elements.len());
        }
        self.elements.extend(tail);
    }

    /// Close the sequence at an explicit break: append the optional glue
    /// and a forced break.
    pub fn end_sequence(&mut self, glue: Option<Element>) {
        self.content_end = Some(self.elements.len());
        self.elements.extend(glue);
        self.elements.push(Element::forced_break());
    }

    /// Remove the forced break that closes the sequence, if any.
    pub(crate) fn pop_forced_break(&mut self) {
        if self.elements.last().is_some_and(Element::is_forced_break) {
            self.elements.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_keeps_tail_when_content_is_replaced() {
        let mut sequence = KnuthSequence::new();
        sequence.push(Element::boxed(Abs::pt(10.0), Position::Leaf(0), false));
        sequence.end_sequence(Some(Element::glue(
            Abs::pt(2.0).into(),
            Position::Auxiliary,
            true,
        )));
        assert!(sequence.is_closed());
        assert_eq!(sequence.content().len(), 1);

        sequence.replace_content(vec![
            Element::boxed(Abs::pt(4.0), Position::Leaf(0), false),
            Element::boxed(Abs::pt(6.0), Position::Leaf(1), false),
        ]);
        assert_eq!(sequence.len(), 4);
        assert_eq!(sequence.content_end(), 2);
        assert!(sequence.elements()[3].is_forced_break());
    }

    #[test]
    fn test_element_debug() {
        let penalty = Element::penalty(Abs::pt(1.0), 50, true, Position::Leaf(3), false);
        assert_eq!(format!("{penalty:?}"), "Penalty(1.0pt, 50, flagged, #3)");
        assert_eq!(format!("{:?}", Element::aux_box()), "Box(0.0pt, aux)");
    }
}
