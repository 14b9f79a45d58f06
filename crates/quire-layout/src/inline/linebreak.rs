use quire_library::layout::{Abs, Elastic};

use super::{DEFAULT_SPACE_WIDTH, Element, ElementKind, INFINITE, KnuthSequence, Position};

/// A line chosen by the line breaker.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Line {
    /// The index of the first element on the line.
    pub start: usize,
    /// The index of the breakpoint element that ends the line.
    pub end: usize,
    /// How much the line's glue must stretch (positive) or shrink (negative)
    /// relative to its stretchability or shrinkability.
    pub ratio: f64,
    /// The natural width of the line, including the width of a penalty it
    /// breaks at.
    pub natural: Abs,
    /// Whether the line ends at a flagged penalty, i.e. with a hyphen.
    pub flagged: bool,
    /// Whether the line ends at a forced break.
    pub forced: bool,
}

impl Line {
    /// Whether the line is wider than the available width even at maximum
    /// shrink.
    pub fn is_overfull(&self) -> bool {
        self.ratio < -1.0
    }
}

/// Append the material that ends a paragraph: the last line may be filled
/// with arbitrary space and must end there.
pub fn finish_paragraph(sequence: &mut KnuthSequence) {
    sequence.pop_forced_break();
    sequence.push(Element::zero_penalty(INFINITE));
    sequence.push(Element::glue(
        Elastic::new(Abs::zero(), Abs::pt(10000.0), Abs::zero()),
        Position::Auxiliary,
        true,
    ));
    sequence.push(Element::forced_break());
}

/// Break an element sequence into lines of the given width, minimizing the
/// total cost of all lines.
///
/// The sequence should end with a forced break, as left by
/// [`finish_paragraph`]; the end of the sequence is treated as one
/// otherwise.
#[tracing::instrument(name = "linebreak", skip_all, fields(elements = elements.len()))]
pub fn linebreak(elements: &[Element], width: Abs) -> Vec<Line> {
    /// The cost of a line or paragraph layout.
    type Cost = f64;

    /// An entry in the dynamic programming table.
    struct Entry {
        pred: usize,
        total: Cost,
        line: Line,
        /// Where the line after this one starts.
        next: usize,
    }

    // Cost parameters.
    const CONSECUTIVE_HYPHEN_COST: Cost = 0.3;
    const MAX_COST: Cost = 1_000_000.0;
    const MIN_RATIO: f64 = -1.0;

    let sums = PrefixSums::new(elements);

    // Dynamic programming table.
    let mut active = 0;
    let mut table = vec![Entry {
        pred: 0,
        total: 0.0,
        line: Line {
            start: 0,
            end: 0,
            ratio: 0.0,
            natural: Abs::zero(),
            flagged: false,
            forced: true,
        },
        next: 0,
    }];

    for (end, breakpoint) in breakpoints(elements) {
        let k = table.len();
        let mut best: Option<Entry> = None;

        // Find the optimal predecessor.
        for (i, pred) in table.iter().enumerate().skip(active) {
            let start = pred.next;
            let natural = sums.width(start, end) + breakpoint.width;

            // Determine how much the line's glue would need to be stretched
            // to make it the desired width.
            let delta = width - natural;
            let adjust = if delta >= Abs::zero() {
                sums.stretch(start, end)
            } else {
                sums.shrink(start, end)
            };
            let mut ratio = delta / adjust;
            if ratio.is_nan() {
                // The line is not stretchable, but it just fits.
                ratio = 0.0;
            }
            if ratio > 1.0 {
                // The line is underfull. Normalize the extra amount by the
                // default space width.
                ratio = 1.0 + (delta - adjust) / DEFAULT_SPACE_WIDTH;
            }

            let mut cost = if ratio < MIN_RATIO {
                // The line is overfull. If this is the earliest breakpoint in
                // the active set, remove it from the active set.
                if active == i {
                    active += 1;
                }
                MAX_COST
            } else if breakpoint.forced {
                // No line can span across a forced break.
                active = k;
                if ratio < 0.0 { ratio.powi(3).abs() } else { 0.0 }
            } else {
                ratio.powi(3).abs()
            };

            if breakpoint.penalty > 0 {
                cost += f64::from(breakpoint.penalty) / 100.0;
            }

            // Knuth's demerits (1 + 100|r|^3 + p)^2, divided by 100.
            cost = (0.01 + cost).powi(2);

            // Penalize two consecutive hyphens extra.
            if breakpoint.flagged && pred.line.flagged {
                cost += CONSECUTIVE_HYPHEN_COST;
            }

            // The total cost of this line and its chain of predecessors.
            let total = pred.total + cost;

            // If this attempt is better than what we had before, take it!
            if best.as_ref().is_none_or(|best| best.total >= total) {
                let line = Line {
                    start,
                    end,
                    ratio,
                    natural,
                    flagged: breakpoint.flagged,
                    forced: breakpoint.forced,
                };
                best = Some(Entry { pred: i, total, line, next: line_start(elements, end) });
            }
        }

        if let Some(best) = best {
            table.push(best);
        }
    }

    // Retrace the best path.
    let mut lines = Vec::new();
    let mut idx = table.len() - 1;
    while idx != 0 {
        let entry = &table[idx];
        lines.push(entry.line);
        idx = entry.pred;
    }

    lines.reverse();
    tracing::debug!(lines = lines.len(), "broke paragraph");
    lines
}

/// A point where a line may end.
struct Breakpoint {
    /// The width added to the line if it ends here.
    width: Abs,
    /// The penalty of breaking here.
    penalty: i32,
    flagged: bool,
    forced: bool,
}

/// All legal breakpoints: penalties that do not forbid a break and glue
/// directly after a box.
fn breakpoints(elements: &[Element]) -> impl Iterator<Item = (usize, Breakpoint)> + '_ {
    let legal = elements.iter().enumerate().filter_map(|(i, element)| match element.kind {
        ElementKind::Penalty { width, cost, flagged } if cost < INFINITE => Some((
            i,
            Breakpoint { width, penalty: cost, flagged, forced: cost <= -INFINITE },
        )),
        ElementKind::Glue(_) if i > 0 && elements[i - 1].is_box() => Some((
            i,
            Breakpoint { width: Abs::zero(), penalty: 0, flagged: false, forced: false },
        )),
        _ => None,
    });

    // The end of the sequence is a forced break unless one is already there.
    let implicit_end = (!elements.last().is_some_and(Element::is_forced_break)).then(|| {
        (
            elements.len(),
            Breakpoint { width: Abs::zero(), penalty: 0, flagged: false, forced: true },
        )
    });

    legal.chain(implicit_end)
}

/// Where the line after a break at `end` starts: glue and penalties after
/// the break are discarded up to the next box or forced break.
fn line_start(elements: &[Element], end: usize) -> usize {
    let mut start = end + 1;
    while let Some(element) = elements.get(start) {
        if element.is_box() || element.is_forced_break() {
            break;
        }
        start += 1;
    }
    start
}

/// Cumulative widths, stretchabilities and shrinkabilities of boxes and
/// glue.
struct PrefixSums {
    sums: Vec<Elastic>,
}

impl PrefixSums {
    fn new(elements: &[Element]) -> Self {
        let mut sums = Vec::with_capacity(elements.len() + 1);
        let mut sum = Elastic::ZERO;
        sums.push(sum);
        for element in elements {
            match element.kind {
                ElementKind::Box(width) => sum = sum.plus(width),
                ElementKind::Glue(glue) => sum += glue,
                ElementKind::Penalty { .. } => {}
            }
            sums.push(sum);
        }
        Self { sums }
    }

    fn range(&self, start: usize, end: usize) -> Elastic {
        let end = end.min(self.sums.len() - 1);
        let start = start.min(end);
        self.sums[end] - self.sums[start]
    }

    fn width(&self, start: usize, end: usize) -> Abs {
        self.range(start, end).opt
    }

    fn stretch(&self, start: usize, end: usize) -> Abs {
        self.range(start, end).stretch
    }

    fn shrink(&self, start: usize, end: usize) -> Abs {
        self.range(start, end).shrink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inline::FLAGGED_PENALTY;

    fn word(index: usize) -> Element {
        Element::boxed(Abs::pt(10.0), Position::Leaf(index), false)
    }

    fn space(index: usize) -> Element {
        Element::glue(
            Elastic::new(Abs::pt(3.0), Abs::pt(1.5), Abs::pt(1.0)),
            Position::Leaf(index),
            false,
        )
    }

    fn paragraph(words: usize) -> KnuthSequence {
        let mut sequence = KnuthSequence::new();
        for i in 0..words {
            if i > 0 {
                sequence.push(space(2 * i - 1));
            }
            sequence.push(word(2 * i));
        }
        finish_paragraph(&mut sequence);
        sequence
    }

    #[test]
    fn test_linebreak_fills_lines_exactly() {
        let sequence = paragraph(6);
        let lines = linebreak(sequence.elements(), Abs::pt(36.0));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].start, 0);
        assert_eq!(lines[0].end, 5);
        assert_eq!(lines[0].natural, Abs::pt(36.0));
        assert_eq!(lines[0].ratio, 0.0);
        assert!(!lines[0].forced);
        assert_eq!(lines[1].start, 6);
        assert_eq!(lines[1].end, sequence.len() - 1);
        assert!(lines[1].forced);
    }

    #[test]
    fn test_linebreak_last_line_may_be_short() {
        // The filling glue absorbs the short last line, so the first line is
        // filled completely.
        let sequence = paragraph(4);
        let lines = linebreak(sequence.elements(), Abs::pt(36.0));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].end, 5);
    }

    #[test]
    fn test_linebreak_honours_forced_breaks() {
        let mut sequence = KnuthSequence::new();
        sequence.push(word(0));
        sequence.end_sequence(None);
        sequence.push(word(1));
        finish_paragraph(&mut sequence);

        let lines = linebreak(sequence.elements(), Abs::pt(100.0));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].end, 1);
        assert!(lines[0].forced);
        assert_eq!(lines[1].start, 2);
    }

    #[test]
    fn test_linebreak_at_flagged_penalty_adds_hyphen() {
        let mut sequence = KnuthSequence::new();
        sequence.push(Element::boxed(Abs::pt(20.0), Position::Leaf(0), false));
        sequence.push(Element::penalty(
            Abs::pt(5.0),
            FLAGGED_PENALTY,
            true,
            Position::Auxiliary,
            false,
        ));
        sequence.push(Element::boxed(Abs::pt(20.0), Position::Leaf(1), false));
        finish_paragraph(&mut sequence);

        let lines = linebreak(sequence.elements(), Abs::pt(30.0));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].end, 1);
        assert!(lines[0].flagged);
        assert_eq!(lines[0].natural, Abs::pt(25.0));
        assert_eq!(lines[1].start, 2);
    }

    #[test]
    fn test_linebreak_keeps_overfull_lines() {
        let mut sequence = KnuthSequence::new();
        sequence.push(Element::boxed(Abs::pt(50.0), Position::Leaf(0), false));
        finish_paragraph(&mut sequence);

        let lines = linebreak(sequence.elements(), Abs::pt(30.0));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_overfull());
    }

    #[test]
    fn test_linebreak_without_final_break() {
        let elements = [word(0), space(1), word(2)];
        let lines = linebreak(&elements, Abs::pt(100.0));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].end, 3);
        assert_eq!(lines[0].natural, Abs::pt(23.0));
    }

    #[test]
    fn test_finish_paragraph_replaces_forced_break() {
        let mut sequence = KnuthSequence::new();
        sequence.push(word(0));
        sequence.end_sequence(None);
        finish_paragraph(&mut sequence);
        let elements = sequence.elements();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[1], Element::zero_penalty(INFINITE));
        assert!(elements[2].is_glue());
        assert!(elements[3].is_forced_break());
        assert_eq!(elements.iter().filter(|e| e.is_forced_break()).count(), 1);
    }
}
