//! Layout of inline text: fragmentation, element emission and line breaking.

mod areas;
mod classify;
mod collect;
mod elements;
mod emit;
mod fragment;
mod linebreak;
mod revise;

pub use self::areas::{AreaContext, SpaceArea, TextArea, TextItem, WordArea};
pub use self::classify::{BreakAction, BreakClassifier};
pub use self::collect::TextLayouter;
pub use self::elements::{
    DEFAULT_SPACE_WIDTH, Element, ElementKind, FLAGGED_PENALTY, INFINITE, KnuthSequence,
    Position, SOFT_HYPHEN_PENALTY,
};
pub use self::fragment::{FragmentInfo, FragmentKind};
pub use self::linebreak::{Line, finish_paragraph, linebreak};

pub(crate) use self::fragment::PendingChange;

use quire_library::diag::{At, LayoutResult, Warned, warning};
use quire_library::layout::Abs;
use quire_library::text::{
    CharacterRun, FontList, HyphContext, Hyphenator, PatternHyphenator, TextContext, TextProps,
    handle_white_space, resolve_bidi_levels,
};

/// A laid out line of a paragraph.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The text areas on the line, in logical order.
    pub areas: Vec<TextArea>,
    /// The adjustment ratio the line breaker chose.
    pub ratio: f64,
    /// The total width of the areas.
    pub width: Abs,
}

/// Lay out a paragraph of text into lines of the given width.
///
/// Runs the whole pipeline: whitespace handling, text transform and bidi
/// resolution on the run, element generation, hyphenation of every word if
/// enabled, line breaking and text area construction. Overfull lines are
/// kept and reported as warnings.
#[tracing::instrument(name = "layout_paragraph", skip_all, fields(width = ?width))]
pub fn layout_paragraph(
    text: &str,
    props: TextProps,
    fonts: FontList,
    width: Abs,
    hyphenator: Option<&dyn Hyphenator>,
) -> LayoutResult<Warned<Vec<TextLine>>> {
    let mut run = CharacterRun::new(&props);
    run.push_str(text).at(0)?;
    handle_white_space(&mut run, &props).at(0)?;
    props.text_transform.apply(&mut run, &TextContext::default()).at(0)?;
    resolve_bidi_levels(&mut run, props.dir).at(0)?;

    let alignment = props.alignment;
    let mut layouter = TextLayouter::new(run, props, fonts);
    let mut sequences = layouter.elements(alignment)?;

    let props = layouter.props().clone();
    if props.hyphenate
        && let Some(lang) = &props.lang
    {
        let patterns = PatternHyphenator::new(props.hyphenation_remain, props.hyphenation_push);
        let hyphenator = hyphenator.unwrap_or(&patterns);
        for sequence in &mut sequences {
            hyphenate_sequence(&mut layouter, sequence, hyphenator, lang)?;
        }
    }

    let mut paragraph = KnuthSequence::new();
    for sequence in sequences {
        paragraph.extend(sequence.into_elements());
    }
    finish_paragraph(&mut paragraph);

    let elements = paragraph.elements();
    let mut sink = layouter.take_warnings();
    let mut lines = Vec::new();
    for line in linebreak(elements, width) {
        let leaves = elements[line.start..line.end.min(elements.len())]
            .iter()
            .filter_map(|element| element.position.index());
        let range = leaves.clone().min().zip(leaves.max());

        let mut ratio = if line.forced { line.ratio.min(0.0) } else { line.ratio };
        if !alignment.is_justified() {
            ratio = 0.0;
        }
        let ctx = AreaContext { ipd_adjust: ratio.max(-1.0), is_last_area: true };

        let areas = match range {
            Some((first, last)) => layouter.build_text_areas(first..=last, ctx)?,
            None => Vec::new(),
        };

        if line.is_overfull() {
            let index = range
                .and_then(|(first, _)| layouter.fragments().get(first))
                .map_or(0, |fragment| fragment.start);
            let overflow = line.natural - width;
            sink.warn(
                warning!(index, "line overflows the available width by {overflow:?}")
                    .with_hint("enable hyphenation or allow the line to be wider"),
            );
        }

        let line_width = areas.iter().map(|area| area.width).sum();
        lines.push(TextLine { areas, ratio: line.ratio, width: line_width });
    }

    Ok(sink.finish(lines))
}

/// Hyphenate every word of a sequence and splice the re-emitted elements
/// back in.
fn hyphenate_sequence(
    layouter: &mut TextLayouter,
    sequence: &mut KnuthSequence,
    hyphenator: &dyn Hyphenator,
    lang: &str,
) -> LayoutResult<()> {
    let mut words: Vec<Position> = sequence
        .content()
        .iter()
        .filter(|element| element.is_box() && !element.auxiliary)
        .map(|element| element.position)
        .filter(|position| position.index().is_some())
        .collect();
    words.dedup();

    for position in words {
        let chars = layouter.word_chars(position)?;
        let Some(points) = hyphenator.hyphenate(chars, lang) else { continue };
        if points.is_empty() {
            continue;
        }
        let mut ctx = HyphContext::new(points);
        layouter.hyphenate(position, &mut ctx)?;
    }

    // Earlier splits shift the indices of this sequence's fragments, so the
    // content is re-emitted whenever anything moved.
    let alignment = layouter.props().alignment;
    let offset = layouter.change_offset();
    let changed = layouter.apply_changes(sequence.content());
    if (changed || offset > 0)
        && let Some(elements) = layouter.changed_elements(alignment)
    {
        sequence.replace_content(elements);
    }

    Ok(())
}
