//! Quire's text fragmentation and line-breaking engine.
//!
//! A [`TextLayouter`] scans a frozen [`CharacterRun`](quire_library::text::CharacterRun)
//! once, partitions it into [`FragmentInfo`] records and emits Knuth boxes,
//! glues and penalties for an optimal-fit line breaker. The fragments can
//! later be revised (hyphenation, letter-space insertion) and turned into
//! [`TextArea`]s once the breakpoints are known.

mod inline;

pub use self::inline::{
    AreaContext, BreakAction, BreakClassifier, DEFAULT_SPACE_WIDTH, Element, ElementKind,
    FLAGGED_PENALTY, FragmentInfo, FragmentKind, INFINITE, KnuthSequence, Line, Position,
    SOFT_HYPHEN_PENALTY, SpaceArea, TextArea, TextItem, TextLayouter, TextLine, WordArea,
    finish_paragraph, layout_paragraph, linebreak,
};
