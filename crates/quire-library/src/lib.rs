//! Quire's text data model.
//!
//! This crate holds everything the layout engine consumes but does not
//! decide itself:
//! - **Units:** Absolute lengths and elastic (optimum/stretch/shrink) triples
//!   live in [`layout`].
//! - **Text:** The [`CharacterRun`](text::CharacterRun) buffer, per-node
//!   [`TextProps`](text::TextProps), the [`Font`](text::Font) abstraction,
//!   bidi resolution, whitespace handling, text transforms and hyphenation
//!   dictionaries live in [`text`].
//! - **Diagnostics:** Errors and warnings raised during layout are defined in
//!   [`diag`] and collected by the [`Sink`](engine::Sink).

pub mod diag;
pub mod engine;
pub mod layout;
pub mod text;
