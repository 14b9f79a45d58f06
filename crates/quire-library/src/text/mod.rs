//! Text handling.

pub mod chars;
pub mod font;

mod bidi;
mod hyphenate;
mod props;
mod run;
mod space;
mod transform;

pub use self::bidi::resolve_bidi_levels;
pub use self::font::{
    Font, FontList, GlyphAdjustment, MonoFont, OpenTypeFont, resolve_lang,
    resolve_script, same_font,
};
pub use self::hyphenate::{HyphContext, Hyphenator, PatternHyphenator};
pub use self::props::{Spacing, TextProps};
pub use self::run::CharacterRun;
pub use self::space::{LinefeedTreatment, WhiteSpaceTreatment, handle_white_space};
pub use self::transform::{TextContext, TextTransform};
