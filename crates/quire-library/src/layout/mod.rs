//! Units and directions used by text layout.

mod abs;
mod align;
mod dir;
mod elastic;

pub use self::abs::*;
pub use self::align::*;
pub use self::dir::*;
pub use self::elastic::*;
