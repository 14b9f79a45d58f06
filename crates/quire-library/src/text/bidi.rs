use unicode_bidi::{BidiInfo, Level};

use crate::diag::{StrResult, bail};
use crate::layout::Dir;
use crate::text::CharacterRun;

/// Resolve the bidirectional embedding level of every character of a run
/// and record it on the run.
///
/// The base direction must be horizontal.
pub fn resolve_bidi_levels(run: &mut CharacterRun, base: Dir) -> StrResult<()> {
    let level = match base {
        Dir::LTR => Level::ltr(),
        Dir::RTL => Level::rtl(),
        _ => bail!("bidi resolution requires a horizontal base direction"),
    };

    if run.is_empty() {
        return Ok(());
    }

    let text = run.text();
    let bidi = BidiInfo::new(&text, Some(level));

    let mut index = 0;
    let mut start = 0;
    let mut current: Option<u8> = None;
    for (byte, _) in text.char_indices() {
        let level = bidi.levels[byte].number();
        if current != Some(level) {
            if let Some(prev) = current {
                run.set_levels(start..index, prev)?;
            }
            start = index;
            current = Some(level);
        }
        index += 1;
    }

    if let Some(prev) = current {
        run.set_levels(start..index, prev)?;
    }

    Ok(())
}
