use crate::diag::StrResult;
use crate::text::chars::{LINEFEED, SPACE, ZERO_WIDTH_SPACE, is_xml_white_space};
use crate::text::{CharacterRun, TextProps};

/// How whitespace characters other than line feeds are treated.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum WhiteSpaceTreatment {
    /// Keep all whitespace. Kept spaces are not collapsible at line ends.
    Preserve,
    /// Drop all whitespace.
    Ignore,
    /// Drop whitespace directly before a line feed.
    IgnoreIfBeforeLinefeed,
    /// Drop whitespace directly after a line feed.
    IgnoreIfAfterLinefeed,
    /// Drop whitespace directly before or after a line feed.
    #[default]
    IgnoreIfSurroundingLinefeed,
}

/// How line feeds are treated.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LinefeedTreatment {
    /// Keep line feeds as explicit line breaks.
    Preserve,
    /// Drop line feeds.
    Ignore,
    /// Turn line feeds into spaces.
    #[default]
    TreatAsSpace,
    /// Turn line feeds into zero-width spaces.
    TreatAsZeroWidthSpace,
}

/// Apply whitespace-treatment, linefeed-treatment and whitespace collapsing
/// to a run that is still being built.
pub fn handle_white_space(run: &mut CharacterRun, props: &TextProps) -> StrResult<()> {
    let chars = run.chars();
    let mut keep = vec![true; chars.len()];

    // Whitespace around line feeds.
    let mut i = 0;
    while i < chars.len() {
        if !is_xml_white_space(chars[i]) {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && is_xml_white_space(chars[i]) {
            i += 1;
        }

        let before_lf = chars.get(i) == Some(&LINEFEED);
        let after_lf = start > 0 && chars[start - 1] == LINEFEED;
        let drop = match props.white_space_treatment {
            WhiteSpaceTreatment::Preserve => false,
            WhiteSpaceTreatment::Ignore => true,
            WhiteSpaceTreatment::IgnoreIfBeforeLinefeed => before_lf,
            WhiteSpaceTreatment::IgnoreIfAfterLinefeed => after_lf,
            WhiteSpaceTreatment::IgnoreIfSurroundingLinefeed => before_lf || after_lf,
        };

        if drop {
            keep[start..i].fill(false);
        }
    }

    let mut out = Vec::with_capacity(chars.len());
    for (&c, keep) in chars.iter().zip(keep) {
        if !keep {
            continue;
        }

        let c = match c {
            LINEFEED => match props.linefeed_treatment {
                LinefeedTreatment::Preserve => LINEFEED,
                LinefeedTreatment::Ignore => continue,
                LinefeedTreatment::TreatAsSpace => SPACE,
                LinefeedTreatment::TreatAsZeroWidthSpace => ZERO_WIDTH_SPACE,
            },
            c if props.white_space_collapse && is_xml_white_space(c) => SPACE,
            c => c,
        };

        if props.white_space_collapse && c == SPACE && out.last() == Some(&SPACE) {
            continue;
        }

        out.push(c);
    }

    tracing::trace!(before = chars.len(), after = out.len(), "handled white space");
    run.replace_chars(out)
}
