use icu_properties::{GeneralCategory, LineBreak};

/// The kind of line break opportunity between the previous character and
/// the current one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BreakAction {
    /// No break is allowed.
    Prohibited,
    /// No break is allowed before a combining mark.
    CombiningProhibited,
    /// The line must break.
    Explicit,
    /// A break is allowed, even without intervening spaces.
    Direct,
    /// A break is allowed only if spaces intervene.
    Indirect,
    /// A break before a combining mark that follows spaces.
    CombiningIndirect,
}

impl BreakAction {
    /// Whether a line may end before the current character.
    pub fn is_opportunity(self) -> bool {
        matches!(self, Self::Direct | Self::Indirect | Self::CombiningIndirect)
    }
}

/// Classifies line break opportunities one character at a time.
///
/// This is the pair-table based algorithm of UAX #14: the class of the last
/// non-space character is combined with the class of the current character
/// and whether spaces occurred in between.
#[derive(Debug, Clone)]
pub struct BreakClassifier {
    /// The class of the last character that was not a space.
    left: Option<Class>,
    /// Whether spaces were seen since `left` was set.
    had_space: bool,
    /// Whether every action is forced to `Prohibited`.
    keep_together: bool,
}

impl BreakClassifier {
    /// Create a classifier at the start of a text.
    pub fn new(keep_together: bool) -> Self {
        Self { left: None, had_space: false, keep_together }
    }

    /// Forget all context, as at the start of a text.
    pub fn reset(&mut self) {
        self.left = None;
        self.had_space = false;
    }

    /// Consume the next character and classify the opportunity before it.
    pub fn next_char(&mut self, c: char) -> BreakAction {
        let action = self.advance(Class::of(c));
        if self.keep_together { BreakAction::Prohibited } else { action }
    }

    fn advance(&mut self, current: Class) -> BreakAction {
        let Some(left) = self.left else {
            // Never break at the start of text. Leading combining marks are
            // treated as letters.
            self.left = Some(if current == Class::CM { Class::AL } else { current });
            return BreakAction::Prohibited;
        };

        match left {
            Class::BK | Class::LF | Class::NL => {
                self.reset();
                self.left = Some(current);
                return BreakAction::Explicit;
            }
            // CR LF is a single hard break, signalled after the LF.
            Class::CR if current != Class::LF => {
                self.reset();
                self.left = Some(current);
                return BreakAction::Explicit;
            }
            _ => {}
        }

        match current {
            Class::BK | Class::LF | Class::NL | Class::CR => {
                self.left = Some(current);
                return BreakAction::Prohibited;
            }
            Class::SP => {
                self.had_space = true;
                return BreakAction::Prohibited;
            }
            _ => {}
        }

        let had_space = std::mem::take(&mut self.had_space);
        match pair_action(left, current) {
            action @ (BreakAction::Prohibited | BreakAction::Direct) => {
                self.left = Some(current);
                action
            }
            BreakAction::Indirect => {
                self.left = Some(current);
                if had_space { BreakAction::Indirect } else { BreakAction::Prohibited }
            }
            BreakAction::CombiningIndirect => {
                if had_space {
                    self.left = Some(current);
                    BreakAction::CombiningIndirect
                } else {
                    BreakAction::CombiningProhibited
                }
            }
            BreakAction::CombiningProhibited => {
                if had_space {
                    self.left = Some(current);
                }
                BreakAction::CombiningProhibited
            }
            BreakAction::Explicit => BreakAction::Explicit,
        }
    }
}

/// A resolved line breaking class.
///
/// The first 27 variants are the rows and columns of the pair table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[allow(clippy::upper_case_acronyms)]
enum Class {
    OP,
    CL,
    CP,
    QU,
    GL,
    NS,
    EX,
    SY,
    IS,
    PR,
    PO,
    NU,
    AL,
    ID,
    IN,
    HY,
    BA,
    BB,
    B2,
    ZW,
    CM,
    WJ,
    H2,
    H3,
    JL,
    JV,
    JT,
    BK,
    CR,
    LF,
    NL,
    SP,
}

impl Class {
    /// Resolve the class of a character.
    ///
    /// Ambiguous, surrogate and unknown characters are treated as letters.
    /// Complex-context characters become combining marks if they are marks
    /// and letters otherwise. Classes newer than the pair table are mapped
    /// to their closest relative.
    fn of(c: char) -> Self {
        match icu_properties::maps::line_break().get(c) {
            LineBreak::OpenPunctuation => Self::OP,
            LineBreak::ClosePunctuation => Self::CL,
            LineBreak::CloseParenthesis => Self::CP,
            LineBreak::Quotation => Self::QU,
            LineBreak::Glue => Self::GL,
            LineBreak::Nonstarter | LineBreak::ConditionalJapaneseStarter => Self::NS,
            LineBreak::Exclamation => Self::EX,
            LineBreak::BreakSymbols => Self::SY,
            LineBreak::InfixNumeric => Self::IS,
            LineBreak::PrefixNumeric => Self::PR,
            LineBreak::PostfixNumeric => Self::PO,
            LineBreak::Numeric => Self::NU,
            LineBreak::Ideographic
            | LineBreak::EBase
            | LineBreak::EModifier
            | LineBreak::ContingentBreak => Self::ID,
            LineBreak::Inseparable => Self::IN,
            LineBreak::Hyphen => Self::HY,
            LineBreak::BreakAfter => Self::BA,
            LineBreak::BreakBefore => Self::BB,
            LineBreak::BreakBoth => Self::B2,
            LineBreak::ZWSpace => Self::ZW,
            LineBreak::CombiningMark | LineBreak::ZWJ => Self::CM,
            LineBreak::WordJoiner => Self::WJ,
            LineBreak::H2 => Self::H2,
            LineBreak::H3 => Self::H3,
            LineBreak::JL => Self::JL,
            LineBreak::JV => Self::JV,
            LineBreak::JT => Self::JT,
            LineBreak::MandatoryBreak => Self::BK,
            LineBreak::CarriageReturn => Self::CR,
            LineBreak::LineFeed => Self::LF,
            LineBreak::NextLine => Self::NL,
            LineBreak::Space => Self::SP,
            LineBreak::ComplexContext => {
                match icu_properties::maps::general_category().get(c) {
                    GeneralCategory::NonspacingMark | GeneralCategory::SpacingMark => {
                        Self::CM
                    }
                    _ => Self::AL,
                }
            }
            _ => Self::AL,
        }
    }

    /// The row or column of this class in the pair table.
    fn table_index(self) -> Option<usize> {
        let index = self as usize;
        (index < PAIR_TABLE.len()).then_some(index)
    }
}

/// The break action for a pair of adjacent classes.
///
/// Left classes without a table row (a space at the start of text) allow a
/// direct break.
fn pair_action(left: Class, right: Class) -> BreakAction {
    let (Some(row), Some(col)) = (left.table_index(), right.table_index()) else {
        return BreakAction::Direct;
    };
    match PAIR_TABLE[row][col] {
        b'^' => BreakAction::Prohibited,
        b'%' => BreakAction::Indirect,
        b'#' => BreakAction::CombiningIndirect,
        b'@' => BreakAction::CombiningProhibited,
        _ => BreakAction::Direct,
    }
}

/// The pair table. `^` prohibited, `%` indirect, `_` direct, `#` combining
/// indirect, `@` combining prohibited.
///
/// Columns: OP CL CP QU GL NS EX SY IS PR PO NU AL ID IN HY BA BB B2 ZW CM WJ
/// H2 H3 JL JV JT.
#[rustfmt::skip]
const PAIR_TABLE: [&[u8; 27]; 27] = [
    b"^^^^^^^^^^^^^^^^^^^^@^^^^^^", // OP
    b"_^^%%^^^^%%____%%__^#^_____", // CL
    b"_^^%%^^^^%%%%__%%__^#^_____", // CP
    b"^^^%%%^^^%%%%%%%%%%^#^%%%%%", // QU
    b"%^^%%%^^^%%%%%%%%%%^#^%%%%%", // GL
    b"_^^%%%^^^______%%__^#^_____", // NS
    b"_^^%%%^^^______%%__^#^_____", // EX
    b"_^^%%%^^^__%___%%__^#^_____", // SY
    b"_^^%%%^^^__%%__%%__^#^_____", // IS
    b"%^^%%%^^^__%%%_%%__^#^%%%%%", // PR
    b"%^^%%%^^^__%%__%%__^#^_____", // PO
    b"%^^%%%^^^%%%%_%%%__^#^_____", // NU
    b"%^^%%%^^^__%%_%%%__^#^_____", // AL
    b"_^^%%%^^^_%___%%%__^#^_____", // ID
    b"_^^%%%^^^_____%%%__^#^_____", // IN
    b"_^^%_%^^^__%___%%__^#^_____", // HY
    b"_^^%_%^^^______%%__^#^_____", // BA
    b"%^^%%%^^^%%%%%%%%%%^#^%%%%%", // BB
    b"_^^%%%^^^______%%_^^#^_____", // B2
    b"___________________^_______", // ZW
    b"%^^%%%^^^__%%_%%%__^#^_____", // CM
    b"%^^%%%^^^%%%%%%%%%%^#^%%%%%", // WJ
    b"_^^%%%^^^_%___%%%__^#^___%%", // H2
    b"_^^%%%^^^_%___%%%__^#^____%", // H3
    b"_^^%%%^^^_%___%%%__^#^%%%%_", // JL
    b"_^^%%%^^^_%___%%%__^#^___%%", // JV
    b"_^^%%%^^^_%___%%%__^#^____%", // JT
];

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str, keep_together: bool) -> Vec<BreakAction> {
        let mut classifier = BreakClassifier::new(keep_together);
        text.chars().map(|c| classifier.next_char(c)).collect()
    }

    #[test]
    fn test_break_after_spaces_is_indirect() {
        use BreakAction::*;
        assert_eq!(
            classify("ab  cd", false),
            [Prohibited, Prohibited, Prohibited, Prohibited, Indirect, Prohibited]
        );
    }

    #[test]
    fn test_break_after_hyphen_is_direct() {
        let actions = classify("well-known", false);
        assert_eq!(actions[4], BreakAction::Prohibited);
        assert_eq!(actions[5], BreakAction::Direct);
    }

    #[test]
    fn test_no_break_around_no_break_space() {
        let actions = classify("a\u{A0}b", false);
        assert!(actions.iter().all(|&action| action == BreakAction::Prohibited));
    }

    #[test]
    fn test_explicit_break_after_line_feed() {
        let actions = classify("ab\ncd", false);
        assert_eq!(actions[2], BreakAction::Prohibited);
        assert_eq!(actions[3], BreakAction::Explicit);
        assert_eq!(actions[4], BreakAction::Prohibited);

        let actions = classify("a\r\nb", false);
        assert_eq!(actions[2], BreakAction::Prohibited);
        assert_eq!(actions[3], BreakAction::Explicit);
    }

    #[test]
    fn test_break_after_zero_width_space() {
        let actions = classify("ab\u{200B}cd", false);
        assert_eq!(actions[3], BreakAction::Direct);
    }

    #[test]
    fn test_keep_together_prohibits_everything() {
        let actions = classify("ab cd-ef\ngh", true);
        assert!(actions.iter().all(|&action| action == BreakAction::Prohibited));
    }

    #[test]
    fn test_combining_mark_after_space() {
        let actions = classify("a \u{0301}", false);
        assert_eq!(actions[2], BreakAction::CombiningIndirect);
    }

    #[test]
    fn test_combining_mark_attaches_to_letter() {
        let actions = classify("a\u{0301}b", false);
        assert_eq!(actions[1], BreakAction::CombiningProhibited);
        assert!(!actions[1].is_opportunity());
        // The mark does not replace the letter as the left context.
        assert_eq!(actions[2], BreakAction::Prohibited);
    }

    #[test]
    fn test_reset_forgets_context() {
        let mut classifier = BreakClassifier::new(false);
        classifier.next_char('a');
        classifier.next_char(' ');
        classifier.reset();
        assert_eq!(classifier.next_char('b'), BreakAction::Prohibited);
    }
}
