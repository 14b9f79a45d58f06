//! Named characters and character classes the layout engine cares about.

/// The regular space.
pub const SPACE: char = ' ';
/// The no-break space.
pub const NBSPACE: char = '\u{00A0}';
/// The narrow no-break space.
pub const NARROW_NBSPACE: char = '\u{202F}';
/// The ideographic space.
pub const IDEOGRAPHIC_SPACE: char = '\u{3000}';
/// The zero-width space.
pub const ZERO_WIDTH_SPACE: char = '\u{200B}';
/// The word joiner.
pub const WORD_JOINER: char = '\u{2060}';
/// The zero-width no-break space (byte order mark).
pub const ZERO_WIDTH_NOBREAK_SPACE: char = '\u{FEFF}';
/// The soft hyphen.
pub const SOFT_HYPHEN: char = '\u{00AD}';
/// The line feed.
pub const LINEFEED: char = '\n';
/// The carriage return.
pub const CARRIAGE_RETURN: char = '\r';
/// The next-line control character.
pub const NEXT_LINE: char = '\u{0085}';
/// The line separator.
pub const LINE_SEPARATOR: char = '\u{2028}';
/// The paragraph separator.
pub const PARAGRAPH_SEPARATOR: char = '\u{2029}';

/// Characters after which a line may end without adding a hyphen.
pub const BREAK_CHARS: &[char] = &['-', '/'];

/// Whether the character forces a line break.
pub fn is_explicit_break(c: char) -> bool {
    matches!(
        c,
        LINEFEED | CARRIAGE_RETURN | NEXT_LINE | LINE_SEPARATOR | PARAGRAPH_SEPARATOR
    )
}

/// Whether the character is a space that prohibits a break.
pub fn is_non_breakable_space(c: char) -> bool {
    matches!(
        c,
        NBSPACE | NARROW_NBSPACE | IDEOGRAPHIC_SPACE | WORD_JOINER | ZERO_WIDTH_NOBREAK_SPACE
    )
}

/// Whether the character is a space with a width fixed by the font rather
/// than by word spacing.
pub fn is_fixed_width_space(c: char) -> bool {
    matches!(c, '\u{2000}'..='\u{200B}' | IDEOGRAPHIC_SPACE)
}

/// Whether the character is a space of zero width.
pub fn is_zero_width_space(c: char) -> bool {
    matches!(c, ZERO_WIDTH_SPACE | WORD_JOINER | ZERO_WIDTH_NOBREAK_SPACE)
}

/// Whether the character is any kind of space that separates words.
pub fn is_space(c: char) -> bool {
    c == SPACE || is_non_breakable_space(c) || is_fixed_width_space(c)
}

/// Whether a line may end after this character without a hyphen.
pub fn is_break_char(c: char) -> bool {
    BREAK_CHARS.contains(&c)
}

/// Whether this is an XML whitespace character other than the line feed.
pub fn is_xml_white_space(c: char) -> bool {
    matches!(c, SPACE | '\t' | CARRIAGE_RETURN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_classes() {
        assert!(is_space(SPACE));
        assert!(is_space(NBSPACE));
        assert!(is_space(ZERO_WIDTH_SPACE));
        assert!(is_space(WORD_JOINER));
        assert!(!is_space(SOFT_HYPHEN));
        assert!(is_fixed_width_space('\u{2003}'));
        assert!(!is_fixed_width_space(NBSPACE));
        assert!(is_explicit_break('\n'));
        assert!(!is_explicit_break(SPACE));
        assert!(is_break_char('/'));
    }
}
