/// How the lines of a paragraph are aligned along the inline axis.
///
/// This determines the exact shape of the glues and penalties emitted for
/// spaces and hyphenation points.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Alignment {
    /// Aligned at the start of the line.
    #[default]
    Start,
    /// Aligned at the end of the line.
    End,
    /// Centered within the line.
    Center,
    /// Stretched and shrunk to fill the line.
    Justify,
    /// Justified, but the line may not shrink. Used for the last line of a
    /// justified paragraph.
    LastLine,
}

impl Alignment {
    /// Whether spaces may be stretched under this alignment.
    pub fn is_justified(self) -> bool {
        matches!(self, Self::Justify | Self::LastLine)
    }
}
