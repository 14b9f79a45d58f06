/// The four directions into which text can be laid out.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Dir {
    /// Left to right.
    #[default]
    LTR,
    /// Right to left.
    RTL,
    /// Top to bottom.
    TTB,
    /// Bottom to top.
    BTT,
}

impl Dir {
    /// Whether this direction runs along the horizontal axis.
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::LTR | Self::RTL)
    }

    /// Whether this direction points into the positive coordinate direction.
    ///
    /// The positive directions are left-to-right and top-to-bottom.
    pub const fn is_positive(self) -> bool {
        match self {
            Self::LTR | Self::TTB => true,
            Self::RTL | Self::BTT => false,
        }
    }

    /// The inverse direction.
    pub const fn inv(self) -> Self {
        match self {
            Self::LTR => Self::RTL,
            Self::RTL => Self::LTR,
            Self::TTB => Self::BTT,
            Self::BTT => Self::TTB,
        }
    }
}
