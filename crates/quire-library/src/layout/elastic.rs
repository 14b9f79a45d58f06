use std::fmt::{self, Debug, Formatter};
use std::ops::{Add, Mul, Neg};

use super::Abs;

/// An adjustable length: an optimum together with how far it may stretch
/// and shrink.
///
/// Both `stretch` and `shrink` are distances from the optimum, so the
/// smallest admissible value is `opt - shrink` and the largest is
/// `opt + stretch`.
#[derive(Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Elastic {
    /// The preferred length.
    pub opt: Abs,
    /// How much the length may grow beyond the optimum.
    pub stretch: Abs,
    /// How much the length may shrink below the optimum.
    pub shrink: Abs,
}

impl Elastic {
    /// The zero length without any elasticity.
    pub const ZERO: Self = Self::stiff(Abs::zero());

    /// Create a new elastic length.
    pub const fn new(opt: Abs, stretch: Abs, shrink: Abs) -> Self {
        Self { opt, stretch, shrink }
    }

    /// Create a length that can neither stretch nor shrink.
    pub const fn stiff(opt: Abs) -> Self {
        Self { opt, stretch: Abs::zero(), shrink: Abs::zero() }
    }

    /// The smallest admissible length.
    pub fn min(self) -> Abs {
        self.opt - self.shrink
    }

    /// The largest admissible length.
    pub fn max(self) -> Abs {
        self.opt + self.stretch
    }

    /// Whether the length can neither stretch nor shrink.
    pub fn is_stiff(self) -> bool {
        self.stretch == Abs::zero() && self.shrink == Abs::zero()
    }

    /// Whether the length can stretch or shrink.
    pub fn is_elastic(self) -> bool {
        !self.is_stiff()
    }

    /// Whether any of the three components is non-zero.
    pub fn is_nonzero(self) -> bool {
        self.opt != Abs::zero() || self.is_elastic()
    }

    /// Add a fixed amount to the optimum only.
    pub fn plus(self, amount: Abs) -> Self {
        Self { opt: self.opt + amount, ..self }
    }
}

impl Debug for Elastic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", self.opt)?;
        if self.is_elastic() {
            write!(f, " +{:?} -{:?}", self.stretch, self.shrink)?;
        }
        Ok(())
    }
}

impl From<Abs> for Elastic {
    fn from(opt: Abs) -> Self {
        Self::stiff(opt)
    }
}

impl Neg for Elastic {
    type Output = Self;

    fn neg(self) -> Self {
        Self { opt: -self.opt, stretch: -self.stretch, shrink: -self.shrink }
    }
}

impl Add for Elastic {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            opt: self.opt + other.opt,
            stretch: self.stretch + other.stretch,
            shrink: self.shrink + other.shrink,
        }
    }
}

quire_utils::sub_impl!(Elastic - Elastic -> Elastic);

impl Mul<usize> for Elastic {
    type Output = Self;

    fn mul(self, count: usize) -> Self {
        Self {
            opt: self.opt * count,
            stretch: self.stretch * count,
            shrink: self.shrink * count,
        }
    }
}

impl Mul<f64> for Elastic {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self {
            opt: self.opt * factor,
            stretch: self.stretch * factor,
            shrink: self.shrink * factor,
        }
    }
}

quire_utils::assign_impl!(Elastic += Elastic);
quire_utils::assign_impl!(Elastic -= Elastic);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elastic_arithmetic() {
        let space = Elastic::new(Abs::pt(3.0), Abs::pt(1.5), Abs::pt(1.0));
        let double = space * 2usize;
        assert_eq!(double.opt, Abs::pt(6.0));
        assert_eq!(double.min(), Abs::pt(4.0));
        assert_eq!(double.max(), Abs::pt(9.0));
        assert_eq!(double - space, space);
        assert!(!(space - space).is_nonzero());
    }

    #[test]
    fn test_elastic_stiff() {
        assert!(Elastic::stiff(Abs::pt(2.0)).is_stiff());
        assert!(Elastic::stiff(Abs::pt(2.0)).is_nonzero());
        assert!(!Elastic::ZERO.is_nonzero());
    }
}
