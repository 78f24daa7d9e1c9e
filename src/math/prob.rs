use std::{
    fmt::{Debug, Display},
    ops::{Add, AddAssign, Div, Mul},
};

/// A trait for the numeric types a profile may store its parameters in.
///
/// Implementors may keep values in real space (`f32`, `f64`) or in log space
/// ([`LogProb`]); either way, values convert to and from `f64` probabilities.
pub trait ProbNumber:
    Copy
    + Default
    + PartialOrd
    + Debug
    + Display
    + Add<Output = Self>
    + AddAssign
    + Mul<Output = Self>
    + Div<Output = Self> {
    /// Probability zero
    const ZERO: Self;
    /// Probability one
    const ONE: Self;

    /// Converts a real-space probability into this representation
    fn from_f64(p: f64) -> Self;

    /// Converts back to a real-space probability
    fn to_f64(self) -> f64;
}

impl ProbNumber for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(p: f64) -> Self {
        p as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl ProbNumber for f64 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    #[inline]
    fn from_f64(p: f64) -> Self {
        p
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

/// A probability stored as its natural logarithm. Addition is performed with
/// log-sum-exp, so sums of very small probabilities keep their precision.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct LogProb(pub f64);

impl LogProb {
    /// The real-space probability.
    #[inline]
    #[must_use]
    pub fn prob(self) -> f64 {
        self.0.exp()
    }
}

impl Default for LogProb {
    #[inline]
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for LogProb {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let (hi, lo) = if self.0 >= rhs.0 { (self.0, rhs.0) } else { (rhs.0, self.0) };
        if lo == f64::NEG_INFINITY {
            LogProb(hi)
        } else {
            LogProb(hi + (lo - hi).exp().ln_1p())
        }
    }
}

impl AddAssign for LogProb {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for LogProb {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        LogProb(self.0 + rhs.0)
    }
}

impl Div for LogProb {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        LogProb(self.0 - rhs.0)
    }
}

impl ProbNumber for LogProb {
    const ZERO: Self = LogProb(f64::NEG_INFINITY);
    const ONE: Self = LogProb(0.0);

    #[inline]
    fn from_f64(p: f64) -> Self {
        LogProb(p.ln())
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self.prob()
    }
}

impl Display for LogProb {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.prob(), f)
    }
}

impl Debug for LogProb {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LogProb({})", self.prob())
    }
}
