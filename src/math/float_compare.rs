use super::LogProb;

/// Provided methods for comparing probabilities and scores.
///
/// This is an implementation detail of [`assert_fp_eq`] and [`is_fp_eq`].
#[doc(hidden)]
pub enum NearlyEqualStrategy {
    /// Relative error with a tolerance of `eps`
    Relative { eps: f64 },
    /// Absolute error with a tolerance of `eps`
    Absolute { eps: f64 },
}

impl NearlyEqualStrategy {
    /// Relative error as in <https://floating-point-gui.de/errors/comparison/>.
    /// Values at or next to zero fall back to a tolerance scaled by the
    /// smallest normal number.
    fn holds(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        let diff = (a - b).abs();
        match *self {
            NearlyEqualStrategy::Absolute { eps } => diff < eps,
            NearlyEqualStrategy::Relative { eps } => {
                let scale = a.abs() + b.abs();
                if a == 0.0 || b == 0.0 || scale < f64::MIN_POSITIVE {
                    diff < eps * f64::MIN_POSITIVE
                } else {
                    diff / scale.min(f64::MAX) < eps
                }
            }
        }
    }
}

/// Approximate equality for numbers and containers of them. The second value
/// of the returned tuple holds the first pair responsible for an inequality,
/// when there is one.
#[doc(hidden)]
pub trait NearlyEqual {
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>);
}

impl NearlyEqual for f64 {
    #[inline]
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>) {
        if strategy.holds(*self, *b) {
            (true, None)
        } else {
            (false, Some((*self, *b)))
        }
    }
}

impl NearlyEqual for f32 {
    #[inline]
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>) {
        f64::from(*self).nearly_equal(&f64::from(*b), strategy)
    }
}

impl NearlyEqual for LogProb {
    #[inline]
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>) {
        self.prob().nearly_equal(&b.prob(), strategy)
    }
}

impl<S: NearlyEqual> NearlyEqual for Option<S> {
    #[inline]
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>) {
        match (self, b) {
            (Some(x), Some(y)) => x.nearly_equal(y, strategy),
            (None, None) => (true, None),
            _ => (false, None),
        }
    }
}

impl<S: NearlyEqual> NearlyEqual for [S] {
    #[inline]
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>) {
        if self.len() != b.len() {
            return (false, None);
        }
        for (x, y) in self.iter().zip(b) {
            let (eq, vals) = x.nearly_equal(y, strategy);
            if !eq {
                return (false, vals);
            }
        }
        (true, None)
    }
}

impl<S: NearlyEqual, const N: usize> NearlyEqual for [S; N] {
    #[inline]
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>) {
        self.as_slice().nearly_equal(b.as_slice(), strategy)
    }
}

impl<S: NearlyEqual> NearlyEqual for Vec<S> {
    #[inline]
    fn nearly_equal(&self, b: &Self, strategy: &NearlyEqualStrategy) -> (bool, Option<(f64, f64)>) {
        self.as_slice().nearly_equal(b.as_slice(), strategy)
    }
}

/// Assert that two floating point values (or slices, arrays, vectors, and
/// options of them) are approximately equal.
///
/// The default is relative error with $\epsilon=10^{-8}$:
/// ```
/// # use profillic::assert_fp_eq;
/// assert_fp_eq!(3.0, 1.0 + 2.0);
/// assert_fp_eq!(3.0, 2.99999, 1e-4);
/// assert_fp_eq!(@absolute, 1e-10, 2e-10, 1e-8);
/// ```
#[macro_export]
macro_rules! assert_fp_eq {
    ($(@$method:tt,)? $a:expr, $b:expr) => {
        $crate::assert_fp_eq!($(@$method,)? $a, $b, 1e-8)
    };
    ($(@relative,)? $a:expr, $b:expr, $epsilon:expr) => {
        $crate::assert_fp_eq!(@strategy, $a, $b, $epsilon, $crate::math::NearlyEqualStrategy::Relative { eps: $epsilon })
    };
    (@absolute, $a:expr, $b:expr, $epsilon:expr) => {
        $crate::assert_fp_eq!(@strategy, $a, $b, $epsilon, $crate::math::NearlyEqualStrategy::Absolute { eps: $epsilon })
    };
    (@strategy, $a:expr, $b:expr, $epsilon:expr, $strategy:expr) => {{
        let (eq, vals) = $crate::math::NearlyEqual::nearly_equal(&$a, &$b, &$strategy);
        if !eq {
            if let Some((a, b)) = vals {
                panic!("assertion failed: `(found ≈ expected)`\n left:\t`{:?}`,\n right:\t`{:?}`,\n eps:\t`{}`,\n\n Caused by the comparison of:\n left:\t`{:?}`,\n right:\t`{:?}`", $a, $b, $epsilon, a, b)
            } else {
                panic!("assertion failed: `(found ≈ expected)`\n left:\t`{:?}`,\n right:\t`{:?}`,\n eps:\t`{}`", $a, $b, $epsilon)
            }
        }
    }};
}

/// Check whether two floating point values are approximately equal.
///
/// Similar to [`assert_fp_eq`], but returns a boolean rather than performing an
/// assertion.
#[macro_export]
macro_rules! is_fp_eq {
    ($(@$method:tt,)? $a:expr, $b:expr) => {
        $crate::is_fp_eq!($(@$method,)? $a, $b, 1e-8)
    };
    ($(@relative,)? $a:expr, $b:expr, $epsilon:expr) => {
        $crate::math::NearlyEqual::nearly_equal(&$a, &$b, &$crate::math::NearlyEqualStrategy::Relative { eps: $epsilon }).0
    };
    (@absolute, $a:expr, $b:expr, $epsilon:expr) => {
        $crate::math::NearlyEqual::nearly_equal(&$a, &$b, &$crate::math::NearlyEqualStrategy::Absolute { eps: $epsilon }).0
    };
}
