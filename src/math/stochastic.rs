use super::ProbNumber;

/// The floor conventionally used when normalizing profile distributions.
pub const DEFAULT_NORMALIZE_FLOOR: f64 = 1e-5;

/// Sums a probability vector.
#[inline]
#[must_use]
pub fn sum<T: ProbNumber>(v: &[T]) -> T {
    v.iter().fold(T::ZERO, |acc, &x| acc + x)
}

/// Rescales a non-negative vector so that it sums to one.
///
/// If the sum is at or below `floor`, the vector is left untouched and `false`
/// is returned. An all-zero input therefore stays all-zero; no uniform
/// distribution is substituted.
#[inline]
pub fn normalize<T: ProbNumber>(v: &mut [T], floor: f64) -> bool {
    let total = sum(v);
    if total.to_f64() <= floor {
        return false;
    }
    for x in v.iter_mut() {
        *x = *x / total;
    }
    true
}

/// Sets every element to zero.
#[inline]
pub fn zero<T: ProbNumber>(v: &mut [T]) {
    v.fill(T::ZERO);
}

/// Multiplies every element by `factor`.
#[inline]
pub fn scale<T: ProbNumber>(v: &mut [T], factor: T) {
    for x in v.iter_mut() {
        *x = *x * factor;
    }
}

/// Adds `src` element-wise into `dst`.
#[inline]
pub fn add_into<T: ProbNumber>(dst: &mut [T], src: &[T]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d += s;
    }
}

/// Index of the largest element, taking the first on ties. Returns `None` for
/// an empty slice.
#[inline]
#[must_use]
pub fn argmax<T: ProbNumber>(v: &[T]) -> Option<usize> {
    let mut best: Option<(usize, T)> = None;
    for (i, &x) in v.iter().enumerate() {
        match best {
            Some((_, b)) if x <= b => {}
            _ => best = Some((i, x)),
        }
    }
    best.map(|(i, _)| i)
}

/// Relative entropy of `p` with respect to `q`, in bits. Terms where `p` is
/// zero contribute nothing.
#[must_use]
pub fn relative_entropy(p: &[f64], q: &[f64]) -> f64 {
    p.iter()
        .zip(q)
        .filter(|&(&pi, &qi)| pi > 0.0 && qi > 0.0)
        .map(|(&pi, &qi)| pi * (pi / qi).log2())
        .sum()
}
