use super::Prior;
use crate::{data::Background, hmm::Plan7Hmm};

/// How the observed counts are rescaled before parameterization.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum EffnStrategy {
    /// Keep the raw sequence count
    None,
    /// Use a fixed effective sequence number
    Set(f64),
    /// Count single-linkage clusters at identity `eid`
    Clust,
    /// Solve for the count that brings the mean match relative entropy down
    /// to a target
    #[default]
    Entropy,
}

/// Bisection steps stop once the bracket on the scale factor is this narrow.
const SCALE_TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 100;

/// The per-position relative entropy target, in bits, for a model of `m`
/// nodes: `(esigma - log2(2 / (M (M + 1)))) / M`, never below `re_target`.
#[must_use]
pub fn entropy_target(m: usize, esigma: f64, re_target: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let m = m as f64;
    let etarget = (esigma - (2.0 / (m * (m + 1.0))).log2()) / m;
    etarget.max(re_target)
}

/// Mean match relative entropy of `counts` scaled by `factor` and
/// parameterized with `prior`.
fn scaled_relative_entropy(counts: &Plan7Hmm, factor: f64, prior: &Prior, bg: &Background) -> f64 {
    let mut trial = counts.clone();
    trial.scale(factor);
    prior.estimate(&mut trial);
    trial.mean_match_relative_entropy(&bg.freqs)
}

/// Finds the effective sequence number at which the parameterized model's
/// mean match relative entropy equals `etarget`, by bisection on the scale
/// factor in `(0, 1]`. Models already at or below the target keep `nseq`.
#[must_use]
pub fn entropy_weight(counts: &Plan7Hmm, bg: &Background, prior: &Prior, etarget: f64, nseq: f64) -> f64 {
    let full = scaled_relative_entropy(counts, 1.0, prior, bg);
    if full <= etarget {
        log::debug!("Relative entropy {full:.4} is already within the target {etarget:.4}");
        return nseq;
    }

    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..MAX_ITERATIONS {
        if hi - lo < SCALE_TOLERANCE {
            break;
        }
        let mid = 0.5 * (lo + hi);
        if scaled_relative_entropy(counts, mid, prior, bg) > etarget {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let scale = 0.5 * (lo + hi);
    log::debug!("Entropy weighting settled on scale {scale:.6}");
    nseq * scale
}
