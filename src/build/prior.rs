use crate::{
    data::Background,
    hmm::{DM, IM, MD, MM, Plan7Hmm},
    math::normalize,
};

/// Default pseudocounts for the match transitions MM, MI, MD.
pub const DEFAULT_TM: [f64; 3] = [0.7939, 0.0278, 0.0135];
/// Default pseudocounts for the insert transitions IM, II.
pub const DEFAULT_TI: [f64; 2] = [0.1551, 0.1331];
/// Default pseudocounts for the delete transitions DM, DD.
pub const DEFAULT_TD: [f64; 2] = [0.9002, 0.5630];

/// Total pseudocount mass on insert emissions, which keeps them close to
/// the background.
const INSERT_EMISSION_MASS: f64 = 1000.0;

/// Which prior a [`Builder`](super::Builder) uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PriorChoice {
    /// Transition pseudocounts of [`DEFAULT_TM`], [`DEFAULT_TI`], and
    /// [`DEFAULT_TD`] with background-shaped emission pseudocounts
    #[default]
    Standard,
    /// One pseudocount for every parameter
    Laplace,
}

/// A single-component Dirichlet prior on every distribution of a Plan7
/// model.
#[derive(Clone, Debug, PartialEq)]
pub struct Prior {
    pub tm: [f64; 3],
    pub ti: [f64; 2],
    pub td: [f64; 2],
    pub em: Vec<f64>,
    pub ei: Vec<f64>,
}

impl Prior {
    /// The standard prior for the background's alphabet. Match emission
    /// pseudocounts total the alphabet size and follow the background.
    #[must_use]
    pub fn new(bg: &Background) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let k = bg.freqs.len() as f64;
        Prior {
            tm: DEFAULT_TM,
            ti: DEFAULT_TI,
            td: DEFAULT_TD,
            em: bg.freqs.iter().map(|f| f * k).collect(),
            ei: bg.freqs.iter().map(|f| f * INSERT_EMISSION_MASS).collect(),
        }
    }

    /// A prior with every pseudocount equal to one.
    #[must_use]
    pub fn laplace(k: usize) -> Self {
        Prior {
            tm: [1.0; 3],
            ti: [1.0; 2],
            td: [1.0; 2],
            em: vec![1.0; k],
            ei: vec![1.0; k],
        }
    }

    #[must_use]
    pub fn from_choice(choice: PriorChoice, bg: &Background) -> Self {
        match choice {
            PriorChoice::Standard => Prior::new(bg),
            PriorChoice::Laplace => Prior::laplace(bg.freqs.len()),
        }
    }

    /// Replaces the counts in `hmm` with mean posterior estimates.
    pub fn estimate(&self, hmm: &mut Plan7Hmm) {
        let m = hmm.m;
        for k in 0..=m {
            let t = &mut hmm.t[k];
            mean_posterior(&mut t[MM..IM], &self.tm);
            if k == m {
                t[MD] = 0.0;
                normalize(&mut t[MM..IM], 0.0);
            }
            mean_posterior(&mut t[IM..DM], &self.ti);
            if k > 0 && k < m {
                mean_posterior(&mut t[DM..], &self.td);
            }
        }
        hmm.set_boundary_deletions();

        for v in &mut hmm.mat[1..] {
            mean_posterior(v, &self.em);
        }
        for v in &mut hmm.ins {
            mean_posterior(v, &self.ei);
        }
        hmm.set_match_basis();
    }
}

/// `p_i = (c_i + a_i) / (sum c + sum a)`, in place.
fn mean_posterior(counts: &mut [f64], alpha: &[f64]) {
    for (c, &a) in counts.iter_mut().zip(alpha) {
        *c += a;
    }
    normalize(counts, 0.0);
}

/// Normalizes counts into probabilities without a prior, keeping the Plan7
/// boundary conventions: no M to D step out of node `M`, and D to M
/// certain at nodes `0` and `M`.
pub fn normalize_counts(hmm: &mut Plan7Hmm) {
    let m = hmm.m;
    hmm.t[m][MD] = 0.0;
    for (k, t) in hmm.t.iter_mut().enumerate() {
        normalize(&mut t[MM..IM], 0.0);
        normalize(&mut t[IM..DM], 0.0);
        if k > 0 && k < m {
            normalize(&mut t[DM..], 0.0);
        }
    }
    hmm.set_boundary_deletions();

    for v in &mut hmm.mat[1..] {
        normalize(v, 0.0);
    }
    for v in &mut hmm.ins {
        normalize(v, 0.0);
    }
    hmm.set_match_basis();
}
