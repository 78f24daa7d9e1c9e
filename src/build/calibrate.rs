use crate::{
    ProfillicError, ProfillicResult,
    data::Background,
    hmm::{EvalueParams, MM, Plan7Hmm},
};
use rand_xoshiro::rand_core::RngCore;
use std::f64::consts::LN_2;

/// Sets the E-value parameters of a finished model.
pub trait Calibrator {
    /// Returns the MSV, Viterbi, and Forward score statistics of `hmm`
    /// against the null model `bg`. Any randomness is drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Implementations fail when the model cannot be scored.
    fn calibrate(&mut self, hmm: &Plan7Hmm, bg: &Background, rng: &mut dyn RngCore) -> ProfillicResult<EvalueParams>;
}

/// Fits score distributions from simulated background sequences.
///
/// The slope `λ` comes from the model's mean match relative entropy. The
/// MSV and Viterbi locations are Gumbel fits, with `λ` fixed, to the best
/// ungapped local scores of random sequences. The Forward location is read
/// off the exponential tail at fraction `eft`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulatedCalibrator {
    pub em_l: usize,
    pub em_n: usize,
    pub ev_l: usize,
    pub ev_n: usize,
    pub ef_l: usize,
    pub ef_n: usize,
    pub eft:  f64,
}

impl Default for SimulatedCalibrator {
    fn default() -> Self {
        SimulatedCalibrator {
            em_l: 200,
            em_n: 200,
            ev_l: 200,
            ev_n: 200,
            ef_l: 100,
            ef_n: 200,
            eft:  0.04,
        }
    }
}

/// `λ = ln 2 + 1.44 / (M * H)` where `H` is the mean match relative entropy
/// in bits. Models with no information get `ln 2`.
#[must_use]
pub fn score_lambda(hmm: &Plan7Hmm, bg: &Background) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let info = hmm.m as f64 * hmm.mean_match_relative_entropy(&bg.freqs);
    if info > 0.0 { LN_2 + 1.44 / info } else { LN_2 }
}

/// A uniform draw from `[0, 1)`.
#[allow(clippy::cast_precision_loss)]
fn uniform(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

/// A digitized random sequence drawn from the background frequencies.
fn random_sequence(rng: &mut dyn RngCore, freqs: &[f64], len: usize) -> Vec<usize> {
    (0..len)
        .map(|_| {
            let mut u = uniform(&mut *rng);
            for (x, &f) in freqs.iter().enumerate() {
                if u < f {
                    return x;
                }
                u -= f;
            }
            freqs.len() - 1
        })
        .collect()
}

/// Log-odds scores, in bits, of the model's match emissions and of its
/// match-to-match steps.
struct Scores {
    msc: Vec<Vec<f64>>,
    tmm: Vec<f64>,
}

impl Scores {
    fn new(hmm: &Plan7Hmm, bg: &Background) -> Self {
        let msc = hmm.mat[1..]
            .iter()
            .map(|p| p.iter().zip(&bg.freqs).map(|(&q, &f)| (q / f).log2()).collect())
            .collect();
        let tmm = hmm.t[1..].iter().map(|t| t[MM].log2()).collect();
        Scores { msc, tmm }
    }

    /// The best ungapped local segment score of `seq`. With `transitions`,
    /// each extension also pays the match-to-match cost.
    fn best_diagonal(&self, seq: &[usize], transitions: bool) -> f64 {
        let m = self.msc.len();
        let mut prev = vec![0.0; m];
        let mut cur = vec![0.0; m];
        let mut best = 0.0f64;
        for &x in seq {
            for k in 0..m {
                let extend = if k == 0 {
                    0.0
                } else if transitions {
                    prev[k - 1] + self.tmm[k - 1]
                } else {
                    prev[k - 1]
                };
                cur[k] = self.msc[k][x] + extend.max(0.0);
                best = best.max(cur[k]);
            }
            std::mem::swap(&mut prev, &mut cur);
        }
        best
    }

    /// The log-sum, in bits, over every ungapped local segment of `seq`.
    fn forward(&self, seq: &[usize]) -> f64 {
        let m = self.msc.len();
        let mut prev = vec![0.0; m];
        let mut cur = vec![0.0; m];
        let mut total = 0.0;
        for &x in seq {
            for k in 0..m {
                let carried = if k == 0 { 0.0 } else { prev[k - 1] * self.tmm[k - 1].exp2() };
                cur[k] = self.msc[k][x].exp2() * (1.0 + carried);
                total += cur[k];
            }
            std::mem::swap(&mut prev, &mut cur);
        }
        total.log2()
    }
}

/// Maximum likelihood Gumbel location for `scores` with the slope fixed at
/// `lambda`.
#[must_use]
pub fn gumbel_location(scores: &[f64], lambda: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = scores.len() as f64;
    let mean: f64 = scores.iter().map(|&x| (-lambda * x).exp()).sum::<f64>() / n;
    -mean.ln() / lambda
}

/// The location of an exponential tail holding fraction `tail` of `scores`,
/// extrapolated to the whole distribution.
#[must_use]
pub fn tail_location(scores: &[f64], lambda: f64, tail: f64) -> f64 {
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ntail = ((tail * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    sorted[ntail - 1] + tail.ln() / lambda
}

impl SimulatedCalibrator {
    fn check(&self) -> ProfillicResult<()> {
        let sizes = [self.em_l, self.em_n, self.ev_l, self.ev_n, self.ef_l, self.ef_n];
        if sizes.contains(&0) {
            return Err(ProfillicError::invalid("calibration needs nonzero sequence lengths and counts"));
        }
        if !(self.eft > 0.0 && self.eft < 1.0) {
            return Err(ProfillicError::invalid(format!(
                "calibration tail fraction {} is not in (0, 1)",
                self.eft
            )));
        }
        Ok(())
    }
}

impl Calibrator for SimulatedCalibrator {
    fn calibrate(&mut self, hmm: &Plan7Hmm, bg: &Background, rng: &mut dyn RngCore) -> ProfillicResult<EvalueParams> {
        self.check()?;
        if hmm.m == 0 {
            return Err(ProfillicError::no_result("cannot calibrate a model with no nodes"));
        }
        if hmm.alphabet != bg.alphabet {
            return Err(ProfillicError::invalid(format!(
                "cannot calibrate a {} model against a {} background",
                hmm.alphabet, bg.alphabet
            )));
        }

        let lambda = score_lambda(hmm, bg);
        let scores = Scores::new(hmm, bg);

        let msv: Vec<f64> = (0..self.em_n)
            .map(|_| scores.best_diagonal(&random_sequence(&mut *rng, &bg.freqs, self.em_l), false))
            .collect();
        let viterbi: Vec<f64> = (0..self.ev_n)
            .map(|_| scores.best_diagonal(&random_sequence(&mut *rng, &bg.freqs, self.ev_l), true))
            .collect();
        let forward: Vec<f64> = (0..self.ef_n)
            .map(|_| scores.forward(&random_sequence(&mut *rng, &bg.freqs, self.ef_l)))
            .collect();

        let params = EvalueParams {
            msv:     [gumbel_location(&msv, lambda), lambda],
            viterbi: [gumbel_location(&viterbi, lambda), lambda],
            forward: [tail_location(&forward, lambda, self.eft), lambda],
        };
        log::debug!(
            "Calibrated {}: lambda {lambda:.4}, MSV mu {:.4}, Viterbi mu {:.4}, Forward tau {:.4}",
            hmm.name.as_deref().unwrap_or("model"),
            params.msv[0],
            params.viterbi[0],
            params.forward[0]
        );
        Ok(params)
    }
}
