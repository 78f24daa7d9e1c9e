//! Plan7 profile HMMs as used by HMMER3.
//!
//! A model of length `M` stores its nodes `0..=M` in parallel vectors. Node
//! `0` holds the begin state: `mat[0]` is a placeholder and `t[0]` holds the
//! begin transitions. Transitions out of node `k` live in `t[k]`, indexed by
//! the constants in this module.

use crate::{
    ProfillicError, ProfillicResult,
    data::Alphabet,
    math::{add_into, argmax, normalize, relative_entropy, scale},
};

mod io;
pub use io::*;

pub const MM: usize = 0;
pub const MI: usize = 1;
pub const MD: usize = 2;
pub const IM: usize = 3;
pub const II: usize = 4;
pub const DM: usize = 5;
pub const DD: usize = 6;
/// The number of transitions out of each node.
pub const NTRANSITIONS: usize = 7;

/// Column labels for the transition lines of the `HMMER3/f` format.
pub(crate) const TRANSITION_LABELS: [&str; NTRANSITIONS] = ["m->m", "m->i", "m->d", "i->m", "i->i", "d->m", "d->d"];

/// Score cutoffs, each a `[per-sequence, per-domain]` pair.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HmmCutoffs {
    /// Gathering thresholds
    pub ga: Option<[f64; 2]>,
    /// Trusted cutoffs
    pub tc: Option<[f64; 2]>,
    /// Noise cutoffs
    pub nc: Option<[f64; 2]>,
}

/// E-value parameters fitted by calibration: Gumbel `(mu, lambda)` for the
/// MSV and Viterbi filters, exponential tail `(tau, lambda)` for Forward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EvalueParams {
    pub msv:     [f64; 2],
    pub viterbi: [f64; 2],
    pub forward: [f64; 2],
}

/// A Plan7 profile HMM in probability space.
#[derive(Clone, Debug, PartialEq)]
pub struct Plan7Hmm {
    pub alphabet:   Alphabet,
    pub m:          usize,
    /// Transitions out of each node, `0..=M`
    pub t:          Vec<[f64; NTRANSITIONS]>,
    /// Match emissions, `0..=M`
    pub mat:        Vec<Vec<f64>>,
    /// Insert emissions, `0..=M`
    pub ins:        Vec<Vec<f64>>,
    pub name:       Option<String>,
    pub acc:        Option<String>,
    pub desc:       Option<String>,
    /// Per-node annotation lines are indexed `0..=M` with a blank at 0.
    pub rf:         Option<Vec<u8>>,
    pub mm:         Option<Vec<u8>>,
    pub consensus:  Option<Vec<u8>>,
    pub cs:         Option<Vec<u8>>,
    pub ca:         Option<Vec<u8>>,
    /// Alignment column of each node, 1-based; `map[0]` is unused
    pub map:        Option<Vec<usize>>,
    pub ctime:      Option<String>,
    pub comlog:     Option<String>,
    pub nseq:       Option<usize>,
    pub eff_nseq:   Option<f64>,
    pub max_length: Option<usize>,
    pub checksum:   Option<u32>,
    pub cutoffs:    HmmCutoffs,
    /// Average residue composition of the model
    pub compo:      Option<Vec<f64>>,
    pub evparam:    Option<EvalueParams>,
}

impl Plan7Hmm {
    /// A zero-filled model with `m` match states and no annotation.
    #[must_use]
    pub fn new(m: usize, alphabet: Alphabet) -> Self {
        let k = alphabet.size();
        Plan7Hmm {
            alphabet,
            m,
            t: vec![[0.0; NTRANSITIONS]; m + 1],
            mat: vec![vec![0.0; k]; m + 1],
            ins: vec![vec![0.0; k]; m + 1],
            name: None,
            acc: None,
            desc: None,
            rf: None,
            mm: None,
            consensus: None,
            cs: None,
            ca: None,
            map: None,
            ctime: None,
            comlog: None,
            nseq: None,
            eff_nseq: None,
            max_length: None,
            checksum: None,
            cutoffs: HmmCutoffs::default(),
            compo: None,
            evparam: None,
        }
    }

    /// Zeroes every probability parameter, keeping annotation.
    pub fn zero(&mut self) {
        self.t.iter_mut().for_each(|t| t.fill(0.0));
        self.mat.iter_mut().for_each(|v| v.fill(0.0));
        self.ins.iter_mut().for_each(|v| v.fill(0.0));
    }

    /// Multiplies every count by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for t in &mut self.t {
            scale(t, factor);
        }
        for v in self.mat.iter_mut().chain(self.ins.iter_mut()) {
            scale(v, factor);
        }
    }

    /// Sets `mat[0]` to the conventional `(1, 0, ...)` placeholder.
    pub fn set_match_basis(&mut self) {
        let m0 = &mut self.mat[0];
        m0.fill(0.0);
        if let Some(first) = m0.first_mut() {
            *first = 1.0;
        }
    }

    /// Sets the transitions out of the begin node and the last node that have
    /// no meaning to their conventional values.
    pub fn set_boundary_deletions(&mut self) {
        let m = self.m;
        for k in [0, m] {
            self.t[k][DM] = 1.0;
            self.t[k][DD] = 0.0;
        }
        self.t[m][MD] = 0.0;
    }

    /// Expected occupancy of each match state and each insert state in a
    /// single pass through the model.
    #[must_use]
    pub fn occupancy(&self) -> (Vec<f64>, Vec<f64>) {
        let m = self.m;
        let mut mocc = vec![0.0; m + 1];
        let mut iocc = vec![0.0; m + 1];
        if m == 0 {
            return (mocc, iocc);
        }

        mocc[1] = self.t[0][MI] + self.t[0][MM];
        for k in 2..=m {
            let t = &self.t[k - 1];
            mocc[k] = mocc[k - 1] * (t[MM] + t[MI]) + (1.0 - mocc[k - 1]) * t[DM];
        }

        let ratio = |t: &[f64; NTRANSITIONS]| if t[IM] > 0.0 { t[MI] / t[IM] } else { 0.0 };
        iocc[0] = ratio(&self.t[0]);
        for k in 1..m {
            iocc[k] = mocc[k] * ratio(&self.t[k]);
        }
        (mocc, iocc)
    }

    /// Computes the average residue composition, weighting each emission
    /// distribution by the expected occupancy of its state.
    pub fn set_composition(&mut self) {
        let (mocc, iocc) = self.occupancy();
        let mut compo = vec![0.0; self.alphabet.size()];
        for k in 1..self.m {
            let mut weighted = self.mat[k].clone();
            scale(&mut weighted, mocc[k]);
            add_into(&mut compo, &weighted);
            let mut weighted = self.ins[k].clone();
            scale(&mut weighted, iocc[k]);
            add_into(&mut compo, &weighted);
        }
        if self.m > 0 {
            let mut weighted = self.mat[self.m].clone();
            scale(&mut weighted, mocc[self.m]);
            add_into(&mut compo, &weighted);
        }
        normalize(&mut compo, 0.0);
        self.compo = Some(compo);
    }

    /// Derives the consensus line from the match emissions. Residues with a
    /// probability of at least 0.5 (0.9 for nucleic models) are upper case.
    pub fn set_consensus(&mut self) {
        let threshold = match self.alphabet {
            Alphabet::Amino => 0.5,
            Alphabet::Dna | Alphabet::Rna => 0.9,
        };
        let symbols = self.alphabet.symbols();
        let mut cons = Vec::with_capacity(self.m + 1);
        cons.push(b' ');
        for mat in &self.mat[1..] {
            let c = match argmax(mat) {
                Some(x) if mat[x] >= threshold => symbols[x],
                Some(x) => symbols[x].to_ascii_lowercase(),
                None => b'x',
            };
            cons.push(c);
        }
        self.consensus = Some(cons);
    }

    /// Records the current local time as the creation time.
    pub fn set_ctime(&mut self) {
        self.ctime = Some(chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string());
    }

    /// Adds a command line to the model's history.
    pub fn append_comlog(&mut self, command: &str) {
        match &mut self.comlog {
            Some(log) => {
                log.push('\n');
                log.push_str(command);
            }
            None => self.comlog = Some(command.to_string()),
        }
    }

    /// Mean relative entropy of the match emissions against `bg`, in bits
    /// per position.
    #[must_use]
    pub fn mean_match_relative_entropy(&self, bg: &[f64]) -> f64 {
        self.mean_over_matches(|p| relative_entropy(p, bg))
    }

    /// Mean information content of the match emissions, in bits per
    /// position: the background entropy less each emission's entropy.
    #[must_use]
    pub fn mean_match_info(&self, bg: &[f64]) -> f64 {
        let h_bg = entropy(bg);
        self.mean_over_matches(|p| h_bg - entropy(p))
    }

    /// Relative entropy of the model composition against `bg`, in bits.
    /// Returns `None` if the composition has not been set.
    #[must_use]
    pub fn composition_kl(&self, bg: &[f64]) -> Option<f64> {
        self.compo.as_ref().map(|c| relative_entropy(c, bg))
    }

    fn mean_over_matches(&self, f: impl Fn(&[f64]) -> f64) -> f64 {
        if self.m == 0 {
            return 0.0;
        }
        let total: f64 = self.mat[1..].iter().map(|p| f(p)).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = total / self.m as f64;
        mean
    }

    /// Checks that every distribution the model uses sums to one within
    /// `tol`, and that the model has at least one node.
    ///
    /// # Errors
    ///
    /// Fails with [`InvalidInput`](ProfillicError::InvalidInput) naming the
    /// first distribution out of tolerance.
    pub fn validate(&self, tol: f64) -> ProfillicResult<()> {
        let name = self.name.as_deref().unwrap_or("");
        if self.m == 0 {
            return Err(ProfillicError::invalid(format!("HMM {name} has no nodes")));
        }

        let check = |what: &str, k: usize, v: &[f64]| {
            let s: f64 = v.iter().sum();
            if (s - 1.0).abs() > tol {
                Err(ProfillicError::invalid(format!(
                    "HMM {name}: {what} at node {k} sums to {s}, not 1"
                )))
            } else {
                Ok(())
            }
        };

        for k in 0..=self.m {
            if k > 0 {
                check("match emissions", k, &self.mat[k])?;
            }
            check("insert emissions", k, &self.ins[k])?;
            check("match transitions", k, &self.t[k][MM..IM])?;
            check("insert transitions", k, &self.t[k][IM..DM])?;
            if k > 0 && k < self.m {
                check("delete transitions", k, &self.t[k][DM..])?;
            }
        }
        Ok(())
    }
}

/// Shannon entropy in bits.
fn entropy(p: &[f64]) -> f64 {
    -p.iter().filter(|&&x| x > 0.0).map(|&x| x * x.log2()).sum::<f64>()
}

/// One row of the per-model table the command-line tools print.
pub struct ModelSummary<'a> {
    pub index: usize,
    pub hmm:   &'a Plan7Hmm,
    pub bg:    &'a [f64],
}

impl ModelSummary<'_> {
    /// The two header lines of the table.
    pub const HEADER: &'static str = "# idx  name                 accession        nseq eff_nseq      M relent   info compKL\n\
                                      # ---- -------------------- ------------ -------- -------- ------ ------ ------ ------";
}

impl std::fmt::Display for ModelSummary<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hmm = self.hmm;
        write!(
            f,
            "{:<6} {:<20} {:<12} {:>8} {:>8.2} {:>6} {:>6.2} {:>6.2} {:>6.2}",
            self.index,
            hmm.name.as_deref().unwrap_or("-"),
            hmm.acc.as_deref().unwrap_or("-"),
            hmm.nseq.unwrap_or(0),
            hmm.eff_nseq.unwrap_or(0.0),
            hmm.m,
            hmm.mean_match_relative_entropy(self.bg),
            hmm.mean_match_info(self.bg),
            hmm.composition_kl(self.bg).unwrap_or(0.0),
        )
    }
}
