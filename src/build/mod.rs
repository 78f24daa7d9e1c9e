//! ## Building Plan7 models from alignments or galosh profiles.
//!
//! A [`Builder`] runs one alignment through a fixed sequence of steps:
//!
//! 1. Reject missing data (`~`) anywhere but the ends of a sequence.
//! 2. Checksum the alignment.
//! 3. Weight the sequences, if there is more than one.
//! 4. Mark fragments.
//! 5. Collect counts, either from a galosh profile through
//!    [`profile_to_hmm`] or from the alignment's consensus columns.
//! 6. Rescale the counts to an effective sequence number.
//! 7. Turn counts into probabilities, with or without a [`Prior`].
//! 8. Copy names, cutoffs, and other annotation onto the model.
//! 9. Calibrate the E-value parameters.
//! 10. Optionally produce the post-hoc alignment.
//!
//! The first failing step ends the build with its error; nothing partially
//! built is returned.

use crate::{
    ProfillicError, ProfillicResult,
    convert::profile_to_hmm,
    data::{
        Alphabet, Background,
        msa::{Cutoffs, Msa, single_linkage},
    },
    hmm::{HmmCutoffs, Plan7Hmm},
    profile::AnyProfile,
};
use rand_xoshiro::{Xoshiro256PlusPlus, rand_core::SeedableRng};

mod calibrate;
mod effn;
mod model_maker;
mod post;
mod prior;

pub use crate::data::msa::WeightStrategy;
pub use calibrate::*;
pub use effn::*;
pub use model_maker::ArchStrategy;
pub use post::*;
pub use prior::*;

/// Settings for a [`Builder`]. The defaults match `hmmbuild`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuilderConfig {
    pub arch:       ArchStrategy,
    /// Residue fraction at which a column becomes consensus
    pub symfrac:    f64,
    /// Span fraction below which a sequence is a fragment
    pub fragthresh: f64,
    pub weighting:  WeightStrategy,
    /// Identity threshold for BLOSUM weights
    pub wid:        f64,
    pub effn:       EffnStrategy,
    /// Target relative entropy for the whole model, in bits
    pub esigma:     f64,
    /// Identity threshold for cluster counting
    pub eid:        f64,
    /// Minimum per-position relative entropy target; `None` picks the
    /// alphabet's default
    pub re_target:  Option<f64>,
    pub calibrator: SimulatedCalibrator,
    /// `0` draws an arbitrary seed once and never reseeds
    pub seed:       u64,
    pub prior:      PriorChoice,
    pub use_priors: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            arch:       ArchStrategy::Fast,
            symfrac:    0.5,
            fragthresh: 0.5,
            weighting:  WeightStrategy::PositionBased,
            wid:        0.62,
            effn:       EffnStrategy::Entropy,
            esigma:     45.0,
            eid:        0.62,
            re_target:  None,
            calibrator: SimulatedCalibrator::default(),
            seed:       42,
            prior:      PriorChoice::Standard,
            use_priors: true,
        }
    }
}

/// What a successful build returns.
#[derive(Clone, Debug)]
pub struct BuildOutput {
    pub hmm:      Plan7Hmm,
    /// The alignment as used for the model, when a
    /// [`PostAlignmentMaker`] is set
    pub post_msa: Option<Msa>,
}

/// Builds models for one alphabet. A builder can be reused for every
/// alignment in a stream.
pub struct Builder {
    config:         BuilderConfig,
    alphabet:       Alphabet,
    prior:          Prior,
    re_target:      f64,
    rng:            Xoshiro256PlusPlus,
    calibrator:     Box<dyn Calibrator>,
    post_alignment: Option<Box<dyn PostAlignmentMaker>>,
}

/// A seed for runs that ask for run-to-run variation.
#[allow(clippy::cast_sign_loss)]
fn arbitrary_seed() -> u64 {
    let now = chrono::Utc::now();
    now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp()) as u64
}

impl Builder {
    #[must_use]
    pub fn new(config: BuilderConfig, alphabet: Alphabet) -> Self {
        let seed = if config.seed == 0 { arbitrary_seed() } else { config.seed };
        Builder {
            config,
            alphabet,
            prior: Prior::from_choice(config.prior, &Background::new(alphabet)),
            re_target: config.re_target.unwrap_or(alphabet.default_re_target()),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            calibrator: Box::new(config.calibrator),
            post_alignment: None,
        }
    }

    /// Replaces the E-value calibration.
    #[must_use]
    pub fn with_calibrator(mut self, calibrator: impl Calibrator + 'static) -> Self {
        self.calibrator = Box::new(calibrator);
        self
    }

    /// Asks every build to also return a post-hoc alignment.
    #[must_use]
    pub fn with_post_alignment(mut self, maker: impl PostAlignmentMaker + 'static) -> Self {
        self.post_alignment = Some(Box::new(maker));
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    #[inline]
    #[must_use]
    pub fn prior(&self) -> &Prior {
        &self.prior
    }

    /// Builds a model from `msa`, or from `profile` when one is given, in
    /// which case `msa` is the profile's consensus alignment.
    ///
    /// The alignment is modified along the way: it gains weights, fragment
    /// markers, and a reference line marking the consensus columns.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that fails. An alignment with no
    /// consensus columns gives [`NoResult`](ProfillicError::NoResult).
    pub fn build(&mut self, msa: &mut Msa, profile: Option<&AnyProfile>, bg: &Background) -> ProfillicResult<BuildOutput> {
        if bg.alphabet != self.alphabet {
            return Err(ProfillicError::invalid(format!(
                "a {} builder cannot use a {} background",
                self.alphabet, bg.alphabet
            )));
        }
        log::info!("Building a model from alignment {}", msa.display_name());

        msa.validate_missing_data()?;
        let checksum = msa.checksum();

        if msa.nseq() > 1 {
            msa.set_relative_weights(self.config.weighting, self.alphabet, self.config.wid)?;
        }
        let nfrag = msa.mark_fragments(self.config.fragthresh);
        if nfrag > 0 {
            log::info!("Marked {nfrag} fragment sequences");
        }

        let mut hmm = self.build_model(msa, profile)?;
        self.set_effective_seqnumber(msa, &mut hmm, bg)?;
        self.parameterize(&mut hmm);
        annotate(msa, &mut hmm)?;
        self.calibrate(&mut hmm, bg)?;

        let post_msa = match &self.post_alignment {
            Some(maker) => Some(maker.make_post_msa(msa, &hmm)?),
            None => None,
        };

        hmm.checksum = Some(checksum);
        log::info!(
            "Built model {} with {} nodes from {} sequences",
            hmm.name.as_deref().unwrap_or(""),
            hmm.m,
            msa.nseq()
        );
        Ok(BuildOutput { hmm, post_msa })
    }

    fn build_model(&self, msa: &mut Msa, profile: Option<&AnyProfile>) -> ProfillicResult<Plan7Hmm> {
        if let Some(profile) = profile {
            log::debug!("Building from a galosh profile of length {}", profile.length());
            return match profile {
                AnyProfile::Dna(p) => profile_to_hmm(p, msa, self.alphabet),
                AnyProfile::Amino(p) => profile_to_hmm(p, msa, self.alphabet),
            };
        }

        let matassign = match self.config.arch {
            ArchStrategy::Fast => model_maker::fast_matassign(msa, self.alphabet, self.config.symfrac),
            ArchStrategy::Hand => model_maker::hand_matassign(msa)?,
        };
        model_maker::matassign_to_hmm(msa, self.alphabet, &matassign).map_err(|e| match (e, self.config.arch) {
            (ProfillicError::NoResult(_), ArchStrategy::Fast) => ProfillicError::no_result(format!(
                "Alignment {} has no consensus columns w/ > {}% residues - can't build a model.",
                msa.display_name(),
                percent(self.config.symfrac)
            )),
            (ProfillicError::NoResult(_), ArchStrategy::Hand) => ProfillicError::no_result(format!(
                "Alignment {} has no annotated consensus columns - can't build a model.",
                msa.display_name()
            )),
            (e, _) => e,
        })
    }

    /// Scales the counts in `hmm` so that they total the effective sequence
    /// number rather than the raw count.
    fn set_effective_seqnumber(&self, msa: &Msa, hmm: &mut Plan7Hmm, bg: &Background) -> ProfillicResult<()> {
        #[allow(clippy::cast_precision_loss)]
        let nseq = msa.nseq() as f64;

        let eff_nseq = match self.config.effn {
            EffnStrategy::None => nseq,
            EffnStrategy::Set(eset) if eset > 0.0 => eset,
            EffnStrategy::Set(eset) => {
                return Err(ProfillicError::invalid(format!(
                    "effective sequence number must be positive, not {eset}"
                )));
            }
            EffnStrategy::Clust => {
                let clusters = single_linkage(msa, self.config.eid);
                log::debug!(
                    "{} single-linkage clusters at {}% identity",
                    clusters.count,
                    percent(self.config.eid)
                );
                #[allow(clippy::cast_precision_loss)]
                let count = clusters.count as f64;
                count
            }
            EffnStrategy::Entropy if !self.config.use_priors => {
                log::warn!("Entropy weighting has no effect without a prior; keeping the sequence count");
                nseq
            }
            EffnStrategy::Entropy => {
                let etarget = entropy_target(hmm.m, self.config.esigma, self.re_target);
                log::debug!("Relative entropy target is {etarget:.4} bits per position");
                entropy_weight(hmm, bg, &self.prior, etarget, nseq)
            }
        };

        log::info!("Effective sequence number: {eff_nseq:.4}");
        hmm.eff_nseq = Some(eff_nseq);
        hmm.scale(eff_nseq / nseq);
        Ok(())
    }

    fn parameterize(&self, hmm: &mut Plan7Hmm) {
        if self.config.use_priors {
            self.prior.estimate(hmm);
        } else {
            normalize_counts(hmm);
        }
    }

    /// Sets the E-value parameters of `hmm`. A nonzero seed is reapplied
    /// first, so results do not depend on the models calibrated before.
    ///
    /// # Errors
    ///
    /// Returns the calibrator's error.
    pub fn calibrate(&mut self, hmm: &mut Plan7Hmm, bg: &Background) -> ProfillicResult<()> {
        if self.config.seed != 0 {
            self.rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
            log::debug!("Reseeded the random number generator with {}", self.config.seed);
        }
        hmm.evparam = Some(self.calibrator.calibrate(hmm, bg, &mut self.rng)?);
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn percent(frac: f64) -> i32 {
    (100.0 * frac) as i32
}

/// Copies descriptive annotation from the alignment and sets the derived
/// fields: timestamp, composition, and consensus line.
fn annotate(msa: &Msa, hmm: &mut Plan7Hmm) -> ProfillicResult<()> {
    let name = msa
        .name
        .clone()
        .ok_or_else(|| ProfillicError::invalid("Unable to name the HMM."))?;
    hmm.name = Some(name);
    hmm.acc.clone_from(&msa.accession);
    hmm.desc.clone_from(&msa.description);
    hmm.set_ctime();
    hmm.set_composition();
    hmm.set_consensus();
    hmm.cutoffs = HmmCutoffs {
        ga: Cutoffs::pair(msa.cutoffs.ga),
        tc: Cutoffs::pair(msa.cutoffs.tc),
        nc: Cutoffs::pair(msa.cutoffs.nc),
    };
    Ok(())
}
