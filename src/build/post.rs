use crate::{
    ProfillicError, ProfillicResult,
    data::{is_gap, is_missing, msa::Msa},
    hmm::Plan7Hmm,
};

/// Produces the alignment a model was actually built from.
pub trait PostAlignmentMaker {
    /// Builds an alignment from the input alignment `premsa` and the
    /// finished model.
    ///
    /// # Errors
    ///
    /// Implementations fail if `premsa` does not match the model.
    fn make_post_msa(&self, premsa: &Msa, hmm: &Plan7Hmm) -> ProfillicResult<Msa>;
}

/// Rewrites the input alignment in HMMER's match/insert convention:
/// residues in consensus columns are uppercase and their gaps `-`, while
/// residues in insert columns are lowercase and their gaps `.`. Missing data
/// is kept, and the reference line marks consensus columns with `x`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsensusMarkup;

impl PostAlignmentMaker for ConsensusMarkup {
    fn make_post_msa(&self, premsa: &Msa, hmm: &Plan7Hmm) -> ProfillicResult<Msa> {
        let map = hmm
            .map
            .as_ref()
            .ok_or_else(|| ProfillicError::invalid("the model has no alignment map"))?;

        let mut consensus = vec![false; premsa.alen];
        for &col in &map[1..] {
            match col.checked_sub(1).and_then(|apos| consensus.get_mut(apos)) {
                Some(slot) => *slot = true,
                None => {
                    return Err(ProfillicError::invalid(format!(
                        "model column {col} is outside alignment {} of length {}",
                        premsa.display_name(),
                        premsa.alen
                    )));
                }
            }
        }

        let mut post = premsa.clone();
        for aseq in &mut post.aseqs {
            for (b, &is_match) in aseq.iter_mut().zip(&consensus) {
                *b = match (*b, is_match) {
                    (c, _) if is_missing(c) => c,
                    (c, true) if is_gap(c) => b'-',
                    (c, false) if is_gap(c) => b'.',
                    (c, true) => c.to_ascii_uppercase(),
                    (c, false) => c.to_ascii_lowercase(),
                };
            }
        }
        post.rf = Some(consensus.iter().map(|&x| if x { b'x' } else { b'.' }).collect());
        Ok(post)
    }
}
