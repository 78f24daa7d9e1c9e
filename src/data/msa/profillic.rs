use super::Msa;
use crate::{ProfillicResult, data::records::LineSource, profile::AnyProfile};
use std::io::Read;

/// The name given to the consensus sequence of a profile.
pub const PROFILE_CONSENSUS_NAME: &str = "Galosh Profile Consensus";
/// The name given to the alignment synthesized from a profile.
pub const PROFILE_MSA_NAME: &str = "Galosh Profile";

/// Reads the rest of the stream as a galosh profile and synthesizes a
/// one-sequence alignment holding its consensus.
pub(crate) fn read_profillic<R: Read>(src: &mut LineSource<R>) -> ProfillicResult<Option<(Msa, AnyProfile)>> {
    let text = src.read_remaining()?;
    if text.trim().is_empty() {
        return Ok(None);
    }

    let profile = AnyProfile::from_text(&text)?;
    let mut msa = Msa::new();
    msa.name = Some(PROFILE_MSA_NAME.to_string());
    let idx = msa.add_sequence(PROFILE_CONSENSUS_NAME.to_string());
    msa.aseqs[idx] = profile.consensus();
    msa.verify()?;

    log::debug!(
        "Read {} profile of length {} as a consensus alignment",
        profile.alphabet(),
        profile.length()
    );
    Ok(Some((msa, profile)))
}
