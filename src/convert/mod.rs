//! Conversion between galosh profiles and Plan7 HMMs.
//!
//! The two models differ in three ways. Galosh profiles start in a
//! non-affine pre-align insertion state that may go straight to a deletion,
//! while Plan7 begins with an affine insert loop that may not. Galosh
//! profiles share one set of interior transition and insertion parameters
//! across all positions, while Plan7 models are fully position specific.
//! And the last Plan7 insert state plays the role of the galosh post-align
//! insertion.
//!
//! Converting an HMM to a profile therefore averages the interior
//! parameters, and converting back broadcasts them. The round trip is exact
//! only for models whose interior transitions are already
//! [unified](crate::transitions::unify).

use crate::{
    ProfillicError, ProfillicResult,
    data::{Alphabet, msa::Msa},
    hmm::{DD, DM, II, IM, MD, MI, MM, Plan7Hmm},
    math::ProbNumber,
    profile::{Emission, ProfileModel, residue_map},
};

/// Builds a galosh profile from a Plan7 HMM. Interior transitions and
/// insert emissions are summed over positions `1..M` and normalized.
///
/// # Errors
///
/// Fails with [`NoResult`](ProfillicError::NoResult) for a model with no
/// match states, and with [`InvalidInput`](ProfillicError::InvalidInput) if
/// the profile's residues are not in the model's alphabet.
pub fn hmm_to_profile<P: ProfileModel>(hmm: &Plan7Hmm) -> ProfillicResult<P> {
    let m = hmm.m;
    if m == 0 {
        return Err(ProfillicError::no_result("HMM has no match states"));
    }
    let map = residue_map::<P::Residue>(hmm.alphabet)?;
    let num = P::Number::from_f64;

    let mut profile = P::with_length(m);
    profile.zero();

    let t0 = &hmm.t[0];
    {
        let t = profile.transitions_mut();
        t.from_pre_align.to_pre_align = num(t0[II]);
        t.from_pre_align.to_begin = num(t0[IM]);
        let to_match = if t0[MI] < 1.0 { t0[MM] / (1.0 - t0[MI]) } else { 0.0 };
        t.from_begin.to_match = num(to_match);
        t.from_begin.to_deletion = num(1.0 - to_match);
    }
    for (dst, &x) in profile.emission_mut(Emission::PreAlignInsertion).iter_mut().zip(&map) {
        *dst = num(hmm.ins[0][x]);
    }

    for pos in 0..m {
        let k = pos + 1;
        for (dst, &x) in profile.match_emission_mut(pos).iter_mut().zip(&map) {
            *dst = num(hmm.mat[k][x]);
        }

        let tk = &hmm.t[k];
        if k == m {
            for (dst, &x) in profile.emission_mut(Emission::PostAlignInsertion).iter_mut().zip(&map) {
                *dst = num(hmm.ins[k][x]);
            }
            let t = profile.transitions_mut();
            t.from_post_align.to_terminal = num(tk[IM]);
            t.from_post_align.to_post_align = num(1.0 - tk[IM]);
        } else {
            for (dst, &x) in profile.emission_mut(Emission::Insertion).iter_mut().zip(&map) {
                *dst += num(hmm.ins[k][x]);
            }
            let t = profile.transitions_mut();
            t.from_match.to_match += num(tk[MM]);
            t.from_match.to_insertion += num(tk[MI]);
            t.from_match.to_deletion += num(tk[MD]);
            t.from_insertion.to_match += num(tk[IM]);
            t.from_insertion.to_insertion += num(tk[II]);
            t.from_deletion.to_match += num(tk[DM]);
            t.from_deletion.to_deletion += num(tk[DD]);
        }
    }

    profile.normalize(0.0);
    Ok(profile)
}

/// Fills a Plan7 model from a galosh profile, broadcasting the shared
/// interior parameters to every interior node.
///
/// `msa` is the alignment the profile stands for, usually the one-sequence
/// consensus alignment read alongside it. Its length must equal the profile
/// length. Its annotation is copied onto the model and its reference line
/// is rewritten to mark every column as a match column. The model's
/// sequence counts are set from the alignment.
///
/// # Errors
///
/// Fails with [`NoResult`](ProfillicError::NoResult) for an empty profile,
/// and with [`InvalidInput`](ProfillicError::InvalidInput) if the alignment
/// length differs from the profile length or the residues are not in
/// `alphabet`.
pub fn profile_to_hmm<P: ProfileModel>(profile: &P, msa: &mut Msa, alphabet: Alphabet) -> ProfillicResult<Plan7Hmm> {
    let m = profile.length();
    if m == 0 {
        return Err(ProfillicError::no_result("profile has no positions"));
    }
    if msa.alen != m {
        return Err(ProfillicError::invalid(format!(
            "alignment {} has {} columns but the profile has {m} positions",
            msa.display_name(),
            msa.alen
        )));
    }
    let map = residue_map::<P::Residue>(alphabet)?;
    let real = |v: P::Number| v.to_f64();
    let pt = profile.transitions();

    let mut hmm = Plan7Hmm::new(m, alphabet);

    let t0 = &mut hmm.t[0];
    t0[MI] = real(pt.from_pre_align.to_pre_align);
    t0[II] = t0[MI];
    t0[IM] = 1.0 - t0[MI];
    t0[MM] = (1.0 - t0[MI]) * real(pt.from_begin.to_match);
    t0[MD] = (1.0 - t0[MI]) * real(pt.from_begin.to_deletion);
    t0[DM] = 1.0;
    for (&v, &x) in profile.emission(Emission::PreAlignInsertion).iter().zip(&map) {
        hmm.ins[0][x] = real(v);
    }
    hmm.set_match_basis();

    for pos in 0..m {
        let k = pos + 1;
        for (&v, &x) in profile.match_emission(pos).iter().zip(&map) {
            hmm.mat[k][x] = real(v);
        }

        let tk = &mut hmm.t[k];
        if k == m {
            tk[IM] = real(pt.from_post_align.to_terminal);
            tk[II] = real(pt.from_post_align.to_post_align);
            tk[MM] = tk[IM];
            tk[MI] = tk[II];
            tk[DM] = 1.0;
            for (&v, &x) in profile.emission(Emission::PostAlignInsertion).iter().zip(&map) {
                hmm.ins[k][x] = real(v);
            }
        } else {
            tk[MM] = real(pt.from_match.to_match);
            tk[MI] = real(pt.from_match.to_insertion);
            tk[MD] = real(pt.from_match.to_deletion);
            tk[IM] = real(pt.from_insertion.to_match);
            tk[II] = real(pt.from_insertion.to_insertion);
            tk[DM] = real(pt.from_deletion.to_match);
            tk[DD] = real(pt.from_deletion.to_deletion);
            for (&v, &x) in profile.emission(Emission::Insertion).iter().zip(&map) {
                hmm.ins[k][x] = real(v);
            }
        }
    }

    hmm.nseq = Some(msa.nseq());
    #[allow(clippy::cast_precision_loss)]
    let eff_nseq = msa.nseq() as f64;
    hmm.eff_nseq = Some(eff_nseq);

    let matassign = vec![true; msa.alen];
    annotate_model(&mut hmm, msa, &matassign);
    msa.rf = Some(vec![b'x'; msa.alen]);

    log::debug!("Converted a profile of length {m} to a {alphabet} HMM");
    Ok(hmm)
}

/// Copies per-column annotation from `msa` onto the consensus nodes of
/// `hmm`. `matassign[apos]` marks the alignment columns that became nodes,
/// in order; the map line records each node's 1-based column.
pub(crate) fn annotate_model(hmm: &mut Plan7Hmm, msa: &Msa, matassign: &[bool]) {
    let columns: Vec<usize> = matassign
        .iter()
        .enumerate()
        .filter_map(|(apos, &is_match)| is_match.then_some(apos))
        .collect();

    let transfer = |track: Option<&Vec<u8>>| {
        track.map(|line| {
            let mut out = Vec::with_capacity(columns.len() + 1);
            out.push(b' ');
            out.extend(columns.iter().map(|&apos| line[apos]));
            out
        })
    };
    hmm.rf = transfer(msa.rf.as_ref());
    hmm.cs = transfer(msa.ss_cons.as_ref());
    hmm.ca = transfer(msa.sa_cons.as_ref());

    let mut map = Vec::with_capacity(columns.len() + 1);
    map.push(0);
    map.extend(columns.iter().map(|&apos| apos + 1));
    hmm.map = Some(map);
}

#[cfg(test)]
mod test;
