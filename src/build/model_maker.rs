use crate::{
    ProfillicError, ProfillicResult,
    convert::annotate_model,
    data::{Alphabet, Symbol, is_gap, is_missing, msa::Msa},
    hmm::{DD, DM, II, IM, MD, MI, MM, Plan7Hmm},
};

/// How consensus columns are chosen when building from an alignment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArchStrategy {
    /// A column is consensus when its weighted residue fraction reaches
    /// `symfrac`
    #[default]
    Fast,
    /// A column is consensus when its reference annotation is not a gap
    Hand,
}

/// Marks consensus columns by weighted residue occupancy. Missing data does
/// not count toward either residues or gaps.
pub(crate) fn fast_matassign(msa: &Msa, alphabet: Alphabet, symfrac: f64) -> Vec<bool> {
    (0..msa.alen)
        .map(|apos| {
            let (mut r, mut g) = (0.0, 0.0);
            for (aseq, &w) in msa.aseqs.iter().zip(&msa.weights) {
                match alphabet.digitize(aseq[apos]) {
                    s if s.is_residue() => r += w,
                    Symbol::Gap => g += w,
                    _ => {}
                }
            }
            r > 0.0 && r / (r + g) >= symfrac
        })
        .collect()
}

/// Marks consensus columns from the reference line.
pub(crate) fn hand_matassign(msa: &Msa) -> ProfillicResult<Vec<bool>> {
    let rf = msa.rf.as_ref().ok_or_else(|| {
        ProfillicError::format(format!(
            "Alignment {} has no reference annotation line",
            msa.display_name()
        ))
    })?;
    Ok(rf.iter().map(|&c| !is_gap(c) && !is_missing(c)).collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Match(usize),
    Insert(usize),
    Delete(usize),
}

/// Counts one step of a sequence's path through the model. Steps that Plan7
/// forbids, I to D and D to I, are counted as I to M and D to M.
fn count_transition(hmm: &mut Plan7Hmm, from: State, to: State, w: f64) {
    let (k, idx) = match (from, to) {
        (State::Match(k), State::Match(_)) => (k, MM),
        (State::Match(k), State::Insert(_)) => (k, MI),
        (State::Match(k), State::Delete(_)) => (k, MD),
        (State::Insert(k), State::Match(_) | State::Delete(_)) => (k, IM),
        (State::Insert(k), State::Insert(_)) => (k, II),
        (State::Delete(k), State::Match(_) | State::Insert(_)) => (k, DM),
        (State::Delete(k), State::Delete(_)) => (k, DD),
    };
    hmm.t[k][idx] += w;
}

/// Adds weight `w` for `symbol` to an emission vector. Degenerate
/// residues are spread evenly over the canonical ones.
fn count_emission(v: &mut [f64], symbol: Symbol, w: f64) {
    match symbol {
        Symbol::Residue(x) => v[x] += w,
        Symbol::Degenerate => {
            #[allow(clippy::cast_precision_loss)]
            let share = w / v.len() as f64;
            v.iter_mut().for_each(|c| *c += share);
        }
        _ => {}
    }
}

/// Builds a model of weighted observed counts from the consensus columns
/// marked in `matassign`. Begin is node 0 and End is node `M + 1`. Columns
/// holding missing data are skipped, and no transition is counted into or
/// out of them.
///
/// Afterward the model is annotated from `msa` and the alignment's
/// reference line is rewritten to `x` for consensus columns and `.`
/// otherwise.
pub(crate) fn matassign_to_hmm(msa: &mut Msa, alphabet: Alphabet, matassign: &[bool]) -> ProfillicResult<Plan7Hmm> {
    let m = matassign.iter().filter(|&&x| x).count();
    if m == 0 {
        return Err(ProfillicError::no_result(format!(
            "alignment {} has no consensus columns",
            msa.display_name()
        )));
    }

    let mut hmm = Plan7Hmm::new(m, alphabet);
    for (idx, (aseq, &w)) in msa.aseqs.iter().zip(&msa.weights).enumerate() {
        let mut prev = Some(State::Match(0));
        let mut k = 0;

        for (apos, (&b, &is_match)) in aseq.iter().zip(matassign).enumerate() {
            let symbol = alphabet.digitize(b);
            if is_match {
                k += 1;
            }
            let next = match symbol {
                Symbol::Missing => {
                    prev = None;
                    continue;
                }
                Symbol::Invalid => {
                    return Err(ProfillicError::invalid(format!(
                        "sequence {} has invalid character '{}' at column {}",
                        msa.seq_names[idx],
                        b.escape_ascii(),
                        apos + 1
                    )));
                }
                Symbol::Gap if !is_match => continue,
                Symbol::Gap => State::Delete(k),
                _ if is_match => {
                    count_emission(&mut hmm.mat[k], symbol, w);
                    State::Match(k)
                }
                _ => {
                    count_emission(&mut hmm.ins[k], symbol, w);
                    State::Insert(k)
                }
            };
            if let Some(from) = prev {
                count_transition(&mut hmm, from, next, w);
            }
            prev = Some(next);
        }

        if let Some(from) = prev {
            count_transition(&mut hmm, from, State::Match(m + 1), w);
        }
    }

    hmm.nseq = Some(msa.nseq());
    annotate_model(&mut hmm, msa, matassign);
    msa.rf = Some(matassign.iter().map(|&x| if x { b'x' } else { b'.' }).collect());
    Ok(hmm)
}
