//! Whole-model transition edits.
//!
//! Both operations replace the position-specific transitions of a model's
//! interior nodes `1..M` with a single averaged vector. The match, insert,
//! and delete groups of the average are normalized separately.

use crate::{
    ProfillicError, ProfillicResult,
    hmm::{DM, IM, MM, NTRANSITIONS, Plan7Hmm},
    math::{add_into, normalize},
};

/// Sums the transitions of the interior nodes `1..M` and normalizes each
/// group. A model with fewer than two nodes has no interior and gets an
/// all-zero vector.
#[must_use]
pub fn average_interior_transitions(hmm: &Plan7Hmm) -> [f64; NTRANSITIONS] {
    let mut avg = [0.0; NTRANSITIONS];
    for t in hmm.t.iter().take(hmm.m).skip(1) {
        add_into(&mut avg, t);
    }
    normalize(&mut avg[MM..IM], 0.0);
    normalize(&mut avg[IM..DM], 0.0);
    normalize(&mut avg[DM..], 0.0);
    avg
}

fn broadcast_interior(hmm: &mut Plan7Hmm, avg: &[f64; NTRANSITIONS]) {
    let m = hmm.m;
    for t in hmm.t.iter_mut().take(m).skip(1) {
        *t = *avg;
    }
}

/// Replaces every interior transition vector with their normalized sum.
/// Nodes `0` and `M` are left as they are.
pub fn unify(hmm: &mut Plan7Hmm) {
    let avg = average_interior_transitions(hmm);
    broadcast_interior(hmm, &avg);
    log::debug!("Unified the interior transitions of a model with {} nodes", hmm.m);
}

/// Gives `target` the transition structure of `source`: the averaged
/// interior transitions of `source` go into every interior node of
/// `target`, and the transitions of nodes `0` and `M` are copied verbatim.
/// Emissions of `target` are untouched.
///
/// # Errors
///
/// Fails with [`InvalidInput`](ProfillicError::InvalidInput) if the models
/// have different lengths.
pub fn hybridize(target: &mut Plan7Hmm, source: &Plan7Hmm) -> ProfillicResult<()> {
    if target.m != source.m {
        return Err(ProfillicError::invalid(format!(
            "cannot copy transitions between models of length {} and {}",
            target.m, source.m
        )));
    }

    let avg = average_interior_transitions(source);
    broadcast_interior(target, &avg);
    let m = target.m;
    target.t[0] = source.t[0];
    target.t[m] = source.t[m];
    Ok(())
}

#[cfg(test)]
mod test;
