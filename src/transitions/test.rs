use super::*;
use crate::{
    assert_fp_eq,
    data::Alphabet,
    hmm::{DD, II, MD, MI},
};

fn varied_model(m: usize) -> Plan7Hmm {
    let mut hmm = Plan7Hmm::new(m, Alphabet::Dna);
    for (k, t) in hmm.t.iter_mut().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let x = k as f64;
        *t = [0.5 + 0.1 * x, 0.3, 0.2 - 0.05 * x, 0.6, 0.4, 0.9 - 0.2 * x, 0.1 + 0.2 * x];
    }
    for v in &mut hmm.mat {
        v.fill(0.25);
    }
    hmm
}

#[test]
fn unify_makes_interior_identical() {
    let mut hmm = varied_model(4);
    let (first, last) = (hmm.t[0], hmm.t[4]);
    unify(&mut hmm);

    assert_eq!(hmm.t[1], hmm.t[2]);
    assert_eq!(hmm.t[2], hmm.t[3]);
    let t = hmm.t[1];
    assert_fp_eq!(t[MM] + t[MI] + t[MD], 1.0);
    assert_fp_eq!(t[IM] + t[II], 1.0);
    assert_fp_eq!(t[DM] + t[DD], 1.0);
    assert_eq!(hmm.t[0], first);
    assert_eq!(hmm.t[4], last);

    // Sums over nodes 1..=3: MM 2.1, MI 0.9, MD 0.3.
    assert_fp_eq!(t[MM], 7.0 / 11.0);
    assert_fp_eq!(t[DM], 0.5);
}

#[test]
fn unify_is_idempotent() {
    let mut once = varied_model(5);
    unify(&mut once);
    let mut twice = once.clone();
    unify(&mut twice);
    for k in 0..=5 {
        assert_fp_eq!(twice.t[k], once.t[k], 1e-12);
    }
}

#[test]
fn unify_without_interior_is_a_no_op() {
    let mut hmm = varied_model(1);
    let before = hmm.clone();
    unify(&mut hmm);
    assert_eq!(hmm, before);
}

#[test]
fn hybridize_copies_transition_structure() {
    let mut target = varied_model(3);
    target.mat[2] = vec![0.7, 0.1, 0.1, 0.1];
    let mut source = Plan7Hmm::new(3, Alphabet::Dna);
    source.t[0] = [0.9, 0.05, 0.05, 0.5, 0.5, 1.0, 0.0];
    source.t[1] = [0.8, 0.1, 0.1, 0.5, 0.5, 0.5, 0.5];
    source.t[2] = [0.6, 0.3, 0.1, 0.7, 0.3, 0.7, 0.3];
    source.t[3] = [0.95, 0.05, 0.0, 0.9, 0.1, 1.0, 0.0];

    hybridize(&mut target, &source).unwrap();
    assert_eq!(target.t[0], source.t[0]);
    assert_eq!(target.t[3], source.t[3]);
    assert_fp_eq!(target.t[1], [0.7, 0.2, 0.1, 0.6, 0.4, 0.6, 0.4]);
    assert_eq!(target.t[1], target.t[2]);
    assert_eq!(target.mat[2], vec![0.7, 0.1, 0.1, 0.1]);
}

#[test]
fn hybridize_rejects_mismatched_lengths() {
    let mut target = varied_model(3);
    let err = hybridize(&mut target, &varied_model(4)).unwrap_err();
    assert!(matches!(err, ProfillicError::InvalidInput(_)));
    assert_eq!(target, varied_model(3));
}
