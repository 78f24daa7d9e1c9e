use super::*;
use crate::{
    assert_fp_eq,
    math::{LogProb, sum},
    profile::{Amino, Dna, Profile},
};

fn consensus_msa(seq: &str) -> Msa {
    Msa::from_sequences([("Galosh Profile Consensus", seq)]).unwrap()
}

/// A DNA model with unnormalized, position-specific parameters.
fn uneven_model() -> Plan7Hmm {
    let mut hmm = Plan7Hmm::new(3, Alphabet::Dna);
    hmm.t[0] = [0.6, 0.2, 0.2, 0.7, 0.3, 1.0, 0.0];
    hmm.t[1] = [3.0, 1.0, 1.0, 2.0, 2.0, 1.0, 3.0];
    hmm.t[2] = [1.0, 1.0, 2.0, 4.0, 0.0, 3.0, 1.0];
    hmm.t[3] = [0.9, 0.1, 0.0, 0.8, 0.2, 1.0, 0.0];
    for k in 0..=3 {
        #[allow(clippy::cast_precision_loss)]
        let x = k as f64;
        hmm.mat[k] = vec![1.0 + x, 2.0, 3.0, 4.0 - x];
        hmm.ins[k] = vec![1.0, 1.0 + x, 1.0, 1.0];
    }
    hmm
}

fn unified_model() -> Plan7Hmm {
    let mut hmm = Plan7Hmm::new(4, Alphabet::Dna);
    hmm.t[0] = [0.45, 0.1, 0.45, 0.9, 0.1, 1.0, 0.0];
    for k in 1..4 {
        hmm.t[k] = [0.7, 0.2, 0.1, 0.6, 0.4, 0.3, 0.7];
        hmm.ins[k] = vec![0.1, 0.2, 0.3, 0.4];
    }
    hmm.t[4] = [0.8, 0.2, 0.0, 0.8, 0.2, 1.0, 0.0];
    hmm.ins[0] = vec![0.25; 4];
    hmm.ins[4] = vec![0.25; 4];
    for k in 1..=4 {
        hmm.mat[k] = vec![0.7, 0.1, 0.1, 0.1];
    }
    hmm.set_match_basis();
    hmm
}

#[test]
fn uniform_profile_to_hmm() {
    let profile = Profile::<Dna, f64>::uniform(3);
    let mut msa = consensus_msa("AAA");
    let hmm = profile_to_hmm(&profile, &mut msa, Alphabet::Dna).unwrap();

    assert_eq!(hmm.m, 3);
    assert_eq!(hmm.mat[0], vec![1.0, 0.0, 0.0, 0.0]);
    let third = 1.0 / 3.0;
    assert_eq!(hmm.t[1][MM..=MD], [third, third, third]);
    assert_eq!(hmm.t[2][MM..=MD], [third, third, third]);
    assert_eq!(hmm.t[1][IM..], [0.5, 0.5, 0.5, 0.5]);

    assert_fp_eq!(hmm.t[0], [0.25, 0.5, 0.25, 0.5, 0.5, 1.0, 0.0]);
    assert_fp_eq!(hmm.t[3], [0.5, 0.5, 0.0, 0.5, 0.5, 1.0, 0.0]);
    assert_eq!(hmm.mat[2], vec![0.25; 4]);
    assert_eq!(hmm.ins[3], vec![0.25; 4]);

    assert_eq!(hmm.nseq, Some(1));
    assert_eq!(hmm.eff_nseq, Some(1.0));
    assert_eq!(hmm.map, Some(vec![0, 1, 2, 3]));
    assert_eq!(hmm.rf, None);
    assert_eq!(msa.rf, Some(b"xxx".to_vec()));
}

#[test]
fn profile_annotation_is_transferred() {
    let profile = Profile::<Dna, f64>::uniform(3);
    let mut msa = consensus_msa("ACG");
    msa.ss_cons = Some(b"<.>".to_vec());
    msa.rf = Some(b"x.x".to_vec());
    let hmm = profile_to_hmm(&profile, &mut msa, Alphabet::Dna).unwrap();
    assert_eq!(hmm.cs, Some(b" <.>".to_vec()));
    assert_eq!(hmm.rf, Some(b" x.x".to_vec()));
    assert_eq!(hmm.ca, None);
    assert_eq!(msa.rf, Some(b"xxx".to_vec()));
}

#[test]
fn profile_to_hmm_rejects_bad_input() {
    let mut msa = consensus_msa("AA");
    let err = profile_to_hmm(&Profile::<Dna, f64>::new(0), &mut msa, Alphabet::Dna).unwrap_err();
    assert!(err.is_no_result());

    let err = profile_to_hmm(&Profile::<Dna, f64>::uniform(3), &mut msa, Alphabet::Dna).unwrap_err();
    assert!(matches!(err, ProfillicError::InvalidInput(_)));

    let err = profile_to_hmm(&Profile::<Dna, f64>::uniform(2), &mut msa, Alphabet::Amino).unwrap_err();
    assert!(matches!(err, ProfillicError::InvalidInput(_)));
}

#[test]
fn empty_hmm_has_no_profile() {
    let hmm = Plan7Hmm::new(0, Alphabet::Dna);
    let err = hmm_to_profile::<Profile<Dna, f64>>(&hmm).unwrap_err();
    assert!(err.is_no_result());
}

#[test]
fn hmm_to_profile_is_normalized() {
    let profile: Profile<Dna, f64> = hmm_to_profile(&uneven_model()).unwrap();
    let t = &profile.transitions;
    for group_sum in [
        t.from_pre_align.sum(),
        t.from_begin.sum(),
        t.from_match.sum(),
        t.from_insertion.sum(),
        t.from_deletion.sum(),
        t.from_post_align.sum(),
    ] {
        assert_fp_eq!(group_sum, 1.0, 1e-6);
    }
    for v in profile
        .matches
        .iter()
        .chain([&profile.pre_align_insertion, &profile.insertion, &profile.post_align_insertion])
    {
        assert_fp_eq!(sum(v), 1.0, 1e-6);
    }

    assert_fp_eq!(t.from_pre_align.to_pre_align, 0.3);
    assert_fp_eq!(t.from_begin.to_match, 0.75);
    // Interior nodes 1 and 2 are summed: MM 4, MI 2, MD 3.
    assert_fp_eq!(t.from_match.to_match, 4.0 / 9.0);
    assert_fp_eq!(t.from_deletion.to_deletion, 0.5);
    assert_fp_eq!(t.from_post_align.to_terminal, 0.8);
    // Insertion sums ins[1] and ins[2].
    assert_fp_eq!(profile.insertion, vec![2.0 / 11.0, 5.0 / 11.0, 2.0 / 11.0, 2.0 / 11.0]);
    assert_fp_eq!(profile.matches[2], vec![0.4, 0.2, 0.3, 0.1]);
}

#[test]
fn unified_model_round_trips() {
    let hmm = unified_model();
    let profile: Profile<Dna, f64> = hmm_to_profile(&hmm).unwrap();
    let mut msa = consensus_msa(&String::from_utf8(profile.consensus()).unwrap());
    let back = profile_to_hmm(&profile, &mut msa, Alphabet::Dna).unwrap();

    for k in 1..4 {
        assert_fp_eq!(back.t[k], hmm.t[k], 1e-12);
        assert_fp_eq!(back.ins[k], hmm.ins[k], 1e-12);
    }
    assert_fp_eq!(back.mat, hmm.mat, 1e-12);
    assert_fp_eq!(back.ins[4], hmm.ins[4]);
    assert_fp_eq!(back.t[4][IM], hmm.t[4][IM]);
}

#[test]
fn amino_residues_map_by_symbol() {
    let mut hmm = Plan7Hmm::new(1, Alphabet::Amino);
    let r = Alphabet::Amino.index_of(b'R').unwrap();
    hmm.mat[1][r] = 1.0;
    hmm.t[0] = [1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0];
    hmm.t[1] = [1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0];

    let profile: Profile<Amino, f64> = hmm_to_profile(&hmm).unwrap();
    assert_eq!(profile.matches[0][1], 1.0);
    assert_eq!(profile.consensus(), b"R".to_vec());

    let mut msa = consensus_msa("R");
    let back = profile_to_hmm(&profile, &mut msa, Alphabet::Amino).unwrap();
    assert_eq!(back.mat[1][r], 1.0);
}

#[test]
fn log_space_profiles() {
    let profile: Profile<Dna, LogProb> = hmm_to_profile(&uneven_model()).unwrap();
    assert_fp_eq!(profile.transitions.from_match.to_match.to_f64(), 4.0 / 9.0, 1e-12);
    assert_fp_eq!(sum(&profile.matches[0]).to_f64(), 1.0, 1e-12);
}
