use super::*;
use crate::{assert_fp_eq, math::LogProb};

#[test]
fn uniform_text_round_trip() {
    let p = Profile::<Dna, f64>::uniform(4);
    let mut buf = Vec::new();
    p.write_to(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("PROFILE galosh 1\nALPHABET DNA\nLENGTH 4\n"));
    assert!(text.ends_with("MATCH 4 0.25 0.25 0.25 0.25\n//\n"));

    let back = Profile::<Dna, f64>::from_text(&text).unwrap();
    assert_eq!(back, p);
}

#[test]
fn log_space_parse() {
    let text = Profile::<Dna, f64>::uniform(2).to_string();
    let p = Profile::<Dna, LogProb>::from_text(&text).unwrap();
    assert_eq!(p.length(), 2);
    assert_fp_eq!(p.transitions.from_match.to_match.to_f64(), 1.0 / 3.0, 1e-12);
    assert_fp_eq!(p.match_emission(1)[2].to_f64(), 0.25, 1e-12);
}

#[test]
fn normalize_and_zero() {
    let mut p = Profile::<Dna, f64>::new(2);
    p.matches[0] = vec![2.0, 2.0, 4.0, 0.0];
    p.transitions.from_match = FromMatch {
        to_match:     6.0,
        to_insertion: 1.0,
        to_deletion:  1.0,
    };
    p.normalize(0.0);
    assert_fp_eq!(p.matches[0], vec![0.25, 0.25, 0.5, 0.0]);
    assert_fp_eq!(p.transitions.from_match.to_match, 0.75);
    // All-zero distributions stay zero.
    assert_eq!(p.matches[1], vec![0.0; 4]);
    assert_eq!(p.transitions.from_begin.sum(), 0.0);

    p.zero();
    assert_eq!(p, Profile::<Dna, f64>::new(2));
}

#[test]
fn group_values() {
    let mut g = FromInsertion::<f64>::default();
    assert_eq!(FromInsertion::<f64>::FIELDS, &["to_match", "to_insertion"]);
    assert!(g.set_values(&[0.3, 0.7]).is_some());
    assert!(g.set_values(&[1.0]).is_none());
    assert_eq!(g.values(), vec![0.3, 0.7]);
    g.accumulate(&FromInsertion {
        to_match:     0.1,
        to_insertion: 0.2,
    });
    assert_fp_eq!(g.sum(), 1.3);
}

#[test]
fn consensus_is_argmax() {
    let mut p = Profile::<Dna, f64>::uniform(3);
    p.matches[0] = vec![0.1, 0.7, 0.1, 0.1];
    p.matches[2] = vec![0.0, 0.0, 0.0, 1.0];
    // Ties take the first residue.
    assert_eq!(p.consensus(), b"CAT".to_vec());
}

#[test]
fn emission_access() {
    let mut p = Profile::<Amino, f64>::new(1);
    p.emission_mut(Emission::PostAlignInsertion)[3] = 1.0;
    assert_eq!(p.post_align_insertion[3], 1.0);
    assert_eq!(p.emission(Emission::Insertion).len(), 20);
}

#[test]
fn out_of_order_match_line() {
    let text = "PROFILE galosh 1\nALPHABET DNA\nLENGTH 2\nMATCH 2 0.25 0.25 0.25 0.25\n//\n";
    let err = Profile::<Dna, f64>::from_text(text).unwrap_err();
    assert_eq!(err.to_string(), "profile parse failed (line 4): expected MATCH 1");
}

#[test]
fn missing_terminator_and_wrong_alphabet() {
    let text = "PROFILE galosh 1\nALPHABET DNA\nLENGTH 0\n";
    let err = Profile::<Dna, f64>::from_text(text).unwrap_err();
    assert_eq!(err.to_string(), "profile parse failed (line 4): didn't find // at end of profile");

    let err = Profile::<Amino, f64>::from_text(text).unwrap_err();
    assert_eq!(err.to_string(), "profile parse failed (line 2): expected alphabet amino");

    let err = Profile::<Dna, f64>::from_text("ALPHABET DNA\n").unwrap_err();
    assert_eq!(err.to_string(), "profile parse failed (line 1): missing PROFILE header");
}

#[test]
fn any_profile_dispatches_on_alphabet() {
    let amino = Profile::<Amino, f64>::uniform(2).to_string();
    let p = AnyProfile::from_text(&amino).unwrap();
    assert_eq!(p.alphabet(), Alphabet::Amino);
    assert_eq!(p.length(), 2);
    assert_eq!(p.consensus(), b"AA".to_vec());

    let rna = "PROFILE galosh 1\nALPHABET RNA\nLENGTH 0\n//\n";
    assert!(matches!(AnyProfile::from_text(rna), Err(ProfillicError::InvalidInput(_))));
    assert!(matches!(
        AnyProfile::from_text("PROFILE galosh 1\n//\n"),
        Err(ProfillicError::Format(_))
    ));
}

#[test]
fn residue_maps() {
    let map = residue_map::<Amino>(Alphabet::Amino).unwrap();
    assert_eq!(map[0], 0);
    assert_eq!(map[1], 14);
    assert_eq!(residue_map::<Dna>(Alphabet::Dna).unwrap(), vec![0, 1, 2, 3]);
    assert!(residue_map::<Dna>(Alphabet::Rna).is_err());
    assert!(residue_map::<Dna>(Alphabet::Amino).is_err());
}
