use profillic::{
    assert_fp_eq,
    hmm::{DM, IM, MD, MM},
    prelude::*,
};
use std::io::Cursor;

fn read(text: &str) -> ProfillicResult<Option<Msa>> {
    Ok(MsaReader::new(Cursor::new(text), None)?.read()?.map(|r| r.msa))
}

#[test]
fn stockholm_two_sequences() {
    let msa = read("# STOCKHOLM 1.0\n#=GF ID test\nseq1 ACGT\nseq2 AC-T\n//\n")
        .unwrap()
        .unwrap();
    assert_eq!(msa.name.as_deref(), Some("test"));
    assert_eq!(msa.nseq(), 2);
    assert_eq!(msa.alen, 4);
    assert_eq!(msa.weights, vec![1.0, 1.0]);
    assert_eq!(msa.seq_names, ["seq1", "seq2"]);
}

#[test]
fn afa_equal_lengths() {
    let mut reader = MsaReader::new(Cursor::new(">s1\nAAAA\n>s2\nAAAA\n"), None).unwrap();
    assert_eq!(reader.format(), MsaFormat::Afa);
    let msa = reader.read().unwrap().unwrap().msa;
    assert_eq!(msa.nseq(), 2);
    assert_eq!(msa.alen, 4);
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn afa_unequal_lengths() {
    let err = read(">s1\nAAAA\n>s2\nAAA\n").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("sequence 2 length (3)"), "{msg}");
    assert!(msg.contains("expected length (4)"), "{msg}");
}

#[test]
fn uniform_profile_to_hmm() {
    let profile = Profile::<Dna, f64>::uniform(3);
    let mut msa = Msa::from_sequences([("consensus", "ACG")]).unwrap();
    let hmm = profile_to_hmm(&profile, &mut msa, Alphabet::Dna).unwrap();

    assert_eq!(hmm.m, 3);
    assert_eq!(hmm.mat[0], vec![1.0, 0.0, 0.0, 0.0]);
    let from_match = &profile.transitions.from_match;
    assert_eq!(
        hmm.t[1][MM..=MD],
        [from_match.to_match, from_match.to_insertion, from_match.to_deletion]
    );
}

#[test]
fn unify_four_node_model() {
    let mut hmm = Plan7Hmm::new(4, Alphabet::Dna);
    hmm.t[0] = [0.5, 0.25, 0.25, 0.9, 0.1, 1.0, 0.0];
    hmm.t[1] = [0.8, 0.1, 0.1, 0.6, 0.4, 0.7, 0.3];
    hmm.t[2] = [0.5, 0.3, 0.2, 0.2, 0.8, 0.1, 0.9];
    hmm.t[3] = [0.9, 0.05, 0.05, 0.5, 0.5, 0.4, 0.6];
    hmm.t[4] = [0.75, 0.25, 0.0, 0.7, 0.3, 1.0, 0.0];
    let t0 = hmm.t[0];
    let t4 = hmm.t[4];

    unify(&mut hmm);

    assert_eq!(hmm.t[1], hmm.t[2]);
    assert_eq!(hmm.t[2], hmm.t[3]);
    assert_fp_eq!(hmm.t[1][MM..IM].iter().sum::<f64>(), 1.0);
    assert_fp_eq!(hmm.t[1][IM..DM].iter().sum::<f64>(), 1.0);
    assert_fp_eq!(hmm.t[1][DM..].iter().sum::<f64>(), 1.0);
    assert_eq!(hmm.t[0], t0);
    assert_eq!(hmm.t[4], t4);
}
