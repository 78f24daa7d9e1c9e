use super::*;
use crate::{
    ProfillicError, assert_fp_eq,
    data::Alphabet,
    profile::{AnyProfile, Dna, Profile},
};
use std::io::Cursor;

fn read_one(text: &str, format: Option<MsaFormat>) -> crate::ProfillicResult<Option<MsaRecord>> {
    MsaReader::new(Cursor::new(text.as_bytes()), format)?.read()
}

fn read_msa(text: &str, format: Option<MsaFormat>) -> Msa {
    read_one(text, format).unwrap().unwrap().msa
}

fn read_err(text: &str, format: Option<MsaFormat>) -> String {
    read_one(text, format).unwrap_err().to_string()
}

static STOCKHOLM_FULL: &str = "\
# STOCKHOLM 1.0

#=GF ID fam
#=GF AC PF00001
#=GF DE A test family
#=GF GA 25.0 20.0;
#=GF TC 30.0
#=GF CC first
#=GF CC second
#=GS seq1 WT 0.5
#=GS seq2 WT 1.5
#=GS seq1 DE first sequence
# a comment
seq1 ACG
#=GR seq1 SS <<-
seq2 A-G
#=GC SS_cons <<-
#=GC RF xxx

seq1 T
#=GR seq1 SS >
seq2 T
#=GC SS_cons >
#=GC RF x
//
";

#[test]
fn stockholm_minimal() {
    let msa = read_msa("# STOCKHOLM 1.0\n#=GF ID test\nseq1 ACGT\nseq2 AC-T\n//\n", None);
    assert_eq!(msa.name.as_deref(), Some("test"));
    assert_eq!(msa.nseq(), 2);
    assert_eq!(msa.alen, 4);
    assert_eq!(msa.weights, vec![1.0, 1.0]);
    assert!(!msa.has_weights);
}

#[test]
fn stockholm_annotation() {
    let msa = read_msa(STOCKHOLM_FULL, Some(MsaFormat::Stockholm));
    assert_eq!(msa.name.as_deref(), Some("fam"));
    assert_eq!(msa.accession.as_deref(), Some("PF00001"));
    assert_eq!(msa.description.as_deref(), Some("A test family"));
    assert_eq!(msa.cutoffs.ga, [Some(25.0), Some(20.0)]);
    assert_eq!(msa.cutoffs.tc, [Some(30.0), None]);
    assert_eq!(Cutoffs::pair(msa.cutoffs.tc), None);
    assert_eq!(msa.gf, vec![("CC".to_string(), "first second".to_string())]);
    assert_eq!(msa.comments, vec![" a comment".to_string()]);

    assert!(msa.has_weights);
    assert_eq!(msa.weights, vec![0.5, 1.5]);
    assert_eq!(msa.seq_descriptions[0].as_deref(), Some("first sequence"));

    assert_eq!(msa.aseqs[0], b"ACGT");
    assert_eq!(msa.aseqs[1], b"A-GT");
    let ss = msa.ss.as_ref().unwrap();
    assert_eq!(ss[0].as_deref(), Some(&b"<<->"[..]));
    assert_eq!(ss[1], None);
    assert_eq!(msa.ss_cons.as_deref(), Some(&b"<<->"[..]));
    assert_eq!(msa.rf.as_deref(), Some(&b"xxxx"[..]));
    assert_eq!(msa.alen, 4);
}

#[test]
fn stockholm_requires_header() {
    let err = read_err("seq1 ACGT\n//\n", Some(MsaFormat::Stockholm));
    assert_eq!(err, "parse failed (line 1): missing \"# STOCKHOLM\" header");
}

#[test]
fn stockholm_requires_terminator() {
    let err = read_err("# STOCKHOLM 1.0\nseq1 ACGT\n", None);
    assert_eq!(err, "parse failed (line 3): didn't find // at end of alignment");
}

#[test]
fn stockholm_length_mismatch() {
    let err = read_err("# STOCKHOLM 1.0\n#=GF ID x\nseq1 ACGT\nseq2 ACG\n//\n", None);
    assert_eq!(err, "MSA x parse error: sequence seq2: length 3, expected 4");

    let err = read_err("# STOCKHOLM 1.0\nseq1 ACGT\n#=GC RF xx\n//\n", None);
    assert_eq!(err, "MSA  parse error: GC RF markup: len 2, expected 4");
}

#[test]
fn stockholm_partial_weights() {
    let err = read_err("# STOCKHOLM 1.0\n#=GS seq1 WT 0.3\nseq1 ACGT\nseq2 ACGT\n//\n", None);
    assert!(err.contains("expected a weight for seq seq2"), "{err}");
}

#[test]
fn stockholm_bad_lines() {
    let err = read_err("# STOCKHOLM 1.0\n#=GS seq1 WT\nseq1 ACGT\n//\n", None);
    assert_eq!(err, "parse failed (line 2): bad #=GS line");

    let err = read_err("# STOCKHOLM 1.0\n#=GS seq1 WT heavy\nseq1 ACGT\n//\n", None);
    assert_eq!(err, "parse failed (line 2): bad #=GS line");

    let err = read_err("# STOCKHOLM 1.0\nseq1\n//\n", None);
    assert_eq!(err, "parse failed (line 2): bad sequence line");
}

#[test]
fn stockholm_multiple_records() {
    let text = "# STOCKHOLM 1.0\n#=GF ID a\ns AC\n//\n\n# STOCKHOLM 1.0\n#=GF ID b\ns ACG\n//\n\n";
    let names: Vec<_> = MsaReader::new(Cursor::new(text.as_bytes()), None)
        .unwrap()
        .map(|r| r.unwrap().msa.name.unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn selex_blocks() {
    let text = "# comment\nseq1 AC GT\nseq2 ACTGT\n#=RF xxxxx\n\nseq1 GG\nseq2 G.\n#=RF xx\n";
    let msa = read_msa(text, Some(MsaFormat::Selex));
    assert_eq!(msa.nseq(), 2);
    assert_eq!(msa.aseqs[0], b"AC.GTGG");
    assert_eq!(msa.aseqs[1], b"ACTGTG.");
    assert_eq!(msa.rf.as_deref(), Some(&b"xxxxxxx"[..]));
    assert_eq!(msa.alen, 7);
    assert_eq!(msa.weights, vec![1.0, 1.0]);
}

#[test]
fn selex_per_sequence_markup() {
    let text = "seq1 ACGT\n#=SS >>..\nseq2 AC-T\n";
    let msa = read_msa(text, Some(MsaFormat::Selex));
    let ss = msa.ss.as_ref().unwrap();
    assert_eq!(ss[0].as_deref(), Some(&b">>.."[..]));
    assert_eq!(ss[1], None);
}

#[test]
fn selex_block_errors() {
    let err = read_err("seq1 ACGT\nseq2 AC-T\n\nseq1 GG\n", Some(MsaFormat::Selex));
    assert_eq!(err, "parse failed (line 4): expected 2 lines in block, saw 1");

    let err = read_err("seq1 ACGT\nseq2 AC-T\n\nseqX GG\nseq2 G.\n", Some(MsaFormat::Selex));
    assert_eq!(err, "parse failed (line 4): expected seq seq1, saw seqX");

    let err = read_err("#=SS ....\nseq1 ACGT\n", Some(MsaFormat::Selex));
    assert_eq!(err, "parse failed (line 1): #=SS must follow a sequence");

    let err = read_err("seq1 ACGT\n#=RF xxxx\n#=RF xxxx\n", Some(MsaFormat::Selex));
    assert_eq!(err, "parse failed (line 3): too many #=RF lines for block");

    let err = read_err("seq1 ACGT\n#=RF xxxx\n\n#=RF xx\nseq1 GG\n", Some(MsaFormat::Selex));
    assert_eq!(err, "parse failed (line 4): #=RF line isn't in expected order");

    let err = read_err("\n# only a comment\n", Some(MsaFormat::Selex));
    assert_eq!(err, "parse failed: no alignment data found");
}

#[test]
fn non_utf8_annotation_is_kept() {
    let text = b"# STOCKHOLM 1.0\n#=GF ID fam\n#=GF AU Jos\xE9\nseq1 ACGT\nseq2 AC-T\n//\n";
    let msa = MsaReader::new(Cursor::new(&text[..]), None)
        .unwrap()
        .read()
        .unwrap()
        .unwrap()
        .msa;
    assert_eq!(msa.author.as_deref(), Some("Jos\u{FFFD}"));
    assert_eq!(msa.aseqs[1], b"AC-T");

    let text = b"# comment \xFF\nseq1 ACGT\nseq2 AC-T\n";
    let msa = MsaReader::new(Cursor::new(&text[..]), Some(MsaFormat::Selex))
        .unwrap()
        .read()
        .unwrap()
        .unwrap()
        .msa;
    assert_eq!(msa.nseq(), 2);
    assert_eq!(msa.aseqs[0], b"ACGT");
}

#[test]
fn afa_equal_lengths() {
    let msa = read_msa(">s1\nAAAA\n>s2\nAAAA\n", None);
    assert_eq!(msa.nseq(), 2);
    assert_eq!(msa.alen, 4);
}

#[test]
fn afa_descriptions_and_whitespace() {
    let msa = read_msa(">s1 my seq\nAC GT\n  >s2\nA-\n-T\n", Some(MsaFormat::Afa));
    assert_eq!(msa.seq_descriptions[0].as_deref(), Some("my seq"));
    assert_eq!(msa.seq_descriptions[1], None);
    assert_eq!(msa.aseqs[0], b"ACGT");
    assert_eq!(msa.aseqs[1], b"A--T");
}

#[test]
fn afa_length_mismatch() {
    let err = read_err(">s1\nAAAA\n>s2\nAAA\n", None);
    assert_eq!(
        err,
        "sequence 2 length (3) is not equal to the expected length (4) (the length of first seq in file)"
    );

    let err = read_err(">s1\nAAAA\n>s2\nAAA\n>s3\nAAAA\n", None);
    assert!(err.starts_with("sequence 2 length (3)"), "{err}");
}

#[test]
fn afa_requires_header() {
    let err = read_err("AAAA\n>s1\nAAAA\n", Some(MsaFormat::Afa));
    assert_eq!(
        err,
        "AFA MSA parse error, first non-whitespace character is not a '>' at line 1"
    );
}

#[test]
fn afa_empty_is_end_of_input() {
    assert!(read_one("\n\n", Some(MsaFormat::Afa)).unwrap().is_none());
    assert!(read_one("", None).unwrap().is_none());
}

#[test]
fn profillic_consensus() {
    let mut profile = Profile::<Dna, f64>::uniform(3);
    profile.matches[0] = vec![0.7, 0.1, 0.1, 0.1];
    profile.matches[1] = vec![0.1, 0.1, 0.7, 0.1];
    profile.matches[2] = vec![0.1, 0.1, 0.1, 0.7];
    let mut text = Vec::new();
    profile.write_to(&mut text).unwrap();

    let mut reader = MsaReader::new(Cursor::new(text), None).unwrap();
    assert_eq!(reader.format(), MsaFormat::Profillic);

    let record = reader.read().unwrap().unwrap();
    assert_eq!(record.msa.name.as_deref(), Some(PROFILE_MSA_NAME));
    assert_eq!(record.msa.seq_names, vec![PROFILE_CONSENSUS_NAME.to_string()]);
    assert_eq!(record.msa.aseqs[0], b"AGT");
    assert_eq!(record.profile, Some(AnyProfile::Dna(profile)));
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn unimplemented_formats() {
    let err = read_one("", Some(MsaFormat::A2m)).unwrap_err();
    assert!(matches!(err, ProfillicError::NotImplemented(_)));
    assert_eq!(err.to_string(), "A2M format input parser not implemented yet.");
    assert_eq!(
        read_err("", Some(MsaFormat::Psiblast)),
        "PSIBLAST format input parser not implemented yet."
    );
}

#[test]
fn format_names() {
    assert_eq!(MsaFormat::from("Stockholm"), MsaFormat::Stockholm);
    assert_eq!(MsaFormat::from("PFAM"), MsaFormat::Pfam);
    assert_eq!(MsaFormat::from("a2m"), MsaFormat::A2m);
    assert_eq!(MsaFormat::from("SELEX"), MsaFormat::Selex);
    assert_eq!(MsaFormat::from("afa"), MsaFormat::Afa);
    assert_eq!(MsaFormat::from("Profillic"), MsaFormat::Profillic);
    assert_eq!(MsaFormat::from("clustal"), MsaFormat::Unknown);
}

#[test]
fn missing_data_only_at_edges() {
    let msa = Msa::from_sequences([("s1", "~~AC-T~"), ("s2", "ACGT---")]).unwrap();
    assert!(msa.validate_missing_data().is_ok());

    let msa = Msa::from_sequences([("s1", "ACGT"), ("s2", "A~GT")]).unwrap();
    let err = msa.validate_missing_data().unwrap_err().to_string();
    assert_eq!(
        err,
        "msa ; sequence s2\nhas missing data chars (~) other than at fragment edges"
    );
}

#[test]
fn fragments_are_marked() {
    let mut msa = Msa::from_sequences([("full", "ACGTACGTAC"), ("frag", "--ACG-----")]).unwrap();
    assert_eq!(msa.mark_fragments(0.5), 1);
    assert_eq!(msa.aseqs[0], b"ACGTACGTAC");
    assert_eq!(msa.aseqs[1], b"~~ACG~~~~~");
}

#[test]
fn checksum_tracks_residues() {
    let a = Msa::from_sequences([("s1", "ACGT"), ("s2", "AC-T")]).unwrap();
    let b = Msa::from_sequences([("x", "ACGT"), ("y", "AC-T")]).unwrap();
    let c = Msa::from_sequences([("s1", "ACGT"), ("s2", "ACGT")]).unwrap();
    assert_eq!(a.checksum(), b.checksum());
    assert_ne!(a.checksum(), c.checksum());
}

fn redundant_msa() -> Msa {
    Msa::from_sequences([("a1", "AAAA"), ("a2", "AAAA"), ("c", "CCCC")]).unwrap()
}

#[test]
fn weights_downweight_redundancy() {
    let msa = redundant_msa();
    let expected = [0.75, 0.75, 1.5];
    assert_fp_eq!(position_based_weights(&msa, Alphabet::Dna), expected.to_vec());
    assert_fp_eq!(blosum_weights(&msa, 0.62), expected.to_vec());
    assert_fp_eq!(gsc_weights(&msa), expected.to_vec());
}

#[test]
fn relative_weights_strategies() {
    let mut msa = redundant_msa();
    msa.set_relative_weights(WeightStrategy::None, Alphabet::Dna, 0.62).unwrap();
    assert_eq!(msa.weights, vec![1.0; 3]);
    msa.set_relative_weights(WeightStrategy::Blosum, Alphabet::Dna, 0.62).unwrap();
    assert_fp_eq!(msa.weights.iter().sum::<f64>(), 3.0);
}

#[test]
fn clusters_by_identity() {
    let clusters = single_linkage(&redundant_msa(), 0.62);
    assert_eq!(clusters.count, 2);
    assert_eq!(clusters.assignment, vec![0, 0, 1]);
    assert_fp_eq!(pairwise_identity(b"AC-T", b"ACGT"), 1.0);
    assert_fp_eq!(@absolute, pairwise_identity(b"----", b"ACGT"), 0.0, 1e-12);
}

#[test]
fn afa_writing_reads_back() {
    let mut msa = read_msa(">s1 my seq\nAC-T\n>s2\nA.GT\n", None);
    msa.aseqs[0] = b"A".repeat(65);
    msa.aseqs[1] = b"C".repeat(65);
    msa.alen = 65;

    let mut out = Vec::new();
    msa.write_afa(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with(&format!(">s1 my seq\n{}\nAAAAA\n>s2\n", "A".repeat(60))), "{text}");

    let back = read_msa(&text, Some(MsaFormat::Afa));
    assert_eq!(back.seq_names, msa.seq_names);
    assert_eq!(back.aseqs, msa.aseqs);
    assert_eq!(back.seq_descriptions, msa.seq_descriptions);
}
