use profillic::{
    assert_fp_eq,
    build::{BuildOutput, ConsensusMarkup},
    data::msa::MsaRecord,
    hmm::ModelSummary,
    prelude::*,
    profile::AnyProfile,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
};
use tempfile::NamedTempFile;

const FAMILIES: &str = "\
# STOCKHOLM 1.0
#=GF ID fam1
#=GF AC PF00001.1
s1 ACGTACGT
s2 ACGTTCGT
s3 ACG-ACGA
//
# STOCKHOLM 1.0
#=GF ID fam2
a1 GGCCAATT
a2 GGCCTATT
//
";

fn temp_file_with(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn build_all(records: impl IntoIterator<Item = ProfillicResult<MsaRecord>>) -> Vec<BuildOutput> {
    let mut builder = Builder::new(BuilderConfig::default(), Alphabet::Dna);
    let bg = Background::new(Alphabet::Dna);
    records
        .into_iter()
        .map(|record| {
            let MsaRecord { mut msa, profile } = record.unwrap();
            builder.build(&mut msa, profile.as_ref(), &bg).unwrap()
        })
        .collect()
}

#[test]
fn build_write_and_read_models() {
    let msafile = temp_file_with(FAMILIES);
    let reader = MsaReader::from_filename(msafile.path(), None).unwrap();
    assert_eq!(reader.format(), MsaFormat::Stockholm);
    let built = build_all(reader);
    assert_eq!(built.len(), 2);

    let hmmfile = NamedTempFile::new().unwrap();
    {
        let mut out = BufWriter::new(File::create(hmmfile.path()).unwrap());
        for output in &built {
            output.hmm.write_to(&mut out).unwrap();
        }
        out.flush().unwrap();
    }

    let models: Vec<Plan7Hmm> = HmmReader::from_filename(hmmfile.path())
        .unwrap()
        .collect::<ProfillicResult<_>>()
        .unwrap();
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name.as_deref(), Some("fam1"));
    assert_eq!(models[0].acc.as_deref(), Some("PF00001.1"));
    assert_eq!(models[1].name.as_deref(), Some("fam2"));
    for (model, output) in models.iter().zip(&built) {
        assert_eq!(model.m, output.hmm.m);
        assert_eq!(model.nseq, output.hmm.nseq);
        assert_eq!(model.checksum, output.hmm.checksum);
        assert_fp_eq!(@absolute, model.t, output.hmm.t, 1e-4);
        assert_fp_eq!(@absolute, model.mat, output.hmm.mat, 1e-4);
        model.validate(1e-4).unwrap();

        let bg = Background::new(model.alphabet);
        let row = ModelSummary { index: 1, hmm: model, bg: &bg.freqs }.to_string();
        assert!(row.contains(model.name.as_deref().unwrap()), "{row}");
    }
}

#[test]
fn profile_files_feed_the_builder() {
    let msafile = temp_file_with(FAMILIES);
    let built = build_all(MsaReader::from_filename(msafile.path(), None).unwrap());
    let hmm = &built[0].hmm;

    let profile: Profile<Dna, f64> = hmm_to_profile(hmm).unwrap();
    let profile_file = NamedTempFile::new().unwrap();
    {
        let mut out = File::create(profile_file.path()).unwrap();
        profile.write_to(&mut out).unwrap();
    }

    let mut reader = MsaReader::from_filename(profile_file.path(), None).unwrap();
    assert_eq!(reader.format(), MsaFormat::Profillic);
    let MsaRecord { mut msa, profile: read_back } = reader.read().unwrap().unwrap();
    assert!(reader.read().unwrap().is_none());
    assert_eq!(read_back, Some(AnyProfile::Dna(profile.clone())));
    assert_eq!(msa.aseqs[0], profile.consensus());

    let direct = profile_to_hmm(&profile, &mut msa.clone(), Alphabet::Dna).unwrap();
    assert_fp_eq!(direct.mat[1..].to_vec(), hmm.mat[1..].to_vec(), 1e-12);

    let bg = Background::new(Alphabet::Dna);
    let rebuilt = Builder::new(BuilderConfig::default(), Alphabet::Dna)
        .with_post_alignment(ConsensusMarkup)
        .build(&mut msa, read_back.as_ref(), &bg)
        .unwrap();
    assert_eq!(rebuilt.hmm.m, hmm.m);
    assert_eq!(rebuilt.hmm.name.as_deref(), Some("Galosh Profile"));
    rebuilt.hmm.validate(1e-6).unwrap();
    let post = rebuilt.post_msa.unwrap();
    assert_eq!(post.rf, Some(vec![b'x'; hmm.m]));
}

#[test]
fn empty_files_are_rejected() {
    let empty = NamedTempFile::new().unwrap();
    let err = MsaReader::from_filename(empty.path(), None).err().unwrap();
    assert!(err.to_string().contains("file empty"), "{err}");
    let err = HmmReader::from_filename(empty.path()).err().unwrap();
    assert!(err.to_string().contains("file empty"), "{err}");
}

#[test]
fn afa_resave_reads_back() {
    let msafile = temp_file_with(FAMILIES);
    let mut reader = MsaReader::from_filename(msafile.path(), Some(MsaFormat::Stockholm)).unwrap();
    let mut msa = reader.read().unwrap().unwrap().msa;
    let bg = Background::new(Alphabet::Dna);
    let post = Builder::new(BuilderConfig::default(), Alphabet::Dna)
        .with_post_alignment(ConsensusMarkup)
        .build(&mut msa, None, &bg)
        .unwrap()
        .post_msa
        .unwrap();

    let afa = NamedTempFile::new().unwrap();
    {
        let mut out = File::create(afa.path()).unwrap();
        post.write_afa(&mut out).unwrap();
    }
    let back = MsaReader::from_filename(afa.path(), None).unwrap().read().unwrap().unwrap().msa;
    assert_eq!(back.seq_names, post.seq_names);
    assert_eq!(back.aseqs, post.aseqs);
}
