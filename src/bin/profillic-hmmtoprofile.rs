use clap::Parser;
use profillic::{
    ProfillicError, ProfillicResult,
    convert::hmm_to_profile,
    data::{
        Alphabet, Background,
        err::{OrFail, init_logging},
    },
    hmm::{HmmReader, ModelSummary, Plan7Hmm},
    profile::{Amino, AnyProfile, Dna, Profile},
};
use std::{fs::File, io::BufWriter, io::Write};

/// Convert HMM to galosh profile
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HMM file
    hmm_in: String,

    /// Output galosh profile
    profile_out: String,

    /// Print progress (-v) or debugging detail (-vv) to standard error
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn convert(hmm: &Plan7Hmm) -> ProfillicResult<AnyProfile> {
    match hmm.alphabet {
        Alphabet::Dna => hmm_to_profile::<Profile<Dna, f64>>(hmm).map(AnyProfile::Dna),
        Alphabet::Amino => hmm_to_profile::<Profile<Amino, f64>>(hmm).map(AnyProfile::Amino),
        Alphabet::Rna => Err(ProfillicError::InvalidInput(
            "Sorry, at present the profillic-hmmtoprofile software can only handle amino and dna.".to_string(),
        )),
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut reader = HmmReader::from_filename(&args.hmm_in)
        .unwrap_or_die(&format!("File existence/permissions problem in trying to open HMM file {}.", args.hmm_in));

    println!("#\n{}", ModelSummary::HEADER);
    // A profile file holds a single profile, so only the first model is used.
    let Some(hmm) = reader
        .read()
        .unwrap_or_die(&format!("Bad file format in HMM file {}", args.hmm_in))
    else {
        return;
    };
    if reader.next().is_some() {
        log::warn!("Only the first model in {} is converted", args.hmm_in);
    }

    let profile = convert(&hmm).unwrap_or_die(&format!(
        "Unexpected error in converting HMM from file {} to a {} galosh profile",
        args.hmm_in, hmm.alphabet
    ));

    let mut out = File::create(&args.profile_out)
        .map(BufWriter::new)
        .unwrap_or_die(&format!("Unexpected error in opening the file {} for writing", args.profile_out));
    profile
        .write_to(&mut out)
        .and_then(|()| out.flush())
        .unwrap_or_die("Profile save failed");

    let bg = Background::new(hmm.alphabet);
    println!(
        "{}",
        ModelSummary {
            index: 1,
            hmm:   &hmm,
            bg:    &bg.freqs,
        }
    );
}
