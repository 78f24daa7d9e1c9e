use clap::Parser;
use profillic::{
    ProfillicError,
    data::{
        Background,
        err::{OrFail, init_logging},
    },
    hmm::{HmmReader, ModelSummary},
    transitions::hybridize,
};
use std::{fs::File, io::BufWriter, io::Write};

/// Create a hybrid of two HMMs with emissions from one, averaged transitions from the other
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HMM file for emissions
    emissions_in: String,

    /// Input HMM file for transitions
    transitions_in: String,

    /// Output HMM file
    hmm_out: String,

    /// Print progress (-v) or debugging detail (-vv) to standard error
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    let command = std::env::args().collect::<Vec<_>>().join(" ");

    let emissions = HmmReader::from_filename(&args.emissions_in).unwrap_or_die(&format!(
        "File existence/permissions problem in trying to open emissions HMM file {}.",
        args.emissions_in
    ));
    let mut transitions = HmmReader::from_filename(&args.transitions_in).unwrap_or_die(&format!(
        "File existence/permissions problem in trying to open transitions HMM file {}.",
        args.transitions_in
    ));
    let mut out = File::create(&args.hmm_out)
        .map(BufWriter::new)
        .unwrap_or_die(&format!("Failed to open HMM file {} for writing", args.hmm_out));

    println!("#\n{}", ModelSummary::HEADER);
    // Models are paired in file order.
    for (i, hmm) in emissions.enumerate() {
        let mut hmm = hmm.unwrap_or_die(&format!("Bad file format in HMM file {}", args.emissions_in));
        let source = transitions
            .read()
            .and_then(|source| {
                source.ok_or_else(|| {
                    ProfillicError::InvalidInput(format!("no HMM in file {} for model {}", args.transitions_in, i + 1))
                })
            })
            .unwrap_or_die(&format!("Read failed for HMM file {}", args.transitions_in));

        hybridize(&mut hmm, &source).unwrap_or_die("Unable to copy the transitions");
        hmm.append_comlog(&command);
        hmm.validate(1e-4).unwrap_or_die("The hybrid model is not valid");
        hmm.write_to(&mut out).unwrap_or_die("HMM save failed");

        let bg = Background::new(hmm.alphabet);
        println!(
            "{}",
            ModelSummary {
                index: i + 1,
                hmm:   &hmm,
                bg:    &bg.freqs,
            }
        );
    }
    out.flush().unwrap_or_die("HMM save failed");
}
