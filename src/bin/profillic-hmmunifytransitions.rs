use clap::Parser;
use profillic::{
    data::{
        Background,
        err::{OrFail, init_logging},
    },
    hmm::{HmmReader, ModelSummary},
    transitions::unify,
};
use std::{fs::File, io::BufWriter, io::Write};

/// Reset to their average the position-specific transition parameters of an HMM
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HMM file
    hmm_in: String,

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

    let reader = HmmReader::from_filename(&args.hmm_in)
        .unwrap_or_die(&format!("File existence/permissions problem in trying to open HMM file {}.", args.hmm_in));
    let mut out = File::create(&args.hmm_out)
        .map(BufWriter::new)
        .unwrap_or_die(&format!("Failed to open HMM file {} for writing", args.hmm_out));

    println!("#\n{}", ModelSummary::HEADER);
    for (i, hmm) in reader.enumerate() {
        let mut hmm = hmm.unwrap_or_die(&format!("Bad file format in HMM file {}", args.hmm_in));

        unify(&mut hmm);
        hmm.append_comlog(&command);
        hmm.validate(1e-4).unwrap_or_die("The unified model is not valid");
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
