use clap::Parser;
use profillic::{
    ProfillicError,
    build::{Builder, BuilderConfig},
    data::{
        Background,
        err::{OrFail, init_logging},
    },
    hmm::{HmmReader, ModelSummary},
};
use std::{fs::File, io::BufWriter, io::Write};

/// Calibrate HMM search statistics
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input HMM file
    hmm_in: String,

    /// Output HMM file
    hmm_out: String,

    /// Set the random number seed (if 0: one-time arbitrary seed)
    #[clap(long, value_parser, default_value_t = 42)]
    seed: u64,

    /// Print progress (-v) or debugging detail (-vv) to standard error
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    let command = std::env::args().collect::<Vec<_>>().join(" ");

    if args.seed == 0 {
        println!("# random number seed:               one-time arbitrary");
    } else {
        println!("# random number seed set to:        {}", args.seed);
    }

    let reader = HmmReader::from_filename(&args.hmm_in)
        .unwrap_or_die(&format!("File existence/permissions problem in trying to open HMM file {}.", args.hmm_in));
    let mut out = File::create(&args.hmm_out)
        .map(BufWriter::new)
        .unwrap_or_die(&format!("Failed to open HMM file {} for writing", args.hmm_out));

    let config = BuilderConfig {
        seed: args.seed,
        ..BuilderConfig::default()
    };
    // Built on the first model, once its alphabet is known.
    let mut builder: Option<Builder> = None;

    println!("#\n{}", ModelSummary::HEADER);
    for (i, hmm) in reader.enumerate() {
        let mut hmm = hmm.unwrap_or_die(&format!("Bad file format in HMM file {}", args.hmm_in));
        let bg = Background::new(hmm.alphabet);

        let builder = builder.get_or_insert_with(|| Builder::new(config, hmm.alphabet));
        if builder.alphabet() != hmm.alphabet {
            Err::<(), _>(ProfillicError::InvalidInput(format!(
                "HMM file {} contains different alphabets",
                args.hmm_in
            )))
            .unwrap_or_fail();
        }

        builder
            .calibrate(&mut hmm, &bg)
            .unwrap_or_die("Unexpected error in calibrating the hmm");
        hmm.append_comlog(&command);
        hmm.validate(1e-4).unwrap_or_die("The calibrated model is not valid");
        hmm.write_to(&mut out).unwrap_or_die("HMM save failed");

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
