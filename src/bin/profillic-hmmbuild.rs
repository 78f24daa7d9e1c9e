use clap::{Parser, ValueEnum};
use profillic::{
    ProfillicError, ProfillicResult,
    build::{ArchStrategy, Builder, BuilderConfig, ConsensusMarkup, EffnStrategy, PriorChoice, WeightStrategy},
    data::{
        Alphabet, Background,
        err::{OrFail, init_logging},
        msa::{MsaFormat, MsaReader, MsaRecord},
    },
    hmm::ModelSummary,
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Weighting {
    /// Henikoff position-based weights
    Pb,
    /// Gerstein/Sonnhammer/Chothia tree weights
    Gsc,
    /// Henikoff simple filter weights
    Blosum,
    /// No relative weighting; every sequence weighs 1
    None,
    /// Weights given in the alignment file
    Given,
}

impl From<Weighting> for WeightStrategy {
    fn from(w: Weighting) -> Self {
        match w {
            Weighting::Pb => WeightStrategy::PositionBased,
            Weighting::Gsc => WeightStrategy::Gsc,
            Weighting::Blosum => WeightStrategy::Blosum,
            Weighting::None => WeightStrategy::None,
            Weighting::Given => WeightStrategy::Given,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Effn {
    /// Adjust the effective sequence number to reach a relative entropy target
    Entropy,
    /// Use the number of single-linkage clusters
    Clust,
    /// Use the number of sequences
    None,
}

/// Profile HMM construction from multiple sequence alignments or galosh profiles
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Output HMM file
    hmmfile_out: String,

    /// Input alignment file, or a galosh profile
    msafile: String,

    /// Assert that the alignment is protein
    #[clap(long, action, conflicts_with_all = ["dna", "rna"])]
    amino: bool,

    /// Assert that the alignment is DNA
    #[clap(long, action, conflicts_with = "rna")]
    dna: bool,

    /// Assert that the alignment is RNA
    #[clap(long, action)]
    rna: bool,

    /// Assert the input alignment format instead of guessing it
    #[clap(long, value_parser)]
    informat: Option<String>,

    /// Save the annotated, possibly modified alignment to this file, as aligned FASTA
    #[clap(short = 'O', value_parser)]
    post_msa: Option<String>,

    /// Assign consensus columns from the reference annotation instead of residue fraction
    #[clap(long, action)]
    hand: bool,

    /// Residue fraction at which a column is consensus
    #[clap(long, value_parser, default_value_t = 0.5)]
    symfrac: f64,

    /// Span fraction below which a sequence is a fragment
    #[clap(long, value_parser, default_value_t = 0.5)]
    fragthresh: f64,

    /// Relative sequence weighting
    #[clap(long, value_enum, default_value_t = Weighting::Pb)]
    weighting: Weighting,

    /// Identity cutoff for BLOSUM weights
    #[clap(long, value_parser, default_value_t = 0.62)]
    wid: f64,

    /// Effective sequence number strategy
    #[clap(long, value_enum, default_value_t = Effn::Entropy, conflicts_with = "eset")]
    effn: Effn,

    /// Set the effective sequence number directly
    #[clap(long, value_parser)]
    eset: Option<f64>,

    /// Minimum relative entropy per position, in bits
    #[clap(long, value_parser)]
    ere: Option<f64>,

    /// Relative entropy target for the whole model, in bits
    #[clap(long, value_parser, default_value_t = 45.0)]
    esigma: f64,

    /// Identity cutoff for cluster counting
    #[clap(long, value_parser, default_value_t = 0.62)]
    eid: f64,

    /// Estimate parameters from counts alone
    #[clap(long, action, conflicts_with = "laplace")]
    noprior: bool,

    /// Use a Laplace +1 prior
    #[clap(long, action)]
    laplace: bool,

    /// Set the random number seed (if 0: one-time arbitrary seed)
    #[clap(long, value_parser, default_value_t = 42)]
    seed: u64,

    /// Print progress (-v) or debugging detail (-vv) to standard error
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn config(&self) -> BuilderConfig {
        BuilderConfig {
            arch: if self.hand { ArchStrategy::Hand } else { ArchStrategy::Fast },
            symfrac: self.symfrac,
            fragthresh: self.fragthresh,
            weighting: self.weighting.into(),
            wid: self.wid,
            effn: match (self.eset, self.effn) {
                (Some(eset), _) => EffnStrategy::Set(eset),
                (None, Effn::Entropy) => EffnStrategy::Entropy,
                (None, Effn::Clust) => EffnStrategy::Clust,
                (None, Effn::None) => EffnStrategy::None,
            },
            esigma: self.esigma,
            eid: self.eid,
            re_target: self.ere,
            seed: self.seed,
            prior: if self.laplace { PriorChoice::Laplace } else { PriorChoice::Standard },
            use_priors: !self.noprior,
            ..BuilderConfig::default()
        }
    }

    fn asserted_alphabet(&self) -> Option<Alphabet> {
        if self.amino {
            Some(Alphabet::Amino)
        } else if self.dna {
            Some(Alphabet::Dna)
        } else if self.rna {
            Some(Alphabet::Rna)
        } else {
            None
        }
    }
}

/// The alphabet for a record: asserted on the command line, taken from its
/// galosh profile, or guessed from its residues.
fn record_alphabet(args: &Args, record: &MsaRecord) -> ProfillicResult<Alphabet> {
    if let Some(alphabet) = args.asserted_alphabet() {
        return Ok(alphabet);
    }
    if let Some(profile) = &record.profile {
        return Ok(profile.alphabet());
    }
    Alphabet::guess(record.msa.aseqs.iter().map(Vec::as_slice)).ok_or_else(|| {
        ProfillicError::InvalidInput(format!(
            "Failed to determine alphabet of alignment file {}; assert it with --amino, --dna, or --rna",
            args.msafile
        ))
    })
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    let command = std::env::args().collect::<Vec<_>>().join(" ");

    let format = args.informat.as_deref().map(MsaFormat::from);
    if format == Some(MsaFormat::Unknown) {
        Err::<(), _>(ProfillicError::InvalidInput(format!(
            "{} is not a recognized input alignment format",
            args.informat.as_deref().unwrap_or_default()
        )))
        .unwrap_or_fail();
    }

    let reader = MsaReader::from_filename(&args.msafile, format)
        .unwrap_or_die(&format!("Alignment file {} open failed", args.msafile));
    let mut out = File::create(&args.hmmfile_out)
        .map(BufWriter::new)
        .unwrap_or_die(&format!("Failed to open HMM file {} for writing", args.hmmfile_out));
    let mut post_out = args.post_msa.as_ref().map(|path| {
        File::create(path)
            .map(BufWriter::new)
            .unwrap_or_die(&format!("Failed to open alignment file {path} for writing"))
    });

    println!("# input alignment file:             {}", args.msafile);
    println!("# output HMM file:                  {}", args.hmmfile_out);
    if let Some(path) = &args.post_msa {
        println!("# processed alignment resaved to:   {path}");
    }
    if args.seed == 0 {
        println!("# random number seed:               one-time arbitrary");
    }

    let stem = Path::new(&args.msafile)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned());
    let config = args.config();
    // Built on the first alignment, once its alphabet is known.
    let mut builder: Option<(Builder, Background)> = None;

    println!("#\n{}", ModelSummary::HEADER);
    for (i, record) in reader.enumerate() {
        let record = record.unwrap_or_die(&format!("Alignment file {} parse failed", args.msafile));
        let alphabet = record_alphabet(&args, &record).unwrap_or_fail();
        let MsaRecord { mut msa, profile } = record;

        if msa.name.is_none() && i == 0 {
            msa.name.clone_from(&stem);
        }

        let (builder, bg) = builder.get_or_insert_with(|| {
            let mut builder = Builder::new(config, alphabet);
            if args.post_msa.is_some() {
                builder = builder.with_post_alignment(ConsensusMarkup);
            }
            (builder, Background::new(alphabet))
        });
        if builder.alphabet() != alphabet {
            Err::<(), _>(ProfillicError::InvalidInput(format!(
                "Alignment file {} contains different alphabets ({} and {alphabet})",
                args.msafile,
                builder.alphabet()
            )))
            .unwrap_or_fail();
        }

        let output = builder
            .build(&mut msa, profile.as_ref(), bg)
            .unwrap_or_die("Error in HMM construction");
        let mut hmm = output.hmm;
        hmm.append_comlog(&command);
        hmm.validate(1e-4).unwrap_or_die("The built model is not valid");
        hmm.write_to(&mut out).unwrap_or_die("HMM save failed");

        if let (Some(post_out), Some(post_msa)) = (post_out.as_mut(), output.post_msa) {
            post_msa
                .write_afa(post_out)
                .unwrap_or_die("Processed alignment save failed");
        }

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
    if let Some(mut post_out) = post_out {
        post_out.flush().unwrap_or_die("Processed alignment save failed");
    }
}
