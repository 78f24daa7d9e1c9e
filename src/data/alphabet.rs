use std::fmt;

/// Marks a byte that is not a canonical residue in a digitization table.
const NOT_CANONICAL: u8 = u8::MAX;

/// Builds a 256-entry lookup from byte to canonical index, ignoring case.
#[allow(clippy::cast_possible_truncation)]
const fn build_index(symbols: &[u8]) -> [u8; 256] {
    let mut table = [NOT_CANONICAL; 256];
    let mut i = 0;
    while i < symbols.len() {
        table[symbols[i].to_ascii_uppercase() as usize] = i as u8;
        table[symbols[i].to_ascii_lowercase() as usize] = i as u8;
        i += 1;
    }
    table
}

const AMINO_SYMBOLS: &[u8; 20] = b"ACDEFGHIKLMNPQRSTVWY";
const DNA_SYMBOLS: &[u8; 4] = b"ACGT";
const RNA_SYMBOLS: &[u8; 4] = b"ACGU";

static AMINO_INDEX: [u8; 256] = build_index(AMINO_SYMBOLS);
static DNA_INDEX: [u8; 256] = build_index(DNA_SYMBOLS);
static RNA_INDEX: [u8; 256] = build_index(RNA_SYMBOLS);

/// Amino acid background frequencies, in canonical order.
pub const AMINO_BACKGROUND: [f64; 20] = [
    0.0787945, 0.0151600, 0.0535222, 0.0668298, 0.0397062, 0.0695071, 0.0229198, 0.0590092, 0.0594422, 0.0963728,
    0.0237718, 0.0414386, 0.0482904, 0.0395639, 0.0540978, 0.0683364, 0.0540687, 0.0673417, 0.0114135, 0.0304133,
];

/// Default relative entropy target per match position, in bits.
pub const ETARGET_AMINO: f64 = 0.59;
/// Default relative entropy target per match position for nucleic acids.
pub const ETARGET_DNA: f64 = 0.62;
/// Default relative entropy target for other alphabets.
pub const ETARGET_OTHER: f64 = 1.0;

/// The residue alphabets supported for alignments and models.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Alphabet {
    Amino,
    Dna,
    Rna,
}

/// The digitized meaning of an aligned byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// A canonical residue, by index into [`Alphabet::symbols`]
    Residue(usize),
    /// A letter that is not canonical, such as `N` or `X`
    Degenerate,
    /// A gap: `-`, `.`, or `_`
    Gap,
    /// Missing data, `~`
    Missing,
    /// Anything else
    Invalid,
}

impl Symbol {
    /// Whether the symbol consumes a residue of the underlying sequence.
    #[inline]
    #[must_use]
    pub fn is_residue(self) -> bool {
        matches!(self, Symbol::Residue(_) | Symbol::Degenerate)
    }
}

/// Whether `b` is one of the gap characters.
#[inline]
#[must_use]
pub fn is_gap(b: u8) -> bool {
    matches!(b, b'-' | b'.' | b'_')
}

/// Whether `b` is the missing data character.
#[inline]
#[must_use]
pub fn is_missing(b: u8) -> bool {
    b == b'~'
}

impl Alphabet {
    /// The canonical residues, in model order.
    #[inline]
    #[must_use]
    pub const fn symbols(self) -> &'static [u8] {
        match self {
            Alphabet::Amino => AMINO_SYMBOLS,
            Alphabet::Dna => DNA_SYMBOLS,
            Alphabet::Rna => RNA_SYMBOLS,
        }
    }

    /// The number of canonical residues, `K`.
    #[inline]
    #[must_use]
    pub const fn size(self) -> usize {
        self.symbols().len()
    }

    /// The name used in model files.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Alphabet::Amino => "amino",
            Alphabet::Dna => "DNA",
            Alphabet::Rna => "RNA",
        }
    }

    /// Looks up an alphabet by name, ignoring case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "amino" | "protein" => Some(Alphabet::Amino),
            "dna" => Some(Alphabet::Dna),
            "rna" => Some(Alphabet::Rna),
            _ => None,
        }
    }

    /// The default per-position relative entropy target for entropy
    /// weighting.
    #[inline]
    #[must_use]
    pub const fn default_re_target(self) -> f64 {
        match self {
            Alphabet::Amino => ETARGET_AMINO,
            Alphabet::Dna | Alphabet::Rna => ETARGET_DNA,
        }
    }

    /// Digitizes an aligned byte.
    #[inline]
    #[must_use]
    pub fn digitize(self, b: u8) -> Symbol {
        let table = match self {
            Alphabet::Amino => &AMINO_INDEX,
            Alphabet::Dna => &DNA_INDEX,
            Alphabet::Rna => &RNA_INDEX,
        };
        match table[b as usize] {
            NOT_CANONICAL if is_gap(b) => Symbol::Gap,
            NOT_CANONICAL if is_missing(b) => Symbol::Missing,
            NOT_CANONICAL if b.is_ascii_alphabetic() || b == b'*' => Symbol::Degenerate,
            NOT_CANONICAL => Symbol::Invalid,
            i => Symbol::Residue(i as usize),
        }
    }

    /// Index of a canonical residue symbol, ignoring case.
    #[inline]
    #[must_use]
    pub fn index_of(self, b: u8) -> Option<usize> {
        match self.digitize(b) {
            Symbol::Residue(i) => Some(i),
            _ => None,
        }
    }

    /// Guesses the alphabet of a set of aligned sequences from their residue
    /// composition. Returns `None` when no residues are present.
    ///
    /// Sequences made only of nucleotide codes, at least 90% of which are
    /// `ACGTUN`, are nucleic. They are RNA if `U` appears without `T`.
    #[must_use]
    pub fn guess<'a>(seqs: impl IntoIterator<Item = &'a [u8]>) -> Option<Self> {
        let mut counts = [0usize; 256];
        for seq in seqs {
            for &b in seq {
                counts[b.to_ascii_uppercase() as usize] += 1;
            }
        }

        let letters: usize = (b'A'..=b'Z').map(|b| counts[b as usize]).sum();
        if letters == 0 {
            return None;
        }

        let strict: usize = b"ACGTUN".iter().map(|&b| counts[b as usize]).sum();
        let iupac: usize = b"ACGTUNRYMKSWHBVD".iter().map(|&b| counts[b as usize]).sum();

        if iupac == letters && strict * 10 >= letters * 9 {
            if counts[b'U' as usize] > 0 && counts[b'T' as usize] == 0 {
                Some(Alphabet::Rna)
            } else {
                Some(Alphabet::Dna)
            }
        } else {
            Some(Alphabet::Amino)
        }
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Null model residue frequencies.
#[derive(Clone, Debug, PartialEq)]
pub struct Background {
    pub alphabet: Alphabet,
    pub freqs:    Vec<f64>,
}

impl Background {
    /// The standard background for `alphabet`: HMMER's amino acid
    /// frequencies, or uniform for nucleic acids.
    #[must_use]
    pub fn new(alphabet: Alphabet) -> Self {
        let freqs = match alphabet {
            Alphabet::Amino => AMINO_BACKGROUND.to_vec(),
            Alphabet::Dna | Alphabet::Rna => vec![0.25; 4],
        };
        Background { alphabet, freqs }
    }
}
