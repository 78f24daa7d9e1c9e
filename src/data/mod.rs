//! ## Alphabets, background frequencies, and multiple sequence alignments.
//!
//! Residues are kept as the raw bytes read from alignment files; an
//! [`Alphabet`] digitizes them on demand. Canonical orders follow HMMER:
//! `ACDEFGHIKLMNPQRSTVWY` for amino acids, `ACGT` for DNA and `ACGU` for RNA.
//! Gaps are any of `-`, `.`, or `_`, and `~` marks missing data at the ends of
//! fragment sequences.

mod alphabet;
/// Exit codes, graceful failure, and logging setup for binaries.
pub mod err;
/// Multiple sequence alignments and their readers.
pub mod msa;
pub(crate) mod records;

pub use alphabet::*;
