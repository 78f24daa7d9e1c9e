#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::wildcard_imports,
    clippy::enum_glob_use
)]

/// Model construction from alignments or profiles.
pub mod build;
/// Conversion between galosh profiles and Plan7 HMMs.
pub mod convert;
/// Alphabets, alignments, and their file formats.
pub mod data;
/// Plan7 profile HMMs and their `HMMER3/f` file format.
pub mod hmm;
/// Numeric helpers for probability vectors.
pub mod math;
/// Galosh profiles.
pub mod profile;
/// Whole-model transition edits (unification and hybridization).
pub mod transitions;

mod errors;
pub use errors::*;

/// Common structures and traits re-exported
pub mod prelude {
    pub use crate::build::{Builder, BuilderConfig};
    pub use crate::convert::{hmm_to_profile, profile_to_hmm};
    pub use crate::data::{
        Alphabet, Background,
        err::{GetCode, OrFail},
        msa::{Msa, MsaFormat, MsaReader},
    };
    pub use crate::hmm::{HmmReader, Plan7Hmm};
    pub use crate::profile::{Amino, Dna, Profile, ProfileModel};
    pub use crate::transitions::{hybridize, unify};
    pub use crate::{ProfillicError, ProfillicResult};
}
