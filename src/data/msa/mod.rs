//! Multiple sequence alignments and their readers.
//!
//! An [`Msa`] is built incrementally by one of the format parsers (Stockholm,
//! SELEX, aligned FASTA, or a galosh profile) and then finalized by
//! [`Msa::verify`], which locks in the aligned length and fills default
//! weights. [`MsaReader`] ties a byte stream to a format and yields one
//! alignment per call.

use crate::{ProfillicError, ProfillicResult, data::alphabet::is_missing};
use std::collections::HashMap;

mod afa;
mod cluster;
mod format;
mod profillic;
mod reader;
mod selex;
mod stockholm;
mod weights;

pub use cluster::*;
pub use format::*;
pub use profillic::{PROFILE_CONSENSUS_NAME, PROFILE_MSA_NAME};
pub use reader::*;
pub use weights::*;

/// Marks a weight that has not been assigned by the parser.
pub(crate) const UNSET_WEIGHT: f64 = -1.0;

/// Score cutoffs in bits. Each pair is (per-sequence, per-domain); either half
/// may be absent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Cutoffs {
    pub ga: [Option<f64>; 2],
    pub tc: [Option<f64>; 2],
    pub nc: [Option<f64>; 2],
}

impl Cutoffs {
    /// Returns both halves of a cutoff pair, only if both are set.
    #[inline]
    #[must_use]
    pub fn pair(cut: [Option<f64>; 2]) -> Option<[f64; 2]> {
        match cut {
            [Some(a), Some(b)] => Some([a, b]),
            _ => None,
        }
    }
}

/// A per-sequence tag, such as `#=GS <name> <tag> <text>`.
#[derive(Clone, Debug, PartialEq)]
pub struct SeqTag {
    pub tag:    String,
    pub seqidx: usize,
    pub text:   String,
}

/// A multiple sequence alignment in text mode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Msa {
    pub name:        Option<String>,
    pub accession:   Option<String>,
    pub description: Option<String>,
    pub author:      Option<String>,

    pub seq_names:        Vec<String>,
    pub aseqs:            Vec<Vec<u8>>,
    pub seq_accessions:   Vec<Option<String>>,
    pub seq_descriptions: Vec<Option<String>>,
    pub weights:          Vec<f64>,
    pub has_weights:      bool,

    /// Per-sequence secondary structure, allocated when the first such line
    /// is seen
    pub ss: Option<Vec<Option<Vec<u8>>>>,
    /// Per-sequence surface accessibility
    pub sa: Option<Vec<Option<Vec<u8>>>>,
    /// Per-sequence posterior probability
    pub pp: Option<Vec<Option<Vec<u8>>>>,

    pub ss_cons: Option<Vec<u8>>,
    pub sa_cons: Option<Vec<u8>>,
    pub pp_cons: Option<Vec<u8>>,
    pub rf:      Option<Vec<u8>>,

    pub cutoffs:  Cutoffs,
    pub comments: Vec<String>,
    pub gf:       Vec<(String, String)>,
    pub gs:       Vec<SeqTag>,
    pub gc:       Vec<(String, Vec<u8>)>,
    pub gr:       Vec<(String, usize, Vec<u8>)>,

    /// The aligned length, valid once [`Msa::verify`] has succeeded
    pub alen: usize,

    last_idx: Option<usize>,
    index:    HashMap<String, usize>,
}

impl Msa {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and verifies an alignment from named aligned sequences.
    ///
    /// # Errors
    ///
    /// Fails if there are no sequences or the lengths differ.
    pub fn from_sequences<N, S>(sequences: impl IntoIterator<Item = (N, S)>) -> ProfillicResult<Self>
    where
        N: Into<String>,
        S: Into<Vec<u8>>, {
        let mut msa = Msa::new();
        for (name, seq) in sequences {
            let idx = msa.add_sequence(name.into());
            msa.aseqs[idx] = seq.into();
        }
        msa.verify()?;
        Ok(msa)
    }

    /// The number of sequences.
    #[inline]
    #[must_use]
    pub fn nseq(&self) -> usize {
        self.seq_names.len()
    }

    #[inline]
    pub(crate) fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Appends a new, empty sequence and returns its index.
    pub fn add_sequence(&mut self, name: String) -> usize {
        let idx = self.seq_names.len();
        self.index.insert(name.clone(), idx);
        self.seq_names.push(name);
        self.aseqs.push(Vec::new());
        self.seq_accessions.push(None);
        self.seq_descriptions.push(None);
        self.weights.push(UNSET_WEIGHT);
        for track in [&mut self.ss, &mut self.sa, &mut self.pp].into_iter().flatten() {
            track.push(None);
        }
        idx
    }

    /// Resolves a sequence name to its index, trying `guess` before a full
    /// lookup. Unknown names are appended.
    pub(crate) fn get_seqidx(&mut self, name: &str, guess: Option<usize>) -> usize {
        if let Some(g) = guess
            && self.seq_names.get(g).is_some_and(|n| n == name)
        {
            return g;
        }
        match self.index.get(name) {
            Some(&idx) => idx,
            None => self.add_sequence(name.to_string()),
        }
    }

    /// The index most recently touched by a line parser.
    #[inline]
    pub(crate) fn last_idx(&self) -> Option<usize> {
        self.last_idx
    }

    #[inline]
    pub(crate) fn set_last_idx(&mut self, idx: usize) {
        self.last_idx = Some(idx);
    }

    /// The index following the last one touched, used as a lookup guess for
    /// lines that usually come in sequence order.
    #[inline]
    pub(crate) fn next_idx_guess(&self) -> Option<usize> {
        Some(self.last_idx.map_or(0, |i| i + 1))
    }

    /// Adds an unparsed file-level tag. Repeated tags are joined with a space.
    pub fn add_gf(&mut self, tag: &str, text: &str) {
        if let Some((_, existing)) = self.gf.iter_mut().find(|(t, _)| t == tag) {
            existing.push(' ');
            existing.push_str(text);
        } else {
            self.gf.push((tag.to_string(), text.to_string()));
        }
    }

    /// Adds an unparsed per-sequence tag. Repeated tags for a sequence are
    /// joined with a newline.
    pub fn add_gs(&mut self, tag: &str, seqidx: usize, text: &str) {
        if let Some(existing) = self.gs.iter_mut().find(|g| g.tag == tag && g.seqidx == seqidx) {
            existing.text.push('\n');
            existing.text.push_str(text);
        } else {
            self.gs.push(SeqTag {
                tag: tag.to_string(),
                seqidx,
                text: text.to_string(),
            });
        }
    }

    /// Appends column annotation to an unparsed per-column tag.
    pub fn append_gc(&mut self, tag: &str, text: &[u8]) {
        if let Some((_, existing)) = self.gc.iter_mut().find(|(t, _)| t == tag) {
            existing.extend_from_slice(text);
        } else {
            self.gc.push((tag.to_string(), text.to_vec()));
        }
    }

    /// Appends column annotation to an unparsed per-sequence, per-column tag.
    pub fn append_gr(&mut self, tag: &str, seqidx: usize, text: &[u8]) {
        if let Some((_, _, existing)) = self.gr.iter_mut().find(|(t, i, _)| t == tag && *i == seqidx) {
            existing.extend_from_slice(text);
        } else {
            self.gr.push((tag.to_string(), seqidx, text.to_vec()));
        }
    }

    /// Checks that a freshly parsed alignment is consistent and finalizes
    /// it: sets [`alen`](Msa::alen) from the first sequence and, if no
    /// weights were given, sets every weight to 1.
    ///
    /// # Errors
    ///
    /// Fails with a format error if there are no sequences, if only some
    /// sequences have weights, or if any sequence or annotation track differs
    /// in length from the first sequence.
    pub fn verify(&mut self) -> ProfillicResult<()> {
        if self.nseq() == 0 {
            return Err(ProfillicError::format("parse error: no alignment data found"));
        }

        let name = self.display_name();
        let alen = self.aseqs[0].len();

        for (idx, seqname) in self.seq_names.iter().enumerate() {
            if self.has_weights && self.weights[idx] == UNSET_WEIGHT {
                return Err(ProfillicError::format(format!(
                    "MSA {name} parse error: expected a weight for seq {seqname}"
                )));
            }

            let len = self.aseqs[idx].len();
            if len != alen {
                return Err(ProfillicError::format(format!(
                    "MSA {name} parse error: sequence {seqname}: length {len}, expected {alen}"
                )));
            }

            for (label, track) in [("SS", &self.ss), ("SA", &self.sa), ("PP", &self.pp)] {
                if let Some(Some(markup)) = track.as_ref().map(|t| &t[idx])
                    && markup.len() != alen
                {
                    return Err(ProfillicError::format(format!(
                        "MSA {name} parse error: GR {label} for {seqname}: length {len}, expected {alen}",
                        len = markup.len()
                    )));
                }
            }
        }

        for (label, track) in [
            ("SS_cons", &self.ss_cons),
            ("SA_cons", &self.sa_cons),
            ("PP_cons", &self.pp_cons),
            ("RF", &self.rf),
        ] {
            if let Some(markup) = track
                && markup.len() != alen
            {
                return Err(ProfillicError::format(format!(
                    "MSA {name} parse error: GC {label} markup: len {len}, expected {alen}",
                    len = markup.len()
                )));
            }
        }

        self.alen = alen;
        if !self.has_weights {
            self.weights.fill(1.0);
        }
        Ok(())
    }

    /// A 32-bit checksum over the aligned residues, using Jenkins'
    /// one-at-a-time hash.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        let mut val: u32 = 0;
        for &b in self.aseqs.iter().flatten() {
            val = val.wrapping_add(u32::from(b));
            val = val.wrapping_add(val << 10);
            val ^= val >> 6;
        }
        val = val.wrapping_add(val << 3);
        val ^= val >> 11;
        val.wrapping_add(val << 15)
    }

    /// Checks that missing data (`~`) only appears as a leading and a
    /// trailing run in each sequence.
    ///
    /// # Errors
    ///
    /// Fails naming the first sequence with interior missing data.
    pub fn validate_missing_data(&self) -> ProfillicResult<()> {
        for (seqname, aseq) in self.seq_names.iter().zip(&self.aseqs) {
            let interior = aseq
                .iter()
                .skip_while(|&&b| is_missing(b))
                .skip_while(|&&b| !is_missing(b))
                .skip_while(|&&b| is_missing(b))
                .next()
                .is_some();
            if interior {
                return Err(ProfillicError::invalid(format!(
                    "msa {name}; sequence {seqname}\nhas missing data chars (~) other than at fragment edges",
                    name = self.display_name()
                )));
            }
        }
        Ok(())
    }

    /// Marks fragments: any sequence whose aligned span, from its first to
    /// its last residue column, covers less than `fragthresh` of the
    /// alignment has its leading and trailing gaps rewritten as missing data.
    /// Returns the number of sequences marked.
    pub fn mark_fragments(&mut self, fragthresh: f64) -> usize {
        let is_residue = |b: &u8| b.is_ascii_alphabetic() || *b == b'*';
        #[allow(clippy::cast_precision_loss)]
        let min_span: f64 = fragthresh * self.alen as f64;
        let mut marked = 0;

        for aseq in &mut self.aseqs {
            let lpos = aseq.iter().position(is_residue);
            let rpos = aseq.iter().rposition(is_residue);
            #[allow(clippy::cast_precision_loss)]
            let span = match (lpos, rpos) {
                (Some(l), Some(r)) => (r - l + 1) as f64,
                _ => 0.0,
            };

            if span < min_span {
                let lpos = lpos.unwrap_or(aseq.len());
                let rpos = rpos.map_or(aseq.len(), |r| r + 1);
                aseq[..lpos].fill(b'~');
                aseq[rpos..].fill(b'~');
                marked += 1;
            }
        }
        marked
    }

    /// The residues of sequence `idx` with gaps and missing data removed.
    #[must_use]
    pub fn unaligned(&self, idx: usize) -> Vec<u8> {
        self.aseqs[idx]
            .iter()
            .copied()
            .filter(|b| b.is_ascii_alphabetic() || *b == b'*')
            .collect()
    }
}

#[cfg(test)]
mod test;
