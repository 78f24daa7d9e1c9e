use super::Msa;
use crate::{
    ProfillicError, ProfillicResult,
    data::records::{LineSource, next_token},
};
use std::io::{Read, Write};

/// Residues per line when writing.
const AFA_LINE_WIDTH: usize = 60;

fn length_mismatch(seqno: usize, len: usize, expected: usize) -> String {
    format!(
        "sequence {seqno} length ({len}) is not equal to the expected length ({expected}) (the length of first seq in file)"
    )
}

/// Reads an aligned FASTA file: the whole stream is one record. Returns
/// `Ok(None)` if it holds no sequences.
pub(crate) fn read_afa<R: Read>(src: &mut LineSource<R>) -> ProfillicResult<Option<Msa>> {
    let mut msa = Msa::new();

    while let Some(line) = src.next_line()? {
        let s = line.trim_start_matches([' ', '\t']);
        if s.trim().is_empty() {
            continue;
        }

        if let Some(header) = s.strip_prefix('>') {
            let seqidx = msa.nseq();
            let Some((name, desc)) = next_token(header) else {
                return Err(ProfillicError::format(format!(
                    "AFA MSA parse error, problem reading name of sequence {} at line {}",
                    seqidx + 1,
                    src.line_number()
                )));
            };

            let idx = msa.add_sequence(name.to_string());
            let desc = desc.trim();
            if !desc.is_empty() {
                msa.seq_descriptions[idx] = Some(desc.to_string());
            }

            if seqidx > 1 && msa.aseqs[seqidx - 1].len() != msa.aseqs[0].len() {
                return Err(ProfillicError::format(length_mismatch(
                    seqidx,
                    msa.aseqs[seqidx - 1].len(),
                    msa.aseqs[0].len(),
                )));
            }
        } else {
            let Some(aseq) = msa.aseqs.last_mut() else {
                return Err(ProfillicError::format(format!(
                    "AFA MSA parse error, first non-whitespace character is not a '>' at line {}",
                    src.line_number()
                )));
            };
            for tok in s.split_ascii_whitespace() {
                aseq.extend_from_slice(tok.as_bytes());
            }
        }
    }

    let nseq = msa.nseq();
    if nseq == 0 {
        return Ok(None);
    }
    if nseq > 1 && msa.aseqs[nseq - 1].len() != msa.aseqs[0].len() {
        return Err(ProfillicError::invalid(length_mismatch(
            nseq,
            msa.aseqs[nseq - 1].len(),
            msa.aseqs[0].len(),
        )));
    }

    msa.verify()?;
    log::debug!("Read AFA alignment with {} sequences of length {}", msa.nseq(), msa.alen);
    Ok(Some(msa))
}

impl Msa {
    /// Writes the alignment as aligned FASTA, wrapping sequences at 60
    /// columns. Descriptions follow the name on the header line.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_afa<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        for (idx, (name, aseq)) in self.seq_names.iter().zip(&self.aseqs).enumerate() {
            match self.seq_descriptions.get(idx).and_then(Option::as_deref) {
                Some(desc) => writeln!(w, ">{name} {desc}")?,
                None => writeln!(w, ">{name}")?,
            }
            for chunk in aseq.chunks(AFA_LINE_WIDTH) {
                w.write_all(chunk)?;
                w.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}
