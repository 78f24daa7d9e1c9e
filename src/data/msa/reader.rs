use super::{Msa, MsaFormat, afa, profillic, selex, stockholm};
use crate::{
    ProfillicError, ProfillicResult,
    data::records::{LineSource, RecordReader, is_blank},
    profile::AnyProfile,
};
use std::{fs::File, io::Read, path::Path};

/// One alignment read from a stream. Alignments synthesized from a galosh
/// profile carry that profile too.
#[derive(Clone, Debug, PartialEq)]
pub struct MsaRecord {
    pub msa:     Msa,
    pub profile: Option<AnyProfile>,
}

/// Reads alignments from a byte stream in a fixed format.
pub struct MsaReader<R: Read> {
    source:    LineSource<R>,
    format:    MsaFormat,
    exhausted: bool,
}

impl<R: Read> RecordReader for MsaReader<R> {
    const RECORD_NAME: &str = "alignment file";
}

impl<R: Read> MsaReader<R> {
    /// Wraps a stream. When `format` is `None` or
    /// [`Unknown`](MsaFormat::Unknown), the format is guessed from the first
    /// non-blank line.
    ///
    /// # Errors
    ///
    /// Returns any I/O error hit while peeking at the stream.
    pub fn new(inner: R, format: Option<MsaFormat>) -> ProfillicResult<Self> {
        let mut reader = MsaReader {
            source:    LineSource::new(inner),
            format:    format.unwrap_or(MsaFormat::Unknown),
            exhausted: false,
        };
        if reader.format == MsaFormat::Unknown {
            reader.guess_format()?;
        }
        Ok(reader)
    }

    fn guess_format(&mut self) -> ProfillicResult<()> {
        while let Some(line) = self.source.next_line()? {
            if is_blank(&line) {
                continue;
            }
            self.format = MsaFormat::guess(&line);
            self.source.push_back(line);
            log::debug!("Guessed alignment format: {}", self.format);
            return Ok(());
        }
        self.exhausted = true;
        Ok(())
    }

    /// The format this reader parses.
    #[inline]
    #[must_use]
    pub fn format(&self) -> MsaFormat {
        self.format
    }

    /// Reads the next alignment, or `Ok(None)` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Fails with the parser's error for malformed input, or with
    /// [`NotImplemented`](ProfillicError::NotImplemented) for formats
    /// without a reader.
    pub fn read(&mut self) -> ProfillicResult<Option<MsaRecord>> {
        if self.exhausted {
            return Ok(None);
        }

        let record = match self.format {
            MsaFormat::Stockholm | MsaFormat::Pfam => stockholm::read_stockholm(&mut self.source)?.map(Self::plain),
            MsaFormat::A2m => {
                return Err(ProfillicError::NotImplemented(
                    "A2M format input parser not implemented yet.",
                ));
            }
            MsaFormat::Psiblast => {
                return Err(ProfillicError::NotImplemented(
                    "PSIBLAST format input parser not implemented yet.",
                ));
            }
            MsaFormat::Selex => selex::read_selex(&mut self.source)?.map(Self::plain),
            MsaFormat::Afa => afa::read_afa(&mut self.source)?.map(Self::plain),
            MsaFormat::Profillic => profillic::read_profillic(&mut self.source)?.map(|(msa, profile)| MsaRecord {
                msa,
                profile: Some(profile),
            }),
            MsaFormat::Unknown => return Err(ProfillicError::Internal("no such format".to_string())),
        };

        if record.is_none() || self.format.is_single_record() {
            self.exhausted = true;
        }
        Ok(record)
    }

    fn plain(msa: Msa) -> MsaRecord {
        MsaRecord { msa, profile: None }
    }
}

impl MsaReader<File> {
    /// Opens an alignment file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or is empty.
    pub fn from_filename<P: AsRef<Path>>(path: P, format: Option<MsaFormat>) -> ProfillicResult<Self> {
        let file = Self::open_nonempty_file(path)?;
        MsaReader::new(file, format)
    }
}

impl<R: Read> Iterator for MsaReader<R> {
    type Item = ProfillicResult<MsaRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.read().transpose();
        if matches!(out, Some(Err(_))) {
            self.exhausted = true;
        }
        out
    }
}
