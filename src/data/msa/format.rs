use std::fmt;

/// Alignment file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MsaFormat {
    Stockholm,
    /// Single-block Stockholm; parsed identically
    Pfam,
    A2m,
    Psiblast,
    Selex,
    Afa,
    /// A galosh profile read as a one-sequence consensus alignment
    Profillic,
    Unknown,
}

impl From<&str> for MsaFormat {
    /// Matches a format name case-insensitively. Unrecognized names map to
    /// [`MsaFormat::Unknown`].
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "stockholm" => MsaFormat::Stockholm,
            "pfam" => MsaFormat::Pfam,
            "a2m" => MsaFormat::A2m,
            "psiblast" => MsaFormat::Psiblast,
            "selex" => MsaFormat::Selex,
            "afa" => MsaFormat::Afa,
            "profillic" => MsaFormat::Profillic,
            _ => MsaFormat::Unknown,
        }
    }
}

impl MsaFormat {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MsaFormat::Stockholm => "stockholm",
            MsaFormat::Pfam => "pfam",
            MsaFormat::A2m => "a2m",
            MsaFormat::Psiblast => "psiblast",
            MsaFormat::Selex => "selex",
            MsaFormat::Afa => "afa",
            MsaFormat::Profillic => "profillic",
            MsaFormat::Unknown => "unknown",
        }
    }

    /// Formats that hold at most one alignment per stream.
    #[inline]
    #[must_use]
    pub fn is_single_record(self) -> bool {
        matches!(self, MsaFormat::Selex | MsaFormat::Afa | MsaFormat::Profillic)
    }

    /// Guesses a format from the first non-blank line of a stream.
    #[must_use]
    pub fn guess(first_line: &str) -> Self {
        let line = first_line.trim_start();
        if line.starts_with("# STOCKHOLM") {
            MsaFormat::Stockholm
        } else if line.starts_with('>') {
            MsaFormat::Afa
        } else if line.starts_with("PROFILE") {
            MsaFormat::Profillic
        } else {
            MsaFormat::Selex
        }
    }
}

impl fmt::Display for MsaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
