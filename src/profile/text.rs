use super::{AnyProfile, Amino, Dna, Profile, ProfileModel, Residue, Transitions};
use crate::{ProfillicError, ProfillicResult, data::Alphabet, math::ProbNumber};
use std::{
    fmt,
    io::{Read, Write},
};

/// The first line of a serialized profile.
pub const PROFILE_HEADER: &str = "PROFILE galosh 1";

fn parse_err(line: usize, msg: impl fmt::Display) -> ProfillicError {
    ProfillicError::format(format!("profile parse failed (line {line}): {msg}"))
}

fn write_values<T: fmt::Display>(f: &mut fmt::Formatter<'_>, key: &str, values: &[T]) -> fmt::Result {
    f.write_str(key)?;
    for v in values {
        write!(f, " {v}")?;
    }
    writeln!(f)
}

impl<R: Residue, T: ProbNumber> fmt::Display for Profile<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.transitions;
        writeln!(f, "{PROFILE_HEADER}")?;
        writeln!(f, "ALPHABET {}", R::ALPHABET.name())?;
        writeln!(f, "LENGTH {}", self.length())?;
        write_values(f, "FROM_PRE_ALIGN", &t.from_pre_align.values())?;
        write_values(f, "FROM_BEGIN", &t.from_begin.values())?;
        write_values(f, "FROM_MATCH", &t.from_match.values())?;
        write_values(f, "FROM_INSERTION", &t.from_insertion.values())?;
        write_values(f, "FROM_DELETION", &t.from_deletion.values())?;
        write_values(f, "FROM_POST_ALIGN", &t.from_post_align.values())?;
        write_values(f, "PREALIGN", &self.pre_align_insertion)?;
        write_values(f, "INSERTION", &self.insertion)?;
        write_values(f, "POSTALIGN", &self.post_align_insertion)?;
        for (pos, m) in self.matches.iter().enumerate() {
            write_values(f, &format!("MATCH {}", pos + 1), m)?;
        }
        writeln!(f, "//")
    }
}

fn parse_values<T: ProbNumber>(tokens: &[&str], expected: usize, line: usize) -> ProfillicResult<Vec<T>> {
    if tokens.len() != expected {
        return Err(parse_err(
            line,
            format_args!("expected {expected} values, saw {}", tokens.len()),
        ));
    }
    tokens
        .iter()
        .map(|tok| {
            tok.parse::<f64>()
                .map(T::from_f64)
                .map_err(|_| parse_err(line, format_args!("bad value '{tok}'")))
        })
        .collect()
}

impl<R: Residue, T: ProbNumber> Profile<R, T> {
    /// Parses a profile from its text form.
    ///
    /// # Errors
    ///
    /// Fails with a format error naming the offending line, or if the
    /// profile is for a different alphabet.
    pub fn from_text(text: &str) -> ProfillicResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, l)| (i + 1, l.trim()))
            .filter(|(_, l)| !l.is_empty());

        match lines.next() {
            Some((_, PROFILE_HEADER)) => {}
            Some((n, _)) => return Err(parse_err(n, "missing PROFILE header")),
            None => return Err(ProfillicError::format("profile parse failed: empty input")),
        }

        let mut profile: Option<Self> = None;
        let mut next_match = 0;
        let mut last_line = 0;
        let k = R::size();

        for (n, line) in lines {
            last_line = n;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let (key, rest) = (tokens[0], &tokens[1..]);

            if key == "//" {
                let Some(p) = profile else {
                    return Err(parse_err(n, "missing LENGTH line"));
                };
                if next_match != p.length() {
                    return Err(parse_err(
                        n,
                        format_args!("expected {} MATCH lines, saw {next_match}", p.length()),
                    ));
                }
                return Ok(p);
            }

            match key {
                "ALPHABET" => match rest.first().and_then(|a| Alphabet::from_name(a)) {
                    Some(a) if a == R::ALPHABET => {}
                    _ => {
                        return Err(parse_err(
                            n,
                            format_args!("expected alphabet {}", R::ALPHABET.name()),
                        ));
                    }
                },
                "LENGTH" => {
                    let length = rest
                        .first()
                        .and_then(|l| l.parse::<usize>().ok())
                        .ok_or_else(|| parse_err(n, "bad LENGTH line"))?;
                    profile = Some(Self::new(length));
                }
                _ => {
                    let Some(p) = profile.as_mut() else {
                        return Err(parse_err(n, format_args!("{key} before LENGTH")));
                    };
                    let t: &mut Transitions<T> = &mut p.transitions;
                    let set = |group: Option<()>| group.ok_or_else(|| parse_err(n, format_args!("bad {key} line")));
                    match key {
                        "FROM_PRE_ALIGN" => set(t.from_pre_align.set_values(&parse_values(rest, 2, n)?))?,
                        "FROM_BEGIN" => set(t.from_begin.set_values(&parse_values(rest, 2, n)?))?,
                        "FROM_MATCH" => set(t.from_match.set_values(&parse_values(rest, 3, n)?))?,
                        "FROM_INSERTION" => set(t.from_insertion.set_values(&parse_values(rest, 2, n)?))?,
                        "FROM_DELETION" => set(t.from_deletion.set_values(&parse_values(rest, 2, n)?))?,
                        "FROM_POST_ALIGN" => set(t.from_post_align.set_values(&parse_values(rest, 2, n)?))?,
                        "PREALIGN" => p.pre_align_insertion = parse_values(rest, k, n)?,
                        "INSERTION" => p.insertion = parse_values(rest, k, n)?,
                        "POSTALIGN" => p.post_align_insertion = parse_values(rest, k, n)?,
                        "MATCH" => {
                            let pos = rest.first().and_then(|s| s.parse::<usize>().ok());
                            if pos != Some(next_match + 1) || next_match >= p.length() {
                                return Err(parse_err(
                                    n,
                                    format_args!("expected MATCH {}", next_match + 1),
                                ));
                            }
                            p.matches[next_match] = parse_values(&rest[1..], k, n)?;
                            next_match += 1;
                        }
                        _ => return Err(parse_err(n, format_args!("unknown line type {key}"))),
                    }
                }
            }
        }

        Err(parse_err(last_line + 1, "didn't find // at end of profile"))
    }

    /// Reads the rest of a stream as one profile.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and as [`from_text`](Profile::from_text) does.
    pub fn read_from<Rd: Read>(mut reader: Rd) -> ProfillicResult<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_text(&text)
    }

    /// Writes the profile in its text form.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        write!(writer, "{self}")
    }
}

impl AnyProfile {
    /// Parses a profile whose residue type is given by its `ALPHABET` line.
    ///
    /// # Errors
    ///
    /// Fails if the alphabet is missing or unsupported, and as
    /// [`Profile::from_text`] does.
    pub fn from_text(text: &str) -> ProfillicResult<Self> {
        let alphabet = text
            .lines()
            .find_map(|l| l.trim().strip_prefix("ALPHABET"))
            .and_then(|a| Alphabet::from_name(a.trim()));

        match alphabet {
            Some(Alphabet::Dna) => Profile::<Dna, f64>::from_text(text).map(AnyProfile::Dna),
            Some(Alphabet::Amino) => Profile::<Amino, f64>::from_text(text).map(AnyProfile::Amino),
            Some(other) => Err(ProfillicError::invalid(format!(
                "profiles over the {other} alphabet are not supported"
            ))),
            None => Err(ProfillicError::format(
                "profile parse failed: missing or unknown ALPHABET line",
            )),
        }
    }

    /// Writes the profile in its text form.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            AnyProfile::Dna(p) => p.write_to(writer),
            AnyProfile::Amino(p) => p.write_to(writer),
        }
    }
}
