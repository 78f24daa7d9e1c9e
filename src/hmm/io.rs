use super::{EvalueParams, NTRANSITIONS, Plan7Hmm, TRANSITION_LABELS};
use crate::{
    ProfillicError, ProfillicResult,
    data::{
        Alphabet,
        records::{LineSource, RecordReader, is_blank, next_token},
    },
};
use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

/// The format tag written on the first line of every model.
pub const HMM_FORMAT_TAG: &str = "HMMER3/f";

/// Writes a probability as its negative natural log with five decimals, or
/// `*` for zero.
fn write_prob<W: Write>(w: &mut W, p: f64) -> std::io::Result<()> {
    if p > 0.0 {
        // Adding zero folds -0.0 into 0.0.
        write!(w, " {:>8.5}", -p.ln() + 0.0)
    } else {
        write!(w, " {:>8}", "*")
    }
}

fn write_probs<W: Write>(w: &mut W, label: &str, probs: &[f64]) -> std::io::Result<()> {
    write!(w, "{label:>7}")?;
    for &p in probs {
        write_prob(w, p)?;
    }
    Ok(())
}

fn annotation_char(line: Option<&Vec<u8>>, k: usize) -> char {
    line.and_then(|l| l.get(k)).map_or('-', |&c| char::from(c))
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

impl Plan7Hmm {
    /// Writes the model in the `HMMER3/f` text format.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the writer.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let mut buf = itoa::Buffer::new();

        writeln!(w, "{HMM_FORMAT_TAG} [profillic {}]", env!("CARGO_PKG_VERSION"))?;
        if let Some(name) = &self.name {
            writeln!(w, "NAME  {name}")?;
        }
        if let Some(acc) = &self.acc {
            writeln!(w, "ACC   {acc}")?;
        }
        if let Some(desc) = &self.desc {
            writeln!(w, "DESC  {desc}")?;
        }
        writeln!(w, "LENG  {}", buf.format(self.m))?;
        if let Some(maxl) = self.max_length {
            writeln!(w, "MAXL  {}", buf.format(maxl))?;
        }
        writeln!(w, "ALPH  {}", self.alphabet.name().to_ascii_lowercase())?;
        writeln!(w, "RF    {}", yes_no(self.rf.is_some()))?;
        writeln!(w, "MM    {}", yes_no(self.mm.is_some()))?;
        writeln!(w, "CONS  {}", yes_no(self.consensus.is_some()))?;
        writeln!(w, "CS    {}", yes_no(self.cs.is_some()))?;
        writeln!(w, "MAP   {}", yes_no(self.map.is_some()))?;
        if let Some(ctime) = &self.ctime {
            writeln!(w, "DATE  {ctime}")?;
        }
        if let Some(comlog) = &self.comlog {
            for (i, line) in comlog.lines().enumerate() {
                writeln!(w, "COM   [{}] {line}", buf.format(i + 1))?;
            }
        }
        if let Some(nseq) = self.nseq {
            writeln!(w, "NSEQ  {}", buf.format(nseq))?;
        }
        if let Some(effn) = self.eff_nseq {
            writeln!(w, "EFFN  {effn:.6}")?;
        }
        if let Some(cksum) = self.checksum {
            writeln!(w, "CKSUM {}", buf.format(cksum))?;
        }
        for (tag, cut) in [("GA", self.cutoffs.ga), ("TC", self.cutoffs.tc), ("NC", self.cutoffs.nc)] {
            if let Some([a, b]) = cut {
                writeln!(w, "{tag}    {a:.2} {b:.2};")?;
            }
        }
        if let Some(ev) = &self.evparam {
            writeln!(w, "STATS LOCAL MSV      {:8.4} {:8.5}", ev.msv[0], ev.msv[1])?;
            writeln!(w, "STATS LOCAL VITERBI  {:8.4} {:8.5}", ev.viterbi[0], ev.viterbi[1])?;
            writeln!(w, "STATS LOCAL FORWARD  {:8.4} {:8.5}", ev.forward[0], ev.forward[1])?;
        }

        write!(w, "HMM    ")?;
        for &sym in self.alphabet.symbols() {
            write!(w, " {:>8}", char::from(sym))?;
        }
        writeln!(w)?;
        write!(w, "       ")?;
        for label in TRANSITION_LABELS {
            write!(w, " {label:>8}")?;
        }
        writeln!(w)?;

        if let Some(compo) = &self.compo {
            write_probs(w, "COMPO", compo)?;
            writeln!(w)?;
        }
        write_probs(w, "", &self.ins[0])?;
        writeln!(w)?;
        write_probs(w, "", &self.t[0])?;
        writeln!(w)?;

        for k in 1..=self.m {
            write_probs(w, buf.format(k), &self.mat[k])?;
            let map = self.map.as_ref().and_then(|m| m.get(k)).copied();
            match map {
                Some(col) => write!(w, " {:>6}", buf.format(col))?,
                None => write!(w, " {:>6}", "-")?,
            }
            writeln!(
                w,
                " {} {} {} {}",
                annotation_char(self.consensus.as_ref(), k),
                annotation_char(self.rf.as_ref(), k),
                annotation_char(self.mm.as_ref(), k),
                annotation_char(self.cs.as_ref(), k),
            )?;
            write_probs(w, "", &self.ins[k])?;
            writeln!(w)?;
            write_probs(w, "", &self.t[k])?;
            writeln!(w)?;
        }
        writeln!(w, "//")
    }
}

/// Which optional per-node annotation columns a model declares.
#[derive(Default)]
struct AnnotationFlags {
    rf:   bool,
    mm:   bool,
    cons: bool,
    cs:   bool,
    map:  bool,
}

/// Reads `HMMER3` text format models from a stream, one at a time.
pub struct HmmReader<R: Read> {
    source: LineSource<R>,
}

impl<R: Read> RecordReader for HmmReader<R> {
    const RECORD_NAME: &str = "HMM file";
}

impl<R: Read> HmmReader<R> {
    #[must_use]
    pub fn new(inner: R) -> Self {
        HmmReader {
            source: LineSource::new(inner),
        }
    }

    fn err(&self, msg: impl std::fmt::Display) -> ProfillicError {
        ProfillicError::format(format!("HMM parse failed (line {}): {msg}", self.source.line_number()))
    }

    fn required_line(&mut self, what: &str) -> ProfillicResult<String> {
        match self.source.next_line()? {
            Some(line) => Ok(line),
            None => Err(self.err(format_args!("premature end of file; expected {what}"))),
        }
    }

    fn parse_prob(&self, tok: &str) -> ProfillicResult<f64> {
        if tok == "*" {
            return Ok(0.0);
        }
        tok.parse::<f64>()
            .map(|score| (-score).exp())
            .map_err(|_| self.err(format_args!("bad probability '{tok}'")))
    }

    fn parse_probs(&self, tokens: &[&str], n: usize) -> ProfillicResult<Vec<f64>> {
        if tokens.len() < n {
            return Err(self.err(format_args!("expected {n} values, saw {}", tokens.len())));
        }
        tokens[..n].iter().map(|tok| self.parse_prob(tok)).collect()
    }

    fn parse_transitions(&self, line: &str) -> ProfillicResult<[f64; NTRANSITIONS]> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let probs = self.parse_probs(&tokens, NTRANSITIONS)?;
        let mut t = [0.0; NTRANSITIONS];
        t.copy_from_slice(&probs);
        Ok(t)
    }

    fn parse_pair(&self, tag: &str, value: &str) -> ProfillicResult<[f64; 2]> {
        let mut fields = value.split_whitespace().map(|tok| tok.trim_end_matches(';').parse::<f64>());
        match (fields.next(), fields.next()) {
            (Some(Ok(a)), Some(Ok(b))) => Ok([a, b]),
            _ => Err(self.err(format_args!("bad {tag} line"))),
        }
    }

    fn parse_flag(&self, tag: &str, value: &str) -> ProfillicResult<bool> {
        match value {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => Err(self.err(format_args!("{tag} must be yes or no, not '{value}'"))),
        }
    }

    /// Reads the next model, or `Ok(None)` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Fails with a format error naming the offending line.
    pub fn read(&mut self) -> ProfillicResult<Option<Plan7Hmm>> {
        let header = loop {
            match self.source.next_line()? {
                None => return Ok(None),
                Some(line) if is_blank(&line) => {}
                Some(line) => break line,
            }
        };
        if !header.starts_with("HMMER3/") {
            return Err(self.err("expected a HMMER3 format tag"));
        }

        let mut hmm = Plan7Hmm::new(0, Alphabet::Amino);
        let mut flags = AnnotationFlags::default();
        let (mut leng, mut alph) = (None, None);

        loop {
            let line = self.required_line("HMM line")?;
            let Some((tag, rest)) = next_token(&line) else {
                continue;
            };
            let value = rest.trim();
            match tag {
                "NAME" => hmm.name = Some(value.to_string()),
                "ACC" => hmm.acc = Some(value.to_string()),
                "DESC" => hmm.desc = Some(value.to_string()),
                "LENG" => {
                    leng = Some(
                        value
                            .parse::<usize>()
                            .map_err(|_| self.err(format_args!("bad LENG '{value}'")))?,
                    );
                }
                "MAXL" => hmm.max_length = value.parse().ok(),
                "ALPH" => {
                    alph = Some(
                        Alphabet::from_name(value).ok_or_else(|| self.err(format_args!("unknown alphabet '{value}'")))?,
                    );
                }
                "RF" => flags.rf = self.parse_flag(tag, value)?,
                "MM" => flags.mm = self.parse_flag(tag, value)?,
                "CONS" => flags.cons = self.parse_flag(tag, value)?,
                "CS" => flags.cs = self.parse_flag(tag, value)?,
                "MAP" => flags.map = self.parse_flag(tag, value)?,
                "DATE" => hmm.ctime = Some(value.to_string()),
                "COM" => {
                    let cmd = value.split_once(']').map_or(value, |(_, c)| c.trim());
                    hmm.append_comlog(cmd);
                }
                "NSEQ" => {
                    hmm.nseq = Some(value.parse().map_err(|_| self.err(format_args!("bad NSEQ '{value}'")))?);
                }
                "EFFN" => {
                    hmm.eff_nseq = Some(value.parse().map_err(|_| self.err(format_args!("bad EFFN '{value}'")))?);
                }
                "CKSUM" => {
                    hmm.checksum = Some(value.parse().map_err(|_| self.err(format_args!("bad CKSUM '{value}'")))?);
                }
                "GA" => hmm.cutoffs.ga = Some(self.parse_pair(tag, value)?),
                "TC" => hmm.cutoffs.tc = Some(self.parse_pair(tag, value)?),
                "NC" => hmm.cutoffs.nc = Some(self.parse_pair(tag, value)?),
                "STATS" => {
                    let tokens: Vec<&str> = value.split_whitespace().collect();
                    let [mode, which, params @ ..] = tokens.as_slice() else {
                        return Err(self.err("bad STATS line"));
                    };
                    if *mode != "LOCAL" {
                        return Err(self.err(format_args!("unknown STATS mode '{mode}'")));
                    }
                    let pair = self.parse_pair(tag, &params.join(" "))?;
                    let ev = hmm.evparam.get_or_insert_with(EvalueParams::default);
                    match *which {
                        "MSV" => ev.msv = pair,
                        "VITERBI" => ev.viterbi = pair,
                        "FORWARD" => ev.forward = pair,
                        _ => return Err(self.err(format_args!("unknown STATS line '{which}'"))),
                    }
                }
                "HMM" => break,
                _ => log::debug!("Skipping unknown HMM header tag {tag}"),
            }
        }

        let (Some(m), Some(alphabet)) = (leng, alph) else {
            return Err(self.err("LENG and ALPH must precede the HMM line"));
        };
        let k = alphabet.size();
        let mut hmm = Plan7Hmm {
            alphabet,
            m,
            t: vec![[0.0; NTRANSITIONS]; m + 1],
            mat: vec![vec![0.0; k]; m + 1],
            ins: vec![vec![0.0; k]; m + 1],
            ..hmm
        };
        hmm.set_match_basis();

        let blank_line = || {
            let mut v = vec![b'-'; m + 1];
            v[0] = b' ';
            v
        };
        let mut rf = flags.rf.then(blank_line);
        let mut mm = flags.mm.then(blank_line);
        let mut cons = flags.cons.then(blank_line);
        let mut cs = flags.cs.then(blank_line);
        let mut map = flags.map.then(|| vec![0usize; m + 1]);

        // Transition labels
        self.required_line("transition labels")?;

        let line = self.required_line("insert emissions for node 0")?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let ins0 = if tokens.first() == Some(&"COMPO") {
            hmm.compo = Some(self.parse_probs(&tokens[1..], k)?);
            let line = self.required_line("insert emissions for node 0")?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            self.parse_probs(&tokens, k)?
        } else {
            self.parse_probs(&tokens, k)?
        };
        hmm.ins[0] = ins0;
        let line = self.required_line("transitions for node 0")?;
        hmm.t[0] = self.parse_transitions(&line)?;

        for node in 1..=m {
            let line = self.required_line("match emissions")?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.first().and_then(|t| t.parse::<usize>().ok()) != Some(node) {
                return Err(self.err(format_args!("expected match line for node {node}")));
            }
            hmm.mat[node] = self.parse_probs(&tokens[1..], k)?;

            let annotation = &tokens[1 + k..];
            let column = |i: usize, what: &str| {
                annotation
                    .get(i)
                    .copied()
                    .ok_or_else(|| self.err(format_args!("missing {what} annotation for node {node}")))
            };
            if let Some(map) = map.as_mut() {
                let tok = column(0, "MAP")?;
                map[node] = tok
                    .parse()
                    .map_err(|_| self.err(format_args!("bad MAP annotation '{tok}'")))?;
            }
            for (i, what, line) in [
                (1, "CONS", cons.as_mut()),
                (2, "RF", rf.as_mut()),
                (3, "MM", mm.as_mut()),
                (4, "CS", cs.as_mut()),
            ] {
                if let Some(line) = line {
                    line[node] = column(i, what)?.as_bytes()[0];
                }
            }

            let line = self.required_line("insert emissions")?;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            hmm.ins[node] = self.parse_probs(&tokens, k)?;
            let line = self.required_line("transitions")?;
            hmm.t[node] = self.parse_transitions(&line)?;
        }

        let end = self.required_line("//")?;
        if end.trim() != "//" {
            return Err(self.err("expected // at end of model"));
        }

        hmm.rf = rf;
        hmm.mm = mm;
        hmm.consensus = cons;
        hmm.cs = cs;
        hmm.map = map;
        log::debug!("Read HMM {} with {m} nodes", hmm.name.as_deref().unwrap_or("(unnamed)"));
        Ok(Some(hmm))
    }
}

impl HmmReader<File> {
    /// Opens a model file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or is empty.
    pub fn from_filename<P: AsRef<Path>>(path: P) -> ProfillicResult<Self> {
        Ok(HmmReader::new(Self::open_nonempty_file(path)?))
    }
}

impl<R: Read> Iterator for HmmReader<R> {
    type Item = ProfillicResult<Plan7Hmm>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}
