use super::Msa;
use crate::{
    ProfillicError, ProfillicResult,
    data::records::{LineSource, is_blank, next_token},
};
use std::io::Read;

/// Reads the next Stockholm record. Returns `Ok(None)` if the stream holds
/// nothing but blank lines.
pub(crate) fn read_stockholm<R: Read>(src: &mut LineSource<R>) -> ProfillicResult<Option<Msa>> {
    let header = loop {
        match src.next_line()? {
            None => return Ok(None),
            Some(line) if is_blank(&line) => {}
            Some(line) => break line,
        }
    };

    if !header.starts_with("# STOCKHOLM 1.") {
        return Err(ProfillicError::format(format!(
            "parse failed (line {}): missing \"# STOCKHOLM\" header",
            src.line_number()
        )));
    }

    let mut msa = Msa::new();
    let mut terminated = false;

    while let Some(line) = src.next_line()? {
        let s = line.trim_start_matches([' ', '\t']);

        let (parsed, kind) = if s.starts_with("#=GF") {
            (parse_gf(&mut msa, s), "#=GF")
        } else if s.starts_with("#=GS") {
            (parse_gs(&mut msa, s), "#=GS")
        } else if s.starts_with("#=GC") {
            (parse_gc(&mut msa, s), "#=GC")
        } else if s.starts_with("#=GR") {
            (parse_gr(&mut msa, s), "#=GR")
        } else if let Some(comment) = s.strip_prefix('#') {
            msa.comments.push(comment.to_string());
            (Some(()), "comment")
        } else if s.starts_with("//") {
            terminated = true;
            break;
        } else if is_blank(s) {
            continue;
        } else {
            (parse_sequence(&mut msa, s), "sequence")
        };

        if parsed.is_none() {
            return Err(ProfillicError::format(format!(
                "parse failed (line {}): bad {kind} line",
                src.line_number()
            )));
        }
    }

    if !terminated {
        return Err(ProfillicError::format(format!(
            "parse failed (line {}): didn't find // at end of alignment",
            src.line_number() + 1
        )));
    }

    msa.verify()?;
    log::debug!(
        "Read Stockholm alignment '{}' with {} sequences of length {}",
        msa.display_name(),
        msa.nseq(),
        msa.alen
    );
    Ok(Some(msa))
}

/// Parses a cutoff value, tolerating Pfam's trailing semicolon.
fn parse_cutoff(tok: &str) -> Option<f64> {
    tok.trim_end_matches(';').parse().ok()
}

/// `#=GF <tag> <text>`
fn parse_gf(msa: &mut Msa, s: &str) -> Option<()> {
    let (_, rest) = next_token(s)?;
    let (tag, rest) = next_token(rest)?;
    let text = rest.trim();
    let owned = || (!text.is_empty()).then(|| text.to_string());

    match tag {
        "ID" => msa.name = owned(),
        "AC" => msa.accession = owned(),
        "DE" => msa.description = owned(),
        "AU" => msa.author = owned(),
        "GA" | "NC" | "TC" => {
            let (first, rest) = next_token(text)?;
            let pair = [Some(parse_cutoff(first)?), next_token(rest).and_then(|(t, _)| parse_cutoff(t))];
            match tag {
                "GA" => msa.cutoffs.ga = pair,
                "NC" => msa.cutoffs.nc = pair,
                _ => msa.cutoffs.tc = pair,
            }
        }
        _ => msa.add_gf(tag, text),
    }
    Some(())
}

/// `#=GS <seqname> <tag> <text>`
fn parse_gs(msa: &mut Msa, s: &str) -> Option<()> {
    let (_, rest) = next_token(s)?;
    let (seqname, rest) = next_token(rest)?;
    let (tag, rest) = next_token(rest)?;
    let text = rest.trim();
    if text.is_empty() {
        return None;
    }

    let idx = msa.get_seqidx(seqname, msa.next_idx_guess());
    msa.set_last_idx(idx);

    match tag {
        "WT" => {
            msa.weights[idx] = parse_cutoff(text)?;
            msa.has_weights = true;
        }
        "AC" => msa.seq_accessions[idx] = Some(text.to_string()),
        "DE" => msa.seq_descriptions[idx] = Some(text.to_string()),
        _ => msa.add_gs(tag, idx, text),
    }
    Some(())
}

/// `#=GC <tag> <aligned text>`
fn parse_gc(msa: &mut Msa, s: &str) -> Option<()> {
    let (_, rest) = next_token(s)?;
    let (tag, rest) = next_token(rest)?;
    let (text, _) = next_token(rest)?;
    let text = text.as_bytes();

    let track = match tag {
        "SS_cons" => &mut msa.ss_cons,
        "SA_cons" => &mut msa.sa_cons,
        "PP_cons" => &mut msa.pp_cons,
        "RF" => &mut msa.rf,
        _ => {
            msa.append_gc(tag, text);
            return Some(());
        }
    };
    track.get_or_insert_with(Vec::new).extend_from_slice(text);
    Some(())
}

/// `#=GR <seqname> <tag> <aligned text>`
fn parse_gr(msa: &mut Msa, s: &str) -> Option<()> {
    let (_, rest) = next_token(s)?;
    let (seqname, rest) = next_token(rest)?;
    let (tag, rest) = next_token(rest)?;
    let (text, _) = next_token(rest)?;
    let text = text.as_bytes();

    let idx = msa.get_seqidx(seqname, msa.last_idx());
    msa.set_last_idx(idx);
    let nseq = msa.nseq();

    let track = match tag {
        "SS" => &mut msa.ss,
        "SA" => &mut msa.sa,
        "PP" => &mut msa.pp,
        _ => {
            msa.append_gr(tag, idx, text);
            return Some(());
        }
    };
    let track = track.get_or_insert_with(|| vec![None; nseq]);
    track[idx].get_or_insert_with(Vec::new).extend_from_slice(text);
    Some(())
}

/// `<seqname> <aligned text>`
fn parse_sequence(msa: &mut Msa, s: &str) -> Option<()> {
    let (seqname, rest) = next_token(s)?;
    let (text, _) = next_token(rest)?;

    let idx = msa.get_seqidx(seqname, msa.next_idx_guess());
    msa.set_last_idx(idx);
    msa.aseqs[idx].extend_from_slice(text.as_bytes());
    Some(())
}
