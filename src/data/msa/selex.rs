use super::Msa;
use crate::{
    ProfillicError, ProfillicResult,
    data::records::{LineSource, is_blank, next_token},
};
use std::io::Read;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineType {
    Sequence,
    Rf,
    Cs,
    Ss,
    Sa,
}

impl LineType {
    fn of(line: &str) -> Self {
        if line.starts_with("#=RF") {
            LineType::Rf
        } else if line.starts_with("#=CS") {
            LineType::Cs
        } else if line.starts_with("#=SS") {
            LineType::Ss
        } else if line.starts_with("#=SA") {
            LineType::Sa
        } else {
            LineType::Sequence
        }
    }

    fn tag(self) -> &'static str {
        match self {
            LineType::Sequence => "seq",
            LineType::Rf => "#=RF",
            LineType::Cs => "#=CS",
            LineType::Ss => "#=SS",
            LineType::Sa => "#=SA",
        }
    }
}

/// One block of lines, with the column of the first and last data
/// character on each. `lpos` is `None` for lines with no data.
struct Block {
    lines:  Vec<String>,
    lpos:   Vec<Option<usize>>,
    rpos:   Vec<usize>,
    starti: usize,
}

fn is_selex_comment(line: &str) -> bool {
    line.starts_with('#') && !line.starts_with("#=")
}

fn format_err(line: usize, msg: impl std::fmt::Display) -> ProfillicError {
    ProfillicError::format(format!("parse failed (line {line}): {msg}"))
}

/// Reads the next block. Returns `Ok(None)` when the stream is exhausted.
fn read_block<R: Read>(src: &mut LineSource<R>, expected: Option<usize>) -> ProfillicResult<Option<Block>> {
    let first = loop {
        match src.next_line()? {
            Some(line) if is_blank(&line) || is_selex_comment(&line) => {}
            Some(line) => break line,
            None if expected.is_none() => {
                return Err(ProfillicError::format("parse failed: no alignment data found"));
            }
            None => return Ok(None),
        }
    };

    let starti = src.line_number();
    let mut lines = vec![first];
    loop {
        match src.next_line()? {
            Some(line) if is_selex_comment(&line) => {}
            Some(line) if is_blank(&line) => break,
            Some(line) => lines.push(line),
            None => break,
        }
    }

    if let Some(n) = expected
        && n != lines.len()
    {
        return Err(format_err(
            src.line_number(),
            format_args!("expected {n} lines in block, saw {}", lines.len()),
        ));
    }

    let rpos = lines
        .iter()
        .map(|l| l.trim_end().len().saturating_sub(1))
        .collect();
    Ok(Some(Block {
        lpos: vec![None; lines.len()],
        lines,
        rpos,
        starti,
    }))
}

/// Column of the first data character after the leading token.
fn data_start(line: &str) -> Option<usize> {
    let (_, rest) = next_token(line)?;
    let skipped = line.len() - rest.len();
    let trimmed = rest.trim_start();
    (!trimmed.is_empty()).then(|| skipped + (rest.len() - trimmed.len()))
}

/// Classifies the lines of the first block and allocates the alignment.
fn first_block(block: &mut Block) -> ProfillicResult<(Msa, Vec<LineType>)> {
    let (mut nseq, mut nrf, mut ncs, mut nss, mut nsa) = (0, 0, 0, 0, 0);
    let mut ltypes = Vec::with_capacity(block.lines.len());

    for (li, line) in block.lines.iter().enumerate() {
        let lt = LineType::of(line);
        match lt {
            LineType::Rf => nrf += 1,
            LineType::Cs => ncs += 1,
            LineType::Ss => nss += 1,
            LineType::Sa => nsa += 1,
            LineType::Sequence => {
                nseq += 1;
                nss = 0;
                nsa = 0;
            }
        }
        ltypes.push(lt);

        let lineno = li + block.starti;
        if nss > 0 && nseq == 0 {
            return Err(format_err(lineno, "#=SS must follow a sequence"));
        }
        if nsa > 0 && nseq == 0 {
            return Err(format_err(lineno, "#=SA must follow a sequence"));
        }
        if nrf > 1 {
            return Err(format_err(lineno, "too many #=RF lines for block"));
        }
        if ncs > 1 {
            return Err(format_err(lineno, "too many #=CS lines for block"));
        }
        if nss > 1 {
            return Err(format_err(lineno, "too many #=SS lines for seq"));
        }
        if nsa > 1 {
            return Err(format_err(lineno, "too many #=SA lines for seq"));
        }
    }

    let mut msa = Msa::new();
    if ltypes.contains(&LineType::Ss) {
        msa.ss = Some(Vec::new());
    }
    if ltypes.contains(&LineType::Sa) {
        msa.sa = Some(Vec::new());
    }

    for (li, line) in block.lines.iter().enumerate() {
        if ltypes[li] == LineType::Sequence
            && let Some((name, _)) = next_token(line)
        {
            msa.add_sequence(name.to_string());
        }
        block.lpos[li] = data_start(line);
    }
    Ok((msa, ltypes))
}

/// Checks that a later block repeats the first block's layout.
fn other_block(block: &mut Block, msa: &Msa, ltypes: &[LineType]) -> ProfillicResult<()> {
    for (li, line) in block.lines.iter().enumerate() {
        let lt = LineType::of(line);
        if lt != ltypes[li] {
            return Err(format_err(
                li + block.starti,
                format_args!("{} line isn't in expected order", lt.tag()),
            ));
        }
    }

    let mut i = 0;
    for (li, line) in block.lines.iter().enumerate() {
        if ltypes[li] == LineType::Sequence {
            let name = next_token(line).map_or("", |(t, _)| t);
            if name != msa.seq_names[i] {
                return Err(format_err(
                    li + block.starti,
                    format_args!("expected seq {}, saw {name}", msa.seq_names[i]),
                ));
            }
            i += 1;
        }
        block.lpos[li] = data_start(line);
    }
    Ok(())
}

/// Appends the block's columns to each track, padding with spaces so every
/// track grows by the block's full width.
fn append_block(msa: &mut Msa, block: &Block, ltypes: &[LineType]) {
    let leftmost = block.lpos.iter().flatten().min().copied();
    let rightmost = block
        .lpos
        .iter()
        .zip(&block.rpos)
        .filter_map(|(l, &r)| l.map(|_| r))
        .max();
    let (Some(leftmost), Some(rightmost)) = (leftmost, rightmost) else {
        return;
    };
    let nadd = rightmost - leftmost + 1;

    let mut i = 0;
    for (li, line) in block.lines.iter().enumerate() {
        let track: &mut Vec<u8> = match ltypes[li] {
            LineType::Sequence => {
                i += 1;
                &mut msa.aseqs[i - 1]
            }
            LineType::Rf => msa.rf.get_or_insert_with(Vec::new),
            LineType::Cs => msa.ss_cons.get_or_insert_with(Vec::new),
            LineType::Ss => attached(&mut msa.ss, i - 1),
            LineType::Sa => attached(&mut msa.sa, i - 1),
        };

        match block.lpos[li] {
            Some(lpos) => {
                let rpos = block.rpos[li];
                track.resize(track.len() + (lpos - leftmost), b' ');
                track.extend_from_slice(&line.as_bytes()[lpos..=rpos]);
                track.resize(track.len() + (rightmost - rpos), b' ');
            }
            None => track.resize(track.len() + nadd, b' '),
        }
    }
    msa.alen += nadd;
}

/// The per-sequence markup for sequence `idx`, allocating as needed.
fn attached(track: &mut Option<Vec<Option<Vec<u8>>>>, idx: usize) -> &mut Vec<u8> {
    let track = track.get_or_insert_with(Vec::new);
    if track.len() <= idx {
        track.resize(idx + 1, None);
    }
    track[idx].get_or_insert_with(Vec::new)
}

fn spaces_to_gaps(track: &mut [u8]) {
    for b in track.iter_mut().filter(|b| **b == b' ') {
        *b = b'.';
    }
}

/// Reads a SELEX alignment: the whole stream is one record.
pub(crate) fn read_selex<R: Read>(src: &mut LineSource<R>) -> ProfillicResult<Option<Msa>> {
    let Some(mut block) = read_block(src, None)? else {
        return Ok(None);
    };
    let (mut msa, ltypes) = first_block(&mut block)?;
    append_block(&mut msa, &block, &ltypes);

    while let Some(mut block) = read_block(src, Some(ltypes.len()))? {
        other_block(&mut block, &msa, &ltypes)?;
        append_block(&mut msa, &block, &ltypes);
    }

    for track in [msa.rf.as_mut(), msa.ss_cons.as_mut()].into_iter().flatten() {
        spaces_to_gaps(track);
    }
    for tracks in [msa.ss.as_mut(), msa.sa.as_mut()].into_iter().flatten() {
        for track in tracks.iter_mut().flatten() {
            spaces_to_gaps(track);
        }
    }
    for aseq in &mut msa.aseqs {
        spaces_to_gaps(aseq);
    }

    msa.verify()?;
    log::debug!("Read SELEX alignment with {} sequences of length {}", msa.nseq(), msa.alen);
    Ok(Some(msa))
}
