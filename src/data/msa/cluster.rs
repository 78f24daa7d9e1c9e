use super::Msa;

#[inline]
fn is_residue(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'*'
}

/// Fractional identity of two aligned sequences: identical residue columns
/// divided by the length of the shorter unaligned sequence. Returns 0 if
/// either sequence is empty.
#[must_use]
pub fn pairwise_identity(a: &[u8], b: &[u8]) -> f64 {
    let mut idents = 0usize;
    let (mut len_a, mut len_b) = (0usize, 0usize);
    for (&x, &y) in a.iter().zip(b) {
        let (rx, ry) = (is_residue(x), is_residue(y));
        len_a += usize::from(rx);
        len_b += usize::from(ry);
        if rx && ry && x.eq_ignore_ascii_case(&y) {
            idents += 1;
        }
    }
    let shorter = len_a.min(len_b);
    if shorter == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let pid = idents as f64 / shorter as f64;
        pid
    }
}

/// A partition of sequences into clusters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clusters {
    /// The cluster of each sequence, numbered from zero in order of first
    /// appearance
    pub assignment: Vec<usize>,
    pub count:      usize,
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Single-linkage clustering: two sequences share a cluster when a chain of
/// pairs with identity at or above `threshold` connects them.
#[must_use]
pub fn single_linkage(msa: &Msa, threshold: f64) -> Clusters {
    let n = msa.nseq();
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in (i + 1)..n {
            if pairwise_identity(&msa.aseqs[i], &msa.aseqs[j]) >= threshold {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                if ri != rj {
                    parent[rj] = ri;
                }
            }
        }
    }

    let mut label = vec![usize::MAX; n];
    let mut assignment = Vec::with_capacity(n);
    let mut count = 0;
    for i in 0..n {
        let root = find(&mut parent, i);
        if label[root] == usize::MAX {
            label[root] = count;
            count += 1;
        }
        assignment.push(label[root]);
    }
    Clusters { assignment, count }
}
