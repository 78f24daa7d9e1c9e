use super::{Msa, pairwise_identity, single_linkage};
use crate::{
    ProfillicError, ProfillicResult,
    data::{Alphabet, Symbol},
};

/// Relative sequence weighting algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WeightStrategy {
    /// Henikoff position-based weights
    #[default]
    PositionBased,
    /// Gerstein/Sonnhammer/Chothia tree weights
    Gsc,
    /// Single-linkage clusters at an identity threshold share a weight of 1
    Blosum,
    /// Every sequence weighs 1
    None,
    /// Keep the weights from the alignment file
    Given,
}

/// Rescales weights to sum to the number of sequences. All-zero weights
/// become all ones.
fn scale_to_nseq(w: &mut [f64]) {
    let total: f64 = w.iter().sum();
    if total > 0.0 {
        #[allow(clippy::cast_precision_loss)]
        let factor = w.len() as f64 / total;
        w.iter_mut().for_each(|x| *x *= factor);
    } else {
        w.fill(1.0);
    }
}

/// Henikoff position-based weights. Each column splits one unit of weight
/// evenly among the residue types present, and each type's share evenly
/// among the sequences with it. Sums are divided by sequence length.
#[must_use]
pub fn position_based_weights(msa: &Msa, alphabet: Alphabet) -> Vec<f64> {
    let nseq = msa.nseq();
    let k = alphabet.size();
    let mut w = vec![0.0; nseq];
    let mut len = vec![0usize; nseq];
    let mut counts = vec![0usize; k];

    for apos in 0..msa.alen {
        counts.fill(0);
        for (idx, aseq) in msa.aseqs.iter().enumerate() {
            if let Symbol::Residue(x) = alphabet.digitize(aseq[apos]) {
                counts[x] += 1;
                len[idx] += 1;
            }
        }
        let ntypes = counts.iter().filter(|&&c| c > 0).count();
        if ntypes == 0 {
            continue;
        }
        for (idx, aseq) in msa.aseqs.iter().enumerate() {
            if let Symbol::Residue(x) = alphabet.digitize(aseq[apos]) {
                #[allow(clippy::cast_precision_loss)]
                let share = 1.0 / (ntypes * counts[x]) as f64;
                w[idx] += share;
            }
        }
    }

    for (wi, &li) in w.iter_mut().zip(&len) {
        if li > 0 {
            #[allow(clippy::cast_precision_loss)]
            let li = li as f64;
            *wi /= li;
        }
    }
    scale_to_nseq(&mut w);
    w
}

/// BLOSUM weights: sequences in the same single-linkage cluster at identity
/// `wid` share one unit of weight.
#[must_use]
pub fn blosum_weights(msa: &Msa, wid: f64) -> Vec<f64> {
    let clusters = single_linkage(msa, wid);
    let mut sizes = vec![0usize; clusters.count];
    for &c in &clusters.assignment {
        sizes[c] += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let mut w: Vec<f64> = clusters.assignment.iter().map(|&c| 1.0 / sizes[c] as f64).collect();
    scale_to_nseq(&mut w);
    w
}

/// A node of a UPGMA tree. Leaves are `0..n`; internal nodes follow.
struct TreeNode {
    children: Option<(usize, usize)>,
    height:   f64,
}

/// Builds a UPGMA tree from a distance matrix. The root is the last node.
fn upgma(mut dist: Vec<Vec<f64>>) -> Vec<TreeNode> {
    let n = dist.len();
    let mut nodes: Vec<TreeNode> = (0..n)
        .map(|_| TreeNode {
            children: None,
            height:   0.0,
        })
        .collect();
    // Active clusters as (node, size); position matches the row in dist.
    let mut active: Vec<(usize, usize)> = (0..n).map(|i| (i, 1)).collect();

    while active.len() > 1 {
        let (mut bi, mut bj) = (0, 1);
        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                if dist[i][j] < dist[bi][bj] {
                    (bi, bj) = (i, j);
                }
            }
        }

        let (ni, si) = active[bi];
        let (nj, sj) = active[bj];
        let id = nodes.len();
        nodes.push(TreeNode {
            children: Some((ni, nj)),
            height:   dist[bi][bj] / 2.0,
        });

        #[allow(clippy::cast_precision_loss)]
        let (fi, fj) = (si as f64, sj as f64);
        let merged: Vec<f64> = (0..active.len())
            .map(|k| (fi * dist[bi][k] + fj * dist[bj][k]) / (fi + fj))
            .collect();

        for (k, row) in dist.iter_mut().enumerate() {
            row[bi] = merged[k];
        }
        dist[bi] = merged;
        dist[bi][bi] = 0.0;
        active[bi] = (id, si + sj);

        dist.remove(bj);
        for row in &mut dist {
            row.remove(bj);
        }
        active.remove(bj);
    }
    nodes
}

/// Gerstein/Sonnhammer/Chothia weights over a UPGMA tree of fractional
/// identity distances.
#[must_use]
pub fn gsc_weights(msa: &Msa) -> Vec<f64> {
    let n = msa.nseq();
    if n < 2 {
        return vec![1.0; n];
    }

    let mut dist = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = 1.0 - pairwise_identity(&msa.aseqs[i], &msa.aseqs[j]);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }
    let tree = upgma(dist);
    let root = tree.len() - 1;

    // Total branch length below each node; children always precede parents.
    let mut below = vec![0.0; tree.len()];
    for v in n..tree.len() {
        if let Some((l, r)) = tree[v].children {
            let h = tree[v].height;
            below[v] = below[l] + (h - tree[l].height) + below[r] + (h - tree[r].height);
        }
    }

    let mut flow = vec![0.0; tree.len()];
    flow[root] = below[root];
    for v in (n..tree.len()).rev() {
        if let Some((l, r)) = tree[v].children {
            let h = tree[v].height;
            let lw = below[l] + (h - tree[l].height);
            let rw = below[r] + (h - tree[r].height);
            if lw + rw > 0.0 {
                flow[l] = flow[v] * lw / (lw + rw);
                flow[r] = flow[v] * rw / (lw + rw);
            } else {
                flow[l] = flow[v] / 2.0;
                flow[r] = flow[v] / 2.0;
            }
        }
    }

    let mut w = flow[..n].to_vec();
    scale_to_nseq(&mut w);
    w
}

impl Msa {
    /// Sets relative sequence weights. The alignment must have been
    /// verified.
    ///
    /// # Errors
    ///
    /// Fails if the alignment has no sequences.
    pub fn set_relative_weights(&mut self, strategy: WeightStrategy, alphabet: Alphabet, wid: f64) -> ProfillicResult<()> {
        if self.nseq() == 0 {
            return Err(ProfillicError::invalid("failed to set relative weights in alignment"));
        }

        self.weights = match strategy {
            WeightStrategy::PositionBased => position_based_weights(self, alphabet),
            WeightStrategy::Gsc => gsc_weights(self),
            WeightStrategy::Blosum => blosum_weights(self, wid),
            WeightStrategy::None => vec![1.0; self.nseq()],
            WeightStrategy::Given => {
                if !self.has_weights {
                    log::warn!("No weights given in the alignment; all sequences weigh 1");
                }
                return Ok(());
            }
        };
        self.has_weights = true;
        log::debug!("Set {strategy:?} weights for {} sequences", self.nseq());
        Ok(())
    }
}
