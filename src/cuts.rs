//! K-feasible cut enumeration (C2).
//!
//! For every AND node the manager keeps up to `n_max` small input supports
//! ("cuts"), each no larger than 4 leaves, together with the 16-bit truth
//! table the node computes over those leaves. Rewrite (C4) matches each cut
//! against the NPN-4 library; balance's LUT-aware variant and Dam both read
//! cuts too, so the manager is its own module rather than rewrite-private
//! state.

use crate::arena::Aig;
use crate::entities::{Kind, NodeId};
use crate::truth::{self, Truth16};
use cranelift_entity::{EntityRef, SecondaryMap};
use smallvec::SmallVec;

/// Default number of cuts retained per node before the worst is evicted.
pub const DEFAULT_N_CUTS_MAX: usize = 8;

/// Maximum leaves a cut may carry (K in "K-feasible").
pub const MAX_LEAVES: usize = 4;

/// A bounded input support of a node, together with the function it computes
/// over that support.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cut {
    leaves: SmallVec<[NodeId; MAX_LEAVES]>,
    truth: Truth16,
    sig: u32,
}

impl Cut {
    fn signature(leaves: &[NodeId]) -> u32 {
        leaves
            .iter()
            .fold(0u32, |acc, l| acc | (1u32 << (l.index() as u32 % 32)))
    }

    /// The trivial, single-node cut `{v}` computing the identity function.
    fn trivial(v: NodeId) -> Cut {
        let leaves = SmallVec::from_slice(&[v]);
        Cut {
            sig: Self::signature(&leaves),
            leaves,
            truth: truth::VAR_TT[0],
        }
    }

    fn new(leaves: SmallVec<[NodeId; MAX_LEAVES]>, truth: Truth16) -> Cut {
        Cut {
            sig: Self::signature(&leaves),
            leaves,
            truth,
        }
    }

    /// The leaves of this cut, in ascending `NodeId` order.
    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    /// The 16-bit truth table this cut computes over `leaves()`, in leaf
    /// order (leaf `i` is variable `i`; variables beyond `leaves().len()`
    /// are don't-cares of `truth`).
    pub fn truth(&self) -> Truth16 {
        self.truth
    }

    /// The Bloom signature used to fast-reject non-mergeable/non-dominating
    /// pairs before falling back to the exact leaf-set comparison.
    pub fn signature(&self) -> u32 {
        self.sig
    }

    fn is_trivial(&self) -> bool {
        self.leaves.len() <= 1
    }

    fn contains(&self, other: &Cut) -> bool {
        if self.sig & other.sig != other.sig {
            return false;
        }
        other.leaves.iter().all(|l| self.leaves.contains(l))
    }

    fn value(&self, aig: &Aig) -> u32 {
        let base: u32 = self.leaves.iter().map(|&l| aig.ref_count(l)).sum();
        base + if self.is_trivial() { 1001 } else { 0 }
    }

    fn is_valid(&self, aig: &Aig) -> bool {
        self.leaves
            .iter()
            .all(|&l| aig.ref_count(l) > 0 || aig_kind_is_terminal(aig, l))
    }
}

fn aig_kind_is_terminal(aig: &Aig, id: NodeId) -> bool {
    id == NodeId::CONST1 || aig.primary_inputs().contains(&id)
}

/// Computes the permutation array (for `truth::permute`) that re-expresses a
/// cut whose own leaves are `from` into the variable order of `merged`,
/// padding slots `from` doesn't use with whichever original indices are
/// still free (the resulting table is don't-care there, so the choice is
/// arbitrary).
fn build_perm(from: &[NodeId], merged: &[NodeId]) -> [u32; 4] {
    let mut perm = [u32::MAX; 4];
    let mut used = [false; 4];
    for (v, leaf) in merged.iter().enumerate() {
        if let Some(pos) = from.iter().position(|l| l == leaf) {
            perm[v] = pos as u32;
            used[pos] = true;
        }
    }
    let mut spare = (0..4u32).filter(|i| !used[*i as usize]);
    for slot in perm.iter_mut() {
        if *slot == u32::MAX {
            *slot = spare.next().expect("4 slots, at most 4 used");
        }
    }
    perm
}

fn merge_leaves(
    a: &[NodeId],
    b: &[NodeId],
) -> Option<SmallVec<[NodeId; MAX_LEAVES]>> {
    let mut out: SmallVec<[NodeId; MAX_LEAVES]> = SmallVec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        if out.len() > MAX_LEAVES {
            return None;
        }
        let next = match (a.get(i), b.get(j)) {
            (Some(&x), Some(&y)) if x < y => {
                i += 1;
                x
            }
            (Some(&x), Some(&y)) if y < x => {
                j += 1;
                y
            }
            (Some(&x), Some(_)) => {
                i += 1;
                j += 1;
                x
            }
            (Some(&x), None) => {
                i += 1;
                x
            }
            (None, Some(&y)) => {
                j += 1;
                y
            }
            (None, None) => unreachable!(),
        };
        out.push(next);
    }
    if out.len() > MAX_LEAVES {
        None
    } else {
        Some(out)
    }
}

/// Computes and memoizes the K-feasible cuts of every AND node, given cuts
/// for their fanins already present.
pub struct CutManager {
    cuts: SecondaryMap<NodeId, Vec<Cut>>,
    n_max: usize,
}

impl Default for CutManager {
    fn default() -> Self {
        CutManager::new(DEFAULT_N_CUTS_MAX)
    }
}

impl CutManager {
    /// Creates an empty manager retaining up to `n_max` cuts per node.
    pub fn new(n_max: usize) -> Self {
        CutManager {
            cuts: SecondaryMap::new(),
            n_max,
        }
    }

    /// Cuts currently memoized for `node`, trivial cut first.
    pub fn iter_cuts(&self, node: NodeId) -> impl Iterator<Item = &Cut> {
        self.cuts[node].iter()
    }

    /// Releases the cuts stored for `node`.
    pub fn reset_cuts(&mut self, node: NodeId) {
        self.cuts[node].clear();
    }

    /// Clears every node's cuts and reseeds the constant and primary input
    /// terminals starting from `root`'s transitive fanin, used when
    /// restarting the cut manager's working set for a fresh pass.
    pub fn restart_from(&mut self, aig: &Aig, root: NodeId) {
        self.cuts = SecondaryMap::new();
        self.seed_terminal(NodeId::CONST1);
        for &pi in aig.primary_inputs() {
            self.seed_terminal(pi);
        }
        self.compute_cuts_transitive(aig, root);
    }

    fn seed_terminal(&mut self, node: NodeId) {
        self.cuts[node] = vec![Cut::trivial(node)];
    }

    /// Computes (and memoizes) `node`'s cuts, assuming cuts already exist for
    /// both of its fanins. No-op for non-`And` kinds (terminals are seeded
    /// directly via `seed_terminal`/`restart_from`).
    pub fn compute_cuts(&mut self, aig: &Aig, node: NodeId) {
        if aig.kind_of(node) != Kind::And {
            return;
        }
        let fanins = aig.fanins(node);
        let (a, b) = (fanins[0], fanins[1]);
        self.evict_invalid(aig, a.node());
        self.evict_invalid(aig, b.node());

        let mut produced = vec![Cut::trivial(node)];
        let cuts_a = self.cuts[a.node()].clone();
        let cuts_b = self.cuts[b.node()].clone();
        for ca in &cuts_a {
            for cb in &cuts_b {
                if (ca.sig | cb.sig).count_ones() > MAX_LEAVES as u32 {
                    continue;
                }
                let merged_leaves = match merge_leaves(&ca.leaves, &cb.leaves) {
                    Some(l) => l,
                    None => continue,
                };
                let perm_a = build_perm(&ca.leaves, &merged_leaves);
                let perm_b = build_perm(&cb.leaves, &merged_leaves);
                let mut ta = truth::permute(ca.truth, &perm_a);
                let mut tb = truth::permute(cb.truth, &perm_b);
                if a.is_complement() {
                    ta = !ta;
                }
                if b.is_complement() {
                    tb = !tb;
                }
                let merged_truth = ta & tb;
                let (min_leaves, min_truth) = minimize_support(merged_leaves, merged_truth);
                produced.push(Cut::new(min_leaves, min_truth));
            }
        }
        let filtered = dominance_filter(produced);
        self.cuts[node] = evict_to_budget(filtered, aig, self.n_max);
    }

    /// Recursively computes cuts for `node`'s whole transitive fanin cone,
    /// then for `node` itself.
    pub fn compute_cuts_transitive(&mut self, aig: &Aig, node: NodeId) {
        if aig.kind_of(node) != Kind::And {
            if self.cuts[node].is_empty() {
                self.seed_terminal(node);
            }
            return;
        }
        if !self.cuts[node].is_empty() {
            return;
        }
        for fanin in aig.fanins(node) {
            self.compute_cuts_transitive(aig, fanin.node());
        }
        self.compute_cuts(aig, node);
    }

    fn evict_invalid(&mut self, aig: &Aig, node: NodeId) {
        self.cuts[node].retain(|c| c.is_valid(aig));
        if self.cuts[node].is_empty() {
            self.seed_terminal(node);
        }
    }
}

/// Drops any variable of `leaves`/`tt` that `tt` does not actually depend on,
/// shrinking both the leaf list and the table in lockstep. A cut with zero
/// leaves is a realized constant.
fn minimize_support(
    mut leaves: SmallVec<[NodeId; MAX_LEAVES]>,
    mut tt: Truth16,
) -> (SmallVec<[NodeId; MAX_LEAVES]>, Truth16) {
    let mut v = 0;
    while v < leaves.len() as u32 {
        if truth::is_dont_care(tt, v) {
            tt = truth::shrink(tt, leaves.len() as u32, v);
            leaves.remove(v as usize);
        } else {
            v += 1;
        }
    }
    (leaves, tt)
}

/// Removes cuts dominated by a smaller (subset-leaf) cut already in the set,
/// keeping the first occurrence when two cuts have identical leaf sets.
fn dominance_filter(cuts: Vec<Cut>) -> Vec<Cut> {
    let mut kept: Vec<Cut> = Vec::with_capacity(cuts.len());
    'outer: for c in cuts {
        let mut i = 0;
        while i < kept.len() {
            if kept[i].contains(&c) {
                continue 'outer;
            }
            if c.contains(&kept[i]) && kept[i] != c {
                kept.remove(i);
            } else {
                i += 1;
            }
        }
        kept.push(c);
    }
    kept
}

/// Evicts the lowest-`value` cut until at most `n_max` remain, always
/// preserving the trivial cut.
fn evict_to_budget(mut cuts: Vec<Cut>, aig: &Aig, n_max: usize) -> Vec<Cut> {
    while cuts.len() > n_max {
        let worst = cuts
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_trivial())
            .min_by_key(|(_, c)| c.value(aig))
            .map(|(i, _)| i);
        match worst {
            Some(i) => {
                cuts.remove(i);
            }
            None => break,
        }
    }
    cuts
}
