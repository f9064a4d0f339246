//! DAG-aware rewriting (C4): for every AND node, enumerate its 4-feasible
//! cuts (C2), match each against the NPN-4 library (C3), and commit the
//! best gain-positive replacement found via `Aig::replace`.

use crate::arena::Aig;
use crate::cuts::CutManager;
use crate::entities::{EdgeRef, Kind, NodeId};
use crate::error::AigResult;
use crate::npn::{self, Subgraph};
use crate::params::RewriteParams;
use cranelift_entity::EntityRef;
use log::debug;
use std::collections::HashSet;

/// Runs one rewriting pass over every AND node in the arena, in topological
/// order. Returns whether at least one replacement was committed.
pub fn rewrite(aig: &mut Aig, params: &RewriteParams) -> AigResult<bool> {
    let mut cuts = CutManager::new(params.n_cuts_max as usize);
    let nodes: Vec<NodeId> = aig.order().iter().collect();
    let mffc_threshold = if params.use_zero_cost { 1 } else { 2 };
    let mut changed = false;

    for node in nodes {
        if aig.kind_of(node) != Kind::And || aig.ref_count(node) == 0 {
            continue;
        }
        let mffc = collect_mffc(aig, node);
        if mffc.len() < mffc_threshold {
            continue;
        }
        if !params.recycle_cuts {
            cuts.reset_cuts(node);
        }
        cuts.compute_cuts_transitive(aig, node);

        let required_level = aig.depth().saturating_sub(aig.reverse_level(node));
        let best = cuts
            .iter_cuts(node)
            .filter(|c| c.leaves().len() >= 2)
            .filter_map(|cut| {
                evaluate_cut(aig, cut.leaves(), cut.truth(), &mffc, required_level, params)
            })
            .max_by(|a, b| {
                a.gain
                    .cmp(&b.gain)
                    .then(b.level.cmp(&a.level))
            });

        let min_gain: i64 = if params.use_zero_cost { 0 } else { 1 };
        if let Some(best) = best {
            if best.gain >= min_gain {
                if params.verbose {
                    debug!(
                        "rewrite: {:?} gain={} mffc={} new_level={}",
                        node,
                        best.gain,
                        mffc.len(),
                        best.level
                    );
                }
                let new_edge = npn::build(&best.subgraph, &best.leaves, |a, b| aig.mk_and(a, b));
                let new_edge = new_edge.with_complement_xor(best.out_neg);
                if aig.replace(node, new_edge).is_ok() {
                    aig.flush_bufs()?;
                    changed = true;
                    cuts = CutManager::new(params.n_cuts_max as usize);
                }
            }
        }
    }
    aig.cleanup()?;
    Ok(changed)
}

struct Candidate {
    subgraph: Subgraph,
    leaves: [EdgeRef; 4],
    out_neg: bool,
    gain: i64,
    level: u32,
}

fn evaluate_cut(
    aig: &Aig,
    leaves: &[NodeId],
    truth: crate::truth::Truth16,
    mffc: &HashSet<NodeId>,
    required_level: u32,
    params: &RewriteParams,
) -> Option<Candidate> {
    let (class, perm, phase, out_neg) = npn::lib_match(truth);
    let mut leaf_edges = [EdgeRef::const1(); 4];
    for v in 0..4usize {
        let src = perm[v] as usize;
        if let Some(&leaf) = leaves.get(src) {
            let compl = (phase >> src) & 1 != 0;
            leaf_edges[v] = EdgeRef::new(leaf, compl);
        }
    }
    let leaf_levels: [u32; 4] = {
        let mut l = [0u32; 4];
        for v in 0..4 {
            l[v] = aig.level(leaf_edges[v].node());
        }
        l
    };

    let variants = npn::subgraphs_for_class(class, params.n_subgraphs_max as usize);
    let mffc_size = mffc.len() as i64;
    variants
        .iter()
        .filter_map(|sg| {
            let level = subgraph_level(sg, &leaf_levels);
            if level > required_level {
                return None;
            }
            let mut virt = VirtualIds::new();
            let (_root, new_count) =
                npn::count_new_nodes(sg, &leaf_edges, |lo, hi| probe(aig, mffc, &mut virt, lo, hi));
            let gain = mffc_size - new_count as i64;
            Some(Candidate {
                subgraph: sg.clone(),
                leaves: leaf_edges,
                out_neg,
                gain,
                level,
            })
        })
        .max_by(|a, b| a.gain.cmp(&b.gain).then(b.level.cmp(&a.level)))
}

fn subgraph_level(sg: &Subgraph, leaf_levels: &[u32; 4]) -> u32 {
    let mut levels: Vec<u32> = Vec::with_capacity(sg.nodes.len());
    let node_level = |lit: u16, levels: &[u32]| -> u32 {
        let id = (lit >> 1) as usize;
        if id < 4 {
            leaf_levels[id]
        } else {
            levels[id - 4]
        }
    };
    for node in &sg.nodes {
        let l0 = node_level(node.fanin0, &levels);
        let l1 = node_level(node.fanin1, &levels);
        levels.push(1 + l0.max(l1));
    }
    node_level(sg.root, &levels)
}

/// Generates ids guaranteed not to collide with any real arena node, used as
/// placeholders for subgraph nodes that `Evaluate` determines do not yet
/// exist (so a later reference to the same not-yet-built node inside the
/// same subgraph still resolves consistently).
struct VirtualIds {
    next: u32,
}

impl VirtualIds {
    fn new() -> Self {
        VirtualIds { next: 1 << 28 }
    }

    fn fresh(&mut self) -> NodeId {
        let id = NodeId::new(self.next as usize);
        self.next += 1;
        id
    }
}

fn probe(
    aig: &Aig,
    mffc: &HashSet<NodeId>,
    virt: &mut VirtualIds,
    lo: EdgeRef,
    hi: EdgeRef,
) -> (EdgeRef, bool) {
    if lo.is_const0() || hi.is_const0() {
        return (EdgeRef::const0(), false);
    }
    if lo.is_const1() {
        return (hi, false);
    }
    if hi.is_const1() {
        return (lo, false);
    }
    if lo == hi {
        return (lo, false);
    }
    if lo.node() == hi.node() {
        return (EdgeRef::const0(), false);
    }
    match aig.lookup_and(lo, hi) {
        // Exists, but is itself part of the cone being torn down: still
        // counts as new, per spec.md §4.3 Evaluate.
        Some(id) if mffc.contains(&id) => (EdgeRef::positive(virt.fresh()), true),
        Some(id) => (EdgeRef::positive(id), false),
        None => (EdgeRef::positive(virt.fresh()), true),
    }
}

/// Computes the Maximum Fanout-Free Cone of `root`: the set of nodes whose
/// only path to a primary output runs through `root`, found by pretending
/// the single edge about to be severed is `root`'s only reference and
/// cascading the resulting zero-refcount nodes down through their fanins.
/// Read-only: does not touch the arena's real refcounts.
pub(crate) fn collect_mffc(aig: &Aig, root: NodeId) -> HashSet<NodeId> {
    let mut shadow_refs: std::collections::HashMap<NodeId, u32> = std::collections::HashMap::new();
    let mut mffc = HashSet::new();
    let mut stack = vec![root];
    shadow_refs.insert(root, 1);
    while let Some(node) = stack.pop() {
        let r = shadow_refs.entry(node).or_insert_with(|| aig.ref_count(node));
        *r -= 1;
        if *r == 0 && matches!(aig.kind_of(node), Kind::And | Kind::Xor | Kind::Mux) {
            mffc.insert(node);
            for fanin in aig.fanins(node) {
                stack.push(fanin.node());
            }
        }
    }
    mffc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Aig;

    #[test]
    fn rewrite_never_increases_node_count() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let d = aig.add_pi();
        // f = a.b + c.d, built the "wasteful" way: three ANDs plus inverters
        // standing in for the OR, i.e. 5 internal AIG nodes for a function
        // the library should be able to realize in fewer.
        let ab = aig.mk_and(a, b);
        let cd = aig.mk_and(c, d);
        let f = aig.mk_and(ab.invert(), cd.invert()).invert();
        aig.add_po(f);
        let before = aig.and_node_count();
        let params = RewriteParams::default();
        rewrite(&mut aig, &params).unwrap();
        assert!(aig.and_node_count() <= before);
    }

    #[test]
    fn rewrite_preserves_primary_output_function_on_and_chain() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let ab = aig.mk_and(a, b);
        let abc = aig.mk_and(ab, c);
        aig.add_po(abc);
        let params = RewriteParams::default();
        rewrite(&mut aig, &params).unwrap();
        // 2-level AND chain has no smaller NPN-class realization; rewrite
        // should leave it alone (no illegal growth, no spurious changes).
        assert_eq!(aig.and_node_count(), 2);
    }

    #[test]
    fn mffc_of_a_sole_consumer_counts_its_whole_cone() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let ab = aig.mk_and(a, b);
        let abc = aig.mk_and(ab, c);
        aig.add_po(abc);
        let mffc = collect_mffc(&aig, abc.node());
        assert_eq!(mffc.len(), 2);
    }

    #[test]
    fn mffc_excludes_a_node_with_an_outside_fanout() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let ab = aig.mk_and(a, b);
        let abc = aig.mk_and(ab, c);
        aig.add_po(abc);
        aig.add_po(ab); // ab now has an external consumer too
        let mffc = collect_mffc(&aig, abc.node());
        assert_eq!(mffc.len(), 1);
        assert!(!mffc.contains(&ab.node()));
    }
}
