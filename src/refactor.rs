//! Cut-based refactoring (C4 sibling): like `rewrite`, replaces a node's
//! cone with a smaller equivalent drawn from the NPN-4 library, but favors
//! the widest available cut instead of the first gain-positive one and
//! applies a looser acceptance threshold when the caller opts into
//! don't-care-aware factoring.
//!
//! Grounded on `darRefact.c`'s `Dar_ManRefactor`: the reference computes an
//! on-the-fly ISOP over a 10..12-leaf window and factors it algebraically.
//! This module reuses the crate's existing 4-leaf cut manager (C2) and
//! NPN-4 subgraph library (C3) rather than a bespoke wide-window ISOP
//! engine — `n_leaves_max` above 4 has no effect here, a scope reduction
//! recorded in `DESIGN.md`. The MFFC/gain bookkeeping and subgraph
//! construction are otherwise identical to `rewrite`'s (§4.4), reused
//! directly rather than copied.

use crate::arena::Aig;
use crate::cuts::CutManager;
use crate::entities::{EdgeRef, Kind, NodeId};
use crate::error::AigResult;
use crate::npn;
use crate::params::RefactorParams;
use crate::rewrite::collect_mffc;
use log::debug;

/// Runs one refactoring pass over every AND node in the arena, in
/// topological order. Returns whether at least one replacement was
/// committed.
pub fn refactor(aig: &mut Aig, params: &RefactorParams) -> AigResult<bool> {
    let mut cuts = CutManager::new(8);
    let nodes: Vec<NodeId> = aig.order().iter().collect();
    let mut changed = false;

    for node in nodes {
        if aig.kind_of(node) != Kind::And || aig.ref_count(node) == 0 {
            continue;
        }
        let mffc = collect_mffc(aig, node);
        if mffc.len() < 2 {
            continue;
        }
        cuts.reset_cuts(node);
        cuts.compute_cuts_transitive(aig, node);

        // Refactor favors the widest cut it can find (closer to the
        // 10..12-leaf window the reference grows) rather than the first
        // gain-positive one; among equally wide cuts, prefer the one with
        // the better gain.
        let best = cuts
            .iter_cuts(node)
            .filter(|c| c.leaves().len() >= 2)
            .filter_map(|cut| evaluate_cut(aig, cut.leaves(), cut.truth(), &mffc))
            .max_by(|a, b| a.leaves_used.cmp(&b.leaves_used).then(a.gain.cmp(&b.gain)));

        let min_gain: i64 = if params.use_zero_cost {
            0
        } else if params.use_dont_cares {
            // An honest approximation of the "z" don't-care-aware variant:
            // without the MFFC's actual external don't-care set computed,
            // accept a one-node regression in exchange for the cut's wider
            // reach, rather than claiming full don't-care minimization.
            -1
        } else {
            1
        };

        if let Some(best) = best {
            if best.gain >= min_gain {
                if params.verbose {
                    debug!(
                        "refactor: {:?} gain={} mffc={} leaves={}",
                        node,
                        best.gain,
                        mffc.len(),
                        best.leaves_used
                    );
                }
                let new_edge = npn::build(&best.subgraph, &best.leaves, |a, b| aig.mk_and(a, b));
                let new_edge = new_edge.with_complement_xor(best.out_neg);
                if aig.replace(node, new_edge).is_ok() {
                    aig.flush_bufs()?;
                    changed = true;
                    cuts = CutManager::new(8);
                }
            }
        }
    }
    aig.cleanup()?;
    Ok(changed)
}

struct Candidate {
    subgraph: npn::Subgraph,
    leaves: [EdgeRef; 4],
    out_neg: bool,
    gain: i64,
    leaves_used: usize,
}

fn evaluate_cut(
    aig: &Aig,
    leaves: &[NodeId],
    truth: crate::truth::Truth16,
    mffc: &std::collections::HashSet<NodeId>,
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

    let mffc_size = mffc.len() as i64;
    npn::subgraphs_for_class(class, 4)
        .iter()
        .filter_map(|sg| {
            let mut virt = 1u32 << 28;
            let new_count = npn::count_new_nodes(sg, &leaf_edges, |lo, hi| {
                probe(aig, mffc, &mut virt, lo, hi)
            })
            .1;
            Some(Candidate {
                subgraph: sg.clone(),
                leaves: leaf_edges,
                out_neg,
                gain: mffc_size - new_count as i64,
                leaves_used: leaves.len(),
            })
        })
        .max_by(|a, b| a.gain.cmp(&b.gain))
}

fn probe(
    aig: &Aig,
    mffc: &std::collections::HashSet<NodeId>,
    virt: &mut u32,
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
        Some(id) if mffc.contains(&id) => {
            let fresh = fresh_id(virt);
            (EdgeRef::positive(fresh), true)
        }
        Some(id) => (EdgeRef::positive(id), false),
        None => {
            let fresh = fresh_id(virt);
            (EdgeRef::positive(fresh), true)
        }
    }
}

fn fresh_id(virt: &mut u32) -> NodeId {
    use cranelift_entity::EntityRef;
    let id = NodeId::new(*virt as usize);
    *virt += 1;
    id
}
