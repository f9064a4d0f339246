//! Area-flow-driven multi-input extraction ("Dam", C6): mines two-literal
//! AND/XOR divisors shared across the whole arena and greedily extracts the
//! highest-weight one as a new shared node, operating in place on C1.
//!
//! Grounded on `giaBalAig.c`'s `Dam_ManCreatePairs` (Phase B pair mining and
//! the `nRefs + 0.001*slack` weight formula, via `Levels::slack` which
//! already implements that formula verbatim) and its extraction loop
//! (`Dam_ManBalance`'s main `while` over `p->vQue`). Phase A reuses
//! `balance::collect_supergate`, the same supergate-gathering primitive the
//! balancer uses, since both components need the same "maximal associative
//! operand set" notion (spec.md §4.6 Phase A explicitly cross-references
//! §4.5's `collect_supergate`).

use crate::arena::Aig;
use crate::balance::{self, Cone};
use crate::entities::{EdgeRef, Kind, NodeId};
use crate::error::AigResult;
use crate::params::{BalanceMode, BalanceParams, DamParams};
use crate::pqueue::PriorityQueue;
use log::debug;
use std::collections::HashMap;

/// A canonical two-literal divisor key: an ordered pair of fanin literals
/// plus which associative operator they were mined under.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
struct DivKey {
    lo: u32,
    hi: u32,
    is_xor: bool,
}

impl DivKey {
    fn of(a: EdgeRef, b: EdgeRef, kind: Kind) -> DivKey {
        let (lo, hi) = if a.node() <= b.node() { (a, b) } else { (b, a) };
        DivKey {
            lo: lo.literal(),
            hi: hi.literal(),
            is_xor: kind == Kind::Xor,
        }
    }

    fn lo(&self) -> EdgeRef {
        EdgeRef::from_literal(self.lo)
    }

    fn hi(&self) -> EdgeRef {
        EdgeRef::from_literal(self.hi)
    }

    fn kind(&self) -> Kind {
        if self.is_xor {
            Kind::Xor
        } else {
            Kind::And
        }
    }
}

/// Per-divisor bookkeeping: the set of nodes whose current operand set
/// still contains both of the divisor's literals.
#[derive(Default, Clone)]
struct DivRecord {
    owners: Vec<NodeId>,
    max_reverse_level: u32,
}

/// Mutable working state for one `dam_extract` call: the live divisor table
/// (grown and shrunk as extraction proceeds) and the priority queue over it.
struct DivisorTable {
    ids: HashMap<DivKey, u32>,
    keys: Vec<DivKey>,
    records: Vec<DivRecord>,
    queue: PriorityQueue,
}

impl DivisorTable {
    fn new() -> Self {
        DivisorTable {
            ids: HashMap::new(),
            keys: Vec::new(),
            records: Vec::new(),
            queue: PriorityQueue::new(),
        }
    }

    fn id_for(&mut self, key: DivKey) -> u32 {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.keys.len() as u32;
        self.ids.insert(key, id);
        self.keys.push(key);
        self.records.push(DivRecord::default());
        id
    }

    fn existing_id(&self, key: DivKey) -> Option<u32> {
        self.ids.get(&key).copied()
    }

    fn weight(aig: &Aig, key: DivKey, record: &DivRecord) -> f64 {
        let occurrences = record.owners.len() as f64;
        let slack = aig.levels().slack(
            record.max_reverse_level,
            aig.level(key.lo().node()),
            aig.level(key.hi().node()),
            false,
        );
        occurrences + 0.001 * slack
    }

    /// Adds `owner` to the divisor `(a, b)` under `kind`'s occurrence set,
    /// updating its queued weight (or queuing it for the first time once it
    /// crosses the 2-occurrence threshold).
    fn record_pair(&mut self, aig: &Aig, owner: NodeId, a: EdgeRef, b: EdgeRef, kind: Kind) {
        let key = DivKey::of(a, b, kind);
        let id = self.id_for(key);
        let rev = aig.reverse_level(owner);
        let record = &mut self.records[id as usize];
        if !record.owners.contains(&owner) {
            record.owners.push(owner);
        }
        record.max_reverse_level = record.max_reverse_level.max(rev);
        let w = Self::weight(aig, key, record);
        if record.owners.len() >= 2 {
            self.queue.push(id, w);
        }
    }

    /// Removes `owner` from the divisor `(a, b)`'s occurrence set (called
    /// when a third literal's partner is consumed by an unrelated
    /// extraction), demoting it out of the queue if it drops below 2
    /// occurrences.
    fn forget_pair(&mut self, aig: &Aig, owner: NodeId, a: EdgeRef, b: EdgeRef, kind: Kind) {
        let key = DivKey::of(a, b, kind);
        let id = match self.existing_id(key) {
            Some(id) => id,
            None => return,
        };
        let record = &mut self.records[id as usize];
        record.owners.retain(|&o| o != owner);
        if record.owners.len() < 2 {
            self.queue.remove(id);
        } else {
            let w = Self::weight(aig, key, record);
            self.queue.set_weight(id, w);
        }
    }
}

/// An operand set under incremental construction/mutation: the associative
/// kind it was collected under, its current leaf literals, and the net
/// constant polarity contributed by cancelled XOR pairs (fixed at
/// collection time; extraction never changes a cone's function, only how
/// it shares sub-nodes).
struct OperandSet {
    kind: Kind,
    leaves: Vec<EdgeRef>,
    flip: bool,
}

fn collect_all_operand_sets(aig: &Aig) -> HashMap<NodeId, OperandSet> {
    let mut sets = HashMap::new();
    for node in aig.order().iter() {
        if aig.ref_count(node) == 0 {
            continue;
        }
        let kind = aig.kind_of(node);
        if kind != Kind::And && kind != Kind::Xor {
            continue;
        }
        if let Cone::Leaves(leaves, flip) = balance::collect_supergate(aig, node, kind, BalanceMode::Strict) {
            if leaves.len() >= 2 {
                sets.insert(node, OperandSet { kind, leaves, flip });
            }
        }
    }
    sets
}

/// Mines every two-literal divisor across `sets` and seeds the priority
/// queue with those occurring at least twice (spec.md §4.6 Phase B).
fn mine_divisors(aig: &Aig, sets: &HashMap<NodeId, OperandSet>) -> DivisorTable {
    let mut table = DivisorTable::new();
    for (&owner, set) in sets.iter() {
        for i in 0..set.leaves.len() {
            for j in (i + 1)..set.leaves.len() {
                table.record_pair(aig, owner, set.leaves[i], set.leaves[j], set.kind);
            }
        }
    }
    table
}

/// Runs `dam_extract` (C6) over `aig` in place: mines two-literal AND/XOR
/// divisors, then greedily extracts the highest-weight one as a shared
/// two-input node until the queue runs dry, no divisor has at least 2
/// occurrences, or `max_new_nodes` is reached.
pub fn dam_extract(aig: &mut Aig, max_new_nodes: usize, params: &DamParams) -> AigResult<usize> {
    let mut sets = collect_all_operand_sets(aig);
    let mut table = mine_divisors(aig, &sets);

    let mut changed_nodes: Vec<NodeId> = Vec::new();
    let mut extracted = 0usize;

    while extracted < max_new_nodes {
        let top = match table.queue.peek() {
            Some(id) => id,
            None => break,
        };
        if table.queue.peek_weight() < params.min_occurrences as f64 {
            break;
        }
        table.queue.pop();
        let key = table.keys[top as usize];
        if (table.records[top as usize].owners.len() as u32) < params.min_occurrences {
            continue;
        }
        let x = key.lo();
        let y = key.hi();
        let kind = key.kind();
        let n = match kind {
            Kind::And => aig.mk_and(x, y),
            Kind::Xor => aig.mk_xor(x, y),
            _ => unreachable!(),
        };
        extracted += 1;
        if params.verbose {
            debug!(
                "dam: extracted {:?} = {:?}({:?}, {:?}) ({} owners)",
                n,
                kind,
                x,
                y,
                table.records[top as usize].owners.len()
            );
        }

        let owners = table.records[top as usize].owners.clone();
        for owner in owners {
            let (third_literals, contains_both) = {
                let set = match sets.get(&owner) {
                    Some(s) => s,
                    None => continue,
                };
                let has_x = set.leaves.contains(&x);
                let has_y = set.leaves.contains(&y);
                if !has_x || !has_y {
                    (Vec::new(), false)
                } else {
                    let rest: Vec<EdgeRef> = set
                        .leaves
                        .iter()
                        .copied()
                        .filter(|&l| l != x && l != y)
                        .collect();
                    (rest, true)
                }
            };
            if !contains_both {
                continue;
            }
            for &w_i in &third_literals {
                table.forget_pair(aig, owner, w_i, x, sets[&owner].kind);
                table.forget_pair(aig, owner, w_i, y, sets[&owner].kind);
            }
            let set = sets.get_mut(&owner).unwrap();
            set.leaves.retain(|&l| l != x && l != y);
            set.leaves.push(n);
            for &w_i in &third_literals {
                table.record_pair(aig, owner, w_i, n, set.kind);
            }
            changed_nodes.push(owner);
        }
    }

    changed_nodes.sort();
    changed_nodes.dedup();
    let balance_params = BalanceParams {
        update_level: true,
        mode: BalanceMode::Strict,
        objective: crate::params::BalanceObjective::Balanced,
        lut_size: 6,
    };
    for node in changed_nodes {
        if aig.ref_count(node) == 0 {
            continue;
        }
        let set = match sets.get(&node) {
            Some(s) => s,
            None => continue,
        };
        let built = balance::build_balanced(aig, set.kind, set.leaves.clone(), balance_params.update_level)
            .with_complement_xor(set.flip);
        if built.node() == node {
            continue;
        }
        let _ = aig.replace(node, built);
    }
    aig.flush_bufs()?;
    aig.cleanup()?;
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_and_divisor_is_extracted_once() {
        // mk_and already structurally shares an *identical* call, so to get
        // a genuine virtual divisor the pair (a, b) must show up inside two
        // cones that never call mk_and(a, b) directly: p = (a&c)&b and
        // q = (a&d)&b each flatten, via collect_supergate, to the 3-leaf
        // cone {a, b, c} / {a, b, d}, so (a, b) is a pair mined from both
        // without either node being `a & b` itself.
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let d = aig.add_pi();
        let p = aig.mk_and(aig.mk_and(a, c), b);
        let q = aig.mk_and(aig.mk_and(a, d), b);
        aig.add_po(p);
        aig.add_po(q);
        let before = aig.and_node_count();
        let extracted = dam_extract(&mut aig, 10, &DamParams::default()).unwrap();
        assert!(extracted >= 1);
        assert!(aig.and_node_count() < before);
        assert!(aig.lookup_and(a, b).is_some());
    }

    #[test]
    fn xor_divisor_extraction_preserves_node_count_bound() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let d = aig.add_pi();
        let e = aig.add_pi();
        let ab = aig.mk_xor(a, b);
        let f1 = aig.mk_and(ab, c);
        let f2 = aig.mk_and(ab, d);
        let f3 = aig.mk_and(ab, e);
        aig.add_po(f1);
        aig.add_po(f2);
        aig.add_po(f3);
        let before = aig.and_node_count();
        dam_extract(&mut aig, 10, &DamParams::default()).unwrap();
        assert!(aig.and_node_count() <= before);
    }

    #[test]
    fn dam_extract_never_increases_node_count_on_unshared_input() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let ab = aig.mk_and(a, b);
        let abc = aig.mk_and(ab, c);
        aig.add_po(abc);
        let before = aig.and_node_count();
        dam_extract(&mut aig, 10, &DamParams::default()).unwrap();
        assert!(aig.and_node_count() <= before);
    }
}
