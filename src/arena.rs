//! The AIG arena and structural hash.
//!
//! `Aig` owns every node ever allocated during a synthesis session; all of
//! the other components borrow it, none of them own a node outright.

use crate::entities::{EdgeRef, Kind, NodeId};
use crate::error::{AigError, AigResult};
use crate::hash::{StructHash, StructKey};
use crate::levels::Levels;
use crate::order::Order;
use cranelift_entity::{EntityRef, PrimaryMap, SecondaryMap};
use log::{debug, trace};
use std::collections::HashSet;

/// A single arena-resident node.
#[derive(Clone, Copy, Debug)]
struct Node {
    kind: Kind,
    fanin0: EdgeRef,
    fanin1: EdgeRef,
    /// Third fanin, used only by `Mux` (the `else` branch).
    fanin2: EdgeRef,
    refcount: u32,
    /// Value of the node under the all-primary-inputs-zero assignment, used
    /// by the rewriter to align a cut's truth table with the library's
    /// canonical phase.
    phase: bool,
    /// Opaque per-algorithm scratch slot; only one component may be using
    /// it at a time (e.g. the NPN matcher's traversal mark, or the
    /// balancer's supergate-membership mark).
    aux: u32,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            kind: Kind::Const1,
            fanin0: EdgeRef::const0(),
            fanin1: EdgeRef::const0(),
            fanin2: EdgeRef::const0(),
            refcount: 0,
            phase: false,
            aux: 0,
        }
    }
}

/// The AIG arena: nodes, structural hash, visitation order, and level
/// bookkeeping, all owned together because every public operation touches
/// more than one of them.
pub struct Aig {
    nodes: PrimaryMap<NodeId, Node>,
    hash: StructHash,
    order: Order,
    levels: Levels,
    fanouts: SecondaryMap<NodeId, Vec<NodeId>>,
    primary_outputs: Vec<EdgeRef>,
    pending_bufs: Vec<NodeId>,
    register_count: usize,
    primary_inputs: Vec<NodeId>,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    /// Creates a fresh arena containing only the constant-one node.
    pub fn new() -> Self {
        let mut nodes = PrimaryMap::new();
        nodes.push(Node {
            kind: Kind::Const1,
            phase: true,
            ..Node::default()
        });
        let mut order = Order::new();
        order.push_back(NodeId::CONST1);
        let mut levels = Levels::new();
        levels.set_terminal(NodeId::CONST1);
        Aig {
            nodes,
            hash: StructHash::new(),
            order,
            levels,
            fanouts: SecondaryMap::new(),
            primary_outputs: Vec::new(),
            pending_bufs: Vec::new(),
            register_count: 0,
            primary_inputs: Vec::new(),
        }
    }

    /// The constant-one edge.
    pub fn const_one(&self) -> EdgeRef {
        EdgeRef::const1()
    }

    /// Number of live nodes in the arena, including terminals.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of internal And/Xor/Mux nodes (the quantity rewrite/dam/
    /// fast_extract are scored against).
    pub fn and_node_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n.kind, Kind::And | Kind::Xor | Kind::Mux) && n.refcount > 0)
            .count()
    }

    /// The network's current depth.
    pub fn depth(&self) -> u32 {
        self.levels.max_level()
    }

    /// The primary inputs, in creation order.
    pub fn primary_inputs(&self) -> &[NodeId] {
        &self.primary_inputs
    }

    /// The primary output driver edges, in creation order.
    pub fn primary_outputs(&self) -> &[EdgeRef] {
        &self.primary_outputs
    }

    fn kind(&self, id: NodeId) -> Kind {
        self.nodes[id].kind
    }

    /// The kind of node at `id`, for readers outside this module (cut
    /// enumeration, the balancer's supergate collection) that need to
    /// distinguish terminals from And/Xor/Mux without duplicating the
    /// arena's internal `Node` layout.
    pub fn kind_of(&self, id: NodeId) -> Kind {
        self.nodes[id].kind
    }

    fn refcount(&self, id: NodeId) -> u32 {
        self.nodes[id].refcount
    }

    /// Structural fanout count of `id`.
    pub fn ref_count(&self, id: NodeId) -> u32 {
        self.refcount(id)
    }

    /// Forward level of `id`.
    pub fn level(&self, id: NodeId) -> u32 {
        self.levels.level(id)
    }

    /// Reverse level of `id` (distance to the nearest PO).
    pub fn reverse_level(&self, id: NodeId) -> u32 {
        self.levels.reverse_level(id)
    }

    /// Read access to the incremental level tracker, used by components
    /// (the rewriter, the balancer, Dam) that need slack computations.
    pub fn levels(&self) -> &Levels {
        &self.levels
    }

    /// Recomputes reverse levels for every node from scratch: every primary
    /// output driver starts at 0, then each node in reverse topological
    /// order bumps its fanins per spec.md §4.4's "reverse_level(node) =
    /// longest path from node to any PO". One pass suffices because `order`
    /// is topological (a node's fanouts all appear later), so by the time a
    /// node is visited in reverse every fanout that could bump it already
    /// has its own final reverse level.
    ///
    /// Called after every structural change that can move a PO or alter
    /// fanin sets (`add_po`, `cleanup`) rather than maintained via a true
    /// incremental delta list; correct, if more conservative than spec.md's
    /// suggested incremental scheme.
    pub fn recompute_reverse_levels(&mut self) {
        self.levels.reset_reverse();
        for po in &self.primary_outputs {
            self.levels.set_po(po.node());
        }
        let order: Vec<NodeId> = self.order.iter().collect();
        for &node in order.iter().rev() {
            let rev = self.levels.reverse_level(node);
            for fanin in self.fanins(node) {
                self.levels.bump_reverse(fanin.node(), rev);
            }
        }
    }

    /// Read access to the node visitation order.
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// The per-algorithm scratch slot attached to `id`.
    pub fn aux(&self, id: NodeId) -> u32 {
        self.nodes[id].aux
    }

    /// Overwrites the scratch slot attached to `id`.
    pub fn set_aux(&mut self, id: NodeId, value: u32) {
        self.nodes[id].aux = value;
    }

    /// Fanin edges of `id`. Returns fewer than 2 entries for terminals, and
    /// 3 for a `Mux`.
    pub fn fanins(&self, id: NodeId) -> Vec<EdgeRef> {
        match self.kind(id) {
            Kind::Const1 | Kind::PrimaryInput => Vec::new(),
            Kind::PrimaryOutput | Kind::Buf => vec![self.nodes[id].fanin0],
            Kind::And | Kind::Xor => vec![self.nodes[id].fanin0, self.nodes[id].fanin1],
            Kind::Mux => vec![
                self.nodes[id].fanin0,
                self.nodes[id].fanin1,
                self.nodes[id].fanin2,
            ],
        }
    }

    /// Structural parents of `id`, i.e. nodes whose fanin(s) reference `id`.
    pub fn fanouts(&self, id: NodeId) -> &[NodeId] {
        &self.fanouts[id]
    }

    fn add_fanout(&mut self, child: NodeId, parent: NodeId) {
        self.fanouts[child].push(parent);
    }

    fn remove_fanout(&mut self, child: NodeId, parent: NodeId) {
        if let Some(pos) = self.fanouts[child].iter().position(|&p| p == parent) {
            self.fanouts[child].swap_remove(pos);
        }
    }

    fn bump_ref(&mut self, id: NodeId) {
        self.nodes[id].refcount += 1;
    }

    fn drop_ref(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id].refcount > 0);
        self.nodes[id].refcount -= 1;
    }

    fn phase_of(&self, edge: EdgeRef) -> bool {
        self.nodes[edge.node()].phase ^ edge.is_complement()
    }

    /// Resolves `edge` through any chain of `Buf` relays, XORing
    /// complementation along the way.
    pub fn resolve(&self, edge: EdgeRef) -> EdgeRef {
        let mut e = edge;
        while self.kind(e.node()) == Kind::Buf {
            let inner = self.nodes[e.node()].fanin0;
            e = inner.with_complement_xor(e.is_complement());
        }
        e
    }

    fn struct_key(kind: Kind, f0: EdgeRef, f1: EdgeRef, f2: EdgeRef) -> Option<StructKey> {
        match kind {
            Kind::And => Some(StructKey::binary(0, f0.literal(), f1.literal())),
            Kind::Xor => Some(StructKey::binary(1, f0.literal(), f1.literal())),
            Kind::Mux => Some(StructKey::ternary(f0.literal(), f1.literal(), f2.literal())),
            _ => None,
        }
    }

    fn alloc_node(&mut self, kind: Kind, f0: EdgeRef, f1: EdgeRef, f2: EdgeRef) -> NodeId {
        let phase = match kind {
            Kind::And => self.phase_of(f0) && self.phase_of(f1),
            Kind::Xor => self.phase_of(f0) ^ self.phase_of(f1),
            Kind::Mux => {
                if self.phase_of(f0) {
                    self.phase_of(f1)
                } else {
                    self.phase_of(f2)
                }
            }
            _ => false,
        };
        let id = self.nodes.push(Node {
            kind,
            fanin0: f0,
            fanin1: f1,
            fanin2: f2,
            refcount: 0,
            phase,
            aux: 0,
        });
        self.order.push_back(id);
        for fanin in self.fanins(id) {
            let child = fanin.node();
            self.add_fanout(child, id);
            self.bump_ref(child);
        }
        let fanin_levels: Vec<u32> = self.fanins(id).iter().map(|e| self.level(e.node())).collect();
        self.levels.set_from_fanins(id, &fanin_levels, kind == Kind::Buf);
        if let Some(key) = Self::struct_key(kind, f0, f1, f2) {
            self.hash.insert(key, id);
        }
        trace!("alloc {:?} {:?} level={}", id, kind, self.level(id));
        id
    }

    /// Adds a fresh primary input terminal.
    pub fn create_pi(&mut self) -> EdgeRef {
        let id = self.nodes.push(Node {
            kind: Kind::PrimaryInput,
            phase: false,
            ..Node::default()
        });
        self.order.push_back(id);
        self.levels.set_terminal(id);
        self.primary_inputs.push(id);
        EdgeRef::positive(id)
    }

    /// Alias for `create_pi`, matching this crate's public naming.
    pub fn add_pi(&mut self) -> EdgeRef {
        self.create_pi()
    }

    /// Registers `driver` as a new primary output.
    pub fn add_po(&mut self, driver: EdgeRef) {
        self.bump_ref(driver.node());
        self.levels.set_po(driver.node());
        self.primary_outputs.push(driver);
        self.recompute_reverse_levels();
    }

    /// Sets the number of registers (sequential elements) that pass through
    /// this core unchanged. The core does not interpret this value; it is
    /// bookkeeping for the caller's own I/O layer.
    pub fn set_register_count(&mut self, n: usize) {
        self.register_count = n;
    }

    /// The register count set via `set_register_count`.
    pub fn register_count(&self) -> usize {
        self.register_count
    }

    /// Read-only counterpart of `mk_and`'s hash lookup: reports the existing
    /// node for `AND(a, b)` if one is already in the structural hash, without
    /// allocating. `a`/`b` are assumed already canonicalized (resolved,
    /// `a.node() <= b.node()`, no absorption case); used by the rewriter's
    /// `Evaluate` step to count new-vs-shared nodes before committing.
    pub fn lookup_and(&self, a: EdgeRef, b: EdgeRef) -> Option<NodeId> {
        self.hash.get(StructKey::binary(0, a.literal(), b.literal()))
    }

    /// Read-only counterpart of `mk_xor`'s hash lookup, used by the
    /// balancer's sharing heuristic to prefer a pairing that already exists
    /// in the structural hash over one that doesn't. `a`/`b` are assumed
    /// already resolved and non-complemented (XOR's canonical fanin shape).
    pub fn lookup_xor(&self, a: EdgeRef, b: EdgeRef) -> Option<NodeId> {
        let a0 = EdgeRef::positive(a.node());
        let b0 = EdgeRef::positive(b.node());
        let (lo, hi) = if a0.node() < b0.node() {
            (a0, b0)
        } else {
            (b0, a0)
        };
        self.hash.get(StructKey::binary(1, lo.literal(), hi.literal()))
    }

    /// Builds (or looks up) the AND of `a` and `b`, applying absorption and
    /// canonical fanin ordering.
    pub fn mk_and(&mut self, a: EdgeRef, b: EdgeRef) -> EdgeRef {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a.is_const0() || b.is_const0() {
            return EdgeRef::const0();
        }
        if a.is_const1() {
            return b;
        }
        if b.is_const1() {
            return a;
        }
        if a == b {
            return a;
        }
        if a.node() == b.node() {
            // a and !a (order doesn't matter: exactly one of a,b is complemented)
            return EdgeRef::const0();
        }
        let (lo, hi) = if a.node() < b.node() { (a, b) } else { (b, a) };
        if let Some(existing) = self
            .hash
            .get(StructKey::binary(0, lo.literal(), hi.literal()))
        {
            return EdgeRef::positive(existing);
        }
        let id = self.alloc_node(Kind::And, lo, hi, EdgeRef::const0());
        EdgeRef::positive(id)
    }

    /// Builds (or looks up) the XOR of `a` and `b`. Stored fanins are always
    /// non-complemented; the output edge carries the net polarity.
    pub fn mk_xor(&mut self, a: EdgeRef, b: EdgeRef) -> EdgeRef {
        let a = self.resolve(a);
        let b = self.resolve(b);
        let net_compl = a.is_complement() ^ b.is_complement();
        let a0 = EdgeRef::positive(a.node());
        let b0 = EdgeRef::positive(b.node());
        if a0.node() == b0.node() {
            return if net_compl {
                EdgeRef::const1()
            } else {
                EdgeRef::const0()
            };
        }
        if a0.is_const0() {
            return b.with_complement_xor(net_compl ^ b.is_complement());
        }
        if b0.is_const0() {
            return a.with_complement_xor(net_compl ^ a.is_complement());
        }
        let (lo, hi) = if a0.node() < b0.node() {
            (a0, b0)
        } else {
            (b0, a0)
        };
        let result = if let Some(existing) = self
            .hash
            .get(StructKey::binary(1, lo.literal(), hi.literal()))
        {
            EdgeRef::positive(existing)
        } else {
            let id = self.alloc_node(Kind::Xor, lo, hi, EdgeRef::const0());
            EdgeRef::positive(id)
        };
        result.with_complement_xor(net_compl)
    }

    /// Builds (or looks up) the multiplexer `cond ? then : els`.
    /// Canonicalizes a complemented condition by swapping the two data
    /// inputs instead (`mux(!c,t,e) == mux(c,e,t)`).
    pub fn mk_mux(&mut self, cond: EdgeRef, then: EdgeRef, els: EdgeRef) -> EdgeRef {
        let cond = self.resolve(cond);
        let then = self.resolve(then);
        let els = self.resolve(els);
        if cond.is_const1() {
            return then;
        }
        if cond.is_const0() {
            return els;
        }
        if then == els {
            return then;
        }
        let (cond, then, els) = if cond.is_complement() {
            (cond.invert(), els, then)
        } else {
            (cond, then, els)
        };
        if then.is_const1() && els.is_const0() {
            return cond;
        }
        if then.is_const0() && els.is_const1() {
            return cond.invert();
        }
        if let Some(existing) = self.hash.get(StructKey::ternary(
            cond.literal(),
            then.literal(),
            els.literal(),
        )) {
            return EdgeRef::positive(existing);
        }
        let id = self.alloc_node(Kind::Mux, cond, then, els);
        EdgeRef::positive(id)
    }

    /// Expresses `mux(c,t,e)` as two ANDs and an OR-via-De-Morgan, i.e.
    /// `!( !(c&t) & !(!c&e) )`, for library subgraphs that decompose a MUX
    /// rather than use the native ternary node.
    pub fn mk_mux_decomposed(&mut self, cond: EdgeRef, then: EdgeRef, els: EdgeRef) -> EdgeRef {
        let ct = self.mk_and(cond, then);
        let ce = self.mk_and(cond.invert(), els);
        self.mk_and(ct.invert(), ce.invert()).invert()
    }

    fn reaches(&self, from: NodeId, target: NodeId, seen: &mut HashSet<NodeId>) -> bool {
        if from == target {
            return true;
        }
        if !seen.insert(from) {
            return false;
        }
        self.fanins(from)
            .iter()
            .any(|e| self.reaches(e.node(), target, seen))
    }

    /// Redirects every fanout of `old` to `new_edge`, via a transparent
    /// `Buf` relay. The actual fanout rewiring and any
    /// cascading replacements happen lazily in
    /// `flush_bufs`, which every pass must call before returning.
    pub fn replace(&mut self, old: NodeId, new_edge: EdgeRef) -> AigResult<()> {
        let new_edge = self.resolve(new_edge);
        let mut seen = HashSet::new();
        if self.reaches(new_edge.node(), old, &mut seen) {
            return Err(AigError::CycleDetected);
        }
        let old_fanins = self.fanins(old);
        if let Some(key) = Self::struct_key(
            self.kind(old),
            self.nodes[old].fanin0,
            self.nodes[old].fanin1,
            self.nodes[old].fanin2,
        ) {
            self.hash.remove(key);
        }
        // `old` is about to become a `Buf` pointing only at `new_edge`; it no
        // longer references its pre-replace fanins, so their fanout entries
        // and refcounts must be released now, exactly as `cleanup` releases
        // a genuinely dead node's fanins.
        for fanin in old_fanins {
            self.remove_fanout(fanin.node(), old);
            self.drop_ref(fanin.node());
        }
        self.bump_ref(new_edge.node());
        let node = &mut self.nodes[old];
        node.kind = Kind::Buf;
        node.fanin0 = new_edge;
        node.fanin1 = EdgeRef::const0();
        node.fanin2 = EdgeRef::const0();
        self.pending_bufs.push(old);
        Ok(())
    }

    /// Rebuilds a node of the given kind with `old_child` substituted by
    /// `new_child` wherever it appears among its fanins, via the canonical
    /// constructor for that kind (so absorption/canonicalization apply).
    fn rebuild_with_substitution(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
        new_child: EdgeRef,
    ) -> EdgeRef {
        let substitute = |e: EdgeRef, old_child: NodeId, new_child: EdgeRef| -> EdgeRef {
            if e.node() == old_child {
                new_child.with_complement_xor(e.is_complement())
            } else {
                e
            }
        };
        match self.kind(parent) {
            Kind::And => {
                let f0 = substitute(self.nodes[parent].fanin0, old_child, new_child);
                let f1 = substitute(self.nodes[parent].fanin1, old_child, new_child);
                self.mk_and(f0, f1)
            }
            Kind::Xor => {
                let f0 = substitute(self.nodes[parent].fanin0, old_child, new_child);
                let f1 = substitute(self.nodes[parent].fanin1, old_child, new_child);
                self.mk_xor(f0, f1)
            }
            Kind::Mux => {
                let f0 = substitute(self.nodes[parent].fanin0, old_child, new_child);
                let f1 = substitute(self.nodes[parent].fanin1, old_child, new_child);
                let f2 = substitute(self.nodes[parent].fanin2, old_child, new_child);
                self.mk_mux(f0, f1, f2)
            }
            Kind::Buf => substitute(self.nodes[parent].fanin0, old_child, new_child),
            Kind::PrimaryOutput | Kind::Const1 | Kind::PrimaryInput => {
                EdgeRef::positive(parent)
            }
        }
    }

    /// Drains the pending `Buf` worklist, cascading a fanout's own
    /// replacement onward whenever rebuilding it around the new edge
    /// collapses it into an already-existing node. Must be called by every
    /// pass before it returns control.
    pub fn flush_bufs(&mut self) -> AigResult<()> {
        while let Some(buf_id) = self.pending_bufs.pop() {
            let target = self.resolve(EdgeRef::positive(buf_id));
            let parents = std::mem::take(&mut self.fanouts[buf_id]);
            for parent in parents {
                if self.refcount(parent) == 0 && parent != buf_id {
                    // Parent was already cleaned up or replaced in this batch.
                    continue;
                }
                self.remove_fanout(buf_id, parent);
                self.drop_ref(buf_id);
                let new_edge = self.rebuild_with_substitution(parent, buf_id, target);
                self.add_fanout(new_edge.node(), parent);
                self.bump_ref(new_edge.node());
                if new_edge.node() != parent {
                    self.drop_ref(new_edge.node());
                    self.replace(parent, new_edge)?;
                }
            }
            for po in self.primary_outputs.iter_mut() {
                if po.node() == buf_id {
                    self.drop_ref(buf_id);
                    *po = EdgeRef::new(target.node(), po.is_complement() ^ target.is_complement());
                    self.bump_ref(target.node());
                }
            }
        }
        Ok(())
    }

    /// Removes nodes with zero refcount in reverse topological order,
    /// flushing any pending `Buf` relays first. Returns the number of nodes
    /// removed.
    pub fn cleanup(&mut self) -> AigResult<usize> {
        self.flush_bufs()?;
        let order: Vec<NodeId> = self.order.iter().collect();
        let mut removed = 0;
        for &id in order.iter().rev() {
            if matches!(self.kind(id), Kind::Const1 | Kind::PrimaryInput | Kind::PrimaryOutput) {
                continue;
            }
            if self.refcount(id) == 0 {
                for fanin in self.fanins(id) {
                    self.remove_fanout(fanin.node(), id);
                    self.drop_ref(fanin.node());
                }
                self.order.remove(id);
                removed += 1;
                debug_assert_ne!(self.kind(id), Kind::Buf, "Buf node survived cleanup");
            }
        }
        self.recompute_reverse_levels();
        debug!("cleanup removed {} dead nodes", removed);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_absorption() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        assert_eq!(aig.mk_and(a, EdgeRef::const0()), EdgeRef::const0());
        assert_eq!(aig.mk_and(a, EdgeRef::const1()), a);
        assert_eq!(aig.mk_and(a, a), a);
        assert_eq!(aig.mk_and(a, a.invert()), EdgeRef::const0());
    }

    #[test]
    fn xor_absorption_and_complement_lifting() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        assert_eq!(aig.mk_xor(a, a), EdgeRef::const0());
        assert_eq!(aig.mk_xor(a, a.invert()), EdgeRef::const1());
        assert_eq!(aig.mk_xor(a, EdgeRef::const0()), a);
        assert_eq!(aig.mk_xor(a, EdgeRef::const1()), a.invert());
        let xab = aig.mk_xor(a, b);
        let xnab = aig.mk_xor(a.invert(), b);
        assert_eq!(xnab, xab.invert());
    }

    #[test]
    fn structural_hash_deduplicates() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let e1 = aig.mk_and(a, b);
        let e2 = aig.mk_and(a, b);
        assert_eq!(e1, e2);
        assert_eq!(aig.and_node_count(), 1);
        let e3 = aig.mk_and(b, a);
        assert_eq!(e1, e3);
    }

    #[test]
    fn and_chain_has_depth_three() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let c = aig.add_pi();
        let d = aig.add_pi();
        let ab = aig.mk_and(a, b);
        let abc = aig.mk_and(ab, c);
        let abcd = aig.mk_and(abc, d);
        aig.add_po(abcd);
        assert_eq!(aig.depth(), 3);
        assert_eq!(aig.and_node_count(), 3);
    }

    #[test]
    fn replace_redirects_fanouts_and_cleans_up() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let ab = aig.mk_and(a, b);
        let c = aig.add_pi();
        let root = aig.mk_and(ab, c);
        aig.add_po(root);
        // Replace `ab` with `a` directly (pretend we proved b is redundant).
        aig.replace(ab.node(), a).unwrap();
        aig.flush_bufs().unwrap();
        let removed = aig.cleanup().unwrap();
        assert!(removed >= 1);
        assert_eq!(aig.primary_outputs()[0], aig.mk_and(a, c));
    }

    #[test]
    fn replace_rejects_self_cycle() {
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let ab = aig.mk_and(a, b);
        let err = aig.replace(a.node(), ab).unwrap_err();
        assert_eq!(err, AigError::CycleDetected);
    }

    #[test]
    fn mux_canonicalizes_complemented_condition() {
        let mut aig = Aig::new();
        let c = aig.add_pi();
        let t = aig.add_pi();
        let e = aig.add_pi();
        let m1 = aig.mk_mux(c, t, e);
        let m2 = aig.mk_mux(c.invert(), e, t);
        assert_eq!(m1, m2);
    }

    #[test]
    fn two_pi_and_node_has_single_two_leaf_cut_shape() {
        // Exercises the degenerate two-leaf fanin shape a cut enumerator has to handle.
        let mut aig = Aig::new();
        let a = aig.add_pi();
        let b = aig.add_pi();
        let ab = aig.mk_and(a, b);
        assert_eq!(aig.fanins(ab.node()).len(), 2);
        assert_eq!(aig.level(ab.node()), 1);
    }
}
