//! §8.1 property tests: structural-hash injectivity and functional
//! equivalence are checked against randomly generated small networks rather
//! than a fixed handful of examples, the way `lightbeam`'s
//! `tests/quickchecks.rs` checks its translation against randomized
//! operands instead of a table of cases.

use aigrw::{balance, rewrite, Aig, BalanceParams, EdgeRef, Kind, NodeId, RewriteParams};
use quickcheck::quickcheck;
use std::collections::HashMap;

/// Builds a small, deterministic AND/XOR network over 4 primary inputs from
/// a seed: every seed produces the same network on every call, so the same
/// seed fed to two freshly built arenas yields two structurally identical
/// (but separately allocated) networks to compare a pass's output against.
fn build_formula(aig: &mut Aig, pis: &[EdgeRef], seed: u32) -> EdgeRef {
    let mut pool: Vec<EdgeRef> = pis.to_vec();
    let mut bits = seed | 1;
    for _ in 0..6 {
        let i = (bits as usize) % pool.len();
        bits = bits.wrapping_mul(2654435761).rotate_left(7);
        let j = (bits as usize) % pool.len();
        bits = bits.wrapping_mul(2654435761).rotate_left(11);
        let neg_i = bits & 1 != 0;
        let neg_j = bits & 2 != 0;
        let use_xor = bits & 4 != 0;
        bits = bits.wrapping_mul(2654435761).rotate_left(13);

        let a = if neg_i { pool[i].invert() } else { pool[i] };
        let b = if neg_j { pool[j].invert() } else { pool[j] };
        let out = if use_xor { aig.mk_xor(a, b) } else { aig.mk_and(a, b) };
        pool.push(out);
    }
    *pool.last().unwrap()
}

/// A reference bit-level evaluator, independent of every pass under test:
/// walks the cone under `edge`, resolving `Buf` chains and propagating
/// complementation exactly the way spec §3.1's literal encoding defines.
fn simulate(aig: &Aig, edge: EdgeRef, inputs: &[bool]) -> bool {
    fn go(aig: &Aig, edge: EdgeRef, inputs: &[bool], memo: &mut HashMap<NodeId, bool>) -> bool {
        let edge = aig.resolve(edge);
        let node = edge.node();
        let value = if let Some(&v) = memo.get(&node) {
            v
        } else {
            let v = match aig.kind_of(node) {
                Kind::Const1 => true,
                Kind::PrimaryInput => {
                    let idx = aig
                        .primary_inputs()
                        .iter()
                        .position(|&p| p == node)
                        .expect("primary input must be registered");
                    inputs[idx]
                }
                Kind::And => {
                    let f = aig.fanins(node);
                    go(aig, f[0], inputs, memo) && go(aig, f[1], inputs, memo)
                }
                Kind::Xor => {
                    let f = aig.fanins(node);
                    go(aig, f[0], inputs, memo) ^ go(aig, f[1], inputs, memo)
                }
                Kind::Mux => {
                    let f = aig.fanins(node);
                    if go(aig, f[0], inputs, memo) {
                        go(aig, f[1], inputs, memo)
                    } else {
                        go(aig, f[2], inputs, memo)
                    }
                }
                Kind::Buf | Kind::PrimaryOutput => unreachable!("resolve() strips these"),
            };
            memo.insert(node, v);
            v
        };
        value ^ edge.is_complement()
    }
    go(aig, edge, inputs, &mut HashMap::new())
}

fn four_bits(byte: u8) -> [bool; 4] {
    [byte & 1 != 0, byte & 2 != 0, byte & 4 != 0, byte & 8 != 0]
}

quickcheck! {
    /// Invariant 1: every `(kind, fanin0, fanin1)` triple maps to at most
    /// one node — building the same AND twice (same seed, same pool order)
    /// must return the exact same edge both times.
    fn struct_hash_is_injective(seed: u32) -> bool {
        let mut aig = Aig::new();
        let pis: Vec<EdgeRef> = (0..4).map(|_| aig.add_pi()).collect();
        let first = build_formula(&mut aig, &pis, seed);
        let second = build_formula(&mut aig, &pis, seed);
        first == second
    }
}

quickcheck! {
    /// Invariant 2: a rewrite pass never changes the function computed at
    /// a primary output, checked by exhaustive 4-bit simulation.
    fn rewrite_preserves_function(seed: u32, inputs: u8) -> bool {
        let bits = four_bits(inputs);

        let mut reference = Aig::new();
        let ref_pis: Vec<EdgeRef> = (0..4).map(|_| reference.add_pi()).collect();
        let ref_out = build_formula(&mut reference, &ref_pis, seed);
        reference.add_po(ref_out);
        let expected = simulate(&reference, ref_out, &bits);

        let mut rewritten = Aig::new();
        let rw_pis: Vec<EdgeRef> = (0..4).map(|_| rewritten.add_pi()).collect();
        build_formula(&mut rewritten, &rw_pis, seed);
        let _ = rewrite(&mut rewritten, &RewriteParams::default());
        let actual = simulate(&rewritten, rewritten.primary_outputs()[0], &bits);

        expected == actual
    }
}

quickcheck! {
    /// Invariant 2, balancer side: balancing never changes the function
    /// computed at a primary output either.
    fn balance_preserves_function(seed: u32, inputs: u8) -> bool {
        let bits = four_bits(inputs);

        let mut aig = Aig::new();
        let pis: Vec<EdgeRef> = (0..4).map(|_| aig.add_pi()).collect();
        let out = build_formula(&mut aig, &pis, seed);
        aig.add_po(out);
        let expected = simulate(&aig, out, &bits);

        let balanced = balance(&aig, &BalanceParams::default()).unwrap();
        let actual = simulate(&balanced, balanced.primary_outputs()[0], &bits);

        expected == actual
    }
}

quickcheck! {
    /// Invariant 3: rewrite never increases node count.
    fn rewrite_never_increases_node_count(seed: u32) -> bool {
        let mut aig = Aig::new();
        let pis: Vec<EdgeRef> = (0..4).map(|_| aig.add_pi()).collect();
        let out = build_formula(&mut aig, &pis, seed);
        aig.add_po(out);
        let before = aig.and_node_count();
        let _ = rewrite(&mut aig, &RewriteParams::default());
        aig.and_node_count() <= before
    }
}

quickcheck! {
    /// Invariant 4: no `Buf` relay node survives a pass — every pass calls
    /// `cleanup`, which flushes the pending-`Buf` worklist before evicting
    /// dead nodes.
    fn no_buf_node_survives_a_rewrite_pass(seed: u32) -> bool {
        let mut aig = Aig::new();
        let pis: Vec<EdgeRef> = (0..4).map(|_| aig.add_pi()).collect();
        let out = build_formula(&mut aig, &pis, seed);
        aig.add_po(out);
        let _ = rewrite(&mut aig, &RewriteParams::default());
        aig.order().iter().all(|id| aig.kind_of(id) != Kind::Buf)
    }
}
