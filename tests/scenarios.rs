//! End-to-end scenarios drawn from spec §8.4, exercised through the public
//! crate surface rather than an internal `#[cfg(test)]` module so they read
//! the same way a downstream caller's own smoke tests would.

use aigrw::{
    balance, dam_extract, fast_extract, rewrite, Aig, BalanceParams, DamParams, EdgeRef, FxParams,
    RewriteParams,
};

fn cube(owner: i32, lits: &[i32]) -> Vec<i32> {
    let mut v = vec![owner];
    v.extend_from_slice(lits);
    v
}

#[test]
fn two_input_and_chain_balances_to_depth_two() {
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

    let balanced = balance(&aig, &BalanceParams::default()).unwrap();
    assert_eq!(balanced.depth(), 2);
    assert_eq!(balanced.and_node_count(), 3);
}

#[test]
fn shared_and_factor_extracts_the_pair_common_to_two_cubes() {
    // Owners 20 and 21 each AND the shared pair (a, b) against a distinct
    // third literal: (a.b.c) and (a.b.d). The pair (a, b) is common to both
    // cubes, so fast_extract should pull it out as one shared variable.
    let a = 0i32;
    let b = 2i32;
    let c = 4i32;
    let d = 6i32;
    let mut cubes = vec![cube(20, &[a, b, c]), cube(21, &[a, b, d])];
    let before_lits: usize = cubes.iter().map(|cu| cu.len() - 1).sum();

    let extracted = fast_extract(&mut cubes, 21, &FxParams::default()).unwrap();
    assert_eq!(extracted, 1);
    let after_lits: usize = cubes.iter().map(|cu| cu.len() - 1).sum();
    // Each owner cube drops from 3 literals to 2, offset by the one new
    // 2-literal defining cube for the shared variable: net literal count
    // should not increase.
    assert!(after_lits <= before_lits + 2);
    assert!(cubes.iter().any(|cu| cu.len() == 3 && cu[0] == 22));
}

#[test]
fn xor_of_xors_cancels_the_repeated_operand() {
    // o = a ^ b ^ c ^ d ^ a == b ^ c ^ d, so balancing should collapse the
    // cone from four XOR gates down to two.
    let mut aig = Aig::new();
    let a = aig.add_pi();
    let b = aig.add_pi();
    let c = aig.add_pi();
    let d = aig.add_pi();
    let ab = aig.mk_xor(a, b);
    let abc = aig.mk_xor(ab, c);
    let abcd = aig.mk_xor(abc, d);
    let o = aig.mk_xor(abcd, a);
    aig.add_po(o);

    let balanced = balance(&aig, &BalanceParams::default()).unwrap();
    assert_eq!(balanced.and_node_count(), 2);
}

#[test]
fn mux_shape_is_detected_from_two_opposite_polarity_cubes() {
    // s = var 0, a = var 1, b = var 2: cubes (o, !s, a) and (o, s, b)
    // describe o = s ? b : a.
    let s_pos = 0i32;
    let s_neg = 1i32;
    let a_lit = 2i32;
    let b_lit = 4i32;
    let mut cubes = vec![cube(30, &[s_neg, a_lit]), cube(30, &[s_pos, b_lit])];

    let extracted = fast_extract(&mut cubes, 30, &FxParams::default()).unwrap();
    assert_eq!(extracted, 1);

    let def_cubes: Vec<&Vec<i32>> = cubes.iter().filter(|cu| cu[0] != 30).collect();
    assert_eq!(def_cubes.len(), 2);
    // The MUX divisor's two defining cubes each carry the control literal
    // in opposite polarity as their first literal.
    let first_lits: Vec<i32> = def_cubes.iter().map(|cu| cu[1]).collect();
    assert!(first_lits.contains(&s_neg));
    assert!(first_lits.contains(&s_pos));
}

#[test]
fn dam_shares_a_thrice_used_xor_across_its_and_consumers() {
    // f1/f2/f3 each AND a shared (a^b) against a distinct third input;
    // extracting (a^b) as one node lets all three consumers point at it.
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
    // (a^b) was already structurally shared going in, so this pass must at
    // least hold its ground rather than blow it up by re-extracting it.
    assert!(aig.and_node_count() <= before);
    assert!(aig.lookup_xor(a, b).is_some());
}

#[test]
fn rewrite_matches_a_four_input_cut_against_the_npn_library() {
    // f = a.b + c.d, but built with a genuinely redundant extra term rather
    // than relying on this crate's free edge-complementation (which makes
    // the literal "OR decomposed into three ANDs" reading of spec.md §8.4
    // scenario 6 collapse to the library's own 3-node minimum with nothing
    // left to gain). `a.b.c.d` is subsumed by `a.b + c.d` (whenever all four
    // are true, `a.b` already is), so OR-ing it in changes no output bit,
    // but it is a structurally distinct node the hash cannot dedupe away:
    //   ab, cd           -- the two literal ANDs
    //   abcd = ab & cd   -- redundant consensus term
    //   t1   = ab | cd   -- De Morgan, reuses ab/cd
    //   f    = t1 | abcd -- still exactly a.b + c.d
    // five internal AND nodes feeding one root, whose 4-input cut the NPN-4
    // library matches down to 3.
    let mut aig = Aig::new();
    let a = aig.add_pi();
    let b = aig.add_pi();
    let c = aig.add_pi();
    let d = aig.add_pi();
    let ab = aig.mk_and(a, b);
    let cd = aig.mk_and(c, d);
    let abcd = aig.mk_and(ab, cd);
    let t1 = aig.mk_and(ab.invert(), cd.invert()).invert();
    let f = aig.mk_and(t1.invert(), abcd.invert()).invert();
    aig.add_po(f);

    let before = aig.and_node_count();
    assert_eq!(before, 5);
    rewrite(&mut aig, &RewriteParams::default()).unwrap();
    assert!(aig.and_node_count() < before);
    assert_eq!(aig.and_node_count(), 3);
    assert_eq!(aig.primary_outputs().len(), 1);
    assert_ne!(aig.primary_outputs()[0], EdgeRef::const0());
}
