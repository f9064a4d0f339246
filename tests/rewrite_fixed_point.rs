//! §8.2: a bounded number of rewrite passes (≤ 10) reaches a fixed point —
//! once node count stops dropping, further passes leave it alone.

use aigrw::{rewrite, Aig, RewriteParams};

#[test]
fn rewrite_reaches_a_fixed_point_within_ten_passes() {
    let mut aig = Aig::new();
    let a = aig.add_pi();
    let b = aig.add_pi();
    let c = aig.add_pi();
    let d = aig.add_pi();
    let ab = aig.mk_and(a, b);
    let cd = aig.mk_and(c, d);
    let f = aig.mk_and(ab.invert(), cd.invert()).invert();
    aig.add_po(f);

    let params = RewriteParams::default();
    let mut counts = Vec::with_capacity(10);
    for _ in 0..10 {
        rewrite(&mut aig, &params).unwrap();
        counts.push(aig.and_node_count());
    }

    let last = *counts.last().unwrap();
    // Monotonically non-increasing across every pass.
    for window in counts.windows(2) {
        assert!(window[1] <= window[0]);
    }
    // Converged well before the budget runs out.
    assert_eq!(counts[5], last);

    // One more pass past convergence changes nothing further.
    rewrite(&mut aig, &params).unwrap();
    assert_eq!(aig.and_node_count(), last);
}

#[test]
fn rewrite_fixed_point_holds_on_an_already_minimal_chain() {
    let mut aig = Aig::new();
    let a = aig.add_pi();
    let b = aig.add_pi();
    let c = aig.add_pi();
    let ab = aig.mk_and(a, b);
    let abc = aig.mk_and(ab, c);
    aig.add_po(abc);

    let params = RewriteParams::default();
    let before = aig.and_node_count();
    for _ in 0..10 {
        rewrite(&mut aig, &params).unwrap();
        assert_eq!(aig.and_node_count(), before);
    }
}
