//! SOP-level fast-extract (C7): mines two-literal and two-cube divisors
//! shared across a network's cube cover and rewrites the cover to share
//! them, mirroring Dam's (C6) role for AIGs one level up the abstraction.
//!
//! Grounded on `abcFx.c`'s divisor/cube bookkeeping (the `LitsToCubes`
//! inverted index, weight = occurrence count for the single-cube case) and
//! `plaFxch.c`'s MUX canonicalization of a four-literal cube-free factor.
//! Unlike Dam this module owns no arena: it operates directly on the
//! `Vec<Vec<i32>>` cube array described in spec §3.6, so it reuses only
//! `PriorityQueue` from the C6/C7-shared `pqueue` module.

use crate::error::{AigError, AigResult};
use crate::params::FxParams;
use crate::pqueue::PriorityQueue;
use std::collections::HashMap;

type Lit = i32;
type Cube = Vec<Lit>;

fn lit_var(lit: Lit) -> i32 {
    lit >> 1
}

fn lit_compl(lit: Lit) -> bool {
    lit & 1 != 0
}

fn owner(cube: &Cube) -> i32 {
    cube[0]
}

fn literals(cube: &Cube) -> &[Lit] {
    &cube[1..]
}

fn sorted_pair(a: Lit, b: Lit) -> (Lit, Lit) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A mined two-literal divisor candidate: either an algebraic product found
/// within a single cube, an OR-shaped factor common to two 2-literal cubes,
/// or the canonical MUX shape of two 2-literal cubes under a shared control
/// variable in opposite polarity.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
enum DivisorKey {
    /// `lit_a · lit_b`, found co-occurring inside the same cube.
    Pair(Lit, Lit),
    /// `other_i + other_j`, the cube-free factor common to two cubes once
    /// their one shared literal is pulled out.
    Factor(Lit, Lit),
    /// `control_var ? data_pos : data_neg`, mined from two cubes whose sole
    /// difference is a literal of `control_var` in opposite polarity.
    Mux(i32, Lit, Lit),
}

/// Where a `DivisorKey` was observed: one cube index for `Pair`, a pair of
/// cube indices for `Factor`/`Mux` (in `(negative_control, positive_control)`
/// order for `Mux`, arbitrary order for `Factor`).
#[derive(Copy, Clone, Debug)]
enum Occurrence {
    SingleCube(usize),
    CubePair(usize, usize),
}

impl Occurrence {
    fn touches(&self, idx: usize) -> bool {
        match *self {
            Occurrence::SingleCube(i) => i == idx,
            Occurrence::CubePair(i, j) => i == idx || j == idx,
        }
    }
}

/// Builds the single-cube pair index (§4.7 "single-cube two-literal")
/// across every cube: every literal pair found together in one cube is a
/// candidate, weighted by how many distinct cubes contain it.
fn mine_single_cube_pairs(cubes: &[Cube], table: &mut HashMap<DivisorKey, Vec<Occurrence>>) {
    for (idx, cube) in cubes.iter().enumerate() {
        let lits = literals(cube);
        for i in 0..lits.len() {
            for j in (i + 1)..lits.len() {
                let (lo, hi) = sorted_pair(lits[i], lits[j]);
                table
                    .entry(DivisorKey::Pair(lo, hi))
                    .or_insert_with(Vec::new)
                    .push(Occurrence::SingleCube(idx));
            }
        }
    }
}

/// Builds the two-cube divisor index (§4.7 "two-cube"): restricted here to
/// pairs of 2-literal cubes, which covers the classic algebraic-factor and
/// MUX shapes the spec calls out by name (§8.4 scenarios 2 and 4). General
/// 3-4 literal cube-free factors spanning cubes of unequal size are not
/// mined; `abcFx.c`'s handling of those (the `vSCC` pairs) is flagged in
/// spec.md's own Open Questions as an experimental path.
fn mine_two_cube_divisors(cubes: &[Cube], table: &mut HashMap<DivisorKey, Vec<Occurrence>>) {
    let pair_cubes: Vec<usize> = cubes
        .iter()
        .enumerate()
        .filter(|(_, c)| literals(c).len() == 2)
        .map(|(idx, _)| idx)
        .collect();

    for a in 0..pair_cubes.len() {
        for b in (a + 1)..pair_cubes.len() {
            let ci = pair_cubes[a];
            let cj = pair_cubes[b];
            let la = literals(&cubes[ci]);
            let lb = literals(&cubes[cj]);

            let shared: Vec<Lit> = la.iter().copied().filter(|l| lb.contains(l)).collect();
            if shared.len() == 1 {
                let other_i = *la.iter().find(|&&l| l != shared[0]).unwrap();
                let other_j = *lb.iter().find(|&&l| l != shared[0]).unwrap();
                if other_i == other_j {
                    continue;
                }
                let (lo, hi) = sorted_pair(other_i, other_j);
                table
                    .entry(DivisorKey::Factor(lo, hi))
                    .or_insert_with(Vec::new)
                    .push(Occurrence::CubePair(ci, cj));
                continue;
            }
            if !shared.is_empty() {
                continue;
            }

            // No literal in common; look for a control variable present in
            // both cubes with opposite polarity, per plaFxch.c's MUX probe.
            let mut found = None;
            'outer: for &ca in la {
                for &cb in lb {
                    if lit_var(ca) == lit_var(cb) && lit_compl(ca) != lit_compl(cb) {
                        found = Some((ca, cb));
                        break 'outer;
                    }
                }
            }
            let (ca, cb) = match found {
                Some(pair) => pair,
                None => continue,
            };
            let data_i = *la.iter().find(|&&l| l != ca).unwrap();
            let data_j = *lb.iter().find(|&&l| l != cb).unwrap();
            // Canonical form: the negative-polarity control literal is
            // paired with the "else" data literal, the positive with the
            // "then" data literal.
            let (neg_cube, pos_cube, data_neg, data_pos) = if lit_compl(ca) {
                (ci, cj, data_i, data_j)
            } else {
                (cj, ci, data_j, data_i)
            };
            table
                .entry(DivisorKey::Mux(lit_var(ca), data_neg, data_pos))
                .or_insert_with(Vec::new)
                .push(Occurrence::CubePair(neg_cube, pos_cube));
        }
    }
}

fn remove_literal(cube: &mut Cube, lit: Lit) {
    cube.retain(|&l| l != lit);
}

fn insert_literal_sorted(cube: &mut Cube, lit: Lit) {
    let pos = cube[1..].iter().position(|&l| l > lit).map(|p| p + 1).unwrap_or(cube.len());
    cube.insert(pos, lit);
}

/// Runs `fast_extract` (C7) over `cubes` in place, per spec.md §4.7/§6.2:
/// mines single-cube and two-cube divisors, greedily materializes the
/// highest-weight one as a fresh variable until the queue runs dry or a
/// budget is hit, and returns the number of extractions performed.
pub fn fast_extract(cubes: &mut Vec<Cube>, obj_id_max: u32, params: &FxParams) -> AigResult<usize> {
    for w in cubes.windows(2) {
        if owner(&w[0]) > owner(&w[1]) {
            return Err(AigError::Internal("cube array is not sorted by owning node id"));
        }
    }
    for cube in cubes.iter() {
        let lits = literals(cube);
        for w in lits.windows(2) {
            if w[0] >= w[1] {
                return Err(AigError::Internal("cube literals are not strictly increasing"));
            }
        }
    }

    let mut table: HashMap<DivisorKey, Vec<Occurrence>> = HashMap::new();
    mine_single_cube_pairs(cubes, &mut table);
    mine_two_cube_divisors(cubes, &mut table);

    let keys: Vec<DivisorKey> = table.keys().copied().collect();
    let occurrences: Vec<Vec<Occurrence>> = keys.iter().map(|k| table.remove(k).unwrap()).collect();
    // A MUX (or, by extension, an XOR) shape is worth recognizing the
    // moment it appears once: canonicalizing it into a dedicated divisor
    // record is valuable on its own, independent of sharing, since it maps
    // directly onto a single target primitive rather than two ANDs plus an
    // OR. Pair/Factor divisors only pay for themselves once genuinely
    // shared, so they keep the 2-occurrence floor.
    let min_occurrences = |key: &DivisorKey| if matches!(key, DivisorKey::Mux(..)) { 1 } else { 2 };
    let mut queue = PriorityQueue::new();
    for (id, occ) in occurrences.iter().enumerate() {
        // A `Factor` divisor is an irregular OR-shaped cube-free factor,
        // not one of the AND/XOR/MUX primitives `canon_divs_only` restricts
        // extraction to.
        if params.canon_divs_only && matches!(keys[id], DivisorKey::Factor(..)) {
            continue;
        }
        if occ.len() >= min_occurrences(&keys[id]) {
            queue.push(id as u32, occ.len() as f64);
        }
    }

    let mut touched = vec![false; cubes.len()];
    let mut next_var = obj_id_max as i32 + 1;
    let mut extracted = 0usize;
    let max_new = if params.n_new_nodes_max == 0 { usize::MAX } else { params.n_new_nodes_max as usize };

    while extracted < max_new {
        let id = match queue.pop() {
            Some(id) => id,
            None => break,
        };
        let live: Vec<Occurrence> = occurrences[id as usize]
            .iter()
            .copied()
            .filter(|o| !match *o {
                Occurrence::SingleCube(i) => touched[i],
                Occurrence::CubePair(i, j) => touched[i] || touched[j],
            })
            .collect();
        if live.len() < min_occurrences(&keys[id as usize]) {
            continue;
        }
        let savings = live.len() as i64 - 1;
        let is_mux = matches!(keys[id as usize], DivisorKey::Mux(..));
        if !is_mux && params.lit_count_max > 0 && savings < params.lit_count_max as i64 {
            continue;
        }

        let v = next_var;
        next_var += 1;
        let v_lit = v * 2;

        match keys[id as usize] {
            DivisorKey::Pair(a, b) => {
                for occ in &live {
                    if let Occurrence::SingleCube(idx) = *occ {
                        remove_literal(&mut cubes[idx], a);
                        remove_literal(&mut cubes[idx], b);
                        insert_literal_sorted(&mut cubes[idx], v_lit);
                        touched[idx] = true;
                    }
                }
                let mut def = vec![v, a, b];
                def[1..].sort_unstable();
                cubes.push(def);
            }
            DivisorKey::Factor(other_i, other_j) => {
                for occ in &live {
                    if let Occurrence::CubePair(ci, cj) = *occ {
                        let shared_i = *literals(&cubes[ci]).iter().find(|&&l| l != other_i).unwrap();
                        let shared_j = *literals(&cubes[cj]).iter().find(|&&l| l != other_j).unwrap();
                        let owner_i = owner(&cubes[ci]);
                        let owner_j = owner(&cubes[cj]);
                        cubes[ci] = sorted_cube(owner_i, &[shared_i, v_lit]);
                        cubes[cj] = sorted_cube(owner_j, &[shared_j, v_lit]);
                        touched[ci] = true;
                        touched[cj] = true;
                    }
                }
                cubes.push(vec![v, other_i]);
                cubes.push(vec![v, other_j]);
            }
            DivisorKey::Mux(ctrl_var, data_neg, data_pos) => {
                for occ in &live {
                    if let Occurrence::CubePair(neg_cube, pos_cube) = *occ {
                        let owner_neg = owner(&cubes[neg_cube]);
                        let owner_pos = owner(&cubes[pos_cube]);
                        cubes[neg_cube] = vec![owner_neg, v_lit];
                        cubes[pos_cube] = vec![owner_pos, v_lit];
                        touched[neg_cube] = true;
                        touched[pos_cube] = true;
                    }
                }
                let neg_ctrl = ctrl_var * 2 + 1;
                let pos_ctrl = ctrl_var * 2;
                cubes.push(sorted_cube(v, &[neg_ctrl, data_neg]));
                cubes.push(sorted_cube(v, &[pos_ctrl, data_pos]));
            }
        }

        touched.resize(cubes.len(), false);
        extracted += 1;
        if params.verbose {
            log::debug!("fast_extract: v{} <- {:?} ({} occurrences)", v, keys[id as usize], live.len());
        }
    }

    cubes.sort_by_key(|c| c[0]);
    Ok(extracted)
}

fn sorted_cube(owner: i32, lits: &[Lit]) -> Cube {
    let mut v = lits.to_vec();
    v.sort_unstable();
    let mut cube = vec![owner];
    cube.extend(v);
    cube
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(owner: i32, lits: &[i32]) -> Cube {
        let mut v = vec![owner];
        v.extend_from_slice(lits);
        v
    }

    #[test]
    fn shared_and_pair_is_extracted_once() {
        // var 0 = a, var 1 = b, var 2 = c; owners 10, 11 each AND a, b with
        // a distinct third literal: (a.b.c) and (a.b.d).
        let a = 0i32;
        let b = 2i32;
        let c = 4i32;
        let d = 6i32;
        let mut cubes = vec![cube(10, &[a, b, c]), cube(11, &[a, b, d])];
        let before_lits: usize = cubes.iter().map(|c| c.len() - 1).sum();
        let extracted = fast_extract(&mut cubes, 11, &FxParams::default()).unwrap();
        assert_eq!(extracted, 1);
        let after_lits: usize = cubes.iter().map(|c| c.len() - 1).sum();
        // one new 2-literal defining cube added, but each owner cube drops
        // from 3 to 2 literals: net -2 + 2 == 0, so literal count should
        // not increase even though a structural extraction happened.
        assert!(after_lits <= before_lits + 2);
        assert!(cubes.iter().any(|c| c.len() == 3 && c[0] == 12));
    }

    #[test]
    fn unshared_cubes_extract_nothing() {
        let mut cubes = vec![cube(0, &[0, 2]), cube(1, &[4, 6])];
        let extracted = fast_extract(&mut cubes, 7, &FxParams::default()).unwrap();
        assert_eq!(extracted, 0);
    }

    #[test]
    fn mux_shape_is_recognized_and_canonicalized() {
        // s = var 0, a = var 1, b = var 2: cubes (o, !s, a) and (o, s, b).
        let s_pos = 0i32;
        let s_neg = 1i32;
        let a = 2i32;
        let b = 4i32;
        let mut cubes = vec![cube(5, &[s_neg, a]), cube(5, &[s_pos, b])];
        let extracted = fast_extract(&mut cubes, 5, &FxParams::default()).unwrap();
        assert_eq!(extracted, 1);
        // owner 5's two cubes each collapse to a single literal pointing at
        // the new mux variable.
        let owner_cubes: Vec<&Cube> = cubes.iter().filter(|c| c[0] == 5).collect();
        assert_eq!(owner_cubes.len(), 2);
        for c in &owner_cubes {
            assert_eq!(c.len(), 2);
        }
        let def_cubes: Vec<&Cube> = cubes.iter().filter(|c| c[0] == 6).collect();
        assert_eq!(def_cubes.len(), 2);
    }

    #[test]
    fn malformed_cube_array_is_rejected() {
        let mut cubes = vec![cube(1, &[0, 2]), cube(0, &[4, 6])];
        let err = fast_extract(&mut cubes, 7, &FxParams::default()).unwrap_err();
        assert_eq!(err, AigError::Internal("cube array is not sorted by owning node id"));
    }

    #[test]
    fn respects_new_node_budget() {
        // Pair(a, c) [lits 0, 4] recurs across three cubes, Pair(a, b)
        // [lits 0, 2] across two; with a budget of one extraction only the
        // higher-weight divisor should be pulled out.
        let mut cubes = vec![
            cube(0, &[0, 2, 4]),
            cube(1, &[0, 2, 6]),
            cube(2, &[0, 4, 8]),
            cube(3, &[0, 4, 10]),
        ];
        let params = FxParams {
            n_new_nodes_max: 1,
            ..FxParams::default()
        };
        let extracted = fast_extract(&mut cubes, 10, &params).unwrap();
        assert_eq!(extracted, 1);
    }
}
