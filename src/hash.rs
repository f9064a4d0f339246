//! The structural-hash table backing And/Xor/Mux uniqueness.
//!
//! `cranelift_codegen::scoped_hash_map::ScopedHashMap` shows the shape we
//! want for a purpose-built hash container in this codebase: a small,
//! dependency-free wrapper with its own entry API, rather than reaching for
//! `std::collections::HashMap`'s default (and here, irrelevant) SipHash. Our
//! table never needs scoping, but it does need the exact triple-hash and
//! prime-growth policy this table needs, so it is its own type rather than
//! a generic `HashMap<Key, NodeId>`.

use crate::entities::NodeId;

/// Primes used to grow the bucket array, in the style of Cudd's table-size
/// sequence: each is the first prime past roughly double the previous one.
const GROWTH_PRIMES: &[usize] = &[
    509, 1021, 2039, 4093, 8191, 16381, 32749, 65521, 131071, 262139, 524287, 1048573, 2097143,
    4194301, 8388593, 16777213, 33554393, 67108859,
];

/// The key identifying a structurally-hashed node: its kind (folded into
/// `aux`) and up to three fanin literals.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct StructKey {
    /// Discriminant folding in `Kind` (And=0, Xor=1, Mux=2) so the same
    /// table serves all three structurally-hashed kinds without collision
    /// between e.g. `And(a, b)` and `Xor(a, b)`.
    pub aux: u32,
    pub fanin0: u32,
    pub fanin1: u32,
    pub fanin2: u32,
}

impl StructKey {
    /// Builds the key for a two-input node (And/Xor); `fanin2` is unused.
    pub fn binary(aux: u32, fanin0: u32, fanin1: u32) -> Self {
        StructKey {
            aux,
            fanin0,
            fanin1,
            fanin2: 0,
        }
    }

    /// Builds the key for a Mux node.
    pub fn ternary(fanin0: u32, fanin1: u32, fanin2: u32) -> Self {
        StructKey {
            aux: 2,
            fanin0,
            fanin1,
            fanin2,
        }
    }

    /// Hashes the key's three fanin literals and kind discriminant
    /// together, using primes 4177, 7873 and 1699.
    fn hash(self) -> u64 {
        let h = (self.fanin0 as u64).wrapping_mul(4177)
            ^ (self.fanin1 as u64).wrapping_mul(7873)
            ^ (self.fanin2 as u64).wrapping_mul(1699)
            ^ (self.aux as u64).wrapping_mul(101);
        h
    }
}

/// Open-chained structural hash table mapping `StructKey -> NodeId`.
///
/// Bucket chains are plain `Vec`s rather than linked lists: chain lengths
/// stay tiny in practice (structural hashing keeps the table close to a
/// perfect map), so a `Vec` scan beats pointer-chasing.
#[derive(Clone, Default)]
pub struct StructHash {
    buckets: Vec<Vec<(StructKey, NodeId)>>,
    len: usize,
}

impl StructHash {
    /// Creates an empty table.
    pub fn new() -> Self {
        StructHash {
            buckets: vec![Vec::new(); GROWTH_PRIMES[0]],
            len: 0,
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bucket_index(&self, key: StructKey) -> usize {
        (key.hash() % self.buckets.len() as u64) as usize
    }

    /// Looks up `key`, returning the node id it maps to, if any.
    pub fn get(&self, key: StructKey) -> Option<NodeId> {
        let idx = self.bucket_index(key);
        self.buckets[idx]
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    /// Inserts `key -> node`, growing the table first if the load factor
    /// would exceed 100%. Returns the previous value, if the
    /// key was already present (callers should treat that as a bug: the
    /// structural-hash invariant is an injection).
    pub fn insert(&mut self, key: StructKey, node: NodeId) -> Option<NodeId> {
        if (self.len + 1) > self.buckets.len() {
            self.grow();
        }
        let idx = self.bucket_index(key);
        if let Some(slot) = self.buckets[idx].iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, node));
        }
        self.buckets[idx].push((key, node));
        self.len += 1;
        None
    }

    /// Removes `key` from the table, e.g. when its node is being replaced
    /// with a differently-keyed one.
    pub fn remove(&mut self, key: StructKey) -> Option<NodeId> {
        let idx = self.bucket_index(key);
        let pos = self.buckets[idx].iter().position(|(k, _)| *k == key)?;
        self.len -= 1;
        Some(self.buckets[idx].swap_remove(pos).1)
    }

    fn grow(&mut self) {
        let next = GROWTH_PRIMES
            .iter()
            .copied()
            .find(|&p| p > self.buckets.len())
            .unwrap_or_else(|| self.buckets.len() * 2 + 1);
        let mut new_buckets = vec![Vec::new(); next];
        for (key, node) in self.buckets.drain(..).flatten() {
            let idx = (key.hash() % new_buckets.len() as u64) as usize;
            new_buckets[idx].push((key, node));
        }
        self.buckets = new_buckets;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn insert_then_get_round_trips() {
        let mut h = StructHash::new();
        let k = StructKey::binary(0, 3, 9);
        assert_eq!(h.get(k), None);
        h.insert(k, NodeId::new(5));
        assert_eq!(h.get(k), Some(NodeId::new(5)));
    }

    #[test]
    fn distinct_kinds_do_not_collide() {
        let mut h = StructHash::new();
        let and_key = StructKey::binary(0, 1, 2);
        let xor_key = StructKey::binary(1, 1, 2);
        h.insert(and_key, NodeId::new(10));
        h.insert(xor_key, NodeId::new(11));
        assert_eq!(h.get(and_key), Some(NodeId::new(10)));
        assert_eq!(h.get(xor_key), Some(NodeId::new(11)));
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut h = StructHash::new();
        for i in 0..5000u32 {
            h.insert(StructKey::binary(0, i, i + 1), NodeId::new(i));
        }
        assert_eq!(h.len(), 5000);
        for i in 0..5000u32 {
            assert_eq!(h.get(StructKey::binary(0, i, i + 1)), Some(NodeId::new(i)));
        }
    }

    #[test]
    fn remove_then_reinsert() {
        let mut h = StructHash::new();
        let k = StructKey::binary(0, 1, 2);
        h.insert(k, NodeId::new(1));
        assert_eq!(h.remove(k), Some(NodeId::new(1)));
        assert_eq!(h.get(k), None);
        h.insert(k, NodeId::new(2));
        assert_eq!(h.get(k), Some(NodeId::new(2)));
    }
}
