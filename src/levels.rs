//! Level and reverse-level bookkeeping.
//!
//! `Level(node)` is the longest path from any primary input to `node`;
//! `ReverseLevel(node)` is the longest path from `node` to any primary
//! output. Together they determine a node's *slack*, which the rewriter uses
//! to accept replacements that don't increase the network's depth and the
//! Dam extractor uses to break weight ties in favor of non-critical
//! divisors.

use crate::entities::NodeId;
use cranelift_entity::SecondaryMap;

/// Tracks forward levels (from primary inputs) and reverse levels (to
/// primary outputs) for every node in the arena.
#[derive(Clone, Default)]
pub struct Levels {
    level: SecondaryMap<NodeId, u32>,
    reverse: SecondaryMap<NodeId, u32>,
    max_level: u32,
}

impl Levels {
    /// Creates an empty level tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// The forward level of `node`.
    pub fn level(&self, node: NodeId) -> u32 {
        self.level[node]
    }

    /// The reverse level of `node` (distance to the nearest PO, 0 for a PO
    /// itself and for any node with no PO above it yet).
    pub fn reverse_level(&self, node: NodeId) -> u32 {
        self.reverse[node]
    }

    /// The current network depth, i.e. the maximum level over all nodes.
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Sets the level of a terminal (constant or primary input) to 0.
    pub fn set_terminal(&mut self, node: NodeId) {
        self.level[node] = 0;
    }

    /// Records that `node`'s level is `1 + max(fanin levels)`
    ///, or simply forwards a `Buf`'s fanin level unchanged.
    pub fn set_from_fanins(&mut self, node: NodeId, fanin_levels: &[u32], is_buf: bool) {
        let base = fanin_levels.iter().copied().max().unwrap_or(0);
        let lvl = if is_buf { base } else { base + 1 };
        self.level[node] = lvl;
        if lvl > self.max_level {
            self.max_level = lvl;
        }
    }

    /// Directly overrides a node's level, used when a delta-list update
    /// the new value without re-deriving it from fanins, for callers that
    /// update levels incrementally via a delta list rather than a full
    /// recomputation.
    pub fn set_level(&mut self, node: NodeId, lvl: u32) {
        self.level[node] = lvl;
        if lvl > self.max_level {
            self.max_level = lvl;
        }
    }

    /// Marks `node` as a primary output for reverse-level purposes.
    pub fn set_po(&mut self, node: NodeId) {
        self.reverse[node] = 0;
    }

    /// Discards every reverse level, used before a full recomputation.
    pub fn reset_reverse(&mut self) {
        self.reverse = SecondaryMap::new();
    }

    /// Propagates a reverse level up to a fanin: `reverse(fanin) = max(
    /// reverse(fanin), reverse(node) + 1)`.
    pub fn bump_reverse(&mut self, fanin: NodeId, from_reverse: u32) {
        let candidate = from_reverse + 1;
        if candidate > self.reverse[fanin] {
            self.reverse[fanin] = candidate;
        }
    }

    /// The slack of a node given an explicit pair of fanin levels:
    /// `slack = min(100, max_level - reverse_level - max(level(x), level(y)) - 1 - [x>y])`.
    pub fn slack(&self, reverse_level_owner: u32, level_x: u32, level_y: u32, x_gt_y: bool) -> f64 {
        let raw = self.max_level as i64
            - reverse_level_owner as i64
            - level_x.max(level_y) as i64
            - 1
            - x_gt_y as i64;
        raw.max(0).min(100) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranelift_entity::EntityRef;

    #[test]
    fn levels_propagate_from_fanins() {
        let mut l = Levels::new();
        let a = NodeId::new(0);
        let b = NodeId::new(1);
        let c = NodeId::new(2);
        l.set_terminal(a);
        l.set_terminal(b);
        l.set_from_fanins(c, &[l.level(a), l.level(b)], false);
        assert_eq!(l.level(c), 1);
        assert_eq!(l.max_level(), 1);
    }

    #[test]
    fn buf_forwards_level_without_increment() {
        let mut l = Levels::new();
        let a = NodeId::new(0);
        let buf = NodeId::new(1);
        l.set_level(a, 3);
        l.set_from_fanins(buf, &[l.level(a)], true);
        assert_eq!(l.level(buf), 3);
    }

    #[test]
    fn reverse_level_bumps_towards_inputs() {
        let mut l = Levels::new();
        let po_driver = NodeId::new(0);
        let fanin = NodeId::new(1);
        l.set_po(po_driver);
        l.bump_reverse(fanin, l.reverse_level(po_driver));
        assert_eq!(l.reverse_level(fanin), 1);
    }
}
