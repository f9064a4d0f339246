//! The node visitation order: a doubly linked list over `NodeId` supporting
//! `advance`/`insert` so that nodes created mid-pass are spliced into the
//! position they would have occupied in a fresh topological walk
//!
//! This plays the role `cranelift_codegen::cursor::Cursor` plays for
//! instruction layout: a cursor type with a `CursorPosition`-shaped state
//! machine navigating a linked structure that the arena owns, so that a pass
//! can keep iterating correctly even as it mutates the thing it is iterating
//! over.

use crate::entities::NodeId;
use cranelift_entity::SecondaryMap;

#[cfg(test)]
use cranelift_entity::EntityRef;

/// The current position of an `OrderCursor`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OrderPosition {
    /// Not pointing anywhere; `next()`/`insert()` are no-ops.
    Nowhere,
    /// Positioned at an existing node. `insert()` splices new nodes directly
    /// before this one.
    At(NodeId),
    /// Positioned after the last node. `insert()` appends.
    AtEnd,
}

/// A doubly linked order over all nodes in the arena, maintained
/// incrementally as nodes are created.
#[derive(Clone, Default)]
pub struct Order {
    next: SecondaryMap<NodeId, PackedNode>,
    prev: SecondaryMap<NodeId, PackedNode>,
    head: PackedNode,
    tail: PackedNode,
}

/// `Option<NodeId>` with a dedicated sentinel, avoiding the size penalty
/// `Option<NodeId>` would otherwise pay (mirrors `cranelift_entity`'s own
/// `PackedOption`, which this crate re-exports but doesn't use here since we
/// only ever store it in `SecondaryMap`s with a cheap `Default`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct PackedNode(Option<NodeId>);

impl Default for PackedNode {
    fn default() -> Self {
        PackedNode(None)
    }
}

impl Order {
    /// Creates an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` at the end of the order. Used when a node is created
    /// fresh (no existing cursor is pointing through its eventual position).
    pub fn push_back(&mut self, node: NodeId) {
        match self.tail.0 {
            None => {
                self.head = PackedNode(Some(node));
            }
            Some(old_tail) => {
                self.next[old_tail] = PackedNode(Some(node));
            }
        }
        self.prev[node] = self.tail;
        self.tail = PackedNode(Some(node));
        self.next[node] = PackedNode(None);
    }

    /// Splices `node` immediately before `before` in the order. Used by
    /// `replace` to insert a freshly built replacement subgraph at the
    /// position its root used to occupy, so that nodes already visited by an
    /// in-flight topological walk aren't revisited.
    pub fn insert_before(&mut self, before: NodeId, node: NodeId) {
        let p = self.prev[before];
        self.prev[node] = p;
        self.next[node] = PackedNode(Some(before));
        match p.0 {
            Some(pred) => self.next[pred] = PackedNode(Some(node)),
            None => self.head = PackedNode(Some(node)),
        }
        self.prev[before] = PackedNode(Some(node));
    }

    /// Removes `node` from the order (it remains addressable by id; this
    /// only affects traversal).
    pub fn remove(&mut self, node: NodeId) {
        let p = self.prev[node];
        let n = self.next[node];
        match p.0 {
            Some(pred) => self.next[pred] = n,
            None => self.head = n,
        }
        match n.0 {
            Some(succ) => self.prev[succ] = p,
            None => self.tail = p,
        }
    }

    /// The first node in the order, if any.
    pub fn first(&self) -> Option<NodeId> {
        self.head.0
    }

    /// The node immediately following `node`, if any.
    pub fn next_of(&self, node: NodeId) -> Option<NodeId> {
        self.next[node].0
    }

    /// An iterator over all nodes in order.
    pub fn iter(&self) -> OrderIter<'_> {
        OrderIter {
            order: self,
            cur: self.head.0,
        }
    }

    /// A cursor positioned at `node`.
    pub fn cursor_at(&self, node: NodeId) -> OrderCursor<'_> {
        OrderCursor {
            order: self,
            pos: OrderPosition::At(node),
        }
    }
}

/// Forward iterator over an `Order`.
pub struct OrderIter<'a> {
    order: &'a Order,
    cur: Option<NodeId>,
}

impl<'a> Iterator for OrderIter<'a> {
    type Item = NodeId;
    fn next(&mut self) -> Option<NodeId> {
        let cur = self.cur?;
        self.cur = self.order.next_of(cur);
        Some(cur)
    }
}

/// A read-only navigator over an `Order`, used by passes that need to know
/// "where would this new node land" without owning a mutable borrow of the
/// order (mutation goes through `Order::insert_before`/`push_back` directly,
/// called from `Aig::replace`).
pub struct OrderCursor<'a> {
    order: &'a Order,
    pos: OrderPosition,
}

impl<'a> OrderCursor<'a> {
    /// The current position.
    pub fn position(&self) -> OrderPosition {
        self.pos
    }

    /// Advances the cursor to the next node, or to `AtEnd` if there is none.
    pub fn advance(&mut self) -> Option<NodeId> {
        match self.pos {
            OrderPosition::At(n) => {
                self.pos = match self.order.next_of(n) {
                    Some(next) => OrderPosition::At(next),
                    None => OrderPosition::AtEnd,
                };
                self.current()
            }
            OrderPosition::Nowhere | OrderPosition::AtEnd => None,
        }
    }

    /// The node at the current position, if any.
    pub fn current(&self) -> Option<NodeId> {
        match self.pos {
            OrderPosition::At(n) => Some(n),
            _ => None,
        }
    }
}
