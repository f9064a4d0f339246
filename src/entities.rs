//! Entity references used throughout the AIG arena.
//!
//! Every object the optimizer manipulates — nodes, the cuts attached to a
//! node, the divisors mined by the extractors — is addressed by a small
//! `u32`-backed index rather than a pointer, for the reasons laid out in
//! `cranelift_codegen::ir::entities`: Rust's ownership rules make genuine
//! graphs of references painful, and a 32-bit index is a quarter the size of
//! a 64-bit pointer. `cranelift_entity::entity_impl!` gives each index type
//! `EntityRef`, `Copy`, `Ord`, and `Display` for free so it can key a
//! `PrimaryMap`/`SecondaryMap`.

use cranelift_entity::{entity_impl, EntityRef};
use std::fmt;

/// A reference to a node in the AIG arena. Node `0` is always the constant-one
/// node (see `Aig::const_one`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(u32);
entity_impl!(NodeId, "n");

impl NodeId {
    /// The reserved id of the constant-one node.
    pub const CONST1: NodeId = NodeId(0);
}

/// A literal: a node id paired with a polarity, encoded as `2*id + compl` so
/// that the complement bit rides in the low bit of a single machine word
///. `EdgeRef` is used both as an operand
/// (a fanin) and as a result (the possibly-complemented edge returned by
/// `mk_and`/`mk_xor`/`mk_mux`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeRef(u32);

impl EdgeRef {
    /// Builds an edge pointing at `node` with the given complement attribute.
    pub fn new(node: NodeId, complement: bool) -> Self {
        EdgeRef((node.index() as u32) << 1 | complement as u32)
    }

    // `NodeId::index`/`NodeId::new` come from the `EntityRef` trait
    // (imported above); everything else in this module treats `NodeId` as
    // an opaque handle and never looks at its bit pattern directly.

    /// A non-complemented edge to `node`.
    pub fn positive(node: NodeId) -> Self {
        EdgeRef::new(node, false)
    }

    /// The constant-one edge.
    pub fn const1() -> Self {
        EdgeRef::positive(NodeId::CONST1)
    }

    /// The constant-zero edge (constant-one, complemented).
    pub fn const0() -> Self {
        EdgeRef::new(NodeId::CONST1, true)
    }

    /// The node this edge points at, ignoring polarity.
    pub fn node(self) -> NodeId {
        NodeId::new((self.0 >> 1) as usize)
    }

    /// Whether this edge carries the complement attribute.
    pub fn is_complement(self) -> bool {
        self.0 & 1 != 0
    }

    /// Returns the same node with the complement attribute flipped.
    pub fn invert(self) -> Self {
        EdgeRef(self.0 ^ 1)
    }

    /// Returns the same node with the complement attribute set to `c` XORed
    /// with the current one. Used when lifting a fanin's polarity onto an
    /// edge derived from it.
    pub fn with_complement_xor(self, c: bool) -> Self {
        if c {
            self.invert()
        } else {
            self
        }
    }

    /// The raw literal value `2*id + compl`, e.g. for use as a hash key.
    pub fn literal(self) -> u32 {
        self.0
    }

    /// Reconstructs an edge from a raw literal previously obtained via
    /// `literal()`, e.g. when unpacking a divisor key stored as a bare
    /// `u32` pair.
    pub fn from_literal(lit: u32) -> Self {
        EdgeRef(lit)
    }

    /// `true` if this edge is the constant-zero edge.
    pub fn is_const0(self) -> bool {
        self == EdgeRef::const0()
    }

    /// `true` if this edge is the constant-one edge.
    pub fn is_const1(self) -> bool {
        self == EdgeRef::const1()
    }
}

impl fmt::Debug for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_complement() {
            write!(f, "!{}", self.node())
        } else {
            write!(f, "{}", self.node())
        }
    }
}

impl fmt::Display for EdgeRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The kind of a node in the arena.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Kind {
    /// The single constant-one node at id 0.
    Const1,
    /// A primary input terminal.
    PrimaryInput,
    /// A two-input AND gate.
    And,
    /// A two-input XOR gate (fanins are never complemented; net polarity
    /// rides on the edges pointing at this node).
    Xor,
    /// A three-input multiplexer `cond ? then : else`.
    Mux,
    /// A primary output. Its single fanin is the driver.
    PrimaryOutput,
    /// A transparent relay used while a replacement is in flight
    ///. No `Buf` nodes survive past the end of a pass.
    Buf,
}

impl Kind {
    /// Whether nodes of this kind carry two fanins (`Fanin0`/`Fanin1`) as
    /// opposed to zero (`Const1`/`PrimaryInput`), one (`Buf`/`PrimaryOutput`)
    /// or three (`Mux`).
    pub fn is_binary(self) -> bool {
        matches!(self, Kind::And | Kind::Xor)
    }
}
