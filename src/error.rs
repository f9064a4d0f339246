//! Error types for the AIG core.
//!
//! Recoverable conditions are reported through `AigError`/`AigResult`, in the
//! same spirit as `cranelift_codegen::result::{CodegenError, CodegenResult}`:
//! a single enum covering every public entry point, built with `failure`
//! rather than hand-rolled `Display`/`Error` impls.

use failure_derive::Fail;

/// The outcome of a fallible arena or pass-level operation.
#[derive(Fail, Debug, Clone, PartialEq, Eq)]
pub enum AigError {
    /// A caller supplied two fanins referring to the same variable with
    /// conflicting requirements (e.g. a cube literal pair that can never be
    /// satisfied together).
    #[fail(display = "duplicate or contradictory fanins")]
    DuplicateFanins,

    /// `replace` would have introduced a cycle; the offending operation was
    /// rolled back and the node graph is unchanged.
    #[fail(display = "replacement would create a cycle")]
    CycleDetected,

    /// A pass-supplied budget (e.g. `max_new_nodes`) was exhausted before the
    /// work queue drained. The caller may treat the partial result as valid.
    #[fail(display = "node/extraction budget exhausted")]
    OutOfBudget,

    /// The caller's `time_to_quit` deadline elapsed. The partial result is
    /// valid.
    #[fail(display = "pass aborted: deadline exceeded")]
    Timeout,

    /// An internal consistency violation. These are bugs; the string names
    /// the violated invariant.
    #[fail(display = "internal error: {}", _0)]
    Internal(&'static str),
}

/// Result alias used by every public operation in this crate.
pub type AigResult<T> = Result<T, AigError>;
