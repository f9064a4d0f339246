//! Parameter structs for the public optimization entry points.
//!
//! Each pass takes an explicit, `Clone + Debug + Default` parameter struct
//! rather than a long argument list, following the same convention
//! `cranelift_codegen::isa::TargetIsa`'s builders use for ISA flags.

/// Parameters for `rewrite` (C4, the DAG-aware rewriter).
#[derive(Clone, Debug)]
pub struct RewriteParams {
    /// Maximum number of cuts retained per node (default 8).
    pub n_cuts_max: u8,
    /// Maximum number of library subgraphs considered per NPN class
    /// during matching (default 5).
    pub n_subgraphs_max: u8,
    /// Whether levels are recomputed incrementally as nodes are replaced.
    pub update_level: bool,
    /// Accept replacements with zero node-count gain, relying on the
    /// library's tie-break (smaller root level) to make progress.
    pub use_zero_cost: bool,
    /// Reuse the cut manager's working set across calls instead of
    /// recomputing cuts from scratch for every node.
    pub recycle_cuts: bool,
    /// Emit `debug!`-level progress logging.
    pub verbose: bool,
}

impl Default for RewriteParams {
    fn default() -> Self {
        RewriteParams {
            n_cuts_max: 8,
            n_subgraphs_max: 5,
            update_level: true,
            use_zero_cost: false,
            recycle_cuts: true,
            verbose: false,
        }
    }
}

/// Selects which supergate-collection rule the balancer uses when deciding
/// whether to expand an interior node into its parent's associative cone:
/// refcount 1 in strict mode, refcount <= 3 otherwise. See DESIGN.md "Open
/// Questions" for why this is a parameter rather than a hard-coded constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BalanceMode {
    /// Only expand interior nodes with a single fanout. Preserves sharing
    /// exactly; this is `Dar_BalanceBuildSuper`'s default path.
    Strict,
    /// Expand interior nodes with up to 3 fanouts, maximizing restructuring
    /// opportunities at the cost of some sharing.
    Relaxed,
}

/// Which tree-construction heuristic `balance` uses.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BalanceObjective {
    /// Level-preserving pairwise recombination.
    Balanced,
    /// Cut-aware recombination for a target LUT size.
    LutAware,
    /// Area-flow-driven recombination (delegates to `dam_extract`-style
    /// divisor weighting while rebuilding the tree).
    AreaFlow,
}

/// Parameters for `balance` (C5).
#[derive(Clone, Debug)]
pub struct BalanceParams {
    /// Whether to recompute levels after rebuilding.
    pub update_level: bool,
    /// Supergate-collection rule.
    pub mode: BalanceMode,
    /// Tree-construction heuristic.
    pub objective: BalanceObjective,
    /// Target LUT size for `BalanceObjective::LutAware` (ignored otherwise).
    pub lut_size: u8,
}

impl Default for BalanceParams {
    fn default() -> Self {
        BalanceParams {
            update_level: true,
            mode: BalanceMode::Strict,
            objective: BalanceObjective::Balanced,
            lut_size: 6,
        }
    }
}

/// Parameters for `refactor` (10..12-input cut factoring).
#[derive(Clone, Debug)]
pub struct RefactorParams {
    /// Maximum cut size considered for factoring (10..12; default 10).
    pub n_leaves_max: u8,
    /// Accept zero-gain replacements, as in `RewriteParams::use_zero_cost`.
    pub use_zero_cost: bool,
    /// Use the don't-care-aware "z" variant of factoring that takes the
    /// MFFC's don't-cares into account.
    pub use_dont_cares: bool,
    /// Emit `debug!`-level progress logging.
    pub verbose: bool,
}

impl Default for RefactorParams {
    fn default() -> Self {
        RefactorParams {
            n_leaves_max: 10,
            use_zero_cost: false,
            use_dont_cares: false,
            verbose: false,
        }
    }
}

/// Parameters for `dam_extract` (C6).
#[derive(Clone, Debug)]
pub struct DamParams {
    /// Minimum occurrence count for a divisor to be queued at all
    /// divisors with only one occurrence are never worth queuing.
    pub min_occurrences: u32,
    /// Emit `debug!`-level progress logging.
    pub verbose: bool,
}

impl Default for DamParams {
    fn default() -> Self {
        DamParams {
            min_occurrences: 2,
            verbose: false,
        }
    }
}

/// Parameters for `fast_extract` (C7).
#[derive(Clone, Debug)]
pub struct FxParams {
    /// Maximum number of new SOP variables to introduce (0 = unbounded).
    pub n_new_nodes_max: u32,
    /// Reject any extraction that would not reduce the literal count by at
    /// least this much cumulatively; 0 = unbounded.
    pub lit_count_max: u32,
    /// Restrict extraction to the canonical AND/XOR/MUX divisor shapes,
    /// rejecting irregular cube-free factors.
    pub canon_divs_only: bool,
    /// Emit `debug!`-level progress logging.
    pub verbose: bool,
}

impl Default for FxParams {
    fn default() -> Self {
        FxParams {
            n_new_nodes_max: 0,
            lit_count_max: 0,
            canon_divs_only: false,
            verbose: false,
        }
    }
}
