//! Trivia-preserving rewrite engine
//!
//! Fixes never edit text. Providers propose replacements for tokens, their
//! surrounding trivia, or whole nodes, keyed by position in the original
//! tree ([`ReplacementMap`]). A single pure pass ([`rewrite`]) then builds
//! the new tree, sharing every untouched subtree with the old one.
//!
//! - [`replacement`]: proposal map and merge rules
//! - [`rewriter`]: applies a map to a tree
//! - [`tracking`]: stable ids for nodes moved by reordering fixes
//! - [`engine`]: providers, single fix, fix-all in a document or project
//! - [`cancel`]: cooperative cancellation

pub mod cancel;
pub mod engine;
pub mod replacement;
pub mod rewriter;
pub mod tracking;

pub use cancel::CancellationToken;
pub use engine::{
    BatchSummary, CodeFixProvider, DocumentBatch, FixContext, FixOutcome, FixOutput,
    ProjectFixResult, Proposal, apply_fix, apply_fix_all, apply_fix_all_in_project,
};
pub use replacement::{
    MergeOutcome, NodeReplacement, ReplacementField, ReplacementMap, TokenReplacement,
};
pub use rewriter::{rewrite, rewrite_detached, with_edge_trivia};
pub use tracking::{NodeTracker, TrackedId};
