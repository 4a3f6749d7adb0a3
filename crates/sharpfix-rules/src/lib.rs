//! sharpfix rules
//!
//! Code-fix providers built on the `sharpfix-core` rewrite engine: layout
//! and blank-line fixes, using-directive and member ordering, modifier
//! ordering, documentation synthesis, file headers and file names.
//! [`CodeFixRegistry`] maps rule ids to providers and exposes the single-fix
//! and fix-all entry points.

pub mod builtin;
pub mod documentation;
pub mod registry;
pub mod reorder;

// Re-export commonly used types
pub use builtin::BuiltinFixes;
pub use documentation::DocumentationCodeFixProvider;
pub use registry::CodeFixRegistry;
pub use reorder::members::{MemberOrderCodeFixProvider, member_order_violations};
pub use reorder::modifiers::ModifierOrderCodeFixProvider;
pub use reorder::usings::UsingsCodeFixProvider;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
