//! sharpfix core
//!
//! Trivia-preserving code-fix engine for C# sources. This crate provides the
//! lossless syntax tree, trivia streams, conditional-compilation regions,
//! style settings, and the rewrite engine that code-fix providers build on.

pub mod autofix;
pub mod config;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod diagnostics;
pub mod directives;
pub mod document;
pub mod error;
pub mod indentation;
pub mod preview;
pub mod result;
pub mod semantic;

// Re-export commonly used types
pub use autofix::{
    CancellationToken, CodeFixProvider, DocumentBatch, FixContext, FixOutcome, FixOutput,
    MergeOutcome, NodeReplacement, NodeTracker, ProjectFixResult, Proposal, ReplacementMap,
    TokenReplacement, apply_fix, apply_fix_all, apply_fix_all_in_project, rewrite,
};
pub use config::{SettingsLoader, StyleSettings};
pub use cst::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken, TriviaKind, TriviaPiece, TriviaStream};
pub use diagnostics::{ViolationDescriptor, property_keys};
pub use directives::{SpanId, TreeTextSpan};
pub use document::Document;
pub use error::{ErrorKind, SharpfixError};
pub use indentation::IndentationPolicy;
pub use preview::FixPreview;
pub use result::{Result, ResultExt};
pub use semantic::{SemanticModel, SyntacticModel};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sharpfix=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
