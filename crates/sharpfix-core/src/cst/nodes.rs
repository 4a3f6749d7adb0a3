//! Type aliases for CST nodes
//!
//! These types are built on top of Rowan's generic tree types, parameterized
//! with our CsLanguage. Red nodes are not `Send`; code that crosses threads
//! carries the `GreenNode` and rebuilds a root on the other side (see
//! [`crate::Document`]).

use super::CsLanguage;

/// A node in the concrete syntax tree
///
/// # Example
///
/// ```rust,ignore
/// use sharpfix_core::cst::{CsSyntaxKind, parse_cs};
///
/// let (root, _) = parse_cs("using System;\n");
/// assert_eq!(root.kind(), CsSyntaxKind::CompilationUnit);
/// assert_eq!(root.text().to_string(), "using System;\n");
/// ```
pub type CsSyntaxNode = rowan::SyntaxNode<CsLanguage>;

/// A token in the concrete syntax tree
///
/// Trivia (whitespace, comments, directives) are tokens too; see
/// [`super::trivia`] for how they are grouped into leading and trailing
/// streams.
pub type CsSyntaxToken = rowan::SyntaxToken<CsLanguage>;

/// Either a node or a token in the CST
pub type CsSyntaxElement = rowan::SyntaxElement<CsLanguage>;

/// Iterator over child nodes
pub type CsSyntaxNodeChildren = rowan::SyntaxNodeChildren<CsLanguage>;

/// Iterator over child nodes and tokens
pub type CsSyntaxElementChildren = rowan::SyntaxElementChildren<CsLanguage>;

// Re-export common rowan types for convenience
pub use rowan::{
    Direction, GreenNode, GreenToken, NodeOrToken, TextRange, TextSize, WalkEvent,
};

/// A green child element (node or token)
pub type GreenElement = NodeOrToken<GreenNode, GreenToken>;
