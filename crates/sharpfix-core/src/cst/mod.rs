//! Concrete Syntax Tree (CST) for the C# subset
//!
//! Lossless syntax tree built on Rowan. The CST preserves all source
//! information including whitespace, comments, documentation comments and
//! preprocessor directive lines, so fixes can rewrite exactly the trivia they
//! mean to and leave everything else byte-for-byte intact.
//!
//! ## Architecture
//!
//! - **Green Tree**: immutable, position-independent, cheap to clone and
//!   `Send`. Rewrites always produce a new green root.
//! - **Red Tree**: on-demand view with parent pointers and absolute offsets,
//!   used for navigation and anchor resolution.
//!
//! ## Trivia Handling
//!
//! Trivia are tokens:
//! - **Trailing trivia**: whitespace and comments after a token, up to and
//!   including the first line break
//! - **Leading trivia**: everything else before a token, stored inside the
//!   deepest node that starts at that token
//!
//! This enables lossless representation: `parse_cs(source).0.text() == source`
//!
//! ## Example
//!
//! ```rust,ignore
//! use sharpfix_core::cst::{CsSyntaxKind, parse_cs};
//!
//! let (cst, errors) = parse_cs("using System; // comment\n");
//! assert!(errors.is_empty());
//! assert_eq!(cst.text().to_string(), "using System; // comment\n");
//!
//! for token in cst.descendants_with_tokens().filter_map(|e| e.into_token()) {
//!     if token.kind() == CsSyntaxKind::CommentLine {
//!         println!("Found comment: {}", token.text());
//!     }
//! }
//! ```

mod builder;
mod language;
mod lexer;
mod nodes;
mod parser;
mod syntax_kind;

pub mod ast;
pub mod trivia;

pub use builder::CstBuilder;
pub use language::CsLanguage;
pub use lexer::{CstLexResult, CstSpan, CstToken, LexerError, lex_with_trivia};
pub use nodes::*;
pub use parser::{ParseError, ParseErrorKind, parse_cs};
pub use syntax_kind::CsSyntaxKind;
pub use trivia::{TriviaKind, TriviaPiece, TriviaStream};

#[cfg(test)]
mod tests;
