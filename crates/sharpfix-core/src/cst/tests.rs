//! Tests for CST construction and trivia ownership

use super::*;
use crate::cst::ast::{AstNode, CompilationUnit, first_significant_token};

/// Hand-built trees go through the same builder the parser uses
#[test]
fn test_builder_produces_lossless_tree() {
    let mut builder = CstBuilder::new();
    builder.start_node(CsSyntaxKind::CompilationUnit);
    builder.start_node(CsSyntaxKind::UsingDirective);
    builder.token(CsSyntaxKind::UsingKw, "using");
    builder.token(CsSyntaxKind::Whitespace, " ");
    builder.start_node(CsSyntaxKind::QualifiedName);
    builder.token(CsSyntaxKind::Ident, "System");
    builder.finish_node();
    builder.token(CsSyntaxKind::Semicolon, ";");
    builder.token(CsSyntaxKind::Newline, "\n");
    builder.finish_node();
    builder.token(CsSyntaxKind::Eof, "");
    builder.finish_node();

    let root = builder.finish();
    assert_eq!(root.kind(), CsSyntaxKind::CompilationUnit);
    assert_eq!(root.text().to_string(), "using System;\n");

    let unit = CompilationUnit::cast(root).expect("compilation unit");
    assert_eq!(unit.usings().count(), 1);
    assert!(unit.eof_token().is_some());
}

/// Documentation comments and directives above a declaration are owned by it
#[test]
fn test_declaration_owns_doc_comment_and_directive() {
    let source = "namespace N\n{\n#if DEBUG\n    /// <summary>x</summary>\n    class A { }\n#endif\n}\n";
    let (cst, errors) = parse_cs(source);
    assert!(errors.is_empty(), "{errors:?}");

    let class = cst
        .descendants()
        .find(|n| n.kind() == CsSyntaxKind::ClassDecl)
        .expect("class");
    let first = first_significant_token(&class).expect("class keyword");
    let leading = trivia::leading_of(&first);
    let kinds: Vec<_> = leading.iter().map(|p| p.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TriviaKind::Directive,
            TriviaKind::EndOfLine,
            TriviaKind::Whitespace,
            TriviaKind::DocumentationComment,
            TriviaKind::EndOfLine,
            TriviaKind::Whitespace,
        ]
    );

    // `#endif` is leading trivia of the namespace's closing brace
    let close = cst
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == CsSyntaxKind::RBrace)
        .last()
        .expect("close brace");
    assert!(
        trivia::leading_of(&close)
            .iter()
            .any(|p| p.text == "#endif")
    );
}

/// Trivia at the end of the file hangs off the empty end-of-file token
#[test]
fn test_eof_token_owns_final_trivia() {
    let (cst, _) = parse_cs("class A { }\n\n// tail\n");
    let unit = CompilationUnit::cast(cst).expect("unit");
    let eof = unit.eof_token().expect("eof");
    assert_eq!(eof.text(), "");
    assert_eq!(trivia::render(&trivia::leading_of(&eof)), "\n// tail\n");
}

#[test]
fn test_crlf_line_endings_are_single_trivia() {
    let source = "using A;\r\nusing B;\r\n";
    let (cst, errors) = parse_cs(source);
    assert!(errors.is_empty());
    assert_eq!(cst.text().to_string(), source);
    let newlines: Vec<_> = cst
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| t.kind() == CsSyntaxKind::Newline)
        .map(|t| t.text().to_string())
        .collect();
    assert_eq!(newlines, vec!["\r\n", "\r\n"]);
}
