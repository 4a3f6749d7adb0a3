//! Apply a [`ReplacementMap`] to a tree
//!
//! The rewrite is a pure function of the original tree and the map. Subtrees
//! the map does not touch are shared with the original green tree; touched
//! nodes are rebuilt bottom-up with the replacement tokens, trivia and nodes
//! spliced in.

use crate::cst::{CsSyntaxNode, CsSyntaxToken, GreenElement, GreenNode, GreenToken, NodeOrToken};

use crate::cst::ast::{first_significant_token, last_significant_token};
use crate::cst::trivia::TriviaPiece;

use super::replacement::{ReplacementMap, TokenReplacement};

/// Produce a new root with every proposal in `map` applied
pub fn rewrite(root: &CsSyntaxNode, map: &ReplacementMap) -> CsSyntaxNode {
    if map.is_empty() {
        return root.clone();
    }
    let green = rebuild(root, map);
    tracing::debug!("Rewrote tree with {} replacement(s)", map.len());
    CsSyntaxNode::new_root(green)
}

/// Rewrite `node` on its own, detached from its parent
///
/// `build` receives a fresh root over the node's green tree; proposals are
/// anchored on that root. Useful for preparing a node before splicing it
/// somewhere else.
pub fn rewrite_detached(
    node: &CsSyntaxNode,
    build: impl FnOnce(&CsSyntaxNode, &mut ReplacementMap),
) -> GreenNode {
    let root = CsSyntaxNode::new_root(node.green().into_owned());
    let mut map = ReplacementMap::new();
    build(&root, &mut map);
    rebuild(&root, &map)
}

/// Copy of `node` with the leading trivia of its first token and/or the
/// trailing trivia of its last token replaced
pub fn with_edge_trivia(
    node: &CsSyntaxNode,
    leading: Option<Vec<TriviaPiece>>,
    trailing: Option<Vec<TriviaPiece>>,
) -> GreenNode {
    rewrite_detached(node, |root, map| {
        let first = first_significant_token(root);
        let last = last_significant_token(root);
        if let (Some(first), Some(leading)) = (&first, leading) {
            map.propose_token(first, TokenReplacement::new().with_leading(leading));
        }
        if let (Some(last), Some(trailing)) = (&last, trailing) {
            map.propose_token(last, TokenReplacement::new().with_trailing(trailing));
        }
    })
}

fn rebuild(node: &CsSyntaxNode, map: &ReplacementMap) -> GreenNode {
    if !map.touches(node.text_range()) {
        return node.green().into_owned();
    }

    let mut children: Vec<GreenElement> = Vec::new();
    for child in node.children_with_tokens() {
        match child {
            NodeOrToken::Node(child) => match map.node(&child) {
                Some(replacement) => children.extend(replacement.elements.iter().cloned()),
                None => children.push(NodeOrToken::Node(rebuild(&child, map))),
            },
            NodeOrToken::Token(token) => push_token(&token, map, &mut children),
        }
    }
    GreenNode::new(node.kind().into(), children)
}

fn push_token(token: &CsSyntaxToken, map: &ReplacementMap, out: &mut Vec<GreenElement>) {
    let start = token.text_range().start();
    if token.kind().is_trivia() {
        if !map.is_dropped(start) {
            out.push(NodeOrToken::Token(token.green().to_owned()));
        }
        return;
    }

    let Some(replacement) = map.token(start) else {
        out.push(NodeOrToken::Token(token.green().to_owned()));
        return;
    };

    if let Some(leading) = &replacement.leading {
        out.extend(leading.iter().map(|p| NodeOrToken::Token(p.to_green())));
    }
    let (kind, text) = match &replacement.text {
        Some((kind, text)) => (kind.unwrap_or(token.kind()), text.as_str()),
        None => (token.kind(), token.text()),
    };
    out.push(NodeOrToken::Token(GreenToken::new(kind.into(), text)));
    if let Some(trailing) = &replacement.trailing {
        out.extend(trailing.iter().map(|p| NodeOrToken::Token(p.to_green())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofix::replacement::NodeReplacement;
    use crate::cst::trivia;
    use crate::cst::{CsSyntaxKind, TriviaStream, parse_cs};

    fn token(root: &CsSyntaxNode, text: &str) -> CsSyntaxToken {
        root.descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.text() == text)
            .expect("token")
    }

    #[test]
    fn test_empty_map_is_identity() {
        let (root, _) = parse_cs("class A { }\n");
        let out = rewrite(&root, &ReplacementMap::new());
        assert_eq!(out.text().to_string(), "class A { }\n");
    }

    #[test]
    fn test_leading_trivia_replaced() {
        let source = "class A\n{\n\n\n    int x;\n}\n";
        let (root, _) = parse_cs(source);
        let int_kw = token(&root, "int");
        let mut map = ReplacementMap::new();
        map.propose_token(
            &int_kw,
            TokenReplacement::new().with_leading(vec![TriviaPiece::whitespace("    ")]),
        );
        let out = rewrite(&root, &map);
        assert_eq!(out.text().to_string(), "class A\n{\n    int x;\n}\n");
    }

    #[test]
    fn test_both_sides_of_a_stream() {
        let source = "class A {\n\n    int x;\n}\n";
        let (root, _) = parse_cs(source);
        let open = token(&root, "{");
        let mut stream = TriviaStream::after(&open);
        let removed = stream.remove_blank_lines_after(0);
        assert_eq!(removed, 1);

        let mut map = ReplacementMap::new();
        let split = stream.split_index();
        let next = trivia::next_significant(&open).expect("next");
        map.propose_token(
            &open,
            TokenReplacement::new().with_trailing(stream.pieces()[..split].to_vec()),
        );
        map.propose_token(
            &next,
            TokenReplacement::new().with_leading(stream.pieces()[split..].to_vec()),
        );
        let out = rewrite(&root, &map);
        assert_eq!(out.text().to_string(), "class A {\n    int x;\n}\n");
    }

    #[test]
    fn test_node_removed_and_shared_elsewhere() {
        let source = "class A { int x; }\nclass B { int y; }\n";
        let (root, _) = parse_cs(source);
        let field = root
            .descendants()
            .find(|n| n.kind() == CsSyntaxKind::FieldDecl)
            .expect("field");
        let mut map = ReplacementMap::new();
        map.propose_node(&field, NodeReplacement::remove());
        let out = rewrite(&root, &map);
        assert_eq!(out.text().to_string(), "class A { }\nclass B { int y; }\n");

        // The untouched second class shares its green node
        let before = root.children().nth(1).expect("class B");
        let after = out.children().nth(1).expect("class B");
        assert_eq!(before.green().into_owned(), after.green().into_owned());
    }

    #[test]
    fn test_token_replacement_can_change_kind() {
        let (root, _) = parse_cs("public static class A { }");
        let public = token(&root, "public");
        let mut map = ReplacementMap::new();
        map.propose_token(
            &public,
            TokenReplacement::new().with_token(CsSyntaxKind::InternalKw, "internal"),
        );
        let out = rewrite(&root, &map);
        assert_eq!(out.text().to_string(), "internal static class A { }");
        let first = out.first_token().expect("token");
        assert_eq!(first.kind(), CsSyntaxKind::InternalKw);
    }

    #[test]
    fn test_detached_edge_trivia() {
        let source = "class A\n{\n    /// <summary>x</summary>\n    int x; // note\n}\n";
        let (root, _) = parse_cs(source);
        let field = root
            .descendants()
            .find(|n| n.kind() == CsSyntaxKind::FieldDecl)
            .expect("field");
        let green = with_edge_trivia(
            &field,
            Some(vec![TriviaPiece::whitespace("\t")]),
            Some(vec![TriviaPiece::end_of_line("\n")]),
        );
        let detached = CsSyntaxNode::new_root(green);
        assert_eq!(detached.text().to_string(), "\tint x;\n");
    }
}
