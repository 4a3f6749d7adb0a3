//! Braces around embedded statements
//!
//! `if (x) y();` becomes a block with the braces on their own lines at the
//! indentation of the owning statement. Comments around the embedded
//! statement stay with it. No fix is offered when a directive line sits in
//! or right after the statement, since the braces would have to straddle it.

use sharpfix_core::autofix::{
    CodeFixProvider, FixContext, NodeReplacement, Proposal, ReplacementMap, TokenReplacement,
    with_edge_trivia,
};
use sharpfix_core::cst::ast::{
    AstNode, EmbeddingStatement, first_significant_token, last_significant_token,
};
use sharpfix_core::cst::trivia::{self, TriviaPiece, TriviaStream};
use sharpfix_core::cst::{CsSyntaxKind, CsSyntaxNode, GreenElement, GreenNode, GreenToken, NodeOrToken};
use sharpfix_core::indentation::line_indentation;
use sharpfix_core::{Result, ViolationDescriptor};

/// Braces must not be omitted
pub const BRACES_OMITTED: &str = "SA1503";

/// The embedded statement the descriptor points at, with its owner
fn target(ctx: &FixContext<'_>, descriptor: &ViolationDescriptor) -> Option<(EmbeddingStatement, CsSyntaxNode)> {
    let covering = ctx.covering_node(descriptor.location())?;
    for node in covering.ancestors() {
        if let Some(owner) = node.parent().and_then(EmbeddingStatement::cast)
            && owner.embedded().as_ref() == Some(&node)
        {
            return braceable(owner, node);
        }
        if let Some(owner) = EmbeddingStatement::cast(node.clone())
            && let Some(embedded) = owner.embedded()
        {
            return braceable(owner, embedded);
        }
    }
    None
}

fn braceable(owner: EmbeddingStatement, embedded: CsSyntaxNode) -> Option<(EmbeddingStatement, CsSyntaxNode)> {
    let else_if =
        owner.syntax().kind() == CsSyntaxKind::ElseClause && embedded.kind() == CsSyntaxKind::IfStmt;
    (embedded.kind() != CsSyntaxKind::Block && !else_if).then_some((owner, embedded))
}

/// Whether a directive line is inside the statement or between it and the
/// next token
fn directive_nearby(owner: &EmbeddingStatement) -> bool {
    let syntax = owner.syntax();
    let inside = syntax
        .descendants_with_tokens()
        .any(|e| e.kind() == CsSyntaxKind::Directive);
    let after = last_significant_token(syntax).is_some_and(|t| TriviaStream::after(&t).has_directive());
    inside || after
}

fn green(pieces: &[TriviaPiece]) -> impl Iterator<Item = GreenElement> + '_ {
    pieces.iter().map(|p| NodeOrToken::Token(p.to_green()))
}

#[derive(Debug, Default)]
pub struct BracesCodeFixProvider;

impl BracesCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for BracesCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        &[BRACES_OMITTED]
    }

    fn title(&self) -> &'static str {
        "Wrap with braces"
    }

    fn is_offered(&self, ctx: &FixContext<'_>, descriptor: &ViolationDescriptor) -> bool {
        if descriptor.no_code_fix() {
            return false;
        }
        match target(ctx, descriptor) {
            Some((owner, _)) => !directive_nearby(&owner),
            None => true,
        }
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let Some((owner, embedded)) = target(ctx, descriptor) else {
            return Ok(Proposal::Declined("no embedded statement without braces".into()));
        };
        let (Some(first), Some(last), Some(owner_first)) = (
            first_significant_token(&embedded),
            last_significant_token(&embedded),
            first_significant_token(owner.syntax()),
        ) else {
            return Ok(Proposal::Declined("statement has no tokens".into()));
        };
        let Some(before) = trivia::prev_significant(&first) else {
            return Ok(Proposal::Declined("statement has no owner token".into()));
        };

        let eol = ctx.end_of_line();
        let outer = line_indentation(&owner_first);
        let inner = format!("{}{}", outer, ctx.indentation().render(1));

        // The `{` goes on the line after the condition unless a line break
        // is already there
        let head = trivia::trailing_of(&before);
        let mut brace_leading = Vec::new();
        if !head.iter().any(TriviaPiece::is_end_of_line) {
            let mut kept = head.clone();
            while kept.last().is_some_and(TriviaPiece::is_whitespace) {
                kept.pop();
            }
            if kept != head {
                edits.propose_token(&before, TokenReplacement::new().with_trailing(kept));
            }
            brace_leading.push(TriviaPiece::end_of_line(eol));
        }
        if !outer.is_empty() {
            brace_leading.push(TriviaPiece::whitespace(outer.as_str()));
        }

        let mut leading = TriviaStream::from_pieces(trivia::leading_of(&first), true);
        leading.set_indentation(&inner);
        let tail = trivia::trailing_of(&last);
        let tail_ends_line = tail.last().is_some_and(TriviaPiece::is_end_of_line);
        let (statement_trailing, brace_trailing) = if tail_ends_line {
            (tail, vec![TriviaPiece::end_of_line(eol)])
        } else {
            (vec![TriviaPiece::end_of_line(eol)], tail)
        };
        let statement = with_edge_trivia(
            &embedded,
            Some(leading.pieces().to_vec()),
            Some(statement_trailing),
        );

        let mut children: Vec<GreenElement> = green(&brace_leading).collect();
        children.push(NodeOrToken::Token(GreenToken::new(CsSyntaxKind::LBrace.into(), "{")));
        children.push(NodeOrToken::Token(TriviaPiece::end_of_line(eol).to_green()));
        children.push(NodeOrToken::Node(statement));
        if !outer.is_empty() {
            children.push(NodeOrToken::Token(TriviaPiece::whitespace(outer.as_str()).to_green()));
        }
        children.push(NodeOrToken::Token(GreenToken::new(CsSyntaxKind::RBrace.into(), "}")));
        children.extend(green(&brace_trailing));
        let block = GreenNode::new(CsSyntaxKind::Block.into(), children);

        if !edits
            .propose_node(&embedded, NodeReplacement::with(block))
            .is_applied()
        {
            return Ok(Proposal::Declined("statement already being rewritten".into()));
        }
        Ok(Proposal::Edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::TextRange;
    use sharpfix_core::autofix::FixOutcome;
    use sharpfix_core::config::StyleSettings;
    use sharpfix_core::{Document, SyntacticModel, apply_fix};

    fn at(source: &str, needle: &str) -> TextRange {
        let start = source.find(needle).expect("needle") as u32;
        TextRange::at(start.into(), (needle.len() as u32).into())
    }

    fn outcome(source: &str, needle: &str) -> FixOutcome {
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptor = ViolationDescriptor::new(BRACES_OMITTED, at(source, needle));
        apply_fix(&BracesCodeFixProvider, &ctx, &descriptor).unwrap()
    }

    fn fix(source: &str, needle: &str) -> String {
        outcome(source, needle)
            .document()
            .map_or_else(|| source.to_string(), Document::text)
    }

    fn method(body: &str) -> String {
        format!("class C\n{{\n    void M()\n    {{\n{body}    }}\n}}\n")
    }

    #[test]
    fn test_same_line_statement() {
        let source = method("        if (x) y();\n");
        assert_eq!(
            fix(&source, "y();"),
            method("        if (x)\n        {\n            y();\n        }\n")
        );
    }

    #[test]
    fn test_next_line_statement_keeps_comment() {
        let source = method("        while (x)\n            y(); // again\n        z();\n");
        assert_eq!(
            fix(&source, "while"),
            method("        while (x)\n        {\n            y(); // again\n        }\n        z();\n")
        );
    }

    #[test]
    fn test_else_branch() {
        let source = method("        if (x) { a(); }\n        else b();\n");
        insta::assert_snapshot!(fix(&source, "b();"), @r"
        class C
        {
            void M()
            {
                if (x) { a(); }
                else
                {
                    b();
                }
            }
        }
        ");
    }

    #[test]
    fn test_not_offered_under_conditional_directive() {
        let source = method("#if DEBUG\n        if (x) y();\n#endif\n");
        assert_eq!(outcome(&source, "y();"), FixOutcome::NotOffered);
    }

    #[test]
    fn test_block_is_left_alone() {
        let source = method("        if (x) { y(); }\n");
        assert_eq!(fix(&source, "if"), source);
    }
}
