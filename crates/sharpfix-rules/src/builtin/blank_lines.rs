//! Blank-line layout fixes
//!
//! Every fix edits one trivia stream: the trivia between two significant
//! tokens, looked at as a whole regardless of which token owns each piece.
//! Fix-all gathers the descriptors of each stream and edits it once, from
//! the last anchor to the first, so earlier anchors keep their indices.

use indexmap::IndexMap;
use rowan::TextSize;
use sharpfix_core::autofix::{BatchSummary, CodeFixProvider, FixContext, Proposal, ReplacementMap};
use sharpfix_core::cst::ast::{AstNode, MemberDecl, first_significant_token};
use sharpfix_core::cst::trivia::{self, TriviaPiece, TriviaStream};
use sharpfix_core::{CsSyntaxKind, Result, ViolationDescriptor};

/// Opening braces must not be followed by blank line
pub const OPENING_BRACE_FOLLOWED_BY_BLANK: &str = "SA1505";
/// Code must not contain multiple blank lines in a row
pub const MULTIPLE_BLANK_LINES: &str = "SA1507";
/// Closing braces must not be preceded by blank line
pub const CLOSING_BRACE_PRECEDED_BY_BLANK: &str = "SA1508";
/// Single-line comments must not be followed by blank line
pub const COMMENT_FOLLOWED_BY_BLANK: &str = "SA1512";
/// Closing brace must be followed by blank line
pub const CLOSING_BRACE_NOT_FOLLOWED_BY_BLANK: &str = "SA1513";
/// Single-line comment must be preceded by blank line
pub const COMMENT_NOT_PRECEDED_BY_BLANK: &str = "SA1515";
/// Elements must be separated by blank line
pub const ELEMENTS_NOT_SEPARATED: &str = "SA1516";

const RULES: &[&str] = &[
    OPENING_BRACE_FOLLOWED_BY_BLANK,
    MULTIPLE_BLANK_LINES,
    CLOSING_BRACE_PRECEDED_BY_BLANK,
    COMMENT_FOLLOWED_BY_BLANK,
    CLOSING_BRACE_NOT_FOLLOWED_BY_BLANK,
    COMMENT_NOT_PRECEDED_BY_BLANK,
    ELEMENTS_NOT_SEPARATED,
];

/// Where in its stream an edit applies
///
/// `Whole` sorts below every piece so stream-wide edits run last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Anchor {
    Whole,
    Piece(usize),
}

/// A descriptor resolved against the original tree
struct Located {
    stream: TriviaStream,
    anchor: Anchor,
}

impl Located {
    fn piece(stream: TriviaStream, index: usize) -> Self {
        Self {
            stream,
            anchor: Anchor::Piece(index),
        }
    }
}

/// The stream holding the trivia piece at `offset`, and the piece's index
fn stream_at(ctx: &FixContext<'_>, offset: TextSize) -> Option<(TriviaStream, usize)> {
    let token = ctx.root().token_at_offset(offset).right_biased()?;
    if !token.kind().is_trivia() {
        return None;
    }
    let next = trivia::next_significant(&token)?;
    let stream = TriviaStream::before(&next);
    let index = stream.piece_at(offset)?;
    Some((stream, index))
}

fn is_blank(stream: &TriviaStream, line: std::ops::Range<usize>) -> bool {
    stream.is_line_start(line.start)
        && stream.pieces()[line.clone()]
            .last()
            .is_some_and(TriviaPiece::is_end_of_line)
        && stream.pieces()[line].iter().all(|p| p.kind.is_layout())
}

/// Whether line start `at` directly follows a blank line
fn follows_blank_line(stream: &TriviaStream, at: usize) -> bool {
    at > 0 && is_blank(stream, stream.line_start_of(at - 1)..at)
}

fn locate(ctx: &FixContext<'_>, descriptor: &ViolationDescriptor) -> Option<Located> {
    let offset = descriptor.location().start();
    let brace = |kind: CsSyntaxKind| ctx.token_at(offset).filter(|t| t.kind() == kind);
    match descriptor.rule_id() {
        OPENING_BRACE_FOLLOWED_BY_BLANK => {
            let brace = brace(CsSyntaxKind::LBrace)?;
            Some(Located::piece(TriviaStream::after(&brace), 0))
        }
        CLOSING_BRACE_NOT_FOLLOWED_BY_BLANK => {
            let brace = brace(CsSyntaxKind::RBrace)?;
            Some(Located::piece(TriviaStream::after(&brace), 0))
        }
        CLOSING_BRACE_PRECEDED_BY_BLANK => {
            let stream = TriviaStream::before(&brace(CsSyntaxKind::RBrace)?);
            let end = stream.len();
            Some(Located::piece(stream, end))
        }
        MULTIPLE_BLANK_LINES => Some(Located {
            stream: TriviaStream::before(&ctx.token_at(offset)?),
            anchor: Anchor::Whole,
        }),
        COMMENT_FOLLOWED_BY_BLANK | COMMENT_NOT_PRECEDED_BY_BLANK => {
            let (stream, index) = stream_at(ctx, offset)?;
            Some(Located::piece(stream, index))
        }
        ELEMENTS_NOT_SEPARATED => {
            let member = ctx.find::<MemberDecl>(descriptor)?;
            let stream = TriviaStream::before(&first_significant_token(member.syntax())?);
            stream.prev_token()?;
            let at = stream.split_index();
            Some(Located::piece(stream, at))
        }
        _ => None,
    }
}

/// Drop blank lines after the line of the `{`
fn after_opening_brace(stream: &mut TriviaStream) -> bool {
    stream.remove_blank_lines_after(0) > 0
}

/// Drop blank lines between the previous line and the `}`
fn before_closing_brace(stream: &mut TriviaStream, end: usize) -> bool {
    let end = stream.line_start_of(end);
    if !stream.is_line_start(end) {
        return false;
    }
    let mut start = end;
    while follows_blank_line(stream, start) {
        start = stream.line_start_of(start - 1);
    }
    if start == end {
        return false;
    }
    stream.remove(start..end);
    true
}

/// Insert a blank line after the line of the `}`
fn after_closing_brace(stream: &mut TriviaStream, eol: &str) -> bool {
    let at = stream.line_end_of(0);
    let ends_line = at > 0 && stream.pieces()[at - 1].is_end_of_line();
    if !ends_line || stream.first_non_blank_line(at) != at {
        return false;
    }
    stream.insert_blank_line_at(at, eol);
    true
}

fn after_comment(stream: &mut TriviaStream, index: usize) -> bool {
    stream.pieces().get(index).is_some_and(TriviaPiece::is_comment)
        && stream.remove_blank_lines_after(index) > 0
}

fn before_comment(stream: &mut TriviaStream, index: usize, eol: &str) -> bool {
    if !stream.pieces().get(index).is_some_and(TriviaPiece::is_comment) {
        return false;
    }
    let at = stream.line_start_of(index);
    let own_line = stream.is_line_start(at)
        && stream.pieces()[at..index].iter().all(TriviaPiece::is_whitespace);
    // Nothing to separate from at the top of the file
    if !own_line || (at == 0 && stream.prev_token().is_none()) || follows_blank_line(stream, at) {
        return false;
    }
    stream.insert_blank_line_at(at, eol);
    true
}

fn before_member(stream: &mut TriviaStream, at: usize, eol: &str) -> bool {
    let separated = follows_blank_line(stream, at) || stream.first_non_blank_line(at) != at;
    if !stream.is_line_start(at) || separated {
        return false;
    }
    stream.insert_blank_line_at(at, eol);
    true
}

/// Rules that edit in front of their anchor; they run after the other
/// edits sharing that anchor
fn edits_before_anchor(rule: &str) -> bool {
    matches!(rule, COMMENT_NOT_PRECEDED_BY_BLANK | ELEMENTS_NOT_SEPARATED)
}

/// Apply the edit of `rule` to `stream`; `false` when nothing changes
fn apply(rule: &str, stream: &mut TriviaStream, anchor: Anchor, eol: &str) -> bool {
    match (rule, anchor) {
        (MULTIPLE_BLANK_LINES, _) => stream.collapse_blank_lines(1) > 0,
        (_, Anchor::Whole) => false,
        (OPENING_BRACE_FOLLOWED_BY_BLANK, _) => after_opening_brace(stream),
        (CLOSING_BRACE_PRECEDED_BY_BLANK, Anchor::Piece(end)) => before_closing_brace(stream, end),
        (COMMENT_FOLLOWED_BY_BLANK, Anchor::Piece(i)) => after_comment(stream, i),
        (CLOSING_BRACE_NOT_FOLLOWED_BY_BLANK, _) => after_closing_brace(stream, eol),
        (COMMENT_NOT_PRECEDED_BY_BLANK, Anchor::Piece(i)) => before_comment(stream, i, eol),
        (ELEMENTS_NOT_SEPARATED, Anchor::Piece(at)) => before_member(stream, at, eol),
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct BlankLinesCodeFixProvider;

impl BlankLinesCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for BlankLinesCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        RULES
    }

    fn title(&self) -> &'static str {
        "Fix blank lines"
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let Some(Located { mut stream, anchor }) = locate(ctx, descriptor) else {
            return Ok(Proposal::Declined(format!(
                "no {} anchor at the reported location",
                descriptor.rule_id()
            )));
        };
        if !apply(descriptor.rule_id(), &mut stream, anchor, ctx.end_of_line()) {
            return Ok(Proposal::Declined("blank lines already as required".into()));
        }
        let outcome = edits.propose_stream(&stream);
        if !outcome.is_applied() {
            return Ok(Proposal::Declined(format!("trivia not rewritable: {outcome:?}")));
        }
        Ok(Proposal::Edits)
    }

    fn propose_all(
        &self,
        ctx: &FixContext<'_>,
        descriptors: &[ViolationDescriptor],
        edits: &mut ReplacementMap,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut streams: IndexMap<TextSize, (TriviaStream, Vec<(Anchor, &str)>)> = IndexMap::new();
        for descriptor in descriptors {
            ctx.cancellation().check()?;
            let located = locate(ctx, descriptor);
            let Some((located, key)) =
                located.and_then(|l| l.stream.start_offset().map(|key| (l, key)))
            else {
                tracing::debug!("{} declined: no anchor", descriptor);
                summary.declined += 1;
                continue;
            };
            streams
                .entry(key)
                .or_insert_with(|| (located.stream, Vec::new()))
                .1
                .push((located.anchor, descriptor.rule_id()));
        }

        for (mut stream, mut anchors) in streams.into_values() {
            anchors.sort_by_key(|&(anchor, rule)| {
                std::cmp::Reverse((anchor, !edits_before_anchor(rule)))
            });
            let mut changed = 0;
            for (anchor, rule) in anchors {
                if apply(rule, &mut stream, anchor, ctx.end_of_line()) {
                    changed += 1;
                } else {
                    summary.declined += 1;
                }
            }
            if changed == 0 {
                continue;
            }
            let outcome = edits.propose_stream(&stream);
            if outcome.is_applied() {
                summary.proposed += changed;
            } else {
                tracing::warn!("Blank-line edits dropped: {:?}", outcome);
                summary.conflicts += changed;
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::TextRange;
    use sharpfix_core::config::StyleSettings;
    use sharpfix_core::{Document, SyntacticModel, apply_fix, apply_fix_all};

    fn at(source: &str, needle: &str) -> TextRange {
        let start = source.find(needle).expect("needle") as u32;
        TextRange::at(start.into(), (needle.len() as u32).into())
    }

    fn fix(source: &str, rule: &str, location: TextRange) -> String {
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptor = ViolationDescriptor::new(rule, location);
        apply_fix(&BlankLinesCodeFixProvider, &ctx, &descriptor)
            .unwrap()
            .document()
            .map_or_else(|| source.to_string(), Document::text)
    }

    #[test]
    fn test_blank_line_after_comment_is_removed() {
        let source = "class C\n{\n    void M()\n    {\n        // comment\n\n        int x;\n    }\n}\n";
        assert_eq!(
            fix(source, COMMENT_FOLLOWED_BY_BLANK, at(source, "// comment")),
            "class C\n{\n    void M()\n    {\n        // comment\n        int x;\n    }\n}\n"
        );
    }

    #[test]
    fn test_trailing_comment_keeps_following_blank_line_owner() {
        // The comment sits in the brace's trailing trivia; the blank line
        // is in the next token's leading trivia
        let source = "class C\n{ // open\n\n    int x;\n}\n";
        assert_eq!(
            fix(source, COMMENT_FOLLOWED_BY_BLANK, at(source, "// open")),
            "class C\n{ // open\n    int x;\n}\n"
        );
    }

    #[test]
    fn test_opening_and_closing_braces() {
        let source = "class C\n{\n\n\n    int x;\n\n}\n";
        let open = fix(source, OPENING_BRACE_FOLLOWED_BY_BLANK, at(source, "{"));
        assert_eq!(open, "class C\n{\n    int x;\n\n}\n");
        let close = fix(&open, CLOSING_BRACE_PRECEDED_BY_BLANK, at(&open, "}"));
        assert_eq!(close, "class C\n{\n    int x;\n}\n");
    }

    #[test]
    fn test_multiple_blank_lines_collapse() {
        let source = "class C\n{\n    int x;\n\n\n\n    int y;\n}\n";
        assert_eq!(
            fix(source, MULTIPLE_BLANK_LINES, at(source, "int y")),
            "class C\n{\n    int x;\n\n    int y;\n}\n"
        );
    }

    #[test]
    fn test_closing_brace_followed_by_blank_line() {
        let source = "class C\n{\n    void A()\n    {\n    }\n    void B()\n    {\n    }\n}\n";
        let location = at(source, "}\n    void B");
        assert_eq!(
            fix(source, CLOSING_BRACE_NOT_FOLLOWED_BY_BLANK, location),
            "class C\n{\n    void A()\n    {\n    }\n\n    void B()\n    {\n    }\n}\n"
        );
    }

    #[test]
    fn test_comment_preceded_by_blank_line() {
        let source = "class C\n{\n    int x;\n    // y\n    int y;\n}\n";
        assert_eq!(
            fix(source, COMMENT_NOT_PRECEDED_BY_BLANK, at(source, "// y")),
            "class C\n{\n    int x;\n\n    // y\n    int y;\n}\n"
        );
    }

    #[test]
    fn test_elements_separated_before_documentation() {
        let source = "class C\n{\n    int x;\n    /// <summary>Y.</summary>\n    int y;\n}\n";
        assert_eq!(
            fix(source, ELEMENTS_NOT_SEPARATED, at(source, "y;")),
            "class C\n{\n    int x;\n\n    /// <summary>Y.</summary>\n    int y;\n}\n"
        );
    }

    #[test]
    fn test_nothing_to_do_leaves_text_alone() {
        let source = "class C\n{\n    int x;\n\n    int y;\n}\n";
        assert_eq!(fix(source, ELEMENTS_NOT_SEPARATED, at(source, "y;")), source);
        assert_eq!(fix(source, MULTIPLE_BLANK_LINES, at(source, "int y")), source);
    }

    fn fix_all(source: &str, descriptors: &[ViolationDescriptor]) -> String {
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        apply_fix_all(&BlankLinesCodeFixProvider, &ctx, descriptors)
            .unwrap()
            .document()
            .map_or_else(|| source.to_string(), Document::text)
    }

    #[test]
    fn test_fix_all_edits_a_shared_stream_once() {
        let source = "class C\n{\n    void M()\n    {\n        // first\n\n        // second\n\n        int x;\n    }\n}\n";
        let descriptors = [
            ViolationDescriptor::new(COMMENT_FOLLOWED_BY_BLANK, at(source, "// first")),
            ViolationDescriptor::new(COMMENT_FOLLOWED_BY_BLANK, at(source, "// second")),
        ];
        let expected = "class C\n{\n    void M()\n    {\n        // first\n        // second\n        int x;\n    }\n}\n";
        assert_eq!(fix_all(source, &descriptors), expected);

        let once = fix(source, COMMENT_FOLLOWED_BY_BLANK, at(source, "// first"));
        let twice = fix(&once, COMMENT_FOLLOWED_BY_BLANK, at(&once, "// second"));
        assert_eq!(twice, expected);
    }

    #[test]
    fn test_fix_all_mixes_rules_in_one_stream() {
        let source = "class C\n{\n    int x;\n    // note\n\n\n\n    int y;\n}\n";
        let descriptors = [
            ViolationDescriptor::new(COMMENT_NOT_PRECEDED_BY_BLANK, at(source, "// note")),
            ViolationDescriptor::new(COMMENT_FOLLOWED_BY_BLANK, at(source, "// note")),
            ViolationDescriptor::new(MULTIPLE_BLANK_LINES, at(source, "int y")),
        ];
        assert_eq!(
            fix_all(source, &descriptors),
            "class C\n{\n    int x;\n\n    // note\n    int y;\n}\n"
        );
    }

    #[test]
    fn test_fix_all_handles_each_stream_once() {
        let source = "class C\n{\n    // a\n\n    int x;\n    // b\n\n    int y;\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptors = vec![
            ViolationDescriptor::new(COMMENT_FOLLOWED_BY_BLANK, at(source, "// a")),
            ViolationDescriptor::new(COMMENT_FOLLOWED_BY_BLANK, at(source, "// b")),
        ];
        let outcome = apply_fix_all(&BlankLinesCodeFixProvider, &ctx, &descriptors).unwrap();
        assert_eq!(
            outcome.document().map(Document::text).as_deref(),
            Some("class C\n{\n    // a\n    int x;\n    // b\n    int y;\n}\n")
        );
    }
}
