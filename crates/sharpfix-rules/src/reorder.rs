//! Declaration reordering
//!
//! Using directives, members and modifiers are reordered in two passes.
//! Classification buckets every item by its container and by the
//! conditional-compilation leaf holding its first token, so nothing ever
//! crosses an `#if` boundary. Regeneration then refills the original slots
//! with the sorted occupants.
//!
//! A slot keeps the part of its leading trivia that belongs to the position
//! rather than to the declaration: the file header above the first
//! declaration of a file, directive lines, and the blank lines separating it
//! from its predecessor. Comments, documentation and indentation travel with
//! the declaration.

pub mod members;
pub mod modifiers;
pub mod usings;

use std::collections::BTreeMap;

use rowan::{TextRange, TextSize};
use sharpfix_core::autofix::{NodeReplacement, ReplacementMap, with_edge_trivia};
use sharpfix_core::cst::ast::{first_significant_token, last_significant_token};
use sharpfix_core::cst::trivia::{self, TriviaPiece, TriviaStream};
use sharpfix_core::cst::{CsSyntaxNode, CsSyntaxToken, GreenElement, GreenNode, NodeOrToken};
use sharpfix_core::directives::{SpanId, TreeTextSpan};

/// A declaration in its original position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    node: CsSyntaxNode,
    pinned: Vec<TriviaPiece>,
    movable: Vec<TriviaPiece>,
    starts_line: bool,
}

impl Slot {
    pub fn new(node: CsSyntaxNode) -> Self {
        let (pinned, movable) = split_leading(&node);
        let starts_line = first_significant_token(&node).is_none_or(|first| starts_line(&first));
        Self {
            node,
            pinned,
            movable,
            starts_line,
        }
    }

    /// Slot with explicitly chosen trivia, for declarations arriving from
    /// another container on a line of their own
    pub fn with_parts(node: CsSyntaxNode, pinned: Vec<TriviaPiece>, movable: Vec<TriviaPiece>) -> Self {
        Self {
            node,
            pinned,
            movable,
            starts_line: true,
        }
    }

    pub fn node(&self) -> &CsSyntaxNode {
        &self.node
    }

    /// Trivia that stays with the position
    pub fn pinned(&self) -> &[TriviaPiece] {
        &self.pinned
    }

    /// Trivia that moves with the declaration
    pub fn movable(&self) -> &[TriviaPiece] {
        &self.movable
    }

    /// Whether the pinned part holds more than blank lines (a directive or
    /// the file header)
    pub fn has_fixed_prefix(&self) -> bool {
        self.pinned.iter().any(|p| !p.kind.is_layout())
    }

    /// Conditional-compilation leaf holding the declaration
    pub fn region(&self, directives: &TreeTextSpan) -> SpanId {
        region_of(&self.node, directives)
    }
}

/// Leaf span holding the first significant token of `node`
pub fn region_of(node: &CsSyntaxNode, directives: &TreeTextSpan) -> SpanId {
    let offset = first_significant_token(node)
        .map_or(node.text_range().start(), |t| t.text_range().start());
    directives.containing(offset).id()
}

/// Whether the trivia before `first` begins on a new line
fn starts_line(first: &CsSyntaxToken) -> bool {
    trivia::prev_significant(first).is_none_or(|prev| {
        trivia::trailing_of(&prev)
            .last()
            .is_some_and(TriviaPiece::is_end_of_line)
    })
}

/// Split the leading trivia of `node` into pinned and movable parts
pub fn split_leading(node: &CsSyntaxNode) -> (Vec<TriviaPiece>, Vec<TriviaPiece>) {
    let Some(first) = first_significant_token(node) else {
        return (Vec::new(), Vec::new());
    };
    let prev = trivia::prev_significant(&first);
    let starts_line = starts_line(&first);
    let stream = TriviaStream::from_pieces(trivia::leading_of(&first), starts_line);

    let cut = if prev.is_none() {
        // File header: everything above the declaration's own line
        stream.line_start_of(stream.len())
    } else if !starts_line {
        0
    } else {
        let last_directive = (0..stream.len())
            .rev()
            .find(|&i| stream.pieces()[i].is_directive());
        match last_directive {
            Some(d) => stream.first_non_blank_line(stream.line_end_of(d)),
            None => stream.first_non_blank_line(0),
        }
    };
    let pieces = stream.pieces();
    (pieces[..cut].to_vec(), pieces[cut..].to_vec())
}

/// Green for `occupant` moved into `slot`; `content` is the occupant's
/// (possibly rewritten) node
pub fn place(slot: &Slot, occupant: &Slot, content: &CsSyntaxNode) -> GreenNode {
    place_with(slot, slot.pinned.clone(), occupant, content)
}

/// Like [`place`] with an explicit pinned prefix
pub fn place_with(
    slot: &Slot,
    mut pinned: Vec<TriviaPiece>,
    occupant: &Slot,
    content: &CsSyntaxNode,
) -> GreenNode {
    if slot.starts_line && occupant.starts_line {
        pinned.extend(occupant.movable.iter().cloned());
    } else {
        // Sharing a line: the spacing before the declaration is the slot's
        let (body, _) = split_indentation(&occupant.movable);
        let (_, spacing) = split_indentation(&slot.movable);
        pinned.extend(body.iter().chain(spacing).cloned());
    }
    with_edge_trivia(content, Some(pinned), placed_trailing(&slot.node, content))
}

/// Split leading trivia before the whitespace directly ahead of the token
fn split_indentation(pieces: &[TriviaPiece]) -> (&[TriviaPiece], &[TriviaPiece]) {
    let cut = pieces.iter().rposition(|p| !p.is_whitespace()).map_or(0, |i| i + 1);
    pieces.split_at(cut)
}

/// Split trailing trivia after its last comment
fn split_trailing(pieces: &[TriviaPiece]) -> (&[TriviaPiece], &[TriviaPiece]) {
    let cut = pieces.iter().rposition(TriviaPiece::is_comment).map_or(0, |i| i + 1);
    pieces.split_at(cut)
}

/// Trailing trivia for `content` placed where `slot` was
///
/// Trailing comments travel with the declaration; the spacing and line
/// break after them belong to the position. A comment running to the end
/// of its line keeps its own line break.
fn placed_trailing(slot: &CsSyntaxNode, content: &CsSyntaxNode) -> Option<Vec<TriviaPiece>> {
    let own = trivia::trailing_of(&last_significant_token(content)?);
    let position = trivia::trailing_of(&last_significant_token(slot)?);
    let (comments, _) = split_trailing(&own);
    let line_comment = comments
        .last()
        .is_some_and(|p| !p.text.starts_with("/*"));
    if line_comment {
        return Some(own);
    }
    let (_, layout) = split_trailing(&position);
    Some(comments.iter().chain(layout).cloned().collect())
}

/// Drop the blank lines at the start of a line-starting trivia run
pub fn strip_blank_lines(pieces: &[TriviaPiece]) -> Vec<TriviaPiece> {
    let stream = TriviaStream::from_pieces(pieces.to_vec(), true);
    let start = stream.first_non_blank_line(0);
    pieces[start..].to_vec()
}

/// Replace the indentation of every line in `pieces` with `indentation`
///
/// The final (token) line is indented too; blank lines stay empty.
pub fn reindent(pieces: &[TriviaPiece], starts_line: bool, indentation: &str) -> Vec<TriviaPiece> {
    let mut out = Vec::with_capacity(pieces.len() + 1);
    let mut at_line_start = starts_line;
    let mut i = 0;
    while i < pieces.len() {
        if at_line_start {
            while pieces.get(i).is_some_and(TriviaPiece::is_whitespace) {
                i += 1;
            }
            if !indentation.is_empty() && pieces.get(i).is_none_or(|p| !p.is_end_of_line()) {
                out.push(TriviaPiece::whitespace(indentation));
            }
            at_line_start = false;
            continue;
        }
        let piece = &pieces[i];
        at_line_start = piece.is_end_of_line();
        out.push(piece.clone());
        i += 1;
    }
    if at_line_start && !indentation.is_empty() {
        out.push(TriviaPiece::whitespace(indentation));
    }
    out
}

type SlotKey = (TextSize, TextSize, u16);

fn key_of(node: &CsSyntaxNode) -> SlotKey {
    let range = node.text_range();
    (range.start(), range.end(), node.kind() as u16)
}

fn range_of(key: &SlotKey) -> TextRange {
    TextRange::new(key.0, key.1)
}

/// Slot contents computed by a reordering pass
///
/// Entries are keyed by the original node they replace. Nested entries are
/// folded into their enclosing entry when it is rebuilt, so a declaration
/// moved as a whole still carries the reordering of its own body.
#[derive(Debug, Default)]
pub struct SlotEdits {
    edits: BTreeMap<SlotKey, (CsSyntaxNode, Vec<GreenElement>)>,
}

impl SlotEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn contains(&self, node: &CsSyntaxNode) -> bool {
        self.edits.contains_key(&key_of(node))
    }

    /// Replace `node` with `green`; a no-op when nothing changes
    pub fn replace(&mut self, node: &CsSyntaxNode, green: GreenNode) {
        if node.green().into_owned() == green {
            return;
        }
        self.splice(node, vec![NodeOrToken::Node(green)]);
    }

    pub fn remove(&mut self, node: &CsSyntaxNode) {
        self.splice(node, Vec::new());
    }

    pub fn splice(&mut self, node: &CsSyntaxNode, elements: Vec<GreenElement>) {
        self.edits.insert(key_of(node), (node.clone(), elements));
    }

    fn touches(&self, range: TextRange) -> bool {
        self.edits.keys().any(|k| range.contains_range(range_of(k)))
    }

    /// Green of `node` with every entry beneath it applied
    pub fn rebuild(&self, node: &CsSyntaxNode) -> GreenNode {
        if !self.touches(node.text_range()) {
            return node.green().into_owned();
        }
        let mut children: Vec<GreenElement> = Vec::new();
        for child in node.children_with_tokens() {
            match child {
                NodeOrToken::Node(child) => match self.edits.get(&key_of(&child)) {
                    Some((_, elements)) => children.extend(elements.iter().cloned()),
                    None => children.push(NodeOrToken::Node(self.rebuild(&child))),
                },
                NodeOrToken::Token(token) => children.push(NodeOrToken::Token(token.green().to_owned())),
            }
        }
        GreenNode::new(node.kind().into(), children)
    }

    /// Propose every outermost entry; returns how many the map refused
    pub fn propose_into(&self, map: &mut ReplacementMap) -> usize {
        let mut refused = 0;
        for (key, (node, elements)) in &self.edits {
            let range = range_of(key);
            let nested = self
                .edits
                .keys()
                .any(|other| other != key && range_of(other).contains_range(range));
            if nested {
                continue;
            }
            if !map
                .propose_node(node, NodeReplacement::splice(elements.clone()))
                .is_applied()
            {
                refused += 1;
            }
        }
        refused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpfix_core::CsSyntaxKind;
    use sharpfix_core::autofix::rewrite;
    use sharpfix_core::cst::parse_cs;
    use sharpfix_core::cst::trivia::render;

    fn nodes(root: &CsSyntaxNode, kind: CsSyntaxKind) -> Vec<CsSyntaxNode> {
        root.descendants().filter(|n| n.kind() == kind).collect()
    }

    #[test]
    fn test_file_header_is_pinned_to_first_slot() {
        let (root, _) = parse_cs("// header\n\n// about A\nusing A;\nusing B;\n");
        let usings = nodes(&root, CsSyntaxKind::UsingDirective);
        let slot = Slot::new(usings[0].clone());
        assert_eq!(render(slot.pinned()), "// header\n\n// about A\n");
        assert!(slot.movable().is_empty());
        assert!(slot.has_fixed_prefix());
    }

    #[test]
    fn test_directive_and_blank_lines_are_pinned() {
        let source = "class C\n{\n    int a;\n\n#if DEBUG\n\n    // about b\n    int b;\n#endif\n}\n";
        let (root, _) = parse_cs(source);
        let fields = nodes(&root, CsSyntaxKind::FieldDecl);
        let slot = Slot::new(fields[1].clone());
        assert_eq!(render(slot.pinned()), "\n#if DEBUG\n\n");
        assert_eq!(render(slot.movable()), "    // about b\n    ");
    }

    #[test]
    fn test_reindent_keeps_blank_lines_empty() {
        let pieces = vec![
            TriviaPiece::whitespace("  "),
            TriviaPiece::new(sharpfix_core::TriviaKind::SingleLineComment, "// c"),
            TriviaPiece::end_of_line("\n"),
            TriviaPiece::end_of_line("\n"),
        ];
        let out = reindent(&pieces, true, "\t");
        assert_eq!(render(&out), "\t// c\n\n\t");
    }

    #[test]
    fn test_trailing_comment_travels_and_spacing_stays() {
        let source = "class C\n{\n    int b; /* b */ int a;\n}\n";
        let (root, _) = parse_cs(source);
        let fields = nodes(&root, CsSyntaxKind::FieldDecl);
        let (b, a) = (&fields[0], &fields[1]);

        let mut edits = SlotEdits::new();
        edits.replace(b, place(&Slot::new(b.clone()), &Slot::new(a.clone()), a));
        edits.replace(a, place(&Slot::new(a.clone()), &Slot::new(b.clone()), b));
        let mut map = ReplacementMap::new();
        assert_eq!(edits.propose_into(&mut map), 0);
        assert_eq!(
            rewrite(&root, &map).text().to_string(),
            "class C\n{\n    int a; int b; /* b */\n}\n"
        );
    }

    #[test]
    fn test_nested_entries_fold_into_moved_parent() {
        let source = "class A\n{\n    class B\n    {\n        int y;\n        int x;\n    }\n    int z;\n}\n";
        let (root, _) = parse_cs(source);
        let inner = nodes(&root, CsSyntaxKind::FieldDecl);
        let (y, x, z) = (&inner[0], &inner[1], &inner[2]);

        let mut edits = SlotEdits::new();
        // Swap the fields of B
        edits.replace(y, place(&Slot::new(y.clone()), &Slot::new(x.clone()), x));
        edits.replace(x, place(&Slot::new(x.clone()), &Slot::new(y.clone()), y));
        // Swap B and z; B carries its reordered body
        let b = nodes(&root, CsSyntaxKind::ClassDecl)[1].clone();
        let b_content = CsSyntaxNode::new_root(edits.rebuild(&b));
        edits.replace(&b, place(&Slot::new(b.clone()), &Slot::new(z.clone()), z));
        edits.replace(z, place(&Slot::new(z.clone()), &Slot::new(b.clone()), &b_content));

        let mut map = ReplacementMap::new();
        assert_eq!(edits.propose_into(&mut map), 0);
        let out = rewrite(&root, &map);
        assert_eq!(
            out.text().to_string(),
            "class A\n{\n    int z;\n    class B\n    {\n        int x;\n        int y;\n    }\n}\n"
        );
    }
}
