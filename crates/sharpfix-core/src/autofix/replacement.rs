//! Position-keyed replacement map
//!
//! Proposals are keyed by where the original token or node sits in the
//! tree being fixed, never by the identity of a rewritten node, so any
//! number of fixers can describe their edits against one snapshot. Token
//! proposals merge field by field: one fixer may replace the trailing trivia
//! of an open brace while another replaces the leading trivia of the next
//! statement, or even the other side of the same token.

use std::collections::BTreeMap;

use rowan::{TextRange, TextSize};

use crate::cst::trivia::{self, TriviaPiece, TriviaStream};
use crate::cst::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken, GreenElement};

/// Replacement for one significant token; `None` fields keep the original
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenReplacement {
    pub leading: Option<Vec<TriviaPiece>>,
    /// New token kind and text; the kind defaults to the original's
    pub text: Option<(Option<CsSyntaxKind>, String)>,
    pub trailing: Option<Vec<TriviaPiece>>,
}

impl TokenReplacement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leading(mut self, leading: Vec<TriviaPiece>) -> Self {
        self.leading = Some(leading);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some((None, text.into()));
        self
    }

    /// Replace the token with one of another kind
    pub fn with_token(mut self, kind: CsSyntaxKind, text: impl Into<String>) -> Self {
        self.text = Some((Some(kind), text.into()));
        self
    }

    pub fn with_trailing(mut self, trailing: Vec<TriviaPiece>) -> Self {
        self.trailing = Some(trailing);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.leading.is_none() && self.text.is_none() && self.trailing.is_none()
    }
}

/// Replacement for a whole node: zero elements remove it, several splice
/// new siblings in its place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeReplacement {
    pub elements: Vec<GreenElement>,
}

impl NodeReplacement {
    pub fn remove() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    pub fn with(element: impl Into<GreenElement>) -> Self {
        Self {
            elements: vec![element.into()],
        }
    }

    pub fn splice(elements: Vec<GreenElement>) -> Self {
        Self { elements }
    }
}

/// Which field of a token proposal collided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementField {
    Leading,
    Text,
    Trailing,
    Node,
}

/// Result of adding a proposal to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First proposal for this anchor
    Inserted,
    /// Combined with an earlier compatible proposal
    Merged,
    /// Incompatible with an earlier proposal, which stands
    Conflict(ReplacementField),
    /// The anchor cannot carry a proposal (trivia token or tree root)
    Rejected,
}

impl MergeOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Inserted | Self::Merged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct NodeKey {
    start: TextSize,
    end: TextSize,
    kind: u16,
}

impl NodeKey {
    fn of(node: &CsSyntaxNode) -> Self {
        let range = node.text_range();
        Self {
            start: range.start(),
            end: range.end(),
            kind: node.kind() as u16,
        }
    }

    fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

/// Accumulated edits for one rewrite pass
#[derive(Debug, Clone, Default)]
pub struct ReplacementMap {
    tokens: BTreeMap<TextSize, TokenReplacement>,
    nodes: BTreeMap<NodeKey, NodeReplacement>,
    /// Original trivia superseded by a leading/trailing replacement,
    /// start -> end
    dropped: BTreeMap<TextSize, TextSize>,
    conflicts: usize,
}

fn merge_field<T: Clone + PartialEq>(
    current: &Option<T>,
    proposed: &Option<T>,
) -> Result<Option<T>, ()> {
    match (current, proposed) {
        (_, None) => Ok(current.clone()),
        (None, Some(_)) => Ok(proposed.clone()),
        (Some(a), Some(b)) if a == b => Ok(current.clone()),
        (Some(_), Some(_)) => Err(()),
    }
}

fn covering(tokens: &[CsSyntaxToken]) -> Option<TextRange> {
    let first = tokens.first()?;
    let last = tokens.last()?;
    Some(TextRange::new(
        first.text_range().start(),
        last.text_range().end(),
    ))
}

impl ReplacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len() + self.nodes.len()
    }

    /// Number of proposals refused because they collided
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    /// Propose a replacement for a significant token
    pub fn propose_token(
        &mut self,
        token: &CsSyntaxToken,
        replacement: TokenReplacement,
    ) -> MergeOutcome {
        if token.kind().is_trivia() {
            tracing::warn!("Refusing replacement anchored on trivia {:?}", token.kind());
            return MergeOutcome::Rejected;
        }
        if replacement.is_empty() {
            return MergeOutcome::Merged;
        }
        let offset = token.text_range().start();
        if self.inside_replaced_node(token.text_range()) {
            return self.conflict(ReplacementField::Node);
        }

        let merged = match self.tokens.get(&offset) {
            None => replacement.clone(),
            Some(current) => {
                let leading = merge_field(&current.leading, &replacement.leading);
                let text = merge_field(&current.text, &replacement.text);
                let trailing = merge_field(&current.trailing, &replacement.trailing);
                match (leading, text, trailing) {
                    (Ok(leading), Ok(text), Ok(trailing)) => TokenReplacement {
                        leading,
                        text,
                        trailing,
                    },
                    (Err(()), _, _) => return self.conflict(ReplacementField::Leading),
                    (_, Err(()), _) => return self.conflict(ReplacementField::Text),
                    (_, _, Err(())) => return self.conflict(ReplacementField::Trailing),
                }
            }
        };

        if replacement.leading.is_some() {
            if let Some(range) = covering(&trivia::leading_tokens(token)) {
                self.dropped.insert(range.start(), range.end());
            }
        }
        if replacement.trailing.is_some() {
            if let Some(range) = covering(&trivia::trailing_tokens(token)) {
                self.dropped.insert(range.start(), range.end());
            }
        }

        let outcome = if self.tokens.contains_key(&offset) {
            MergeOutcome::Merged
        } else {
            MergeOutcome::Inserted
        };
        self.tokens.insert(offset, merged);
        outcome
    }

    /// Write an edited trivia stream back over the trivia between its two
    /// tokens
    pub fn propose_stream(&mut self, stream: &TriviaStream) -> MergeOutcome {
        let Some(next) = stream.next_token() else {
            return MergeOutcome::Rejected;
        };
        let split = stream.split_index();
        let (trailing, leading) = stream.pieces().split_at(split);
        let prev_outcome = match stream.prev_token() {
            Some(prev) => {
                self.propose_token(prev, TokenReplacement::new().with_trailing(trailing.to_vec()))
            }
            None => MergeOutcome::Merged,
        };
        if !prev_outcome.is_applied() {
            return prev_outcome;
        }
        let leading = match stream.prev_token() {
            Some(_) => leading.to_vec(),
            None => stream.pieces().to_vec(),
        };
        let next_outcome = self.propose_token(next, TokenReplacement::new().with_leading(leading));
        match (prev_outcome, next_outcome) {
            (_, MergeOutcome::Conflict(field)) => MergeOutcome::Conflict(field),
            (_, MergeOutcome::Rejected) => MergeOutcome::Rejected,
            (MergeOutcome::Inserted, _) | (_, MergeOutcome::Inserted) => MergeOutcome::Inserted,
            _ => MergeOutcome::Merged,
        }
    }

    /// Propose replacing (or removing) a whole node
    pub fn propose_node(&mut self, node: &CsSyntaxNode, replacement: NodeReplacement) -> MergeOutcome {
        if node.parent().is_none() {
            return MergeOutcome::Rejected;
        }
        let key = NodeKey::of(node);
        if let Some(current) = self.nodes.get(&key) {
            return if *current == replacement {
                MergeOutcome::Merged
            } else {
                self.conflict(ReplacementField::Node)
            };
        }

        let range = key.range();
        let overlaps_node = self
            .nodes
            .keys()
            .any(|k| k.range().intersect(range).is_some_and(|i| !i.is_empty()));
        let overlaps_token = self.tokens.range(range.start()..range.end()).next().is_some();
        let overlaps_trivia = self
            .dropped
            .iter()
            .any(|(&start, &end)| start < range.end() && range.start() < end);
        if overlaps_node || overlaps_token || overlaps_trivia {
            return self.conflict(ReplacementField::Node);
        }

        self.nodes.insert(key, replacement);
        MergeOutcome::Inserted
    }

    fn conflict(&mut self, field: ReplacementField) -> MergeOutcome {
        self.conflicts += 1;
        tracing::warn!("Conflicting replacement on {:?}; keeping the earlier proposal", field);
        MergeOutcome::Conflict(field)
    }

    fn inside_replaced_node(&self, range: TextRange) -> bool {
        self.nodes.keys().any(|k| {
            let node = k.range();
            node.contains_range(range) && !range.is_empty() || node.contains(range.start())
        })
    }

    /// Fold every proposal of `other` into this map
    pub fn extend(&mut self, other: ReplacementMap, root: &CsSyntaxNode) -> usize {
        let mut conflicts = 0;
        for (offset, replacement) in other.tokens {
            let token = root.token_at_offset(offset).right_biased();
            let outcome = match token {
                Some(token) if token.text_range().start() == offset => {
                    self.propose_token(&token, replacement)
                }
                _ => MergeOutcome::Rejected,
            };
            if !outcome.is_applied() {
                conflicts += 1;
            }
        }
        for (key, replacement) in other.nodes {
            let node = root
                .covering_element(key.range())
                .ancestors()
                .find(|n| NodeKey::of(n) == key);
            let outcome = match node {
                Some(node) => self.propose_node(&node, replacement),
                None => MergeOutcome::Rejected,
            };
            if !outcome.is_applied() {
                conflicts += 1;
            }
        }
        conflicts
    }

    // ------------------------------------------------------------------
    // Lookups used by the rewriter
    // ------------------------------------------------------------------

    pub(crate) fn token(&self, offset: TextSize) -> Option<&TokenReplacement> {
        self.tokens.get(&offset)
    }

    pub(crate) fn node(&self, node: &CsSyntaxNode) -> Option<&NodeReplacement> {
        if self.nodes.is_empty() {
            return None;
        }
        self.nodes.get(&NodeKey::of(node))
    }

    pub(crate) fn is_dropped(&self, offset: TextSize) -> bool {
        self.dropped
            .range(..=offset)
            .next_back()
            .is_some_and(|(_, &end)| offset < end)
    }

    /// Whether anything inside `range` has a proposal
    pub(crate) fn touches(&self, range: TextRange) -> bool {
        self.tokens.range(range.start()..=range.end()).next().is_some()
            || self.nodes.keys().any(|k| {
                let node = k.range();
                range.contains_range(node) || node.intersect(range).is_some_and(|i| !i.is_empty())
            })
            || self
                .dropped
                .iter()
                .any(|(&start, &end)| start < range.end() && range.start() < end)
    }
}
