//! Node tracking across a batch of moves
//!
//! Reordering fixes describe a batch as a series of moves between sibling
//! slots. [`NodeTracker`] gives each tracked node a stable id and applies
//! moves to a logical order; slot `i` is filled by `order()[i]`. Nodes are
//! resolved by original range, so a move computed late in the batch still
//! finds nodes moved earlier.

use rowan::TextRange;

use crate::cst::CsSyntaxNode;
use crate::{Result, SharpfixError};

/// Stable handle for a tracked node
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackedId(usize);

/// Arena of tracked sibling nodes and their current logical order
#[derive(Debug, Clone, Default)]
pub struct NodeTracker {
    nodes: Vec<CsSyntaxNode>,
    order: Vec<TrackedId>,
}

impl NodeTracker {
    pub fn new(nodes: impl IntoIterator<Item = CsSyntaxNode>) -> Self {
        let mut tracker = Self::default();
        for node in nodes {
            tracker.track(node);
        }
        tracker
    }

    /// Track one more node; it occupies the next slot
    pub fn track(&mut self, node: CsSyntaxNode) -> TrackedId {
        let id = TrackedId(self.nodes.len());
        self.nodes.push(node);
        self.order.push(id);
        id
    }

    /// Resolve a node by its range in the original tree
    pub fn resolve(&self, range: TextRange) -> Option<TrackedId> {
        self.nodes
            .iter()
            .position(|node| node.text_range() == range)
            .map(TrackedId)
    }

    pub fn node(&self, id: TrackedId) -> &CsSyntaxNode {
        &self.nodes[id.0]
    }

    /// Tracked ids in their current logical order
    pub fn order(&self) -> &[TrackedId] {
        &self.order
    }

    /// Slot currently holding `id`
    pub fn position(&self, id: TrackedId) -> Result<usize> {
        self.order.iter().position(|&o| o == id).ok_or_else(|| {
            SharpfixError::invalid_operation(format!("node {} is not tracked here", id.0))
        })
    }

    /// Move `id` directly in front of `target`
    pub fn move_before(&mut self, id: TrackedId, target: TrackedId) -> Result<()> {
        if id == target {
            return Ok(());
        }
        self.position(target)?;
        let from = self.position(id)?;
        self.order.remove(from);
        let to = self.position(target)?;
        self.order.insert(to, id);
        Ok(())
    }

    /// Whether any node left its slot
    pub fn is_changed(&self) -> bool {
        self.order
            .iter()
            .enumerate()
            .any(|(slot, &id)| id.0 != slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::{CsSyntaxKind, parse_cs};
    use crate::error::ErrorKind;

    fn fields(root: &CsSyntaxNode) -> Vec<CsSyntaxNode> {
        root.descendants()
            .filter(|n| n.kind() == CsSyntaxKind::FieldDecl)
            .collect()
    }

    #[test]
    fn test_moves_resolve_by_original_range() {
        let (root, _) = parse_cs("class A { int a; int b; int c; }");
        let nodes = fields(&root);
        let ranges: Vec<_> = nodes.iter().map(|n| n.text_range()).collect();
        let mut tracker = NodeTracker::new(nodes);

        let c = tracker.resolve(ranges[2]).expect("c");
        let a = tracker.resolve(ranges[0]).expect("a");
        tracker.move_before(c, a).unwrap();
        // `b` is found by its original range after the move
        let b = tracker.resolve(ranges[1]).expect("b");
        tracker.move_before(b, a).unwrap();
        assert_eq!(tracker.position(c).unwrap(), 0);
        assert_eq!(tracker.position(b).unwrap(), 1);
        assert_eq!(tracker.node(tracker.order()[2]).text_range(), ranges[0]);
        assert!(tracker.is_changed());
    }

    #[test]
    fn test_untouched_order_is_unchanged() {
        let (root, _) = parse_cs("class A { int a; int b; }");
        let mut tracker = NodeTracker::new(fields(&root));
        let first = tracker.order()[0];
        tracker.move_before(first, first).unwrap();
        assert!(!tracker.is_changed());
    }

    #[test]
    fn test_foreign_id_is_an_invalid_operation() {
        let (root, _) = parse_cs("class A { int a; int b; int c; }");
        let nodes = fields(&root);
        let mut small = NodeTracker::new(nodes[..1].to_vec());
        let mut large = NodeTracker::new(nodes);
        let foreign = large.order()[2];
        let own = small.order()[0];

        let err = small.position(foreign).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);
        assert!(small.move_before(own, foreign).is_err());
        // A failed move leaves the order alone
        assert_eq!(small.order(), &[own]);
        assert!(large.move_before(foreign, own).is_ok());
    }
}
