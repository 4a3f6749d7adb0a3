//! Thin wrapper over rowan's `GreenNodeBuilder` speaking `CsSyntaxKind`

use rowan::{GreenNode, GreenNodeBuilder};

use super::{CsSyntaxKind, CsSyntaxNode};

/// Incremental green-tree builder used by the parser and by fixers that
/// synthesize fresh fragments.
#[derive(Default)]
pub struct CstBuilder {
    inner: GreenNodeBuilder<'static>,
}

impl CstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_node(&mut self, kind: CsSyntaxKind) {
        self.inner.start_node(kind.into());
    }

    pub fn finish_node(&mut self) {
        self.inner.finish_node();
    }

    pub fn token(&mut self, kind: CsSyntaxKind, text: &str) {
        self.inner.token(kind.into(), text);
    }

    /// Finish building and return the green root
    pub fn finish_green(self) -> GreenNode {
        self.inner.finish()
    }

    /// Finish building and return a red root
    pub fn finish(self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.finish_green())
    }
}
