//! Source documents
//!
//! A document carries its green root so it can cross threads; a red root is
//! rebuilt on demand for navigation.

use crate::cst::{CsSyntaxNode, GreenNode, ParseError, parse_cs};

/// A named source file and its syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Document {
    name: String,
    green: GreenNode,
}

impl Document {
    /// Parse `source` into a document
    ///
    /// Parse problems never fail construction; they are returned alongside so
    /// callers can decide whether to offer fixes on broken input.
    pub fn parse(name: impl Into<String>, source: &str) -> (Self, Vec<ParseError>) {
        let (root, errors) = parse_cs(source);
        (Self::from_root(name, &root), errors)
    }

    pub fn from_root(name: impl Into<String>, root: &CsSyntaxNode) -> Self {
        Self {
            name: name.into(),
            green: root.green().into_owned(),
        }
    }

    pub fn from_green(name: impl Into<String>, green: GreenNode) -> Self {
        Self {
            name: name.into(),
            green,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without directories
    pub fn file_name(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.name.as_str())
    }

    pub fn green(&self) -> &GreenNode {
        &self.green
    }

    /// Fresh red root over the document's tree
    pub fn root(&self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.green.clone())
    }

    pub fn text(&self) -> String {
        self.root().text().to_string()
    }

    /// Same document with a new tree
    pub fn with_root(&self, root: &CsSyntaxNode) -> Self {
        Self::from_root(self.name.clone(), root)
    }

    /// Same tree under a new name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            green: self.green.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_document_crosses_threads() {
        assert_send_sync::<Document>();
        let (doc, errors) = Document::parse("src/Widget.cs", "class Widget { }\n");
        assert!(errors.is_empty());
        let text = std::thread::spawn(move || doc.text()).join().unwrap();
        assert_eq!(text, "class Widget { }\n");
    }

    #[test]
    fn test_file_name_strips_directories() {
        let (doc, _) = Document::parse("src\\Models/Widget.cs", "");
        assert_eq!(doc.file_name(), "Widget.cs");
        assert_eq!(doc.renamed("Gadget.cs").name(), "Gadget.cs");
    }
}
