//! Read-only symbol queries
//!
//! Fix providers ask a [`SemanticModel`] the few questions syntax alone
//! cannot answer. Hosts with a compiler plug in their own model;
//! [`SyntacticModel`] answers from declarations visible in a set of
//! documents.

use std::collections::{HashMap, HashSet};

use crate::Document;
use crate::cst::ast::{AstNode, CompilationUnit, MemberDecl, NamespaceDecl};
use crate::cst::{CsSyntaxKind, CsSyntaxNode};

pub trait SemanticModel: Send + Sync {
    /// Whether `member` implements a member of an interface its containing
    /// type derives from
    fn implements_interface_member(&self, member: &MemberDecl) -> bool;

    /// Fully qualified form of `name` as seen from `context`, `None` when the
    /// name cannot be resolved
    fn fully_qualified_name(&self, name: &str, context: &CsSyntaxNode) -> Option<String>;
}

/// Model built from the declarations of a set of documents
#[derive(Debug, Clone, Default)]
pub struct SyntacticModel {
    /// Interface simple name -> declared member names
    interfaces: HashMap<String, HashSet<String>>,
    /// Namespace and type names -> fully qualified names
    qualified: HashMap<String, Vec<String>>,
}

impl SyntacticModel {
    pub fn new<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Self {
        let mut model = Self::default();
        for document in documents {
            model.index(&document.root());
        }
        model
    }

    fn index(&mut self, root: &CsSyntaxNode) {
        let Some(unit) = CompilationUnit::cast(root.clone()) else {
            return;
        };
        for namespace in unit.namespaces() {
            self.index_namespace(&namespace, "");
        }
        // File-scoped namespaces leave their members at the top level
        let prefix = unit
            .namespaces()
            .find(NamespaceDecl::is_file_scoped)
            .and_then(|n| n.name())
            .unwrap_or_default();
        for member in unit.members() {
            self.index_member(&member, &prefix);
        }
    }

    fn index_namespace(&mut self, namespace: &NamespaceDecl, prefix: &str) {
        let Some(name) = namespace.name() else {
            return;
        };
        let qualified = join(prefix, &name);
        // Every dotted prefix is itself a namespace
        let mut partial = String::new();
        for segment in qualified.split('.') {
            partial = join(&partial, segment);
            self.record(segment, &partial);
        }
        self.record(&name, &qualified);
        for nested in namespace.namespaces() {
            self.index_namespace(&nested, &qualified);
        }
        for member in namespace.members() {
            self.index_member(&member, &qualified);
        }
    }

    fn index_member(&mut self, member: &MemberDecl, prefix: &str) {
        if !member.is_type() {
            return;
        }
        let Some(name) = member.name() else {
            return;
        };
        let qualified = join(prefix, &name);
        self.record(&name, &qualified);
        if member.kind() == CsSyntaxKind::InterfaceDecl {
            let names = member.members().filter_map(|m| m.name()).collect();
            self.interfaces.insert(name.clone(), names);
        }
        for nested in member.members() {
            self.index_member(&nested, &qualified);
        }
    }

    fn record(&mut self, name: &str, qualified: &str) {
        let entry = self.qualified.entry(name.to_string()).or_default();
        if !entry.iter().any(|q| q == qualified) {
            entry.push(qualified.to_string());
        }
    }

    fn base_type_names(member: &MemberDecl) -> Vec<String> {
        let Some(base) = member.base_list() else {
            return Vec::new();
        };
        crate::cst::ast::direct_tokens(&base)
            .filter(|t| t.kind() == CsSyntaxKind::Ident)
            .map(|t| t.text().to_string())
            .collect()
    }
}

impl SemanticModel for SyntacticModel {
    fn implements_interface_member(&self, member: &MemberDecl) -> bool {
        let (Some(name), Some(owner)) = (member.name(), member.containing_type()) else {
            return false;
        };
        Self::base_type_names(&owner).iter().any(|base| {
            self.interfaces
                .get(base)
                .is_some_and(|members| members.contains(&name))
        })
    }

    fn fully_qualified_name(&self, name: &str, _context: &CsSyntaxNode) -> Option<String> {
        let first = name.split('.').next()?;
        let candidates = self.qualified.get(first)?;
        // Ambiguous names are left for the caller to keep as written
        match candidates.as_slice() {
            [only] => Some(match name.split_once('.') {
                Some((_, rest)) => format!("{only}.{rest}"),
                None => only.clone(),
            }),
            _ => None,
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(sources: &[&str]) -> (SyntacticModel, Vec<Document>) {
        let docs: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, s)| Document::parse(format!("f{i}.cs"), s).0)
            .collect();
        (SyntacticModel::new(&docs), docs)
    }

    fn method(doc: &Document, name: &str) -> MemberDecl {
        doc.root()
            .descendants()
            .filter_map(MemberDecl::cast)
            .find(|m| m.kind() == CsSyntaxKind::MethodDecl && m.name().as_deref() == Some(name))
            .expect("method")
    }

    #[test]
    fn test_interface_implementation_across_documents() {
        let (model, docs) = model(&[
            "namespace A { interface IRunner { void Run(); } }",
            "namespace B { class Job : IRunner { public void Run() { } public void Stop() { } } }",
        ]);
        assert!(model.implements_interface_member(&method(&docs[1], "Run")));
        assert!(!model.implements_interface_member(&method(&docs[1], "Stop")));
    }

    #[test]
    fn test_qualification_leaves_unknown_names_alone() {
        let (model, docs) = model(&["namespace Company.Product { class Widget { } }"]);
        let root = docs[0].root();
        assert_eq!(
            model.fully_qualified_name("Product", &root).as_deref(),
            Some("Company.Product")
        );
        assert_eq!(
            model.fully_qualified_name("Widget", &root).as_deref(),
            Some("Company.Product.Widget")
        );
        assert_eq!(model.fully_qualified_name("System.Linq", &root), None);
    }
}
