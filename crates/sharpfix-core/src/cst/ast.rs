//! Typed AST layer over CST
//!
//! Ergonomic wrappers over raw CST nodes. Every wrapper is a cheap handle
//! around a `CsSyntaxNode`; accessors return `Option` because the parser is
//! error tolerant and any piece may be missing in incomplete code.
//!
//! # Example
//!
//! ```ignore
//! use sharpfix_core::cst::{parse_cs, ast::{AstNode, CompilationUnit}};
//!
//! let (cst, _) = parse_cs("using System;\nclass A { void M(int x) { } }\n");
//! let unit = CompilationUnit::cast(cst).unwrap();
//! assert_eq!(unit.usings().next().unwrap().name().unwrap(), "System");
//! ```

use super::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken};

/// Helper trait for casting CST nodes to typed wrappers
pub trait AstNode: Sized {
    fn can_cast(kind: CsSyntaxKind) -> bool;
    fn cast(node: CsSyntaxNode) -> Option<Self>;
    fn syntax(&self) -> &CsSyntaxNode;
}

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $($kind:ident)|+) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            syntax: CsSyntaxNode,
        }

        impl AstNode for $name {
            fn can_cast(kind: CsSyntaxKind) -> bool {
                matches!(kind, $(CsSyntaxKind::$kind)|+)
            }

            fn cast(node: CsSyntaxNode) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &CsSyntaxNode {
                &self.syntax
            }
        }
    };
}

/// Non-trivia tokens that are direct children of `parent`
pub fn direct_tokens(parent: &CsSyntaxNode) -> impl Iterator<Item = CsSyntaxToken> + use<> {
    parent
        .children_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| !t.kind().is_trivia())
}

/// Non-trivia tokens anywhere under `node`
pub fn significant_tokens(node: &CsSyntaxNode) -> impl Iterator<Item = CsSyntaxToken> + use<> {
    node.descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .filter(|t| !t.kind().is_trivia())
}

pub fn first_significant_token(node: &CsSyntaxNode) -> Option<CsSyntaxToken> {
    significant_tokens(node).next()
}

pub fn last_significant_token(node: &CsSyntaxNode) -> Option<CsSyntaxToken> {
    significant_tokens(node).last()
}

/// Source text of a node with all trivia removed
pub fn text_without_trivia(node: &CsSyntaxNode) -> String {
    significant_tokens(node).map(|t| t.text().to_string()).collect()
}

/// Source text of a node with interior trivia kept but its outer leading
/// and trailing trivia dropped
pub fn trimmed_text(node: &CsSyntaxNode) -> String {
    let (Some(first), Some(last)) = (first_significant_token(node), last_significant_token(node))
    else {
        return String::new();
    };
    let range = rowan::TextRange::new(first.text_range().start(), last.text_range().end());
    let offset = node.text_range().start();
    let text = node.text().to_string();
    let start = usize::from(range.start() - offset);
    let end = usize::from(range.end() - offset);
    text[start..end].to_string()
}

fn child_of_kind(parent: &CsSyntaxNode, kind: CsSyntaxKind) -> Option<CsSyntaxNode> {
    parent.children().find(|n| n.kind() == kind)
}

fn token_of_kind(parent: &CsSyntaxNode, kind: CsSyntaxKind) -> Option<CsSyntaxToken> {
    direct_tokens(parent).find(|t| t.kind() == kind)
}

// ============================================================================
// Compilation unit and namespaces
// ============================================================================

ast_node!(
    /// Root of a source file
    CompilationUnit,
    CompilationUnit
);

impl CompilationUnit {
    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> + use<> {
        self.syntax.children().filter_map(UsingDirective::cast)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = NamespaceDecl> + use<> {
        self.syntax.children().filter_map(NamespaceDecl::cast)
    }

    pub fn members(&self) -> impl Iterator<Item = MemberDecl> + use<> {
        self.syntax.children().filter_map(MemberDecl::cast)
    }

    pub fn attribute_lists(&self) -> impl Iterator<Item = CsSyntaxNode> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind() == CsSyntaxKind::AttributeList)
    }

    pub fn eof_token(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::Eof)
    }

    /// Type declarations at any depth, in source order
    pub fn type_declarations(&self) -> impl Iterator<Item = MemberDecl> + use<> {
        self.syntax
            .descendants()
            .filter(|n| n.kind().is_type_declaration())
            .filter_map(MemberDecl::cast)
    }
}

ast_node!(
    /// `namespace N { ... }` or file-scoped `namespace N;`
    NamespaceDecl,
    NamespaceDecl
);

impl NamespaceDecl {
    pub fn name(&self) -> Option<String> {
        child_of_kind(&self.syntax, CsSyntaxKind::QualifiedName).map(|n| text_without_trivia(&n))
    }

    pub fn is_file_scoped(&self) -> bool {
        self.open_brace().is_none() && token_of_kind(&self.syntax, CsSyntaxKind::Semicolon).is_some()
    }

    pub fn open_brace(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::LBrace)
    }

    pub fn close_brace(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::RBrace)
    }

    pub fn usings(&self) -> impl Iterator<Item = UsingDirective> + use<> {
        self.syntax.children().filter_map(UsingDirective::cast)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = NamespaceDecl> + use<> {
        self.syntax.children().filter_map(NamespaceDecl::cast)
    }

    pub fn members(&self) -> impl Iterator<Item = MemberDecl> + use<> {
        self.syntax.children().filter_map(MemberDecl::cast)
    }
}

ast_node!(
    /// `using [static] [Alias =] Name;`
    UsingDirective,
    UsingDirective
);

impl UsingDirective {
    pub fn using_keyword(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::UsingKw)
    }

    pub fn is_static(&self) -> bool {
        token_of_kind(&self.syntax, CsSyntaxKind::StaticKw).is_some()
    }

    /// Alias name for `using X = ...;`
    pub fn alias(&self) -> Option<String> {
        child_of_kind(&self.syntax, CsSyntaxKind::NameEquals)
            .and_then(|n| token_of_kind(&n, CsSyntaxKind::Ident))
            .map(|t| t.text().to_string())
    }

    pub fn name_node(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::QualifiedName)
    }

    /// Imported name without trivia, e.g. `System.Collections.Generic`
    pub fn name(&self) -> Option<String> {
        self.name_node().map(|n| text_without_trivia(&n))
    }
}

// ============================================================================
// Members
// ============================================================================

ast_node!(
    /// Any type or member declaration
    MemberDecl,
    ClassDecl
        | StructDecl
        | InterfaceDecl
        | EnumDecl
        | EnumMember
        | FieldDecl
        | ConstructorDecl
        | MethodDecl
        | PropertyDecl
);

impl MemberDecl {
    pub fn kind(&self) -> CsSyntaxKind {
        self.syntax.kind()
    }

    pub fn is_type(&self) -> bool {
        self.kind().is_type_declaration()
    }

    pub fn attribute_lists(&self) -> impl Iterator<Item = CsSyntaxNode> + use<> {
        self.syntax
            .children()
            .filter(|n| n.kind() == CsSyntaxKind::AttributeList)
    }

    /// Modifier keywords in source order
    pub fn modifiers(&self) -> Vec<CsSyntaxToken> {
        direct_tokens(&self.syntax)
            .take_while(|t| t.kind().is_modifier())
            .collect()
    }

    pub fn has_modifier(&self, kind: CsSyntaxKind) -> bool {
        self.modifiers().iter().any(|t| t.kind() == kind)
    }

    /// Keyword for type declarations (`class`, `struct`, ...)
    pub fn type_keyword(&self) -> Option<CsSyntaxToken> {
        direct_tokens(&self.syntax).find(|t| {
            matches!(
                t.kind(),
                CsSyntaxKind::ClassKw
                    | CsSyntaxKind::StructKw
                    | CsSyntaxKind::InterfaceKw
                    | CsSyntaxKind::EnumKw
            )
        })
    }

    /// Identifier naming the declaration
    ///
    /// For fields with several declarators this is the first one.
    pub fn name_token(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::Ident)
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().trim_start_matches('@').to_string())
    }

    /// All declarator names of a field
    pub fn declarator_names(&self) -> Vec<String> {
        direct_tokens(&self.syntax)
            .filter(|t| t.kind() == CsSyntaxKind::Ident)
            .map(|t| t.text().to_string())
            .collect()
    }

    pub fn type_ref(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::TypeRef)
    }

    /// Declared (return/field/property) type text without trivia
    pub fn return_type(&self) -> Option<String> {
        self.type_ref().map(|n| text_without_trivia(&n))
    }

    pub fn type_parameters(&self) -> Vec<String> {
        child_of_kind(&self.syntax, CsSyntaxKind::TypeParameterList)
            .map(|list| {
                list.children()
                    .filter(|n| n.kind() == CsSyntaxKind::TypeParameter)
                    .filter_map(|n| {
                        direct_tokens(&n)
                            .filter(|t| t.kind() == CsSyntaxKind::Ident)
                            .last()
                            .map(|t| t.text().to_string())
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn parameter_list(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::ParameterList)
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        self.parameter_list()
            .map(|list| list.children().filter_map(Parameter::cast).collect())
            .unwrap_or_default()
    }

    pub fn accessor_list(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::AccessorList)
    }

    /// Accessor keywords (`get`, `set`, `init`) of a property
    pub fn accessors(&self) -> Vec<Accessor> {
        self.accessor_list()
            .map(|list| list.children().filter_map(Accessor::cast).collect())
            .unwrap_or_default()
    }

    /// Expression-bodied property or method
    pub fn arrow_body(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::ArrowBody)
    }

    pub fn body(&self) -> Option<Block> {
        self.syntax.children().find_map(Block::cast)
    }

    pub fn base_list(&self) -> Option<CsSyntaxNode> {
        child_of_kind(&self.syntax, CsSyntaxKind::BaseList)
    }

    pub fn open_brace(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::LBrace)
    }

    pub fn close_brace(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::RBrace)
    }

    /// Nested member declarations of a type
    pub fn members(&self) -> impl Iterator<Item = MemberDecl> + use<> {
        self.syntax.children().filter_map(MemberDecl::cast)
    }

    /// Containing type declaration, if any
    pub fn containing_type(&self) -> Option<MemberDecl> {
        self.syntax
            .ancestors()
            .skip(1)
            .find(|n| n.kind().is_type_declaration())
            .and_then(MemberDecl::cast)
    }
}

ast_node!(
    /// One formal parameter
    Parameter,
    Parameter
);

impl Parameter {
    /// Parameter name: the last identifier before any default value
    pub fn name_token(&self) -> Option<CsSyntaxToken> {
        direct_tokens(&self.syntax)
            .take_while(|t| t.kind() != CsSyntaxKind::Eq)
            .filter(|t| t.kind() == CsSyntaxKind::Ident)
            .last()
    }

    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().trim_start_matches('@').to_string())
    }
}

ast_node!(
    /// `get`/`set`/`init` accessor
    Accessor,
    Accessor
);

impl Accessor {
    pub fn keyword(&self) -> Option<String> {
        token_of_kind(&self.syntax, CsSyntaxKind::Ident).map(|t| t.text().to_string())
    }

    /// Accessibility narrowed on the accessor (e.g. `private set`)
    pub fn modifiers(&self) -> Vec<CsSyntaxToken> {
        direct_tokens(&self.syntax)
            .take_while(|t| t.kind().is_modifier())
            .collect()
    }
}

// ============================================================================
// Statements
// ============================================================================

ast_node!(
    /// `{ ... }`
    Block,
    Block
);

impl Block {
    pub fn open_brace(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::LBrace)
    }

    pub fn close_brace(&self) -> Option<CsSyntaxToken> {
        token_of_kind(&self.syntax, CsSyntaxKind::RBrace)
    }

    pub fn statements(&self) -> impl Iterator<Item = CsSyntaxNode> + use<> {
        self.syntax.children().filter(|n| n.kind().is_statement())
    }
}

ast_node!(
    /// Statement that embeds another statement: `if`, `else`, loops
    EmbeddingStatement,
    IfStmt | ElseClause | WhileStmt | ForStmt | ForeachStmt
);

impl EmbeddingStatement {
    /// The embedded statement (the `if`'s consequence, the loop body, ...)
    pub fn embedded(&self) -> Option<CsSyntaxNode> {
        self.syntax.children().find(|n| n.kind().is_statement())
    }

    pub fn else_clause(&self) -> Option<EmbeddingStatement> {
        child_of_kind(&self.syntax, CsSyntaxKind::ElseClause).and_then(Self::cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_cs;

    fn unit(source: &str) -> CompilationUnit {
        let (cst, errors) = parse_cs(source);
        assert!(errors.is_empty(), "{errors:?}");
        CompilationUnit::cast(cst).expect("compilation unit")
    }

    #[test]
    fn test_using_shapes() {
        let unit = unit("using System;\nusing static System.Math;\nusing IO = System.IO;\nusing global::Foo.Bar;\n");
        let usings: Vec<_> = unit.usings().collect();
        assert_eq!(usings.len(), 4);
        assert_eq!(usings[0].name().as_deref(), Some("System"));
        assert!(usings[1].is_static());
        assert_eq!(usings[2].alias().as_deref(), Some("IO"));
        assert_eq!(usings[2].name().as_deref(), Some("System.IO"));
        assert_eq!(usings[3].name().as_deref(), Some("global::Foo.Bar"));
    }

    #[test]
    fn test_method_shape() {
        let unit = unit("class A\n{\n    public static T Get<T, TKey>(TKey key, int count = 1) { return default; }\n}\n");
        let class = unit.members().next().expect("class");
        assert_eq!(class.name().as_deref(), Some("A"));
        let method = class.members().next().expect("method");
        assert_eq!(method.kind(), CsSyntaxKind::MethodDecl);
        assert_eq!(method.name().as_deref(), Some("Get"));
        assert_eq!(method.return_type().as_deref(), Some("T"));
        assert_eq!(method.type_parameters(), vec!["T", "TKey"]);
        let names: Vec<_> = method.parameters().iter().filter_map(Parameter::name).collect();
        assert_eq!(names, vec!["key", "count"]);
        let modifiers: Vec<_> = method.modifiers().iter().map(|t| t.text().to_string()).collect();
        assert_eq!(modifiers, vec!["public", "static"]);
        assert!(method.body().is_some());
    }

    #[test]
    fn test_property_accessors() {
        let unit = unit("class A { public int Count { get; private set; } }");
        let property = unit.members().next().and_then(|c| c.members().next()).expect("property");
        let keywords: Vec<_> = property.accessors().iter().filter_map(Accessor::keyword).collect();
        assert_eq!(keywords, vec!["get", "set"]);
        assert_eq!(property.accessors()[1].modifiers().len(), 1);
    }

    #[test]
    fn test_trimmed_text_drops_outer_trivia() {
        let unit = unit("class A\n{\n    // note\n    int x;  // trailing\n}\n");
        let field = unit.members().next().and_then(|c| c.members().next()).expect("field");
        assert_eq!(trimmed_text(field.syntax()), "int x;");
        assert_eq!(text_without_trivia(field.syntax()), "intx;");
    }
}
