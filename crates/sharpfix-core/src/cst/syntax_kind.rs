//! Syntax kind enumeration for the C# CST
//!
//! This module defines all possible node and token types in the syntax tree.
//! Discriminants are contiguous so raw rowan kinds map back through a table.

use std::fmt;

/// Syntax kind for C# language elements
///
/// This enum represents all possible types of nodes and tokens in the CST.
/// It includes:
/// - Trivia (whitespace, end-of-line, comments, directives)
/// - Keywords (using, namespace, class, modifiers, statements)
/// - Punctuation and operators
/// - Literals and identifiers
/// - Structural nodes (declarations, statements)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum CsSyntaxKind {
    // ==================
    // Trivia
    // ==================
    /// Whitespace (spaces, tabs)
    Whitespace = 0,
    /// End of line (`\n` or `\r\n`)
    Newline,
    /// Line comment starting with //
    CommentLine,
    /// Block comment /* ... */
    CommentBlock,
    /// Documentation comment line starting with ///
    DocComment,
    /// Preprocessor directive line (#if, #endif, #region, ...)
    Directive,

    // ==================
    // Keywords
    // ==================
    UsingKw,
    StaticKw,
    NamespaceKw,
    ClassKw,
    StructKw,
    InterfaceKw,
    EnumKw,
    PublicKw,
    PrivateKw,
    ProtectedKw,
    InternalKw,
    ReadonlyKw,
    ConstKw,
    AbstractKw,
    SealedKw,
    VirtualKw,
    OverrideKw,
    ExternKw,
    UnsafeKw,
    NewKw,
    VolatileKw,
    AsyncKw,
    PartialKw,
    VoidKw,
    ReturnKw,
    IfKw,
    ElseKw,
    WhileKw,
    ForKw,
    ForeachKw,

    // ==================
    // Punctuation
    // ==================
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Dot,
    Eq,
    Lt,
    Gt,
    Colon,
    ColonColon,
    Question,
    Arrow,
    /// Any other operator character
    Punct,

    // ==================
    // Literals & identifiers
    // ==================
    Ident,
    Number,
    String,
    Char,

    // ==================
    // Special tokens
    // ==================
    /// Zero-width token owning the trivia at the end of the file
    Eof,
    /// Unrecognized character
    ErrorToken,

    // ==================
    // Structure nodes
    // ==================
    CompilationUnit,
    UsingDirective,
    NameEquals,
    QualifiedName,
    NamespaceDecl,
    AttributeList,
    ClassDecl,
    StructDecl,
    InterfaceDecl,
    EnumDecl,
    EnumMember,
    BaseList,
    TypeParameterList,
    TypeParameter,
    FieldDecl,
    ConstructorDecl,
    MethodDecl,
    PropertyDecl,
    AccessorList,
    Accessor,
    ParameterList,
    Parameter,
    TypeRef,
    Initializer,
    ArrowBody,
    Block,
    IfStmt,
    ElseClause,
    WhileStmt,
    ForStmt,
    ForeachStmt,
    ReturnStmt,
    ExprStmt,
    Condition,
    Expr,
    /// Node wrapping tokens the parser could not place
    Error,
}

impl CsSyntaxKind {
    /// Every kind, indexed by discriminant
    pub const ALL: [CsSyntaxKind; 95] = [
        Self::Whitespace,
        Self::Newline,
        Self::CommentLine,
        Self::CommentBlock,
        Self::DocComment,
        Self::Directive,
        Self::UsingKw,
        Self::StaticKw,
        Self::NamespaceKw,
        Self::ClassKw,
        Self::StructKw,
        Self::InterfaceKw,
        Self::EnumKw,
        Self::PublicKw,
        Self::PrivateKw,
        Self::ProtectedKw,
        Self::InternalKw,
        Self::ReadonlyKw,
        Self::ConstKw,
        Self::AbstractKw,
        Self::SealedKw,
        Self::VirtualKw,
        Self::OverrideKw,
        Self::ExternKw,
        Self::UnsafeKw,
        Self::NewKw,
        Self::VolatileKw,
        Self::AsyncKw,
        Self::PartialKw,
        Self::VoidKw,
        Self::ReturnKw,
        Self::IfKw,
        Self::ElseKw,
        Self::WhileKw,
        Self::ForKw,
        Self::ForeachKw,
        Self::LBrace,
        Self::RBrace,
        Self::LParen,
        Self::RParen,
        Self::LBracket,
        Self::RBracket,
        Self::Semicolon,
        Self::Comma,
        Self::Dot,
        Self::Eq,
        Self::Lt,
        Self::Gt,
        Self::Colon,
        Self::ColonColon,
        Self::Question,
        Self::Arrow,
        Self::Punct,
        Self::Ident,
        Self::Number,
        Self::String,
        Self::Char,
        Self::Eof,
        Self::ErrorToken,
        Self::CompilationUnit,
        Self::UsingDirective,
        Self::NameEquals,
        Self::QualifiedName,
        Self::NamespaceDecl,
        Self::AttributeList,
        Self::ClassDecl,
        Self::StructDecl,
        Self::InterfaceDecl,
        Self::EnumDecl,
        Self::EnumMember,
        Self::BaseList,
        Self::TypeParameterList,
        Self::TypeParameter,
        Self::FieldDecl,
        Self::ConstructorDecl,
        Self::MethodDecl,
        Self::PropertyDecl,
        Self::AccessorList,
        Self::Accessor,
        Self::ParameterList,
        Self::Parameter,
        Self::TypeRef,
        Self::Initializer,
        Self::ArrowBody,
        Self::Block,
        Self::IfStmt,
        Self::ElseClause,
        Self::WhileStmt,
        Self::ForStmt,
        Self::ForeachStmt,
        Self::ReturnStmt,
        Self::ExprStmt,
        Self::Condition,
        Self::Expr,
        Self::Error,
    ];

    /// Convert a raw rowan kind back into a syntax kind
    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    /// Check if this is a trivia kind
    pub const fn is_trivia(self) -> bool {
        matches!(
            self,
            Self::Whitespace
                | Self::Newline
                | Self::CommentLine
                | Self::CommentBlock
                | Self::DocComment
                | Self::Directive
        )
    }

    /// Check if this trivia kind is a comment of any flavour
    pub const fn is_comment(self) -> bool {
        matches!(
            self,
            Self::CommentLine | Self::CommentBlock | Self::DocComment
        )
    }

    /// Check if this is a keyword
    pub const fn is_keyword(self) -> bool {
        (self as u16) >= (Self::UsingKw as u16) && (self as u16) <= (Self::ForeachKw as u16)
    }

    /// Check if this is a declaration modifier keyword
    pub const fn is_modifier(self) -> bool {
        matches!(
            self,
            Self::PublicKw
                | Self::PrivateKw
                | Self::ProtectedKw
                | Self::InternalKw
                | Self::StaticKw
                | Self::ReadonlyKw
                | Self::ConstKw
                | Self::AbstractKw
                | Self::SealedKw
                | Self::VirtualKw
                | Self::OverrideKw
                | Self::ExternKw
                | Self::UnsafeKw
                | Self::NewKw
                | Self::VolatileKw
                | Self::AsyncKw
                | Self::PartialKw
        )
    }

    /// Check if this is an access modifier keyword
    pub const fn is_access_modifier(self) -> bool {
        matches!(
            self,
            Self::PublicKw | Self::PrivateKw | Self::ProtectedKw | Self::InternalKw
        )
    }

    /// Check if this is a structural node
    pub const fn is_node(self) -> bool {
        (self as u16) >= (Self::CompilationUnit as u16)
    }

    /// Check if this node kind is a type declaration
    pub const fn is_type_declaration(self) -> bool {
        matches!(
            self,
            Self::ClassDecl | Self::StructDecl | Self::InterfaceDecl | Self::EnumDecl
        )
    }

    /// Check if this node kind is a member that can appear inside a type
    pub const fn is_member_declaration(self) -> bool {
        matches!(
            self,
            Self::FieldDecl
                | Self::ConstructorDecl
                | Self::MethodDecl
                | Self::PropertyDecl
                | Self::ClassDecl
                | Self::StructDecl
                | Self::InterfaceDecl
                | Self::EnumDecl
        )
    }

    /// Check if this node kind is a statement
    pub const fn is_statement(self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::IfStmt
                | Self::WhileStmt
                | Self::ForStmt
                | Self::ForeachStmt
                | Self::ReturnStmt
                | Self::ExprStmt
        )
    }

    /// Get the text representation of keyword tokens
    pub const fn keyword_text(self) -> Option<&'static str> {
        match self {
            Self::UsingKw => Some("using"),
            Self::StaticKw => Some("static"),
            Self::NamespaceKw => Some("namespace"),
            Self::ClassKw => Some("class"),
            Self::StructKw => Some("struct"),
            Self::InterfaceKw => Some("interface"),
            Self::EnumKw => Some("enum"),
            Self::PublicKw => Some("public"),
            Self::PrivateKw => Some("private"),
            Self::ProtectedKw => Some("protected"),
            Self::InternalKw => Some("internal"),
            Self::ReadonlyKw => Some("readonly"),
            Self::ConstKw => Some("const"),
            Self::AbstractKw => Some("abstract"),
            Self::SealedKw => Some("sealed"),
            Self::VirtualKw => Some("virtual"),
            Self::OverrideKw => Some("override"),
            Self::ExternKw => Some("extern"),
            Self::UnsafeKw => Some("unsafe"),
            Self::NewKw => Some("new"),
            Self::VolatileKw => Some("volatile"),
            Self::AsyncKw => Some("async"),
            Self::PartialKw => Some("partial"),
            Self::VoidKw => Some("void"),
            Self::ReturnKw => Some("return"),
            Self::IfKw => Some("if"),
            Self::ElseKw => Some("else"),
            Self::WhileKw => Some("while"),
            Self::ForKw => Some("for"),
            Self::ForeachKw => Some("foreach"),
            _ => None,
        }
    }

    /// Look up a keyword kind from identifier text
    pub fn from_keyword(text: &str) -> Option<Self> {
        let kind = match text {
            "using" => Self::UsingKw,
            "static" => Self::StaticKw,
            "namespace" => Self::NamespaceKw,
            "class" => Self::ClassKw,
            "struct" => Self::StructKw,
            "interface" => Self::InterfaceKw,
            "enum" => Self::EnumKw,
            "public" => Self::PublicKw,
            "private" => Self::PrivateKw,
            "protected" => Self::ProtectedKw,
            "internal" => Self::InternalKw,
            "readonly" => Self::ReadonlyKw,
            "const" => Self::ConstKw,
            "abstract" => Self::AbstractKw,
            "sealed" => Self::SealedKw,
            "virtual" => Self::VirtualKw,
            "override" => Self::OverrideKw,
            "extern" => Self::ExternKw,
            "unsafe" => Self::UnsafeKw,
            "new" => Self::NewKw,
            "volatile" => Self::VolatileKw,
            "async" => Self::AsyncKw,
            "partial" => Self::PartialKw,
            "void" => Self::VoidKw,
            "return" => Self::ReturnKw,
            "if" => Self::IfKw,
            "else" => Self::ElseKw,
            "while" => Self::WhileKw,
            "for" => Self::ForKw,
            "foreach" => Self::ForeachKw,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for CsSyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl From<CsSyntaxKind> for rowan::SyntaxKind {
    fn from(kind: CsSyntaxKind) -> Self {
        Self(kind as u16)
    }
}
