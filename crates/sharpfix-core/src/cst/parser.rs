//! Hierarchical, error-tolerant parser for the C# subset
//!
//! The parser never fails: unexpected tokens are wrapped in `Error` nodes and
//! parsing continues, so half-typed code still yields a lossless tree.
//!
//! Trivia ownership: `bump` first emits the pending leading trivia, then the
//! token, then the token's trailing trivia (whitespace and comments up to and
//! including the first end-of-line). Because leading trivia is emitted after
//! the enclosing node was started, every declaration and statement node owns
//! the comments, documentation and directive lines directly above it.

use super::lexer::{CstToken, LexerError};
use super::{CsSyntaxKind, CsSyntaxNode, CstBuilder};

/// Kind of a parse problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Reported by the lexer
    Lexer,
    /// A required token was missing
    Missing,
    /// A token appeared where it cannot be placed
    Unexpected,
}

/// A recoverable parse problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Byte offset where the problem was detected
    pub offset: usize,
}

impl From<LexerError> for ParseError {
    fn from(error: LexerError) -> Self {
        Self {
            kind: ParseErrorKind::Lexer,
            message: error.message,
            offset: error.span.start,
        }
    }
}

/// Parse source text into a lossless CST
///
/// # Example
///
/// ```rust,ignore
/// use sharpfix_core::cst::parse_cs;
///
/// let source = "namespace Demo\n{\n    class A { }\n}\n";
/// let (cst, errors) = parse_cs(source);
/// assert!(errors.is_empty());
/// assert_eq!(cst.text().to_string(), source);
/// ```
pub fn parse_cs(source: &str) -> (CsSyntaxNode, Vec<ParseError>) {
    let (tokens, lexer_errors) = super::lex_with_trivia(source);
    let mut parser = Parser::new(&tokens);
    parser.parse_compilation_unit();
    let (cst, mut errors) = parser.finish();
    errors.extend(lexer_errors.into_iter().map(ParseError::from));
    errors.sort_by_key(|e| e.offset);
    (cst, errors)
}

/// Token stream parser
struct Parser<'a> {
    tokens: &'a [CstToken],
    pos: usize,
    builder: CstBuilder,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [CstToken]) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: CstBuilder::new(),
            errors: Vec::new(),
        }
    }

    fn finish(self) -> (CsSyntaxNode, Vec<ParseError>) {
        (self.builder.finish(), self.errors)
    }

    // ------------------------------------------------------------------
    // Token stream primitives
    // ------------------------------------------------------------------

    /// Raw index of the n-th significant token from the cursor
    fn nth_index(&self, n: usize) -> Option<usize> {
        self.tokens[self.pos..]
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.kind.is_trivia())
            .nth(n)
            .map(|(i, _)| self.pos + i)
    }

    fn nth(&self, n: usize) -> CsSyntaxKind {
        self.nth_index(n)
            .map(|i| self.tokens[i].kind)
            .unwrap_or(CsSyntaxKind::Eof)
    }

    fn nth_text(&self, n: usize) -> &str {
        self.nth_index(n)
            .map(|i| self.tokens[i].text.as_str())
            .unwrap_or("")
    }

    fn current(&self) -> CsSyntaxKind {
        self.nth(0)
    }

    fn at(&self, kind: CsSyntaxKind) -> bool {
        self.current() == kind
    }

    fn at_end(&self) -> bool {
        self.at(CsSyntaxKind::Eof)
    }

    fn at_contextual(&self, word: &str) -> bool {
        self.at(CsSyntaxKind::Ident) && self.nth_text(0) == word
    }

    fn current_offset(&self) -> usize {
        self.nth_index(0)
            .map(|i| self.tokens[i].span.start)
            .unwrap_or_else(|| self.tokens.last().map(|t| t.span.end).unwrap_or(0))
    }

    /// Emit leading trivia, the current significant token and its trailing
    /// trivia
    fn bump(&mut self) {
        self.eat_leading_trivia();
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        self.builder.token(token.kind, &token.text);
        self.pos += 1;
        self.eat_trailing_trivia();
    }

    fn eat_leading_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.token(token.kind, &token.text);
            self.pos += 1;
        }
    }

    fn eat_trailing_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                CsSyntaxKind::Whitespace | CsSyntaxKind::CommentLine | CsSyntaxKind::CommentBlock => {
                    self.builder.token(token.kind, &token.text);
                    self.pos += 1;
                }
                CsSyntaxKind::Newline => {
                    self.builder.token(token.kind, &token.text);
                    self.pos += 1;
                    return;
                }
                _ => return,
            }
        }
    }

    fn expect(&mut self, kind: CsSyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            self.error(ParseErrorKind::Missing, format!("Expected {kind}"));
            false
        }
    }

    fn error(&mut self, kind: ParseErrorKind, message: String) {
        let offset = self.current_offset();
        self.errors.push(ParseError {
            kind,
            message,
            offset,
        });
    }

    /// Wrap the current token in an `Error` node and move past it
    fn error_and_bump(&mut self) {
        self.error(
            ParseErrorKind::Unexpected,
            format!("Unexpected {}", self.current()),
        );
        self.builder.start_node(CsSyntaxKind::Error);
        self.bump();
        self.builder.finish_node();
    }

    /// Consume tokens until `stop` matches at nesting depth zero or an
    /// unmatched closing delimiter is reached
    fn bump_balanced(&mut self, stop: impl Fn(CsSyntaxKind) -> bool) {
        let mut depth = 0usize;
        loop {
            let kind = self.current();
            if kind == CsSyntaxKind::Eof || (depth == 0 && stop(kind)) {
                break;
            }
            match kind {
                CsSyntaxKind::LParen | CsSyntaxKind::LBracket | CsSyntaxKind::LBrace => depth += 1,
                CsSyntaxKind::RParen | CsSyntaxKind::RBracket | CsSyntaxKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.bump();
        }
    }

    // ------------------------------------------------------------------
    // Lookahead helpers
    // ------------------------------------------------------------------

    /// Index just past a balanced `open ... close` group starting at `k`
    fn skip_group(&self, mut k: usize, open: CsSyntaxKind, close: CsSyntaxKind) -> usize {
        let mut depth = 0usize;
        loop {
            let kind = self.nth(k);
            if kind == CsSyntaxKind::Eof {
                return k;
            }
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return k + 1;
                }
            }
            k += 1;
        }
    }

    /// Index just past a type reference starting at `k`
    fn skip_type(&self, mut k: usize) -> Option<usize> {
        if !matches!(self.nth(k), CsSyntaxKind::Ident | CsSyntaxKind::VoidKw) {
            return None;
        }
        k += 1;
        loop {
            match self.nth(k) {
                CsSyntaxKind::Dot | CsSyntaxKind::ColonColon
                    if self.nth(k + 1) == CsSyntaxKind::Ident =>
                {
                    k += 2;
                }
                CsSyntaxKind::Lt => k = self.skip_group(k, CsSyntaxKind::Lt, CsSyntaxKind::Gt),
                _ => break,
            }
        }
        while self.nth(k) == CsSyntaxKind::LBracket && self.nth(k + 1) != CsSyntaxKind::Ident {
            k = self.skip_group(k, CsSyntaxKind::LBracket, CsSyntaxKind::RBracket);
        }
        while self.nth(k) == CsSyntaxKind::Question {
            k += 1;
        }
        Some(k)
    }

    /// Classify the member declaration starting at the cursor
    fn member_kind(&self) -> Option<CsSyntaxKind> {
        let mut k = 0;
        while self.nth(k) == CsSyntaxKind::LBracket {
            k = self.skip_group(k, CsSyntaxKind::LBracket, CsSyntaxKind::RBracket);
        }
        while self.nth(k).is_modifier() {
            k += 1;
        }
        match self.nth(k) {
            CsSyntaxKind::ClassKw => return Some(CsSyntaxKind::ClassDecl),
            CsSyntaxKind::StructKw => return Some(CsSyntaxKind::StructDecl),
            CsSyntaxKind::InterfaceKw => return Some(CsSyntaxKind::InterfaceDecl),
            CsSyntaxKind::EnumKw => return Some(CsSyntaxKind::EnumDecl),
            _ => {}
        }
        let after_type = self.skip_type(k)?;
        if self.nth(after_type) == CsSyntaxKind::LParen && after_type == k + 1 {
            return Some(CsSyntaxKind::ConstructorDecl);
        }
        if self.nth(after_type) != CsSyntaxKind::Ident {
            return None;
        }
        match self.nth(after_type + 1) {
            CsSyntaxKind::LParen | CsSyntaxKind::Lt => Some(CsSyntaxKind::MethodDecl),
            CsSyntaxKind::LBrace | CsSyntaxKind::Arrow => Some(CsSyntaxKind::PropertyDecl),
            CsSyntaxKind::Eq | CsSyntaxKind::Semicolon | CsSyntaxKind::Comma => {
                Some(CsSyntaxKind::FieldDecl)
            }
            _ => None,
        }
    }

    fn at_global_attribute(&self) -> bool {
        self.at(CsSyntaxKind::LBracket)
            && self.nth(1) == CsSyntaxKind::Ident
            && matches!(self.nth_text(1), "assembly" | "module")
            && self.nth(2) == CsSyntaxKind::Colon
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_compilation_unit(&mut self) {
        self.builder.start_node(CsSyntaxKind::CompilationUnit);

        while !self.at_end() {
            let start = self.pos;
            match self.current() {
                CsSyntaxKind::UsingKw => self.parse_using(),
                CsSyntaxKind::NamespaceKw => self.parse_namespace(),
                CsSyntaxKind::LBracket if self.at_global_attribute() => {
                    self.parse_attribute_list()
                }
                _ => match self.member_kind() {
                    Some(kind) => self.parse_member(kind),
                    None => self.error_and_bump(),
                },
            }
            if self.pos == start {
                self.error_and_bump();
            }
        }

        // End-of-file token owns whatever trivia is left
        self.eat_leading_trivia();
        self.builder.token(CsSyntaxKind::Eof, "");
        self.builder.finish_node();
    }

    fn parse_using(&mut self) {
        self.builder.start_node(CsSyntaxKind::UsingDirective);
        self.bump();
        if self.at(CsSyntaxKind::StaticKw) {
            self.bump();
        }
        if self.at(CsSyntaxKind::Ident) && self.nth(1) == CsSyntaxKind::Eq {
            self.builder.start_node(CsSyntaxKind::NameEquals);
            self.bump();
            self.bump();
            self.builder.finish_node();
        }
        self.parse_qualified_name();
        self.expect(CsSyntaxKind::Semicolon);
        self.builder.finish_node();
    }

    fn parse_qualified_name(&mut self) {
        self.builder.start_node(CsSyntaxKind::QualifiedName);
        if !self.expect(CsSyntaxKind::Ident) {
            self.builder.finish_node();
            return;
        }
        loop {
            match self.current() {
                CsSyntaxKind::Dot | CsSyntaxKind::ColonColon
                    if self.nth(1) == CsSyntaxKind::Ident =>
                {
                    self.bump();
                    self.bump();
                }
                CsSyntaxKind::Lt => self.bump_angle_group(),
                _ => break,
            }
        }
        self.builder.finish_node();
    }

    fn bump_angle_group(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current() {
                CsSyntaxKind::Lt => depth += 1,
                CsSyntaxKind::Gt => depth = depth.saturating_sub(1),
                CsSyntaxKind::Eof | CsSyntaxKind::Semicolon | CsSyntaxKind::LBrace => return,
                _ => {}
            }
            self.bump();
            if depth == 0 {
                return;
            }
        }
    }

    fn parse_namespace(&mut self) {
        self.builder.start_node(CsSyntaxKind::NamespaceDecl);
        self.bump();
        self.parse_qualified_name();
        if self.at(CsSyntaxKind::Semicolon) {
            // File-scoped namespace; following members stay at the top level
            self.bump();
            self.builder.finish_node();
            return;
        }
        self.expect(CsSyntaxKind::LBrace);
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let start = self.pos;
            match self.current() {
                CsSyntaxKind::UsingKw => self.parse_using(),
                CsSyntaxKind::NamespaceKw => self.parse_namespace(),
                _ => match self.member_kind() {
                    Some(kind) => self.parse_member(kind),
                    None => self.error_and_bump(),
                },
            }
            if self.pos == start {
                self.error_and_bump();
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        if self.at(CsSyntaxKind::Semicolon) {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn parse_attribute_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::AttributeList);
        self.bump();
        self.bump_balanced(|kind| kind == CsSyntaxKind::RBracket);
        self.expect(CsSyntaxKind::RBracket);
        self.builder.finish_node();
    }

    fn parse_member(&mut self, kind: CsSyntaxKind) {
        self.builder.start_node(kind);
        while self.at(CsSyntaxKind::LBracket) {
            self.parse_attribute_list();
        }
        while self.current().is_modifier() {
            self.bump();
        }

        match kind {
            CsSyntaxKind::ClassDecl | CsSyntaxKind::StructDecl | CsSyntaxKind::InterfaceDecl => {
                self.parse_type_body()
            }
            CsSyntaxKind::EnumDecl => self.parse_enum_body(),
            CsSyntaxKind::ConstructorDecl => {
                self.bump();
                self.parse_parameter_list();
                if self.at(CsSyntaxKind::Colon) {
                    // Constructor initializer: `: base(...)`
                    self.bump_balanced(|k| matches!(k, CsSyntaxKind::LBrace | CsSyntaxKind::Arrow));
                }
                self.parse_body();
            }
            CsSyntaxKind::MethodDecl => {
                self.parse_type_ref();
                self.expect(CsSyntaxKind::Ident);
                if self.at(CsSyntaxKind::Lt) {
                    self.parse_type_parameter_list();
                }
                self.parse_parameter_list();
                if self.at_contextual("where") {
                    self.bump_balanced(|k| {
                        matches!(
                            k,
                            CsSyntaxKind::LBrace | CsSyntaxKind::Arrow | CsSyntaxKind::Semicolon
                        )
                    });
                }
                self.parse_body();
            }
            CsSyntaxKind::PropertyDecl => {
                self.parse_type_ref();
                self.expect(CsSyntaxKind::Ident);
                if self.at(CsSyntaxKind::Arrow) {
                    self.parse_arrow_body();
                } else {
                    self.parse_accessor_list();
                    if self.at(CsSyntaxKind::Eq) {
                        self.parse_initializer();
                        self.expect(CsSyntaxKind::Semicolon);
                    }
                }
            }
            CsSyntaxKind::FieldDecl => {
                self.parse_type_ref();
                self.expect(CsSyntaxKind::Ident);
                if self.at(CsSyntaxKind::Eq) {
                    self.parse_initializer();
                }
                while self.at(CsSyntaxKind::Comma) {
                    self.bump();
                    self.expect(CsSyntaxKind::Ident);
                    if self.at(CsSyntaxKind::Eq) {
                        self.parse_initializer();
                    }
                }
                self.expect(CsSyntaxKind::Semicolon);
            }
            _ => self.error_and_bump(),
        }

        self.builder.finish_node();
    }

    fn parse_type_body(&mut self) {
        self.bump(); // class / struct / interface
        self.expect(CsSyntaxKind::Ident);
        if self.at(CsSyntaxKind::Lt) {
            self.parse_type_parameter_list();
        }
        if self.at(CsSyntaxKind::Colon) {
            self.parse_base_list();
        }
        if self.at_contextual("where") {
            self.bump_balanced(|k| k == CsSyntaxKind::LBrace);
        }
        if !self.expect(CsSyntaxKind::LBrace) {
            return;
        }
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let start = self.pos;
            match self.member_kind() {
                Some(kind) => self.parse_member(kind),
                None => self.error_and_bump(),
            }
            if self.pos == start {
                self.error_and_bump();
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        if self.at(CsSyntaxKind::Semicolon) {
            self.bump();
        }
    }

    fn parse_base_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::BaseList);
        self.bump();
        while !self.at_end() && !self.at(CsSyntaxKind::LBrace) && !self.at_contextual("where") {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn parse_enum_body(&mut self) {
        self.bump(); // enum
        self.expect(CsSyntaxKind::Ident);
        if self.at(CsSyntaxKind::Colon) {
            self.parse_base_list();
        }
        if !self.expect(CsSyntaxKind::LBrace) {
            return;
        }
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let start = self.pos;
            self.builder.start_node(CsSyntaxKind::EnumMember);
            while self.at(CsSyntaxKind::LBracket) {
                self.parse_attribute_list();
            }
            self.expect(CsSyntaxKind::Ident);
            if self.at(CsSyntaxKind::Eq) {
                self.parse_initializer();
            }
            self.builder.finish_node();
            if self.at(CsSyntaxKind::Comma) {
                self.bump();
            }
            if self.pos == start {
                self.error_and_bump();
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        if self.at(CsSyntaxKind::Semicolon) {
            self.bump();
        }
    }

    fn parse_type_ref(&mut self) {
        self.builder.start_node(CsSyntaxKind::TypeRef);
        if matches!(self.current(), CsSyntaxKind::Ident | CsSyntaxKind::VoidKw) {
            self.bump();
        } else {
            self.error(ParseErrorKind::Missing, "Expected type".to_string());
        }
        loop {
            match self.current() {
                CsSyntaxKind::Dot | CsSyntaxKind::ColonColon
                    if self.nth(1) == CsSyntaxKind::Ident =>
                {
                    self.bump();
                    self.bump();
                }
                CsSyntaxKind::Lt => self.bump_angle_group(),
                _ => break,
            }
        }
        while self.at(CsSyntaxKind::LBracket) && self.nth(1) != CsSyntaxKind::Ident {
            self.bump();
            self.bump_balanced(|k| k == CsSyntaxKind::RBracket);
            self.expect(CsSyntaxKind::RBracket);
        }
        while self.at(CsSyntaxKind::Question) {
            self.bump();
        }
        self.builder.finish_node();
    }

    fn parse_type_parameter_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::TypeParameterList);
        self.bump();
        while !self.at_end() && !self.at(CsSyntaxKind::Gt) {
            let start = self.pos;
            self.builder.start_node(CsSyntaxKind::TypeParameter);
            while self.at(CsSyntaxKind::LBracket) {
                self.parse_attribute_list();
            }
            if (self.at_contextual("in") || self.at_contextual("out"))
                && self.nth(1) == CsSyntaxKind::Ident
            {
                self.bump();
            }
            self.expect(CsSyntaxKind::Ident);
            self.builder.finish_node();
            if self.at(CsSyntaxKind::Comma) {
                self.bump();
            } else if self.pos == start {
                self.error_and_bump();
            } else if !self.at(CsSyntaxKind::Gt) {
                break;
            }
        }
        self.expect(CsSyntaxKind::Gt);
        self.builder.finish_node();
    }

    fn parse_parameter_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::ParameterList);
        if !self.expect(CsSyntaxKind::LParen) {
            self.builder.finish_node();
            return;
        }
        while !self.at_end() && !self.at(CsSyntaxKind::RParen) {
            self.builder.start_node(CsSyntaxKind::Parameter);
            while self.at(CsSyntaxKind::LBracket) {
                self.parse_attribute_list();
            }
            let mut angle = 0usize;
            loop {
                match self.current() {
                    CsSyntaxKind::Eof | CsSyntaxKind::RParen => break,
                    CsSyntaxKind::Comma if angle == 0 => break,
                    CsSyntaxKind::Lt => angle += 1,
                    CsSyntaxKind::Gt => angle = angle.saturating_sub(1),
                    CsSyntaxKind::LBrace | CsSyntaxKind::RBrace | CsSyntaxKind::Semicolon => break,
                    _ => {}
                }
                self.bump();
            }
            self.builder.finish_node();
            if self.at(CsSyntaxKind::Comma) {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(CsSyntaxKind::RParen);
        self.builder.finish_node();
    }

    fn parse_body(&mut self) {
        match self.current() {
            CsSyntaxKind::LBrace => self.parse_block(),
            CsSyntaxKind::Arrow => self.parse_arrow_body(),
            CsSyntaxKind::Semicolon => self.bump(),
            _ => self.error(ParseErrorKind::Missing, "Expected body".to_string()),
        }
    }

    fn parse_arrow_body(&mut self) {
        self.builder.start_node(CsSyntaxKind::ArrowBody);
        self.bump();
        self.parse_expression(|k| k == CsSyntaxKind::Semicolon);
        self.expect(CsSyntaxKind::Semicolon);
        self.builder.finish_node();
    }

    fn parse_accessor_list(&mut self) {
        self.builder.start_node(CsSyntaxKind::AccessorList);
        self.expect(CsSyntaxKind::LBrace);
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let start = self.pos;
            self.builder.start_node(CsSyntaxKind::Accessor);
            while self.at(CsSyntaxKind::LBracket) {
                self.parse_attribute_list();
            }
            while self.current().is_modifier() {
                self.bump();
            }
            if self.at(CsSyntaxKind::Ident) {
                self.bump();
                self.parse_body();
            } else {
                self.error_and_bump();
            }
            self.builder.finish_node();
            if self.pos == start {
                self.error_and_bump();
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        self.builder.finish_node();
    }

    fn parse_initializer(&mut self) {
        self.builder.start_node(CsSyntaxKind::Initializer);
        self.bump();
        self.parse_expression(|k| matches!(k, CsSyntaxKind::Semicolon | CsSyntaxKind::Comma));
        self.builder.finish_node();
    }

    fn parse_expression(&mut self, stop: impl Fn(CsSyntaxKind) -> bool) {
        self.builder.start_node(CsSyntaxKind::Expr);
        self.bump_balanced(stop);
        self.builder.finish_node();
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) {
        self.builder.start_node(CsSyntaxKind::Block);
        self.bump();
        while !self.at_end() && !self.at(CsSyntaxKind::RBrace) {
            let start = self.pos;
            self.parse_statement();
            if self.pos == start {
                self.error_and_bump();
            }
        }
        self.expect(CsSyntaxKind::RBrace);
        self.builder.finish_node();
    }

    fn parse_statement(&mut self) {
        match self.current() {
            CsSyntaxKind::LBrace => self.parse_block(),
            CsSyntaxKind::IfKw => {
                self.builder.start_node(CsSyntaxKind::IfStmt);
                self.bump();
                self.parse_condition();
                self.parse_embedded_statement();
                if self.at(CsSyntaxKind::ElseKw) {
                    self.builder.start_node(CsSyntaxKind::ElseClause);
                    self.bump();
                    self.parse_embedded_statement();
                    self.builder.finish_node();
                }
                self.builder.finish_node();
            }
            kind @ (CsSyntaxKind::WhileKw | CsSyntaxKind::ForKw | CsSyntaxKind::ForeachKw) => {
                let node = match kind {
                    CsSyntaxKind::WhileKw => CsSyntaxKind::WhileStmt,
                    CsSyntaxKind::ForKw => CsSyntaxKind::ForStmt,
                    _ => CsSyntaxKind::ForeachStmt,
                };
                self.builder.start_node(node);
                self.bump();
                self.parse_condition();
                self.parse_embedded_statement();
                self.builder.finish_node();
            }
            CsSyntaxKind::ReturnKw => {
                self.builder.start_node(CsSyntaxKind::ReturnStmt);
                self.bump();
                if !self.at(CsSyntaxKind::Semicolon) {
                    self.parse_expression(|k| k == CsSyntaxKind::Semicolon);
                }
                self.expect(CsSyntaxKind::Semicolon);
                self.builder.finish_node();
            }
            _ => {
                self.builder.start_node(CsSyntaxKind::ExprStmt);
                if !self.at(CsSyntaxKind::Semicolon) {
                    self.parse_expression(|k| k == CsSyntaxKind::Semicolon);
                }
                self.expect(CsSyntaxKind::Semicolon);
                self.builder.finish_node();
            }
        }
    }

    fn parse_embedded_statement(&mut self) {
        if self.at_end() || self.at(CsSyntaxKind::RBrace) {
            self.error(ParseErrorKind::Missing, "Expected statement".to_string());
            return;
        }
        self.parse_statement();
    }

    fn parse_condition(&mut self) {
        self.builder.start_node(CsSyntaxKind::Condition);
        if self.expect(CsSyntaxKind::LParen) {
            self.bump_balanced(|k| k == CsSyntaxKind::RParen);
            self.expect(CsSyntaxKind::RParen);
        }
        self.builder.finish_node();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of_children(node: &CsSyntaxNode) -> Vec<CsSyntaxKind> {
        node.children().map(|n| n.kind()).collect()
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let source = "// header\n\nusing System;\nusing static System.Math;\nusing IO = System.IO;\n\nnamespace Demo\n{\n#if DEBUG\n    using System.Diagnostics;\n#endif\n\n    /// <summary>Doc.</summary>\n    public sealed class Widget<T> : Base, IDisposable where T : class\n    {\n        private const int Limit = 3, Other = 4;\n        public Widget(int size) : base(size) { }\n        public string Name { get; private set; } = \"x\";\n        public T Get<TKey>(TKey key) => default;\n        void Run()\n        {\n            if (x) y();\n            else { z(); }\n            foreach (var a in b) Do(a);\n            return;\n        }\n    }\n\n    enum Color { Red, Green = 2, }\n}\n";
        let (cst, errors) = parse_cs(source);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(cst.text().to_string(), source);
    }

    #[test]
    fn test_leading_trivia_belongs_to_declaration() {
        let source = "class A\n{\n    // note\n    int x;\n}\n";
        let (cst, _) = parse_cs(source);
        let field = cst
            .descendants()
            .find(|n| n.kind() == CsSyntaxKind::FieldDecl)
            .expect("field");
        assert_eq!(field.text().to_string(), "    // note\n    int x;\n");
    }

    #[test]
    fn test_member_classification() {
        let source = "class A { int f; A() { } int P { get; } void M() { } class N { } }";
        let (cst, errors) = parse_cs(source);
        assert!(errors.is_empty(), "{errors:?}");
        let class = cst.first_child().expect("class");
        assert_eq!(
            kinds_of_children(&class),
            vec![
                CsSyntaxKind::FieldDecl,
                CsSyntaxKind::ConstructorDecl,
                CsSyntaxKind::PropertyDecl,
                CsSyntaxKind::MethodDecl,
                CsSyntaxKind::ClassDecl,
            ]
        );
    }

    #[test]
    fn test_global_attribute_is_top_level() {
        let (cst, errors) = parse_cs("[assembly: CLSCompliant(true)]\nclass A { }\n");
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(
            kinds_of_children(&cst),
            vec![CsSyntaxKind::AttributeList, CsSyntaxKind::ClassDecl]
        );
    }

    #[test]
    fn test_incomplete_code_still_round_trips() {
        let source = "class A {\n    void M( {\n        if (x\n";
        let (cst, errors) = parse_cs(source);
        assert!(!errors.is_empty());
        assert_eq!(cst.text().to_string(), source);
    }

    #[test]
    fn test_trailing_trivia_stops_at_line_end() {
        let (cst, _) = parse_cs("using A; // why\n\nusing B;\n");
        let first = cst.first_child().expect("using");
        assert_eq!(first.text().to_string(), "using A; // why\n");
    }
}
