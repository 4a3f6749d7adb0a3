//! Indentation and line-ending policy for synthesized trivia

use crate::config::IndentationSettings;
use crate::cst::{CsSyntaxKind, CsSyntaxNode, CsSyntaxToken};

/// Renders indentation for synthesized code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentationPolicy {
    settings: IndentationSettings,
    end_of_line: String,
}

impl IndentationPolicy {
    pub fn new(settings: IndentationSettings) -> Self {
        Self {
            settings,
            end_of_line: "\n".to_string(),
        }
    }

    /// Policy that reuses the line ending already present in `root`
    pub fn for_tree(settings: IndentationSettings, root: &CsSyntaxNode) -> Self {
        Self {
            settings,
            end_of_line: detect_end_of_line(root).to_string(),
        }
    }

    pub fn settings(&self) -> &IndentationSettings {
        &self.settings
    }

    pub fn end_of_line(&self) -> &str {
        &self.end_of_line
    }

    /// Number of indent-worthy ancestors between `node` and the root
    pub fn steps_for(&self, node: &CsSyntaxNode) -> usize {
        let mut steps = 0;
        let mut child = node.clone();
        while let Some(parent) = child.parent() {
            if opens_indentation(&parent, &child) {
                steps += 1;
            }
            child = parent;
        }
        steps
    }

    /// Whitespace for `steps` indentation levels
    pub fn render(&self, steps: usize) -> String {
        if self.settings.use_tabs {
            "\t".repeat(steps)
        } else {
            " ".repeat(steps * self.settings.indentation_size)
        }
    }

    /// Whitespace reaching an absolute column
    pub fn render_columns(&self, columns: usize) -> String {
        if self.settings.use_tabs && self.settings.tab_size > 0 {
            let tabs = columns / self.settings.tab_size;
            let spaces = columns % self.settings.tab_size;
            format!("{}{}", "\t".repeat(tabs), " ".repeat(spaces))
        } else {
            " ".repeat(columns)
        }
    }

    /// Rendered indentation for `node`
    pub fn indentation_for(&self, node: &CsSyntaxNode) -> String {
        self.render(self.steps_for(node))
    }

    /// Column width of an indentation string
    pub fn columns(&self, indentation: &str) -> usize {
        indentation.chars().fold(0, |col, c| match c {
            '\t' if self.settings.tab_size > 0 => {
                col + self.settings.tab_size - col % self.settings.tab_size
            }
            _ => col + 1,
        })
    }
}

impl Default for IndentationPolicy {
    fn default() -> Self {
        Self::new(IndentationSettings::default())
    }
}

/// Whether `parent` adds one indentation level for `child`
fn opens_indentation(parent: &CsSyntaxNode, child: &CsSyntaxNode) -> bool {
    match parent.kind() {
        CsSyntaxKind::NamespaceDecl => parent
            .children_with_tokens()
            .any(|e| e.kind() == CsSyntaxKind::LBrace),
        kind if kind.is_type_declaration() => true,
        CsSyntaxKind::Block | CsSyntaxKind::AccessorList => true,
        CsSyntaxKind::IfStmt
        | CsSyntaxKind::WhileStmt
        | CsSyntaxKind::ForStmt
        | CsSyntaxKind::ForeachStmt => {
            child.kind().is_statement() && child.kind() != CsSyntaxKind::Block
        }
        // `else if` stays on the `else` level
        CsSyntaxKind::ElseClause => !matches!(
            child.kind(),
            CsSyntaxKind::Block | CsSyntaxKind::IfStmt
        ),
        _ => false,
    }
}

/// Indentation actually used on the line that holds `token`
pub fn line_indentation(token: &CsSyntaxToken) -> String {
    let mut first_on_line = None;
    let mut current = token.prev_token();
    while let Some(t) = current {
        if t.kind() == CsSyntaxKind::Newline {
            break;
        }
        first_on_line = Some(t.clone());
        current = t.prev_token();
    }
    match first_on_line {
        Some(t) if t.kind() == CsSyntaxKind::Whitespace => t.text().to_string(),
        Some(_) => String::new(),
        None if token.kind() == CsSyntaxKind::Whitespace => token.text().to_string(),
        None => String::new(),
    }
}

/// Line ending of the first line break in the tree, `\n` when there is none
pub fn detect_end_of_line(root: &CsSyntaxNode) -> &'static str {
    let first = root
        .descendants_with_tokens()
        .filter_map(|e| e.into_token())
        .find(|t| t.kind() == CsSyntaxKind::Newline);
    match first {
        Some(t) if t.text() == "\r\n" => "\r\n",
        Some(t) if t.text() == "\r" => "\r",
        _ => "\n",
    }
}
