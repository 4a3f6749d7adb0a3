//! Built-in code-fix providers
//!
//! Layout fixes edit trivia streams in place; ordering and documentation
//! fixes live in their own modules. [`BuiltinFixes`] groups every provider
//! the crate ships so a registry can be filled in one call.

pub mod blank_lines;
pub mod braces;
pub mod end_of_file;
pub mod file_header;
pub mod file_name;

use std::sync::Arc;

use sharpfix_core::autofix::CodeFixProvider;

use crate::documentation::DocumentationCodeFixProvider;
use crate::reorder::members::MemberOrderCodeFixProvider;
use crate::reorder::modifiers::ModifierOrderCodeFixProvider;
use crate::reorder::usings::UsingsCodeFixProvider;

pub use blank_lines::BlankLinesCodeFixProvider;
pub use braces::BracesCodeFixProvider;
pub use end_of_file::EndOfFileCodeFixProvider;
pub use file_header::FileHeaderCodeFixProvider;
pub use file_name::FileNameCodeFixProvider;

/// Collection of all built-in providers
pub struct BuiltinFixes;

impl BuiltinFixes {
    /// Blank lines, braces and end-of-file layout
    pub fn layout_fixes() -> Vec<Arc<dyn CodeFixProvider>> {
        vec![
            Arc::new(BlankLinesCodeFixProvider),
            Arc::new(BracesCodeFixProvider),
            Arc::new(EndOfFileCodeFixProvider),
        ]
    }

    /// Using directives, members and modifiers
    pub fn ordering_fixes() -> Vec<Arc<dyn CodeFixProvider>> {
        vec![
            Arc::new(UsingsCodeFixProvider),
            Arc::new(MemberOrderCodeFixProvider),
            Arc::new(ModifierOrderCodeFixProvider),
        ]
    }

    /// Documentation comments, file headers and file names
    pub fn documentation_fixes() -> Vec<Arc<dyn CodeFixProvider>> {
        vec![
            Arc::new(DocumentationCodeFixProvider),
            Arc::new(FileHeaderCodeFixProvider),
            Arc::new(FileNameCodeFixProvider),
        ]
    }

    /// Get all built-in providers
    pub fn all() -> Vec<Arc<dyn CodeFixProvider>> {
        let mut providers = Vec::new();
        providers.extend(Self::layout_fixes());
        providers.extend(Self::ordering_fixes());
        providers.extend(Self::documentation_fixes());
        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_no_rule_is_claimed_twice() {
        let mut seen = HashSet::new();
        for provider in BuiltinFixes::all() {
            for rule in provider.fixable_rules() {
                assert!(seen.insert(*rule), "{rule} registered twice");
            }
        }
        assert!(seen.contains("SA1512"));
        assert!(seen.contains("SA1210"));
        assert!(seen.contains("SA1600"));
        assert!(seen.contains("SA1503"));
    }
}
