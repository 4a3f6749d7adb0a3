//! Rule id to provider lookup and the fix entry points

use std::sync::Arc;

use indexmap::IndexMap;
use sharpfix_core::autofix::{
    CancellationToken, CodeFixProvider, DocumentBatch, FixContext, FixOutcome, ProjectFixResult,
    apply_fix, apply_fix_all, apply_fix_all_in_project,
};
use sharpfix_core::config::StyleSettings;
use sharpfix_core::semantic::SemanticModel;
use sharpfix_core::{Result, SharpfixError, ViolationDescriptor};

use crate::builtin::BuiltinFixes;

/// Registry of code-fix providers keyed by rule id
///
/// A rule has at most one provider; registering a provider for a rule that
/// already has one replaces it for that rule.
#[derive(Default)]
pub struct CodeFixRegistry {
    providers: Vec<Arc<dyn CodeFixProvider>>,
    /// Rule id -> index into `providers`
    rules: IndexMap<&'static str, usize>,
}

impl CodeFixRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in provider
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for provider in BuiltinFixes::all() {
            registry.register(provider);
        }
        registry
    }

    /// Register a provider for every rule it fixes
    pub fn register(&mut self, provider: Arc<dyn CodeFixProvider>) {
        let index = self.providers.len();
        for &rule in provider.fixable_rules() {
            if let Some(previous) = self.rules.insert(rule, index) {
                tracing::info!(
                    "Rule '{}' now fixed by '{}' instead of '{}'",
                    rule,
                    provider.title(),
                    self.providers[previous].title()
                );
            }
        }
        tracing::debug!("Registered code fix '{}'", provider.title());
        self.providers.push(provider);
    }

    pub fn provider_for(&self, rule_id: &str) -> Option<&Arc<dyn CodeFixProvider>> {
        self.rules.get(rule_id).map(|&i| &self.providers[i])
    }

    /// Rule ids with a provider, in registration order
    pub fn fixable_rules(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn index_for(&self, rule_id: &str) -> Result<usize> {
        self.rules
            .get(rule_id)
            .copied()
            .ok_or_else(|| SharpfixError::UnknownRule {
                rule_id: rule_id.to_string(),
            })
    }

    /// Descriptors answered by the same provider as `rule_id`
    fn batch_for(&self, index: usize, descriptors: &[ViolationDescriptor]) -> Vec<ViolationDescriptor> {
        let (batch, skipped): (Vec<_>, Vec<_>) = descriptors
            .iter()
            .cloned()
            .partition(|d| self.rules.get(d.rule_id()) == Some(&index));
        if !skipped.is_empty() {
            tracing::warn!(
                "Skipping {} descriptor(s) fixed by other providers",
                skipped.len()
            );
        }
        batch
    }

    /// Fix one violation
    pub fn fix_one(&self, ctx: &FixContext<'_>, descriptor: &ViolationDescriptor) -> Result<FixOutcome> {
        let index = self.index_for(descriptor.rule_id())?;
        apply_fix(self.providers[index].as_ref(), ctx, descriptor)
    }

    /// Fix every violation in one document that shares the fix of `rule_id`
    pub fn fix_all_in_document(
        &self,
        rule_id: &str,
        ctx: &FixContext<'_>,
        descriptors: &[ViolationDescriptor],
    ) -> Result<FixOutcome> {
        let index = self.index_for(rule_id)?;
        let batch = self.batch_for(index, descriptors);
        apply_fix_all(self.providers[index].as_ref(), ctx, &batch)
    }

    /// Fix every violation sharing the fix of `rule_id` across documents
    pub fn fix_all_in_project(
        &self,
        rule_id: &str,
        batches: &[DocumentBatch],
        settings: &StyleSettings,
        semantic: &dyn SemanticModel,
        cancellation: &CancellationToken,
    ) -> Result<ProjectFixResult> {
        let index = self.index_for(rule_id)?;
        let batches: Vec<DocumentBatch> = batches
            .iter()
            .map(|b| DocumentBatch::new(b.document.clone(), self.batch_for(index, &b.descriptors)))
            .collect();
        apply_fix_all_in_project(
            self.providers[index].as_ref(),
            &batches,
            settings,
            semantic,
            cancellation,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::TextRange;
    use sharpfix_core::autofix::{Proposal, ReplacementMap};
    use sharpfix_core::{Document, SyntacticModel};

    use crate::builtin::blank_lines::COMMENT_FOLLOWED_BY_BLANK;
    use crate::reorder::usings::USINGS_ALPHABETICAL;

    fn at(source: &str, needle: &str) -> TextRange {
        let start = source.find(needle).expect("needle") as u32;
        TextRange::at(start.into(), (needle.len() as u32).into())
    }

    struct Refuser;

    impl CodeFixProvider for Refuser {
        fn fixable_rules(&self) -> &'static [&'static str] {
            &[COMMENT_FOLLOWED_BY_BLANK]
        }

        fn title(&self) -> &'static str {
            "Refuse"
        }

        fn propose(
            &self,
            _ctx: &FixContext<'_>,
            _descriptor: &ViolationDescriptor,
            _edits: &mut ReplacementMap,
        ) -> Result<Proposal> {
            Ok(Proposal::Declined("refused".into()))
        }
    }

    #[test]
    fn test_builtin_registry_covers_the_scenarios() {
        let registry = CodeFixRegistry::with_builtin();
        for rule in ["SA1512", "SA1210", "SA1600", "SA1503", "SA1633", "SA1649", "SA1518"] {
            assert!(registry.provider_for(rule).is_some(), "{rule}");
        }
        assert!(registry.provider_for("SA9999").is_none());
    }

    #[test]
    fn test_unknown_rule_is_an_error() {
        let registry = CodeFixRegistry::with_builtin();
        let (doc, _) = Document::parse("Test.cs", "class C { }\n");
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptor = ViolationDescriptor::new("SA9999", TextRange::default());
        let err = registry.fix_one(&ctx, &descriptor).unwrap_err();
        assert!(matches!(err, SharpfixError::UnknownRule { .. }));
    }

    #[test]
    fn test_later_registration_wins() {
        let mut registry = CodeFixRegistry::with_builtin();
        registry.register(Arc::new(Refuser));
        let source = "class C\n{\n    // c\n\n    int x;\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptor = ViolationDescriptor::new(COMMENT_FOLLOWED_BY_BLANK, at(source, "// c"));
        assert_eq!(registry.fix_one(&ctx, &descriptor).unwrap(), FixOutcome::Unchanged);
        // Other blank-line rules still go to the built-in provider
        assert_eq!(
            registry.provider_for("SA1507").map(|p| p.title()),
            Some("Fix blank lines")
        );
    }

    #[test]
    fn test_project_fix_all_skips_other_fixes() {
        let registry = CodeFixRegistry::with_builtin();
        let first = "using System.Linq;\nusing System;\n";
        let second = "class C\n{\n    // c\n\n    int x;\n}\n";
        let batches = vec![
            DocumentBatch::new(
                Document::parse("A.cs", first).0,
                vec![ViolationDescriptor::new(USINGS_ALPHABETICAL, at(first, "using System.Linq"))],
            ),
            DocumentBatch::new(
                Document::parse("B.cs", second).0,
                vec![ViolationDescriptor::new(COMMENT_FOLLOWED_BY_BLANK, at(second, "// c"))],
            ),
        ];
        let result = registry
            .fix_all_in_project(
                USINGS_ALPHABETICAL,
                &batches,
                &StyleSettings::default(),
                &SyntacticModel::default(),
                &CancellationToken::new(),
            )
            .unwrap();
        let changed: Vec<String> = result.changed().map(|o| o.document().text()).collect();
        assert_eq!(changed, vec!["using System;\nusing System.Linq;\n".to_string()]);
        assert_eq!(result.outcomes[1].1, FixOutcome::NotOffered);
    }
}
