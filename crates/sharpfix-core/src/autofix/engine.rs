//! Code-fix providers and the single-fix / fix-all drivers
//!
//! A provider turns one [`ViolationDescriptor`] into proposals on a
//! [`ReplacementMap`]. The drivers own everything around that: checking
//! whether a fix is offered, batching every descriptor of a document into a
//! single rewrite, fanning a project out over worker threads, and honouring
//! cancellation between units of work.

use std::cell::OnceCell;

use rayon::prelude::*;
use rowan::{TextRange, TextSize};

use crate::config::StyleSettings;
use crate::cst::ast::AstNode;
use crate::cst::trivia;
use crate::cst::{CsSyntaxNode, CsSyntaxToken};
use crate::diagnostics::ViolationDescriptor;
use crate::directives::TreeTextSpan;
use crate::document::Document;
use crate::indentation::IndentationPolicy;
use crate::semantic::SemanticModel;
use crate::{Result, ResultExt, SharpfixError};

use super::cancel::CancellationToken;
use super::replacement::ReplacementMap;
use super::rewriter::rewrite;

/// Everything a provider may consult while proposing edits
///
/// The context is built once per document per batch; every descriptor in
/// the batch resolves against the same original tree.
pub struct FixContext<'a> {
    document: &'a Document,
    root: CsSyntaxNode,
    settings: &'a StyleSettings,
    semantic: &'a dyn SemanticModel,
    indentation: IndentationPolicy,
    directives: OnceCell<TreeTextSpan>,
    cancellation: CancellationToken,
}

impl<'a> FixContext<'a> {
    pub fn new(
        document: &'a Document,
        settings: &'a StyleSettings,
        semantic: &'a dyn SemanticModel,
    ) -> Self {
        let root = document.root();
        let indentation = IndentationPolicy::for_tree(settings.indentation, &root);
        Self {
            document,
            root,
            settings,
            semantic,
            indentation,
            directives: OnceCell::new(),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn document(&self) -> &Document {
        self.document
    }

    pub fn root(&self) -> &CsSyntaxNode {
        &self.root
    }

    pub fn settings(&self) -> &StyleSettings {
        self.settings
    }

    pub fn semantic(&self) -> &dyn SemanticModel {
        self.semantic
    }

    pub fn indentation(&self) -> &IndentationPolicy {
        &self.indentation
    }

    pub fn end_of_line(&self) -> &str {
        self.indentation.end_of_line()
    }

    /// Conditional-compilation regions, built on first use
    pub fn directives(&self) -> &TreeTextSpan {
        self.directives.get_or_init(|| TreeTextSpan::build(&self.root))
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// First significant token at or after `offset`
    pub fn token_at(&self, offset: TextSize) -> Option<CsSyntaxToken> {
        if offset > self.root.text_range().end() {
            return None;
        }
        let token = self.root.token_at_offset(offset).right_biased()?;
        if token.kind().is_trivia() {
            trivia::next_significant(&token)
        } else {
            Some(token)
        }
    }

    /// Smallest node covering `range`, `None` when the range is outside the
    /// tree
    pub fn covering_node(&self, range: TextRange) -> Option<CsSyntaxNode> {
        if !self.root.text_range().contains_range(range) {
            return None;
        }
        match self.root.covering_element(range) {
            rowan::NodeOrToken::Node(node) => Some(node),
            rowan::NodeOrToken::Token(token) => token.parent(),
        }
    }

    /// Innermost `N` covering the descriptor location
    pub fn find<N: AstNode>(&self, descriptor: &ViolationDescriptor) -> Option<N> {
        self.covering_node(descriptor.location())?
            .ancestors()
            .find_map(N::cast)
    }
}

/// What a provider decided for one descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// Edits were added to the map (possibly none)
    Edits,
    /// The document should be renamed to the given file name
    Rename(String),
    /// The anchor did not resolve to something the provider can fix
    Declined(String),
}

/// Per-document tally of a fix-all batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub proposed: usize,
    pub declined: usize,
    pub conflicts: usize,
    pub rename: Option<String>,
}

/// A code fix for one or more rules
pub trait CodeFixProvider: Send + Sync {
    /// Rule ids this provider fixes
    fn fixable_rules(&self) -> &'static [&'static str];

    /// Title shown for the fix; also its fix-all equivalence key
    fn title(&self) -> &'static str;

    /// Whether a fix is offered for this descriptor at all
    fn is_offered(&self, _ctx: &FixContext<'_>, descriptor: &ViolationDescriptor) -> bool {
        !descriptor.no_code_fix()
    }

    /// Add the edits fixing `descriptor` to `edits`
    fn propose(
        &self,
        ctx: &FixContext<'_>,
        descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal>;

    /// Add the edits for a whole batch
    ///
    /// `descriptors` arrive in ascending source order and have already
    /// passed [`CodeFixProvider::is_offered`]. The default proposes each in
    /// turn against the shared map, first proposal winning on conflicts. A
    /// recoverable error for one descriptor counts it as declined.
    fn propose_all(
        &self,
        ctx: &FixContext<'_>,
        descriptors: &[ViolationDescriptor],
        edits: &mut ReplacementMap,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        for descriptor in descriptors {
            ctx.cancellation().check()?;
            let before = edits.conflicts();
            match self.propose(ctx, descriptor, edits).skip_recoverable(descriptor)? {
                Some(Proposal::Edits) => summary.proposed += 1,
                Some(Proposal::Rename(name)) => {
                    summary.proposed += 1;
                    summary.rename.get_or_insert(name);
                }
                Some(Proposal::Declined(reason)) => {
                    tracing::debug!("{} declined: {}", descriptor, reason);
                    summary.declined += 1;
                }
                None => summary.declined += 1,
            }
            summary.conflicts += edits.conflicts() - before;
        }
        Ok(summary)
    }
}

/// A rewritten document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutput {
    Tree(Document),
    Rename {
        old_name: String,
        new_name: String,
        document: Document,
    },
}

impl FixOutput {
    pub fn document(&self) -> &Document {
        match self {
            FixOutput::Tree(document) | FixOutput::Rename { document, .. } => document,
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            FixOutput::Tree(document) | FixOutput::Rename { document, .. } => document,
        }
    }
}

/// Result of asking for a fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    Fixed(FixOutput),
    /// A fix was offered but produced no change
    Unchanged,
    /// No fix is offered for this violation
    NotOffered,
}

impl FixOutcome {
    pub fn is_fixed(&self) -> bool {
        matches!(self, FixOutcome::Fixed(_))
    }

    pub fn output(&self) -> Option<&FixOutput> {
        match self {
            FixOutcome::Fixed(output) => Some(output),
            _ => None,
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.output().map(FixOutput::document)
    }
}

/// Replace the file-name part of a document name
fn with_file_name(name: &str, file_name: &str) -> String {
    match name.rfind(['/', '\\']) {
        Some(i) => format!("{}{}", &name[..=i], file_name),
        None => file_name.to_string(),
    }
}

fn finish(ctx: &FixContext<'_>, edits: &ReplacementMap, rename: Option<String>) -> FixOutcome {
    let document = ctx.document();
    let rewritten = if edits.is_empty() {
        None
    } else {
        Some(document.with_root(&rewrite(ctx.root(), edits)))
    };

    let rename = rename.filter(|new| new != document.file_name());
    match (rewritten, rename) {
        (None, None) => FixOutcome::Unchanged,
        (Some(doc), None) if doc == *document => FixOutcome::Unchanged,
        (Some(doc), None) => FixOutcome::Fixed(FixOutput::Tree(doc)),
        (doc, Some(new_file_name)) => {
            let old_name = document.name().to_string();
            let new_name = with_file_name(&old_name, &new_file_name);
            let document = doc.unwrap_or_else(|| document.clone()).renamed(new_name.clone());
            FixOutcome::Fixed(FixOutput::Rename {
                old_name,
                new_name,
                document,
            })
        }
    }
}

/// Apply the fix for a single descriptor
pub fn apply_fix(
    provider: &dyn CodeFixProvider,
    ctx: &FixContext<'_>,
    descriptor: &ViolationDescriptor,
) -> Result<FixOutcome> {
    ctx.cancellation().check()?;
    if !provider.is_offered(ctx, descriptor) {
        tracing::debug!("No fix offered for {}", descriptor);
        return Ok(FixOutcome::NotOffered);
    }

    let mut edits = ReplacementMap::new();
    let rename = match provider.propose(ctx, descriptor, &mut edits)? {
        Proposal::Edits => None,
        Proposal::Rename(name) => Some(name),
        Proposal::Declined(reason) => {
            tracing::debug!("{} left unchanged: {}", descriptor, reason);
            return Ok(FixOutcome::Unchanged);
        }
    };
    Ok(finish(ctx, &edits, rename))
}

/// Apply every descriptor of one document in a single rewrite
pub fn apply_fix_all(
    provider: &dyn CodeFixProvider,
    ctx: &FixContext<'_>,
    descriptors: &[ViolationDescriptor],
) -> Result<FixOutcome> {
    ctx.cancellation().check()?;
    let mut offered: Vec<ViolationDescriptor> = descriptors
        .iter()
        .filter(|d| provider.is_offered(ctx, d))
        .cloned()
        .collect();
    if offered.is_empty() {
        return Ok(FixOutcome::NotOffered);
    }
    offered.sort_by_key(|d| (d.location().start(), d.location().end()));

    let mut edits = ReplacementMap::new();
    let summary = provider.propose_all(ctx, &offered, &mut edits)?;
    tracing::debug!(
        "{}: {} proposed, {} declined, {} conflicting in {}",
        provider.title(),
        summary.proposed,
        summary.declined,
        summary.conflicts,
        ctx.document().name()
    );
    Ok(finish(ctx, &edits, summary.rename))
}

/// One document and the descriptors reported for it
#[derive(Debug, Clone)]
pub struct DocumentBatch {
    pub document: Document,
    pub descriptors: Vec<ViolationDescriptor>,
}

impl DocumentBatch {
    pub fn new(document: Document, descriptors: Vec<ViolationDescriptor>) -> Self {
        Self {
            document,
            descriptors,
        }
    }
}

/// Per-document results of a project-wide fix-all
#[derive(Debug, Default)]
pub struct ProjectFixResult {
    /// Outcome per document, in input order
    pub outcomes: Vec<(String, FixOutcome)>,
    /// Documents whose provider failed; other documents are unaffected
    pub failures: Vec<(String, SharpfixError)>,
}

impl ProjectFixResult {
    pub fn changed(&self) -> impl Iterator<Item = &FixOutput> {
        self.outcomes.iter().filter_map(|(_, o)| o.output())
    }
}

/// Fix-all across documents, one worker per document
///
/// Documents are independent: a provider failure in one is recorded and the
/// rest continue. Cancellation aborts the whole run.
pub fn apply_fix_all_in_project(
    provider: &dyn CodeFixProvider,
    batches: &[DocumentBatch],
    settings: &StyleSettings,
    semantic: &dyn SemanticModel,
    cancellation: &CancellationToken,
) -> Result<ProjectFixResult> {
    tracing::info!(
        "Fixing '{}' in {} document(s)",
        provider.title(),
        batches.len()
    );

    let results: Vec<(String, Result<FixOutcome>)> = batches
        .par_iter()
        .map(|batch| {
            let name = batch.document.name().to_string();
            if cancellation.is_cancelled() {
                return (name, Err(SharpfixError::Cancelled));
            }
            let ctx = FixContext::new(&batch.document, settings, semantic)
                .with_cancellation(cancellation.clone());
            (name, apply_fix_all(provider, &ctx, &batch.descriptors))
        })
        .collect();

    let mut project = ProjectFixResult::default();
    for (name, result) in results {
        match result {
            Ok(outcome) => project.outcomes.push((name, outcome)),
            Err(SharpfixError::Cancelled) => return Err(SharpfixError::Cancelled),
            Err(err) if err.is_recoverable() => {
                tracing::warn!("Fix-all failed for {}: {}", name, err);
                project.failures.push((name, err));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(project)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autofix::replacement::TokenReplacement;
    use crate::cst::CsSyntaxKind;
    use crate::diagnostics::property_keys;
    use crate::semantic::SyntacticModel;

    /// Renames `var` identifiers to the descriptor's expected text
    struct RenameIdent;

    impl CodeFixProvider for RenameIdent {
        fn fixable_rules(&self) -> &'static [&'static str] {
            &["TEST01"]
        }

        fn title(&self) -> &'static str {
            "Rename identifier"
        }

        fn propose(
            &self,
            ctx: &FixContext<'_>,
            descriptor: &ViolationDescriptor,
            edits: &mut ReplacementMap,
        ) -> Result<Proposal> {
            let Some(token) = ctx.token_at(descriptor.location().start()) else {
                return Ok(Proposal::Declined("no token".into()));
            };
            if token.kind() != CsSyntaxKind::Ident {
                return Ok(Proposal::Declined("not an identifier".into()));
            }
            let text = descriptor.expected_text().unwrap_or("renamed");
            edits.propose_token(&token, TokenReplacement::new().with_text(text));
            Ok(Proposal::Edits)
        }
    }

    fn at(source: &str, needle: &str) -> TextRange {
        let start = source.find(needle).expect("needle") as u32;
        TextRange::at(start.into(), (needle.len() as u32).into())
    }

    #[test]
    fn test_single_fix_and_not_offered() {
        let source = "class A { int x; }";
        let (doc, _) = Document::parse("A.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);

        let descriptor = ViolationDescriptor::new("TEST01", at(source, "x"))
            .with_property(property_keys::EXPECTED_TEXT, "y");
        let outcome = apply_fix(&RenameIdent, &ctx, &descriptor).unwrap();
        assert_eq!(
            outcome.document().map(Document::text).as_deref(),
            Some("class A { int y; }")
        );

        let refused = descriptor.with_property(property_keys::NO_CODE_FIX, "");
        assert_eq!(
            apply_fix(&RenameIdent, &ctx, &refused).unwrap(),
            FixOutcome::NotOffered
        );
    }

    #[test]
    fn test_malformed_anchor_leaves_document_unchanged() {
        let source = "class A { }";
        let (doc, _) = Document::parse("A.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptor = ViolationDescriptor::new("TEST01", at(source, "{"));
        assert_eq!(
            apply_fix(&RenameIdent, &ctx, &descriptor).unwrap(),
            FixOutcome::Unchanged
        );
    }

    #[test]
    fn test_fix_all_rewrites_once_and_keeps_first_proposal() {
        let source = "class A { int x; int y; }";
        let (doc, _) = Document::parse("A.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);

        let descriptors = vec![
            ViolationDescriptor::new("TEST01", at(source, "y"))
                .with_property(property_keys::EXPECTED_TEXT, "b"),
            ViolationDescriptor::new("TEST01", at(source, "x"))
                .with_property(property_keys::EXPECTED_TEXT, "a"),
            ViolationDescriptor::new("TEST01", at(source, "x"))
                .with_property(property_keys::EXPECTED_TEXT, "z"),
        ];
        let outcome = apply_fix_all(&RenameIdent, &ctx, &descriptors).unwrap();
        assert_eq!(
            outcome.document().map(Document::text).as_deref(),
            Some("class A { int a; int b; }")
        );
    }

    #[test]
    fn test_project_fix_all_stops_on_cancellation() {
        let (doc, _) = Document::parse("A.cs", "class A { int x; }");
        let batches = vec![DocumentBatch::new(
            doc,
            vec![ViolationDescriptor::new("TEST01", TextRange::at(14.into(), 1.into()))],
        )];
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let cancellation = CancellationToken::new();

        let result =
            apply_fix_all_in_project(&RenameIdent, &batches, &settings, &model, &cancellation)
                .unwrap();
        assert_eq!(result.changed().count(), 1);

        cancellation.cancel();
        let cancelled =
            apply_fix_all_in_project(&RenameIdent, &batches, &settings, &model, &cancellation);
        assert!(matches!(cancelled, Err(SharpfixError::Cancelled)));
    }

    #[test]
    fn test_rename_keeps_directories() {
        assert_eq!(with_file_name("src/Models/Old.cs", "New.cs"), "src/Models/New.cs");
        assert_eq!(with_file_name("Old.cs", "New.cs"), "New.cs");
    }
}
