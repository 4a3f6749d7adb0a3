//! Using-directive ordering and placement
//!
//! Every container (the compilation unit and each namespace) sorts its
//! usings per conditional-compilation region: namespaces first (`System`
//! ahead of the rest when configured), then `using static`, then aliases.
//! Each class sorts case-insensitively by name segment with an ordinal
//! tie-break; `global::` is ignored and aliases sort by alias name.
//!
//! Placement moves usings into or out of the namespace. It only runs when
//! the file has exactly one block namespace, nothing else at the top level,
//! and no directive lines around the usings involved; otherwise the usings
//! stay where they are and are only sorted.

use indexmap::IndexMap;
use sharpfix_core::autofix::{
    BatchSummary, CodeFixProvider, FixContext, NodeReplacement, Proposal, ReplacementMap,
    TokenReplacement, rewrite_detached,
};
use sharpfix_core::config::{BlankLinesPolicy, UsingPlacement};
use sharpfix_core::cst::ast::{
    AstNode, CompilationUnit, NamespaceDecl, UsingDirective, first_significant_token,
    last_significant_token, text_without_trivia,
};
use sharpfix_core::cst::trivia::{self, TriviaPiece, TriviaStream};
use sharpfix_core::cst::{
    CsSyntaxKind, CsSyntaxNode, GreenElement, GreenNode, GreenToken, NodeOrToken,
};
use sharpfix_core::{Result, SpanId, ViolationDescriptor};

use super::{Slot, SlotEdits, place_with, reindent, strip_blank_lines};

/// Using directives must be placed correctly
pub const USING_PLACEMENT: &str = "SA1200";
/// System using directives must be placed before other using directives
pub const SYSTEM_USINGS_FIRST: &str = "SA1208";
/// Using alias directives must be placed after other using directives
pub const ALIAS_USINGS_LAST: &str = "SA1209";
/// Using directives must be ordered alphabetically by namespace
pub const USINGS_ALPHABETICAL: &str = "SA1210";
/// Using alias directives must be ordered alphabetically by alias name
pub const ALIAS_USINGS_ALPHABETICAL: &str = "SA1211";
/// Using static directives must be placed at the correct location
pub const STATIC_USINGS_PLACEMENT: &str = "SA1216";
/// Using static directives must be ordered alphabetically
pub const STATIC_USINGS_ALPHABETICAL: &str = "SA1217";

const RULES: &[&str] = &[
    USING_PLACEMENT,
    SYSTEM_USINGS_FIRST,
    ALIAS_USINGS_LAST,
    USINGS_ALPHABETICAL,
    ALIAS_USINGS_ALPHABETICAL,
    STATIC_USINGS_PLACEMENT,
    STATIC_USINGS_ALPHABETICAL,
];

/// Sort class of a using directive, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UsingCategory {
    System,
    Namespace,
    Static,
    Alias,
}

/// A using directive ready to be placed into some slot
#[derive(Debug, Clone)]
pub struct UsingEntry {
    slot: Slot,
    content: CsSyntaxNode,
    category: UsingCategory,
    key: Vec<String>,
    ordinal: Vec<String>,
}

impl UsingEntry {
    /// Classify `content`, the directive as it will be emitted; `slot` is
    /// where it came from. `None` for directives without a name.
    pub fn new(slot: Slot, content: CsSyntaxNode, system_first: bool) -> Option<Self> {
        let directive = UsingDirective::cast(content.clone())?;
        let name = directive.name()?;
        let name = name.strip_prefix("global::").unwrap_or(&name).to_string();
        let (category, sort_name) = match directive.alias() {
            Some(alias) => (UsingCategory::Alias, alias),
            None if directive.is_static() => (UsingCategory::Static, name),
            None if system_first && is_system(&name) => (UsingCategory::System, name),
            None => (UsingCategory::Namespace, name),
        };
        let ordinal: Vec<String> = sort_name.split('.').map(str::to_string).collect();
        let key = ordinal.iter().map(|s| s.to_lowercase()).collect();
        Some(Self {
            slot,
            content,
            category,
            key,
            ordinal,
        })
    }

    pub fn category(&self) -> UsingCategory {
        self.category
    }

    /// Group used for blank-line separation: category plus first segment
    fn group(&self) -> (UsingCategory, &str) {
        (
            self.category,
            self.key.first().map(String::as_str).unwrap_or_default(),
        )
    }
}

fn is_system(name: &str) -> bool {
    name == "System" || name.starts_with("System.")
}

/// Usings of one container bucketed by region and class
#[derive(Debug, Default)]
pub struct UsingsSorter {
    system: IndexMap<SpanId, Vec<UsingEntry>>,
    namespaces: IndexMap<SpanId, Vec<UsingEntry>>,
    statics: IndexMap<SpanId, Vec<UsingEntry>>,
    aliases: IndexMap<SpanId, Vec<UsingEntry>>,
    slots: IndexMap<SpanId, Vec<Slot>>,
}

impl UsingsSorter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `entry`; its slot becomes the next slot of `region`
    pub fn add(&mut self, region: SpanId, entry: UsingEntry) {
        self.slots
            .entry(region)
            .or_default()
            .push(entry.slot.clone());
        let table = match entry.category {
            UsingCategory::System => &mut self.system,
            UsingCategory::Namespace => &mut self.namespaces,
            UsingCategory::Static => &mut self.statics,
            UsingCategory::Alias => &mut self.aliases,
        };
        table.entry(region).or_default().push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sorted occupants for every slot, region by region
    pub fn arrange(mut self, policy: BlankLinesPolicy, eol: &str) -> Vec<(Slot, GreenNode)> {
        let mut arranged = Vec::new();
        for (region, slots) in std::mem::take(&mut self.slots) {
            let mut sorted = Vec::with_capacity(slots.len());
            for table in [
                &mut self.system,
                &mut self.namespaces,
                &mut self.statics,
                &mut self.aliases,
            ] {
                let mut entries = table.swap_remove(&region).unwrap_or_default();
                entries.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.ordinal.cmp(&b.ordinal)));
                sorted.extend(entries);
            }

            let mut previous: Option<&UsingEntry> = None;
            for (i, (slot, occupant)) in slots.into_iter().zip(&sorted).enumerate() {
                let pinned = if i == 0 || slot.has_fixed_prefix() || policy == BlankLinesPolicy::Allow
                {
                    slot.pinned().to_vec()
                } else if policy == BlankLinesPolicy::Require
                    && previous.is_some_and(|p| p.group() != occupant.group())
                {
                    vec![TriviaPiece::end_of_line(eol)]
                } else {
                    Vec::new()
                };
                let green = place_with(&slot, pinned, &occupant.slot, &occupant.content);
                arranged.push((slot, green));
                previous = Some(occupant);
            }
        }
        arranged
    }
}

/// Where the usings should end up
#[derive(Debug, Clone, PartialEq, Eq)]
enum Placement {
    Keep,
    MoveIn(NamespaceDecl),
    MoveOut(NamespaceDecl),
}

impl Placement {
    fn involves(&self, container: &CsSyntaxNode) -> bool {
        match self {
            Placement::Keep => false,
            Placement::MoveIn(ns) | Placement::MoveOut(ns) => {
                container.kind() == CsSyntaxKind::CompilationUnit || container == ns.syntax()
            }
        }
    }
}

fn usings_of(container: &CsSyntaxNode) -> Vec<CsSyntaxNode> {
    container
        .children()
        .filter(|n| n.kind() == CsSyntaxKind::UsingDirective)
        .collect()
}

fn has_directive(node: &CsSyntaxNode) -> bool {
    node.descendants_with_tokens()
        .any(|e| e.kind() == CsSyntaxKind::Directive)
}

/// No directive inside the usings nor right after the last one
fn directive_free(usings: &[CsSyntaxNode]) -> bool {
    if usings.iter().any(has_directive) {
        return false;
    }
    usings
        .last()
        .and_then(last_significant_token)
        .is_none_or(|last| !TriviaStream::after(&last).has_directive())
}

fn plan_placement(ctx: &FixContext<'_>) -> Placement {
    let setting = ctx.settings().ordering_rules.using_directives_placement;
    if setting == UsingPlacement::Preserve {
        return Placement::Keep;
    }
    let Some(unit) = CompilationUnit::cast(ctx.root().clone()) else {
        return Placement::Keep;
    };
    let namespaces: Vec<NamespaceDecl> = unit.namespaces().collect();
    let [namespace] = namespaces.as_slice() else {
        return Placement::Keep;
    };
    if namespace.is_file_scoped()
        || namespace.open_brace().is_none()
        || unit.attribute_lists().next().is_some()
        || unit.members().next().is_some()
    {
        return Placement::Keep;
    }

    let unit_usings = usings_of(unit.syntax());
    let namespace_usings = usings_of(namespace.syntax());
    let keyword_has_directive = first_significant_token(namespace.syntax())
        .is_some_and(|kw| trivia::leading_of(&kw).iter().any(TriviaPiece::is_directive));
    if !directive_free(&unit_usings) || !directive_free(&namespace_usings) || keyword_has_directive
    {
        tracing::debug!("Using placement kept: directives around the usings");
        return Placement::Keep;
    }

    let namespace_start = namespace.syntax().text_range().start();
    match setting {
        UsingPlacement::InsideNamespace
            if !unit_usings.is_empty()
                && unit_usings
                    .iter()
                    .all(|u| u.text_range().end() <= namespace_start) =>
        {
            Placement::MoveIn(namespace.clone())
        }
        UsingPlacement::OutsideNamespace if !namespace_usings.is_empty() => {
            Placement::MoveOut(namespace.clone())
        }
        _ => Placement::Keep,
    }
}

/// Sorted and placed usings for the whole document
pub fn regenerate(ctx: &FixContext<'_>) -> SlotEdits {
    let mut edits = SlotEdits::new();
    let placement = plan_placement(ctx);
    let containers = ctx.root().descendants().filter(|n| {
        matches!(
            n.kind(),
            CsSyntaxKind::CompilationUnit | CsSyntaxKind::NamespaceDecl
        )
    });
    for container in containers {
        if !placement.involves(&container) {
            sort_container(ctx, &container, &mut edits);
        }
    }
    match placement {
        Placement::Keep => {}
        Placement::MoveIn(namespace) => move_in(ctx, &namespace, &mut edits),
        Placement::MoveOut(namespace) => move_out(ctx, &namespace, &mut edits),
    }
    edits
}

fn sort_container(ctx: &FixContext<'_>, container: &CsSyntaxNode, edits: &mut SlotEdits) {
    let usings = usings_of(container);
    if usings.len() < 2 {
        return;
    }
    let ordering = &ctx.settings().ordering_rules;
    let mut sorter = UsingsSorter::new();
    for using in usings {
        let slot = Slot::new(using.clone());
        let region = slot.region(ctx.directives());
        let Some(entry) = UsingEntry::new(slot, using, ordering.system_using_directives_first)
        else {
            tracing::debug!("Skipping usings of a container with an incomplete directive");
            return;
        };
        sorter.add(region, entry);
    }
    for (slot, green) in sorter.arrange(ordering.blank_lines_between_using_groups, ctx.end_of_line())
    {
        edits.replace(slot.node(), green);
    }
}

/// Move the compilation unit's usings to the top of the namespace
fn move_in(ctx: &FixContext<'_>, namespace: &NamespaceDecl, edits: &mut SlotEdits) {
    let ordering = &ctx.settings().ordering_rules;
    let system_first = ordering.system_using_directives_first;
    let policy = ctx.indentation();
    let indentation = policy.render(policy.steps_for(namespace.syntax()) + 1);
    let region = super::region_of(namespace.syntax(), ctx.directives());

    let unit_usings = usings_of(ctx.root());
    let namespace_usings = usings_of(namespace.syntax());
    let Some(first) = unit_usings.first() else {
        return;
    };
    let header = Slot::new(first.clone()).pinned().to_vec();

    let mut sorter = UsingsSorter::new();
    for using in &namespace_usings {
        let Some(entry) = UsingEntry::new(Slot::new(using.clone()), using.clone(), system_first)
        else {
            return;
        };
        sorter.add(region, entry);
    }
    for using in &unit_usings {
        let own = Slot::new(using.clone());
        let moved = Slot::with_parts(
            using.clone(),
            Vec::new(),
            reindent(own.movable(), true, &indentation),
        );
        let Some(entry) = UsingEntry::new(moved, using.clone(), system_first) else {
            return;
        };
        sorter.add(region, entry);
    }
    let arranged: Vec<GreenNode> = sorter
        .arrange(ordering.blank_lines_between_using_groups, ctx.end_of_line())
        .into_iter()
        .map(|(_, green)| green)
        .collect();

    for using in &namespace_usings {
        edits.remove(using);
    }
    let rebuilt = CsSyntaxNode::new_root(edits.rebuild(namespace.syntax()));
    let eol = ctx.end_of_line().to_string();
    let adjusted = rewrite_detached(&rebuilt, |root, map| {
        if let Some(keyword) = first_significant_token(root) {
            let mut leading = header;
            leading.extend(strip_blank_lines(&trivia::leading_of(&keyword)));
            map.propose_token(&keyword, TokenReplacement::new().with_leading(leading));
        }
        let next = NamespaceDecl::cast(root.clone())
            .and_then(|ns| ns.open_brace())
            .and_then(|open| trivia::next_significant(&open));
        if let Some(next) = next.filter(|t| t.kind() != CsSyntaxKind::RBrace) {
            let mut leading = vec![TriviaPiece::end_of_line(eol.as_str())];
            leading.extend(strip_blank_lines(&trivia::leading_of(&next)));
            map.propose_token(&next, TokenReplacement::new().with_leading(leading));
        }
    });
    let green = insert_after_open_brace(&adjusted, arranged, &eol);

    for using in &unit_usings {
        edits.remove(using);
    }
    edits.replace(namespace.syntax(), green);
    tracing::debug!("Moving {} using(s) into the namespace", unit_usings.len());
}

/// Move the namespace's usings above it, merged with the compilation
/// unit's own
fn move_out(ctx: &FixContext<'_>, namespace: &NamespaceDecl, edits: &mut SlotEdits) {
    let ordering = &ctx.settings().ordering_rules;
    let system_first = ordering.system_using_directives_first;
    let region = super::region_of(namespace.syntax(), ctx.directives());

    let unit_usings = usings_of(ctx.root());
    let namespace_usings = usings_of(namespace.syntax());
    let namespace_slot = Slot::new(namespace.syntax().clone());

    let mut sorter = UsingsSorter::new();
    for using in &unit_usings {
        let Some(entry) = UsingEntry::new(Slot::new(using.clone()), using.clone(), system_first)
        else {
            return;
        };
        sorter.add(region, entry);
    }
    for (i, using) in namespace_usings.iter().enumerate() {
        let own = Slot::new(using.clone());
        let pinned = if i == 0 && unit_usings.is_empty() {
            namespace_slot.pinned().to_vec()
        } else {
            Vec::new()
        };
        let moved = Slot::with_parts(using.clone(), pinned, reindent(own.movable(), true, ""));
        let Some(entry) = UsingEntry::new(moved, qualify(ctx, using), system_first) else {
            return;
        };
        sorter.add(region, entry);
    }
    let arranged: Vec<GreenNode> = sorter
        .arrange(ordering.blank_lines_between_using_groups, ctx.end_of_line())
        .into_iter()
        .map(|(_, green)| green)
        .collect();

    for using in &namespace_usings {
        edits.remove(using);
    }
    let rebuilt = CsSyntaxNode::new_root(edits.rebuild(namespace.syntax()));
    let eol = ctx.end_of_line().to_string();
    let separate = unit_usings.is_empty();
    let adjusted = rewrite_detached(&rebuilt, |root, map| {
        let next = NamespaceDecl::cast(root.clone())
            .and_then(|ns| ns.open_brace())
            .and_then(|open| trivia::next_significant(&open));
        if let Some(next) = next {
            let leading = strip_blank_lines(&trivia::leading_of(&next));
            map.propose_token(&next, TokenReplacement::new().with_leading(leading));
        }
        if separate && let Some(keyword) = first_significant_token(root) {
            let mut leading = vec![TriviaPiece::end_of_line(eol.as_str())];
            leading.extend(namespace_slot.movable().iter().cloned());
            map.propose_token(&keyword, TokenReplacement::new().with_leading(leading));
        }
    });

    let mut moved: Vec<GreenElement> = arranged.into_iter().map(NodeOrToken::Node).collect();
    match unit_usings.split_first() {
        Some((first, rest)) => {
            edits.splice(first, moved);
            for using in rest {
                edits.remove(using);
            }
            edits.replace(namespace.syntax(), adjusted);
        }
        None => {
            moved.push(NodeOrToken::Node(adjusted));
            edits.splice(namespace.syntax(), moved);
        }
    }
    tracing::debug!("Moving {} using(s) out of the namespace", namespace_usings.len());
}

/// Directive with its name fully qualified, for usings leaving a namespace
///
/// Names the semantic model cannot resolve stay as written.
fn qualify(ctx: &FixContext<'_>, using: &CsSyntaxNode) -> CsSyntaxNode {
    let Some(name_node) = UsingDirective::cast(using.clone()).and_then(|u| u.name_node()) else {
        return using.clone();
    };
    let name = text_without_trivia(&name_node);
    if name.starts_with("global::") || name.contains('<') {
        tracing::debug!("Leaving '{}' unqualified", name);
        return using.clone();
    }
    let Some(qualified) = ctx.semantic().fully_qualified_name(&name, using) else {
        tracing::debug!("Cannot resolve '{}'; leaving it as written", name);
        return using.clone();
    };
    if qualified == name {
        return using.clone();
    }
    let trailing = last_significant_token(&name_node)
        .map(|t| trivia::trailing_of(&t))
        .unwrap_or_default();
    let green = rewrite_detached(using, |root, map| {
        if let Some(node) = root
            .children()
            .find(|n| n.kind() == CsSyntaxKind::QualifiedName)
        {
            map.propose_node(&node, NodeReplacement::with(qualified_name_green(&qualified, &trailing)));
        }
    });
    CsSyntaxNode::new_root(green)
}

fn qualified_name_green(name: &str, trailing: &[TriviaPiece]) -> GreenNode {
    let mut children: Vec<GreenElement> = Vec::new();
    for (i, segment) in name.split('.').enumerate() {
        if i > 0 {
            children.push(NodeOrToken::Token(GreenToken::new(CsSyntaxKind::Dot.into(), ".")));
        }
        children.push(NodeOrToken::Token(GreenToken::new(
            CsSyntaxKind::Ident.into(),
            segment,
        )));
    }
    children.extend(trailing.iter().map(|p| NodeOrToken::Token(p.to_green())));
    GreenNode::new(CsSyntaxKind::QualifiedName.into(), children)
}

/// Insert `usings` on the line after the namespace's opening brace
fn insert_after_open_brace(namespace: &GreenNode, usings: Vec<GreenNode>, eol: &str) -> GreenNode {
    let root = CsSyntaxNode::new_root(namespace.clone());
    let mut children: Vec<GreenElement> = Vec::new();
    let mut insert_at = None;
    let mut after_brace = false;
    for child in root.children_with_tokens() {
        match child {
            NodeOrToken::Node(node) => {
                if after_brace && insert_at.is_none() {
                    insert_at = Some((children.len(), true));
                }
                children.push(NodeOrToken::Node(node.green().into_owned()));
            }
            NodeOrToken::Token(token) => {
                let kind = token.kind();
                if after_brace && insert_at.is_none() {
                    if kind == CsSyntaxKind::Newline {
                        children.push(NodeOrToken::Token(token.green().to_owned()));
                        insert_at = Some((children.len(), false));
                        continue;
                    }
                    if !matches!(
                        kind,
                        CsSyntaxKind::Whitespace | CsSyntaxKind::CommentLine | CsSyntaxKind::CommentBlock
                    ) {
                        insert_at = Some((children.len(), true));
                    }
                }
                if kind == CsSyntaxKind::LBrace && insert_at.is_none() {
                    after_brace = true;
                }
                children.push(NodeOrToken::Token(token.green().to_owned()));
            }
        }
    }
    let (at, needs_break) = insert_at.unwrap_or((children.len(), true));
    let mut inserted: Vec<GreenElement> = Vec::with_capacity(usings.len() + 1);
    if needs_break {
        inserted.push(NodeOrToken::Token(TriviaPiece::end_of_line(eol).to_green()));
    }
    inserted.extend(usings.into_iter().map(NodeOrToken::Node));
    children.splice(at..at, inserted);
    GreenNode::new(CsSyntaxKind::NamespaceDecl.into(), children)
}

/// Fixes using-directive order and placement for the whole document
///
/// One fix regenerates every using in the file, so fix-all proposes once
/// regardless of how many violations were reported.
#[derive(Debug, Default)]
pub struct UsingsCodeFixProvider;

impl UsingsCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for UsingsCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        RULES
    }

    fn title(&self) -> &'static str {
        "Reorder using directives"
    }

    fn is_offered(&self, ctx: &FixContext<'_>, descriptor: &ViolationDescriptor) -> bool {
        if descriptor.no_code_fix() {
            return false;
        }
        if descriptor.rule_id() != USING_PLACEMENT {
            return true;
        }
        CompilationUnit::cast(ctx.root().clone())
            .is_some_and(|unit| unit.namespaces().count() <= 1)
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        _descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let regenerated = regenerate(ctx);
        if regenerated.is_empty() {
            return Ok(Proposal::Declined("using directives already in place".into()));
        }
        let refused = regenerated.propose_into(edits);
        if refused > 0 {
            tracing::warn!("{} using rewrite(s) conflicted with earlier edits", refused);
        }
        Ok(Proposal::Edits)
    }

    fn propose_all(
        &self,
        ctx: &FixContext<'_>,
        descriptors: &[ViolationDescriptor],
        edits: &mut ReplacementMap,
    ) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let Some(first) = descriptors.first() else {
            return Ok(summary);
        };
        ctx.cancellation().check()?;
        let before = edits.conflicts();
        match self.propose(ctx, first, edits)? {
            Proposal::Edits => summary.proposed = descriptors.len(),
            _ => summary.declined = descriptors.len(),
        }
        summary.conflicts = edits.conflicts() - before;
        Ok(summary)
    }
}
