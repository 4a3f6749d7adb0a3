//! Member ordering
//!
//! Members are ranked by the configured list of order traits (kind,
//! accessibility, constant, static, readonly), highest priority first. A
//! member out of order moves in front of the first earlier member of its
//! container that ranks after it. Moving in ascending source order turns a
//! batch of such moves into a stable insertion sort, so fix-all produces
//! the same file as fixing one violation at a time.

use indexmap::IndexMap;
use rowan::TextSize;
use sharpfix_core::autofix::{
    BatchSummary, CodeFixProvider, FixContext, NodeTracker, Proposal, ReplacementMap, TrackedId,
};
use sharpfix_core::config::{OrderTrait, OrderingSettings};
use sharpfix_core::cst::ast::{AstNode, MemberDecl};
use sharpfix_core::cst::{CsSyntaxKind, CsSyntaxNode};
use sharpfix_core::{Result, SpanId, TreeTextSpan, ViolationDescriptor, property_keys};

use super::{Slot, SlotEdits, place, region_of};

/// Elements must appear in the correct order
pub const ELEMENTS_ORDER: &str = "SA1201";
/// Elements must be ordered by access
pub const ACCESS_ORDER: &str = "SA1202";
/// Constants must appear before fields
pub const CONSTANTS_ORDER: &str = "SA1203";
/// Static elements must appear before instance elements
pub const STATIC_ORDER: &str = "SA1204";
/// Readonly elements must appear before non-readonly elements
pub const READONLY_ORDER: &str = "SA1214";

const RULES: &[&str] = &[
    ELEMENTS_ORDER,
    ACCESS_ORDER,
    CONSTANTS_ORDER,
    STATIC_ORDER,
    READONLY_ORDER,
];

fn rule_for(order_trait: OrderTrait) -> &'static str {
    match order_trait {
        OrderTrait::Kind => ELEMENTS_ORDER,
        OrderTrait::Accessibility => ACCESS_ORDER,
        OrderTrait::Constant => CONSTANTS_ORDER,
        OrderTrait::Static => STATIC_ORDER,
        OrderTrait::Readonly => READONLY_ORDER,
    }
}

fn kind_rank(kind: CsSyntaxKind) -> u8 {
    match kind {
        CsSyntaxKind::FieldDecl => 0,
        CsSyntaxKind::ConstructorDecl => 1,
        CsSyntaxKind::EnumDecl => 2,
        CsSyntaxKind::InterfaceDecl => 3,
        CsSyntaxKind::PropertyDecl => 4,
        CsSyntaxKind::MethodDecl => 5,
        CsSyntaxKind::StructDecl => 6,
        CsSyntaxKind::ClassDecl => 7,
        _ => 8,
    }
}

fn access_rank(member: &MemberDecl) -> u8 {
    let has = |kind| member.has_modifier(kind);
    match (
        has(CsSyntaxKind::PublicKw),
        has(CsSyntaxKind::InternalKw),
        has(CsSyntaxKind::ProtectedKw),
        has(CsSyntaxKind::PrivateKw),
    ) {
        (true, _, _, _) => 0,
        (_, true, true, _) => 2,
        (_, true, _, _) => 1,
        (_, _, true, true) => 4,
        (_, _, true, _) => 3,
        (_, _, _, true) => 5,
        _ => default_access_rank(member),
    }
}

/// Implicit accessibility: public in interfaces, private in types,
/// internal at namespace level
fn default_access_rank(member: &MemberDecl) -> u8 {
    match member.syntax().parent().map(|p| p.kind()) {
        Some(CsSyntaxKind::InterfaceDecl) => 0,
        Some(kind) if kind.is_type_declaration() => 5,
        _ => 1,
    }
}

fn flag_rank(present: bool) -> u8 {
    if present { 0 } else { 1 }
}

fn trait_rank(member: &MemberDecl, order_trait: OrderTrait) -> u8 {
    match order_trait {
        OrderTrait::Kind => kind_rank(member.kind()),
        OrderTrait::Accessibility => access_rank(member),
        OrderTrait::Constant => flag_rank(member.has_modifier(CsSyntaxKind::ConstKw)),
        // Constants are implicitly static
        OrderTrait::Static => flag_rank(
            member.has_modifier(CsSyntaxKind::StaticKw) || member.has_modifier(CsSyntaxKind::ConstKw),
        ),
        OrderTrait::Readonly => flag_rank(member.has_modifier(CsSyntaxKind::ReadonlyKw)),
    }
}

/// Sort key of a member under `order`; smaller sorts first
pub fn member_key(member: &MemberDecl, order: &[OrderTrait]) -> Vec<u8> {
    order.iter().map(|&t| trait_rank(member, t)).collect()
}

/// Rule reported when `earlier` precedes `later` out of order
fn violated_rule(earlier: &MemberDecl, later: &MemberDecl, order: &[OrderTrait]) -> &'static str {
    order
        .iter()
        .find(|&&t| trait_rank(earlier, t) != trait_rank(later, t))
        .map_or(ELEMENTS_ORDER, |&t| rule_for(t))
}

fn is_member_container(node: &CsSyntaxNode) -> bool {
    match node.kind() {
        CsSyntaxKind::CompilationUnit | CsSyntaxKind::NamespaceDecl => true,
        CsSyntaxKind::EnumDecl => false,
        kind => kind.is_type_declaration(),
    }
}

/// Members of `container` bucketed by conditional-compilation region
fn members_by_region(
    container: &CsSyntaxNode,
    directives: &TreeTextSpan,
) -> IndexMap<SpanId, Vec<MemberDecl>> {
    let mut buckets: IndexMap<SpanId, Vec<MemberDecl>> = IndexMap::new();
    for member in container.children().filter_map(MemberDecl::cast) {
        buckets
            .entry(region_of(member.syntax(), directives))
            .or_default()
            .push(member);
    }
    buckets
}

/// Descriptors for every member that appears after a member ranking
/// after it
pub fn member_order_violations(
    root: &CsSyntaxNode,
    ordering: &OrderingSettings,
) -> Vec<ViolationDescriptor> {
    let order = &ordering.element_order;
    let directives = TreeTextSpan::build(root);
    let mut violations = Vec::new();
    for container in root.descendants().filter(is_member_container) {
        for members in members_by_region(&container, &directives).into_values() {
            let keys: Vec<Vec<u8>> = members.iter().map(|m| member_key(m, order)).collect();
            for (j, member) in members.iter().enumerate() {
                let Some(i) = (0..j).find(|&i| keys[i] > keys[j]) else {
                    continue;
                };
                let location = member
                    .name_token()
                    .map_or(member.syntax().text_range(), |t| t.text_range());
                let mut descriptor =
                    ViolationDescriptor::new(violated_rule(&members[i], member, order), location);
                if let Some(name) = member.name() {
                    descriptor = descriptor.with_property(property_keys::MEMBER_NAME, name);
                }
                violations.push(descriptor);
            }
        }
    }
    violations.sort_by_key(|d| d.location().start());
    violations
}

type ContainerKey = (TextSize, TextSize, u16, SpanId);

/// Tracked members of one container region
struct Bucket {
    container: CsSyntaxNode,
    tracker: NodeTracker,
    slots: Vec<TrackedId>,
}

impl Bucket {
    fn new(container: CsSyntaxNode, members: Vec<MemberDecl>) -> Self {
        let mut tracker = NodeTracker::default();
        let slots = members
            .into_iter()
            .map(|m| tracker.track(m.syntax().clone()))
            .collect();
        Self {
            container,
            tracker,
            slots,
        }
    }

    fn depth(&self) -> usize {
        self.container.ancestors().count()
    }

    /// Move `id` in front of the first earlier member ranking after it;
    /// `false` when it is already in place
    fn sort_in(&mut self, id: TrackedId, order: &[OrderTrait]) -> Result<bool> {
        let key = self.key(id, order);
        let position = self.tracker.position(id)?;
        let target = self.tracker.order()[..position]
            .iter()
            .copied()
            .find(|&other| self.key(other, order) > key);
        match target {
            Some(target) => {
                self.tracker.move_before(id, target)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn key(&self, id: TrackedId, order: &[OrderTrait]) -> Vec<u8> {
        MemberDecl::cast(self.tracker.node(id).clone())
            .map(|m| member_key(&m, order))
            .unwrap_or_default()
    }

    /// Record the new occupant of every slot that changed
    fn regenerate(&self, edits: &mut SlotEdits) {
        for (&slot_id, &occupant_id) in self.slots.iter().zip(self.tracker.order()) {
            if slot_id == occupant_id {
                continue;
            }
            let slot = self.tracker.node(slot_id);
            let occupant = self.tracker.node(occupant_id);
            let content = CsSyntaxNode::new_root(edits.rebuild(occupant));
            let green = place(
                &Slot::new(slot.clone()),
                &Slot::new(occupant.clone()),
                &content,
            );
            edits.replace(slot, green);
        }
    }
}

/// Moves members into the configured order
#[derive(Debug, Default)]
pub struct MemberOrderCodeFixProvider;

impl MemberOrderCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for MemberOrderCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        RULES
    }

    fn title(&self) -> &'static str {
        "Fix element order"
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let summary = self.propose_all(ctx, std::slice::from_ref(descriptor), edits)?;
        if summary.proposed > 0 {
            Ok(Proposal::Edits)
        } else {
            Ok(Proposal::Declined("member already in order".into()))
        }
    }

    fn propose_all(
        &self,
        ctx: &FixContext<'_>,
        descriptors: &[ViolationDescriptor],
        edits: &mut ReplacementMap,
    ) -> Result<BatchSummary> {
        let order = &ctx.settings().ordering_rules.element_order;
        let mut summary = BatchSummary::default();
        let mut buckets: IndexMap<ContainerKey, Bucket> = IndexMap::new();

        for descriptor in descriptors {
            ctx.cancellation().check()?;
            let Some(member) = ctx.find::<MemberDecl>(descriptor) else {
                tracing::debug!("{}: no member at the reported location", descriptor);
                summary.declined += 1;
                continue;
            };
            let Some(container) = member.syntax().parent().filter(is_member_container) else {
                summary.declined += 1;
                continue;
            };
            let region = region_of(member.syntax(), ctx.directives());
            let range = container.text_range();
            let key = (range.start(), range.end(), container.kind() as u16, region);
            let bucket = buckets.entry(key).or_insert_with(|| {
                let members = members_by_region(&container, ctx.directives())
                    .swap_remove(&region)
                    .unwrap_or_default();
                Bucket::new(container.clone(), members)
            });
            let moved = match bucket.tracker.resolve(member.syntax().text_range()) {
                Some(id) => bucket.sort_in(id, order)?,
                None => false,
            };
            if moved {
                summary.proposed += 1;
            } else {
                summary.declined += 1;
            }
        }

        // Inner containers first so moved outer members carry their
        // reordered bodies
        let mut buckets: Vec<Bucket> = buckets.into_values().collect();
        buckets.sort_by_key(|b| std::cmp::Reverse(b.depth()));
        let mut slot_edits = SlotEdits::new();
        for bucket in buckets.iter().filter(|b| b.tracker.is_changed()) {
            bucket.regenerate(&mut slot_edits);
        }
        let refused = slot_edits.propose_into(edits);
        if refused > 0 {
            tracing::warn!("{} member move(s) conflicted with earlier edits", refused);
        }
        summary.conflicts += refused;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpfix_core::config::StyleSettings;
    use sharpfix_core::{Document, SyntacticModel, apply_fix, apply_fix_all};

    fn run_all(source: &str) -> String {
        let (doc, errors) = Document::parse("Test.cs", source);
        assert!(errors.is_empty(), "{errors:?}");
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptors = member_order_violations(&doc.root(), &settings.ordering_rules);
        apply_fix_all(&MemberOrderCodeFixProvider, &ctx, &descriptors)
            .unwrap()
            .document()
            .map_or_else(|| source.to_string(), Document::text)
    }

    #[test]
    fn test_violations_name_the_first_differing_trait() {
        let source = "class C\n{\n    public void M() { }\n    private int x;\n    public int y;\n    static int z;\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let rules: Vec<(String, Option<String>)> =
            member_order_violations(&doc.root(), &OrderingSettings::default())
                .iter()
                .map(|d| (d.rule_id().to_string(), d.member_name().map(str::to_string)))
                .collect();
        assert_eq!(
            rules,
            vec![
                (ELEMENTS_ORDER.to_string(), Some("x".to_string())),
                (ELEMENTS_ORDER.to_string(), Some("y".to_string())),
                (ELEMENTS_ORDER.to_string(), Some("z".to_string())),
            ]
        );
    }

    #[test]
    fn test_access_violation_within_one_kind() {
        let source = "class C\n{\n    private int a;\n    public int b;\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let violations = member_order_violations(&doc.root(), &OrderingSettings::default());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id(), ACCESS_ORDER);
    }

    #[test]
    fn test_fix_all_keeps_blank_lines_in_their_slots() {
        let source = "class C\n{\n    public void M() { }\n\n    private int x;\n    public const int K = 1;\n}\n";
        insta::assert_snapshot!(run_all(source), @r"
        class C
        {
            public const int K = 1;

            private int x;
            public void M() { }
        }
        ");
    }

    #[test]
    fn test_documentation_moves_with_member() {
        let source = "class C\n{\n    /// <summary>Runs.</summary>\n    public void Run() { }\n\n    // the count\n    private int count;\n}\n";
        insta::assert_snapshot!(run_all(source), @r"
        class C
        {
            // the count
            private int count;

            /// <summary>Runs.</summary>
            public void Run() { }
        }
        ");
    }

    #[test]
    fn test_single_fix_moves_one_member() {
        let source = "class C\n{\n    void A() { }\n    void B() { }\n    int x;\n    int y;\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptors = member_order_violations(&doc.root(), &settings.ordering_rules);
        assert_eq!(descriptors.len(), 2);
        let outcome = apply_fix(&MemberOrderCodeFixProvider, &ctx, &descriptors[1]).unwrap();
        assert_eq!(
            outcome.document().map(Document::text).as_deref(),
            Some("class C\n{\n    int y;\n    void A() { }\n    void B() { }\n    int x;\n}\n")
        );
    }

    #[test]
    fn test_members_do_not_cross_regions() {
        let source = "class C\n{\n    void M() { }\n#if DEBUG\n    int x;\n#endif\n}\n";
        assert_eq!(run_all(source), source);
    }

    #[test]
    fn test_nested_type_carries_its_reordered_body() {
        let source = "class A\n{\n    class B\n    {\n        void M() { }\n        int y;\n    }\n    int z;\n}\n";
        insta::assert_snapshot!(run_all(source), @r"
        class A
        {
            int z;
            class B
            {
                int y;
                void M() { }
            }
        }
        ");
    }

    #[test]
    fn test_custom_order_puts_access_first() {
        let source = "class C\n{\n    private int x;\n    public void M() { }\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let ordering = OrderingSettings {
            element_order: vec![OrderTrait::Accessibility, OrderTrait::Kind],
            ..OrderingSettings::default()
        };
        let violations = member_order_violations(&doc.root(), &ordering);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_id(), ACCESS_ORDER);
    }
}
