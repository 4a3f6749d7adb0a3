//! Modifier ordering
//!
//! Access modifiers come first, then `static`, then everything else in
//! source order. Tokens are rewritten in place: each position keeps its own
//! trivia and only the keyword changes.

use sharpfix_core::autofix::{
    CodeFixProvider, FixContext, Proposal, ReplacementMap, TokenReplacement,
};
use sharpfix_core::cst::ast::MemberDecl;
use sharpfix_core::cst::{CsSyntaxKind, CsSyntaxToken};
use sharpfix_core::{Result, ViolationDescriptor};

/// Declaration keywords must follow order
pub const MODIFIER_ORDER: &str = "SA1206";

fn modifier_rank(kind: CsSyntaxKind) -> u8 {
    if kind.is_access_modifier() {
        0
    } else if kind == CsSyntaxKind::StaticKw {
        1
    } else {
        2
    }
}

/// Modifiers of `member` in canonical order
pub fn ordered_modifiers(member: &MemberDecl) -> Vec<CsSyntaxToken> {
    let mut modifiers = member.modifiers();
    modifiers.sort_by_key(|t| modifier_rank(t.kind()));
    modifiers
}

#[derive(Debug, Default)]
pub struct ModifierOrderCodeFixProvider;

impl ModifierOrderCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for ModifierOrderCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        &[MODIFIER_ORDER]
    }

    fn title(&self) -> &'static str {
        "Fix keyword ordering"
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let Some(member) = ctx.find::<MemberDecl>(descriptor) else {
            return Ok(Proposal::Declined("no declaration at the reported location".into()));
        };
        let original = member.modifiers();
        let ordered = ordered_modifiers(&member);
        if original == ordered {
            return Ok(Proposal::Declined("modifiers already in order".into()));
        }
        for (slot, occupant) in original.iter().zip(&ordered) {
            if slot == occupant {
                continue;
            }
            edits.propose_token(
                slot,
                TokenReplacement::new().with_token(occupant.kind(), occupant.text()),
            );
        }
        Ok(Proposal::Edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::TextRange;
    use sharpfix_core::config::StyleSettings;
    use sharpfix_core::{Document, SyntacticModel, apply_fix, apply_fix_all};

    fn at(source: &str, needle: &str) -> TextRange {
        let start = source.find(needle).expect("needle") as u32;
        TextRange::at(start.into(), (needle.len() as u32).into())
    }

    fn fix(source: &str, needle: &str) -> String {
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptor = ViolationDescriptor::new(MODIFIER_ORDER, at(source, needle));
        apply_fix(&ModifierOrderCodeFixProvider, &ctx, &descriptor)
            .unwrap()
            .document()
            .map_or_else(|| source.to_string(), Document::text)
    }

    #[test]
    fn test_access_then_static_then_rest() {
        assert_eq!(
            fix("class C { readonly static public int x; }", "x"),
            "class C { public static readonly int x; }"
        );
    }

    #[test]
    fn test_trivia_stays_in_place() {
        let source = "class C\n{\n    static /* s */ public  void M() { }\n}\n";
        assert_eq!(
            fix(source, "M"),
            "class C\n{\n    public /* s */ static  void M() { }\n}\n"
        );
    }

    #[test]
    fn test_compound_access_modifiers_keep_their_order() {
        assert_eq!(
            fix("class C { static protected internal void M() { } }", "M"),
            "class C { protected internal static void M() { } }"
        );
    }

    #[test]
    fn test_ordered_modifiers_decline() {
        let source = "class C { public static void M() { } }";
        assert_eq!(fix(source, "M"), source);
    }

    #[test]
    fn test_fix_all_merges_descriptors_on_one_member() {
        let source = "class C { static public void M() { } override public string ToString() { } }";
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptors = vec![
            ViolationDescriptor::new(MODIFIER_ORDER, at(source, "M")),
            ViolationDescriptor::new(MODIFIER_ORDER, at(source, "M")),
            ViolationDescriptor::new(MODIFIER_ORDER, at(source, "ToString")),
        ];
        let outcome = apply_fix_all(&ModifierOrderCodeFixProvider, &ctx, &descriptors).unwrap();
        assert_eq!(
            outcome.document().map(Document::text).as_deref(),
            Some("class C { public static void M() { } public override string ToString() { } }")
        );
    }
}
