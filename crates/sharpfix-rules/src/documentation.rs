//! Documentation comment synthesis
//!
//! Undocumented declarations receive a complete comment; documented ones
//! receive only the elements they are missing, inserted where the canonical
//! order puts them and written with the same exterior as the lines around
//! them, inside a `/** */` block when the comment is one. Overrides and interface implementations get
//! `<inheritdoc/>`.

pub mod comment;
pub mod synthesis;

use indexmap::IndexMap;
use rowan::TextRange;
use sharpfix_core::autofix::{
    BatchSummary, CodeFixProvider, FixContext, Proposal, ReplacementMap, TokenReplacement,
};
use sharpfix_core::cst::ast::{AstNode, MemberDecl, first_significant_token};
use sharpfix_core::cst::trivia::{TriviaKind, TriviaPiece, TriviaStream};
use sharpfix_core::{CsSyntaxKind, Result, ViolationDescriptor};

use comment::{Addition, DocComment, Fragment, FragmentKind, doc_line};

/// Elements must be documented
pub const ELEMENTS_DOCUMENTED: &str = "SA1600";
/// Element parameters must be documented
pub const PARAMETERS_DOCUMENTED: &str = "SA1611";
/// Element return value must be documented
pub const RETURN_VALUE_DOCUMENTED: &str = "SA1615";
/// Generic type parameters must be documented
pub const TYPE_PARAMETERS_DOCUMENTED: &str = "SA1618";
/// Property documentation must have value
pub const PROPERTY_VALUE_DOCUMENTED: &str = "SA1609";

const RULES: &[&str] = &[
    ELEMENTS_DOCUMENTED,
    PARAMETERS_DOCUMENTED,
    RETURN_VALUE_DOCUMENTED,
    TYPE_PARAMETERS_DOCUMENTED,
    PROPERTY_VALUE_DOCUMENTED,
];

/// One element to write, as the text lines between the `///` markers
#[derive(Debug, Clone, PartialEq, Eq)]
struct Element {
    kind: FragmentKind,
    ordinal: usize,
    lines: Vec<String>,
}

impl Element {
    fn single(kind: FragmentKind, ordinal: usize, line: String) -> Self {
        Self {
            kind,
            ordinal,
            lines: vec![line],
        }
    }
}

fn summary_text(member: &MemberDecl) -> String {
    let name = member.name().unwrap_or_default();
    match member.kind() {
        CsSyntaxKind::ConstructorDecl => match member.containing_type() {
            Some(owner) => synthesis::constructor_summary(member, &owner),
            None => synthesis::sentence(&name),
        },
        CsSyntaxKind::PropertyDecl => synthesis::property_summary(member),
        CsSyntaxKind::FieldDecl | CsSyntaxKind::EnumMember => synthesis::noun_phrase(&name),
        _ => synthesis::sentence(&name),
    }
}

fn is_inherited(ctx: &FixContext<'_>, member: &MemberDecl) -> bool {
    member.has_modifier(CsSyntaxKind::OverrideKw) || ctx.semantic().implements_interface_member(member)
}

fn type_parameter_elements(member: &MemberDecl) -> Vec<Element> {
    member
        .type_parameters()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Element::single(
                FragmentKind::TypeParam,
                i,
                format!(
                    "<typeparam name=\"{}\">{}</typeparam>",
                    name,
                    synthesis::type_parameter_text(name)
                ),
            )
        })
        .collect()
}

fn parameter_names(member: &MemberDecl) -> Vec<String> {
    member.parameters().iter().filter_map(|p| p.name()).collect()
}

fn parameter_elements(member: &MemberDecl) -> Vec<Element> {
    parameter_names(member)
        .iter()
        .enumerate()
        .map(|(i, name)| {
            Element::single(
                FragmentKind::Param,
                i,
                format!(
                    "<param name=\"{}\">{}</param>",
                    name,
                    synthesis::noun_phrase(name)
                ),
            )
        })
        .collect()
}

fn returns_element(member: &MemberDecl) -> Option<Element> {
    if member.kind() != CsSyntaxKind::MethodDecl {
        return None;
    }
    let text = synthesis::returns_text(member)?;
    Some(Element::single(
        FragmentKind::Returns,
        0,
        format!("<returns>{text}</returns>"),
    ))
}

fn value_element(member: &MemberDecl) -> Option<Element> {
    if member.kind() != CsSyntaxKind::PropertyDecl {
        return None;
    }
    let name = member.name().unwrap_or_default();
    Some(Element::single(
        FragmentKind::Value,
        0,
        format!("<value>{}</value>", synthesis::noun_phrase(&name)),
    ))
}

/// Every element of a complete comment for `member`, in canonical order
fn full_comment(ctx: &FixContext<'_>, member: &MemberDecl) -> Vec<Element> {
    if is_inherited(ctx, member) {
        return vec![Element::single(
            FragmentKind::InheritDoc,
            0,
            "<inheritdoc/>".to_string(),
        )];
    }
    let mut elements = vec![Element {
        kind: FragmentKind::Summary,
        ordinal: 0,
        lines: vec![
            "<summary>".to_string(),
            summary_text(member),
            "</summary>".to_string(),
        ],
    }];
    elements.extend(type_parameter_elements(member));
    elements.extend(parameter_elements(member));
    elements.extend(returns_element(member));
    elements.extend(value_element(member));
    elements
}

/// Elements the existing comment lacks, restricted to what `rules` ask for
fn missing_elements(member: &MemberDecl, doc: &DocComment, rules: &[&str]) -> Vec<Element> {
    let wants = |rule: &str| rules.contains(&rule);
    let mut elements = Vec::new();
    if wants(TYPE_PARAMETERS_DOCUMENTED) {
        let names = member.type_parameters();
        elements.extend(
            type_parameter_elements(member)
                .into_iter()
                .filter(|e| !doc.has_named(FragmentKind::TypeParam, &names[e.ordinal])),
        );
    }
    if wants(PARAMETERS_DOCUMENTED) {
        let names = parameter_names(member);
        elements.extend(
            parameter_elements(member)
                .into_iter()
                .filter(|e| !doc.has_named(FragmentKind::Param, &names[e.ordinal])),
        );
    }
    if wants(RETURN_VALUE_DOCUMENTED) && !doc.has(FragmentKind::Returns) {
        elements.extend(returns_element(member));
    }
    if wants(PROPERTY_VALUE_DOCUMENTED) && !doc.has(FragmentKind::Value) {
        elements.extend(value_element(member));
    }
    elements
}

/// New leading trivia for the first token of `member`, `None` when there is
/// nothing to add
fn documented_leading(
    ctx: &FixContext<'_>,
    member: &MemberDecl,
    leading: &[TriviaPiece],
    line_start: usize,
    rules: &[&str],
) -> std::result::Result<Option<Vec<TriviaPiece>>, String> {
    let eol = ctx.end_of_line();
    let Some(doc) = DocComment::parse(leading) else {
        let indentation: String = leading[line_start..].iter().map(|p| p.text.as_str()).collect();
        let lines: Vec<TriviaPiece> = full_comment(ctx, member)
            .iter()
            .flat_map(|e| e.lines.iter())
            .flat_map(|text| doc_line(&indentation, "/// ", text, eol))
            .collect();
        let mut pieces = leading.to_vec();
        pieces.splice(line_start..line_start, lines);
        return Ok(Some(pieces));
    };

    if doc.is_inherited() {
        return Err("documentation is inherited".into());
    }
    let missing = missing_elements(member, &doc, rules);
    if missing.is_empty() {
        return Ok(None);
    }

    let type_parameters = member.type_parameters();
    let parameters = parameter_names(member);
    let ordinal_of = |f: &Fragment| {
        let names = match f.kind {
            FragmentKind::TypeParam => &type_parameters,
            FragmentKind::Param => &parameters,
            _ => return 0,
        };
        f.name
            .as_deref()
            .and_then(|n| names.iter().position(|m| m == n))
            .unwrap_or(usize::MAX)
    };
    let additions = missing
        .into_iter()
        .map(|e| Addition {
            after: doc.anchor_line(e.kind, e.ordinal, ordinal_of),
            lines: e.lines,
        })
        .collect();
    Ok(Some(doc.extend(leading, additions, eol)))
}

#[derive(Debug, Default)]
pub struct DocumentationCodeFixProvider;

impl DocumentationCodeFixProvider {
    pub fn new() -> Self {
        Self
    }

    fn propose_member(
        &self,
        ctx: &FixContext<'_>,
        member: &MemberDecl,
        rules: &[&str],
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let Some(first) = first_significant_token(member.syntax()) else {
            return Ok(Proposal::Declined("declaration has no tokens".into()));
        };
        let stream = TriviaStream::before(&first);
        let split = stream.split_index();
        let line_start = stream.line_start_of(stream.len());
        let own_line = line_start >= split
            && stream.is_line_start(line_start)
            && stream.pieces()[line_start..].iter().all(TriviaPiece::is_whitespace);
        if !own_line {
            return Ok(Proposal::Declined("declaration does not start its line".into()));
        }

        let leading = stream.leading();
        let has_doc = leading.iter().any(|p| p.kind == TriviaKind::DocumentationComment);
        if has_doc && rules.iter().all(|r| *r == ELEMENTS_DOCUMENTED) {
            return Ok(Proposal::Declined("declaration is already documented".into()));
        }
        match documented_leading(ctx, member, leading, line_start - split, rules) {
            Ok(Some(pieces)) => {
                edits.propose_token(&first, TokenReplacement::new().with_leading(pieces));
                Ok(Proposal::Edits)
            }
            Ok(None) => Ok(Proposal::Declined("documentation is complete".into())),
            Err(reason) => Ok(Proposal::Declined(reason)),
        }
    }
}

impl CodeFixProvider for DocumentationCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        RULES
    }

    fn title(&self) -> &'static str {
        "Add documentation"
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
        self.propose_member(ctx, &member, &[descriptor.rule_id()], edits)
    }

    /// Descriptors on the same declaration are answered together, so the
    /// comment is rewritten once with every element they ask for
    fn propose_all(
        &self,
        ctx: &FixContext<'_>,
        descriptors: &[ViolationDescriptor],
        edits: &mut ReplacementMap,
    ) -> Result<BatchSummary> {
        let mut members: IndexMap<TextRange, (MemberDecl, Vec<&str>)> = IndexMap::new();
        let mut summary = BatchSummary::default();
        for descriptor in descriptors {
            match ctx.find::<MemberDecl>(descriptor) {
                Some(member) => {
                    let entry = members
                        .entry(member.syntax().text_range())
                        .or_insert_with(|| (member, Vec::new()));
                    entry.1.push(descriptor.rule_id());
                }
                None => summary.declined += 1,
            }
        }
        for (member, rules) in members.values() {
            ctx.cancellation().check()?;
            let before = edits.conflicts();
            match self.propose_member(ctx, member, rules, edits)? {
                Proposal::Declined(reason) => {
                    tracing::debug!("documentation fix declined: {}", reason);
                    summary.declined += 1;
                }
                _ => summary.proposed += 1,
            }
            summary.conflicts += edits.conflicts() - before;
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sharpfix_core::config::StyleSettings;
    use sharpfix_core::{Document, SyntacticModel, apply_fix, apply_fix_all};

    fn at(source: &str, needle: &str) -> TextRange {
        let start = source.find(needle).expect("needle") as u32;
        TextRange::at(start.into(), (needle.len() as u32).into())
    }

    fn fix_with(source: &str, rule: &str, needle: &str, model: &SyntacticModel) -> String {
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let ctx = FixContext::new(&doc, &settings, model);
        let descriptor = ViolationDescriptor::new(rule, at(source, needle));
        apply_fix(&DocumentationCodeFixProvider, &ctx, &descriptor)
            .unwrap()
            .document()
            .map_or_else(|| source.to_string(), Document::text)
    }

    fn fix(source: &str, rule: &str, needle: &str) -> String {
        fix_with(source, rule, needle, &SyntacticModel::default())
    }

    #[test]
    fn test_block_comment_is_extended_in_place() {
        let source = "class C\n{\n    /** <summary>Adds.</summary> */\n    public int Add(int a)\n    {\n        return a;\n    }\n}\n";
        insta::assert_snapshot!(fix(source, PARAMETERS_DOCUMENTED, "Add"), @r#"
        class C
        {
            /** <summary>Adds.</summary>
             * <param name="a">The a.</param>
             */
            public int Add(int a)
            {
                return a;
            }
        }
        "#);
        assert_eq!(
            fix(source, ELEMENTS_DOCUMENTED, "Add"),
            source,
            "a block comment already documents the method"
        );
    }

    #[test]
    fn test_block_comment_keeps_its_star_column() {
        let source = "class C\n{\n    /**\n     * <summary>Adds.</summary>\n     * <returns>The sum.</returns>\n     */\n    public int Add(int a, int b)\n    {\n        return a + b;\n    }\n}\n";
        insta::assert_snapshot!(fix(source, PARAMETERS_DOCUMENTED, "Add"), @r#"
        class C
        {
            /**
             * <summary>Adds.</summary>
             * <param name="a">The a.</param>
             * <param name="b">The b.</param>
             * <returns>The sum.</returns>
             */
            public int Add(int a, int b)
            {
                return a + b;
            }
        }
        "#);
    }

    #[test]
    fn test_void_method_gets_summary_and_param() {
        let source = "public class C\n{\n    public void Foo(int bar)\n    {\n    }\n}\n";
        insta::assert_snapshot!(fix(source, ELEMENTS_DOCUMENTED, "Foo"), @r#"
        public class C
        {
            /// <summary>
            /// Foo.
            /// </summary>
            /// <param name="bar">The bar.</param>
            public void Foo(int bar)
            {
            }
        }
        "#);
    }

    #[test]
    fn test_constructor_and_generic_type() {
        let source = "public class Cache<TKey>\n{\n    public Cache(int maxSize)\n    {\n    }\n}\n";
        insta::assert_snapshot!(fix(source, ELEMENTS_DOCUMENTED, "maxSize"), @r#"
        public class Cache<TKey>
        {
            /// <summary>
            /// Initializes a new instance of the <see cref="Cache{TKey}"/> class.
            /// </summary>
            /// <param name="maxSize">The max size.</param>
            public Cache(int maxSize)
            {
            }
        }
        "#);
        insta::assert_snapshot!(fix(source, ELEMENTS_DOCUMENTED, "Cache"), @r#"
        /// <summary>
        /// Cache.
        /// </summary>
        /// <typeparam name="TKey">The type of the key.</typeparam>
        public class Cache<TKey>
        {
            public Cache(int maxSize)
            {
            }
        }
        "#);
    }

    #[test]
    fn test_property_gets_value() {
        let source = "class C\n{\n    public string UserName { get; set; }\n}\n";
        insta::assert_snapshot!(fix(source, ELEMENTS_DOCUMENTED, "UserName"), @r#"
        class C
        {
            /// <summary>
            /// Gets or sets the user name.
            /// </summary>
            /// <value>The user name.</value>
            public string UserName { get; set; }
        }
        "#);
    }

    #[test]
    fn test_missing_param_goes_after_its_predecessor() {
        let source = "class C\n{\n    /// <summary>\n    /// Adds.\n    /// </summary>\n    /// <param name=\"a\">First.</param>\n    /// <returns>The sum.</returns>\n    public int Add(int a, int b)\n    {\n    }\n}\n";
        insta::assert_snapshot!(fix(source, PARAMETERS_DOCUMENTED, "Add"), @r#"
        class C
        {
            /// <summary>
            /// Adds.
            /// </summary>
            /// <param name="a">First.</param>
            /// <param name="b">The b.</param>
            /// <returns>The sum.</returns>
            public int Add(int a, int b)
            {
            }
        }
        "#);
    }

    #[test]
    fn test_missing_returns_copies_exterior() {
        let source = "class C\n{\n    ///<summary>Gets.</summary>\n    public Task<int> GetCountAsync()\n    {\n    }\n}\n";
        insta::assert_snapshot!(fix(source, RETURN_VALUE_DOCUMENTED, "GetCountAsync"), @r#"
        class C
        {
            ///<summary>Gets.</summary>
            ///<returns>A <see cref="Task{TResult}"/> representing the result of the asynchronous operation.</returns>
            public Task<int> GetCountAsync()
            {
            }
        }
        "#);
    }

    #[test]
    fn test_overrides_inherit() {
        let source = "class C\n{\n    public override string ToString()\n    {\n    }\n}\n";
        assert_eq!(
            fix(source, ELEMENTS_DOCUMENTED, "ToString"),
            "class C\n{\n    /// <inheritdoc/>\n    public override string ToString()\n    {\n    }\n}\n"
        );
    }

    #[test]
    fn test_interface_implementations_inherit() {
        let source = "interface IShape\n{\n    int Area();\n}\n\nclass Square : IShape\n{\n    public int Area()\n    {\n    }\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let model = SyntacticModel::new([&doc]);
        let fixed = fix_with(source, ELEMENTS_DOCUMENTED, "Area()\n    {", &model);
        assert!(fixed.contains("    /// <inheritdoc/>\n    public int Area()"));
    }

    #[test]
    fn test_declines() {
        // Already documented
        let documented = "class C\n{\n    /// <summary>S.</summary>\n    void M()\n    {\n    }\n}\n";
        assert_eq!(fix(documented, ELEMENTS_DOCUMENTED, "M()"), documented);
        // Inherited comment has nothing to complete
        let inherited = "class C\n{\n    /// <inheritdoc/>\n    int M(int a)\n    {\n    }\n}\n";
        assert_eq!(fix(inherited, PARAMETERS_DOCUMENTED, "M("), inherited);
        // Declaration shares its line with the previous token
        let same_line = "class C { void M(int a) { } }";
        assert_eq!(fix(same_line, ELEMENTS_DOCUMENTED, "M("), same_line);
    }

    #[test]
    fn test_fix_all_answers_every_rule_on_a_member_at_once() {
        let source = "class C\n{\n    /// <summary>S.</summary>\n    int Get<T>(int id)\n    {\n    }\n}\n";
        let (doc, _) = Document::parse("Test.cs", source);
        let settings = StyleSettings::default();
        let model = SyntacticModel::default();
        let ctx = FixContext::new(&doc, &settings, &model);
        let descriptors = vec![
            ViolationDescriptor::new(TYPE_PARAMETERS_DOCUMENTED, at(source, "Get")),
            ViolationDescriptor::new(PARAMETERS_DOCUMENTED, at(source, "id")),
            ViolationDescriptor::new(RETURN_VALUE_DOCUMENTED, at(source, "Get")),
        ];
        let outcome = apply_fix_all(&DocumentationCodeFixProvider, &ctx, &descriptors).unwrap();
        insta::assert_snapshot!(outcome.document().map(Document::text).unwrap_or_default(), @r#"
        class C
        {
            /// <summary>S.</summary>
            /// <typeparam name="T">The type parameter.</typeparam>
            /// <param name="id">The id.</param>
            /// <returns>The result.</returns>
            int Get<T>(int id)
            {
            }
        }
        "#);
    }
}
