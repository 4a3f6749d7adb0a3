//! End-to-end fixes through the built-in registry

use rowan::TextRange;
use sharpfix_core::config::StyleSettings;
use sharpfix_core::{Document, FixContext, FixOutcome, SyntacticModel, ViolationDescriptor};
use sharpfix_rules::CodeFixRegistry;

fn at(source: &str, needle: &str) -> TextRange {
    let start = source.find(needle).expect("needle") as u32;
    TextRange::at(start.into(), (needle.len() as u32).into())
}

fn run(source: &str, rule: &str, needle: &str) -> FixOutcome {
    let (doc, errors) = Document::parse("Program.cs", source);
    assert!(errors.is_empty(), "{errors:?}");
    let settings = StyleSettings::default();
    let model = SyntacticModel::new([&doc]);
    let ctx = FixContext::new(&doc, &settings, &model);
    let descriptor = ViolationDescriptor::new(rule, at(source, needle));
    CodeFixRegistry::with_builtin()
        .fix_one(&ctx, &descriptor)
        .unwrap()
}

fn fixed(source: &str, rule: &str, needle: &str) -> String {
    match run(source, rule, needle) {
        FixOutcome::Fixed(output) => output.document().text(),
        other => panic!("expected a fix, got {other:?}"),
    }
}

#[test]
fn blank_line_after_comment_is_removed() {
    let source = "class Program\n{\n    void Main()\n    {\n        // comment\n\n        int x;\n    }\n}\n";
    insta::assert_snapshot!(fixed(source, "SA1512", "// comment"), @r"
    class Program
    {
        void Main()
        {
            // comment
            int x;
        }
    }
    ");
}

#[test]
fn usings_are_sorted_alphabetically() {
    let source = "using System.Linq;\nusing System;\n";
    assert_eq!(
        fixed(source, "SA1210", "using System.Linq;"),
        "using System;\nusing System.Linq;\n"
    );
}

#[test]
fn usings_sharing_a_line_keep_the_line_layout() {
    let source = "using System.Linq; using System;\n";
    assert_eq!(
        fixed(source, "SA1210", "using System.Linq;"),
        "using System; using System.Linq;\n"
    );

    let source = "using Zed; /* z */ using Alpha;\n";
    assert_eq!(
        fixed(source, "SA1210", "using Zed;"),
        "using Alpha; using Zed; /* z */\n"
    );
}

#[test]
fn last_using_without_line_break_stays_last_on_its_line() {
    let source = "using System.Linq;\nusing System;";
    assert_eq!(
        fixed(source, "SA1210", "using System.Linq;"),
        "using System;\nusing System.Linq;"
    );
}

#[test]
fn missing_summary_is_synthesized() {
    let source = "public class Program\n{\n    public void Foo(int bar)\n    {\n    }\n}\n";
    insta::assert_snapshot!(fixed(source, "SA1600", "Foo"), @r#"
    public class Program
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
fn braces_fix_is_declined_under_conditional_compilation() {
    let source = "class Program\n{\n    void Main()\n    {\n#if DEBUG\n        if (x) y();\n#endif\n    }\n}\n";
    assert_eq!(run(source, "SA1503", "y();"), FixOutcome::NotOffered);
    // Without the directive the same statement is fixed
    let plain = source.replace("#if DEBUG\n", "").replace("#endif\n", "");
    assert!(fixed(&plain, "SA1503", "y();").contains("if (x)\n        {\n            y();\n        }\n"));
}

#[test]
fn no_code_fix_property_suppresses_every_provider() {
    let source = "using System.Linq;\nusing System;\n";
    let (doc, _) = Document::parse("Program.cs", source);
    let settings = StyleSettings::default();
    let model = SyntacticModel::default();
    let ctx = FixContext::new(&doc, &settings, &model);
    let descriptor = ViolationDescriptor::new("SA1210", at(source, "using System.Linq;"))
        .with_property(sharpfix_core::property_keys::NO_CODE_FIX, "true");
    let outcome = CodeFixRegistry::with_builtin().fix_one(&ctx, &descriptor).unwrap();
    assert_eq!(outcome, FixOutcome::NotOffered);
}

#[test]
fn usings_move_into_the_namespace_with_defaults() {
    let source = "using System.Linq;\nusing System;\n\nnamespace App\n{\n    class Program\n    {\n    }\n}\n";
    insta::assert_snapshot!(fixed(source, "SA1200", "using System.Linq;"), @r"
    namespace App
    {
        using System;
        using System.Linq;

        class Program
        {
        }
    }
    ");
}
