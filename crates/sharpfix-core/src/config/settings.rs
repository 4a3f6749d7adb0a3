//! Typed style settings consumed by the code-fix providers
//!
//! Every section is optional in the file; missing sections and fields fall
//! back to the defaults below. Settings are immutable once loaded and are
//! passed explicitly into every fix entry point.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root settings object
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleSettings {
    #[schemars(description = "Indentation used for synthesized code")]
    pub indentation: IndentationSettings,

    #[schemars(description = "Using directive and member ordering")]
    pub ordering_rules: OrderingSettings,

    #[schemars(description = "Documentation comment and file header synthesis")]
    pub documentation_rules: DocumentationSettings,

    #[schemars(description = "End-of-file layout")]
    pub layout_rules: LayoutSettings,
}

/// Indentation unit and width
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct IndentationSettings {
    #[schemars(description = "Indent with tab characters instead of spaces")]
    pub use_tabs: bool,

    #[schemars(description = "Columns per indentation step")]
    pub indentation_size: usize,

    #[schemars(description = "Columns a tab character advances")]
    pub tab_size: usize,
}

impl Default for IndentationSettings {
    fn default() -> Self {
        Self {
            use_tabs: false,
            indentation_size: 4,
            tab_size: 4,
        }
    }
}

/// Where using directives live relative to the namespace declaration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum UsingPlacement {
    #[default]
    InsideNamespace,
    OutsideNamespace,
    Preserve,
}

/// Blank lines between using groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum BlankLinesPolicy {
    /// Keep whatever the file has
    #[default]
    Allow,
    /// Exactly one blank line between groups
    Require,
    /// No blank lines between groups
    Omit,
}

/// One criterion of the member order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OrderTrait {
    Kind,
    Accessibility,
    Constant,
    Static,
    Readonly,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderingSettings {
    #[schemars(description = "Member ordering criteria, highest priority first")]
    pub element_order: Vec<OrderTrait>,

    #[schemars(description = "Place System namespaces before other namespaces")]
    pub system_using_directives_first: bool,

    #[schemars(description = "insideNamespace, outsideNamespace or preserve")]
    pub using_directives_placement: UsingPlacement,

    #[schemars(description = "allow, require or omit blank lines between using groups")]
    pub blank_lines_between_using_groups: BlankLinesPolicy,
}

impl Default for OrderingSettings {
    fn default() -> Self {
        Self {
            element_order: vec![
                OrderTrait::Kind,
                OrderTrait::Accessibility,
                OrderTrait::Constant,
                OrderTrait::Static,
                OrderTrait::Readonly,
            ],
            system_using_directives_first: true,
            using_directives_placement: UsingPlacement::InsideNamespace,
            blank_lines_between_using_groups: BlankLinesPolicy::Allow,
        }
    }
}

/// How a file name maps to its first type name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum FileNamingConvention {
    /// `Foo{T}.cs` for generic types
    #[default]
    Stylecop,
    /// Arity suffix after a backtick for generic types
    Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentationSettings {
    #[schemars(description = "Company name used in file headers")]
    pub company_name: String,

    #[schemars(
        description = "Copyright text template; {companyName}, {fileName} and custom variables are substituted"
    )]
    pub copyright_text: String,

    #[schemars(description = "Extra template variables for the copyright text")]
    pub variables: BTreeMap<String, String>,

    #[schemars(description = "Wrap the file header in <copyright> XML")]
    pub xml_header: bool,

    #[schemars(description = "Culture of synthesized documentation text")]
    pub documentation_culture: String,

    #[schemars(description = "File naming convention for generic types")]
    pub file_naming_convention: FileNamingConvention,
}

impl Default for DocumentationSettings {
    fn default() -> Self {
        Self {
            company_name: "PlaceholderCompany".to_string(),
            copyright_text: "Copyright (c) {companyName}. All rights reserved.".to_string(),
            variables: BTreeMap::new(),
            xml_header: true,
            documentation_culture: "en-US".to_string(),
            file_naming_convention: FileNamingConvention::Stylecop,
        }
    }
}

impl DocumentationSettings {
    /// Copyright text with every `{variable}` substituted
    ///
    /// Unknown variables are left as written.
    pub fn expanded_copyright_text(&self, file_name: &str) -> String {
        let mut text = self.copyright_text.clone();
        text = text.replace("{companyName}", &self.company_name);
        text = text.replace("{fileName}", file_name);
        for (name, value) in &self.variables {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }
}

/// Line break at the end of the file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum EndOfFilePolicy {
    /// Zero or one trailing line break
    #[default]
    Allow,
    /// Exactly one trailing line break
    Require,
    /// No trailing line break
    Omit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    #[schemars(description = "allow, require or omit a line break at the end of the file")]
    pub newline_at_end_of_file: EndOfFilePolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let settings: StyleSettings = serde_json::from_str(
            r#"{ "orderingRules": { "systemUsingDirectivesFirst": false } }"#,
        )
        .unwrap();
        assert!(!settings.ordering_rules.system_using_directives_first);
        assert_eq!(
            settings.ordering_rules.using_directives_placement,
            UsingPlacement::InsideNamespace
        );
        assert_eq!(settings.indentation, IndentationSettings::default());
    }

    #[test]
    fn test_copyright_expansion() {
        let mut docs = DocumentationSettings::default();
        docs.copyright_text = "Copyright (c) {companyName}. {fileName} is {licenseName}.".into();
        docs.variables.insert("licenseName".into(), "MIT".into());
        assert_eq!(
            docs.expanded_copyright_text("Widget.cs"),
            "Copyright (c) PlaceholderCompany. Widget.cs is MIT."
        );
    }
}
