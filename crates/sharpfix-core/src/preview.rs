//! Fix previews as unified diffs

use similar::{ChangeTag, TextDiff};

use crate::autofix::FixOutput;
use crate::document::Document;

/// Before/after view of one fixed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixPreview {
    /// Name before the fix
    pub original_name: String,
    /// Name after the fix (differs only for renames)
    pub modified_name: String,
    pub original_content: String,
    pub modified_content: String,
    pub diff: String,
}

impl FixPreview {
    pub fn new(original: &Document, output: &FixOutput) -> Self {
        let original_content = original.text();
        let modified = output.document();
        let modified_content = modified.text();
        let diff = unified_diff(
            &original_content,
            &modified_content,
            original.name(),
            modified.name(),
        );
        Self {
            original_name: original.name().to_string(),
            modified_name: modified.name().to_string(),
            original_content,
            modified_content,
            diff,
        }
    }

    pub fn is_rename(&self) -> bool {
        self.original_name != self.modified_name
    }

    pub fn has_text_changes(&self) -> bool {
        self.original_content != self.modified_content
    }
}

/// Plain unified diff between two texts
pub fn unified_diff(original: &str, modified: &str, old_name: &str, new_name: &str) -> String {
    let diff = TextDiff::from_lines(original, modified);
    let mut output = String::new();
    output.push_str(&format!("--- {}\n", old_name));
    output.push_str(&format!("+++ {}\n", new_name));

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }
        let old_line = group[0].old_range().start;
        let new_line = group[0].new_range().start;
        let old_len = group.iter().map(|op| op.old_range().len()).sum::<usize>();
        let new_len = group.iter().map(|op| op.new_range().len()).sum::<usize>();
        output.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_line + 1,
            old_len,
            new_line + 1,
            new_len
        ));

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let line_text = change.value();
                output.push(sign);
                output.push_str(line_text);
                if !line_text.ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_preview_without_text_change() {
        let (doc, _) = Document::parse("src/Old.cs", "class New { }\n");
        let output = FixOutput::Rename {
            old_name: "src/Old.cs".into(),
            new_name: "src/New.cs".into(),
            document: doc.renamed("src/New.cs"),
        };
        let preview = FixPreview::new(&doc, &output);
        assert!(preview.is_rename());
        assert!(!preview.has_text_changes());
        assert_eq!(preview.diff, "--- src/Old.cs\n+++ src/New.cs\n");
    }

    #[test]
    fn test_diff_hunks() {
        let diff = unified_diff("a\nb\nc\n", "a\nc\n", "A.cs", "A.cs");
        insta::assert_snapshot!(diff, @r"
        --- A.cs
        +++ A.cs
        @@ -1,3 +1,2 @@
         a
        -b
         c
        ");
    }
}
