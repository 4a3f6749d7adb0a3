//! File header synthesis

use sharpfix_core::autofix::{CodeFixProvider, FixContext, Proposal, ReplacementMap, TokenReplacement};
use sharpfix_core::config::DocumentationSettings;
use sharpfix_core::cst::ast::first_significant_token;
use sharpfix_core::cst::trivia::{self, TriviaKind, TriviaPiece, TriviaStream};
use sharpfix_core::{Result, ViolationDescriptor};

/// File must have header
pub const FILE_HEADER_MISSING: &str = "SA1633";

/// Comment lines of the header for `file_name`
pub fn header_lines(settings: &DocumentationSettings, file_name: &str) -> Vec<String> {
    let copyright = settings.expanded_copyright_text(file_name);
    let body = copyright.lines().map(|line| format!("// {line}").trim_end().to_string());
    if settings.xml_header {
        let mut lines = vec![format!(
            "// <copyright file=\"{}\" company=\"{}\">",
            file_name, settings.company_name
        )];
        lines.extend(body);
        lines.push("// </copyright>".to_string());
        lines
    } else {
        body.collect()
    }
}

/// Whether the leading comment already reads as a header
fn has_header(pieces: &[TriviaPiece], expected_first: Option<&str>) -> bool {
    let Some(first) = pieces.iter().find(|p| !p.kind.is_layout()) else {
        return false;
    };
    first.is_comment() && (first.text.contains("<copyright") || Some(first.text.as_str()) == expected_first)
}

#[derive(Debug, Default)]
pub struct FileHeaderCodeFixProvider;

impl FileHeaderCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for FileHeaderCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        &[FILE_HEADER_MISSING]
    }

    fn title(&self) -> &'static str {
        "Add file header"
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        _descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let Some(first) = first_significant_token(ctx.root()) else {
            return Ok(Proposal::Declined("empty document".into()));
        };
        let lines = header_lines(&ctx.settings().documentation_rules, ctx.document().file_name());
        let leading = trivia::leading_of(&first);
        if has_header(&leading, lines.first().map(String::as_str)) {
            return Ok(Proposal::Declined("file already has a header".into()));
        }

        let eol = ctx.end_of_line();
        let mut header: Vec<TriviaPiece> = lines
            .into_iter()
            .flat_map(|line| {
                [
                    TriviaPiece::new(TriviaKind::SingleLineComment, line),
                    TriviaPiece::end_of_line(eol),
                ]
            })
            .collect();
        header.push(TriviaPiece::end_of_line(eol));

        let rest = TriviaStream::from_pieces(leading, true);
        let content = rest.first_non_blank_line(0);
        header.extend(rest.pieces()[content..].iter().cloned());
        edits.propose_token(&first, TokenReplacement::new().with_leading(header));
        Ok(Proposal::Edits)
    }
}
