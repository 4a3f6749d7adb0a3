//! Line breaks at the end of the file

use sharpfix_core::autofix::{CodeFixProvider, FixContext, Proposal, ReplacementMap};
use sharpfix_core::config::EndOfFilePolicy;
use sharpfix_core::cst::ast::{AstNode, CompilationUnit};
use sharpfix_core::cst::trivia::{TriviaPiece, TriviaStream};
use sharpfix_core::{Result, ViolationDescriptor};

/// Code must not contain blank lines at end of file
pub const END_OF_FILE: &str = "SA1518";

/// Trivia after the last comment or directive, replaced per `policy`
fn normalized(stream: &TriviaStream, policy: EndOfFilePolicy, eol: &str) -> Vec<TriviaPiece> {
    let pieces = stream.pieces();
    let content = pieces
        .iter()
        .rposition(|p| !p.kind.is_layout())
        .map_or(0, |i| i + 1);
    let had_line_break = pieces[content..].iter().any(TriviaPiece::is_end_of_line);
    let mut out = pieces[..content].to_vec();
    let nothing_before = content == 0 && stream.prev_token().is_none();
    let wants_line_break = match policy {
        EndOfFilePolicy::Require => !nothing_before,
        EndOfFilePolicy::Allow => had_line_break && !nothing_before,
        EndOfFilePolicy::Omit => false,
    };
    if wants_line_break {
        out.push(TriviaPiece::end_of_line(eol));
    }
    out
}

#[derive(Debug, Default)]
pub struct EndOfFileCodeFixProvider;

impl EndOfFileCodeFixProvider {
    pub fn new() -> Self {
        Self
    }
}

impl CodeFixProvider for EndOfFileCodeFixProvider {
    fn fixable_rules(&self) -> &'static [&'static str] {
        &[END_OF_FILE]
    }

    fn title(&self) -> &'static str {
        "Fix end of file"
    }

    fn propose(
        &self,
        ctx: &FixContext<'_>,
        _descriptor: &ViolationDescriptor,
        edits: &mut ReplacementMap,
    ) -> Result<Proposal> {
        let Some(eof) = CompilationUnit::cast(ctx.root().clone()).and_then(|u| u.eof_token()) else {
            return Ok(Proposal::Declined("no end-of-file token".into()));
        };
        let mut stream = TriviaStream::before(&eof);
        let policy = ctx.settings().layout_rules.newline_at_end_of_file;
        let pieces = normalized(&stream, policy, ctx.end_of_line());
        if pieces == stream.pieces() {
            return Ok(Proposal::Declined("end of file already as required".into()));
        }
        let len = stream.len();
        stream.splice(0..len, pieces);
        let outcome = edits.propose_stream(&stream);
        if !outcome.is_applied() {
            return Ok(Proposal::Declined(format!("end of file not rewritable: {outcome:?}")));
        }
        Ok(Proposal::Edits)
    }
}
