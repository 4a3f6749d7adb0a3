//! Trivia stream model
//!
//! Trivia are tokens in the CST, but fixers reason about them as the
//! ordered annotation list attached to a significant token. A token owns:
//!
//! - **trailing trivia**: whitespace and comments after it, up to and
//!   including the first end-of-line
//! - **leading trivia**: everything else between the previous token's
//!   trailing trivia and the token itself
//!
//! Blank-line and comment analysis must not care which side of that split a
//! piece of trivia landed on, so [`TriviaStream`] always merges
//! `trailing(prev) + leading(next)` into one logical sequence and remembers
//! where the split falls.
//!
//! # Example
//!
//! ```rust,ignore
//! use sharpfix_core::cst::{parse_cs, trivia::TriviaStream};
//!
//! let (cst, _) = parse_cs("class A\n{\n    // c\n\n    int x;\n}\n");
//! let int_kw = cst.descendants_with_tokens()
//!     .filter_map(|e| e.into_token())
//!     .find(|t| t.text() == "int")
//!     .unwrap();
//! let stream = TriviaStream::before(&int_kw);
//! assert_eq!(stream.blank_lines().len(), 1);
//! ```

use std::fmt;
use std::ops::Range;

use rowan::{GreenToken, TextSize};

use super::{CsSyntaxKind, CsSyntaxToken};

/// Classification of a single piece of trivia
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriviaKind {
    Whitespace,
    EndOfLine,
    SingleLineComment,
    MultiLineComment,
    DocumentationComment,
    Directive,
}

impl TriviaKind {
    pub fn from_syntax(kind: CsSyntaxKind) -> Option<Self> {
        match kind {
            CsSyntaxKind::Whitespace => Some(Self::Whitespace),
            CsSyntaxKind::Newline => Some(Self::EndOfLine),
            CsSyntaxKind::CommentLine => Some(Self::SingleLineComment),
            CsSyntaxKind::CommentBlock => Some(Self::MultiLineComment),
            CsSyntaxKind::DocComment => Some(Self::DocumentationComment),
            CsSyntaxKind::Directive => Some(Self::Directive),
            _ => None,
        }
    }

    pub fn to_syntax(self) -> CsSyntaxKind {
        match self {
            Self::Whitespace => CsSyntaxKind::Whitespace,
            Self::EndOfLine => CsSyntaxKind::Newline,
            Self::SingleLineComment => CsSyntaxKind::CommentLine,
            Self::MultiLineComment => CsSyntaxKind::CommentBlock,
            Self::DocumentationComment => CsSyntaxKind::DocComment,
            Self::Directive => CsSyntaxKind::Directive,
        }
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            Self::SingleLineComment | Self::MultiLineComment | Self::DocumentationComment
        )
    }

    /// Whitespace or end-of-line
    pub fn is_layout(self) -> bool {
        matches!(self, Self::Whitespace | Self::EndOfLine)
    }

    /// Kinds that may appear in a token's trailing trivia
    fn may_trail(self) -> bool {
        matches!(
            self,
            Self::Whitespace | Self::SingleLineComment | Self::MultiLineComment
        )
    }
}

/// One piece of trivia, detached from any tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TriviaPiece {
    pub kind: TriviaKind,
    pub text: String,
}

impl TriviaPiece {
    pub fn new(kind: TriviaKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn whitespace(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::Whitespace, text)
    }

    pub fn end_of_line(text: impl Into<String>) -> Self {
        Self::new(TriviaKind::EndOfLine, text)
    }

    pub fn from_token(token: &CsSyntaxToken) -> Option<Self> {
        TriviaKind::from_syntax(token.kind()).map(|kind| Self::new(kind, token.text()))
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TriviaKind::Whitespace
    }

    pub fn is_end_of_line(&self) -> bool {
        self.kind == TriviaKind::EndOfLine
    }

    pub fn is_directive(&self) -> bool {
        self.kind == TriviaKind::Directive
    }

    pub fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    pub fn to_green(&self) -> GreenToken {
        GreenToken::new(self.kind.to_syntax().into(), &self.text)
    }
}

/// Render a trivia list back to source text
pub fn render(pieces: &[TriviaPiece]) -> String {
    pieces.iter().map(|p| p.text.as_str()).collect()
}

/// Number of pieces at the front of a run that belong to the preceding
/// token's trailing trivia
fn trailing_len(kinds: impl IntoIterator<Item = TriviaKind>) -> usize {
    let mut len = 0;
    for kind in kinds {
        if kind == TriviaKind::EndOfLine {
            return len + 1;
        }
        if !kind.may_trail() {
            break;
        }
        len += 1;
    }
    len
}

/// Previous non-trivia token
pub fn prev_significant(token: &CsSyntaxToken) -> Option<CsSyntaxToken> {
    let mut current = token.prev_token();
    while let Some(t) = current {
        if !t.kind().is_trivia() {
            return Some(t);
        }
        current = t.prev_token();
    }
    None
}

/// Next non-trivia token
pub fn next_significant(token: &CsSyntaxToken) -> Option<CsSyntaxToken> {
    let mut current = token.next_token();
    while let Some(t) = current {
        if !t.kind().is_trivia() {
            return Some(t);
        }
        current = t.next_token();
    }
    None
}

/// Raw trivia tokens between two significant tokens
fn run_before(token: &CsSyntaxToken) -> (Vec<CsSyntaxToken>, bool) {
    let mut run = Vec::new();
    let mut current = token.prev_token();
    let mut has_prev = false;
    while let Some(t) = current {
        if !t.kind().is_trivia() {
            has_prev = true;
            break;
        }
        current = t.prev_token();
        run.push(t);
    }
    run.reverse();
    (run, has_prev)
}

/// Trivia tokens owned by `token` as leading trivia
pub fn leading_tokens(token: &CsSyntaxToken) -> Vec<CsSyntaxToken> {
    let (mut run, has_prev) = run_before(token);
    if has_prev {
        let split = trailing_len(run.iter().map(kind_of));
        run.drain(..split);
    }
    run
}

/// Trivia tokens owned by `token` as trailing trivia
pub fn trailing_tokens(token: &CsSyntaxToken) -> Vec<CsSyntaxToken> {
    let mut run = Vec::new();
    let mut current = token.next_token();
    while let Some(t) = current {
        match TriviaKind::from_syntax(t.kind()) {
            Some(TriviaKind::EndOfLine) => {
                run.push(t);
                break;
            }
            Some(kind) if kind.may_trail() => {
                current = t.next_token();
                run.push(t);
            }
            _ => break,
        }
    }
    run
}

fn kind_of(token: &CsSyntaxToken) -> TriviaKind {
    TriviaKind::from_syntax(token.kind()).unwrap_or(TriviaKind::Whitespace)
}

fn pieces_of(tokens: &[CsSyntaxToken]) -> Vec<TriviaPiece> {
    tokens.iter().filter_map(TriviaPiece::from_token).collect()
}

/// Leading trivia of a token
pub fn leading_of(token: &CsSyntaxToken) -> Vec<TriviaPiece> {
    pieces_of(&leading_tokens(token))
}

/// Trailing trivia of a token
pub fn trailing_of(token: &CsSyntaxToken) -> Vec<TriviaPiece> {
    pieces_of(&trailing_tokens(token))
}

/// Merged `trailing(prev) + leading(next)` trivia sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriviaStream {
    pieces: Vec<TriviaPiece>,
    prev: Option<CsSyntaxToken>,
    next: Option<CsSyntaxToken>,
    starts_line: bool,
}

impl TriviaStream {
    /// Stream between two adjacent significant tokens
    ///
    /// `prev` is `None` at the start of the file.
    pub fn between(prev: Option<&CsSyntaxToken>, next: &CsSyntaxToken) -> Self {
        let (run, _) = run_before(next);
        Self {
            pieces: pieces_of(&run),
            prev: prev.cloned(),
            next: Some(next.clone()),
            starts_line: prev.is_none(),
        }
    }

    /// Stream ending at `token`
    pub fn before(token: &CsSyntaxToken) -> Self {
        Self::between(prev_significant(token).as_ref(), token)
    }

    /// Stream starting after `token`
    pub fn after(token: &CsSyntaxToken) -> Self {
        match next_significant(token) {
            Some(next) => Self::between(Some(token), &next),
            None => Self {
                pieces: trailing_of(token),
                prev: Some(token.clone()),
                next: None,
                starts_line: false,
            },
        }
    }

    /// Detached stream, used for synthesized trivia
    pub fn from_pieces(pieces: Vec<TriviaPiece>, starts_line: bool) -> Self {
        Self {
            pieces,
            prev: None,
            next: None,
            starts_line,
        }
    }

    pub fn prev_token(&self) -> Option<&CsSyntaxToken> {
        self.prev.as_ref()
    }

    pub fn next_token(&self) -> Option<&CsSyntaxToken> {
        self.next.as_ref()
    }

    pub fn pieces(&self) -> &[TriviaPiece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Index of the first piece that belongs to the next token's leading
    /// trivia
    pub fn split_index(&self) -> usize {
        if self.starts_line {
            return 0;
        }
        trailing_len(self.pieces.iter().map(|p| p.kind))
    }

    /// Trailing side, owned by the previous token
    pub fn trailing(&self) -> &[TriviaPiece] {
        &self.pieces[..self.split_index()]
    }

    /// Leading side, owned by the next token
    pub fn leading(&self) -> &[TriviaPiece] {
        &self.pieces[self.split_index()..]
    }

    pub fn text(&self) -> String {
        render(&self.pieces)
    }

    /// Offset of the first piece in the source, `None` for detached streams
    pub fn start_offset(&self) -> Option<TextSize> {
        if let Some(prev) = &self.prev {
            return Some(prev.text_range().end());
        }
        let next = self.next.as_ref()?;
        let len: usize = self.pieces.iter().map(|p| p.text.len()).sum();
        Some(next.text_range().start() - TextSize::from(len as u32))
    }

    /// Index of the piece starting at `offset`; only meaningful before the
    /// stream is edited
    pub fn piece_at(&self, offset: TextSize) -> Option<usize> {
        let mut cursor = self.start_offset()?;
        for (i, piece) in self.pieces.iter().enumerate() {
            if cursor == offset {
                return Some(i);
            }
            cursor += TextSize::from(piece.text.len() as u32);
        }
        None
    }

    /// Whether index `i` begins a source line
    pub fn is_line_start(&self, i: usize) -> bool {
        if i == 0 {
            self.starts_line
        } else {
            self.pieces
                .get(i - 1)
                .is_some_and(TriviaPiece::is_end_of_line)
        }
    }

    pub fn first_non_whitespace(&self, from: usize) -> Option<usize> {
        (from..self.pieces.len()).find(|&i| !self.pieces[i].kind.is_layout())
    }

    /// Skip blank lines starting at line start `from`; returns the start of
    /// the first line that is not blank (possibly `len()`)
    pub fn first_non_blank_line(&self, from: usize) -> usize {
        let mut line = from;
        loop {
            let mut i = line;
            while self.pieces.get(i).is_some_and(TriviaPiece::is_whitespace) {
                i += 1;
            }
            match self.pieces.get(i) {
                Some(p) if p.is_end_of_line() => line = i + 1,
                _ => return line,
            }
        }
    }

    pub fn first_directive(&self, from: usize) -> Option<usize> {
        (from..self.pieces.len()).find(|&i| self.pieces[i].is_directive())
    }

    pub fn has_directive(&self) -> bool {
        self.pieces.iter().any(TriviaPiece::is_directive)
    }

    pub fn has_comment(&self) -> bool {
        self.pieces.iter().any(TriviaPiece::is_comment)
    }

    /// Every line of the stream; each range includes its end-of-line, the
    /// last one may not have one
    pub fn lines(&self) -> Vec<Range<usize>> {
        let mut lines = Vec::new();
        let mut start = 0;
        for (i, piece) in self.pieces.iter().enumerate() {
            if piece.is_end_of_line() {
                lines.push(start..i + 1);
                start = i + 1;
            }
        }
        if start < self.pieces.len() {
            lines.push(start..self.pieces.len());
        }
        lines
    }

    /// Every blank line: an end-of-line preceded only by whitespace since
    /// the previous line start
    pub fn blank_lines(&self) -> Vec<Range<usize>> {
        self.lines()
            .into_iter()
            .filter(|line| {
                self.is_line_start(line.start)
                    && self.pieces[line.clone()].last().is_some_and(TriviaPiece::is_end_of_line)
                    && self.pieces[line.clone()]
                        .iter()
                        .all(|p| p.kind.is_layout())
            })
            .collect()
    }

    /// Blank lines contained in `range`
    pub fn blank_lines_in(&self, range: Range<usize>) -> Vec<Range<usize>> {
        self.blank_lines()
            .into_iter()
            .filter(|line| line.start >= range.start && line.end <= range.end)
            .collect()
    }

    /// Start of the line containing piece `i`
    pub fn line_start_of(&self, i: usize) -> usize {
        (0..i.min(self.pieces.len()))
            .rev()
            .find(|&j| self.pieces[j].is_end_of_line())
            .map_or(0, |j| j + 1)
    }

    /// End (exclusive) of the line containing piece `i`, including its
    /// end-of-line
    pub fn line_end_of(&self, i: usize) -> usize {
        (i..self.pieces.len())
            .find(|&j| self.pieces[j].is_end_of_line())
            .map_or(self.pieces.len(), |j| j + 1)
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    fn end_of_lines_in(&self, range: Range<usize>) -> usize {
        self.pieces[range]
            .iter()
            .filter(|p| p.is_end_of_line())
            .count()
    }

    /// Remove the run of blank lines that begins at the first line start at
    /// or after `from`; returns how many lines were removed
    pub fn remove_blank_lines_after(&mut self, from: usize) -> usize {
        let start = if self.is_line_start(from) {
            from
        } else {
            self.line_end_of(from)
        };
        let end = self.first_non_blank_line(start);
        let removed = self.end_of_lines_in(start..end);
        self.pieces.drain(start..end);
        removed
    }

    /// Keep at most `max` consecutive blank lines in each run
    pub fn collapse_blank_lines(&mut self, max: usize) -> usize {
        let mut removed = 0;
        let mut i = 0;
        while i < self.pieces.len() {
            if self.is_line_start(i) {
                let end = self.first_non_blank_line(i);
                let run = self.end_of_lines_in(i..end);
                if run > max {
                    let excess = run - max;
                    let mut cut = i;
                    for _ in 0..excess {
                        cut = self.line_end_of(cut);
                    }
                    self.pieces.drain(i..cut);
                    removed += excess;
                }
                i = self.first_non_blank_line(i);
                if i >= self.pieces.len() {
                    break;
                }
            }
            i = self.line_end_of(i);
        }
        removed
    }

    /// Insert an empty line at line start `at`
    pub fn insert_blank_line_at(&mut self, at: usize, eol: &str) {
        self.pieces.insert(at, TriviaPiece::end_of_line(eol));
    }

    /// Replace the indentation in front of the next token; returns `false`
    /// when the next token does not begin its line
    pub fn set_indentation(&mut self, indentation: &str) -> bool {
        let line_start = self.line_start_of(self.pieces.len());
        if !self.is_line_start(line_start)
            || !self.pieces[line_start..]
                .iter()
                .all(TriviaPiece::is_whitespace)
        {
            return false;
        }
        self.pieces.truncate(line_start);
        if !indentation.is_empty() {
            self.pieces.push(TriviaPiece::whitespace(indentation));
        }
        true
    }

    pub fn insert(&mut self, at: usize, piece: TriviaPiece) {
        self.pieces.insert(at, piece);
    }

    pub fn splice(&mut self, range: Range<usize>, pieces: impl IntoIterator<Item = TriviaPiece>) {
        self.pieces.splice(range, pieces);
    }

    pub fn remove(&mut self, range: Range<usize>) {
        self.pieces.drain(range);
    }
}

impl fmt::Display for TriviaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for piece in &self.pieces {
            f.write_str(&piece.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_cs;

    fn token(source: &str, text: &str) -> CsSyntaxToken {
        let (cst, _) = parse_cs(source);
        cst.descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .find(|t| t.text() == text)
            .expect("token")
    }

    #[test]
    fn test_split_at_first_end_of_line() {
        let int_kw = token("class A\n{ // open\n\n    int x;\n}\n", "int");
        let stream = TriviaStream::before(&int_kw);
        assert_eq!(stream.text(), " // open\n\n    ");
        assert_eq!(render(stream.trailing()), " // open\n");
        assert_eq!(render(stream.leading()), "\n    ");
        assert_eq!(render(&leading_of(&int_kw)), "\n    ");
    }

    #[test]
    fn test_file_start_has_no_trailing_side() {
        let using = token("\n\n// header\nusing A;\n", "using");
        let stream = TriviaStream::before(&using);
        assert!(stream.prev_token().is_none());
        assert_eq!(stream.split_index(), 0);
        assert_eq!(stream.blank_lines().len(), 2);
        assert!(stream.has_comment());
    }

    #[test]
    fn test_consecutive_blank_lines_fully_counted() {
        let int_kw = token("class A\n{\n    // c\n\n\n  \n    int x;\n}\n", "int");
        let stream = TriviaStream::before(&int_kw);
        assert_eq!(stream.blank_lines().len(), 3);
    }

    #[test]
    fn test_zero_and_whitespace_only_trivia() {
        let semi = token("class A{int x;}", ";");
        let stream = TriviaStream::before(&semi);
        assert!(stream.is_empty());
        assert!(stream.blank_lines().is_empty());
        assert_eq!(stream.first_non_whitespace(0), None);

        let x = token("class A { int    x; }", "x");
        let stream = TriviaStream::before(&x);
        assert_eq!(stream.text(), "    ");
        assert!(stream.blank_lines().is_empty());
        assert_eq!(stream.first_non_blank_line(0), 0);
    }

    #[test]
    fn test_remove_blank_lines_after_comment() {
        let int_kw = token("class A\n{\n    // comment\n\n    int x;\n}\n", "int");
        let mut stream = TriviaStream::before(&int_kw);
        let comment = stream.first_non_whitespace(0).expect("comment");
        assert_eq!(stream.remove_blank_lines_after(comment), 1);
        assert_eq!(stream.text(), "\n    // comment\n    ");
    }

    #[test]
    fn test_directive_lookup() {
        let int_kw = token("class A\n{\n#if DEBUG\n    int x;\n#endif\n}\n", "int");
        let stream = TriviaStream::before(&int_kw);
        assert!(stream.has_directive());
        assert_eq!(stream.first_directive(0), Some(1));
    }

    #[test]
    fn test_collapse_and_indent() {
        let int_kw = token("class A\n{\n\n\n\n  int x;\n}\n", "int");
        let mut stream = TriviaStream::before(&int_kw);
        assert_eq!(stream.collapse_blank_lines(1), 2);
        stream.set_indentation("    ");
        assert_eq!(stream.text(), "\n\n    ");
    }
}
