//! Reading and extending existing documentation comments
//!
//! A documentation comment is either the run of `///` lines in a
//! declaration's leading trivia or a single `/** */` block. Only top-level
//! elements matter for insertion, so the scanner recognises opening tags,
//! their `name` attribute and the matching close, and ignores markup nested
//! inside an element.

use sharpfix_core::cst::trivia::{TriviaKind, TriviaPiece};

/// Top-level documentation element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Summary,
    TypeParam,
    Param,
    Returns,
    Value,
    InheritDoc,
    Other,
}

impl FragmentKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "summary" => Self::Summary,
            "typeparam" => Self::TypeParam,
            "param" => Self::Param,
            "returns" => Self::Returns,
            "value" => Self::Value,
            "inheritdoc" => Self::InheritDoc,
            _ => Self::Other,
        }
    }

    /// Position in the canonical element order
    pub fn rank(self) -> u8 {
        match self {
            Self::Summary | Self::InheritDoc => 0,
            Self::TypeParam => 1,
            Self::Param => 2,
            Self::Returns | Self::Value => 3,
            Self::Other => 4,
        }
    }
}

/// One element and the doc lines it spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// `name` attribute of `param` and `typeparam`
    pub name: Option<String>,
    pub first_line: usize,
    pub last_line: usize,
}

struct OpenTag {
    tag: String,
    kind: FragmentKind,
    name: Option<String>,
    first_line: usize,
}

/// How the comment sits in the trivia
#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    /// Piece index of every `///` line
    Lines(Vec<usize>),
    /// Piece index of the `/** */` block
    Block(usize),
}

/// The documentation comment found in a leading trivia list
#[derive(Debug, Clone)]
pub struct DocComment {
    layout: Layout,
    fragments: Vec<Fragment>,
}

/// New lines for the comment: the text of each line, after the line the
/// comment already has at index `after` (`None` puts them first)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addition {
    pub after: Option<usize>,
    pub lines: Vec<String>,
}

/// Text of a doc line after the `///` marker
fn content(line: &str) -> &str {
    let rest = line.strip_prefix("///").unwrap_or(line);
    rest.strip_prefix(' ').unwrap_or(rest)
}

fn is_block(piece: &TriviaPiece) -> bool {
    piece.kind == TriviaKind::DocumentationComment && piece.text.starts_with("/**")
}

/// Text lines of a `/** */` block, without end-of-line characters
fn block_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Text of each block line between the markers and the `*` exterior
fn block_contents(text: &str) -> Vec<&str> {
    let lines = block_lines(text);
    let last = lines.len() - 1;
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let mut rest = if i == 0 { &line[3..] } else { line.trim_start() };
            if i == last {
                rest = rest.strip_suffix("*/").unwrap_or(rest);
            }
            if i > 0 {
                rest = rest.strip_prefix('*').unwrap_or(rest);
            }
            rest.trim()
        })
        .collect()
}

fn attribute(head: &str, name: &str) -> Option<String> {
    let marker = format!("{name}=\"");
    let start = head.find(&marker)? + marker.len();
    let len = head[start..].find('"')?;
    Some(head[start..start + len].to_string())
}

/// Top-level elements of the comment whose lines read `contents`
fn scan(contents: &[&str]) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut open: Option<OpenTag> = None;
    for (line, text) in contents.iter().enumerate() {
        let mut rest = *text;
        loop {
            if let Some(current) = open.take() {
                let closing = format!("</{}>", current.tag);
                match rest.find(&closing) {
                    Some(i) => {
                        fragments.push(Fragment {
                            kind: current.kind,
                            name: current.name,
                            first_line: current.first_line,
                            last_line: line,
                        });
                        rest = &rest[i + closing.len()..];
                    }
                    None => {
                        open = Some(current);
                        break;
                    }
                }
                continue;
            }

            let Some(start) = rest.find('<') else {
                break;
            };
            let after = &rest[start + 1..];
            let tag: String = after
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric())
                .collect();
            let Some(end) = after.find('>') else {
                break;
            };
            rest = &after[end + 1..];
            if tag.is_empty() {
                continue;
            }
            let head = &after[..end];
            let kind = FragmentKind::from_tag(&tag);
            let name = attribute(head, "name");
            if head.ends_with('/') {
                fragments.push(Fragment {
                    kind,
                    name,
                    first_line: line,
                    last_line: line,
                });
            } else {
                open = Some(OpenTag {
                    tag,
                    kind,
                    name,
                    first_line: line,
                });
            }
        }
    }
    // Unterminated element runs to the end of the comment
    if let Some(current) = open {
        fragments.push(Fragment {
            kind: current.kind,
            name: current.name,
            first_line: current.first_line,
            last_line: contents.len().saturating_sub(1),
        });
    }
    fragments
}

/// A `///` line as trivia pieces
pub fn doc_line(indentation: &str, prefix: &str, text: &str, eol: &str) -> Vec<TriviaPiece> {
    let mut line = Vec::with_capacity(3);
    if !indentation.is_empty() {
        line.push(TriviaPiece::whitespace(indentation));
    }
    line.push(TriviaPiece::new(
        TriviaKind::DocumentationComment,
        format!("{prefix}{text}").trim_end().to_string(),
    ));
    line.push(TriviaPiece::end_of_line(eol));
    line
}

/// Whitespace directly before piece `i`
fn indentation_of(pieces: &[TriviaPiece], i: usize) -> String {
    i.checked_sub(1)
        .map(|i| &pieces[i])
        .filter(|p| p.is_whitespace())
        .map(|p| p.text.clone())
        .unwrap_or_default()
}

impl DocComment {
    /// Parse the documentation comment in `pieces`, if there is one
    pub fn parse(pieces: &[TriviaPiece]) -> Option<Self> {
        let first = pieces
            .iter()
            .position(|p| p.kind == TriviaKind::DocumentationComment)?;
        if is_block(&pieces[first]) {
            let fragments = scan(&block_contents(&pieces[first].text));
            return Some(Self {
                layout: Layout::Block(first),
                fragments,
            });
        }

        let lines: Vec<usize> = pieces
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == TriviaKind::DocumentationComment && !is_block(p))
            .map(|(i, _)| i)
            .collect();
        let contents: Vec<&str> = lines.iter().map(|&i| content(&pieces[i].text)).collect();
        Some(Self {
            layout: Layout::Lines(lines),
            fragments: scan(&contents),
        })
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn has(&self, kind: FragmentKind) -> bool {
        self.fragments.iter().any(|f| f.kind == kind)
    }

    pub fn has_named(&self, kind: FragmentKind, name: &str) -> bool {
        self.fragments
            .iter()
            .any(|f| f.kind == kind && f.name.as_deref() == Some(name))
    }

    /// `<inheritdoc/>` comments document nothing themselves
    pub fn is_inherited(&self) -> bool {
        self.has(FragmentKind::InheritDoc)
    }

    /// Indentation and line prefix new lines copy from the comment
    pub fn exterior(&self, pieces: &[TriviaPiece]) -> (String, String) {
        match &self.layout {
            Layout::Lines(lines) => {
                let Some(&last) = lines.last() else {
                    return (String::new(), "/// ".to_string());
                };
                let text = &pieces[last].text;
                let prefix = if text.starts_with("/// ") || text == "///" {
                    "/// "
                } else {
                    "///"
                };
                (indentation_of(pieces, last), prefix.to_string())
            }
            Layout::Block(piece) => {
                let indentation = indentation_of(pieces, *piece);
                // An existing ` * ` line sets the column of the star
                let existing = block_lines(&pieces[*piece].text)
                    .into_iter()
                    .skip(1)
                    .find_map(|line| {
                        let star = line.find('*')?;
                        let gutter = &line[..star];
                        (gutter.trim().is_empty() && !line[star..].starts_with("*/"))
                            .then(|| format!("{gutter}* "))
                    });
                match existing {
                    Some(prefix) => (String::new(), prefix),
                    None => (indentation, " * ".to_string()),
                }
            }
        }
    }

    /// Comment line after which a new `kind` element belongs, `None` when
    /// it goes before every existing line
    ///
    /// New elements go after the last element that sorts before them;
    /// `ordinal` orders elements of the same kind (parameter position).
    pub fn anchor_line(
        &self,
        kind: FragmentKind,
        ordinal: usize,
        ordinal_of: impl Fn(&Fragment) -> usize,
    ) -> Option<usize> {
        self.fragments
            .iter()
            .filter(|f| {
                f.kind.rank() < kind.rank()
                    || (f.kind.rank() == kind.rank() && ordinal_of(f) < ordinal)
            })
            .map(|f| f.last_line)
            .max()
    }

    /// `pieces` with `additions` written into the comment
    pub fn extend(
        &self,
        pieces: &[TriviaPiece],
        mut additions: Vec<Addition>,
        eol: &str,
    ) -> Vec<TriviaPiece> {
        additions.sort_by_key(|a| a.after.map_or(0, |line| line + 1));
        let (indentation, prefix) = self.exterior(pieces);
        match &self.layout {
            Layout::Lines(lines) => {
                let at = |addition: &Addition| match addition.after {
                    Some(line) => line_end(pieces, lines[line]),
                    None => line_start(pieces, lines[0]),
                };
                let mut out = Vec::with_capacity(pieces.len() + additions.len() * 3);
                let mut pending = additions.into_iter().peekable();
                for (i, piece) in pieces.iter().enumerate() {
                    while let Some(addition) = pending.next_if(|a| at(a) == i) {
                        for text in &addition.lines {
                            out.extend(doc_line(&indentation, &prefix, text, eol));
                        }
                    }
                    out.push(piece.clone());
                }
                for addition in pending {
                    for text in &addition.lines {
                        out.extend(doc_line(&indentation, &prefix, text, eol));
                    }
                }
                out
            }
            Layout::Block(piece) => {
                let mut out = pieces.to_vec();
                let closer = format!("{} */", indentation_of(pieces, *piece));
                let text = extend_block(
                    &pieces[*piece].text,
                    &format!("{indentation}{prefix}"),
                    &closer,
                    &additions,
                    eol,
                );
                out[*piece] = TriviaPiece::new(TriviaKind::DocumentationComment, text);
                out
            }
        }
    }
}

/// Text of a `/** */` block with new lines added
///
/// An opener or closer sharing its line with content is moved to a line of
/// its own when new lines must go next to it.
fn extend_block(
    text: &str,
    exterior: &str,
    closer: &str,
    additions: &[Addition],
    eol: &str,
) -> String {
    let mut lines: Vec<String> = block_lines(text).into_iter().map(str::to_string).collect();
    let mut slots: Vec<Option<usize>> = additions.iter().map(|a| a.after).collect();

    if slots.contains(&None) {
        let rest = lines[0][3..].trim().to_string();
        if rest == "*/" {
            lines[0] = "/**".to_string();
            lines.insert(1, closer.to_string());
        } else if !rest.is_empty() {
            lines[0] = "/**".to_string();
            lines.insert(1, format!("{exterior}{rest}"));
            for slot in slots.iter_mut().flatten() {
                *slot += 1;
            }
        }
        for slot in slots.iter_mut().filter(|s| s.is_none()) {
            *slot = Some(0);
        }
    }

    let last = lines.len() - 1;
    if slots.contains(&Some(last)) {
        let line = &lines[last];
        let from = if last == 0 { 3 } else { 0 };
        let end = line.rfind("*/").filter(|&end| end >= from).unwrap_or(line.len());
        let body = line[from..end].trim();
        if body.is_empty() || body == "*" {
            if last > 0 {
                for slot in slots.iter_mut().flatten().filter(|s| **s == last) {
                    *slot = last - 1;
                }
            }
        } else {
            let kept = line[..end].trim_end().to_string();
            lines[last] = kept;
            lines.push(closer.to_string());
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len() + additions.len());
    for (i, line) in lines.into_iter().enumerate() {
        out.push(line);
        for (addition, slot) in additions.iter().zip(&slots) {
            if *slot == Some(i) {
                out.extend(
                    addition
                        .lines
                        .iter()
                        .map(|text| format!("{exterior}{text}").trim_end().to_string()),
                );
            }
        }
    }
    let eol = if text.contains("\r\n") { "\r\n" } else if text.contains('\n') { "\n" } else { eol };
    out.join(eol)
}

fn line_end(pieces: &[TriviaPiece], i: usize) -> usize {
    (i..pieces.len())
        .find(|&j| pieces[j].is_end_of_line())
        .map_or(pieces.len(), |j| j + 1)
}

fn line_start(pieces: &[TriviaPiece], i: usize) -> usize {
    (0..i)
        .rev()
        .find(|&j| pieces[j].is_end_of_line())
        .map_or(0, |j| j + 1)
}
