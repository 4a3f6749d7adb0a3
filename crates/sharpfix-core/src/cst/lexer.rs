//! CST-aware lexer that preserves all trivia (whitespace, comments, directives)
//!
//! Every byte of the input ends up in exactly one token, which enables
//! lossless round-tripping: `parse(source).text() == source`.

use crate::cst::CsSyntaxKind;
use std::ops::Range;

/// Simple span representing a range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: CsSyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: CsSyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

/// Lex input preserving ALL trivia for CST construction
///
/// - Whitespace runs become `Whitespace` tokens
/// - `\n`, `\r\n` and lone `\r` become `Newline` tokens
/// - `//`, `/* */` and `///` become comment tokens (without the line end)
/// - A `#` that starts a line (after indentation) becomes a `Directive`
///   token spanning the rest of the line
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    let len = input.len();
    let mut i = 0usize;
    // Only whitespace seen since the last line break
    let mut at_line_start = true;

    while i < len {
        let Some((current, size)) = next_char(input, i) else {
            break;
        };
        let start = i;

        match current {
            '\n' => {
                tokens.push(CstToken::new(CsSyntaxKind::Newline, "\n", span(start, i + size)));
                i += size;
                at_line_start = true;
                continue;
            }
            '\r' => {
                let mut end = i + size;
                if let Some(('\n', nl_size)) = next_char(input, end) {
                    end += nl_size;
                }
                tokens.push(CstToken::new(
                    CsSyntaxKind::Newline,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
                at_line_start = true;
                continue;
            }
            c if c.is_whitespace() => {
                let mut end = i + size;
                while let Some((next_ch, next_size)) = next_char(input, end) {
                    if next_ch.is_whitespace() && next_ch != '\n' && next_ch != '\r' {
                        end += next_size;
                    } else {
                        break;
                    }
                }
                tokens.push(CstToken::new(
                    CsSyntaxKind::Whitespace,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
                continue;
            }
            '#' if at_line_start => {
                let end = line_end(input, start);
                tokens.push(CstToken::new(
                    CsSyntaxKind::Directive,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
                continue;
            }
            _ => {}
        }

        at_line_start = false;

        match current {
            '/' if input[i..].starts_with("///") && !input[i..].starts_with("////") => {
                let end = line_end(input, start);
                tokens.push(CstToken::new(
                    CsSyntaxKind::DocComment,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }
            '/' if input[i..].starts_with("//") => {
                let end = line_end(input, start);
                tokens.push(CstToken::new(
                    CsSyntaxKind::CommentLine,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }
            '/' if input[i..].starts_with("/*") => {
                let end = match input[start + 2..].find("*/") {
                    Some(rel) => start + 2 + rel + 2,
                    None => {
                        errors.push(LexerError::new(
                            "Unterminated block comment",
                            span(start, len),
                        ));
                        len
                    }
                };
                // `/**` opens a documentation comment, `/**/` is empty
                let rest = &input[start..];
                let kind = if rest.starts_with("/**") && !rest.starts_with("/**/") {
                    CsSyntaxKind::DocComment
                } else {
                    CsSyntaxKind::CommentBlock
                };
                tokens.push(CstToken::new(kind, &input[start..end], span(start, end)));
                i = end;
            }
            '"' | '@' | '$' if starts_string(input, start) => {
                let (end, error) = lex_string(input, start);
                if let Some(err) = error {
                    errors.push(err);
                }
                tokens.push(CstToken::new(
                    CsSyntaxKind::String,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }
            '\'' => {
                let (end, error) = lex_char(input, start);
                if let Some(err) = error {
                    errors.push(err);
                }
                tokens.push(CstToken::new(
                    CsSyntaxKind::Char,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }
            c if c.is_ascii_digit() => {
                let end = lex_number(input, start);
                tokens.push(CstToken::new(
                    CsSyntaxKind::Number,
                    &input[start..end],
                    span(start, end),
                ));
                i = end;
            }
            c if is_ident_start(c) => {
                let (kind, end) = lex_word(input, start);
                tokens.push(CstToken::new(kind, &input[start..end], span(start, end)));
                i = end;
            }
            ':' if input[i..].starts_with("::") => {
                tokens.push(CstToken::new(CsSyntaxKind::ColonColon, "::", span(start, i + 2)));
                i += 2;
            }
            '=' if input[i..].starts_with("=>") => {
                tokens.push(CstToken::new(CsSyntaxKind::Arrow, "=>", span(start, i + 2)));
                i += 2;
            }
            _ => {
                let kind = match current {
                    '{' => CsSyntaxKind::LBrace,
                    '}' => CsSyntaxKind::RBrace,
                    '(' => CsSyntaxKind::LParen,
                    ')' => CsSyntaxKind::RParen,
                    '[' => CsSyntaxKind::LBracket,
                    ']' => CsSyntaxKind::RBracket,
                    ';' => CsSyntaxKind::Semicolon,
                    ',' => CsSyntaxKind::Comma,
                    '.' => CsSyntaxKind::Dot,
                    '=' => CsSyntaxKind::Eq,
                    '<' => CsSyntaxKind::Lt,
                    '>' => CsSyntaxKind::Gt,
                    ':' => CsSyntaxKind::Colon,
                    '?' => CsSyntaxKind::Question,
                    '+' | '-' | '*' | '/' | '%' | '!' | '&' | '|' | '^' | '~' => {
                        CsSyntaxKind::Punct
                    }
                    _ => {
                        errors.push(LexerError::new(
                            format!("Unexpected character '{current}'"),
                            span(start, i + size),
                        ));
                        CsSyntaxKind::ErrorToken
                    }
                };
                tokens.push(CstToken::new(kind, &input[start..i + size], span(start, i + size)));
                i += size;
            }
        }
    }

    (tokens, errors)
}

/// Lex an identifier or keyword (a leading `@` escapes keywords)
fn lex_word(input: &str, start: usize) -> (CsSyntaxKind, usize) {
    let mut end = start;
    let mut verbatim = false;
    if input[start..].starts_with('@') {
        verbatim = true;
        end += 1;
    }
    while let Some((c, size)) = next_char(input, end) {
        if c.is_alphanumeric() || c == '_' {
            end += size;
        } else {
            break;
        }
    }
    let word = &input[start..end];
    let kind = if verbatim {
        CsSyntaxKind::Ident
    } else {
        CsSyntaxKind::from_keyword(word).unwrap_or(CsSyntaxKind::Ident)
    };
    (kind, end)
}

fn lex_number(input: &str, start: usize) -> usize {
    let mut end = start;
    while let Some((c, size)) = next_char(input, end) {
        let continues = c.is_ascii_alphanumeric()
            || c == '_'
            || (c == '.'
                && next_char(input, end + size).is_some_and(|(n, _)| n.is_ascii_digit()));
        if continues {
            end += size;
        } else {
            break;
        }
    }
    end
}

fn starts_string(input: &str, start: usize) -> bool {
    let rest = &input[start..];
    rest.starts_with('"')
        || rest.starts_with("@\"")
        || rest.starts_with("$\"")
        || rest.starts_with("$@\"")
        || rest.starts_with("@$\"")
}

/// Lex regular, verbatim (`@"..."`) and interpolated (`$"..."`) strings
fn lex_string(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let prefix_len = input[start..].find('"').unwrap_or(0);
    let verbatim = input[start..start + prefix_len].contains('@');
    let mut end = start + prefix_len + 1;

    while let Some((c, size)) = next_char(input, end) {
        match c {
            '"' if verbatim && input[end + size..].starts_with('"') => end += size * 2,
            '"' => return (end + size, None),
            '\\' if !verbatim => {
                end += size;
                if let Some((_, escaped)) = next_char(input, end) {
                    end += escaped;
                }
            }
            '\n' if !verbatim => break,
            _ => end += size,
        }
    }

    (
        end,
        Some(LexerError::new("Unterminated string literal", span(start, end))),
    )
}

fn lex_char(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let mut end = start + 1;
    while let Some((c, size)) = next_char(input, end) {
        match c {
            '\'' => return (end + size, None),
            '\\' => {
                end += size;
                if let Some((_, escaped)) = next_char(input, end) {
                    end += escaped;
                }
            }
            '\n' | '\r' => break,
            _ => end += size,
        }
    }
    (
        end,
        Some(LexerError::new("Unterminated character literal", span(start, end))),
    )
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '@'
}

/// Byte offset of the next line break (or end of input)
fn line_end(input: &str, start: usize) -> usize {
    input[start..]
        .find(&['\n', '\r'][..])
        .map(|rel| start + rel)
        .unwrap_or(input.len())
}

fn next_char(input: &str, pos: usize) -> Option<(char, usize)> {
    input[pos..].chars().next().map(|c| (c, c.len_utf8()))
}

fn span(start: usize, end: usize) -> CstSpan {
    start..end
}
