//! Conditional-compilation region tree
//!
//! [`TreeTextSpan`] models how `#if`/`#elif`/`#else`/`#endif` partition a
//! file. Every `#if`, `#elif` and `#else` opens a region that runs to the
//! next directive of the same group; the root spans the whole file.
//! Children are kept sorted, non-overlapping and gap-filled, so every offset
//! belongs to exactly one leaf. Reordering code buckets declarations by
//! their leaf, which guarantees nothing crosses a directive boundary.

use rowan::{TextRange, TextSize};

use crate::cst::{CsSyntaxKind, CsSyntaxNode};

/// Stable key of a span, usable in maps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanId {
    pub start: TextSize,
    pub end: TextSize,
}

/// A `[start, end)` interval with nested regions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeTextSpan {
    start: TextSize,
    end: TextSize,
    children: Vec<TreeTextSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DirectiveKind {
    If,
    Elif,
    Else,
    Endif,
}

fn classify(text: &str) -> Option<DirectiveKind> {
    let body = text.trim_start_matches('#').trim_start();
    let word: String = body.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    match word.as_str() {
        "if" => Some(DirectiveKind::If),
        "elif" => Some(DirectiveKind::Elif),
        "else" => Some(DirectiveKind::Else),
        "endif" => Some(DirectiveKind::Endif),
        _ => None,
    }
}

/// Region under construction
struct OpenSpan {
    start: TextSize,
    children: Vec<TreeTextSpan>,
}

impl TreeTextSpan {
    pub fn new(start: TextSize, end: TextSize, children: Vec<TreeTextSpan>) -> Self {
        Self {
            start,
            end,
            children,
        }
    }

    /// Build the region tree for a parsed file
    pub fn build(root: &CsSyntaxNode) -> Self {
        let range = root.text_range();
        // One entry per open `#if` chain: its closed branches and the parked
        // enclosing region
        let mut stack: Vec<(Vec<TreeTextSpan>, OpenSpan)> = Vec::new();
        let mut top = OpenSpan {
            start: range.start(),
            children: Vec::new(),
        };

        let directives = root
            .descendants_with_tokens()
            .filter_map(|e| e.into_token())
            .filter(|t| t.kind() == CsSyntaxKind::Directive);

        for token in directives {
            let Some(kind) = classify(token.text()) else {
                continue;
            };
            let at = token.text_range().start();
            match kind {
                DirectiveKind::If => {
                    let parent = std::mem::replace(
                        &mut top,
                        OpenSpan {
                            start: at,
                            children: Vec::new(),
                        },
                    );
                    stack.push((Vec::new(), parent));
                }
                DirectiveKind::Elif | DirectiveKind::Else => {
                    let Some(group) = stack.last_mut() else {
                        continue;
                    };
                    let branch = std::mem::replace(
                        &mut top,
                        OpenSpan {
                            start: at,
                            children: Vec::new(),
                        },
                    );
                    group.0.push(TreeTextSpan::closed(branch, at));
                }
                DirectiveKind::Endif => {
                    let Some((mut branches, mut parent)) = stack.pop() else {
                        continue;
                    };
                    let end = token.text_range().end();
                    let branch = std::mem::replace(&mut top, OpenSpan {
                        start: end,
                        children: Vec::new(),
                    });
                    branches.push(TreeTextSpan::closed(branch, end));
                    let group_start = branches.first().map_or(end, |b| b.start);
                    parent.children.push(TreeTextSpan::new(group_start, end, branches));
                    top = parent;
                }
            }
        }

        // Unterminated regions close at the end of the file
        while let Some((mut branches, mut parent)) = stack.pop() {
            let branch = std::mem::replace(&mut top, OpenSpan {
                start: range.end(),
                children: Vec::new(),
            });
            branches.push(TreeTextSpan::closed(branch, range.end()));
            let group_start = branches.first().map_or(range.end(), |b| b.start);
            parent
                .children
                .push(TreeTextSpan::new(group_start, range.end(), branches));
            top = parent;
        }

        let mut tree = TreeTextSpan::closed(top, range.end());
        tree.fill_gaps();
        tree
    }

    fn closed(open: OpenSpan, end: TextSize) -> Self {
        Self::new(open.start, end, open.children)
    }

    /// Insert filler children so the children cover `[start, end)` exactly
    fn fill_gaps(&mut self) {
        if self.children.is_empty() {
            return;
        }
        self.children.sort_by_key(|c| c.start);
        let mut filled = Vec::with_capacity(self.children.len() * 2 + 1);
        let mut cursor = self.start;
        for mut child in std::mem::take(&mut self.children) {
            if child.start > cursor {
                filled.push(TreeTextSpan::new(cursor, child.start, Vec::new()));
            }
            child.fill_gaps();
            cursor = child.end;
            filled.push(child);
        }
        if cursor < self.end {
            filled.push(TreeTextSpan::new(cursor, self.end, Vec::new()));
        }
        self.children = filled;
    }

    pub fn start(&self) -> TextSize {
        self.start
    }

    pub fn end(&self) -> TextSize {
        self.end
    }

    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }

    pub fn id(&self) -> SpanId {
        SpanId {
            start: self.start,
            end: self.end,
        }
    }

    pub fn children(&self) -> &[TreeTextSpan] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, offset: TextSize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Smallest span containing `offset`; the root when out of range
    pub fn containing(&self, offset: TextSize) -> &TreeTextSpan {
        match self.children.iter().find(|c| c.contains(offset)) {
            Some(child) => child.containing(offset),
            None => self,
        }
    }

    /// Whether two offsets lie in the same leaf region
    pub fn same_region(&self, a: TextSize, b: TextSize) -> bool {
        self.containing(a).id() == self.containing(b).id()
    }

    /// Whether the file has any conditional region at all
    pub fn has_regions(&self) -> bool {
        !self.children.is_empty()
    }

    /// Leaves in source order
    pub fn leaves(&self) -> Vec<&TreeTextSpan> {
        if self.is_leaf() {
            return vec![self];
        }
        self.children.iter().flat_map(|c| c.leaves()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cst::parse_cs;

    fn offset_of(source: &str, needle: &str) -> TextSize {
        TextSize::from(source.find(needle).expect("needle") as u32)
    }

    #[test]
    fn test_no_directives_is_single_leaf() {
        let (cst, _) = parse_cs("using A;\nusing B;\n");
        let tree = TreeTextSpan::build(&cst);
        assert!(tree.is_leaf());
        assert_eq!(tree.range(), cst.text_range());
    }

    #[test]
    fn test_regions_are_gap_filled() {
        let source = "using A;\n#if DEBUG\nusing B;\n#else\nusing C;\n#endif\nusing D;\n";
        let (cst, _) = parse_cs(source);
        let tree = TreeTextSpan::build(&cst);

        // leading filler, the #if group, trailing filler
        assert_eq!(tree.children().len(), 3);
        let mut cursor = tree.start();
        for child in tree.children() {
            assert_eq!(child.start(), cursor);
            cursor = child.end();
        }
        assert_eq!(cursor, tree.end());

        let a = offset_of(source, "using A");
        let b = offset_of(source, "using B");
        let c = offset_of(source, "using C");
        let d = offset_of(source, "using D");
        assert!(!tree.same_region(a, b));
        assert!(!tree.same_region(b, c));
        assert!(!tree.same_region(a, d));
        assert_eq!(tree.leaves().len(), 4);
    }

    #[test]
    fn test_nested_regions() {
        let source = "#if A\nusing X;\n#if B\nusing Y;\n#endif\nusing Z;\n#endif\n";
        let (cst, _) = parse_cs(source);
        let tree = TreeTextSpan::build(&cst);
        let x = offset_of(source, "using X");
        let y = offset_of(source, "using Y");
        let z = offset_of(source, "using Z");
        assert!(!tree.same_region(x, y));
        assert!(!tree.same_region(x, z));
        let outer = tree
            .children()
            .iter()
            .find(|c| c.contains(x))
            .expect("outer region");
        assert!(outer.range().contains_range(tree.containing(y).range()));
    }

    #[test]
    fn test_unterminated_region_closes_at_end() {
        let source = "using A;\n#if DEBUG\nusing B;\n";
        let (cst, _) = parse_cs(source);
        let tree = TreeTextSpan::build(&cst);
        assert_eq!(tree.children().last().map(|c| c.end()), Some(tree.end()));
        assert!(!tree.same_region(offset_of(source, "using A"), offset_of(source, "using B")));
    }
}
