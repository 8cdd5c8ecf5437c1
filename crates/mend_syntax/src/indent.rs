//! Indentation scan over Python logical lines.
//!
//! Mirrors the indentation stack kept by the Python tokenizer so that
//! indentation problems can be reported as their own defect kind instead of
//! a generic parse error. Bracketed expressions, string literals (including
//! triple-quoted strings) and backslash continuations are honored; only the
//! first physical line of each logical line is checked.

use crate::error::{DefectKind, SyntaxDefect};

pub const UNEXPECTED_INDENT: &str = "unexpected indent";
pub const EXPECTED_INDENTED_BLOCK: &str = "expected an indented block";
pub const UNINDENT_MISMATCH: &str = "unindent does not match any outer indentation level";
pub const INCONSISTENT_TABS: &str = "inconsistent use of tabs and spaces in indentation";

/// An indentation problem found by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentIssue {
    pub line: usize,
    pub column: usize,
    pub message: &'static str,
}

impl IndentIssue {
    fn new(line: usize, column: usize, message: &'static str) -> Self {
        Self {
            line,
            column,
            message,
        }
    }

    pub fn into_defect(self) -> SyntaxDefect {
        SyntaxDefect::new(DefectKind::Indentation, self.line, self.column, self.message)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct OpenString {
    quote: char,
    pub(crate) triple: bool,
}

/// Lexer state carried across physical lines.
#[derive(Debug, Default)]
pub(crate) struct LexState {
    depth: usize,
    pub(crate) string: Option<OpenString>,
    continuation: bool,
    last_significant: Option<char>,
}

impl LexState {
    /// True while the current logical line spans into the next physical line.
    pub(crate) fn in_logical_line(&self) -> bool {
        self.depth > 0 || self.in_triple_string() || self.continuation
    }

    pub(crate) fn in_triple_string(&self) -> bool {
        self.string.map_or(false, |s| s.triple)
    }

    /// True when the next physical line continues a string or a
    /// backslash-joined line, so its leading whitespace is not indentation.
    pub(crate) fn continues_token(&self) -> bool {
        self.string.is_some() || self.continuation
    }

    fn ends_block_header(&self) -> bool {
        self.last_significant == Some(':')
    }

    /// Consume one physical line (without its line break).
    pub(crate) fn feed(&mut self, line: &str) {
        self.continuation = false;
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if let Some(open) = self.string {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == open.quote {
                    if !open.triple {
                        self.string = None;
                    } else if chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c) {
                        self.string = None;
                        i += 3;
                        continue;
                    }
                }
                i += 1;
                continue;
            }

            match c {
                '#' => break,
                '\'' | '"' => {
                    let triple = chars.get(i + 1) == Some(&c) && chars.get(i + 2) == Some(&c);
                    self.string = Some(OpenString { quote: c, triple });
                    self.last_significant = Some(c);
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth = self.depth.saturating_sub(1),
                '\\' if i + 1 == chars.len() => {
                    self.continuation = true;
                    i += 1;
                    continue;
                }
                _ => {}
            }

            if !c.is_whitespace() {
                self.last_significant = Some(c);
            }
            i += 1;
        }

        // Single-quoted strings never span lines without an explicit continuation.
        if let Some(open) = self.string {
            if !open.triple {
                if line.ends_with('\\') {
                    self.continuation = true;
                } else {
                    self.string = None;
                }
            }
        }
    }
}

/// Indentation width with tabs to the next multiple of 8, and with tabs as 1.
///
/// Two widths are compared the way the Python tokenizer does to detect
/// ambiguous mixes of tabs and spaces.
fn measure(prefix: &str) -> (usize, usize) {
    let mut col = 0;
    let mut alt = 0;
    for c in prefix.chars() {
        match c {
            ' ' => {
                col += 1;
                alt += 1;
            }
            '\t' => {
                col = (col / 8 + 1) * 8;
                alt += 1;
            }
            '\x0c' => {
                col = 0;
                alt = 0;
            }
            _ => break,
        }
    }
    (col, alt)
}

/// Scan `source` and return the first indentation problem, if any.
pub fn scan(source: &str) -> Option<IndentIssue> {
    let mut stack: Vec<(usize, usize)> = vec![(0, 0)];
    let mut lex = LexState::default();
    let mut expect_block = false;
    let mut line_count = 0;

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        line_count = number;

        if lex.in_logical_line() {
            lex.feed(raw);
            if !lex.in_logical_line() {
                expect_block = lex.ends_block_header();
            }
            continue;
        }

        let content = raw.trim_start_matches([' ', '\t', '\x0c']);
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let prefix = &raw[..raw.len() - content.len()];
        let (col, alt) = measure(prefix);
        let column = prefix.chars().count() + 1;
        let (top, top_alt) = stack.last().copied().unwrap_or((0, 0));

        if expect_block {
            expect_block = false;
            if col <= top {
                return Some(IndentIssue::new(number, column, EXPECTED_INDENTED_BLOCK));
            }
            if alt <= top_alt {
                return Some(IndentIssue::new(number, column, INCONSISTENT_TABS));
            }
            stack.push((col, alt));
        } else if col == top {
            if alt != top_alt {
                return Some(IndentIssue::new(number, column, INCONSISTENT_TABS));
            }
        } else if col > top {
            return Some(IndentIssue::new(number, column, UNEXPECTED_INDENT));
        } else {
            while stack.len() > 1 && stack.last().map_or(false, |&(width, _)| col < width) {
                stack.pop();
            }
            let (outer, outer_alt) = stack.last().copied().unwrap_or((0, 0));
            if col != outer {
                return Some(IndentIssue::new(number, column, UNINDENT_MISMATCH));
            }
            if alt != outer_alt {
                return Some(IndentIssue::new(number, column, INCONSISTENT_TABS));
            }
        }

        lex.last_significant = None;
        lex.feed(raw);
        if !lex.in_logical_line() {
            expect_block = lex.ends_block_header();
        }
    }

    if expect_block {
        return Some(IndentIssue::new(line_count + 1, 1, EXPECTED_INDENTED_BLOCK));
    }

    None
}
