//! Best-effort cosmetic normalization of Python source.
//!
//! Formatting never fails the caller: whenever the normalized text cannot be
//! proven structurally identical to the input, the input is handed back
//! untouched and a warning is logged.

use thiserror::Error;
use tracing::{debug, warn};

use tree_sitter::Node;

use crate::error::SyntaxError;
use crate::indent::LexState;
use crate::validator::{parse, Validator};

const DEFAULT_MAX_BLANK_LINES: usize = 2;
const TAB_WIDTH: usize = 4;

/// Outcome of a formatting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Formatted {
    /// The text was rewritten.
    Normalized(String),
    /// The original text, either already normal or not safely formattable.
    Unchanged(String),
}

impl Formatted {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Normalized(text) | Self::Unchanged(text) => text,
        }
    }

    pub fn into_inner(self) -> String {
        match self {
            Self::Normalized(text) | Self::Unchanged(text) => text,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Normalized(_))
    }
}

#[derive(Error, Debug)]
enum FormatError {
    #[error("source is not valid Python: {0}")]
    Invalid(String),

    #[error("normalized output no longer matches the original structure")]
    StructureChanged,

    #[error(transparent)]
    Parser(#[from] SyntaxError),
}

/// Whitespace normalizer for Python source.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    max_blank_lines: usize,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {
            max_blank_lines: DEFAULT_MAX_BLANK_LINES,
        }
    }

    pub fn max_blank_lines(mut self, max: usize) -> Self {
        self.max_blank_lines = max;
        self
    }

    /// Normalize `source`, falling back to the original text on any failure.
    pub fn format(&self, source: &str) -> Formatted {
        match self.try_format(source) {
            Ok(text) if text == source => Formatted::Unchanged(source.to_string()),
            Ok(text) => {
                debug!("Formatted source ({} -> {} bytes)", source.len(), text.len());
                Formatted::Normalized(text)
            }
            Err(e) => {
                warn!("Formatting skipped, returning original text: {}", e);
                Formatted::Unchanged(source.to_string())
            }
        }
    }

    fn try_format(&self, source: &str) -> Result<String, FormatError> {
        let validator = Validator::new();
        if let Err(e) = validator.validate(source) {
            return Err(FormatError::Invalid(e.to_string()));
        }
        let original = parse(source)?;

        let normalized = self.normalize(source);
        if validator.validate(&normalized).is_err() {
            return Err(FormatError::StructureChanged);
        }
        let tree = parse(&normalized)?;

        // S-expressions carry no leaf text, so literals are compared separately.
        let same_strings = string_literals(original.root_node(), source, true)
            == string_literals(tree.root_node(), &normalized, false);
        if !same_strings || tree.root_node().to_sexp() != original.root_node().to_sexp() {
            return Err(FormatError::StructureChanged);
        }

        Ok(normalized)
    }

    /// Strip trailing whitespace, expand tab-only indentation, collapse
    /// blank-line runs and end with a single newline. Lines inside
    /// triple-quoted strings are left byte-for-byte intact, and lines that
    /// continue a string or a backslash-joined line keep their leading tabs.
    fn normalize(&self, source: &str) -> String {
        let source = source.replace("\r\n", "\n");
        let expand_tabs = uses_tab_indentation(&source);
        let mut lex = LexState::default();
        let mut lines: Vec<String> = Vec::new();
        let mut blank_run = 0;

        for raw in source.lines() {
            if lex.in_triple_string() {
                lex.feed(raw);
                lines.push(raw.to_string());
                blank_run = 0;
                continue;
            }

            let continued = lex.continues_token();
            lex.feed(raw);
            let mut line = if lex.in_triple_string() {
                raw.to_string()
            } else {
                raw.trim_end().to_string()
            };

            if expand_tabs && !continued {
                let content = line.trim_start_matches('\t');
                let tabs = line.len() - content.len();
                if tabs > 0 {
                    line = format!("{}{}", " ".repeat(tabs * TAB_WIDTH), content);
                }
            }

            if line.is_empty() {
                blank_run += 1;
                if blank_run > self.max_blank_lines {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            lines.push(line);
        }

        while lines.last().map_or(false, |l| l.is_empty()) {
            lines.pop();
        }

        if lines.is_empty() {
            return String::new();
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// Text of every string literal under `node`, in document order.
///
/// Line endings are normalized on the side that was read before CRLF
/// conversion.
fn string_literals(node: Node<'_>, source: &str, crlf: bool) -> Vec<String> {
    let mut found = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        if current.kind() == "string" {
            let text = current.utf8_text(source.as_bytes()).unwrap_or("");
            found.push(if crlf {
                text.replace("\r\n", "\n")
            } else {
                text.to_string()
            });
            continue;
        }
        let mut cursor = current.walk();
        let children: Vec<Node<'_>> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    found
}

/// True when every indented line is indented with tabs only.
fn uses_tab_indentation(source: &str) -> bool {
    let mut saw_tab = false;
    for line in source.lines() {
        let content = line.trim_start_matches([' ', '\t']);
        if content.is_empty() {
            continue;
        }
        let prefix = &line[..line.len() - content.len()];
        if prefix.contains(' ') {
            return false;
        }
        saw_tab |= prefix.contains('\t');
    }
    saw_tab
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_trailing_whitespace() {
        let formatted = Formatter::new().format("x = 1   \ny = 2\t\n");
        assert_eq!(formatted, Formatted::Normalized("x = 1\ny = 2\n".to_string()));
    }

    #[test]
    fn test_already_normal_is_unchanged() {
        let source = "def f():\n    return 1\n";
        let formatted = Formatter::new().format(source);
        assert!(!formatted.is_changed());
        assert_eq!(formatted.as_str(), source);
    }

    #[test]
    fn test_collapses_blank_lines() {
        let formatted = Formatter::new().format("import os\n\n\n\n\nx = 1\n\n\n");
        assert_eq!(formatted.as_str(), "import os\n\n\nx = 1\n");
    }

    #[test]
    fn test_expands_tab_indentation() {
        let formatted = Formatter::new().format("def f():\n\treturn 1\n");
        assert_eq!(formatted.as_str(), "def f():\n    return 1\n");
    }

    #[test]
    fn test_preserves_docstring_whitespace() {
        let source = "x = \"\"\"line one   \n\n\n\n   line two\"\"\"\n";
        let formatted = Formatter::new().format(source);
        assert_eq!(formatted.as_str(), source);
    }

    #[test]
    fn test_invalid_source_returned_unchanged() {
        let source = "def broken(:\n  pass  \n";
        let formatted = Formatter::new().format(source);
        assert_eq!(formatted, Formatted::Unchanged(source.to_string()));
    }

    #[test]
    fn test_string_continuation_keeps_tabs() {
        let source = "x = \"abc\\\n\tdef\"\nif x:\n\ty = 1\n";
        let formatted = Formatter::new().format(source);
        assert_eq!(
            formatted,
            Formatted::Normalized("x = \"abc\\\n\tdef\"\nif x:\n    y = 1\n".to_string())
        );
    }

    #[test]
    fn test_string_text_compared() {
        let original = "s = 'a\tb'\n";
        let changed = "s = 'a    b'\n";
        let before = parse(original).unwrap();
        let after = parse(changed).unwrap();

        assert_eq!(before.root_node().to_sexp(), after.root_node().to_sexp());
        assert_ne!(
            string_literals(before.root_node(), original, true),
            string_literals(after.root_node(), changed, false)
        );
    }

    #[test]
    fn test_python2_source_returned_unchanged() {
        let source = "print 'hi'   \n";
        assert_eq!(Formatter::new().format(source), Formatted::Unchanged(source.to_string()));
    }

    #[test]
    fn test_adds_trailing_newline() {
        let formatted = Formatter::new().format("print('hi')");
        assert_eq!(formatted.into_inner(), "print('hi')\n");
    }
}
