//! Syntax validation backed by tree-sitter-python.

use std::cell::RefCell;

use tracing::debug;
use tree_sitter::{Node, Parser, Point, Tree};

use crate::error::{DefectKind, SyntaxDefect, SyntaxError, SyntaxResult};
use crate::indent::{self, EXPECTED_INDENTED_BLOCK};
use crate::legacy;

pub const EXPECTED_COLON: &str = "expected ':'";

const SNIPPET_LIMIT: usize = 40;

/// Statements whose header must end in `:`.
const COMPOUND_KEYWORDS: &[&str] = &[
    "def", "class", "if", "elif", "else", "for", "while", "with", "try", "except", "finally",
    "async", "match", "case",
];

thread_local! {
    static PYTHON_PARSER: RefCell<Parser> = RefCell::new({
        let mut p = Parser::new();
        // A language ABI mismatch shows up as a failed parse below.
        let _ = p.set_language(&tree_sitter_python::LANGUAGE.into());
        p
    });
}

/// Parse Python source with the thread-local parser.
pub(crate) fn parse(source: &str) -> SyntaxResult<Tree> {
    PYTHON_PARSER
        .with(|p| p.borrow_mut().parse(source, None))
        .ok_or_else(|| SyntaxError::ParserUnavailable("tree-sitter produced no tree".to_string()))
}

/// Anything that can confirm a piece of source text is syntactically valid.
pub trait SyntaxCheck: Send + Sync {
    fn check(&self, source: &str) -> SyntaxResult<()>;
}

/// Purely syntactic Python validator.
///
/// No name resolution or type checking is performed. Identical input always
/// yields the identical outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `source`, reporting the first defect found.
    ///
    /// Indentation problems win over a generic parse error when they occur
    /// on or right after the line the parser failed on, since the parser
    /// usually trips over the statement that follows a bad indent. A header
    /// missing its colon is the exception: the indent after it is a symptom.
    pub fn validate(&self, source: &str) -> SyntaxResult<()> {
        let indentation = indent::scan(source);
        let tree = parse(source)?;
        let root = tree.root_node();
        let parse_defect =
            first_defect(root, source).or_else(|| legacy::first_rejected(root, source));

        let defect = match (indentation, parse_defect) {
            (Some(issue), Some(defect))
                if issue.line > defect.line + 1 || defect.message == EXPECTED_COLON =>
            {
                defect
            }
            (Some(issue), _) => issue.into_defect(),
            (None, Some(defect)) => defect,
            (None, None) => {
                debug!("Validation passed ({} bytes)", source.len());
                return Ok(());
            }
        };

        debug!("Validation failed: {}", defect);
        Err(SyntaxError::Defect(defect))
    }

    /// Returns true if `source` parses cleanly.
    pub fn is_valid(&self, source: &str) -> bool {
        self.validate(source).is_ok()
    }
}

impl SyntaxCheck for Validator {
    fn check(&self, source: &str) -> SyntaxResult<()> {
        self.validate(source)
    }
}

/// Locate the first ERROR or MISSING node in document order.
fn find_error_node(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_error_node(child) {
            return Some(found);
        }
    }
    None
}

/// 1-based line and character column of a tree-sitter point.
pub(crate) fn location(source: &str, point: Point) -> (usize, usize) {
    let line_text = source.lines().nth(point.row).unwrap_or("");
    let column = line_text
        .get(..point.column)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(point.column)
        + 1;
    (point.row + 1, column)
}

/// 1-based line and character column of a byte offset.
fn offset_location(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let line = before.matches('\n').count() + 1;
    (line, before[line_start..].chars().count() + 1)
}

/// Visible tokens under `node` in document order. String literals count as
/// one token; comments and blank tokens are skipped.
fn tokens<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.is_missing() || node.kind() == "comment" || node.start_byte() == node.end_byte() {
        return;
    }
    if node.child_count() == 0 || node.kind() == "string" {
        out.push(node);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        tokens(child, out);
    }
}

fn token_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("").trim()
}

fn first_defect(root: Node<'_>, source: &str) -> Option<SyntaxDefect> {
    if !root.has_error() {
        return None;
    }

    // The root itself can be the error when nothing parsed at all.
    let node = find_error_node(root).unwrap_or(root);

    if node.is_missing() {
        // A missing token belongs right after the token before it.
        let point = node
            .prev_sibling()
            .map_or(node.start_position(), |prev| prev.end_position());
        let (line, column) = location(source, point);
        let token = node.kind();
        if token.contains("indent") {
            return Some(SyntaxDefect::new(
                DefectKind::Indentation,
                line,
                column,
                EXPECTED_INDENTED_BLOCK,
            ));
        }
        return Some(SyntaxDefect::new(
            DefectKind::Syntax,
            line,
            column,
            format!("expected '{}'", token),
        ));
    }

    if let Some(defect) = missing_colon(root, node, source) {
        return Some(defect);
    }

    let mut inside = Vec::new();
    tokens(node, &mut inside);

    if let Some(defect) = unclosed_bracket(node, &inside, source) {
        return Some(defect);
    }

    // The parser gives up at the last token it managed to shift.
    let culprit = inside.last().copied().unwrap_or(node);
    let (line, column) = location(source, culprit.start_position());
    let snippet: String = token_text(culprit, source)
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(SNIPPET_LIMIT)
        .collect();

    let message = if snippet.is_empty() {
        "invalid syntax".to_string()
    } else {
        format!("invalid syntax at '{}'", snippet)
    };
    Some(SyntaxDefect::new(DefectKind::Syntax, line, column, message))
}

/// A compound statement header missing its `:`.
///
/// A colon is tried after each top-level token of the failing line; the
/// first position at which that line parses cleanly is where it belongs.
fn missing_colon(root: Node<'_>, error: Node<'_>, source: &str) -> Option<SyntaxDefect> {
    let row = error.start_position().row;
    let line_text = source.lines().nth(row)?;
    let keyword: String = line_text
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if !COMPOUND_KEYWORDS.contains(&keyword.as_str()) {
        return None;
    }

    let mut all = Vec::new();
    tokens(root, &mut all);
    let line_tokens: Vec<Node<'_>> = all
        .into_iter()
        .filter(|t| t.start_position().row == row)
        .collect();
    if line_tokens.iter().any(|t| t.kind() == ":") {
        return None;
    }

    let mut depth = 0usize;
    for token in line_tokens {
        match token.kind() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth > 0 {
            continue;
        }

        let offset = token.end_byte();
        let patched = format!("{}:{}", &source[..offset], &source[offset..]);
        if clean_through(&patched, row) {
            let (line, column) = offset_location(source, offset);
            return Some(SyntaxDefect::new(DefectKind::Syntax, line, column, EXPECTED_COLON));
        }
    }
    None
}

/// True when `source` has no parse error on or before `row`.
fn clean_through(source: &str, row: usize) -> bool {
    let Ok(tree) = parse(source) else {
        return false;
    };
    let first_error = find_error_node(tree.root_node()).map(|n| n.start_position().row);
    first_error.map_or(true, |error_row| error_row > row)
}

/// An opening bracket left open when the input ran out.
fn unclosed_bracket(error: Node<'_>, inside: &[Node<'_>], source: &str) -> Option<SyntaxDefect> {
    if error.end_byte() < source.trim_end().len() {
        return None;
    }

    let mut open: Vec<Node<'_>> = Vec::new();
    for token in inside {
        match token.kind() {
            "(" | "[" | "{" => open.push(*token),
            ")" | "]" | "}" => {
                open.pop();
            }
            _ => {}
        }
    }

    let bracket = open.last()?;
    let (line, column) = location(source, bracket.start_position());
    Some(SyntaxDefect::new(
        DefectKind::Syntax,
        line,
        column,
        format!("'{}' was never closed", bracket.kind()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defect(source: &str) -> SyntaxDefect {
        match Validator::new().validate(source) {
            Err(err) => err.defect().cloned().expect("positioned defect"),
            Ok(()) => panic!("expected a defect for {:?}", source),
        }
    }

    fn rejected_with(source: &str, message: &str) -> SyntaxDefect {
        let defect = defect(source);
        assert_eq!(defect.kind, DefectKind::Syntax, "{:?}", source);
        assert_eq!(defect.message, message, "{:?}", source);
        defect
    }

    #[test]
    fn test_valid_function() {
        let validator = Validator::new();
        assert!(validator
            .validate("def test_func():\n    return 'Hello'\n")
            .is_ok());
    }

    #[test]
    fn test_empty_source_is_valid() {
        assert!(Validator::new().is_valid(""));
    }

    #[test]
    fn test_missing_colon() {
        let defect = defect("def test_func() return None");
        assert_eq!(defect.kind, DefectKind::Syntax);
        assert_eq!(defect.line, 1);
        assert_eq!(defect.column, 16);
        assert_eq!(defect.message, EXPECTED_COLON);
        assert!(!defect.is_indentation());
    }

    #[test]
    fn test_missing_colon_before_indented_body() {
        let defect = defect("class A\n    pass\n");
        assert_eq!(defect.kind, DefectKind::Syntax);
        assert_eq!((defect.line, defect.column), (1, 8));
        assert_eq!(defect.message, EXPECTED_COLON);
    }

    #[test]
    fn test_missing_colon_after_return_annotation() {
        let defect = defect("x = 1\ndef f(a, b) -> int return a\n");
        assert_eq!((defect.line, defect.column), (2, 19));
        assert_eq!(defect.message, EXPECTED_COLON);
    }

    #[test]
    fn test_dangling_operator_points_at_operator() {
        let defect = defect("x = 1 +\n");
        assert_eq!(defect.kind, DefectKind::Syntax);
        assert_eq!(defect.line, 1);
        assert!(defect.column > 1, "{:?}", defect);
        assert!(
            defect.message.contains('+') || defect.message.starts_with("expected"),
            "{:?}",
            defect
        );
    }

    #[test]
    fn test_error_on_later_line() {
        let defect = defect("x = 1\ny = (2 +\n");
        assert_eq!(defect.kind, DefectKind::Syntax);
        assert_eq!(defect.line, 2);
        assert!(defect.column > 1);
    }

    #[test]
    fn test_python2_print_and_exec_rejected() {
        let defect = rejected_with("print \"hello\"\n", legacy::PRINT_STATEMENT);
        assert_eq!((defect.line, defect.column), (1, 1));
        rejected_with("import sys\nprint >> sys.stderr, 'x'\n", legacy::PRINT_STATEMENT);
        rejected_with("exec \"x = 1\"\n", legacy::EXEC_STATEMENT);

        assert!(Validator::new().is_valid("print('hello')\nexec('x = 1')\n"));
    }

    #[test]
    fn test_backquotes_rejected() {
        let defect = rejected_with("y = 1\nx = `y`\n", legacy::BACKQUOTE);
        assert_eq!((defect.line, defect.column), (2, 5));
    }

    #[test]
    fn test_python2_integer_forms_rejected() {
        let defect = rejected_with("x = 08\n", legacy::LEADING_ZEROS);
        assert_eq!(defect.column, 5);
        rejected_with("n = 10L\n", "invalid decimal literal");

        assert!(Validator::new().is_valid("a = 0\nb = 00\nc = 0o10\nd = 1_000\ne = 0x1F\n"));
    }

    #[test]
    fn test_diamond_operator_rejected() {
        rejected_with("a = 1\nb = a <> 2\n", legacy::DIAMOND_OPERATOR);
    }

    #[test]
    fn test_delete_targets() {
        rejected_with("del f()\n", "cannot delete function call");
        rejected_with("del a, 1\n", "cannot delete literal");

        assert!(Validator::new().is_valid("del a, b.c, d[0], (e, [f])\n"));
    }

    #[test]
    fn test_argument_order() {
        rejected_with("f(**k, *a)\n", legacy::ITERABLE_AFTER_MAPPING);
        rejected_with("f(**k, a)\n", legacy::POSITIONAL_AFTER_MAPPING);
        let defect = rejected_with("f(x=1, y)\n", legacy::POSITIONAL_AFTER_KEYWORD);
        assert_eq!(defect.column, 8);

        assert!(Validator::new().is_valid("f(a, *b, c=1, *d, **e)\n"));
    }

    #[test]
    fn test_first_defect_in_document_order() {
        let defect = defect("print 'a'\nx = 08\n");
        assert_eq!(defect.line, 1);
        assert_eq!(defect.message, legacy::PRINT_STATEMENT);
    }

    #[test]
    fn test_unexpected_indent_is_indentation_defect() {
        let defect = defect("x = 1\n    y = 2\n");
        assert_eq!(defect.kind, DefectKind::Indentation);
        assert!(defect.is_indentation());
        assert_eq!(defect.line, 2);
        assert_eq!(defect.message, indent::UNEXPECTED_INDENT);
    }

    #[test]
    fn test_missing_block_is_indentation_defect() {
        let defect = defect("def f():\nreturn 1\n");
        assert_eq!(defect.kind, DefectKind::Indentation);
        assert_eq!(defect.line, 2);
    }

    #[test]
    fn test_deterministic() {
        let source = "class A\n    pass\n";
        assert_eq!(defect(source), defect(source));
    }

    #[test]
    fn test_syntax_check_trait() {
        let checker: &dyn SyntaxCheck = &Validator::new();
        assert!(checker.check("import os\nprint(os.getcwd())\n").is_ok());
        assert!(checker.check("print(").is_err());
    }

    #[test]
    fn test_parser_unavailable_has_no_defect() {
        let err = SyntaxError::ParserUnavailable("no tree".to_string());
        assert!(err.defect().is_none());
    }
}
