//! Constructs tree-sitter-python accepts but Python 3 rejects.
//!
//! The grammar keeps several Python 2 forms and skips a few checks CPython
//! performs after parsing. A clean tree is walked once more and the first
//! such construct, in document order, is reported as a syntax defect.

use tree_sitter::Node;

use crate::error::{DefectKind, SyntaxDefect};
use crate::validator::location;

pub const PRINT_STATEMENT: &str = "Missing parentheses in call to 'print'. Did you mean print(...)?";
pub const EXEC_STATEMENT: &str = "Missing parentheses in call to 'exec'. Did you mean exec(...)?";
pub const BACKQUOTE: &str = "backquote expressions are not supported; use repr()";
pub const DIAMOND_OPERATOR: &str = "'<>' is not supported; use '!='";
pub const LEADING_ZEROS: &str =
    "leading zeros in decimal integer literals are not permitted; use an 0o prefix for octal integers";
pub const ITERABLE_AFTER_MAPPING: &str =
    "iterable argument unpacking follows keyword argument unpacking";
pub const POSITIONAL_AFTER_MAPPING: &str = "positional argument follows keyword argument unpacking";
pub const POSITIONAL_AFTER_KEYWORD: &str = "positional argument follows keyword argument";

/// First construct in `root` that Python 3 would reject.
pub(crate) fn first_rejected(root: Node<'_>, source: &str) -> Option<SyntaxDefect> {
    if let Some(defect) = rejected(root, source) {
        return Some(defect);
    }
    let mut cursor = root.walk();
    let children: Vec<Node<'_>> = root.children(&mut cursor).collect();
    children.into_iter().find_map(|child| first_rejected(child, source))
}

fn rejected(node: Node<'_>, source: &str) -> Option<SyntaxDefect> {
    match node.kind() {
        "print_statement" => Some(defect_at(node, source, PRINT_STATEMENT)),
        "exec_statement" => Some(defect_at(node, source, EXEC_STATEMENT)),
        "string" => {
            let start = node.child(0)?;
            let delimiter = start.utf8_text(source.as_bytes()).ok()?;
            delimiter
                .contains('`')
                .then(|| defect_at(node, source, BACKQUOTE))
        }
        "integer" => {
            let text = node.utf8_text(source.as_bytes()).ok()?;
            integer_message(text).map(|message| defect_at(node, source, message))
        }
        "comparison_operator" => {
            let mut cursor = node.walk();
            let diamond = node.children(&mut cursor).find(|c| c.kind() == "<>");
            diamond.map(|op| defect_at(op, source, DIAMOND_OPERATOR))
        }
        "delete_statement" => {
            let target = node.named_child(0)?;
            invalid_delete_target(target).map(|bad| {
                let message = format!("cannot delete {}", describe(bad));
                defect_at(bad, source, &message)
            })
        }
        "argument_list" => argument_order(node, source),
        _ => None,
    }
}

fn defect_at(node: Node<'_>, source: &str, message: &str) -> SyntaxDefect {
    let (line, column) = location(source, node.start_position());
    SyntaxDefect::new(DefectKind::Syntax, line, column, message)
}

/// Python 2 long suffixes and zero-padded decimals. Imaginary literals may
/// carry leading zeros.
fn integer_message(text: &str) -> Option<&'static str> {
    let lower = text.to_ascii_lowercase();
    if lower.ends_with('j') {
        return None;
    }

    let radix = match lower.get(..2) {
        Some("0x") => "hexadecimal",
        Some("0o") => "octal",
        Some("0b") => "binary",
        _ => "decimal",
    };

    if lower.ends_with('l') {
        return Some(match radix {
            "hexadecimal" => "invalid hexadecimal literal",
            "octal" => "invalid octal literal",
            "binary" => "invalid binary literal",
            _ => "invalid decimal literal",
        });
    }

    let padded = radix == "decimal"
        && lower.len() > 1
        && lower.starts_with('0')
        && lower.chars().any(|c| c.is_ascii_digit() && c != '0');
    padded.then_some(LEADING_ZEROS)
}

/// Deletable targets are names, attributes, subscripts and sequences of them.
fn invalid_delete_target(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "identifier" | "keyword_identifier" | "attribute" | "subscript" | "comment" => None,
        "expression_list" | "tuple" | "list" | "parenthesized_expression" => {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
            children.into_iter().find_map(invalid_delete_target)
        }
        _ => Some(node),
    }
}

fn describe(node: Node<'_>) -> &'static str {
    match node.kind() {
        "call" => "function call",
        "integer" | "float" | "string" | "concatenated_string" | "true" | "false" | "none" => {
            "literal"
        }
        _ => "expression",
    }
}

/// Positional arguments may not follow keywords, and nothing but keywords
/// may follow `**` unpacking.
fn argument_order(node: Node<'_>, source: &str) -> Option<SyntaxDefect> {
    let mut seen_keyword = false;
    let mut seen_mapping = false;
    let mut cursor = node.walk();

    for arg in node.named_children(&mut cursor) {
        match arg.kind() {
            "comment" => {}
            "keyword_argument" => seen_keyword = true,
            "dictionary_splat" => seen_mapping = true,
            "list_splat" if seen_mapping => {
                return Some(defect_at(arg, source, ITERABLE_AFTER_MAPPING));
            }
            "list_splat" => {}
            _ if seen_mapping => return Some(defect_at(arg, source, POSITIONAL_AFTER_MAPPING)),
            _ if seen_keyword => return Some(defect_at(arg, source, POSITIONAL_AFTER_KEYWORD)),
            _ => {}
        }
    }
    None
}
