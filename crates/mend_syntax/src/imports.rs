//! Import discovery for generated source.

use tree_sitter::Node;

use crate::error::SyntaxResult;
use crate::validator::parse;

/// Top-level module names imported anywhere in `source`, in order of first
/// appearance. Relative imports and `__future__` imports are skipped.
pub fn imported_modules(source: &str) -> SyntaxResult<Vec<String>> {
    let tree = parse(source)?;
    let mut modules = Vec::new();
    collect(tree.root_node(), source.as_bytes(), &mut modules);
    Ok(modules)
}

fn collect(node: Node<'_>, source: &[u8], modules: &mut Vec<String>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                let dotted = if name.kind() == "aliased_import" {
                    name.child_by_field_name("name")
                } else {
                    Some(name)
                };
                if let Some(dotted) = dotted {
                    push_module(dotted, source, modules);
                }
            }
        }
        "import_from_statement" => {
            if let Some(module) = node.child_by_field_name("module_name") {
                if module.kind() == "dotted_name" {
                    push_module(module, source, modules);
                }
            }
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect(child, source, modules);
            }
        }
    }
}

fn push_module(node: Node<'_>, source: &[u8], modules: &mut Vec<String>) {
    let Ok(text) = node.utf8_text(source) else {
        return;
    };
    let Some(top) = text.split('.').next().map(str::trim) else {
        return;
    };
    if !top.is_empty() && top != "__future__" && !modules.iter().any(|m| m == top) {
        modules.push(top.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_top_level_modules() {
        let source = "import os\nimport numpy as np\nfrom requests.adapters import HTTPAdapter\nimport os.path\n";
        let modules = imported_modules(source).unwrap();
        assert_eq!(modules, vec!["os", "numpy", "requests"]);
    }

    #[test]
    fn test_skips_relative_and_future_imports() {
        let source = "from __future__ import annotations\nfrom . import sibling\nfrom .pkg import thing\n";
        assert!(imported_modules(source).unwrap().is_empty());
    }

    #[test]
    fn test_nested_imports() {
        let source = "def load():\n    import yaml\n    return yaml\n";
        assert_eq!(imported_modules(source).unwrap(), vec!["yaml"]);
    }
}
