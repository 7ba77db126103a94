use std::path::Path;

use tree_sitter::{Node, Parser, Tree};

use crate::error::{MutatorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsDialect {
    JavaScript,
    TypeScript,
    Tsx,
}

impl JsDialect {
    pub fn from_path(path: &Path) -> Option<JsDialect> {
        match path.extension()?.to_str()? {
            "js" | "mjs" | "cjs" => Some(JsDialect::JavaScript),
            "ts" | "mts" | "cts" => Some(JsDialect::TypeScript),
            "tsx" | "jsx" => Some(JsDialect::Tsx),
            _ => None,
        }
    }
}

/// Parse `source`, rejecting trees that contain ERROR or MISSING nodes.
pub fn parse(source: &str, dialect: JsDialect) -> Result<Tree> {
    let mut parser = Parser::new();
    let language = match dialect {
        JsDialect::JavaScript => tree_sitter_javascript::LANGUAGE,
        JsDialect::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
        JsDialect::Tsx => tree_sitter_typescript::LANGUAGE_TSX,
    };
    parser.set_language(&language.into())?;

    let tree = parser
        .parse(source, None)
        .ok_or(MutatorError::Parse { line: 1, column: 1 })?;
    let root = tree.root_node();
    if root.has_error() {
        let bad = first_error(root).unwrap_or(root);
        let pos = bad.start_position();
        return Err(MutatorError::Parse {
            line: pos.row + 1,
            column: pos.column + 1,
        });
    }
    Ok(tree)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

pub fn list_functions(source: &str, dialect: JsDialect) -> Result<Vec<String>> {
    let tree = parse(source, dialect)?;
    Ok(list_functions_in(tree.root_node(), source))
}

pub fn list_functions_in(root: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    collect_function_names(root, source, &mut names);
    names
}

/// Find the node to mutate for a named function: the declaration itself,
/// a method, or the function value bound by a `const`/`let`/`var`.
pub fn find_function<'t>(node: Node<'t>, name: &str, source: &str) -> Option<Node<'t>> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" | "method_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                if node_text(name_node, source) == name {
                    return Some(node);
                }
            }
        }
        "variable_declarator" => {
            if let (Some(name_node), Some(value)) =
                (node.child_by_field_name("name"), node.child_by_field_name("value"))
            {
                if node_text(name_node, source) == name && is_function_value(value.kind()) {
                    return Some(value);
                }
            }
        }
        _ => {}
    }

    let count = node.child_count();
    for i in 0..count {
        if let Some(child) = node.child(i) {
            if let Some(found) = find_function(child, name, source) {
                return Some(found);
            }
        }
    }
    None
}

fn is_function_value(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function" | "function_expression" | "generator_function"
    )
}

/// Every node kind that opens a new function scope.
pub fn is_function_node(kind: &str) -> bool {
    is_function_value(kind)
        || matches!(
            kind,
            "function_declaration" | "generator_function_declaration" | "method_definition"
        )
}

fn collect_function_names(node: Node, source: &str, names: &mut Vec<String>) {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                names.push(node_text(name_node, source).to_string());
            }
        }
        "method_definition" => {
            if let Some(name_node) = node.child_by_field_name("name") {
                let name = node_text(name_node, source);
                if name != "constructor" {
                    names.push(name.to_string());
                }
            }
        }
        "variable_declarator" => {
            if let (Some(name_node), Some(value)) =
                (node.child_by_field_name("name"), node.child_by_field_name("value"))
            {
                if is_function_value(value.kind()) {
                    names.push(node_text(name_node, source).to_string());
                }
            }
        }
        _ => {}
    }

    let count = node.child_count();
    for i in 0..count {
        if let Some(child) = node.child(i) {
            collect_function_names(child, source, names);
        }
    }
}

pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    &source[node.start_byte()..node.end_byte()]
}

/// Named children with comments filtered out.
pub fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// The contiguous run of comments directly in front of `node`, in source order.
pub fn leading_comments<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut comments = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(sibling) = current {
        if sibling.kind() != "comment" {
            break;
        }
        comments.push(sibling);
        current = sibling.prev_sibling();
    }
    comments.reverse();
    comments
}

/// Maps byte offsets to 1-based lines and 0-based byte columns.
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { line_starts }
    }

    pub fn position(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.line_starts[line])
    }
}
