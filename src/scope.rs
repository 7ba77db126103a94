//! Loop-variable protection.
//!
//! Identifiers read by a loop's test are protected so that no mutant writes
//! to them and turns the loop into one that never ends. A protected name
//! that a nested function declares for itself is a different variable in
//! there and gets released again.

use std::collections::BTreeSet;

use tree_sitter::Node;

use crate::parser_js::{is_function_node, named_children, node_text};

/// Every identifier referenced in `test`.
pub fn loop_variables(test: Node, source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_identifiers(test, source, &mut names);
    names
}

fn collect_identifiers(node: Node, source: &str, names: &mut BTreeSet<String>) {
    if node.kind() == "identifier" {
        names.insert(node_text(node, source).to_string());
        return;
    }
    for child in named_children(node) {
        collect_identifiers(child, source, names);
    }
}

/// `protected` minus the names `function` re-declares in its own scope.
pub fn remove_shadowed(
    function: Node,
    source: &str,
    protected: &BTreeSet<String>,
) -> BTreeSet<String> {
    if protected.is_empty() {
        return BTreeSet::new();
    }
    let declared = declared_names(function, source);
    let remaining: BTreeSet<String> = protected.difference(&declared).cloned().collect();
    if remaining.len() != protected.len() {
        tracing::debug!(
            "Releasing shadowed loop variables {:?}",
            protected.intersection(&declared).collect::<Vec<_>>()
        );
    }
    remaining
}

/// Parameters plus every declarator anywhere in the body, stopping at
/// nested functions (their own names still count, their insides do not).
pub fn declared_names(function: Node, source: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    if let Some(params) = function
        .child_by_field_name("parameters")
        .or_else(|| function.child_by_field_name("parameter"))
    {
        collect_pattern_names(params, source, &mut names);
    }
    if let Some(body) = function.child_by_field_name("body") {
        collect_declarations(body, source, &mut names);
    }
    names
}

fn collect_declarations(node: Node, source: &str, names: &mut BTreeSet<String>) {
    match node.kind() {
        "variable_declarator" => {
            if let Some(name) = node.child_by_field_name("name") {
                collect_pattern_names(name, source, names);
            }
            if let Some(value) = node.child_by_field_name("value") {
                collect_declarations(value, source, names);
            }
            return;
        }
        "function_declaration" | "generator_function_declaration" | "class_declaration" => {
            if let Some(name) = node.child_by_field_name("name") {
                names.insert(node_text(name, source).to_string());
            }
        }
        _ => {}
    }
    if is_function_node(node.kind()) {
        return;
    }
    for child in named_children(node) {
        collect_declarations(child, source, names);
    }
}

/// Binding names in a parameter list or destructuring pattern.
fn collect_pattern_names(node: Node, source: &str, names: &mut BTreeSet<String>) {
    match node.kind() {
        "identifier" | "shorthand_property_identifier_pattern" => {
            names.insert(node_text(node, source).to_string());
        }
        "assignment_pattern" | "object_assignment_pattern" => {
            if let Some(left) = node.child_by_field_name("left") {
                collect_pattern_names(left, source, names);
            }
        }
        "pair_pattern" => {
            if let Some(value) = node.child_by_field_name("value") {
                collect_pattern_names(value, source, names);
            }
        }
        // TypeScript wraps each parameter
        "required_parameter" | "optional_parameter" => {
            if let Some(pattern) = node.child_by_field_name("pattern") {
                collect_pattern_names(pattern, source, names);
            }
        }
        "formal_parameters" | "object_pattern" | "array_pattern" | "rest_pattern" => {
            for child in named_children(node) {
                collect_pattern_names(child, source, names);
            }
        }
        _ => {}
    }
}
