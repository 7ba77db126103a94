//! Selection of the mutation command for a syntax node.
//!
//! Node shapes overlap (a call's callee may be an object, a binary
//! expression is only a comparison for some operators), so the predicates
//! are tried in a fixed order and the first match wins.

use tree_sitter::Node;

use crate::commands::Command;
use crate::operators;
use crate::parser_js::node_text;
use crate::rules::RuleCode;

type Predicate = fn(Node, &str) -> bool;

const REGISTRY: &[(Predicate, Command)] = &[
    (has_statement_list, Command::BlockStatement),
    (is_while_loop, Command::Loop),
    (is_for_loop, Command::ForLoop),
    (is_assignment, Command::Assignment),
    (is_call, Command::MethodCall),
    (is_object, Command::Object),
    (is_array, Command::Array),
    (is_math, Command::Math),
    (is_comparison, Command::Comparison),
    (is_logical, Command::Logical),
    (is_unary, Command::Unary),
    (is_update, Command::Update),
    (is_literal, Command::Literal),
];

/// First command whose predicate accepts `node`, or the pure-recursion
/// fallthrough.
pub fn select_command(node: Node, source: &str) -> Command {
    REGISTRY
        .iter()
        .find(|(matches, _)| matches(node, source))
        .map(|(_, command)| *command)
        .unwrap_or(Command::Default)
}

/// Every code a command in the registry can carry.
pub fn rule_codes() -> impl Iterator<Item = RuleCode> {
    REGISTRY.iter().filter_map(|(_, command)| command.code())
}

fn has_statement_list(node: Node, _: &str) -> bool {
    matches!(node.kind(), "program" | "statement_block")
}

fn is_while_loop(node: Node, _: &str) -> bool {
    matches!(node.kind(), "while_statement" | "do_statement")
}

fn is_for_loop(node: Node, _: &str) -> bool {
    node.kind() == "for_statement"
}

fn is_assignment(node: Node, _: &str) -> bool {
    matches!(node.kind(), "assignment_expression" | "augmented_assignment_expression")
}

fn is_call(node: Node, _: &str) -> bool {
    node.kind() == "call_expression"
}

fn is_object(node: Node, _: &str) -> bool {
    node.kind() == "object"
}

fn is_array(node: Node, _: &str) -> bool {
    node.kind() == "array"
}

fn binary_operator<'a>(node: Node, source: &'a str) -> Option<&'a str> {
    if node.kind() != "binary_expression" {
        return None;
    }
    node.child_by_field_name("operator")
        .map(|op| node_text(op, source))
}

fn is_math(node: Node, source: &str) -> bool {
    binary_operator(node, source).is_some_and(|op| operators::math_mutation(op).is_some())
}

fn is_comparison(node: Node, source: &str) -> bool {
    binary_operator(node, source).is_some_and(operators::is_comparison)
}

fn is_logical(node: Node, source: &str) -> bool {
    binary_operator(node, source).is_some_and(|op| operators::logical_mutation(op).is_some())
}

fn is_unary(node: Node, source: &str) -> bool {
    node.kind() == "unary_expression"
        && node
            .child_by_field_name("operator")
            .is_some_and(|op| operators::is_strippable_unary(node_text(op, source)))
}

fn is_update(node: Node, _: &str) -> bool {
    node.kind() == "update_expression"
}

/// Module specifiers and TypeScript literal types are literals in the tree
/// but changing them only breaks the import or the type check.
fn is_literal(node: Node, _: &str) -> bool {
    if !operators::is_literal_kind(node.kind()) {
        return false;
    }
    let Some(parent) = node.parent() else {
        return true;
    };
    match parent.kind() {
        "literal_type" => false,
        "import_statement" | "export_statement" | "import_require_clause" => {
            parent.child_by_field_name("source") != Some(node)
        }
        _ => true,
    }
}
