//! One mutation command per syntactic category.
//!
//! A command emits its mutations for the node it is given and hands back the
//! child subtrees the walk should continue into. Commands keep no state of
//! their own; ids come from the [`MutationSink`] of the current walk.

use std::collections::BTreeSet;

use tree_sitter::Node;

use crate::mutator::MutationSink;
use crate::operators;
use crate::parser_js::{named_children, node_text};
use crate::rules::RuleCode;
use crate::scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BlockStatement,
    Loop,
    ForLoop,
    Assignment,
    MethodCall,
    Object,
    Array,
    Math,
    Comparison,
    Logical,
    Unary,
    Update,
    Literal,
    /// Recurse into every child, emit nothing
    Default,
}

/// Ambient state a command runs under.
pub struct CommandContext<'a> {
    pub source: &'a str,
    pub parent_id: u64,
    pub loop_variables: &'a BTreeSet<String>,
}

/// A subtree to continue the walk into.
#[derive(Debug)]
pub struct ChildNode<'t> {
    pub node: Node<'t>,
    pub parent_id: u64,
    /// `None` inherits the current loop variables
    pub loop_variables: Option<BTreeSet<String>>,
}

impl<'t> ChildNode<'t> {
    pub fn new(node: Node<'t>, parent_id: u64) -> Self {
        ChildNode { node, parent_id, loop_variables: None }
    }

    fn protecting(node: Node<'t>, parent_id: u64, loop_variables: BTreeSet<String>) -> Self {
        ChildNode { node, parent_id, loop_variables: Some(loop_variables) }
    }
}

impl Command {
    /// Rule code the command can be excluded by. Loop, assignment and the
    /// fallthrough only steer the walk and cannot be switched off.
    pub fn code(self) -> Option<RuleCode> {
        match self {
            Command::BlockStatement => Some(RuleCode::BlockStatement),
            Command::MethodCall => Some(RuleCode::MethodCall),
            Command::Object => Some(RuleCode::Object),
            Command::Array => Some(RuleCode::Array),
            Command::Math => Some(RuleCode::Math),
            Command::Comparison => Some(RuleCode::Comparison),
            Command::Logical => Some(RuleCode::LogicalExpression),
            Command::Unary => Some(RuleCode::UnaryExpression),
            Command::Update => Some(RuleCode::UpdateExpression),
            Command::Literal => Some(RuleCode::Literal),
            Command::Loop | Command::ForLoop | Command::Assignment | Command::Default => None,
        }
    }

    pub fn execute<'t>(
        self,
        node: Node<'t>,
        ctx: &CommandContext,
        sink: &mut MutationSink,
    ) -> Vec<ChildNode<'t>> {
        match self {
            Command::BlockStatement => block_statement(node, ctx, sink),
            Command::Loop => while_loop(node, ctx),
            Command::ForLoop => for_loop(node, ctx),
            Command::Assignment => assignment(node, ctx),
            Command::MethodCall => method_call(node, ctx, sink),
            Command::Object => object(node, ctx, sink),
            Command::Array => array(node, ctx, sink),
            Command::Math => binary_operator(node, ctx, sink, RuleCode::Math),
            Command::Comparison => binary_operator(node, ctx, sink, RuleCode::Comparison),
            Command::Logical => binary_operator(node, ctx, sink, RuleCode::LogicalExpression),
            Command::Unary => unary(node, ctx, sink),
            Command::Update => update(node, ctx, sink),
            Command::Literal => literal(node, ctx, sink),
            Command::Default => fallthrough(node, ctx),
        }
    }
}

fn fallthrough<'t>(node: Node<'t>, ctx: &CommandContext) -> Vec<ChildNode<'t>> {
    named_children(node)
        .into_iter()
        .map(|child| ChildNode::new(child, ctx.parent_id))
        .collect()
}

/// Delete each statement; the statement's own subtree hangs off its deletion.
fn block_statement<'t>(
    node: Node<'t>,
    ctx: &CommandContext,
    sink: &mut MutationSink,
) -> Vec<ChildNode<'t>> {
    let mut children = Vec::new();
    for statement in named_children(node) {
        if matches!(statement.kind(), "empty_statement" | "hash_bang_line") {
            continue;
        }
        let id = sink.emit(
            RuleCode::BlockStatement,
            statement.start_byte(),
            statement.end_byte(),
            "",
            ctx.parent_id,
        );
        children.push(ChildNode::new(statement, id));
    }
    children
}

/// `while`/`do ... while`: only the body is walked, with everything the test
/// reads protected.
fn while_loop<'t>(node: Node<'t>, ctx: &CommandContext) -> Vec<ChildNode<'t>> {
    let mut protected = ctx.loop_variables.clone();
    if let Some(test) = node.child_by_field_name("condition") {
        protected.extend(scope::loop_variables(test, ctx.source));
    }
    node.child_by_field_name("body")
        .map(|body| ChildNode::protecting(body, ctx.parent_id, protected))
        .into_iter()
        .collect()
}

/// `for (init; test; update)`: the test and update clauses are never walked.
fn for_loop<'t>(node: Node<'t>, ctx: &CommandContext) -> Vec<ChildNode<'t>> {
    let mut protected = ctx.loop_variables.clone();
    let mut cursor = node.walk();
    for test in node.children_by_field_name("condition", &mut cursor) {
        protected.extend(scope::loop_variables(test, ctx.source));
    }

    let mut children = Vec::new();
    let mut cursor = node.walk();
    for init in node.children_by_field_name("initializer", &mut cursor) {
        if init.is_named() && init.kind() != "empty_statement" {
            children.push(ChildNode::protecting(init, ctx.parent_id, protected.clone()));
        }
    }
    if let Some(body) = node.child_by_field_name("body") {
        children.push(ChildNode::protecting(body, ctx.parent_id, protected));
    }
    children
}

/// A write to a protected loop variable stops the walk for the whole
/// assignment.
fn assignment<'t>(node: Node<'t>, ctx: &CommandContext) -> Vec<ChildNode<'t>> {
    if let Some(left) = node.child_by_field_name("left") {
        if left.kind() == "identifier" && ctx.loop_variables.contains(node_text(left, ctx.source)) {
            tracing::debug!(
                "Not mutating write to loop variable '{}'",
                node_text(left, ctx.source)
            );
            return vec![];
        }
    }
    fallthrough(node, ctx)
}

fn method_call<'t>(
    node: Node<'t>,
    ctx: &CommandContext,
    sink: &mut MutationSink,
) -> Vec<ChildNode<'t>> {
    let mut children = Vec::new();
    let callee = node.child_by_field_name("function");
    if let Some(callee) = callee {
        children.push(ChildNode::new(callee, ctx.parent_id));
    }

    let args = match node.child_by_field_name("arguments") {
        Some(list) if list.kind() == "arguments" => named_children(list),
        // tagged template: nothing to replace, just walk it
        Some(template) => {
            children.push(ChildNode::new(template, ctx.parent_id));
            vec![]
        }
        None => vec![],
    };

    // a literal argument reached again by the walk emits the same change;
    // the sink keeps only the first
    for arg in &args {
        let replacement = operators::literal_replacement(arg.kind(), node_text(*arg, ctx.source))
            .unwrap_or_else(|| operators::SENTINEL.to_string());
        let id = sink.emit(
            RuleCode::MethodCall,
            arg.start_byte(),
            arg.end_byte(),
            replacement,
            ctx.parent_id,
        );
        children.push(ChildNode::new(*arg, id));
    }

    if let [only] = args.as_slice() {
        if only.kind() != "spread_element" {
            sink.emit(
                RuleCode::MethodCall,
                node.start_byte(),
                node.end_byte(),
                node_text(*only, ctx.source),
                ctx.parent_id,
            );
        }
    }

    if let Some(receiver) = callee
        .filter(|callee| callee.kind() == "member_expression")
        .and_then(|member| member.child_by_field_name("object"))
    {
        sink.emit(
            RuleCode::MethodCall,
            node.start_byte(),
            node.end_byte(),
            node_text(receiver, ctx.source),
            ctx.parent_id,
        );
    }

    children
}

/// Delete each `key: value` (or shorthand) property up to the start of the
/// next one, taking the separating comma with it.
fn object<'t>(node: Node<'t>, ctx: &CommandContext, sink: &mut MutationSink) -> Vec<ChildNode<'t>> {
    let properties = named_children(node);
    let mut children = Vec::new();
    for (i, property) in properties.iter().enumerate() {
        if !matches!(property.kind(), "pair" | "shorthand_property_identifier") {
            children.push(ChildNode::new(*property, ctx.parent_id));
            continue;
        }
        let end = properties
            .get(i + 1)
            .map(|next| next.start_byte())
            .unwrap_or_else(|| property.end_byte());
        let id = sink.emit(RuleCode::Object, property.start_byte(), end, "", ctx.parent_id);
        if let Some(value) = property.child_by_field_name("value") {
            children.push(ChildNode::new(value, id));
        }
    }
    children
}

fn array<'t>(node: Node<'t>, ctx: &CommandContext, sink: &mut MutationSink) -> Vec<ChildNode<'t>> {
    let elements = named_children(node);
    let mut children = Vec::new();
    for (i, element) in elements.iter().enumerate() {
        let end = elements
            .get(i + 1)
            .map(|next| next.start_byte())
            .unwrap_or_else(|| element.end_byte());
        let id = sink.emit(RuleCode::Array, element.start_byte(), end, "", ctx.parent_id);
        children.push(ChildNode::new(*element, id));
    }
    children
}

/// Math, comparison and logical operators: swap the operator token, keep
/// walking both operands.
fn binary_operator<'t>(
    node: Node<'t>,
    ctx: &CommandContext,
    sink: &mut MutationSink,
    rule: RuleCode,
) -> Vec<ChildNode<'t>> {
    if let Some(op) = node.child_by_field_name("operator") {
        let text = node_text(op, ctx.source);
        let ops = match rule {
            RuleCode::Comparison => operators::comparison_mutations(text),
            RuleCode::Math => operators::math_mutation(text).into_iter().collect(),
            _ => operators::logical_mutation(text).into_iter().collect(),
        };
        for replacement in ops {
            sink.emit(rule, op.start_byte(), op.end_byte(), replacement, ctx.parent_id);
        }
    }

    ["left", "right"]
        .into_iter()
        .filter_map(|field| node.child_by_field_name(field))
        .map(|operand| ChildNode::new(operand, ctx.parent_id))
        .collect()
}

fn unary<'t>(node: Node<'t>, ctx: &CommandContext, sink: &mut MutationSink) -> Vec<ChildNode<'t>> {
    if let Some(op) = node.child_by_field_name("operator") {
        sink.emit(RuleCode::UnaryExpression, op.start_byte(), op.end_byte(), "", ctx.parent_id);
    }
    vec![]
}

/// `++`/`--` flip. The operator sits before the operand in prefix form and
/// after it in postfix form; the span is the operator token either way.
fn update<'t>(node: Node<'t>, ctx: &CommandContext, sink: &mut MutationSink) -> Vec<ChildNode<'t>> {
    let Some(op) = node.child_by_field_name("operator") else {
        return vec![];
    };
    if let Some(argument) = node.child_by_field_name("argument") {
        if argument.kind() == "identifier"
            && ctx.loop_variables.contains(node_text(argument, ctx.source))
        {
            tracing::debug!(
                "Not flipping {} on loop variable '{}'",
                node_text(op, ctx.source),
                node_text(argument, ctx.source)
            );
            return vec![];
        }
    }
    if let Some(flip) = operators::update_mutation(node_text(op, ctx.source)) {
        sink.emit(
            RuleCode::UpdateExpression,
            op.start_byte(),
            op.end_byte(),
            flip,
            ctx.parent_id,
        );
    }
    vec![]
}

fn literal<'t>(node: Node<'t>, ctx: &CommandContext, sink: &mut MutationSink) -> Vec<ChildNode<'t>> {
    if let Some(replacement) = operators::literal_replacement(node.kind(), node_text(node, ctx.source)) {
        sink.emit(RuleCode::Literal, node.start_byte(), node.end_byte(), replacement, ctx.parent_id);
    }
    vec![]
}
