//! The tree walk that turns a parsed file into its list of mutations.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tree_sitter::{Node, Tree};

use crate::commands::{Command, CommandContext};
use crate::error::{MutatorError, Result};
use crate::exclusions::{self, Exclusions};
use crate::mutants::{Mutation, ROOT_MUTATION_ID};
use crate::parser_js::{self, JsDialect, LineIndex};
use crate::registry;
use crate::rules::RuleCode;
use crate::scope;

pub struct Mutator<'s> {
    source: &'s str,
    tree: Tree,
    parens: ParenTokens,
    function: Option<String>,
}

/// The unit of recursion.
struct Subtree<'t> {
    node: Node<'t>,
    parent_id: u64,
    excludes: Exclusions,
    loop_variables: BTreeSet<String>,
}

impl<'s> Mutator<'s> {
    pub fn new(source: &'s str, dialect: JsDialect) -> Result<Self> {
        let tree = parser_js::parse(source, dialect)?;
        let parens = ParenTokens::collect(tree.root_node(), source);
        Ok(Mutator { source, tree, parens, function: None })
    }

    /// Restrict the walk to one named function.
    pub fn scoped_to(mut self, function: &str) -> Result<Self> {
        if parser_js::find_function(self.tree.root_node(), function, self.source).is_none() {
            return Err(MutatorError::FunctionNotFound {
                name: function.to_string(),
                available: parser_js::list_functions_in(self.tree.root_node(), self.source),
            });
        }
        self.function = Some(function.to_string());
        Ok(self)
    }

    /// Every mutation of the file in pre-order. `overrides` switch rules on
    /// (`false`) or off (`true`) on top of the catalog defaults.
    pub fn collect_mutations(&self, overrides: &BTreeMap<RuleCode, bool>) -> Vec<Mutation> {
        let root = self
            .function
            .as_deref()
            .and_then(|name| parser_js::find_function(self.tree.root_node(), name, self.source))
            .unwrap_or_else(|| self.tree.root_node());

        let excludes = Exclusions::defaults()
            .with_overrides(overrides)
            .extend(&exclusions::local_exclusions(root, self.source));
        tracing::debug!(
            "Excluded rules at root: {:?}",
            excludes.excluded().map(RuleCode::as_str).collect::<Vec<_>>()
        );

        let mut sink = MutationSink::new(self.source, &self.parens);
        let mut stack = vec![Subtree {
            node: root,
            parent_id: ROOT_MUTATION_ID,
            excludes,
            loop_variables: BTreeSet::new(),
        }];

        while let Some(subtree) = stack.pop() {
            let mut command = registry::select_command(subtree.node, self.source);
            if command.code().is_some_and(|code| subtree.excludes.is_excluded(code)) {
                command = Command::Default;
            }

            let ctx = CommandContext {
                source: self.source,
                parent_id: subtree.parent_id,
                loop_variables: &subtree.loop_variables,
            };
            let children = command.execute(subtree.node, &ctx, &mut sink);

            // reversed so the stack pops them in source order
            for child in children.into_iter().rev() {
                let mut loop_variables = child
                    .loop_variables
                    .unwrap_or_else(|| subtree.loop_variables.clone());
                if parser_js::is_function_node(child.node.kind()) {
                    loop_variables = scope::remove_shadowed(child.node, self.source, &loop_variables);
                }
                let excludes = subtree
                    .excludes
                    .extend(&exclusions::local_exclusions(child.node, self.source));
                stack.push(Subtree {
                    node: child.node,
                    parent_id: child.parent_id,
                    excludes,
                    loop_variables,
                });
            }
        }

        tracing::debug!("Collected {} mutations", sink.mutations.len());
        sink.mutations
    }

    pub fn apply_mutation(&self, mutation: &Mutation) -> String {
        apply_mutation(self.source, mutation)
    }
}

/// `source[..begin] + replacement + source[end..]`.
///
/// Panics on a range outside the source: such a mutation is an engine bug.
pub fn apply_mutation(source: &str, mutation: &Mutation) -> String {
    assert!(
        mutation.begin <= mutation.end && mutation.end <= source.len(),
        "mutation {} spans {}..{} outside a source of {} bytes",
        mutation.id,
        mutation.begin,
        mutation.end,
        source.len()
    );
    assert!(
        source.is_char_boundary(mutation.begin) && source.is_char_boundary(mutation.end),
        "mutation {} splits a character",
        mutation.id
    );
    let mut result = String::with_capacity(source.len() + mutation.replacement.len());
    result.push_str(&source[..mutation.begin]);
    result.push_str(&mutation.replacement);
    result.push_str(&source[mutation.end..]);
    result
}

/// Collects emitted mutations for one walk and hands out their ids.
pub struct MutationSink<'a> {
    source: &'a str,
    parens: &'a ParenTokens,
    lines: LineIndex,
    next_id: u64,
    mutations: Vec<Mutation>,
    emitted: HashMap<(usize, usize, String), u64>,
}

impl<'a> MutationSink<'a> {
    fn new(source: &'a str, parens: &'a ParenTokens) -> Self {
        MutationSink {
            source,
            parens,
            lines: LineIndex::new(source),
            next_id: ROOT_MUTATION_ID + 1,
            mutations: Vec::new(),
            emitted: HashMap::new(),
        }
    }

    /// Record a replacement of `begin..end` and return its id. A replacement
    /// identical to an earlier one (a literal call argument reached again as
    /// a literal) is not recorded twice; the earlier id comes back instead.
    pub fn emit(
        &mut self,
        rule: RuleCode,
        begin: usize,
        end: usize,
        replacement: impl Into<String>,
        parent_id: u64,
    ) -> u64 {
        let (begin, end) = self.parens.calibrate(begin, end);
        let replacement = replacement.into();
        let key = (begin, end, replacement);
        if let Some(&id) = self.emitted.get(&key) {
            tracing::trace!("{} {}..{} duplicates mutation {}", rule, begin, end, id);
            return id;
        }

        let (line, column) = self.lines.position(begin);
        let id = self.next_id;
        self.next_id += 1;
        self.mutations.push(Mutation {
            id,
            parent_id,
            rule,
            begin,
            end,
            line,
            column,
            original: self.source[begin..end].to_string(),
            replacement: key.2.clone(),
        });
        self.emitted.insert(key, id);
        id
    }
}

/// Offsets of the parenthesis tokens in the file.
#[derive(Debug, Default)]
pub struct ParenTokens {
    close_starts: BTreeSet<usize>,
    open_ends: BTreeSet<usize>,
}

impl ParenTokens {
    pub fn collect(root: Node, source: &str) -> Self {
        let mut parens = ParenTokens::default();
        let mut cursor = root.walk();
        let mut descend = true;
        loop {
            if descend && cursor.goto_first_child() {
                continue;
            }
            let node = cursor.node();
            if !node.is_named() {
                match &source[node.start_byte()..node.end_byte()] {
                    "(" => {
                        parens.open_ends.insert(node.end_byte());
                    }
                    ")" => {
                        parens.close_starts.insert(node.start_byte());
                    }
                    _ => {}
                }
            }
            if cursor.goto_next_sibling() {
                descend = true;
                continue;
            }
            if !cursor.goto_parent() {
                break;
            }
            descend = false;
        }
        parens
    }

    /// Keep a span from starting on a `)` or ending just past a `(`, so a
    /// mutation never takes one half of a parenthesis pair.
    ///
    /// Every span the commands build covers whole nodes or operator tokens,
    /// and tree-sitter nodes own their parentheses, so this only changes a
    /// span that would otherwise cut a pair in two. It leaves all others
    /// untouched.
    pub fn calibrate(&self, mut begin: usize, mut end: usize) -> (usize, usize) {
        if begin < end && self.close_starts.contains(&begin) {
            begin += 1;
        }
        if begin < end && self.open_ends.contains(&end) {
            end -= 1;
        }
        (begin, end)
    }
}
