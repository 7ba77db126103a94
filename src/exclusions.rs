//! Comment-driven exclusion of mutation rules.
//!
//! A comment directly in front of a node may carry `@excludeMutations`,
//! optionally followed by a list such as `['MATH', 'LITERAL']`. The listed
//! rules are switched off for that node and everything below it; the bare
//! marker switches off the whole catalog.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::Node;

use crate::parser_js::{leading_comments, node_text};
use crate::rules::RuleCode;

pub const MARKER: &str = "@excludeMutations";

/// Rule code to "is excluded". Children inherit their parent's set and may
/// only add to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusions(BTreeMap<RuleCode, bool>);

impl Exclusions {
    pub fn defaults() -> Self {
        Exclusions(
            RuleCode::ALL
                .into_iter()
                .map(|code| (code, code.excluded_by_default()))
                .collect(),
        )
    }

    /// Caller overrides may switch rules on as well as off.
    pub fn with_overrides(mut self, overrides: &BTreeMap<RuleCode, bool>) -> Self {
        self.0.extend(overrides.iter().map(|(code, excluded)| (*code, *excluded)));
        self
    }

    pub fn is_excluded(&self, code: RuleCode) -> bool {
        self.0.get(&code).copied().unwrap_or(false)
    }

    /// Parent set extended with local directives.
    pub fn extend(&self, local: &BTreeSet<RuleCode>) -> Self {
        if local.is_empty() {
            return self.clone();
        }
        let mut merged = self.0.clone();
        merged.extend(local.iter().map(|code| (*code, true)));
        Exclusions(merged)
    }

    pub fn excluded(&self) -> impl Iterator<Item = RuleCode> + '_ {
        self.0.iter().filter(|(_, excluded)| **excluded).map(|(code, _)| *code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Marker without a list
    All,
    /// Marker with a list; unknown or malformed entries already dropped
    Only(BTreeSet<RuleCode>),
}

impl Directive {
    pub fn codes(&self) -> BTreeSet<RuleCode> {
        match self {
            Directive::All => RuleCode::ALL.into_iter().collect(),
            Directive::Only(codes) => codes.clone(),
        }
    }
}

/// Rules excluded by the comments leading `node`.
pub fn local_exclusions(node: Node, source: &str) -> BTreeSet<RuleCode> {
    leading_comments(node)
        .into_iter()
        .filter_map(|comment| parse_directive(&comment_body(node_text(comment, source))))
        .flat_map(|directive| directive.codes())
        .collect()
}

/// Comment text without its delimiters. Block comment lines lose their
/// leading `*` and surrounding whitespace.
pub fn comment_body(raw: &str) -> String {
    if let Some(inner) = raw.strip_prefix("/*") {
        let inner = inner.strip_suffix("*/").unwrap_or(inner);
        inner
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim())
            .collect::<Vec<_>>()
            .join("\n")
    } else if let Some(inner) = raw.strip_prefix("//") {
        inner.trim().to_string()
    } else {
        raw.trim().to_string()
    }
}

/// `None` when the comment carries no marker.
pub fn parse_directive(body: &str) -> Option<Directive> {
    let at = body.find(MARKER)?;
    let rest = body[at + MARKER.len()..].trim_start();

    if !rest.starts_with('[') {
        return Some(Directive::All);
    }

    let Some(close) = rest.find(']') else {
        tracing::warn!("Unterminated rule list after {}: {}", MARKER, rest);
        return Some(Directive::Only(BTreeSet::new()));
    };
    let list = rest[..=close].replace('\'', "\"");

    let tokens: Vec<String> = match serde_json::from_str(&list) {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::warn!("Ignoring malformed rule list {}: {}", &rest[..=close], e);
            return Some(Directive::Only(BTreeSet::new()));
        }
    };

    let codes = tokens
        .iter()
        .filter_map(|token| match token.parse::<RuleCode>() {
            Ok(code) => Some(code),
            Err(e) => {
                tracing::warn!("{} in {} directive, ignoring it", e, MARKER);
                None
            }
        })
        .collect();
    Some(Directive::Only(codes))
}
