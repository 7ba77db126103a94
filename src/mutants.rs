use serde::{Deserialize, Serialize};

use crate::rules::RuleCode;

/// Parent id of every mutation emitted directly under the root cursor.
pub const ROOT_MUTATION_ID: u64 = 0;

/// A bounded text replacement over the original source.
///
/// `begin`/`end` are byte offsets into the unmodified source, never into a
/// previously mutated copy. `line` is 1-based, `column` is a 0-based byte column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub id: u64,
    pub parent_id: u64,
    pub rule: RuleCode,
    pub begin: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub original: String,
    pub replacement: String,
}

impl Mutation {
    /// The `<file>:<line>:<col>` prefix used when reporting this mutation.
    pub fn location(&self, file: &str) -> String {
        format!("{}:{}:{}", file, self.line, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MutationOutcome {
    /// Tests passed despite the mutation
    Survived,
    /// Tests caught the mutation
    Killed,
    /// The runner failed for this mutant
    Error,
    /// Unrecoverable, e.g. a suspected infinite loop
    Fatal,
}

#[derive(Debug, Clone)]
pub struct MutantResult {
    pub mutation: Mutation,
    pub outcome: MutationOutcome,
    pub duration_ms: u64,
    pub diff: String,
}
