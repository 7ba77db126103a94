//! Error types for the mutation engine and its test-runner collaborators

use std::path::PathBuf;
use thiserror::Error;

use crate::mutants::MutationOutcome;

/// Errors surfaced to the caller of the engine
#[derive(Debug, Error)]
pub enum MutatorError {
    /// Source file could not be read
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mutated or restored file could not be written
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The original text could not be put back after a mutation
    #[error("Failed to restore '{}' (backup kept at '{}'): {source}", path.display(), backup.display())]
    Restore {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The grammar could not be loaded into the parser
    #[error("Failed to load grammar: {0}")]
    Grammar(#[from] tree_sitter::LanguageError),

    /// Source text is not syntactically valid
    #[error("Syntax error at line {line}, column {column}")]
    Parse { line: usize, column: usize },

    /// File extension does not map to a supported dialect
    #[error("Unsupported file type: {}. Supported: .js, .mjs, .cjs, .ts, .mts, .cts, .tsx, .jsx", path.display())]
    UnsupportedFile { path: PathBuf },

    /// `--function` named something that does not exist
    #[error("Function '{name}' not found. Available: {}", available.join(", "))]
    FunctionNotFound { name: String, available: Vec<String> },

    /// An ignore pattern is not a valid regular expression
    #[error("Invalid ignore pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Failure signalled by a test runner for a single mutant
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The test command could not be started
    #[error("Failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The runner failed but later mutants may still be tested
    #[error("Test runner error: {0}")]
    Failed(String),

    /// The runner hit a condition it cannot recover from
    #[error("Fatal test runner error: {0}")]
    Fatal(String),
}

impl RunnerError {
    /// Outcome a mutant is classified as when the runner fails this way.
    pub fn outcome(&self) -> MutationOutcome {
        match self {
            RunnerError::Spawn { .. } | RunnerError::Failed(_) => MutationOutcome::Error,
            RunnerError::Fatal(_) => MutationOutcome::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, MutatorError>;
