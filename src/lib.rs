pub mod commands;
pub mod config;
pub mod error;
pub mod exclusions;
pub mod mutants;
pub mod mutator;
pub mod operators;
pub mod output;
pub mod parser_js;
pub mod registry;
pub mod report;
pub mod rules;
pub mod runner;
pub mod safety;
pub mod scope;

pub use error::{MutatorError, RunnerError};
pub use mutants::{Mutation, MutationOutcome};
pub use mutator::{Mutator, apply_mutation};
pub use parser_js::JsDialect;
pub use rules::RuleCode;
