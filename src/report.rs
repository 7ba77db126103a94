use serde::{Deserialize, Serialize};

use crate::mutants::MutationOutcome;
use crate::rules::RuleCode;
use crate::runner::FileReport;

#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub file: String,
    pub score: f64,
    pub total: usize,
    pub killed: usize,
    pub survived: usize,
    pub errors: usize,
    pub fatal: usize,
    pub ignored: usize,
    pub aborted: bool,
    pub duration_ms: u64,
    pub survived_mutants: Vec<SurvivedMutant>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SurvivedMutant {
    pub id: u64,
    pub parent_id: u64,
    pub rule: RuleCode,
    pub line: usize,
    /// 1-based
    pub column: usize,
    pub original: String,
    pub replacement: String,
    pub diff: String,
}

impl RunReport {
    pub fn from_file_report(report: &FileReport, display_file: &str) -> Self {
        RunReport {
            file: display_file.to_string(),
            score: report.score(),
            total: report.results.len(),
            killed: report.count(MutationOutcome::Killed),
            survived: report.count(MutationOutcome::Survived),
            errors: report.count(MutationOutcome::Error),
            fatal: report.count(MutationOutcome::Fatal),
            ignored: report.ignored,
            aborted: report.aborted,
            duration_ms: report.results.iter().map(|r| r.duration_ms).sum(),
            survived_mutants: report
                .survivors()
                .map(|r| SurvivedMutant {
                    id: r.mutation.id,
                    parent_id: r.mutation.parent_id,
                    rule: r.mutation.rule,
                    line: r.mutation.line,
                    column: r.mutation.column + 1,
                    original: r.mutation.original.clone(),
                    replacement: r.mutation.replacement.clone(),
                    diff: r.diff.clone(),
                })
                .collect(),
        }
    }
}
