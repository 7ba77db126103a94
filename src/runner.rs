use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use regex::Regex;

use crate::error::{MutatorError, Result, RunnerError};
use crate::mutants::{MutantResult, Mutation, MutationOutcome};
use crate::mutator::Mutator;
use crate::parser_js::JsDialect;
use crate::rules::RuleCode;
use crate::safety::RestoreGuard;

/// Runs the test suite against the file as it currently is on disk.
///
/// Must resolve before `deadline` passes; running over should come back as
/// `Error` or `Fatal`.
pub trait TestRunner {
    fn run(&mut self, mutated_file: &Path, deadline: Instant) -> std::result::Result<MutationOutcome, RunnerError>;
}

impl<F> TestRunner for F
where
    F: FnMut(&Path, Instant) -> std::result::Result<MutationOutcome, RunnerError>,
{
    fn run(&mut self, mutated_file: &Path, deadline: Instant) -> std::result::Result<MutationOutcome, RunnerError> {
        self(mutated_file, deadline)
    }
}

pub struct RunOptions {
    /// Detected from the file extension when `None`
    pub dialect: Option<JsDialect>,
    pub function: Option<String>,
    pub exclude_mutations: BTreeMap<RuleCode, bool>,
    /// Mutations whose replaced text matches any of these are skipped
    pub ignore: Vec<Regex>,
    pub timeout: Duration,
    pub abort_on_fatal: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            dialect: None,
            function: None,
            exclude_mutations: BTreeMap::new(),
            ignore: Vec::new(),
            timeout: Duration::from_secs(10),
            abort_on_fatal: false,
        }
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub file: PathBuf,
    pub results: Vec<MutantResult>,
    pub ignored: usize,
    /// Stopped early after a fatal outcome
    pub aborted: bool,
}

impl FileReport {
    pub fn count(&self, outcome: MutationOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn survivors(&self) -> impl Iterator<Item = &MutantResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == MutationOutcome::Survived)
    }

    /// Killed share of the mutants that ran to a verdict.
    pub fn score(&self) -> f64 {
        let killed = self.count(MutationOutcome::Killed);
        let decided = killed + self.count(MutationOutcome::Survived);
        if decided > 0 {
            killed as f64 / decided as f64
        } else {
            1.0
        }
    }
}

/// Mutate `path` in place one mutation at a time, run the tests against
/// each mutant and put the original text back after every run.
pub fn test_file<R>(path: &Path, options: &RunOptions, runner: &mut R) -> Result<FileReport>
where
    R: TestRunner + ?Sized,
{
    let original = std::fs::read_to_string(path).map_err(|source| MutatorError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let dialect = options
        .dialect
        .or_else(|| JsDialect::from_path(path))
        .ok_or_else(|| MutatorError::UnsupportedFile { path: path.to_path_buf() })?;

    let mut mutator = Mutator::new(&original, dialect)?;
    if let Some(function) = &options.function {
        mutator = mutator.scoped_to(function)?;
    }
    let mutations = mutator.collect_mutations(&options.exclude_mutations);
    tracing::debug!("{}: {} mutations", path.display(), mutations.len());

    let file_label = path.display().to_string();
    let mut report = FileReport {
        file: path.to_path_buf(),
        results: Vec::with_capacity(mutations.len()),
        ignored: 0,
        aborted: false,
    };
    if mutations.is_empty() {
        return Ok(report);
    }

    let guard = RestoreGuard::new(path, &original)?;

    for mutation in mutations {
        if let Some(pattern) = options.ignore.iter().find(|p| p.is_match(&mutation.original)) {
            tracing::debug!(
                "Ignoring {} [{}] {:?}: matches /{}/",
                mutation.location(&file_label),
                mutation.rule,
                mutation.original,
                pattern
            );
            report.ignored += 1;
            continue;
        }

        let mutated = mutator.apply_mutation(&mutation);
        let start = Instant::now();
        let outcome = run_mutant(path, &mutated, &mutation, &file_label, start + options.timeout, runner);
        guard.restore()?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if outcome == MutationOutcome::Survived {
            tracing::info!("{} can be removed.", mutation.location(&file_label));
        }

        report.results.push(MutantResult {
            diff: generate_diff(&original, &mutated),
            mutation,
            outcome,
            duration_ms,
        });

        if outcome == MutationOutcome::Fatal && options.abort_on_fatal {
            tracing::warn!("{}: fatal test run, skipping the remaining mutations", file_label);
            report.aborted = true;
            break;
        }
    }

    guard.finish()?;
    Ok(report)
}

fn run_mutant<R>(
    path: &Path,
    mutated: &str,
    mutation: &Mutation,
    file_label: &str,
    deadline: Instant,
    runner: &mut R,
) -> MutationOutcome
where
    R: TestRunner + ?Sized,
{
    if let Err(e) = std::fs::write(path, mutated) {
        tracing::warn!("{}: could not write mutant: {}", mutation.location(file_label), e);
        return MutationOutcome::Error;
    }
    match runner.run(path, deadline) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("{} [{}]: {}", mutation.location(file_label), mutation.rule, e);
            e.outcome()
        }
    }
}

pub enum BaselineResult {
    Ok { duration_ms: u64 },
    Failed(String),
}

/// Runs an external test command, e.g. `npx jest --bail`.
pub struct CommandRunner {
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
}

impl CommandRunner {
    pub fn new(test_cmd: &str, extra_args: &[String], working_dir: &Path) -> Self {
        let (program, mut args) = parse_test_cmd(test_cmd);
        args.extend(extra_args.iter().cloned());
        CommandRunner {
            program: resolve_program(&program, working_dir),
            args,
            working_dir: working_dir.to_path_buf(),
        }
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the suite against the unmodified source.
    pub fn baseline(&mut self, timeout: Duration) -> BaselineResult {
        let start = Instant::now();
        match self.wait(start + timeout) {
            Ok(Finished::Exited { success: true, .. }) => BaselineResult::Ok {
                duration_ms: start.elapsed().as_millis() as u64,
            },
            Ok(Finished::Exited { output, .. }) => BaselineResult::Failed(output),
            Ok(Finished::TimedOut) => BaselineResult::Failed(format!(
                "'{}' did not finish within {:?}",
                self.command_line(),
                timeout
            )),
            Err(e) => BaselineResult::Failed(e.to_string()),
        }
    }

    fn spawn(&self) -> std::result::Result<Child, RunnerError> {
        Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                command: self.command_line(),
                source,
            })
    }

    fn wait(&self, deadline: Instant) -> std::result::Result<Finished, RunnerError> {
        let mut child = self.spawn()?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let stdout = stdout.join().unwrap_or_default();
                    let stderr = stderr.join().unwrap_or_default();
                    return Ok(Finished::Exited {
                        success: status.success(),
                        output: format!("{}\n{}", stdout, stderr),
                    });
                }
                Ok(None) => {
                    if Instant::now() > deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Ok(Finished::TimedOut);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    let _ = child.kill();
                    return Err(RunnerError::Failed(format!("waiting on test command: {}", e)));
                }
            }
        }
    }
}

enum Finished {
    Exited { success: bool, output: String },
    TimedOut,
}

impl TestRunner for CommandRunner {
    fn run(&mut self, _mutated_file: &Path, deadline: Instant) -> std::result::Result<MutationOutcome, RunnerError> {
        match self.wait(deadline)? {
            Finished::Exited { success: true, .. } => Ok(MutationOutcome::Survived),
            // the mutant does not even parse
            Finished::Exited { output, .. } if output.contains("SyntaxError") => {
                Ok(MutationOutcome::Error)
            }
            Finished::Exited { .. } => Ok(MutationOutcome::Killed),
            Finished::TimedOut => Err(RunnerError::Fatal(format!(
                "'{}' timed out, possible infinite loop",
                self.command_line()
            ))),
        }
    }
}

/// Read a child pipe to the end on its own thread so a chatty test suite
/// cannot block on a full pipe.
fn drain<P: Read + Send + 'static>(pipe: Option<P>) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

pub fn parse_test_cmd(cmd: &str) -> (String, Vec<String>) {
    let parts: Vec<&str> = cmd.split_whitespace().collect();
    if parts.len() > 1 {
        (parts[0].to_string(), parts[1..].iter().map(|s| s.to_string()).collect())
    } else {
        (cmd.to_string(), vec![])
    }
}

/// A relative program path (`node_modules/.bin/jest`) is taken from the
/// current directory first, then the working directory; bare names go
/// through PATH.
fn resolve_program(program: &str, working_dir: &Path) -> String {
    let p = Path::new(program);
    if p.is_absolute() || !program.contains('/') {
        return program.to_string();
    }
    if let Ok(cwd) = std::env::current_dir() {
        let from_cwd = cwd.join(p);
        if from_cwd.exists() {
            return from_cwd.to_string_lossy().to_string();
        }
    }
    let from_wd = working_dir.join(p);
    if from_wd.exists() {
        return from_wd.to_string_lossy().to_string();
    }
    program.to_string()
}

pub fn generate_diff(original: &str, mutated: &str) -> String {
    use similar::TextDiff;
    let diff = TextDiff::from_lines(original, mutated);
    let mut output = String::new();
    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                output.push_str(&format!("- {}", change));
            }
            similar::ChangeTag::Insert => {
                output.push_str(&format!("+ {}", change));
            }
            _ => {}
        }
    }
    output
}
