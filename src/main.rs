use jsmutator::config::Config;
use jsmutator::output;
use jsmutator::parser_js::{self, JsDialect};
use jsmutator::report::RunReport;
use jsmutator::runner::{self, BaselineResult, CommandRunner};
use jsmutator::safety;
use jsmutator::{MutatorError, RuleCode};

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use regex::Regex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jsmutator", version, about = "Mutation testing for JavaScript and TypeScript")]
struct Cli {
    /// Only warnings and errors on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mutate a source file and run the tests against every mutant
    Run {
        /// Source file to mutate
        file: PathBuf,
        /// Test file appended to the test command
        #[arg(short, long)]
        test: Option<PathBuf>,
        /// Function name to scope mutations to
        #[arg(short, long)]
        function: Option<String>,
        /// Test command (default: from config, else `npm test`)
        #[arg(long, env = "JSMUTATOR_TEST_CMD")]
        test_cmd: Option<String>,
        /// Config file (default: ./mutator.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Per-mutant timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Timeout multiplier over the baseline run when no timeout is set
        #[arg(long, default_value = "3")]
        timeout_mult: f64,
        /// Skip mutations whose replaced text matches this regex (repeatable)
        #[arg(long)]
        ignore: Vec<String>,
        /// Switch a rule on, e.g. MATH (repeatable)
        #[arg(long)]
        include: Vec<RuleCode>,
        /// Switch a rule off, e.g. LITERAL (repeatable)
        #[arg(long)]
        exclude: Vec<RuleCode>,
        /// Stop after the first fatal (timed out) mutant
        #[arg(long)]
        abort_on_fatal: bool,
        /// Output JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// List the functions of a file that --function accepts
    List {
        file: PathBuf,
    },
    /// Show the mutation rule catalog
    Rules,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let exit_code = match cli.command {
        Commands::Run {
            file,
            test,
            function,
            test_cmd,
            config,
            timeout_ms,
            timeout_mult,
            ignore,
            include,
            exclude,
            abort_on_fatal,
            json,
        } => cmd_run(RunArgs {
            file,
            test,
            function,
            test_cmd,
            config,
            timeout_ms,
            timeout_mult,
            ignore,
            include,
            exclude,
            abort_on_fatal,
            json,
            quiet: cli.quiet,
        }),
        Commands::List { file } => cmd_list(file),
        Commands::Rules => {
            output::print_rules();
            0
        }
    };

    process::exit(exit_code);
}

fn init_logging(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

struct RunArgs {
    file: PathBuf,
    test: Option<PathBuf>,
    function: Option<String>,
    test_cmd: Option<String>,
    config: Option<PathBuf>,
    timeout_ms: Option<u64>,
    timeout_mult: f64,
    ignore: Vec<String>,
    include: Vec<RuleCode>,
    exclude: Vec<RuleCode>,
    abort_on_fatal: bool,
    json: bool,
    quiet: bool,
}

fn exit_code_for(err: &MutatorError) -> i32 {
    match err {
        MutatorError::Parse { .. }
        | MutatorError::UnsupportedFile { .. }
        | MutatorError::FunctionNotFound { .. }
        | MutatorError::InvalidPattern { .. }
        | MutatorError::Config { .. } => 2,
        _ => 3,
    }
}

fn cmd_run(args: RunArgs) -> i32 {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            output::print_error(&format!("Failed to get current directory: {}", e));
            return 3;
        }
    };
    let abs_file = if args.file.is_absolute() {
        args.file.clone()
    } else {
        cwd.join(&args.file)
    };

    if let Some(bak_path) = safety::check_interrupted_run(&abs_file) {
        if safety::restore_from_backup(&abs_file, &bak_path).is_ok() {
            output::print_error(
                "Recovered source file from a previously interrupted run. Re-run to continue.",
            );
            return 3;
        }
    }

    if !abs_file.exists() {
        output::print_error(&format!(
            "Source file not found: {}. Check the path and try again.",
            abs_file.display()
        ));
        return 2;
    }
    if JsDialect::from_path(&abs_file).is_none() {
        output::print_error(&MutatorError::UnsupportedFile { path: abs_file }.to_string());
        return 2;
    }

    let config = match Config::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&e.to_string());
            return exit_code_for(&e);
        }
    };

    let test_cmd = args
        .test_cmd
        .clone()
        .or_else(|| config.test_cmd.clone())
        .unwrap_or_else(|| "npm test".to_string());
    let extra_args: Vec<String> = args
        .test
        .iter()
        .map(|t| t.to_string_lossy().to_string())
        .collect();
    let mut test_runner = CommandRunner::new(&test_cmd, &extra_args, &cwd);
    tracing::debug!("Test command: {}", test_runner.command_line());

    let baseline_ms = match test_runner.baseline(Duration::from_secs(600)) {
        BaselineResult::Ok { duration_ms } => duration_ms,
        BaselineResult::Failed(out) => {
            output::print_error(&format!(
                "Tests fail before mutation. Fix failing tests first.\n{}",
                out
            ));
            return 3;
        }
    };
    let derived = Duration::from_millis((baseline_ms as f64 * args.timeout_mult) as u64 + 2000);

    let mut options = match config.run_options(derived) {
        Ok(o) => o,
        Err(e) => {
            output::print_error(&e.to_string());
            return exit_code_for(&e);
        }
    };
    if let Some(ms) = args.timeout_ms {
        options.timeout = Duration::from_millis(ms);
    }
    options.function = args.function.clone();
    options.abort_on_fatal |= args.abort_on_fatal;
    for code in &args.include {
        options.exclude_mutations.insert(*code, false);
    }
    for code in &args.exclude {
        options.exclude_mutations.insert(*code, true);
    }
    for pattern in &args.ignore {
        match Regex::new(pattern) {
            Ok(re) => options.ignore.push(re),
            Err(source) => {
                let e = MutatorError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                };
                output::print_error(&e.to_string());
                return exit_code_for(&e);
            }
        }
    }

    let file_report = match runner::test_file(&abs_file, &options, &mut test_runner) {
        Ok(r) => r,
        Err(e) => {
            output::print_error(&format!("{}: {}", args.file.display(), e));
            return exit_code_for(&e);
        }
    };

    let report = RunReport::from_file_report(&file_report, &args.file.display().to_string());
    if args.json {
        match serde_json::to_string(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                output::print_error(&format!("Failed to serialize report: {}", e));
                return 3;
            }
        }
    } else if !args.quiet {
        if report.total == 0 && report.ignored == 0 {
            output::print_success("No mutable code found.");
        } else {
            output::print_run_report(&report);
        }
    }

    if report.survived > 0 { 1 } else { 0 }
}

fn cmd_list(file: PathBuf) -> i32 {
    let Some(dialect) = JsDialect::from_path(&file) else {
        output::print_error(&MutatorError::UnsupportedFile { path: file }.to_string());
        return 2;
    };
    let source = match std::fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            output::print_error(&format!("Failed to read {}: {}", file.display(), e));
            return 3;
        }
    };
    match parser_js::list_functions(&source, dialect) {
        Ok(names) => {
            for name in names {
                println!("{}", name);
            }
            0
        }
        Err(e) => {
            output::print_error(&format!("{}: {}", file.display(), e));
            exit_code_for(&e)
        }
    }
}
