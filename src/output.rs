use console::Style;

use crate::report::RunReport;
use crate::rules::RuleCode;

pub fn print_error(msg: &str) {
    let style = Style::new().red().bold();
    eprintln!("{} {}", style.apply_to("✗"), msg);
}

pub fn print_success(msg: &str) {
    let style = Style::new().green().bold();
    println!("{} {}", style.apply_to("✓"), msg);
}

pub fn print_run_report(report: &RunReport) {
    let score_pct = report.score * 100.0;
    let decided = report.killed + report.survived;

    if report.survived == 0 {
        let style = Style::new().green().bold();
        println!(
            "{} {}: {} mutants, all killed ({:.1}%) in {:.1}s",
            style.apply_to("✓"),
            report.file,
            decided,
            score_pct,
            report.duration_ms as f64 / 1000.0,
        );
    } else {
        let style = Style::new().yellow().bold();
        println!(
            "{} {}: {} survived / {} tested ({:.1}% killed) in {:.1}s",
            style.apply_to("!"),
            report.file,
            report.survived,
            decided,
            score_pct,
            report.duration_ms as f64 / 1000.0,
        );
    }

    let dim = Style::new().dim();
    if report.errors > 0 {
        println!("  {} {} mutants errored", dim.apply_to("·"), report.errors);
    }
    if report.fatal > 0 {
        println!("  {} {} mutants fatal (timed out?)", dim.apply_to("·"), report.fatal);
    }
    if report.ignored > 0 {
        println!("  {} {} mutants ignored by pattern", dim.apply_to("·"), report.ignored);
    }
    if report.aborted {
        println!("  {} stopped after a fatal run", dim.apply_to("·"));
    }

    if report.survived_mutants.is_empty() {
        return;
    }
    println!();
    let loc_style = Style::new().cyan();
    let rule_style = Style::new().dim();
    let op_style = Style::new().magenta();
    for m in &report.survived_mutants {
        println!(
            "  {} {} {} → {}",
            loc_style.apply_to(format!("{}:{}:{}", report.file, m.line, m.column)),
            rule_style.apply_to(format!("[{}]", m.rule)),
            op_style.apply_to(display_snippet(&m.original)),
            op_style.apply_to(display_snippet(&m.replacement)),
        );
    }
}

/// One-line, shortened form of a replaced span.
fn display_snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return "∅".to_string();
    }
    if flat.chars().count() > 40 {
        let head: String = flat.chars().take(37).collect();
        format!("{}...", head)
    } else {
        flat
    }
}

pub fn print_rules() {
    let off = Style::new().dim();
    for code in RuleCode::ALL {
        if code.excluded_by_default() {
            println!("{:<20}{}", code.as_str(), off.apply_to("off by default"));
        } else {
            println!("{:<20}on", code.as_str());
        }
    }
}
