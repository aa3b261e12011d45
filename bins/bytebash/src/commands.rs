// CLI commands for running and checking exercises
use crate::engine::executor_for;
use crate::evaluator::outputs_match;
use crate::executor::run_tests;
use anyhow::{Context, Result};
use bytebash_common::catalog::{self, examples, find_example};
use bytebash_common::config::HarnessConfig;
use bytebash_common::types::{Grade, RunSummary, TestCase};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::info;

/// Print the built-in example problems
pub fn list_examples() -> Result<()> {
    for problem in examples() {
        println!("{}", problem.name);
        println!("  {}", problem.description);
        println!("  {} test cases", problem.test_cases.len());
        println!();
    }
    Ok(())
}

/// Run a catalog example against its own test cases
pub fn run_example(name: &str, config: &HarnessConfig, json: bool) -> Result<RunSummary> {
    let problem = find_example(name).with_context(|| {
        format!(
            "No example matches '{}'. Available: {}",
            name,
            catalog::example_names().join(", ")
        )
    })?;
    info!(example = problem.name, engine = %config.engine, "running example");
    run_and_report(problem.source, &problem.test_cases, config, json)
}

/// Run a source file against a JSON case file
pub fn run_files(source_path: &Path, cases_path: &Path, config: &HarnessConfig, json: bool) -> Result<RunSummary> {
    let source = fs::read_to_string(source_path)
        .with_context(|| format!("Failed to read source file {}", source_path.display()))?;
    let cases = load_cases(cases_path)?;
    info!(
        source = %source_path.display(),
        cases = cases.len(),
        engine = %config.engine,
        "running source file"
    );
    run_and_report(&source, &cases, config, json)
}

/// Read `[{"input": ..., "expected_output": ...}]`
pub fn load_cases(cases_path: &Path) -> Result<Vec<TestCase>> {
    let content = fs::read_to_string(cases_path)
        .with_context(|| format!("Failed to read case file {}", cases_path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse case file {}", cases_path.display()))
}

/// Compare one expected/actual pair and print the decision
pub fn check(expected: &str, actual: &str) -> Result<bool> {
    let matched = outputs_match(expected, actual);
    if matched {
        println!("✅ Outputs match");
    } else {
        println!("❌ Outputs do not match");
    }
    Ok(matched)
}

fn run_and_report(source: &str, cases: &[TestCase], config: &HarnessConfig, json: bool) -> Result<RunSummary> {
    let executor = executor_for(config);
    let summary = run_tests(executor.as_ref(), source, cases, config)?;

    if json {
        let rendered = serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?;
        println!("{}", rendered);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(summary)
}

pub fn grade_message(summary: &RunSummary) -> String {
    match summary.grade() {
        Grade::AllPassed => "🎉 All tests passed! Great job!".to_string(),
        Grade::AlmostThere => format!(
            "⚠️ {} out of {} tests passed. Almost there!",
            summary.passed, summary.total
        ),
        Grade::KeepTrying => format!(
            "❌ {} out of {} tests passed. Keep trying!",
            summary.passed, summary.total
        ),
    }
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text.trim_end()
    }
}

fn indented(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "    {}", line);
    }
}

/// Human-readable report: headline, grade, then each case
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results: {}/{} Tests Passed", summary.passed, summary.total);
    let _ = writeln!(out, "{}", grade_message(summary));

    for result in &summary.results {
        let status = if result.passed { "✅ Passed" } else { "❌ Failed" };
        let _ = writeln!(out);
        let _ = writeln!(out, "Test Case {} — {}", result.index, status);
        let _ = writeln!(out, "  Input:");
        indented(&mut out, or_placeholder(&result.input, "(no input)"));
        let _ = writeln!(out, "  Expected:");
        indented(&mut out, or_placeholder(&result.expected, "(no expected output)"));
        let _ = writeln!(out, "  Actual:");
        indented(&mut out, or_placeholder(&result.actual, "(no output)"));
    }
    out
}
