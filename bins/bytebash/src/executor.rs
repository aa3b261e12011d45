/// Batch Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Run every test case through the harness, grade it, and collect the results.
///
/// **Architecture:**
/// 1. Reject blank source before any case runs
/// 2. For each case: `engine::run_test` once, then `evaluator::evaluate_case`
/// 3. Return a `RunSummary` with results in input order
///
/// This module is the glue layer - it knows nothing about:
/// - How code executes (engine's job)
/// - How outputs are compared (evaluator's job)

use crate::engine::{run_test, Executor};
use crate::evaluator;
use anyhow::{bail, Result};
use bytebash_common::config::HarnessConfig;
use bytebash_common::types::{RunSummary, TestCase};
use chrono::Utc;
use tracing::{info, instrument, warn};

pub const EMPTY_SOURCE_MESSAGE: &str = "Please enter your Python code first.";

/// Run `source` against every case, one after another
///
/// A candidate error fails its case and the batch continues; only blank
/// source is refused outright.
#[instrument(skip_all, fields(executor = executor.name(), cases = cases.len()))]
pub fn run_tests(
    executor: &dyn Executor,
    source: &str,
    cases: &[TestCase],
    config: &HarnessConfig,
) -> Result<RunSummary> {
    if source.trim().is_empty() {
        bail!(EMPTY_SOURCE_MESSAGE);
    }

    let started_at = Utc::now();
    let mut results = Vec::with_capacity(cases.len());

    for (offset, case) in cases.iter().enumerate() {
        let index = offset + 1;
        let execution = run_test(executor, source, &case.input_lines(), config.max_output_bytes);
        let result = evaluator::evaluate_case(index, case, &execution);

        if let Some(error) = &result.error {
            warn!(case = index, error = %error, "case raised");
        }
        info!(
            case = index,
            passed = result.passed,
            output_bytes = execution.raw_output.len(),
            truncated = execution.truncated,
            "case evaluated"
        );
        results.push(result);
    }

    let summary = RunSummary::new(results, started_at);
    info!(
        run_id = %summary.run_id,
        passed = summary.passed,
        total = summary.total,
        "run complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InterpreterExecutor;
    use bytebash_common::types::Grade;

    #[test]
    fn test_blank_source_rejected() {
        let cases = vec![TestCase::new("1", "1")];
        let err = run_tests(&InterpreterExecutor, "  \n\t", &cases, &HarnessConfig::default())
            .unwrap_err();
        assert_eq!(err.to_string(), EMPTY_SOURCE_MESSAGE);
    }

    #[test]
    fn test_results_keep_case_order() {
        let cases = vec![
            TestCase::new("1", "1"),
            TestCase::new("2", "4"),
            TestCase::new("3", "9"),
            TestCase::new("4", "15"),
        ];
        let source = "n = int(input())\nprint(n * n)\n";
        let summary = run_tests(&InterpreterExecutor, source, &cases, &HarnessConfig::default())
            .unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 3);
        let indices: Vec<usize> = summary.results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        assert_eq!(summary.results[3].actual, "16\n");
        assert!(!summary.results[3].passed);
        assert_eq!(summary.grade(), Grade::AlmostThere);
    }

    #[test]
    fn test_error_case_does_not_abort_batch() {
        let cases = vec![TestCase::new("0", "x"), TestCase::new("2", "5.0")];
        let source = "n = int(input())\nprint(10 / n)\n";
        let summary = run_tests(&InterpreterExecutor, source, &cases, &HarnessConfig::default())
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.results[0].actual, "Error: division by zero");
        assert!(!summary.results[0].passed);
        assert!(summary.results[1].passed);
        assert_eq!(summary.grade(), Grade::KeepTrying);
    }
}
