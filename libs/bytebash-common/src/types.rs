use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One (input, expected output) pair used to grade a candidate program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Raw newline-separated input text, one value per line
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }

    /// Lines served to the program's read-input calls.
    ///
    /// Blank input yields no lines at all; otherwise the outer whitespace is
    /// trimmed and the remainder split on `'\n'`.
    pub fn input_lines(&self) -> Vec<String> {
        let trimmed = self.input.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed.split('\n').map(str::to_string).collect()
    }
}

/// Outcome of a single harness invocation.
///
/// Exactly one of two shapes: `succeeded` with the captured text, or failed
/// with `error_message` set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub raw_output: String,
    pub succeeded: bool,
    pub error_message: Option<String>,
    /// Captured output exceeded the size limit and was cut
    #[serde(default)]
    pub truncated: bool,
}

impl ExecutionResult {
    pub fn success(raw_output: String, truncated: bool) -> Self {
        Self {
            raw_output,
            succeeded: true,
            error_message: None,
            truncated,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            raw_output: String::new(),
            succeeded: false,
            error_message: Some(message.into()),
            truncated: false,
        }
    }

    /// Text shown as the "actual" output: the capture, or the error message.
    pub fn display_output(&self) -> &str {
        match &self.error_message {
            Some(message) => message,
            None => &self.raw_output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    /// 1-based position of the case in the run
    pub index: usize,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    AllPassed,
    AlmostThere,
    KeepTrying,
}

/// Results of one "run tests" action, in the order the cases were supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub results: Vec<CaseResult>,
    pub passed: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn new(results: Vec<CaseResult>, started_at: DateTime<Utc>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let total = results.len();
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            results,
            passed,
            total,
        }
    }

    /// All passed, at least five of every seven passed, or neither.
    pub fn grade(&self) -> Grade {
        if self.passed == self.total {
            Grade::AllPassed
        } else if self.passed * 7 >= self.total * 5 {
            Grade::AlmostThere
        } else {
            Grade::KeepTrying
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_result(index: usize, passed: bool) -> CaseResult {
        CaseResult {
            index,
            input: String::new(),
            expected: String::new(),
            actual: String::new(),
            passed,
            error: None,
        }
    }

    #[test]
    fn test_input_lines_blank() {
        assert!(TestCase::new("", "x").input_lines().is_empty());
        assert!(TestCase::new("  \n\n ", "x").input_lines().is_empty());
    }

    #[test]
    fn test_input_lines_trims_outer_whitespace_only() {
        let case = TestCase::new("\n5\n\n3\n", "8");
        assert_eq!(case.input_lines(), vec!["5", "", "3"]);
    }

    #[test]
    fn test_display_output_prefers_error() {
        let ok = ExecutionResult::success("8\n".to_string(), false);
        assert_eq!(ok.display_output(), "8\n");

        let failed = ExecutionResult::failure("Error: division by zero");
        assert_eq!(failed.display_output(), "Error: division by zero");
        assert!(!failed.succeeded);
    }

    #[test]
    fn test_summary_counts_and_grade() {
        let all = RunSummary::new((1..=7).map(|i| case_result(i, true)).collect(), Utc::now());
        assert_eq!(all.passed, 7);
        assert_eq!(all.total, 7);
        assert_eq!(all.grade(), Grade::AllPassed);

        let almost = RunSummary::new(
            (1..=7).map(|i| case_result(i, i <= 5)).collect(),
            Utc::now(),
        );
        assert_eq!(almost.passed, 5);
        assert_eq!(almost.grade(), Grade::AlmostThere);

        let low = RunSummary::new(
            (1..=7).map(|i| case_result(i, i <= 4)).collect(),
            Utc::now(),
        );
        assert_eq!(low.grade(), Grade::KeepTrying);
    }

    #[test]
    fn test_empty_run_counts_as_all_passed() {
        let summary = RunSummary::new(Vec::new(), Utc::now());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.grade(), Grade::AllPassed);
    }

    #[test]
    fn test_case_deserializes_with_missing_fields() {
        let case: TestCase = serde_json::from_str(r#"{"input": "4"}"#).unwrap();
        assert_eq!(case.input, "4");
        assert_eq!(case.expected_output, "");
    }
}
