/// Output Evaluator - Tolerant Comparison of Expected vs Actual Output
///
/// **Core Responsibility:**
/// Decide whether a candidate's captured output matches the expected output.
///
/// **Critical Properties:**
/// - Knows nothing about how the program was executed
/// - Pure and total: (expected, actual) → bool, never fails
/// - Deterministic: the same pair always yields the same answer
///
/// **Comparison Ladder (first success wins):**
/// 1. Both trimmed strings empty
/// 2. Trimmed strings identical
/// 3. Trimmed strings identical ignoring case
/// 4. Per-line comparison ignoring trailing whitespace
/// 5. As (4), ignoring case
/// 6. Both sides parse as one number, equal within tolerance
/// 7. Every number found in each side, pairwise within tolerance
/// 8. Single-line only: whitespace runs collapsed, ignoring case
///
/// **Tolerance:** `max(1e-9, 1e-9 * |expected|)`

use bytebash_common::types::{CaseResult, ExecutionResult, TestCase};
use regex::Regex;
use std::sync::OnceLock;

const ABSOLUTE_TOLERANCE: f64 = 1e-9;
const RELATIVE_TOLERANCE: f64 = 1e-9;

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-?\d+\.?\d*").expect("number pattern is valid"))
}

fn decimal_digit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\p{Nd}$").expect("digit pattern is valid"))
}

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    decimal_digit_pattern().is_match(c.encode_utf8(&mut buf))
}

/// Value of any Unicode decimal digit, e.g. `'٣'` is 3
///
/// Decimal digits are assigned in contiguous runs of ten starting at zero,
/// so the offset from the start of the run is the value.
fn decimal_value(c: char) -> Option<u32> {
    if let Some(digit) = c.to_digit(10) {
        return Some(digit);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(previous) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(previous) {
            break;
        }
        start -= 1;
    }
    Some((c as u32 - start) % 10)
}

/// Rewrite non-ASCII decimal digits as ASCII so Rust's float parser accepts them
fn ascii_digits(text: &str) -> std::borrow::Cow<'_, str> {
    if text.is_ascii() {
        return std::borrow::Cow::Borrowed(text);
    }
    text.chars()
        .map(|c| match decimal_value(c) {
            Some(digit) if !c.is_ascii() => char::from_digit(digit, 10).unwrap_or(c),
            _ => c,
        })
        .collect::<String>()
        .into()
}

/// Python's `str.isspace()`: Unicode whitespace plus the separators U+001C..U+001F
fn is_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Whether `actual` is within tolerance of `expected`
fn within_tolerance(expected: f64, actual: f64) -> bool {
    let tolerance = ABSOLUTE_TOLERANCE.max(expected.abs() * RELATIVE_TOLERANCE);
    (expected - actual).abs() <= tolerance
}

/// Parse a whole string as a float the way Python's `float()` does
///
/// Accepts `inf`/`nan` spellings, exponents and digit-separating underscores.
fn parse_number(text: &str) -> Option<f64> {
    let text = ascii_digits(text.trim_matches(is_space));
    let text = text.as_ref();
    if text.contains('_') {
        let bytes = text.as_bytes();
        let separated = bytes.iter().enumerate().all(|(i, b)| {
            *b != b'_'
                || (i > 0
                    && i + 1 < bytes.len()
                    && bytes[i - 1].is_ascii_digit()
                    && bytes[i + 1].is_ascii_digit())
        });
        if !separated {
            return None;
        }
        return text.replace('_', "").parse().ok();
    }
    text.parse().ok()
}

fn right_trimmed_lines(text: &str, lowercase: bool) -> Vec<String> {
    text.split('\n')
        .map(|line| {
            let line = line.trim_end_matches(is_space);
            if lowercase {
                line.to_lowercase()
            } else {
                line.to_string()
            }
        })
        .collect()
}

fn extract_numbers(text: &str) -> Option<Vec<f64>> {
    number_pattern()
        .find_iter(text)
        .map(|m| ascii_digits(m.as_str()).parse::<f64>().ok())
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split(is_space)
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Decide whether `actual` output matches `expected`
pub fn outputs_match(expected: &str, actual: &str) -> bool {
    let exp = expected.trim_matches(is_space);
    let act = actual.trim_matches(is_space);

    if exp.is_empty() && act.is_empty() {
        return true;
    }
    if exp == act {
        return true;
    }

    if exp.to_lowercase() == act.to_lowercase() {
        return true;
    }

    if right_trimmed_lines(exp, false) == right_trimmed_lines(act, false) {
        return true;
    }
    if right_trimmed_lines(exp, true) == right_trimmed_lines(act, true) {
        return true;
    }

    if let (Some(e), Some(a)) = (parse_number(exp), parse_number(act)) {
        if within_tolerance(e, a) {
            return true;
        }
    }

    // an unparseable match skips the check instead of failing the comparison
    if let (Some(exp_nums), Some(act_nums)) = (extract_numbers(exp), extract_numbers(act)) {
        if !exp_nums.is_empty()
            && exp_nums.len() == act_nums.len()
            && exp_nums
                .iter()
                .zip(&act_nums)
                .all(|(e, a)| within_tolerance(*e, *a))
        {
            return true;
        }
    }

    if !exp.contains('\n') && !act.contains('\n') && collapse_whitespace(exp) == collapse_whitespace(act) {
        return true;
    }

    false
}

/// Grade one execution against its test case
///
/// A failed execution never passes; its error message stands in for the
/// actual output.
pub fn evaluate_case(index: usize, case: &TestCase, execution: &ExecutionResult) -> CaseResult {
    let passed = execution.succeeded && outputs_match(&case.expected_output, &execution.raw_output);

    CaseResult {
        index,
        input: case.input.clone(),
        expected: case.expected_output.clone(),
        actual: execution.display_output().to_string(),
        passed,
        error: execution.error_message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_both_empty() {
        assert!(outputs_match("", ""));
        assert!(outputs_match("  \n", "\t"));
        assert!(!outputs_match("", "x"));
    }

    #[test]
    fn test_exact_after_trim() {
        assert!(outputs_match("8", "8\n"));
        assert!(outputs_match("  hello world ", "hello world"));
    }

    #[test]
    fn test_case_insensitive() {
        // differs in case only
        assert!(outputs_match("Even", "even"));
        assert!(outputs_match("YES\nNO", "yes\nno"));
    }

    #[test]
    fn test_line_trailing_whitespace() {
        // fails checks 2 and 3: inner line carries trailing spaces
        assert!(outputs_match("a\nb", "a   \nb"));
    }

    #[test]
    fn test_line_trailing_whitespace_and_case() {
        assert!(outputs_match("Line One\nLine Two", "line one  \nLINE TWO"));
    }

    #[test]
    fn test_single_number_tolerance() {
        assert!(outputs_match("8", "8.0"));
        assert!(outputs_match("3.14159265358979", "3.14159265358980"));
        assert!(outputs_match("1e3", "1000"));
        assert!(!outputs_match("1", "2"));
        assert!(!outputs_match("0.1", "0.2"));
    }

    #[test]
    fn test_multiple_numbers() {
        assert!(outputs_match("1 2 3", "1.0  2.0   3.0"));
        // multi-line, so the whitespace rule cannot apply
        assert!(outputs_match("Sum: 3\nAvg: 1.5", "Total: 3.0\nMean: 1.50"));
        assert!(!outputs_match("1 2 3", "1 2"));
        assert!(!outputs_match("1 2 3", "1 2 4"));
    }

    #[test]
    fn test_relaxed_whitespace_single_line() {
        // no numbers, so checks 6 and 7 cannot apply
        assert!(outputs_match("hello   big\tWorld", "Hello big world"));
    }

    #[test]
    fn test_relaxed_whitespace_skipped_for_multiline() {
        assert!(!outputs_match("a  b\nc", "a b\nc"));
    }

    #[test]
    fn test_line_order_matters() {
        assert!(!outputs_match("a\nb", "b\na"));
    }

    #[test]
    fn test_trailing_space_and_newline() {
        assert!(outputs_match("a\nb ", "a\nb"));
    }

    #[test]
    fn test_large_number_relative_tolerance() {
        // tolerance at 1e12 is 1e-9 * 1e12 = 1000
        assert!(outputs_match("1000000000000", "1000000000000.0005"));
        assert!(outputs_match("1000000000000", "1000000000001"));
        assert!(outputs_match("1000000000000", "1000000000999"));
        assert!(!outputs_match("1000000000000", "1000000002000"));
    }

    #[test]
    fn test_unicode_digits_count_as_numbers() {
        assert_eq!(decimal_value('٣'), Some(3));
        assert_eq!(decimal_value('７'), Some(7));
        assert_eq!(decimal_value('x'), None);
        assert_eq!(parse_number("٤٢"), Some(42.0));
        assert!(outputs_match("1 3", "1 ٣"));
        assert!(outputs_match("٣", "3.0"));
        assert!(!outputs_match("1 3", "1 ٤"));
    }

    #[test]
    fn test_information_separators_are_whitespace() {
        assert!(outputs_match("a\x1c", "a"));
        assert!(outputs_match("a\x1fb\nc", "a\x1fb \nc\x1e"));
        assert!(outputs_match("hello\x1dworld", "hello world"));
    }

    #[test]
    fn test_nan_never_matches_numerically() {
        assert!(!outputs_match("nan", "1"));
        assert!(outputs_match("nan", "NaN"));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1_000.5"), Some(1000.5));
        assert_eq!(parse_number("_1"), None);
        assert_eq!(parse_number("-2.5e-3"), Some(-0.0025));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_evaluate_case_success() {
        let case = TestCase::new("5\n3", "8");
        let execution = ExecutionResult::success("8\n".to_string(), false);
        let result = evaluate_case(1, &case, &execution);
        assert!(result.passed);
        assert_eq!(result.actual, "8\n");
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_evaluate_case_error_never_passes() {
        let case = TestCase::new("", "Error: division by zero");
        let execution = ExecutionResult::failure("Error: division by zero");
        let result = evaluate_case(2, &case, &execution);
        assert!(!result.passed);
        assert_eq!(result.actual, "Error: division by zero");
        assert_eq!(result.error.as_deref(), Some("Error: division by zero"));
    }

    proptest! {
        #[test]
        fn prop_reflexive(s in ".{0,64}") {
            prop_assert!(outputs_match(&s, &s));
        }

        #[test]
        fn prop_deterministic(a in "[a-zA-Z0-9 .\\-\n]{0,32}", b in "[a-zA-Z0-9 .\\-\n]{0,32}") {
            prop_assert_eq!(outputs_match(&a, &b), outputs_match(&a, &b));
        }

        #[test]
        fn prop_trailing_newline_ignored(s in "[a-z0-9 ]{1,32}") {
            let with_newline = format!("{}\n", s);
            prop_assert!(outputs_match(&s, &with_newline));
        }
    }
}
