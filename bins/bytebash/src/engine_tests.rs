/// Integration tests for the execution harness
///
/// These tests verify the harness contract end to end:
/// 1. Captured output is returned exactly, with no normalization
/// 2. Candidate errors become error results and never leak the redirect
/// 3. Input past the last line reads as an empty string
/// 4. Batches keep case order and count
/// 5. Every built-in example passes its own test cases
/// 6. Inputs that would exhaust the host stack or heap come back as error results
///
/// Process-executor tests need a `python3` on PATH and are ignored by default.

#[cfg(test)]
mod harness_tests {
    use crate::engine::{run_test, InterpreterExecutor, ProcessExecutor};
    use crate::evaluator::outputs_match;
    use crate::executor::run_tests;
    use crate::stdio::is_redirected;
    use bytebash_common::catalog::examples;
    use bytebash_common::config::{HarnessConfig, DEFAULT_MAX_OUTPUT_BYTES, TRUNCATION_MARKER};
    use bytebash_common::types::TestCase;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const SUM_SOURCE: &str = "a = int(input())\nb = int(input())\nprint(a + b)";

    #[test]
    fn test_sum_program_captures_exact_text() {
        let result = run_test(&InterpreterExecutor, SUM_SOURCE, &lines(&["5", "3"]), DEFAULT_MAX_OUTPUT_BYTES);
        assert!(result.succeeded);
        assert_eq!(result.raw_output, "8\n");
        assert!(outputs_match("8", &result.raw_output));
    }

    #[test]
    fn test_error_then_valid_run() {
        let failed = run_test(&InterpreterExecutor, "print('partial')\nx = 1 / 0", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert!(!failed.succeeded);
        assert_eq!(failed.error_message.as_deref(), Some("Error: division by zero"));
        assert_eq!(failed.raw_output, "");
        assert!(!is_redirected());

        let ok = run_test(&InterpreterExecutor, SUM_SOURCE, &lines(&["1", "2"]), DEFAULT_MAX_OUTPUT_BYTES);
        assert!(ok.succeeded);
        assert_eq!(ok.raw_output, "3\n");
    }

    #[test]
    fn test_empty_input_reads_empty_strings() {
        let source = "a = input()\nb = input('prompt: ')\nprint(a == '' and b == '')";
        let result = run_test(&InterpreterExecutor, source, &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.raw_output, "True\n");
    }

    #[test]
    fn test_int_of_exhausted_input_fails() {
        let result = run_test(&InterpreterExecutor, SUM_SOURCE, &lines(&["4"]), DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Error: invalid literal for int() with base 10: ''")
        );
    }

    #[test]
    fn test_runs_do_not_share_state() {
        let first = run_test(&InterpreterExecutor, "counter = 41\nprint(counter + 1)", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(first.raw_output, "42\n");
        let second = run_test(&InterpreterExecutor, "print(counter)", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(second.error_message.as_deref(), Some("Error: name 'counter' is not defined"));
    }

    #[test]
    fn test_output_is_not_normalized() {
        let result = run_test(&InterpreterExecutor, "print('  Mixed Case  ')\nprint()", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.raw_output, "  Mixed Case  \n\n");
    }

    #[test]
    fn test_batch_keeps_order_and_count() {
        let cases: Vec<TestCase> = (0..5)
            .map(|i| TestCase::new(format!("{}\n{}", i, i), format!("{}", i * 2)))
            .collect();
        let summary = run_tests(&InterpreterExecutor, SUM_SOURCE, &cases, &HarnessConfig::default()).unwrap();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 5);
        for (i, result) in summary.results.iter().enumerate() {
            assert_eq!(result.index, i + 1);
            assert_eq!(result.input, cases[i].input);
        }
    }

    #[test]
    fn test_every_example_passes_its_cases() {
        let config = HarnessConfig::default();
        for problem in examples() {
            let summary = run_tests(&InterpreterExecutor, problem.source, &problem.test_cases, &config).unwrap();
            assert_eq!(
                summary.passed, summary.total,
                "{} failed: {:?}",
                problem.name, summary.results
            );
        }
    }

    #[test]
    fn test_deep_nesting_is_error_result() {
        let source = format!("print({}1{})", "(".repeat(20_000), ")".repeat(20_000));
        let result = run_test(&InterpreterExecutor, &source, &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert!(!result.succeeded);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Error: too many nested parentheses (line 1)")
        );
        assert!(!is_redirected());
    }

    #[test]
    fn test_huge_format_width_is_error_result() {
        let result = run_test(&InterpreterExecutor, "print(f'{1:100000000000}')", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Error: Too many decimal digits in format string")
        );
        let result = run_test(&InterpreterExecutor, "print('%100000000000d' % 1)", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.error_message.as_deref(), Some("Error: width too big"));
    }

    #[test]
    fn test_string_escapes_decode() {
        let result = run_test(&InterpreterExecutor, r"print('\x41\u00e9', '\101')", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.raw_output, "Aé A\n");
    }

    #[test]
    fn test_float_conversions_raise_instead_of_saturating() {
        let result = run_test(&InterpreterExecutor, "print('%d' % 1e20)", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.error_message.as_deref(), Some("Error: integer overflow"));
        let result = run_test(&InterpreterExecutor, "print('%d' % float('nan'))", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Error: cannot convert float NaN to integer")
        );
        let result = run_test(&InterpreterExecutor, "print(round(1.5, -400))", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.raw_output, "0.0\n");
    }

    #[test]
    #[ignore] // Requires python3 on PATH
    fn test_process_executor_sum() {
        let executor = ProcessExecutor::new("python3");
        let result = run_test(&executor, SUM_SOURCE, &lines(&["5", "3"]), DEFAULT_MAX_OUTPUT_BYTES);
        assert!(result.succeeded, "{:?}", result);
        assert_eq!(result.raw_output, "8\n");
    }

    #[test]
    #[ignore] // Requires python3 on PATH
    fn test_process_executor_error_message() {
        let executor = ProcessExecutor::new("python3");
        let result = run_test(&executor, "print(1 / 0)", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.error_message.as_deref(), Some("Error: division by zero"));
    }

    #[test]
    #[ignore] // Requires python3 on PATH
    fn test_process_executor_exhausted_input() {
        let executor = ProcessExecutor::new("python3");
        let result = run_test(&executor, "print(repr(input()))", &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(result.raw_output, "''\n");
    }

    #[test]
    #[ignore] // Requires python3 on PATH
    fn test_process_executor_bounds_output() {
        let executor = ProcessExecutor::new("python3");
        let source = "for _ in range(100000):\n    print('x' * 100)";
        let result = run_test(&executor, source, &[], 1024);
        assert!(result.succeeded, "{:?}", result);
        assert!(result.truncated);
        assert_eq!(result.raw_output.len(), 1024 + TRUNCATION_MARKER.len());
    }

    #[test]
    #[ignore] // Requires python3 on PATH
    fn test_process_executor_decodes_escapes_like_interpreter() {
        let source = r"print('\x41\u00e9')";
        let process = run_test(&ProcessExecutor::new("python3"), source, &[], DEFAULT_MAX_OUTPUT_BYTES);
        let interpreted = run_test(&InterpreterExecutor, source, &[], DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(process.raw_output, interpreted.raw_output);
    }
}
