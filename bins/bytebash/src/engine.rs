/// Execution Harness - runs a candidate program against one input stream
///
/// **Core Responsibility:**
/// Execute source code with a list of input lines and capture raw output.
///
/// **Critical Architectural Boundary:**
/// - Harness knows HOW to execute (in-process interpreter or python3 child)
/// - Harness does NOT compare outputs
/// - Harness returns raw text (or an error description) for the Evaluator
///
/// **Guarantees per invocation:**
/// - Fresh evaluation scope; nothing leaks between runs
/// - Input calls past the last line return `""`
/// - Stdout is redirected for the whole run and restored on every exit path
/// - Exactly one of {captured text, "Error: <message>"} comes back

use crate::interp::{self, InterpreterError};
use crate::stdio::{capture_capacity, write_stdout, InputCursor, StdoutRedirect};
use bytebash_common::config::{EngineKind, HarnessConfig, TRUNCATION_MARKER};
use bytebash_common::types::ExecutionResult;
use std::any::Any;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variables the process wrapper reads its payload from
const SOURCE_ENV: &str = "BYTEBASH_SOURCE";
const INPUT_ENV: &str = "BYTEBASH_INPUT";

/// Most stderr kept from a child; only the exception text is needed
const MAX_STDERR_BYTES: u64 = 64 * 1024;

/// Runs the candidate with a line-serving `input` and reports its exception
/// text on stderr with exit status 1
const PROCESS_WRAPPER: &str = r#"
import json, os, sys
_lines = iter(json.loads(os.environ["BYTEBASH_INPUT"]))
def _input(prompt=""):
    return next(_lines, "")
try:
    exec(compile(os.environ["BYTEBASH_SOURCE"], "<candidate>", "exec"),
         {"__name__": "__main__", "input": _input})
except Exception as e:
    sys.stdout.flush()
    sys.stderr.write(str(e))
    sys.exit(1)
"#;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Interpreter(#[from] InterpreterError),

    #[error("failed to launch '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to collect output of '{command}': {source}")]
    Output {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode input lines: {0}")]
    Encode(#[from] serde_json::Error),

    /// The child process raised; holds the exception's `str()`
    #[error("{0}")]
    Candidate(String),

    #[error("executor panicked: {0}")]
    Panicked(String),
}

/// Execution backend
///
/// Implementations write candidate output through `stdio::write_stdout` so the
/// harness redirect receives it, and pull input from the cursor.
pub trait Executor {
    fn name(&self) -> &'static str;

    fn execute(&self, source: &str, input: &mut InputCursor) -> Result<(), HarnessError>;
}

/// In-process interpreter for the beginner Python subset
#[derive(Debug, Default, Clone, Copy)]
pub struct InterpreterExecutor;

impl Executor for InterpreterExecutor {
    fn name(&self) -> &'static str {
        "interpreter"
    }

    fn execute(&self, source: &str, input: &mut InputCursor) -> Result<(), HarnessError> {
        interp::run(source, input)?;
        Ok(())
    }
}

/// Runs the candidate under a real Python interpreter in a child process
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    python_command: String,
}

impl ProcessExecutor {
    pub fn new(python_command: impl Into<String>) -> Self {
        Self {
            python_command: python_command.into(),
        }
    }
}

impl Executor for ProcessExecutor {
    fn name(&self) -> &'static str {
        "process"
    }

    fn execute(&self, source: &str, input: &mut InputCursor) -> Result<(), HarnessError> {
        let lines = serde_json::to_string(input.lines())?;

        let mut child = Command::new(&self.python_command)
            .arg("-c")
            .arg(PROCESS_WRAPPER)
            .env(SOURCE_ENV, source)
            .env(INPUT_ENV, lines)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                command: self.python_command.clone(),
                source,
            })?;

        // stderr drains on its own thread so a chatty child never blocks on a full pipe
        let stderr_pipe = child.stderr.take();
        let stderr_reader = thread::spawn(move || read_bounded(stderr_pipe, MAX_STDERR_BYTES));

        // one byte past the capture capacity is enough to trip truncation
        let stdout_limit = capture_capacity().map_or(u64::MAX, |capacity| capacity as u64 + 1);
        let stdout = read_bounded(child.stdout.take(), stdout_limit);
        let status = child.wait();
        let stderr = stderr_reader.join().unwrap_or_else(|_| Ok(Vec::new()));

        let output_error = |source: io::Error| HarnessError::Output {
            command: self.python_command.clone(),
            source,
        };
        let stdout = stdout.map_err(output_error)?;
        let status = status.map_err(output_error)?;
        let stderr = stderr.map_err(output_error)?;

        if stdout.len() as u64 >= stdout_limit {
            debug!(limit = stdout_limit, "child output exceeded capture, rest discarded");
        }
        write_stdout(&String::from_utf8_lossy(&stdout));

        if status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&stderr);
        let message = stderr.trim_end();
        if message.is_empty() {
            return Err(HarnessError::Candidate(format!(
                "process exited with {}",
                status
            )));
        }
        Err(HarnessError::Candidate(message.to_string()))
    }
}

/// Keep the first `limit` bytes of a pipe and discard the rest until EOF
fn read_bounded<R: Read>(pipe: Option<R>, limit: u64) -> io::Result<Vec<u8>> {
    let mut kept = Vec::new();
    if let Some(mut pipe) = pipe {
        (&mut pipe).take(limit).read_to_end(&mut kept)?;
        io::copy(&mut pipe, &mut io::sink())?;
    }
    Ok(kept)
}

/// Build the executor selected by configuration
pub fn executor_for(config: &HarnessConfig) -> Box<dyn Executor> {
    match config.engine {
        EngineKind::Interpreter => Box::new(InterpreterExecutor),
        EngineKind::Process => Box::new(ProcessExecutor::new(config.python_command.clone())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Execute `source` once with `input_lines` and capture what it prints
///
/// Never fails: candidate errors and executor panics come back as a failed
/// `ExecutionResult` carrying `"Error: <message>"`.
pub fn run_test(
    executor: &dyn Executor,
    source: &str,
    input_lines: &[String],
    max_output_bytes: usize,
) -> ExecutionResult {
    let start = Instant::now();
    let mut cursor = InputCursor::new(input_lines.to_vec());

    let redirect = StdoutRedirect::acquire(max_output_bytes);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor.execute(source, &mut cursor)));
    let (mut output, truncated) = redirect.finish();

    let outcome = outcome.unwrap_or_else(|payload| {
        let message = panic_message(payload);
        warn!(executor = executor.name(), panic = %message, "executor panicked");
        Err(HarnessError::Panicked(message))
    });

    let elapsed_ms = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(()) => {
            if truncated {
                warn!(limit = max_output_bytes, "candidate output truncated");
                output.push_str(TRUNCATION_MARKER);
            }
            debug!(
                executor = executor.name(),
                output_bytes = output.len(),
                lines_read = cursor.consumed(),
                elapsed_ms,
                "candidate finished"
            );
            ExecutionResult::success(output, truncated)
        }
        Err(e) => {
            let kind = match &e {
                HarnessError::Interpreter(err) => err.kind_name(),
                _ => "HarnessError",
            };
            debug!(
                executor = executor.name(),
                kind,
                error = %e,
                elapsed_ms,
                "candidate raised"
            );
            ExecutionResult::failure(format!("Error: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingExecutor;

    impl Executor for PanickingExecutor {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn execute(&self, _source: &str, _input: &mut InputCursor) -> Result<(), HarnessError> {
            write_stdout("before panic\n");
            panic!("executor bug");
        }
    }

    #[test]
    fn test_panic_becomes_error_result() {
        let result = run_test(&PanickingExecutor, "", &[], 1024);
        assert!(!result.succeeded);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Error: executor panicked: executor bug")
        );
        assert!(!crate::stdio::is_redirected());
    }

    #[test]
    fn test_truncation_appends_marker() {
        let source = "for i in range(100):\n    print('x' * 10)\n";
        let result = run_test(&InterpreterExecutor, source, &[], 25);
        assert!(result.succeeded);
        assert!(result.truncated);
        assert_eq!(result.raw_output.len(), 25 + TRUNCATION_MARKER.len());
        assert!(result.raw_output.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_syntax_error_message() {
        let result = run_test(&InterpreterExecutor, "print(1\n", &[], 1024);
        assert!(!result.succeeded);
        assert!(result.display_output().starts_with("Error: "));
    }

    #[test]
    fn test_executor_for_config() {
        let mut config = HarnessConfig::default();
        assert_eq!(executor_for(&config).name(), "interpreter");
        config.engine = EngineKind::Process;
        assert_eq!(executor_for(&config).name(), "process");
    }

    #[test]
    fn test_read_bounded_keeps_prefix_and_drains() {
        let mut source = io::Cursor::new(vec![b'x'; 10_000]);
        let kept = read_bounded(Some(&mut source), 100).unwrap();
        assert_eq!(kept.len(), 100);
        assert_eq!(source.position(), 10_000);

        let kept = read_bounded(Some(io::Cursor::new(b"short".to_vec())), 100).unwrap();
        assert_eq!(kept, b"short");
        assert!(read_bounded(None::<io::Empty>, 100).unwrap().is_empty());
    }

    #[test]
    fn test_spawn_failure_is_reported() {
        let executor = ProcessExecutor::new("/nonexistent/bytebash-python");
        let result = run_test(&executor, "print(1)", &[], 1024);
        assert!(!result.succeeded);
        assert!(result
            .display_output()
            .starts_with("Error: failed to launch '/nonexistent/bytebash-python'"));
    }
}
