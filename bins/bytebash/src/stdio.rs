/// Standard I/O plumbing for candidate programs
///
/// **Input:** `InputCursor` serves one line per read and returns `""` once the
/// lines run out. It never blocks and never fails.
///
/// **Output:** everything the candidate prints goes through `write_stdout`.
/// While a `StdoutRedirect` is alive on the current thread, writes land in its
/// bounded buffer instead of the real stdout. The redirect stack is
/// thread-local, so each thread owns its own capture target.

use std::cell::RefCell;
use std::io::Write;

/// Line-by-line input for one execution
#[derive(Debug, Clone, Default)]
pub struct InputCursor {
    lines: Vec<String>,
    next: usize,
}

impl InputCursor {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines, next: 0 }
    }

    /// Next line, or an empty string when exhausted
    pub fn read_line(&mut self) -> String {
        match self.lines.get(self.next) {
            Some(line) => {
                self.next += 1;
                line.clone()
            }
            None => String::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn consumed(&self) -> usize {
        self.next
    }
}

/// Bounded capture buffer
#[derive(Debug)]
struct Capture {
    buffer: String,
    limit: usize,
    truncated: bool,
}

impl Capture {
    fn push(&mut self, text: &str) {
        if self.truncated {
            return;
        }
        let remaining = self.limit.saturating_sub(self.buffer.len());
        if text.len() <= remaining {
            self.buffer.push_str(text);
            return;
        }
        let mut cut = remaining;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        self.buffer.push_str(&text[..cut]);
        self.truncated = true;
    }
}

thread_local! {
    static REDIRECTS: RefCell<Vec<Capture>> = const { RefCell::new(Vec::new()) };
}

/// Scoped stdout redirect
///
/// Restores the previous target when dropped, so a panic or early return
/// inside the capture window cannot leave output pointed at a dead buffer.
#[must_use = "output is only captured while the redirect is alive"]
#[derive(Debug)]
pub struct StdoutRedirect {
    depth: usize,
}

impl StdoutRedirect {
    /// Start capturing up to `limit` bytes of output on this thread
    pub fn acquire(limit: usize) -> Self {
        let depth = REDIRECTS.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(Capture {
                buffer: String::new(),
                limit,
                truncated: false,
            });
            stack.len()
        });
        Self { depth }
    }

    /// Stop capturing; returns the text and whether it was cut short
    pub fn finish(self) -> (String, bool) {
        self.release()
            .map(|capture| (capture.buffer, capture.truncated))
            .unwrap_or_default()
    }

    fn release(&self) -> Option<Capture> {
        REDIRECTS
            .try_with(|stack| {
                let mut stack = stack.borrow_mut();
                if stack.len() < self.depth {
                    return None;
                }
                stack.truncate(self.depth);
                stack.pop()
            })
            .ok()
            .flatten()
    }
}

impl Drop for StdoutRedirect {
    fn drop(&mut self) {
        // no-op after finish(); otherwise discards this capture and anything nested in it
        let _ = self.release();
    }
}

/// Write candidate output to the active redirect, or the real stdout
pub fn write_stdout(text: &str) {
    let captured = REDIRECTS.with(|stack| match stack.borrow_mut().last_mut() {
        Some(capture) => {
            capture.push(text);
            true
        }
        None => false,
    });
    if !captured {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }
}

/// Bytes the active redirect accepts before it truncates, if output is captured
pub fn capture_capacity() -> Option<usize> {
    REDIRECTS.with(|stack| {
        stack
            .borrow()
            .last()
            .map(|capture| capture.limit.saturating_sub(capture.buffer.len()))
    })
}

/// Whether output on this thread is currently captured
pub fn is_redirected() -> bool {
    REDIRECTS.with(|stack| !stack.borrow().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_serves_lines_then_empty() {
        let mut cursor = InputCursor::new(vec!["5".to_string(), "3".to_string()]);
        assert_eq!(cursor.read_line(), "5");
        assert_eq!(cursor.read_line(), "3");
        assert_eq!(cursor.read_line(), "");
        assert_eq!(cursor.read_line(), "");
        assert_eq!(cursor.consumed(), 2);
    }

    #[test]
    fn test_redirect_captures_and_restores() {
        assert!(!is_redirected());
        let redirect = StdoutRedirect::acquire(1024);
        assert!(is_redirected());
        write_stdout("hello ");
        write_stdout("world\n");
        let (text, truncated) = redirect.finish();
        assert_eq!(text, "hello world\n");
        assert!(!truncated);
        assert!(!is_redirected());
    }

    #[test]
    fn test_redirect_restored_on_drop() {
        {
            let _redirect = StdoutRedirect::acquire(16);
            write_stdout("discarded");
        }
        assert!(!is_redirected());
    }

    #[test]
    fn test_redirect_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            let _redirect = StdoutRedirect::acquire(16);
            write_stdout("partial");
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(!is_redirected());
    }

    #[test]
    fn test_nested_redirects_are_independent() {
        let outer = StdoutRedirect::acquire(64);
        write_stdout("outer ");
        let inner = StdoutRedirect::acquire(64);
        write_stdout("inner");
        assert_eq!(inner.finish().0, "inner");
        write_stdout("again");
        assert_eq!(outer.finish().0, "outer again");
    }

    #[test]
    fn test_capture_capacity_tracks_buffer() {
        assert_eq!(capture_capacity(), None);
        let redirect = StdoutRedirect::acquire(10);
        assert_eq!(capture_capacity(), Some(10));
        write_stdout("abcd");
        assert_eq!(capture_capacity(), Some(6));
        write_stdout("0123456789");
        assert_eq!(capture_capacity(), Some(0));
        drop(redirect);
        assert_eq!(capture_capacity(), None);
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        let redirect = StdoutRedirect::acquire(5);
        write_stdout("abcdé");
        write_stdout("more");
        let (text, truncated) = redirect.finish();
        assert_eq!(text, "abcd");
        assert!(truncated);
    }
}
