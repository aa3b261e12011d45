/// In-process interpreter for the beginner Python subset used by exercises
///
/// **Pipeline:**
/// 1. `lexer` turns source into tokens, including INDENT/DEDENT
/// 2. `parser` builds the statement tree
/// 3. `eval` walks the tree with a fresh global scope per run
///
/// Output goes through `stdio::write_stdout`, so whatever redirect the
/// harness holds receives it. Input comes from the harness's `InputCursor`.

pub mod ast;
pub mod builtins;
pub mod eval;
pub mod format;
pub mod lexer;
pub mod parser;
pub mod value;

use crate::stdio::InputCursor;
use thiserror::Error;

/// Deepest allowed chain of user function calls
pub const MAX_CALL_DEPTH: usize = 100;

/// Python-style exception category, kept for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Name,
    Type,
    Value,
    Index,
    ZeroDivision,
    Overflow,
    Recursion,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpreterError {
    /// Source could not be tokenized or parsed
    #[error("{message} (line {line})")]
    Syntax { message: String, line: usize },

    /// Raised while the program was running; displays like `str(exc)`
    #[error("{message}")]
    Runtime { kind: ErrorKind, message: String },
}

impl InterpreterError {
    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        InterpreterError::Syntax {
            message: message.into(),
            line,
        }
    }

    pub fn runtime(kind: ErrorKind, message: impl Into<String>) -> Self {
        InterpreterError::Runtime {
            kind,
            message: message.into(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            InterpreterError::Syntax { .. } => "SyntaxError",
            InterpreterError::Runtime { kind, .. } => match kind {
                ErrorKind::Name => "NameError",
                ErrorKind::Type => "TypeError",
                ErrorKind::Value => "ValueError",
                ErrorKind::Index => "IndexError",
                ErrorKind::ZeroDivision => "ZeroDivisionError",
                ErrorKind::Overflow => "OverflowError",
                ErrorKind::Recursion => "RecursionError",
                ErrorKind::Attribute => "AttributeError",
            },
        }
    }
}

pub type InterpResult<T> = Result<T, InterpreterError>;

/// Parse and run `source` to completion in a fresh scope
pub fn run(source: &str, input: &mut InputCursor) -> InterpResult<()> {
    let program = parser::parse(source)?;
    let mut interpreter = eval::Interpreter::new(input);
    interpreter.run(&program)
}
