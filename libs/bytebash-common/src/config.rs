// Harness configuration shared by the runner and its front ends

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Captured output beyond this many bytes is truncated
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 64 * 1024;

/// Appended to captured output that hit the size limit
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

pub const DEFAULT_PYTHON_COMMAND: &str = "python3";

/// Which executor runs candidate programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Built-in interpreter for the beginner Python subset
    #[default]
    Interpreter,
    /// External Python interpreter in a child process
    Process,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Interpreter => write!(f, "interpreter"),
            EngineKind::Process => write!(f, "process"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interpreter" => Ok(EngineKind::Interpreter),
            "process" => Ok(EngineKind::Process),
            other => Err(format!(
                "invalid engine '{}', valid options: interpreter, process",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub engine: EngineKind,
    pub max_output_bytes: usize,
    pub python_command: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            python_command: DEFAULT_PYTHON_COMMAND.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_parsing() {
        assert_eq!("interpreter".parse::<EngineKind>(), Ok(EngineKind::Interpreter));
        assert_eq!(" Process ".parse::<EngineKind>(), Ok(EngineKind::Process));
        assert!("docker".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: HarnessConfig = serde_json::from_str(r#"{"engine": "process"}"#).unwrap();
        assert_eq!(config.engine, EngineKind::Process);
        assert_eq!(config.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
        assert_eq!(config.python_command, "python3");
    }
}
