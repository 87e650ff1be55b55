//! Definition of an external tool invocation.

use serde::{Deserialize, Serialize};

/// Definition of an external tool.
///
/// This describes how to invoke a tool and how it communicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolDefinition {
    /// Command to run (first element is the binary, rest are arguments)
    pub command: Vec<String>,

    /// Whether the tool reads the source from stdin (default: true)
    #[serde(default = "default_true")]
    pub stdin: bool,

    /// Whether the tool writes the result to stdout (default: true)
    #[serde(default = "default_true")]
    pub stdout: bool,
}

fn default_true() -> bool {
    true
}

impl ToolDefinition {
    /// A stdin/stdout filter built from a command line.
    pub fn filter<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            stdin: true,
            stdout: true,
        }
    }

    /// Name of the binary, or `"unknown"` for an empty command.
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("unknown")
    }

    /// Return a copy with `args` appended to the command line.
    pub fn with_args<I, S>(&self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut def = self.clone();
        def.command.extend(args.into_iter().map(Into::into));
        def
    }
}

impl Default for ToolDefinition {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            stdin: true,
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults() {
        let def: ToolDefinition = toml::from_str(r#"command = ["black", "-"]"#).expect("valid tool");
        assert_eq!(def.command, vec!["black", "-"]);
        assert!(def.stdin);
        assert!(def.stdout);
    }

    #[test]
    fn test_deserialize_rejects_unknown_keys() {
        let result: Result<ToolDefinition, _> = toml::from_str("command = [\"x\"]\nlint-args = []");
        assert!(result.is_err());
    }

    #[test]
    fn test_with_args_appends() {
        let def = ToolDefinition::filter(["isort"]).with_args(["--profile", "black", "-"]);
        assert_eq!(def.command, vec!["isort", "--profile", "black", "-"]);
        assert_eq!(def.program(), "isort");
    }

    #[test]
    fn test_program_of_empty_command() {
        assert_eq!(ToolDefinition::default().program(), "unknown");
    }
}
