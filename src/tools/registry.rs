//! Built-in tool registry with definitions for the Python formatters.
//!
//! Users can override any of these in their configuration under `[tools.<name>]`.

use super::config::ToolDefinition;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const AUTOFLAKE: &str = "autoflake";
pub const ISORT: &str = "isort";
pub const BLACK: &str = "black";
pub const NBCONVERT: &str = "nbconvert";

/// Registry of built-in tool definitions.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    /// User-defined tools (override built-ins)
    user_tools: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    /// Create a new registry with user-defined tools.
    pub fn new(user_tools: HashMap<String, ToolDefinition>) -> Self {
        Self { user_tools }
    }

    /// Get a tool definition by name.
    ///
    /// Checks user tools first, then falls back to built-in tools.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.user_tools.get(name).or_else(|| BUILTIN_TOOLS.get(name))
    }

    pub fn is_overridden(&self, name: &str) -> bool {
        self.user_tools.contains_key(name)
    }

    /// Build the command for `name`.
    ///
    /// `generated_args` are appended to built-in definitions only; a user-defined
    /// tool is taken exactly as configured.
    pub fn resolve(&self, name: &str, generated_args: &[String]) -> Option<ToolDefinition> {
        let def = self.get(name)?;
        if self.is_overridden(name) {
            Some(def.clone())
        } else {
            Some(def.with_args(generated_args.iter().cloned()))
        }
    }

    /// Names of user-defined tools that do not correspond to any built-in.
    pub fn unknown_overrides(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .user_tools
            .keys()
            .map(String::as_str)
            .filter(|name| !BUILTIN_TOOLS.contains_key(*name))
            .collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

static BUILTIN_TOOLS: LazyLock<HashMap<&'static str, ToolDefinition>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert(AUTOFLAKE, ToolDefinition::filter(["autoflake"]));
    m.insert(ISORT, ToolDefinition::filter(["isort"]));
    m.insert(BLACK, ToolDefinition::filter(["black", "--quiet", "--fast"]));

    // Rewrites the notebook in place; the path is appended at call time.
    m.insert(
        NBCONVERT,
        ToolDefinition {
            command: vec![
                "jupyter".to_string(),
                "nbconvert".to_string(),
                "--ClearOutputPreprocessor.enabled=True".to_string(),
                "--inplace".to_string(),
            ],
            stdin: false,
            stdout: false,
        },
    );

    m
});
