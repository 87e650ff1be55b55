//! External formatter invocation.
//!
//! Every formatting pass is delegated to a command-line tool that reads source
//! on stdin and writes the result to stdout:
//!
//! - `autoflake` removes unused imports and variables
//! - `isort` sorts imports
//! - `black` normalizes style
//! - `jupyter nbconvert` clears notebook outputs in place
//!
//! Any of them can be replaced in configuration:
//!
//! ```toml
//! [tools.black]
//! command = ["ruff", "format", "--stdin-filename=_.py", "-"]
//! ```

pub mod config;
pub mod executor;
pub mod registry;

pub use config::ToolDefinition;
pub use executor::{ExecutorError, ToolExecutor, ToolOutput};
pub use registry::ToolRegistry;
