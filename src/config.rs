//! Configuration loading.
//!
//! Settings come from `.clean-py.toml` or the `[tool.clean-py]` table of
//! `pyproject.toml`, found by walking up from the working directory. CLI flags
//! are applied on top by the binary.

use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".clean-py.toml";
pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const PYPROJECT_SECTION: &str = "clean-py";

/// black's default line length.
pub const DEFAULT_LINE_LENGTH: usize = 88;

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file at {path}: {source}")]
    IoError { source: io::Error, path: String },

    /// Failed to parse the configuration content
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError { path: String, message: String },

    /// A setting has a value we cannot use
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How notebook outputs are cleared.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputClearing {
    /// Run `jupyter nbconvert --ClearOutputPreprocessor.enabled=True --inplace`
    #[default]
    Nbconvert,
    /// Reset `outputs` and `execution_count` without leaving the process
    Inline,
}

/// Fixed options passed to autoflake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AutoflakeConfig {
    pub expand_star_imports: bool,
    pub remove_all_unused_imports: bool,
    pub remove_duplicate_keys: bool,
    pub remove_unused_variables: bool,
}

impl Default for AutoflakeConfig {
    fn default() -> Self {
        Self {
            expand_star_imports: true,
            remove_all_unused_imports: true,
            remove_duplicate_keys: true,
            remove_unused_variables: true,
        }
    }
}

impl AutoflakeConfig {
    pub fn args(&self) -> Vec<String> {
        let flags = [
            (self.expand_star_imports, "--expand-star-imports"),
            (self.remove_all_unused_imports, "--remove-all-unused-imports"),
            (self.remove_duplicate_keys, "--remove-duplicate-keys"),
            (self.remove_unused_variables, "--remove-unused-variables"),
        ];
        let mut args: Vec<String> = flags
            .into_iter()
            .filter(|(on, _)| *on)
            .map(|(_, flag)| flag.to_string())
            .collect();
        args.push("-".to_string());
        args
    }
}

/// Options passed to isort.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct IsortConfig {
    /// isort profile, e.g. `"black"`
    pub profile: Option<String>,
}

impl IsortConfig {
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(profile) = &self.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args.push("-".to_string());
        args
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Clean `.py` files
    pub py: bool,
    /// Clean `.ipynb` files
    pub ipynb: bool,
    /// Remove unused imports and variables (whole files only)
    pub autoflake: bool,
    /// Sort imports (whole files only)
    pub isort: bool,
    /// Reformat style
    pub black: bool,
    /// Clear notebook outputs before cleaning cells
    pub clear_output: bool,
    pub output_clearing: OutputClearing,
    pub line_length: usize,
    pub string_normalization: bool,
    /// Hide IPython magics from the formatter
    pub mask_magics: bool,
    pub drop_empty_cells: bool,
    pub dedupe_cells: bool,
    /// Per tool call, in milliseconds; 0 waits indefinitely
    pub timeout: u64,
    /// Worker threads for notebook cells; 0 uses available parallelism
    pub jobs: usize,
    /// Smallest notebook that is processed on the worker pool
    pub min_parallel_cells: usize,
    pub respect_gitignore: bool,
    /// Glob patterns excluded from directory walks
    pub exclude: Vec<String>,
    pub autoflake_options: AutoflakeConfig,
    pub isort_options: IsortConfig,
    /// Tool overrides
    pub tools: HashMap<String, ToolDefinition>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            py: true,
            ipynb: true,
            autoflake: true,
            isort: true,
            black: true,
            clear_output: true,
            output_clearing: OutputClearing::default(),
            line_length: DEFAULT_LINE_LENGTH,
            string_normalization: true,
            mask_magics: true,
            drop_empty_cells: false,
            dedupe_cells: false,
            timeout: 0,
            jobs: 0,
            min_parallel_cells: 2,
            respect_gitignore: true,
            exclude: Vec::new(),
            autoflake_options: AutoflakeConfig::default(),
            isort_options: IsortConfig::default(),
            tools: HashMap::new(),
        }
    }
}

impl Config {
    /// Parse the contents of a `.clean-py.toml` file.
    pub fn from_toml(content: &str, path: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse the `[tool.clean-py]` table of a `pyproject.toml`, if present.
    pub fn from_pyproject(content: &str, path: &str) -> Result<Option<Self>, ConfigError> {
        let doc: toml::Table = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let Some(section) = doc
            .get("tool")
            .and_then(|tool| tool.get(PYPROJECT_SECTION))
            .cloned()
        else {
            return Ok(None);
        };

        let config: Config = section.try_into().map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Load an explicitly named config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            source,
            path: path_str.clone(),
        })?;

        if path.file_name().is_some_and(|name| name == PYPROJECT_FILE) {
            Ok(Self::from_pyproject(&content, &path_str)?.unwrap_or_default())
        } else {
            Self::from_toml(&content, &path_str)
        }
    }

    /// Find the nearest config file at or above `start`.
    ///
    /// `.clean-py.toml` wins over `pyproject.toml` in the same directory, and a
    /// `pyproject.toml` without a `[tool.clean-py]` table is skipped.
    pub fn discover(start: &Path) -> Result<Option<(Self, PathBuf)>, ConfigError> {
        for dir in start.ancestors() {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some((Self::load(&candidate)?, candidate)));
            }

            let pyproject = dir.join(PYPROJECT_FILE);
            if pyproject.is_file() {
                let path_str = pyproject.display().to_string();
                let content = std::fs::read_to_string(&pyproject).map_err(|source| ConfigError::IoError {
                    source,
                    path: path_str.clone(),
                })?;
                if let Some(config) = Self::from_pyproject(&content, &path_str)? {
                    return Ok(Some((config, pyproject)));
                }
            }
        }
        Ok(None)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_length == 0 {
            return Err(ConfigError::Invalid("line-length must be greater than zero".to_string()));
        }
        if let Some((name, _)) = self.tools.iter().find(|(_, def)| def.command.is_empty()) {
            return Err(ConfigError::Invalid(format!("tools.{name}.command must not be empty")));
        }
        Ok(())
    }

    /// Arguments generated for the built-in black definition.
    pub fn black_args(&self) -> Vec<String> {
        let mut args = vec!["--line-length".to_string(), self.line_length.to_string()];
        if !self.string_normalization {
            args.push("--skip-string-normalization".to_string());
        }
        args.push("-".to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.py && config.ipynb);
        assert!(config.autoflake && config.isort && config.black);
        assert!(config.clear_output);
        assert_eq!(config.output_clearing, OutputClearing::Nbconvert);
        assert_eq!(config.line_length, 88);
        assert_eq!(config.timeout, 0);
        assert!(!config.dedupe_cells);
    }

    #[test]
    fn test_deserialize_config() {
        let toml = r#"
isort = false
output-clearing = "inline"
line-length = 100
string-normalization = false
exclude = ["build/**"]

[autoflake-options]
remove-unused-variables = false

[isort-options]
profile = "black"

[tools.black]
command = ["ruff", "format", "-"]
"#;
        let config = Config::from_toml(toml, "test.toml").expect("valid config");
        assert!(!config.isort);
        assert!(config.autoflake);
        assert_eq!(config.output_clearing, OutputClearing::Inline);
        assert_eq!(config.line_length, 100);
        assert_eq!(config.exclude, vec!["build/**"]);
        assert!(!config.autoflake_options.remove_unused_variables);
        assert!(config.autoflake_options.expand_star_imports);
        assert_eq!(config.isort_options.profile.as_deref(), Some("black"));
        assert_eq!(config.tools["black"].command, vec!["ruff", "format", "-"]);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::from_toml("blakc = true", "bad.toml").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_zero_line_length_is_invalid() {
        let err = Config::from_toml("line-length = 0", "x.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_tool_command_is_invalid() {
        let err = Config::from_toml("[tools.isort]\ncommand = []", "x.toml").unwrap_err();
        assert!(err.to_string().contains("tools.isort.command"));
    }

    #[test]
    fn test_pyproject_section() {
        let content = r#"
[project]
name = "demo"

[tool.clean-py]
black = false
"#;
        let config = Config::from_pyproject(content, "pyproject.toml").unwrap().unwrap();
        assert!(!config.black);

        let without = Config::from_pyproject("[project]\nname = \"demo\"\n", "pyproject.toml").unwrap();
        assert!(without.is_none());
    }

    #[test]
    fn test_black_args() {
        let mut config = Config::default();
        assert_eq!(config.black_args(), vec!["--line-length", "88", "-"]);

        config.line_length = 120;
        config.string_normalization = false;
        assert_eq!(
            config.black_args(),
            vec!["--line-length", "120", "--skip-string-normalization", "-"]
        );
    }

    #[test]
    fn test_autoflake_and_isort_args() {
        assert_eq!(
            AutoflakeConfig::default().args(),
            vec![
                "--expand-star-imports",
                "--remove-all-unused-imports",
                "--remove-duplicate-keys",
                "--remove-unused-variables",
                "-"
            ]
        );
        assert_eq!(IsortConfig::default().args(), vec!["-"]);
    }

    #[test]
    fn test_discover_walks_upward() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "isort = false\n").unwrap();

        let (config, path) = Config::discover(&nested).unwrap().expect("config found");
        assert!(!config.isort);
        assert_eq!(path, temp.path().join(CONFIG_FILE));
    }

    #[test]
    fn test_discover_skips_pyproject_without_section() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("pkg");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(PYPROJECT_FILE), "[project]\nname = \"pkg\"\n").unwrap();
        fs::write(
            temp.path().join(PYPROJECT_FILE),
            "[tool.clean-py]\nline-length = 79\n",
        )
        .unwrap();

        let (config, path) = Config::discover(&nested).unwrap().expect("config found");
        assert_eq!(config.line_length, 79);
        assert_eq!(path, temp.path().join(PYPROJECT_FILE));
    }
}
