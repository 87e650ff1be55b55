use clap::Parser;
use clean_py::config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "clean_py",
    version,
    about = "Auto-lint .py and .ipynb files with autoflake, isort and black",
    long_about = "Clean Python files and Jupyter notebooks using external code formatting tools.\n\n\
                  Directories are processed recursively. Notebook cells are only reformatted: their \
                  imports may be used by other cells, so autoflake and isort apply to .py files only."
)]
pub struct CleanArgs {
    /// Files or directories to clean
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Do not clean .py files
    #[arg(long)]
    pub no_py: bool,

    /// Do not clean .ipynb files
    #[arg(long)]
    pub no_ipynb: bool,

    /// Do not remove unused imports and variables (autoflake)
    #[arg(long)]
    pub no_autoflake: bool,

    /// Do not sort imports (isort)
    #[arg(long)]
    pub no_isort: bool,

    /// Do not reformat code (black)
    #[arg(long)]
    pub no_black: bool,

    /// Keep notebook outputs and execution counts
    #[arg(long)]
    pub no_clear_output: bool,

    /// Maximum line length passed to black
    #[arg(long, value_name = "N")]
    pub line_length: Option<usize>,

    /// Worker threads for notebook cells (0 = one per CPU)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Exclude files or directories (comma-separated glob patterns)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Ignore configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl CleanArgs {
    /// Layer the command-line flags over values from the config file.
    pub fn apply_to(&self, config: &mut Config) {
        let disables = [
            (self.no_py, &mut config.py),
            (self.no_ipynb, &mut config.ipynb),
            (self.no_autoflake, &mut config.autoflake),
            (self.no_isort, &mut config.isort),
            (self.no_black, &mut config.black),
            (self.no_clear_output, &mut config.clear_output),
        ];
        for (flag, setting) in disables {
            if flag {
                *setting = false;
            }
        }

        if let Some(line_length) = self.line_length {
            config.line_length = line_length;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        config.exclude.extend(self.exclude.iter().cloned());
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = CleanArgs::parse_from([
            "clean_py",
            "--no-isort",
            "--no-clear-output",
            "--line-length",
            "100",
            "--exclude",
            "build,dist",
            "src",
        ]);
        let mut config = Config {
            black: false,
            exclude: vec!["old".to_string()],
            ..Config::default()
        };
        args.apply_to(&mut config);

        assert!(!config.isort);
        assert!(!config.clear_output);
        assert!(!config.black, "flags never re-enable what config disabled");
        assert!(config.autoflake);
        assert_eq!(config.line_length, 100);
        assert_eq!(config.exclude, vec!["old", "build", "dist"]);
        assert_eq!(args.paths, vec![PathBuf::from("src")]);
    }

    #[test]
    fn test_log_level() {
        assert_eq!(CleanArgs::parse_from(["clean_py", "x"]).log_level(), "info");
        assert_eq!(CleanArgs::parse_from(["clean_py", "-v", "x"]).log_level(), "debug");
        assert_eq!(CleanArgs::parse_from(["clean_py", "-q", "x"]).log_level(), "warn");
    }

    #[test]
    fn test_path_required() {
        assert!(CleanArgs::try_parse_from(["clean_py"]).is_err());
        assert!(CleanArgs::try_parse_from(["clean_py", "-v", "-q", "x"]).is_err());
    }
}
