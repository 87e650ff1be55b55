//! Clean Python source files and Jupyter notebooks with autoflake, isort and black.
//!
//! ```no_run
//! use clean_py::config::Config;
//! use clean_py::file_processor::Cleaner;
//! use std::path::Path;
//!
//! let cleaner = Cleaner::from_config(&Config::default()).unwrap();
//! cleaner.clean_file(Path::new("analysis.ipynb")).unwrap();
//! ```

pub mod config;
pub mod exit_codes;
pub mod file_processor;
pub mod magics;
pub mod notebook;
pub mod parallel;
pub mod pipeline;
pub mod tools;

pub use config::Config;
pub use file_processor::{Cleaner, FileOutcome, ProcessError};
pub use pipeline::{Pipeline, SourceMode, SourceTransform, Stage, StageToggles, Transformed};
