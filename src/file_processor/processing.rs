//! Per-file cleaning and the sequential driver loop.

use crate::config::Config;
use crate::notebook::outputs::{ClearError, OutputClearer, clearer_from_config};
use crate::notebook::{NotebookError, NotebookOptions, NotebookProcessor};
use crate::parallel::{CellParallelProcessor, ParallelConfig};
use crate::pipeline::{Pipeline, PipelineError, SourceMode, StageToggles};
use crate::tools::ToolExecutor;
use std::error::Error as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// What happened to a file that was cleaned successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Changed,
    Unchanged,
}

/// A file that could not be cleaned.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to read {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("Failed to write {path}: {source}")]
    Write { path: String, source: io::Error },

    #[error("{path}: {source}")]
    Notebook { path: String, source: NotebookError },

    #[error("{path}: {source}")]
    ClearOutput { path: String, source: ClearError },

    #[error("{path}: {source}")]
    Pipeline { path: String, source: PipelineError },

    #[error("{path}: not a .py or .ipynb file")]
    Unsupported { path: String },
}

/// The two kinds of files we clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileKind {
    Python,
    Notebook,
}

impl FileKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Some(FileKind::Python),
            Some("ipynb") => Some(FileKind::Notebook),
            _ => None,
        }
    }
}

/// Runs the whole-file pipeline over a `.py` file.
///
/// Unlike notebook cells, any failure is reported to the caller.
pub struct PythonFileProcessor<'a> {
    pipeline: &'a Pipeline,
    toggles: StageToggles,
}

impl<'a> PythonFileProcessor<'a> {
    pub fn new(pipeline: &'a Pipeline, toggles: StageToggles) -> Self {
        Self { pipeline, toggles }
    }

    pub fn process(&self, path: &Path) -> Result<FileOutcome, ProcessError> {
        let display = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| ProcessError::Read {
            path: display.clone(),
            source,
        })?;

        let cleaned = self
            .pipeline
            .run(&source, self.toggles, SourceMode::WholeFile)
            .map_err(|source| ProcessError::Pipeline {
                path: display.clone(),
                source,
            })?;

        if cleaned == source {
            return Ok(FileOutcome::Unchanged);
        }

        std::fs::write(path, cleaned).map_err(|source| ProcessError::Write { path: display, source })?;
        Ok(FileOutcome::Changed)
    }
}

/// Everything needed to clean files, built once per run.
pub struct Cleaner {
    pipeline: Pipeline,
    clearer: Box<dyn OutputClearer>,
    parallel: CellParallelProcessor,
    toggles: StageToggles,
    notebook_options: NotebookOptions,
}

impl Cleaner {
    /// Build the external-tool cleaner described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, rayon::ThreadPoolBuildError> {
        let executor = Arc::new(ToolExecutor::new(config.timeout));
        let parallel = CellParallelProcessor::new(ParallelConfig::from_jobs(config.jobs, config.min_parallel_cells))?;

        Ok(Self {
            pipeline: Pipeline::from_config(config, Arc::clone(&executor)),
            clearer: clearer_from_config(config, executor),
            parallel,
            toggles: StageToggles::from_config(config),
            notebook_options: NotebookOptions::from_config(config),
        })
    }

    /// Assemble a cleaner from parts, e.g. in-process transforms.
    pub fn new(
        pipeline: Pipeline,
        clearer: Box<dyn OutputClearer>,
        parallel: CellParallelProcessor,
        toggles: StageToggles,
        notebook_options: NotebookOptions,
    ) -> Self {
        Self {
            pipeline,
            clearer,
            parallel,
            toggles,
            notebook_options,
        }
    }

    pub fn clean_python(&self, path: &Path) -> Result<FileOutcome, ProcessError> {
        PythonFileProcessor::new(&self.pipeline, self.toggles).process(path)
    }

    pub fn clean_notebook(&self, path: &Path) -> Result<FileOutcome, ProcessError> {
        NotebookProcessor::new(&self.pipeline, self.clearer.as_ref(), &self.parallel, self.notebook_options)
            .process(path)
    }

    /// Clean one file, chosen by extension.
    pub fn clean_file(&self, path: &Path) -> Result<FileOutcome, ProcessError> {
        match FileKind::from_path(path) {
            Some(FileKind::Python) => self.clean_python(path),
            Some(FileKind::Notebook) => self.clean_notebook(path),
            None => Err(ProcessError::Unsupported {
                path: path.display().to_string(),
            }),
        }
    }
}

/// Tally of a run over many files.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub cleaned: usize,
    pub changed: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Clean every file in order, logging and continuing past failures.
pub fn clean_files(cleaner: &Cleaner, files: &[PathBuf], verbose: bool) -> RunSummary {
    let mut summary = RunSummary::default();

    for path in files {
        log::info!("Cleaning file: {}", path.display());
        match cleaner.clean_file(path) {
            Ok(outcome) => {
                summary.cleaned += 1;
                if outcome == FileOutcome::Changed {
                    summary.changed += 1;
                } else {
                    log::debug!("{} already clean", path.display());
                }
            }
            Err(e) => {
                log::error!("Unable to clean file: {e}");
                if verbose {
                    let mut source = e.source();
                    while let Some(cause) = source {
                        log::debug!("  caused by: {cause}");
                        source = cause.source();
                    }
                }
                summary.failed.push((path.clone(), e.to_string()));
            }
        }
    }

    summary
}
