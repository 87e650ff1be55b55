//! Cleaning a whole notebook file.

use super::cell::CellCleaner;
use super::document::{Cell, Notebook};
use super::outputs::OutputClearer;
use crate::config::Config;
use crate::file_processor::{FileOutcome, ProcessError};
use crate::parallel::CellParallelProcessor;
use crate::pipeline::{Pipeline, StageToggles};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotebookOptions {
    pub clear_output: bool,
    pub toggles: StageToggles,
    pub mask_magics: bool,
    pub drop_empty_cells: bool,
    pub dedupe_cells: bool,
}

impl NotebookOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            clear_output: config.clear_output,
            toggles: StageToggles::from_config(config),
            mask_magics: config.mask_magics,
            drop_empty_cells: config.drop_empty_cells,
            dedupe_cells: config.dedupe_cells,
        }
    }
}

impl Default for NotebookOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct NotebookProcessor<'a> {
    pipeline: &'a Pipeline,
    clearer: &'a dyn OutputClearer,
    parallel: &'a CellParallelProcessor,
    options: NotebookOptions,
}

impl<'a> NotebookProcessor<'a> {
    pub fn new(
        pipeline: &'a Pipeline,
        clearer: &'a dyn OutputClearer,
        parallel: &'a CellParallelProcessor,
        options: NotebookOptions,
    ) -> Self {
        Self {
            pipeline,
            clearer,
            parallel,
            options,
        }
    }

    /// Clear outputs (if asked), clean every code cell, and write the notebook back.
    ///
    /// Individual cells that fail to clean are kept as they were. Failing to
    /// clear outputs, read, parse, or write the document is an error.
    pub fn process(&self, path: &Path) -> Result<FileOutcome, ProcessError> {
        let start = Instant::now();
        let before = read(path)?;

        let content = if self.options.clear_output {
            self.clearer
                .clear(path)
                .map_err(|source| ProcessError::ClearOutput {
                    path: path.display().to_string(),
                    source,
                })?;
            read(path)?
        } else {
            before.clone()
        };

        let mut notebook: Notebook = content.parse().map_err(|source| ProcessError::Notebook {
            path: path.display().to_string(),
            source,
        })?;
        if let Some((major, minor)) = notebook.format_version() {
            log::debug!("{}: nbformat {major}.{minor}", path.display());
        }

        let cleaner = CellCleaner::new(self.pipeline, self.options.toggles, self.options.mask_magics);
        let cells = self.parallel.map(notebook.take_cells(), |index, cell| cleaner.clean(index, cell));
        notebook.set_cells(prune_cells(cells, &self.options));

        let output = notebook.to_json().map_err(|source| ProcessError::Notebook {
            path: path.display().to_string(),
            source,
        })?;
        if output != content {
            std::fs::write(path, &output).map_err(|source| ProcessError::Write {
                path: path.display().to_string(),
                source,
            })?;
        }

        log::debug!("{} cleaned in {:?}", path.display(), start.elapsed());
        Ok(if output == before {
            FileOutcome::Unchanged
        } else {
            FileOutcome::Changed
        })
    }
}

fn read(path: &Path) -> Result<String, ProcessError> {
    std::fs::read_to_string(path).map_err(|source| ProcessError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Drop blank and repeated cells when configured to.
fn prune_cells(cells: Vec<Cell>, options: &NotebookOptions) -> Vec<Cell> {
    let mut seen: Vec<&Value> = Vec::new();
    let mut keep = vec![true; cells.len()];

    for (i, cell) in cells.iter().enumerate() {
        if options.drop_empty_cells && is_blank(cell) {
            keep[i] = false;
            continue;
        }
        if options.dedupe_cells
            && let Some(source) = cell.as_map().get("source")
        {
            if seen.contains(&source) {
                keep[i] = false;
            } else {
                seen.push(source);
            }
        }
    }

    cells
        .into_iter()
        .zip(keep)
        .filter_map(|(cell, keep)| keep.then_some(cell))
        .collect()
}

fn is_blank(cell: &Cell) -> bool {
    cell.source()
        .map(|source| source.into_text().trim().is_empty())
        .unwrap_or(false)
}
