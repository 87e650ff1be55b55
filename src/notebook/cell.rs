//! Best-effort cleaning of a single notebook cell.

use super::document::{Cell, NotebookError};
use super::fragments::split_fragments;
use crate::magics::{self, MagicError};
use crate::pipeline::{Pipeline, PipelineError, SourceMode, StageToggles};
use thiserror::Error;

#[derive(Debug, Error)]
enum CellError {
    #[error(transparent)]
    Source(#[from] NotebookError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Magic(#[from] MagicError),
}

/// Cleans code cells in cell mode.
///
/// Failures never leave this type: a cell that cannot be cleaned comes back
/// exactly as it went in.
pub struct CellCleaner<'a> {
    pipeline: &'a Pipeline,
    toggles: StageToggles,
    mask_magics: bool,
}

impl<'a> CellCleaner<'a> {
    pub fn new(pipeline: &'a Pipeline, toggles: StageToggles, mask_magics: bool) -> Self {
        Self {
            pipeline,
            toggles,
            mask_magics,
        }
    }

    /// Clean one cell. `index` is only used for log messages.
    pub fn clean(&self, index: usize, cell: Cell) -> Cell {
        if !cell.is_code() {
            return cell;
        }

        match self.try_clean(&cell) {
            Ok(Some(fragments)) => {
                let mut cleaned = cell;
                cleaned.set_source(fragments);
                cleaned
            }
            Ok(None) => cell,
            Err(e) => {
                log::warn!("Error cleaning cell {index}: {e}");
                cell
            }
        }
    }

    /// New source fragments, or `None` when the cell is left alone.
    fn try_clean(&self, cell: &Cell) -> Result<Option<Vec<String>>, CellError> {
        let source = cell.source()?.into_text();

        if magics::is_cell_magic(&source) {
            log::debug!("Skipping cell magic");
            return Ok(None);
        }

        let masked = magics::mask(&source);
        let cleaned = if self.mask_magics && masked.has_magics() {
            let formatted = self.pipeline.run(&masked.text, self.toggles, SourceMode::Cell)?;
            masked.restore(&formatted)?
        } else {
            self.pipeline.run(&source, self.toggles, SourceMode::Cell)?
        };

        if cleaned == source {
            return Ok(None);
        }
        Ok(Some(split_fragments(&cleaned)))
    }
}
