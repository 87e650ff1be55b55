//! Clearing stored outputs and execution counts.

use super::document::{Notebook, NotebookError};
use crate::config::{Config, OutputClearing};
use crate::tools::registry::NBCONVERT;
use crate::tools::{ExecutorError, ToolDefinition, ToolExecutor, ToolRegistry};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClearError {
    #[error("Failed to clear outputs: {0}")]
    Tool(#[from] ExecutorError),
    #[error("Failed to clear outputs: {0}")]
    Notebook(#[from] NotebookError),
}

/// Rewrites a notebook file in place with outputs and execution counts reset.
pub trait OutputClearer: Send + Sync {
    fn clear(&self, path: &Path) -> Result<(), ClearError>;
}

/// Delegates to `jupyter nbconvert --ClearOutputPreprocessor.enabled=True --inplace`.
pub struct NbconvertClearer {
    tool: ToolDefinition,
    executor: Arc<ToolExecutor>,
}

impl NbconvertClearer {
    pub fn new(tool: ToolDefinition, executor: Arc<ToolExecutor>) -> Self {
        Self { tool, executor }
    }

    pub fn tool(&self) -> &ToolDefinition {
        &self.tool
    }
}

impl OutputClearer for NbconvertClearer {
    fn clear(&self, path: &Path) -> Result<(), ClearError> {
        let tool = self.tool.with_args([path.display().to_string()]);
        self.executor.run(&tool)?;
        Ok(())
    }
}

/// Clears outputs without an external process.
pub struct InlineClearer;

impl OutputClearer for InlineClearer {
    fn clear(&self, path: &Path) -> Result<(), ClearError> {
        let mut notebook = Notebook::read(path)?;
        for cell in notebook.cells_mut() {
            cell.clear_outputs();
        }
        notebook.write(path)?;
        Ok(())
    }
}

/// The clearer selected by `output-clearing`.
pub fn clearer_from_config(config: &Config, executor: Arc<ToolExecutor>) -> Box<dyn OutputClearer> {
    match config.output_clearing {
        OutputClearing::Inline => Box::new(InlineClearer),
        OutputClearing::Nbconvert => {
            let registry = ToolRegistry::new(config.tools.clone());
            let tool = registry.resolve(NBCONVERT, &[]).unwrap_or_default();
            Box::new(NbconvertClearer::new(tool, executor))
        }
    }
}
