//! Jupyter notebook support.
//!
//! A notebook is cleaned cell by cell: code cells go through the pipeline in
//! cell mode, every other cell is passed through untouched, and the document
//! is written back in the layout Jupyter itself produces.

pub mod cell;
pub mod document;
pub mod fragments;
pub mod outputs;
pub mod processor;

pub use cell::CellCleaner;
pub use document::{Cell, CellSource, Notebook, NotebookError};
pub use fragments::{join_fragments, split_fragments};
pub use outputs::{ClearError, InlineClearer, NbconvertClearer, OutputClearer};
pub use processor::{NotebookOptions, NotebookProcessor};
