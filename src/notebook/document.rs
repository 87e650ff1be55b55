//! Notebook documents and cells.
//!
//! Both are kept as JSON objects rather than typed structs so that every field
//! we do not touch survives a round trip with its value and position intact.
//! Key order relies on `serde_json`'s `preserve_order` feature.

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use super::fragments::join_fragments;

#[derive(Debug, Error)]
pub enum NotebookError {
    #[error("Failed to access {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("Invalid notebook JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialized notebook is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Notebook root is not a JSON object")]
    NotAnObject,

    #[error("Notebook has no `cells` list (only nbformat 4 and later are supported)")]
    MissingCells,

    #[error("Cell {index} is not a JSON object")]
    InvalidCell { index: usize },

    #[error("Cell source is missing")]
    MissingSource,

    #[error("Cell source must be a string or a list of strings, found {0}")]
    InvalidSource(&'static str),
}

/// A cell's `source` as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl CellSource {
    /// The logical source text.
    pub fn into_text(self) -> String {
        match self {
            CellSource::Text(text) => text,
            CellSource::Lines(lines) => join_fragments(&lines),
        }
    }
}

/// One notebook cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(Map<String, Value>);

impl Cell {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn cell_type(&self) -> Option<&str> {
        self.0.get("cell_type").and_then(Value::as_str)
    }

    pub fn is_code(&self) -> bool {
        self.cell_type() == Some("code")
    }

    pub fn source(&self) -> Result<CellSource, NotebookError> {
        match self.0.get("source") {
            None => Err(NotebookError::MissingSource),
            Some(Value::String(text)) => Ok(CellSource::Text(text.clone())),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(line) => Ok(line.clone()),
                    other => Err(NotebookError::InvalidSource(json_kind(other))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(CellSource::Lines),
            Some(other) => Err(NotebookError::InvalidSource(json_kind(other))),
        }
    }

    /// Replace `source` with a list of line fragments, keeping its position.
    pub fn set_source(&mut self, fragments: Vec<String>) {
        let value = Value::Array(fragments.into_iter().map(Value::String).collect());
        self.0.insert("source".to_string(), value);
    }

    /// Drop outputs and the execution count of a code cell.
    ///
    /// Mirrors nbconvert's `ClearOutputPreprocessor`, including removal of the
    /// `collapsed` and `scrolled` view flags. Other cell types are untouched.
    pub fn clear_outputs(&mut self) {
        if !self.is_code() {
            return;
        }
        self.0.insert("outputs".to_string(), Value::Array(Vec::new()));
        self.0.insert("execution_count".to_string(), Value::Null);
        if let Some(Value::Object(metadata)) = self.0.get_mut("metadata") {
            metadata.shift_remove("collapsed");
            metadata.shift_remove("scrolled");
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// A parsed notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    /// Top-level fields; `cells` is held as a `null` placeholder to keep its position.
    root: Map<String, Value>,
    cells: Vec<Cell>,
}

impl Notebook {
    pub fn read(path: &Path) -> Result<Self, NotebookError> {
        let content = std::fs::read_to_string(path).map_err(|source| NotebookError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut Vec<Cell> {
        &mut self.cells
    }

    pub fn take_cells(&mut self) -> Vec<Cell> {
        std::mem::take(&mut self.cells)
    }

    pub fn set_cells(&mut self, cells: Vec<Cell>) {
        self.cells = cells;
    }

    /// `(nbformat, nbformat_minor)`, when both are present.
    pub fn format_version(&self) -> Option<(u64, u64)> {
        let major = self.root.get("nbformat")?.as_u64()?;
        let minor = self.root.get("nbformat_minor")?.as_u64()?;
        Some((major, minor))
    }

    /// Serialize the way Jupyter tooling expects: one-space indent, trailing newline.
    pub fn to_json(&self) -> Result<String, NotebookError> {
        let mut root = self.root.clone();
        root.insert("cells".to_string(), serde_json::to_value(&self.cells)?);

        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        Value::Object(root).serialize(&mut serializer)?;
        buf.push(b'\n');

        Ok(String::from_utf8(buf)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), NotebookError> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| NotebookError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

impl FromStr for Notebook {
    type Err = NotebookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Value::Object(mut root) = serde_json::from_str::<Value>(s)? else {
            return Err(NotebookError::NotAnObject);
        };

        let Some(slot) = root.get_mut("cells") else {
            return Err(NotebookError::MissingCells);
        };
        let Value::Array(raw_cells) = slot.take() else {
            return Err(NotebookError::MissingCells);
        };

        let cells = raw_cells
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                Value::Object(map) => Ok(Cell::from_map(map)),
                _ => Err(NotebookError::InvalidCell { index }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { root, cells })
    }
}
