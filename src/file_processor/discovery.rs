//! File discovery for directory arguments.

use super::processing::FileKind;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Path '{0}' does not exist")]
    NotFound(String),

    #[error("Unable to clean {0} with current options")]
    NotCleanable(String),

    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern { pattern: String, source: ignore::Error },

    #[error("Failed to walk {path}: {source}")]
    Walk { path: String, source: ignore::Error },
}

/// Which files to pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub py: bool,
    pub ipynb: bool,
    pub respect_gitignore: bool,
    pub exclude: Vec<String>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            py: true,
            ipynb: true,
            respect_gitignore: true,
            exclude: Vec::new(),
        }
    }
}

impl DiscoveryOptions {
    pub fn accepts(&self, kind: FileKind) -> bool {
        match kind {
            FileKind::Python => self.py,
            FileKind::Notebook => self.ipynb,
        }
    }
}

/// Expands directory-style patterns to also match files within them.
/// Pattern "dir/path" becomes ["dir/path", "dir/path/**"].
///
/// Patterns containing glob characters (*, ?, [) are returned unchanged.
fn expand_directory_pattern(pattern: &str) -> Vec<String> {
    if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
        return vec![pattern.to_string()];
    }

    let base = pattern.trim_end_matches('/');
    vec![base.to_string(), format!("{base}/**")]
}

/// Resolve CLI paths to the list of files to clean.
///
/// Explicit files must have an enabled extension. Directories are walked
/// recursively, skipping hidden entries (such as `.ipynb_checkpoints`),
/// gitignored paths, and `exclude` patterns. All `.py` files come before all
/// `.ipynb` files; each group is sorted.
pub fn discover_files(paths: &[PathBuf], options: &DiscoveryOptions) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut found: Vec<(FileKind, PathBuf)> = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(DiscoveryError::NotFound(path.display().to_string()));
        }

        if path.is_file() {
            match FileKind::from_path(path) {
                Some(kind) if options.accepts(kind) => found.push((kind, path.clone())),
                _ => return Err(DiscoveryError::NotCleanable(path.display().to_string())),
            }
            continue;
        }

        log::info!("Recursively cleaning directory: {}", path.display());
        walk_directory(path, options, &mut found)?;
    }

    found.sort();
    let mut seen = HashSet::new();
    Ok(found
        .into_iter()
        .map(|(_, path)| path)
        .filter(|path| seen.insert(path.clone()))
        .collect())
}

fn walk_directory(
    root: &Path,
    options: &DiscoveryOptions,
    found: &mut Vec<(FileKind, PathBuf)>,
) -> Result<(), DiscoveryError> {
    let mut walk_builder = WalkBuilder::new(root);

    if !options.exclude.is_empty() {
        let mut override_builder = OverrideBuilder::new(root);
        for pattern in options.exclude.iter().flat_map(|p| expand_directory_pattern(p)) {
            let exclude_rule = if pattern.starts_with('!') {
                pattern.clone()
            } else {
                format!("!{pattern}")
            };
            override_builder
                .add(&exclude_rule)
                .map_err(|source| DiscoveryError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
        }
        let overrides = override_builder
            .build()
            .map_err(|source| DiscoveryError::InvalidPattern {
                pattern: options.exclude.join(", "),
                source,
            })?;
        walk_builder.overrides(overrides);
    }

    let use_gitignore = options.respect_gitignore;
    walk_builder.ignore(use_gitignore);
    walk_builder.git_ignore(use_gitignore);
    walk_builder.git_global(use_gitignore);
    walk_builder.git_exclude(use_gitignore);
    walk_builder.parents(use_gitignore);
    walk_builder.hidden(true);
    walk_builder.require_git(false);

    for entry in walk_builder.build() {
        let entry = entry.map_err(|source| DiscoveryError::Walk {
            path: root.display().to_string(),
            source,
        })?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.into_path();
        if let Some(kind) = FileKind::from_path(&path)
            && options.accepts(kind)
        {
            found.push((kind, path));
        }
    }

    Ok(())
}
