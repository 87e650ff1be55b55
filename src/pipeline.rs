//! The text transform pipeline.
//!
//! A source string flows through up to three stages in a fixed order:
//! unused-code removal, import sorting, and style reformatting. Each stage is
//! a [`SourceTransform`]; the CLI backs them with external tools, tests and
//! library users may plug in anything that maps text to text.
//!
//! In [`SourceMode::Cell`] only reformatting runs. A notebook cell's imports
//! may be used by sibling cells sharing the kernel namespace, so removing
//! "unused" imports or regrouping them per cell would break the notebook.

use crate::config::Config;
use crate::tools::registry::{AUTOFLAKE, BLACK, ISORT};
use crate::tools::{ExecutorError, ToolDefinition, ToolExecutor, ToolRegistry};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// One pass of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    RemoveUnused,
    SortImports,
    Reformat,
}

impl Stage {
    /// Execution order of the stages.
    pub const ORDER: [Stage; 3] = [Stage::RemoveUnused, Stage::SortImports, Stage::Reformat];

    pub fn name(self) -> &'static str {
        match self {
            Stage::RemoveUnused => "remove-unused",
            Stage::SortImports => "sort-imports",
            Stage::Reformat => "reformat",
        }
    }

    /// Whether the stage may run on source of the given kind.
    pub fn runs_in(self, mode: SourceMode) -> bool {
        match mode {
            SourceMode::WholeFile => true,
            SourceMode::Cell => self == Stage::Reformat,
        }
    }

    fn index(self) -> usize {
        match self {
            Stage::RemoveUnused => 0,
            Stage::SortImports => 1,
            Stage::Reformat => 2,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What kind of source is being transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    /// A standalone `.py` file: every enabled stage runs.
    WholeFile,
    /// A single notebook cell: only reformatting runs.
    Cell,
}

/// Which stages the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageToggles {
    pub remove_unused: bool,
    pub sort_imports: bool,
    pub reformat: bool,
}

impl StageToggles {
    pub const ALL: StageToggles = StageToggles {
        remove_unused: true,
        sort_imports: true,
        reformat: true,
    };

    pub const NONE: StageToggles = StageToggles {
        remove_unused: false,
        sort_imports: false,
        reformat: false,
    };

    pub fn from_config(config: &Config) -> Self {
        Self {
            remove_unused: config.autoflake,
            sort_imports: config.isort,
            reformat: config.black,
        }
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::RemoveUnused => self.remove_unused,
            Stage::SortImports => self.sort_imports,
            Stage::Reformat => self.reformat,
        }
    }
}

impl Default for StageToggles {
    fn default() -> Self {
        Self::ALL
    }
}

/// Result of a single transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformed {
    Changed(String),
    /// The source was already canonical.
    Unchanged,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Tool(#[from] ExecutorError),
    /// The transform refused the input, typically a syntax error.
    #[error("{0}")]
    Rejected(String),
}

/// A stage failure, tagged with the stage that raised it.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: TransformError,
}

/// A text-to-text transformation.
pub trait SourceTransform: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, source: &str) -> Result<Transformed, TransformError>;
}

/// A transform backed by an external stdin/stdout tool.
pub struct ExternalTransform {
    tool: ToolDefinition,
    executor: Arc<ToolExecutor>,
}

impl ExternalTransform {
    pub fn new(tool: ToolDefinition, executor: Arc<ToolExecutor>) -> Self {
        Self { tool, executor }
    }
}

impl SourceTransform for ExternalTransform {
    fn name(&self) -> &str {
        self.tool.program()
    }

    fn transform(&self, source: &str) -> Result<Transformed, TransformError> {
        let output = self.executor.format(&self.tool, source)?;
        if output == source {
            Ok(Transformed::Unchanged)
        } else {
            Ok(Transformed::Changed(output))
        }
    }
}

/// The ordered set of stage transforms.
#[derive(Default)]
pub struct Pipeline {
    stages: [Option<Box<dyn SourceTransform>>; 3],
}

impl Pipeline {
    /// An empty pipeline; every stage is skipped until one is registered.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, stage: Stage, transform: impl SourceTransform + 'static) -> Self {
        self.stages[stage.index()] = Some(Box::new(transform));
        self
    }

    /// The external-tool pipeline described by `config`.
    pub fn from_config(config: &Config, executor: Arc<ToolExecutor>) -> Self {
        let registry = ToolRegistry::new(config.tools.clone());
        let mut pipeline = Self::new();

        for (stage, name, args) in [
            (Stage::RemoveUnused, AUTOFLAKE, config.autoflake_options.args()),
            (Stage::SortImports, ISORT, config.isort_options.args()),
            (Stage::Reformat, BLACK, config.black_args()),
        ] {
            if registry.is_overridden(name) {
                log::debug!("Using configured command for {name}; generated options are not passed");
            }
            if let Some(tool) = registry.resolve(name, &args) {
                pipeline = pipeline.with_stage(stage, ExternalTransform::new(tool, Arc::clone(&executor)));
            }
        }

        pipeline
    }

    pub fn transform_for(&self, stage: Stage) -> Option<&dyn SourceTransform> {
        self.stages[stage.index()].as_deref()
    }

    /// Run every enabled stage that is allowed in `mode`, in order.
    ///
    /// With nothing enabled the input comes back unchanged. The first failing
    /// stage aborts the run.
    pub fn run(&self, source: &str, toggles: StageToggles, mode: SourceMode) -> Result<String, PipelineError> {
        let mut current = source.to_string();

        for stage in Stage::ORDER {
            if !toggles.is_enabled(stage) || !stage.runs_in(mode) {
                continue;
            }
            let Some(transform) = self.transform_for(stage) else {
                log::debug!("No transform registered for {stage}, skipping");
                continue;
            };

            match transform.transform(&current) {
                Ok(Transformed::Changed(output)) => current = output,
                Ok(Transformed::Unchanged) => log::debug!("{} left the source unchanged", transform.name()),
                Err(source) => return Err(PipelineError { stage, source }),
            }
        }

        Ok(current)
    }
}

#[cfg(test)]
pub(crate) mod test_transforms {
    //! In-process stand-ins for the external formatters.

    use super::*;

    /// Appends a marker line so tests can see which stages ran and in what order.
    pub struct Marker(pub &'static str);

    impl SourceTransform for Marker {
        fn name(&self) -> &str {
            self.0
        }

        fn transform(&self, source: &str) -> Result<Transformed, TransformError> {
            Ok(Transformed::Changed(format!("{source}#{}\n", self.0)))
        }
    }

    /// Always fails, like a formatter given invalid syntax.
    pub struct Reject;

    impl SourceTransform for Reject {
        fn name(&self) -> &str {
            "reject"
        }

        fn transform(&self, _source: &str) -> Result<Transformed, TransformError> {
            Err(TransformError::Rejected("cannot parse".to_string()))
        }
    }

    /// A toy style normalizer: one space around `=`, no trailing blanks, final newline.
    ///
    /// Lines that do not look like Python (unbalanced parentheses) are rejected.
    pub struct Spacer;

    impl SourceTransform for Spacer {
        fn name(&self) -> &str {
            "spacer"
        }

        fn transform(&self, source: &str) -> Result<Transformed, TransformError> {
            if source.matches('(').count() != source.matches(')').count() {
                return Err(TransformError::Rejected("unbalanced parentheses".to_string()));
            }

            let mut out = String::new();
            for line in source.lines() {
                let normalized = match line.split_once('=') {
                    Some((lhs, rhs)) if !line.contains("==") => {
                        format!("{} = {}", lhs.trim_end(), rhs.trim_start())
                    }
                    _ => line.trim_end().to_string(),
                };
                out.push_str(&normalized);
                out.push('\n');
            }

            if out == source {
                Ok(Transformed::Unchanged)
            } else {
                Ok(Transformed::Changed(out))
            }
        }
    }
}
