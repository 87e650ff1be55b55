/// Parallel cell processing for clean-py
///
/// Notebook cells are cleaned independently of each other, so a document's
/// cells are mapped over a fixed-size worker pool. Output order always matches
/// input order.
use rayon::prelude::*;
use std::num::NonZeroUsize;
use std::time::Instant;

/// Configuration for parallel execution
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Enable/disable parallel execution
    pub enabled: bool,
    /// Number of threads to use (None = available parallelism)
    pub thread_count: Option<usize>,
    /// Minimum number of items to enable parallel execution
    pub min_item_count: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            thread_count: None,
            min_item_count: 2,
        }
    }
}

impl ParallelConfig {
    /// `jobs == 0` means one thread per available CPU.
    pub fn from_jobs(jobs: usize, min_item_count: usize) -> Self {
        Self {
            enabled: jobs != 1,
            thread_count: (jobs > 0).then_some(jobs),
            min_item_count,
        }
    }
}

/// Order-preserving parallel map over notebook cells
pub struct CellParallelProcessor {
    config: ParallelConfig,
    pool: Option<rayon::ThreadPool>,
}

impl CellParallelProcessor {
    pub fn new(config: ParallelConfig) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = if config.enabled {
            let threads = config.thread_count.unwrap_or_else(available_parallelism);
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("clean-py-cell-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        Ok(Self { config, pool })
    }

    /// A processor that never spawns threads.
    pub fn sequential() -> Self {
        Self {
            config: ParallelConfig {
                enabled: false,
                ..ParallelConfig::default()
            },
            pool: None,
        }
    }

    pub fn thread_count(&self) -> usize {
        self.pool.as_ref().map_or(1, rayon::ThreadPool::current_num_threads)
    }

    /// Apply `f` to every item, blocking until all are done.
    ///
    /// `f` receives the item's position along with the item.
    pub fn map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(usize, T) -> U + Send + Sync,
    {
        let start = Instant::now();
        let count = items.len();

        let results: Vec<U> = match &self.pool {
            Some(pool) if self.should_use_parallel(count) => pool.install(|| {
                items
                    .into_par_iter()
                    .enumerate()
                    .map(|(i, item)| f(i, item))
                    .collect()
            }),
            _ => items.into_iter().enumerate().map(|(i, item)| f(i, item)).collect(),
        };

        let duration = start.elapsed();
        if duration.as_millis() > 1000 {
            log::debug!("Processing {count} cells took {duration:?}");
        }

        results
    }

    /// Determine if parallel processing should be used
    pub fn should_use_parallel(&self, item_count: usize) -> bool {
        self.config.enabled && self.pool.is_some() && item_count >= self.config.min_item_count
    }
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
