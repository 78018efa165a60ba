//! Rayon thread pool sizing for sweep workloads.
//!
//! Use [WorkerPool::install] to run a sweep with a fixed number of worker
//! threads, or rely on Rayon's default (all CPU cores). One simulation
//! run is always single-threaded; only independent runs fan out.

use rayon::ThreadPoolBuilder;

/// Environment variable consulted by [WorkerPool::from_env].
pub const WORKERS_ENV: &str = "ECHELON_WORKERS";

/// Configures how many worker threads are used for parallel execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. If 0, use the Rayon default (all cores).
    pub workers: usize,
}

impl WorkerPool {
    /// Use all available CPU cores (Rayon default).
    pub fn default_workers() -> Self {
        Self::default()
    }

    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Read the worker count from `ECHELON_WORKERS`; unset or unparsable
    /// values fall back to the Rayon default.
    pub fn from_env() -> Self {
        let workers = std::env::var(WORKERS_ENV)
            .ok()
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(0);
        Self { workers }
    }

    /// Run a closure on a thread pool with this worker count. A zero
    /// count uses the global Rayon pool; otherwise a temporary pool with
    /// that many threads is built.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            f()
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.workers)
                .build()
                .expect("worker thread pool");
            pool.install(f)
        }
    }
}
