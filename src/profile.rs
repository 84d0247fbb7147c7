use std::thread;

use tracing::warn;

/// Host resources relevant to the all-pairs selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemProfile {
    pub logical_cores: usize,
    pub worker_threads: usize,
}

impl SystemProfile {
    pub fn detect() -> Self {
        let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

        // Single core: keep one worker, splitting buys nothing.
        if cores <= 1 {
            warn!(cores, "single core detected, selection runs on one worker");
            Self { logical_cores: cores, worker_threads: 1 }
        } else {
            Self { logical_cores: cores, worker_threads: cores }
        }
    }

    /// Apply an explicit `--threads` override. Zero is treated as one.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        if let Some(n) = threads {
            self.worker_threads = n.max(1);
        }
        self
    }

    /// Size the global rayon pool. Only the first call in a process wins.
    pub fn install(&self) -> Result<(), rayon::ThreadPoolBuildError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_threads)
            .build_global()
    }
}
