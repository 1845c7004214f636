// src/split/dispatch.rs
use std::sync::Mutex;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, info, warn};

use crate::error::SplitError;
use crate::split::task::ProjectTask;
use crate::split::write::write_batch;

// Parallel writing only pays off once there are a few projects to fan out.
const PARALLEL_MIN_PROJECTS: usize = 3;
const MAX_WORKERS: usize = 8;

/// Caller-supplied receiver for whole-percent completion updates.
pub type ProgressSink<'a> = &'a (dyn Fn(u8) + Send + Sync);

/// Runs project tasks sequentially or fanned out over a bounded worker pool.
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: usize,
}

impl Dispatcher {
    /// `max_workers` overrides the derived ceiling. `None` sizes the pool to
    /// 75% of the detected execution units, clamped to `[1, 8]`.
    pub fn new(max_workers: Option<usize>) -> Self {
        let workers = match max_workers {
            Some(n) => n.max(1),
            None => derive_worker_ceiling(),
        };
        Self { workers }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Write every batch of every task, reporting per-project completion to
    /// `sink`. On failure the already-running chunks still finish before the
    /// first error is returned.
    pub fn run(&self, tasks: &[ProjectTask], sink: Option<ProgressSink>) -> Result<(), SplitError> {
        if tasks.is_empty() {
            return Ok(());
        }
        let tracker = ProgressTracker::new(tasks.len(), sink);
        if tasks.len() >= PARALLEL_MIN_PROJECTS && self.workers > 1 {
            self.run_parallel(tasks, &tracker)
        } else {
            debug!(projects = tasks.len(), "writing batches sequentially");
            tasks.iter().try_for_each(|task| run_task(task, &tracker))
        }
    }

    fn run_parallel(
        &self,
        tasks: &[ProjectTask],
        tracker: &ProgressTracker,
    ) -> Result<(), SplitError> {
        // contiguous chunks, one worker per chunk, sequential inside a chunk
        let chunk_size = tasks.len().div_ceil(self.workers);
        debug!(
            projects = tasks.len(),
            workers = self.workers,
            chunk_size,
            "writing batches in parallel"
        );
        match ThreadPoolBuilder::new().num_threads(self.workers).build() {
            Ok(pool) => pool.install(|| {
                tasks.par_chunks(chunk_size).try_for_each(|chunk| {
                    chunk.iter().try_for_each(|task| run_task(task, tracker))
                })
            }),
            Err(e) => {
                warn!(error = %e, "worker pool unavailable, writing sequentially");
                tasks.iter().try_for_each(|task| run_task(task, tracker))
            }
        }
    }
}

// 75% of detected units, never below 1 or above MAX_WORKERS.
fn derive_worker_ceiling() -> usize {
    (num_cpus::get() * 3 / 4).clamp(1, MAX_WORKERS)
}

fn run_task(task: &ProjectTask, tracker: &ProgressTracker) -> Result<(), SplitError> {
    for batch in &task.batches {
        write_batch(&task.dir, batch)?;
    }
    info!(project = %task.project, batches = task.batch_count(), "project complete");
    tracker.project_done();
    Ok(())
}

struct ProgressTracker<'a> {
    total: usize,
    done: Mutex<usize>,
    sink: Option<ProgressSink<'a>>,
}

impl<'a> ProgressTracker<'a> {
    fn new(total: usize, sink: Option<ProgressSink<'a>>) -> Self {
        Self {
            total,
            done: Mutex::new(0),
            sink,
        }
    }

    /// Increment and emit while holding the lock, so percentages reaching the
    /// sink can never regress even when completions race.
    fn project_done(&self) {
        let mut done = self.done.lock().unwrap_or_else(|e| e.into_inner());
        *done += 1;
        if let Some(sink) = self.sink {
            let percent = (*done as f64 / self.total as f64 * 100.0).round().min(100.0) as u8;
            sink(percent);
        }
    }
}
