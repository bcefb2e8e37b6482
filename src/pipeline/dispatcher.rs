//! Fan-out and fan-in of one page's render jobs.
//!
//! A page's tasks are cut into contiguous chunks, one per worker, and the
//! chunks run together on the executor. The page only comes back once every
//! chunk has finished; results are then put back in index order no matter
//! which chunk finished first.

use crate::error::ExportError;
use crate::symbol::{RenderResult, RenderTask, SymbolRenderer};
use codesheet_executor::Executor;
use log::{debug, trace};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Upper bound on render workers unless configured otherwise.
pub const DEFAULT_WORKER_CAP: usize = 6;

/// `min(available cores, cap)`, and never less than one.
pub fn worker_count(cap: usize) -> usize {
    num_cpus::get().min(cap).max(1)
}

/// Splits `items` into contiguous chunks of `ceil(n / workers)` items each.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }
    let chunk_size = items.len().div_ceil(workers.max(1));
    let mut chunks = Vec::with_capacity(workers);
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        chunks.push(items.by_ref().take(chunk_size).collect());
    }
    chunks
}

struct ChunkFailure {
    index: usize,
    reason: String,
}

pub struct Dispatcher<E: Executor> {
    executor: E,
    renderer: Arc<dyn SymbolRenderer>,
    workers: usize,
}

impl<E: Executor> Dispatcher<E> {
    pub fn new(executor: E, renderer: Arc<dyn SymbolRenderer>, workers: usize) -> Self {
        Self { executor, renderer, workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Renders every task of one page and returns the results in ascending index order.
    ///
    /// Any failing chunk fails the whole page with [`ExportError::WorkerFailure`].
    pub fn render_page(&self, tasks: Vec<RenderTask>) -> Result<Vec<RenderResult>, ExportError> {
        let expected = tasks.len();
        let chunks: Vec<(usize, Vec<RenderTask>)> = partition(tasks, self.workers).into_iter().enumerate().collect();
        debug!(
            "[DISPATCH] {} tasks in {} chunks on {} ({} threads)",
            expected,
            chunks.len(),
            self.executor.name(),
            self.executor.parallelism()
        );

        let renderer = Arc::clone(&self.renderer);
        let outcomes = self
            .executor
            .execute_all_fallible(chunks, move |(worker_id, chunk)| render_chunk(&*renderer, worker_id, chunk));

        let mut results = Vec::with_capacity(expected);
        let mut failures: Vec<ChunkFailure> = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(chunk_results) => results.extend(chunk_results),
                Err(failure) => failures.push(failure),
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.index);
            return Err(ExportError::WorkerFailure {
                indices: failures.iter().map(|f| f.index).collect(),
                reason: failures.swap_remove(0).reason,
            });
        }

        results.sort_by_key(|r| r.index);
        Ok(results)
    }
}

/// Runs one chunk on a worker thread. Stops at the first item that fails or panics.
fn render_chunk(
    renderer: &dyn SymbolRenderer,
    worker_id: usize,
    chunk: Vec<RenderTask>,
) -> Result<Vec<RenderResult>, ChunkFailure> {
    trace!("[WORKER-{}] Rendering {} items", worker_id, chunk.len());
    let mut results = Vec::with_capacity(chunk.len());
    for task in chunk {
        let outcome = catch_unwind(AssertUnwindSafe(|| renderer.render(&task)));
        match outcome {
            Ok(Ok(png)) => results.push(RenderResult { index: task.index, png }),
            Ok(Err(e)) => {
                debug!("[WORKER-{}] Item #{} failed: {}", worker_id, task.index, e);
                return Err(ChunkFailure { index: task.index, reason: e.to_string() });
            }
            Err(payload) => {
                let reason = format!("worker panicked: {}", panic_message(&*payload));
                debug!("[WORKER-{}] Item #{} {}", worker_id, task.index, reason);
                return Err(ChunkFailure { index: task.index, reason });
            }
        }
    }
    Ok(results)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
