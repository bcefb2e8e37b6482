//! Rayon-backed executor with its own fixed-size pool.

use crate::{Executor, ExecutorError};
use rayon::prelude::*;
use std::fmt;
use std::sync::Arc;

/// Runs jobs on a dedicated rayon pool, separate from rayon's global pool.
///
/// The pool is built once and reused for every batch, so workers are not
/// respawned per page. Cloning shares the same pool.
#[derive(Clone)]
pub struct RayonExecutor {
    pool: Arc<rayon::ThreadPool>,
    num_threads: usize,
}

impl RayonExecutor {
    pub fn with_threads(num_threads: usize) -> Result<Self, ExecutorError> {
        let threads = num_threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("codesheet-worker-{}", i))
            .build()
            .map_err(|e| ExecutorError::PoolBuild {
                threads,
                message: e.to_string(),
            })?;
        log::debug!("[RAYON] Built worker pool with {} threads", threads);
        Ok(Self {
            pool: Arc::new(pool),
            num_threads: threads,
        })
    }
}

impl fmt::Debug for RayonExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RayonExecutor")
            .field("num_threads", &self.num_threads)
            .finish()
    }
}

impl Executor for RayonExecutor {
    fn execute_all<T, R, F>(&self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + Clone + 'static,
    {
        // One job per item; chunks are already sized by the caller.
        self.pool
            .install(|| items.into_par_iter().with_max_len(1).map(f).collect())
    }

    fn execute_all_fallible<T, R, E, F>(&self, items: Vec<T>, f: F) -> Vec<Result<R, E>>
    where
        T: Send + 'static,
        R: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Result<R, E> + Send + Sync + Clone + 'static,
    {
        self.pool
            .install(|| items.into_par_iter().with_max_len(1).map(f).collect())
    }

    fn parallelism(&self) -> usize {
        self.num_threads
    }

    fn name(&self) -> &'static str {
        "RayonExecutor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn test_rayon_executor_preserves_input_order() {
        let executor = RayonExecutor::with_threads(4).unwrap();
        let results = executor.execute_all((0..50).collect::<Vec<_>>(), |x| x * 2);
        assert_eq!(results, (0..50).map(|x| x * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_rayon_executor_handles_fallible_operations() {
        let executor = RayonExecutor::with_threads(2).unwrap();
        let results: Vec<Result<i32, &str>> =
            executor.execute_all_fallible(vec![1, 2, 0, 4], |x| {
                if x == 0 { Err("division by zero") } else { Ok(10 / x) }
            });
        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
        assert!(results[2].is_err());
    }

    #[test]
    fn test_rayon_executor_stays_within_its_pool() {
        let executor = RayonExecutor::with_threads(2).unwrap();
        let names = Arc::new(Mutex::new(HashSet::new()));
        let _ = executor.execute_all((0..32).collect::<Vec<_>>(), {
            let names = Arc::clone(&names);
            move |_| {
                let name = std::thread::current().name().map(str::to_string);
                names.lock().unwrap().insert(name);
                std::thread::sleep(std::time::Duration::from_micros(200));
            }
        });
        let names = names.lock().unwrap();
        assert!(names.len() <= 2);
        assert!(names.iter().all(|n| n
            .as_deref()
            .is_some_and(|n| n.starts_with("codesheet-worker-"))));
    }

    #[test]
    fn test_zero_threads_is_clamped_to_one() {
        let executor = RayonExecutor::with_threads(0).unwrap();
        assert_eq!(executor.parallelism(), 1);
    }
}
