//! Persistence worker pool
//!
//! Store work runs on its own bounded runtime so the event loop only ever
//! awaits a `JoinHandle`. In tests the pool can share the test runtime.

use std::future::Future;
use std::io;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

use super::PersistenceError;

/// Handle to the runtime that executes persistence work.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    handle: Handle,
}

impl WorkerPool {
    /// Build a dedicated multi-thread runtime with `threads` workers.
    ///
    /// The caller owns the returned `Runtime` and must keep it alive for as
    /// long as the pool is in use.
    pub fn dedicated(threads: usize) -> io::Result<(Self, Runtime)> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .thread_name("catalog-persistence")
            .enable_all()
            .build()?;

        Ok((Self::new(runtime.handle().clone()), runtime))
    }

    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Share the runtime the caller is already running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Start `task` on the pool without waiting for it.
    pub fn spawn<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(task)
    }

    /// Run `task` on the pool and wait for its result.
    pub async fn run<F, T>(&self, task: F) -> Result<T, PersistenceError>
    where
        F: Future<Output = Result<T, PersistenceError>> + Send + 'static,
        T: Send + 'static,
    {
        self.spawn(task).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_returns_task_result() {
        let pool = WorkerPool::current();
        let value = pool.run(async { Ok::<_, PersistenceError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn panicking_task_is_permanent() {
        let pool = WorkerPool::current();
        let err = pool
            .run(async {
                if true {
                    panic!("unit of work exploded");
                }
                Ok::<_, PersistenceError>(())
            })
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[test]
    fn dedicated_runtime_runs_off_caller_thread() {
        let (pool, runtime) = WorkerPool::dedicated(1).unwrap();
        let caller = std::thread::current().id();

        let worker = runtime.block_on(
            pool.run(async { Ok::<_, PersistenceError>(std::thread::current().id()) }),
        );

        assert_ne!(worker.unwrap(), caller);
    }
}
