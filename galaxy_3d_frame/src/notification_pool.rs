//! Completion notification pool.
//!
//! Frame completion callbacks run here instead of on throwaway threads, so
//! the number of concurrent callbacks is bounded and dropping the pool waits
//! for queued notifications instead of abandoning them.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_executor::Executor;
use crate::{frame_debug, frame_error};

/// A fixed-size pool of notification threads.
///
/// # Example
///
/// ```ignore
/// let pool = NotificationPool::new(2)?;
/// pool.spawn(|| println!("frame done"));
/// drop(pool); // runs anything still queued, then joins
/// ```
pub struct NotificationPool {
    executor: Arc<Executor<'static>>,
    threads: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    completed: Arc<AtomicUsize>,
}

impl NotificationPool {
    /// Create a pool with `num_threads` workers.
    ///
    /// # Panics
    ///
    /// Panics if num_threads is 0.
    pub fn new(num_threads: usize) -> std::io::Result<Self> {
        assert!(num_threads > 0, "NotificationPool must have at least one thread");

        let executor = Arc::new(Executor::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::with_capacity(num_threads);

        for i in 0..num_threads {
            let exec = Arc::clone(&executor);
            let shutdown_flag = Arc::clone(&shutdown);

            let handle = thread::Builder::new()
                .name(format!("galaxy3d-notify-{}", i))
                .spawn(move || loop {
                    if exec.try_tick() {
                        continue;
                    }
                    // Queue drained; only now honor shutdown
                    if shutdown_flag.load(Ordering::Acquire) {
                        break;
                    }
                    thread::sleep(Duration::from_millis(1));
                })?;

            threads.push(handle);
        }

        frame_debug!("galaxy3d::NotificationPool", "Created with {} threads", num_threads);

        Ok(Self {
            executor,
            threads,
            shutdown,
            completed: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Default worker count: max(1, num_cpus - 1)
    pub fn default_threads() -> usize {
        num_cpus::get().saturating_sub(1).max(1)
    }

    /// Queue a job.
    ///
    /// A panicking job is logged and swallowed; it never takes a worker down.
    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let completed = Arc::clone(&self.completed);
        self.executor
            .spawn(async move {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    let reason = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    frame_error!("galaxy3d::NotificationPool", "Notification panicked: {}", reason);
                }
                completed.fetch_add(1, Ordering::AcqRel);
            })
            .detach();
    }

    /// Number of worker threads
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Number of jobs that have finished running (including panicked ones)
    pub fn completed_count(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

impl Drop for NotificationPool {
    fn drop(&mut self) {
        frame_debug!("galaxy3d::NotificationPool", "Shutting down {} threads", self.threads.len());

        self.shutdown.store(true, Ordering::Release);

        let current = thread::current().id();
        for handle in std::mem::take(&mut self.threads) {
            // Never join ourselves when the last owner drops us from a job
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                frame_error!("galaxy3d::NotificationPool", "Notification thread panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "notification_pool_tests.rs"]
mod tests;
