//! Registry for work that must outlive the response that scheduled it.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

/// Hands futures to the runtime immediately and keeps their handles so
/// `wait` can drain everything scheduled so far. The server drains the
/// registry during shutdown; tests drain it before asserting on counter
/// state.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `task` now; the response does not wait for it.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);

        // A poisoned registry only loses the handle; the task itself keeps
        // running detached.
        if let Ok(mut handles) = self.handles.lock() {
            // Drop handles of tasks that already ran to completion, keeping
            // the registry bounded by the number of tasks still in flight.
            handles.retain(|scheduled| !scheduled.is_finished());
            handles.push(handle);
        }
    }

    /// Await every task scheduled so far, including tasks scheduled while
    /// draining.
    pub async fn wait(&self) {
        loop {
            let drained: Vec<JoinHandle<()>> = match self.handles.lock() {
                Ok(mut handles) => handles.drain(..).collect(),
                Err(_) => return,
            };

            if drained.is_empty() {
                return;
            }

            for handle in drained {
                if let Err(e) = handle.await {
                    tracing::warn!("Background task failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn wait_drains_every_scheduled_task() {
        let tasks = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            tasks.spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        tasks.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn wait_on_an_empty_registry_returns_immediately() {
        let tasks = BackgroundTasks::new();
        tasks.wait().await;
    }

    #[tokio::test]
    async fn spawn_reaps_handles_of_finished_tasks() {
        let tasks = BackgroundTasks::new();

        let gate = Arc::new(tokio::sync::Notify::new());
        let held = Arc::clone(&gate);
        tasks.spawn(async move { held.notified().await });

        let (done, mut completions) = tokio::sync::mpsc::channel(8);
        for _ in 0..8 {
            let done = done.clone();
            tasks.spawn(async move {
                let _ = done.send(()).await;
            });
        }
        for _ in 0..8 {
            let _ = completions.recv().await;
        }

        // The next spawn releases the eight finished handles but keeps the
        // task still parked on the gate.
        tasks.spawn(async {});
        assert_eq!(tasks.handles.lock().unwrap().len(), 2);

        gate.notify_one();
        tasks.wait().await;
    }

    #[tokio::test]
    async fn clones_share_one_registry() {
        let tasks = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let cloned = tasks.clone();
        let task_counter = Arc::clone(&counter);
        cloned.spawn(async move {
            task_counter.fetch_add(1, Ordering::SeqCst);
        });

        tasks.wait().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
