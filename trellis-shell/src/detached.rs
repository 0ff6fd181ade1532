use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};

/// Background navigation work that must not outlive its shell.
///
/// Every task races one shared shutdown signal. After [`close`](Self::close)
/// running tasks are dropped at their next poll and new ones are refused.
pub(crate) struct DetachedTasks {
    shutdown: watch::Sender<bool>,
    running: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for DetachedTasks {
    fn default() -> Self {
        Self {
            shutdown: watch::Sender::new(false),
            running: Mutex::new(Vec::new()),
        }
    }
}

impl DetachedTasks {
    /// Returns `false` when the owner already shut down.
    pub(crate) fn spawn<F>(&self, fut: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            return false;
        }
        let mut shutdown = self.shutdown.subscribe();
        let handle = crate::tokio_runtime::handle().spawn(async move {
            tokio::select! {
                _ = fut => {},
                _ = shutdown.wait_for(|closed| *closed) => {},
            }
        });
        let mut running = self.running.lock();
        running.retain(|task| !task.is_finished());
        running.push(handle);
        true
    }

    pub(crate) fn close(&self) {
        self.shutdown.send_replace(true);
    }

    pub(crate) fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    #[cfg(test)]
    pub(crate) fn running(&self) -> usize {
        self.running
            .lock()
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::sync::Notify;

    use super::DetachedTasks;

    #[tokio::test]
    async fn close_drops_pending_tasks_and_refuses_new_ones() {
        let tasks = DetachedTasks::default();
        let never = Arc::new(Notify::new());
        let waiting = never.clone();
        assert!(tasks.spawn(async move { waiting.notified().await }));
        assert_eq!(tasks.running(), 1);

        tasks.close();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(tasks.running(), 0);
        assert_eq!(Arc::strong_count(&never), 1);
        assert!(!tasks.spawn(async {}));
    }
}
