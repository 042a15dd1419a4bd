use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Pending {
    handle: JoinHandle<()>,
    fire_now: Option<oneshot::Sender<()>>,
    started: Arc<AtomicBool>,
}

impl Pending {
    /// Cancels a still-waiting action. An action already running is returned
    /// so its successor can wait for it instead of overlapping.
    fn supersede(self) -> Option<JoinHandle<()>> {
        if self.started.load(Ordering::SeqCst) {
            Some(self.handle)
        } else {
            self.handle.abort();
            None
        }
    }
}

/// Trailing-edge debouncer keyed by name.
///
/// Each `schedule_after_quiescence` call on a key cancels that key's pending
/// action and restarts its timer; keys never affect one another. Must be used
/// inside a Tokio runtime.
#[derive(Default)]
pub struct Debouncer {
    pending: HashMap<String, Pending>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_after_quiescence<F>(&mut self, key: &str, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let previous = self.pending.remove(key).and_then(Pending::supersede);

        let (fire_now, fired) = oneshot::channel::<()>();
        let started = Arc::new(AtomicBool::new(false));
        let started_flag = started.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = fired => {}
            }
            started_flag.store(true, Ordering::SeqCst);
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            action.await;
        });

        self.pending.insert(
            key.to_string(),
            Pending {
                handle,
                fire_now: Some(fire_now),
                started,
            },
        );
    }

    /// True while the key has an action that has not finished.
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending
            .get(key)
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    pub fn cancel(&mut self, key: &str) {
        if let Some(pending) = self.pending.remove(key) {
            pending.handle.abort();
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, pending) in self.pending.drain() {
            pending.handle.abort();
        }
    }

    /// Fires every waiting action now and waits for all of them to finish.
    pub async fn flush(&mut self) {
        let mut handles = Vec::new();
        for (key, mut entry) in self.pending.drain() {
            if let Some(fire_now) = entry.fire_now.take() {
                let _ = fire_now.send(());
            }
            handles.push((key, entry.handle));
        }

        for (key, handle) in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::error!("Debounced action '{}' failed: {}", key, e);
                }
            }
        }
    }
}
