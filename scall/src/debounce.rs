//! Last-write-wins deferred invocation keyed by an arbitrary slot.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use scall::DebounceScheduler;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let scheduler = DebounceScheduler::new();
//! scheduler.schedule("impression", Duration::from_millis(5), || async {});
//! assert!(scheduler.is_pending(&"impression"));
//! assert!(scheduler.cancel(&"impression"));
//! assert_eq!(scheduler.pending_count(), 0);
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use scommon::IdSequence;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct PendingTimer {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Debug)]
struct SchedulerInner<K> {
    pending: Mutex<HashMap<K, PendingTimer>>,
    generations: IdSequence,
}

/// Cheaply cloneable; clones share the same pending timers.
#[derive(Debug)]
pub struct DebounceScheduler<K> {
    inner: Arc<SchedulerInner<K>>,
}

impl<K> Clone for DebounceScheduler<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> Default for DebounceScheduler<K> {
    fn default() -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                pending: Mutex::new(HashMap::new()),
                generations: IdSequence::new(),
            }),
        }
    }
}

impl<K> DebounceScheduler<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending timer for `key` and arms a new one.
    ///
    /// Returns `true` when a pending action was superseded. `action` runs at
    /// most once, after `delay`, unless superseded or cancelled first. Must be
    /// called from within a tokio runtime.
    pub fn schedule<F, Fut>(&self, key: K, delay: Duration, action: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut pending = self.pending();
        let generation = self.inner.generations.next_id();
        let inner = Arc::clone(&self.inner);
        let timer_key = key.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let fire = {
                let mut pending = inner
                    .pending
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                let current = pending
                    .get(&timer_key)
                    .is_some_and(|timer| timer.generation == generation);
                if current {
                    pending.remove(&timer_key);
                }
                current
            };

            if fire {
                action().await;
            }
        });

        match pending.insert(key, PendingTimer { generation, task }) {
            Some(previous) => {
                previous.task.abort();
                true
            }
            None => false,
        }
    }

    /// Clears the pending timer for `key` without running its action.
    pub fn cancel(&self, key: &K) -> bool {
        match self.pending().remove(key) {
            Some(timer) => {
                timer.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let drained = self.pending().drain().collect::<Vec<_>>();
        for (_, timer) in &drained {
            timer.task.abort();
        }
        drained.len()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> MutexGuard<'_, HashMap<K, PendingTimer>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
