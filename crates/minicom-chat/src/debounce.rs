use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Keyed one-shot timers.
///
/// Arming a key schedules its action after `delay`; arming it again before
/// expiry aborts the previous timer. Each arm fires at most once.
pub struct Debouncer<K> {
    delay: Duration,
    timers: Mutex<HashMap<K, JoinHandle<()>>>,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Send + 'static,
{
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timers: Mutex::new(HashMap::new()),
        }
    }

    pub async fn arm<F>(&self, key: K, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            sleep(delay).await;
            action.await;
        });
        if let Some(previous) = self.timers.lock().await.insert(key, handle) {
            previous.abort();
        }
    }

    /// Drop the pending timer for `key`. Returns `true` if one was still waiting.
    pub async fn cancel(&self, key: &K) -> bool {
        match self.timers.lock().await.remove(key) {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub async fn is_armed(&self, key: &K) -> bool {
        self.timers
            .lock()
            .await
            .get(key)
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, handle) in self.timers.get_mut().drain() {
            handle.abort();
        }
    }
}
