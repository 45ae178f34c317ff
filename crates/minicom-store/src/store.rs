use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use minicom_persist::{StorageAdapter, ThreadMap};
use minicom_types::{Message, MessageStatus, SenderId, Thread, ThreadState};

use crate::ordering::{OrderingPolicy, UnreadThenRecent};
use crate::summary::thread_record_to_list;

pub const DEFAULT_PREVIEW_LENGTH: usize = 40;

/// Result of a message lookup by id
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRef {
    pub thread_id: String,
    pub message: Message,
}

#[derive(Default)]
struct StoreState {
    threads: ThreadMap,
    /// message id -> (thread id, position in that thread)
    index: HashMap<String, (String, usize)>,
    active_thread_id: Option<String>,
    visitor_thread_id: Option<String>,
}

impl StoreState {
    fn ensure_thread(&mut self, thread_id: &str) -> &mut ThreadState {
        self.threads
            .entry(thread_id.to_string())
            .or_insert_with(|| ThreadState::new(thread_id))
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (thread_id, thread) in &self.threads {
            for (pos, msg) in thread.messages.iter().enumerate() {
                self.index.insert(msg.id.clone(), (thread_id.clone(), pos));
            }
        }
    }

    fn summaries(&self, preview_length: usize, ordering: &dyn OrderingPolicy) -> Vec<Thread> {
        let mut list = thread_record_to_list(self.threads.values(), preview_length);
        ordering.order(&mut list);
        list
    }
}

/// Authoritative thread map of one instance.
///
/// Cloning yields another handle to the same state. Every mutation re-sorts
/// the touched thread by timestamp, rebuilds the message index, writes the
/// snapshot through the [`StorageAdapter`] and bumps the revision returned by
/// [`ThreadStore::changes`]. Mutations against unknown threads are no-ops.
#[derive(Clone)]
pub struct ThreadStore {
    state: Arc<Mutex<StoreState>>,
    storage: StorageAdapter,
    ordering: Arc<dyn OrderingPolicy>,
    preview_length: usize,
    revision: Arc<watch::Sender<u64>>,
}

impl ThreadStore {
    pub fn new(storage: StorageAdapter) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            storage,
            ordering: Arc::new(UnreadThenRecent),
            preview_length: DEFAULT_PREVIEW_LENGTH,
            revision: Arc::new(revision),
        }
    }

    pub fn with_preview_length(mut self, preview_length: usize) -> Self {
        self.preview_length = preview_length;
        self
    }

    pub fn with_ordering(mut self, ordering: Arc<dyn OrderingPolicy>) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn storage(&self) -> &StorageAdapter {
        &self.storage
    }

    /// Restore state from storage and make sure the visitor thread exists
    pub async fn load(&self) {
        let mut threads = self.storage.load_threads().await;
        for thread in threads.values_mut() {
            thread.sort_by_timestamp();
        }

        let visitor_thread_id = match self.storage.visitor_thread_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("No visitor session available: {}", e);
                None
            }
        };
        let active_thread_id = self.storage.load_active_thread_id().await;

        let mut state = self.state.lock().await;
        state.threads = threads;
        state.visitor_thread_id = visitor_thread_id.clone();
        state.active_thread_id = active_thread_id;
        if let Some(id) = &visitor_thread_id {
            state.ensure_thread(id);
        }
        debug!(
            threads = state.threads.len(),
            visitor_thread_id = ?visitor_thread_id,
            "thread store loaded"
        );
        self.commit(&mut state).await;
    }

    /// Insert a message, creating its thread if needed.
    ///
    /// Returns `false` when a message with the same id is already present.
    pub async fn add_message(&self, msg: Message) -> bool {
        let mut state = self.state.lock().await;
        let thread = state.ensure_thread(&msg.thread_id);
        if thread.contains(&msg.id) {
            debug!(message_id = %msg.id, "duplicate message ignored");
            return false;
        }
        thread.messages.push(msg);
        thread.sort_by_timestamp();
        self.commit(&mut state).await;
        true
    }

    /// Apply `updater` to every message of a thread, then re-sort.
    ///
    /// Returns `false` if the thread does not exist.
    pub async fn update_message_in_thread<F>(&self, thread_id: &str, mut updater: F) -> bool
    where
        F: FnMut(&mut Message) + Send,
    {
        let mut state = self.state.lock().await;
        let Some(thread) = state.threads.get_mut(thread_id) else {
            return false;
        };
        thread.messages.iter_mut().for_each(&mut updater);
        thread.sort_by_timestamp();
        self.commit(&mut state).await;
        true
    }

    pub async fn set_message_status(
        &self,
        thread_id: &str,
        message_id: &str,
        status: MessageStatus,
    ) -> bool {
        self.update_message_in_thread(thread_id, |m| {
            if m.id == message_id {
                m.status = status;
            }
        })
        .await
    }

    /// Stamp `read_at` on every visitor message of the thread
    pub async fn set_thread_read_at(&self, thread_id: &str, read_at: i64) -> bool {
        self.update_message_in_thread(thread_id, |m| {
            if m.sender_id == SenderId::Visitor {
                m.read_at = Some(read_at);
            }
        })
        .await
    }

    pub async fn get_message(&self, message_id: &str) -> Option<MessageRef> {
        let state = self.state.lock().await;
        let (thread_id, pos) = state.index.get(message_id)?;
        let message = state.threads.get(thread_id)?.messages.get(*pos)?.clone();
        Some(MessageRef {
            thread_id: thread_id.clone(),
            message,
        })
    }

    pub async fn threads(&self) -> ThreadMap {
        self.state.lock().await.threads.clone()
    }

    pub async fn thread(&self, thread_id: &str) -> Option<ThreadState> {
        self.state.lock().await.threads.get(thread_id).cloned()
    }

    pub async fn thread_list(&self) -> Vec<Thread> {
        let state = self.state.lock().await;
        state.summaries(self.preview_length, self.ordering.as_ref())
    }

    pub async fn unread_total(&self) -> usize {
        self.thread_list().await.iter().map(|t| t.unread_count).sum()
    }

    /// Focused thread, falling back to the first listed thread when the
    /// stored id no longer exists
    pub async fn active_thread_id(&self) -> Option<String> {
        let state = self.state.lock().await;
        if let Some(id) = &state.active_thread_id {
            if state.threads.contains_key(id) {
                return Some(id.clone());
            }
        }
        state
            .summaries(self.preview_length, self.ordering.as_ref())
            .into_iter()
            .next()
            .map(|t| t.id)
    }

    pub async fn set_active_thread_id(&self, thread_id: Option<String>) {
        let mut state = self.state.lock().await;
        if let Some(id) = &thread_id {
            if let Err(e) = self.storage.save_active_thread_id(id).await {
                warn!("Failed to persist active thread: {}", e);
            }
        }
        state.active_thread_id = thread_id;
        self.revision.send_modify(|rev| *rev += 1);
    }

    pub async fn visitor_thread_id(&self) -> Option<String> {
        self.state.lock().await.visitor_thread_id.clone()
    }

    /// Revision counter, bumped after every change
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Drop all threads and durable entries, keeping the visitor session
    pub async fn reset(&self) {
        if let Err(e) = self.storage.clear().await {
            warn!("Failed to clear storage: {}", e);
        }
        self.reset_keeping(&[]).await;
    }

    /// Drop all threads in memory without clearing storage first.
    ///
    /// The own visitor thread and `keep` survive as empty threads, and the
    /// result is written as the new snapshot. Instances sharing one durable
    /// store clear it once, then call this on each with every instance's
    /// visitor thread so their snapshots agree.
    pub async fn reset_keeping(&self, keep: &[String]) {
        let mut state = self.state.lock().await;
        state.threads.clear();
        state.active_thread_id = None;
        let own = state.visitor_thread_id.clone();
        for id in own.iter().chain(keep) {
            state.ensure_thread(id);
        }
        debug!(threads = state.threads.len(), "thread store reset");
        self.commit(&mut state).await;
    }

    async fn commit(&self, state: &mut StoreState) {
        state.rebuild_index();
        if !state.threads.is_empty() {
            if let Err(e) = self.storage.save_threads(&state.threads).await {
                warn!("Failed to persist threads: {}", e);
            }
        }
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, thread_id: &str, timestamp: i64) -> Message {
        Message {
            id: id.to_string(),
            thread_id: thread_id.to_string(),
            sender_id: SenderId::Visitor,
            text: format!("msg {}", id),
            timestamp,
            status: MessageStatus::Sent,
            read_at: None,
        }
    }

    #[tokio::test]
    async fn test_index_follows_resorting() {
        let store = ThreadStore::new(StorageAdapter::in_memory());
        store.add_message(message("late", "t", 2000)).await;
        store.add_message(message("early", "t", 1000)).await;

        let found = store.get_message("late").await.unwrap();
        assert_eq!(found.thread_id, "t");
        assert_eq!(found.message.timestamp, 2000);
    }

    #[tokio::test]
    async fn test_every_mutation_bumps_revision() {
        let store = ThreadStore::new(StorageAdapter::in_memory());
        let rx = store.changes();
        let before = *rx.borrow();

        store.add_message(message("a", "t", 1)).await;
        store.set_thread_read_at("t", 5).await;

        assert_eq!(*rx.borrow(), before + 2);
    }

    #[tokio::test]
    async fn test_empty_map_is_not_persisted() {
        let storage = StorageAdapter::in_memory();
        let store = ThreadStore::new(storage.clone());

        store.update_message_in_thread("missing", |_| {}).await;

        let raw = storage
            .durable()
            .get(minicom_persist::STORAGE_KEY_THREADS)
            .await
            .unwrap();
        assert_eq!(raw, None);
    }
}
