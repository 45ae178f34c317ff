use minicom_types::Thread;

/// Ordering applied to the thread summary list
pub trait OrderingPolicy: Send + Sync {
    fn order(&self, threads: &mut [Thread]);
}

/// Threads with more unread messages first, then the most recent activity.
///
/// Full ties keep their input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreadThenRecent;

impl OrderingPolicy for UnreadThenRecent {
    fn order(&self, threads: &mut [Thread]) {
        threads.sort_by(|a, b| {
            b.unread_count
                .cmp(&a.unread_count)
                .then_with(|| b.last_message_at.cmp(&a.last_message_at))
        });
    }
}

/// Sort a list of summaries with the default policy
pub fn sort_threads(mut threads: Vec<Thread>) -> Vec<Thread> {
    UnreadThenRecent.order(&mut threads);
    threads
}
