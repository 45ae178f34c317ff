pub mod ordering;
pub mod store;
pub mod summary;

pub use ordering::{sort_threads, OrderingPolicy, UnreadThenRecent};
pub use store::{MessageRef, ThreadStore, DEFAULT_PREVIEW_LENGTH};
pub use summary::{summarize, thread_record_to_list};
