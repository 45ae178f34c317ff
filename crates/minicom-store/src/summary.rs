use minicom_types::{SenderId, Thread, ThreadState};

/// Project a thread onto its inbox summary
pub fn summarize(thread: &ThreadState, preview_length: usize) -> Thread {
    let last = thread.last_message();
    let unread_count = thread.messages.iter().filter(|m| m.is_unread()).count();

    Thread {
        id: thread.id.clone(),
        last_message_preview: last
            .map(|m| preview(&m.text, preview_length))
            .unwrap_or_default(),
        last_message_at: last.map(|m| m.timestamp).unwrap_or(0),
        unread_count,
        last_message_sender_id: last.map(|m| m.sender_id).unwrap_or(SenderId::Visitor),
    }
}

/// Summaries for every thread, in iteration order (unsorted)
pub fn thread_record_to_list<'a>(
    threads: impl IntoIterator<Item = &'a ThreadState>,
    preview_length: usize,
) -> Vec<Thread> {
    threads
        .into_iter()
        .map(|t| summarize(t, preview_length))
        .collect()
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let mut out: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        out.push('…');
    }
    out
}
