use chrono::DateTime;

use minicom_chat::TypingMap;
use minicom_types::{Message, MessageStatus, Thread, ThreadState};

pub const OFFLINE_NOTICE: &str =
    "You are offline. Have you tried unplugging and plugging back in your internet magic box?";
pub const BACK_ONLINE_NOTICE: &str = "Back online.";
pub const FAULT_NOTICE: &str =
    "Something went wrong. Type /reset to clear local chat data and start over.";

pub const HELP: &str = "\
Commands:
  visitor <text>   (or v <text>)  send as the visitor
  agent <text>     (or a <text>)  reply in the active thread
  /type <visitor|agent>           signal a keystroke
  /blur <visitor|agent>           stop typing now
  /threads                        agent inbox
  /open <thread>                  focus a thread (id prefix is enough) and mark it read
  /read                           mark the active thread read
  /show [visitor|agent]           messages of that side's current thread
  /retry <message>                resend a failed message
  /offline, /online               toggle the network
  /reset                          clear all chat data
  /help, /quit";

pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn clock(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

fn status_mark(message: &Message) -> String {
    match message.status {
        MessageStatus::Sending => "…".to_string(),
        MessageStatus::Sent if message.read_at.is_some() => "✓✓".to_string(),
        MessageStatus::Sent => "✓".to_string(),
        MessageStatus::Error => format!("failed, /retry {}", short_id(&message.id)),
    }
}

pub fn message_line(message: &Message) -> String {
    format!(
        "[{}] {}: {} ({})",
        clock(message.timestamp),
        message.sender_id.label(),
        message.text,
        status_mark(message)
    )
}

pub fn thread_lines(thread: &ThreadState, typing: &TypingMap) -> Vec<String> {
    let mut lines = vec![format!("-- thread {} --", short_id(&thread.id))];
    if thread.messages.is_empty() {
        lines.push("(no messages yet)".to_string());
    }
    lines.extend(thread.messages.iter().map(message_line));
    if let Some(Some(typist)) = typing.get(&thread.id) {
        lines.push(format!("{} is typing…", typist.label()));
    }
    lines
}

/// One line per thread summary, unread first
pub fn inbox_lines(threads: &[Thread], typing: &TypingMap, active: Option<&str>) -> Vec<String> {
    let listed: Vec<_> = threads
        .iter()
        .filter(|t| t.last_message_at > 0)
        .collect();
    if listed.is_empty() {
        return vec!["No conversations yet.".to_string()];
    }

    listed
        .into_iter()
        .map(|t| {
            let marker = if Some(t.id.as_str()) == active { ">" } else { " " };
            let unread = if t.unread_count > 0 {
                format!(" [{} unread]", t.unread_count)
            } else {
                String::new()
            };
            let activity = match typing.get(&t.id) {
                Some(Some(typist)) => format!("{} is typing…", typist.label()),
                _ => format!("{}: {}", t.last_message_sender_id.label(), t.last_message_preview),
            };
            format!(
                "{} {} {}{}  {}",
                marker,
                short_id(&t.id),
                clock(t.last_message_at),
                unread,
                activity
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use minicom_types::SenderId;

    fn summary(id: &str, unread_count: usize, last_message_at: i64) -> Thread {
        Thread {
            id: id.to_string(),
            last_message_preview: "Hello".to_string(),
            last_message_at,
            unread_count,
            last_message_sender_id: SenderId::Visitor,
        }
    }

    #[test]
    fn test_empty_threads_are_not_listed() {
        let lines = inbox_lines(&[summary("abc", 0, 0)], &TypingMap::new(), None);
        assert_eq!(lines, vec!["No conversations yet.".to_string()]);
    }

    #[test]
    fn test_inbox_marks_active_and_unread() {
        let threads = [summary("aaaaaaaa-1", 2, 1000), summary("bbbbbbbb-2", 0, 500)];
        let lines = inbox_lines(&threads, &TypingMap::new(), Some("bbbbbbbb-2"));
        assert!(lines[0].starts_with("  aaaaaaaa"));
        assert!(lines[0].contains("[2 unread]"));
        assert!(lines[1].starts_with("> bbbbbbbb"));
        assert!(lines[1].ends_with("Visitor: Hello"));
    }

    #[test]
    fn test_typing_replaces_the_preview() {
        let mut typing = TypingMap::new();
        typing.insert("aaaaaaaa-1".to_string(), Some(SenderId::Agent));
        let lines = inbox_lines(&[summary("aaaaaaaa-1", 0, 1000)], &typing, None);
        assert!(lines[0].ends_with("Agent is typing…"));
    }

    #[test]
    fn test_failed_messages_point_at_retry() {
        let message = Message::outgoing("t", SenderId::Visitor, "Hi").with_status(MessageStatus::Error);
        let line = message_line(&message);
        assert!(line.contains(&format!("/retry {}", short_id(&message.id))));
    }

    #[test]
    fn test_short_id_tolerates_short_input() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
    }
}
