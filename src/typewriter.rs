//! Chat typewriter: drains the latest assistant message's `full_text` into
//! `text` one character per tick, independently of the section reveal.

use crate::types::{ChatMessage, ChatRole};

/// Append a message. A new user or assistant message finalises any assistant
/// message still typing so nothing is left half-written.
///
/// Returns the id of the message if it needs typing.
pub fn append(messages: &mut Vec<ChatMessage>, message: ChatMessage) -> Option<String> {
    if message.role != ChatRole::System {
        for m in messages.iter_mut().filter(|m| m.is_typing) {
            finalise(m);
        }
    }

    let typing = message.is_typing.then(|| message.id.clone());
    messages.push(message);
    typing
}

/// Type one character of `message_id`.
///
/// Only the most recent assistant message is ever typed; a tick for any other
/// message is stale and does nothing. Returns true while more ticks are needed.
pub fn step(messages: &mut [ChatMessage], message_id: &str) -> bool {
    let Some(message) = messages.iter_mut().rev().find(|m| m.role == ChatRole::Assistant) else {
        return false;
    };
    if message.id != message_id || !message.is_typing {
        log::debug!("Discarding chat tick for {}", message_id);
        return false;
    }

    let full = message.full_text.as_deref().unwrap_or_default();
    if let Some(c) = full.get(message.text.len()..).and_then(|rest| rest.chars().next()) {
        message.text.push(c);
    }
    if message.text.len() >= full.len() {
        message.is_typing = false;
        return false;
    }
    true
}

fn finalise(message: &mut ChatMessage) {
    if let Some(full) = &message.full_text {
        message.text = full.clone();
    }
    message.is_typing = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_one_char_per_step() {
        let mut messages = Vec::new();
        let id = append(&mut messages, ChatMessage::assistant("Hi!")).unwrap();

        assert!(step(&mut messages, &id));
        assert_eq!(messages[0].text, "H");
        assert!(step(&mut messages, &id));
        assert!(!step(&mut messages, &id));
        assert_eq!(messages[0].text, "Hi!");
        assert!(!messages[0].is_typing);
    }

    #[test]
    fn test_new_assistant_message_finalises_previous() {
        let mut messages = Vec::new();
        let first = append(&mut messages, ChatMessage::assistant("First reply")).unwrap();
        step(&mut messages, &first);

        append(&mut messages, ChatMessage::user("next question"));
        assert_eq!(messages[0].text, "First reply");
        assert!(!messages[0].is_typing);

        // Stale tick for the finalised message is a no-op
        assert!(!step(&mut messages, &first));
        assert_eq!(messages[0].text, "First reply");
    }

    #[test]
    fn test_system_message_does_not_interrupt_typing() {
        let mut messages = Vec::new();
        let id = append(&mut messages, ChatMessage::assistant("Working")).unwrap();
        append(&mut messages, ChatMessage::system("Planning…"));
        assert!(messages[0].is_typing);
        assert!(step(&mut messages, &id));
        assert_eq!(messages[0].text, "W");
    }

    #[test]
    fn test_multibyte_text() {
        let mut messages = Vec::new();
        let id = append(&mut messages, ChatMessage::assistant("ॐ ok")).unwrap();
        while step(&mut messages, &id) {}
        assert_eq!(messages[0].text, "ॐ ok");
    }

    #[test]
    fn test_empty_assistant_message_needs_no_typing() {
        let mut messages = Vec::new();
        assert!(append(&mut messages, ChatMessage::assistant("")).is_none());
    }
}
