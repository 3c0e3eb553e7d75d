//! Prompt assembly for a chat turn.

use recollect_rs_protocol::ChatMessage;

/// Prepend retrieved context to `history` as a single system message.
///
/// Blank context leaves the history untouched.
pub fn augment(history: Vec<ChatMessage>, context: &str) -> Vec<ChatMessage> {
    if context.trim().is_empty() {
        return history;
    }
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ChatMessage::system(context));
    messages.extend(history);
    messages
}

/// Build the history a turn sends before augmentation: optional system
/// prompt, the last `window` prior messages, then the new user message.
pub fn build_history(
    system_prompt: Option<&str>,
    prior: &[ChatMessage],
    window: usize,
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut history = Vec::new();
    if let Some(prompt) = system_prompt.filter(|prompt| !prompt.trim().is_empty()) {
        history.push(ChatMessage::system(prompt));
    }
    let start = prior.len().saturating_sub(window);
    history.extend_from_slice(&prior[start..]);
    history.push(ChatMessage::user(user_message));
    history
}

#[cfg(test)]
mod tests {
    use super::{augment, build_history};
    use pretty_assertions::assert_eq;
    use recollect_rs_protocol::{ChatMessage, Role};

    fn history() -> Vec<ChatMessage> {
        vec![
            ChatMessage::user("Hi"),
            ChatMessage::assistant("Hello"),
            ChatMessage::user("What do I like?"),
        ]
    }

    #[test]
    fn empty_context_returns_history() {
        assert_eq!(augment(history(), ""), history());
        assert_eq!(augment(history(), "  \n"), history());
    }

    #[test]
    fn context_is_prepended_once() {
        let messages = augment(history(), "likes tea");
        assert_eq!(messages.len(), history().len() + 1);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, "likes tea");
        assert_eq!(messages[1..].to_vec(), history());
    }

    #[test]
    fn history_window_keeps_latest_messages() {
        let prior = history();
        let built = build_history(Some("Be brief."), &prior, 2, "And now?");
        assert_eq!(
            built,
            vec![
                ChatMessage::system("Be brief."),
                ChatMessage::assistant("Hello"),
                ChatMessage::user("What do I like?"),
                ChatMessage::user("And now?"),
            ]
        );
    }

    #[test]
    fn zero_window_is_single_turn() {
        let built = build_history(None, &history(), 0, "Hello");
        assert_eq!(built, vec![ChatMessage::user("Hello")]);
    }
}
