//! UI-agnostic chat session state
//!
//! This module contains the conversation data shared by any front end
//! (the terminal UI, tests, a future desktop shell) and doesn't depend on
//! any specific UI framework.

use serde::{Deserialize, Serialize};

use crate::latex::convert_to_latex;

/// Greeting shown before the student has said anything.
pub const GREETING: &str = "Hi! I'm your math tutor. What problem are you working on today?";

/// The message shown in place of a response when the model server can't be reached.
pub fn connection_fallback(model: &str) -> String {
    format!(
        "I'm having trouble connecting to the math engine. Please ensure Ollama is running locally with the {} model installed.",
        model
    )
}

/// A chat message in the tutoring conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A rendered chat bubble: formatted markup plus who said it
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMessage {
    pub text: String,
    pub is_from_user: bool,
}

/// Conversation history, display list and the single in-flight flag.
///
/// History holds the raw turns sent to the model; the display list holds
/// the formatted markup the UI renders. Both only ever grow.
#[derive(Debug, Clone)]
pub struct ChatSession {
    history: Vec<ChatMessage>,
    messages: Vec<DisplayMessage>,
    busy: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            messages: vec![DisplayMessage {
                text: GREETING.to_string(),
                is_from_user: false,
            }],
            busy: false,
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn messages(&self) -> &[DisplayMessage] {
        &self.messages
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Start a turn from raw user input.
    ///
    /// Returns the history to send to the model, or `None` when the input
    /// is blank or a previous turn is still waiting on the model.
    pub fn begin_turn(&mut self, input: &str) -> Option<Vec<ChatMessage>> {
        if input.trim().is_empty() || self.busy {
            return None;
        }

        self.busy = true;
        self.messages.push(DisplayMessage {
            text: convert_to_latex(input),
            is_from_user: true,
        });
        self.history.push(ChatMessage::user(input));

        Some(self.history.clone())
    }

    /// Finish the in-flight turn with the (already sanitized) model response.
    pub fn complete_turn(&mut self, response: &str) {
        self.messages.push(DisplayMessage {
            text: convert_to_latex(response),
            is_from_user: false,
        });
        self.history.push(ChatMessage::assistant(response));
        self.busy = false;
    }

    /// Finish the in-flight turn without a response. History keeps the user
    /// turn but gains no assistant turn.
    pub fn fail_turn(&mut self, notice: impl Into<String>) {
        self.messages.push(DisplayMessage {
            text: notice.into(),
            is_from_user: false,
        });
        self.busy = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_shows_greeting_only() {
        let session = ChatSession::new();
        assert!(session.history().is_empty());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].text, GREETING);
        assert!(!session.messages()[0].is_from_user);
    }

    #[test]
    fn test_begin_turn_formats_display_but_keeps_raw_history() {
        let mut session = ChatSession::new();
        let sent = session.begin_turn("what is 1/2 of 10").unwrap();

        assert!(session.is_busy());
        assert_eq!(sent, vec![ChatMessage::user("what is 1/2 of 10")]);
        assert_eq!(
            session.messages()[1].text,
            "what is  \\(\\frac{1}{2}\\)  of 10"
        );
        assert!(session.messages()[1].is_from_user);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let mut session = ChatSession::new();
        assert!(session.begin_turn("   ").is_none());
        assert!(!session.is_busy());
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn test_second_submission_rejected_while_busy() {
        let mut session = ChatSession::new();
        assert!(session.begin_turn("first").is_some());
        assert!(session.begin_turn("second").is_none());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_complete_turn_appends_assistant() {
        let mut session = ChatSession::new();
        session.begin_turn("help").unwrap();
        session.complete_turn("Try dividing both sides.");

        assert!(!session.is_busy());
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].role, ChatRole::Assistant);
        assert_eq!(session.messages().len(), 3);
        assert!(!session.messages()[2].is_from_user);
    }

    #[test]
    fn test_fail_turn_leaves_history_consistent() {
        let mut session = ChatSession::new();
        session.begin_turn("help").unwrap();
        session.fail_turn(connection_fallback("qwen3"));

        assert!(!session.is_busy());
        assert_eq!(session.history(), &[ChatMessage::user("help")]);
        assert!(session.messages().last().unwrap().text.contains("qwen3 model installed"));
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
