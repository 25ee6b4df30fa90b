//! Client-side AI chat state.
//!
//! `ChatSession` holds the conversation and the loading flag. Sending is a
//! two-step exchange around the one suspension point: [`ChatSession::begin`]
//! records the user message and produces the request, the host performs the
//! HTTP call, and [`ChatSession::complete`] records the reply and applies any
//! accepted grid to the editor. Only one request may be outstanding.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use crate::command::AiCommand;
use crate::consts::GENERATION_FAILED_REPLY;
use crate::editor::{Action, Editor};
use crate::grid::Grid;
use crate::protocol::{AiRequest, AiResponse, ChatMessage};

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a persisted conversation.
    #[must_use]
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages, loading: false }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn can_send(&self, input: &str) -> bool {
        !self.loading && !input.trim().is_empty()
    }

    /// Record a user message and build the request for it.
    ///
    /// Returns `None` (and records nothing) while a request is in flight or
    /// when `input` is blank.
    pub fn begin(&mut self, input: &str, grid: &Grid) -> Option<AiRequest> {
        if !self.can_send(input) {
            return None;
        }
        self.messages.push(ChatMessage::user(input.trim()));
        self.loading = true;
        Some(AiRequest::new(self.messages.clone(), grid))
    }

    /// Finish the in-flight request.
    ///
    /// A response appends its reply and, for an accepted grid replacement,
    /// replaces the editor's grid. A failed call appends a fixed apology and
    /// leaves the editor untouched.
    pub fn complete<E>(&mut self, result: Result<AiResponse, E>, editor: &mut Editor) -> Action {
        self.loading = false;
        match result {
            Ok(response) => {
                let command = AiCommand::from(response);
                self.messages.push(ChatMessage::assistant(command.reply()));
                command.apply(editor)
            }
            Err(_) => {
                self.messages.push(ChatMessage::assistant(GENERATION_FAILED_REPLY));
                Action::None
            }
        }
    }

    /// Start a new chat.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
