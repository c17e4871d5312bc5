//! Scripted gateway for orchestrator and router tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmError, LlmGateway};
use crate::models::chat::ChatMessage;

/// Replays queued replies in order and records every prompt it receives.
/// An exhausted queue answers with `LlmError::EmptyContent`.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
    histories: Mutex<Vec<usize>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, status: u16, message: &str) -> Self {
        self.replies.lock().unwrap().push_back(Err(LlmError::Api {
            status,
            message: message.to_string(),
        }));
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Transcript length seen by each `chat` call.
    pub fn history_lengths(&self) -> Vec<usize> {
        self.histories.lock().unwrap().clone()
    }

    fn next_reply(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.next_reply(prompt)
    }

    async fn chat(&self, history: &[ChatMessage], message: &str) -> Result<String, LlmError> {
        self.histories.lock().unwrap().push(history.len());
        self.next_reply(message)
    }
}
