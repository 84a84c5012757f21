//! In-memory `TextGenerator` for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{InlineImage, LlmError, TextGenerator};

/// Replies with a canned string (or fails) and records every prompt.
pub(crate) struct FakeGenerator {
    reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn respond(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "model overloaded".to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.respond(prompt)
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        _image: &InlineImage,
    ) -> Result<String, LlmError> {
        self.respond(prompt)
    }
}
