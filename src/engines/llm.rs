//! Language model seam shared by the generation model and verifier oracle.

use crate::error::{Result, ScribeError};
use std::sync::Arc;
use std::sync::Mutex;

/// Trait for prompt-to-text generation.
///
/// This trait allows swapping implementations (real model backends vs mocks).
/// Both the note-drafting model and the verifier oracle speak this contract.
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt within a token budget.
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Load model assets into memory ahead of the first request.
    fn preload(&self) -> Result<()> {
        Ok(())
    }

    /// Check if the generator is ready
    fn is_ready(&self) -> bool;
}

/// Implement TextGenerator for Arc<T> to allow sharing across runs.
impl<T: TextGenerator + ?Sized> TextGenerator for Arc<T> {
    fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String> {
        (**self).generate(prompt, max_tokens)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn preload(&self) -> Result<()> {
        (**self).preload()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock generator for testing
pub struct MockGenerator {
    model_name: String,
    response: String,
    queued: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    should_fail: bool,
}

impl MockGenerator {
    /// Create a new mock generator with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock generation".to_string(),
            queued: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    /// Configure the mock to return the same response for every call
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to return queued responses in order, falling back
    /// to the fixed response once the queue drains
    pub fn with_responses(self, responses: Vec<String>) -> Self {
        {
            let mut queued = self.queued.lock().unwrap_or_else(|e| e.into_inner());
            let mut reversed = responses;
            reversed.reverse();
            *queued = reversed;
        }
        self
    }

    /// Configure the mock to fail on generate
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of generate calls received.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl TextGenerator for MockGenerator {
    fn generate(&self, prompt: &str, _max_tokens: usize) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if self.should_fail {
            return Err(ScribeError::Generation {
                message: "mock generation failure".to_string(),
            });
        }

        let queued = self
            .queued
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop();
        Ok(queued.unwrap_or_else(|| self.response.clone()))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
