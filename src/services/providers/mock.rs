//! Mock generator for testing.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{ProviderError, TextGenerator};

/// Outcome a [`MockTextGenerator`] plays back on every call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Upstream produced this text.
    Text(String),
    /// Upstream answered without an extractable draft.
    NoText,
    /// Transport-level failure.
    Network(String),
}

/// Mock text generator that records calls and plays a scripted outcome.
pub struct MockTextGenerator {
    outcome: MockOutcome,
    pub calls: Mutex<Vec<RecordedCall>>,
}

/// One recorded `generate` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub system_instruction: String,
    pub prompt: String,
}

impl MockTextGenerator {
    pub fn returning(text: &str) -> Self {
        Self::with_outcome(MockOutcome::Text(text.to_string()))
    }

    pub fn empty() -> Self {
        Self::with_outcome(MockOutcome::NoText)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_outcome(MockOutcome::Network(message.to_string()))
    }

    pub fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<Option<String>, ProviderError> {
        self.calls
            .lock()
            .map_err(|e| ProviderError::Network(format!("Mock call log poisoned: {}", e)))?
            .push(RecordedCall {
                system_instruction: system_instruction.to_string(),
                prompt: prompt.to_string(),
            });

        match &self.outcome {
            MockOutcome::Text(text) => Ok(Some(text.clone())),
            MockOutcome::NoText => Ok(None),
            MockOutcome::Network(message) => Err(ProviderError::Network(message.clone())),
        }
    }
}
