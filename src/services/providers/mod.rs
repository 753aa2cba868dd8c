//! Text-generation provider abstraction and implementations.
//!
//! The draft pipeline talks to a [`TextGenerator`] trait object so the
//! Gemini backend can be swapped for a mock in tests.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Generates draft text from a system instruction and a user prompt.
///
/// `Ok(None)` means the upstream answered but produced no extractable text;
/// callers substitute their fallback copy. `Err` is reserved for transport
/// and decode failures.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
    ) -> Result<Option<String>, ProviderError>;
}
