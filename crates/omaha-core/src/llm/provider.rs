//! LlmProvider trait definition.
//!
//! The only operation the relay needs is a streaming completion. The stream
//! is boxed and `'static` so a relay session can own it independently of the
//! provider, and so the trait stays object-safe behind `Arc<dyn LlmProvider>`.

use std::pin::Pin;

use futures_util::Stream;

use omaha_types::llm::{CompletionRequest, LlmError, StreamEvent};

/// Boxed upstream event stream returned by [`LlmProvider::stream`].
pub type ProviderStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>>;

/// Trait for LLM provider backends.
///
/// Implementations live in omaha-infra (e.g., `OpenAiCompatibleProvider`).
///
/// A well-behaved stream yields `Connected` once the provider has accepted
/// the request, then any number of `TextDelta`s, then `Done`. Errors may
/// appear at any point and end the stream.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a streaming completion request. Returns a stream of events.
    ///
    /// Dropping the returned stream must abandon the upstream call.
    fn stream(&self, request: CompletionRequest) -> ProviderStream;
}
