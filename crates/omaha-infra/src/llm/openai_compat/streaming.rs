//! OpenAI SSE stream to [`StreamEvent`] adapter.
//!
//! Maps `async-openai`'s [`ChatCompletionResponseStream`] to the
//! provider-agnostic [`StreamEvent`] enum defined in `omaha-types`.

use futures_util::StreamExt;

use async_openai::types::chat::ChatCompletionResponseStream;

use omaha_core::llm::provider::ProviderStream;
use omaha_types::llm::StreamEvent;

use super::map_openai_error;

/// Map an async-openai [`ChatCompletionResponseStream`] to a stream of [`StreamEvent`]s.
///
/// The returned stream emits events in this order:
/// 1. `Connected` -- when the first chunk arrives
/// 2. `TextDelta` -- for each non-empty text content chunk
/// 3. `Done` -- at the end of the stream
///
/// The event source only reports the HTTP status when first polled, so an
/// auth or quota rejection surfaces as an error before `Connected`.
pub fn map_openai_stream(stream: ChatCompletionResponseStream) -> ProviderStream {
    Box::pin(async_stream::try_stream! {
        let mut stream = stream;
        let mut connected = false;

        while let Some(result) = stream.next().await {
            let chunk = result.map_err(map_openai_error)?;

            if !connected {
                connected = true;
                yield StreamEvent::Connected;
            }

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content {
                    if !text.is_empty() {
                        yield StreamEvent::TextDelta { text };
                    }
                }
            }
        }

        if !connected {
            yield StreamEvent::Connected;
        }
        yield StreamEvent::Done;
    })
}
