//! ScriptedProvider -- in-memory [`LlmProvider`] that replays a fixed script.
//!
//! Used wherever a real network provider is unwanted: relay tests, handler
//! tests, and end-to-end exchanges. It records every request it receives and
//! flags when the stream it handed out has been dropped, which is how
//! cancellation is observed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use omaha_types::llm::{CompletionRequest, LlmError, StreamEvent};

use super::provider::{LlmProvider, ProviderStream};

/// One step of a scripted upstream response.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Emit a text delta.
    Delta(String),
    /// Fail the stream with a provider error.
    Fail(String),
    /// Never produce another event.
    Stall,
}

/// Provider that replays [`ScriptStep`]s.
pub struct ScriptedProvider {
    steps: Vec<ScriptStep>,
    refuse: Option<String>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    dropped: Arc<AtomicBool>,
}

impl ScriptedProvider {
    /// Provider that will play `steps` and then complete normally.
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            refuse: None,
            requests: Arc::new(Mutex::new(Vec::new())),
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Provider that streams each delta in order, then completes.
    pub fn deltas<I, T>(deltas: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(deltas.into_iter().map(|d| ScriptStep::Delta(d.into())).collect())
    }

    /// Provider that rejects the call before connecting.
    pub fn refusing(message: impl Into<String>) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.refuse = Some(message.into());
        provider
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Shared flag set once a handed-out stream has been dropped.
    pub fn dropped_flag(&self) -> Arc<AtomicBool> {
        self.dropped.clone()
    }
}

/// Sets the shared flag when the generator holding it is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn stream(&self, request: CompletionRequest) -> ProviderStream {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let steps = self.steps.clone();
        let refuse = self.refuse.clone();
        let flag = DropFlag(self.dropped.clone());

        Box::pin(async_stream::stream! {
            let _flag = flag;

            if let Some(message) = refuse {
                yield Err(LlmError::Provider { message });
                return;
            }

            yield Ok(StreamEvent::Connected);

            for step in steps {
                match step {
                    ScriptStep::Delta(text) => {
                        yield Ok(StreamEvent::TextDelta { text });
                    }
                    ScriptStep::Fail(message) => {
                        yield Err(LlmError::Stream(message));
                        return;
                    }
                    ScriptStep::Stall => std::future::pending::<()>().await,
                }
            }

            yield Ok(StreamEvent::Done);
        })
    }
}
