//! Server-side relay session.
//!
//! A [`RelaySession`] owns one upstream completion stream. [`RelaySession::open`]
//! waits until the provider has accepted the call, so a refused call can still
//! become an ordinary HTTP error. After that the session is turned into a
//! stream of [`RelayEvent`]s via [`RelaySession::into_events`]; the caller
//! forwards them to the client in order.
//!
//! Dropping the event stream drops the upstream stream with it, which is how
//! a client disconnect cancels the upstream call.

use std::time::{Duration, Instant};

use futures_util::{Stream, StreamExt, stream};

use omaha_types::config::GenerationPolicy;
use omaha_types::event::RelayEvent;
use omaha_types::llm::{CompletionRequest, LlmError, Message, StreamEvent};

use crate::llm::provider::{LlmProvider, ProviderStream};

/// Build the upstream request for a composed message list.
pub fn build_request(policy: &GenerationPolicy, messages: Vec<Message>) -> CompletionRequest {
    CompletionRequest {
        model: policy.model.clone(),
        messages,
        max_tokens: policy.max_tokens,
        temperature: Some(policy.temperature),
        stream: true,
    }
}

/// An accepted upstream call, ready to be relayed.
pub struct RelaySession {
    upstream: ProviderStream,
    idle: Duration,
    started: Instant,
}

impl std::fmt::Debug for RelaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySession")
            .field("idle", &self.idle)
            .finish_non_exhaustive()
    }
}

impl RelaySession {
    /// Start the upstream call and wait for it to be accepted.
    ///
    /// Fails if the provider errors, closes, or stays silent for `idle`
    /// before connecting. A provider that skips `Connected` and goes
    /// straight to content is accepted; its first event is kept.
    pub async fn open(
        provider: &dyn LlmProvider,
        messages: Vec<Message>,
        policy: &GenerationPolicy,
        idle: Duration,
    ) -> Result<Self, LlmError> {
        let started = Instant::now();
        let mut upstream = provider.stream(build_request(policy, messages));

        let first = tokio::time::timeout(idle, upstream.next())
            .await
            .map_err(|_| LlmError::Timeout {
                secs: idle.as_secs(),
            })?;

        match first {
            Some(Ok(StreamEvent::Connected)) => {}
            Some(Ok(event)) => {
                upstream = Box::pin(stream::iter([Ok(event)]).chain(upstream));
            }
            Some(Err(err)) => return Err(err),
            None => {
                return Err(LlmError::Stream(
                    "upstream closed before connecting".to_string(),
                ));
            }
        }

        tracing::debug!(
            provider = provider.name(),
            model = %policy.model,
            connect_ms = started.elapsed().as_millis() as u64,
            "Upstream stream opened"
        );

        Ok(Self {
            upstream,
            idle,
            started,
        })
    }

    /// Relay the upstream stream as client events.
    ///
    /// Yields one `Content` per non-empty delta, then exactly one terminal
    /// event: `Done` on normal completion, `Error` with a client-safe
    /// description on upstream failure or idle timeout. Nothing follows the
    /// terminal event.
    pub fn into_events(self) -> impl Stream<Item = RelayEvent> + Send + 'static {
        let RelaySession {
            mut upstream,
            idle,
            started,
        } = self;

        async_stream::stream! {
            let mut outcome = SessionOutcome::new(started);

            loop {
                let next = match tokio::time::timeout(idle, upstream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        let err = LlmError::Timeout { secs: idle.as_secs() };
                        outcome.failed(&err);
                        yield RelayEvent::Error(err.short_description().to_string());
                        break;
                    }
                };

                match next {
                    Some(Ok(StreamEvent::TextDelta { text })) => {
                        if text.is_empty() {
                            continue;
                        }
                        outcome.deltas += 1;
                        yield RelayEvent::Content(text);
                    }
                    Some(Ok(StreamEvent::Connected)) => {}
                    Some(Ok(StreamEvent::Done)) | None => {
                        outcome.completed();
                        yield RelayEvent::Done;
                        break;
                    }
                    Some(Err(err)) => {
                        outcome.failed(&err);
                        yield RelayEvent::Error(err.short_description().to_string());
                        break;
                    }
                }
            }
        }
    }
}

/// Logs how a relay session ended, including when it was abandoned.
struct SessionOutcome {
    started: Instant,
    deltas: usize,
    finished: bool,
}

impl SessionOutcome {
    fn new(started: Instant) -> Self {
        Self {
            started,
            deltas: 0,
            finished: false,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn completed(&mut self) {
        self.finished = true;
        tracing::info!(
            deltas = self.deltas,
            elapsed_ms = self.elapsed_ms(),
            "Relay session completed"
        );
    }

    fn failed(&mut self, err: &LlmError) {
        self.finished = true;
        tracing::warn!(
            error = %err,
            deltas = self.deltas,
            elapsed_ms = self.elapsed_ms(),
            "Relay session failed"
        );
    }
}

impl Drop for SessionOutcome {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!(
                deltas = self.deltas,
                elapsed_ms = self.elapsed_ms(),
                "Downstream disconnected, abandoning upstream stream"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use omaha_types::chat::{TRANSPORT_APOLOGY, UPSTREAM_APOLOGY};
    use omaha_types::llm::MessageRole;

    use super::*;
    use crate::chat::compose::compose;
    use crate::chat::transcript::{Exchange, ExchangeState, Transcript, drive_exchange};
    use crate::chat::window::{DEFAULT_HISTORY_LIMIT, window};
    use crate::llm::scripted::{ScriptStep, ScriptedProvider};
    use crate::stream::consume;

    const IDLE: Duration = Duration::from_secs(5);

    async fn relay(provider: &ScriptedProvider) -> Vec<RelayEvent> {
        let session = RelaySession::open(
            provider,
            vec![Message::user("q")],
            &GenerationPolicy::default(),
            IDLE,
        )
        .await
        .unwrap();
        session.into_events().collect().await
    }

    #[tokio::test]
    async fn test_deltas_then_done() {
        let provider = ScriptedProvider::deltas(["Price ", "", "is what you pay."]);
        let events = relay(&provider).await;
        assert_eq!(
            events,
            vec![
                RelayEvent::Content("Price ".into()),
                RelayEvent::Content("is what you pay.".into()),
                RelayEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_after_partial_content() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("Hi".into()),
            ScriptStep::Fail("connection reset by peer at 10.0.0.3".into()),
        ]);
        let events = relay(&provider).await;
        assert_eq!(
            events,
            vec![
                RelayEvent::Content("Hi".into()),
                RelayEvent::Error("Stream error".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_refused_call_fails_open() {
        let provider = ScriptedProvider::refusing("401 bad key");
        let result = RelaySession::open(
            &provider,
            vec![Message::user("q")],
            &GenerationPolicy::default(),
            IDLE,
        )
        .await;
        assert!(matches!(result, Err(LlmError::Provider { .. })));
    }

    #[tokio::test]
    async fn test_stalled_upstream_times_out() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("a".into()),
            ScriptStep::Stall,
        ]);
        let session = RelaySession::open(
            &provider,
            vec![Message::user("q")],
            &GenerationPolicy::default(),
            Duration::from_millis(50),
        )
        .await
        .unwrap();
        let events: Vec<_> = session.into_events().collect().await;
        assert_eq!(
            events,
            vec![
                RelayEvent::Content("a".into()),
                RelayEvent::Error("Upstream timed out".into()),
            ]
        );
        assert!(provider.dropped_flag().load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_dropping_events_cancels_upstream() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("a".into()),
            ScriptStep::Stall,
        ]);
        let flag = provider.dropped_flag();
        let session = RelaySession::open(
            &provider,
            vec![Message::user("q")],
            &GenerationPolicy::default(),
            IDLE,
        )
        .await
        .unwrap();

        let mut events = Box::pin(session.into_events());
        assert_eq!(events.next().await, Some(RelayEvent::Content("a".into())));
        assert!(!flag.load(Ordering::SeqCst));
        drop(events);
        assert!(flag.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_request_carries_policy_values() {
        let provider = ScriptedProvider::deltas(["ok"]);
        let policy = GenerationPolicy {
            model: "test-model".to_string(),
            temperature: 0.2,
            max_tokens: 64,
        };
        let session = RelaySession::open(&provider, vec![Message::user("q")], &policy, IDLE)
            .await
            .unwrap();
        drop(session);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "test-model");
        assert_eq!(requests[0].temperature, Some(0.2));
        assert_eq!(requests[0].max_tokens, 64);
        assert!(requests[0].stream);
    }

    /// Server relay, wire encoding, arbitrary re-chunking, client decoding and
    /// transcript folding, with no network in between.
    async fn round_trip(provider: ScriptedProvider, chunk: usize) -> (Transcript, Exchange, String) {
        let mut transcript = Transcript::with_greeting();
        let mut exchange = Exchange::new();
        let submission = transcript
            .begin(&mut exchange, "What is value investing?")
            .unwrap();

        let history = window(&submission.history, DEFAULT_HISTORY_LIMIT);
        let messages = compose("You are a patient investor.", &history, &submission.question).unwrap();
        assert_eq!(messages[0].role, MessageRole::System);

        let session = RelaySession::open(&provider, messages, &GenerationPolicy::default(), IDLE)
            .await
            .unwrap();
        let body: String = session.into_events().map(|e| e.to_wire()).collect().await;
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = body
            .as_bytes()
            .chunks(chunk)
            .map(|c| Ok(c.to_vec()))
            .collect();

        let mut shown = String::new();
        let exchange = drive_exchange(
            &mut transcript,
            exchange,
            async move { Ok(consume(stream::iter(chunks))) },
            |delta| shown.push_str(delta),
        )
        .await;
        (transcript, exchange, shown)
    }

    #[tokio::test]
    async fn test_end_to_end_success() {
        for chunk in [1, 3, 7, 64, 4096] {
            let provider =
                ScriptedProvider::deltas(["Value investing ", "is about ", "price vs worth."]);
            let (transcript, exchange, shown) = round_trip(provider, chunk).await;

            assert_eq!(exchange.state(), ExchangeState::Done);
            assert!(!transcript.is_awaiting());
            let answer = &transcript.entries().last().unwrap().content;
            assert_eq!(answer, "Value investing is about price vs worth.");
            assert_eq!(&shown, answer);
        }
    }

    #[tokio::test]
    async fn test_end_to_end_upstream_failure() {
        let provider = ScriptedProvider::new(vec![
            ScriptStep::Delta("Value ".into()),
            ScriptStep::Fail("boom".into()),
        ]);
        let (transcript, exchange, _) = round_trip(provider, 5).await;

        assert!(matches!(exchange.state(), ExchangeState::Errored(_)));
        assert!(!transcript.is_awaiting());
        let answer = &transcript.entries().last().unwrap().content;
        assert_eq!(answer, UPSTREAM_APOLOGY);
        assert_ne!(answer, TRANSPORT_APOLOGY);
    }
}
