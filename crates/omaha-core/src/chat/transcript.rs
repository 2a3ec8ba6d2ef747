//! Client-side transcript and the per-exchange state machine.
//!
//! An [`Exchange`] moves `Idle -> Sent -> Streaming -> {Done | Errored}`.
//! Terminal states are final; every question gets a fresh `Exchange`.
//!
//! While an exchange is in flight the transcript is "awaiting": further
//! submissions are rejected with [`TranscriptError::Busy`]. [`drive_exchange`]
//! clears the flag on every exit path, including cancellation.

use std::future::Future;

use futures_util::{Stream, StreamExt};

use omaha_types::chat::{FailureKind, GREETING, TranscriptEntry};
use omaha_types::error::{ConsumeError, TranscriptError};
use omaha_types::event::RelayEvent;
use omaha_types::llm::{Message, MessageRole};

/// Lifecycle of one question/answer exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    /// User entry and empty assistant placeholder created.
    Sent,
    /// At least one content event folded.
    Streaming,
    Done,
    Errored(FailureKind),
}

impl ExchangeState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ExchangeState::Done | ExchangeState::Errored(_))
    }
}

/// Whether the reader should keep pulling events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Handle for one exchange on a [`Transcript`].
#[derive(Debug)]
pub struct Exchange {
    state: ExchangeState,
    assistant_index: Option<usize>,
}

impl Exchange {
    pub fn new() -> Self {
        Self {
            state: ExchangeState::Idle,
            assistant_index: None,
        }
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

/// What the client sends for a started exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub question: String,
    /// Transcript as it stood before the question was added.
    pub history: Vec<Message>,
}

/// Ordered record of the conversation as the client shows it.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    awaiting: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript opening with the assistant greeting.
    pub fn with_greeting() -> Self {
        Self {
            entries: vec![TranscriptEntry::new(MessageRole::Assistant, GREETING)],
            awaiting: false,
        }
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting
    }

    /// Conversation history to send with the next question.
    ///
    /// Empty entries (an assistant placeholder that never received text) are
    /// left out.
    pub fn history(&self) -> Vec<Message> {
        self.entries
            .iter()
            .filter(|entry| !entry.content.is_empty())
            .map(|entry| Message {
                role: entry.role,
                content: entry.content.clone(),
            })
            .collect()
    }

    /// Start an exchange: `Idle -> Sent`.
    ///
    /// Appends the user entry and an empty assistant placeholder, and marks
    /// the transcript as awaiting a response.
    pub fn begin(
        &mut self,
        exchange: &mut Exchange,
        question: &str,
    ) -> Result<Submission, TranscriptError> {
        if self.awaiting {
            return Err(TranscriptError::Busy);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(TranscriptError::EmptyQuestion);
        }
        if exchange.state != ExchangeState::Idle {
            return Err(TranscriptError::Busy);
        }

        let history = self.history();
        self.entries
            .push(TranscriptEntry::new(MessageRole::User, question));
        self.entries
            .push(TranscriptEntry::new(MessageRole::Assistant, String::new()));

        exchange.assistant_index = Some(self.entries.len() - 1);
        exchange.state = ExchangeState::Sent;
        self.awaiting = true;

        Ok(Submission {
            question: question.to_string(),
            history,
        })
    }

    /// Fold one relay event into the transcript.
    pub fn apply(&mut self, exchange: &mut Exchange, event: RelayEvent) -> Flow {
        if exchange.state.is_terminal() || exchange.state == ExchangeState::Idle {
            return Flow::Stop;
        }

        match event {
            RelayEvent::Content(text) => {
                if let Some(entry) = self.assistant_entry(exchange) {
                    entry.content.push_str(&text);
                }
                exchange.state = ExchangeState::Streaming;
                Flow::Continue
            }
            RelayEvent::Done => {
                exchange.state = ExchangeState::Done;
                Flow::Stop
            }
            RelayEvent::Error(reason) => {
                tracing::warn!(reason = %reason, "Relay reported an error");
                self.fail(exchange, FailureKind::Upstream);
                Flow::Stop
            }
        }
    }

    /// End a non-terminal exchange as failed, replacing any partial answer.
    pub fn fail(&mut self, exchange: &mut Exchange, kind: FailureKind) {
        if exchange.state.is_terminal() || exchange.state == ExchangeState::Idle {
            return;
        }
        if let Some(entry) = self.assistant_entry(exchange) {
            entry.content = kind.apology().to_string();
        }
        exchange.state = ExchangeState::Errored(kind);
    }

    fn assistant_entry(&mut self, exchange: &Exchange) -> Option<&mut TranscriptEntry> {
        exchange
            .assistant_index
            .and_then(|index| self.entries.get_mut(index))
    }
}

/// Clears the awaiting flag when dropped.
struct AwaitingGuard<'a> {
    transcript: &'a mut Transcript,
}

impl Drop for AwaitingGuard<'_> {
    fn drop(&mut self) {
        self.transcript.awaiting = false;
    }
}

/// Run a begun exchange to a terminal state.
///
/// `open` produces the event stream (typically an HTTP request followed by
/// [`crate::stream::consume`]). `on_delta` sees each content delta as it is
/// folded. Reading stops at the first terminal event; a transport error or a
/// body that ends early fails the exchange.
///
/// The transcript is borrowed for the whole exchange and the awaiting flag is
/// cleared however the returned future ends, including when it is dropped
/// before or during polling.
pub fn drive_exchange<'a, F, S, D>(
    transcript: &'a mut Transcript,
    mut exchange: Exchange,
    open: F,
    mut on_delta: D,
) -> impl Future<Output = Exchange> + 'a
where
    F: Future<Output = Result<S, ConsumeError>> + 'a,
    S: Stream<Item = Result<RelayEvent, ConsumeError>> + 'a,
    D: FnMut(&str) + 'a,
{
    let guard = AwaitingGuard { transcript };

    async move {
        let events = match open.await {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to open relay stream");
                guard.transcript.fail(&mut exchange, FailureKind::Transport);
                return exchange;
            }
        };
        let mut events = std::pin::pin!(events);

        while let Some(item) = events.next().await {
            match item {
                Ok(event) => {
                    if let RelayEvent::Content(text) = &event {
                        on_delta(text);
                    }
                    if guard.transcript.apply(&mut exchange, event) == Flow::Stop {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Relay stream read failed");
                    guard.transcript.fail(&mut exchange, FailureKind::Transport);
                    break;
                }
            }
        }

        if !exchange.state.is_terminal() {
            tracing::warn!("Relay stream ended without a terminal event");
            guard.transcript.fail(&mut exchange, FailureKind::Interrupted);
        }

        drop(guard);
        exchange
    }
}

#[cfg(test)]
mod tests {
    use futures_util::stream;
    use omaha_types::chat::{TRANSPORT_APOLOGY, UPSTREAM_APOLOGY};

    use super::*;

    fn ok_events(events: Vec<RelayEvent>) -> impl Stream<Item = Result<RelayEvent, ConsumeError>> {
        stream::iter(events.into_iter().map(Ok))
    }

    fn begun(transcript: &mut Transcript, question: &str) -> Exchange {
        let mut exchange = Exchange::new();
        transcript.begin(&mut exchange, question).unwrap();
        exchange
    }

    #[test]
    fn test_begin_creates_user_and_placeholder() {
        let mut transcript = Transcript::with_greeting();
        let mut exchange = Exchange::new();
        let submission = transcript.begin(&mut exchange, "  Why index funds? ").unwrap();

        assert_eq!(submission.question, "Why index funds?");
        assert_eq!(submission.history, vec![Message::assistant(GREETING)]);
        assert_eq!(exchange.state(), ExchangeState::Sent);
        assert!(transcript.is_awaiting());

        let entries = transcript.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].role, MessageRole::User);
        assert_eq!(entries[1].content, "Why index funds?");
        assert_eq!(entries[2].role, MessageRole::Assistant);
        assert!(entries[2].content.is_empty());
    }

    #[test]
    fn test_second_submission_rejected_while_awaiting() {
        let mut transcript = Transcript::new();
        let _first = begun(&mut transcript, "one");
        let mut second = Exchange::new();
        assert_eq!(
            transcript.begin(&mut second, "two"),
            Err(TranscriptError::Busy)
        );
        assert_eq!(transcript.entries().len(), 2);
        assert_eq!(second.state(), ExchangeState::Idle);
    }

    #[test]
    fn test_blank_question_rejected() {
        let mut transcript = Transcript::new();
        let mut exchange = Exchange::new();
        assert_eq!(
            transcript.begin(&mut exchange, "   "),
            Err(TranscriptError::EmptyQuestion)
        );
        assert!(!transcript.is_awaiting());
    }

    #[test]
    fn test_content_appends_and_done_stops() {
        let mut transcript = Transcript::new();
        let mut exchange = begun(&mut transcript, "q");

        assert_eq!(
            transcript.apply(&mut exchange, RelayEvent::Content("a".into())),
            Flow::Continue
        );
        assert_eq!(exchange.state(), ExchangeState::Streaming);
        transcript.apply(&mut exchange, RelayEvent::Content("b".into()));
        assert_eq!(transcript.apply(&mut exchange, RelayEvent::Done), Flow::Stop);
        assert_eq!(exchange.state(), ExchangeState::Done);
        assert_eq!(transcript.entries()[1].content, "ab");
    }

    #[test]
    fn test_no_transition_out_of_terminal() {
        let mut transcript = Transcript::new();
        let mut exchange = begun(&mut transcript, "q");
        transcript.apply(&mut exchange, RelayEvent::Content("a".into()));
        transcript.apply(&mut exchange, RelayEvent::Done);

        assert_eq!(
            transcript.apply(&mut exchange, RelayEvent::Content("late".into())),
            Flow::Stop
        );
        transcript.fail(&mut exchange, FailureKind::Transport);
        assert_eq!(exchange.state(), ExchangeState::Done);
        assert_eq!(transcript.entries()[1].content, "a");
    }

    #[tokio::test]
    async fn test_drive_done_clears_awaiting() {
        let mut transcript = Transcript::new();
        let exchange = begun(&mut transcript, "q");
        let mut seen = Vec::new();

        let exchange = drive_exchange(
            &mut transcript,
            exchange,
            async {
                Ok(ok_events(vec![
                    RelayEvent::Content("Value ".into()),
                    RelayEvent::Content("wins".into()),
                    RelayEvent::Done,
                    RelayEvent::Content("ignored".into()),
                ]))
            },
            |delta| seen.push(delta.to_string()),
        )
        .await;

        assert_eq!(exchange.state(), ExchangeState::Done);
        assert_eq!(transcript.entries()[1].content, "Value wins");
        assert_eq!(seen, vec!["Value ", "wins"]);
        assert!(!transcript.is_awaiting());
    }

    #[tokio::test]
    async fn test_drive_error_replaces_partial_answer() {
        let mut transcript = Transcript::new();
        let exchange = begun(&mut transcript, "q");

        let exchange = drive_exchange(
            &mut transcript,
            exchange,
            async {
                Ok(ok_events(vec![
                    RelayEvent::Content("partial".into()),
                    RelayEvent::Error("Stream error".into()),
                ]))
            },
            |_| {},
        )
        .await;

        assert_eq!(exchange.state(), ExchangeState::Errored(FailureKind::Upstream));
        assert_eq!(transcript.entries()[1].content, UPSTREAM_APOLOGY);
        assert!(!transcript.is_awaiting());
    }

    #[tokio::test]
    async fn test_drive_read_error_fails_with_transport_apology() {
        let mut transcript = Transcript::new();
        let exchange = begun(&mut transcript, "q");

        let events = stream::iter(vec![
            Ok(RelayEvent::Content("partial".into())),
            Err(ConsumeError::Transport("connection reset".into())),
        ]);
        let exchange =
            drive_exchange(&mut transcript, exchange, async { Ok(events) }, |_| {}).await;

        assert_eq!(exchange.state(), ExchangeState::Errored(FailureKind::Transport));
        assert_eq!(transcript.entries()[1].content, TRANSPORT_APOLOGY);
        assert!(!transcript.is_awaiting());
    }

    #[tokio::test]
    async fn test_drive_open_failure_clears_awaiting() {
        let mut transcript = Transcript::new();
        let exchange = begun(&mut transcript, "q");

        let exchange = drive_exchange(
            &mut transcript,
            exchange,
            async {
                Err::<stream::Empty<Result<RelayEvent, ConsumeError>>, _>(
                    ConsumeError::Transport("refused".into()),
                )
            },
            |_| {},
        )
        .await;

        assert_eq!(exchange.state(), ExchangeState::Errored(FailureKind::Transport));
        assert!(!transcript.is_awaiting());
    }

    #[tokio::test]
    async fn test_drive_early_end_is_interrupted() {
        let mut transcript = Transcript::new();
        let exchange = begun(&mut transcript, "q");

        let exchange = drive_exchange(
            &mut transcript,
            exchange,
            async { Ok(ok_events(vec![RelayEvent::Content("half".into())])) },
            |_| {},
        )
        .await;

        assert_eq!(
            exchange.state(),
            ExchangeState::Errored(FailureKind::Interrupted)
        );
        assert!(!transcript.is_awaiting());
    }

    #[test]
    fn test_unpolled_drive_clears_awaiting_on_drop() {
        let mut transcript = Transcript::new();
        let exchange = begun(&mut transcript, "q");

        let unpolled = drive_exchange(
            &mut transcript,
            exchange,
            async { Ok(stream::pending::<Result<RelayEvent, ConsumeError>>()) },
            |_| {},
        );
        drop(unpolled);

        assert!(!transcript.is_awaiting());
    }

    #[tokio::test]
    async fn test_cancelled_drive_clears_awaiting() {
        let mut transcript = Transcript::new();
        let exchange = begun(&mut transcript, "q");

        {
            let pending = drive_exchange(
                &mut transcript,
                exchange,
                async { Ok(stream::pending::<Result<RelayEvent, ConsumeError>>()) },
                |_| {},
            );
            let result =
                tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
            assert!(result.is_err());
        }

        assert!(!transcript.is_awaiting());
        let mut next = Exchange::new();
        assert!(transcript.begin(&mut next, "again").is_ok());
    }
}
