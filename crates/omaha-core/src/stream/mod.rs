//! Client-side reassembly of the relay's line-delimited event stream.
//!
//! A response body arrives as arbitrary byte chunks: a chunk may end inside a
//! line or inside a multi-byte character, and may hold zero, one, or many
//! complete events. [`consume`] turns such a body into a pull-based
//! [`EventStream`] of [`RelayEvent`]s.

pub mod decoder;
pub mod lines;
pub mod utf8;

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_util::Stream;
use pin_project_lite::pin_project;

use omaha_types::error::ConsumeError;
use omaha_types::event::RelayEvent;

use self::decoder::EventDecoder;

pin_project! {
    /// Stream of [`RelayEvent`]s decoded from a stream of byte chunks.
    ///
    /// Decoding state lives in the struct and is carried from one poll to the
    /// next. A read error is yielded once, after which the stream ends.
    pub struct EventStream<S> {
        #[pin]
        body: S,
        decoder: EventDecoder,
        ready: VecDeque<RelayEvent>,
        finished: bool,
    }
}

/// Decode a chunked response body into relay events.
pub fn consume<S>(body: S) -> EventStream<S> {
    EventStream {
        body,
        decoder: EventDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    }
}

impl<S> EventStream<S> {
    /// Prefixed lines skipped so far because they failed to parse.
    pub fn malformed(&self) -> usize {
        self.decoder.malformed()
    }
}

impl<S, B, E> Stream for EventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    type Item = Result<RelayEvent, ConsumeError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if let Some(event) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if *this.finished {
                return Poll::Ready(None);
            }

            match ready!(this.body.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => {
                    this.ready.extend(this.decoder.feed(chunk.as_ref()));
                }
                Some(Err(err)) => {
                    *this.finished = true;
                    this.ready.clear();
                    return Poll::Ready(Some(Err(ConsumeError::Transport(err.to_string()))));
                }
                None => {
                    *this.finished = true;
                    this.ready.extend(this.decoder.finish());
                }
            }
        }
    }
}
