//! Conversation handling on both sides of the relay.
//!
//! - `window`: bounds untrusted client history
//! - `compose`: builds the ordered upstream message list
//! - `transcript`: client-side transcript and per-exchange state machine

pub mod compose;
pub mod transcript;
pub mod window;
