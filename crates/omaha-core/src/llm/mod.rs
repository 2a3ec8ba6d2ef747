//! LLM provider abstraction.
//!
//! - `provider`: the `LlmProvider` trait every backend implements
//! - `scripted`: in-memory provider replaying a fixed script (tests and the
//!   `test-util` feature only)

pub mod provider;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;
