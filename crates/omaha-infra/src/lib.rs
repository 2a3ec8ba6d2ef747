//! Infrastructure layer for Omaha.
//!
//! Contains implementations of the ports defined in `omaha-core`: the
//! OpenAI-compatible streaming provider and the file-backed persona source.
//! Also holds the HTTP client for `POST /ask`, the `omaha.toml` loader, and
//! credential lookup from the environment.

pub mod client;
pub mod config;
pub mod llm;
pub mod persona;
pub mod secret;
