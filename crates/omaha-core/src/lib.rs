//! Core relay logic for Omaha.
//!
//! This crate defines the ports (provider and persona source traits) that the
//! infrastructure layer implements, plus the pure pieces of the relay:
//! history windowing, prompt composition, the server-side relay session, and
//! the client-side event decoder and transcript. It depends only on
//! `omaha-types` -- never on `omaha-infra` or any HTTP crate.

pub mod chat;
pub mod llm;
pub mod persona;
pub mod relay;
pub mod stream;
