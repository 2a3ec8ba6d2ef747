//! Shared domain types for Omaha.
//!
//! This crate contains the types exchanged between the relay server and its
//! clients: chat messages, the line-delimited relay events, transcript
//! entries, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod llm;
