//! HTTP request handlers.

pub mod ask;
