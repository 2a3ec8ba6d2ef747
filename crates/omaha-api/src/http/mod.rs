//! HTTP layer for the relay: a single `POST /ask` streaming endpoint.

pub mod error;
pub mod handlers;
pub mod router;
