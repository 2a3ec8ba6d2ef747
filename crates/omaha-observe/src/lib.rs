//! Observability setup for Omaha: structured logging with optional
//! OpenTelemetry span export.

pub mod tracing_setup;
