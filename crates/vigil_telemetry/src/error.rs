//! Error taxonomy for the telemetry substrate.
//!
//! Every operation in this crate is pure, in-memory and deterministic, so a
//! failure is a programming error at the call site rather than a transient
//! condition. Constructors and accessors fail fast and synchronously; there
//! is no retry story. Nothing here is user-facing; message formatting for
//! operators is the host's concern.

use thiserror::Error;

/// Errors emitted by the telemetry data structures.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryError {
    /// A constructor or insert received a parameter it cannot use, such as
    /// a non-positive capacity or a zero modulus.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A query that needs at least one element ran against an empty
    /// structure: `head`/`tail` on a never-filled ring buffer, or
    /// `get_any` on an empty spatial index.
    #[error("empty state: {0}")]
    EmptyState(&'static str),
}
