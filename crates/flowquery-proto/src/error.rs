//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A textual name did not match any known variant.
    #[error("unknown {kind}: {value}")]
    UnknownName { kind: &'static str, value: String },
}
