//! Errors in the library.
use thiserror::Error;

/// Errors raised by the replay buffer.
///
/// All of them are local and synchronous. An operation returning one of these
/// errors leaves the buffer unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PixReplayError {
    /// The configuration has a zero capacity, a degenerate shape or an invalid
    /// action range.
    #[error("Invalid replay buffer configuration: {0}")]
    InvalidConfig(String),

    /// A field of an inserted transition does not match the configured shape.
    #[error("Shape mismatch in {field}: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        /// Name of the offending field.
        field: &'static str,

        /// Number of elements implied by the configured shape.
        expected: usize,

        /// Number of elements actually given.
        actual: usize,
    },

    /// Sampling was requested before any insertion.
    #[error("Replay buffer is empty")]
    EmptyBuffer,

    /// An action element lies outside the configured range.
    #[error("Action value {value} is out of range [{low}, {high}]")]
    ActionOutOfRange {
        /// The offending value.
        value: f32,

        /// Lower bound of the configured range.
        low: f32,

        /// Upper bound of the configured range.
        high: f32,
    },
}
