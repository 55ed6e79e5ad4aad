//! Error types for the vtuner wire contract.

use thiserror::Error;

/// Errors raised while converting between raw device values and typed values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A numeric value is outside the closed enumeration of its field.
    #[error("Invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: u32 },

    /// The empty-slot sentinel was used as a stream identifier.
    #[error("PID 0x{0:04X} is reserved as the empty slot marker")]
    ReservedPid(u16),

    /// More stream identifiers than the device can filter.
    #[error("PID list is full (capacity: {capacity})")]
    PidListFull { capacity: usize },

    /// DiSEqC message length outside the allowed range.
    #[error("Invalid DiSEqC message length: {len} (expected {min}..={max})")]
    InvalidDiseqcLength { len: usize, min: usize, max: usize },
}
