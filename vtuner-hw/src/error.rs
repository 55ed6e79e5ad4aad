//! Error types for the hardware control layer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use vtuner_protocol::ProtocolError;

/// Errors surfaced by [`HwSession`](crate::HwSession) and its parts.
#[derive(Debug, Error)]
pub enum HwError {
    /// The frontend reports a category this layer cannot drive.
    #[error("Unsupported frontend type {0}")]
    UnsupportedHardware(u32),

    /// Property id rejected by the property buffer.
    #[error("Unknown property {0}")]
    UnknownAttribute(u32),

    /// Property buffer has no room left.
    #[error("Property buffer full ({capacity} properties)")]
    BufferFull { capacity: usize },

    /// Unknown extended FEC code. Only rendered into a warning; the
    /// builder falls back to FEC auto instead of returning it.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single device call failed.
    #[error("{op} failed: {source}")]
    DeviceOperationFailed {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Argument rejected before reaching the device, e.g. a DiSEqC message
    /// of bad length or an out-of-range legacy field.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ProtocolError),

    /// A device node could not be opened or set up.
    #[error("Failed to open {path:?}: {source}")]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl HwError {
    pub(crate) fn device(op: &'static str, source: io::Error) -> Self {
        HwError::DeviceOperationFailed { op, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_becomes_invalid_argument() {
        let err = HwError::from(ProtocolError::InvalidDiseqcLength { len: 7, min: 3, max: 6 });
        assert!(matches!(
            err,
            HwError::InvalidArgument(ProtocolError::InvalidDiseqcLength { len: 7, .. })
        ));
        assert!(err.to_string().starts_with("Invalid argument: "));
    }

    #[test]
    fn test_configuration_message() {
        let err = HwError::Configuration("FEC code 99 unknown".to_string());
        assert_eq!(err.to_string(), "Configuration error: FEC code 99 unknown");
    }
}
