//! Wire-level definitions for the vtuner hardware control layer.
//!
//! This crate holds the values exchanged between callers of the control
//! layer and the DVB device: the DVB v5 enumerations, property commands,
//! the legacy tuning struct (with its packed DVB-S2 hints) and PID sets.
//!
//! # Example
//!
//! ```rust
//! use vtuner_protocol::{FecCode, Inversion, LegacyParameters, Pilot, Rolloff, TuningParameters};
//!
//! // DVB-S2 8PSK 3/4 request with 20% rolloff and pilots on
//! let params = TuningParameters::satellite(1_177_000, 27_500_000, FecCode(21))
//!     .with_inversion(Inversion::On)
//!     .with_s2_hints(Rolloff::R20, Pilot::On);
//!
//! // The legacy struct smuggles rolloff/pilot into the inversion field
//! let raw: LegacyParameters = params.to_legacy();
//! assert_eq!(raw.inversion & 0x3C, 0x08 | 0x10);
//!
//! let back = TuningParameters::from_legacy(&raw).unwrap();
//! assert_eq!(back, params);
//! ```

pub mod error;
pub mod params;
pub mod pids;
pub mod types;

pub use error::ProtocolError;
pub use params::{
    decode_pilot, decode_rolloff, AtscParameters, CableParameters, DeliveryParameters, FecCode,
    LegacyBody, LegacyParameters, OfdmParameters, SatelliteParameters, TuningParameters,
    FEC_LEGACY_MAX, INVERSION_MASK, PACKED_INVERSION_MASK, PILOT_MASK, ROLLOFF_MASK,
};
pub use pids::PidList;
pub use types::{
    Bandwidth, Burst, CodeRate, DeliverySystem, DiseqcMessage, DiseqcReply, FrontendStatus,
    FrontendType, GuardInterval, Hierarchy, Inversion, Modulation, Pilot, PropertyCommand,
    PropertyId, Rolloff, Tone, TransmissionMode, TunerKind, Voltage, DTV_IOCTL_MAX_MSGS, MAX_PIDS,
    PID_SLOT_EMPTY,
};
