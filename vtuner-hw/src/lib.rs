//! Hardware control layer for a virtual DVB tuner.
//!
//! [`HwSession`] owns one [`FrontendDevice`] and turns tuning requests,
//! property writes and PID set updates into the ioctl-level commands the
//! device understands. [`DvbDevice`] drives a Linux DVB adapter.

pub mod buffer;
pub mod builder;
pub mod classify;
pub mod device;
pub mod error;
mod passthrough;
pub mod reconcile;
pub mod session;

#[cfg(test)]
mod mock;

pub use buffer::PropertyBuffer;
pub use builder::{
    build_from_legacy, build_tune_sequence, extended_fec_code, resolve_extended_fec, TuneCommand,
};
pub use classify::classify;
pub use device::{DeviceConfig, DvbDevice, FrontendDevice, DEFAULT_DEMUX_BUFFER_SIZE};
pub use error::HwError;
pub use reconcile::{ReconcileReport, StreamDelta, StreamReconciler};
pub use session::HwSession;
