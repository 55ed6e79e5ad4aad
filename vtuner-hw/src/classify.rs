//! Frontend category classification.

use log::{error, info};
use vtuner_protocol::{FrontendType, TunerKind};

use crate::error::HwError;

/// Map the `fe_type` reported by the hardware to a [`TunerKind`].
pub fn classify(fe_type: u32) -> Result<TunerKind, HwError> {
    let kind = match FrontendType::try_from(fe_type) {
        Ok(FrontendType::Qpsk) => TunerKind::Satellite,
        Ok(FrontendType::Qam) => TunerKind::Cable,
        Ok(FrontendType::Ofdm) => TunerKind::Terrestrial,
        Ok(FrontendType::Atsc) => TunerKind::Atsc,
        Err(_) => {
            error!("Frontend type {} is not supported", fe_type);
            return Err(HwError::UnsupportedHardware(fe_type));
        }
    };
    info!("Frontend type {} handled as {}", fe_type, kind);
    Ok(kind)
}
