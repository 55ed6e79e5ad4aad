//! Tuning parameters: the legacy wire struct and its typed counterpart.
//!
//! The legacy `struct dvb_frontend_parameters` has no room for the DVB-S2
//! rolloff and pilot settings, so producers of the legacy struct smuggle
//! them into otherwise unused bits of the inversion field:
//!
//! ```text
//!  bit:  7 6 | 5 4   | 3 2     | 1 | 0
//!        --- | pilot | rolloff | - | inversion on
//! ```
//!
//! Only the low inversion bit survives packing, so a packed request reads
//! back as inversion on or off, never auto.
//!
//! The packed bits are only meaningful when the FEC field carries an
//! extended (second generation) code, see [`FecCode::is_extended`].
//! [`TuningParameters`] keeps these values in separate typed fields; the
//! packing exists only in [`LegacyParameters`].

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{
    Bandwidth, CodeRate, GuardInterval, Hierarchy, Inversion, Modulation, Pilot, Rolloff,
    TransmissionMode,
};

/// Bits of the inversion field holding the plain inversion value.
pub const INVERSION_MASK: u32 = 0x03;
/// Inversion bit kept when the field carries packed rolloff/pilot bits.
pub const PACKED_INVERSION_MASK: u32 = 0x01;
/// Bits of the inversion field holding the packed rolloff.
pub const ROLLOFF_MASK: u32 = 0x0C;
/// Bits of the inversion field holding the packed pilot setting.
pub const PILOT_MASK: u32 = 0x30;

const ROLLOFF_SHIFT: u32 = 2;
const PILOT_SHIFT: u32 = 4;

/// Highest FEC code of the legacy code table (`FEC_AUTO`).
pub const FEC_LEGACY_MAX: u32 = CodeRate::Auto as u32;

/// Decode the packed rolloff bits (2–3) of an inversion field.
///
/// Returns `None` for the reserved pattern `11`.
pub fn decode_rolloff(inversion: u32) -> Option<Rolloff> {
    match (inversion & ROLLOFF_MASK) >> ROLLOFF_SHIFT {
        0b00 => Some(Rolloff::R35),
        0b01 => Some(Rolloff::R25),
        0b10 => Some(Rolloff::R20),
        _ => None,
    }
}

/// Decode the packed pilot bits (4–5) of an inversion field.
///
/// Returns `None` for the reserved pattern `11`.
pub fn decode_pilot(inversion: u32) -> Option<Pilot> {
    match (inversion & PILOT_MASK) >> PILOT_SHIFT {
        0b00 => Some(Pilot::Off),
        0b01 => Some(Pilot::On),
        0b10 => Some(Pilot::Auto),
        _ => None,
    }
}

/// Rolloff in packed form. `Auto` has no code of its own and uses the
/// reserved pattern, which decodes back to auto. Unpacking logs a warning
/// for that pattern, so every packed request with auto rolloff produces
/// one.
fn encode_rolloff(rolloff: Rolloff) -> u32 {
    let bits = match rolloff {
        Rolloff::R35 => 0b00,
        Rolloff::R25 => 0b01,
        Rolloff::R20 => 0b10,
        Rolloff::Auto => 0b11,
    };
    bits << ROLLOFF_SHIFT
}

fn encode_pilot(pilot: Pilot) -> u32 {
    let bits = match pilot {
        Pilot::Off => 0b00,
        Pilot::On => 0b01,
        Pilot::Auto => 0b10,
    };
    bits << PILOT_SHIFT
}

/// Satellite FEC code, possibly from the extended (DVB-S2) range.
///
/// Codes up to [`FEC_LEGACY_MAX`] are plain [`CodeRate`] values. Codes above
/// it select a DVB-S2 code rate and modulation; the mapping lives with the
/// command builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FecCode(pub u32);

impl FecCode {
    pub fn legacy(rate: CodeRate) -> Self {
        FecCode(rate.into())
    }

    pub fn is_extended(self) -> bool {
        self.0 > FEC_LEGACY_MAX
    }
}

impl From<CodeRate> for FecCode {
    fn from(rate: CodeRate) -> Self {
        FecCode::legacy(rate)
    }
}

/// Kind-specific part of the legacy struct, as raw wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegacyBody {
    Qpsk {
        symbol_rate: u32,
        fec_inner: u32,
    },
    Qam {
        symbol_rate: u32,
        fec_inner: u32,
        modulation: u32,
    },
    Ofdm {
        bandwidth: u32,
        code_rate_hp: u32,
        code_rate_lp: u32,
        constellation: u32,
        transmission_mode: u32,
        guard_interval: u32,
        hierarchy_information: u32,
    },
    Vsb {
        modulation: u32,
    },
}

/// Legacy fixed-struct tuning request (`struct dvb_frontend_parameters`).
///
/// For satellite requests with an extended FEC code, `inversion` carries
/// packed rolloff and pilot bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyParameters {
    pub frequency: u32,
    pub inversion: u32,
    pub body: LegacyBody,
}

impl fmt::Display for LegacyParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.body {
            LegacyBody::Qpsk {
                symbol_rate,
                fec_inner,
            } => write!(
                f,
                "freq:{} inversion:{} SR:{} FEC:{}",
                self.frequency, self.inversion, symbol_rate, fec_inner
            ),
            LegacyBody::Qam {
                symbol_rate,
                fec_inner,
                modulation,
            } => write!(
                f,
                "freq:{} inversion:{} SR:{} FEC:{} MOD:{}",
                self.frequency, self.inversion, symbol_rate, fec_inner, modulation
            ),
            LegacyBody::Ofdm {
                bandwidth,
                constellation,
                ..
            } => write!(
                f,
                "freq:{} inversion:{} BW:{} MOD:{}",
                self.frequency, self.inversion, bandwidth, constellation
            ),
            LegacyBody::Vsb { modulation } => {
                write!(f, "freq:{} MOD:{}", self.frequency, modulation)
            }
        }
    }
}

/// Satellite tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteParameters {
    pub symbol_rate: u32,
    pub fec: FecCode,
    /// Only honoured with an extended FEC code.
    pub rolloff: Rolloff,
    /// Only honoured with an extended FEC code.
    pub pilot: Pilot,
}

/// Cable tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CableParameters {
    pub symbol_rate: u32,
    pub fec: CodeRate,
    pub modulation: Modulation,
}

/// Terrestrial (OFDM) tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfdmParameters {
    pub bandwidth: Bandwidth,
    pub code_rate_hp: CodeRate,
    pub code_rate_lp: CodeRate,
    pub constellation: Modulation,
    pub transmission_mode: TransmissionMode,
    pub guard_interval: GuardInterval,
    pub hierarchy: Hierarchy,
}

impl Default for OfdmParameters {
    fn default() -> Self {
        Self {
            bandwidth: Bandwidth::Auto,
            code_rate_hp: CodeRate::Auto,
            code_rate_lp: CodeRate::Auto,
            constellation: Modulation::QamAuto,
            transmission_mode: TransmissionMode::Auto,
            guard_interval: GuardInterval::Auto,
            hierarchy: Hierarchy::Auto,
        }
    }
}

/// ATSC tuning values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtscParameters {
    pub modulation: Modulation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryParameters {
    Satellite(SatelliteParameters),
    Cable(CableParameters),
    Terrestrial(OfdmParameters),
    Atsc(AtscParameters),
}

/// A tuning request with every value in its own typed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningParameters {
    pub frequency: u32,
    pub inversion: Inversion,
    pub delivery: DeliveryParameters,
}

impl TuningParameters {
    pub fn satellite(frequency: u32, symbol_rate: u32, fec: impl Into<FecCode>) -> Self {
        Self {
            frequency,
            inversion: Inversion::Auto,
            delivery: DeliveryParameters::Satellite(SatelliteParameters {
                symbol_rate,
                fec: fec.into(),
                rolloff: Rolloff::Auto,
                pilot: Pilot::Auto,
            }),
        }
    }

    pub fn cable(frequency: u32, symbol_rate: u32, fec: CodeRate, modulation: Modulation) -> Self {
        Self {
            frequency,
            inversion: Inversion::Auto,
            delivery: DeliveryParameters::Cable(CableParameters {
                symbol_rate,
                fec,
                modulation,
            }),
        }
    }

    pub fn terrestrial(frequency: u32, ofdm: OfdmParameters) -> Self {
        Self {
            frequency,
            inversion: Inversion::Auto,
            delivery: DeliveryParameters::Terrestrial(ofdm),
        }
    }

    pub fn atsc(frequency: u32, modulation: Modulation) -> Self {
        Self {
            frequency,
            inversion: Inversion::Auto,
            delivery: DeliveryParameters::Atsc(AtscParameters { modulation }),
        }
    }

    /// Replace the inversion.
    pub fn with_inversion(mut self, inversion: Inversion) -> Self {
        self.inversion = inversion;
        self
    }

    /// Replace rolloff and pilot of a satellite request; no-op otherwise.
    pub fn with_s2_hints(mut self, rolloff: Rolloff, pilot: Pilot) -> Self {
        if let DeliveryParameters::Satellite(ref mut sat) = self.delivery {
            sat.rolloff = rolloff;
            sat.pilot = pilot;
        }
        self
    }

    /// Unpack a legacy struct.
    ///
    /// Packed rolloff/pilot bits are read only for satellite requests with an
    /// extended FEC code. Reserved bit patterns are logged and fall back to
    /// auto; any other out-of-range value is an error.
    pub fn from_legacy(raw: &LegacyParameters) -> Result<Self, ProtocolError> {
        let (inversion, delivery) = match raw.body {
            LegacyBody::Qpsk {
                symbol_rate,
                fec_inner,
            } => {
                let fec = FecCode(fec_inner);
                if fec.is_extended() {
                    let inversion = if raw.inversion & PACKED_INVERSION_MASK != 0 {
                        Inversion::On
                    } else {
                        Inversion::Off
                    };
                    let rolloff = decode_rolloff(raw.inversion).unwrap_or_else(|| {
                        warn!("ROLLOFF unknown (inversion {:#04x}), using auto", raw.inversion);
                        Rolloff::Auto
                    });
                    let pilot = decode_pilot(raw.inversion).unwrap_or_else(|| {
                        warn!("PILOT unknown (inversion {:#04x}), using auto", raw.inversion);
                        Pilot::Auto
                    });
                    (
                        inversion,
                        DeliveryParameters::Satellite(SatelliteParameters {
                            symbol_rate,
                            fec,
                            rolloff,
                            pilot,
                        }),
                    )
                } else {
                    let inversion = Inversion::try_from(raw.inversion & INVERSION_MASK)
                        .unwrap_or_else(|_| {
                            warn!("Inversion {:#04x} unknown, using auto", raw.inversion);
                            Inversion::Auto
                        });
                    (
                        inversion,
                        DeliveryParameters::Satellite(SatelliteParameters {
                            symbol_rate,
                            fec,
                            rolloff: Rolloff::Auto,
                            pilot: Pilot::Auto,
                        }),
                    )
                }
            }
            LegacyBody::Qam {
                symbol_rate,
                fec_inner,
                modulation,
            } => (
                Inversion::try_from(raw.inversion)?,
                DeliveryParameters::Cable(CableParameters {
                    symbol_rate,
                    fec: CodeRate::try_from(fec_inner)?,
                    modulation: Modulation::try_from(modulation)?,
                }),
            ),
            LegacyBody::Ofdm {
                bandwidth,
                code_rate_hp,
                code_rate_lp,
                constellation,
                transmission_mode,
                guard_interval,
                hierarchy_information,
            } => (
                Inversion::try_from(raw.inversion)?,
                DeliveryParameters::Terrestrial(OfdmParameters {
                    bandwidth: Bandwidth::try_from(bandwidth)?,
                    code_rate_hp: CodeRate::try_from(code_rate_hp)?,
                    code_rate_lp: CodeRate::try_from(code_rate_lp)?,
                    constellation: Modulation::try_from(constellation)?,
                    transmission_mode: TransmissionMode::try_from(transmission_mode)?,
                    guard_interval: GuardInterval::try_from(guard_interval)?,
                    hierarchy: Hierarchy::try_from(hierarchy_information)?,
                }),
            ),
            // VSB frontends ignore inversion.
            LegacyBody::Vsb { modulation } => (
                Inversion::try_from(raw.inversion).unwrap_or(Inversion::Auto),
                DeliveryParameters::Atsc(AtscParameters {
                    modulation: Modulation::try_from(modulation)?,
                }),
            ),
        };

        Ok(Self {
            frequency: raw.frequency,
            inversion,
            delivery,
        })
    }

    /// Pack into the legacy struct.
    pub fn to_legacy(&self) -> LegacyParameters {
        let mut inversion = u32::from(self.inversion);
        let body = match self.delivery {
            DeliveryParameters::Satellite(sat) => {
                if sat.fec.is_extended() {
                    inversion &= PACKED_INVERSION_MASK;
                    inversion |= encode_rolloff(sat.rolloff) | encode_pilot(sat.pilot);
                }
                LegacyBody::Qpsk {
                    symbol_rate: sat.symbol_rate,
                    fec_inner: sat.fec.0,
                }
            }
            DeliveryParameters::Cable(cable) => LegacyBody::Qam {
                symbol_rate: cable.symbol_rate,
                fec_inner: cable.fec.into(),
                modulation: cable.modulation.into(),
            },
            DeliveryParameters::Terrestrial(ofdm) => LegacyBody::Ofdm {
                bandwidth: ofdm.bandwidth.into(),
                code_rate_hp: ofdm.code_rate_hp.into(),
                code_rate_lp: ofdm.code_rate_lp.into(),
                constellation: ofdm.constellation.into(),
                transmission_mode: ofdm.transmission_mode.into(),
                guard_interval: ofdm.guard_interval.into(),
                hierarchy_information: ofdm.hierarchy.into(),
            },
            DeliveryParameters::Atsc(atsc) => LegacyBody::Vsb {
                modulation: atsc.modulation.into(),
            },
        };

        LegacyParameters {
            frequency: self.frequency,
            inversion,
            body,
        }
    }
}

impl fmt::Display for TuningParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.delivery {
            DeliveryParameters::Satellite(sat) => write!(
                f,
                "freq:{} inversion:{:?} SR:{} FEC:{} ROLLOFF:{:?} PILOT:{:?}",
                self.frequency, self.inversion, sat.symbol_rate, sat.fec.0, sat.rolloff, sat.pilot
            ),
            DeliveryParameters::Cable(cable) => write!(
                f,
                "freq:{} inversion:{:?} SR:{} FEC:{:?} MOD:{:?}",
                self.frequency, self.inversion, cable.symbol_rate, cable.fec, cable.modulation
            ),
            DeliveryParameters::Terrestrial(ofdm) => write!(
                f,
                "freq:{} inversion:{:?} BW:{:?} MOD:{:?}",
                self.frequency, self.inversion, ofdm.bandwidth, ofdm.constellation
            ),
            DeliveryParameters::Atsc(atsc) => {
                write!(f, "freq:{} MOD:{:?}", self.frequency, atsc.modulation)
            }
        }
    }
}
