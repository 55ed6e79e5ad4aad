//! Translation of a tuning request into the commands a frontend accepts.
//!
//! Cable, terrestrial and ATSC frontends are tuned with the legacy fixed
//! struct. Satellite frontends are tuned with a DVB v5 property batch so
//! that DVB-S2 requests can carry delivery system, modulation, rolloff and
//! pilot, which the legacy struct has no fields for.

use log::{debug, warn};
use vtuner_protocol::{
    CodeRate, DeliveryParameters, DeliverySystem, FecCode, Inversion, LegacyParameters,
    Modulation, Pilot, PropertyCommand, PropertyId, Rolloff, TunerKind, TuningParameters,
};

use crate::error::HwError;

/// Number of entries in a satellite property batch.
pub const SATELLITE_BATCH_LEN: usize = 9;

/// What to submit to the device for one tune request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuneCommand {
    Legacy(LegacyParameters),
    PropertyBatch(Vec<PropertyCommand>),
    /// Nothing to submit.
    Empty,
}

struct ExtendedFec {
    code: u32,
    rate: CodeRate,
    eight_psk: bool,
}

const fn ext(code: u32, rate: CodeRate, eight_psk: bool) -> ExtendedFec {
    ExtendedFec {
        code,
        rate,
        eight_psk,
    }
}

/// Extended FEC codes. Each code rate appears twice: once with QPSK and
/// once, nine codes further, with 8PSK.
static EXTENDED_FEC: [ExtendedFec; 18] = [
    ext(10, CodeRate::Fec1_2, false),
    ext(11, CodeRate::Fec2_3, false),
    ext(12, CodeRate::Fec3_4, false),
    ext(13, CodeRate::Fec5_6, false),
    ext(14, CodeRate::Fec7_8, false),
    ext(15, CodeRate::Fec8_9, false),
    ext(16, CodeRate::Fec3_5, false),
    ext(17, CodeRate::Fec4_5, false),
    ext(18, CodeRate::Fec9_10, false),
    ext(19, CodeRate::Fec1_2, true),
    ext(20, CodeRate::Fec2_3, true),
    ext(21, CodeRate::Fec3_4, true),
    ext(22, CodeRate::Fec5_6, true),
    ext(23, CodeRate::Fec7_8, true),
    ext(24, CodeRate::Fec8_9, true),
    ext(25, CodeRate::Fec3_5, true),
    ext(26, CodeRate::Fec4_5, true),
    ext(27, CodeRate::Fec9_10, true),
];

/// Code rate and modulation selected by an extended FEC code.
pub fn resolve_extended_fec(fec: FecCode) -> Option<(CodeRate, Modulation)> {
    EXTENDED_FEC.iter().find(|e| e.code == fec.0).map(|e| {
        let modulation = if e.eight_psk {
            Modulation::Psk8
        } else {
            Modulation::Qpsk
        };
        (e.rate, modulation)
    })
}

/// Extended FEC code for a DVB-S2 code rate, `None` if the rate has none.
pub fn extended_fec_code(rate: CodeRate, eight_psk: bool) -> Option<FecCode> {
    EXTENDED_FEC
        .iter()
        .find(|e| e.rate == rate && e.eight_psk == eight_psk)
        .map(|e| FecCode(e.code))
}

/// Resolved values of a satellite property batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SatelliteTune {
    system: DeliverySystem,
    modulation: Modulation,
    fec: u32,
    inversion: Inversion,
    rolloff: Rolloff,
    pilot: Pilot,
}

impl SatelliteTune {
    fn resolve(inversion: Inversion, fec: FecCode, rolloff: Rolloff, pilot: Pilot) -> Self {
        let mut tune = SatelliteTune {
            system: DeliverySystem::Dvbs,
            modulation: Modulation::Qpsk,
            fec: fec.0,
            inversion: Inversion::Auto,
            rolloff: Rolloff::Auto,
            pilot: Pilot::Auto,
        };
        if !fec.is_extended() {
            return tune;
        }

        tune.system = DeliverySystem::Dvbs2;
        tune.inversion = inversion;
        tune.rolloff = rolloff;
        tune.pilot = pilot;
        match resolve_extended_fec(fec) {
            Some((rate, modulation)) => {
                tune.fec = rate.into();
                tune.modulation = modulation;
            }
            None => {
                let err = HwError::Configuration(format!("FEC code {} unknown", fec.0));
                warn!("{}, using FEC auto", err);
                tune.fec = CodeRate::Auto.into();
            }
        }
        tune
    }

    fn into_batch(self, frequency: u32, symbol_rate: u32) -> Vec<PropertyCommand> {
        vec![
            PropertyCommand::new(PropertyId::DeliverySystem, self.system),
            PropertyCommand::new(PropertyId::Frequency, frequency),
            PropertyCommand::new(PropertyId::Modulation, self.modulation),
            PropertyCommand::new(PropertyId::SymbolRate, symbol_rate),
            PropertyCommand::new(PropertyId::InnerFec, self.fec),
            PropertyCommand::new(PropertyId::Inversion, self.inversion),
            PropertyCommand::new(PropertyId::Rolloff, self.rolloff),
            PropertyCommand::new(PropertyId::Pilot, self.pilot),
            PropertyCommand::new(PropertyId::Tune, 0u32),
        ]
    }
}

/// Build the command sequence tuning a frontend of `kind` to `params`.
pub fn build_tune_sequence(kind: TunerKind, params: &TuningParameters) -> TuneCommand {
    match kind {
        TunerKind::Cable | TunerKind::Terrestrial | TunerKind::Atsc => {
            TuneCommand::Legacy(params.to_legacy())
        }
        TunerKind::Satellite | TunerKind::SatelliteGen2 => {
            let sat = match params.delivery {
                DeliveryParameters::Satellite(sat) => sat,
                other => {
                    warn!("{} frontend cannot be tuned with {:?}", kind, other);
                    return TuneCommand::Empty;
                }
            };
            let tune = SatelliteTune::resolve(params.inversion, sat.fec, sat.rolloff, sat.pilot);
            debug!(
                "{:?} MOD:{:?} FEC:{} INV:{:?} ROLLOFF:{:?} PILOT:{:?}",
                tune.system, tune.modulation, tune.fec, tune.inversion, tune.rolloff, tune.pilot
            );
            TuneCommand::PropertyBatch(tune.into_batch(params.frequency, sat.symbol_rate))
        }
        TunerKind::Unknown => {
            warn!("No tune sequence for {} frontend", kind);
            TuneCommand::Empty
        }
    }
}

/// [`build_tune_sequence`] for a legacy struct as received from a client.
///
/// Legacy kinds get the struct back untouched. Satellite requests are
/// unpacked first, so packed rolloff/pilot bits reach the batch.
pub fn build_from_legacy(kind: TunerKind, raw: &LegacyParameters) -> Result<TuneCommand, HwError> {
    match kind {
        TunerKind::Cable | TunerKind::Terrestrial | TunerKind::Atsc => {
            Ok(TuneCommand::Legacy(*raw))
        }
        _ => {
            let params = TuningParameters::from_legacy(raw)?;
            Ok(build_tune_sequence(kind, &params))
        }
    }
}
