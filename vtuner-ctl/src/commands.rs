//! Subcommand execution.

use log::info;
use serde_json::json;
use thiserror::Error;
use vtuner_hw::{extended_fec_code, FrontendDevice, HwError, HwSession};
use vtuner_protocol::{
    Bandwidth, CodeRate, FecCode, Inversion, Modulation, OfdmParameters, PidList, Pilot,
    PropertyCommand, PropertyId, ProtocolError, Rolloff, TunerKind, TuningParameters,
};

use crate::context::{Commands, OutputFormat, TuneArgs};

#[derive(Debug, Error)]
pub(crate) enum CtlError {
    #[error(transparent)]
    Hw(#[from] HwError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn invalid(msg: impl Into<String>) -> CtlError {
    CtlError::InvalidArgument(msg.into())
}

const PROPERTY_NAMES: &[(&str, PropertyId)] = &[
    ("UNDEFINED", PropertyId::Undefined),
    ("TUNE", PropertyId::Tune),
    ("CLEAR", PropertyId::Clear),
    ("FREQUENCY", PropertyId::Frequency),
    ("MODULATION", PropertyId::Modulation),
    ("BANDWIDTH_HZ", PropertyId::BandwidthHz),
    ("INVERSION", PropertyId::Inversion),
    ("DISEQC_MASTER", PropertyId::DiseqcMaster),
    ("SYMBOL_RATE", PropertyId::SymbolRate),
    ("INNER_FEC", PropertyId::InnerFec),
    ("VOLTAGE", PropertyId::Voltage),
    ("TONE", PropertyId::Tone),
    ("PILOT", PropertyId::Pilot),
    ("ROLLOFF", PropertyId::Rolloff),
    ("DISEQC_SLAVE_REPLY", PropertyId::DiseqcSlaveReply),
    ("FE_CAPABILITY_COUNT", PropertyId::FeCapabilityCount),
    ("FE_CAPABILITY", PropertyId::FeCapability),
    ("DELIVERY_SYSTEM", PropertyId::DeliverySystem),
];

fn parse_u32(s: &str) -> Option<u32> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Parse `ID=VALUE`. Unknown numeric ids are kept so the session can
/// reject them.
pub(crate) fn parse_property(s: &str) -> Result<PropertyCommand, String> {
    let (id, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=VALUE, got {:?}", s))?;
    let value = parse_u32(value.trim()).ok_or_else(|| format!("invalid value {:?}", value))?;

    let id = id.trim();
    if let Some(raw) = parse_u32(id) {
        return Ok(PropertyCommand::raw(raw, value));
    }
    let upper = id.to_ascii_uppercase();
    let name = upper.strip_prefix("DTV_").unwrap_or(&upper);
    PROPERTY_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, prop)| PropertyCommand::new(prop, value))
        .ok_or_else(|| format!("unknown property {:?}", id))
}

fn parse_code_rate(s: &str) -> Result<CodeRate, CtlError> {
    let rate = match s {
        "none" => CodeRate::None,
        "auto" => CodeRate::Auto,
        "1/2" => CodeRate::Fec1_2,
        "2/3" => CodeRate::Fec2_3,
        "3/4" => CodeRate::Fec3_4,
        "4/5" => CodeRate::Fec4_5,
        "5/6" => CodeRate::Fec5_6,
        "6/7" => CodeRate::Fec6_7,
        "7/8" => CodeRate::Fec7_8,
        "8/9" => CodeRate::Fec8_9,
        "3/5" => CodeRate::Fec3_5,
        "9/10" => CodeRate::Fec9_10,
        "2/5" => CodeRate::Fec2_5,
        other => return Err(invalid(format!("unknown FEC {:?}", other))),
    };
    Ok(rate)
}

/// Satellite FEC code from `--fec`, `--s2` and `--psk8`.
pub(crate) fn parse_satellite_fec(fec: &str, s2: bool, psk8: bool) -> Result<FecCode, CtlError> {
    if let Some(code) = parse_u32(fec) {
        if s2 || psk8 {
            return Err(invalid("a raw FEC code already selects the delivery system"));
        }
        return Ok(FecCode(code));
    }
    let rate = parse_code_rate(fec)?;
    if !(s2 || psk8) {
        return Ok(FecCode::legacy(rate));
    }
    extended_fec_code(rate, psk8)
        .ok_or_else(|| invalid(format!("FEC {} is not available with DVB-S2", fec)))
}

fn parse_inversion(s: &str) -> Result<Inversion, CtlError> {
    match s {
        "on" => Ok(Inversion::On),
        "off" => Ok(Inversion::Off),
        "auto" => Ok(Inversion::Auto),
        other => Err(invalid(format!("unknown inversion {:?}", other))),
    }
}

fn parse_rolloff(s: &str) -> Result<Rolloff, CtlError> {
    match s {
        "35" => Ok(Rolloff::R35),
        "25" => Ok(Rolloff::R25),
        "20" => Ok(Rolloff::R20),
        "auto" => Ok(Rolloff::Auto),
        other => Err(invalid(format!("unknown rolloff {:?}", other))),
    }
}

fn parse_pilot(s: &str) -> Result<Pilot, CtlError> {
    match s {
        "on" => Ok(Pilot::On),
        "off" => Ok(Pilot::Off),
        "auto" => Ok(Pilot::Auto),
        other => Err(invalid(format!("unknown pilot {:?}", other))),
    }
}

fn parse_modulation(s: &str) -> Result<Modulation, CtlError> {
    match s.to_ascii_lowercase().as_str() {
        "qpsk" => Ok(Modulation::Qpsk),
        "qam16" => Ok(Modulation::Qam16),
        "qam32" => Ok(Modulation::Qam32),
        "qam64" => Ok(Modulation::Qam64),
        "qam128" => Ok(Modulation::Qam128),
        "qam256" => Ok(Modulation::Qam256),
        "qam" | "auto" => Ok(Modulation::QamAuto),
        "8vsb" => Ok(Modulation::Vsb8),
        "16vsb" => Ok(Modulation::Vsb16),
        other => Err(invalid(format!("unknown modulation {:?}", other))),
    }
}

fn parse_bandwidth(s: &str) -> Result<Bandwidth, CtlError> {
    match s {
        "8" => Ok(Bandwidth::Mhz8),
        "7" => Ok(Bandwidth::Mhz7),
        "6" => Ok(Bandwidth::Mhz6),
        "5" => Ok(Bandwidth::Mhz5),
        "10" => Ok(Bandwidth::Mhz10),
        "1.712" => Ok(Bandwidth::Mhz1_712),
        "auto" => Ok(Bandwidth::Auto),
        other => Err(invalid(format!("unknown bandwidth {:?}", other))),
    }
}

/// Tuning request for a frontend of `kind`.
pub(crate) fn tuning_parameters(kind: TunerKind, args: &TuneArgs) -> Result<TuningParameters, CtlError> {
    let inversion = parse_inversion(&args.inversion)?;
    let symbol_rate = || {
        args.symbol_rate
            .ok_or_else(|| invalid(format!("--symbol-rate is required for {}", kind)))
    };

    let params = match kind {
        TunerKind::Satellite | TunerKind::SatelliteGen2 => {
            let fec = parse_satellite_fec(&args.fec, args.s2, args.psk8)?;
            TuningParameters::satellite(args.frequency, symbol_rate()?, fec).with_s2_hints(
                parse_rolloff(&args.rolloff)?,
                parse_pilot(&args.pilot)?,
            )
        }
        TunerKind::Cable => {
            let modulation = args.modulation.as_deref().unwrap_or("qam");
            TuningParameters::cable(
                args.frequency,
                symbol_rate()?,
                parse_code_rate(&args.fec)?,
                parse_modulation(modulation)?,
            )
        }
        TunerKind::Terrestrial => TuningParameters::terrestrial(
            args.frequency,
            OfdmParameters {
                bandwidth: parse_bandwidth(&args.bandwidth)?,
                ..Default::default()
            },
        ),
        TunerKind::Atsc => {
            let modulation = args.modulation.as_deref().unwrap_or("8vsb");
            TuningParameters::atsc(args.frequency, parse_modulation(modulation)?)
        }
        TunerKind::Unknown => return Err(invalid("cannot tune an unknown frontend")),
    };
    Ok(params.with_inversion(inversion))
}

/// Run one subcommand on an open session.
pub(crate) fn run<D: FrontendDevice>(
    session: &mut HwSession<D>,
    command: Commands,
    format: OutputFormat,
) -> Result<(), CtlError> {
    match command {
        Commands::Info => {
            let name = session.device().name().to_string();
            let kind = session.kind();
            match format {
                OutputFormat::Text => {
                    println!("{}", name);
                    println!("kind: {}", kind);
                    println!(
                        "tuning: {}",
                        if kind.uses_property_api() {
                            "property batch"
                        } else {
                            "legacy"
                        }
                    );
                }
                OutputFormat::Json => {
                    let out = json!({
                        "name": name,
                        "kind": kind,
                        "property_api": kind.uses_property_api(),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
        Commands::Tune(args) => {
            let params = tuning_parameters(session.kind(), &args)?;
            if args.packed {
                session.set_frontend_legacy(&params.to_legacy())?;
            } else {
                session.set_frontend(&params)?;
            }
            info!("Tuned: {}", params);
        }
        Commands::Frontend => {
            let params = session.get_frontend()?;
            match format {
                OutputFormat::Text => println!("{}", params),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&params)?),
            }
        }
        Commands::Status => {
            let status = session.read_status()?;
            match format {
                OutputFormat::Text => println!("{}", status),
                OutputFormat::Json => {
                    let out = json!({ "raw": status.0, "lock": status.has_lock() });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
        Commands::Pids { pids } => {
            let requested = PidList::try_from_pids(pids)?;
            let report = session.set_pids(requested);
            match format {
                OutputFormat::Text => {
                    println!("removed: {:x?}", report.delta.to_remove);
                    println!("added: {:x?}", report.delta.to_add);
                    if !report.is_complete() {
                        println!(
                            "failed: remove {:x?} add {:x?}",
                            report.failed_removals, report.failed_additions
                        );
                    }
                }
                OutputFormat::Json => {
                    let out = json!({
                        "removed": report.delta.to_remove,
                        "added": report.delta.to_add,
                        "failed_removals": report.failed_removals,
                        "failed_additions": report.failed_additions,
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
            }
        }
        Commands::Voltage { voltage } => session.set_voltage(voltage.into())?,
        Commands::Tone { tone } => session.set_tone(tone.into())?,
        Commands::Diseqc {
            bytes,
            reply_timeout,
        } => {
            session.send_diseqc_message(&bytes)?;
            if let Some(timeout) = reply_timeout {
                let reply = session.recv_diseqc_reply(timeout)?;
                println!("{:02x?}", reply.as_bytes());
            }
        }
        Commands::Burst { burst } => session.send_diseqc_burst(burst.into())?,
        Commands::Props { props } => {
            for prop in props {
                session.set_property(prop)?;
            }
            session.set_property(PropertyCommand::new(PropertyId::Tune, 0u32))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tune_args(frequency: u32) -> TuneArgs {
        TuneArgs {
            frequency,
            symbol_rate: Some(27_500_000),
            fec: "auto".to_string(),
            s2: false,
            psk8: false,
            inversion: "auto".to_string(),
            rolloff: "auto".to_string(),
            pilot: "auto".to_string(),
            modulation: None,
            bandwidth: "auto".to_string(),
            packed: false,
        }
    }

    #[test]
    fn test_parse_property() {
        assert_eq!(
            parse_property("dtv_symbol_rate=27500000").unwrap(),
            PropertyCommand::new(PropertyId::SymbolRate, 27_500_000u32)
        );
        assert_eq!(
            parse_property("Pilot=0x1").unwrap(),
            PropertyCommand::new(PropertyId::Pilot, 1u32)
        );
        assert_eq!(parse_property("99=5").unwrap(), PropertyCommand::raw(99, 5));
        assert!(parse_property("FREQUENCY").is_err());
        assert!(parse_property("NOPE=1").is_err());
        assert!(parse_property("FREQUENCY=abc").is_err());
    }

    #[test]
    fn test_parse_satellite_fec() {
        assert_eq!(parse_satellite_fec("3/4", false, false).unwrap(), FecCode(3));
        assert_eq!(parse_satellite_fec("3/4", true, false).unwrap(), FecCode(12));
        assert_eq!(parse_satellite_fec("3/4", false, true).unwrap(), FecCode(21));
        assert_eq!(parse_satellite_fec("23", false, false).unwrap(), FecCode(23));
        assert!(parse_satellite_fec("6/7", true, false).is_err());
        assert!(parse_satellite_fec("23", true, false).is_err());
    }

    #[test]
    fn test_satellite_tuning_parameters() {
        let mut args = tune_args(1_177_000);
        args.fec = "8/9".to_string();
        args.psk8 = true;
        args.rolloff = "20".to_string();
        args.pilot = "on".to_string();
        args.inversion = "off".to_string();

        let params = tuning_parameters(TunerKind::Satellite, &args).unwrap();
        let expected = TuningParameters::satellite(1_177_000, 27_500_000, FecCode(24))
            .with_s2_hints(Rolloff::R20, Pilot::On)
            .with_inversion(Inversion::Off);
        assert_eq!(params, expected);
    }

    #[test]
    fn test_cable_needs_symbol_rate() {
        let mut args = tune_args(474_000_000);
        args.symbol_rate = None;
        assert!(matches!(
            tuning_parameters(TunerKind::Cable, &args),
            Err(CtlError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_terrestrial_and_atsc_parameters() {
        let mut args = tune_args(506_000_000);
        args.symbol_rate = None;
        args.bandwidth = "8".to_string();
        let params = tuning_parameters(TunerKind::Terrestrial, &args).unwrap();
        let ofdm = OfdmParameters {
            bandwidth: Bandwidth::Mhz8,
            ..Default::default()
        };
        assert_eq!(params, TuningParameters::terrestrial(506_000_000, ofdm));

        let params = tuning_parameters(TunerKind::Atsc, &args).unwrap();
        assert_eq!(params, TuningParameters::atsc(506_000_000, Modulation::Vsb8));
    }
}
