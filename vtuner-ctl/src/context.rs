use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_num::maybe_hex;
use vtuner_protocol::{Burst, PropertyCommand, Tone, Voltage};

use crate::commands::parse_property;

#[derive(Debug, Parser)]
#[clap(name = "vtuner-ctl")]
#[clap(about = "Operate a DVB adapter through the vtuner hardware control layer.", long_about = None)]
#[clap(author = "maleicacid")]
#[clap(version)]
pub(crate) struct Cli {
    /// Configuration file path.{n}
    /// Defaults to `vtuner.toml` in the working directory when present.
    #[clap(short = 'f', long, global = true)]
    pub config: Option<PathBuf>,

    /// Adapter number (`/dev/dvb/adapterN`).
    #[clap(short, long, global = true)]
    pub adapter: Option<u32>,

    /// Frontend number within the adapter.
    #[clap(long, global = true)]
    pub frontend: Option<u32>,

    /// Demux number within the adapter.
    #[clap(long, global = true)]
    pub demux: Option<u32>,

    /// Enable verbose logging
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Directory where log files are stored
    #[clap(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Number of days to keep log files
    #[clap(long, global = true)]
    pub log_retention_days: Option<u64>,

    /// Output format.
    #[clap(value_enum, long, global = true, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum VoltageArg {
    #[value(name = "13")]
    V13,
    #[value(name = "18")]
    V18,
    Off,
}

impl From<VoltageArg> for Voltage {
    fn from(v: VoltageArg) -> Self {
        match v {
            VoltageArg::V13 => Voltage::V13,
            VoltageArg::V18 => Voltage::V18,
            VoltageArg::Off => Voltage::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ToneArg {
    On,
    Off,
}

impl From<ToneArg> for Tone {
    fn from(t: ToneArg) -> Self {
        match t {
            ToneArg::On => Tone::On,
            ToneArg::Off => Tone::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum BurstArg {
    A,
    B,
}

impl From<BurstArg> for Burst {
    fn from(b: BurstArg) -> Self {
        match b {
            BurstArg::A => Burst::MiniA,
            BurstArg::B => Burst::MiniB,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Show the frontend name and how it is driven.
    Info,
    /// Tune the frontend.{n}
    /// Which options apply depends on the frontend kind:
    /// satellite uses the symbol rate, FEC and the DVB-S2 options,
    /// cable adds the modulation, terrestrial the bandwidth,
    /// ATSC only the modulation.
    Tune(TuneArgs),
    /// Show the parameters the frontend is tuned to.
    Frontend,
    /// Read the signal status bits.
    Status,
    /// Set the PIDs delivered by the demux.{n}
    /// PIDs missing from the list are removed, new ones added.
    /// An empty list removes every PID.
    Pids {
        /// PIDs, decimal or 0x-prefixed hex.
        #[clap(value_parser = maybe_hex::<u16>)]
        pids: Vec<u16>,
    },
    /// Set the LNB voltage.
    Voltage {
        #[clap(value_enum)]
        voltage: VoltageArg,
    },
    /// Switch the 22 kHz tone.
    Tone {
        #[clap(value_enum)]
        tone: ToneArg,
    },
    /// Send a DiSEqC master command (3 to 6 bytes).
    Diseqc {
        /// Message bytes, decimal or 0x-prefixed hex.
        #[clap(value_parser = maybe_hex::<u8>, num_args = 3..=6, required = true)]
        bytes: Vec<u8>,

        /// Wait this many milliseconds for a slave reply.
        #[clap(long, value_name = "ms")]
        reply_timeout: Option<i32>,
    },
    /// Send a DiSEqC mini burst.
    Burst {
        #[clap(value_enum)]
        burst: BurstArg,
    },
    /// Set properties one by one and tune.{n}
    /// Each property is `ID=VALUE` where ID is a `DTV_*` name
    /// (with or without the prefix) or its number.
    Props {
        #[clap(value_parser = parse_property, required = true)]
        props: Vec<PropertyCommand>,
    },
}

#[derive(Debug, Args)]
pub(crate) struct TuneArgs {
    /// Frequency (kHz for satellite, Hz otherwise).
    #[clap(long)]
    pub frequency: u32,

    /// Symbol rate in symbols per second.
    #[clap(long, value_name = "SR")]
    pub symbol_rate: Option<u32>,

    /// Inner FEC: `auto`, `none`, a rate such as `3/4`, or a raw code.
    #[clap(long, default_value = "auto")]
    pub fec: String,

    /// Use DVB-S2 with the given FEC rate.
    #[clap(long)]
    pub s2: bool,

    /// Use DVB-S2 8PSK with the given FEC rate.
    #[clap(long)]
    pub psk8: bool,

    /// Spectral inversion: `on`, `off` or `auto`.
    #[clap(long, default_value = "auto")]
    pub inversion: String,

    /// DVB-S2 rolloff: `35`, `25`, `20` or `auto`.
    #[clap(long, default_value = "auto")]
    pub rolloff: String,

    /// DVB-S2 pilot: `on`, `off` or `auto`.
    #[clap(long, default_value = "auto")]
    pub pilot: String,

    /// Modulation for cable and ATSC, e.g. `qam256`, `8vsb`.
    #[clap(long)]
    pub modulation: Option<String>,

    /// Channel bandwidth in MHz for terrestrial, or `auto`.
    #[clap(long, default_value = "auto")]
    pub bandwidth: String,

    /// Send the request as a legacy struct with packed DVB-S2 hints.
    #[clap(long)]
    pub packed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use vtuner_protocol::PropertyId;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_pids_hex() {
        let cli = Cli::parse_from(["vtuner-ctl", "pids", "0x100", "17", "0x1fff"]);
        match cli.command {
            Commands::Pids { pids } => assert_eq!(pids, vec![0x100, 17, 0x1fff]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_options_after_subcommand() {
        let cli = Cli::parse_from(["vtuner-ctl", "status", "--adapter", "2", "--format", "json"]);
        assert_eq!(cli.adapter, Some(2));
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_voltage() {
        let cli = Cli::parse_from(["vtuner-ctl", "voltage", "18"]);
        match cli.command {
            Commands::Voltage { voltage } => assert_eq!(Voltage::from(voltage), Voltage::V18),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_diseqc_length_enforced() {
        assert!(Cli::try_parse_from(["vtuner-ctl", "diseqc", "0xe0", "0x10"]).is_err());
        let cli = Cli::parse_from(["vtuner-ctl", "diseqc", "0xe0", "0x10", "0x38", "0xf0"]);
        match cli.command {
            Commands::Diseqc { bytes, reply_timeout } => {
                assert_eq!(bytes, vec![0xe0, 0x10, 0x38, 0xf0]);
                assert_eq!(reply_timeout, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_props() {
        let cli = Cli::parse_from(["vtuner-ctl", "props", "DTV_FREQUENCY=1177000", "13=2"]);
        match cli.command {
            Commands::Props { props } => {
                assert_eq!(props[0], PropertyCommand::new(PropertyId::Frequency, 1_177_000u32));
                assert_eq!(props[1], PropertyCommand::new(PropertyId::Rolloff, 2u32));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
