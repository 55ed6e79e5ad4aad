//! Enumerations and small value types of the DVB frontend/demux contract.
//!
//! All numeric values match `linux/dvb/frontend.h` (DVB API v5), which the
//! device side treats as a fixed contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Maximum number of properties in one `FE_SET_PROPERTY` call (`DTV_IOCTL_MAX_MSGS`).
pub const DTV_IOCTL_MAX_MSGS: usize = 64;

/// Number of PID slots in the legacy PID list.
pub const MAX_PIDS: usize = 30;

/// Slot value marking an unused entry of the legacy PID list.
pub const PID_SLOT_EMPTY: u16 = 0xFFFF;

/// Defines a `#[repr(u32)]` enum with lossless `u32` conversions.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl TryFrom<u32> for $name {
            type Error = ProtocolError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    _ => Err(ProtocolError::InvalidValue {
                        field: stringify!($name),
                        value,
                    }),
                }
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> Self {
                value as u32
            }
        }
    };
}

/// Closed set of receiver front-end kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TunerKind {
    /// DVB-S (QPSK frontend).
    Satellite,
    /// DVB-S2 capable satellite frontend.
    SatelliteGen2,
    /// DVB-C (QAM frontend).
    Cable,
    /// DVB-T (OFDM frontend).
    Terrestrial,
    /// ATSC (VSB frontend).
    Atsc,
    /// Anything else.
    Unknown,
}

impl TunerKind {
    /// Whether tuning goes through the property-list protocol.
    pub fn uses_property_api(self) -> bool {
        matches!(self, TunerKind::Satellite | TunerKind::SatelliteGen2)
    }

    /// Short display name.
    pub fn name(self) -> &'static str {
        match self {
            TunerKind::Satellite => "DVB-S",
            TunerKind::SatelliteGen2 => "DVB-S2",
            TunerKind::Cable => "DVB-C",
            TunerKind::Terrestrial => "DVB-T",
            TunerKind::Atsc => "ATSC",
            TunerKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TunerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

wire_enum! {
    /// Frontend category reported by `FE_GET_INFO` (`enum fe_type`).
    pub enum FrontendType {
        Qpsk = 0,
        Qam = 1,
        Ofdm = 2,
        Atsc = 3,
    }
}

wire_enum! {
    /// DVB v5 property commands (`DTV_*`).
    pub enum PropertyId {
        Undefined = 0,
        Tune = 1,
        Clear = 2,
        Frequency = 3,
        Modulation = 4,
        BandwidthHz = 5,
        Inversion = 6,
        DiseqcMaster = 7,
        SymbolRate = 8,
        InnerFec = 9,
        Voltage = 10,
        Tone = 11,
        Pilot = 12,
        Rolloff = 13,
        DiseqcSlaveReply = 14,
        FeCapabilityCount = 15,
        FeCapability = 16,
        DeliverySystem = 17,
    }
}

impl PropertyId {
    /// Whether a property of this id is staged in the property buffer.
    ///
    /// `Undefined`, `Tune` and `Clear` are control markers and never stored.
    pub fn is_stageable(self) -> bool {
        !matches!(
            self,
            PropertyId::Undefined | PropertyId::Tune | PropertyId::Clear
        )
    }
}

wire_enum! {
    /// Spectral inversion (`enum fe_spectral_inversion`).
    pub enum Inversion {
        Off = 0,
        On = 1,
        Auto = 2,
    }
}

wire_enum! {
    /// Forward error correction code rate (`enum fe_code_rate`).
    pub enum CodeRate {
        None = 0,
        Fec1_2 = 1,
        Fec2_3 = 2,
        Fec3_4 = 3,
        Fec4_5 = 4,
        Fec5_6 = 5,
        Fec6_7 = 6,
        Fec7_8 = 7,
        Fec8_9 = 8,
        Auto = 9,
        Fec3_5 = 10,
        Fec9_10 = 11,
        Fec2_5 = 12,
    }
}

wire_enum! {
    /// Modulation (`enum fe_modulation`).
    pub enum Modulation {
        Qpsk = 0,
        Qam16 = 1,
        Qam32 = 2,
        Qam64 = 3,
        Qam128 = 4,
        Qam256 = 5,
        QamAuto = 6,
        Vsb8 = 7,
        Vsb16 = 8,
        Psk8 = 9,
        Apsk16 = 10,
        Apsk32 = 11,
        Dqpsk = 12,
        Qam4Nr = 13,
    }
}

wire_enum! {
    /// DVB-S2 rolloff factor (`enum fe_rolloff`).
    pub enum Rolloff {
        R35 = 0,
        R20 = 1,
        R25 = 2,
        Auto = 3,
    }
}

wire_enum! {
    /// DVB-S2 pilot symbols (`enum fe_pilot`).
    pub enum Pilot {
        On = 0,
        Off = 1,
        Auto = 2,
    }
}

wire_enum! {
    /// Delivery system (`enum fe_delivery_system`), satellite subset used here.
    pub enum DeliverySystem {
        Undefined = 0,
        DvbcAnnexA = 1,
        DvbcAnnexB = 2,
        Dvbt = 3,
        Dss = 4,
        Dvbs = 5,
        Dvbs2 = 6,
    }
}

wire_enum! {
    /// OFDM channel bandwidth (`enum fe_bandwidth`).
    pub enum Bandwidth {
        Mhz8 = 0,
        Mhz7 = 1,
        Mhz6 = 2,
        Auto = 3,
        Mhz5 = 4,
        Mhz10 = 5,
        Mhz1_712 = 6,
    }
}

wire_enum! {
    /// OFDM transmission mode (`enum fe_transmit_mode`).
    pub enum TransmissionMode {
        Mode2k = 0,
        Mode8k = 1,
        Auto = 2,
        Mode4k = 3,
        Mode1k = 4,
        Mode16k = 5,
        Mode32k = 6,
    }
}

wire_enum! {
    /// OFDM guard interval (`enum fe_guard_interval`).
    pub enum GuardInterval {
        Gi1_32 = 0,
        Gi1_16 = 1,
        Gi1_8 = 2,
        Gi1_4 = 3,
        Auto = 4,
        Gi1_128 = 5,
        Gi19_128 = 6,
        Gi19_256 = 7,
    }
}

wire_enum! {
    /// OFDM hierarchy (`enum fe_hierarchy`).
    pub enum Hierarchy {
        None = 0,
        H1 = 1,
        H2 = 2,
        H4 = 3,
        Auto = 4,
    }
}

wire_enum! {
    /// LNB supply voltage (`enum fe_sec_voltage`).
    pub enum Voltage {
        V13 = 0,
        V18 = 1,
        Off = 2,
    }
}

wire_enum! {
    /// 22kHz continuous tone (`enum fe_sec_tone_mode`).
    pub enum Tone {
        On = 0,
        Off = 1,
    }
}

wire_enum! {
    /// DiSEqC mini command (`enum fe_sec_mini_cmd`).
    pub enum Burst {
        MiniA = 0,
        MiniB = 1,
    }
}

/// One attribute/value pair of a property batch (`struct dtv_property`).
///
/// The id is kept raw so that unknown ids can reach validation and be
/// rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCommand {
    pub id: u32,
    pub value: u32,
}

impl PropertyCommand {
    /// Create a command for a known property.
    pub fn new(id: PropertyId, value: impl Into<u32>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }

    /// Create a command from raw wire values.
    pub fn raw(id: u32, value: u32) -> Self {
        Self { id, value }
    }

    /// The property id, if it is a known one.
    pub fn property(&self) -> Option<PropertyId> {
        PropertyId::try_from(self.id).ok()
    }
}

impl fmt::Display for PropertyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.property() {
            Some(id) => write!(f, "{:?}={}", id, self.value),
            None => write!(f, "#{}={}", self.id, self.value),
        }
    }
}

/// Frontend lock status bits (`enum fe_status`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendStatus(pub u32);

impl FrontendStatus {
    pub const HAS_SIGNAL: u32 = 0x01;
    pub const HAS_CARRIER: u32 = 0x02;
    pub const HAS_VITERBI: u32 = 0x04;
    pub const HAS_SYNC: u32 = 0x08;
    pub const HAS_LOCK: u32 = 0x10;
    pub const TIMEDOUT: u32 = 0x20;
    pub const REINIT: u32 = 0x40;

    const NAMES: [(u32, &'static str); 7] = [
        (Self::HAS_SIGNAL, "SIGNAL"),
        (Self::HAS_CARRIER, "CARRIER"),
        (Self::HAS_VITERBI, "VITERBI"),
        (Self::HAS_SYNC, "SYNC"),
        (Self::HAS_LOCK, "LOCK"),
        (Self::TIMEDOUT, "TIMEDOUT"),
        (Self::REINIT, "REINIT"),
    ];

    pub fn contains(self, bits: u32) -> bool {
        self.0 & bits == bits
    }

    pub fn has_lock(self) -> bool {
        self.contains(Self::HAS_LOCK)
    }
}

impl fmt::Display for FrontendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(bit, _)| self.0 & bit != 0)
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// DiSEqC master command (`struct dvb_diseqc_master_cmd`), 3 to 6 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseqcMessage {
    msg: [u8; 6],
    len: u8,
}

impl DiseqcMessage {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 6;

    pub fn new(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&bytes.len()) {
            return Err(ProtocolError::InvalidDiseqcLength {
                len: bytes.len(),
                min: Self::MIN_LEN,
                max: Self::MAX_LEN,
            });
        }
        let mut msg = [0u8; 6];
        msg[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            msg,
            len: bytes.len() as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.msg[..self.len as usize]
    }
}

/// DiSEqC slave reply (`struct dvb_diseqc_slave_reply`), up to 4 bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseqcReply {
    msg: [u8; 4],
    len: u8,
}

impl DiseqcReply {
    pub const MAX_LEN: usize = 4;

    /// Build a reply from the raw slot array, clamping a bogus length.
    pub fn from_raw(msg: [u8; 4], len: u8) -> Self {
        Self {
            msg,
            len: len.min(Self::MAX_LEN as u8),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.msg[..self.len as usize]
    }
}
