use std::io;
use std::io::ErrorKind;
use std::path::PathBuf;

use vtuner_protocol::{
    Burst, DiseqcMessage, DiseqcReply, FrontendStatus, LegacyParameters, PropertyCommand, Tone,
    Voltage,
};

use crate::device::{DeviceConfig, FrontendDevice};
use crate::error::HwError;

const UNSUPPORTED_MSG: &str = "DVB device access is not supported on this platform (supported: Linux)";

fn unsupported() -> io::Error {
    io::Error::new(ErrorKind::Unsupported, UNSUPPORTED_MSG)
}

pub struct DvbDevice {
    config: DeviceConfig,
}

impl DvbDevice {
    pub fn open(config: &DeviceConfig) -> Result<Self, HwError> {
        Err(HwError::DeviceOpen {
            path: PathBuf::from(config.frontend_path()),
            source: unsupported(),
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}

impl FrontendDevice for DvbDevice {
    fn frontend_type(&self) -> u32 {
        u32::MAX
    }

    fn name(&self) -> &str {
        ""
    }

    fn submit_legacy_tune(&mut self, _params: &LegacyParameters) -> io::Result<()> {
        Err(unsupported())
    }

    fn submit_property_batch(&mut self, _batch: &[PropertyCommand]) -> io::Result<()> {
        Err(unsupported())
    }

    fn get_frontend(&mut self) -> io::Result<LegacyParameters> {
        Err(unsupported())
    }

    fn add_stream(&mut self, _pid: u16) -> io::Result<()> {
        Err(unsupported())
    }

    fn remove_stream(&mut self, _pid: u16) -> io::Result<()> {
        Err(unsupported())
    }

    fn read_status(&mut self) -> io::Result<FrontendStatus> {
        Err(unsupported())
    }

    fn set_voltage(&mut self, _voltage: Voltage) -> io::Result<()> {
        Err(unsupported())
    }

    fn set_tone(&mut self, _tone: Tone) -> io::Result<()> {
        Err(unsupported())
    }

    fn send_diseqc_message(&mut self, _msg: &DiseqcMessage) -> io::Result<()> {
        Err(unsupported())
    }

    fn recv_diseqc_reply(&mut self, _timeout_ms: i32) -> io::Result<DiseqcReply> {
        Err(unsupported())
    }

    fn send_diseqc_burst(&mut self, _burst: Burst) -> io::Result<()> {
        Err(unsupported())
    }
}
