use std::io;

use vtuner_protocol::{
    Burst, DiseqcMessage, DiseqcReply, FrontendStatus, LegacyParameters, PropertyCommand, Tone,
    Voltage,
};

#[cfg(target_os = "linux")]
pub use self::linux::DvbDevice;
#[cfg(not(target_os = "linux"))]
pub use self::unsupported::DvbDevice;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(not(target_os = "linux"))]
mod unsupported;

/// Default demux buffer size (1 MiB).
pub const DEFAULT_DEMUX_BUFFER_SIZE: u32 = 1024 * 1024;

/// Location of one DVB adapter's nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub adapter: u32,
    pub frontend: u32,
    pub demux: u32,
    pub demux_buffer_size: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adapter: 0,
            frontend: 0,
            demux: 0,
            demux_buffer_size: DEFAULT_DEMUX_BUFFER_SIZE,
        }
    }
}

impl DeviceConfig {
    pub fn frontend_path(&self) -> String {
        format!("/dev/dvb/adapter{}/frontend{}", self.adapter, self.frontend)
    }

    pub fn demux_path(&self) -> String {
        format!("/dev/dvb/adapter{}/demux{}", self.adapter, self.demux)
    }
}

/// The device a session drives.
///
/// Every call is a single blocking request to the hardware; no retry
/// happens at this level.
pub trait FrontendDevice {
    /// Raw frontend category (`fe_type`) as reported by the hardware.
    fn frontend_type(&self) -> u32;

    /// Human readable frontend name.
    fn name(&self) -> &str;

    fn submit_legacy_tune(&mut self, params: &LegacyParameters) -> io::Result<()>;

    fn submit_property_batch(&mut self, batch: &[PropertyCommand]) -> io::Result<()>;

    fn get_frontend(&mut self) -> io::Result<LegacyParameters>;

    fn add_stream(&mut self, pid: u16) -> io::Result<()>;

    fn remove_stream(&mut self, pid: u16) -> io::Result<()>;

    fn read_status(&mut self) -> io::Result<FrontendStatus>;

    fn set_voltage(&mut self, voltage: Voltage) -> io::Result<()>;

    fn set_tone(&mut self, tone: Tone) -> io::Result<()>;

    fn send_diseqc_message(&mut self, msg: &DiseqcMessage) -> io::Result<()>;

    fn recv_diseqc_reply(&mut self, timeout_ms: i32) -> io::Result<DiseqcReply>;

    fn send_diseqc_burst(&mut self, burst: Burst) -> io::Result<()>;
}

impl<D: FrontendDevice + ?Sized> FrontendDevice for Box<D> {
    fn frontend_type(&self) -> u32 {
        (**self).frontend_type()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn submit_legacy_tune(&mut self, params: &LegacyParameters) -> io::Result<()> {
        (**self).submit_legacy_tune(params)
    }

    fn submit_property_batch(&mut self, batch: &[PropertyCommand]) -> io::Result<()> {
        (**self).submit_property_batch(batch)
    }

    fn get_frontend(&mut self) -> io::Result<LegacyParameters> {
        (**self).get_frontend()
    }

    fn add_stream(&mut self, pid: u16) -> io::Result<()> {
        (**self).add_stream(pid)
    }

    fn remove_stream(&mut self, pid: u16) -> io::Result<()> {
        (**self).remove_stream(pid)
    }

    fn read_status(&mut self) -> io::Result<FrontendStatus> {
        (**self).read_status()
    }

    fn set_voltage(&mut self, voltage: Voltage) -> io::Result<()> {
        (**self).set_voltage(voltage)
    }

    fn set_tone(&mut self, tone: Tone) -> io::Result<()> {
        (**self).set_tone(tone)
    }

    fn send_diseqc_message(&mut self, msg: &DiseqcMessage) -> io::Result<()> {
        (**self).send_diseqc_message(msg)
    }

    fn recv_diseqc_reply(&mut self, timeout_ms: i32) -> io::Result<DiseqcReply> {
        (**self).recv_diseqc_reply(timeout_ms)
    }

    fn send_diseqc_burst(&mut self, burst: Burst) -> io::Result<()> {
        (**self).send_diseqc_burst(burst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_paths() {
        let config = DeviceConfig {
            adapter: 2,
            frontend: 1,
            demux: 0,
            ..Default::default()
        };
        assert_eq!(config.frontend_path(), "/dev/dvb/adapter2/frontend1");
        assert_eq!(config.demux_path(), "/dev/dvb/adapter2/demux0");
        assert_eq!(config.demux_buffer_size, DEFAULT_DEMUX_BUFFER_SIZE);
    }
}
