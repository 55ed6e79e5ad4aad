//! One-shot requests relayed to the device unchanged.

use log::{debug, warn};
use vtuner_protocol::{
    Burst, DiseqcMessage, DiseqcReply, FrontendStatus, LegacyParameters, Tone, Voltage,
};

use crate::device::FrontendDevice;
use crate::error::HwError;
use crate::session::HwSession;

fn failed(op: &'static str, e: std::io::Error) -> HwError {
    warn!("{} failed: {}", op, e);
    HwError::device(op, e)
}

impl<D: FrontendDevice> HwSession<D> {
    pub fn read_status(&mut self) -> Result<FrontendStatus, HwError> {
        let status = self
            .device
            .read_status()
            .map_err(|e| failed("FE_READ_STATUS", e))?;
        debug!("FE_READ_STATUS {}", status);
        Ok(status)
    }

    /// Parameters the frontend is currently tuned to.
    pub fn get_frontend(&mut self) -> Result<LegacyParameters, HwError> {
        self.device
            .get_frontend()
            .map_err(|e| failed("FE_GET_FRONTEND", e))
    }

    pub fn set_voltage(&mut self, voltage: Voltage) -> Result<(), HwError> {
        debug!("FE_SET_VOLTAGE {:?}", voltage);
        self.device
            .set_voltage(voltage)
            .map_err(|e| failed("FE_SET_VOLTAGE", e))
    }

    pub fn set_tone(&mut self, tone: Tone) -> Result<(), HwError> {
        debug!("FE_SET_TONE {:?}", tone);
        self.device
            .set_tone(tone)
            .map_err(|e| failed("FE_SET_TONE", e))
    }

    /// Send a DiSEqC master command of 3 to 6 bytes.
    pub fn send_diseqc_message(&mut self, bytes: &[u8]) -> Result<(), HwError> {
        let msg = DiseqcMessage::new(bytes)?;
        debug!("FE_DISEQC_SEND_MASTER_CMD {:02x?}", msg.as_bytes());
        self.device
            .send_diseqc_message(&msg)
            .map_err(|e| failed("FE_DISEQC_SEND_MASTER_CMD", e))
    }

    pub fn recv_diseqc_reply(&mut self, timeout_ms: i32) -> Result<DiseqcReply, HwError> {
        self.device
            .recv_diseqc_reply(timeout_ms)
            .map_err(|e| failed("FE_DISEQC_RECV_SLAVE_REPLY", e))
    }

    pub fn send_diseqc_burst(&mut self, burst: Burst) -> Result<(), HwError> {
        debug!("FE_DISEQC_SEND_BURST {:?}", burst);
        self.device
            .send_diseqc_burst(burst)
            .map_err(|e| failed("FE_DISEQC_SEND_BURST", e))
    }
}
