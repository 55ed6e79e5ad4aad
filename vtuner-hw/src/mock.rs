//! Recording device used by the unit tests.

use std::collections::HashSet;
use std::io;

use vtuner_protocol::{
    Burst, DiseqcMessage, DiseqcReply, FrontendStatus, FrontendType, LegacyParameters,
    PropertyCommand, Tone, Voltage,
};

use crate::device::FrontendDevice;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LegacyTune(LegacyParameters),
    PropertyBatch(Vec<PropertyCommand>),
    GetFrontend,
    AddStream(u16),
    RemoveStream(u16),
    ReadStatus,
    Voltage(Voltage),
    Tone(Tone),
    DiseqcMessage(Vec<u8>),
    DiseqcReply(i32),
    Burst(Burst),
}

pub struct MockDevice {
    pub fe_type: u32,
    pub calls: Vec<Call>,
    /// PIDs whose add/remove fails.
    pub fail_pids: HashSet<u16>,
    /// Operations that fail, by name (`"legacy_tune"`, `"property_batch"`, ...).
    pub fail_ops: HashSet<&'static str>,
    pub status: FrontendStatus,
    pub frontend: Option<LegacyParameters>,
    pub reply: DiseqcReply,
}

impl MockDevice {
    pub fn new(fe_type: u32) -> Self {
        Self {
            fe_type,
            calls: Vec::new(),
            fail_pids: HashSet::new(),
            fail_ops: HashSet::new(),
            status: FrontendStatus::default(),
            frontend: None,
            reply: DiseqcReply::default(),
        }
    }

    pub fn satellite() -> Self {
        Self::new(FrontendType::Qpsk as u32)
    }

    pub fn cable() -> Self {
        Self::new(FrontendType::Qam as u32)
    }

    fn call(&mut self, op: &'static str, call: Call) -> io::Result<()> {
        self.calls.push(call);
        if self.fail_ops.contains(op) {
            return Err(io::Error::new(io::ErrorKind::Other, format!("{} rejected", op)));
        }
        Ok(())
    }

    fn stream_call(&mut self, pid: u16, call: Call) -> io::Result<()> {
        self.calls.push(call);
        if self.fail_pids.contains(&pid) {
            return Err(io::Error::from_raw_os_error(22));
        }
        Ok(())
    }
}

impl FrontendDevice for MockDevice {
    fn frontend_type(&self) -> u32 {
        self.fe_type
    }

    fn name(&self) -> &str {
        "mock frontend"
    }

    fn submit_legacy_tune(&mut self, params: &LegacyParameters) -> io::Result<()> {
        self.call("legacy_tune", Call::LegacyTune(*params))?;
        self.frontend = Some(*params);
        Ok(())
    }

    fn submit_property_batch(&mut self, batch: &[PropertyCommand]) -> io::Result<()> {
        self.call("property_batch", Call::PropertyBatch(batch.to_vec()))
    }

    fn get_frontend(&mut self) -> io::Result<LegacyParameters> {
        self.call("get_frontend", Call::GetFrontend)?;
        self.frontend
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "not tuned"))
    }

    fn add_stream(&mut self, pid: u16) -> io::Result<()> {
        self.stream_call(pid, Call::AddStream(pid))
    }

    fn remove_stream(&mut self, pid: u16) -> io::Result<()> {
        self.stream_call(pid, Call::RemoveStream(pid))
    }

    fn read_status(&mut self) -> io::Result<FrontendStatus> {
        self.call("read_status", Call::ReadStatus)?;
        Ok(self.status)
    }

    fn set_voltage(&mut self, voltage: Voltage) -> io::Result<()> {
        self.call("set_voltage", Call::Voltage(voltage))
    }

    fn set_tone(&mut self, tone: Tone) -> io::Result<()> {
        self.call("set_tone", Call::Tone(tone))
    }

    fn send_diseqc_message(&mut self, msg: &DiseqcMessage) -> io::Result<()> {
        self.call("diseqc_message", Call::DiseqcMessage(msg.as_bytes().to_vec()))
    }

    fn recv_diseqc_reply(&mut self, timeout_ms: i32) -> io::Result<DiseqcReply> {
        self.call("diseqc_reply", Call::DiseqcReply(timeout_ms))?;
        Ok(self.reply)
    }

    fn send_diseqc_burst(&mut self, burst: Burst) -> io::Result<()> {
        self.call("diseqc_burst", Call::Burst(burst))
    }
}
