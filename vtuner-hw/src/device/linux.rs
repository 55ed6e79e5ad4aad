//! Linux DVB (v5 API) backend.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use std::ptr;

use log::{debug, error, info};
use nix::libc;
use vtuner_protocol::{
    Burst, DiseqcMessage, DiseqcReply, FrontendStatus, FrontendType, LegacyBody,
    LegacyParameters, PropertyCommand, Tone, Voltage, DTV_IOCTL_MAX_MSGS,
};

use crate::device::{DeviceConfig, FrontendDevice};
use crate::error::HwError;

const DMX_IN_FRONTEND: u32 = 0;
const DMX_OUT_TSDEMUX_TAP: u32 = 3;
const DMX_PES_OTHER: u32 = 20;
const DMX_SOURCE_FRONT0: u32 = 0;

#[repr(C)]
#[allow(dead_code)]
pub struct DvbFrontendInfo {
    name: [libc::c_char; 128],
    fe_type: u32,
    frequency_min: u32,
    frequency_max: u32,
    frequency_stepsize: u32,
    frequency_tolerance: u32,
    symbol_rate_min: u32,
    symbol_rate_max: u32,
    symbol_rate_tolerance: u32,
    notifier_delay: u32,
    caps: u32,
}

impl DvbFrontendInfo {
    fn zeroed() -> Self {
        Self {
            name: [0; 128],
            fe_type: 0,
            frequency_min: 0,
            frequency_max: 0,
            frequency_stepsize: 0,
            frequency_tolerance: 0,
            symbol_rate_min: 0,
            symbol_rate_max: 0,
            symbol_rate_tolerance: 0,
            notifier_delay: 0,
            caps: 0,
        }
    }

    fn name(&self) -> String {
        let bytes: Vec<u8> = self
            .name
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// `struct dvb_frontend_parameters`; the union is kept as raw words.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DvbFrontendParameters {
    frequency: u32,
    inversion: u32,
    u: [u32; 7],
}

impl From<&LegacyParameters> for DvbFrontendParameters {
    fn from(params: &LegacyParameters) -> Self {
        let mut u = [0u32; 7];
        match params.body {
            LegacyBody::Qpsk {
                symbol_rate,
                fec_inner,
            } => {
                u[0] = symbol_rate;
                u[1] = fec_inner;
            }
            LegacyBody::Qam {
                symbol_rate,
                fec_inner,
                modulation,
            } => {
                u[0] = symbol_rate;
                u[1] = fec_inner;
                u[2] = modulation;
            }
            LegacyBody::Ofdm {
                bandwidth,
                code_rate_hp,
                code_rate_lp,
                constellation,
                transmission_mode,
                guard_interval,
                hierarchy_information,
            } => {
                u = [
                    bandwidth,
                    code_rate_hp,
                    code_rate_lp,
                    constellation,
                    transmission_mode,
                    guard_interval,
                    hierarchy_information,
                ];
            }
            LegacyBody::Vsb { modulation } => {
                u[0] = modulation;
            }
        }
        Self {
            frequency: params.frequency,
            inversion: params.inversion,
            u,
        }
    }
}

impl DvbFrontendParameters {
    fn to_legacy(self, fe_type: FrontendType) -> LegacyParameters {
        let u = self.u;
        let body = match fe_type {
            FrontendType::Qpsk => LegacyBody::Qpsk {
                symbol_rate: u[0],
                fec_inner: u[1],
            },
            FrontendType::Qam => LegacyBody::Qam {
                symbol_rate: u[0],
                fec_inner: u[1],
                modulation: u[2],
            },
            FrontendType::Ofdm => LegacyBody::Ofdm {
                bandwidth: u[0],
                code_rate_hp: u[1],
                code_rate_lp: u[2],
                constellation: u[3],
                transmission_mode: u[4],
                guard_interval: u[5],
                hierarchy_information: u[6],
            },
            FrontendType::Atsc => LegacyBody::Vsb { modulation: u[0] },
        };
        LegacyParameters {
            frequency: self.frequency,
            inversion: self.inversion,
            body,
        }
    }
}

#[repr(C, packed)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub struct DtvBuffer {
    data: [u8; 32],
    len: u32,
    reserved1: [u32; 3],
    reserved2: *mut libc::c_void,
}

#[repr(C, packed)]
#[derive(Clone, Copy)]
pub union DtvPropertyValue {
    data: u32,
    buffer: DtvBuffer,
}

/// `struct dtv_property` (packed in the kernel header).
#[repr(C, packed)]
#[derive(Clone, Copy)]
#[allow(dead_code)]
pub struct DtvProperty {
    cmd: u32,
    reserved: [u32; 3],
    u: DtvPropertyValue,
    result: libc::c_int,
}

impl DtvProperty {
    fn new(cmd: u32, data: u32) -> Self {
        let mut u = DtvPropertyValue {
            buffer: DtvBuffer {
                data: [0; 32],
                len: 0,
                reserved1: [0; 3],
                reserved2: ptr::null_mut(),
            },
        };
        u.data = data;
        Self {
            cmd,
            reserved: [0; 3],
            u,
            result: 0,
        }
    }
}

#[repr(C)]
pub struct DtvProperties {
    num: u32,
    props: *mut DtvProperty,
}

#[repr(C)]
pub struct DmxPesFilterParams {
    pid: u16,
    input: u32,
    output: u32,
    pes_type: u32,
    flags: u32,
}

#[repr(C)]
pub struct DvbDiseqcMasterCmd {
    msg: [u8; 6],
    msg_len: u8,
}

#[repr(C)]
pub struct DvbDiseqcSlaveReply {
    msg: [u8; 4],
    msg_len: u8,
    timeout: libc::c_int,
}

mod ioctl {
    use super::{
        DmxPesFilterParams, DtvProperties, DvbDiseqcMasterCmd, DvbDiseqcSlaveReply,
        DvbFrontendInfo, DvbFrontendParameters,
    };

    nix::ioctl_read!(fe_get_info, b'o', 61, DvbFrontendInfo);
    nix::ioctl_write_ptr!(fe_diseqc_send_master_cmd, b'o', 63, DvbDiseqcMasterCmd);
    nix::ioctl_read!(fe_diseqc_recv_slave_reply, b'o', 64, DvbDiseqcSlaveReply);
    nix::ioctl_write_int_bad!(fe_diseqc_send_burst, nix::request_code_none!(b'o', 65));
    nix::ioctl_write_int_bad!(fe_set_tone, nix::request_code_none!(b'o', 66));
    nix::ioctl_write_int_bad!(fe_set_voltage, nix::request_code_none!(b'o', 67));
    nix::ioctl_read!(fe_read_status, b'o', 69, u32);
    nix::ioctl_write_ptr!(fe_set_frontend, b'o', 76, DvbFrontendParameters);
    nix::ioctl_read!(fe_get_frontend, b'o', 77, DvbFrontendParameters);
    nix::ioctl_write_ptr!(fe_set_property, b'o', 82, DtvProperties);

    nix::ioctl_none!(dmx_start, b'o', 41);
    nix::ioctl_write_ptr!(dmx_set_pes_filter, b'o', 44, DmxPesFilterParams);
    nix::ioctl_write_int_bad!(dmx_set_buffer_size, nix::request_code_none!(b'o', 45));
    nix::ioctl_write_ptr!(dmx_set_source, b'o', 49, u32);
    nix::ioctl_write_ptr!(dmx_add_pid, b'o', 51, u16);
    nix::ioctl_write_ptr!(dmx_remove_pid, b'o', 52, u16);
}

fn check(res: nix::Result<libc::c_int>) -> io::Result<()> {
    res.map(|_| ()).map_err(io::Error::from)
}

/// One DVB adapter: a frontend plus the demux tapping it.
pub struct DvbDevice {
    frontend: File,
    demux: File,
    name: String,
    fe_type: u32,
    config: DeviceConfig,
}

impl DvbDevice {
    /// Open the frontend and demux nodes and start the TS tap.
    pub fn open(config: &DeviceConfig) -> Result<Self, HwError> {
        let fe_path = config.frontend_path();
        let frontend = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&fe_path)
            .map_err(|e| {
                error!("failed to open {}: {}", fe_path, e);
                HwError::DeviceOpen {
                    path: PathBuf::from(&fe_path),
                    source: e,
                }
            })?;

        let mut info = DvbFrontendInfo::zeroed();
        check(unsafe { ioctl::fe_get_info(frontend.as_raw_fd(), &mut info) }).map_err(|e| {
            error!("FE_GET_INFO failed for {}: {}", fe_path, e);
            HwError::DeviceOpen {
                path: PathBuf::from(&fe_path),
                source: e,
            }
        })?;
        let name = info.name();
        debug!(
            "{}: \"{}\" type={} freq={}..{} caps={:#x}",
            fe_path, name, info.fe_type, info.frequency_min, info.frequency_max, info.caps
        );

        let dmx_path = config.demux_path();
        let demux = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&dmx_path)
            .map_err(|e| {
                error!("failed to open {}: {}", dmx_path, e);
                HwError::DeviceOpen {
                    path: PathBuf::from(&dmx_path),
                    source: e,
                }
            })?;

        let setup_err = |what: &str, e: io::Error| {
            error!("{} failed for {}: {}", what, dmx_path, e);
            HwError::DeviceOpen {
                path: PathBuf::from(&dmx_path),
                source: e,
            }
        };

        let fd = demux.as_raw_fd();
        let source = DMX_SOURCE_FRONT0 + config.frontend;
        check(unsafe { ioctl::dmx_set_source(fd, &source) })
            .map_err(|e| setup_err("DMX_SET_SOURCE", e))?;
        check(unsafe { ioctl::dmx_set_buffer_size(fd, config.demux_buffer_size as libc::c_int) })
            .map_err(|e| setup_err("DMX_SET_BUFFER_SIZE", e))?;

        // No useful PID is known yet; PID 1 keeps the filter valid.
        let filter = DmxPesFilterParams {
            pid: 1,
            input: DMX_IN_FRONTEND,
            output: DMX_OUT_TSDEMUX_TAP,
            pes_type: DMX_PES_OTHER,
            flags: 0,
        };
        check(unsafe { ioctl::dmx_set_pes_filter(fd, &filter) })
            .map_err(|e| setup_err("DMX_SET_PES_FILTER", e))?;

        if let Err(e) = check(unsafe { ioctl::dmx_start(fd) }) {
            error!("DMX_START failed for {}: {}", dmx_path, e);
        }

        info!("Opened {} ({}) with {}", fe_path, name, dmx_path);

        Ok(Self {
            frontend,
            demux,
            name,
            fe_type: info.fe_type,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }
}

impl FrontendDevice for DvbDevice {
    fn frontend_type(&self) -> u32 {
        self.fe_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn submit_legacy_tune(&mut self, params: &LegacyParameters) -> io::Result<()> {
        let raw = DvbFrontendParameters::from(params);
        check(unsafe { ioctl::fe_set_frontend(self.frontend.as_raw_fd(), &raw) })
    }

    fn submit_property_batch(&mut self, batch: &[PropertyCommand]) -> io::Result<()> {
        if batch.len() > DTV_IOCTL_MAX_MSGS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "{} properties exceed the limit of {}",
                    batch.len(),
                    DTV_IOCTL_MAX_MSGS
                ),
            ));
        }
        let mut props: Vec<DtvProperty> = batch
            .iter()
            .map(|cmd| DtvProperty::new(cmd.id, cmd.value))
            .collect();
        let cmdseq = DtvProperties {
            num: props.len() as u32,
            props: props.as_mut_ptr(),
        };
        check(unsafe { ioctl::fe_set_property(self.frontend.as_raw_fd(), &cmdseq) })
    }

    fn get_frontend(&mut self) -> io::Result<LegacyParameters> {
        let fe_type = FrontendType::try_from(self.fe_type)
            .map_err(|e| io::Error::new(io::ErrorKind::Unsupported, e))?;
        let mut raw = DvbFrontendParameters::default();
        check(unsafe { ioctl::fe_get_frontend(self.frontend.as_raw_fd(), &mut raw) })?;
        Ok(raw.to_legacy(fe_type))
    }

    fn add_stream(&mut self, pid: u16) -> io::Result<()> {
        check(unsafe { ioctl::dmx_add_pid(self.demux.as_raw_fd(), &pid) })
    }

    fn remove_stream(&mut self, pid: u16) -> io::Result<()> {
        check(unsafe { ioctl::dmx_remove_pid(self.demux.as_raw_fd(), &pid) })
    }

    fn read_status(&mut self) -> io::Result<FrontendStatus> {
        let mut status = 0u32;
        check(unsafe { ioctl::fe_read_status(self.frontend.as_raw_fd(), &mut status) })?;
        Ok(FrontendStatus(status))
    }

    fn set_voltage(&mut self, voltage: Voltage) -> io::Result<()> {
        check(unsafe {
            ioctl::fe_set_voltage(self.frontend.as_raw_fd(), u32::from(voltage) as libc::c_int)
        })
    }

    fn set_tone(&mut self, tone: Tone) -> io::Result<()> {
        check(unsafe { ioctl::fe_set_tone(self.frontend.as_raw_fd(), u32::from(tone) as libc::c_int) })
    }

    fn send_diseqc_message(&mut self, msg: &DiseqcMessage) -> io::Result<()> {
        let bytes = msg.as_bytes();
        let mut cmd = DvbDiseqcMasterCmd {
            msg: [0; 6],
            msg_len: bytes.len() as u8,
        };
        cmd.msg[..bytes.len()].copy_from_slice(bytes);
        check(unsafe { ioctl::fe_diseqc_send_master_cmd(self.frontend.as_raw_fd(), &cmd) })
    }

    fn recv_diseqc_reply(&mut self, timeout_ms: i32) -> io::Result<DiseqcReply> {
        let mut reply = DvbDiseqcSlaveReply {
            msg: [0; 4],
            msg_len: 0,
            timeout: timeout_ms,
        };
        check(unsafe { ioctl::fe_diseqc_recv_slave_reply(self.frontend.as_raw_fd(), &mut reply) })?;
        Ok(DiseqcReply::from_raw(reply.msg, reply.msg_len))
    }

    fn send_diseqc_burst(&mut self, burst: Burst) -> io::Result<()> {
        check(unsafe {
            ioctl::fe_diseqc_send_burst(self.frontend.as_raw_fd(), u32::from(burst) as libc::c_int)
        })
    }
}

impl Drop for DvbDevice {
    fn drop(&mut self) {
        debug!(
            "Closing adapter{} frontend{} demux{}",
            self.config.adapter, self.config.frontend, self.config.demux
        );
    }
}
