//! Per-device session state.

use log::{debug, info, warn};
use vtuner_protocol::{
    LegacyParameters, PidList, PropertyCommand, PropertyId, TunerKind, TuningParameters, MAX_PIDS,
};

use crate::buffer::PropertyBuffer;
use crate::builder::{build_from_legacy, build_tune_sequence, TuneCommand};
use crate::classify::classify;
use crate::device::FrontendDevice;
use crate::error::HwError;
use crate::reconcile::{ReconcileReport, StreamReconciler};

/// One opened frontend with the state the control layer keeps for it.
///
/// A session is owned by exactly one caller; every operation takes
/// `&mut self`. Run one session per device to drive several devices.
pub struct HwSession<D: FrontendDevice> {
    pub(crate) device: D,
    kind: TunerKind,
    props: PropertyBuffer,
    streams: StreamReconciler,
}

impl<D: FrontendDevice> HwSession<D> {
    /// Classify the device and start an empty session on it.
    pub fn new(device: D) -> Result<Self, HwError> {
        let kind = classify(device.frontend_type())?;
        info!("Session opened on \"{}\" ({})", device.name(), kind);
        Ok(Self {
            device,
            kind,
            props: PropertyBuffer::new(),
            streams: StreamReconciler::new(),
        })
    }

    pub fn kind(&self) -> TunerKind {
        self.kind
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// End the session and hand the device back.
    pub fn into_device(self) -> D {
        self.device
    }

    /// PIDs the device was last asked to deliver.
    pub fn active_pids(&self) -> &PidList {
        self.streams.active()
    }

    pub fn staged_properties(&self) -> &[PropertyCommand] {
        self.props.as_slice()
    }

    /// Tune to `params`.
    pub fn set_frontend(&mut self, params: &TuningParameters) -> Result<(), HwError> {
        let summary = params.to_string();
        info!("set_frontend {}", summary);
        let cmd = build_tune_sequence(self.kind, params);
        self.submit_tune(cmd, &summary)
    }

    /// Tune to a legacy struct, unpacking DVB-S2 hints for satellite kinds.
    pub fn set_frontend_legacy(&mut self, raw: &LegacyParameters) -> Result<(), HwError> {
        let summary = raw.to_string();
        info!("set_frontend {}", summary);
        let cmd = build_from_legacy(self.kind, raw)?;
        self.submit_tune(cmd, &summary)
    }

    fn submit_tune(&mut self, cmd: TuneCommand, summary: &str) -> Result<(), HwError> {
        match cmd {
            TuneCommand::Legacy(params) => {
                self.device.submit_legacy_tune(&params).map_err(|e| {
                    warn!("FE_SET_FRONTEND failed ({}): {}", summary, e);
                    HwError::device("FE_SET_FRONTEND", e)
                })
            }
            TuneCommand::PropertyBatch(batch) => {
                let clear = [PropertyCommand::new(PropertyId::Clear, 0u32)];
                if let Err(e) = self.device.submit_property_batch(&clear) {
                    warn!("DTV_CLEAR failed: {}", e);
                }
                self.device.submit_property_batch(&batch).map_err(|e| {
                    warn!("FE_SET_PROPERTY failed ({}): {}", summary, e);
                    HwError::device("FE_SET_PROPERTY", e)
                })
            }
            TuneCommand::Empty => Ok(()),
        }
    }

    /// Stage one property; `DTV_TUNE` submits everything staged so far.
    pub fn set_property(&mut self, cmd: PropertyCommand) -> Result<(), HwError> {
        if cmd.property() != Some(PropertyId::Tune) {
            debug!("set_property {}", cmd);
            return self.props.append(cmd);
        }

        let batch = self.props.commit_and_drain(PropertyId::Tune)?;
        debug!("FE_SET_PROPERTY with {} properties", batch.len());
        self.device.submit_property_batch(&batch).map_err(|e| {
            warn!("FE_SET_PROPERTY failed: {}", e);
            HwError::device("FE_SET_PROPERTY", e)
        })
    }

    /// Properties cannot be read back; the call is logged and succeeds.
    pub fn get_property(&mut self, cmd: PropertyCommand) -> Result<(), HwError> {
        info!("get_property {} not supported", cmd);
        Ok(())
    }

    /// Make the demux deliver exactly `requested`.
    pub fn set_pids(&mut self, requested: PidList) -> ReconcileReport {
        let report = self.streams.apply(&mut self.device, requested);
        if !report.is_complete() {
            warn!(
                "PID update incomplete: remove failed for {:?}, add failed for {:?}",
                report.failed_removals, report.failed_additions
            );
        }
        report
    }

    /// [`HwSession::set_pids`] for the slot array form.
    pub fn set_pid_slots(&mut self, slots: &[u16; MAX_PIDS]) -> ReconcileReport {
        self.set_pids(PidList::from_slots(slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockDevice};
    use vtuner_protocol::{CodeRate, FecCode, LegacyBody, Modulation, PID_SLOT_EMPTY};

    #[test]
    fn test_new_rejects_unknown_frontend() {
        match HwSession::new(MockDevice::new(9)) {
            Err(HwError::UnsupportedHardware(9)) => {}
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("session opened on an unknown frontend"),
        }
    }

    #[test]
    fn test_satellite_tune_sends_clear_then_batch() {
        let mut session = HwSession::new(MockDevice::satellite()).unwrap();
        assert_eq!(session.kind(), TunerKind::Satellite);

        let params = TuningParameters::satellite(1_177_000, 27_500_000, FecCode(21));
        session.set_frontend(&params).unwrap();

        let calls = &session.device().calls;
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            Call::PropertyBatch(vec![PropertyCommand::new(PropertyId::Clear, 0u32)])
        );
        match &calls[1] {
            Call::PropertyBatch(batch) => {
                assert_eq!(batch.len(), 9);
                assert_eq!(batch[8].property(), Some(PropertyId::Tune));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_cable_tune_is_legacy() {
        let mut session = HwSession::new(MockDevice::cable()).unwrap();
        let params =
            TuningParameters::cable(474_000_000, 6_900_000, CodeRate::Auto, Modulation::Qam256);
        session.set_frontend(&params).unwrap();
        assert_eq!(
            session.device().calls,
            vec![Call::LegacyTune(params.to_legacy())]
        );
    }

    #[test]
    fn test_tune_failure_is_surfaced_once() {
        let mut dev = MockDevice::cable();
        dev.fail_ops.insert("legacy_tune");
        let mut session = HwSession::new(dev).unwrap();
        let raw = LegacyParameters {
            frequency: 474_000_000,
            inversion: 2,
            body: LegacyBody::Qam {
                symbol_rate: 6_900_000,
                fec_inner: 9,
                modulation: 5,
            },
        };
        match session.set_frontend_legacy(&raw) {
            Err(HwError::DeviceOperationFailed { op, .. }) => assert_eq!(op, "FE_SET_FRONTEND"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(session.device().calls.len(), 1);
    }

    #[test]
    fn test_streamed_properties_commit_on_tune() {
        let mut session = HwSession::new(MockDevice::satellite()).unwrap();
        session
            .set_property(PropertyCommand::new(PropertyId::Frequency, 1_177_000u32))
            .unwrap();
        session
            .set_property(PropertyCommand::new(PropertyId::SymbolRate, 27_500_000u32))
            .unwrap();
        assert_eq!(session.staged_properties().len(), 2);
        assert!(session.device().calls.is_empty());

        session
            .set_property(PropertyCommand::new(PropertyId::Tune, 0u32))
            .unwrap();
        assert!(session.staged_properties().is_empty());
        match &session.device().calls[..] {
            [Call::PropertyBatch(batch)] => assert_eq!(batch.len(), 3),
            other => panic!("unexpected calls {:?}", other),
        }
    }

    #[test]
    fn test_unknown_property_is_rejected() {
        let mut session = HwSession::new(MockDevice::satellite()).unwrap();
        assert!(matches!(
            session.set_property(PropertyCommand::raw(42, 0)),
            Err(HwError::UnknownAttribute(42))
        ));
        assert!(session.get_property(PropertyCommand::raw(42, 0)).is_ok());
        assert!(session.device().calls.is_empty());
    }

    #[test]
    fn test_set_pid_slots() {
        let mut session = HwSession::new(MockDevice::satellite()).unwrap();
        let mut slots = [PID_SLOT_EMPTY; MAX_PIDS];
        slots[0] = 0x100;
        slots[1] = 0x200;
        let report = session.set_pid_slots(&slots);
        assert_eq!(report.delta.to_add, vec![0x100, 0x200]);
        assert_eq!(session.active_pids().len(), 2);

        let dev = session.into_device();
        assert_eq!(dev.calls, vec![Call::AddStream(0x100), Call::AddStream(0x200)]);
    }
}
