//! Keeping the demux PID filters in line with the requested stream set.

use log::{debug, warn};
use vtuner_protocol::PidList;

use crate::device::FrontendDevice;

/// PIDs to drop and to add to move from one stream set to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamDelta {
    pub to_remove: Vec<u16>,
    pub to_add: Vec<u16>,
}

impl StreamDelta {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Outcome of [`StreamReconciler::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub delta: StreamDelta,
    pub failed_removals: Vec<u16>,
    pub failed_additions: Vec<u16>,
}

impl ReconcileReport {
    /// Whether every add/remove reached the device.
    pub fn is_complete(&self) -> bool {
        self.failed_removals.is_empty() && self.failed_additions.is_empty()
    }
}

/// Tracks the stream set the device was last asked to deliver.
#[derive(Debug, Default)]
pub struct StreamReconciler {
    active: PidList,
}

impl StreamReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &PidList {
        &self.active
    }

    /// Delta from the tracked set to `requested`, without side effects.
    pub fn diff(&self, requested: &PidList) -> StreamDelta {
        StreamDelta {
            to_remove: self.active.difference(requested).collect(),
            to_add: requested.difference(&self.active).collect(),
        }
    }

    /// Compute the delta and adopt `requested` as the tracked set.
    pub fn reconcile(&mut self, requested: PidList) -> StreamDelta {
        let delta = self.diff(&requested);
        self.active = requested;
        delta
    }

    /// Reconcile and push the delta to `device`, removals first.
    ///
    /// A failing PID is logged and skipped. The tracked set becomes
    /// `requested` no matter how many operations failed.
    pub fn apply<D>(&mut self, device: &mut D, requested: PidList) -> ReconcileReport
    where
        D: FrontendDevice + ?Sized,
    {
        let delta = self.reconcile(requested);
        let mut report = ReconcileReport::default();

        for &pid in &delta.to_remove {
            debug!("DMX_REMOVE_PID {:#06x}", pid);
            if let Err(e) = device.remove_stream(pid) {
                warn!("DMX_REMOVE_PID {:#06x} failed: {}", pid, e);
                report.failed_removals.push(pid);
            }
        }
        for &pid in &delta.to_add {
            debug!("DMX_ADD_PID {:#06x}", pid);
            if let Err(e) = device.add_stream(pid) {
                warn!("DMX_ADD_PID {:#06x} failed: {}", pid, e);
                report.failed_additions.push(pid);
            }
        }

        report.delta = delta;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Call, MockDevice};

    fn pids(list: &[u16]) -> PidList {
        PidList::try_from_pids(list.iter().copied()).unwrap()
    }

    #[test]
    fn test_reconcile_sequence() {
        let mut rec = StreamReconciler::new();

        let delta = rec.reconcile(pids(&[1, 2, 3]));
        assert_eq!(delta.to_remove, Vec::<u16>::new());
        assert_eq!(delta.to_add, vec![1, 2, 3]);

        let delta = rec.reconcile(pids(&[2, 3, 4]));
        assert_eq!(delta.to_remove, vec![1]);
        assert_eq!(delta.to_add, vec![4]);

        // Same request again: nothing to do.
        assert!(rec.reconcile(pids(&[2, 3, 4])).is_empty());
        assert_eq!(rec.active(), &pids(&[2, 3, 4]));
    }

    #[test]
    fn test_reconcile_to_empty() {
        let mut rec = StreamReconciler::new();
        rec.reconcile(pids(&[0x100, 0x101]));
        let delta = rec.reconcile(PidList::new());
        assert_eq!(delta.to_remove, vec![0x100, 0x101]);
        assert!(delta.to_add.is_empty());
        assert!(rec.active().is_empty());
    }

    #[test]
    fn test_diff_has_no_side_effects() {
        let mut rec = StreamReconciler::new();
        rec.reconcile(pids(&[1]));
        let delta = rec.diff(&pids(&[2]));
        assert_eq!(delta.to_remove, vec![1]);
        assert_eq!(rec.active(), &pids(&[1]));
    }

    #[test]
    fn test_apply_removes_before_adding() {
        let mut dev = MockDevice::satellite();
        let mut rec = StreamReconciler::new();
        rec.apply(&mut dev, pids(&[1, 2, 3]));
        dev.calls.clear();

        let report = rec.apply(&mut dev, pids(&[2, 3, 4, 5]));
        assert!(report.is_complete());
        assert_eq!(
            dev.calls,
            vec![Call::RemoveStream(1), Call::AddStream(4), Call::AddStream(5)]
        );
    }

    #[test]
    fn test_apply_continues_after_failures() {
        let mut dev = MockDevice::satellite();
        dev.fail_pids.insert(3);
        dev.fail_pids.insert(7);
        let mut rec = StreamReconciler::new();
        rec.apply(&mut dev, pids(&[3, 4]));
        dev.calls.clear();

        let report = rec.apply(&mut dev, pids(&[4, 7, 8]));
        assert_eq!(report.failed_removals, vec![3]);
        assert_eq!(report.failed_additions, vec![7]);
        assert_eq!(
            dev.calls,
            vec![Call::RemoveStream(3), Call::AddStream(7), Call::AddStream(8)]
        );
        // The requested set is adopted regardless.
        assert_eq!(rec.active(), &pids(&[4, 7, 8]));
    }

    #[test]
    fn test_slots_with_duplicates_and_sentinels() {
        let mut slots = [vtuner_protocol::PID_SLOT_EMPTY; vtuner_protocol::MAX_PIDS];
        slots[0] = 0x11;
        slots[1] = 0x12;
        slots[5] = 0x11;
        let mut rec = StreamReconciler::new();
        let delta = rec.reconcile(PidList::from_slots(&slots));
        assert_eq!(delta.to_add, vec![0x11, 0x12]);
    }
}
