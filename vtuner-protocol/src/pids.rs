//! Stream identifier (PID) sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{MAX_PIDS, PID_SLOT_EMPTY};

/// A bounded set of PIDs.
///
/// The legacy contract carries PIDs as a fixed array of [`MAX_PIDS`] slots
/// with [`PID_SLOT_EMPTY`] marking unused ones; that form only exists at the
/// boundary ([`PidList::from_slots`] / [`PidList::to_slots`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PidList {
    pids: BTreeSet<u16>,
}

impl PidList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a slot array. Empty slots and repeated PIDs are skipped.
    pub fn from_slots(slots: &[u16; MAX_PIDS]) -> Self {
        Self {
            pids: slots
                .iter()
                .copied()
                .filter(|&pid| pid != PID_SLOT_EMPTY)
                .collect(),
        }
    }

    /// Build from arbitrary PIDs, rejecting the sentinel and overflow.
    pub fn try_from_pids<I>(pids: I) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = u16>,
    {
        let mut list = Self::new();
        for pid in pids {
            list.insert(pid)?;
        }
        Ok(list)
    }

    /// Insert a PID. Returns `Ok(false)` if it was already present.
    pub fn insert(&mut self, pid: u16) -> Result<bool, ProtocolError> {
        if pid == PID_SLOT_EMPTY {
            return Err(ProtocolError::ReservedPid(pid));
        }
        if self.pids.contains(&pid) {
            return Ok(false);
        }
        if self.pids.len() >= MAX_PIDS {
            return Err(ProtocolError::PidListFull {
                capacity: MAX_PIDS,
            });
        }
        Ok(self.pids.insert(pid))
    }

    pub fn contains(&self, pid: u16) -> bool {
        self.pids.contains(&pid)
    }

    pub fn len(&self) -> usize {
        self.pids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pids.is_empty()
    }

    /// PIDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.pids.iter().copied()
    }

    /// PIDs of `self` that are not in `other`, ascending.
    pub fn difference<'a>(&'a self, other: &'a PidList) -> impl Iterator<Item = u16> + 'a {
        self.pids.difference(&other.pids).copied()
    }

    /// Slot array form, PIDs first and the rest filled with the sentinel.
    pub fn to_slots(&self) -> [u16; MAX_PIDS] {
        let mut slots = [PID_SLOT_EMPTY; MAX_PIDS];
        for (slot, pid) in slots.iter_mut().zip(self.pids.iter()) {
            *slot = *pid;
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slots_skips_sentinel_and_duplicates() {
        let mut slots = [PID_SLOT_EMPTY; MAX_PIDS];
        slots[0] = 0x100;
        slots[3] = 0x200;
        slots[7] = 0x100;
        let list = PidList::from_slots(&slots);

        assert_eq!(list.len(), 2);
        assert!(list.contains(0x100));
        assert!(list.contains(0x200));
        assert!(!list.contains(PID_SLOT_EMPTY));
    }

    #[test]
    fn test_to_slots() {
        let list = PidList::try_from_pids([18, 0, 17]).unwrap();
        let slots = list.to_slots();
        assert_eq!(&slots[..3], &[0, 17, 18]);
        assert!(slots[3..].iter().all(|&s| s == PID_SLOT_EMPTY));
    }

    #[test]
    fn test_insert_rejects_sentinel() {
        let mut list = PidList::new();
        assert_eq!(
            list.insert(PID_SLOT_EMPTY),
            Err(ProtocolError::ReservedPid(PID_SLOT_EMPTY))
        );
        assert!(list.is_empty());
    }

    #[test]
    fn test_capacity() {
        let mut list = PidList::try_from_pids(0..MAX_PIDS as u16).unwrap();
        // Re-inserting an existing PID is fine even when full.
        assert_eq!(list.insert(0), Ok(false));
        assert_eq!(
            list.insert(1000),
            Err(ProtocolError::PidListFull { capacity: MAX_PIDS })
        );
    }
}
