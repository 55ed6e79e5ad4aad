//! Staging area for individually set properties.

use log::debug;
use vtuner_protocol::{PropertyCommand, PropertyId, DTV_IOCTL_MAX_MSGS};

use crate::error::HwError;

/// Properties set one by one, flushed as one batch on commit.
///
/// Holds at most `capacity` commands, the commit marker included.
#[derive(Debug)]
pub struct PropertyBuffer {
    props: Vec<PropertyCommand>,
    capacity: usize,
}

impl Default for PropertyBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyBuffer {
    /// Buffer sized for one `FE_SET_PROPERTY` call.
    pub fn new() -> Self {
        Self::with_capacity(DTV_IOCTL_MAX_MSGS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            props: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn as_slice(&self) -> &[PropertyCommand] {
        &self.props
    }

    pub fn clear(&mut self) {
        self.props.clear();
    }

    /// Stage one property.
    ///
    /// `DTV_CLEAR` empties the buffer instead of being stored and
    /// `DTV_UNDEFINED` is ignored. Ids that are not properties are rejected.
    pub fn append(&mut self, cmd: PropertyCommand) -> Result<(), HwError> {
        match cmd.property() {
            Some(PropertyId::Clear) => {
                debug!("DTV_CLEAR, dropping {} staged properties", self.props.len());
                self.clear();
                Ok(())
            }
            Some(PropertyId::Undefined) => Ok(()),
            Some(id) if id.is_stageable() => self.push(cmd),
            _ => Err(HwError::UnknownAttribute(cmd.id)),
        }
    }

    /// Append the commit marker and hand out everything staged.
    ///
    /// The buffer is empty afterwards. On `BufferFull` nothing is drained.
    pub fn commit_and_drain(&mut self, commit: PropertyId) -> Result<Vec<PropertyCommand>, HwError> {
        self.push(PropertyCommand::new(commit, 0u32))?;
        let batch = std::mem::take(&mut self.props);
        self.props.reserve(self.capacity);
        Ok(batch)
    }

    fn push(&mut self, cmd: PropertyCommand) -> Result<(), HwError> {
        if self.props.len() >= self.capacity {
            return Err(HwError::BufferFull {
                capacity: self.capacity,
            });
        }
        self.props.push(cmd);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(value: u32) -> PropertyCommand {
        PropertyCommand::new(PropertyId::Frequency, value)
    }

    #[test]
    fn test_append_and_commit() {
        let mut buf = PropertyBuffer::new();
        buf.append(PropertyCommand::new(PropertyId::DeliverySystem, 6u32)).unwrap();
        buf.append(freq(1_177_000)).unwrap();
        assert_eq!(buf.len(), 2);

        let batch = buf.commit_and_drain(PropertyId::Tune).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[1], freq(1_177_000));
        assert_eq!(batch[2].property(), Some(PropertyId::Tune));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_clear_marker_empties_buffer() {
        let mut buf = PropertyBuffer::new();
        buf.append(freq(1)).unwrap();
        buf.append(freq(2)).unwrap();
        buf.append(PropertyCommand::new(PropertyId::Clear, 0u32)).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_undefined_is_ignored() {
        let mut buf = PropertyBuffer::new();
        buf.append(PropertyCommand::new(PropertyId::Undefined, 0u32)).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let mut buf = PropertyBuffer::new();
        buf.append(freq(1)).unwrap();
        match buf.append(PropertyCommand::raw(99, 5)) {
            Err(HwError::UnknownAttribute(99)) => {}
            other => panic!("unexpected result {:?}", other),
        }
        // Tune is a commit marker, not a property.
        assert!(matches!(
            buf.append(PropertyCommand::new(PropertyId::Tune, 0u32)),
            Err(HwError::UnknownAttribute(1))
        ));
        assert_eq!(buf.as_slice(), &[freq(1)]);
    }

    #[test]
    fn test_overflow_rejected_without_corruption() {
        let capacity = 4;
        let mut buf = PropertyBuffer::with_capacity(capacity);
        for i in 0..capacity as u32 {
            buf.append(freq(i)).unwrap();
        }
        assert!(matches!(
            buf.append(freq(99)),
            Err(HwError::BufferFull { capacity: 4 })
        ));
        assert_eq!(buf.len(), capacity);
        assert_eq!(buf.as_slice().last(), Some(&freq(3)));

        // No room for the commit marker either.
        assert!(matches!(
            buf.commit_and_drain(PropertyId::Tune),
            Err(HwError::BufferFull { .. })
        ));
        assert_eq!(buf.len(), capacity);
    }

    #[test]
    fn test_clear_restores_full_capacity() {
        let capacity = 4;
        let mut buf = PropertyBuffer::with_capacity(capacity);
        for i in 0..capacity as u32 {
            buf.append(freq(i)).unwrap();
        }
        assert!(matches!(buf.append(freq(99)), Err(HwError::BufferFull { .. })));

        buf.clear();
        assert!(buf.is_empty());
        for i in 0..capacity as u32 {
            buf.append(freq(10 + i)).unwrap();
        }
        assert_eq!(buf.len(), capacity);
        assert!(matches!(buf.append(freq(99)), Err(HwError::BufferFull { capacity: 4 })));
        assert_eq!(buf.as_slice().first(), Some(&freq(10)));
    }

    #[test]
    fn test_default_capacity() {
        let mut buf = PropertyBuffer::default();
        assert_eq!(buf.capacity(), DTV_IOCTL_MAX_MSGS);
        for i in 0..DTV_IOCTL_MAX_MSGS as u32 - 1 {
            buf.append(freq(i)).unwrap();
        }
        let batch = buf.commit_and_drain(PropertyId::Tune).unwrap();
        assert_eq!(batch.len(), DTV_IOCTL_MAX_MSGS);
        assert_eq!(buf.capacity(), DTV_IOCTL_MAX_MSGS);
    }
}
