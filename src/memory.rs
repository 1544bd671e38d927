//! Byte images as the disassembler sees them.
//!
//! A board usually spreads one instruction word over several ROM chips
//! (MSB, LSB, and often a fast I/O select PROM). [`WideMemory`] stacks the
//! per-chip images so that one address yields one wide word.

use tracing::debug;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("no channels to combine")]
    NoChannels,
    #[error("channel {channel} has {found} bytes, expected {expected}")]
    LengthMismatch { channel: usize, expected: usize, found: usize },
}

/// Parallel byte channels addressed together.
#[derive(Debug, Clone)]
pub struct WideMemory {
    channels: Vec<Vec<u8>>,
    size: usize,
}

impl WideMemory {
    /// Fails before producing any word if the channels differ in length.
    pub fn new(channels: Vec<Vec<u8>>) -> Result<Self, MemoryError> {
        let expected = channels.first().ok_or(MemoryError::NoChannels)?.len();
        if let Some((channel, c)) = channels.iter().enumerate().find(|(_, c)| c.len() != expected) {
            return Err(MemoryError::LengthMismatch { channel, expected, found: c.len() });
        }
        debug!(channels = channels.len(), words = expected, "channels combined");
        Ok(Self { channels, size: expected })
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn width(&self) -> usize {
        self.channels.len()
    }

    /// The bytes at `addr`, one per channel in construction order.
    pub fn word(&self, addr: usize) -> Option<Vec<u8>> {
        (addr < self.size).then(|| self.channels.iter().map(|c| c[addr]).collect())
    }

    pub fn words(&self) -> impl Iterator<Item = Vec<u8>> + '_ {
        (0..self.size).map(|a| self.channels.iter().map(|c| c[a]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_stacked_per_address() {
        let mem = WideMemory::new(vec![vec![0xe0, 0x81], vec![0x10, 0x42], vec![0x77, 0x07]]).unwrap();
        assert_eq!(mem.len(), 2);
        assert_eq!(mem.width(), 3);
        assert_eq!(mem.word(1), Some(vec![0x81, 0x42, 0x07]));
        assert_eq!(mem.word(2), None);
        assert_eq!(mem.words().count(), 2);
    }

    #[test]
    fn empty_channel_list() {
        assert_eq!(WideMemory::new(Vec::new()).unwrap_err(), MemoryError::NoChannels);
    }
}
