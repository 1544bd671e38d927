//! Intel hex reader for ROM dumps.
//!
//! Data records are laid down back to back from offset 0 of the image; the
//! address of the first one becomes the image origin and every later one
//! must continue exactly where the previous record ended.

use tracing::{debug, trace};

/// Largest image a 16-bit address space can hold.
pub const MAX_IMAGE: usize = 0x1_0000;

const DATA: u8 = 0x00;
const END_OF_FILE: u8 = 0x01;
const EXTENDED_LINEAR: u8 = 0x04;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IhexError {
    #[error("bad checksum for record #{record}")]
    BadChecksum { record: usize },
    #[error("unexpected address {addr:#06x} for data record #{record}")]
    Discontiguous { record: usize, addr: u16 },
    #[error("unknown record type {kind:02x} for record #{record}")]
    UnknownRecordType { record: usize, kind: u8 },
    #[error("record #{record} runs past end of input")]
    Truncated { record: usize },
    #[error("invalid hex digit in record #{record}")]
    InvalidDigit { record: usize },
    #[error("record #{record} overflows the 64 KiB image")]
    Overflow { record: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexImage {
    /// Address of the first data record, if there was one.
    pub origin: Option<u16>,
    pub bytes: Vec<u8>,
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    record: usize,
}

impl Reader<'_> {
    /// Skips to just past the next ':'. `false` at end of input.
    fn colon(&mut self) -> bool {
        match self.input[self.pos..].iter().position(|&b| b == b':') {
            Some(off) => {
                self.pos += off + 1;
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        }
    }

    fn bytes(&mut self, count: usize) -> Result<Vec<u8>, IhexError> {
        let record = self.record;
        let digits = self
            .input
            .get(self.pos..self.pos + 2 * count)
            .ok_or(IhexError::Truncated { record })?;
        self.pos += 2 * count;
        digits
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16);
                let lo = (pair[1] as char).to_digit(16);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => Ok((hi << 4 | lo) as u8),
                    _ => Err(IhexError::InvalidDigit { record }),
                }
            })
            .collect()
    }

    fn u8(&mut self) -> Result<u8, IhexError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, IhexError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}

/// Two's complement of the byte sum of everything before the checksum.
pub fn checksum(len: u8, addr: u16, kind: u8, data: &[u8]) -> u8 {
    let [hi, lo] = addr.to_be_bytes();
    let sum = data
        .iter()
        .fold(len.wrapping_add(hi).wrapping_add(lo).wrapping_add(kind), |s, &b| s.wrapping_add(b));
    sum.wrapping_neg()
}

/// Parses a whole hex file. Reading stops at the first bad record; bytes of
/// a record are committed only after its checksum has been verified.
pub fn parse(input: &[u8]) -> Result<HexImage, IhexError> {
    let mut rd = Reader { input, pos: 0, record: 0 };
    let mut memory = vec![0u8; MAX_IMAGE];
    let mut load = 0usize;
    let mut origin = None;
    let mut expected: Option<u32> = None;
    let mut limit = 0usize;

    while rd.colon() {
        rd.record += 1;
        let record = rd.record;
        let len = rd.u8()?;
        let addr = rd.u16()?;
        let kind = rd.u8()?;
        let data = rd.bytes(len as usize)?;
        let sum = rd.u8()?;
        if sum != checksum(len, addr, kind, &data) {
            return Err(IhexError::BadChecksum { record });
        }
        trace!(record, len, addr, kind, "hex record");
        match kind {
            DATA => {
                if expected.is_some_and(|e| e != addr as u32) {
                    return Err(IhexError::Discontiguous { record, addr });
                }
                origin.get_or_insert(addr);
                let end = load + data.len();
                if end > MAX_IMAGE {
                    return Err(IhexError::Overflow { record });
                }
                memory[load..end].copy_from_slice(&data);
                expected = Some(addr as u32 + len as u32);
                load = end;
                limit = limit.max(load);
            }
            END_OF_FILE => break,
            EXTENDED_LINEAR => {}
            _ => return Err(IhexError::UnknownRecordType { record, kind }),
        }
    }

    memory.truncate(limit);
    debug!(records = rd.record, bytes = limit, "hex image loaded");
    Ok(HexImage { origin, bytes: memory })
}
