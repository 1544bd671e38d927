//! Compiler for the textual bit patterns used by the instruction table.
//!
//! A pattern is written MSB first, one 8-character group per instruction
//! byte, e.g. `"000sssss rrrddddd"`. `0` and `1` are fixed bits, any
//! lowercase letter is a bit of the field with that name. Bits of one field
//! need not be adjacent or confined to one byte.

use bitvec::prelude::*;

/// Widest field a `u32` value can carry.
pub const MAX_FIELD_BITS: usize = 32;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern {pattern:?} is empty")]
    Empty { pattern: String },
    #[error("pattern {pattern:?} has {bits} bits, not a multiple of 8")]
    Length { pattern: String, bits: usize },
    #[error("pattern {pattern:?} contains invalid character {ch:?}")]
    InvalidChar { pattern: String, ch: char },
    #[error("field {name:?} of pattern {pattern:?} is {width} bits wide, at most 32 allowed")]
    FieldWidth { pattern: String, name: char, width: usize },
    #[error("value {value:#x} does not fit in {width}-bit field")]
    OutOfRange { value: u32, width: usize },
    #[error("template has {have} bytes, field needs {need}")]
    ShortTemplate { have: usize, need: usize },
}

/// Positions of one named field, as MSB-first bit indices over the whole
/// instruction word (bit 0 is the top bit of the first byte).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    positions: Vec<usize>,
    mask: Vec<u8>,
}

impl BitField {
    fn new(len: usize) -> Self {
        Self { positions: Vec::new(), mask: vec![0; len] }
    }

    fn push(&mut self, pos: usize) {
        self.positions.push(pos);
        self.mask.view_bits_mut::<Msb0>().set(pos, true);
    }

    pub fn width(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Per-byte mask of the field, as long as the pattern it came from.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Gathers the field out of `word`, first position into the most
    /// significant result bit. Positions past the end of `word` are skipped;
    /// the returned width counts only the bits actually read.
    pub fn extract(&self, word: &[u8]) -> (u32, usize) {
        let bits = word.view_bits::<Msb0>();
        self.positions
            .iter()
            .filter_map(|&p| bits.get(p).map(|b| *b))
            .fold((0u32, 0usize), |(v, w), b| ((v << 1) | b as u32, w + 1))
    }

    /// Scatters `value` into `template`, the inverse of [`BitField::extract`].
    pub fn insert(&self, template: &mut [u8], value: u32) -> Result<(), PatternError> {
        let width = self.width();
        if width < MAX_FIELD_BITS && value >> width != 0 {
            return Err(PatternError::OutOfRange { value, width });
        }
        let need = self.mask.len();
        if template.len() < need {
            return Err(PatternError::ShortTemplate { have: template.len(), need });
        }
        let bits = template.view_bits_mut::<Msb0>();
        for (i, &pos) in self.positions.iter().enumerate() {
            let shift = width - 1 - i;
            bits.set(pos, (value >> shift) & 1 != 0);
        }
        Ok(())
    }
}

/// A compiled pattern: literal bits, which bits are literal, and the fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    text: String,
    bits: Vec<u8>,
    mask: Vec<u8>,
    fields: Vec<(char, BitField)>,
}

impl Pattern {
    pub fn compile(text: &str) -> Result<Self, PatternError> {
        let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.is_empty() {
            return Err(PatternError::Empty { pattern: text.to_string() });
        }
        if chars.len() % 8 != 0 {
            return Err(PatternError::Length { pattern: text.to_string(), bits: chars.len() });
        }
        let len = chars.len() / 8;
        let mut bits = vec![0u8; len];
        let mut mask = vec![0u8; len];
        let mut fields: Vec<(char, BitField)> = Vec::new();
        {
            let b = bits.view_bits_mut::<Msb0>();
            let m = mask.view_bits_mut::<Msb0>();
            for (pos, &ch) in chars.iter().enumerate() {
                match ch {
                    '0' => m.set(pos, true),
                    '1' => {
                        b.set(pos, true);
                        m.set(pos, true);
                    }
                    'a'..='z' => match fields.iter_mut().find(|(name, _)| *name == ch) {
                        Some((_, field)) => field.push(pos),
                        None => {
                            let mut field = BitField::new(len);
                            field.push(pos);
                            fields.push((ch, field));
                        }
                    },
                    _ => {
                        return Err(PatternError::InvalidChar { pattern: text.to_string(), ch });
                    }
                }
            }
        }
        if let Some((name, field)) = fields.iter().find(|(_, f)| f.width() > MAX_FIELD_BITS) {
            return Err(PatternError::FieldWidth { pattern: text.to_string(), name: *name, width: field.width() });
        }
        Ok(Self { text: text.to_string(), bits, mask, fields })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the encoded instruction in bytes.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    /// Fields in order of first appearance in the pattern text.
    pub fn fields(&self) -> &[(char, BitField)] {
        &self.fields
    }

    pub fn field(&self, name: char) -> Option<&BitField> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
    }

    /// True when every literal bit of the pattern agrees with `word`.
    /// A word shorter than the pattern never matches.
    pub fn matches(&self, word: &[u8]) -> bool {
        word.len() >= self.len()
            && word
                .iter()
                .zip(self.bits.iter().zip(&self.mask))
                .all(|(w, (b, m))| w & m == b & m)
    }
}
