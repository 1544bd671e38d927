use tracing::trace;

use crate::catalog::{Catalog, Fields, Form, Instruction, JUMP_FIELD};

/// A form that matched an instruction word, with its raw field values.
#[derive(Debug, Clone)]
pub struct Match<'c> {
    pub instruction: &'c Instruction,
    pub form: &'c Form,
    pub fields: Fields,
}

impl Match<'_> {
    /// Bytes consumed by the matched form.
    pub fn len(&self) -> usize {
        self.form.len()
    }

    pub fn is_empty(&self) -> bool {
        self.form.is_empty()
    }
}

pub trait Decoder {
    /// Finds the form for the instruction starting at `word[0]`.
    /// `None` means the bytes do not encode any known instruction.
    fn decode(&self, word: &[u8]) -> Option<Match<'_>>;
}

/// Top three bits of the leading byte.
pub fn opcode(first: u8) -> u8 {
    first >> 5
}

/// Reads every field of `form` out of `word`.
///
/// A jump field that occupies exactly one whole byte is a short jump within
/// the top page and is sign-extended into the 16-bit address space. The
/// 13-bit field of the regular two-byte jump is taken as is.
pub fn extract_fields(form: &Form, word: &[u8]) -> Fields {
    form.pattern()
        .fields()
        .iter()
        .map(|(name, field)| {
            let (mut value, width) = field.extract(word);
            if *name == JUMP_FIELD && width == 8 && value > 0x7f {
                value += 0xff00;
            }
            (*name, value)
        })
        .collect()
}

impl Decoder for Catalog {
    fn decode(&self, word: &[u8]) -> Option<Match<'_>> {
        let &first = word.first()?;
        let op = opcode(first);
        for instruction in self.bucket(op) {
            // first match wins; declared form order is the priority
            if let Some(form) = instruction.forms().iter().find(|f| f.matches(word)) {
                trace!(mnemonic = instruction.mnemonic(), pattern = form.pattern().text(), "matched");
                let fields = extract_fields(form, word);
                return Some(Match { instruction, form, fields });
            }
        }
        None
    }
}
