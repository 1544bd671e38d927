use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, Fields, OperandKind};
use crate::cpu::{CpuVariant, Register};
use crate::decoder::{Decoder, Match};

/// Jump target value to label.
pub type SymbolTable = HashMap<u32, String>;

/// Pseudo-op emitted for a byte that starts no known instruction.
pub const DATA_MNEMONIC: &str = "db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisasmConfig {
    pub cpu: CpuVariant,
    /// Render operand text; when off only mnemonics and raw fields are produced.
    pub operands: bool,
    pub mnemonic_width: usize,
}

impl Default for DisasmConfig {
    fn default() -> Self {
        Self { cpu: CpuVariant::S8x300, operands: true, mnemonic_width: 6 }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DisasmError {
    #[error("no bytes to decode")]
    NoBytes,
    #[error("{mnemonic}: operand {kind:?} has no field '{field}'")]
    MissingField { mnemonic: String, kind: OperandKind, field: char },
    #[error("{mnemonic}: leftover fields {fields:?}")]
    LeftoverFields { mnemonic: String, fields: Vec<char> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operand {
    pub kind: OperandKind,
    /// Raw field value, after jump sign extension.
    pub value: u32,
    pub text: String,
}

impl Operand {
    /// Register named by a register-type operand.
    pub fn register(&self) -> Option<Register> {
        match self.kind {
            OperandKind::Src | OperandKind::Dst | OperandKind::SrcIv | OperandKind::DstIv => {
                Some(Register::from_code(self.value))
            }
            _ => None,
        }
    }
}

/// One decoded instruction, or one byte of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decoded {
    /// Bytes consumed.
    pub length: usize,
    pub mnemonic: String,
    pub operands: Vec<Operand>,
    pub fields: Fields,
    pub data: bool,
}

impl Decoded {
    fn data_byte(byte: u8) -> Self {
        let value = byte as u32;
        Self {
            length: 1,
            mnemonic: DATA_MNEMONIC.to_string(),
            operands: vec![Operand { kind: OperandKind::Imm, value, text: fmt_hex(value) }],
            fields: Fields::new(),
            data: true,
        }
    }

    pub fn operand_text(&self) -> String {
        self.operands.iter().map(|o| o.text.as_str()).collect::<Vec<_>>().join(",")
    }

    /// Mnemonic padded to `width` followed by the operands.
    pub fn text(&self, width: usize) -> String {
        format!("{:<width$}{}", self.mnemonic, self.operand_text())
    }
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text(DisasmConfig::default().mnemonic_width).trim_end())
    }
}

/// Assembler-style hex literal: lowercase digits, `h` suffix, and a leading
/// `0` when the first digit is a letter.
pub fn fmt_hex(v: u32) -> String {
    let s = format!("{v:x}h");
    if s.starts_with(|c: char| c.is_ascii_alphabetic()) {
        format!("0{s}")
    } else {
        s
    }
}

/// Text for one operand value.
pub fn render_operand(kind: OperandKind, value: u32, symbols: &SymbolTable) -> String {
    match kind {
        OperandKind::Src | OperandKind::SrcIv | OperandKind::Dst | OperandKind::DstIv => {
            Register::from_code(value).to_string()
        }
        OperandKind::Rot => format!("({})", fmt_hex(value)),
        OperandKind::Len => fmt_hex(if value == 0 { 8 } else { value }),
        OperandKind::Imm => fmt_hex(value),
        OperandKind::Jmp => match symbols.get(&value) {
            Some(label) => label.clone(),
            None => fmt_hex(value),
        },
    }
}

pub struct Disassembler<'c> {
    catalog: &'c Catalog,
    config: DisasmConfig,
}

impl<'c> Disassembler<'c> {
    pub fn new(catalog: &'c Catalog, config: DisasmConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &DisasmConfig {
        &self.config
    }

    /// Decodes the instruction at the start of `word`. Bytes that match no
    /// form come back as a one-byte `db`.
    pub fn decode(&self, word: &[u8], symbols: &SymbolTable) -> Result<Decoded, DisasmError> {
        let &first = word.first().ok_or(DisasmError::NoBytes)?;
        match self.catalog.decode(word) {
            Some(m) => self.render(m, symbols),
            None => {
                debug!(byte = first, "unrecognized instruction");
                Ok(Decoded::data_byte(first))
            }
        }
    }

    fn render(&self, m: Match<'_>, symbols: &SymbolTable) -> Result<Decoded, DisasmError> {
        let mnemonic = m.instruction.mnemonic().to_string();
        let mut operands = Vec::new();
        if self.config.operands {
            let mut left = m.fields.clone();
            for &kind in m.form.operands() {
                let field = kind.field();
                let value = left
                    .remove(&field)
                    .ok_or_else(|| DisasmError::MissingField { mnemonic: mnemonic.clone(), kind, field })?;
                operands.push(Operand { kind, value, text: render_operand(kind, value, symbols) });
            }
            if !left.is_empty() {
                return Err(DisasmError::LeftoverFields { mnemonic, fields: left.into_keys().collect() });
            }
        }
        Ok(Decoded { length: m.len(), mnemonic, operands, fields: m.fields, data: false })
    }

    /// Linear sweep over `image[start..end]`.
    pub fn listing<'a>(&'a self, image: &'a [u8], start: u32, end: u32, symbols: &'a SymbolTable) -> Listing<'a, 'c> {
        Listing { dis: self, image, pc: start as usize, end: (end as usize).min(image.len()), symbols }
    }

    /// Register operands that the configured CPU cannot use in their role.
    pub fn register_misuse(&self, decoded: &Decoded) -> Vec<(OperandKind, Register)> {
        register_misuse(decoded, self.config.cpu)
    }
}

pub fn register_misuse(decoded: &Decoded, cpu: CpuVariant) -> Vec<(OperandKind, Register)> {
    decoded
        .operands
        .iter()
        .filter_map(|o| {
            let reg = o.register()?;
            let ok = match o.kind {
                OperandKind::Src => reg.is_source(cpu),
                OperandKind::Dst => reg.is_destination(cpu),
                _ => reg.is_iv(),
            };
            (!ok).then_some((o.kind, reg))
        })
        .collect()
}

/// Sequential decode; each step starts where the previous one ended.
pub struct Listing<'a, 'c> {
    dis: &'a Disassembler<'c>,
    image: &'a [u8],
    pc: usize,
    end: usize,
    symbols: &'a SymbolTable,
}

impl Iterator for Listing<'_, '_> {
    type Item = Result<(u32, Decoded), DisasmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pc >= self.end {
            return None;
        }
        let pc = self.pc;
        match self.dis.decode(&self.image[pc..], self.symbols) {
            Ok(d) => {
                self.pc += d.length.max(1);
                Some(Ok((pc as u32, d)))
            }
            Err(e) => {
                self.pc = self.end;
                Some(Err(e))
            }
        }
    }
}
