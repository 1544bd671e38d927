use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::instructions::{InstrDesc, TABLE};
use crate::pattern::{Pattern, PatternError};

/// Field letter carrying a jump target.
pub const JUMP_FIELD: char = 'j';

/// Operand types, one per rendered operand of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandKind {
    /// Source register
    Src,
    /// Destination register
    Dst,
    /// Source IV (bank select with bit offset)
    SrcIv,
    /// Destination IV
    DstIv,
    /// Field length 1-8 bits, 8 encoded as zero
    Len,
    /// Right rotate 0-7 bits
    Rot,
    /// 5 or 8 bit immediate
    Imm,
    /// Absolute jump target
    Jmp,
}

impl OperandKind {
    /// The pattern letter whose value this operand renders.
    pub fn field(self) -> char {
        match self {
            Self::Src | Self::SrcIv => 's',
            Self::Dst | Self::DstIv => 'd',
            Self::Len => 'l',
            Self::Rot => 'r',
            Self::Imm => 'i',
            Self::Jmp => JUMP_FIELD,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate mnemonic {0:?}")]
    DuplicateMnemonic(String),
    #[error("instruction {0:?} has no forms")]
    NoForms(String),
    #[error("{mnemonic}: {source}")]
    Pattern {
        mnemonic: String,
        #[source]
        source: PatternError,
    },
    #[error("{mnemonic} {pattern:?}: field '{field}' is not rendered by any operand")]
    UnconsumedField { mnemonic: String, pattern: String, field: char },
    #[error("{mnemonic} {pattern:?}: operand {kind:?} has no field '{field}'")]
    MissingField { mnemonic: String, pattern: String, kind: OperandKind, field: char },
    #[error("{mnemonic} {pattern:?}: field '{field}' is rendered twice")]
    RepeatedField { mnemonic: String, pattern: String, field: char },
    #[error("unknown field '{0}'")]
    UnknownField(char),
    #[error("no value for field '{0}'")]
    MissingValue(char),
    #[error(transparent)]
    Value(#[from] PatternError),
}

/// Raw values taken out of an instruction word, keyed by field letter.
pub type Fields = BTreeMap<char, u32>;

#[derive(Debug, Clone)]
pub struct Form {
    pattern: Pattern,
    operands: Vec<OperandKind>,
}

impl Form {
    pub fn new(text: &str, operands: &[OperandKind]) -> Result<Self, PatternError> {
        Ok(Self { pattern: Pattern::compile(text)?, operands: operands.to_vec() })
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn operands(&self) -> &[OperandKind] {
        &self.operands
    }

    pub fn len(&self) -> usize {
        self.pattern.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    pub fn opcode(&self) -> u8 {
        self.pattern.bits().first().map_or(0, |b| b >> 5)
    }

    pub fn matches(&self, word: &[u8]) -> bool {
        self.pattern.matches(word)
    }

    /// Builds the instruction bytes for this form. `fields` must name
    /// exactly the form's fields.
    pub fn encode(&self, fields: &Fields) -> Result<Vec<u8>, CatalogError> {
        if let Some(&extra) = fields.keys().find(|&&k| self.pattern.field(k).is_none()) {
            return Err(CatalogError::UnknownField(extra));
        }
        let mut bytes = self.pattern.bits().to_vec();
        for (name, field) in self.pattern.fields() {
            let value = *fields.get(name).ok_or(CatalogError::MissingValue(*name))?;
            field.insert(&mut bytes, value)?;
        }
        Ok(bytes)
    }

    // Each operand must render a field of the pattern, and each field must
    // be rendered exactly once.
    fn check(&self, mnemonic: &str) -> Result<(), CatalogError> {
        let pattern = self.pattern.text().to_string();
        let mut used: Vec<char> = Vec::with_capacity(self.operands.len());
        for &kind in &self.operands {
            let field = kind.field();
            if self.pattern.field(field).is_none() {
                return Err(CatalogError::MissingField { mnemonic: mnemonic.into(), pattern, kind, field });
            }
            if used.contains(&field) {
                return Err(CatalogError::RepeatedField { mnemonic: mnemonic.into(), pattern, field });
            }
            used.push(field);
        }
        if let Some((field, _)) = self.pattern.fields().iter().find(|(n, _)| !used.contains(n)) {
            return Err(CatalogError::UnconsumedField { mnemonic: mnemonic.into(), pattern, field: *field });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Instruction {
    mnemonic: String,
    forms: Vec<Form>,
}

impl Instruction {
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Forms in priority order.
    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    pub fn opcode(&self) -> u8 {
        self.forms[0].opcode()
    }
}

/// The compiled instruction set with its two lookup indexes.
#[derive(Debug, Clone)]
pub struct Catalog {
    instructions: Vec<Instruction>,
    by_mnemonic: HashMap<String, usize>,
    by_opcode: [Vec<usize>; 8],
}

impl Catalog {
    /// The built-in 8X300/8X305 table.
    ///
    /// # Panics
    ///
    /// If the static table is malformed. That is a defect in this crate,
    /// not a runtime condition.
    pub fn s8x30x() -> Self {
        match Self::from_table(TABLE) {
            Ok(catalog) => catalog,
            Err(e) => panic!("built-in instruction table: {e}"),
        }
    }

    pub fn from_table(table: &[InstrDesc]) -> Result<Self, CatalogError> {
        let mut instructions = Vec::with_capacity(table.len());
        let mut by_mnemonic = HashMap::new();
        let mut by_opcode: [Vec<usize>; 8] = Default::default();
        for desc in table {
            let mnemonic = desc.mnemonic.to_string();
            if by_mnemonic.contains_key(&mnemonic) {
                return Err(CatalogError::DuplicateMnemonic(mnemonic));
            }
            if desc.forms.is_empty() {
                return Err(CatalogError::NoForms(mnemonic));
            }
            let mut forms = Vec::with_capacity(desc.forms.len());
            for f in desc.forms {
                let form = Form::new(f.pattern, f.operands)
                    .map_err(|source| CatalogError::Pattern { mnemonic: mnemonic.clone(), source })?;
                form.check(&mnemonic)?;
                forms.push(form);
            }
            let idx = instructions.len();
            let inst = Instruction { mnemonic: mnemonic.clone(), forms };
            // forms of one instruction are assumed to share the opcode
            by_opcode[inst.opcode() as usize].push(idx);
            by_mnemonic.insert(mnemonic, idx);
            instructions.push(inst);
        }
        debug!(instructions = instructions.len(), "instruction catalog built");
        Ok(Self { instructions, by_mnemonic, by_opcode })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, mnemonic: &str) -> Option<&Instruction> {
        self.by_mnemonic.get(mnemonic).map(|&i| &self.instructions[i])
    }

    /// Candidates for a 3-bit opcode, in table order.
    pub fn bucket(&self, opcode: u8) -> impl Iterator<Item = &Instruction> + '_ {
        self.by_opcode[(opcode & 7) as usize].iter().map(|&i| &self.instructions[i])
    }

    /// One line per form, sorted by mnemonic.
    pub fn table_lines(&self) -> Vec<String> {
        let mut insts: Vec<&Instruction> = self.instructions.iter().collect();
        insts.sort_by(|a, b| a.mnemonic.cmp(&b.mnemonic));
        let mut out = Vec::new();
        for inst in insts {
            for form in &inst.forms {
                out.push(format!("{:<5}: {} {:?}", inst.mnemonic, form.pattern.text(), form.operands));
            }
        }
        out
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::s8x30x()
    }
}
