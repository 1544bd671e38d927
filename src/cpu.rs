use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, FromRepr, IntoStaticStr};

/// The two members of the family. They share one instruction set and differ
/// only in how many working registers exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString)]
pub enum CpuVariant {
    #[default]
    #[strum(serialize = "8x300")]
    #[serde(rename = "8x300")]
    S8x300,
    #[strum(serialize = "8x305")]
    #[serde(rename = "8x305")]
    S8x305,
}

/// Register address space as it appears in the 5-bit S and D fields.
///
/// Codes 0o20..=0o37 do not name storage: they select the left or right
/// IV bank with an implied bit offset, and are only meaningful in the
/// IV operand positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Display, EnumString, EnumIter, FromRepr, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Register {
    Aux = 0o00, // aka r0
    R1 = 0o01,
    R2 = 0o02,
    R3 = 0o03,
    R4 = 0o04,
    R5 = 0o05,
    R6 = 0o06,
    Ivl = 0o07, // left bank latch
    Ovf = 0o10,
    R11 = 0o11,
    R12 = 0o12, // 8x305 only
    R13 = 0o13,
    R14 = 0o14,
    R15 = 0o15,
    R16 = 0o16,
    Ivr = 0o17, // right bank latch
    Liv0 = 0o20,
    Liv1 = 0o21,
    Liv2 = 0o22,
    Liv3 = 0o23,
    Liv4 = 0o24,
    Liv5 = 0o25,
    Liv6 = 0o26,
    Liv7 = 0o27,
    Riv0 = 0o30,
    Riv1 = 0o31,
    Riv2 = 0o32,
    Riv3 = 0o33,
    Riv4 = 0o34,
    Riv5 = 0o35,
    Riv6 = 0o36,
    Riv7 = 0o37,
}

/// Which of the two IV banks an operand talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Left,
    Right,
}

impl Register {
    /// Looks up a register by its field code. Only the low five bits are
    /// significant, so this never fails for values taken from S/D fields.
    pub fn from_code(code: u32) -> Self {
        Self::from_repr((code & 0x1f) as u8).unwrap_or(Self::Aux)
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn is_iv(self) -> bool {
        self >= Self::Liv0
    }

    /// Bank selected by an IV code, or by one of the two IV latches.
    pub fn bank(self) -> Option<Bank> {
        match self {
            Self::Ivl => Some(Bank::Left),
            Self::Ivr => Some(Bank::Right),
            r if r >= Self::Riv0 => Some(Bank::Right),
            r if r >= Self::Liv0 => Some(Bank::Left),
            _ => None,
        }
    }

    pub fn is_source(self, cpu: CpuVariant) -> bool {
        if self.is_iv() {
            return false;
        }
        if self < Self::Ivl || self == Self::Ovf || self == Self::R11 {
            return true;
        }
        cpu == CpuVariant::S8x305
    }

    pub fn is_destination(self, cpu: CpuVariant) -> bool {
        if self.is_iv() || self == Self::Ovf {
            return false;
        }
        if self <= Self::R11 || self == Self::Ivr {
            return true;
        }
        cpu == CpuVariant::S8x305
    }
}
