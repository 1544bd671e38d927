//! Fast I/O select decode for boards built around the 8X300.
//!
//! These boards carry a third ROM next to the instruction ROMs whose byte
//! drives the IV bus device selects for the same instruction: the low three
//! bits pick the device read, the high nibble the device written. Knowing
//! the board, IV operands can be shown by the signal they really touch.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::catalog::OperandKind;
use crate::cpu::Bank;
use crate::disasm::Decoded;

type Names = &'static [(u8, &'static str)];

struct IvNames {
    sliv: Names,
    sriv: Names,
    dliv: Names,
    driv: Names,
    wr_mask: u8,
    wr_idle: u8,
}

const RD_MASK: u8 = 0x07;
const RD_IDLE: u8 = 0x07;

static WD1000: IvNames = IvNames {
    sriv: &[(0, "rd_ram")],
    sliv: &[
        (1, "drq_clk"),
        (2, "rd2"),
        (3, "int_clk"),
        (4, "rd_serdes"),
        (5, "rd5"),
        (6, "rd_host_port"),
    ],
    driv: &[(0, "wr_ram")],
    dliv: &[
        (1, "drive_control"),
        (2, "ram_addr_low"),
        (3, "reset_index"),
        (4, "wr_serdes"),
        (5, "drive_head_sel"),
        (6, "wr_host_port"),
        (7, "mac_control"),
    ],
    wr_mask: 0x07,
    wr_idle: 0x00,
};

static WD1001: IvNames = IvNames {
    sriv: &[(0x0, "rd_ram")],
    sliv: &[
        (0x1, "drq_clk"),
        (0x2, "rd2"),
        (0x3, "int_clk"),
        (0x4, "rd_serdes"),
        (0x5, "rd5"),
        (0x6, "rd_host_port"),
    ],
    driv: &[(0x8, "wr_ram")],
    dliv: &[
        (0x0, "ecc_sel"),
        (0x1, "rwc"),
        (0x2, "precomp_en"),
        (0x3, "step"),
        (0x4, "waen"),
        (0x5, "direction"),
        (0x6, "write_gate"),
        (0x7, "flag"),
        (0xa, "ram_addr"),
        (0xb, "reset_index"),
        (0xc, "wr_serdes"),
        (0xd, "drive_head_sel"),
        (0xe, "wr_host_port"),
        (0xf, "mac_control"),
    ],
    wr_mask: 0x0f,
    wr_idle: 0x0f,
};

fn lookup(names: Names, select: u8) -> Option<&'static str> {
    names.iter().find(|(k, _)| *k == select).map(|(_, n)| *n)
}

/// Western Digital hard disk controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Board {
    Wd1000,
    Wd1001,
}

impl Board {
    fn names(self) -> &'static IvNames {
        match self {
            Self::Wd1000 => &WD1000,
            Self::Wd1001 => &WD1001,
        }
    }

    /// `(read select, write select)` encoded in a fast I/O byte.
    pub fn selects(self, ext: u8) -> (u8, u8) {
        (ext & RD_MASK, (ext >> 4) & self.names().wr_mask)
    }

    /// Operand text of `decoded` with IV operands renamed after the signals
    /// selected by `ext`. Selects that are active but were not used for a
    /// rename are appended as a `//` comment.
    pub fn rewrite(self, decoded: &Decoded, ext: &[u8]) -> String {
        let Some(&sel) = ext.first() else {
            return decoded.operand_text();
        };
        let names = self.names();
        let (rd, wr) = self.selects(sel);
        let mut rd_needed = rd != RD_IDLE;
        let mut wr_needed = wr != names.wr_idle;

        let mut texts = Vec::with_capacity(decoded.operands.len());
        for op in &decoded.operands {
            let source = matches!(op.kind, OperandKind::Src | OperandKind::SrcIv);
            let renamed = op.register().and_then(|reg| {
                let bank = reg.bank()?;
                match (source, reg.is_iv(), bank) {
                    (true, true, Bank::Left) => lookup(names.sliv, rd),
                    (true, true, Bank::Right) => lookup(names.sriv, rd),
                    // IV destination, or XMIT into one of the IV latches
                    (false, _, Bank::Left) => lookup(names.dliv, wr),
                    (false, _, Bank::Right) => lookup(names.driv, wr),
                    (true, false, _) => None,
                }
            });
            match renamed {
                Some(name) => {
                    if source {
                        rd_needed = false;
                    } else {
                        wr_needed = false;
                    }
                    texts.push(name.to_string());
                }
                None => texts.push(op.text.clone()),
            }
        }

        let mut out = texts.join(",");
        if rd_needed || wr_needed {
            out.push_str(" //");
            if rd_needed {
                let _ = write!(out, " rd={rd}");
            }
            if wr_needed {
                let _ = write!(out, " wr={wr}");
            }
        }
        out
    }
}
