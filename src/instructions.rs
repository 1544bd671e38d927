use crate::catalog::OperandKind::{self, *};

/// One encoding of an instruction: its bit pattern and the operand order.
#[derive(Debug, Clone, Copy)]
pub struct FormDesc {
    pub pattern: &'static str,
    pub operands: &'static [OperandKind],
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub mnemonic: &'static str,
    pub forms: &'static [FormDesc],
}

const fn form(pattern: &'static str, operands: &'static [OperandKind]) -> FormDesc {
    FormDesc { pattern, operands }
}

/// 8X300/8X305 instruction set. The source operand precedes the
/// destination. Form order is match priority: the first form whose literal
/// bits agree wins, so the register/rotate forms shadow the IV forms that
/// share their bit layout.
pub const TABLE: &[InstrDesc] = &[
    InstrDesc { mnemonic: "nop", forms: &[form("00000000 00000000", &[])] },
    InstrDesc { mnemonic: "xml", forms: &[form("11001010 iiiiiiii", &[Imm])] },
    InstrDesc { mnemonic: "xmr", forms: &[form("11001011 iiiiiiii", &[Imm])] },
    // S -> D
    InstrDesc {
        mnemonic: "move",
        forms: &[
            form("000sssss rrrddddd", &[Src, Rot, Dst]),
            form("000sssss lllddddd", &[Src, Len, DstIv]),
            form("000sssss lllddddd", &[SrcIv, Len, Dst]),
            form("000sssss lllddddd", &[SrcIv, Len, DstIv]),
        ],
    },
    // S + AUX -> D, sets OVF
    InstrDesc {
        mnemonic: "add",
        forms: &[
            form("001sssss rrrddddd", &[Src, Rot, Dst]),
            form("001sssss lllddddd", &[Src, Len, DstIv]),
            form("001sssss lllddddd", &[SrcIv, Len, Dst]),
            form("001sssss lllddddd", &[SrcIv, Len, DstIv]),
        ],
    },
    // S & AUX -> D
    InstrDesc {
        mnemonic: "and",
        forms: &[
            form("010sssss rrrddddd", &[Src, Rot, Dst]),
            form("010sssss lllddddd", &[Src, Len, DstIv]),
            form("010sssss lllddddd", &[SrcIv, Len, Dst]),
            form("010sssss lllddddd", &[SrcIv, Len, DstIv]),
        ],
    },
    // S ^ AUX -> D
    InstrDesc {
        mnemonic: "xor",
        forms: &[
            form("011sssss rrrddddd", &[Src, Rot, Dst]),
            form("011sssss lllddddd", &[Src, Len, DstIv]),
            form("011sssss lllddddd", &[SrcIv, Len, Dst]),
            form("011sssss lllddddd", &[SrcIv, Len, DstIv]),
        ],
    },
    // I -> D
    InstrDesc {
        mnemonic: "xmit",
        forms: &[
            form("100ddddd iiiiiiii", &[Imm, Dst]),
            form("100ddddd llliiiii", &[Imm, Len, DstIv]),
        ],
    },
    // jump if S != 0
    InstrDesc {
        mnemonic: "nzt",
        forms: &[
            form("101sssss iiiiiiii", &[Src, Imm]),
            form("101sssss llliiiii", &[SrcIv, Len, Imm]),
        ],
    },
    // execute instruction at S + I
    InstrDesc {
        mnemonic: "xec",
        forms: &[
            form("110sssss iiiiiiii", &[Src, Imm]),
            form("110sssss llliiiii", &[SrcIv, Len, Imm]),
        ],
    },
    InstrDesc { mnemonic: "jmp", forms: &[form("111jjjjj jjjjjjjj", &[Jmp])] },
];
