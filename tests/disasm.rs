use pretty_assertions::assert_eq;

use s8x30x::disasm::{register_misuse, DATA_MNEMONIC};
use s8x30x::instructions::{FormDesc, InstrDesc};
use s8x30x::{Catalog, CpuVariant, DisasmConfig, Disassembler, OperandKind, Register, SymbolTable};

fn line(word: &[u8]) -> String {
    let cat = Catalog::s8x30x();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    dis.decode(word, &SymbolTable::new()).unwrap().text(6)
}

#[test]
fn nop_consumes_two_bytes() {
    let cat = Catalog::s8x30x();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    let d = dis.decode(&[0x00, 0x00], &SymbolTable::new()).unwrap();
    assert_eq!(d.mnemonic, "nop");
    assert_eq!(d.length, 2);
    assert!(d.operands.is_empty());
    assert!(!d.data);
}

#[test]
fn register_rotate_form() {
    // move r1,(1h),r2
    assert_eq!(line(&[0x01, 0x22]), "move  r1,(1h),r2");
    assert_eq!(line(&[0x3f, 0xe0]), "add   riv7,(7h),aux");
    assert_eq!(line(&[0x45, 0x06]), "and   r5,(0h),r6");
    assert_eq!(line(&[0x69, 0x6f]), "xor   r11,(3h),ivr");
}

#[test]
fn immediates_and_sources() {
    assert_eq!(line(&[0x81, 0x42]), "xmit  42h,r1");
    assert_eq!(line(&[0xa3, 0x10]), "nzt   r3,10h");
    assert_eq!(line(&[0xc4, 0x05]), "xec   r4,5h");
    assert_eq!(line(&[0xca, 0x0c]), "xml   0ch");
    assert_eq!(line(&[0xcb, 0xff]), "xmr   0ffh");
}

#[test]
fn jump_target_and_symbols() {
    let cat = Catalog::s8x30x();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    let word = [0xe1, 0x23];
    assert_eq!(dis.decode(&word, &SymbolTable::new()).unwrap().text(6), "jmp   123h");
    let mut syms = SymbolTable::new();
    syms.insert(0x123, "loop".to_string());
    let d = dis.decode(&word, &syms).unwrap();
    assert_eq!(d.operand_text(), "loop");
    assert_eq!(d.fields[&'j'], 0x123);
}

fn short_jump_catalog() -> Catalog {
    const T: &[InstrDesc] = &[InstrDesc {
        mnemonic: "sjmp",
        forms: &[FormDesc { pattern: "11100000 jjjjjjjj", operands: &[OperandKind::Jmp] }],
    }];
    Catalog::from_table(T).unwrap()
}

#[test]
fn short_jump_is_sign_extended_before_symbol_lookup() {
    let cat = short_jump_catalog();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    let d = dis.decode(&[0xe0, 200], &SymbolTable::new()).unwrap();
    assert_eq!(d.operands[0].value, 65480);
    assert_eq!(d.operand_text(), "0ffc8h");

    let mut syms = SymbolTable::new();
    syms.insert(65480, "top".to_string());
    assert_eq!(dis.decode(&[0xe0, 200], &syms).unwrap().operand_text(), "top");

    let d = dis.decode(&[0xe0, 0x40], &syms).unwrap();
    assert_eq!(d.operand_text(), "40h");
}

#[test]
fn unknown_opcode_falls_back_to_one_data_byte() {
    const T: &[InstrDesc] =
        &[InstrDesc { mnemonic: "nop", forms: &[FormDesc { pattern: "00000000 00000000", operands: &[] }] }];
    let cat = Catalog::from_table(T).unwrap();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    let d = dis.decode(&[0xa5, 0x00], &SymbolTable::new()).unwrap();
    assert!(d.data);
    assert_eq!(d.length, 1);
    assert_eq!(d.mnemonic, DATA_MNEMONIC);
    assert_eq!(d.operand_text(), "0a5h");
    // opcode bucket exists but no form matches
    let d = dis.decode(&[0x00, 0x01], &SymbolTable::new()).unwrap();
    assert_eq!((d.data, d.length), (true, 1));
}

#[test]
fn truncated_word_falls_back() {
    assert_eq!(line(&[0xe1]), "db    0e1h");
}

#[test]
fn listing_follows_instruction_lengths() {
    let cat = Catalog::s8x30x();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    let image = [0x00, 0x00, 0x81, 0x42, 0xe1];
    let syms = SymbolTable::new();
    let got: Vec<(u32, String)> = dis
        .listing(&image, 0, image.len() as u32, &syms)
        .map(|r| r.map(|(a, d)| (a, d.to_string())))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        got,
        vec![(0, "nop".to_string()), (2, "xmit  42h,r1".to_string()), (4, "db    0e1h".to_string())]
    );
    // end past the image is clamped
    assert_eq!(dis.listing(&image, 2, 100, &syms).count(), 2);
}

#[test]
fn iv_code_in_register_slot_is_flagged() {
    let cat = Catalog::s8x30x();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    // first form wins even for an IV source
    let d = dis.decode(&[0x13, 0x61], &SymbolTable::new()).unwrap();
    assert_eq!(d.text(6), "move  liv3,(3h),r1");
    assert_eq!(dis.register_misuse(&d), vec![(OperandKind::Src, Register::Liv3)]);
}

#[test]
fn register_checks_depend_on_variant() {
    let cat = Catalog::s8x30x();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    // move r12,(0h),ovf
    let d = dis.decode(&[0x0a, 0x08], &SymbolTable::new()).unwrap();
    assert_eq!(d.operand_text(), "r12,(0h),ovf");
    assert_eq!(
        register_misuse(&d, CpuVariant::S8x300),
        vec![(OperandKind::Src, Register::R12), (OperandKind::Dst, Register::Ovf)]
    );
    assert_eq!(register_misuse(&d, CpuVariant::S8x305), vec![(OperandKind::Dst, Register::Ovf)]);
}

#[test]
fn config_from_json() {
    let cfg: DisasmConfig = serde_json::from_str(r#"{ "cpu": "8x305" }"#).unwrap();
    assert_eq!(cfg.cpu, CpuVariant::S8x305);
    assert!(cfg.operands);
    assert_eq!(cfg.mnemonic_width, 6);
}

#[test]
fn decoded_serializes_fields_by_letter() {
    let cat = Catalog::s8x30x();
    let dis = Disassembler::new(&cat, DisasmConfig::default());
    let d = dis.decode(&[0x81, 0x42], &SymbolTable::new()).unwrap();
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(v["fields"]["d"], 1);
    assert_eq!(v["fields"]["i"], 0x42);
    assert_eq!(v["operands"][1]["kind"], "Dst");
}
