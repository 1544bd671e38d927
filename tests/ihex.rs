use s8x30x::ihex::{checksum, parse, IhexError};

fn record(addr: u16, kind: u8, data: &[u8]) -> String {
    let mut s = format!(":{:02X}{addr:04X}{kind:02X}", data.len());
    for b in data {
        s.push_str(&format!("{b:02X}"));
    }
    s.push_str(&format!("{:02X}\n", checksum(data.len() as u8, addr, kind, data)));
    s
}

#[test]
fn contiguous_records_build_one_image() {
    let text = record(0x0100, 0, &[0x00, 0x00, 0x81])
        + &record(0x0103, 0, &[0x42])
        + &record(0, 0x04, &[0x00, 0x00])
        + &record(0, 0x01, &[]);
    let img = parse(text.as_bytes()).unwrap();
    assert_eq!(img.origin, Some(0x0100));
    assert_eq!(img.bytes, vec![0x00, 0x00, 0x81, 0x42]);
}

#[test]
fn missing_end_record_is_accepted() {
    let img = parse(record(0, 0, &[1, 2]).as_bytes()).unwrap();
    assert_eq!(img.bytes, vec![1, 2]);
}

#[test]
fn empty_input_is_an_empty_image() {
    let img = parse(b"").unwrap();
    assert_eq!(img.origin, None);
    assert!(img.bytes.is_empty());
}

#[test]
fn corrupted_checksum_names_the_record() {
    let mut second = record(0x0002, 0, &[0xaa, 0xbb]);
    // flip the checksum byte
    let n = second.len();
    second.replace_range(n - 3..n - 1, "00");
    let text = record(0, 0, &[1, 2]) + &second + &record(0x0004, 0, &[3]);
    assert_eq!(parse(text.as_bytes()), Err(IhexError::BadChecksum { record: 2 }));
}

#[test]
fn gap_between_records_is_discontiguous() {
    let text = record(0, 0, &[1, 2]) + &record(0x0010, 0, &[3]);
    assert_eq!(parse(text.as_bytes()), Err(IhexError::Discontiguous { record: 2, addr: 0x0010 }));
}

#[test]
fn record_cut_short() {
    let full = record(0, 0, &[1, 2, 3]);
    let cut = &full[..full.len() - 5];
    assert_eq!(parse(cut.as_bytes()), Err(IhexError::Truncated { record: 1 }));
}

#[test]
fn image_past_64k_overflows() {
    // 257 full records fill 0x0000..0xffff, the next one runs off the end
    let chunk = [0x5a; 255];
    let mut text = String::new();
    let mut addr = 0u32;
    while addr <= 0xffff {
        text += &record(addr as u16, 0, &chunk);
        addr += chunk.len() as u32;
    }
    assert_eq!(parse(text.as_bytes()), Err(IhexError::Overflow { record: 258 }));
}
