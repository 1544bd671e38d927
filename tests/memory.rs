use s8x30x::memory::MemoryError;
use s8x30x::WideMemory;

#[test]
fn mismatched_channels_are_rejected() {
    let msb = vec![0u8; 4];
    let lsb = vec![0u8; 4];
    let fast = vec![0u8; 3];
    assert_eq!(
        WideMemory::new(vec![msb, lsb, fast]).unwrap_err(),
        MemoryError::LengthMismatch { channel: 2, expected: 4, found: 3 }
    );
}

#[test]
fn rom_pair_with_select_prom() {
    let mem = WideMemory::new(vec![vec![0x00, 0xe0], vec![0x00, 0x05], vec![0x77, 0x70]]).unwrap();
    let words: Vec<Vec<u8>> = mem.words().collect();
    assert_eq!(words, vec![vec![0x00, 0x00, 0x77], vec![0xe0, 0x05, 0x70]]);
    assert!(!mem.is_empty());
}
