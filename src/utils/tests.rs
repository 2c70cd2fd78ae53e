use super::{hex, logging};

#[test]
fn test_logging_init_accepts_levels() {
    // Should not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn test_dump_formats_offset_hex_and_ascii() {
    let out = hex::dump(b"hello");
    let line = out.lines().next().expect("one row");
    assert!(line.starts_with("00000000  68 65 6c 6c 6f"));
    assert!(line.ends_with("|hello|"));
}

#[test]
fn test_dump_replaces_unprintable_bytes() {
    let out = hex::dump(&[0x00, 0x1f, b'a']);
    assert!(out.contains("|..a|"));
}

#[test]
fn test_dump_breaks_rows_every_16_bytes() {
    let bytes: Vec<u8> = (0u8..32).collect();
    let out = hex::dump(&bytes);
    assert_eq!(out.lines().count(), 2);
    assert!(out.lines().nth(1).expect("second row").starts_with("00000010  "));
}

#[test]
fn test_dump_of_empty_slice_is_empty() {
    assert!(hex::dump(&[]).is_empty());
}
